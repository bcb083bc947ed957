use colored::*;
use log::{error, info, LevelFilter};

use analog_sim::cli::{self, Analysis, CliArgs};
use analog_sim::simulator::{Simulator, SimulatorConfig};

fn main() {
    let matches = cli::command().get_matches();

    let args = match CliArgs::from_matches(&matches) {
        Ok(args) => args,
        Err(e) => {
            eprintln!("{}", format!("Error: {}", e).red());
            std::process::exit(2);
        }
    };
    init_logging(args.verbose_level);

    if let Err(e) = run_application(&args) {
        error!("{}", format!("Error: {:#}", e).red());
        std::process::exit(1);
    }
}

/// `RUST_LOG` wins; otherwise `-v` raises the level from info
fn init_logging(verbose_level: u8) {
    let level = match verbose_level {
        0 => LevelFilter::Info,
        1 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    };
    env_logger::Builder::new()
        .filter_level(level)
        .parse_default_env()
        .init();
}

fn run_application(args: &CliArgs) -> anyhow::Result<()> {
    info!("{}", "Starting analogsim".green().bold());
    info!("Input file: {}", args.input_file.display().to_string().bright_blue());

    if !args.input_file.exists() {
        return Err(anyhow::anyhow!("Input file '{}' not found", args.input_file.display()));
    }

    let config = match &args.options_file {
        Some(path) => SimulatorConfig::from_options_file(path)?,
        None => SimulatorConfig::default(),
    };

    let mut simulator = Simulator::with_config(config);
    simulator.load_netlist(&args.input_file)?;

    match &args.analysis {
        Analysis::Transient { tstop, points } => {
            simulator.run_transient(*tstop, *points, &args.probes)?;
        }
        Analysis::Ac { fstart, fstop, source, npts } => {
            simulator.run_ac(*npts, *fstart, *fstop, source)?;
        }
        Analysis::Operating => {
            simulator.run_operating_point()?;
        }
    }

    // Export results
    if let Some(output_file) = &args.output_file {
        simulator.export_results(output_file, args.output_format)?;
        info!("Results exported to: {}", output_file.display().to_string().bright_green());
    } else {
        simulator.print_summary();
    }

    info!("{}", "Simulation completed successfully!".green().bold());
    Ok(())
}
