use std::path::PathBuf;

use anyhow::{anyhow, Context, Result};
use clap::{Arg, ArgAction, ArgMatches, Command};

use crate::output::OutputFormat;
use crate::parser::parse_number;

#[derive(Debug, Clone, PartialEq)]
pub struct CliArgs {
    pub input_file: PathBuf,
    pub output_file: Option<PathBuf>,
    pub analysis: Analysis,
    pub output_format: OutputFormat,
    pub options_file: Option<PathBuf>,
    pub probes: Vec<String>,
    pub verbose_level: u8,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Analysis {
    Operating,
    Transient { tstop: f64, points: usize },
    Ac { fstart: f64, fstop: f64, source: String, npts: usize },
}

pub fn command() -> Command {
    Command::new("analogsim")
        .version(crate::VERSION)
        .about(crate::DESCRIPTION)
        .arg(
            Arg::new("input")
                .help("Input netlist file (JSON)")
                .required(true)
                .index(1),
        )
        .arg(
            Arg::new("output")
                .short('o')
                .long("output")
                .value_name("FILE")
                .help("Output file for simulation results"),
        )
        .arg(
            Arg::new("tran")
                .long("tran")
                .value_name("TSTOP")
                .conflicts_with("ac")
                .help("Transient analysis from 0 to TSTOP seconds"),
        )
        .arg(
            Arg::new("points")
                .long("points")
                .value_name("N")
                .default_value("100")
                .help("Transient output resolution (points per period)"),
        )
        .arg(
            Arg::new("ac")
                .long("ac")
                .value_names(["FSTART", "FSTOP", "SOURCE"])
                .num_args(3)
                .help("AC analysis from FSTART to FSTOP Hz, driven by SOURCE"),
        )
        .arg(
            Arg::new("npts")
                .long("npts")
                .value_name("N")
                .default_value("10")
                .help("AC points per decade"),
        )
        .arg(
            Arg::new("probe")
                .long("probe")
                .value_name("NODE")
                .action(ArgAction::Append)
                .help("Node whose accuracy always limits the transient step"),
        )
        .arg(
            Arg::new("options")
                .long("options")
                .value_name("FILE")
                .help("JSON file overriding solver options"),
        )
        .arg(
            Arg::new("verbose")
                .short('v')
                .long("verbose")
                .action(ArgAction::Count)
                .help("Increase verbosity level"),
        )
        .arg(
            Arg::new("format")
                .short('f')
                .long("format")
                .value_name("FORMAT")
                .default_value("csv")
                .value_parser(["csv", "json"])
                .help("Output format"),
        )
}

impl CliArgs {
    pub fn from_matches(matches: &ArgMatches) -> Result<Self> {
        let input_file = matches
            .get_one::<String>("input")
            .map(PathBuf::from)
            .ok_or_else(|| anyhow!("Input file is required"))?;

        let output_file = matches.get_one::<String>("output").map(PathBuf::from);
        let options_file = matches.get_one::<String>("options").map(PathBuf::from);
        let verbose_level = matches.get_count("verbose");

        let output_format = matches
            .get_one::<String>("format")
            .map(String::as_str)
            .unwrap_or("csv")
            .parse()?;

        let probes = matches
            .get_many::<String>("probe")
            .map(|values| values.cloned().collect())
            .unwrap_or_default();

        let analysis = if let Some(tstop) = matches.get_one::<String>("tran") {
            let tstop = parse_value("TSTOP", tstop)?;
            if !(tstop > 0.0) {
                return Err(anyhow!("Transient stop time must be positive"));
            }
            let points = parse_count("--points", matches)?;
            Analysis::Transient { tstop, points }
        } else if let Some(ac_values) = matches.get_many::<String>("ac") {
            let values: Vec<&String> = ac_values.collect();
            if values.len() != 3 {
                return Err(anyhow!("AC analysis requires exactly 3 parameters: fstart, fstop and source"));
            }

            let fstart = parse_value("FSTART", values[0])?;
            let fstop = parse_value("FSTOP", values[1])?;
            if !(fstart > 0.0) || fstop < fstart {
                return Err(anyhow!("Invalid AC range: need 0 < FSTART <= FSTOP"));
            }
            let npts = parse_count("--npts", matches)?;

            Analysis::Ac {
                fstart,
                fstop,
                source: values[2].clone(),
                npts,
            }
        } else {
            // Default to operating point analysis
            Analysis::Operating
        };

        Ok(CliArgs {
            input_file,
            output_file,
            analysis,
            output_format,
            options_file,
            probes,
            verbose_level,
        })
    }
}

/// Numbers take engineering notation (`1m`, `10k`, `2.2u`)
fn parse_value(what: &str, value: &str) -> Result<f64> {
    parse_number(value).ok_or_else(|| anyhow!("{} '{}' is not a number", what, value))
}

fn parse_count(flag: &str, matches: &ArgMatches) -> Result<usize> {
    let id = flag.trim_start_matches("--");
    let raw = matches
        .get_one::<String>(id)
        .ok_or_else(|| anyhow!("Missing {}", flag))?;
    let count: usize = raw
        .parse()
        .with_context(|| format!("{} '{}' is not a whole number", flag, raw))?;
    if count == 0 {
        return Err(anyhow!("{} must be at least 1", flag));
    }
    Ok(count)
}
