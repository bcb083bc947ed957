//! Result export (CSV, JSON) and the human readable summary.

use std::fs::File;
use std::io::Write;
use std::path::Path;
use std::str::FromStr;

use anyhow::{anyhow, Context, Result};
use colored::*;
use csv::Writer;
use log::info;

use crate::simulator::{AnalysisType, SimulationResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Csv,
    Json,
}

impl FromStr for OutputFormat {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "csv" => Ok(OutputFormat::Csv),
            "json" => Ok(OutputFormat::Json),
            other => Err(anyhow!("Invalid output format '{}'", other)),
        }
    }
}

/// Write `results` to `filename`
pub fn export<P: AsRef<Path>>(results: &SimulationResult, filename: P, format: OutputFormat) -> Result<()> {
    let filename = filename.as_ref();
    let file = File::create(filename)
        .with_context(|| format!("Cannot create output file '{}'", filename.display()))?;

    match format {
        OutputFormat::Csv => write_csv(results, file)?,
        OutputFormat::Json => write_json(results, file)?,
    }
    info!("Results exported to {:?}: {}", format, filename.display());
    Ok(())
}

/// One row per sweep point: the axis first (if any), then every other
/// signal in name order
pub fn write_csv<W: Write>(results: &SimulationResult, writer: W) -> Result<()> {
    let mut writer = Writer::from_writer(writer);

    let columns: Vec<(&String, &Vec<f64>)> = results.columns().collect();
    let axis = results.axis.as_ref().zip(results.axis_values());

    let mut header: Vec<&str> = Vec::with_capacity(columns.len() + 1);
    if let Some((name, _)) = axis {
        header.push(name.as_str());
    }
    header.extend(columns.iter().map(|(name, _)| name.as_str()));
    writer.write_record(&header)?;

    for i in 0..results.len() {
        let mut record: Vec<String> = Vec::with_capacity(header.len());
        if let Some((_, values)) = axis {
            record.push(values[i].to_string());
        }
        for (_, values) in &columns {
            record.push(values.get(i).map(f64::to_string).unwrap_or_default());
        }
        writer.write_record(&record)?;
    }

    writer.flush()?;
    Ok(())
}

pub fn write_json<W: Write>(results: &SimulationResult, writer: W) -> Result<()> {
    serde_json::to_writer_pretty(writer, results)?;
    Ok(())
}

/// Print final values of every signal to stdout
pub fn print_summary(results: &SimulationResult) {
    println!("\n{}", "=== Simulation Summary ===".bold());
    let analysis = match &results.analysis_type {
        AnalysisType::Operating => "operating point".to_string(),
        AnalysisType::Transient { tstop, points } => format!("transient to {:e}s, {} points", tstop, points),
        AnalysisType::Ac { fstart, fstop, npts, source } => {
            format!("AC {:e}Hz to {:e}Hz, {} points/decade, source {}", fstart, fstop, npts, source)
        }
    };
    println!("Analysis type: {}", analysis);
    println!("Total simulation time: {:.3}ms", results.total_time * 1000.0);
    let status = if results.success { "yes".green() } else { "stopped early".yellow() };
    println!("Completed: {}", status);
    if results.axis.is_some() {
        println!("Number of points: {}", results.len());
    }

    let (voltages, currents): (Vec<_>, Vec<_>) = results
        .columns()
        .partition(|(name, _)| !name.starts_with("I("));
    let label = match results.analysis_type {
        AnalysisType::Operating => "",
        _ => " (final values)",
    };

    if !voltages.is_empty() {
        println!("\nNode signals{}:", label);
        for (name, values) in voltages {
            if let Some(value) = values.last() {
                println!("  {}: {:.6}", name.bright_blue(), value);
            }
        }
    }
    if !currents.is_empty() {
        println!("\nBranch currents{}:", label);
        for (name, values) in currents {
            if let Some(value) = values.last() {
                println!("  {}: {:.6e}A", name.bright_blue(), value);
            }
        }
    }
}
