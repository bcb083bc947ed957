use std::collections::BTreeMap;
use std::path::Path;
use std::time::Instant;

use anyhow::{anyhow, Context, Result};
use log::{debug, info};
use serde::{Deserialize, Serialize};

use crate::analysis::{AcResult, StepBudget, StepStatus, TransientParams, TransientResult};
use crate::circuit::Circuit;
use crate::netlist::Netlist;
use crate::options::SimOptions;
use crate::output::{self, OutputFormat};

/// Simulation results container
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationResult {
    pub analysis_type: AnalysisType,
    /// Key of the sweep axis in `signals`, if the analysis has one
    pub axis: Option<String>,
    /// One series per signal; an operating point has one value per signal
    pub signals: BTreeMap<String, Vec<f64>>,
    pub total_time: f64,
    /// False if the analysis finished early
    pub success: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum AnalysisType {
    Operating,
    Transient { tstop: f64, points: usize },
    Ac { fstart: f64, fstop: f64, npts: usize, source: String },
}

impl SimulationResult {
    pub fn axis_values(&self) -> Option<&[f64]> {
        self.axis
            .as_ref()
            .and_then(|axis| self.signals.get(axis))
            .map(Vec::as_slice)
    }

    /// Number of sweep points (1 for an operating point)
    pub fn len(&self) -> usize {
        match self.axis_values() {
            Some(axis) => axis.len(),
            None => self.signals.values().map(Vec::len).max().unwrap_or(0),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Signals other than the axis, in name order
    pub fn columns(&self) -> impl Iterator<Item = (&String, &Vec<f64>)> {
        let axis = self.axis.clone();
        self.signals
            .iter()
            .filter(move |(name, _)| Some(*name) != axis.as_ref())
    }

    pub fn final_value(&self, name: &str) -> Option<f64> {
        self.signals.get(name).and_then(|s| s.last().copied())
    }
}

/// Main simulator engine
pub struct Simulator {
    circuit: Option<Circuit>,
    results: Option<SimulationResult>,
    config: SimulatorConfig,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SimulatorConfig {
    pub options: SimOptions,
    /// Work per `tran_steps` call; progress is logged between calls
    pub step_budget: StepBudget,
}

impl Default for SimulatorConfig {
    fn default() -> Self {
        SimulatorConfig {
            options: SimOptions::default(),
            step_budget: StepBudget::default(),
        }
    }
}

impl SimulatorConfig {
    /// Defaults with the numeric options read from a JSON file
    pub fn from_options_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Cannot read options file '{}'", path.display()))?;
        let options: SimOptions = serde_json::from_str(&text)
            .with_context(|| format!("Invalid options file '{}'", path.display()))?;
        Ok(SimulatorConfig {
            options,
            ..SimulatorConfig::default()
        })
    }
}

impl Simulator {
    /// Create a new simulator with default configuration
    pub fn new() -> Self {
        Simulator::with_config(SimulatorConfig::default())
    }

    /// Create a new simulator with custom configuration
    pub fn with_config(config: SimulatorConfig) -> Self {
        Simulator {
            circuit: None,
            results: None,
            config,
        }
    }

    pub fn config(&self) -> &SimulatorConfig {
        &self.config
    }

    /// Load a JSON netlist from file
    pub fn load_netlist<P: AsRef<Path>>(&mut self, filename: P) -> Result<()> {
        let filename = filename.as_ref();
        info!("Loading netlist from: {}", filename.display());

        let netlist = Netlist::from_file(filename)?;
        self.load_netlist_from_parsed(&netlist)
    }

    /// Build the circuit from an already parsed netlist
    pub fn load_netlist_from_parsed(&mut self, netlist: &Netlist) -> Result<()> {
        let mut circuit = Circuit::with_options(self.config.options.clone());
        circuit.load_netlist(netlist)?;
        circuit.finalize()?;
        debug!("Circuit has {} unknowns", circuit.size());

        self.circuit = Some(circuit);
        self.results = None;
        Ok(())
    }

    pub fn circuit(&self) -> Option<&Circuit> {
        self.circuit.as_ref()
    }

    fn circuit_mut(&mut self) -> Result<&mut Circuit> {
        self.circuit.as_mut().ok_or_else(|| anyhow!("No circuit loaded"))
    }

    /// Run operating point analysis
    pub fn run_operating_point(&mut self) -> Result<()> {
        info!("Starting operating point analysis");
        let start_time = Instant::now();

        let op = self.circuit_mut()?.dc()?;
        let signals = op.into_iter().map(|(name, value)| (name, vec![value])).collect();

        self.results = Some(SimulationResult {
            analysis_type: AnalysisType::Operating,
            axis: None,
            signals,
            total_time: start_time.elapsed().as_secs_f64(),
            success: true,
        });

        info!(
            "Operating point analysis completed in {:.3}ms",
            start_time.elapsed().as_secs_f64() * 1e3
        );
        Ok(())
    }

    /// Run transient analysis from 0 to `tstop`
    pub fn run_transient(&mut self, tstop: f64, points: usize, probes: &[String]) -> Result<()> {
        info!("Starting transient analysis: tstop={:e}, points={}", tstop, points);
        let start_time = Instant::now();
        let budget = self.config.step_budget;

        let circuit = self.circuit_mut()?;
        let params = TransientParams::new(tstop, points).with_probes(probes.to_vec());
        let mut run = circuit.tran_start(&params)?;
        let result: TransientResult = loop {
            match circuit.tran_steps(&mut run, budget)? {
                StepStatus::Continue { progress } => {
                    info!("Transient progress: {:.0}%", progress * 100.0);
                }
                StepStatus::Done(result) => break result,
            }
        };

        let finished = result
            .time()
            .last()
            .map_or(false, |&t| t >= tstop);
        self.results = Some(SimulationResult {
            analysis_type: AnalysisType::Transient { tstop, points },
            axis: Some(TransientResult::TIME.to_string()),
            signals: result.signals,
            total_time: start_time.elapsed().as_secs_f64(),
            success: finished,
        });

        info!(
            "Transient analysis completed with {} time points",
            run.steps_taken()
        );
        Ok(())
    }

    /// Run AC analysis with `npts` points per decade, excited by `source`
    pub fn run_ac(&mut self, npts: usize, fstart: f64, fstop: f64, source: &str) -> Result<()> {
        info!(
            "Starting AC analysis: {} from {:e}Hz to {:e}Hz, {} points/decade",
            source, fstart, fstop, npts
        );
        let start_time = Instant::now();

        let result: AcResult = self.circuit_mut()?.ac(npts, fstart, fstop, source)?;

        self.results = Some(SimulationResult {
            analysis_type: AnalysisType::Ac {
                fstart,
                fstop,
                npts,
                source: source.to_string(),
            },
            axis: Some(AcResult::FREQUENCIES.to_string()),
            signals: result.signals,
            total_time: start_time.elapsed().as_secs_f64(),
            success: true,
        });
        Ok(())
    }

    /// Get simulation results
    pub fn get_results(&self) -> Option<&SimulationResult> {
        self.results.as_ref()
    }

    /// Export simulation results to file
    pub fn export_results<P: AsRef<Path>>(&self, filename: P, format: OutputFormat) -> Result<()> {
        let results = self
            .results
            .as_ref()
            .ok_or_else(|| anyhow!("No simulation results available"))?;
        output::export(results, filename, format)
    }

    /// Print simulation summary
    pub fn print_summary(&self) {
        match &self.results {
            Some(results) => output::print_summary(results),
            None => println!("No simulation results available"),
        }
    }
}

impl Default for Simulator {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::netlist::NetlistEntry;

    fn divider() -> Netlist {
        Netlist::new(vec![
            NetlistEntry::new("ground").connect("gnd", "0"),
            NetlistEntry::new("v")
                .connect("nplus", "in")
                .connect("nminus", "0")
                .property("name", "V1")
                .property("value", "dc(5)"),
            NetlistEntry::new("r")
                .connect("n1", "in")
                .connect("n2", "out")
                .property("r", "1k"),
            NetlistEntry::new("r")
                .connect("n1", "out")
                .connect("n2", "0")
                .property("r", "1k"),
        ])
    }

    #[test]
    fn test_simulator_operating_point() {
        let mut simulator = Simulator::new();
        simulator.load_netlist_from_parsed(&divider()).unwrap();
        simulator.run_operating_point().unwrap();

        let results = simulator.get_results().unwrap();
        assert!(results.success);
        assert_eq!(results.len(), 1);
        assert!((results.final_value("out").unwrap() - 2.5).abs() < 1e-6);
        assert!(results.signals.contains_key("I(V1)"));
    }

    #[test]
    fn test_simulator_requires_circuit() {
        let mut simulator = Simulator::new();
        let err = simulator.run_operating_point().unwrap_err();
        assert!(err.to_string().contains("No circuit loaded"));
        assert!(simulator.export_results("unused.csv", OutputFormat::Csv).is_err());
    }

    #[test]
    fn test_small_budget_transient() {
        let config = SimulatorConfig {
            step_budget: StepBudget::steps(3),
            ..SimulatorConfig::default()
        };
        let mut simulator = Simulator::with_config(config);
        simulator.load_netlist_from_parsed(&divider()).unwrap();
        simulator.run_transient(1e-3, 10, &[]).unwrap();

        let results = simulator.get_results().unwrap();
        assert!(results.success);
        assert_eq!(results.axis_values().unwrap().last(), Some(&1e-3));
        assert!(results.columns().all(|(name, _)| name != TransientResult::TIME));
    }
}
