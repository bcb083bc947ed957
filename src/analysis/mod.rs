//! Analysis drivers: DC operating point, transient and AC small-signal.
//!
//! Each analysis is a method on [`crate::Circuit`]; results are named series
//! keyed by node name, `I(name)` for voltage source branch currents, plus one
//! axis series.

pub mod ac;
pub mod dc;
pub mod transient;

use std::collections::BTreeMap;

use serde::Serialize;

pub use ac::AcResult;
pub use transient::{StepBudget, StepStatus, TransientParams, TransientRun};

/// DC operating point: node voltages and branch currents
pub type OperatingPoint = BTreeMap<String, f64>;

/// Transient waveforms
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TransientResult {
    pub signals: BTreeMap<String, Vec<f64>>,
}

impl TransientResult {
    /// Key of the time axis
    pub const TIME: &'static str = "_time_";

    pub fn time(&self) -> &[f64] {
        self.signal(Self::TIME).unwrap_or(&[])
    }

    pub fn signal(&self, name: &str) -> Option<&[f64]> {
        self.signals.get(name).map(Vec::as_slice)
    }

    /// Value of a signal at the last time point
    pub fn final_value(&self, name: &str) -> Option<f64> {
        self.signal(name).and_then(|s| s.last().copied())
    }
}
