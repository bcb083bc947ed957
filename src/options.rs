use serde::{Deserialize, Serialize};

/// Numeric knobs for the Newton solver and the transient integrator.
///
/// Every field has a default, so a JSON options file only needs to name the
/// values it overrides.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimOptions {
    /// Largest voltage change per Newton iteration while limiting is active
    pub v_newt_lim: f64,
    /// Absolute error tolerance for voltage unknowns
    pub v_abstol: f64,
    /// Absolute error tolerance for current unknowns
    pub i_abstol: f64,
    /// Tolerance relative to the largest magnitude seen for an unknown
    pub reltol: f64,
    /// Ratio between the LTE tolerance and the Newton tolerance
    pub lterel: f64,
    pub dc_max_iters: usize,
    pub max_tran_iters: usize,
    /// Largest factor the LTE estimate may grow the step by
    pub time_step_increase_factor: f64,
    /// Smallest shrink of a single LTE rejection is 1/this
    pub lte_step_decrease_factor: f64,
    /// Step divisor after a Newton failure
    pub nr_step_decrease_factor: f64,
    pub max_steps_per_period: usize,
}

impl Default for SimOptions {
    fn default() -> Self {
        SimOptions {
            v_newt_lim: 0.3,
            v_abstol: 1e-6,
            i_abstol: 1e-12,
            reltol: 1e-4,
            lterel: 10.0,
            dc_max_iters: 1000,
            max_tran_iters: 20,
            time_step_increase_factor: 2.0,
            lte_step_decrease_factor: 8.0,
            nr_step_decrease_factor: 4.0,
            max_steps_per_period: 50_000,
        }
    }
}

impl SimOptions {
    /// Absolute part of the loose Newton residual check
    pub fn res_check_abs(&self) -> f64 {
        self.i_abstol.sqrt()
    }

    /// Relative part of the loose Newton residual check
    pub fn res_check_rel(&self) -> f64 {
        self.reltol.sqrt()
    }
}
