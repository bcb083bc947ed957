//! Transient analysis.
//!
//! Trapezoidal integration with a variable step chosen from a local
//! truncation error estimate. Two Backward-Euler pseudo-steps at `tstart`
//! fill the history first; rows of algebraic unknowns (no storage) are
//! integrated with Backward-Euler throughout so they don't ring.
//!
//! The analysis runs as a resumable job: [`Circuit::tran_start`] builds a
//! [`TransientRun`], and [`Circuit::tran_steps`] advances it until the end
//! time, a step budget or a deadline, so a caller can report progress or
//! stop between calls.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;

use log::{debug, info, warn};
use nalgebra::DVector;

use super::TransientResult;
use crate::circuit::Circuit;
use crate::devices::{Device, Stamp};
use crate::error::{Result, SimError};
use crate::mna::{MnaSystem, GROUND};
use crate::newton::find_solution;
use crate::options::SimOptions;
use crate::solver;

/// Below this fraction of `tstop` a step is integrated with Backward-Euler
const BE_STEP_FRACTION: f64 = 1.0e-4;

/// What to simulate
#[derive(Debug, Clone, PartialEq)]
pub struct TransientParams {
    pub tstart: f64,
    pub tstop: f64,
    /// Output resolution: the largest step is `span / (periods * ntpts)`
    pub ntpts: usize,
    /// Named nodes whose error always limits the step
    pub probes: Vec<String>,
}

impl TransientParams {
    pub fn new(tstop: f64, ntpts: usize) -> Self {
        TransientParams {
            tstart: 0.0,
            tstop,
            ntpts,
            probes: Vec::new(),
        }
    }

    pub fn with_probes(mut self, probes: Vec<String>) -> Self {
        self.probes = probes;
        self
    }
}

/// How much work one [`Circuit::tran_steps`] call may do
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StepBudget {
    pub max_steps: Option<usize>,
    pub deadline: Option<Instant>,
}

impl Default for StepBudget {
    fn default() -> Self {
        StepBudget {
            max_steps: Some(1000),
            deadline: None,
        }
    }
}

impl StepBudget {
    pub fn unlimited() -> Self {
        StepBudget {
            max_steps: None,
            deadline: None,
        }
    }

    pub fn steps(max_steps: usize) -> Self {
        StepBudget {
            max_steps: Some(max_steps),
            deadline: None,
        }
    }

    pub fn until(deadline: Instant) -> Self {
        StepBudget {
            max_steps: None,
            deadline: Some(deadline),
        }
    }

    fn exhausted(&self, steps: usize) -> bool {
        self.max_steps.map_or(false, |max| steps >= max)
            || self.deadline.map_or(false, |deadline| Instant::now() >= deadline)
    }
}

/// Outcome of one [`Circuit::tran_steps`] call
#[derive(Debug, Clone, PartialEq)]
pub enum StepStatus {
    /// Budget used up; `progress` is the fraction of the interval covered
    Continue { progress: f64 },
    Done(TransientResult),
}

/// State of a transient analysis between calls
#[derive(Debug, Clone)]
pub struct TransientRun {
    tstart: f64,
    tstop: f64,

    time: f64,
    oldt: f64,
    old2t: f64,
    old3t: f64,
    new_step: f64,
    max_step: f64,
    min_step: f64,
    max_nsteps: usize,
    /// Negative while taking the Backward-Euler pseudo-steps
    step_index: i64,

    // Solution, charge (C x) and device current history
    oldsol: DVector<f64>,
    old2sol: DVector<f64>,
    old3sol: DVector<f64>,
    q: DVector<f64>,
    oldq: DVector<f64>,
    old2q: DVector<f64>,
    old3q: DVector<f64>,
    c: DVector<f64>,
    oldc: DVector<f64>,

    // Integration coefficients: d/dt ~ alpha0 x + alpha1 oldx + alpha2 old2x,
    // current averaged as beta0 c + beta1 oldc per row
    alpha0: f64,
    alpha1: f64,
    alpha2: f64,
    beta0: DVector<f64>,
    beta1: DVector<f64>,
    /// 1.0 for algebraic rows
    ar: DVector<f64>,
    ltecheck: Vec<bool>,

    response: Vec<Vec<f64>>,
    times: Vec<f64>,
    stop: Arc<AtomicBool>,
    finished: bool,
}

impl TransientRun {
    /// Ask the run to finish at the next step; the result holds the
    /// waveforms computed so far
    pub fn request_stop(&self) {
        self.stop.store(true, Ordering::Relaxed);
    }

    /// Flag that can be set from elsewhere to stop the run
    pub fn stop_handle(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.stop)
    }

    pub fn time(&self) -> f64 {
        self.time
    }

    /// Accepted time points so far
    pub fn steps_taken(&self) -> usize {
        self.times.len()
    }

    pub fn progress(&self) -> f64 {
        ((self.time - self.tstart) / (self.tstop - self.tstart)).clamp(0.0, 1.0)
    }

    /// `c = -Gl x - f(x)` from the devices, `q = C x`; `rhs` is the averaged
    /// current minus the charge derivative and `matrix = beta0 G + alpha0 C`.
    fn load_tran(&mut self, devices: &[Device], sys: &mut MnaSystem, soln: &DVector<f64>, rhs: &mut DVector<f64>) {
        self.c.gemv(-1.0, &sys.gl, soln, 0.0);
        sys.g.copy_from(&sys.gl);
        for device in devices {
            device.load_tran(sys, soln, &mut self.c, self.time);
        }
        self.q.gemv(1.0, &sys.c, soln, 0.0);

        for i in 0..sys.size {
            let dqdt = self.alpha0 * self.q[i] + self.alpha1 * self.oldq[i] + self.alpha2 * self.old2q[i];
            rhs[i] = self.beta0[i] * self.c[i] + self.beta1[i] * self.oldc[i] - dqdt;
        }
        solver::scale_add_rows(&mut sys.matrix, &sys.g, &self.beta0, &sys.c, self.alpha0);
    }

    /// Save the accepted solution and shift the history back one step
    fn rotate(&mut self, solution: &DVector<f64>) {
        if self.step_index >= 0 {
            for (series, &value) in self.response.iter_mut().zip(solution.iter()) {
                series.push(value);
            }
        }
        self.oldc.copy_from(&self.c);
        std::mem::swap(&mut self.old3sol, &mut self.old2sol);
        std::mem::swap(&mut self.old2sol, &mut self.oldsol);
        self.oldsol.copy_from(solution);
        std::mem::swap(&mut self.old3q, &mut self.old2q);
        std::mem::swap(&mut self.old2q, &mut self.oldq);
        self.oldq.copy_from(&self.q);
    }

    /// Step size from the LTE of the step just taken: the trapezoidal error
    /// is estimated against a quadratic through the last three points.
    fn pick_step(&self, solution: &DVector<f64>, sys: &MnaSystem, options: &SimOptions) -> f64 {
        let min_shrink_factor = 1.0 / options.lte_step_decrease_factor;
        let max_growth_factor = options.time_step_increase_factor;

        let dtt0 = self.time - self.oldt;
        let dtt1 = self.time - self.old2t;
        let dtt2 = self.time - self.old3t;
        let dt0dt1 = self.oldt - self.old2t;
        let dt0dt2 = self.oldt - self.old3t;
        let dt1dt2 = self.old2t - self.old3t;
        let p0 = (dtt1 * dtt2) / (dt0dt1 * dt0dt2);
        let p1 = (dtt0 * dtt2) / (-dt0dt1 * dt1dt2);
        let p2 = (dtt0 * dtt1) / (dt0dt2 * dt1dt2);

        let trapcoeff = 0.5 * (self.time - self.oldt) / (self.time - self.old3t);
        let mut maxlteratio: f64 = 0.0;
        for i in (0..sys.size).filter(|&i| self.ltecheck[i]) {
            let pred = p0 * self.oldsol[i] + p1 * self.old2sol[i] + p2 * self.old3sol[i];
            let lte = (solution[i] - pred).abs() * trapcoeff;
            let lteratio = lte / (options.lterel * (sys.abstol[i] + options.reltol * sys.soln_max[i]));
            maxlteratio = maxlteratio.max(lteratio);
        }

        // Cube root: the trapezoidal error goes as h^3
        let lte_step_ratio = 1.0 / maxlteratio.cbrt();
        let step = self.time - self.oldt;
        if lte_step_ratio < 1.0 {
            let ratio = lte_step_ratio.max(min_shrink_factor);
            (step * 0.75 * ratio).max(self.min_step)
        } else {
            let ratio = lte_step_ratio.min(max_growth_factor);
            let new_step = if ratio > 1.2 { step * ratio / 1.2 } else { step };
            new_step.min(self.max_step)
        }
    }
}

impl Circuit {
    /// Set up a transient analysis. Runs DC first unless an operating point
    /// exists; if DC does not converge the analysis starts from the zero
    /// state instead.
    pub fn tran_start(&mut self, params: &TransientParams) -> Result<TransientRun> {
        let span = params.tstop - params.tstart;
        if !(span > 0.0) || !span.is_finite() || params.tstart < 0.0 {
            return Err(SimError::InvalidAnalysis(format!(
                "transient interval [{}, {}] is empty",
                params.tstart, params.tstop
            )));
        }
        if params.ntpts == 0 {
            return Err(SimError::InvalidAnalysis("transient needs at least one time point".to_string()));
        }

        if !self.diddc {
            match self.dc() {
                Ok(_) => {}
                Err(e) if e.is_dc_nonconvergence() => {
                    warn!("DC failed, trying transient analysis from zero.");
                    self.reset()?;
                }
                Err(e) => return Err(e),
            }
        } else {
            self.finalize()?;
        }

        let sys = self
            .mna
            .as_ref()
            .ok_or(SimError::NotFinalized("transient analysis"))?;
        let n = sys.size;

        // Algebraic unknowns don't get LTE checked, unless probed
        let algebraic = solver::algebraic(&sys.c);
        let ar = DVector::from_iterator(n, algebraic.iter().map(|&a| if a { 1.0 } else { 0.0 }));
        let mut ltecheck: Vec<bool> = algebraic.iter().map(|&a| !a).collect();
        for probe in &params.probes {
            match self.node_map.get(probe) {
                Some(&Some(index)) => ltecheck[index] = true,
                Some(&GROUND) => {}
                None => warn!("Probe {} is not a circuit node", probe),
            }
        }

        // Periodic sources bound the step count per period
        let mut period = span;
        for src in self.sources() {
            if src.period > 0.0 {
                period = period.min(src.period);
            }
        }
        let periods = (span / period).ceil().max(1.0);
        let max_nsteps = (periods as usize).saturating_mul(self.options.max_steps_per_period);

        let max_step = span / (periods * params.ntpts as f64);
        let min_step = max_step / 1e8;
        let new_step = max_step / 1e6;
        debug!(
            "Transient setup: {} unknowns, {} periods, max step {:e}, min step {:e}",
            n, periods, max_step, min_step
        );

        let zeros = DVector::zeros(n);
        let mut run = TransientRun {
            tstart: params.tstart,
            tstop: params.tstop,
            time: params.tstart,
            oldt: params.tstart - new_step,
            old2t: params.tstart - 2.0 * new_step,
            old3t: params.tstart - 3.0 * new_step,
            new_step,
            max_step,
            min_step,
            max_nsteps,
            step_index: -2,
            oldsol: zeros.clone(),
            old2sol: zeros.clone(),
            old3sol: zeros.clone(),
            q: zeros.clone(),
            oldq: zeros.clone(),
            old2q: zeros.clone(),
            old3q: zeros.clone(),
            c: zeros.clone(),
            oldc: zeros.clone(),
            alpha0: 1.0,
            alpha1: 0.0,
            alpha2: 0.0,
            beta0: DVector::from_element(n, 1.0),
            beta1: zeros,
            ar,
            ltecheck,
            response: vec![Vec::new(); n],
            times: Vec::new(),
            stop: Arc::new(AtomicBool::new(false)),
            finished: false,
        };

        // Charges and currents at the starting point seed the history
        let devices = &self.devices;
        let sys = self
            .mna
            .as_mut()
            .ok_or(SimError::NotFinalized("transient analysis"))?;
        let solution = sys.solution.clone();
        let mut rhs = DVector::zeros(n);
        run.load_tran(devices, sys, &solution, &mut rhs);
        run.oldsol.copy_from(&solution);
        run.old2sol.copy_from(&solution);
        run.old3sol.copy_from(&solution);
        run.oldq.copy_from(&run.q);
        run.old2q.copy_from(&run.q);
        run.old3q.copy_from(&run.q);
        run.oldc.copy_from(&run.c);

        Ok(run)
    }

    /// Advance a transient run until it finishes or `budget` runs out
    pub fn tran_steps(&mut self, run: &mut TransientRun, budget: StepBudget) -> Result<StepStatus> {
        if run.finished {
            return Ok(StepStatus::Done(self.transient_result(run)));
        }

        let options = self.options.clone();
        let devices = &self.devices;
        let sys = self
            .mna
            .as_mut()
            .ok_or(SimError::NotFinalized("transient analysis"))?;
        if sys.size != run.response.len() {
            return Err(SimError::InvalidAnalysis(
                "transient run belongs to a different circuit".to_string(),
            ));
        }

        let mut steps = 0;
        while run.step_index < run.max_nsteps as i64 {
            if run.stop.load(Ordering::Relaxed) {
                info!("Transient analysis stopped at t={:e}", run.time);
                break;
            }

            let solution = sys.solution.clone();
            run.rotate(&solution);

            let (b0, b1) = if run.step_index < 0 {
                // Pseudo-step: stay at tstart, keep the step size
                run.old3t = run.old2t - (run.oldt - run.old2t);
                run.old2t = run.oldt - (run.tstart - run.oldt);
                run.oldt = run.tstart - (run.time - run.oldt);
                run.time = run.tstart;
                (1.0, 0.0)
            } else {
                run.times.push(run.time);
                run.old3t = run.old2t;
                run.old2t = run.oldt;
                run.oldt = run.time;

                // Come smoothly into the end of the interval
                if run.time >= run.tstop {
                    break;
                } else if run.time + run.new_step > run.tstop {
                    run.time = run.tstop;
                } else if run.time + 1.5 * run.new_step > run.tstop {
                    run.time += (2.0 / 3.0) * (run.tstop - run.time);
                } else {
                    run.time += run.new_step;
                }

                // Don't step over a source corner
                let breakpoint = devices
                    .iter()
                    .filter_map(|d| d.breakpoint(run.oldt + run.min_step))
                    .fold(f64::INFINITY, f64::min);
                if breakpoint < run.time {
                    run.time = breakpoint;
                }
                (0.5, 0.5)
            };

            for i in 0..sys.size {
                run.beta0[i] = b0 + run.ar[i] * b1;
                run.beta1[i] = (1.0 - run.ar[i]) * b1;
            }

            // Find a step where Newton converges and the LTE is acceptable
            loop {
                let step = run.time - run.oldt;
                run.alpha0 = 1.0 / step;
                run.alpha1 = -run.alpha0;
                run.alpha2 = 0.0;

                if step < BE_STEP_FRACTION * run.tstop {
                    run.beta0.fill(1.0);
                    run.beta1.fill(0.0);
                }

                let converged = find_solution(sys, &options, options.max_tran_iters, |sys, soln, rhs| {
                    run.load_tran(devices, sys, soln, rhs)
                })
                .is_ok();

                if converged && (run.step_index <= 0 || step < (1.0 + options.reltol) * run.min_step) {
                    if run.step_index > 0 {
                        run.new_step = options.time_step_increase_factor * run.min_step;
                    }
                    break;
                } else if !converged {
                    if step <= run.min_step {
                        return Err(SimError::TimestepTooSmall {
                            time: run.oldt,
                            min_step: run.min_step,
                        });
                    }
                    debug!("Newton failed at t={:e}, shrinking step {:e}", run.time, step);
                    run.time = run.oldt + step / options.nr_step_decrease_factor;
                } else {
                    let solution = sys.solution.clone();
                    run.new_step = run.pick_step(&solution, sys, &options);
                    if run.new_step < (1.0 - options.reltol) * step {
                        debug!("LTE rejected step {:e} at t={:e}, retrying with {:e}", step, run.time, run.new_step);
                        run.time = run.oldt + run.new_step;
                    } else {
                        break;
                    }
                }
            }

            run.step_index += 1;
            steps += 1;
            if budget.exhausted(steps) {
                return Ok(StepStatus::Continue {
                    progress: run.progress(),
                });
            }
        }

        if run.step_index >= run.max_nsteps as i64 {
            warn!(
                "Transient analysis used its {} step limit, stopping at t={:e}",
                run.max_nsteps, run.time
            );
        }
        run.finished = true;
        info!("Transient analysis done: {} time points", run.times.len());
        Ok(StepStatus::Done(self.transient_result(run)))
    }

    /// Run a whole transient analysis in one call
    pub fn transient(&mut self, params: &TransientParams) -> Result<TransientResult> {
        let mut run = self.tran_start(params)?;
        loop {
            if let StepStatus::Done(result) = self.tran_steps(&mut run, StepBudget::unlimited())? {
                return Ok(result);
            }
        }
    }

    fn transient_result(&self, run: &TransientRun) -> TransientResult {
        let npts = run.times.len();
        let mut signals: std::collections::BTreeMap<String, Vec<f64>> = self
            .node_map
            .iter()
            .map(|(name, node)| {
                let series = match node {
                    Some(i) => run.response[*i].clone(),
                    None => vec![0.0; npts],
                };
                (name.clone(), series)
            })
            .collect();
        for v in self.voltage_sources() {
            signals.insert(format!("I({})", v.name), run.response[v.branch].clone());
        }
        signals.insert(TransientResult::TIME.to_string(), run.times.clone());
        TransientResult { signals }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::devices::DiodeType;
    use crate::source::Source;

    fn rc_step() -> Circuit {
        let mut ckt = Circuit::new();
        let a = ckt.net("in").unwrap();
        let b = ckt.net("out").unwrap();
        ckt.voltage_source(a, GROUND, Source::parse("step(0,1,0,1n)").unwrap(), Some("V1"))
            .unwrap();
        ckt.resistor(a, b, 1e3, None).unwrap();
        ckt.capacitor(b, GROUND, 1e-6, None).unwrap();
        ckt
    }

    #[test]
    fn test_rc_step_response() {
        let mut ckt = rc_step();
        let result = ckt.transient(&TransientParams::new(10e-3, 100)).unwrap();

        let time = result.time();
        assert_eq!(time.first(), Some(&0.0));
        assert_eq!(time.last(), Some(&10e-3));
        assert!(time.windows(2).all(|w| w[1] > w[0]));

        let out = result.signal("out").unwrap();
        assert_eq!(out.len(), time.len());
        assert!((out.last().unwrap() - 1.0).abs() < 1e-3);

        // One time constant in
        let k = time.iter().position(|&t| t >= 1e-3).unwrap();
        let expected = 1.0 - (-time[k] / 1e-3).exp();
        assert!((out[k] - expected).abs() < 0.02, "v({}) = {}", time[k], out[k]);
    }

    #[test]
    fn test_reruns_are_identical() {
        let first = rc_step().transient(&TransientParams::new(5e-3, 50)).unwrap();
        let second = rc_step().transient(&TransientParams::new(5e-3, 50)).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_resumed_run_matches_one_shot() {
        let params = TransientParams::new(5e-3, 50);
        let one_shot = rc_step().transient(&params).unwrap();

        let mut ckt = rc_step();
        let mut run = ckt.tran_start(&params).unwrap();
        let mut calls = 0;
        let resumed = loop {
            calls += 1;
            match ckt.tran_steps(&mut run, StepBudget::steps(7)).unwrap() {
                StepStatus::Continue { progress } => assert!((0.0..=1.0).contains(&progress)),
                StepStatus::Done(result) => break result,
            }
        };
        assert!(calls > 1);
        assert_eq!(resumed, one_shot);
    }

    #[test]
    fn test_stop_flag() {
        let mut ckt = rc_step();
        let mut run = ckt.tran_start(&TransientParams::new(10e-3, 100)).unwrap();
        let status = ckt.tran_steps(&mut run, StepBudget::steps(5)).unwrap();
        assert!(matches!(status, StepStatus::Continue { .. }));

        run.request_stop();
        match ckt.tran_steps(&mut run, StepBudget::unlimited()).unwrap() {
            StepStatus::Done(result) => {
                assert!(result.time().len() < 10);
                assert!(*result.time().last().unwrap() < 10e-3);
            }
            other => panic!("expected a stopped run, got {:?}", other),
        }
    }

    #[test]
    fn test_breakpoints_are_hit() {
        let mut ckt = Circuit::new();
        let a = ckt.net("in").unwrap();
        let b = ckt.net("out").unwrap();
        let src = Source::parse("pwl(0,0, 1m,0, 1.001m,1)").unwrap();
        ckt.voltage_source(a, GROUND, src, None).unwrap();
        ckt.resistor(a, b, 1e3, None).unwrap();
        ckt.capacitor(b, GROUND, 1e-9, None).unwrap();

        let result = ckt.transient(&TransientParams::new(2e-3, 10)).unwrap();
        let time = result.time();
        assert!(time.iter().any(|&t| (t - 1e-3).abs() < 1e-12));
        assert!(time.iter().any(|&t| (t - 1.001e-3).abs() < 1e-12));
    }

    #[test]
    fn test_dc_failure_falls_back_to_zero_state() {
        let mut ckt = Circuit::new();
        ckt.options.dc_max_iters = 1;
        let a = ckt.net("in").unwrap();
        let b = ckt.net("out").unwrap();
        ckt.voltage_source(a, GROUND, Source::dc(1.0), None).unwrap();
        ckt.resistor(a, b, 1e3, None).unwrap();
        ckt.capacitor(b, GROUND, 1e-6, None).unwrap();

        // A converged DC would start the capacitor at 1 V
        let result = ckt.transient(&TransientParams::new(1e-3, 20)).unwrap();
        let out = result.signal("out").unwrap();
        assert!(out[0] < 1e-3);
        assert!(out.last().unwrap() > &0.5);
    }

    #[test]
    fn test_newton_failure_at_min_step() {
        let mut ckt = Circuit::new();
        ckt.options.max_tran_iters = 1;
        let a = ckt.net("in").unwrap();
        let b = ckt.net("out").unwrap();
        ckt.voltage_source(a, GROUND, Source::parse("step(0,5,0,1p)").unwrap(), Some("V1"))
            .unwrap();
        ckt.resistor(a, b, 1e3, None).unwrap();
        ckt.capacitor(b, GROUND, 1e-9, None).unwrap();
        ckt.diode(b, GROUND, 1.0, DiodeType::Normal, None).unwrap();

        let mut run = ckt.tran_start(&TransientParams::new(1e-6, 100)).unwrap();
        let err = ckt.tran_steps(&mut run, StepBudget::unlimited()).unwrap_err();
        assert!(matches!(err, SimError::TimestepTooSmall { time, .. } if time < 1e-6));

        // Whatever was accepted before the failure is still aligned
        let partial = ckt.transient_result(&run);
        let time = partial.time();
        assert!(!time.is_empty());
        assert!(*time.last().unwrap() < 1e-6);
        assert!(partial.signals.values().all(|series| series.len() == time.len()));
    }

    #[test]
    fn test_step_limit_ends_run_early() {
        let mut ckt = rc_step();
        ckt.options.max_steps_per_period = 3;
        let result = ckt.transient(&TransientParams::new(10e-3, 100)).unwrap();

        let time = result.time();
        assert_eq!(time.len(), 3);
        assert!(*time.last().unwrap() < 10e-3);
        assert_eq!(result.signal("out").unwrap().len(), 3);
    }

    #[test]
    fn test_zero_frequency_sine_runs() {
        let mut ckt = Circuit::new();
        let a = ckt.net("in").unwrap();
        let b = ckt.net("out").unwrap();
        // Constant 2 V: offset 1 plus amplitude 1 held at 90 degrees
        ckt.voltage_source(a, GROUND, Source::parse("sin(1,1,0,0,90)").unwrap(), None)
            .unwrap();
        ckt.resistor(a, b, 1e3, None).unwrap();
        ckt.capacitor(b, GROUND, 1e-6, None).unwrap();

        let result = ckt.transient(&TransientParams::new(5e-3, 50)).unwrap();
        assert_eq!(result.time().last(), Some(&5e-3));
        assert!(result.signal("out").unwrap().iter().all(|v| (v - 2.0).abs() < 1e-3));
    }

    #[test]
    fn test_invalid_interval() {
        let mut ckt = rc_step();
        let params = TransientParams {
            tstart: 1.0,
            tstop: 1.0,
            ntpts: 10,
            probes: Vec::new(),
        };
        assert!(matches!(ckt.tran_start(&params), Err(SimError::InvalidAnalysis(_))));
    }
}
