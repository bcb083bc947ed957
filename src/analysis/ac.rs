//! AC small-signal analysis around the DC operating point.
//!
//! The complex system `(G + jwC) x = b` is solved in real arithmetic as
//!
//! ```text
//! [ G   -wC ] [ x_re ]   [ b ]
//! [ wC   G  ] [ x_im ] = [ 0 ]
//! ```

use std::collections::BTreeMap;
use std::f64::consts::{LN_10, PI};

use log::info;
use nalgebra::{DMatrix, DVector};
use serde::Serialize;

use crate::circuit::Circuit;
use crate::devices::{Device, Stamp};
use crate::error::{Result, SimError};
use crate::solver;

/// Relative slack so rounding in the sweep doesn't drop `fstop`
const FSTOP_SLACK: f64 = 1.0001;

/// Magnitude and phase (degrees) per node over a log frequency sweep
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AcResult {
    pub signals: BTreeMap<String, Vec<f64>>,
}

impl AcResult {
    /// Key of the frequency axis (Hz)
    pub const FREQUENCIES: &'static str = "_frequencies_";

    pub fn frequencies(&self) -> &[f64] {
        self.signals
            .get(Self::FREQUENCIES)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn magnitude(&self, node: &str) -> Option<&[f64]> {
        self.signals.get(node).map(Vec::as_slice)
    }

    pub fn phase(&self, node: &str) -> Option<&[f64]> {
        self.signals.get(&format!("{}_phase", node)).map(Vec::as_slice)
    }
}

impl Circuit {
    /// Sweep `npts` points per decade from `fstart` to `fstop`, driving the
    /// voltage or current source named `source` with a unit excitation.
    pub fn ac(&mut self, npts: usize, fstart: f64, fstop: f64, source: &str) -> Result<AcResult> {
        if npts == 0 {
            return Err(SimError::InvalidAnalysis(
                "AC sweep needs at least one point per decade".to_string(),
            ));
        }
        if !(fstart > 0.0) || !(fstart <= fstop) || !fstop.is_finite() {
            return Err(SimError::InvalidAnalysis(format!(
                "AC sweep range [{}, {}] is not a positive frequency range",
                fstart, fstop
            )));
        }
        let excitation = match self.device_map.get(source).map(|&i| &self.devices[i]) {
            Some(d @ Device::VSource(_)) | Some(d @ Device::ISource(_)) => d.clone(),
            _ => return Err(SimError::UnknownAcSource(source.to_string())),
        };

        self.dc()?;

        let sys = self
            .mna
            .as_mut()
            .ok_or(SimError::NotFinalized("AC analysis"))?;
        let n = sys.size;
        let mut rhs = DVector::zeros(n);
        excitation.load_ac(sys, &mut rhs);

        let mut response: Vec<Vec<f64>> = vec![Vec::new(); 2 * n];
        let mut frequencies = Vec::new();
        let mut phase_offset = vec![0.0; n];
        let mut matrix = DMatrix::zeros(2 * n, 2 * n + 1);

        let delta_f = (LN_10 / npts as f64).exp();
        let fstop = fstop * FSTOP_SLACK;
        let mut f = fstart;
        while f <= fstop {
            let omega = 2.0 * PI * f;
            frequencies.push(f);

            for i in 0..n {
                matrix[(i, 2 * n)] = rhs[i];
                matrix[(i + n, 2 * n)] = 0.0;
                for j in 0..n {
                    matrix[(i, j)] = sys.g[(i, j)];
                    matrix[(i + n, j + n)] = sys.g[(i, j)];
                    matrix[(i, j + n)] = -omega * sys.c[(i, j)];
                    matrix[(i + n, j)] = omega * sys.c[(i, j)];
                }
            }
            let x = solver::solve_augmented(&mut matrix);

            for i in 0..n {
                let (re, im) = (x[i], x[i + n]);
                response[i].push(re.hypot(im));

                // Keep successive samples within 90 degrees
                let phase = im.atan2(re).to_degrees();
                if let Some(&last) = response[i + n].last() {
                    let jump = phase + phase_offset[i] - last;
                    if jump > 90.0 {
                        phase_offset[i] -= 360.0;
                    } else if jump < -90.0 {
                        phase_offset[i] += 360.0;
                    }
                }
                response[i + n].push(phase + phase_offset[i]);
            }
            f *= delta_f;
        }
        info!("AC analysis done: {} frequencies", frequencies.len());

        let npoints = frequencies.len();
        let mut signals = BTreeMap::new();
        for (name, node) in &self.node_map {
            let (magnitude, phase) = match node {
                Some(i) => (response[*i].clone(), response[*i + n].clone()),
                None => (vec![0.0; npoints], vec![0.0; npoints]),
            };
            signals.insert(name.clone(), magnitude);
            signals.insert(format!("{}_phase", name), phase);
        }
        signals.insert(AcResult::FREQUENCIES.to_string(), frequencies);
        Ok(AcResult { signals })
    }
}
