//! DC operating point analysis.
//!
//! Capacitors are open and inductors shorted (their branch row only carries
//! the `Gl` coupling); the nonlinear devices are solved by Newton iteration.

use log::info;
use nalgebra::DVector;

use super::OperatingPoint;
use crate::circuit::Circuit;
use crate::devices::{Device, Stamp};
use crate::error::{Result, SimError};
use crate::mna::MnaSystem;
use crate::newton::find_solution;

/// `rhs = -Gl x - f(x)`, `matrix = G = Gl + df/dx`
pub(crate) fn load_dc(devices: &[Device], sys: &mut MnaSystem, soln: &DVector<f64>, rhs: &mut DVector<f64>) {
    rhs.gemv(-1.0, &sys.gl, soln, 0.0);
    sys.g.copy_from(&sys.gl);
    for device in devices {
        device.load_dc(sys, soln, rhs);
    }
    sys.matrix.copy_from(&sys.g);
}

impl Circuit {
    /// Find the operating point. Returns every named node voltage (ground is
    /// 0) and `I(name)` for every voltage source.
    pub fn dc(&mut self) -> Result<OperatingPoint> {
        self.finalize()?;

        let max_iters = self.options.dc_max_iters;
        let options = &self.options;
        let devices = &self.devices;
        let sys = self
            .mna
            .as_mut()
            .ok_or(SimError::NotFinalized("DC analysis"))?;

        match find_solution(sys, options, max_iters, |sys, soln, rhs| load_dc(devices, sys, soln, rhs)) {
            Ok(iterations) => {
                info!("DC operating point found in {} iterations", iterations);
                self.diddc = true;
                let solution = sys.solution.clone();
                Ok(self.named_values(&solution))
            }
            Err(failure) => {
                let node = failure
                    .problem_node
                    .map(|i| self.unknown_name(i))
                    .unwrap_or_else(|| "unknown".to_string());
                if self.has_current_sources() {
                    Err(SimError::DcFloatingCurrentSource { node })
                } else {
                    Err(SimError::DcNoConvergence { node })
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::circuit::Circuit;
    use crate::devices::DiodeType;
    use crate::mna::GROUND;
    use crate::source::Source;

    #[test]
    fn test_resistor_divider() {
        let mut ckt = Circuit::new();
        let a = ckt.net("a").unwrap();
        let b = ckt.net("b").unwrap();
        ckt.voltage_source(a, GROUND, Source::dc(10.0), Some("V1")).unwrap();
        ckt.resistor(a, b, 1e3, None).unwrap();
        ckt.resistor(b, GROUND, 1e3, None).unwrap();

        let op = ckt.dc().unwrap();
        assert!((op["b"] - 5.0).abs() < 1e-6);
        assert!((op["a"] - 10.0).abs() < 1e-6);
        // Branch current is measured into the + terminal
        assert!((op["I(V1)"] + 5e-3).abs() < 1e-9);
    }

    #[test]
    fn test_diode_forward_drop() {
        let mut ckt = Circuit::new();
        let a = ckt.net("a").unwrap();
        let k = ckt.net("k").unwrap();
        ckt.voltage_source(a, GROUND, Source::dc(5.0), None).unwrap();
        ckt.resistor(a, k, 1e3, None).unwrap();
        ckt.diode(k, GROUND, 1.0, DiodeType::Normal, None).unwrap();

        let op = ckt.dc().unwrap();
        assert!(op["k"] > 0.6 && op["k"] < 0.8, "diode drop {}", op["k"]);
    }

    #[test]
    fn test_inductor_is_short_at_dc() {
        let mut ckt = Circuit::new();
        let a = ckt.net("a").unwrap();
        let b = ckt.net("b").unwrap();
        ckt.voltage_source(a, GROUND, Source::dc(1.0), Some("V1")).unwrap();
        ckt.resistor(a, b, 1e3, None).unwrap();
        ckt.inductor(b, GROUND, 1e-3, None).unwrap();

        let op = ckt.dc().unwrap();
        assert!(op["b"].abs() < 1e-9);
        assert!((op["I(V1)"].abs() - 1e-3).abs() < 1e-9);
    }

    #[test]
    fn test_nonconvergence_wording() {
        let mut ckt = Circuit::new();
        ckt.options.dc_max_iters = 1;
        let a = ckt.net("a").unwrap();
        ckt.current_source(a, GROUND, Source::dc(-1e-3), None).unwrap();
        ckt.resistor(a, GROUND, 1e3, None).unwrap();

        let err = ckt.dc().unwrap_err();
        assert!(err.is_dc_nonconvergence());
        assert!(err.to_string().contains("current sources"));
        assert!(err.to_string().contains("worst unknown: a"));
        assert!(!ckt.diddc);
    }
}
