use nalgebra::DVector;

use crate::mna::{add_to_rhs, two_terminal_value, MnaSystem, Node};

use super::Stamp;

const SATURATION_CURRENT: f64 = 1.0e-14;
/// Past this exponent the exponential is extrapolated quadratically
const EXP_ARG_MAX: f64 = 50.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiodeType {
    Normal,
    Ideal,
}

impl DiodeType {
    /// Anything other than "ideal" is a normal junction
    pub fn from_name(name: &str) -> Self {
        if name.eq_ignore_ascii_case("ideal") {
            DiodeType::Ideal
        } else {
            DiodeType::Normal
        }
    }

    fn thermal_voltage(&self) -> f64 {
        match self {
            DiodeType::Normal => 25.8e-3,
            DiodeType::Ideal => 0.1e-3,
        }
    }
}

/// Junction diode, `I = area * Is * (exp(Vd/Vt) - 1)`
#[derive(Debug, Clone)]
pub struct Diode {
    pub name: String,
    pub anode: Node,
    pub cathode: Node,
    pub area: f64,
    pub diode_type: DiodeType,
    ais: f64,
    vt: f64,
}

impl Diode {
    pub fn new(name: String, anode: Node, cathode: Node, area: f64, diode_type: DiodeType) -> Self {
        Diode {
            name,
            anode,
            cathode,
            area,
            diode_type,
            ais: area * SATURATION_CURRENT,
            vt: diode_type.thermal_voltage(),
        }
    }

    /// Current and small-signal conductance at junction voltage `vd`
    pub fn current(&self, vd: f64) -> (f64, f64) {
        let exp_arg = vd / self.vt;
        let abs_exp_arg = exp_arg.abs();
        let d_arg = abs_exp_arg - EXP_ARG_MAX;

        // temp1 is the exponential, temp2 its derivative
        let (mut temp1, mut temp2) = if d_arg > 0.0 {
            let exp_max = EXP_ARG_MAX.exp();
            (exp_max * (1.0 + d_arg + 0.5 * d_arg * d_arg), exp_max * (1.0 + d_arg))
        } else {
            let e = abs_exp_arg.exp();
            (e, e)
        };
        if exp_arg < 0.0 {
            temp1 = 1.0 / temp1;
            temp2 = temp1 * temp2 * temp1;
        }

        (self.ais * (temp1 - 1.0), self.ais * temp2 / self.vt)
    }
}

impl Stamp for Diode {
    fn load_dc(&self, sys: &mut MnaSystem, soln: &DVector<f64>, rhs: &mut DVector<f64>) {
        let vd = two_terminal_value(soln, self.anode, self.cathode);
        let (id, gd) = self.current(vd);

        add_to_rhs(rhs, self.anode, -id);
        add_to_rhs(rhs, self.cathode, id);
        sys.add_conductance(self.anode, self.cathode, gd);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mna::GROUND;

    fn diode() -> Diode {
        Diode::new("D1".into(), Some(0), GROUND, 1.0, DiodeType::Normal)
    }

    #[test]
    fn test_forward_bias() {
        let (id, gd) = diode().current(0.7);
        let expected = 1e-14 * ((0.7f64 / 25.8e-3).exp() - 1.0);
        assert!((id - expected).abs() < 1e-12 * expected);
        assert!((gd - (id + 1e-14) / 25.8e-3).abs() < 1e-9 * gd);
    }

    #[test]
    fn test_reverse_bias_saturates() {
        let (id, gd) = diode().current(-5.0);
        assert!((id + 1e-14).abs() < 1e-20);
        assert!(gd >= 0.0 && gd < 1e-20);
    }

    #[test]
    fn test_extreme_bias_stays_finite() {
        let d = diode();
        for vd in [10.0, 100.0, 1e4, -1e4] {
            let (id, gd) = d.current(vd);
            assert!(id.is_finite() && gd.is_finite(), "vd = {}", vd);
        }
        // Value and slope match at the switch-over point
        let edge = EXP_ARG_MAX * 25.8e-3;
        let (below, _) = d.current(edge - 1e-12);
        let (above, _) = d.current(edge + 1e-12);
        assert!((above - below).abs() < 1e-6 * below);
    }

    #[test]
    fn test_ideal_type() {
        assert_eq!(DiodeType::from_name("ideal"), DiodeType::Ideal);
        assert_eq!(DiodeType::from_name("normal"), DiodeType::Normal);
        let ideal = Diode::new("D2".into(), Some(0), GROUND, 1.0, DiodeType::Ideal);
        let (id, _) = ideal.current(4e-3);
        assert!(id > 1e-14 * 1e17);
    }
}
