use crate::mna::{MnaSystem, Node};

use super::Stamp;

/// Linear resistor. A zero resistance is built as a 0 V source instead.
#[derive(Debug, Clone)]
pub struct Resistor {
    pub name: String,
    pub n1: Node,
    pub n2: Node,
    pub resistance: f64,
}

impl Resistor {
    pub fn new(name: String, n1: Node, n2: Node, resistance: f64) -> Self {
        Resistor {
            name,
            n1,
            n2,
            resistance,
        }
    }
}

impl Stamp for Resistor {
    fn load_linear(&self, sys: &mut MnaSystem) {
        sys.add_conductance_l(self.n1, self.n2, 1.0 / self.resistance);
    }
}

#[derive(Debug, Clone)]
pub struct Capacitor {
    pub name: String,
    pub n1: Node,
    pub n2: Node,
    pub capacitance: f64,
}

impl Capacitor {
    pub fn new(name: String, n1: Node, n2: Node, capacitance: f64) -> Self {
        Capacitor {
            name,
            n1,
            n2,
            capacitance,
        }
    }
}

impl Stamp for Capacitor {
    fn load_linear(&self, sys: &mut MnaSystem) {
        sys.add_capacitance(self.n1, self.n2, self.capacitance);
    }
}

/// Inductor with its own branch-current unknown. At DC the branch row reads
/// `v2 - v1 = 0`, a short; the inductance sits on the branch diagonal of `c`.
#[derive(Debug, Clone)]
pub struct Inductor {
    pub name: String,
    pub n1: Node,
    pub n2: Node,
    pub branch: usize,
    pub inductance: f64,
}

impl Inductor {
    pub fn new(name: String, n1: Node, n2: Node, branch: usize, inductance: f64) -> Self {
        Inductor {
            name,
            n1,
            n2,
            branch,
            inductance,
        }
    }
}

impl Stamp for Inductor {
    fn load_linear(&self, sys: &mut MnaSystem) {
        let br = Some(self.branch);
        sys.add_to_gl(self.n1, br, 1.0);
        sys.add_to_gl(self.n2, br, -1.0);
        sys.add_to_gl(br, self.n1, -1.0);
        sys.add_to_gl(br, self.n2, 1.0);
        sys.add_to_c(br, br, self.inductance);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mna::{NodeType, GROUND};

    #[test]
    fn test_inductor_stamp() {
        let mut sys = MnaSystem::new(
            vec![NodeType::Voltage, NodeType::Current],
            vec![1e-6, 1e-12],
            vec![0.0; 2],
        );
        Inductor::new("L1".into(), Some(0), GROUND, 1, 1e-3).load_linear(&mut sys);

        assert_eq!(sys.gl[(0, 1)], 1.0);
        assert_eq!(sys.gl[(1, 0)], -1.0);
        assert_eq!(sys.c[(1, 1)], 1e-3);
        assert_eq!(sys.c[(0, 0)], 0.0);
    }

    #[test]
    fn test_resistor_and_capacitor_stamps() {
        let mut sys = MnaSystem::new(vec![NodeType::Voltage; 2], vec![1e-6; 2], vec![0.0; 2]);
        Resistor::new("R1".into(), Some(0), Some(1), 100.0).load_linear(&mut sys);
        Capacitor::new("C1".into(), Some(1), GROUND, 1e-9).load_linear(&mut sys);

        assert!((sys.gl[(0, 0)] - 0.01).abs() < 1e-15);
        assert!((sys.gl[(0, 1)] + 0.01).abs() < 1e-15);
        assert_eq!(sys.c[(1, 1)], 1e-9);
    }
}
