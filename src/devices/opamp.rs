use crate::mna::{MnaSystem, Node};

use super::Stamp;

/// Voltage-controlled voltage source with finite gain. The branch row reads
/// `(Vout - Vgnd)/A - (V+ - V-) = 0` and the branch current flows into the
/// output node.
#[derive(Debug, Clone)]
pub struct Opamp {
    pub name: String,
    pub np: Node,
    pub nn: Node,
    pub no: Node,
    pub ng: Node,
    pub branch: usize,
    pub gain: f64,
}

impl Opamp {
    pub fn new(name: String, np: Node, nn: Node, no: Node, ng: Node, branch: usize, gain: f64) -> Self {
        Opamp {
            name,
            np,
            nn,
            no,
            ng,
            branch,
            gain,
        }
    }
}

impl Stamp for Opamp {
    fn load_linear(&self, sys: &mut MnaSystem) {
        let br = Some(self.branch);
        let inv_gain = 1.0 / self.gain;
        sys.add_to_gl(self.no, br, 1.0);
        sys.add_to_gl(self.ng, br, -1.0);
        sys.add_to_gl(br, self.no, inv_gain);
        sys.add_to_gl(br, self.ng, -inv_gain);
        sys.add_to_gl(br, self.np, -1.0);
        sys.add_to_gl(br, self.nn, 1.0);
    }
}
