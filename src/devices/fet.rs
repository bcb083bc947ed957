use nalgebra::DVector;

use crate::mna::{add_to_rhs, two_terminal_value, MnaSystem, Node, GROUND};

use super::Stamp;

const THRESHOLD_VOLTAGE: f64 = 0.5;
const CHANNEL_LENGTH_MODULATION: f64 = 0.05;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetType {
    N,
    P,
}

impl FetType {
    fn sign(&self) -> f64 {
        match self {
            FetType::N => 1.0,
            FetType::P => -1.0,
        }
    }

    /// Process transconductance K' in A/V^2
    fn kp(&self) -> f64 {
        match self {
            FetType::N => 120e-6,
            FetType::P => 25e-6,
        }
    }
}

/// Drain current and its derivatives at one bias point
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FetOperatingPoint {
    /// Signed drain current
    pub ids: f64,
    pub gds: f64,
    pub gm: f64,
    /// Whether drain and source traded roles
    pub swapped: bool,
}

/// Square-law MOSFET without a bulk terminal; `W` and `L` are in units of
/// the 0.25 um process lambda.
#[derive(Debug, Clone)]
pub struct Fet {
    pub name: String,
    pub d: Node,
    pub g: Node,
    pub s: Node,
    pub width: f64,
    pub length: f64,
    pub fet_type: FetType,
    beta: f64,
}

impl Fet {
    pub fn new(name: String, d: Node, g: Node, s: Node, width: f64, length: f64, fet_type: FetType) -> Self {
        Fet {
            name,
            d,
            g,
            s,
            width,
            length,
            fet_type,
            beta: fet_type.kp() * width / length,
        }
    }

    /// Evaluate the channel at `soln`. `None` means cutoff.
    pub fn operating_point(&self, soln: &DVector<f64>) -> Option<FetOperatingPoint> {
        let sign = self.fet_type.sign();
        let (_, s, swapped) = self.oriented(soln);
        let vds = sign * self.vds(soln, swapped);
        let vgs = sign * two_terminal_value(soln, self.g, s);
        let vgst = vgs - THRESHOLD_VOLTAGE;
        if vgst <= 0.0 {
            return None;
        }

        let lambda = CHANNEL_LENGTH_MODULATION;
        let beta = self.beta;
        let (ids, gds, gm) = if vgst < vds {
            // Saturation
            let gm = beta * (1.0 + lambda * vds) * vgst;
            (sign * 0.5 * gm * vgst, 0.5 * beta * vgst * vgst * lambda, gm)
        } else {
            let gm = beta * (1.0 + lambda * vds);
            let ids = sign * gm * vds * (vgst - 0.5 * vds);
            let gds = gm * (vgst - vds) + beta * lambda * vds * (vgst - 0.5 * vds);
            (ids, gds, gm * vds)
        };
        Some(FetOperatingPoint { ids, gds, gm, swapped })
    }

    /// Drain and source as the current bias sees them
    fn oriented(&self, soln: &DVector<f64>) -> (Node, Node, bool) {
        if self.fet_type.sign() * self.vds(soln, false) < 0.0 {
            (self.s, self.d, true)
        } else {
            (self.d, self.s, false)
        }
    }

    fn vds(&self, soln: &DVector<f64>, swapped: bool) -> f64 {
        if swapped {
            two_terminal_value(soln, self.s, self.d)
        } else {
            two_terminal_value(soln, self.d, self.s)
        }
    }
}

impl Stamp for Fet {
    fn load_linear(&self, sys: &mut MnaSystem) {
        // Diffusions are 4 lambda long, no sidewall on the channel side
        let w = self.width * 0.25;
        let l = 4.0 * 0.25;
        let diffusion = 2000e-18 * w * l + 500e-18 * (w + 2.0 * l);
        sys.add_capacitance(self.d, GROUND, diffusion);
        sys.add_capacitance(self.s, GROUND, diffusion);

        let gate_l = self.length * 0.25;
        sys.add_capacitance(self.g, GROUND, 6000e-18 * w * gate_l);
    }

    fn load_dc(&self, sys: &mut MnaSystem, soln: &DVector<f64>, rhs: &mut DVector<f64>) {
        let op = match self.operating_point(soln) {
            Some(op) => op,
            None => return,
        };
        let (d, s) = if op.swapped { (self.s, self.d) } else { (self.d, self.s) };
        let g = self.g;

        add_to_rhs(rhs, d, -op.ids);
        add_to_rhs(rhs, s, op.ids);
        sys.add_conductance(d, s, op.gds);
        sys.add_to_g(s, s, op.gm);
        sys.add_to_g(d, s, -op.gm);
        sys.add_to_g(d, g, op.gm);
        sys.add_to_g(s, g, -op.gm);
    }
}
