use nalgebra::DVector;

use crate::mna::{add_to_rhs, MnaSystem, Node};
use crate::source::Source;

use super::Stamp;

/// Independent voltage source; its branch current is an unknown
#[derive(Debug, Clone)]
pub struct VSource {
    pub name: String,
    pub npos: Node,
    pub nneg: Node,
    pub branch: usize,
    pub src: Source,
}

impl VSource {
    pub fn new(name: String, npos: Node, nneg: Node, branch: usize, src: Source) -> Self {
        VSource {
            name,
            npos,
            nneg,
            branch,
            src,
        }
    }
}

impl Stamp for VSource {
    fn load_linear(&self, sys: &mut MnaSystem) {
        let br = Some(self.branch);
        sys.add_to_gl(br, self.npos, 1.0);
        sys.add_to_gl(br, self.nneg, -1.0);
        sys.add_to_gl(self.npos, br, 1.0);
        sys.add_to_gl(self.nneg, br, -1.0);
    }

    fn load_dc(&self, _sys: &mut MnaSystem, _soln: &DVector<f64>, rhs: &mut DVector<f64>) {
        rhs[self.branch] += self.src.dc;
    }

    fn load_tran(&self, _sys: &mut MnaSystem, _soln: &DVector<f64>, rhs: &mut DVector<f64>, time: f64) {
        rhs[self.branch] += self.src.value(time);
    }

    fn load_ac(&self, _sys: &mut MnaSystem, rhs: &mut DVector<f64>) {
        rhs[self.branch] += 1.0;
    }

    fn breakpoint(&self, time: f64) -> Option<f64> {
        self.src.inflection_point(time)
    }
}

/// Independent current source, flowing from `npos` through the source to
/// `nneg`. Open circuit in small-signal analysis unless it is the excitation.
#[derive(Debug, Clone)]
pub struct ISource {
    pub name: String,
    pub npos: Node,
    pub nneg: Node,
    pub src: Source,
}

impl ISource {
    pub fn new(name: String, npos: Node, nneg: Node, src: Source) -> Self {
        ISource { name, npos, nneg, src }
    }

    fn inject(&self, rhs: &mut DVector<f64>, is: f64) {
        add_to_rhs(rhs, self.npos, -is);
        add_to_rhs(rhs, self.nneg, is);
    }
}

impl Stamp for ISource {
    fn load_dc(&self, _sys: &mut MnaSystem, _soln: &DVector<f64>, rhs: &mut DVector<f64>) {
        self.inject(rhs, self.src.dc);
    }

    fn load_tran(&self, _sys: &mut MnaSystem, _soln: &DVector<f64>, rhs: &mut DVector<f64>, time: f64) {
        self.inject(rhs, self.src.value(time));
    }

    fn load_ac(&self, _sys: &mut MnaSystem, rhs: &mut DVector<f64>) {
        self.inject(rhs, 1.0);
    }

    fn breakpoint(&self, time: f64) -> Option<f64> {
        self.src.inflection_point(time)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mna::{NodeType, GROUND};

    fn sys() -> MnaSystem {
        MnaSystem::new(
            vec![NodeType::Voltage, NodeType::Voltage, NodeType::Current],
            vec![1e-6, 1e-6, 1e-12],
            vec![0.0; 3],
        )
    }

    #[test]
    fn test_vsource_branch_row() {
        let mut sys = sys();
        let src = Source::parse("step(1,3,1m)").unwrap();
        let v = VSource::new("V1".into(), Some(0), Some(1), 2, src);
        v.load_linear(&mut sys);

        assert_eq!(sys.gl[(2, 0)], 1.0);
        assert_eq!(sys.gl[(2, 1)], -1.0);
        assert_eq!(sys.gl[(1, 2)], -1.0);

        let soln = DVector::zeros(3);
        let mut rhs = DVector::zeros(3);
        v.load_dc(&mut sys, &soln, &mut rhs);
        assert_eq!(rhs[2], 1.0);

        rhs.fill(0.0);
        v.load_tran(&mut sys, &soln, &mut rhs, 1.0);
        assert_eq!(rhs[2], 3.0);
        assert_eq!(v.breakpoint(0.0), Some(1e-3));
    }

    #[test]
    fn test_isource_injection() {
        let mut sys = sys();
        let i = ISource::new("I1".into(), Some(0), GROUND, Source::dc(2e-3));
        let soln = DVector::zeros(3);
        let mut rhs = DVector::zeros(3);
        i.load_dc(&mut sys, &soln, &mut rhs);
        assert_eq!(rhs[0], -2e-3);

        rhs.fill(0.0);
        i.load_ac(&mut sys, &mut rhs);
        assert_eq!(rhs[0], -1.0);
        assert_eq!(rhs[1], 0.0);
    }
}
