use nalgebra::{DMatrix, DVector};
use serde::Serialize;

/// Index of an unknown in the MNA system; ground has no row or column
pub type Node = Option<usize>;

/// The ground node
pub const GROUND: Node = None;

/// Whether an unknown is a node voltage or a branch current
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum NodeType {
    Voltage,
    Current,
}

/// MNA system representation: `G x = rhs` at DC, with `C` adding the
/// reactive terms in transient and AC analysis.
///
/// `gl` holds the linear time-invariant conductances stamped once at
/// finalize; `g` starts each Newton iteration as a copy of `gl` and picks up
/// the nonlinear device Jacobians. `matrix` is the system actually solved.
#[derive(Debug, Clone)]
pub struct MnaSystem {
    /// Total system size
    pub size: usize,
    pub node_types: Vec<NodeType>,
    pub gl: DMatrix<f64>,
    pub g: DMatrix<f64>,
    pub c: DMatrix<f64>,
    pub matrix: DMatrix<f64>,
    /// Last converged solution
    pub solution: DVector<f64>,
    /// Largest magnitude each unknown has reached
    pub soln_max: DVector<f64>,
    /// Absolute tolerance per unknown
    pub abstol: DVector<f64>,
}

impl MnaSystem {
    /// Allocate a zeroed system. `initial` seeds the solution.
    pub fn new(node_types: Vec<NodeType>, abstol: Vec<f64>, initial: Vec<f64>) -> Self {
        let size = node_types.len();
        MnaSystem {
            size,
            node_types,
            gl: DMatrix::zeros(size, size),
            g: DMatrix::zeros(size, size),
            c: DMatrix::zeros(size, size),
            matrix: DMatrix::zeros(size, size),
            solution: DVector::from_vec(initial),
            soln_max: DVector::zeros(size),
            abstol: DVector::from_vec(abstol),
        }
    }

    pub fn is_voltage(&self, i: usize) -> bool {
        self.node_types[i] == NodeType::Voltage
    }

    pub fn add_to_gl(&mut self, i: Node, j: Node, v: f64) {
        if let (Some(i), Some(j)) = (i, j) {
            self.gl[(i, j)] += v;
        }
    }

    pub fn add_to_g(&mut self, i: Node, j: Node, v: f64) {
        if let (Some(i), Some(j)) = (i, j) {
            self.g[(i, j)] += v;
        }
    }

    pub fn add_to_c(&mut self, i: Node, j: Node, v: f64) {
        if let (Some(i), Some(j)) = (i, j) {
            self.c[(i, j)] += v;
        }
    }

    /// Linear conductance between two nodes
    pub fn add_conductance_l(&mut self, i: Node, j: Node, g: f64) {
        add_two_terminal(&mut self.gl, i, j, g);
    }

    /// Nonlinear (per-iteration) conductance between two nodes
    pub fn add_conductance(&mut self, i: Node, j: Node, g: f64) {
        add_two_terminal(&mut self.g, i, j, g);
    }

    pub fn add_capacitance(&mut self, i: Node, j: Node, c: f64) {
        add_two_terminal(&mut self.c, i, j, c);
    }
}

/// Stamp a two-terminal element of value `g` between `i` and `j`
pub fn add_two_terminal(m: &mut DMatrix<f64>, i: Node, j: Node, g: f64) {
    if let Some(i) = i {
        m[(i, i)] += g;
        if let Some(j) = j {
            m[(i, j)] -= g;
        }
    }
    if let Some(j) = j {
        m[(j, j)] += g;
        if let Some(i) = i {
            m[(j, i)] -= g;
        }
    }
}

/// Value of an unknown, ground reads as zero
pub fn node_value(x: &DVector<f64>, n: Node) -> f64 {
    n.map_or(0.0, |i| x[i])
}

/// `x[i] - x[j]`, ground reads as zero
pub fn two_terminal_value(x: &DVector<f64>, i: Node, j: Node) -> f64 {
    node_value(x, i) - node_value(x, j)
}

/// Add `v` to one rhs entry unless it is ground
pub fn add_to_rhs(rhs: &mut DVector<f64>, i: Node, v: f64) {
    if let Some(i) = i {
        rhs[i] += v;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn system(n: usize) -> MnaSystem {
        MnaSystem::new(vec![NodeType::Voltage; n], vec![1e-6; n], vec![0.0; n])
    }

    #[test]
    fn test_two_terminal_stamp() {
        let mut sys = system(2);
        sys.add_conductance_l(Some(0), Some(1), 2.0);

        assert_eq!(sys.gl, DMatrix::from_row_slice(2, 2, &[2.0, -2.0, -2.0, 2.0]));
    }

    #[test]
    fn test_ground_terminal_is_skipped() {
        let mut sys = system(2);
        sys.add_conductance(Some(1), GROUND, 0.5);
        sys.add_to_c(GROUND, Some(0), 1.0);

        assert_eq!(sys.g, DMatrix::from_row_slice(2, 2, &[0.0, 0.0, 0.0, 0.5]));
        assert_eq!(sys.c, DMatrix::zeros(2, 2));
    }

    #[test]
    fn test_terminal_values() {
        let x = DVector::from_vec(vec![3.0, 1.0]);
        assert_eq!(two_terminal_value(&x, Some(0), Some(1)), 2.0);
        assert_eq!(two_terminal_value(&x, GROUND, Some(0)), -3.0);

        let mut rhs = DVector::zeros(2);
        add_to_rhs(&mut rhs, Some(1), 4.0);
        add_to_rhs(&mut rhs, GROUND, 4.0);
        assert_eq!(rhs, DVector::from_vec(vec![0.0, 4.0]));
    }
}
