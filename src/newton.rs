use log::{debug, trace};
use nalgebra::DVector;

use crate::mna::MnaSystem;
use crate::options::SimOptions;
use crate::solver;

/// Newton iteration gave up; `problem_node` is the last unknown whose update
/// was still too large.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NonConvergence {
    pub problem_node: Option<usize>,
}

/// Damped Newton-Raphson on `sys`.
///
/// `load` must fill `sys.matrix` with the Jacobian at the trial solution and
/// `rhs` with `-f(x)`. Iteration starts from `sys.solution` on a copy; the
/// solution and `soln_max` are only updated on convergence. Returns the
/// number of iterations used.
pub fn find_solution<F>(
    sys: &mut MnaSystem,
    options: &SimOptions,
    max_iters: usize,
    mut load: F,
) -> Result<usize, NonConvergence>
where
    F: FnMut(&mut MnaSystem, &DVector<f64>, &mut DVector<f64>),
{
    let n = sys.size;
    let mut soln = sys.solution.clone();
    let mut rhs = DVector::zeros(n);
    let mut d_sol: DVector<f64> = DVector::zeros(n);

    let mut abssum_old = 0.0;
    let mut abssum_compare = 0.0;
    let mut use_limiting = false;
    let mut down_count = 0;
    let mut problem_node = None;

    let mut iter = 0;
    while iter < max_iters {
        load(sys, &soln, &mut rhs);

        // Residual of the current (KCL) equations
        let abssum_rhs: f64 = (0..n)
            .filter(|&i| sys.is_voltage(i))
            .map(|i| rhs[i].abs())
            .sum();

        if iter > 0 && !use_limiting && abssum_old < abssum_rhs {
            // The last step made things worse: undo it and retry it limited
            soln -= &d_sol;
            iter -= 1;
            use_limiting = true;
            trace!("Newton rollback at residual {:e}", abssum_rhs);
        } else {
            d_sol = solver::solve_rq(&sys.matrix, &rhs);

            if abssum_rhs < abssum_old {
                down_count += 1;
            } else {
                down_count = 0;
            }
            if down_count > 10 {
                use_limiting = false;
                down_count = 0;
            }
            abssum_old = abssum_rhs;
        }

        if iter == 0 || abssum_rhs > abssum_compare {
            abssum_compare = abssum_rhs;
        }

        // Loose residual check, skipped on the last iteration
        let residual_ok = abssum_rhs <= options.res_check_abs() + options.res_check_rel() * abssum_compare;
        let mut converged = residual_ok || iter + 1 >= max_iters;

        for i in 0..n {
            if use_limiting && sys.is_voltage(i) {
                d_sol[i] = d_sol[i].clamp(-options.v_newt_lim, options.v_newt_lim);
            }
            soln[i] += d_sol[i];
            let thresh = sys.abstol[i] + options.reltol * sys.soln_max[i];
            if !(d_sol[i].abs() <= thresh) {
                converged = false;
                problem_node = Some(i);
            }
        }

        if converged {
            for i in 0..n {
                sys.soln_max[i] = sys.soln_max[i].max(soln[i].abs());
            }
            sys.solution = soln;
            debug!("Newton converged in {} iterations", iter + 1);
            return Ok(iter + 1);
        }
        iter += 1;
    }

    debug!("Newton failed after {} iterations", max_iters);
    Err(NonConvergence { problem_node })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mna::{add_to_rhs, NodeType};

    fn voltage_system(n: usize) -> MnaSystem {
        MnaSystem::new(vec![NodeType::Voltage; n], vec![1e-6; n], vec![0.0; n])
    }

    #[test]
    fn test_linear_system_converges_quickly() {
        // 1 mA into a 1k resistor to ground
        let mut sys = voltage_system(1);
        let options = SimOptions::default();
        let iters = find_solution(&mut sys, &options, 100, |sys, soln, rhs| {
            sys.matrix[(0, 0)] = 1e-3;
            rhs[0] = 1e-3 - 1e-3 * soln[0];
        })
        .unwrap();

        assert!(iters <= 3);
        assert!((sys.solution[0] - 1.0).abs() < 1e-9);
        assert!((sys.soln_max[0] - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_exponential_converges_with_limiting() {
        // Diode-like element fed by 1 mA: i = 1e-14 (exp(v/0.0258) - 1)
        let mut sys = voltage_system(1);
        let options = SimOptions::default();
        let vt = 0.0258;
        find_solution(&mut sys, &options, 1000, |sys, soln, rhs| {
            let v = soln[0].min(1.5);
            let e = (v / vt).exp();
            sys.matrix[(0, 0)] = 1e-14 * e / vt;
            rhs.fill(0.0);
            add_to_rhs(rhs, Some(0), 1e-3 - 1e-14 * (e - 1.0));
        })
        .unwrap();

        let expected = vt * (1e-3 / 1e-14 + 1.0f64).ln();
        assert!((sys.solution[0] - expected).abs() < 1e-5);
    }

    #[test]
    fn test_failure_keeps_solution() {
        // No root: f(x) = x^2 + 1
        let mut sys = voltage_system(1);
        sys.solution[0] = 0.5;
        let options = SimOptions::default();
        let err = find_solution(&mut sys, &options, 50, |sys, soln, rhs| {
            sys.matrix[(0, 0)] = 2.0 * soln[0];
            rhs[0] = -(soln[0] * soln[0] + 1.0);
        })
        .unwrap_err();

        assert_eq!(err.problem_node, Some(0));
        assert_eq!(sys.solution[0], 0.5);
        assert_eq!(sys.soln_max[0], 0.0);
    }
}
