use nalgebra::{DMatrix, DVector};

/// Relative threshold below which a pivot or row norm counts as zero
pub const EPS: f64 = 1e-12;

/// Rank by Gaussian elimination; pivots no larger than `EPS` times the
/// largest entry are zero.
pub fn rank(matrix: &DMatrix<f64>) -> usize {
    let mut m = matrix.clone();
    let (nrows, ncols) = m.shape();
    let max_abs_entry = m.amax();

    let mut the_rank = 0;
    let mut start_col = 0;
    for row in 0..nrows {
        for col in start_col..ncols {
            let mut max_v = m[(row, col)].abs();
            let mut max_row = row;
            for i in row + 1..nrows {
                let v = m[(i, col)].abs();
                if v > max_v {
                    max_v = v;
                    max_row = i;
                }
            }
            if max_v > EPS * max_abs_entry {
                start_col = col + 1;
                the_rank += 1;
                m.swap_rows(row, max_row);

                let pivot = m[(row, col)];
                for i in row + 1..nrows {
                    let factor = m[(i, col)] / pivot;
                    if factor != 0.0 {
                        for j in col..ncols {
                            m[(i, j)] -= m[(row, j)] * factor;
                        }
                    }
                }
                break;
            }
        }
    }
    the_rank
}

/// Solve an N x (N+1) augmented system `[A | b]` in place by Gaussian
/// elimination with partial pivoting. A column with no nonzero pivot gets
/// `EPS` on the diagonal.
pub fn solve_augmented(m: &mut DMatrix<f64>) -> DVector<f64> {
    let n = m.nrows();

    for col in 0..n {
        let mut max_v = m[(col, col)].abs();
        let mut max_row = col;
        for i in col + 1..n {
            let v = m[(i, col)].abs();
            if v > max_v {
                max_v = v;
                max_row = i;
            }
        }
        m.swap_rows(col, max_row);

        if max_v == 0.0 {
            m[(col, col)] = EPS;
        }

        let pivot = m[(col, col)];
        for i in col + 1..n {
            let factor = m[(i, col)] / pivot;
            if factor != 0.0 {
                for j in col..=n {
                    m[(i, j)] -= m[(col, j)] * factor;
                }
            }
        }
    }

    let mut x = DVector::zeros(n);
    for row in (0..n).rev() {
        let mut acc = m[(row, n)];
        for j in row + 1..n {
            acc -= m[(row, j)] * x[j];
        }
        x[row] = acc / m[(row, row)];
    }
    x
}

/// Solve `matrix * x = rhs` through a row-wise Gram-Schmidt (R^T Q^T)
/// factorization. Rows pivot by largest remaining norm; once a row's norm
/// drops below `EPS` relative to the first one the rest span the null space
/// and are left out, so the result carries no null-space component.
pub fn solve_rq(matrix: &DMatrix<f64>, rhs: &DVector<f64>) -> DVector<f64> {
    let (nrows, ncols) = matrix.shape();
    let mut m = matrix.clone().insert_column(ncols, 0.0);
    m.set_column(ncols, rhs);

    let mut mat_scale = 0.0;
    let mut nonzero_rows = nrows;
    for row in 0..nrows {
        let mut max_row = row;
        let mut max_sumsq = 0.0;
        for rowp in row..nrows {
            let sumsq: f64 = (0..ncols).map(|col| m[(rowp, col)] * m[(rowp, col)]).sum();
            if rowp == row || sumsq > max_sumsq {
                max_row = rowp;
                max_sumsq = sumsq;
            }
        }
        if max_row > row {
            m.swap_rows(row, max_row);
        }

        let row_norm = max_sumsq.sqrt();
        if row == 0 {
            mat_scale = row_norm;
        }
        if row_norm <= mat_scale * EPS {
            nonzero_rows = row;
            break;
        }

        let scale = 1.0 / row_norm;
        for col in 0..=ncols {
            m[(row, col)] *= scale;
        }
        for rowp in row + 1..nrows {
            let inner: f64 = (0..ncols).map(|col| m[(row, col)] * m[(rowp, col)]).sum();
            for col in 0..=ncols {
                let v = m[(row, col)];
                m[(rowp, col)] -= inner * v;
            }
        }
    }

    // The last column now holds inv(R^T) * rhs
    let mut x = DVector::zeros(ncols);
    for row in 0..nonzero_rows {
        let weight = m[(row, ncols)];
        for col in 0..ncols {
            x[col] += m[(row, col)] * weight;
        }
    }
    x
}

/// Flag each row that carries no independent information: a row is algebraic
/// when zeroing it leaves the rank unchanged. Rows found algebraic stay zeroed
/// while the later rows are tested.
pub fn algebraic(matrix: &DMatrix<f64>) -> Vec<bool> {
    let mut m = matrix.clone();
    let full_rank = rank(&m);

    (0..m.nrows())
        .map(|row| {
            let saved = m.row(row).clone_owned();
            m.row_mut(row).fill(0.0);
            if rank(&m) == full_rank {
                true
            } else {
                m.set_row(row, &saved);
                false
            }
        })
        .collect()
}

/// `dest[i][j] = row_scale[i] * a[i][j] + scale_b * b[i][j]`
pub fn scale_add_rows(
    dest: &mut DMatrix<f64>,
    a: &DMatrix<f64>,
    row_scale: &DVector<f64>,
    b: &DMatrix<f64>,
    scale_b: f64,
) {
    for i in 0..dest.nrows() {
        for j in 0..dest.ncols() {
            dest[(i, j)] = row_scale[i] * a[(i, j)] + scale_b * b[(i, j)];
        }
    }
}
