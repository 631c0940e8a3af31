//! Small dense linear algebra used by the gradient estimators and the
//! subset scoring criteria.
//!
//! Everything here operates on row-major `Vec<Vec<F>>` matrices of the
//! modest sizes the estimators produce (stencil-by-stencil interpolation
//! systems, k-row restricted Jacobians), so simple pivoted elimination and
//! Jacobi sweeps are plenty.

use num_traits::Float;

/// Result of LU factorization with partial pivoting.
///
/// Stores the combined L/U factors in a single matrix (L below the
/// diagonal with implicit unit diagonal, U on and above) plus the row
/// permutation, so one factorization can serve several right-hand sides.
pub struct LuFactors<F> {
    lu: Vec<Vec<F>>,
    /// `perm[i]` is the original row index for factored row `i`.
    perm: Vec<usize>,
    n: usize,
}

/// Factorize an `n x n` matrix via LU decomposition with partial pivoting.
///
/// Returns `None` if the matrix is singular (zero or near-zero pivot).
// Explicit indexing is clearer for pivoted elimination: row/col indices
// drive the pivot search
#[allow(clippy::needless_range_loop)]
pub fn lu_factor<F: Float>(a: &[Vec<F>]) -> Option<LuFactors<F>> {
    let n = a.len();
    debug_assert!(a.iter().all(|row| row.len() == n));

    let mut lu: Vec<Vec<F>> = a.to_vec();
    let mut perm: Vec<usize> = (0..n).collect();

    let eps = F::from(1e-12).unwrap_or_else(F::epsilon);

    for col in 0..n {
        let mut max_val = lu[col][col].abs();
        let mut max_row = col;
        for row in (col + 1)..n {
            let v = lu[row][col].abs();
            if v > max_val {
                max_val = v;
                max_row = row;
            }
        }

        if max_val < eps {
            return None; // Singular
        }

        if max_row != col {
            lu.swap(col, max_row);
            perm.swap(col, max_row);
        }

        let pivot = lu[col][col];

        for row in (col + 1)..n {
            let factor = lu[row][col] / pivot;
            lu[row][col] = factor; // Store L factor
            for j in (col + 1)..n {
                let val = lu[col][j];
                lu[row][j] = lu[row][j] - factor * val;
            }
        }
    }

    Some(LuFactors { lu, perm, n })
}

/// Solve `A * x = b` using a pre-computed LU factorization.
// Explicit indexing is clearer for forward/back substitution with
// permuted indices
#[allow(clippy::needless_range_loop)]
pub fn lu_back_solve<F: Float>(factors: &LuFactors<F>, b: &[F]) -> Vec<F> {
    let n = factors.n;
    debug_assert_eq!(b.len(), n);

    let mut y = vec![F::zero(); n];
    for i in 0..n {
        y[i] = b[factors.perm[i]];
    }

    // Forward substitution, L has unit diagonal
    for i in 1..n {
        for j in 0..i {
            let l_ij = factors.lu[i][j];
            let y_j = y[j];
            y[i] = y[i] - l_ij * y_j;
        }
    }

    // Back substitution
    let mut x = vec![F::zero(); n];
    for i in (0..n).rev() {
        let mut sum = y[i];
        for j in (i + 1)..n {
            sum = sum - factors.lu[i][j] * x[j];
        }
        x[i] = sum / factors.lu[i][i];
    }

    x
}

/// Solve `A * x = b` via LU factorization with partial pivoting.
///
/// Returns `None` if the matrix is singular.
pub fn lu_solve<F: Float>(a: &[Vec<F>], b: &[F]) -> Option<Vec<F>> {
    let factors = lu_factor(a)?;
    Some(lu_back_solve(&factors, b))
}

/// Dot product of two equal-length slices.
pub fn dot<F: Float>(a: &[F], b: &[F]) -> F {
    debug_assert_eq!(a.len(), b.len());
    a.iter()
        .zip(b.iter())
        .fold(F::zero(), |acc, (&x, &y)| acc + x * y)
}

/// Euclidean norm of a slice.
pub fn norm<F: Float>(a: &[F]) -> F {
    dot(a, a).sqrt()
}

/// Singular values of a `k x n` matrix with `k <= n`, in descending order.
///
/// Uses one-sided Jacobi rotations on the rows: pairs of rows are rotated
/// until mutually orthogonal, after which the row norms are the singular
/// values. Convergence is quadratic; the sweep cap is a safety net, not a
/// tuning knob.
///
/// # Panics
///
/// Panics if the matrix has more rows than columns or ragged rows.
pub fn singular_values<F: Float>(a: &[Vec<F>]) -> Vec<F> {
    let k = a.len();
    if k == 0 {
        return Vec::new();
    }
    let n = a[0].len();
    assert!(
        k <= n,
        "singular_values expects a wide matrix, got {} rows by {} columns",
        k,
        n
    );
    assert!(
        a.iter().all(|row| row.len() == n),
        "singular_values expects rectangular input"
    );

    let mut u: Vec<Vec<F>> = a.to_vec();
    let eps = F::epsilon();
    let max_sweeps = 30;

    for _ in 0..max_sweeps {
        let mut rotated = false;
        for p in 0..k {
            for q in (p + 1)..k {
                let alpha = dot(&u[p], &u[p]);
                let beta = dot(&u[q], &u[q]);
                let gamma = dot(&u[p], &u[q]);

                if gamma.abs() <= eps * (alpha * beta).sqrt() {
                    continue;
                }
                rotated = true;

                let zeta = (beta - alpha) / ((F::one() + F::one()) * gamma);
                let t = if zeta >= F::zero() {
                    F::one() / (zeta + (F::one() + zeta * zeta).sqrt())
                } else {
                    -F::one() / (-zeta + (F::one() + zeta * zeta).sqrt())
                };
                let c = F::one() / (F::one() + t * t).sqrt();
                let s = c * t;

                for j in 0..n {
                    let up = u[p][j];
                    let uq = u[q][j];
                    u[p][j] = c * up - s * uq;
                    u[q][j] = s * up + c * uq;
                }
            }
        }
        if !rotated {
            break;
        }
    }

    let mut sigma: Vec<F> = u.iter().map(|row| norm(row)).collect();
    sigma.sort_by(|a, b| b.partial_cmp(a).expect("singular values are finite"));
    sigma
}
