//! Two-component principal component analysis over small row sets.
//!
//! Rows are mean-centred and the n×n Gram matrix `X Xᵀ` is diagonalised with
//! cyclic Jacobi rotations. Its eigenvalues are those of the scatter matrix
//! `Xᵀ X`, and each eigenvector scaled by `√λ` is the score column of that
//! component, so the d×d covariance is never built. Embedding dimensions are
//! in the hundreds while row counts are classroom-sized.

const MAX_SWEEPS: usize = 100;
/// Off-diagonal mass, relative to the whole matrix, below which Jacobi stops.
const CONVERGENCE: f64 = 1e-30;
/// Components whose eigenvalue is below this fraction of the largest one
/// are rounding noise and project to 0.
const RELATIVE_VARIANCE_FLOOR: f64 = 1e-9;

fn dot(a: &[f64], b: &[f64]) -> f64 {
    a.iter().zip(b).map(|(x, y)| x * y).sum()
}

fn center(rows: &[Vec<f32>]) -> Vec<Vec<f64>> {
    let dim = rows[0].len();
    let n = rows.len() as f64;
    let mut mean = vec![0.0f64; dim];
    for row in rows {
        for (m, v) in mean.iter_mut().zip(row) {
            *m += *v as f64;
        }
    }
    mean.iter_mut().for_each(|m| *m /= n);

    rows.iter()
        .map(|row| row.iter().zip(&mean).map(|(v, m)| (*v as f64) - m).collect())
        .collect()
}

fn gram(centered: &[Vec<f64>]) -> Vec<Vec<f64>> {
    let n = centered.len();
    let mut g = vec![vec![0.0f64; n]; n];
    for i in 0..n {
        for j in i..n {
            let v = dot(&centered[i], &centered[j]);
            g[i][j] = v;
            g[j][i] = v;
        }
    }
    g
}

/// Eigen-decomposes a symmetric matrix in place.
///
/// Returns the eigenvalues and the matrix whose columns are the matching
/// unit eigenvectors.
fn jacobi_eigen(mut a: Vec<Vec<f64>>) -> (Vec<f64>, Vec<Vec<f64>>) {
    let n = a.len();
    let mut v: Vec<Vec<f64>> = (0..n)
        .map(|i| (0..n).map(|j| if i == j { 1.0 } else { 0.0 }).collect())
        .collect();

    for _ in 0..MAX_SWEEPS {
        let mut total = 0.0f64;
        let mut off = 0.0f64;
        for (i, row) in a.iter().enumerate() {
            for (j, x) in row.iter().enumerate() {
                total += x * x;
                if i != j {
                    off += x * x;
                }
            }
        }
        if off <= CONVERGENCE * total {
            break;
        }

        for p in 0..n {
            for q in (p + 1)..n {
                let apq = a[p][q];
                if apq == 0.0 {
                    continue;
                }
                let theta = (a[q][q] - a[p][p]) / (2.0 * apq);
                let t = theta.signum() / (theta.abs() + (theta * theta + 1.0).sqrt());
                let c = 1.0 / (t * t + 1.0).sqrt();
                let s = t * c;

                for row in a.iter_mut() {
                    let (kp, kq) = (row[p], row[q]);
                    row[p] = c * kp - s * kq;
                    row[q] = s * kp + c * kq;
                }
                for k in 0..n {
                    let (pk, qk) = (a[p][k], a[q][k]);
                    a[p][k] = c * pk - s * qk;
                    a[q][k] = s * pk + c * qk;
                }
                for row in v.iter_mut() {
                    let (kp, kq) = (row[p], row[q]);
                    row[p] = c * kp - s * kq;
                    row[q] = s * kp + c * kq;
                }
            }
        }
    }

    let values = (0..n).map(|i| a[i][i]).collect();
    (values, v)
}

/// Score column for one component, oriented so the largest-magnitude
/// loading is positive.
fn scores(centered: &[Vec<f64>], basis: &[Vec<f64>], column: usize, lambda: f64) -> Vec<f64> {
    let u: Vec<f64> = basis.iter().map(|row| row[column]).collect();

    let dim = centered[0].len();
    let mut loading = vec![0.0f64; dim];
    for (row, ui) in centered.iter().zip(&u) {
        loading.iter_mut().zip(row).for_each(|(l, r)| *l += ui * r);
    }
    let flip = loading
        .iter()
        .copied()
        .max_by(|a, b| a.abs().total_cmp(&b.abs()))
        .is_some_and(|pivot| pivot < 0.0);

    let scale = if flip { -lambda.sqrt() } else { lambda.sqrt() };
    u.iter().map(|ui| ui * scale).collect()
}

/// Projects `rows` onto their first two principal components.
///
/// All rows must share the same non-zero length and there must be at least
/// one row. Components come out ordered by explained variance; directions
/// without variance project to 0.
pub fn project_2d(rows: &[Vec<f32>]) -> Vec<(f64, f64)> {
    if rows.is_empty() || rows[0].is_empty() {
        return Vec::new();
    }
    let centered = center(rows);
    let (values, basis) = jacobi_eigen(gram(&centered));

    let mut order: Vec<usize> = (0..values.len()).collect();
    order.sort_by(|&a, &b| values[b].total_cmp(&values[a]));

    let top = order.first().map_or(0.0, |&i| values[i]);
    let columns: Vec<Vec<f64>> = order
        .iter()
        .take(2)
        .filter(|&&i| top > 0.0 && values[i] > top * RELATIVE_VARIANCE_FLOOR)
        .map(|&i| scores(&centered, &basis, i, values[i]))
        .collect();

    (0..rows.len())
        .map(|i| {
            let x = columns.first().map_or(0.0, |c| c[i]);
            let y = columns.get(1).map_or(0.0, |c| c[i]);
            (x, y)
        })
        .collect()
}
