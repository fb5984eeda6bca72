//! Small dense numeric helpers used by the ARIMA fitter and the ADF test.

const PIVOT_EPSILON: f64 = 1e-12;

/// Applies `order` rounds of first differencing.
pub(crate) fn difference(data: &[f64], order: usize) -> Vec<f64> {
    let mut result = data.to_vec();
    for _ in 0..order {
        result = result.windows(2).map(|w| w[1] - w[0]).collect();
    }
    result
}

pub(crate) fn mean(data: &[f64]) -> f64 {
    if data.is_empty() {
        return 0.0;
    }
    data.iter().sum::<f64>() / data.len() as f64
}

/// Solves `a * x = b` with Gaussian elimination and partial pivoting.
/// Returns `None` when the system is singular or produces non-finite values.
pub(crate) fn solve(mut a: Vec<Vec<f64>>, mut b: Vec<f64>) -> Option<Vec<f64>> {
    let n = b.len();
    if a.len() != n || a.iter().any(|row| row.len() != n) {
        return None;
    }

    for col in 0..n {
        let pivot_row = (col..n).max_by(|&i, &j| {
            a[i][col]
                .abs()
                .partial_cmp(&a[j][col].abs())
                .unwrap_or(std::cmp::Ordering::Equal)
        })?;
        if a[pivot_row][col].abs() < PIVOT_EPSILON {
            return None;
        }
        a.swap(col, pivot_row);
        b.swap(col, pivot_row);

        for row in (col + 1)..n {
            let factor = a[row][col] / a[col][col];
            if factor == 0.0 {
                continue;
            }
            for k in col..n {
                a[row][k] -= factor * a[col][k];
            }
            b[row] -= factor * b[col];
        }
    }

    let mut x = vec![0.0; n];
    for row in (0..n).rev() {
        let tail: f64 = ((row + 1)..n).map(|k| a[row][k] * x[k]).sum();
        x[row] = (b[row] - tail) / a[row][row];
    }

    x.iter().all(|v| v.is_finite()).then_some(x)
}

/// Ordinary least squares fit of `y` on the rows of `x`.
pub(crate) struct OlsFit {
    pub coefficients: Vec<f64>,
    pub residual_variance: f64,
    /// Diagonal of `(X'X)^-1`, used for standard errors.
    pub inverse_diagonal: Vec<f64>,
}

pub(crate) fn ols(x: &[Vec<f64>], y: &[f64]) -> Option<OlsFit> {
    let rows = y.len();
    let cols = x.first()?.len();
    if rows != x.len() || rows <= cols {
        return None;
    }

    let mut xtx = vec![vec![0.0; cols]; cols];
    let mut xty = vec![0.0; cols];
    for (row, &target) in x.iter().zip(y) {
        for i in 0..cols {
            xty[i] += row[i] * target;
            for j in 0..cols {
                xtx[i][j] += row[i] * row[j];
            }
        }
    }

    let coefficients = solve(xtx.clone(), xty)?;
    let ssr: f64 = x
        .iter()
        .zip(y)
        .map(|(row, &target)| {
            let fitted: f64 = row.iter().zip(&coefficients).map(|(a, b)| a * b).sum();
            (target - fitted).powi(2)
        })
        .sum();
    let residual_variance = ssr / (rows - cols) as f64;

    let mut inverse_diagonal = Vec::with_capacity(cols);
    for i in 0..cols {
        let mut unit = vec![0.0; cols];
        unit[i] = 1.0;
        inverse_diagonal.push(solve(xtx.clone(), unit)?[i]);
    }

    Some(OlsFit {
        coefficients,
        residual_variance,
        inverse_diagonal,
    })
}

/// Yule-Walker estimate of an AR(`order`) process via Levinson-Durbin.
/// The input should already be centered.
pub(crate) fn yule_walker(data: &[f64], order: usize) -> Option<Vec<f64>> {
    let n = data.len();
    if order == 0 {
        return Some(Vec::new());
    }
    if n <= order {
        return None;
    }

    let autocov: Vec<f64> = (0..=order)
        .map(|lag| (lag..n).map(|i| data[i] * data[i - lag]).sum::<f64>() / n as f64)
        .collect();
    if autocov[0].abs() < PIVOT_EPSILON {
        return None;
    }

    let mut phi = vec![0.0; order];
    let mut error = autocov[0];
    for k in 0..order {
        let acc: f64 = (0..k).map(|j| phi[j] * autocov[k - j]).sum();
        let reflection = (autocov[k + 1] - acc) / error;
        let previous = phi.clone();
        phi[k] = reflection;
        for j in 0..k {
            phi[j] = previous[j] - reflection * previous[k - 1 - j];
        }
        error *= 1.0 - reflection * reflection;
        if error <= 0.0 {
            return None;
        }
    }
    Some(phi)
}

/// Checks that `x_t = sum(coeffs[i] * x_{t-1-i})` is stationary by stepping the
/// coefficients back down to partial autocorrelations; every one must lie
/// strictly inside the unit interval.
pub(crate) fn is_stationary(coeffs: &[f64]) -> bool {
    if coeffs.iter().any(|c| !c.is_finite()) {
        return false;
    }
    let mut current = coeffs.to_vec();
    while let Some(&reflection) = current.last() {
        if reflection.abs() >= 1.0 {
            return false;
        }
        let k = current.len();
        let scale = 1.0 - reflection * reflection;
        current = (0..k - 1)
            .map(|j| (current[j] + reflection * current[k - 2 - j]) / scale)
            .collect();
    }
    true
}

/// An MA polynomial `1 + sum(theta_j B^j)` is invertible exactly when the AR
/// recursion with coefficients `-theta` is stationary.
pub(crate) fn is_invertible(theta: &[f64]) -> bool {
    let negated: Vec<f64> = theta.iter().map(|t| -t).collect();
    is_stationary(&negated)
}
