use crate::core::models::metrics::LinearFit;

const DEGENERATE_SPREAD: f64 = 1e-12;

/// Least-squares straight-line fit of `ys` against `xs`.
///
/// Returns `None` when the inputs differ in length, fewer than two points are
/// available, or the abscissa has no spread. The slope standard error follows
/// the classical residual formula; an exact two-point fit reports 0.0 rather
/// than the undefined 0/0.
pub fn linear_fit(xs: &[f64], ys: &[f64]) -> Option<LinearFit> {
    let n = xs.len();
    if n < 2 || n != ys.len() {
        return None;
    }

    let nf = n as f64;
    let mean_x = xs.iter().sum::<f64>() / nf;
    let mean_y = ys.iter().sum::<f64>() / nf;

    let mut ss_xx = 0.0;
    let mut ss_xy = 0.0;
    for (x, y) in xs.iter().zip(ys) {
        ss_xx += (x - mean_x) * (x - mean_x);
        ss_xy += (x - mean_x) * (y - mean_y);
    }
    if ss_xx < DEGENERATE_SPREAD {
        return None;
    }

    let slope = ss_xy / ss_xx;
    let intercept = mean_y - slope * mean_x;

    let std_err = if n == 2 {
        0.0
    } else {
        let ss_res: f64 = xs
            .iter()
            .zip(ys)
            .map(|(x, y)| {
                let predicted = intercept + slope * x;
                (y - predicted) * (y - predicted)
            })
            .sum();
        (ss_res / ((nf - 2.0) * ss_xx)).sqrt()
    };

    if !slope.is_finite() || !std_err.is_finite() {
        return None;
    }

    Some(LinearFit {
        slope,
        intercept,
        std_err,
    })
}

/// Arithmetic mean; 0.0 for an empty slice.
pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Population standard deviation; 0.0 for fewer than two values.
pub fn std_dev(values: &[f64]) -> f64 {
    if values.len() < 2 {
        return 0.0;
    }
    let m = mean(values);
    let variance =
        values.iter().map(|v| (v - m) * (v - m)).sum::<f64>() / values.len() as f64;
    variance.sqrt()
}
