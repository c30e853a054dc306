//! Numeric kernels shared by the analyzers.
//!
//! Every function here is total: empty or degenerate input yields `0.0` (or
//! `None` where the caller must tell "undefined" apart from zero), never NaN.
//! Estimators follow the usual sample conventions: `n - 1` variance,
//! bias-adjusted skewness and excess kurtosis, linear-interpolated quantiles.

use std::cmp::Ordering;

/// Added inside `log2` so zero proportions do not blow up the entropy.
pub const ENTROPY_EPSILON: f64 = 1e-10;

pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

pub fn sum(values: &[f64]) -> f64 {
    values.iter().sum()
}

pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        0.0
    } else {
        sum(values) / values.len() as f64
    }
}

/// Division that yields 0 for a zero denominator.
pub fn ratio(numerator: f64, denominator: f64) -> f64 {
    if denominator == 0.0 {
        0.0
    } else {
        numerator / denominator
    }
}

pub fn percentage(part: f64, whole: f64) -> f64 {
    ratio(part, whole) * 100.0
}

pub fn sorted(values: &[f64]) -> Vec<f64> {
    let mut out = values.to_vec();
    out.sort_by(|a, b| a.total_cmp(b));
    out
}

/// Quantile of already-sorted data, linear interpolation between ranks.
pub fn quantile_sorted(sorted: &[f64], q: f64) -> f64 {
    match sorted.len() {
        0 => 0.0,
        1 => sorted[0],
        n => {
            let pos = q.clamp(0.0, 1.0) * (n - 1) as f64;
            let lower = pos.floor() as usize;
            let upper = pos.ceil() as usize;
            let frac = pos - lower as f64;
            sorted[lower] + (sorted[upper] - sorted[lower]) * frac
        }
    }
}

pub fn quantile(values: &[f64], q: f64) -> f64 {
    quantile_sorted(&sorted(values), q)
}

pub fn median(values: &[f64]) -> f64 {
    quantile(values, 0.5)
}

pub fn min(values: &[f64]) -> f64 {
    values.iter().copied().reduce(f64::min).unwrap_or(0.0)
}

pub fn max(values: &[f64]) -> f64 {
    values.iter().copied().reduce(f64::max).unwrap_or(0.0)
}

/// Index of the largest value; the first one wins a tie.
pub fn argmax(values: &[f64]) -> Option<usize> {
    values
        .iter()
        .enumerate()
        .fold(None, |best: Option<(usize, f64)>, (i, &v)| match best {
            Some((_, b)) if v <= b => best,
            _ => Some((i, v)),
        })
        .map(|(i, _)| i)
}

/// Index of the smallest value; the first one wins a tie.
pub fn argmin(values: &[f64]) -> Option<usize> {
    values
        .iter()
        .enumerate()
        .fold(None, |best: Option<(usize, f64)>, (i, &v)| match best {
            Some((_, b)) if v >= b => best,
            _ => Some((i, v)),
        })
        .map(|(i, _)| i)
}

/// Sums of the 2nd, 3rd and 4th powers of deviations from the mean.
fn deviation_sums(values: &[f64]) -> (f64, f64, f64) {
    let m = mean(values);
    values.iter().fold((0.0, 0.0, 0.0), |(s2, s3, s4), v| {
        let d = v - m;
        let d2 = d * d;
        (s2 + d2, s3 + d2 * d, s4 + d2 * d2)
    })
}

pub fn sample_variance(values: &[f64]) -> f64 {
    if values.len() < 2 {
        return 0.0;
    }
    let (s2, _, _) = deviation_sums(values);
    s2 / (values.len() - 1) as f64
}

pub fn sample_std(values: &[f64]) -> f64 {
    sample_variance(values).sqrt()
}

pub fn population_variance(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let (s2, _, _) = deviation_sums(values);
    s2 / values.len() as f64
}

pub fn population_std(values: &[f64]) -> f64 {
    population_variance(values).sqrt()
}

/// Bias-adjusted Fisher-Pearson skewness (G1).
pub fn skewness(values: &[f64]) -> f64 {
    if values.len() < 3 {
        return 0.0;
    }
    let n = values.len() as f64;
    let (s2, s3, _) = deviation_sums(values);
    if s2 <= f64::EPSILON {
        return 0.0;
    }
    (n * (n - 1.0).sqrt() / (n - 2.0)) * (s3 / s2.powf(1.5))
}

/// Bias-adjusted excess kurtosis (G2).
pub fn excess_kurtosis(values: &[f64]) -> f64 {
    if values.len() < 4 {
        return 0.0;
    }
    let n = values.len() as f64;
    let (s2, _, s4) = deviation_sums(values);
    if s2 <= f64::EPSILON {
        return 0.0;
    }
    let adj = 3.0 * (n - 1.0).powi(2) / ((n - 2.0) * (n - 3.0));
    let numerator = n * (n + 1.0) * (n - 1.0) * s4;
    let denominator = (n - 2.0) * (n - 3.0) * s2 * s2;
    numerator / denominator - adj
}

/// Pearson correlation; 0 when either side has no variance.
pub fn pearson(x: &[f64], y: &[f64]) -> f64 {
    let n = x.len().min(y.len());
    if n < 2 {
        return 0.0;
    }
    let (x, y) = (&x[..n], &y[..n]);
    let mx = mean(x);
    let my = mean(y);
    let (mut sxy, mut sxx, mut syy) = (0.0, 0.0, 0.0);
    for (a, b) in x.iter().zip(y) {
        let dx = a - mx;
        let dy = b - my;
        sxy += dx * dy;
        sxx += dx * dx;
        syy += dy * dy;
    }
    let denominator = (sxx * syy).sqrt();
    if denominator == 0.0 {
        0.0
    } else {
        (sxy / denominator).clamp(-1.0, 1.0)
    }
}

/// Most frequent value; the smallest one wins a tie.
pub fn mode(values: &[f64]) -> Option<f64> {
    let data = sorted(values);
    let mut best: Option<(f64, usize)> = None;
    let mut i = 0;
    while i < data.len() {
        let mut j = i + 1;
        while j < data.len() && data[j] == data[i] {
            j += 1;
        }
        let run = j - i;
        if best.map_or(true, |(_, count)| run > count) {
            best = Some((data[i], run));
        }
        i = j;
    }
    best.map(|(value, _)| value)
}

/// Dense rank, largest value first (rank 1); ties share a rank.
pub fn dense_rank_desc(values: &[f64]) -> Vec<u32> {
    let mut distinct = sorted(values);
    distinct.reverse();
    distinct.dedup();
    values
        .iter()
        .map(|v| {
            distinct
                .iter()
                .position(|d| d == v)
                .map_or(0, |idx| idx as u32 + 1)
        })
        .collect()
}

/// Trailing simple moving average; the first `window - 1` points average
/// over however many values are available.
pub fn moving_average(values: &[f64], window: usize) -> Vec<f64> {
    let window = window.max(1);
    (0..values.len())
        .map(|i| {
            let start = (i + 1).saturating_sub(window);
            mean(&values[start..=i])
        })
        .collect()
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LinearFit {
    pub slope: f64,
    pub intercept: f64,
}

impl LinearFit {
    pub fn at(&self, x: f64) -> f64 {
        self.intercept + self.slope * x
    }
}

/// Ordinary least-squares line through `(x, y)`.
pub fn linear_fit(x: &[f64], y: &[f64]) -> LinearFit {
    let n = x.len().min(y.len());
    let (x, y) = (&x[..n], &y[..n]);
    let mx = mean(x);
    let my = mean(y);
    let sxx: f64 = x.iter().map(|a| (a - mx).powi(2)).sum();
    let sxy: f64 = x.iter().zip(y).map(|(a, b)| (a - mx) * (b - my)).sum();
    let slope = ratio(sxy, sxx);
    LinearFit {
        slope,
        intercept: my - slope * mx,
    }
}

/// Shannon entropy in bits over a set of proportions.
pub fn shannon_entropy(proportions: &[f64]) -> f64 {
    -proportions
        .iter()
        .map(|p| p * (p + ENTROPY_EPSILON).log2())
        .sum::<f64>()
}

/// Index of the right-closed bin `(edges[i], edges[i + 1]]` holding `value`.
/// With `include_lowest` the first bin is closed on the left as well.
pub fn bin_index(edges: &[f64], value: f64, include_lowest: bool) -> Option<usize> {
    edges
        .windows(2)
        .position(|w| (value > w[0] || (include_lowest && value == w[0])) && value <= w[1])
}

fn strictly_increasing(edges: &[f64]) -> bool {
    edges
        .windows(2)
        .all(|w| w[0].partial_cmp(&w[1]) == Some(Ordering::Less))
}

/// Equal-population binning into `q` groups by quantile edges.
///
/// Returns `None` when the quantile edges collapse (too few distinct
/// values), which callers map to an "undefined" segment.
pub fn qcut(values: &[f64], q: usize) -> Option<Vec<usize>> {
    if q == 0 {
        return None;
    }
    let data = sorted(values);
    let edges: Vec<f64> = (0..=q)
        .map(|i| quantile_sorted(&data, i as f64 / q as f64))
        .collect();
    if !strictly_increasing(&edges) {
        return None;
    }
    values
        .iter()
        .map(|&v| bin_index(&edges, v, true))
        .collect()
}

/// Binning against explicit edges, right-closed, lowest edge excluded.
/// Values outside every bin map to `None`. Returns `None` overall when the
/// edges are not strictly increasing.
pub fn cut(values: &[f64], edges: &[f64]) -> Option<Vec<Option<usize>>> {
    if edges.len() < 2 || !strictly_increasing(edges) {
        return None;
    }
    Some(values.iter().map(|&v| bin_index(edges, v, false)).collect())
}
