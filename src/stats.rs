use std::cmp::Ordering;

use crate::error::{EvalError, Result};
use crate::models::{Periodic, WeightedRate};

/// Descending order for scores; NaN sorts after every number.
pub fn descending_nan_last(a: f64, b: f64) -> Ordering {
    match (a.is_nan(), b.is_nan()) {
        (true, true) => Ordering::Equal,
        (true, false) => Ordering::Greater,
        (false, true) => Ordering::Less,
        (false, false) => b.partial_cmp(&a).unwrap_or(Ordering::Equal),
    }
}

/// Weighted mean rate: `Σ(rate · n) / Σ n`.
pub fn base_rate<T: WeightedRate>(items: &[T]) -> Result<f64> {
    let total: usize = items.iter().map(|item| item.weight()).sum();
    if total == 0 {
        return Err(EvalError::DivideByZero);
    }

    let weighted: f64 = items
        .iter()
        .map(|item| item.rate() * item.weight() as f64)
        .sum();
    Ok(weighted / total as f64)
}

/// `bins + 1` evenly spaced quantiles (linear interpolation between order
/// statistics), with duplicate edges removed.
pub fn quantile_edges(sample: &[f64], bins: usize) -> Result<Vec<f64>> {
    if sample.is_empty() {
        return Err(EvalError::EmptyInput("quantile sample"));
    }
    if bins == 0 {
        return Err(EvalError::InvalidBins(bins));
    }

    let mut sorted = sample.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));
    let max_index = sorted.len() - 1;
    let last = max_index as f64;

    let mut edges: Vec<f64> = (0..=bins)
        .map(|i| {
            let position = last * i as f64 / bins as f64;
            let lower = (position.floor() as usize).min(max_index);
            let upper = (position.ceil() as usize).min(max_index);
            let fraction = position - lower as f64;
            sorted[lower] + (sorted[upper] - sorted[lower]) * fraction
        })
        .collect();
    edges.dedup();
    Ok(edges)
}

/// Counts per bin. Bins are half-open `[e_i, e_{i+1})` except the last,
/// which also takes its right edge. Values outside the edges are dropped.
pub fn histogram(values: &[f64], edges: &[f64]) -> Vec<usize> {
    let bins = edges.len().saturating_sub(1);
    let mut counts = vec![0usize; bins];
    if bins == 0 {
        return counts;
    }

    let (low, high) = (edges[0], edges[bins]);
    for &value in values {
        if !(low..=high).contains(&value) {
            continue;
        }
        let index = edges.partition_point(|&edge| edge <= value) - 1;
        counts[index.min(bins - 1)] += 1;
    }
    counts
}

/// Converts counts to proportions with additive smoothing so no bin is zero.
pub fn smoothed_proportions(counts: &[usize], smoothing: f64) -> Vec<f64> {
    let total = counts.iter().sum::<usize>() as f64;
    counts
        .iter()
        .map(|&count| (count as f64 + smoothing) / (total + smoothing))
        .collect()
}

/// Splits items into (baseline, recent) by a predicate over the period id.
pub fn split_by_period<T, F>(items: &[T], is_baseline: F) -> (Vec<T>, Vec<T>)
where
    T: Periodic + Clone,
    F: Fn(u32) -> bool,
{
    items
        .iter()
        .cloned()
        .partition(|item| is_baseline(item.period()))
}
