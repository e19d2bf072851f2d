use tracing::{debug, info};

use crate::error::{EvalError, Result};
use crate::models::{CapacityDecision, DecileBucket, LiftTable, ScoredRecord};
use crate::stats;

const LIFT_EPSILON: f64 = 1e-12;

/// Bucket (1-based) for a 0-based rank, cutting positions `0..n` into
/// `bins` right-closed quantile intervals. With fewer records than bins
/// some buckets stay empty.
pub fn decile_for_rank(rank: usize, n: usize, bins: usize) -> usize {
    if n <= 1 || rank == 0 {
        return 1;
    }
    let span = n - 1;
    // smallest j with rank <= j * span / bins
    let bucket = (rank * bins + span - 1) / span;
    bucket.clamp(1, bins)
}

/// Ranks records by score (descending, stable on ties) and builds the lift
/// table. Empty buckets are left out, so decile indices may skip.
pub fn evaluate(records: &[ScoredRecord], n_bins: usize) -> Result<LiftTable> {
    if records.is_empty() {
        return Err(EvalError::EmptyInput("records"));
    }
    if n_bins == 0 {
        return Err(EvalError::InvalidBins(n_bins));
    }

    let mut ranked: Vec<&ScoredRecord> = records.iter().collect();
    ranked.sort_by(|a, b| stats::descending_nan_last(a.score, b.score));

    // (count, events, score sum) per bucket
    let mut totals = vec![(0usize, 0u64, 0.0f64); n_bins];
    for (rank, record) in ranked.iter().enumerate() {
        let slot = &mut totals[decile_for_rank(rank, ranked.len(), n_bins) - 1];
        slot.0 += 1;
        slot.1 += u64::from(record.label);
        slot.2 += record.score;
    }

    let base_rate = stats::base_rate(records)?;
    let buckets: Vec<DecileBucket> = totals
        .into_iter()
        .enumerate()
        .filter(|(_, (count, _, _))| *count > 0)
        .map(|(index, (count, events, score_sum))| {
            let event_rate = events as f64 / count as f64;
            DecileBucket {
                decile: index + 1,
                n: count,
                event_rate,
                avg_score: score_sum / count as f64,
                lift_vs_base: event_rate / (base_rate + LIFT_EPSILON),
            }
        })
        .collect();

    debug!(records = records.len(), buckets = buckets.len(), base_rate, "lift table built");
    Ok(LiftTable { buckets, base_rate })
}

/// Returns `(cutoff, k)`: `k = max(1, floor(capacity_pct · n))` and the k-th
/// largest score.
pub fn capacity_threshold(scores: &[f64], capacity_pct: f64) -> Result<(f64, usize)> {
    if scores.is_empty() {
        return Err(EvalError::EmptyInput("scores"));
    }
    if !(capacity_pct > 0.0 && capacity_pct <= 1.0) {
        return Err(EvalError::InvalidCapacity(capacity_pct));
    }

    let k = ((capacity_pct * scores.len() as f64).floor() as usize).max(1);
    let mut sorted = scores.to_vec();
    sorted.sort_by(|a, b| stats::descending_nan_last(*a, *b));
    Ok((sorted[k - 1], k))
}

/// Selects every record scoring at or above the capacity cutoff. Ties at the
/// cutoff are all admitted, so the queue can hold more than `k` records.
pub fn capacity_decision(records: &[ScoredRecord], capacity_pct: f64) -> Result<CapacityDecision> {
    let scores: Vec<f64> = records.iter().map(|record| record.score).collect();
    let (cutoff, k) = capacity_threshold(&scores, capacity_pct)?;

    let queue: Vec<ScoredRecord> = records
        .iter()
        .filter(|record| record.score >= cutoff)
        .copied()
        .collect();
    let queue_event_rate = stats::base_rate(&queue).ok();

    info!(capacity_pct, k, cutoff, queue = queue.len(), "capacity decision");
    Ok(CapacityDecision {
        capacity_pct,
        k,
        cutoff,
        queue_size: queue.len(),
        queue_event_rate,
    })
}
