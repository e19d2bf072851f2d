use tracing::{info, warn};

use crate::error::{EvalError, Result};
use crate::models::{DriftMetric, DriftSeverity, Feature, Observation, ScoredRecord};
use crate::stats;

const SMOOTHING: f64 = 1e-6;
const MIN_EDGES: usize = 3;

/// PSI values below this are smoothing noise, not drift.
pub const PSI_NOISE_FLOOR: f64 = 1e-9;

pub const SCORE_VARIABLE: &str = "risk_score";

impl DriftSeverity {
    pub fn classify(psi: f64) -> Self {
        if psi < 0.1 {
            DriftSeverity::Stable
        } else if psi <= 0.25 {
            DriftSeverity::Moderate
        } else {
            DriftSeverity::Major
        }
    }
}

impl DriftMetric {
    pub fn new(variable: impl Into<String>, psi: f64) -> Self {
        Self {
            variable: variable.into(),
            psi: if psi < PSI_NOISE_FLOOR { 0.0 } else { psi },
            severity: DriftSeverity::classify(psi),
        }
    }
}

/// Population Stability Index of `recent` against `baseline`.
///
/// The baseline alone defines the bin edges, so `psi(a, b)` and `psi(b, a)`
/// generally differ. Returns 0.0 when the baseline quantiles collapse to
/// fewer than three distinct edges (constant or near-constant variable).
pub fn psi(baseline: &[f64], recent: &[f64], bins: usize) -> Result<f64> {
    if recent.is_empty() {
        return Err(EvalError::EmptyInput("recent sample"));
    }
    let edges = stats::quantile_edges(baseline, bins)?;
    if edges.len() < MIN_EDGES {
        warn!(edges = edges.len(), "degenerate baseline binning, reporting zero drift");
        return Ok(0.0);
    }

    let baseline_p = stats::smoothed_proportions(&stats::histogram(baseline, &edges), SMOOTHING);
    let recent_p = stats::smoothed_proportions(&stats::histogram(recent, &edges), SMOOTHING);

    Ok(baseline_p
        .iter()
        .zip(&recent_p)
        .map(|(&b, &r)| (r - b) * (r / b).ln())
        .sum())
}

pub fn feature_drift(
    baseline: &[Observation],
    recent: &[Observation],
    features: &[Feature],
    bins: usize,
) -> Result<Vec<DriftMetric>> {
    features
        .iter()
        .map(|feature| {
            let before: Vec<f64> = baseline.iter().map(|o| feature.value(&o.features)).collect();
            let after: Vec<f64> = recent.iter().map(|o| feature.value(&o.features)).collect();
            let metric = DriftMetric::new(feature.name(), psi(&before, &after, bins)?);
            info!(variable = %metric.variable, psi = metric.psi, severity = ?metric.severity, "feature drift");
            Ok(metric)
        })
        .collect()
}

pub fn score_drift(baseline: &[ScoredRecord], recent: &[ScoredRecord], bins: usize) -> Result<DriftMetric> {
    let before: Vec<f64> = baseline.iter().map(|r| r.score).collect();
    let after: Vec<f64> = recent.iter().map(|r| r.score).collect();
    let metric = DriftMetric::new(SCORE_VARIABLE, psi(&before, &after, bins)?);
    info!(psi = metric.psi, severity = ?metric.severity, "score drift");
    Ok(metric)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::FeatureVector;

    fn spread(n: usize, offset: f64) -> Vec<f64> {
        (0..n).map(|i| i as f64 / n as f64 + offset).collect()
    }

    fn observation(period: u32, anomaly_score: f64) -> Observation {
        Observation {
            entity_id: 1,
            period,
            features: FeatureVector {
                transactions_volume: 10.0,
                policy_change_exposure: 0,
                anomaly_score,
                prior_case_flag: 0,
                behavior_shift_30d: 0.0,
                data_quality_score: 0.85,
            },
            label: 0,
            score: anomaly_score / 4.0,
        }
    }

    #[test]
    fn identical_samples_have_no_drift() {
        let sample = [1.0, 1.0, 1.0, 1.0, 1.0, 1.0, 1.0, 1.0, 1.0, 10.0];
        assert!(psi(&sample, &sample, 10).unwrap().abs() < 1e-9);

        let wide = spread(200, 0.0);
        assert!(psi(&wide, &wide, 10).unwrap().abs() < 1e-9);
    }

    #[test]
    fn constant_baseline_reports_zero() {
        assert_eq!(psi(&[3.0; 20], &spread(20, 0.0), 10).unwrap(), 0.0);
    }

    #[test]
    fn shifted_sample_drifts() {
        let baseline = spread(500, 0.0);
        let recent = spread(500, 0.5);
        let value = psi(&baseline, &recent, 10).unwrap();
        assert!(value > 0.25);
        assert_eq!(DriftSeverity::classify(value), DriftSeverity::Major);
    }

    #[test]
    fn psi_depends_on_which_sample_is_baseline() {
        let mut skewed: Vec<f64> = (0..90).map(|i| i as f64 / 900.0).collect();
        skewed.extend((0..10).map(|i| 1.0 + i as f64));
        let uniform = spread(100, 0.0);

        let forward = psi(&uniform, &skewed, 10).unwrap();
        let backward = psi(&skewed, &uniform, 10).unwrap();
        assert!((forward - backward).abs() > 1e-3);
    }

    #[test]
    fn empty_samples_fail() {
        assert_eq!(psi(&[], &[1.0], 10), Err(EvalError::EmptyInput("quantile sample")));
        assert_eq!(psi(&[1.0, 2.0], &[], 10), Err(EvalError::EmptyInput("recent sample")));
    }

    #[test]
    fn metric_clamps_smoothing_noise() {
        let metric = DriftMetric::new("anomaly_score", -3e-12);
        assert_eq!(metric.psi, 0.0);
        assert_eq!(metric.severity, DriftSeverity::Stable);
    }

    #[test]
    fn severity_thresholds() {
        assert_eq!(DriftSeverity::classify(-1e-12), DriftSeverity::Stable);
        assert_eq!(DriftSeverity::classify(0.05), DriftSeverity::Stable);
        assert_eq!(DriftSeverity::classify(0.1), DriftSeverity::Moderate);
        assert_eq!(DriftSeverity::classify(0.25), DriftSeverity::Moderate);
        assert_eq!(DriftSeverity::classify(0.3), DriftSeverity::Major);
    }

    #[test]
    fn feature_and_score_drift_follow_period_split() {
        let observations: Vec<Observation> = (0..120)
            .map(|i| {
                let period = (i % 12) as u32 + 1;
                let shift = if period >= 10 { 0.5 } else { 0.0 };
                observation(period, (i % 10) as f64 * 0.1 + shift)
            })
            .collect();
        let (baseline, recent) = stats::split_by_period(&observations, |month| month <= 9);

        let metrics = feature_drift(&baseline, &recent, &Feature::MONITORED, 10).unwrap();
        assert_eq!(metrics.len(), 4);
        assert_eq!(metrics[0].variable, "transactions_volume");
        assert_eq!(metrics[0].psi, 0.0);
        let anomaly = &metrics[1];
        assert_eq!(anomaly.variable, "anomaly_score");
        assert_eq!(anomaly.severity, DriftSeverity::Major);

        let scored_base: Vec<ScoredRecord> = baseline.iter().map(Observation::scored).collect();
        let scored_recent: Vec<ScoredRecord> = recent.iter().map(Observation::scored).collect();
        let score = score_drift(&scored_base, &scored_recent, 10).unwrap();
        assert_eq!(score.variable, SCORE_VARIABLE);
        assert_eq!(score.severity, DriftSeverity::Major);
    }
}
