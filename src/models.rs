use serde::{Deserialize, Serialize};

/// Anything that belongs to a time period (month index in the input data).
pub trait Periodic {
    fn period(&self) -> u32;
}

/// A rate with a weight, so individual records and pre-aggregated buckets
/// can feed the same base-rate computation.
pub trait WeightedRate {
    fn rate(&self) -> f64;
    fn weight(&self) -> usize;
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FeatureVector {
    pub transactions_volume: f64,
    pub policy_change_exposure: u8,
    pub anomaly_score: f64,
    pub prior_case_flag: u8,
    pub behavior_shift_30d: f64,
    pub data_quality_score: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Feature {
    TransactionsVolume,
    PolicyChangeExposure,
    AnomalyScore,
    PriorCaseFlag,
    BehaviorShift30d,
    DataQualityScore,
}

impl Feature {
    pub const ALL: [Feature; 6] = [
        Feature::TransactionsVolume,
        Feature::PolicyChangeExposure,
        Feature::AnomalyScore,
        Feature::PriorCaseFlag,
        Feature::BehaviorShift30d,
        Feature::DataQualityScore,
    ];

    /// Continuous features watched for drift by default.
    pub const MONITORED: [Feature; 4] = [
        Feature::TransactionsVolume,
        Feature::AnomalyScore,
        Feature::BehaviorShift30d,
        Feature::DataQualityScore,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Feature::TransactionsVolume => "transactions_volume",
            Feature::PolicyChangeExposure => "policy_change_exposure",
            Feature::AnomalyScore => "anomaly_score",
            Feature::PriorCaseFlag => "prior_case_flag",
            Feature::BehaviorShift30d => "behavior_shift_30d",
            Feature::DataQualityScore => "data_quality_score",
        }
    }

    pub fn value(&self, features: &FeatureVector) -> f64 {
        match self {
            Feature::TransactionsVolume => features.transactions_volume,
            Feature::PolicyChangeExposure => f64::from(features.policy_change_exposure),
            Feature::AnomalyScore => features.anomaly_score,
            Feature::PriorCaseFlag => f64::from(features.prior_case_flag),
            Feature::BehaviorShift30d => features.behavior_shift_30d,
            Feature::DataQualityScore => features.data_quality_score,
        }
    }
}

impl std::str::FromStr for Feature {
    type Err = String;

    fn from_str(name: &str) -> Result<Self, Self::Err> {
        Feature::ALL
            .into_iter()
            .find(|feature| feature.name() == name)
            .ok_or_else(|| format!("unknown feature `{name}`"))
    }
}

/// One entity-period row of the scoring input, features included.
#[derive(Debug, Clone, PartialEq)]
pub struct Observation {
    pub entity_id: u32,
    pub period: u32,
    pub features: FeatureVector,
    pub label: u8,
    pub score: f64,
}

impl Observation {
    pub fn scored(&self) -> ScoredRecord {
        ScoredRecord {
            entity_id: self.entity_id,
            period: self.period,
            label: self.label,
            score: self.score,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScoredRecord {
    pub entity_id: u32,
    pub period: u32,
    pub label: u8,
    pub score: f64,
}

impl Periodic for Observation {
    fn period(&self) -> u32 {
        self.period
    }
}

impl Periodic for ScoredRecord {
    fn period(&self) -> u32 {
        self.period
    }
}

impl WeightedRate for ScoredRecord {
    fn rate(&self) -> f64 {
        f64::from(self.label)
    }

    fn weight(&self) -> usize {
        1
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DecileBucket {
    pub decile: usize,
    pub n: usize,
    pub event_rate: f64,
    pub avg_score: f64,
    pub lift_vs_base: f64,
}

impl WeightedRate for DecileBucket {
    fn rate(&self) -> f64 {
        self.event_rate
    }

    fn weight(&self) -> usize {
        self.n
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LiftTable {
    pub buckets: Vec<DecileBucket>,
    pub base_rate: f64,
}

impl LiftTable {
    /// Bucket holding the highest scores.
    pub fn top_bucket(&self) -> Option<&DecileBucket> {
        self.buckets.first()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CapacityDecision {
    pub capacity_pct: f64,
    pub k: usize,
    pub cutoff: f64,
    pub queue_size: usize,
    /// `None` when the queue is empty.
    pub queue_event_rate: Option<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DriftSeverity {
    Stable,
    Moderate,
    Major,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DriftMetric {
    pub variable: String,
    pub psi: f64,
    pub severity: DriftSeverity,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct FeatureImportance {
    pub feature: String,
    pub importance: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RankedDriver {
    pub feature: String,
    pub label: String,
    pub importance: f64,
}
