use std::collections::HashMap;
use std::path::Path;

use anyhow::Context;
use serde::Deserialize;

use crate::models::{FeatureImportance, RankedDriver};
use crate::stats;

/// Feature identifier to business-facing description.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(transparent)]
pub struct LabelMap(HashMap<String, String>);

impl Default for LabelMap {
    fn default() -> Self {
        let pairs = [
            ("transactions_volume", "activity intensity / opportunity volume"),
            ("policy_change_exposure", "exposure to messaging/strategy shifts"),
            ("anomaly_score", "unusual pattern signal needing attention"),
            ("prior_case_flag", "historical context / prior signal"),
            ("behavior_shift_30d", "recent behavior change (leading indicator)"),
            ("data_quality_score", "data coverage/quality (governance guardrail)"),
            ("month", "seasonality / time effects"),
        ];
        Self(
            pairs
                .into_iter()
                .map(|(feature, label)| (feature.to_string(), label.to_string()))
                .collect(),
        )
    }
}

impl From<HashMap<String, String>> for LabelMap {
    fn from(entries: HashMap<String, String>) -> Self {
        Self(entries)
    }
}

impl LabelMap {
    /// Loads a JSON object of `{"feature": "label"}` pairs.
    pub fn from_json_path(path: &Path) -> anyhow::Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read label map {}", path.display()))?;
        serde_json::from_str(&raw)
            .with_context(|| format!("label map {} is not a JSON object of strings", path.display()))
    }

    /// Falls back to the feature identifier when no label is configured.
    pub fn label_for<'a>(&'a self, feature: &'a str) -> &'a str {
        match self.0.get(feature) {
            Some(label) if !label.is_empty() => label.as_str(),
            _ => feature,
        }
    }
}

/// Most influential features first, truncated to `top_n`.
pub fn top_drivers(importances: &[FeatureImportance], top_n: usize, labels: &LabelMap) -> Vec<RankedDriver> {
    let mut ranked: Vec<&FeatureImportance> = importances.iter().collect();
    ranked.sort_by(|a, b| stats::descending_nan_last(a.importance, b.importance));

    ranked
        .into_iter()
        .take(top_n)
        .map(|row| RankedDriver {
            feature: row.feature.clone(),
            label: labels.label_for(&row.feature).to_string(),
            importance: row.importance,
        })
        .collect()
}
