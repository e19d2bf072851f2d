use std::io::{Read, Write};
use std::path::Path;

use anyhow::Context;

use crate::models::{FeatureImportance, FeatureVector, LiftTable, Observation};

#[derive(serde::Deserialize)]
struct CsvRow {
    entity_id: u32,
    month: u32,
    transactions_volume: f64,
    policy_change_exposure: u8,
    anomaly_score: f64,
    prior_case_flag: u8,
    behavior_shift_30d: f64,
    data_quality_score: f64,
    downstream_event: u8,
    score: f64,
}

impl From<CsvRow> for Observation {
    fn from(row: CsvRow) -> Self {
        Observation {
            entity_id: row.entity_id,
            period: row.month,
            features: FeatureVector {
                transactions_volume: row.transactions_volume,
                policy_change_exposure: row.policy_change_exposure,
                anomaly_score: row.anomaly_score,
                prior_case_flag: row.prior_case_flag,
                behavior_shift_30d: row.behavior_shift_30d,
                data_quality_score: row.data_quality_score,
            },
            label: row.downstream_event,
            score: row.score,
        }
    }
}

pub fn read_observations<R: Read>(source: R) -> anyhow::Result<Vec<Observation>> {
    let mut reader = csv::Reader::from_reader(source);
    let mut observations = Vec::new();

    for (line, result) in reader.deserialize::<CsvRow>().enumerate() {
        let row = result.with_context(|| format!("bad scoring row {}", line + 1))?;
        if row.downstream_event > 1 {
            anyhow::bail!("row {}: downstream_event must be 0 or 1", line + 1);
        }
        observations.push(row.into());
    }

    Ok(observations)
}

pub fn load_observations(path: &Path) -> anyhow::Result<Vec<Observation>> {
    let file = std::fs::File::open(path)
        .with_context(|| format!("failed to open scoring data {}", path.display()))?;
    read_observations(file)
}

pub fn read_importances<R: Read>(source: R) -> anyhow::Result<Vec<FeatureImportance>> {
    let mut reader = csv::Reader::from_reader(source);
    let mut rows = Vec::new();
    for result in reader.deserialize::<FeatureImportance>() {
        rows.push(result.context("bad importance row")?);
    }
    Ok(rows)
}

pub fn load_importances(path: &Path) -> anyhow::Result<Vec<FeatureImportance>> {
    let file = std::fs::File::open(path)
        .with_context(|| format!("failed to open importance table {}", path.display()))?;
    read_importances(file)
}

pub fn write_lift_table<W: Write>(sink: W, table: &LiftTable) -> anyhow::Result<()> {
    let mut writer = csv::Writer::from_writer(sink);
    for bucket in &table.buckets {
        writer.serialize(bucket)?;
    }
    writer.flush()?;
    Ok(())
}
