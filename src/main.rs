use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand};
use serde::Serialize;
use tracing_subscriber::EnvFilter;

mod drift;
mod drivers;
mod error;
mod io;
mod lift;
mod metrics;
mod models;
mod stats;

use models::{CapacityDecision, DecileBucket, Feature, Observation, ScoredRecord};

#[derive(Parser)]
#[command(name = "capacity-lift-monitor")]
#[command(about = "Capacity-constrained decision evaluation and drift monitoring", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Lift by score decile over the evaluation window
    Lift {
        #[arg(long, env = "LIFT_DATA")]
        data: PathBuf,
        #[arg(long, default_value_t = 10)]
        from_period: u32,
        #[arg(long, default_value_t = 10)]
        bins: usize,
        /// Write the lift table as CSV
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// Score cutoff and queue event rate for a review capacity
    Capacity {
        #[arg(long, env = "LIFT_DATA")]
        data: PathBuf,
        #[arg(long, default_value_t = 10)]
        from_period: u32,
        #[arg(long, default_value_t = 0.05)]
        capacity_pct: f64,
    },
    /// Feature and score drift (PSI) between baseline and recent periods
    Drift {
        #[arg(long, env = "LIFT_DATA")]
        data: PathBuf,
        /// Last period of the baseline; later periods are recent
        #[arg(long, default_value_t = 9)]
        baseline_through: u32,
        #[arg(long, default_value_t = 10)]
        bins: usize,
        /// Comma-separated feature names; defaults to the continuous features
        #[arg(long, value_delimiter = ',')]
        features: Vec<Feature>,
    },
    /// Top drivers from a feature importance table, in business terms
    Drivers {
        #[arg(long)]
        importance: PathBuf,
        #[arg(long, default_value_t = 6)]
        top_n: usize,
        /// JSON object mapping feature names to labels
        #[arg(long, env = "LIFT_LABELS")]
        labels: Option<PathBuf>,
    },
    /// Decision summary as JSON
    Summary {
        #[arg(long, env = "LIFT_DATA")]
        data: PathBuf,
        #[arg(long, default_value_t = 10)]
        from_period: u32,
        #[arg(long, default_value_t = 0.05)]
        capacity_pct: f64,
        #[arg(long, default_value_t = 10)]
        bins: usize,
        #[arg(long)]
        out: Option<PathBuf>,
    },
}

#[derive(Serialize)]
struct DecisionSummary {
    generated_at: chrono::DateTime<chrono::Utc>,
    records: usize,
    base_rate: f64,
    top_decile: Option<DecileBucket>,
    average_precision: Option<f64>,
    brier_score: f64,
    capacity: CapacityDecision,
}

fn evaluation_window(observations: &[Observation], from_period: u32) -> Vec<ScoredRecord> {
    observations
        .iter()
        .filter(|obs| obs.period >= from_period)
        .map(Observation::scored)
        .collect()
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Lift {
            data,
            from_period,
            bins,
            out,
        } => {
            let records = evaluation_window(&io::load_observations(&data)?, from_period);
            let table = lift::evaluate(&records, bins).context("lift table failed")?;

            println!("Base event rate: {:.4}", table.base_rate);
            println!("decile      n  event_rate  avg_score   lift");
            for bucket in &table.buckets {
                println!(
                    "{:>6} {:>6}  {:>10.4}  {:>9.4}  {:>5.2}",
                    bucket.decile, bucket.n, bucket.event_rate, bucket.avg_score, bucket.lift_vs_base
                );
            }

            if let Some(path) = out {
                let file = std::fs::File::create(&path)
                    .with_context(|| format!("failed to create {}", path.display()))?;
                io::write_lift_table(file, &table)?;
                println!("Lift table written to {}.", path.display());
            }
        }
        Commands::Capacity {
            data,
            from_period,
            capacity_pct,
        } => {
            let records = evaluation_window(&io::load_observations(&data)?, from_period);
            let decision = lift::capacity_decision(&records, capacity_pct)?;

            println!("Capacity: {:.2}% (top {} records)", capacity_pct * 100.0, decision.k);
            println!("Score cutoff: {:.4}", decision.cutoff);
            println!("Queue size: {}", decision.queue_size);
            match decision.queue_event_rate {
                Some(rate) => println!("Event rate in queue: {rate:.4}"),
                None => println!("Event rate in queue: n/a"),
            }
        }
        Commands::Drift {
            data,
            baseline_through,
            bins,
            features,
        } => {
            let features = if features.is_empty() {
                Feature::MONITORED.to_vec()
            } else {
                features
            };
            let observations = io::load_observations(&data)?;
            let (baseline, recent) =
                stats::split_by_period(&observations, |period| period <= baseline_through);

            let mut metrics = drift::feature_drift(&baseline, &recent, &features, bins)?;
            let scored_baseline: Vec<ScoredRecord> = baseline.iter().map(Observation::scored).collect();
            let scored_recent: Vec<ScoredRecord> = recent.iter().map(Observation::scored).collect();
            metrics.push(drift::score_drift(&scored_baseline, &scored_recent, bins)?);

            println!("Drift (PSI), periods <= {baseline_through} vs > {baseline_through}:");
            for metric in &metrics {
                println!("{:22} PSI={:.4} ({:?})", metric.variable, metric.psi, metric.severity);
            }
        }
        Commands::Drivers {
            importance,
            top_n,
            labels,
        } => {
            let labels = match labels {
                Some(path) => drivers::LabelMap::from_json_path(&path)?,
                None => drivers::LabelMap::default(),
            };
            let table = io::load_importances(&importance)?;
            let ranked = drivers::top_drivers(&table, top_n, &labels);

            if ranked.is_empty() {
                println!("No feature importances found.");
                return Ok(());
            }

            println!("Top drivers:");
            for driver in &ranked {
                println!("- {:22} -> {} ({:.4})", driver.feature, driver.label, driver.importance);
            }
        }
        Commands::Summary {
            data,
            from_period,
            capacity_pct,
            bins,
            out,
        } => {
            let records = evaluation_window(&io::load_observations(&data)?, from_period);
            let table = lift::evaluate(&records, bins)?;
            let capacity = lift::capacity_decision(&records, capacity_pct)?;

            let labels: Vec<u8> = records.iter().map(|r| r.label).collect();
            let scores: Vec<f64> = records.iter().map(|r| r.score).collect();
            let average_precision = match metrics::average_precision(&labels, &scores) {
                Ok(value) => Some(value),
                Err(error::EvalError::NoPositiveLabels) => None,
                Err(err) => return Err(err.into()),
            };

            let summary = DecisionSummary {
                generated_at: chrono::Utc::now(),
                records: records.len(),
                base_rate: table.base_rate,
                top_decile: table.top_bucket().cloned(),
                average_precision,
                brier_score: metrics::brier_score(&labels, &scores)?,
                capacity,
            };
            let json = serde_json::to_string_pretty(&summary)?;

            match out {
                Some(path) => {
                    std::fs::write(&path, json)?;
                    println!("Summary written to {}.", path.display());
                }
                None => println!("{json}"),
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use models::FeatureVector;

    fn observation(period: u32, score: f64) -> Observation {
        Observation {
            entity_id: period,
            period,
            features: FeatureVector {
                transactions_volume: 1.0,
                policy_change_exposure: 0,
                anomaly_score: 0.0,
                prior_case_flag: 0,
                behavior_shift_30d: 0.0,
                data_quality_score: 0.9,
            },
            label: 0,
            score,
        }
    }

    #[test]
    fn evaluation_window_keeps_late_periods() {
        let observations: Vec<Observation> = (1..=12).map(|m| observation(m, m as f64 / 12.0)).collect();
        let window = evaluation_window(&observations, 10);
        assert_eq!(window.len(), 3);
        assert_eq!(window[0].period, 10);
    }

    #[test]
    fn cli_parses_capacity_defaults() {
        let cli = Cli::parse_from(["capacity-lift-monitor", "capacity", "--data", "scores.csv"]);
        match cli.command {
            Commands::Capacity {
                from_period,
                capacity_pct,
                ..
            } => {
                assert_eq!(from_period, 10);
                assert_eq!(capacity_pct, 0.05);
            }
            _ => panic!("expected capacity command"),
        }
    }

    #[test]
    fn cli_parses_drift_feature_list() {
        let cli = Cli::parse_from([
            "capacity-lift-monitor",
            "drift",
            "--data",
            "scores.csv",
            "--features",
            "anomaly_score,prior_case_flag",
        ]);
        match cli.command {
            Commands::Drift { features, baseline_through, .. } => {
                assert_eq!(features, vec![Feature::AnomalyScore, Feature::PriorCaseFlag]);
                assert_eq!(baseline_through, 9);
            }
            _ => panic!("expected drift command"),
        }
    }
}
