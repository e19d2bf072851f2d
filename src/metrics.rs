use crate::error::{EvalError, Result};
use crate::stats;

fn check_lengths(labels: &[u8], scores: &[f64]) -> Result<()> {
    if labels.len() != scores.len() {
        return Err(EvalError::LengthMismatch {
            left: labels.len(),
            right: scores.len(),
        });
    }
    if labels.is_empty() {
        return Err(EvalError::EmptyInput("labels"));
    }
    Ok(())
}

/// Area under the precision-recall step curve, one step per distinct score.
pub fn average_precision(labels: &[u8], scores: &[f64]) -> Result<f64> {
    check_lengths(labels, scores)?;
    let positives = labels.iter().filter(|&&label| label == 1).count();
    if positives == 0 {
        return Err(EvalError::NoPositiveLabels);
    }

    let mut ranked: Vec<(f64, u8)> = scores.iter().copied().zip(labels.iter().copied()).collect();
    ranked.sort_by(|a, b| stats::descending_nan_last(a.0, b.0));

    let (mut true_pos, mut seen) = (0usize, 0usize);
    let mut previous_recall = 0.0;
    let mut area = 0.0;
    let mut index = 0;
    while index < ranked.len() {
        let threshold = ranked[index].0;
        while index < ranked.len() && ranked[index].0 == threshold {
            true_pos += usize::from(ranked[index].1 == 1);
            seen += 1;
            index += 1;
        }
        let recall = true_pos as f64 / positives as f64;
        let precision = true_pos as f64 / seen as f64;
        area += (recall - previous_recall) * precision;
        previous_recall = recall;
    }
    Ok(area)
}

pub fn brier_score(labels: &[u8], scores: &[f64]) -> Result<f64> {
    check_lengths(labels, scores)?;
    let total: f64 = labels
        .iter()
        .zip(scores)
        .map(|(&label, &score)| (score - f64::from(label)).powi(2))
        .sum();
    Ok(total / labels.len() as f64)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn average_precision_matches_reference_example() {
        let ap = average_precision(&[0, 0, 1, 1], &[0.1, 0.4, 0.35, 0.8]).unwrap();
        assert!((ap - 0.833_333_333).abs() < 1e-6);
    }

    #[test]
    fn perfect_ranking_scores_one() {
        assert_eq!(average_precision(&[1, 1, 0], &[0.9, 0.8, 0.1]).unwrap(), 1.0);
    }

    #[test]
    fn tied_scores_share_a_threshold() {
        let ap = average_precision(&[1, 0], &[0.5, 0.5]).unwrap();
        assert_eq!(ap, 0.5);
    }

    #[test]
    fn average_precision_needs_positives() {
        assert_eq!(average_precision(&[0, 0], &[0.2, 0.1]), Err(EvalError::NoPositiveLabels));
    }

    #[test]
    fn brier_is_mean_squared_error() {
        let brier = brier_score(&[1, 0], &[0.8, 0.4]).unwrap();
        assert!((brier - 0.1).abs() < 1e-12);
        assert_eq!(
            brier_score(&[1], &[0.5, 0.5]),
            Err(EvalError::LengthMismatch { left: 1, right: 2 })
        );
        assert_eq!(brier_score(&[], &[]), Err(EvalError::EmptyInput("labels")));
    }
}
