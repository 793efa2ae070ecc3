// Anomaly Scoring
// Scores a query text against a fitted distribution model. Frequency and
// position lenses are computed the same way and reported separately.

use crate::models::{
    AnomalousSlot, AnomalyReport, DistributionModel, FeatureSet, Lens, LensVerdict, Slot,
};
use crate::services::text_processor::extract_features;
use tracing::info;

/// Slot scores must exceed this (probability below 0.01) to count.
pub const SIGNIFICANCE_FLOOR: f64 = 2.0;
/// Score assigned when the observed value has zero density.
pub const ZERO_PROBABILITY_SCORE: f64 = 10.0;

/// Negative log10 of a density. Zero (or undefined) density maps to
/// [`ZERO_PROBABILITY_SCORE`].
pub fn anomaly_contribution(probability: f64) -> f64 {
    if probability > 0.0 {
        -probability.log10()
    } else {
        ZERO_PROBABILITY_SCORE
    }
}

/// Query value for a slot under a lens, or `None` when the slot has no
/// training data or the query offers nothing to evaluate.
fn observed_value(model: &DistributionModel, features: &FeatureSet, slot: Slot, lens: Lens) -> Option<f64> {
    let slot_model = model.slot(slot);
    let idx = slot.index();
    match lens {
        Lens::Frequency => {
            if !slot_model.has_frequency_data() {
                return None;
            }
            if features.total_count == 0 {
                return Some(0.0);
            }
            Some(features.count_by_slot[idx] as f64 / features.total_count as f64)
        }
        Lens::Position => {
            let positions = &features.positions_by_slot[idx];
            if !slot_model.has_position_data() || positions.is_empty() {
                return None;
            }
            let total = features.total_count as f64;
            let mean = positions.iter().map(|&p| p as f64 / total).sum::<f64>() / positions.len() as f64;
            Some(mean)
        }
    }
}

/// Score already extracted features under one lens.
pub fn score_features(model: &DistributionModel, features: &FeatureSet, lens: Lens) -> LensVerdict {
    let mut slot_scores = Vec::new();
    let mut total_score = 0.0;
    let mut probability = 0.0;

    for slot in Slot::all() {
        let Some(value) = observed_value(model, features, slot, lens) else {
            continue;
        };

        let slot_model = model.slot(slot);
        let fitted = match lens {
            Lens::Frequency => &slot_model.frequency,
            Lens::Position => &slot_model.position,
        };

        probability = fitted.params.probability(value);
        let score = anomaly_contribution(probability);

        if score > SIGNIFICANCE_FLOOR {
            total_score += score;
            slot_scores.push(AnomalousSlot {
                label: slot.label(),
                score,
            });
        }
    }

    if !slot_scores.is_empty() {
        total_score /= slot_scores.len() as f64;
    }

    LensVerdict {
        is_anomaly: total_score > model.anomaly_threshold,
        score: total_score,
        slot_scores,
        probability,
    }
}

/// Frequency lens verdict for a text.
pub fn score_text(model: &DistributionModel, text: &str) -> LensVerdict {
    score_features(model, &extract_features(text), Lens::Frequency)
}

/// Position lens verdict for a text.
pub fn score_text_positions(model: &DistributionModel, text: &str) -> LensVerdict {
    score_features(model, &extract_features(text), Lens::Position)
}

pub fn is_anomaly(model: &DistributionModel, text: &str) -> bool {
    score_text(model, text).is_anomaly
}

/// Both lenses for a text, side by side.
pub fn assess(model: &DistributionModel, text: &str) -> AnomalyReport {
    let features = extract_features(text);
    let frequency = score_features(model, &features, Lens::Frequency);
    let position = score_features(model, &features, Lens::Position);

    info!(
        frequency_score = frequency.score,
        frequency_anomaly = frequency.is_anomaly,
        position_score = position.score,
        position_anomaly = position.is_anomaly,
        threshold = model.anomaly_threshold,
        "[ANOMALY] Text assessed"
    );

    AnomalyReport { frequency, position }
}

/// The `n` highest scoring slots of a verdict. Equal scores keep slot order.
pub fn rank_anomalies(verdict: &LensVerdict, n: usize) -> Vec<AnomalousSlot> {
    let mut ranked = verdict.slot_scores.clone();
    ranked.sort_by(|a, b| b.score.total_cmp(&a.score));
    ranked.truncate(n);
    ranked
}

/// Top `n` anomalous slots of a text under one lens.
pub fn top_anomalies(model: &DistributionModel, text: &str, n: usize, lens: Lens) -> Vec<AnomalousSlot> {
    let verdict = score_features(model, &extract_features(text), lens);
    rank_anomalies(&verdict, n)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::fingerprint::model_builder::create_model;

    fn training_corpus() -> Vec<&'static str> {
        vec![
            "This is an example of normal text that follows certain patterns. It has numbers like 123 and 456.",
            "Another normal sample with similar distribution of characters and numbers 789.",
            "The quick brown fox jumps over the lazy dog. It contains all letters of the alphabet.",
            "We expect these texts to establish a baseline for what's considered normal in our model.",
            "One more sample text that will help define our distribution parameters.",
        ]
    }

    #[test]
    fn test_anomaly_contribution() {
        assert_eq!(anomaly_contribution(0.0), ZERO_PROBABILITY_SCORE);
        assert_eq!(anomaly_contribution(f64::NAN), ZERO_PROBABILITY_SCORE);
        assert!((anomaly_contribution(0.001) - 3.0).abs() < 1e-12);
        assert_eq!(anomaly_contribution(f64::INFINITY), f64::NEG_INFINITY);
    }

    #[test]
    fn test_repeated_letter_corpus_flags_other_letter() {
        let training = vec!["aaaaa"; 5];
        let model = create_model(&training, 2.0, 0.8).unwrap();

        let verdict = score_text(&model, "zzzzz");
        assert!(verdict.is_anomaly);
        assert!(verdict.score > 0.0);

        let z = verdict.slot_scores.iter().find(|s| s.label == 'z').expect("z should contribute");
        assert!(z.score > 0.0);
        assert!(verdict.slot_scores.iter().all(|s| s.label == 'z'));
        assert!(is_anomaly(&model, "zzzzz"));
    }

    #[test]
    fn test_training_text_is_not_anomalous_against_itself() {
        let training = vec!["aaaaa"; 5];
        let model = create_model(&training, 2.0, 0.8).unwrap();
        let verdict = score_text(&model, "aaaaa");
        assert!(!verdict.is_anomaly);
        assert_eq!(verdict.score, 0.0);
        assert!(verdict.slot_scores.is_empty());
    }

    #[test]
    fn test_slots_without_training_data_are_skipped() {
        let model = create_model(&["", ""], 2.0, 0.8).unwrap();
        let report = assess(&model, "anything at all 123");
        assert!(report.frequency.slot_scores.is_empty());
        assert!(report.position.slot_scores.is_empty());
        assert!(!report.frequency.is_anomaly);
        assert_eq!(report.frequency.score, 0.0);
    }

    #[test]
    fn test_position_lens_skips_absent_query_slots() {
        let model = create_model(&training_corpus(), 2.0, 0.8).unwrap();
        let features = extract_features("");
        let verdict = score_features(&model, &features, Lens::Position);
        assert!(verdict.slot_scores.is_empty());
        assert_eq!(verdict.score, 0.0);
    }

    #[test]
    fn test_position_lens_flags_moved_character() {
        // 'a' always opens the text during training
        let training = vec!["abbbbbbbbb"; 5];
        let model = create_model(&training, 2.0, 0.8).unwrap();

        // same counts, but 'a' now closes the text
        let report = assess(&model, "bbbbbbbbba");

        assert!(report.position.score > 0.0);
        assert!(report.position.is_anomaly);
        let a = report
            .position
            .slot_scores
            .iter()
            .find(|s| s.label == 'a')
            .expect("moved 'a' should contribute");
        assert_eq!(a.score, ZERO_PROBABILITY_SCORE);

        assert_eq!(report.frequency, score_text(&model, "abbbbbbbbb"));
        assert!(!report.frequency.is_anomaly);
        assert!(report.frequency.slot_scores.is_empty());
    }

    #[test]
    fn test_lenses_are_reported_separately() {
        let model = create_model(&training_corpus(), 2.0, 0.8).unwrap();
        let text = "ZZZZZZZZZZ999999999XXXXXXXXXX000000000000000000";
        let report = assess(&model, text);
        assert_eq!(report.frequency, score_text(&model, text));
        assert_eq!(report.position, score_text_positions(&model, text));
        assert!(report.frequency.is_anomaly);
    }

    #[test]
    fn test_rank_anomalies_orders_by_score_and_keeps_ties_stable() {
        let verdict = LensVerdict {
            is_anomaly: true,
            score: 6.0,
            slot_scores: vec![
                AnomalousSlot { label: '0', score: 3.0 },
                AnomalousSlot { label: 'b', score: 10.0 },
                AnomalousSlot { label: 'c', score: 3.0 },
                AnomalousSlot { label: 'q', score: 8.0 },
            ],
            probability: 0.0,
        };
        let top = rank_anomalies(&verdict, 3);
        let labels: Vec<char> = top.iter().map(|s| s.label).collect();
        assert_eq!(labels, vec!['b', 'q', '0']);
        assert_eq!(rank_anomalies(&verdict, 10).len(), 4);
    }

    #[test]
    fn test_top_anomalies_limits_results() {
        let model = create_model(&training_corpus(), 2.0, 0.8).unwrap();
        let text = "ZZZZZZZZZZ999999999XXXXXXXXXX000000000000000000";
        let top = top_anomalies(&model, text, 2, Lens::Frequency);
        assert!(top.len() <= 2);
        for pair in top.windows(2) {
            assert!(pair[0].score >= pair[1].score);
        }
    }
}
