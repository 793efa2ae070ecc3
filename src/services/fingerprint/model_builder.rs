// Model Builder
// Builds the corpus-level distribution model from training texts

use super::fitter::{fit_distribution, mean_std_dev};
use crate::models::{
    DistributionModel, FeatureSet, FittedDistribution, SlotModel, SlotStatistics, SLOT_COUNT,
};
use crate::services::text_processor::extract_features;
use thiserror::Error;
use tracing::{debug, info, warn};

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ModelError {
    #[error("no training texts provided")]
    EmptyCorpus,
}

/// Build a distribution model from raw training texts.
pub fn create_model<S: AsRef<str>>(
    training_texts: &[S],
    anomaly_threshold: f64,
    fit_acceptance_threshold: f64,
) -> Result<DistributionModel, ModelError> {
    let features: Vec<FeatureSet> = training_texts
        .iter()
        .map(|text| extract_features(text.as_ref()))
        .collect();
    create_model_from_features(&features, anomaly_threshold, fit_acceptance_threshold)
}

/// Build a distribution model from already extracted feature sets.
pub fn create_model_from_features(
    features: &[FeatureSet],
    anomaly_threshold: f64,
    fit_acceptance_threshold: f64,
) -> Result<DistributionModel, ModelError> {
    if features.is_empty() {
        return Err(ModelError::EmptyCorpus);
    }

    info!(
        samples = features.len(),
        anomaly_threshold,
        fit_acceptance_threshold,
        "[MODEL] Building distribution model"
    );

    if features.iter().all(|f| f.total_count == 0) {
        warn!("[MODEL] every training text is empty, all slots fall back to placeholders");
    }

    let slots: [SlotModel; SLOT_COUNT] =
        std::array::from_fn(|slot| build_slot(features, slot, fit_acceptance_threshold));

    let fitted_slots = slots.iter().filter(|s| s.has_frequency_data()).count();
    info!(
        samples = features.len(),
        fitted_slots,
        "[MODEL] Distribution model ready"
    );

    Ok(DistributionModel {
        sample_count: features.len(),
        anomaly_threshold,
        slots,
    })
}

fn build_slot(features: &[FeatureSet], slot: usize, fit_acceptance_threshold: f64) -> SlotModel {
    let frequency_samples = relative_frequencies(features, slot);
    let position_samples = relative_positions(features, slot);

    let frequency = fit_or_placeholder(&frequency_samples, fit_acceptance_threshold);
    let position = fit_or_placeholder(&position_samples, fit_acceptance_threshold);

    debug!(
        slot,
        frequency_family = frequency.params.family_name(),
        frequency_fit = frequency.goodness_of_fit,
        position_family = position.params.family_name(),
        position_fit = position.goodness_of_fit,
        "[MODEL] slot fitted"
    );

    SlotModel {
        frequency_stats: statistics(&frequency_samples),
        position_stats: statistics(&position_samples),
        frequency,
        position,
        frequency_samples,
        position_samples,
    }
}

/// Slot count over total characters, one value per non-empty text.
fn relative_frequencies(features: &[FeatureSet], slot: usize) -> Vec<f64> {
    features
        .iter()
        .filter(|f| f.total_count > 0)
        .map(|f| f.count_by_slot[slot] as f64 / f.total_count as f64)
        .collect()
}

/// Offset over total characters for every occurrence in every text.
fn relative_positions(features: &[FeatureSet], slot: usize) -> Vec<f64> {
    features
        .iter()
        .filter(|f| f.total_count > 0)
        .flat_map(|f| {
            let total = f.total_count as f64;
            f.positions_by_slot[slot].iter().map(move |&pos| pos as f64 / total)
        })
        .collect()
}

fn fit_or_placeholder(samples: &[f64], fit_acceptance_threshold: f64) -> FittedDistribution {
    if samples.is_empty() {
        FittedDistribution::placeholder()
    } else {
        fit_distribution(samples, fit_acceptance_threshold)
    }
}

fn statistics(samples: &[f64]) -> SlotStatistics {
    let (mean, std_dev) = mean_std_dev(samples);
    SlotStatistics { mean, std_dev }
}
