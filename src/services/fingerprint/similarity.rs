// Similarity Metrics
// Cosine, Jaccard and position-difference comparisons over feature sets

use crate::models::{FeatureSet, SimilarityReport};
use crate::services::text_processor::extract_features;
use thiserror::Error;
use tracing::debug;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SimilarityError {
    #[error("vector length mismatch: left {left}, right {right}")]
    LengthMismatch { left: usize, right: usize },
    #[error("empty vector")]
    EmptyVector,
}

/// Integer dot product of two count vectors of equal, non-zero length.
pub fn dot_product(a: &[u32], b: &[u32]) -> Result<u64, SimilarityError> {
    if a.is_empty() || b.is_empty() {
        return Err(SimilarityError::EmptyVector);
    }
    if a.len() != b.len() {
        return Err(SimilarityError::LengthMismatch {
            left: a.len(),
            right: b.len(),
        });
    }
    Ok(a.iter().zip(b).map(|(x, y)| *x as u64 * *y as u64).sum())
}

/// Cosine similarity of two count vectors, in [0, 1] for counts.
///
/// Lengths are not validated. Returns NaN when either vector is all zeros;
/// callers must guard that case.
pub fn cosine_similarity(a: &[u32], b: &[u32]) -> f64 {
    let mut dot = 0u64;
    let mut norm_a = 0u64;
    let mut norm_b = 0u64;

    for (x, y) in a.iter().zip(b) {
        let (x, y) = (*x as u64, *y as u64);
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }

    dot as f64 / (norm_a as f64 * norm_b as f64).sqrt()
}

/// Sum of per-slot minimums over sum of per-slot maximums. Two all-zero
/// vectors are identical by convention and score 1.0.
pub fn jaccard_index(a: &[u32], b: &[u32]) -> f64 {
    let mut intersection = 0u64;
    let mut union = 0u64;

    for (x, y) in a.iter().zip(b) {
        intersection += (*x).min(*y) as u64;
        union += (*x).max(*y) as u64;
    }

    if union == 0 {
        return 1.0;
    }
    intersection as f64 / union as f64
}

/// Average positional displacement between two texts, normalized by the
/// longer text's length minus one.
///
/// Per slot: positions are paired in occurrence order; the leftover tail of
/// the longer side adds its mean raw offset. A slot present in only one
/// text adds that side's mean raw offset. Slots absent from both are left
/// out of the average. 0 means identical placement; values grow with text
/// length, and a longest text of one character (or none) makes the final
/// division degenerate.
pub fn position_difference(
    a: &[Vec<usize>],
    b: &[Vec<usize>],
    total_a: usize,
    total_b: usize,
) -> f64 {
    let mut total_avg_difference = 0.0;
    let mut elements_calculated = 0usize;

    for (left, right) in a.iter().zip(b) {
        if left.is_empty() && right.is_empty() {
            continue;
        }
        elements_calculated += 1;

        if left.is_empty() || right.is_empty() {
            let present = if left.is_empty() { right } else { left };
            total_avg_difference += mean_offset(present);
            continue;
        }

        let overlap = left.len().min(right.len());
        let abs_diff: f64 = left
            .iter()
            .zip(right)
            .map(|(x, y)| (*x as f64 - *y as f64).abs())
            .sum();
        total_avg_difference += abs_diff / overlap as f64;

        let longer = if left.len() > right.len() { left } else { right };
        if longer.len() > overlap {
            total_avg_difference += mean_offset(&longer[overlap..]);
        }
    }

    let grand_avg = total_avg_difference / elements_calculated as f64;
    // Degenerate (division by zero or a negative length) for texts of at most one character
    grand_avg / (total_a.max(total_b) as f64 - 1.0)
}

fn mean_offset(positions: &[usize]) -> f64 {
    positions.iter().map(|&p| p as f64).sum::<f64>() / positions.len() as f64
}

/// All similarity figures for two feature sets.
pub fn compare_features(a: &FeatureSet, b: &FeatureSet) -> SimilarityReport {
    let cosine = cosine_similarity(&a.count_by_slot, &b.count_by_slot);
    let jaccard = jaccard_index(&a.count_by_slot, &b.count_by_slot);
    let position = position_difference(&a.positions_by_slot, &b.positions_by_slot, a.total_count, b.total_count);

    let report = SimilarityReport {
        cosine,
        jaccard,
        position_difference: position,
        equal_weighted: (cosine + jaccard + (1.0 - position)) / 3.0,
        weighted: 0.4 * cosine + 0.3 * jaccard + 0.3 * (1.0 - position),
    };

    debug!(
        cosine = report.cosine,
        jaccard = report.jaccard,
        position = report.position_difference,
        "[SIMILARITY] feature sets compared"
    );

    report
}

pub fn compare_texts(a: &str, b: &str) -> SimilarityReport {
    compare_features(&extract_features(a), &extract_features(b))
}
