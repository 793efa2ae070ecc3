// Fingerprint Module
// Character-distribution fingerprinting organized into specialized submodules:
// - similarity: Cosine, Jaccard and position-difference comparison of two texts
// - special: Special functions backing the distribution CDFs
// - distributions: Density and CDF evaluation for each fitted family
// - fitter: Goodness-of-fit competition between candidate families
// - model_builder: Builds the corpus-level distribution model
// - anomaly: Scores query texts against a model
// - summary: Human-readable model summary

pub mod similarity;
pub mod special;
pub mod distributions;
pub mod fitter;
pub mod model_builder;
pub mod anomaly;
pub mod summary;

// Re-export commonly used functions
pub use similarity::{
    compare_features,
    compare_texts,
    cosine_similarity,
    dot_product,
    jaccard_index,
    position_difference,
    SimilarityError,
};
pub use fitter::{fit_distribution, goodness_of_fit_ks, MIN_FIT_SAMPLES};
pub use model_builder::{create_model, create_model_from_features, ModelError};
pub use anomaly::{
    assess,
    is_anomaly,
    rank_anomalies,
    score_features,
    score_text,
    score_text_positions,
    top_anomalies,
};
pub use summary::model_summary;
