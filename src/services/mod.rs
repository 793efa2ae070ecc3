// Letterprint Core Services

pub mod text_processor;
pub mod config_store;
pub mod model_store;
pub mod fingerprint;

pub use text_processor::*;
pub use config_store::*;
pub use model_store::{load_model, save_model, ModelStoreError};

// Re-export fingerprint module functions
pub use fingerprint::{
    assess,
    compare_features,
    compare_texts,
    create_model,
    create_model_from_features,
    fit_distribution,
    is_anomaly,
    model_summary,
    score_text,
    score_text_positions,
    top_anomalies,
    ModelError,
    SimilarityError,
};
