// Model Storage Service
// Saves trained distribution models as JSON and loads them back

use crate::models::DistributionModel;
use std::fs;
use std::path::Path;
use thiserror::Error;
use tracing::info;

#[derive(Error, Debug)]
pub enum ModelStoreError {
    #[error("model I/O failed: {0}")]
    Io(#[from] std::io::Error),
    #[error("model JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Write `model` to `path` as pretty JSON, creating parent folders.
pub fn save_model(path: &Path, model: &DistributionModel) -> Result<(), ModelStoreError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }

    let content = serde_json::to_string_pretty(model)?;
    fs::write(path, content)?;

    info!(
        path = %path.display(),
        samples = model.sample_count,
        "[MODEL] saved"
    );
    Ok(())
}

/// Read a model written by [`save_model`].
pub fn load_model(path: &Path) -> Result<DistributionModel, ModelStoreError> {
    let content = fs::read_to_string(path)?;
    let model: DistributionModel = serde_json::from_str(&content)?;

    info!(
        path = %path.display(),
        samples = model.sample_count,
        "[MODEL] loaded"
    );
    Ok(model)
}
