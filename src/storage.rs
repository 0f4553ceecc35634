use crate::errors::AppError;
use crate::ingest::{parse_slice, CoercionPolicy};
use crate::models::{Dataset, ReloadResponse};
use crate::state::AppState;
use std::path::Path;
use tokio::fs;
use tracing::{error, info};

pub async fn read_dataset(path: &Path, policy: CoercionPolicy) -> Result<Dataset, AppError> {
    let bytes = match fs::read(path).await {
        Ok(bytes) => bytes,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            return Err(AppError::unavailable(format!(
                "data file {} not found",
                path.display()
            )));
        }
        Err(err) => return Err(AppError::internal(err)),
    };
    Ok(parse_slice(&bytes, policy)?)
}

/// Read the configured data file and apply it if no newer load has started
/// in the meantime. Failures leave the current dataset untouched.
pub async fn reload(state: &AppState) -> Result<ReloadResponse, AppError> {
    let ticket = state.loads.begin();
    let path = &state.config.data_path;
    info!("load {ticket}: reading {}", path.display());

    let dataset = read_dataset(path, state.config.coercion)
        .await
        .inspect_err(|err| error!("load {ticket} failed: {}", err.message))?;

    let branches = dataset.branch_names();
    let applied = state.apply_load(ticket, dataset).await;

    Ok(ReloadResponse {
        generation: ticket,
        applied,
        branches,
    })
}
