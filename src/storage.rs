use crate::errors::AppError;
use crate::models::AppData;
use crate::remote::RemoteMirror;
use std::{env, path::Path, path::PathBuf};
use thiserror::Error;
use tokio::fs;
use tracing::{error, info, warn};

pub fn resolve_data_path() -> PathBuf {
    if let Ok(path) = env::var("APP_DATA_PATH") {
        return PathBuf::from(path);
    }

    PathBuf::from("data/state.json")
}

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to read data file: {0}")]
    Read(#[from] std::io::Error),
    #[error("failed to parse data file: {0}")]
    Parse(#[from] serde_json::Error),
}

/// `Ok(None)` only when the file does not exist.
pub async fn load_data(path: &Path) -> Result<Option<AppData>, LoadError> {
    let bytes = match fs::read(path).await {
        Ok(bytes) => bytes,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(err) => return Err(err.into()),
    };
    let mut data: AppData = serde_json::from_slice(&bytes)?;
    data.normalize();
    Ok(Some(data))
}

pub async fn persist_data(path: &Path, data: &AppData) -> Result<(), AppError> {
    let payload = serde_json::to_vec_pretty(data).map_err(AppError::internal)?;
    fs::write(path, payload).await.map_err(AppError::internal)?;
    Ok(())
}

pub fn backup_path(path: &Path) -> PathBuf {
    let mut name = path.as_os_str().to_owned();
    name.push(".bak");
    PathBuf::from(name)
}

/// Remote document first, then the local file, then a fresh default document.
/// An unparseable local file is moved aside to `<path>.bak`, never overwritten.
pub async fn initialize_data(
    path: &Path,
    mirror: Option<&RemoteMirror>,
) -> Result<AppData, AppError> {
    if let Some(mirror) = mirror {
        match mirror.load().await {
            Ok(Some(data)) => {
                info!("loaded competition data from {}", mirror.url());
                persist_data(path, &data).await?;
                return Ok(data);
            }
            Ok(None) => info!("remote mirror holds no data yet"),
            Err(err) => warn!("failed to load from remote mirror: {err}"),
        }
    }

    match load_data(path).await {
        Ok(Some(data)) => {
            info!("loaded competition data from {}", path.display());
            return Ok(data);
        }
        Ok(None) => {}
        Err(LoadError::Parse(err)) => {
            let backup = backup_path(path);
            error!(
                "failed to parse data file: {err}; moving it to {}",
                backup.display()
            );
            fs::rename(path, &backup).await?;
        }
        Err(LoadError::Read(err)) => return Err(AppError::internal(err)),
    }

    info!("starting with a fresh competition document");
    let data = AppData::default();
    persist_data(path, &data).await?;
    if let Some(mirror) = mirror {
        if let Err(err) = mirror.save(&data).await {
            warn!("failed to mirror fresh document: {err}");
        }
    }
    Ok(data)
}
