//! Spreadsheet export download.

use crate::api::{ApiError, DashboardApi};
use crate::filters::ValidatedFilters;
use crate::status::EXPORT_FAILED;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::info;

pub const FALLBACK_FILENAME: &str = "relatorio_wifi.xlsx";

#[derive(Debug, Error)]
pub enum ExportError {
    /// The server refused; its body is meant for the user
    #[error("{0}")]
    Rejected(String),
    #[error("export request failed: {0}")]
    Api(#[from] ApiError),
    #[error("failed to write export file: {0}")]
    Io(#[from] std::io::Error),
}

impl ExportError {
    /// Text for the blocking alert
    pub fn alert_message(&self) -> &str {
        match self {
            ExportError::Rejected(message) if !message.trim().is_empty() => message.as_str(),
            _ => EXPORT_FAILED,
        }
    }
}

/// Filename from a `Content-Disposition` header, quoted or bare
pub fn disposition_filename(header: &str) -> Option<String> {
    header
        .split(';')
        .map(str::trim)
        .find_map(|part| {
            let (key, value) = part.split_once('=')?;
            if !key.trim().eq_ignore_ascii_case("filename") {
                return None;
            }
            let value = value.trim().trim_matches('"');
            // never let the server pick a directory
            let name = Path::new(value).file_name()?.to_str()?;
            (!name.is_empty()).then(|| name.to_string())
        })
}

pub async fn export_spreadsheet<A: DashboardApi + ?Sized>(
    api: &A,
    filters: &ValidatedFilters,
    dir: &Path,
) -> Result<PathBuf, ExportError> {
    let payload = api.export(filters).await.map_err(|e| match e {
        ApiError::Status { body, .. } => ExportError::Rejected(body),
        other => ExportError::Api(other),
    })?;

    let filename = payload
        .content_disposition
        .as_deref()
        .and_then(disposition_filename)
        .unwrap_or_else(|| FALLBACK_FILENAME.to_string());

    tokio::fs::create_dir_all(dir).await?;
    let path = dir.join(filename);
    tokio::fs::write(&path, &payload.bytes).await?;
    info!(path = %path.display(), bytes = payload.bytes.len(), "Exported spreadsheet");
    Ok(path)
}
