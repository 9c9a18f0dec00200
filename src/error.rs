use std::path::PathBuf;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, CatalogError>;

#[derive(Error, Debug)]
pub enum CatalogError {
    #[error("PDF backend unavailable: {0}")]
    MissingDependency(String),
    #[error("No products selected")]
    NoProductsSelected,
    /// Never aborts a run; the card falls back to a placeholder.
    #[error("Image unavailable ({url}): {reason}")]
    ImageUnavailable { url: String, reason: String },
    #[error("Failed to write catalog to {}: {source}", path.display())]
    WriteFailure {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Invalid configuration: {0}")]
    Config(String),
    #[error("Failed to read product list: {0}")]
    Input(String),
    #[error("Failed to generate catalog: {0}")]
    Generation(String),
}

impl CatalogError {
    pub(crate) fn image(url: &str, reason: impl Into<String>) -> Self {
        CatalogError::ImageUnavailable {
            url: url.to_string(),
            reason: reason.into(),
        }
    }

    pub(crate) fn write(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        CatalogError::WriteFailure {
            path: path.into(),
            source,
        }
    }
}
