// Run configuration, loaded once and passed down explicitly.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{CatalogError, Result};
use crate::model::CompanySettings;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub settings: CompanySettings,
    pub uploads: UploadsConfig,
    pub catalogs: CatalogsConfig,
    pub images: ImageConfig,
}

/// Where public upload URLs live on disk.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct UploadsConfig {
    pub base_url: String,
    pub base_dir: PathBuf,
}

impl Default for UploadsConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost/wp-content/uploads".to_string(),
            base_dir: PathBuf::from("uploads"),
        }
    }
}

/// Output directory for generated catalogs and its public URL.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CatalogsConfig {
    pub dir: PathBuf,
    pub base_url: String,
}

impl Default for CatalogsConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("uploads/wfx-catalogs"),
            base_url: "http://localhost/wp-content/uploads/wfx-catalogs".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ImageConfig {
    /// Downscale large product images before embedding
    pub optimize: bool,
    /// Longest side after downscaling, in pixels
    pub max_px: u32,
}

impl Default for ImageConfig {
    fn default() -> Self {
        Self {
            optimize: true,
            max_px: 800,
        }
    }
}

impl Config {
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| CatalogError::Config(format!("{}: {}", path.display(), e)))?;
        Self::from_json(&content)
    }

    pub fn from_json(content: &str) -> Result<Self> {
        let config: Config = serde_json::from_str(content)
            .map_err(|e| CatalogError::Config(format!("Invalid JSON: {}", e)))?;
        if config.images.max_px == 0 {
            return Err(CatalogError::Config("images.max_px must be positive".to_string()));
        }
        Ok(config)
    }
}
