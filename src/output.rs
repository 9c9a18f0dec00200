// Writing generated catalogs to the catalogs directory.

use chrono::NaiveDateTime;
use serde::Serialize;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::info;
use uuid::Uuid;

use crate::config::CatalogsConfig;
use crate::error::{CatalogError, Result};

const FILE_PREFIX: &str = "catalogo-mayorista";

/// A catalog file on disk and where the public can fetch it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SavedCatalog {
    pub path: PathBuf,
    pub url: String,
}

/// `catalogo-mayorista-2024-03-09-140500-1A2B3C4D.pdf`
pub fn catalog_filename(now: NaiveDateTime) -> String {
    format!("{}-{}-{}.pdf", FILE_PREFIX, now.format("%Y-%m-%d-%H%M%S"), random_suffix())
}

fn random_suffix() -> String {
    let uuid = Uuid::new_v4();
    let hex = format!("{:x}", uuid.simple());
    hex[..8].to_uppercase()
}

/// Creates the directory when missing and writes `bytes` under a fresh name.
pub fn save(bytes: &[u8], catalogs: &CatalogsConfig, now: NaiveDateTime) -> Result<SavedCatalog> {
    ensure_dir(&catalogs.dir)?;

    let filename = catalog_filename(now);
    let path = catalogs.dir.join(&filename);
    let file = File::create(&path).map_err(|e| CatalogError::write(&path, e))?;
    let mut writer = BufWriter::new(file);
    writer
        .write_all(bytes)
        .and_then(|_| writer.flush())
        .map_err(|e| CatalogError::write(&path, e))?;

    let url = format!("{}/{}", catalogs.base_url.trim_end_matches('/'), filename);
    info!(path = %path.display(), bytes = bytes.len(), "catalog saved");
    Ok(SavedCatalog { path, url })
}

fn ensure_dir(dir: &Path) -> Result<()> {
    if dir.is_dir() {
        return Ok(());
    }
    std::fs::create_dir_all(dir).map_err(|e| CatalogError::write(dir, e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn now() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 3, 9).unwrap().and_hms_opt(14, 5, 0).unwrap()
    }

    #[test]
    fn filenames_are_timestamped_and_unique() {
        let a = catalog_filename(now());
        let b = catalog_filename(now());
        assert!(a.starts_with("catalogo-mayorista-2024-03-09-140500-"));
        assert!(a.ends_with(".pdf"));
        assert_eq!(a.len(), "catalogo-mayorista-2024-03-09-140500-".len() + 8 + 4);
        assert_ne!(a, b);
    }

    #[test]
    fn saves_into_new_directory() {
        let dir = tempfile::tempdir().unwrap();
        let catalogs = CatalogsConfig {
            dir: dir.path().join("nested/wfx-catalogs"),
            base_url: "https://shop.test/uploads/wfx-catalogs/".to_string(),
        };
        let saved = save(b"%PDF-1.3 test", &catalogs, now()).unwrap();

        assert_eq!(std::fs::read(&saved.path).unwrap(), b"%PDF-1.3 test");
        let name = saved.path.file_name().unwrap().to_str().unwrap();
        assert_eq!(saved.url, format!("https://shop.test/uploads/wfx-catalogs/{}", name));
    }

    #[test]
    fn unwritable_directory_is_a_write_failure() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("file");
        std::fs::write(&blocker, b"x").unwrap();
        let catalogs = CatalogsConfig {
            dir: blocker.join("catalogs"),
            base_url: "https://shop.test".to_string(),
        };
        assert!(matches!(save(b"%PDF", &catalogs, now()), Err(CatalogError::WriteFailure { .. })));
    }
}
