// Generation entry point: request in, catalog file (or failure message) out.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tracing::{error, info};

use crate::catalog;
use crate::config::Config;
use crate::error::{CatalogError, Result};
use crate::images::ImageResolver;
use crate::layout;
use crate::model::{CatalogOptions, ProductRecord};
use crate::output;
use crate::pdf;

/// What the admin UI submits.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerateRequest {
    pub product_ids: Vec<u64>,
    pub options: CatalogOptions,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GeneratedCatalog {
    pub url: String,
    pub path: PathBuf,
    pub pages: usize,
    pub products: usize,
}

/// `{"success": true, "data": {...}}` or `{"success": false, "data": "..."}`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Response {
    pub success: bool,
    pub data: ResponseData,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ResponseData {
    Generated(GeneratedCatalog),
    Message(String),
}

/// Renders the requested products from `catalog` and writes the PDF.
pub fn generate(
    request: &GenerateRequest,
    catalog: &[ProductRecord],
    config: &Config,
    now: NaiveDateTime,
) -> Result<GeneratedCatalog> {
    if request.product_ids.is_empty() {
        return Err(CatalogError::NoProductsSelected);
    }

    let products = catalog::select(catalog, &request.product_ids);
    info!(
        requested = request.product_ids.len(),
        found = products.len(),
        "generating catalog"
    );

    let resolver = ImageResolver::new(&config.uploads, &config.images);
    let document = layout::render(&products, &request.options, &config.settings, &resolver, now);
    let bytes = pdf::write_pdf(&document)?;
    let saved = output::save(&bytes, &config.catalogs, now)?;

    Ok(GeneratedCatalog {
        url: saved.url,
        path: saved.path,
        pages: document.page_count(),
        products: document.cards.len(),
    })
}

pub fn respond(result: Result<GeneratedCatalog>) -> Response {
    match result {
        Ok(generated) => Response {
            success: true,
            data: ResponseData::Generated(generated),
        },
        Err(e) => {
            error!(error = %e, "catalog generation failed");
            Response {
                success: false,
                data: ResponseData::Message(e.to_string()),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn now() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 3, 9).unwrap().and_hms_opt(14, 5, 0).unwrap()
    }

    fn config(dir: &std::path::Path) -> Config {
        let mut config = Config::default();
        config.catalogs.dir = dir.join("wfx-catalogs");
        config.catalogs.base_url = "https://shop.test/uploads/wfx-catalogs".to_string();
        config.uploads.base_dir = dir.to_path_buf();
        config
    }

    fn catalog() -> Vec<ProductRecord> {
        (1..=3)
            .map(|id| ProductRecord {
                id,
                name: format!("Producto {}", id),
                regular_price: Some(format!("{}.50", id * 10)),
                ..Default::default()
            })
            .collect()
    }

    #[test]
    fn no_selection_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let result = generate(&GenerateRequest::default(), &catalog(), &config(dir.path()), now());
        assert!(matches!(result, Err(CatalogError::NoProductsSelected)));

        let response = serde_json::to_value(respond(result)).unwrap();
        assert_eq!(response["success"], false);
        assert_eq!(response["data"], "No products selected");
    }

    #[test]
    fn generates_requested_products() {
        let dir = tempfile::tempdir().unwrap();
        let request = GenerateRequest {
            product_ids: vec![3, 1],
            options: CatalogOptions::default(),
        };
        let generated = generate(&request, &catalog(), &config(dir.path()), now()).unwrap();

        assert_eq!(generated.products, 2);
        assert_eq!(generated.pages, 1);
        assert!(generated.path.starts_with(dir.path().join("wfx-catalogs")));
        assert!(std::fs::read(&generated.path).unwrap().starts_with(b"%PDF"));
        assert!(generated.url.starts_with("https://shop.test/uploads/wfx-catalogs/catalogo-mayorista-"));

        let response = serde_json::to_value(respond(Ok(generated))).unwrap();
        assert_eq!(response["success"], true);
        assert_eq!(response["data"]["products"], 2);
    }

    #[test]
    fn request_parses_from_admin_payload() {
        let request: GenerateRequest = serde_json::from_str(
            r#"{"product_ids": [5, 8], "options": {"include_images": false, "sort_by": "sku"}}"#,
        )
        .unwrap();
        assert_eq!(request.product_ids, vec![5, 8]);
        assert!(!request.options.include_images);
        assert!(request.options.include_stock);
    }
}
