// Records exchanged with the host catalog.

use serde::{Deserialize, Deserializer, Serialize};

/// Product as assembled by the host catalog. The layout engine only reads it.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ProductRecord {
    pub id: u64,
    pub name: String,
    pub sku: String,
    pub short_description: String,
    /// Long description, used when the short one is empty
    pub description: String,
    pub image_url: Option<String>,
    /// Prices are kept as supplied; see `pricing::parse_price`.
    #[serde(deserialize_with = "lenient_text")]
    pub regular_price: Option<String>,
    #[serde(deserialize_with = "lenient_text")]
    pub wholesale_price: Option<String>,
    pub stock_quantity: Option<i64>,
    pub minimum_order: Option<u32>,
    pub category: String,
}

/// Per-run rendering switches.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CatalogOptions {
    pub include_images: bool,
    pub include_descriptions: bool,
    pub include_sku: bool,
    pub include_stock: bool,
    pub sort_by: SortKey,
}

impl Default for CatalogOptions {
    fn default() -> Self {
        Self {
            include_images: true,
            include_descriptions: true,
            include_sku: true,
            include_stock: true,
            sort_by: SortKey::Name,
        }
    }
}

/// Store-wide catalog settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CompanySettings {
    pub company_name: String,
    pub company_logo_url: Option<String>,
    pub catalog_title: String,
    pub contact_email: String,
    pub contact_phone: String,
    pub show_sku: bool,
    pub show_stock: bool,
    pub currency_symbol: String,
    /// Applied to products without their own minimum order
    pub default_minimum_order: u32,
    pub thousands_separator: String,
    pub decimal_separator: String,
}

impl Default for CompanySettings {
    fn default() -> Self {
        Self {
            company_name: String::new(),
            company_logo_url: None,
            catalog_title: "Catálogo Mayorista".to_string(),
            contact_email: String::new(),
            contact_phone: String::new(),
            show_sku: true,
            show_stock: true,
            currency_symbol: "$".to_string(),
            default_minimum_order: 1,
            thousands_separator: ",".to_string(),
            decimal_separator: ".".to_string(),
        }
    }
}

/// Catalog ordering. Unknown names fall back to `Name`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SortKey {
    #[default]
    Name,
    Price,
    Sku,
    Category,
}

impl SortKey {
    pub fn parse(key: &str) -> Self {
        match key.trim().to_ascii_lowercase().as_str() {
            "price" => SortKey::Price,
            "sku" => SortKey::Sku,
            "category" => SortKey::Category,
            _ => SortKey::Name,
        }
    }
}

impl<'de> Deserialize<'de> for SortKey {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let key = String::deserialize(deserializer)?;
        Ok(SortKey::parse(&key))
    }
}

/// Accepts strings, numbers, booleans or null; anything else becomes `None`.
fn lenient_text<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<String>, D::Error> {
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(match value {
        serde_json::Value::String(s) => Some(s),
        serde_json::Value::Number(n) => Some(n.to_string()),
        serde_json::Value::Bool(b) => Some(b.to_string()),
        _ => None,
    })
}
