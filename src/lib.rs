//! wholesale-catalog: render wholesale product catalogs as paginated PDFs.
//!
//! The host catalog supplies [`ProductRecord`]s and a [`Config`]; [`generate`]
//! selects and sorts the requested products, lays them out as cards with
//! [`layout::render`], writes the PDF and returns its path and public URL.

pub mod catalog;
pub mod config;
pub mod error;
pub mod generate;
pub mod images;
pub mod layout;
pub mod model;
pub mod output;
pub mod pdf;
pub mod pricing;
pub mod telemetry;
pub mod text;

pub use config::Config;
pub use error::{CatalogError, Result};
pub use generate::{generate, respond, GenerateRequest, GeneratedCatalog, Response};
pub use layout::{render, Document};
pub use model::{CatalogOptions, CompanySettings, ProductRecord, SortKey};
