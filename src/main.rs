// wholesale-catalog: Generate a wholesale PDF catalog from a product list

use chrono::Local;
use clap::Parser;
use std::path::{Path, PathBuf};
use wholesale_catalog::{
    generate, respond, telemetry, CatalogError, CatalogOptions, Config, GenerateRequest, GeneratedCatalog,
    ProductRecord, SortKey,
};

/// CLI Arguments
#[derive(Parser, Debug)]
#[command(author, version, about = "Generate a wholesale PDF catalog")]
struct Args {
    /// Product list exported by the store (JSON array of product records)
    #[arg(short, long)]
    products: PathBuf,

    /// Configuration file (JSON); defaults apply when omitted
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Product ids to include, comma separated (defaults to every product)
    #[arg(long, value_delimiter = ',')]
    ids: Vec<u64>,

    /// Sort order: name, price, sku or category
    #[arg(short, long, default_value = "name")]
    sort: String,

    /// Leave product images out
    #[arg(long)]
    no_images: bool,

    /// Leave descriptions out
    #[arg(long)]
    no_descriptions: bool,

    /// Leave SKUs out
    #[arg(long)]
    no_sku: bool,

    /// Leave stock levels out
    #[arg(long)]
    no_stock: bool,

    /// Directory for the generated PDF (overrides the configuration)
    #[arg(short, long)]
    output_dir: Option<PathBuf>,

    /// Emit logs as JSON
    #[arg(long)]
    log_json: bool,
}

// ============================================================================
// Main Entry Point
// ============================================================================

fn main() {
    let args = Args::parse();
    telemetry::init(args.log_json);

    let response = respond(run(args));
    match serde_json::to_string_pretty(&response) {
        Ok(json) => println!("{}", json),
        Err(e) => eprintln!("Error: {}", e),
    }
    if !response.success {
        std::process::exit(1);
    }
}

fn run(args: Args) -> Result<GeneratedCatalog, CatalogError> {
    let mut config = match &args.config {
        Some(path) => Config::load(path)?,
        None => Config::default(),
    };
    if let Some(dir) = args.output_dir {
        config.catalogs.dir = dir;
    }

    let catalog = load_products(&args.products)?;

    let product_ids = if args.ids.is_empty() {
        catalog.iter().map(|p| p.id).collect()
    } else {
        args.ids
    };

    let request = GenerateRequest {
        product_ids,
        options: CatalogOptions {
            include_images: !args.no_images,
            include_descriptions: !args.no_descriptions,
            include_sku: !args.no_sku,
            include_stock: !args.no_stock,
            sort_by: SortKey::parse(&args.sort),
        },
    };

    generate(&request, &catalog, &config, Local::now().naive_local())
}

// ============================================================================
// Helper Functions
// ============================================================================

fn load_products(path: &Path) -> Result<Vec<ProductRecord>, CatalogError> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| CatalogError::Input(format!("{}: {}", path.display(), e)))?;
    serde_json::from_str(&content).map_err(|e| CatalogError::Input(format!("Invalid JSON: {}", e)))
}
