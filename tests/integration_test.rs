use image::RgbImage;
use serde_json::{json, Value};
use std::fs;
use std::path::Path;
use std::process::{Command, Output};

fn cargo_bin() -> Command {
    Command::new(env!("CARGO_BIN_EXE_wholesale-catalog"))
}

/// Uploads dir with two product photos, a config pointing at it and a
/// product list of three items (the second one without a usable image).
fn setup(dir: &Path) {
    let uploads = dir.join("uploads");
    fs::create_dir_all(&uploads).expect("Failed to create uploads directory");
    RgbImage::new(300, 200).save(uploads.join("antena.png")).unwrap();
    RgbImage::new(120, 240).save(uploads.join("conector.jpg")).unwrap();

    let config = json!({
        "settings": {
            "company_name": "WFX Telematics",
            "catalog_title": "Catálogo Mayorista",
            "contact_email": "ventas@example.com",
            "contact_phone": "555-0100",
            "currency_symbol": "$"
        },
        "uploads": {
            "base_url": "https://shop.test/wp-content/uploads",
            "base_dir": uploads
        },
        "catalogs": {
            "dir": dir.join("catalogs"),
            "base_url": "https://shop.test/wp-content/uploads/wfx-catalogs"
        }
    });
    fs::write(dir.join("config.json"), config.to_string()).unwrap();

    let products = json!([
        {
            "id": 11,
            "name": "Antena sectorial 5 GHz",
            "sku": "AN-5G",
            "short_description": "<p>Antena de 120 grados para enlaces punto a multipunto.</p>",
            "image_url": "https://shop.test/wp-content/uploads/antena.png",
            "regular_price": "89.90",
            "wholesale_price": 74.5,
            "stock_quantity": 14,
            "minimum_order": 5,
            "category": "Radio"
        },
        {
            "id": 12,
            "name": "Bobina UTP cat6",
            "sku": "UTP-305",
            "image_url": "https://shop.test/wp-content/uploads/missing.png",
            "regular_price": "120",
            "category": "Cableado"
        },
        {
            "id": 13,
            "name": "Conector RJ45",
            "image_url": "https://shop.test/wp-content/uploads/conector.jpg",
            "regular_price": "0.35",
            "wholesale_price": "a consultar",
            "category": "Cableado"
        }
    ]);
    fs::write(dir.join("products.json"), products.to_string()).unwrap();
}

fn run(dir: &Path, extra: &[&str]) -> Output {
    cargo_bin()
        .arg("--products")
        .arg(dir.join("products.json"))
        .arg("--config")
        .arg(dir.join("config.json"))
        .args(extra)
        .output()
        .expect("Failed to execute command")
}

fn response(output: &Output) -> Value {
    serde_json::from_slice(&output.stdout).expect("stdout is not a JSON response")
}

#[test]
fn test_full_catalog() {
    let dir = tempfile::tempdir().unwrap();
    setup(dir.path());

    let output = run(dir.path(), &["--sort", "price"]);
    assert!(output.status.success(), "Command failed: {:?}", output);

    let response = response(&output);
    assert_eq!(response["success"], true);
    assert_eq!(response["data"]["products"], 3);
    assert_eq!(response["data"]["pages"], 1);

    let url = response["data"]["url"].as_str().unwrap();
    assert!(url.starts_with("https://shop.test/wp-content/uploads/wfx-catalogs/catalogo-mayorista-"));
    assert!(url.ends_with(".pdf"));

    let path = Path::new(response["data"]["path"].as_str().unwrap());
    assert!(path.starts_with(dir.path().join("catalogs")));
    let metadata = fs::metadata(path).expect("PDF file was not created");
    assert!(metadata.len() > 1000, "PDF file is too small, likely empty or corrupt");
}

#[test]
fn test_selected_ids_without_images() {
    let dir = tempfile::tempdir().unwrap();
    setup(dir.path());

    let output = run(dir.path(), &["--ids", "13,12,999", "--no-images", "--no-descriptions", "--no-stock"]);
    assert!(output.status.success(), "Command failed: {:?}", output);

    let response = response(&output);
    assert_eq!(response["data"]["products"], 2);
}

#[test]
fn test_output_dir_override() {
    let dir = tempfile::tempdir().unwrap();
    setup(dir.path());
    let out = dir.path().join("elsewhere");

    let output = run(dir.path(), &["--output-dir", out.to_str().unwrap(), "--log-json"]);
    assert!(output.status.success(), "Command failed: {:?}", output);

    let files: Vec<_> = fs::read_dir(&out).unwrap().collect();
    assert_eq!(files.len(), 1);
}

#[test]
fn test_empty_product_list() {
    let dir = tempfile::tempdir().unwrap();
    setup(dir.path());
    fs::write(dir.path().join("products.json"), "[]").unwrap();

    let output = run(dir.path(), &[]);
    assert!(!output.status.success(), "Command should fail without products");

    let response = response(&output);
    assert_eq!(response["success"], false);
    assert_eq!(response["data"], "No products selected");
}

#[test]
fn test_invalid_product_file() {
    let dir = tempfile::tempdir().unwrap();
    setup(dir.path());
    fs::write(dir.path().join("products.json"), "{not json").unwrap();

    let output = run(dir.path(), &[]);
    assert!(!output.status.success(), "Command should have failed for invalid JSON");
    let response = response(&output);
    assert!(response["data"].as_str().unwrap().starts_with("Failed to read product list"));
}

#[test]
fn test_missing_config_file() {
    let dir = tempfile::tempdir().unwrap();
    setup(dir.path());
    fs::remove_file(dir.path().join("config.json")).unwrap();

    let output = run(dir.path(), &[]);
    assert!(!output.status.success(), "Command should have failed for missing config");
}

#[test]
fn test_unwritable_output_dir() {
    let dir = tempfile::tempdir().unwrap();
    setup(dir.path());
    let blocker = dir.path().join("not-a-dir");
    fs::write(&blocker, b"x").unwrap();

    let output = run(dir.path(), &["--output-dir", blocker.join("catalogs").to_str().unwrap()]);
    assert!(!output.status.success(), "Command should have failed for unwritable directory");
    let response = response(&output);
    assert!(response["data"].as_str().unwrap().starts_with("Failed to write catalog"));
}
