// Image Resolver: public upload URLs to decoded local raster images.

use ::image::imageops::FilterType;
use ::image::{DynamicImage, ImageFormat, ImageReader};
use percent_encoding::percent_decode_str;
use std::fs::File;
use std::io::Read;
use std::path::{Component, Path, PathBuf};
use tracing::{debug, warn};

use crate::config::{ImageConfig, UploadsConfig};
use crate::error::{CatalogError, Result};

/// A product or logo image that exists on disk in an accepted format and
/// decodes cleanly. `image` is ready to embed (already downscaled when
/// configured); the pixel size is that of `image`.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedImage {
    pub path: PathBuf,
    pub format: ImageFormat,
    pub width_px: u32,
    pub height_px: u32,
    pub image: DynamicImage,
}

#[derive(Debug, Clone)]
pub struct ImageResolver {
    base_url: String,
    base_dir: PathBuf,
    images: ImageConfig,
}

impl ImageResolver {
    pub fn new(uploads: &UploadsConfig, images: &ImageConfig) -> Self {
        Self {
            base_url: uploads.base_url.trim_end_matches('/').to_string(),
            base_dir: uploads.base_dir.clone(),
            images: images.clone(),
        }
    }

    /// Any failure is logged and yields `None`; callers draw a placeholder.
    pub fn resolve(&self, url: &str) -> Option<ResolvedImage> {
        match self.try_resolve(url) {
            Ok(image) => {
                debug!(path = %image.path.display(), "resolved image");
                Some(image)
            }
            Err(e) => {
                warn!(error = %e, "using placeholder");
                None
            }
        }
    }

    pub fn try_resolve(&self, url: &str) -> Result<ResolvedImage> {
        let path = self.local_path(url)?;
        if !path.is_file() {
            return Err(CatalogError::image(url, "file not found"));
        }

        // Sniff the content; the extension is not trusted
        let mut header = [0u8; 32];
        let read = File::open(&path)
            .and_then(|mut f| f.read(&mut header))
            .map_err(|e| CatalogError::image(url, e.to_string()))?;
        let format = ::image::guess_format(&header[..read])
            .map_err(|_| CatalogError::image(url, "not a recognised image"))?;
        if !matches!(format, ImageFormat::Jpeg | ImageFormat::Png | ImageFormat::Gif) {
            return Err(CatalogError::image(url, format!("unsupported format {:?}", format)));
        }

        // A valid header is not enough: corrupt pixel data must fail here
        let mut reader = ImageReader::open(&path).map_err(|e| CatalogError::image(url, e.to_string()))?;
        reader.set_format(format);
        let decoded = reader
            .decode()
            .map_err(|e| CatalogError::image(url, e.to_string()))?;
        if decoded.width() == 0 || decoded.height() == 0 {
            return Err(CatalogError::image(url, "empty image"));
        }
        let image = if self.images.optimize {
            downscale(decoded, self.images.max_px)
        } else {
            decoded
        };

        Ok(ResolvedImage {
            path,
            format,
            width_px: image.width(),
            height_px: image.height(),
            image,
        })
    }

    fn local_path(&self, url: &str) -> Result<PathBuf> {
        let url = url.trim();
        if url.is_empty() {
            return Err(CatalogError::image(url, "no image set"));
        }
        if let Some(rest) = url.strip_prefix("file://") {
            return Ok(PathBuf::from(percent_decode_str(rest).decode_utf8_lossy().into_owned()));
        }
        if Path::new(url).is_absolute() {
            return Ok(PathBuf::from(url));
        }

        let rest = url
            .strip_prefix(&self.base_url)
            .filter(|rest| rest.starts_with('/'))
            .ok_or_else(|| CatalogError::image(url, "outside the uploads location"))?;
        let rest = rest.split(['?', '#']).next().unwrap_or_default();
        let decoded = percent_decode_str(rest.trim_start_matches('/')).decode_utf8_lossy();
        let relative = PathBuf::from(decoded.as_ref());

        if relative
            .components()
            .any(|c| !matches!(c, Component::Normal(_) | Component::CurDir))
        {
            return Err(CatalogError::image(url, "escapes the uploads directory"));
        }
        Ok(self.base_dir.join(relative))
    }
}

/// Largest size with the image's aspect ratio that fits the box, in the box's
/// units.
pub fn fit_within(width_px: u32, height_px: u32, max_width: f32, max_height: f32) -> (f32, f32) {
    let aspect_ratio = width_px as f32 / height_px as f32;
    if max_width / max_height > aspect_ratio {
        // Height-constrained
        (max_height * aspect_ratio, max_height)
    } else {
        // Width-constrained
        (max_width, max_width / aspect_ratio)
    }
}

/// Pixel size after shrinking so the longer side is at most `max_px`.
pub fn target_size(width_px: u32, height_px: u32, max_px: u32) -> (u32, u32) {
    if width_px <= max_px && height_px <= max_px {
        return (width_px, height_px);
    }
    if width_px > height_px {
        let h = (height_px as f64 / width_px as f64 * max_px as f64) as u32;
        (max_px, h.max(1))
    } else {
        let w = (width_px as f64 / height_px as f64 * max_px as f64) as u32;
        (w.max(1), max_px)
    }
}

pub fn downscale(image: DynamicImage, max_px: u32) -> DynamicImage {
    let (width, height) = (image.width(), image.height());
    let (new_width, new_height) = target_size(width, height, max_px);
    if (new_width, new_height) == (width, height) {
        return image;
    }
    debug!(width, height, new_width, new_height, "downscaling image");
    image.resize_exact(new_width, new_height, FilterType::Triangle)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ::image::RgbImage;

    fn resolver(dir: &Path) -> ImageResolver {
        let uploads = UploadsConfig {
            base_url: "https://shop.test/uploads/".to_string(),
            base_dir: dir.to_path_buf(),
        };
        ImageResolver::new(&uploads, &ImageConfig::default())
    }

    /// A PNG whose header is intact but whose pixel data is garbage.
    fn write_corrupt_png(path: &Path) {
        RgbImage::new(40, 40).save(path).unwrap();
        let mut bytes = std::fs::read(path).unwrap();
        let end = bytes.len() - 12;
        for byte in &mut bytes[41..end] {
            *byte = 0xAB;
        }
        std::fs::write(path, bytes).unwrap();
    }

    #[test]
    fn maps_upload_urls_to_files() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir(dir.path().join("2024")).unwrap();
        RgbImage::new(40, 20).save(dir.path().join("2024/router 1.png")).unwrap();

        let image = resolver(dir.path())
            .resolve("https://shop.test/uploads/2024/router%201.png?ver=3")
            .unwrap();
        assert_eq!(image.path, dir.path().join("2024/router 1.png"));
        assert_eq!(image.format, ImageFormat::Png);
        assert_eq!((image.width_px, image.height_px), (40, 20));
    }

    #[test]
    fn accepts_local_paths() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("logo.jpg");
        RgbImage::new(8, 8).save(&path).unwrap();

        let resolver = resolver(dir.path());
        assert!(resolver.resolve(path.to_str().unwrap()).is_some());
        assert!(resolver.resolve(&format!("file://{}", path.display())).is_some());
    }

    #[test]
    fn rejects_unusable_images() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("fake.png"), b"definitely not a png").unwrap();
        RgbImage::new(4, 4).save(dir.path().join("photo.bmp")).unwrap();
        let resolver = resolver(dir.path());

        for url in [
            "",
            "https://shop.test/uploads/missing.png",
            "https://shop.test/uploads/fake.png",
            "https://shop.test/uploads/photo.bmp",
            "https://shop.test/uploads/../photo.bmp",
            "https://cdn.other.test/photo.png",
            "https://shop.test/uploadsfoo/photo.png",
        ] {
            assert!(resolver.resolve(url).is_none(), "{url} should not resolve");
        }
        assert!(matches!(
            resolver.try_resolve("https://shop.test/uploads/fake.png"),
            Err(CatalogError::ImageUnavailable { .. })
        ));
    }

    #[test]
    fn corrupt_pixel_data_does_not_resolve() {
        let dir = tempfile::tempdir().unwrap();
        write_corrupt_png(&dir.path().join("broken.png"));
        let resolver = resolver(dir.path());

        assert!(matches!(
            resolver.try_resolve("https://shop.test/uploads/broken.png"),
            Err(CatalogError::ImageUnavailable { .. })
        ));
        assert!(resolver.resolve("https://shop.test/uploads/broken.png").is_none());
    }

    #[test]
    fn resolved_images_are_decoded_and_downscaled() {
        let dir = tempfile::tempdir().unwrap();
        RgbImage::new(1600, 400).save(dir.path().join("wide.png")).unwrap();

        let image = resolver(dir.path())
            .resolve("https://shop.test/uploads/wide.png")
            .unwrap();
        assert_eq!((image.width_px, image.height_px), (800, 200));
        assert_eq!((image.image.width(), image.image.height()), (800, 200));

        let untouched = ImageResolver::new(
            &UploadsConfig {
                base_url: "https://shop.test/uploads".to_string(),
                base_dir: dir.path().to_path_buf(),
            },
            &ImageConfig {
                optimize: false,
                max_px: 800,
            },
        )
        .resolve("https://shop.test/uploads/wide.png")
        .unwrap();
        assert_eq!((untouched.width_px, untouched.height_px), (1600, 400));
    }

    #[test]
    fn fits_box_preserving_aspect() {
        assert_eq!(fit_within(200, 100, 30.0, 30.0), (30.0, 15.0));
        assert_eq!(fit_within(100, 200, 30.0, 30.0), (15.0, 30.0));
        assert_eq!(fit_within(50, 50, 40.0, 20.0), (20.0, 20.0));
    }

    #[test]
    fn downscales_only_oversized_images() {
        assert_eq!(target_size(640, 480, 800), (640, 480));
        assert_eq!(target_size(1600, 1200, 800), (800, 600));
        assert_eq!(target_size(900, 1800, 800), (400, 800));

        let image = downscale(DynamicImage::ImageRgb8(RgbImage::new(1000, 10)), 800);
        assert_eq!((image.width(), image.height()), (800, 8));
    }
}
