// PDF Writer: draws a laid-out Document with printpdf.

use ::image::{DynamicImage, Rgba, RgbImage};
use printpdf::path::PaintMode;
use printpdf::*;
use std::io::{BufWriter, Cursor};
use tracing::debug;

use crate::error::{CatalogError, Result};
use crate::layout::{self, Document, Element, FontStyle, PAGE_HEIGHT_MM, PAGE_WIDTH_MM};

const CREATOR: &str = "wholesale-catalog";
const SUBJECT: &str = "Catálogo de Productos Mayoristas";

struct Fonts {
    regular: IndirectFontRef,
    bold: IndirectFontRef,
    italic: IndirectFontRef,
}

impl Fonts {
    fn get(&self, style: FontStyle) -> &IndirectFontRef {
        match style {
            FontStyle::Regular => &self.regular,
            FontStyle::Bold => &self.bold,
            FontStyle::Italic => &self.italic,
        }
    }
}

/// Serializes `document` to PDF bytes.
pub fn write_pdf(document: &Document) -> Result<Vec<u8>> {
    let (doc, page1, layer1) = PdfDocument::new(
        document.title.as_str(),
        Mm(PAGE_WIDTH_MM),
        Mm(PAGE_HEIGHT_MM),
        "Layer 1",
    );
    let doc = doc
        .with_author(document.author.as_str())
        .with_creator(CREATOR)
        .with_subject(SUBJECT);

    // Built-in fonts are the only backend dependency
    let load = |font: BuiltinFont| {
        doc.add_builtin_font(font)
            .map_err(|e| CatalogError::MissingDependency(e.to_string()))
    };
    let fonts = Fonts {
        regular: load(BuiltinFont::Helvetica)?,
        bold: load(BuiltinFont::HelveticaBold)?,
        italic: load(BuiltinFont::HelveticaOblique)?,
    };

    for (index, page) in document.pages.iter().enumerate() {
        let layer = if index == 0 {
            doc.get_page(page1).get_layer(layer1)
        } else {
            let (new_page, new_layer) = doc.add_page(Mm(PAGE_WIDTH_MM), Mm(PAGE_HEIGHT_MM), "Layer 1");
            doc.get_page(new_page).get_layer(new_layer)
        };
        for element in &page.elements {
            draw_element(&layer, &fonts, element);
        }
        debug!(page = index + 1, elements = page.elements.len(), "page drawn");
    }

    let mut bytes = Vec::new();
    {
        let mut writer = BufWriter::new(Cursor::new(&mut bytes));
        doc.save(&mut writer)
            .map_err(|e| CatalogError::Generation(e.to_string()))?;
    }
    Ok(bytes)
}

fn draw_element(layer: &PdfLayerReference, fonts: &Fonts, element: &Element) {
    match element {
        Element::Text {
            text,
            x,
            y,
            size,
            style,
            color,
        } => {
            layer.set_fill_color(to_color(*color));
            layer.use_text(text.as_str(), *size, Mm(*x), Mm(*y), fonts.get(*style));
            layer.set_fill_color(to_color(layout::Rgb::BLACK));
        }
        Element::Line {
            from,
            to,
            thickness,
            color,
        } => {
            layer.set_outline_color(to_color(*color));
            layer.set_outline_thickness(*thickness);
            draw_line(layer, from.0, from.1, to.0, to.1);
        }
        Element::Rect {
            x,
            y,
            width,
            height,
            fill,
            stroke,
        } => {
            let mode = match (fill, stroke) {
                (Some(_), Some(_)) => PaintMode::FillStroke,
                (Some(_), None) => PaintMode::Fill,
                (None, Some(_)) => PaintMode::Stroke,
                (None, None) => return,
            };
            if let Some(fill) = fill {
                layer.set_fill_color(to_color(*fill));
            }
            if let Some(stroke) = stroke {
                layer.set_outline_color(to_color(*stroke));
                layer.set_outline_thickness(0.4);
            }
            let rect = Rect::new(Mm(*x), Mm(*y), Mm(x + width), Mm(y + height)).with_mode(mode);
            layer.add_rect(rect);
            layer.set_fill_color(to_color(layout::Rgb::BLACK));
        }
        Element::Image {
            image,
            x,
            y,
            width,
            ..
        } => embed_image(layer, &image.image, *x, *y, *width),
    }
}

fn to_color(rgb: layout::Rgb) -> Color {
    Color::Rgb(Rgb::new(rgb.0, rgb.1, rgb.2, None))
}

/// Embeds `image` with its lower-left corner at (`x`, `y`), scaled to
/// `width_mm`; height follows the aspect ratio.
fn embed_image(layer: &PdfLayerReference, source: &DynamicImage, x: f32, y: f32, width_mm: f32) {
    // Convert to RGBA first to handle transparency
    let rgba_image = source.to_rgba8();
    let (width_px, height_px) = rgba_image.dimensions();

    // Composite against white background
    let mut rgb_image = RgbImage::new(width_px, height_px);
    for (px, py, pixel) in rgba_image.enumerate_pixels() {
        let Rgba([r, g, b, a]) = *pixel;
        let alpha = a as f32 / 255.0;
        let blend = |c: u8| (c as f32 * alpha + 255.0 * (1.0 - alpha)) as u8;
        rgb_image.put_pixel(px, py, ::image::Rgb([blend(r), blend(g), blend(b)]));
    }

    let image = Image::from(ImageXObject {
        width: Px(width_px as usize),
        height: Px(height_px as usize),
        color_space: ColorSpace::Rgb,
        bits_per_component: ColorBits::Bit8,
        interpolate: true,
        image_data: rgb_image.into_raw(),
        image_filter: None,
        clipping_bbox: None,
        smask: None,
    });

    // DPI = pixels / (mm / 25.4)
    let dpi = (width_px as f32) / (width_mm / 25.4);

    image.add_to_layer(
        layer.clone(),
        ImageTransform {
            translate_x: Some(Mm(x)),
            translate_y: Some(Mm(y)),
            dpi: Some(dpi),
            ..Default::default()
        },
    );
}

fn draw_line(layer: &PdfLayerReference, x1: f32, y1: f32, x2: f32, y2: f32) {
    let points = vec![
        (Point::new(Mm(x1), Mm(y1)), false),
        (Point::new(Mm(x2), Mm(y2)), false),
    ];
    let line = Line {
        points,
        is_closed: false,
    };
    layer.add_line(line);
}
