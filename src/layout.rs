// Layout Engine: places product cards on A4 pages.
//
// Coordinates are millimetres from the bottom-left corner of the page, the
// same convention printpdf uses, so the writer can draw elements verbatim.

use chrono::NaiveDateTime;
use tracing::{debug, info};

use crate::catalog;
use crate::images::{fit_within, ImageResolver, ResolvedImage};
use crate::model::{CatalogOptions, CompanySettings, ProductRecord};
use crate::pricing::{self, PriceBlock};
use crate::text::{self, text_width_mm};

// ============================================================================
// Constants
// ============================================================================

/// A4 dimensions in mm
pub const PAGE_WIDTH_MM: f32 = 210.0;
pub const PAGE_HEIGHT_MM: f32 = 297.0;

/// Margins
const MARGIN_MM: f32 = 15.0;

/// Reserved at the bottom of every page for the footer
const FOOTER_BAND_MM: f32 = 25.0;

/// Cards
const MIN_ROW_HEIGHT_MM: f32 = 30.0;
const CARD_PADDING_MM: f32 = 3.0;
const CARD_GAP_MM: f32 = 4.0;
const IMAGE_BOX_MM: f32 = 30.0;
const IMAGE_TEXT_GAP_MM: f32 = 5.0;

const LOGO_MAX_WIDTH_MM: f32 = 40.0;
const LOGO_MAX_HEIGHT_MM: f32 = 20.0;

/// Description length before truncation, in characters
const DESCRIPTION_BUDGET: usize = 200;
const NAME_MAX_LINES: usize = 3;

/// Font sizes in points
const TITLE_FONT_SIZE: f32 = 20.0;
const SECTION_FONT_SIZE: f32 = 14.0;
const NAME_FONT_SIZE: f32 = 12.0;
const COMPANY_FONT_SIZE: f32 = 12.0;
const PRICE_FONT_SIZE: f32 = 11.0;
const REGULAR_PRICE_FONT_SIZE: f32 = 10.0;
const SMALL_FONT_SIZE: f32 = 9.0;
const FOOTER_FONT_SIZE: f32 = 8.0;

/// Line heights in mm
const NAME_LINE_MM: f32 = 6.0;
const SMALL_LINE_MM: f32 = 4.0;
const DETAIL_LINE_MM: f32 = 5.0;
const PRICE_LINE_MM: f32 = 6.0;

pub const PLACEHOLDER_TEXT: &str = "Sin imagen";
pub const NO_PRODUCTS_TEXT: &str = "No hay productos para mostrar";

// ============================================================================
// Document Model
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FontStyle {
    Regular,
    Bold,
    Italic,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rgb(pub f32, pub f32, pub f32);

impl Rgb {
    pub const BLACK: Rgb = Rgb(0.0, 0.0, 0.0);
    pub const GRAY: Rgb = Rgb(0.45, 0.45, 0.45);
    pub const BORDER: Rgb = Rgb(0.75, 0.75, 0.75);
    pub const BADGE: Rgb = Rgb(0.92, 0.92, 0.92);
    pub const GREEN: Rgb = Rgb(0.0, 0.5, 0.0);
    pub const PRICE_BADGE: Rgb = Rgb(0.88, 0.96, 0.88);
}

/// A positioned drawing instruction. `x`/`y` of boxes are the lower-left
/// corner; `y` of text is the baseline.
#[derive(Debug, Clone, PartialEq)]
pub enum Element {
    Text {
        text: String,
        x: f32,
        y: f32,
        size: f32,
        style: FontStyle,
        color: Rgb,
    },
    Line {
        from: (f32, f32),
        to: (f32, f32),
        thickness: f32,
        color: Rgb,
    },
    Rect {
        x: f32,
        y: f32,
        width: f32,
        height: f32,
        fill: Option<Rgb>,
        stroke: Option<Rgb>,
    },
    Image {
        image: ResolvedImage,
        x: f32,
        y: f32,
        width: f32,
        height: f32,
    },
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Page {
    pub elements: Vec<Element>,
}

/// Where one product's card ended up.
#[derive(Debug, Clone, PartialEq)]
pub struct CardRecord {
    pub product_id: u64,
    pub page_index: usize,
    pub top: f32,
    pub height: f32,
    /// The image box shows the "Sin imagen" placeholder
    pub placeholder: bool,
    pub price: Option<PriceBlock>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    pub title: String,
    pub author: String,
    pub pages: Vec<Page>,
    pub cards: Vec<CardRecord>,
}

impl Document {
    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    /// Text runs drawn on a page, in drawing order.
    pub fn texts_on(&self, page_index: usize) -> Vec<&str> {
        self.pages
            .get(page_index)
            .map(|page| {
                page.elements
                    .iter()
                    .filter_map(|e| match e {
                        Element::Text { text, .. } => Some(text.as_str()),
                        _ => None,
                    })
                    .collect()
            })
            .unwrap_or_default()
    }
}

// ============================================================================
// Layout
// ============================================================================

/// Lays out the whole catalog. Products are sorted by `options.sort_by`
/// first; `generated_at` is printed in the header.
pub fn render(
    products: &[ProductRecord],
    options: &CatalogOptions,
    settings: &CompanySettings,
    resolver: &ImageResolver,
    generated_at: NaiveDateTime,
) -> Document {
    info!(products = products.len(), sort = ?options.sort_by, "laying out catalog");

    let mut layout = Layout {
        options,
        settings,
        resolver,
        pages: vec![Page::default()],
        cards: Vec::with_capacity(products.len()),
        cursor: LayoutCursor::top_of_page(0),
    };

    layout.draw_header(generated_at);

    if products.is_empty() {
        layout.draw_empty_message();
    } else {
        layout.draw_section_heading();
        for product in catalog::sort(products.to_vec(), options.sort_by) {
            layout.draw_card(&product);
        }
    }

    layout.draw_footers();

    info!(pages = layout.pages.len(), cards = layout.cards.len(), "catalog laid out");
    Document {
        title: settings.catalog_title.clone(),
        author: settings.company_name.clone(),
        pages: layout.pages,
        cards: layout.cards,
    }
}

/// Position of the next element; reset on every new page.
#[derive(Debug, Clone, Copy)]
struct LayoutCursor {
    page_index: usize,
    y_position: f32,
}

impl LayoutCursor {
    fn top_of_page(page_index: usize) -> Self {
        Self {
            page_index,
            y_position: PAGE_HEIGHT_MM - MARGIN_MM,
        }
    }

    fn remaining(&self) -> f32 {
        self.y_position - FOOTER_BAND_MM
    }

    fn advance(&mut self, height: f32) {
        self.y_position -= height;
    }
}

enum CardImage {
    Hidden,
    Picture(ResolvedImage),
    Placeholder,
}

/// Everything a card shows, measured before anything is drawn.
struct CardPlan {
    image: CardImage,
    name_lines: Vec<String>,
    sku: Option<String>,
    description: Vec<String>,
    minimum_order: Option<u32>,
    stock: Option<String>,
    price: Option<PriceBlock>,
    text_x: f32,
    height: f32,
}

struct Layout<'a> {
    options: &'a CatalogOptions,
    settings: &'a CompanySettings,
    resolver: &'a ImageResolver,
    pages: Vec<Page>,
    cards: Vec<CardRecord>,
    cursor: LayoutCursor,
}

impl Layout<'_> {
    fn content_width() -> f32 {
        PAGE_WIDTH_MM - 2.0 * MARGIN_MM
    }

    fn push(&mut self, element: Element) {
        self.pages[self.cursor.page_index].elements.push(element);
    }

    fn text(&mut self, text: impl Into<String>, x: f32, y: f32, size: f32, style: FontStyle, color: Rgb) {
        self.push(Element::Text {
            text: text.into(),
            x,
            y,
            size,
            style,
            color,
        });
    }

    fn centered_text(&mut self, text: &str, y: f32, size: f32, style: FontStyle) {
        let width = text_width_mm(text, size, style == FontStyle::Bold);
        let x = ((PAGE_WIDTH_MM - width) / 2.0).max(MARGIN_MM);
        self.text(text, x, y, size, style, Rgb::BLACK);
    }

    fn new_page(&mut self) {
        self.pages.push(Page::default());
        self.cursor = LayoutCursor::top_of_page(self.pages.len() - 1);
        debug!(page = self.pages.len(), "page break");
    }

    // ------------------------------------------------------------------------
    // Header
    // ------------------------------------------------------------------------

    fn draw_header(&mut self, generated_at: NaiveDateTime) {
        let logo = self
            .settings
            .company_logo_url
            .as_deref()
            .filter(|url| !url.trim().is_empty())
            .and_then(|url| self.resolver.resolve(url));

        if let Some(logo) = logo {
            let (width, height) = fit_within(logo.width_px, logo.height_px, LOGO_MAX_WIDTH_MM, LOGO_MAX_HEIGHT_MM);
            let y = self.cursor.y_position - height;
            self.push(Element::Image {
                image: logo,
                x: MARGIN_MM,
                y,
                width,
                height,
            });
            self.cursor.advance(height + 5.0);
        }

        let title = self.settings.catalog_title.clone();
        let y = self.cursor.y_position - 8.0;
        self.centered_text(&title, y, TITLE_FONT_SIZE, FontStyle::Bold);
        self.cursor.advance(10.0);

        if !self.settings.company_name.is_empty() {
            let company = self.settings.company_name.clone();
            let y = self.cursor.y_position - 4.5;
            self.centered_text(&company, y, COMPANY_FONT_SIZE, FontStyle::Regular);
            self.cursor.advance(6.0);
        }
        self.cursor.advance(3.0);

        let stamp = format!("Generado: {}", generated_at.format("%d/%m/%Y %H:%M"));
        let width = text_width_mm(&stamp, SMALL_FONT_SIZE, false);
        let y = self.cursor.y_position - 4.0;
        self.text(stamp, PAGE_WIDTH_MM - MARGIN_MM - width, y, SMALL_FONT_SIZE, FontStyle::Italic, Rgb::GRAY);
        self.cursor.advance(13.0);
    }

    fn draw_section_heading(&mut self) {
        let y = self.cursor.y_position - 6.0;
        self.text("Listado de Productos", MARGIN_MM, y, SECTION_FONT_SIZE, FontStyle::Bold, Rgb::BLACK);
        self.cursor.advance(11.0);
    }

    fn draw_empty_message(&mut self) {
        let y = self.cursor.y_position - 10.0;
        self.centered_text(NO_PRODUCTS_TEXT, y, NAME_FONT_SIZE, FontStyle::Italic);
        self.cursor.advance(15.0);
    }

    // ------------------------------------------------------------------------
    // Cards
    // ------------------------------------------------------------------------

    fn plan_card(&self, product: &ProductRecord) -> CardPlan {
        let image = if !self.options.include_images {
            CardImage::Hidden
        } else {
            match product
                .image_url
                .as_deref()
                .and_then(|url| self.resolver.resolve(url))
            {
                Some(resolved) => CardImage::Picture(resolved),
                None => CardImage::Placeholder,
            }
        };

        let card_left = MARGIN_MM + CARD_PADDING_MM;
        let text_x = match image {
            CardImage::Hidden => card_left,
            _ => card_left + IMAGE_BOX_MM + IMAGE_TEXT_GAP_MM,
        };
        let text_width = MARGIN_MM + Self::content_width() - CARD_PADDING_MM - text_x;

        let name = if product.name.trim().is_empty() {
            format!("Producto #{}", product.id)
        } else {
            product.name.trim().to_string()
        };
        let name_lines = text::clamp_lines(text::wrap(&name, text_width, NAME_FONT_SIZE, true), NAME_MAX_LINES);

        let sku = (self.options.include_sku && self.settings.show_sku)
            .then(|| product.sku.trim())
            .filter(|sku| !sku.is_empty())
            .map(|sku| format!("SKU: {}", sku));

        let description = if self.options.include_descriptions {
            let mut plain = text::strip_tags(&product.short_description);
            if plain.is_empty() {
                plain = text::strip_tags(&product.description);
            }
            let short = text::truncate(&plain, DESCRIPTION_BUDGET);
            text::wrap(&short, text_width, SMALL_FONT_SIZE, false)
        } else {
            Vec::new()
        };

        let minimum_order = product
            .minimum_order
            .filter(|m| *m > 0)
            .unwrap_or(self.settings.default_minimum_order);
        let minimum_order = (minimum_order > 1).then_some(minimum_order);

        let stock = if self.options.include_stock && self.settings.show_stock {
            product.stock_quantity.map(|qty| {
                if qty > 0 {
                    format!("En stock: {} unidades", qty)
                } else {
                    "Sin stock".to_string()
                }
            })
        } else {
            None
        };

        let price = pricing::price_block(product);

        let mut text_height = 2.0 * CARD_PADDING_MM + name_lines.len() as f32 * NAME_LINE_MM;
        if sku.is_some() {
            text_height += DETAIL_LINE_MM + 1.0;
        }
        if !description.is_empty() {
            text_height += description.len() as f32 * SMALL_LINE_MM + 2.0;
        }
        if minimum_order.is_some() {
            text_height += DETAIL_LINE_MM;
        }
        if stock.is_some() {
            text_height += DETAIL_LINE_MM;
        }
        text_height += match price {
            Some(PriceBlock::Wholesale { struck_regular: Some(_), .. }) => PRICE_LINE_MM + DETAIL_LINE_MM + 1.0,
            Some(_) => PRICE_LINE_MM + 1.0,
            None => 0.0,
        };
        let image_height = match image {
            CardImage::Hidden => 0.0,
            _ => IMAGE_BOX_MM + 2.0 * CARD_PADDING_MM,
        };

        CardPlan {
            image,
            name_lines,
            sku,
            description,
            minimum_order,
            stock,
            price,
            text_x,
            height: text_height.max(image_height).max(MIN_ROW_HEIGHT_MM),
        }
    }

    fn draw_card(&mut self, product: &ProductRecord) {
        let plan = self.plan_card(product);

        // Cards never straddle a page break
        if self.cursor.remaining() < plan.height {
            self.new_page();
        }

        let top = self.cursor.y_position;
        let left = MARGIN_MM;
        let width = Self::content_width();

        self.push(Element::Rect {
            x: left,
            y: top - plan.height,
            width,
            height: plan.height,
            fill: None,
            stroke: Some(Rgb::BORDER),
        });

        let placeholder = self.draw_image_box(&plan.image, top);
        let x = plan.text_x;
        let mut y = top - CARD_PADDING_MM;

        for line in &plan.name_lines {
            self.text(line.as_str(), x, y - 4.5, NAME_FONT_SIZE, FontStyle::Bold, Rgb::BLACK);
            y -= NAME_LINE_MM;
        }

        if let Some(sku) = &plan.sku {
            let badge_width = text_width_mm(sku, SMALL_FONT_SIZE, false) + 4.0;
            self.push(Element::Rect {
                x,
                y: y - DETAIL_LINE_MM,
                width: badge_width,
                height: DETAIL_LINE_MM,
                fill: Some(Rgb::BADGE),
                stroke: None,
            });
            self.text(sku.as_str(), x + 2.0, y - 3.6, SMALL_FONT_SIZE, FontStyle::Regular, Rgb::BLACK);
            y -= DETAIL_LINE_MM + 1.0;
        }

        if !plan.description.is_empty() {
            for line in &plan.description {
                self.text(line.as_str(), x, y - 3.0, SMALL_FONT_SIZE, FontStyle::Regular, Rgb::GRAY);
                y -= SMALL_LINE_MM;
            }
            y -= 2.0;
        }

        if let Some(minimum) = plan.minimum_order {
            let line = format!("Pedido mínimo: {} unidades", minimum);
            self.text(line, x, y - 3.6, SMALL_FONT_SIZE, FontStyle::Regular, Rgb::BLACK);
            y -= DETAIL_LINE_MM;
        }

        if let Some(stock) = &plan.stock {
            self.text(stock.as_str(), x, y - 3.6, SMALL_FONT_SIZE, FontStyle::Regular, Rgb::BLACK);
            y -= DETAIL_LINE_MM;
        }

        if let Some(price) = &plan.price {
            self.draw_price(price, x, y - 1.0);
        }

        self.cards.push(CardRecord {
            product_id: product.id,
            page_index: self.cursor.page_index,
            top,
            height: plan.height,
            placeholder,
            price: plan.price,
        });

        self.cursor.advance(plan.height + CARD_GAP_MM);
    }

    /// Returns whether the placeholder was drawn.
    fn draw_image_box(&mut self, image: &CardImage, card_top: f32) -> bool {
        let box_x = MARGIN_MM + CARD_PADDING_MM;
        let box_y = card_top - CARD_PADDING_MM - IMAGE_BOX_MM;

        match image {
            CardImage::Hidden => false,
            CardImage::Picture(resolved) => {
                let (width, height) = fit_within(resolved.width_px, resolved.height_px, IMAGE_BOX_MM, IMAGE_BOX_MM);
                self.push(Element::Image {
                    image: resolved.clone(),
                    x: box_x + (IMAGE_BOX_MM - width) / 2.0,
                    y: box_y + (IMAGE_BOX_MM - height) / 2.0,
                    width,
                    height,
                });
                false
            }
            CardImage::Placeholder => {
                self.push(Element::Rect {
                    x: box_x,
                    y: box_y,
                    width: IMAGE_BOX_MM,
                    height: IMAGE_BOX_MM,
                    fill: Some(Rgb::BADGE),
                    stroke: Some(Rgb::BORDER),
                });
                let text_width = text_width_mm(PLACEHOLDER_TEXT, SMALL_FONT_SIZE, false);
                self.text(
                    PLACEHOLDER_TEXT,
                    box_x + (IMAGE_BOX_MM - text_width) / 2.0,
                    box_y + IMAGE_BOX_MM / 2.0 - 1.2,
                    SMALL_FONT_SIZE,
                    FontStyle::Italic,
                    Rgb::GRAY,
                );
                true
            }
        }
    }

    fn draw_price(&mut self, price: &PriceBlock, x: f32, top: f32) {
        let (label, amount) = match price {
            PriceBlock::Wholesale { price, .. } => ("Precio Mayorista: ", *price),
            PriceBlock::Regular { price } => ("Precio: ", *price),
        };
        let line = format!("{}{}", label, pricing::format_money(amount, self.settings));
        let (style, color) = match price {
            PriceBlock::Wholesale { .. } => (FontStyle::Bold, Rgb::GREEN),
            PriceBlock::Regular { .. } => (FontStyle::Regular, Rgb::BLACK),
        };

        let badge_width = text_width_mm(&line, PRICE_FONT_SIZE, style == FontStyle::Bold) + 4.0;
        self.push(Element::Rect {
            x,
            y: top - PRICE_LINE_MM,
            width: badge_width,
            height: PRICE_LINE_MM,
            fill: Some(Rgb::PRICE_BADGE),
            stroke: None,
        });
        self.text(line, x + 2.0, top - 4.3, PRICE_FONT_SIZE, style, color);

        if let PriceBlock::Wholesale { struck_regular: Some(regular), .. } = price {
            let label = "Precio regular: ";
            let amount = pricing::format_money(*regular, self.settings);
            let baseline = top - PRICE_LINE_MM - 4.0;
            let label_width = text_width_mm(label, REGULAR_PRICE_FONT_SIZE, false);
            let amount_width = text_width_mm(&amount, REGULAR_PRICE_FONT_SIZE, false);
            let amount_x = x + 2.0 + label_width;

            self.text(label, x + 2.0, baseline, REGULAR_PRICE_FONT_SIZE, FontStyle::Regular, Rgb::GRAY);
            self.text(amount, amount_x, baseline, REGULAR_PRICE_FONT_SIZE, FontStyle::Regular, Rgb::GRAY);
            self.push(Element::Line {
                from: (amount_x, baseline + 1.2),
                to: (amount_x + amount_width, baseline + 1.2),
                thickness: 0.6,
                color: Rgb::GRAY,
            });
        }
    }

    // ------------------------------------------------------------------------
    // Footer
    // ------------------------------------------------------------------------

    fn draw_footers(&mut self) {
        let mut contact = Vec::new();
        if !self.settings.contact_email.is_empty() {
            contact.push(format!("Email: {}", self.settings.contact_email));
        }
        if !self.settings.contact_phone.is_empty() {
            contact.push(format!("Tel: {}", self.settings.contact_phone));
        }
        let contact = contact.join(" | ");
        let total = self.pages.len();

        for page_index in 0..total {
            self.cursor = LayoutCursor {
                page_index,
                y_position: FOOTER_BAND_MM,
            };
            self.push(Element::Line {
                from: (MARGIN_MM, FOOTER_BAND_MM - 4.0),
                to: (PAGE_WIDTH_MM - MARGIN_MM, FOOTER_BAND_MM - 4.0),
                thickness: 0.3,
                color: Rgb::BORDER,
            });
            if !contact.is_empty() {
                self.centered_text(&contact, 15.0, FOOTER_FONT_SIZE, FontStyle::Italic);
            }
            let numbering = format!("Página {} de {}", page_index + 1, total);
            self.centered_text(&numbering, 10.0, FOOTER_FONT_SIZE, FontStyle::Italic);
        }
    }
}
