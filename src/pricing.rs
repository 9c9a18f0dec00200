// Price parsing, currency formatting and the wholesale/regular fallback.

use crate::model::{CompanySettings, ProductRecord};

/// What a card shows in its price badge.
#[derive(Debug, Clone, PartialEq)]
pub enum PriceBlock {
    /// Wholesale price, with the regular price struck through when it differs
    Wholesale { price: f64, struck_regular: Option<f64> },
    Regular { price: f64 },
}

/// Parses a host-supplied price. Empty, non-numeric, negative and non-finite
/// values yield `None`.
pub fn parse_price(raw: Option<&str>) -> Option<f64> {
    let text = raw?.trim();
    if text.is_empty() {
        return None;
    }
    let value: f64 = text.parse().ok()?;
    (value.is_finite() && value >= 0.0).then_some(value)
}

pub fn price_block(product: &ProductRecord) -> Option<PriceBlock> {
    let regular = parse_price(product.regular_price.as_deref());
    match parse_price(product.wholesale_price.as_deref()) {
        Some(wholesale) if wholesale > 0.0 => Some(PriceBlock::Wholesale {
            price: wholesale,
            struck_regular: regular.filter(|r| !same_cents(*r, wholesale)),
        }),
        _ => regular.map(|price| PriceBlock::Regular { price }),
    }
}

fn same_cents(a: f64, b: f64) -> bool {
    (a * 100.0).round() == (b * 100.0).round()
}

/// `1234.5` with symbol `$` becomes `$1,234.50`.
pub fn format_money(amount: f64, settings: &CompanySettings) -> String {
    let cents = (amount * 100.0).round() as u64;
    let whole = (cents / 100).to_string();
    let fraction = cents % 100;

    let mut grouped = String::new();
    for (i, digit) in whole.chars().enumerate() {
        if i > 0 && (whole.len() - i) % 3 == 0 {
            grouped.push_str(&settings.thousands_separator);
        }
        grouped.push(digit);
    }

    format!(
        "{}{}{}{:02}",
        settings.currency_symbol, grouped, settings.decimal_separator, fraction
    )
}
