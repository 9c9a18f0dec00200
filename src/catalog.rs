// Product selection and ordering ahead of layout.

use std::cmp::Ordering;
use std::collections::HashSet;

use crate::model::{ProductRecord, SortKey};
use crate::pricing::parse_price;

/// Records matching `ids`, in request order. Unknown and repeated ids are
/// ignored.
pub fn select(catalog: &[ProductRecord], ids: &[u64]) -> Vec<ProductRecord> {
    let mut seen = HashSet::new();
    ids.iter()
        .filter(|id| seen.insert(**id))
        .filter_map(|id| catalog.iter().find(|p| p.id == *id).cloned())
        .collect()
}

/// Stable ascending sort. Products without a parsable regular price go last
/// when sorting by price.
pub fn sort(mut products: Vec<ProductRecord>, key: SortKey) -> Vec<ProductRecord> {
    products.sort_by(|a, b| compare(a, b, key));
    products
}

fn compare(a: &ProductRecord, b: &ProductRecord, key: SortKey) -> Ordering {
    match key {
        SortKey::Name => a.name.cmp(&b.name),
        SortKey::Sku => a.sku.cmp(&b.sku),
        SortKey::Category => a.category.cmp(&b.category),
        SortKey::Price => {
            let pa = parse_price(a.regular_price.as_deref());
            let pb = parse_price(b.regular_price.as_deref());
            match (pa, pb) {
                (Some(x), Some(y)) => x.total_cmp(&y),
                (Some(_), None) => Ordering::Less,
                (None, Some(_)) => Ordering::Greater,
                (None, None) => Ordering::Equal,
            }
        }
    }
}
