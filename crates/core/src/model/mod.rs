//! Normalized catalog model shared by every storefront backend.
//!
//! Field names serialize in camelCase, which is the layout of the cached
//! JSON files under the data directory.

mod product;
mod review;
mod shop;

pub use product::{Money, PriceRange, Product, ProductImage, ProductList, ProductVariant, TagCount};
pub use review::{ListingReviews, RatingSummary, Review, ReviewsSummary};
pub use shop::Shop;

/// Deserialize an id that a backend may send as a number or a string.
pub(crate) fn id_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: serde::Deserializer<'de>,
{
    use serde::Deserialize;

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Id {
        Text(String),
        Signed(i64),
        Unsigned(u64),
    }

    Ok(match Id::deserialize(deserializer)? {
        Id::Text(s) => s,
        Id::Signed(n) => n.to_string(),
        Id::Unsigned(n) => n.to_string(),
    })
}
