use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::id_string;

/// A decimal amount in a currency, kept as a string the way storefront APIs send it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Money {
    pub amount: String,
    pub currency_code: String,
}

impl Money {
    pub fn new(amount: impl Into<String>, currency_code: impl Into<String>) -> Self {
        Self { amount: amount.into(), currency_code: currency_code.into() }
    }

    /// Build from an integer amount in minor units, e.g. Etsy's `{amount: 1250, divisor: 100}`.
    pub fn from_minor(amount: i64, divisor: i64, currency_code: impl Into<String>) -> Self {
        let divisor = if divisor == 0 { 1 } else { divisor };
        let value = amount as f64 / divisor as f64;
        Self { amount: value.to_string(), currency_code: currency_code.into() }
    }

    pub fn value(&self) -> Option<f64> {
        self.amount.trim().parse().ok()
    }

    /// `"USD 12.50"`.
    pub fn pretty(&self) -> String {
        match self.value() {
            Some(value) => format!("{} {value:.2}", self.currency_code),
            None => format!("{} {}", self.currency_code, self.amount),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PriceRange {
    pub min_variant_price: Money,
    pub max_variant_price: Money,
}

impl PriceRange {
    pub fn single(price: Money) -> Self {
        Self { min_variant_price: price.clone(), max_variant_price: price }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ProductImage {
    #[serde(deserialize_with = "id_string")]
    pub id: String,
    pub url: String,
    pub alt_text: Option<String>,
    pub width: Option<u32>,
    pub height: Option<u32>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ProductVariant {
    #[serde(deserialize_with = "id_string")]
    pub id: String,
    pub title: String,
    pub sku: Option<String>,
    pub available_for_sale: bool,
    pub quantity_available: Option<i64>,
    pub price: Money,
    pub compare_at_price: Option<Money>,
}

/// A product as cached and served, whichever backend it came from.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Product {
    #[serde(deserialize_with = "id_string")]
    pub id: String,
    pub title: String,
    /// URL slug, used interchangeably with `id` in routes.
    pub handle: String,
    /// Public storefront page.
    pub url: Option<String>,
    pub description: Option<String>,
    pub description_html: Option<String>,
    pub product_type: Option<String>,
    pub tags: Vec<String>,
    pub vendor: Option<String>,
    pub created_at: Option<String>,
    pub updated_at: Option<String>,
    pub published_at: Option<String>,
    pub available_for_sale: bool,
    pub total_inventory: Option<i64>,
    pub price_range: PriceRange,
    pub images: Vec<ProductImage>,
    pub variants: Vec<ProductVariant>,
}

impl Product {
    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.iter().any(|t| t.eq_ignore_ascii_case(tag))
    }

    pub fn featured_image(&self) -> Option<&ProductImage> {
        self.images.first()
    }
}

/// One entry of the tag index.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TagCount {
    pub tag: String,
    pub count: usize,
}

/// The full product listing, cached as `products.json`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProductList {
    #[serde(default)]
    pub results: Vec<Product>,
}

impl ProductList {
    pub fn new(results: Vec<Product>) -> Self {
        Self { results }
    }

    pub fn len(&self) -> usize {
        self.results.len()
    }

    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }

    /// Products ordered by title, ignoring case.
    pub fn sorted_by_title(mut self) -> Self {
        self.results.sort_by_cached_key(|p| p.title.to_lowercase());
        self
    }

    /// Every tag in use with the number of products carrying it, sorted by tag.
    ///
    /// Tags that differ only by case are counted together under their lowercase form.
    pub fn tags(&self) -> Vec<TagCount> {
        let mut counts: BTreeMap<String, usize> = BTreeMap::new();
        for product in &self.results {
            let mut seen: Vec<String> = product.tags.iter().map(|t| t.trim().to_lowercase()).collect();
            seen.sort();
            seen.dedup();
            for tag in seen.into_iter().filter(|t| !t.is_empty()) {
                *counts.entry(tag).or_default() += 1;
            }
        }
        counts.into_iter().map(|(tag, count)| TagCount { tag, count }).collect()
    }

    /// Products carrying `tag`, ignoring case.
    pub fn with_tag(&self, tag: &str) -> Vec<Product> {
        let tag = tag.trim();
        self.results.iter().filter(|p| p.has_tag(tag)).cloned().collect()
    }

    /// Look up by id or handle.
    pub fn find(&self, id_or_handle: &str) -> Option<&Product> {
        self.results.iter().find(|p| p.id == id_or_handle || p.handle == id_or_handle)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn product(id: &str, title: &str, tags: &[&str]) -> Product {
        Product {
            id: id.into(),
            title: title.into(),
            handle: title.to_lowercase().replace(' ', "-"),
            tags: tags.iter().map(|t| t.to_string()).collect(),
            ..Default::default()
        }
    }

    #[test]
    fn test_money_from_minor() {
        let price = Money::from_minor(1250, 100, "USD");
        assert_eq!(price.amount, "12.5");
        assert_eq!(price.pretty(), "USD 12.50");

        let whole = Money::from_minor(1200, 100, "GBP");
        assert_eq!(whole.amount, "12");
        assert_eq!(Money::from_minor(5, 0, "USD").amount, "5");
    }

    #[test]
    fn test_product_accepts_numeric_id() {
        let product: Product =
            serde_json::from_value(serde_json::json!({"id": 123, "title": "Blue Hat", "tags": ["hat", "wool"]})).unwrap();
        assert_eq!(product.id, "123");
        assert_eq!(product.tags, vec!["hat", "wool"]);
        assert!(product.images.is_empty());
    }

    #[test]
    fn test_product_serializes_camel_case() {
        let product = Product { available_for_sale: true, total_inventory: Some(3), ..product("1", "Hat", &[]) };
        let value = serde_json::to_value(&product).unwrap();
        assert_eq!(value["availableForSale"], true);
        assert_eq!(value["totalInventory"], 3);
        assert!(value.get("priceRange").unwrap().get("minVariantPrice").is_some());
    }

    #[test]
    fn test_sorted_by_title_ignores_case() {
        let list = ProductList::new(vec![product("1", "zebra", &[]), product("2", "Apple", &[]), product("3", "mango", &[])]);
        let titles: Vec<_> = list.sorted_by_title().results.into_iter().map(|p| p.title).collect();
        assert_eq!(titles, vec!["Apple", "mango", "zebra"]);
    }

    #[test]
    fn test_tag_index() {
        let list = ProductList::new(vec![
            product("1", "Blue Hat", &["hat", "wool"]),
            product("2", "Red Hat", &["Hat", "hat", "cotton"]),
        ]);
        assert_eq!(
            list.tags(),
            vec![
                TagCount { tag: "cotton".into(), count: 1 },
                TagCount { tag: "hat".into(), count: 2 },
                TagCount { tag: "wool".into(), count: 1 },
            ]
        );
        assert_eq!(list.with_tag("HAT").len(), 2);
        assert_eq!(list.with_tag("wool")[0].id, "1");
        assert!(list.with_tag("scarf").is_empty());
    }

    #[test]
    fn test_find_by_id_or_handle() {
        let list = ProductList::new(vec![product("123", "Blue Hat", &[])]);
        assert!(list.find("123").is_some());
        assert!(list.find("blue-hat").is_some());
        assert!(list.find("nope").is_none());
    }
}
