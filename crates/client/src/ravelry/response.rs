//! Ravelry API response types.

use serde::Deserialize;
use stockroom_core::model::{Money, PriceRange, Product, ProductImage, ProductVariant, Shop};

#[derive(Debug, Deserialize)]
pub struct DesignerResponse {
    pub pattern_author: PatternAuthor,
    #[serde(default)]
    pub featured_bundles: Vec<FeaturedBundle>,
}

#[derive(Debug, Deserialize)]
pub struct PatternAuthor {
    pub id: u64,
    pub name: String,
    #[serde(default)]
    pub permalink: Option<String>,
    #[serde(default)]
    pub notes_html: Option<String>,
    #[serde(default)]
    pub users: Vec<AuthorUser>,
}

#[derive(Debug, Deserialize)]
pub struct AuthorUser {
    #[serde(default)]
    pub photo_url: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct FeaturedBundle {
    pub name: String,
}

impl DesignerResponse {
    /// Normalize, with DESIGNER_NAME taking precedence over the author name.
    pub fn into_shop(self, designer_name: Option<String>) -> Shop {
        let author = self.pattern_author;
        Shop {
            id: author.id.to_string(),
            title: designer_name.or_else(|| Some(author.name.clone())),
            url: author.permalink.map(|p| format!("https://www.ravelry.com/designers/{p}")),
            name: author.name,
            description: author.notes_html.filter(|n| !n.is_empty()),
            currency_code: None,
            icon_url: author.users.into_iter().find_map(|u| u.photo_url),
            product_count: None,
            featured: self.featured_bundles.into_iter().map(|b| b.name).collect(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct StoreProductsResponse {
    #[serde(default)]
    pub products: Vec<StoreProduct>,
}

#[derive(Debug, Deserialize)]
pub struct StoreProduct {
    pub id: u64,
    pub title: String,
    #[serde(default)]
    pub price: Option<f64>,
    #[serde(default)]
    pub currency: Option<String>,
    #[serde(default)]
    pub pattern_ids: Vec<u64>,
}

fn price_text(price: Option<f64>) -> String {
    price.map(|p| p.to_string()).unwrap_or_else(|| "0".to_string())
}

impl From<StoreProduct> for Product {
    /// The product id is the first pattern id, since pattern detail is what
    /// the routes serve. A product with no pattern keeps its store id.
    fn from(raw: StoreProduct) -> Self {
        let id = raw.pattern_ids.first().copied().unwrap_or(raw.id).to_string();
        let price = Money::new(price_text(raw.price), raw.currency.unwrap_or_else(|| "USD".to_string()));
        Product {
            handle: id.clone(),
            url: Some(format!("https://www.ravelry.com/purchase/{}", raw.id)),
            available_for_sale: true,
            price_range: PriceRange::single(price.clone()),
            variants: vec![ProductVariant {
                id: raw.id.to_string(),
                title: "Default".to_string(),
                available_for_sale: true,
                price,
                ..Default::default()
            }],
            id,
            title: raw.title,
            ..Default::default()
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct PatternResponse {
    pub pattern: Pattern,
}

#[derive(Debug, Deserialize)]
pub struct Pattern {
    pub id: u64,
    pub name: String,
    #[serde(default)]
    pub permalink: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub notes_html: Option<String>,
    #[serde(default)]
    pub price: Option<f64>,
    #[serde(default)]
    pub currency: Option<String>,
    #[serde(default)]
    pub free: bool,
    #[serde(default)]
    pub published: Option<String>,
    #[serde(default)]
    pub photos: Vec<PatternPhoto>,
    #[serde(default)]
    pub craft: Option<Named>,
    #[serde(default)]
    pub pattern_attributes: Vec<PatternAttribute>,
    #[serde(default)]
    pub pattern_categories: Vec<Named>,
    #[serde(default)]
    pub pattern_author: Option<Named>,
}

#[derive(Debug, Deserialize)]
pub struct PatternPhoto {
    pub id: u64,
    #[serde(default)]
    pub medium_url: Option<String>,
    #[serde(default)]
    pub small_url: Option<String>,
    #[serde(default)]
    pub medium2_url: Option<String>,
    #[serde(default)]
    pub caption: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct Named {
    pub name: String,
}

#[derive(Debug, Deserialize)]
pub struct PatternAttribute {
    pub permalink: String,
}

impl From<Pattern> for Product {
    fn from(raw: Pattern) -> Self {
        let id = raw.id.to_string();
        let price = Money::new(price_text(raw.price), raw.currency.unwrap_or_else(|| "USD".to_string()));

        let mut tags: Vec<String> = raw.pattern_attributes.into_iter().map(|a| a.permalink).collect();
        tags.extend(raw.pattern_categories.into_iter().map(|c| c.name.to_lowercase()));
        if raw.free {
            tags.push("free".to_string());
        }

        let images = raw
            .photos
            .into_iter()
            .filter_map(|photo| {
                let url = photo.medium2_url.or(photo.medium_url).or(photo.small_url)?;
                Some(ProductImage {
                    id: photo.id.to_string(),
                    url,
                    alt_text: photo.caption.filter(|c| !c.is_empty()).or_else(|| Some(raw.name.clone())),
                    width: None,
                    height: None,
                })
            })
            .collect();

        Product {
            handle: raw.permalink.clone().unwrap_or_else(|| id.clone()),
            url: raw.permalink.map(|p| format!("https://www.ravelry.com/patterns/library/{p}")),
            description: raw.notes,
            description_html: raw.notes_html,
            product_type: raw.craft.map(|c| c.name),
            vendor: raw.pattern_author.map(|a| a.name),
            published_at: raw.published,
            available_for_sale: true,
            price_range: PriceRange::single(price.clone()),
            variants: vec![ProductVariant {
                id: id.clone(),
                title: "Pattern".to_string(),
                available_for_sale: true,
                price,
                ..Default::default()
            }],
            id,
            title: raw.name,
            tags,
            images,
            ..Default::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_designer_into_shop() {
        let raw: DesignerResponse = serde_json::from_value(serde_json::json!({
            "pattern_author": {
                "id": 77, "name": "Jane Knits", "permalink": "jane-knits",
                "notes_html": "<p>Hats</p>", "users": [{"photo_url": "https://img/jane.jpg"}]
            },
            "featured_bundles": [{"name": "Winter"}, {"name": "Baby"}]
        }))
        .unwrap();

        let shop = raw.into_shop(None);
        assert_eq!(shop.id, "77");
        assert_eq!(shop.display_title(), "Jane Knits");
        assert_eq!(shop.icon_url.as_deref(), Some("https://img/jane.jpg"));
        assert_eq!(shop.featured, ["Winter", "Baby"]);
    }

    #[test]
    fn test_store_product_uses_pattern_id() {
        let raw: StoreProduct = serde_json::from_value(serde_json::json!({
            "id": 5, "title": "Cabled Hat", "price": 6.5, "currency": "USD", "pattern_ids": [900, 901]
        }))
        .unwrap();
        let product = Product::from(raw);
        assert_eq!(product.id, "900");
        assert_eq!(product.price_range.min_variant_price, Money::new("6.5", "USD"));

        let raw: StoreProduct = serde_json::from_value(serde_json::json!({"id": 6, "title": "Bundle"})).unwrap();
        assert_eq!(Product::from(raw).id, "6");
    }

    #[test]
    fn test_pattern_into_product() {
        let raw: PatternResponse = serde_json::from_value(serde_json::json!({"pattern": {
            "id": 900, "name": "Cabled Hat", "permalink": "cabled-hat", "free": false,
            "price": 6.0, "currency": "GBP", "notes": "Worsted weight",
            "craft": {"name": "Knitting"},
            "pattern_attributes": [{"permalink": "adult"}, {"permalink": "cables"}],
            "photos": [{"id": 1, "medium_url": "https://img/1.jpg", "caption": ""}, {"id": 2}]
        }}))
        .unwrap();

        let product = Product::from(raw.pattern);
        assert_eq!(product.handle, "cabled-hat");
        assert_eq!(product.product_type.as_deref(), Some("Knitting"));
        assert_eq!(product.tags, ["adult", "cables"]);
        assert_eq!(product.images.len(), 1);
        assert_eq!(product.images[0].alt_text.as_deref(), Some("Cabled Hat"));
        assert_eq!(product.price_range.max_variant_price.pretty(), "GBP 6.00");
    }
}
