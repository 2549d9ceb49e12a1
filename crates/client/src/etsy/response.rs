//! Etsy Open API v3 response types and normalization.

use chrono::{DateTime, SecondsFormat};
use serde::Deserialize;
use stockroom_core::model::{Money, PriceRange, Product, ProductImage, ProductVariant, Review, Shop};

const DEFAULT_CURRENCY: &str = "USD";

/// Paged result envelope used by list endpoints.
#[derive(Debug, Deserialize)]
pub struct EtsyPage<T> {
    #[serde(default)]
    pub count: u64,
    #[serde(default = "Vec::new")]
    pub results: Vec<T>,
}

#[derive(Debug, Deserialize)]
pub struct EtsyShop {
    pub shop_id: u64,
    pub shop_name: String,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub announcement: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub currency_code: Option<String>,
    #[serde(default)]
    pub icon_url_fullxfull: Option<String>,
    #[serde(default)]
    pub listing_active_count: Option<u64>,
}

/// Etsy integer money: `amount / divisor` in `currency_code`.
#[derive(Debug, Clone, Deserialize)]
pub struct EtsyMoney {
    pub amount: i64,
    pub divisor: i64,
    pub currency_code: String,
}

impl EtsyMoney {
    fn to_money(&self) -> Money {
        Money::from_minor(self.amount, self.divisor, self.currency_code.clone())
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct EtsyImage {
    pub listing_image_id: u64,
    #[serde(default)]
    pub url_fullxfull: Option<String>,
    #[serde(default, rename = "url_570xN")]
    pub url_570xn: Option<String>,
    #[serde(default)]
    pub alt_text: Option<String>,
    #[serde(default)]
    pub full_width: Option<u32>,
    #[serde(default)]
    pub full_height: Option<u32>,
}

#[derive(Debug, Deserialize)]
pub struct EtsyListing {
    pub listing_id: u64,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub state: Option<String>,
    #[serde(default)]
    pub quantity: Option<i64>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub taxonomy_path: Vec<String>,
    #[serde(default)]
    pub shop_section_id: Option<u64>,
    #[serde(default)]
    pub creation_timestamp: Option<i64>,
    #[serde(default)]
    pub last_modified_timestamp: Option<i64>,
    #[serde(default)]
    pub price: Option<EtsyMoney>,
    #[serde(default)]
    pub images: Vec<EtsyImage>,
}

#[derive(Debug, Default, Deserialize)]
pub struct EtsyInventory {
    #[serde(default)]
    pub products: Vec<EtsyInventoryProduct>,
}

#[derive(Debug, Deserialize)]
pub struct EtsyInventoryProduct {
    pub product_id: u64,
    #[serde(default)]
    pub sku: Option<String>,
    #[serde(default)]
    pub offerings: Vec<EtsyOffering>,
}

#[derive(Debug, Deserialize)]
pub struct EtsyOffering {
    pub offering_id: Option<u64>,
    #[serde(default)]
    pub quantity: i64,
    #[serde(default = "enabled")]
    pub is_enabled: bool,
    #[serde(default)]
    pub price: Option<EtsyMoney>,
}

fn enabled() -> bool {
    true
}

#[derive(Debug, Deserialize)]
pub struct EtsyReview {
    #[serde(default)]
    pub shop_review_id: Option<u64>,
    #[serde(default)]
    pub listing_review_id: Option<u64>,
    pub rating: u8,
    #[serde(default)]
    pub review: Option<String>,
    #[serde(default)]
    pub create_timestamp: Option<i64>,
    #[serde(default)]
    pub buyer_user_id: Option<u64>,
    #[serde(default)]
    pub buyer_display_name: Option<String>,
    #[serde(default)]
    pub is_recommended: Option<bool>,
    #[serde(default)]
    pub was_helpful: Option<bool>,
    #[serde(default)]
    pub language: Option<String>,
    #[serde(default)]
    pub translated_review: Option<String>,
}

/// Unix seconds to an RFC 3339 UTC timestamp with milliseconds.
fn iso_from_unix(secs: Option<i64>) -> Option<String> {
    secs.and_then(|s| DateTime::from_timestamp(s, 0)).map(|d| d.to_rfc3339_opts(SecondsFormat::Millis, true))
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

impl From<EtsyShop> for Shop {
    fn from(raw: EtsyShop) -> Self {
        Shop {
            id: raw.shop_id.to_string(),
            name: raw.shop_name,
            title: non_empty(raw.title),
            description: non_empty(raw.announcement),
            url: raw.url,
            currency_code: raw.currency_code,
            icon_url: raw.icon_url_fullxfull,
            product_count: raw.listing_active_count,
            featured: Vec::new(),
        }
    }
}

impl EtsyListing {
    fn handle(&self) -> String {
        self.url
            .as_deref()
            .and_then(|u| u.split('?').next())
            .and_then(|u| u.trim_end_matches('/').rsplit('/').next())
            .filter(|segment| !segment.is_empty())
            .map(str::to_string)
            .unwrap_or_else(|| self.listing_id.to_string())
    }

    fn is_active(&self) -> bool {
        self.state.as_deref() == Some("active")
    }

    fn money(&self) -> Money {
        match &self.price {
            Some(price) => price.to_money(),
            None => Money::new("0", DEFAULT_CURRENCY),
        }
    }

    fn image(&self, image: EtsyImage) -> ProductImage {
        ProductImage {
            id: image.listing_image_id.to_string(),
            url: image.url_fullxfull.or(image.url_570xn).unwrap_or_default(),
            alt_text: non_empty(image.alt_text).or_else(|| Some(self.title.clone())),
            width: image.full_width,
            height: image.full_height,
        }
    }

    fn default_variant(&self) -> ProductVariant {
        ProductVariant {
            id: self.listing_id.to_string(),
            title: "Default".to_string(),
            sku: Some(self.listing_id.to_string()),
            available_for_sale: self.is_active(),
            quantity_available: Some(self.quantity.unwrap_or(0)),
            price: self.money(),
            compare_at_price: None,
        }
    }

    fn base_product(&self) -> Product {
        let created = iso_from_unix(self.creation_timestamp);
        Product {
            id: self.listing_id.to_string(),
            title: self.title.clone(),
            handle: self.handle(),
            url: Some(self.url.clone().unwrap_or_else(|| format!("https://www.etsy.com/listing/{}", self.listing_id))),
            description: self.description.clone(),
            description_html: None,
            product_type: (!self.taxonomy_path.is_empty()).then(|| self.taxonomy_path.join(" > ")),
            tags: self.tags.clone(),
            vendor: None,
            created_at: created.clone(),
            updated_at: iso_from_unix(self.last_modified_timestamp),
            published_at: created,
            available_for_sale: self.is_active(),
            total_inventory: Some(self.quantity.unwrap_or(0)),
            price_range: PriceRange::single(self.money()),
            images: Vec::new(),
            variants: Vec::new(),
        }
    }

    /// Entry for the product list: first image and one synthesized variant.
    pub fn into_list_product(mut self) -> Product {
        let first = if self.images.is_empty() { None } else { Some(self.images.swap_remove(0)) };
        let mut product = self.base_product();
        product.images = first.into_iter().map(|img| self.image(img)).collect();
        product.variants = vec![self.default_variant()];
        product
    }

    /// Full detail: every image, variants from the inventory offerings.
    pub fn into_product(mut self, inventory: EtsyInventory) -> Product {
        let images = std::mem::take(&mut self.images);
        let mut product = self.base_product();
        product.description_html = self.description.clone();
        product.vendor = self.shop_section_id.map(|id| id.to_string());
        product.images = images.into_iter().map(|img| self.image(img)).collect();

        let mut variants: Vec<ProductVariant> = Vec::new();
        for item in inventory.products {
            for offering in item.offerings.into_iter().filter(|o| o.is_enabled) {
                let price = offering.price.as_ref().map(EtsyMoney::to_money);
                variants.push(ProductVariant {
                    id: offering.offering_id.unwrap_or(item.product_id).to_string(),
                    title: price.as_ref().map(Money::pretty).unwrap_or_else(|| "Default".to_string()),
                    sku: non_empty(item.sku.clone()).or_else(|| Some(self.listing_id.to_string())),
                    available_for_sale: offering.quantity > 0,
                    quantity_available: Some(offering.quantity),
                    price: price.unwrap_or_else(|| self.money()),
                    compare_at_price: None,
                });
            }
        }
        if variants.is_empty() {
            variants.push(self.default_variant());
        }
        product.variants = variants;
        product
    }
}

impl From<EtsyReview> for Review {
    fn from(raw: EtsyReview) -> Self {
        Review {
            id: raw.shop_review_id.or(raw.listing_review_id).map(|id| id.to_string()).unwrap_or_default(),
            rating: raw.rating,
            review: raw.review,
            review_date: iso_from_unix(raw.create_timestamp),
            buyer_user_id: raw.buyer_user_id,
            buyer_display_name: non_empty(raw.buyer_display_name).unwrap_or_else(|| "Anonymous".to_string()),
            is_recommended: raw.is_recommended.unwrap_or(false),
            was_helpful: raw.was_helpful.unwrap_or(false),
            language: non_empty(raw.language).unwrap_or_else(|| "en".to_string()),
            translated_review: raw.translated_review,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn listing() -> EtsyListing {
        serde_json::from_value(serde_json::json!({
            "listing_id": 123,
            "title": "Blue Hat",
            "description": "A knitted hat.",
            "url": "https://www.etsy.com/listing/123/blue-hat?utm_source=api",
            "state": "active",
            "quantity": 4,
            "tags": ["hat", "wool"],
            "creation_timestamp": 1_700_000_000,
            "price": {"amount": 1250, "divisor": 100, "currency_code": "GBP"},
            "images": [
                {"listing_image_id": 1, "url_fullxfull": "https://i.etsystatic.com/1.jpg", "alt_text": "", "full_width": 800, "full_height": 600},
                {"listing_image_id": 2, "url_570xN": "https://i.etsystatic.com/2.jpg", "alt_text": "Side view"}
            ]
        }))
        .unwrap()
    }

    #[test]
    fn test_list_product_mapping() {
        let product = listing().into_list_product();
        assert_eq!(product.id, "123");
        assert_eq!(product.handle, "blue-hat");
        assert_eq!(product.price_range.min_variant_price, Money::new("12.5", "GBP"));
        assert_eq!(product.created_at.as_deref(), Some("2023-11-14T22:13:20.000Z"));
        assert!(product.available_for_sale);
        assert_eq!(product.images.len(), 1);
        assert_eq!(product.images[0].alt_text.as_deref(), Some("Blue Hat"));
        assert_eq!(product.variants.len(), 1);
        assert_eq!(product.variants[0].title, "Default");
        assert_eq!(product.variants[0].quantity_available, Some(4));
    }

    #[test]
    fn test_handle_falls_back_to_id() {
        let mut raw = listing();
        raw.url = None;
        assert_eq!(raw.handle(), "123");
    }

    #[test]
    fn test_detail_product_mapping() {
        let inventory: EtsyInventory = serde_json::from_value(serde_json::json!({
            "products": [
                {"product_id": 9, "sku": "HAT-S", "offerings": [
                    {"offering_id": 91, "quantity": 2, "is_enabled": true, "price": {"amount": 1000, "divisor": 100, "currency_code": "GBP"}}
                ]},
                {"product_id": 10, "sku": "", "offerings": [
                    {"offering_id": 101, "quantity": 0, "is_enabled": true},
                    {"offering_id": 102, "quantity": 5, "is_enabled": false}
                ]}
            ]
        }))
        .unwrap();

        let product = listing().into_product(inventory);
        assert_eq!(product.images.len(), 2);
        assert_eq!(product.images[1].url, "https://i.etsystatic.com/2.jpg");
        assert_eq!(product.images[1].alt_text.as_deref(), Some("Side view"));
        assert_eq!(product.description_html.as_deref(), Some("A knitted hat."));

        assert_eq!(product.variants.len(), 2);
        assert_eq!(product.variants[0].id, "91");
        assert_eq!(product.variants[0].title, "GBP 10.00");
        assert_eq!(product.variants[0].sku.as_deref(), Some("HAT-S"));
        assert!(product.variants[0].available_for_sale);
        assert_eq!(product.variants[1].sku.as_deref(), Some("123"));
        assert!(!product.variants[1].available_for_sale);
        assert_eq!(product.variants[1].price, Money::new("12.5", "GBP"));
    }

    #[test]
    fn test_detail_without_inventory_gets_default_variant() {
        let product = listing().into_product(EtsyInventory::default());
        assert_eq!(product.variants.len(), 1);
        assert_eq!(product.variants[0].id, "123");
    }

    #[test]
    fn test_review_mapping_defaults() {
        let raw: EtsyReview = serde_json::from_value(serde_json::json!({
            "listing_review_id": 77,
            "rating": 5,
            "review": "Lovely",
            "create_timestamp": 0,
            "buyer_display_name": null
        }))
        .unwrap();
        let review = Review::from(raw);
        assert_eq!(review.id, "77");
        assert_eq!(review.buyer_display_name, "Anonymous");
        assert_eq!(review.language, "en");
        assert_eq!(review.review_date.as_deref(), Some("1970-01-01T00:00:00.000Z"));
        assert!(!review.is_recommended);
    }

    #[test]
    fn test_shop_mapping() {
        let raw: EtsyShop = serde_json::from_value(serde_json::json!({
            "shop_id": 42,
            "shop_name": "WoolWorks",
            "title": "",
            "currency_code": "GBP",
            "listing_active_count": 12
        }))
        .unwrap();
        let shop = Shop::from(raw);
        assert_eq!(shop.id, "42");
        assert_eq!(shop.display_title(), "WoolWorks");
        assert_eq!(shop.product_count, Some(12));
    }
}
