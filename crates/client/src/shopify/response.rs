//! Shopify GraphQL response types and normalization.
//!
//! Storefront and Admin responses decode into the same types: Admin's
//! `priceRangeV2` and `inventoryQuantity` are aliases, and Admin's scalar
//! variant prices are absorbed by [`ShopifyPrice`].

use serde::Deserialize;
use stockroom_core::model::{Money, PriceRange, Product, ProductImage, ProductVariant, Shop};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Connection<T> {
    #[serde(default = "Vec::new")]
    pub edges: Vec<Edge<T>>,
    #[serde(default)]
    pub page_info: Option<PageInfo>,
}

impl<T> Connection<T> {
    pub fn into_nodes(self) -> impl Iterator<Item = T> {
        self.edges.into_iter().map(|e| e.node)
    }
}

#[derive(Debug, Deserialize)]
pub struct Edge<T> {
    pub node: T,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageInfo {
    pub has_next_page: bool,
    #[serde(default)]
    pub end_cursor: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ProductsData {
    pub products: Connection<ShopifyProduct>,
}

#[derive(Debug, Deserialize)]
pub struct ProductData {
    pub product: Option<ShopifyProduct>,
}

#[derive(Debug, Deserialize)]
pub struct ShopData {
    pub shop: ShopifyShop,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShopifyMoney {
    pub amount: String,
    pub currency_code: String,
}

impl From<ShopifyMoney> for Money {
    fn from(raw: ShopifyMoney) -> Self {
        Money::new(raw.amount, raw.currency_code)
    }
}

/// Storefront prices are `MoneyV2` objects, Admin variant prices are decimal strings.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum ShopifyPrice {
    Money(ShopifyMoney),
    Scalar(String),
}

impl ShopifyPrice {
    fn into_money(self, currency_code: &str) -> Money {
        match self {
            ShopifyPrice::Money(money) => money.into(),
            ShopifyPrice::Scalar(amount) => Money::new(amount, currency_code),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShopifyPriceRange {
    pub min_variant_price: ShopifyMoney,
    pub max_variant_price: ShopifyMoney,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShopifyImage {
    #[serde(default)]
    pub id: Option<String>,
    pub url: String,
    #[serde(default)]
    pub alt_text: Option<String>,
    #[serde(default)]
    pub width: Option<u32>,
    #[serde(default)]
    pub height: Option<u32>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShopifyVariant {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub sku: Option<String>,
    #[serde(default)]
    pub available_for_sale: Option<bool>,
    #[serde(default, alias = "inventoryQuantity")]
    pub quantity_available: Option<i64>,
    #[serde(default)]
    pub price: Option<ShopifyPrice>,
    #[serde(default)]
    pub compare_at_price: Option<ShopifyPrice>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShopifyProduct {
    pub id: String,
    pub title: String,
    pub handle: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub description_html: Option<String>,
    #[serde(default)]
    pub product_type: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub vendor: Option<String>,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub updated_at: Option<String>,
    #[serde(default)]
    pub published_at: Option<String>,
    /// Storefront only.
    #[serde(default)]
    pub available_for_sale: Option<bool>,
    /// Admin only: `ACTIVE`, `DRAFT` or `ARCHIVED`.
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub total_inventory: Option<i64>,
    #[serde(default)]
    pub online_store_url: Option<String>,
    #[serde(default, alias = "priceRangeV2")]
    pub price_range: Option<ShopifyPriceRange>,
    #[serde(default)]
    pub images: Option<Connection<ShopifyImage>>,
    #[serde(default)]
    pub variants: Option<Connection<ShopifyVariant>>,
}

fn empty_to_none(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}

/// `gid://shopify/Product/123` becomes `123`. Other ids pass through.
pub fn product_id(gid: &str) -> &str {
    gid.strip_prefix("gid://shopify/Product/")
        .map(|tail| tail.split('?').next().unwrap_or(tail))
        .filter(|tail| !tail.is_empty())
        .unwrap_or(gid)
}

impl From<ShopifyProduct> for Product {
    fn from(raw: ShopifyProduct) -> Self {
        let price_range = raw
            .price_range
            .map(|r| PriceRange { min_variant_price: r.min_variant_price.into(), max_variant_price: r.max_variant_price.into() })
            .unwrap_or_default();
        let currency = price_range.min_variant_price.currency_code.clone();

        let variants: Vec<ProductVariant> = raw
            .variants
            .map(Connection::into_nodes)
            .into_iter()
            .flatten()
            .map(|v| ProductVariant {
                id: v.id,
                title: v.title,
                sku: empty_to_none(v.sku),
                available_for_sale: v.available_for_sale.unwrap_or_else(|| v.quantity_available.is_some_and(|q| q > 0)),
                quantity_available: v.quantity_available,
                price: v.price.map(|p| p.into_money(&currency)).unwrap_or_else(|| price_range.min_variant_price.clone()),
                compare_at_price: v.compare_at_price.map(|p| p.into_money(&currency)),
            })
            .collect();

        let available_for_sale = match (raw.available_for_sale, raw.status.as_deref()) {
            (Some(available), _) => available,
            (None, Some(status)) => status.eq_ignore_ascii_case("active") && variants.iter().any(|v| v.available_for_sale),
            (None, None) => variants.iter().any(|v| v.available_for_sale),
        };

        Product {
            id: product_id(&raw.id).to_string(),
            title: raw.title,
            handle: raw.handle,
            url: raw.online_store_url,
            description: raw.description,
            description_html: raw.description_html,
            product_type: empty_to_none(raw.product_type),
            tags: raw.tags,
            vendor: empty_to_none(raw.vendor),
            created_at: raw.created_at,
            updated_at: raw.updated_at,
            published_at: raw.published_at,
            available_for_sale,
            total_inventory: raw.total_inventory,
            price_range,
            images: raw
                .images
                .map(Connection::into_nodes)
                .into_iter()
                .flatten()
                .enumerate()
                .map(|(i, img)| ProductImage {
                    id: img.id.unwrap_or_else(|| i.to_string()),
                    url: img.url,
                    alt_text: img.alt_text,
                    width: img.width,
                    height: img.height,
                })
                .collect(),
            variants,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct UrlHolder {
    pub url: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentSettings {
    pub currency_code: String,
}

#[derive(Debug, Deserialize)]
pub struct BrandLogo {
    pub image: Option<UrlHolder>,
}

#[derive(Debug, Deserialize)]
pub struct Brand {
    pub logo: Option<BrandLogo>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShopifyShop {
    #[serde(default)]
    pub id: Option<String>,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub primary_domain: Option<UrlHolder>,
    /// Admin only.
    #[serde(default)]
    pub currency_code: Option<String>,
    /// Storefront only.
    #[serde(default)]
    pub payment_settings: Option<PaymentSettings>,
    #[serde(default)]
    pub brand: Option<Brand>,
}

impl ShopifyShop {
    /// Normalize, with an optional display title overriding the shop name.
    pub fn into_shop(self, title: Option<String>) -> Shop {
        Shop {
            id: self.id.unwrap_or_default(),
            title: title.or_else(|| Some(self.name.clone())),
            name: self.name,
            description: empty_to_none(self.description),
            url: self.primary_domain.map(|d| d.url),
            currency_code: self.currency_code.or(self.payment_settings.map(|p| p.currency_code)),
            icon_url: self.brand.and_then(|b| b.logo).and_then(|l| l.image).map(|i| i.url),
            product_count: None,
            featured: Vec::new(),
        }
    }
}
