//! Shopify GraphQL storefront.
//!
//! Talks to the Storefront API when SHOPIFY_STOREFRONT_ACCESS_TOKEN is set and
//! falls back to the Admin API with SHOPIFY_ADMIN_ACCESS_TOKEN. Both APIs are
//! cursor-paginated; the product list walks every page.

mod query;
pub mod response;

use async_trait::async_trait;
use serde_json::json;
use stockroom_core::config::{ShopifyApi, ShopifyConfig};
use stockroom_core::model::{Product, ProductList, Shop};
use stockroom_core::{AppConfig, Error};

use crate::http::{ApiClient, Auth, HttpSettings};
use crate::{ApiError, Storefront};
use response::{ProductData, ProductsData, ShopData};

const STOREFRONT_TOKEN_HEADER: &str = "X-Shopify-Storefront-Access-Token";
const ADMIN_TOKEN_HEADER: &str = "X-Shopify-Access-Token";

#[derive(Debug, Clone)]
pub struct ShopifyStorefront {
    client: ApiClient,
    api: ShopifyApi,
    shop_name: Option<String>,
}

/// GraphQL endpoint for `domain`. A bare domain is served over https.
fn endpoint(domain: &str, api: ShopifyApi, version: &str) -> String {
    let domain = domain.trim().trim_end_matches('/');
    let origin = if domain.contains("://") { domain.to_string() } else { format!("https://{domain}") };
    match api {
        ShopifyApi::Storefront => format!("{origin}/api/{version}/graphql.json"),
        ShopifyApi::Admin => format!("{origin}/admin/api/{version}/graphql.json"),
    }
}

/// Numeric ids become product GIDs; anything else is treated as a handle.
fn product_gid(id: &str) -> Option<String> {
    if id.starts_with("gid://") {
        Some(id.to_string())
    } else if !id.is_empty() && id.bytes().all(|b| b.is_ascii_digit()) {
        Some(format!("gid://shopify/Product/{id}"))
    } else {
        None
    }
}

impl ShopifyStorefront {
    /// # Errors
    ///
    /// Returns `ApiError::MissingCredential` if SHOPIFY_DOMAIN or both access
    /// tokens are missing.
    pub fn new(shopify: &ShopifyConfig, settings: &HttpSettings) -> Result<Self, ApiError> {
        let domain = shopify.require_domain()?;
        let (api, token) = shopify.require_token()?;
        let header = match api {
            ShopifyApi::Storefront => STOREFRONT_TOKEN_HEADER,
            ShopifyApi::Admin => ADMIN_TOKEN_HEADER,
        };

        let client = ApiClient::new(
            &endpoint(domain, api, &shopify.api_version),
            Auth::ShopifyToken { header, token: token.to_string() },
            settings,
        )?;
        tracing::debug!(endpoint = %client.base_url(), ?api, "Shopify client ready");

        let shop_name = shopify.shop_name.clone().filter(|name| !name.trim().is_empty());
        Ok(Self { client, api, shop_name })
    }

    /// # Errors
    ///
    /// Returns `Error::Config` if a credential is missing.
    pub fn from_config(config: &AppConfig) -> Result<Self, Error> {
        Ok(Self::new(&config.shopify, &HttpSettings::from_config(config))?)
    }

    pub fn api(&self) -> ShopifyApi {
        self.api
    }
}

#[async_trait]
impl Storefront for ShopifyStorefront {
    fn backend_name(&self) -> &'static str {
        "shopify"
    }

    async fn fetch_shop(&self) -> Result<Shop, Error> {
        let data: ShopData = self.client.post_graphql(query::shop(self.api), json!({})).await?;
        Ok(data.shop.into_shop(self.shop_name.clone()))
    }

    async fn fetch_product_list(&self) -> Result<ProductList, Error> {
        let document = query::products(self.api);
        let mut products = Vec::new();
        let mut cursor: Option<String> = None;
        let mut pages = 0usize;

        loop {
            let data: ProductsData =
                self.client.post_graphql(&document, json!({ "first": query::PAGE_SIZE, "after": cursor })).await?;
            pages += 1;

            let page_info = data.products.page_info.as_ref().map(|p| (p.has_next_page, p.end_cursor.clone()));
            products.extend(data.products.into_nodes().map(Product::from));

            match page_info {
                Some((true, Some(next))) => cursor = Some(next),
                _ => break,
            }
        }

        tracing::info!(count = products.len(), pages, "Fetched Shopify products");
        Ok(ProductList::new(products))
    }

    async fn fetch_product(&self, id: &str) -> Result<Product, Error> {
        let id = id.trim();
        if id.is_empty() {
            return Err(Error::InvalidInput("product id or handle is empty".to_string()));
        }

        let data: ProductData = match product_gid(id) {
            Some(gid) => self.client.post_graphql(&query::product_by_id(self.api), json!({ "id": gid })).await?,
            None => self.client.post_graphql(&query::product_by_handle(self.api), json!({ "handle": id })).await?,
        };

        data.product.map(Product::from).ok_or_else(|| Error::NotFound(format!("Shopify product {id}")))
    }
}
