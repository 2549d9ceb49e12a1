//! Backend strategy: one implementation per storefront API.

use std::sync::Arc;

use async_trait::async_trait;
use stockroom_core::model::{Product, ProductList, Review, Shop};
use stockroom_core::{AppConfig, BackendKind, EntityKind, Error};

use crate::etsy::EtsyStorefront;
use crate::ravelry::RavelryStorefront;
use crate::shopify::ShopifyStorefront;

/// A storefront that can produce the normalized catalog.
///
/// Implementations only talk to their API and reshape responses; caching is
/// the caller's concern.
#[async_trait]
pub trait Storefront: Send + Sync {
    /// Short name for logs, e.g. `"etsy"`.
    fn backend_name(&self) -> &'static str;

    /// Cache kind for product details. Ravelry details are patterns.
    fn product_kind(&self) -> EntityKind {
        EntityKind::Product
    }

    async fn fetch_shop(&self) -> Result<Shop, Error>;

    async fn fetch_product_list(&self) -> Result<ProductList, Error>;

    /// Fetch one product by id (or handle, where the backend supports it).
    async fn fetch_product(&self, id: &str) -> Result<Product, Error>;

    async fn fetch_reviews(&self, _listing_id: &str) -> Result<Vec<Review>, Error> {
        Err(Error::Unsupported(format!("{} does not provide listing reviews", self.backend_name())))
    }
}

/// Build the adapter selected by `config.backend`.
///
/// # Errors
///
/// Returns `Error::Config` if the backend's credentials are missing. No
/// request is made.
pub fn build_storefront(config: &AppConfig) -> Result<Arc<dyn Storefront>, Error> {
    let storefront: Arc<dyn Storefront> = match config.backend {
        BackendKind::Etsy => Arc::new(EtsyStorefront::from_config(config)?),
        BackendKind::Shopify => Arc::new(ShopifyStorefront::from_config(config)?),
        BackendKind::Ravelry => Arc::new(RavelryStorefront::from_config(config)?),
    };
    tracing::info!(backend = storefront.backend_name(), "Storefront configured");
    Ok(storefront)
}
