//! Legacy Ravelry storefront.
//!
//! The designer profile stands in for the shop, the designer's store products
//! form the listing, and product details are the patterns behind them.
//! Authentication is HTTP Basic with a read-only API key pair.

pub mod response;

use async_trait::async_trait;
use stockroom_core::config::RavelryConfig;
use stockroom_core::model::{Product, ProductList, Shop};
use stockroom_core::{AppConfig, EntityKind, Error};

use crate::http::{ApiClient, Auth, HttpSettings, with_trailing_slash};
use crate::{ApiError, Storefront};
use response::{DesignerResponse, PatternResponse, StoreProductsResponse};

#[derive(Debug, Clone)]
pub struct RavelryStorefront {
    client: ApiClient,
    store_id: String,
    designer_id: String,
    designer_name: Option<String>,
}

impl RavelryStorefront {
    /// # Errors
    ///
    /// Returns `ApiError::MissingCredential` if API_KEY, API_PASSWORD,
    /// STORE_ID or DESIGNER_ID is missing.
    pub fn new(ravelry: &RavelryConfig, settings: &HttpSettings) -> Result<Self, ApiError> {
        let (username, password) = ravelry.require_basic_auth()?;
        let store_id = ravelry.require_store_id()?.to_string();
        let designer_id = ravelry.require_designer_id()?.to_string();

        let auth = Auth::Basic { username: username.to_string(), password: password.to_string() };
        let client = ApiClient::new(&with_trailing_slash(&ravelry.base_url), auth, settings)?;
        let designer_name = ravelry.designer_name.clone().filter(|n| !n.trim().is_empty());

        Ok(Self { client, store_id, designer_id, designer_name })
    }

    /// # Errors
    ///
    /// Returns `Error::Config` if a credential is missing.
    pub fn from_config(config: &AppConfig) -> Result<Self, Error> {
        Ok(Self::new(&config.ravelry, &HttpSettings::from_config(config))?)
    }
}

#[async_trait]
impl Storefront for RavelryStorefront {
    fn backend_name(&self) -> &'static str {
        "ravelry"
    }

    fn product_kind(&self) -> EntityKind {
        EntityKind::Pattern
    }

    async fn fetch_shop(&self) -> Result<Shop, Error> {
        let designer: DesignerResponse = self
            .client
            .get_json(
                &format!("designers/{}.json", self.designer_id),
                &[("include", Some("featured_bundles".into()))],
            )
            .await?;
        Ok(designer.into_shop(self.designer_name.clone()))
    }

    async fn fetch_product_list(&self) -> Result<ProductList, Error> {
        let store: StoreProductsResponse =
            self.client.get_json(&format!("stores/{}/products.json", self.store_id), &[]).await?;

        tracing::info!(count = store.products.len(), store_id = %self.store_id, "Fetched Ravelry store products");
        Ok(ProductList::new(store.products.into_iter().map(Product::from).collect()))
    }

    async fn fetch_product(&self, id: &str) -> Result<Product, Error> {
        let id = id.trim();
        if id.is_empty() || !id.bytes().all(|b| b.is_ascii_digit()) {
            return Err(Error::InvalidInput(format!("Ravelry pattern ids are numeric, got {id:?}")));
        }

        let response: PatternResponse = self.client.get_json(&format!("patterns/{id}.json"), &[]).await?;
        Ok(response.pattern.into())
    }
}
