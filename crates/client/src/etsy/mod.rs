//! Etsy Open API v3 storefront.
//!
//! - **Endpoint**: `https://api.etsy.com/v3/application/`
//! - **Authentication**: `x-api-key` header plus an OAuth2 bearer token.
//!   The token comes from the authorization-code flow, which runs outside
//!   this crate.
//! - **Reviews**: `listings/{id}/reviews`, the only backend that has them.

pub mod response;

use async_trait::async_trait;
use stockroom_core::config::EtsyConfig;
use stockroom_core::model::{Product, ProductList, Review, Shop};
use stockroom_core::{AppConfig, Error};

use crate::http::{ApiClient, Auth, HttpSettings, with_trailing_slash};
use crate::{ApiError, Storefront};
use response::{EtsyInventory, EtsyListing, EtsyPage, EtsyReview, EtsyShop};

/// Listings per page, the API maximum.
const LISTING_LIMIT: &str = "100";
const REVIEW_LIMIT: &str = "100";

#[derive(Debug, Clone)]
pub struct EtsyStorefront {
    client: ApiClient,
    shop_id: String,
}

impl EtsyStorefront {
    /// # Errors
    ///
    /// Returns `ApiError::MissingCredential` if ETSY_API_KEY, ETSY_ACCESS_TOKEN
    /// or ETSY_SHOP_ID is missing.
    pub fn new(etsy: &EtsyConfig, settings: &HttpSettings) -> Result<Self, ApiError> {
        let api_key = etsy.require_api_key()?.to_string();
        let access_token = etsy.require_access_token()?.to_string();
        let shop_id = etsy.require_shop_id()?.to_string();

        let client = ApiClient::new(&with_trailing_slash(&etsy.base_url), Auth::EtsyKey { api_key, access_token }, settings)?;
        Ok(Self { client, shop_id })
    }

    /// # Errors
    ///
    /// Returns `Error::Config` if a credential is missing.
    pub fn from_config(config: &AppConfig) -> Result<Self, Error> {
        Ok(Self::new(&config.etsy, &HttpSettings::from_config(config))?)
    }
}

fn listing_id(id: &str) -> Result<&str, Error> {
    let id = id.trim();
    if id.is_empty() || !id.bytes().all(|b| b.is_ascii_digit()) {
        return Err(Error::InvalidInput(format!("Etsy listing ids are numeric, got {id:?}")));
    }
    Ok(id)
}

#[async_trait]
impl Storefront for EtsyStorefront {
    fn backend_name(&self) -> &'static str {
        "etsy"
    }

    async fn fetch_shop(&self) -> Result<Shop, Error> {
        let shop: EtsyShop = self.client.get_json(&format!("shops/{}", self.shop_id), &[]).await?;
        Ok(shop.into())
    }

    async fn fetch_product_list(&self) -> Result<ProductList, Error> {
        let page: EtsyPage<EtsyListing> = self
            .client
            .get_json(
                &format!("shops/{}/listings", self.shop_id),
                &[
                    ("state", Some("active".into())),
                    ("limit", Some(LISTING_LIMIT.into())),
                    ("includes", Some("Images".into())),
                ],
            )
            .await?;

        tracing::info!(count = page.results.len(), total = page.count, "Fetched Etsy listings");
        Ok(ProductList::new(page.results.into_iter().map(EtsyListing::into_list_product).collect()))
    }

    async fn fetch_product(&self, id: &str) -> Result<Product, Error> {
        let id = listing_id(id)?;
        let listing: EtsyListing = self
            .client
            .get_json(&format!("listings/{id}"), &[("includes", Some("Images,Shop,User,Translations".into()))])
            .await?;
        let inventory: EtsyInventory = self.client.get_json(&format!("listings/{id}/inventory"), &[]).await?;
        Ok(listing.into_product(inventory))
    }

    async fn fetch_reviews(&self, listing_id_raw: &str) -> Result<Vec<Review>, Error> {
        let id = listing_id(listing_id_raw)?;
        let page: EtsyPage<EtsyReview> =
            self.client.get_json(&format!("listings/{id}/reviews"), &[("limit", Some(REVIEW_LIMIT.into()))]).await?;
        Ok(page.results.into_iter().map(Review::from).collect())
    }
}
