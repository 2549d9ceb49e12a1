//! Catalog orchestrator: storefront fetches behind the file cache.
//!
//! Every read goes through [`CacheLayer::fetch_or_serve`], so a fresh entry
//! never reaches the storefront. Refresh operations bypass the freshness
//! check and replace the entry wholesale.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use stockroom_core::model::{ListingReviews, Product, ProductList, ReviewsSummary, Shop, TagCount};
use stockroom_core::{AppConfig, CacheKey, CacheLayer, CacheResult, Error, FileStore};
use tokio::task::JoinSet;

use crate::Storefront;
use crate::storefront::build_storefront;

/// Pacing for bulk review fetches.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReviewBatching {
    /// Listings fetched concurrently per batch.
    pub batch_size: usize,
    /// Pause between batches. Not applied after the last one.
    pub delay: Duration,
}

impl Default for ReviewBatching {
    fn default() -> Self {
        Self { batch_size: 5, delay: Duration::from_secs(1) }
    }
}

impl ReviewBatching {
    pub fn from_config(config: &AppConfig) -> Self {
        Self { batch_size: config.review_batch_size, delay: config.review_batch_delay() }
    }
}

/// A product whose detail refresh failed during [`Catalog::sync_all`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SyncFailure {
    pub id: String,
    pub error: String,
}

/// Outcome of [`Catalog::sync_all`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SyncReport {
    /// Products in the refreshed list.
    pub listed: usize,
    pub succeeded: usize,
    pub failed: Vec<SyncFailure>,
}

impl SyncReport {
    pub fn is_complete(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Cache-aside access to one storefront's catalog.
#[derive(Clone)]
pub struct Catalog {
    storefront: Arc<dyn Storefront>,
    cache: CacheLayer,
    batching: ReviewBatching,
}

impl Catalog {
    pub fn new(storefront: Arc<dyn Storefront>, cache: CacheLayer, batching: ReviewBatching) -> Self {
        Self { storefront, cache, batching }
    }

    /// Build the configured storefront and open the cache under `data_dir`.
    ///
    /// # Errors
    ///
    /// Returns `Error::Config` if credentials are missing, or
    /// `Error::CacheWrite` if the data directory cannot be created.
    pub async fn from_config(config: &AppConfig) -> Result<Self, Error> {
        let storefront = build_storefront(config)?;
        let store = FileStore::open(&config.data_dir, config.cache_ttl()).await?;
        let cache = CacheLayer::new(store).with_serve_stale_on_error(config.serve_stale_on_error);
        Ok(Self::new(storefront, cache, ReviewBatching::from_config(config)))
    }

    pub fn storefront(&self) -> &dyn Storefront {
        self.storefront.as_ref()
    }

    pub fn cache(&self) -> &CacheLayer {
        &self.cache
    }

    /// # Errors
    ///
    /// Returns the storefront error when there is no entry to fall back on.
    pub async fn shop(&self) -> Result<CacheResult<Shop>, Error> {
        self.cache.fetch_or_serve(&CacheKey::shop(), || self.storefront.fetch_shop()).await
    }

    /// # Errors
    ///
    /// Returns the storefront error when there is no entry to fall back on.
    pub async fn products(&self) -> Result<CacheResult<ProductList>, Error> {
        self.cache.fetch_or_serve(&CacheKey::product_list(), || self.storefront.fetch_product_list()).await
    }

    /// Product detail by id or handle.
    ///
    /// A handle is resolved to its id through the cached product list, so
    /// both spellings share one cache entry. Ravelry details are stored as
    /// patterns.
    ///
    /// # Errors
    ///
    /// `Error::InvalidInput` for an empty id, otherwise as [`Catalog::shop`].
    pub async fn product(&self, id_or_handle: &str) -> Result<CacheResult<Product>, Error> {
        let id = self.resolve_id(id_or_handle).await?;
        let key = CacheKey::for_kind(self.storefront.product_kind(), id.as_str());
        self.cache.fetch_or_serve(&key, || self.storefront.fetch_product(&id)).await
    }

    /// # Errors
    ///
    /// Returns the storefront error or `Error::CacheWrite`; never serves stale.
    pub async fn refresh_shop(&self) -> Result<Shop, Error> {
        Ok(self.cache.refresh(&CacheKey::shop(), || self.storefront.fetch_shop()).await?.data)
    }

    /// # Errors
    ///
    /// Returns the storefront error or `Error::CacheWrite`; never serves stale.
    pub async fn refresh_products(&self) -> Result<ProductList, Error> {
        Ok(self.cache.refresh(&CacheKey::product_list(), || self.storefront.fetch_product_list()).await?.data)
    }

    /// Tag index over the product list.
    ///
    /// # Errors
    ///
    /// As [`Catalog::products`].
    pub async fn tags(&self) -> Result<Vec<TagCount>, Error> {
        Ok(self.products().await?.data.tags())
    }

    /// # Errors
    ///
    /// As [`Catalog::products`].
    pub async fn products_with_tag(&self, tag: &str) -> Result<Vec<Product>, Error> {
        Ok(self.products().await?.data.with_tag(tag))
    }

    /// Reviews for one listing.
    ///
    /// An upstream failure with no usable entry yields an empty record with
    /// `error` set instead of an error, so one bad listing does not sink a
    /// bulk fetch. Failed records are not cached.
    ///
    /// # Errors
    ///
    /// `Error::Unsupported` if the backend has no reviews, `Error::InvalidInput`
    /// for a malformed id, or a cache write failure.
    pub async fn reviews(&self, listing_id: &str) -> Result<ListingReviews, Error> {
        let listing_id = listing_id.trim();
        if listing_id.is_empty() {
            return Err(Error::InvalidInput("listing id is empty".to_string()));
        }

        let fetched = self
            .cache
            .fetch_or_serve(&CacheKey::reviews(listing_id), || async {
                let reviews = self.storefront.fetch_reviews(listing_id).await?;
                Ok::<_, Error>(ListingReviews::new(listing_id, reviews))
            })
            .await;

        match fetched {
            Ok(result) => Ok(result.data),
            Err(e) if e.is_upstream() || matches!(e, Error::NotFound(_)) => {
                tracing::warn!(listing_id, error = %e, "Review fetch failed");
                Ok(ListingReviews::failed(listing_id, e))
            }
            Err(e) => Err(e),
        }
    }

    /// Reviews for every listing in the cached product list, keyed by listing id.
    ///
    /// Listings are fetched `batch_size` at a time with a pause between batches.
    ///
    /// # Errors
    ///
    /// `Error::NotFound` if the product list has never been fetched, or the
    /// first hard error from [`Catalog::reviews`].
    pub async fn all_reviews(&self) -> Result<BTreeMap<String, ListingReviews>, Error> {
        let list: ProductList = self
            .cache
            .store()
            .read(&CacheKey::product_list())
            .await?
            .ok_or_else(|| Error::NotFound("product list has not been fetched yet; run a sync first".to_string()))?;

        let ids: Vec<String> = list.results.into_iter().map(|p| p.id).collect();
        let batch_size = self.batching.batch_size.max(1);
        let batch_count = ids.len().div_ceil(batch_size);
        tracing::info!(listings = ids.len(), batches = batch_count, batch_size, "Fetching reviews");

        let mut all = BTreeMap::new();
        for (index, batch) in ids.chunks(batch_size).enumerate() {
            let mut join_set = JoinSet::new();
            for id in batch {
                let catalog = self.clone();
                let id = id.clone();
                join_set.spawn(async move { catalog.reviews(&id).await });
            }

            while let Some(joined) = join_set.join_next().await {
                let listing = joined.map_err(|e| Error::Internal(e.to_string()))??;
                all.insert(listing.listing_id.clone(), listing);
            }

            tracing::debug!(batch = index + 1, of = batch_count, "Review batch done");
            if index + 1 < batch_count && !self.batching.delay.is_zero() {
                tokio::time::sleep(self.batching.delay).await;
            }
        }

        Ok(all)
    }

    /// # Errors
    ///
    /// As [`Catalog::all_reviews`].
    pub async fn reviews_summary(&self) -> Result<ReviewsSummary, Error> {
        let all = self.all_reviews().await?;
        Ok(ReviewsSummary::from_listings(all.values()))
    }

    /// Refresh the product list, then every product detail one at a time.
    ///
    /// Detail failures are collected in the report rather than aborting the sync.
    ///
    /// # Errors
    ///
    /// Returns the error if the product list itself cannot be refreshed.
    pub async fn sync_all(&self, delay: Duration) -> Result<SyncReport, Error> {
        let list = self.refresh_products().await?;
        let kind = self.storefront.product_kind();
        let mut report = SyncReport { listed: list.len(), ..Default::default() };

        for (index, product) in list.results.iter().enumerate() {
            let key = CacheKey::for_kind(kind, product.id.as_str());
            match self.cache.refresh(&key, || self.storefront.fetch_product(&product.id)).await {
                Ok(_) => report.succeeded += 1,
                Err(e) => {
                    tracing::warn!(id = %product.id, error = %e, "Product refresh failed");
                    report.failed.push(SyncFailure { id: product.id.clone(), error: e.to_string() });
                }
            }

            if index + 1 < list.len() && !delay.is_zero() {
                tokio::time::sleep(delay).await;
            }
        }

        tracing::info!(listed = report.listed, succeeded = report.succeeded, failed = report.failed.len(), "Sync done");
        Ok(report)
    }

    /// Map a handle to a product id using whatever product list is on disk.
    async fn resolve_id(&self, id_or_handle: &str) -> Result<String, Error> {
        let id_or_handle = id_or_handle.trim();
        if id_or_handle.is_empty() {
            return Err(Error::InvalidInput("product id is empty".to_string()));
        }

        let list = match self.cache.store().read::<ProductList>(&CacheKey::product_list()).await {
            Ok(list) => list,
            Err(e) => {
                tracing::warn!(error = %e, "Unreadable product list, using id as given");
                None
            }
        };

        Ok(list
            .as_ref()
            .and_then(|list| list.find(id_or_handle))
            .map(|product| product.id.clone())
            .unwrap_or_else(|| id_or_handle.to_string()))
    }
}
