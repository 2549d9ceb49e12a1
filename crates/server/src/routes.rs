//! Route handlers.
//!
//! Cached reads carry an `x-cache` header: `hit` for a fresh entry, `miss`
//! when the storefront was called, `stale` for an expired entry served after
//! a failed refetch.

use std::collections::BTreeMap;

use axum::Json;
use axum::extract::{Path, State};
use axum::response::IntoResponse;
use serde::Serialize;
use stockroom_core::model::{ListingReviews, Product, ReviewsSummary, Shop, TagCount};
use stockroom_core::{CacheResult, CacheSource};

use crate::error::AppError;
use crate::state::AppState;

type ApiResult<T> = Result<T, AppError>;

pub const CACHE_HEADER: &str = "x-cache";

fn cache_label(source: CacheSource) -> &'static str {
    match source {
        CacheSource::Cache => "hit",
        CacheSource::Network => "miss",
        CacheSource::Stale => "stale",
    }
}

fn cached<T: Serialize>(result: CacheResult<T>) -> impl IntoResponse {
    ([(CACHE_HEADER, cache_label(result.source))], Json(result.data))
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HomePage {
    pub shop: Shop,
    pub product_count: usize,
}

/// `GET /`
pub async fn home(State(state): State<AppState>) -> ApiResult<Json<HomePage>> {
    let shop = state.catalog.shop().await?.data;
    let product_count = state.catalog.products().await?.data.len();
    Ok(Json(HomePage { shop, product_count }))
}

/// `GET /products`, sorted by title.
pub async fn products(State(state): State<AppState>) -> ApiResult<impl IntoResponse> {
    let mut result = state.catalog.products().await?;
    result.data = result.data.sorted_by_title();
    Ok(cached(result))
}

/// `GET /product/{id}` and `GET /pattern/{id}`. Accepts an id or a handle.
pub async fn product(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult<impl IntoResponse> {
    Ok(cached::<Product>(state.catalog.product(&id).await?))
}

/// `GET /tags`
pub async fn tags(State(state): State<AppState>) -> ApiResult<Json<Vec<TagCount>>> {
    Ok(Json(state.catalog.tags().await?))
}

/// `GET /tags/{tag}`
pub async fn tagged(State(state): State<AppState>, Path(tag): Path<String>) -> ApiResult<Json<Vec<Product>>> {
    Ok(Json(state.catalog.products_with_tag(&tag).await?))
}

/// `GET /api/refresh-products`
pub async fn refresh_products(State(state): State<AppState>) -> ApiResult<&'static str> {
    let list = state.catalog.refresh_products().await?;
    tracing::info!(count = list.len(), "Product list refreshed");
    Ok("ok")
}

/// `GET /api/refresh-shop`
pub async fn refresh_shop(State(state): State<AppState>) -> ApiResult<&'static str> {
    state.catalog.refresh_shop().await?;
    Ok("ok")
}

/// `GET /api/reviews`
pub async fn all_reviews(State(state): State<AppState>) -> ApiResult<Json<BTreeMap<String, ListingReviews>>> {
    Ok(Json(state.catalog.all_reviews().await?))
}

/// `GET /api/reviews/summary`
pub async fn reviews_summary(State(state): State<AppState>) -> ApiResult<Json<ReviewsSummary>> {
    Ok(Json(state.catalog.reviews_summary().await?))
}

/// `GET /api/reviews/{listing_id}`
pub async fn listing_reviews(
    State(state): State<AppState>, Path(listing_id): Path<String>,
) -> ApiResult<Json<ListingReviews>> {
    Ok(Json(state.catalog.reviews(&listing_id).await?))
}
