use axum::Router;
use axum::routing::get;
use tower_http::trace::TraceLayer;

use crate::routes;
use crate::state::AppState;

/// Create the application router with all routes and middleware.
pub fn create_app(state: AppState) -> Router {
    let api_routes = Router::new()
        .route("/refresh-products", get(routes::refresh_products))
        .route("/refresh-shop", get(routes::refresh_shop))
        .route("/reviews", get(routes::all_reviews))
        .route("/reviews/summary", get(routes::reviews_summary))
        .route("/reviews/{listing_id}", get(routes::listing_reviews));

    Router::new()
        .route("/", get(routes::home))
        .route("/products", get(routes::products))
        .route("/product/{id}", get(routes::product))
        .route("/pattern/{id}", get(routes::product))
        .route("/tags", get(routes::tags))
        .route("/tags/{tag}", get(routes::tagged))
        .nest("/api", api_routes)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    use async_trait::async_trait;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use http_body_util::BodyExt;
    use stockroom_client::{Catalog, ReviewBatching, Storefront};
    use stockroom_core::model::{Product, ProductList, Review, Shop};
    use stockroom_core::{CacheKey, CacheLayer, Error, FileStore};
    use tower::ServiceExt;

    #[derive(Default)]
    struct FakeStorefront {
        product_calls: AtomicUsize,
        reviews_supported: bool,
    }

    fn product(id: &str, title: &str, tags: &[&str]) -> Product {
        Product {
            id: id.to_string(),
            title: title.to_string(),
            handle: title.to_lowercase().replace(' ', "-"),
            tags: tags.iter().map(|t| t.to_string()).collect(),
            ..Default::default()
        }
    }

    #[async_trait]
    impl Storefront for FakeStorefront {
        fn backend_name(&self) -> &'static str {
            "fake"
        }

        async fn fetch_shop(&self) -> Result<Shop, Error> {
            Ok(Shop { id: "42".into(), name: "WoolWorks".into(), ..Default::default() })
        }

        async fn fetch_product_list(&self) -> Result<ProductList, Error> {
            Ok(ProductList::new(vec![product("2", "red scarf", &["wool"]), product("1", "Blue Hat", &["hat", "wool"])]))
        }

        async fn fetch_product(&self, id: &str) -> Result<Product, Error> {
            self.product_calls.fetch_add(1, Ordering::SeqCst);
            match id {
                "1" => Ok(product("1", "Blue Hat", &["hat", "wool"])),
                "503" => Err(Error::RemoteApi { status: 503, body: "maintenance".into() }),
                _ => Err(Error::NotFound(format!("product {id}"))),
            }
        }

        async fn fetch_reviews(&self, _listing_id: &str) -> Result<Vec<Review>, Error> {
            if !self.reviews_supported {
                return Err(Error::Unsupported("fake does not provide listing reviews".into()));
            }
            Ok(vec![Review { id: "r1".into(), rating: 5, ..Default::default() }])
        }
    }

    async fn app_with(dir: &Path, storefront: Arc<FakeStorefront>) -> Router {
        let cache = CacheLayer::new(FileStore::open(dir, Duration::from_secs(3600)).await.unwrap());
        let batching = ReviewBatching { batch_size: 5, delay: Duration::ZERO };
        create_app(AppState::new(Catalog::new(storefront, cache, batching)))
    }

    async fn get(app: &Router, uri: &str) -> (StatusCode, Option<String>, Vec<u8>) {
        let response = app.clone().oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap()).await.unwrap();
        let status = response.status();
        let cache = response.headers().get(routes::CACHE_HEADER).map(|v| v.to_str().unwrap().to_string());
        let body = response.into_body().collect().await.unwrap().to_bytes().to_vec();
        (status, cache, body)
    }

    fn json(body: &[u8]) -> serde_json::Value {
        serde_json::from_slice(body).unwrap()
    }

    #[tokio::test]
    async fn test_home_has_shop_and_count() {
        let dir = tempfile::tempdir().unwrap();
        let app = app_with(dir.path(), Arc::default()).await;

        let (status, _, body) = get(&app, "/").await;
        assert_eq!(status, StatusCode::OK);
        let body = json(&body);
        assert_eq!(body["shop"]["name"], "WoolWorks");
        assert_eq!(body["productCount"], 2);
    }

    #[tokio::test]
    async fn test_products_sorted_by_title() {
        let dir = tempfile::tempdir().unwrap();
        let app = app_with(dir.path(), Arc::default()).await;

        let (status, cache, body) = get(&app, "/products").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(cache.as_deref(), Some("miss"));
        let titles: Vec<String> =
            json(&body)["results"].as_array().unwrap().iter().map(|p| p["title"].as_str().unwrap().to_string()).collect();
        assert_eq!(titles, ["Blue Hat", "red scarf"]);

        let (_, cache, _) = get(&app, "/products").await;
        assert_eq!(cache.as_deref(), Some("hit"));
    }

    #[tokio::test]
    async fn test_product_and_pattern_routes_share_cache() {
        let dir = tempfile::tempdir().unwrap();
        let storefront = Arc::new(FakeStorefront::default());
        let app = app_with(dir.path(), Arc::clone(&storefront)).await;

        let (status, cache, body) = get(&app, "/product/1").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(cache.as_deref(), Some("miss"));
        assert_eq!(json(&body)["title"], "Blue Hat");

        let (status, cache, _) = get(&app, "/pattern/1").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(cache.as_deref(), Some("hit"));
        assert_eq!(storefront.product_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_expired_product_served_stale_when_refetch_fails() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::open(dir.path(), Duration::from_secs(3600)).await.unwrap();
        let key = CacheKey::product("503");
        store.write(&key, &product("503", "Grey Mitts", &["wool"])).await.unwrap();
        let file = std::fs::File::options().write(true).open(store.path_for(&key)).unwrap();
        file.set_modified(std::time::SystemTime::now() - Duration::from_secs(7200)).unwrap();

        let app = app_with(dir.path(), Arc::default()).await;
        let (status, cache, body) = get(&app, "/product/503").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(cache.as_deref(), Some("stale"));
        assert_eq!(json(&body)["title"], "Grey Mitts");
    }

    #[tokio::test]
    async fn test_error_statuses() {
        let dir = tempfile::tempdir().unwrap();
        let app = app_with(dir.path(), Arc::default()).await;

        let (status, _, body) = get(&app, "/product/999").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert!(json(&body)["error"].as_str().unwrap().starts_with("NOT_FOUND"));

        let (status, _, _) = get(&app, "/product/503").await;
        assert_eq!(status, StatusCode::BAD_GATEWAY);

        let (status, _, _) = get(&app, "/api/reviews/1").await;
        assert_eq!(status, StatusCode::NOT_IMPLEMENTED);
    }

    #[tokio::test]
    async fn test_tags() {
        let dir = tempfile::tempdir().unwrap();
        let app = app_with(dir.path(), Arc::default()).await;

        let (status, _, body) = get(&app, "/tags").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json(&body).as_array().unwrap().len(), 2);

        let (_, _, body) = get(&app, "/tags/hat").await;
        assert_eq!(json(&body).as_array().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_refresh_routes_answer_ok() {
        let dir = tempfile::tempdir().unwrap();
        let app = app_with(dir.path(), Arc::default()).await;

        for uri in ["/api/refresh-products", "/api/refresh-shop"] {
            let (status, _, body) = get(&app, uri).await;
            assert_eq!(status, StatusCode::OK);
            assert_eq!(body, b"ok");
        }
        assert!(dir.path().join("products.json").is_file());
        assert!(dir.path().join("shop.json").is_file());
    }

    #[tokio::test]
    async fn test_reviews_routes() {
        let dir = tempfile::tempdir().unwrap();
        let storefront = Arc::new(FakeStorefront { reviews_supported: true, ..Default::default() });
        let app = app_with(dir.path(), storefront).await;

        let (status, _, _) = get(&app, "/api/reviews").await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        get(&app, "/api/refresh-products").await;
        let (status, _, body) = get(&app, "/api/reviews").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json(&body)["1"]["totalReviews"], 1);

        let (_, _, body) = get(&app, "/api/reviews/summary").await;
        assert_eq!(json(&body)["totalProducts"], 2);

        let (_, _, body) = get(&app, "/api/reviews/2").await;
        assert_eq!(json(&body)["listingId"], "2");
    }
}
