//! Remote fetcher: authenticated JSON over HTTP.
//!
//! One client per storefront. Credentials travel only in headers, so the
//! request URLs that get logged never contain secrets. Calls are one-shot:
//! there is no retry, and the only timeout is the one configured here.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use reqwest::{Method, RequestBuilder, Url, header};
use serde::{Deserialize, de::DeserializeOwned};
use stockroom_core::AppConfig;

use crate::ApiError;

/// Transport settings shared by every storefront client.
#[derive(Debug, Clone)]
pub struct HttpSettings {
    pub timeout: Duration,
    pub user_agent: String,
}

impl Default for HttpSettings {
    fn default() -> Self {
        Self { timeout: Duration::from_millis(20_000), user_agent: "stockroom/0.1".to_string() }
    }
}

impl HttpSettings {
    pub fn from_config(config: &AppConfig) -> Self {
        Self { timeout: config.timeout(), user_agent: config.user_agent.clone() }
    }
}

/// How a storefront authenticates requests.
#[derive(Clone)]
pub enum Auth {
    /// Etsy Open API v3: `x-api-key` plus an OAuth2 bearer token.
    EtsyKey { api_key: String, access_token: String },
    /// Shopify: the token goes in a storefront- or admin-specific header.
    ShopifyToken { header: &'static str, token: String },
    /// HTTP Basic, used by the legacy Ravelry API.
    Basic { username: String, password: String },
}

impl Auth {
    fn apply(&self, builder: RequestBuilder) -> RequestBuilder {
        match self {
            Auth::EtsyKey { api_key, access_token } => {
                builder.header("x-api-key", api_key).bearer_auth(access_token)
            }
            Auth::ShopifyToken { header, token } => builder.header(*header, token),
            Auth::Basic { username, password } => builder.basic_auth(username, Some(password)),
        }
    }

    /// Loggable description with secrets left out.
    fn label(&self) -> String {
        match self {
            Auth::EtsyKey { .. } => "etsy-api-key".to_string(),
            Auth::ShopifyToken { header, .. } => (*header).to_string(),
            Auth::Basic { username, .. } => format!("basic:{username}"),
        }
    }
}

impl fmt::Debug for Auth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Auth({})", self.label())
    }
}

#[derive(Deserialize)]
struct GraphQlResponse<T> {
    data: Option<T>,
    #[serde(default)]
    errors: Vec<GraphQlErrorMessage>,
}

#[derive(Deserialize)]
struct GraphQlErrorMessage {
    message: String,
}

/// Authenticated JSON client for one storefront API.
#[derive(Debug, Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: Url,
    auth: Arc<Auth>,
}

impl ApiClient {
    /// Create a client rooted at `base_url`.
    ///
    /// Relative paths passed to [`ApiClient::get_json`] are joined onto the
    /// base, so a REST base should end with `/`.
    pub fn new(base_url: &str, auth: Auth, settings: &HttpSettings) -> Result<Self, ApiError> {
        let base_url = Url::parse(base_url).map_err(|e| ApiError::InvalidUrl(format!("{base_url}: {e}")))?;

        let http = reqwest::Client::builder()
            .timeout(settings.timeout)
            .user_agent(&settings.user_agent)
            .build()
            .map_err(|e| ApiError::Network(Arc::new(e)))?;

        Ok(Self { http, base_url, auth: Arc::new(auth) })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Join `path` onto the base URL and append the parameters that are set.
    pub fn url_for(&self, path: &str, params: &[(&str, Option<String>)]) -> Result<Url, ApiError> {
        let mut url = self
            .base_url
            .join(path.trim_start_matches('/'))
            .map_err(|e| ApiError::InvalidUrl(format!("{path}: {e}")))?;

        if params.iter().any(|(_, value)| value.is_some()) {
            let mut query = url.query_pairs_mut();
            for (name, value) in params {
                if let Some(value) = value {
                    query.append_pair(name, value);
                }
            }
        }
        Ok(url)
    }

    /// GET `path` and decode the JSON body.
    ///
    /// # Errors
    ///
    /// `ApiError::Http` on a non-2xx status, `Timeout`/`Network` on transport
    /// failure, `Parse` if the body is not the expected JSON.
    pub async fn get_json<T: DeserializeOwned>(
        &self, path: &str, params: &[(&str, Option<String>)],
    ) -> Result<T, ApiError> {
        let url = self.url_for(path, params)?;
        tracing::debug!(url = %url, auth = %self.auth.label(), "GET storefront API");

        let bytes = self.send(self.request(Method::GET, url)).await?;
        serde_json::from_slice(&bytes).map_err(|e| ApiError::Parse(e.to_string()))
    }

    /// POST a GraphQL query to the base URL and decode `data`.
    ///
    /// # Errors
    ///
    /// As [`ApiClient::get_json`], plus `ApiError::GraphQl` when the response
    /// carries a non-empty `errors` array.
    pub async fn post_graphql<T: DeserializeOwned>(
        &self, query: &str, variables: serde_json::Value,
    ) -> Result<T, ApiError> {
        tracing::debug!(url = %self.base_url, auth = %self.auth.label(), "POST storefront GraphQL");

        let body = serde_json::json!({ "query": query, "variables": variables });
        let bytes = self.send(self.request(Method::POST, self.base_url.clone()).json(&body)).await?;
        decode_graphql(&bytes)
    }

    fn request(&self, method: Method, url: Url) -> RequestBuilder {
        self.auth.apply(self.http.request(method, url).header(header::ACCEPT, "application/json"))
    }

    async fn send(&self, builder: RequestBuilder) -> Result<Vec<u8>, ApiError> {
        let response = builder.send().await?;
        let status = response.status();
        tracing::debug!("storefront API response status: {}", status);

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::warn!(status = status.as_u16(), body = %body, "storefront API error");
            return Err(ApiError::Http { status: status.as_u16(), body });
        }

        Ok(response.bytes().await?.to_vec())
    }
}

fn decode_graphql<T: DeserializeOwned>(bytes: &[u8]) -> Result<T, ApiError> {
    let response: GraphQlResponse<T> = serde_json::from_slice(bytes).map_err(|e| ApiError::Parse(e.to_string()))?;

    if !response.errors.is_empty() {
        let messages: Vec<String> = response.errors.into_iter().map(|e| e.message).collect();
        return Err(ApiError::GraphQl(messages.join("; ")));
    }

    response.data.ok_or_else(|| ApiError::Parse("GraphQL response has no data".to_string()))
}

/// Make sure a REST base URL ends with `/` so relative paths join under it.
pub(crate) fn with_trailing_slash(base: &str) -> String {
    if base.ends_with('/') { base.to_string() } else { format!("{base}/") }
}
