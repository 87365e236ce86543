//! Mercado Libre REST API client.
//!
//! Provides typed access to the order, pack, listing, question and price
//! resources used by the dashboard.

use std::sync::Arc;

use meli_pulse_core::types::lenient;
use meli_pulse_core::{
    ItemId, ItemPrices, Order, OrderId, Pack, PackId, Product, Question, QuestionFilter,
    QuestionId,
};
use secrecy::ExposeSecret;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use tokio::sync::RwLock;
use tracing::instrument;
use url::Url;

use super::auth::{AccessToken, request_token};
use super::{MarketplaceApi, MarketplaceError, OrderQuery, Page};
use crate::config::MarketplaceConfig;

/// Timestamp format accepted by the order search date filters.
const DATE_FILTER_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.3f%:z";

/// Mercado Libre REST API client.
///
/// # Authentication
///
/// Uses application tokens from the client-credentials grant. Tokens are
/// cached in memory and requested again when they expire or the API rejects
/// them.
#[derive(Clone)]
pub struct MercadoLibreClient {
    inner: Arc<MercadoLibreClientInner>,
}

struct MercadoLibreClientInner {
    client: reqwest::Client,
    config: MarketplaceConfig,
    /// In-memory token cache
    token: RwLock<Option<AccessToken>>,
}

/// Paging block of a search response.
#[derive(Debug, Default, Deserialize)]
struct Paging {
    #[serde(default, deserialize_with = "lenient::value")]
    total: Option<u64>,
}

/// Response from `/orders/search` and `/users/{id}/items/search`.
#[derive(Deserialize)]
#[serde(bound = "T: DeserializeOwned")]
struct SearchResponse<T> {
    #[serde(default, deserialize_with = "lenient::list")]
    results: Vec<T>,
    #[serde(default, deserialize_with = "lenient::value")]
    paging: Paging,
}

/// Response from `/my/received_questions/search`.
#[derive(Deserialize)]
struct QuestionSearchResponse {
    #[serde(default, deserialize_with = "lenient::list")]
    questions: Vec<Question>,
    #[serde(default, deserialize_with = "lenient::value")]
    total: Option<u64>,
}

impl<T> From<SearchResponse<T>> for Page<T> {
    fn from(response: SearchResponse<T>) -> Self {
        Self {
            items: response.results,
            total: response.paging.total,
        }
    }
}

impl MercadoLibreClient {
    /// Create a new client.
    ///
    /// # Errors
    ///
    /// Returns `MarketplaceError::Http` if the HTTP client cannot be built.
    pub fn new(config: &MarketplaceConfig) -> Result<Self, MarketplaceError> {
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()?;

        Ok(Self {
            inner: Arc::new(MercadoLibreClientInner {
                client,
                config: config.clone(),
                token: RwLock::new(None),
            }),
        })
    }

    // =========================================================================
    // Authentication
    // =========================================================================

    /// Get a valid access token, requesting a new one when needed.
    async fn access_token(&self) -> Result<String, MarketplaceError> {
        if let Some(token) = self.inner.token.read().await.as_ref()
            && !token.is_expired()
        {
            return Ok(token.access_token.expose_secret().to_string());
        }

        let mut cached = self.inner.token.write().await;

        // Another task may have refreshed while we waited for the lock
        if let Some(token) = cached.as_ref()
            && !token.is_expired()
        {
            return Ok(token.access_token.expose_secret().to_string());
        }

        let config = &self.inner.config;
        let token = request_token(
            &self.inner.client,
            &config.base_url,
            &config.client_id,
            config.client_secret(),
        )
        .await?;
        let access_token = token.access_token.expose_secret().to_string();
        *cached = Some(token);

        Ok(access_token)
    }

    /// Drop the cached token so the next request obtains a fresh one.
    async fn clear_token(&self) {
        *self.inner.token.write().await = None;
    }

    // =========================================================================
    // Request Execution
    // =========================================================================

    fn url(&self, path: &str) -> Result<Url, MarketplaceError> {
        self.inner
            .config
            .base_url
            .join(path.trim_start_matches('/'))
            .map_err(|e| MarketplaceError::Parse(format!("Invalid request path {path}: {e}")))
    }

    /// Send an authorized request, retrying once with a new token on 401.
    async fn send<F>(&self, build: F) -> Result<reqwest::Response, MarketplaceError>
    where
        F: Fn(&reqwest::Client) -> reqwest::RequestBuilder + Send + Sync,
    {
        let mut retried = false;

        loop {
            let token = self.access_token().await?;
            let response = build(&self.inner.client)
                .bearer_auth(token)
                .header("Accept", "application/json")
                .send()
                .await?;

            if response.status() == reqwest::StatusCode::UNAUTHORIZED && !retried {
                tracing::debug!("Access token rejected, requesting a new one");
                self.clear_token().await;
                retried = true;
                continue;
            }

            return Ok(response);
        }
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<T, MarketplaceError> {
        let url = self.url(path)?;
        let response = self
            .send(|client| client.get(url.clone()).query(query))
            .await?;
        Self::handle_response(response).await
    }

    /// Handle API response, parsing JSON or returning error.
    async fn handle_response<T: DeserializeOwned>(
        response: reqwest::Response,
    ) -> Result<T, MarketplaceError> {
        let status = response.status();

        if status.is_success() {
            return response
                .json()
                .await
                .map_err(|e| MarketplaceError::Parse(format!("Failed to parse response: {e}")));
        }

        Err(Self::parse_error(response).await)
    }

    /// Parse error response from the API.
    async fn parse_error(response: reqwest::Response) -> MarketplaceError {
        let status = response.status().as_u16();

        // Check for rate limiting
        if status == 429 {
            let retry_after = response
                .headers()
                .get("Retry-After")
                .and_then(|v| v.to_str().ok())
                .and_then(|s| s.parse().ok())
                .unwrap_or(60);
            return MarketplaceError::RateLimited(retry_after);
        }

        // Check for unauthorized
        if status == 401 || status == 403 {
            return MarketplaceError::Unauthorized;
        }

        // Check for not found
        if status == 404 {
            return MarketplaceError::NotFound(response.url().path().to_string());
        }

        let message = response
            .text()
            .await
            .unwrap_or_else(|_| "Unknown error".to_string());

        MarketplaceError::Api { status, message }
    }

    // =========================================================================
    // Write Operations
    // =========================================================================

    /// Post an answer to a buyer question.
    ///
    /// # Errors
    ///
    /// Returns `MarketplaceError` if the API rejects the answer.
    #[instrument(skip(self, text), fields(question_id = %question_id))]
    pub async fn answer_question(
        &self,
        question_id: &QuestionId,
        text: &str,
    ) -> Result<(), MarketplaceError> {
        let url = self.url("/answers")?;
        // The API expects a numeric question_id
        let id = question_id
            .as_str()
            .parse::<u64>()
            .map_or_else(|_| serde_json::Value::from(question_id.as_str()), serde_json::Value::from);
        let body = serde_json::json!({ "question_id": id, "text": text });

        let response = self
            .send(|client| client.post(url.clone()).json(&body))
            .await?;

        if response.status().is_success() {
            tracing::info!("Question answered");
            Ok(())
        } else {
            Err(Self::parse_error(response).await)
        }
    }
}

impl MarketplaceApi for MercadoLibreClient {
    #[instrument(skip(self, query), fields(seller_id = %query.seller_id, status = %query.status))]
    async fn list_orders(
        &self,
        query: &OrderQuery<'_>,
        offset: u64,
        limit: u32,
    ) -> Result<Page<Order>, MarketplaceError> {
        let params = [
            ("seller", query.seller_id.to_string()),
            ("order.status", query.status.as_str().to_string()),
            (
                "order.date_created.from",
                query.date_from.format(DATE_FILTER_FORMAT).to_string(),
            ),
            (
                "order.date_created.to",
                query.date_to.format(DATE_FILTER_FORMAT).to_string(),
            ),
            ("offset", offset.to_string()),
            ("limit", limit.to_string()),
            ("sort", "date_desc".to_string()),
        ];

        let response: SearchResponse<Order> = self.get_json("/orders/search", &params).await?;
        Ok(response.into())
    }

    #[instrument(skip(self), fields(order_id = %order_id))]
    async fn get_order(&self, order_id: &OrderId) -> Result<Order, MarketplaceError> {
        self.get_json(&format!("/orders/{order_id}"), &[]).await
    }

    #[instrument(skip(self), fields(pack_id = %pack_id))]
    async fn get_pack(&self, pack_id: &PackId) -> Result<Pack, MarketplaceError> {
        self.get_json(&format!("/packs/{pack_id}"), &[]).await
    }

    #[instrument(skip(self), fields(item_id = %item_id))]
    async fn get_item(&self, item_id: &ItemId) -> Result<Product, MarketplaceError> {
        self.get_json(&format!("/items/{item_id}"), &[]).await
    }

    #[instrument(skip(self))]
    async fn list_questions(
        &self,
        seller_id: &str,
        filter: Option<QuestionFilter>,
        offset: u64,
        limit: u32,
    ) -> Result<Page<Question>, MarketplaceError> {
        let mut params = vec![
            ("seller_id", seller_id.to_string()),
            ("offset", offset.to_string()),
            ("limit", limit.to_string()),
            ("sort_fields", "date_created".to_string()),
            ("sort_types", "DESC".to_string()),
        ];
        if let Some(filter) = filter {
            params.push(("status", filter.as_str().to_string()));
        }

        let response: QuestionSearchResponse = self
            .get_json("/my/received_questions/search", &params)
            .await?;

        Ok(Page {
            items: response.questions,
            total: response.total,
        })
    }

    #[instrument(skip(self), fields(item_id = %item_id))]
    async fn get_item_prices(&self, item_id: &ItemId) -> Result<ItemPrices, MarketplaceError> {
        self.get_json(&format!("/items/{item_id}/prices"), &[]).await
    }

    #[instrument(skip(self))]
    async fn list_item_ids(
        &self,
        seller_id: &str,
        offset: u64,
        limit: u32,
    ) -> Result<Page<ItemId>, MarketplaceError> {
        let params = [
            ("offset", offset.to_string()),
            ("limit", limit.to_string()),
        ];

        let response: SearchResponse<ItemId> = self
            .get_json(&format!("/users/{seller_id}/items/search"), &params)
            .await?;
        Ok(response.into())
    }
}

impl std::fmt::Debug for MercadoLibreClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MercadoLibreClient")
            .field("base_url", &self.inner.config.base_url.as_str())
            .field("seller_id", &self.inner.config.seller_id)
            .finish_non_exhaustive()
    }
}
