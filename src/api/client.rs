use std::collections::BTreeMap;
use std::future::Future;
use std::marker::PhantomData;
use std::sync::Arc;

use reqwest::header::{HeaderMap, HeaderValue, CONTENT_TYPE};
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::api::models::Page;
use crate::api::resource::Resource;
use crate::auth::AuthSession;
use crate::config::Config;
use crate::error::{AppError, AppResult};

/// Query for a list endpoint. `page` and `search` are always sent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListQuery {
    pub page: u64,
    pub search: String,
    pub filters: Vec<(String, String)>,
}

impl ListQuery {
    #[must_use]
    pub fn new(page: u64, search: impl Into<String>) -> Self {
        Self {
            page,
            search: search.into(),
            filters: Vec::new(),
        }
    }

    /// Adds an extra query parameter; empty values are not sent.
    #[must_use]
    pub fn with_filter(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        let value = value.into();
        if !value.is_empty() {
            self.filters.push((name.into(), value));
        }
        self
    }

    #[must_use]
    pub fn filter(&self, name: &str) -> Option<&str> {
        self.filters
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }

    fn params(&self) -> Vec<(String, String)> {
        let mut params = vec![
            ("page".to_string(), self.page.to_string()),
            ("search".to_string(), self.search.clone()),
        ];
        params.extend(self.filters.iter().cloned());
        params
    }
}

/// Operations on one resource kind of the remote API.
pub trait ResourceApi<T: Resource>: Send + Sync {
    /// Session used to authenticate requests and to redirect on 401.
    fn session(&self) -> &AuthSession;

    fn list(&self, query: &ListQuery) -> impl Future<Output = AppResult<Page<T>>> + Send;

    fn get(&self, id: i64) -> impl Future<Output = AppResult<T>> + Send;

    fn create<P: Serialize + Sync>(
        &self,
        payload: &P,
    ) -> impl Future<Output = AppResult<T>> + Send;

    fn update(&self, id: i64, record: &T) -> impl Future<Output = AppResult<T>> + Send;

    fn patch<P: Serialize + Sync>(
        &self,
        id: i64,
        partial: &P,
    ) -> impl Future<Output = AppResult<T>> + Send;
}

/// Build the HTTP client shared by every resource and auth call.
///
/// # Errors
///
/// Returns `AppError::Network` if the TLS backend cannot be initialised.
pub fn build_http_client(config: &Config) -> AppResult<Client> {
    let mut headers = HeaderMap::new();
    headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    if config.api_skip_ngrok_warning {
        headers.insert(
            "ngrok-skip-browser-warning",
            HeaderValue::from_static("any-value"),
        );
    }

    Client::builder()
        .default_headers(headers)
        .timeout(config.api_timeout())
        .build()
        .map_err(|e| AppError::Network(format!("Failed to create HTTP client: {e}")))
}

/// Send a request and decode a JSON success body.
pub(crate) async fn send_json<R: DeserializeOwned>(request: RequestBuilder) -> AppResult<R> {
    let response = request
        .send()
        .await
        .map_err(|e| AppError::Network(e.to_string()))?;

    let response = check_status(response).await?;

    let text = response
        .text()
        .await
        .map_err(|e| AppError::Decode(format!("Failed to get response text: {e}")))?;

    serde_json::from_str(&text).map_err(|e| {
        tracing::error!(
            error = %e,
            body_preview = %text.chars().take(500).collect::<String>(),
            "Failed to parse response"
        );
        AppError::Decode(e.to_string())
    })
}

/// Map a non-success response onto `Http` or `Validation`.
pub(crate) async fn check_status(response: Response) -> AppResult<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    Err(error_from_body(status, &body))
}

fn error_from_body(status: StatusCode, body: &str) -> AppError {
    let code = status.as_u16();
    let parsed: Option<serde_json::Value> = serde_json::from_str(body).ok();

    if let Some(detail) = parsed
        .as_ref()
        .and_then(|v| v.get("detail"))
        .and_then(serde_json::Value::as_str)
    {
        return AppError::Http {
            status: code,
            message: detail.to_string(),
        };
    }

    if status == StatusCode::BAD_REQUEST {
        if let Some(serde_json::Value::Object(map)) = parsed {
            let fields: BTreeMap<String, Vec<String>> = map
                .into_iter()
                .map(|(field, messages)| (field, field_messages(messages)))
                .collect();
            if !fields.is_empty() {
                return AppError::Validation {
                    status: code,
                    fields,
                };
            }
        }
    }

    let message = if body.is_empty() {
        status
            .canonical_reason()
            .unwrap_or("Unknown error")
            .to_string()
    } else {
        body.chars().take(500).collect()
    };
    AppError::Http {
        status: code,
        message,
    }
}

fn field_messages(value: serde_json::Value) -> Vec<String> {
    match value {
        serde_json::Value::Array(items) => items
            .into_iter()
            .map(|item| match item {
                serde_json::Value::String(s) => s,
                other => other.to_string(),
            })
            .collect(),
        serde_json::Value::String(s) => vec![s],
        other => vec![other.to_string()],
    }
}

/// Typed REST client for one resource kind.
pub struct ResourceClient<T> {
    http_client: Client,
    config: Arc<Config>,
    session: Arc<AuthSession>,
    _kind: PhantomData<fn() -> T>,
}

impl<T> Clone for ResourceClient<T> {
    fn clone(&self) -> Self {
        Self {
            http_client: self.http_client.clone(),
            config: Arc::clone(&self.config),
            session: Arc::clone(&self.session),
            _kind: PhantomData,
        }
    }
}

impl<T: Resource> ResourceClient<T> {
    #[must_use]
    pub fn new(http_client: Client, config: Arc<Config>, session: Arc<AuthSession>) -> Self {
        Self {
            http_client,
            config,
            session,
            _kind: PhantomData,
        }
    }

    fn collection_url(&self) -> String {
        self.config.api_url(&format!("{}/", T::KIND.path()))
    }

    fn record_url(&self, id: i64) -> String {
        self.config.api_url(&format!("{}/{id}/", T::KIND.path()))
    }

    fn authorized(&self, request: RequestBuilder) -> RequestBuilder {
        match self.session.auth_header() {
            Some((name, value)) => request.header(name, value),
            None => request,
        }
    }
}

impl<T: Resource> ResourceApi<T> for ResourceClient<T> {
    fn session(&self) -> &AuthSession {
        &self.session
    }

    async fn list(&self, query: &ListQuery) -> AppResult<Page<T>> {
        tracing::debug!(
            resource = %T::KIND,
            page = query.page,
            search = %query.search,
            "list"
        );
        let request = self
            .http_client
            .get(self.collection_url())
            .query(&query.params());
        send_json(self.authorized(request)).await
    }

    async fn get(&self, id: i64) -> AppResult<T> {
        tracing::debug!(resource = %T::KIND, id, "get");
        let request = self.http_client.get(self.record_url(id));
        send_json(self.authorized(request)).await
    }

    async fn create<P: Serialize + Sync>(&self, payload: &P) -> AppResult<T> {
        tracing::debug!(resource = %T::KIND, "create");
        let request = self.http_client.post(self.collection_url()).json(payload);
        send_json(self.authorized(request)).await
    }

    async fn update(&self, id: i64, record: &T) -> AppResult<T> {
        tracing::debug!(resource = %T::KIND, id, "update");
        let request = self.http_client.put(self.record_url(id)).json(record);
        send_json(self.authorized(request)).await
    }

    async fn patch<P: Serialize + Sync>(&self, id: i64, partial: &P) -> AppResult<T> {
        tracing::debug!(resource = %T::KIND, id, "patch");
        let request = self.http_client.patch(self.record_url(id)).json(partial);
        send_json(self.authorized(request)).await
    }
}
