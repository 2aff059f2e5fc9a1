use anyhow::Context;
use async_trait::async_trait;
use reqwest::header::{ACCEPT, CONTENT_TYPE, HeaderMap, HeaderValue};
use tracing::{debug, warn};
use worklog_shared::{Envelope, ErrorBody};

use crate::config::Config;
use crate::error::{ApiError, SchemaError};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
    Put,
    Delete,
}

impl Method {
    fn to_reqwest(self) -> reqwest::Method {
        match self {
            Method::Get => reqwest::Method::GET,
            Method::Post => reqwest::Method::POST,
            Method::Put => reqwest::Method::PUT,
            Method::Delete => reqwest::Method::DELETE,
        }
    }
}

/// One call against the backend, relative to the configured base URL.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiRequest {
    pub method: Method,
    pub path: String,
    pub params: Vec<(&'static str, String)>,
    pub body: Option<serde_json::Value>,
}

impl ApiRequest {
    pub fn get(path: impl Into<String>, params: Vec<(&'static str, String)>) -> Self {
        Self {
            method: Method::Get,
            path: path.into(),
            params,
            body: None,
        }
    }

    pub fn post(path: impl Into<String>, body: serde_json::Value) -> Self {
        Self {
            method: Method::Post,
            path: path.into(),
            params: Vec::new(),
            body: Some(body),
        }
    }

    pub fn put(path: impl Into<String>, body: serde_json::Value) -> Self {
        Self {
            method: Method::Put,
            path: path.into(),
            params: Vec::new(),
            body: Some(body),
        }
    }

    pub fn delete(path: impl Into<String>) -> Self {
        Self {
            method: Method::Delete,
            path: path.into(),
            params: Vec::new(),
            body: None,
        }
    }

    pub fn param(&self, key: &str) -> Option<&str> {
        self.params
            .iter()
            .find(|(k, _)| *k == key)
            .map(|(_, v)| v.as_str())
    }
}

/// The seam to the remote API. Implementations return the decoded envelope
/// of a 2xx response or an [`ApiError`]; they never panic on bad input.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn execute(&self, request: ApiRequest) -> Result<Envelope, ApiError>;
}

/// Unwraps `data`, turning an `error: true` envelope into an error.
pub fn into_data(envelope: Envelope) -> Result<Option<serde_json::Value>, ApiError> {
    if envelope.reports_error() {
        let message = envelope
            .message
            .unwrap_or_else(|| "request was rejected".to_string());
        return Err(ApiError::Application(message));
    }
    Ok(envelope.data.filter(|data| !data.is_null()))
}

/// Parses a 2xx body. An empty body (e.g. `204 No Content`) is an empty
/// envelope.
pub fn decode_envelope(raw: &str) -> Result<Envelope, ApiError> {
    if raw.trim().is_empty() {
        return Ok(Envelope::default());
    }
    let value: serde_json::Value =
        serde_json::from_str(raw).map_err(|err| SchemaError::Json(err.to_string()))?;
    if !value.is_object() {
        return Err(SchemaError::Data("response body is not an object".to_string()).into());
    }
    serde_json::from_value(value).map_err(|err| SchemaError::Data(err.to_string()).into())
}

/// Best-effort parse of a 4xx/5xx body.
pub fn decode_error_body(raw: &str) -> Option<ErrorBody> {
    serde_json::from_str(raw).ok()
}

/// [`Transport`] over HTTP.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: reqwest::Client,
    base_url: String,
}

impl HttpTransport {
    pub fn new(config: &Config) -> anyhow::Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .default_headers(headers)
            .build()
            .context("failed building HTTP client for the work-log API")?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn url_for(&self, request: &ApiRequest) -> Result<reqwest::Url, ApiError> {
        let mut url = reqwest::Url::parse(&format!("{}{}", self.base_url, request.path))
            .map_err(|err| ApiError::Transport(format!("invalid request URL: {err}")))?;
        if !request.params.is_empty() {
            let mut pairs = url.query_pairs_mut();
            for (key, value) in &request.params {
                pairs.append_pair(key, value);
            }
        }
        Ok(url)
    }
}

#[async_trait]
impl Transport for HttpTransport {
    #[tracing::instrument(skip(self, request), fields(method = ?request.method, path = %request.path))]
    async fn execute(&self, request: ApiRequest) -> Result<Envelope, ApiError> {
        let url = self.url_for(&request)?;
        let mut builder = self.client.request(request.method.to_reqwest(), url.clone());
        if let Some(body) = &request.body {
            builder = builder.body(body.to_string());
        }

        let response = builder.send().await.map_err(|err| {
            warn!(url = %url, error = %err, "request failed");
            ApiError::Transport(err.to_string())
        })?;

        let status = response.status();
        let raw = response.text().await.map_err(|err| {
            warn!(url = %url, error = %err, "failed reading response body");
            ApiError::Transport(err.to_string())
        })?;

        if !status.is_success() {
            warn!(url = %url, status = status.as_u16(), "server rejected request");
            return Err(ApiError::Status {
                status: status.as_u16(),
                body: decode_error_body(&raw),
            });
        }

        debug!(url = %url, status = status.as_u16(), bytes = raw.len(), "response received");
        decode_envelope(&raw)
    }
}
