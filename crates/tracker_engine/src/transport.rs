use std::time::Duration;

use engine_logging::engine_trace;
use reqwest::header::CONTENT_TYPE;
use url::Url;

use crate::{FailureKind, TransportFailure};

/// One POST exchange with the solver server.
#[derive(Debug, Clone, PartialEq)]
pub struct Exchange {
    pub path: String,
    pub query: Vec<(String, String)>,
    pub payload: Option<serde_json::Value>,
}

impl Exchange {
    pub fn post(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            query: Vec::new(),
            payload: None,
        }
    }

    pub fn with_payload(mut self, payload: serde_json::Value) -> Self {
        self.payload = Some(payload);
        self
    }

    pub fn with_query(mut self, key: &str, value: &str) -> Self {
        self.query.push((key.to_string(), value.to_string()));
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExchangeResponse {
    pub status: u16,
    pub body: String,
}

impl ExchangeResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

#[async_trait::async_trait]
pub trait Transport: Send + Sync {
    async fn exchange(&self, request: Exchange) -> Result<ExchangeResponse, TransportFailure>;
}

#[derive(Debug, Clone)]
pub struct TransportSettings {
    pub base_url: String,
    pub connect_timeout: Duration,
    /// `None` leaves individual calls unbounded; a stuck poll stalls the loop instead of flooding.
    pub request_timeout: Option<Duration>,
}

impl Default for TransportSettings {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8080".to_string(),
            connect_timeout: Duration::from_secs(10),
            request_timeout: None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: reqwest::Client,
    base_url: Url,
}

impl ReqwestTransport {
    pub fn new(settings: &TransportSettings) -> Result<Self, TransportFailure> {
        let mut base_url = Url::parse(&settings.base_url)
            .map_err(|err| TransportFailure::new(FailureKind::InvalidUrl, err.to_string()))?;
        // Request paths are relative; keep any path prefix of the base.
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }

        let mut builder = reqwest::Client::builder().connect_timeout(settings.connect_timeout);
        if let Some(timeout) = settings.request_timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder
            .build()
            .map_err(|err| TransportFailure::new(FailureKind::Network, err.to_string()))?;

        Ok(Self { client, base_url })
    }

    fn resolve(&self, request: &Exchange) -> Result<Url, TransportFailure> {
        let mut url = self
            .base_url
            .join(&request.path)
            .map_err(|err| TransportFailure::new(FailureKind::InvalidUrl, err.to_string()))?;
        if !request.query.is_empty() {
            url.query_pairs_mut().extend_pairs(request.query.iter());
        }
        Ok(url)
    }
}

#[async_trait::async_trait]
impl Transport for ReqwestTransport {
    async fn exchange(&self, request: Exchange) -> Result<ExchangeResponse, TransportFailure> {
        let url = self.resolve(&request)?;
        engine_trace!("exchange POST {}", url);

        let mut builder = self.client.post(url);
        if let Some(payload) = &request.payload {
            builder = builder
                .header(CONTENT_TYPE, "application/json")
                .body(payload.to_string());
        }

        let response = builder.send().await.map_err(map_reqwest_error)?;
        let status = response.status().as_u16();
        let body = response.text().await.map_err(map_reqwest_error)?;

        Ok(ExchangeResponse { status, body })
    }
}

fn map_reqwest_error(err: reqwest::Error) -> TransportFailure {
    if err.is_timeout() {
        return TransportFailure::new(FailureKind::Timeout, err.to_string());
    }
    TransportFailure::new(FailureKind::Network, err.to_string())
}
