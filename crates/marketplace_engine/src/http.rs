use std::sync::{Arc, PoisonError, RwLock};
use std::time::Duration;

use reqwest::header::{AUTHORIZATION, CONTENT_TYPE};
use reqwest::Url;
use thiserror::Error;

#[derive(Debug, Clone)]
pub struct RemoteSettings {
    pub base_url: String,
    pub api_key: Option<String>,
    pub connect_timeout: Duration,
    pub request_timeout: Duration,
}

impl Default for RemoteSettings {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:54321".to_string(),
            api_key: None,
            connect_timeout: Duration::from_secs(10),
            request_timeout: Duration::from_secs(30),
        }
    }
}

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("invalid base url {url}: {message}")]
    InvalidBaseUrl { url: String, message: String },
    #[error("failed to build http client: {0}")]
    Client(String),
}

/// Bearer token shared by the auth and database adapters.
#[derive(Debug, Clone, Default)]
pub struct AccessToken(Arc<RwLock<Option<String>>>);

impl AccessToken {
    pub fn get(&self) -> Option<String> {
        self.0.read().unwrap_or_else(PoisonError::into_inner).clone()
    }

    pub fn set(&self, token: Option<String>) {
        *self.0.write().unwrap_or_else(PoisonError::into_inner) = token;
    }
}

/// Status and body of a completed HTTP exchange.
#[derive(Debug)]
pub(crate) struct Reply {
    pub status: u16,
    pub body: Vec<u8>,
}

impl Reply {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}

/// Connectivity failure before a status line was received.
#[derive(Debug)]
pub(crate) struct TransportError(pub String);

#[derive(Debug, Clone)]
pub(crate) struct RestClient {
    client: reqwest::Client,
    base: Url,
    api_key: Option<String>,
    token: AccessToken,
}

impl RestClient {
    pub fn new(settings: &RemoteSettings, token: AccessToken) -> Result<Self, SettingsError> {
        let mut raw = settings.base_url.trim().to_string();
        if !raw.ends_with('/') {
            raw.push('/');
        }
        let base = Url::parse(&raw).map_err(|err| SettingsError::InvalidBaseUrl {
            url: settings.base_url.clone(),
            message: err.to_string(),
        })?;
        let client = reqwest::Client::builder()
            .connect_timeout(settings.connect_timeout)
            .timeout(settings.request_timeout)
            .build()
            .map_err(|err| SettingsError::Client(err.to_string()))?;
        Ok(Self {
            client,
            base,
            api_key: settings.api_key.clone(),
            token,
        })
    }

    pub fn token(&self) -> &AccessToken {
        &self.token
    }

    pub fn endpoint(&self, path: &str, query: &[(&str, &str)]) -> Result<Url, TransportError> {
        let mut url = self
            .base
            .join(path)
            .map_err(|err| TransportError(format!("bad endpoint {path}: {err}")))?;
        if !query.is_empty() {
            url.query_pairs_mut().extend_pairs(query);
        }
        Ok(url)
    }

    pub async fn get(&self, url: Url) -> Result<Reply, TransportError> {
        self.send(self.client.get(url), None).await
    }

    pub async fn post_json(
        &self,
        url: Url,
        body: &serde_json::Value,
    ) -> Result<Reply, TransportError> {
        self.send(self.json_request(url, body)?, None).await
    }

    /// Like `post_json`, but authenticated with `bearer` instead of the shared token.
    pub async fn post_json_as(
        &self,
        url: Url,
        body: &serde_json::Value,
        bearer: &str,
    ) -> Result<Reply, TransportError> {
        self.send(self.json_request(url, body)?, Some(bearer)).await
    }

    fn json_request(
        &self,
        url: Url,
        body: &serde_json::Value,
    ) -> Result<reqwest::RequestBuilder, TransportError> {
        let payload = serde_json::to_vec(body)
            .map_err(|err| TransportError(format!("failed to encode body: {err}")))?;
        Ok(self
            .client
            .post(url)
            .header(CONTENT_TYPE, "application/json")
            .body(payload))
    }

    async fn send(
        &self,
        request: reqwest::RequestBuilder,
        bearer: Option<&str>,
    ) -> Result<Reply, TransportError> {
        let mut request = request;
        if let Some(key) = &self.api_key {
            request = request.header("apikey", key.as_str());
        }
        let bearer = bearer
            .map(str::to_string)
            .or_else(|| self.token.get())
            .or_else(|| self.api_key.clone());
        if let Some(bearer) = bearer {
            request = request.header(AUTHORIZATION, format!("Bearer {bearer}"));
        }

        let response = request.send().await.map_err(map_reqwest_error)?;
        let status = response.status().as_u16();
        let body = response.bytes().await.map_err(map_reqwest_error)?;
        Ok(Reply {
            status,
            body: body.to_vec(),
        })
    }
}

fn map_reqwest_error(err: reqwest::Error) -> TransportError {
    if err.is_timeout() {
        return TransportError(format!("timeout: {err}"));
    }
    if err.is_connect() {
        return TransportError(format!("connection failed: {err}"));
    }
    TransportError(err.to_string())
}
