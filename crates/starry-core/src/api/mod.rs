//! HTTP client for the dashboard backend.
//!
//! Every call is authenticated; without a credential no request leaves the
//! process. Failures are mapped onto [`ConsoleError`] so callers can decide
//! what to show the operator.

pub mod endpoints;
pub mod forms;
pub mod request;

pub use request::ApiRequest;

use reqwest::header::{ACCEPT, CONTENT_TYPE, COOKIE};
use reqwest::{Method, StatusCode, Url};
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::config::{ConsoleConfig, Credential};
use crate::constants::SESSION_COOKIE_NAME;
use crate::error::{ConsoleError, Result};

/// Dashboard API client
#[derive(Debug, Clone)]
pub struct ApiClient {
    base_url: Url,
    credential: Option<Credential>,
    client: reqwest::Client,
}

impl ApiClient {
    /// `base_url` must end with `/` when it carries a path prefix
    pub fn new(base_url: Url, credential: Option<Credential>) -> Self {
        Self {
            base_url,
            credential,
            client: reqwest::Client::new(),
        }
    }

    pub fn from_config(config: &ConsoleConfig) -> anyhow::Result<Self> {
        Ok(Self::new(config.base_url()?, config.credential()))
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    pub fn credential(&self) -> Option<&Credential> {
        self.credential.as_ref()
    }

    pub fn has_credential(&self) -> bool {
        self.credential.is_some()
    }

    pub fn set_credential(&mut self, credential: Option<Credential>) {
        self.credential = credential;
    }

    /// Perform one authenticated call.
    ///
    /// Returns `Ok(None)` for 204 and empty bodies, the parsed JSON otherwise.
    pub async fn request(
        &self,
        path: &str,
        method: Method,
        body: Option<&Value>,
    ) -> Result<Option<Value>> {
        let mut req = ApiRequest::new(method, path);
        req.body = body.cloned();
        self.send(&req).await
    }

    pub async fn send(&self, req: &ApiRequest) -> Result<Option<Value>> {
        let credential = self
            .credential
            .as_ref()
            .ok_or(ConsoleError::Auth { status: None })?;

        let url = self.url_for(&req.path)?;
        let mut builder = self
            .client
            .request(req.method.clone(), url)
            .query(&req.query)
            .header(ACCEPT, "application/json")
            .header(CONTENT_TYPE, "application/json");

        builder = match credential {
            Credential::Bearer(token) => builder.bearer_auth(token),
            Credential::SessionCookie(cookie) => {
                builder.header(COOKIE, format!("{}={}", SESSION_COOKIE_NAME, cookie))
            }
        };

        if let Some(body) = &req.body {
            builder = builder.body(body.to_string());
        }

        tracing::debug!(request = %req.describe(), "api call");
        let response = builder.send().await?;
        let status = response.status();

        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            tracing::info!(request = %req.describe(), status = status.as_u16(), "not authenticated");
            return Err(ConsoleError::Auth {
                status: Some(status.as_u16()),
            });
        }

        let text = response.text().await?;
        if !status.is_success() {
            tracing::warn!(request = %req.describe(), status = status.as_u16(), "api error");
            return Err(ConsoleError::Http {
                status: status.as_u16(),
                body: text,
            });
        }

        if status == StatusCode::NO_CONTENT || text.trim().is_empty() {
            return Ok(None);
        }

        serde_json::from_str(&text)
            .map(Some)
            .map_err(ConsoleError::decode)
    }

    /// Send and decode into `T`. An empty body is a decode error here.
    pub async fn get_json<T: DeserializeOwned>(&self, req: &ApiRequest) -> Result<T> {
        decode_body(self.send(req).await?)
    }

    fn url_for(&self, path: &str) -> Result<Url> {
        self.base_url
            .join(path.trim_start_matches('/'))
            .map_err(|e| ConsoleError::Transport {
                message: format!("invalid route {}: {}", path, e),
            })
    }
}

/// Decode a response body produced by [`ApiClient::send`]
pub fn decode_body<T: DeserializeOwned>(body: Option<Value>) -> Result<T> {
    let value = body.ok_or_else(|| ConsoleError::decode("empty response body"))?;
    serde_json::from_value(value).map_err(ConsoleError::decode)
}
