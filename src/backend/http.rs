use std::time::Duration;

use anyhow::Context;
use async_trait::async_trait;
use reqwest::Client;
use tracing::{debug, warn};

use super::{Backend, Credentials, Item, error_detail};
use crate::error::ConnectError;
use crate::identity::Identity;
use crate::provider::ProviderKind;

const AUTHORIZE_FALLBACK: &str = "Connection failed";
const CREDENTIALS_FALLBACK: &str = "Failed to retrieve credentials";
const LOAD_FALLBACK: &str = "Failed to load data";

/// Talks to the integration backend over HTTP with form-encoded bodies.
pub struct HttpBackend {
    base_url: String,
    client: Client,
}

impl HttpBackend {
    pub fn new(base_url: &str) -> anyhow::Result<Self> {
        let client = Client::builder()
            .user_agent(concat!("tether/", env!("CARGO_PKG_VERSION")))
            .connect_timeout(Duration::from_secs(5))
            .timeout(Duration::from_secs(30))
            .build()
            .context("failed to build HTTP client")?;
        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// POST a form and return the body of a successful response.
    async fn post_form(
        &self,
        path: &str,
        form: &[(&str, &str)],
        fallback: &str,
    ) -> Result<(u16, String), ConnectError> {
        let url = format!("{}{}", self.base_url, path);
        debug!(%url, "POST");

        let resp = self
            .client
            .post(&url)
            .form(form)
            .send()
            .await
            .map_err(|e| network_error(fallback, e))?;

        let status = resp.status();
        let body = resp.text().await.map_err(|e| network_error(fallback, e))?;

        if !status.is_success() {
            let detail = error_detail(&body, fallback);
            warn!(%url, status = status.as_u16(), %detail, "backend returned an error");
            return Err(ConnectError::Backend {
                status: status.as_u16(),
                detail,
            });
        }

        Ok((status.as_u16(), body))
    }
}

fn network_error(fallback: &str, err: reqwest::Error) -> ConnectError {
    warn!(error = %err, "request failed");
    ConnectError::Network(format!("{fallback}: {err}"))
}

/// The authorize route returns the URL as a JSON string, but a bare
/// text body is accepted too.
fn parse_authorization_url(body: &str) -> Option<String> {
    let trimmed = body.trim();
    let url = serde_json::from_str::<String>(trimmed).unwrap_or_else(|_| trimmed.to_string());
    let url = url.trim();
    if url.is_empty() {
        None
    } else {
        Some(url.to_string())
    }
}

/// Anything that is not JSON is still an opaque payload; keep it as a string.
fn parse_credentials(body: &str) -> Option<Credentials> {
    let trimmed = body.trim();
    if trimmed.is_empty() {
        return None;
    }
    let value = serde_json::from_str(trimmed)
        .unwrap_or_else(|_| serde_json::Value::String(trimmed.to_string()));
    Credentials::from_value(value)
}

#[async_trait]
impl Backend for HttpBackend {
    async fn authorization_url(
        &self,
        provider: ProviderKind,
        identity: &Identity,
    ) -> Result<String, ConnectError> {
        let (status, body) = self
            .post_form(
                provider.endpoints().authorize,
                &identity.form(),
                AUTHORIZE_FALLBACK,
            )
            .await?;
        parse_authorization_url(&body).ok_or_else(|| ConnectError::Backend {
            status,
            detail: AUTHORIZE_FALLBACK.to_string(),
        })
    }

    async fn credentials(
        &self,
        provider: ProviderKind,
        identity: &Identity,
    ) -> Result<Option<Credentials>, ConnectError> {
        let (_, body) = self
            .post_form(
                provider.endpoints().credentials,
                &identity.form(),
                CREDENTIALS_FALLBACK,
            )
            .await?;
        Ok(parse_credentials(&body))
    }

    async fn load_items(
        &self,
        provider: ProviderKind,
        credentials: &Credentials,
    ) -> Result<Vec<Item>, ConnectError> {
        let serialized = credentials.to_json();
        let (status, body) = self
            .post_form(
                provider.endpoints().load,
                &[("credentials", serialized.as_str())],
                LOAD_FALLBACK,
            )
            .await?;

        if body.trim().is_empty() || body.trim() == "null" {
            return Ok(Vec::new());
        }
        serde_json::from_str(&body).map_err(|e| {
            warn!(error = %e, "unexpected item listing");
            ConnectError::Backend {
                status,
                detail: LOAD_FALLBACK.to_string(),
            }
        })
    }
}
