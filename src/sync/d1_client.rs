// registrytool/src/sync/d1_client.rs
//! HTTP client for the Cloudflare D1 `query` endpoint.
//!
//! One POST per statement, bearer-authenticated. Transport and protocol
//! failures (connection errors, non-2xx status, undecodable body) come back
//! as errors; a decoded body is returned as-is so the caller can tell an
//! application-level `success: false` apart.

use reqwest::header::{AUTHORIZATION, HeaderMap, HeaderValue};
use serde::Deserialize;
use serde_json::Value;
use url::Url;

use super::statement::UpsertStatement;
use crate::config::D1Config;
use crate::errors::{RegistryError, Result};

/// The parts of a D1 response envelope this tool relies on.
#[derive(Debug, Clone, Deserialize)]
pub struct D1Response {
    pub success: bool,
    #[serde(default)]
    pub errors: Vec<Value>,
}

impl D1Response {
    /// Remote error list rendered for a status line.
    pub fn error_summary(&self) -> String {
        let messages: Vec<String> = self
            .errors
            .iter()
            .map(|e| match e.get("message").and_then(Value::as_str) {
                Some(message) => match e.get("code") {
                    Some(code) => format!("{code}: {message}"),
                    None => message.to_string(),
                },
                None => e.to_string(),
            })
            .collect();
        format!("[{}]", messages.join(", "))
    }
}

#[derive(Debug, Clone)]
pub struct D1Client {
    http: reqwest::Client,
    endpoint: Url,
}

impl D1Client {
    pub fn new(config: &D1Config) -> Result<Self> {
        let endpoint = config.query_endpoint()?;
        let mut auth = HeaderValue::from_str(&format!("Bearer {}", config.api_token))
            .map_err(|_| RegistryError::Config("API token contains invalid characters".into()))?;
        auth.set_sensitive(true);

        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, auth);
        let http = reqwest::Client::builder()
            .default_headers(headers)
            .build()?;

        tracing::info!(endpoint = %endpoint, "configured D1 client");
        Ok(Self { http, endpoint })
    }

    /// Submits one statement and waits for the response.
    pub async fn execute(&self, statement: &UpsertStatement) -> Result<D1Response> {
        let resp = self
            .http
            .post(self.endpoint.clone())
            .json(statement)
            .send()
            .await?;

        let status = resp.status();
        let body = resp.text().await?;
        if !status.is_success() {
            return Err(RegistryError::HttpStatus {
                status: status.as_u16(),
                body,
            });
        }

        serde_json::from_str(&body).map_err(|e| RegistryError::Decode(e.to_string()))
    }
}
