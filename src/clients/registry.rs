//! HTTP client for the license registry's admin endpoints.
//!
//! All responses go through one normalization path so the caller only ever
//! sees [`AdminError`] variants, never a raw parse failure.

use crate::config::RegistryConfig;
use crate::credential::CredentialStore;
use crate::error::AdminError;
use crate::models::{Ack, LicenseRecord, STATUS_OK, filter_records, normalize_email};
use anyhow::Context;
use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use reqwest::{Client, Method, RequestBuilder, Response, StatusCode};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, warn};
use url::Url;

pub const API_KEY_HEADER: &str = "x-api-key";

const LICENSES_PATH: &str = "api/admin/licenses";
const DEACTIVATE_PATH: &str = "api/admin/licenses/deactivate";
const HEALTH_PATH: &str = "health";

/// The four registry operations the controller depends on.
#[async_trait]
pub trait Registry: Send + Sync {
    /// Fetches every record and keeps those whose email contains `filter_text`.
    async fn list(&self, filter_text: &str) -> Result<Vec<LicenseRecord>, AdminError>;

    /// Upserts a record by email.
    async fn create(&self, email: &str, ativo: bool) -> Result<Ack, AdminError>;

    async fn deactivate(&self, email: &str) -> Result<Ack, AdminError>;

    async fn delete(&self, email: &str) -> Result<Ack, AdminError>;
}

#[derive(Debug, Serialize)]
struct CreateRequest<'a> {
    email: &'a str,
    ativo: u8,
}

#[derive(Debug, Serialize)]
struct DeactivateRequest<'a> {
    email: &'a str,
}

#[derive(Debug, Default, Deserialize)]
struct ListResponse {
    #[serde(default)]
    items: Vec<Value>,
}

/// What a response must carry to count as a success.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Expect {
    /// 2xx and a JSON body.
    Json,
    /// 2xx and `status == "ok"` in the JSON body.
    StatusOk,
    /// 2xx; a body is optional but must not report failure.
    StatusCode,
}

#[derive(Debug)]
enum Payload {
    Json(Value),
    Text(String),
}

#[derive(Clone)]
pub struct RegistryClient {
    client: Client,
    base_url: Url,
    credentials: Arc<dyn CredentialStore>,
}

impl RegistryClient {
    pub fn new(
        config: &RegistryConfig,
        credentials: Arc<dyn CredentialStore>,
    ) -> anyhow::Result<Self> {
        let mut base_url = Url::parse(config.base_url.trim())
            .with_context(|| format!("Invalid registry URL: {}", config.base_url))?;

        // Relative joins replace the last path segment unless the base ends with '/'.
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }

        let client = Client::builder()
            .user_agent(config.user_agent.as_str())
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            client,
            base_url,
            credentials,
        })
    }

    #[must_use]
    pub const fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Checks the registry's health endpoint.
    pub async fn health(&self) -> Result<Ack, AdminError> {
        let url = self.endpoint(HEALTH_PATH);
        let value = self
            .send(self.request(Method::GET, url), Expect::StatusOk)
            .await?;
        Ok(Ack::from_payload(&value))
    }

    fn endpoint(&self, path: &str) -> Url {
        let mut url = self.base_url.clone();
        let joined = format!("{}{path}", self.base_url.path());
        url.set_path(&joined);
        url
    }

    fn request(&self, method: Method, url: Url) -> RequestBuilder {
        let key = self.credentials.get();
        debug!(%method, path = url.path(), authenticated = !key.is_empty(), "Registry request");

        let builder = self.client.request(method, url);
        if key.is_empty() {
            builder
        } else {
            builder.header(API_KEY_HEADER, key)
        }
    }

    async fn send(&self, builder: RequestBuilder, expect: Expect) -> Result<Value, AdminError> {
        let response = builder.send().await?;
        let (status, payload) = read_payload(response).await?;
        debug!(status = status.as_u16(), "Registry response");
        classify(status, payload, expect)
    }
}

#[async_trait]
impl Registry for RegistryClient {
    async fn list(&self, filter_text: &str) -> Result<Vec<LicenseRecord>, AdminError> {
        let url = self.endpoint(LICENSES_PATH);
        let value = self.send(self.request(Method::GET, url), Expect::Json).await?;

        let all = records_from(value)?;
        let total = all.len();
        let records = filter_records(all, filter_text);
        debug!(total, shown = records.len(), "Listed licenses");

        Ok(records)
    }

    async fn create(&self, email: &str, ativo: bool) -> Result<Ack, AdminError> {
        let email = require_email(email)?;
        let body = CreateRequest {
            email: &email,
            ativo: u8::from(ativo),
        };

        let url = self.endpoint(LICENSES_PATH);
        let value = self
            .send(self.request(Method::POST, url).json(&body), Expect::StatusOk)
            .await?;
        Ok(Ack::from_payload(&value))
    }

    async fn deactivate(&self, email: &str) -> Result<Ack, AdminError> {
        let email = require_email(email)?;
        let body = DeactivateRequest { email: &email };

        let url = self.endpoint(DEACTIVATE_PATH);
        let value = self
            .send(self.request(Method::PATCH, url).json(&body), Expect::StatusOk)
            .await?;
        Ok(Ack::from_payload(&value))
    }

    async fn delete(&self, email: &str) -> Result<Ack, AdminError> {
        let email = require_email(email)?;

        let mut url = self.endpoint(LICENSES_PATH);
        url.set_query(Some(&format!("email={}", urlencoding::encode(&email))));

        let value = self
            .send(self.request(Method::DELETE, url), Expect::StatusCode)
            .await?;
        Ok(Ack::from_payload(&value))
    }
}

fn require_email(email: &str) -> Result<String, AdminError> {
    let email = normalize_email(email);
    if email.is_empty() {
        return Err(AdminError::validation("Email is required"));
    }
    Ok(email)
}

/// Extracts the records of a list payload, skipping rows that are not records.
fn records_from(value: Value) -> Result<Vec<LicenseRecord>, AdminError> {
    let response: ListResponse = match value {
        Value::Null => ListResponse::default(),
        other => serde_json::from_value(other).map_err(|e| AdminError::Protocol {
            status: StatusCode::OK.as_u16(),
            detail: format!("Malformed list response: {e}"),
        })?,
    };

    Ok(response
        .items
        .into_iter()
        .filter_map(|item| match LicenseRecord::deserialize(&item) {
            Ok(record) => Some(record),
            Err(e) => {
                warn!(error = %e, %item, "Skipping malformed license row");
                None
            }
        })
        .collect())
}

fn is_json_content_type(content_type: &str) -> bool {
    let content_type = content_type.to_ascii_lowercase();
    content_type.contains("application/json") || content_type.contains("+json")
}

async fn read_payload(response: Response) -> Result<(StatusCode, Payload), AdminError> {
    let status = response.status();
    let is_json = response
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(is_json_content_type);

    let text = response.text().await.map_err(|e| AdminError::Protocol {
        status: status.as_u16(),
        detail: format!("Failed to read response body: {e}"),
    })?;

    if !is_json {
        return Ok((status, Payload::Text(text)));
    }

    if text.trim().is_empty() {
        return Ok((status, Payload::Json(Value::Null)));
    }

    match serde_json::from_str(&text) {
        Ok(value) => Ok((status, Payload::Json(value))),
        Err(_) => Err(AdminError::Protocol {
            status: status.as_u16(),
            detail: text,
        }),
    }
}

fn classify(status: StatusCode, payload: Payload, expect: Expect) -> Result<Value, AdminError> {
    let value = match payload {
        Payload::Text(_) if status.is_success() && expect == Expect::StatusCode => {
            return Ok(Value::Null);
        }
        Payload::Text(detail) => {
            return Err(AdminError::Protocol {
                status: status.as_u16(),
                detail,
            });
        }
        Payload::Json(value) => value,
    };

    if !status.is_success() {
        return Err(application_error(status, &value));
    }

    let reported = value.get("status").and_then(Value::as_str);
    let ok = match expect {
        Expect::Json => true,
        Expect::StatusOk => reported == Some(STATUS_OK),
        Expect::StatusCode => reported.is_none_or(|s| s == STATUS_OK),
    };

    if ok {
        Ok(value)
    } else {
        Err(application_error(status, &value))
    }
}

fn application_error(status: StatusCode, payload: &Value) -> AdminError {
    let text = |key: &str| {
        payload.get(key).and_then(|v| match v {
            Value::Null => None,
            Value::String(s) => Some(s.clone()),
            other => Some(other.to_string()),
        })
    };

    AdminError::Application {
        status: status.as_u16(),
        error: text("error").unwrap_or_else(|| "unknown".to_string()),
        detail: text("detail").or_else(|| text("msg")),
    }
}
