//! In-process registry speaking the admin HTTP contract.

#![allow(dead_code)]

use axum::{
    Json, Router,
    extract::{Query, State},
    http::{HeaderMap, StatusCode},
    response::{Html, IntoResponse, Response},
    routing::{get, patch},
};
use license_admin::clients::registry::RegistryClient;
use license_admin::config::RegistryConfig;
use license_admin::credential::{CredentialStore, MemoryCredentialStore};
use serde_json::{Value, json};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

const CREATED_AT: &str = "Tue, 15 Oct 2024 10:00:00 GMT";

#[derive(Debug, Clone)]
pub struct Row {
    pub id: u64,
    pub email: String,
    pub ativo: i64,
}

#[derive(Default)]
pub struct FakeRegistry {
    pub rows: Mutex<Vec<Row>>,
    next_id: AtomicU64,
    /// When set, admin routes demand this `x-api-key`.
    pub api_key: Option<String>,
    /// `x-api-key` values observed, one per request.
    pub seen_keys: Mutex<Vec<Option<String>>>,
    /// Answer every admin route with an HTML error page.
    pub html_errors: AtomicBool,
}

impl FakeRegistry {
    pub fn with_key(key: &str) -> Self {
        Self {
            api_key: Some(key.to_string()),
            ..Self::default()
        }
    }

    pub fn seed(&self, email: &str, ativo: i64) {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst) + 1;
        self.rows.lock().unwrap().push(Row {
            id,
            email: email.to_string(),
            ativo,
        });
    }

    pub fn seen_keys(&self) -> Vec<Option<String>> {
        self.seen_keys.lock().unwrap().clone()
    }

    fn gate(&self, headers: &HeaderMap) -> Option<Response> {
        let key = headers
            .get("x-api-key")
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        self.seen_keys.lock().unwrap().push(key.clone());

        if self.html_errors.load(Ordering::SeqCst) {
            return Some(
                (
                    StatusCode::BAD_GATEWAY,
                    Html("<html><body>Bad Gateway</body></html>"),
                )
                    .into_response(),
            );
        }

        match &self.api_key {
            Some(expected) if key.as_deref() != Some(expected.as_str()) => Some(
                (
                    StatusCode::UNAUTHORIZED,
                    Json(json!({"error": "unauthorized"})),
                )
                    .into_response(),
            ),
            _ => None,
        }
    }
}

fn email_from(value: Option<&Value>) -> String {
    value
        .and_then(Value::as_str)
        .unwrap_or_default()
        .trim()
        .to_lowercase()
}

async fn list(State(state): State<Arc<FakeRegistry>>, headers: HeaderMap) -> Response {
    if let Some(denied) = state.gate(&headers) {
        return denied;
    }

    let items: Vec<Value> = state
        .rows
        .lock()
        .unwrap()
        .iter()
        .rev()
        .map(|r| {
            json!({
                "id": r.id,
                "email": r.email,
                "ativo": r.ativo,
                "created_at": CREATED_AT,
            })
        })
        .collect();

    Json(json!({ "items": items })).into_response()
}

async fn upsert(
    State(state): State<Arc<FakeRegistry>>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    if let Some(denied) = state.gate(&headers) {
        return denied;
    }

    let email = email_from(body.get("email"));
    if email.is_empty() {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({"error": "email requerido"})),
        )
            .into_response();
    }
    let ativo = body.get("ativo").and_then(Value::as_i64).unwrap_or(1);

    let existing = {
        let mut rows = state.rows.lock().unwrap();
        rows.iter_mut().find(|r| r.email == email).map(|r| {
            r.ativo = ativo;
        })
    };
    if existing.is_none() {
        state.seed(&email, ativo);
    }

    Json(json!({"status": "ok", "email": email, "ativo": ativo})).into_response()
}

async fn deactivate(
    State(state): State<Arc<FakeRegistry>>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    if let Some(denied) = state.gate(&headers) {
        return denied;
    }

    let email = email_from(body.get("email"));
    let mut updated = 0;
    for row in state.rows.lock().unwrap().iter_mut() {
        if row.email == email {
            row.ativo = 0;
            updated += 1;
        }
    }

    Json(json!({"status": "ok", "updated": updated})).into_response()
}

async fn remove(
    State(state): State<Arc<FakeRegistry>>,
    headers: HeaderMap,
    Query(params): Query<HashMap<String, String>>,
) -> Response {
    if let Some(denied) = state.gate(&headers) {
        return denied;
    }

    let email = params
        .get("email")
        .map(|e| e.trim().to_lowercase())
        .unwrap_or_default();

    let mut rows = state.rows.lock().unwrap();
    let before = rows.len();
    rows.retain(|r| r.email != email);
    let deleted = before - rows.len();

    Json(json!({"status": "ok", "deleted": deleted})).into_response()
}

async fn health() -> Json<Value> {
    Json(json!({"status": "ok"}))
}

pub async fn spawn_registry(state: Arc<FakeRegistry>) -> String {
    let app = Router::new()
        .route("/api/admin/licenses", get(list).post(upsert).delete(remove))
        .route("/api/admin/licenses/deactivate", patch(deactivate))
        .route("/health", get(health))
        .with_state(state);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    format!("http://{addr}")
}

pub fn client_for(base_url: &str, credentials: Arc<dyn CredentialStore>) -> RegistryClient {
    let config = RegistryConfig {
        base_url: base_url.to_string(),
        ..RegistryConfig::default()
    };
    RegistryClient::new(&config, credentials).expect("Failed to build client")
}

pub fn anonymous_client(base_url: &str) -> RegistryClient {
    client_for(base_url, Arc::new(MemoryCredentialStore::default()))
}
