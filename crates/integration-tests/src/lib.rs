//! Integration tests for the Scuffmart client.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p scuffmart-integration-tests
//! ```
//!
//! Each test starts a [`FakeBackend`] on `127.0.0.1:0`: an axum server that
//! records every request and answers from routes the test scripts. The real
//! `HttpApi` talks to it over HTTP, so headers, bodies and status handling
//! are exercised end to end.
//!
//! # Test Categories
//!
//! - `auth_session` - Bearer tokens, login persistence, global 401 handling
//! - `cart_sync` - Envelope decoding and re-fetch after mutations
//! - `admin_requests` - Multipart product forms, stock and status updates

use std::collections::{HashMap, VecDeque};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use axum::Router;
use axum::body::to_bytes;
use axum::extract::{FromRequest, Multipart, Request, State};
use axum::http::{Method, StatusCode, header};
use axum::response::{IntoResponse, Response};
use scuffmart_client::{App, ClientConfig};
use serde_json::Value;

/// One multipart form field as received.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormField {
    pub name: String,
    pub file_name: Option<String>,
    pub value: String,
}

/// One request as received.
#[derive(Debug, Clone)]
pub struct Recorded {
    pub method: Method,
    /// Path below the API root, e.g. `cart/add`.
    pub path: String,
    pub authorization: Option<String>,
    /// Raw body for non-multipart requests.
    pub body: String,
    /// Fields of a multipart body.
    pub fields: Vec<FormField>,
}

impl Recorded {
    /// Body parsed as JSON (`Value::Null` when empty or not JSON).
    #[must_use]
    pub fn json(&self) -> Value {
        serde_json::from_str(&self.body).unwrap_or(Value::Null)
    }

    /// Value of a multipart field.
    #[must_use]
    pub fn field(&self, name: &str) -> Option<&FormField> {
        self.fields.iter().find(|f| f.name == name)
    }
}

type RouteKey = (Method, String);

#[derive(Default)]
struct BackendState {
    requests: Mutex<Vec<Recorded>>,
    /// Scripted answers; the last one for a route repeats.
    routes: Mutex<HashMap<RouteKey, VecDeque<(StatusCode, String)>>>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Scriptable HTTP backend.
pub struct FakeBackend {
    addr: SocketAddr,
    state: Arc<BackendState>,
}

impl FakeBackend {
    /// Bind to an ephemeral port and start serving.
    ///
    /// # Errors
    ///
    /// Returns the I/O error if the listener cannot be bound.
    pub async fn start() -> std::io::Result<Self> {
        let state = Arc::new(BackendState::default());
        let router = Router::new().fallback(handle).with_state(Arc::clone(&state));

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await?;
        let addr = listener.local_addr()?;
        tokio::spawn(async move {
            let _ = axum::serve(listener, router).await;
        });

        Ok(Self { addr, state })
    }

    /// API root the client should be pointed at.
    #[must_use]
    pub fn api_url(&self) -> String {
        format!("http://{}/api", self.addr)
    }

    /// Answer `method path` (relative to the API root) with JSON.
    pub fn respond(&self, method: Method, path: &str, status: StatusCode, body: &Value) {
        lock(&self.state.routes)
            .entry((method, path.to_owned()))
            .or_default()
            .push_back((status, body.to_string()));
    }

    /// Answer `method path` with 200 and `body`.
    pub fn ok(&self, method: Method, path: &str, body: &Value) {
        self.respond(method, path, StatusCode::OK, body);
    }

    /// Every request so far, oldest first.
    #[must_use]
    pub fn requests(&self) -> Vec<Recorded> {
        lock(&self.state.requests).clone()
    }

    /// `METHOD path` of every request so far.
    #[must_use]
    pub fn request_lines(&self) -> Vec<String> {
        self.requests()
            .iter()
            .map(|r| format!("{} {}", r.method, r.path))
            .collect()
    }

    /// Forget recorded requests.
    pub fn clear_requests(&self) {
        lock(&self.state.requests).clear();
    }

    /// A client configuration for this backend with session storage at
    /// `storage`.
    ///
    /// # Errors
    ///
    /// Propagates `ConfigError` (never expected for a bound address).
    pub fn config(
        &self,
        storage: impl Into<PathBuf>,
    ) -> Result<ClientConfig, scuffmart_client::ConfigError> {
        ClientConfig::for_api(&self.api_url(), storage)
    }

    /// A fully wired `App` using the real HTTP client against this backend.
    ///
    /// # Errors
    ///
    /// Returns a boxed error if the configuration or client cannot be built.
    pub fn app(&self, name: &str) -> Result<App, Box<dyn std::error::Error>> {
        Ok(App::new(self.config(temp_storage(name))?)?)
    }
}

/// Fresh storage file path under the system temp directory.
#[must_use]
pub fn temp_storage(name: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!(
        "scuffmart-it-{name}-{}",
        std::process::id()
    ));
    let _ = std::fs::remove_dir_all(&dir);
    dir.join("storage.json")
}

async fn handle(State(state): State<Arc<BackendState>>, request: Request) -> Response {
    let method = request.method().clone();
    let path = request
        .uri()
        .path()
        .trim_start_matches("/api/")
        .to_owned();
    let authorization = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .map(str::to_owned);
    let is_multipart = request
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|ct| ct.starts_with("multipart/form-data"));

    let (body, fields) = if is_multipart {
        (String::new(), read_fields(request).await)
    } else {
        let bytes = to_bytes(request.into_body(), usize::MAX)
            .await
            .unwrap_or_default();
        (String::from_utf8_lossy(&bytes).into_owned(), Vec::new())
    };

    let key = (method.clone(), path.clone());
    lock(&state.requests).push(Recorded {
        method,
        path,
        authorization,
        body,
        fields,
    });

    let answer = {
        let mut routes = lock(&state.routes);
        routes.get_mut(&key).and_then(|queue| {
            if queue.len() > 1 {
                queue.pop_front()
            } else {
                queue.front().cloned()
            }
        })
    };
    let (status, body) = answer.unwrap_or_else(|| {
        (
            StatusCode::NOT_FOUND,
            r#"{"message":"Route not found"}"#.to_owned(),
        )
    });
    (status, [(header::CONTENT_TYPE, "application/json")], body).into_response()
}

async fn read_fields(request: Request) -> Vec<FormField> {
    let Ok(mut multipart) = Multipart::from_request(request, &()).await else {
        return Vec::new();
    };
    let mut fields = Vec::new();
    while let Ok(Some(field)) = multipart.next_field().await {
        let name = field.name().unwrap_or_default().to_owned();
        let file_name = field.file_name().map(str::to_owned);
        let value = field
            .bytes()
            .await
            .map(|b| String::from_utf8_lossy(&b).into_owned())
            .unwrap_or_default();
        fields.push(FormField {
            name,
            file_name,
            value,
        });
    }
    fields
}

/// JSON for a user.
#[must_use]
pub fn user_json(id: i32, name: &str, role: &str) -> Value {
    serde_json::json!({
        "id": id,
        "name": name,
        "email": format!("{}@example.com", name.to_lowercase()),
        "role": role,
    })
}

/// JSON for a cart line.
#[must_use]
pub fn line_json(product_id: i32, quantity: u32, price: &str, name: &str) -> Value {
    serde_json::json!({
        "id": product_id * 10,
        "product_id": product_id,
        "quantity": quantity,
        "name": name,
        "price": price,
        "image_url": null,
    })
}

/// JSON for a product.
#[must_use]
pub fn product_json(id: i32, name: &str, price: &str, stock: u32) -> Value {
    serde_json::json!({
        "id": id,
        "name": name,
        "description": null,
        "price": price,
        "original_price": null,
        "condition_description": null,
        "image_url": format!("/uploads/{id}.jpg"),
        "stock": stock,
        "created_at": "2024-05-01T12:00:00.000Z",
    })
}
