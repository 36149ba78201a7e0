//! End-to-end tests for the FastBite client runtime.
//!
//! Tests run against [`MockBackend`], an in-process axum server that speaks
//! the ordering backend's HTTP and server-sent events contract on an
//! ephemeral port. No external services are needed:
//!
//! ```bash
//! cargo test -p fastbite-integration-tests
//! ```
//!
//! Seeded accounts all use the password [`PASSWORD`]:
//! `cliente@fastbite.com` (`CLIENTE`), `cocina@fastbite.com` (`COCINA`),
//! `repartidor@fastbite.com` (`REPARTIDOR`).
//!
//! Besides the real endpoints the mock serves a few `/quirks/*` routes that
//! misbehave in specific ways (empty bodies, non-JSON bodies, wrong stream
//! content type).

use std::collections::HashMap;
use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use axum::extract::{Path, Request, State};
use axum::http::{HeaderMap, StatusCode, header};
use axum::middleware::{self, Next};
use axum::response::sse::{Event, Sse};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, patch, post};
use axum::{Json, Router};
use futures::{Stream, StreamExt, stream};
use serde_json::{Value, json};
use tokio::task::JoinHandle;

use fastbite_client::{ClientConfig, LogNotifier, MemoryStore, Runtime, WatchNavigator};

/// Password of every seeded account.
pub const PASSWORD: &str = "secret";

/// One request as seen by the mock.
#[derive(Debug, Clone)]
pub struct SeenRequest {
    pub method: String,
    pub path: String,
    pub authorization: Option<String>,
    pub content_type: Option<String>,
    pub last_event_id: Option<String>,
    pub custom: Option<String>,
}

impl SeenRequest {
    fn from_request(request: &Request) -> Self {
        let headers = request.headers();
        let header = |name: &str| {
            headers
                .get(name)
                .and_then(|v| v.to_str().ok())
                .map(str::to_owned)
        };
        Self {
            method: request.method().to_string(),
            path: request.uri().path().to_owned(),
            authorization: header("authorization"),
            content_type: header("content-type"),
            last_event_id: header("last-event-id"),
            custom: header("x-fastbite-test"),
        }
    }
}

struct Account {
    id: u64,
    email: String,
    name: String,
    role: String,
}

#[derive(Default)]
struct Recorded {
    accounts: Vec<Account>,
    tokens: HashMap<String, u64>,
    requests: Vec<SeenRequest>,
    orders: Vec<Value>,
    comments: Vec<Value>,
}

#[derive(Clone, Default)]
struct MockState {
    inner: Arc<Mutex<Recorded>>,
}

impl MockState {
    fn seeded() -> Self {
        let state = Self::default();
        state.lock().accounts = [
            (1, "cliente@fastbite.com", "Ana", "CLIENTE"),
            (2, "cocina@fastbite.com", "Chef", "COCINA"),
            (3, "repartidor@fastbite.com", "Leo", "REPARTIDOR"),
        ]
        .into_iter()
        .map(|(id, email, name, role)| Account {
            id,
            email: email.to_owned(),
            name: name.to_owned(),
            role: role.to_owned(),
        })
        .collect();
        state
    }

    fn lock(&self) -> MutexGuard<'_, Recorded> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Role and id of the bearer of a valid token.
    fn caller(&self, headers: &HeaderMap) -> Option<(u64, String)> {
        let token = headers
            .get(header::AUTHORIZATION)?
            .to_str()
            .ok()?
            .strip_prefix("Bearer ")?;
        let recorded = self.lock();
        let id = *recorded.tokens.get(token)?;
        let account = recorded.accounts.iter().find(|a| a.id == id)?;
        Some((id, account.role.clone()))
    }

    fn issue(&self, account_id: u64) -> Value {
        let token = format!("tok-{}", uuid::Uuid::new_v4());
        let mut recorded = self.lock();
        recorded.tokens.insert(token.clone(), account_id);
        let account = recorded
            .accounts
            .iter()
            .find(|a| a.id == account_id)
            .map(|a| {
                json!({
                    "token": token,
                    "userId": a.id,
                    "email": a.email,
                    "name": a.name,
                    "role": a.role,
                })
            });
        account.unwrap_or(Value::Null)
    }
}

/// A running mock backend.
pub struct MockBackend {
    addr: SocketAddr,
    state: MockState,
    task: JoinHandle<()>,
}

impl MockBackend {
    /// Start a backend on an ephemeral local port.
    ///
    /// # Panics
    ///
    /// Panics if the listener cannot be bound.
    #[allow(clippy::expect_used)]
    pub async fn spawn() -> Self {
        let state = MockState::seeded();
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind mock backend");
        let addr = listener.local_addr().expect("mock backend address");

        let app = router(state.clone());
        let task = tokio::spawn(async move {
            let _ = axum::serve(listener, app).await;
        });

        Self { addr, state, task }
    }

    /// API base URL, including the `/api` prefix.
    #[must_use]
    pub fn api_url(&self) -> String {
        format!("http://{}/api", self.addr)
    }

    /// Client configuration pointing at this backend, with fast reconnects.
    ///
    /// # Panics
    ///
    /// Panics if the URL is rejected.
    #[must_use]
    #[allow(clippy::expect_used)]
    pub fn config(&self) -> ClientConfig {
        let mut config = ClientConfig::for_api_url(&self.api_url()).expect("mock api url");
        config.request_timeout = Duration::from_secs(5);
        config.stream.retry_delay = Duration::from_millis(50);
        config
    }

    /// A runtime over in-memory storage, plus its navigator.
    ///
    /// # Panics
    ///
    /// Panics if the runtime cannot be built.
    #[must_use]
    #[allow(clippy::expect_used)]
    pub fn runtime(&self) -> (Runtime, Arc<WatchNavigator>) {
        let navigator = Arc::new(WatchNavigator::new());
        let runtime = Runtime::new(
            self.config(),
            Arc::new(MemoryStore::new()),
            navigator.clone(),
            Arc::new(LogNotifier),
        )
        .expect("runtime");
        (runtime, navigator)
    }

    /// Every request received so far.
    #[must_use]
    pub fn requests(&self) -> Vec<SeenRequest> {
        self.state.lock().requests.clone()
    }

    /// Requests received for `path` (without the `/api` prefix).
    #[must_use]
    pub fn requests_to(&self, path: &str) -> Vec<SeenRequest> {
        let full = format!("/api{path}");
        self.requests().into_iter().filter(|r| r.path == full).collect()
    }

    /// Bodies of accepted orders.
    #[must_use]
    pub fn orders(&self) -> Vec<Value> {
        self.state.lock().orders.clone()
    }

    /// Invalidate every issued token, as if they had expired.
    pub fn revoke_all(&self) {
        self.state.lock().tokens.clear();
    }
}

impl Drop for MockBackend {
    fn drop(&mut self) {
        self.task.abort();
    }
}

fn router(state: MockState) -> Router {
    let api = Router::new()
        .route("/auth/login", post(login))
        .route("/auth/register", post(register))
        .route("/products", get(products))
        .route("/products/{id}", get(product))
        .route("/orders", post(create_order))
        .route("/orders/my", get(my_orders))
        .route("/orders/kitchen", get(kitchen_orders))
        .route("/orders/delivery", get(delivery_orders))
        .route("/orders/stream", get(order_stream))
        .route("/orders/{id}", get(order))
        .route("/orders/{id}/status", patch(update_status))
        .route("/orders/{id}/comments", get(comments).post(add_comment))
        .route("/orders/{id}/stream", get(single_order_stream))
        .route("/orders/{id}/comments/stream", get(comment_stream))
        .route("/quirks/empty", get(|| async { StatusCode::OK }))
        .route("/quirks/no-content", post(|| async { StatusCode::NO_CONTENT }))
        .route("/quirks/garbage", get(|| async { "<html>oops</html>" }))
        .route(
            "/quirks/blank-error",
            get(|| async { StatusCode::INTERNAL_SERVER_ERROR }),
        )
        .route(
            "/quirks/stream",
            get(|| async { Json(json!({"not": "a stream"})) }),
        )
        .route("/quirks/endless-block", get(endless_block));

    Router::new()
        .nest("/api", api)
        .layer(middleware::from_fn_with_state(state.clone(), record))
        .with_state(state)
}

async fn record(State(state): State<MockState>, request: Request, next: Next) -> Response {
    let seen = SeenRequest::from_request(&request);
    state.lock().requests.push(seen);
    next.run(request).await
}

// =============================================================================
// Auth
// =============================================================================

async fn login(State(state): State<MockState>, Json(body): Json<Value>) -> Response {
    let email = body["email"].as_str().unwrap_or_default().to_lowercase();
    let password = body["password"].as_str().unwrap_or_default();

    let account_id = state
        .lock()
        .accounts
        .iter()
        .find(|a| a.email == email)
        .map(|a| a.id);
    match account_id {
        Some(id) if password == PASSWORD => Json(state.issue(id)).into_response(),
        _ => (StatusCode::BAD_REQUEST, "Credenciales inválidas").into_response(),
    }
}

async fn register(State(state): State<MockState>, Json(body): Json<Value>) -> Response {
    let email = body["email"].as_str().unwrap_or_default().to_lowercase();
    let id = {
        let mut recorded = state.lock();
        if recorded.accounts.iter().any(|a| a.email == email) {
            return (StatusCode::BAD_REQUEST, "El email ya está registrado").into_response();
        }
        let id = recorded.accounts.len() as u64 + 1;
        recorded.accounts.push(Account {
            id,
            email,
            name: body["name"].as_str().unwrap_or_default().to_owned(),
            role: body["role"].as_str().unwrap_or("CLIENTE").to_owned(),
        });
        id
    };
    Json(state.issue(id)).into_response()
}

// =============================================================================
// Products
// =============================================================================

fn catalog() -> Vec<Value> {
    vec![
        json!({"id": 1, "name": "Taco", "price": 3.50, "category": "Mexicana", "available": true}),
        json!({"id": 2, "name": "Papas Fritas", "price": "4.00", "available": true}),
        json!({"id": 3, "name": "Agua Mineral", "price": 1.25, "available": false}),
    ]
}

async fn products() -> Json<Vec<Value>> {
    Json(catalog())
}

async fn product(Path(id): Path<String>) -> Response {
    catalog()
        .into_iter()
        .find(|p| p["id"].to_string() == id)
        .map_or_else(
            || (StatusCode::NOT_FOUND, format!("Producto no encontrado: {id}")).into_response(),
            |p| Json(p).into_response(),
        )
}

// =============================================================================
// Orders
// =============================================================================

async fn create_order(
    State(state): State<MockState>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    let Some((customer_id, role)) = state.caller(&headers) else {
        return StatusCode::UNAUTHORIZED.into_response();
    };
    if role != "CLIENTE" {
        return (StatusCode::FORBIDDEN, "Solo clientes pueden crear pedidos").into_response();
    }

    let catalog = catalog();
    let mut total = 0.0;
    let mut items = Vec::new();
    for line in body["items"].as_array().cloned().unwrap_or_default() {
        let Some(product) = catalog
            .iter()
            .find(|p| p["id"].to_string() == line["productId"].as_str().unwrap_or_default())
        else {
            return (
                StatusCode::BAD_REQUEST,
                format!("Producto no encontrado: {}", line["productId"]),
            )
                .into_response();
        };
        let price = product["price"]
            .as_f64()
            .or_else(|| product["price"].as_str().and_then(|p| p.parse().ok()))
            .unwrap_or_default();
        let quantity = line["quantity"].as_u64().unwrap_or_default();
        #[allow(clippy::cast_precision_loss)]
        {
            total += price * quantity as f64;
        }
        items.push(json!({
            "productId": product["id"],
            "productName": product["name"],
            "unitPrice": price,
            "quantity": quantity,
        }));
    }

    let mut recorded = state.lock();
    recorded.orders.push(body.clone());
    let order = json!({
        "id": 100 + recorded.orders.len(),
        "customerId": customer_id,
        "deliveryAddress": body["deliveryAddress"],
        "notes": body["notes"],
        "items": items,
        "total": format!("{total:.2}"),
        "status": "RECIBIDO",
        "createdAt": "2024-05-01T12:00:00Z",
    });
    (StatusCode::CREATED, Json(order)).into_response()
}

async fn my_orders(State(state): State<MockState>, headers: HeaderMap) -> Response {
    if state.caller(&headers).is_none() {
        return StatusCode::UNAUTHORIZED.into_response();
    }
    Json(json!([])).into_response()
}

async fn kitchen_orders(State(state): State<MockState>, headers: HeaderMap) -> Response {
    match state.caller(&headers) {
        None => StatusCode::UNAUTHORIZED.into_response(),
        // Role mismatch answers with no body at all.
        Some((_, role)) if role != "COCINA" => StatusCode::FORBIDDEN.into_response(),
        Some(_) => Json(json!([
            {"id": 7, "status": "RECIBIDO", "customerName": "Ana", "total": 7.00, "items": []},
            {"id": 8, "status": "PREPARANDO", "customerName": "Luis", "total": "4.00", "items": []}
        ]))
        .into_response(),
    }
}

async fn delivery_orders(State(state): State<MockState>, headers: HeaderMap) -> Response {
    if state.caller(&headers).is_none() {
        return StatusCode::UNAUTHORIZED.into_response();
    }
    Json(json!([{"id": 9, "status": "LISTO", "items": []}])).into_response()
}

async fn order(Path(id): Path<String>) -> Response {
    if id == "404" {
        return (StatusCode::NOT_FOUND, format!("Pedido no encontrado: {id}")).into_response();
    }
    Json(json!({"id": id, "status": "PREPARANDO", "items": []})).into_response()
}

async fn update_status(Path(id): Path<String>, Json(body): Json<Value>) -> Json<Value> {
    Json(json!({"id": id, "status": body["status"], "items": []}))
}

async fn comments(State(state): State<MockState>, Path(id): Path<String>) -> Json<Vec<Value>> {
    let comments = state
        .lock()
        .comments
        .iter()
        .filter(|c| c["orderId"] == id.as_str())
        .cloned()
        .collect();
    Json(comments)
}

async fn add_comment(
    State(state): State<MockState>,
    Path(id): Path<String>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    let Some((user_id, role)) = state.caller(&headers) else {
        return StatusCode::UNAUTHORIZED.into_response();
    };
    let comment = json!({
        "id": uuid::Uuid::new_v4().to_string(),
        "orderId": id,
        "userId": user_id,
        "userRole": role,
        "message": body["message"],
    });
    state.lock().comments.push(comment.clone());
    (StatusCode::CREATED, Json(comment)).into_response()
}

// =============================================================================
// Streams
// =============================================================================

type EventStream = Sse<std::pin::Pin<Box<dyn Stream<Item = Result<Event, Infallible>> + Send>>>;

/// Serve `events` and then hold the connection open.
fn hold_open(events: Vec<Event>) -> EventStream {
    let events = stream::iter(events.into_iter().map(Ok)).chain(stream::pending());
    Sse::new(Box::pin(events))
}

async fn order_stream() -> EventStream {
    hold_open(vec![
        Event::default()
            .id("1")
            .data(r#"{"eventType":"STATUS_CHANGED","orderId":7,"status":"PREPARANDO"}"#),
        Event::default().id("2").data("{not json"),
        Event::default().comment("keep-alive"),
        Event::default()
            .id("3")
            .data(r#"{"eventType":"CREATED","orderId":8,"status":"RECIBIDO"}"#),
    ])
}

/// An event stream whose first block never ends.
async fn endless_block() -> Response {
    let body = format!("data: {}", "x".repeat(2 * 1024 * 1024));
    ([(header::CONTENT_TYPE, "text/event-stream")], body).into_response()
}

async fn single_order_stream(Path(id): Path<String>) -> Response {
    if id == "404" {
        return (StatusCode::NOT_FOUND, "Pedido no encontrado").into_response();
    }

    // Emits one event and ends the stream, so clients reconnect.
    let event = Event::default()
        .id(format!("{id}-1"))
        .retry(Duration::from_millis(50))
        .data(json!({"eventType": "STATUS_CHANGED", "orderId": id, "status": "LISTO"}).to_string());
    Sse::new(stream::iter([Ok::<_, Infallible>(event)])).into_response()
}

async fn comment_stream(Path(id): Path<String>) -> EventStream {
    hold_open(vec![
        Event::default().data(
            json!({"orderId": id, "userName": "Chef", "userRole": "COCINA", "message": "Listo en 5"})
                .to_string(),
        ),
    ])
}
