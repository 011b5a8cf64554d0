//! In-process mock of the user-management API for integration tests.
//!
//! Each test spawns its own server on an ephemeral port, so counters and
//! switches in `MockState` are never shared between tests.

#![allow(dead_code)]

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::body::Bytes;
use axum::extract::{Path, Query, State};
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{delete, get, post};
use axum::{Json, Router};
use serde_json::{json, Value};
use tokio::net::TcpListener;

use rollcall_core::{ApiClient, CookieJar, SessionManager, TokenStore};

pub const LOGIN_ID: &str = "teacher1";
pub const PASSWORD: &str = "pass1234";
pub const SESSION_COOKIE: &str = "refresh_token";

#[derive(Debug, Clone)]
pub struct BulkCall {
    pub path: String,
    pub dry_run: String,
    pub content_type: String,
    pub body: Vec<u8>,
}

pub struct MockState {
    pub refresh_calls: AtomicUsize,
    pub me_calls: AtomicUsize,
    pub login_calls: AtomicUsize,
    pub logout_calls: AtomicUsize,
    pub refresh_ok: AtomicBool,
    pub refresh_requires_cookie: AtomicBool,
    pub refresh_saw_bearer: AtomicBool,
    pub refresh_delay_ms: AtomicU64,
    pub logout_fails: AtomicBool,
    /// Token handed out by refresh; `None` numbers them `tok-1`, `tok-2`, ...
    pub fixed_refresh_token: Mutex<Option<String>>,
    pub me_role: Mutex<String>,
    pub valid_tokens: Mutex<HashSet<String>>,
    pub last_list_query: Mutex<Option<HashMap<String, String>>>,
    pub last_export_query: Mutex<Option<HashMap<String, String>>>,
    pub created: Mutex<Vec<(String, Value)>>,
    pub deleted: Mutex<Vec<i64>>,
    pub bulk_calls: Mutex<Vec<BulkCall>>,
}

impl Default for MockState {
    fn default() -> Self {
        Self {
            refresh_calls: AtomicUsize::new(0),
            me_calls: AtomicUsize::new(0),
            login_calls: AtomicUsize::new(0),
            logout_calls: AtomicUsize::new(0),
            refresh_ok: AtomicBool::new(true),
            refresh_requires_cookie: AtomicBool::new(false),
            refresh_saw_bearer: AtomicBool::new(false),
            refresh_delay_ms: AtomicU64::new(0),
            logout_fails: AtomicBool::new(false),
            fixed_refresh_token: Mutex::new(None),
            me_role: Mutex::new("admin".to_string()),
            valid_tokens: Mutex::new(HashSet::new()),
            last_list_query: Mutex::new(None),
            last_export_query: Mutex::new(None),
            created: Mutex::new(Vec::new()),
            deleted: Mutex::new(Vec::new()),
            bulk_calls: Mutex::new(Vec::new()),
        }
    }
}

impl MockState {
    pub fn refresh_count(&self) -> usize {
        self.refresh_calls.load(Ordering::SeqCst)
    }

    pub fn me_count(&self) -> usize {
        self.me_calls.load(Ordering::SeqCst)
    }

    pub fn set_refresh_ok(&self, ok: bool) {
        self.refresh_ok.store(ok, Ordering::SeqCst);
    }

    pub fn set_me_role(&self, role: &str) {
        *self.me_role.lock().unwrap() = role.to_string();
    }

    fn is_authorized(&self, headers: &HeaderMap) -> bool {
        bearer(headers)
            .map(|t| self.valid_tokens.lock().unwrap().contains(&t))
            .unwrap_or(false)
    }
}

fn bearer(headers: &HeaderMap) -> Option<String> {
    headers
        .get(header::AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
        .map(str::to_string)
}

fn unauthorized() -> Response {
    (
        StatusCode::UNAUTHORIZED,
        Json(json!({"detail": "Could not validate credentials"})),
    )
        .into_response()
}

async fn refresh(State(state): State<Arc<MockState>>, headers: HeaderMap) -> Response {
    let n = state.refresh_calls.fetch_add(1, Ordering::SeqCst) + 1;
    if headers.contains_key(header::AUTHORIZATION) {
        state.refresh_saw_bearer.store(true, Ordering::SeqCst);
    }

    let delay = state.refresh_delay_ms.load(Ordering::SeqCst);
    if delay > 0 {
        tokio::time::sleep(Duration::from_millis(delay)).await;
    }

    if !state.refresh_ok.load(Ordering::SeqCst) {
        return (
            StatusCode::UNAUTHORIZED,
            Json(json!({"detail": "Refresh token expired"})),
        )
            .into_response();
    }

    if state.refresh_requires_cookie.load(Ordering::SeqCst) {
        let has_cookie = headers
            .get(header::COOKIE)
            .and_then(|v| v.to_str().ok())
            .map(|v| v.contains(&format!("{}=", SESSION_COOKIE)))
            .unwrap_or(false);
        if !has_cookie {
            return unauthorized();
        }
    }

    let token = state
        .fixed_refresh_token
        .lock()
        .unwrap()
        .clone()
        .unwrap_or_else(|| format!("tok-{}", n));
    state.valid_tokens.lock().unwrap().insert(token.clone());

    Json(json!({"access_token": token, "token_type": "bearer", "expires_in": 900})).into_response()
}

async fn login_local(State(state): State<Arc<MockState>>, Json(body): Json<Value>) -> Response {
    state.login_calls.fetch_add(1, Ordering::SeqCst);
    if body["login_id"] != LOGIN_ID || body["password"] != PASSWORD {
        return (
            StatusCode::UNAUTHORIZED,
            Json(json!({"detail": "Invalid login"})),
        )
            .into_response();
    }

    state.valid_tokens.lock().unwrap().insert("login-tok".to_string());
    (
        StatusCode::OK,
        [(
            header::SET_COOKIE,
            format!("{}=cookie-1; Path=/; HttpOnly; Max-Age=604800", SESSION_COOKIE),
        )],
        Json(json!({"token": {"access_token": "login-tok", "token_type": "bearer", "expires_in": 900}})),
    )
        .into_response()
}

async fn google_login() -> Response {
    Json(json!({"authorization_url": "https://accounts.google.com/o/oauth2/auth?state=xyz"}))
        .into_response()
}

async fn logout(State(state): State<Arc<MockState>>) -> Response {
    state.logout_calls.fetch_add(1, Ordering::SeqCst);
    if state.logout_fails.load(Ordering::SeqCst) {
        return (StatusCode::INTERNAL_SERVER_ERROR, "boom").into_response();
    }
    (
        StatusCode::OK,
        [(header::SET_COOKIE, format!("{}=; Path=/; Max-Age=0", SESSION_COOKIE))],
        Json(json!({"ok": true})),
    )
        .into_response()
}

async fn me(State(state): State<Arc<MockState>>, headers: HeaderMap) -> Response {
    state.me_calls.fetch_add(1, Ordering::SeqCst);
    if !state.is_authorized(&headers) {
        return unauthorized();
    }
    let role = state.me_role.lock().unwrap().clone();
    Json(json!({
        "id": 1,
        "full_name": "管理 太郎",
        "full_name_kana": "カンリ タロウ",
        "email": "admin@example.com",
        "role": role,
        "school_person_id": null,
        "grade": null,
        "class_name": null,
        "gender": "male",
        "date_of_birth": "1980-05-05"
    }))
    .into_response()
}

async fn list_users(
    State(state): State<Arc<MockState>>,
    headers: HeaderMap,
    Query(query): Query<HashMap<String, String>>,
) -> Response {
    if !state.is_authorized(&headers) {
        return unauthorized();
    }
    let page: u32 = query.get("page").and_then(|p| p.parse().ok()).unwrap_or(1);
    let page_size: u32 = query.get("page_size").and_then(|p| p.parse().ok()).unwrap_or(20);
    *state.last_list_query.lock().unwrap() = Some(query);

    Json(json!({
        "items": [{
            "id": 42,
            "school_person_id": "S-042",
            "role": "student",
            "full_name": "生徒 花子",
            "full_name_kana": null,
            "date_of_birth": "2010-01-15",
            "email": "hanako@example.com",
            "grade": 1,
            "class_name": "A",
            "gender": "female",
            "is_active": true,
            "is_deleted": false,
            "updated_at": "2024-04-01T09:30:00"
        }],
        "total": 21,
        "page": page,
        "page_size": page_size
    }))
    .into_response()
}

async fn record_create(state: &MockState, headers: &HeaderMap, path: &str, body: Value) -> Response {
    if !state.is_authorized(headers) {
        return unauthorized();
    }
    if body["email"] == "dup@example.com" {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({"detail": "email already registered"})),
        )
            .into_response();
    }
    state.created.lock().unwrap().push((path.to_string(), body));
    (StatusCode::CREATED, Json(json!({"id": 100}))).into_response()
}

async fn create_user(
    State(state): State<Arc<MockState>>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    record_create(&state, &headers, "/admin/users", body).await
}

async fn create_local_user(
    State(state): State<Arc<MockState>>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    record_create(&state, &headers, "/admin/users/local", body).await
}

async fn delete_user(
    State(state): State<Arc<MockState>>,
    headers: HeaderMap,
    Path(id): Path<i64>,
) -> Response {
    if !state.is_authorized(&headers) {
        return unauthorized();
    }
    if id == 404 {
        return (StatusCode::NOT_FOUND, Json(json!({"detail": "User not found"}))).into_response();
    }
    state.deleted.lock().unwrap().push(id);
    Json(json!({"ok": true})).into_response()
}

async fn record_bulk(
    state: &MockState,
    path: &str,
    headers: &HeaderMap,
    query: &HashMap<String, String>,
    body: Bytes,
) -> Response {
    if !state.is_authorized(headers) {
        return unauthorized();
    }
    let content_type = headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string();
    let has_bad_row = String::from_utf8_lossy(&body).contains("bad-row");
    state.bulk_calls.lock().unwrap().push(BulkCall {
        path: path.to_string(),
        dry_run: query.get("dry_run").cloned().unwrap_or_default(),
        content_type,
        body: body.to_vec(),
    });

    let result = if has_bad_row {
        json!({"total": 2, "success": 1, "errors": 1, "rows": [
            {"line_number": 2, "status": "ok"},
            {"line_number": 3, "status": "error", "message": "email is required"}
        ]})
    } else {
        json!({"total": 2, "success": 2, "errors": 0, "rows": [
            {"line_number": 2, "status": "ok"},
            {"line_number": 3, "status": "ok"}
        ]})
    };
    Json(result).into_response()
}

async fn bulk_import(
    State(state): State<Arc<MockState>>,
    headers: HeaderMap,
    Query(query): Query<HashMap<String, String>>,
    body: Bytes,
) -> Response {
    record_bulk(&state, "/admin/users/bulk_import", &headers, &query, body).await
}

async fn bulk_delete(
    State(state): State<Arc<MockState>>,
    headers: HeaderMap,
    Query(query): Query<HashMap<String, String>>,
    body: Bytes,
) -> Response {
    record_bulk(&state, "/admin/users/bulk_delete", &headers, &query, body).await
}

async fn export(
    State(state): State<Arc<MockState>>,
    headers: HeaderMap,
    Query(query): Query<HashMap<String, String>>,
) -> Response {
    if !state.is_authorized(&headers) {
        return unauthorized();
    }
    let csv = if query.get("type").map(String::as_str) == Some("template") {
        "role,full_name,email\n".to_string()
    } else {
        "role,full_name,email\nstudent,生徒 花子,hanako@example.com\n".to_string()
    };
    *state.last_export_query.lock().unwrap() = Some(query);
    ([(header::CONTENT_TYPE, "text/csv; charset=utf-8")], csv).into_response()
}

pub struct MockServer {
    pub base_url: String,
    pub state: Arc<MockState>,
}

pub async fn spawn() -> MockServer {
    let state = Arc::new(MockState::default());
    let app = Router::new()
        .route("/auth/refresh", post(refresh))
        .route("/auth/login/local", post(login_local))
        .route("/auth/google/login", get(google_login))
        .route("/auth/logout", post(logout))
        .route("/users/me", get(me))
        .route("/admin/users", get(list_users).post(create_user))
        .route("/admin/users/local", post(create_local_user))
        .route("/admin/users/bulk_import", post(bulk_import))
        .route("/admin/users/bulk_delete", post(bulk_delete))
        .route("/admin/users/export", get(export))
        .route("/admin/users/{id}", delete(delete_user))
        .with_state(Arc::clone(&state));

    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind mock server");
    let addr = listener.local_addr().expect("mock server address");
    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("mock server crashed");
    });

    MockServer {
        base_url: format!("http://{}", addr),
        state,
    }
}

/// A session against `server` with a fresh token store and the given jar.
pub fn session_with_jar(server: &MockServer, jar: Arc<CookieJar>) -> (SessionManager, Arc<TokenStore>) {
    let api = ApiClient::new(&server.base_url, jar).expect("Failed to build API client");
    let tokens = Arc::new(TokenStore::new());
    (SessionManager::new(api, Arc::clone(&tokens)), tokens)
}

pub fn session(server: &MockServer) -> (SessionManager, Arc<TokenStore>) {
    session_with_jar(server, Arc::new(CookieJar::in_memory()))
}
