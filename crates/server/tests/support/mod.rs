#![allow(dead_code)]

use std::sync::Arc;

use axum::body::{to_bytes, Body};
use axum::http::{Request, Response};
use axum::Router;
use service::auth::domain::{AuthUser, Role};
use service::auth::repository::mock::MockAuthRepository;
use service::auth::service::{issue_token, AuthConfig};
use service::auth::AuthService;
use service::entry::export::XlsxEncoder;
use service::entry::repository::mock::MemoryEntryRepository;
use service::entry::EntryService;
use tower_http::cors::CorsLayer;

use server::routes::{self, auth::ServerState};

pub const SECRET: &str = "test-secret";

pub struct TestApp {
    pub router: Router,
    pub users: Arc<MockAuthRepository>,
}

/// Router over in-memory repositories; no database needed.
pub fn build_app(allow_admin_signup: bool) -> TestApp {
    let users = Arc::new(MockAuthRepository::default());
    let cfg = AuthConfig { jwt_secret: Some(SECRET.into()), token_ttl_hours: 1, allow_admin_signup };
    let state = ServerState {
        auth: Arc::new(AuthService::new(users.clone(), cfg)),
        entries: Arc::new(EntryService::new(
            Arc::new(MemoryEntryRepository::default()),
            users.clone(),
            Arc::new(XlsxEncoder),
        )),
    };
    let router = routes::build_router(state, CorsLayer::very_permissive(), 2 * 1024 * 1024);
    TestApp { router, users }
}

impl TestApp {
    /// Seed a user and sign a token for it.
    pub async fn login_as(&self, name: &str, role: Role) -> (AuthUser, String) {
        let user = self.users.seed(name, role).await;
        let token = issue_token(SECRET, &user, 1).expect("sign token");
        (user, token)
    }
}

pub fn json_request(method: &str, uri: &str, token: Option<&str>, body: serde_json::Value) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri).header("content-type", "application/json");
    if let Some(t) = token {
        builder = builder.header("authorization", format!("Bearer {t}"));
    }
    builder.body(Body::from(body.to_string())).expect("request")
}

pub fn get_request(uri: &str, token: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().method("GET").uri(uri);
    if let Some(t) = token {
        builder = builder.header("authorization", format!("Bearer {t}"));
    }
    builder.body(Body::empty()).expect("request")
}

pub async fn body_bytes(resp: Response<Body>) -> Vec<u8> {
    to_bytes(resp.into_body(), usize::MAX).await.expect("read body").to_vec()
}

pub async fn body_json(resp: Response<Body>) -> serde_json::Value {
    serde_json::from_slice(&body_bytes(resp).await).expect("json body")
}

pub fn entry_json(name: &str) -> serde_json::Value {
    serde_json::json!({
        "customerName": name,
        "mobileNumber": "9876543210",
        "address": "12 MG Road",
        "organization": "Asha Group",
        "products": "Routers",
        "type": "Customer",
        "category": "Private",
        "city": "Pune",
        "state": "Maharashtra"
    })
}
