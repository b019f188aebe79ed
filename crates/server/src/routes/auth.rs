use std::sync::Arc;

use axum::{Json, extract::{rejection::JsonRejection, State, Request}, http::{header, HeaderMap, Method, StatusCode}, middleware::Next, response::Response};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use serde::Serialize;

use common::types::ApiResponse;
use service::auth::{domain::{AuthUser, LoginInput, RegisterInput}, AuthService};
use service::entry::EntryService;

use crate::errors::JsonApiError;

/// Cookie carrying the session token for browser clients.
pub const AUTH_COOKIE: &str = "auth_token";

#[derive(Clone)]
pub struct ServerState {
    pub auth: Arc<AuthService>,
    pub entries: Arc<EntryService>,
}

#[derive(Debug, Serialize)]
pub struct LoginOutput { pub token: String, pub user: AuthUser }

#[utoipa::path(post, path = "/auth/register", tag = "auth", request_body = crate::openapi::RegisterRequest, responses((status = 201, description = "Registered"), (status = 400, description = "Bad Request"), (status = 409, description = "Conflict")))]
pub async fn register(
    State(state): State<ServerState>,
    body: Result<Json<RegisterInput>, JsonRejection>,
) -> Result<(StatusCode, Json<ApiResponse<AuthUser>>), JsonApiError> {
    let Json(input) = body.map_err(JsonApiError::bad_body)?;
    let user = state.auth.register(input).await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::ok(user, "User registered successfully"))))
}

#[utoipa::path(post, path = "/auth/login", tag = "auth", request_body = crate::openapi::LoginRequest, responses((status = 200, description = "Logged In"), (status = 401, description = "Unauthorized")))]
pub async fn login(
    State(state): State<ServerState>,
    jar: CookieJar,
    body: Result<Json<LoginInput>, JsonRejection>,
) -> Result<(CookieJar, Json<ApiResponse<LoginOutput>>), JsonApiError> {
    let Json(input) = body.map_err(JsonApiError::bad_body)?;
    let session = state.auth.login(input).await?;
    let token = session.token.ok_or_else(|| {
        JsonApiError::new(StatusCode::INTERNAL_SERVER_ERROR, "Internal server error", Some("token generation failed".into()))
    })?;

    let mut cookie = Cookie::new(AUTH_COOKIE, token.clone());
    cookie.set_path("/");
    cookie.set_http_only(true);
    cookie.set_secure(false);
    cookie.set_same_site(SameSite::Lax);
    let jar = jar.add(cookie);
    Ok((jar, Json(ApiResponse::ok(LoginOutput { token, user: session.user }, "Login successful"))))
}

pub async fn logout(jar: CookieJar) -> (CookieJar, StatusCode) {
    // same path as the login cookie
    let mut cookie = Cookie::from(AUTH_COOKIE);
    cookie.set_path("/");
    let jar = jar.remove(cookie);
    (jar, StatusCode::NO_CONTENT)
}

/// Bearer token from `Authorization`, falling back to the `auth_token` cookie.
fn extract_token(headers: &HeaderMap) -> Result<Option<String>, JsonApiError> {
    if let Some(h) = headers.get(header::AUTHORIZATION).and_then(|v| v.to_str().ok()) {
        return match h.strip_prefix("Bearer ") {
            Some(t) if !t.trim().is_empty() => Ok(Some(t.trim().to_string())),
            _ => Err(JsonApiError::unauthorized("Invalid Authorization header")),
        };
    }
    Ok(CookieJar::from_headers(headers)
        .get(AUTH_COOKIE)
        .map(|c| c.value().to_string())
        .filter(|t| !t.is_empty()))
}

/// 受保护路由中间件：校验 Authorization: Bearer <token>（或 auth_token Cookie），
/// 成功后把 Principal 注入请求扩展；缺失或非法均返回 401
pub async fn require_bearer_token(
    State(state): State<ServerState>,
    mut req: Request,
    next: Next,
) -> Result<Response, JsonApiError> {
    // CORS 预检直接放行
    if req.method() == Method::OPTIONS {
        return Ok(next.run(req).await);
    }

    let token = match extract_token(req.headers())? {
        Some(t) => t,
        None => {
            tracing::warn!(path = %req.uri().path(), "missing Authorization header and auth_token cookie");
            return Err(JsonApiError::unauthorized("No token provided"));
        }
    };

    match state.auth.verify_token(&token) {
        Ok(principal) => {
            req.extensions_mut().insert(principal);
            Ok(next.run(req).await)
        }
        Err(e) => {
            tracing::warn!(path = %req.uri().path(), err = %e, "token validation failed");
            Err(JsonApiError::unauthorized("Invalid or expired token"))
        }
    }
}
