//! Web admin panel: env-credential login, in-memory session tokens,
//! dashboard and order listing.

use std::sync::Arc;

use axum::extract::State;
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::{Html, IntoResponse, Redirect, Response};
use axum::Form;
use dashmap::DashMap;
use serde::Deserialize;
use uuid::Uuid;

use crate::core::config;
use crate::storage::{get_connection, tickets};
use crate::web::pages;
use crate::web::server::WebState;

const SESSION_COOKIE: &str = "admin_session";

/// Active session tokens. Lives for the process lifetime; restarting the
/// server logs everyone out.
pub type SessionMap = Arc<DashMap<String, chrono::DateTime<chrono::Utc>>>;

#[derive(Debug, Deserialize)]
pub struct LoginForm {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
}

/// Check the login form against the configured credentials. An empty
/// configured password always rejects.
pub fn credentials_valid(username: &str, password: &str) -> bool {
    let expected_password = config::admin::WEB_ADMIN_PASSWORD.as_str();
    !expected_password.is_empty()
        && username == config::admin::WEB_ADMIN_USER.as_str()
        && password == expected_password
}

/// Extract the session token from a Cookie header.
pub fn session_token(headers: &HeaderMap) -> Option<String> {
    let cookies = headers.get(header::COOKIE)?.to_str().ok()?;
    cookies.split(';').find_map(|pair| {
        let (key, value) = pair.trim().split_once('=')?;
        (key == SESSION_COOKIE).then(|| value.to_string())
    })
}

fn is_authenticated(state: &WebState, headers: &HeaderMap) -> bool {
    session_token(headers)
        .map(|token| state.sessions.contains_key(&token))
        .unwrap_or(false)
}

/// GET /admin/login
pub async fn login_page(axum::extract::Query(params): axum::extract::Query<LoginQuery>) -> Html<String> {
    Html(pages::render_admin_login(params.error.is_some()))
}

#[derive(Debug, Deserialize)]
pub struct LoginQuery {
    pub error: Option<String>,
}

/// POST /admin/authenticate
pub async fn authenticate(State(state): State<WebState>, Form(form): Form<LoginForm>) -> Response {
    if !credentials_valid(&form.username, &form.password) {
        log::warn!("Failed admin login attempt for '{}'", form.username);
        return Redirect::to("/admin/login?error=1").into_response();
    }

    let token = Uuid::new_v4().to_string();
    state.sessions.insert(token.clone(), chrono::Utc::now());

    let cookie = format!("{SESSION_COOKIE}={token}; HttpOnly; Path=/admin; SameSite=Lax");
    ([(header::SET_COOKIE, cookie)], Redirect::to("/admin/dashboard")).into_response()
}

/// GET /admin/dashboard
pub async fn dashboard(State(state): State<WebState>, headers: HeaderMap) -> Response {
    if !is_authenticated(&state, &headers) {
        return Redirect::to("/admin/login").into_response();
    }

    let open_tickets = match get_connection(&state.db) {
        Ok(conn) => tickets::count_open_tickets(&conn).unwrap_or(0),
        Err(e) => {
            log::error!("Failed to get DB connection for dashboard: {}", e);
            0
        }
    };
    let unread = state.contact_log.unread_count();

    Html(pages::render_admin_dashboard(unread, open_tickets)).into_response()
}

/// GET /admin/orders
pub async fn orders(State(state): State<WebState>, headers: HeaderMap) -> Response {
    if !is_authenticated(&state, &headers) {
        return Redirect::to("/admin/login").into_response();
    }

    let entries = state.contact_log.load();
    Html(pages::render_admin_orders(&entries)).into_response()
}

/// Anything else under /admin
pub async fn not_found() -> Response {
    (StatusCode::NOT_FOUND, Html(pages::render_not_found())).into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn session_token_parses_cookie_header() {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::COOKIE,
            HeaderValue::from_static("theme=dark; admin_session=abc-123; other=1"),
        );
        assert_eq!(session_token(&headers), Some("abc-123".to_string()));
    }

    #[test]
    fn session_token_missing_cookie_is_none() {
        let headers = HeaderMap::new();
        assert_eq!(session_token(&headers), None);

        let mut headers = HeaderMap::new();
        headers.insert(header::COOKIE, HeaderValue::from_static("theme=dark"));
        assert_eq!(session_token(&headers), None);
    }
}
