//! Public-facing web server: storefront, contact intake, admin panel.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Redirect, Response};
use axum::routing::{get, post};
use axum::{Form, Router};
use dashmap::DashMap;
use serde::Deserialize;
use teloxide::Bot;
use tokio::net::TcpListener;
use tower_http::services::ServeDir;

use crate::core::config;
use crate::storage::contact_log::ContactLog;
use crate::storage::db::DbPool;
use crate::storage::products::ProductStore;
use crate::telegram::menu::WEB_ORDER_TOPIC;
use crate::telegram::notifications::notify_new_ticket;
use crate::web::admin::{self, SessionMap};
use crate::web::intake::{self, ContactForm};
use crate::web::pages;

/// Shared state for the web server.
#[derive(Clone)]
pub struct WebState {
    pub db: Arc<DbPool>,
    pub products: ProductStore,
    pub contact_log: ContactLog,
    pub bot: Bot,
    pub sessions: SessionMap,
}

/// Start the public web server.
pub async fn start_web_server(
    port: u16,
    db: Arc<DbPool>,
    products: ProductStore,
    contact_log: ContactLog,
    bot: Bot,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let state = WebState {
        db,
        products,
        contact_log,
        bot,
        sessions: Arc::new(DashMap::new()),
    };

    let app = Router::new()
        .route("/", get(home_handler))
        .route("/collection", get(collection_handler))
        .route("/contact", get(contact_form_handler))
        .route("/contact", post(contact_submit_handler))
        .route("/contact_success", get(contact_success_handler))
        .route("/product/{slug}", get(product_handler))
        .route("/admin/login", get(admin::login_page))
        .route("/admin/authenticate", post(admin::authenticate))
        .route("/admin/dashboard", get(admin::dashboard))
        .route("/admin/orders", get(admin::orders))
        .route("/health", get(health_handler))
        .nest_service("/static/uploads", ServeDir::new(config::UPLOADS_DIR.as_str()))
        .fallback(admin::not_found)
        .with_state(state);

    log::info!("Starting web server on http://{}", addr);

    let listener = TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// GET /: home page with featured products.
async fn home_handler(State(state): State<WebState>) -> Html<String> {
    let mut featured = state.products.active();
    featured.truncate(6);
    Html(pages::render_home(&featured))
}

#[derive(Debug, Deserialize)]
struct CollectionQuery {
    category: Option<String>,
}

/// GET /collection: catalog grid, optional category filter.
async fn collection_handler(State(state): State<WebState>, Query(query): Query<CollectionQuery>) -> Html<String> {
    let categories = state.products.categories();
    let selected = query.category.as_deref().filter(|c| !c.is_empty());
    let products: Vec<_> = match selected {
        Some(category) => state
            .products
            .by_category(category)
            .into_iter()
            .filter(|p| p.is_active)
            .collect(),
        None => state.products.active(),
    };
    Html(pages::render_collection(&products, &categories, selected))
}

/// GET /product/{slug}: product detail or 404.
async fn product_handler(State(state): State<WebState>, Path(slug): Path<String>) -> Response {
    match state.products.by_slug(&slug).filter(|p| p.is_active) {
        Some(product) => Html(pages::render_product(&product)).into_response(),
        None => (StatusCode::NOT_FOUND, Html(pages::render_not_found())).into_response(),
    }
}

#[derive(Debug, Deserialize)]
struct ContactQuery {
    product: Option<String>,
    error: Option<String>,
}

/// GET /contact: the order form.
async fn contact_form_handler(Query(query): Query<ContactQuery>) -> Html<String> {
    Html(pages::render_contact_form(
        query.error.is_some(),
        query.product.as_deref().unwrap_or(""),
    ))
}

/// POST /contact: validate, persist, relay to admins, redirect.
async fn contact_submit_handler(State(state): State<WebState>, Form(form): Form<ContactForm>) -> Response {
    let Some(clean) = intake::validate(&form) else {
        return Redirect::to("/contact?error=1").into_response();
    };

    let ticket_id = match intake::submit(&state.db, &state.contact_log, &clean) {
        Ok(id) => id,
        Err(e) => {
            log::error!("Failed to persist contact submission: {}", e);
            return Redirect::to("/contact?error=1").into_response();
        }
    };

    // Fire-and-forget fan-out; the customer is not kept waiting on Telegram
    let bot = state.bot.clone();
    let db = Arc::clone(&state.db);
    let body = intake::ticket_body(&clean);
    tokio::spawn(async move {
        notify_new_ticket(&bot, &db, ticket_id, WEB_ORDER_TOPIC, intake::WEB_SENDER_NAME, 0, &body).await;
    });

    Redirect::to("/contact_success").into_response()
}

/// GET /contact_success
async fn contact_success_handler() -> Html<String> {
    Html(pages::render_contact_success())
}

/// GET /health: simple health check.
async fn health_handler() -> impl IntoResponse {
    (StatusCode::OK, "ok")
}
