use axum::{
    middleware::from_fn,
    routing::{get, post},
    Router,
};
use comfort_core::middleware::tracing::request_id_middleware;
use time::Duration;
use tower_http::trace::TraceLayer;
use tower_sessions::{Expiry, MemoryStore, SessionManagerLayer};

use crate::config::SessionSettings;
use crate::handlers::{
    app::{health_check, index},
    auth::{login_handler, login_page, logout_handler},
    customers::{
        create_customer_handler, customers_page, delete_customer_handler, edit_customer_page,
        update_customer_handler,
    },
    invoices::{
        cancel_invoice_handler, create_invoice_handler, invoice_document_page, invoices_page,
        new_invoice_page,
    },
};
use crate::middleware::{auth::auth_middleware, metrics::metrics_middleware};
use crate::AppState;

pub fn build_router(state: AppState, session: &SessionSettings) -> Router {
    // Session setup
    let session_store = MemoryStore::default();
    let session_layer = SessionManagerLayer::new(session_store)
        .with_name(session.cookie_name.clone())
        .with_secure(false) // Set to true in production with HTTPS
        .with_expiry(Expiry::OnInactivity(Duration::hours(session.ttl_hours)));

    // Every route here sits behind the access gate; the public boundary
    // (login, health, metrics) is merged in below it.
    let protected = Router::new()
        .route("/", get(index))
        .route(
            "/customers",
            get(customers_page).post(create_customer_handler),
        )
        .route("/customers/:id/edit", get(edit_customer_page))
        .route("/customers/:id", post(update_customer_handler))
        .route("/customers/:id/delete", post(delete_customer_handler))
        .route("/invoices", get(invoices_page).post(create_invoice_handler))
        .route("/invoices/new", get(new_invoice_page))
        .route("/invoices/:invoice_no/document", get(invoice_document_page))
        .route("/invoices/:invoice_no/cancel", post(cancel_invoice_handler))
        .route_layer(from_fn(auth_middleware));

    Router::new()
        .merge(protected)
        .route("/health", get(health_check))
        .route("/metrics", get(crate::handlers::metrics::metrics))
        .route("/login", get(login_page).post(login_handler))
        .route("/logout", get(logout_handler))
        .layer(session_layer)
        .layer(from_fn(metrics_middleware))
        // Add tracing layer
        .layer(
            TraceLayer::new_for_http().make_span_with(|request: &axum::http::Request<_>| {
                let request_id = request
                    .headers()
                    .get("x-request-id")
                    .and_then(|value| value.to_str().ok())
                    .unwrap_or("-");

                tracing::info_span!(
                    "http_request",
                    request_id = %request_id,
                    method = %request.method(),
                    uri = %request.uri(),
                    version = ?request.version(),
                )
            }),
        )
        // Add tracing middleware for request_id
        .layer(from_fn(request_id_middleware))
        .with_state(state)
}
