use std::sync::Arc;
use std::time::Duration;

use auth::Authenticator;
use axum::body::Body;
use axum::http::Request;
use axum::http::Response;
use axum::middleware;
use axum::routing::delete;
use axum::routing::get;
use axum::routing::post;
use axum::routing::put;
use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::Span;

use super::handlers::delete_product::delete_product;
use super::handlers::forgot_password::forgot_password;
use super::handlers::list_accounts::list_accounts;
use super::handlers::login::login;
use super::handlers::reap_inactive::reap_inactive;
use super::handlers::register::register;
use super::handlers::reset_password::reset_password;
use super::handlers::update_role::update_role;
use super::handlers::upgrade_premium::upgrade_premium;
use super::handlers::upload_documents::upload_documents;
use super::middleware::authenticate as auth_middleware;
use crate::domain::account::service::AccountService;
use crate::domain::product::service::ProductService;
use crate::outbound::email::SmtpNotifier;
use crate::outbound::repositories::PostgresAccountRepository;
use crate::outbound::repositories::PostgresProductRepository;
use crate::outbound::storage::FilesystemDocumentStore;

pub type SharedAccountService =
    Arc<AccountService<PostgresAccountRepository, SmtpNotifier, FilesystemDocumentStore>>;
pub type SharedProductService =
    Arc<ProductService<PostgresProductRepository, PostgresAccountRepository, SmtpNotifier>>;

#[derive(Clone)]
pub struct AppState {
    pub account_service: SharedAccountService,
    pub product_service: SharedProductService,
    pub authenticator: Arc<Authenticator>,
}

pub fn create_router(
    account_service: SharedAccountService,
    product_service: SharedProductService,
    authenticator: Arc<Authenticator>,
) -> Router {
    let state = AppState {
        account_service,
        product_service,
        authenticator,
    };

    let auth = middleware::from_fn_with_state(state.clone(), auth_middleware);

    // POST /api/users is open for signup while GET on the same path requires
    // a session, so the auth layer is applied per method router
    let routes = Router::new()
        .route(
            "/api/users",
            post(register).merge(get(list_accounts).route_layer(auth.clone())),
        )
        .route("/login", post(login))
        .route("/forgot_password", post(forgot_password))
        .route("/reset_password", post(reset_password))
        .route("/api/users/:user_id/documents", post(upload_documents))
        .route("/api/users/premium/:user_id", put(upgrade_premium))
        .route(
            "/api/users/:user_id/role",
            put(update_role).route_layer(auth.clone()),
        )
        .route(
            "/api/users/inactive",
            delete(reap_inactive).route_layer(auth.clone()),
        )
        .route(
            "/api/products/:product_id",
            delete(delete_product).route_layer(auth),
        );

    let trace_layer = TraceLayer::new_for_http()
        .make_span_with(|request: &Request<Body>| {
            tracing::info_span!(
                "http_request",
                method = %request.method(),
                uri = %request.uri(),
                version = ?request.version(),
                headers = ?request.headers(),
            )
        })
        .on_request(|request: &Request<Body>, _span: &Span| {
            tracing::info!(
                method = %request.method(),
                uri = %request.uri(),
                "Request started"
            );
        })
        .on_response(
            |response: &Response<Body>, latency: Duration, _span: &Span| {
                tracing::info!(
                    status = response.status().as_u16(),
                    latency_ms = latency.as_millis(),
                    "Request completed"
                );
            },
        );

    routes
        .layer(trace_layer)
        .layer(CorsLayer::permissive())
        .with_state(state)
}
