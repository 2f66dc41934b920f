//! Gatehouse is a role-based access gate with an administrator approval
//! queue.

#![forbid(unsafe_code)]
pub mod account;
pub mod cache;
pub mod clock;
pub mod config;
pub mod console;
pub mod crypto;
mod database;
pub mod error;
pub mod guard;
mod middleware;
mod router;
pub mod service;
pub mod session;
pub mod store;
pub mod telemetry;

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use axum::body::Bytes;
use axum::http::{Method, StatusCode, header};
use axum::routing::{get, patch, post};
use axum::{Router, middleware as AxumMiddleware};
use metrics_exporter_prometheus::PrometheusHandle;
use tower::ServiceBuilder;
use tower_http::LatencyUnit;
use tower_http::cors::{Any, CorsLayer};
use tower_http::sensitive_headers::SetSensitiveHeadersLayer;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::{
    DefaultMakeSpan, DefaultOnRequest, DefaultOnResponse, TraceLayer,
};

use crate::clock::{Clock, SystemClock};
use crate::config::{ConfigError, Configuration};
use crate::crypto::Argon2Verifier;
use crate::service::AccountService;
use crate::session::SessionIssuer;
use crate::store::{AccountStore, MemoryStore, PgAccountStore};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// State sharing between routes.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Configuration>,
    pub accounts: Arc<AccountService>,
    pub metrics: Option<PrometheusHandle>,
}

/// Create router.
pub fn app(state: AppState) -> Router {
    let middleware = ServiceBuilder::new()
        // Add high level tracing/logging to all requests.
        .layer(
            TraceLayer::new_for_http()
                .on_body_chunk(|chunk: &Bytes, latency: Duration, _span: &tracing::Span| {
                    tracing::trace!(size_bytes = chunk.len(), latency = ?latency, "sending body chunk")
                })
                .make_span_with(DefaultMakeSpan::new().include_headers(true).level(tracing::Level::INFO))
                .on_request(DefaultOnRequest::new())
                .on_response(DefaultOnResponse::new().include_headers(true).latency_unit(LatencyUnit::Micros)),
        )
        // Set a timeout.
        .layer(TimeoutLayer::with_status_code(StatusCode::REQUEST_TIMEOUT, REQUEST_TIMEOUT))
        // Remove sensitive headers from trace.
        .layer(SetSensitiveHeadersLayer::new([header::AUTHORIZATION, header::COOKIE]))
        // Add CORS preflight support.
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods([Method::GET, Method::POST, Method::PATCH, Method::DELETE, Method::OPTIONS])
                .allow_headers(Any)
                .vary([header::AUTHORIZATION]),
        );

    let paths = &state.config.routes;
    let admin = paths.admin_prefix.trim_end_matches('/');

    Router::new()
        // Pages, all behind the route guard.
        .route(&paths.login, get(router::pages::login))
        .route(&paths.pending, get(router::pages::pending))
        .route(&paths.dashboard, get(router::pages::dashboard))
        .route(&paths.admin_console, get(router::admin::list))
        // `PATCH /admin/users/{id}/status` goes to `update_status`.
        .route(
            &format!("{admin}/users/{{id}}/status"),
            patch(router::admin::update_status),
        )
        // `DELETE /admin/users/{id}` goes to `delete`.
        .route(
            &format!("{admin}/users/{{id}}"),
            axum::routing::delete(router::admin::delete),
        )
        .route("/register", post(router::register::handler))
        .route("/login", post(router::login::login))
        .route("/logout", post(router::login::logout))
        // `GET /status.json` goes to `status`.
        .route("/status.json", get(router::status::status))
        .route("/metrics", get(router::status::metrics))
        .layer(AxumMiddleware::from_fn_with_state(
            state.clone(),
            middleware::guard,
        ))
        .with_state(state)
        .route_layer(AxumMiddleware::from_fn(telemetry::track))
        .layer(middleware)
}

/// Initialize the application state.
pub async fn initialize_state()
-> Result<AppState, Box<dyn std::error::Error + Send + Sync>> {
    // read configuration file. let it in memory.
    let path = std::env::var("CONFIG_PATH")
        .map(PathBuf::from)
        .unwrap_or_default();
    let config = Configuration::default().path(path).read()?;

    let clock: Arc<dyn Clock> = Arc::new(SystemClock);

    let store: Arc<dyn AccountStore> = match &config.postgres {
        Some(postgres) => {
            let pool = database::connect(postgres).await?;
            Arc::new(PgAccountStore::new(pool))
        },
        None => {
            tracing::warn!(
                "missing `postgres` entry on `config.yaml` file, accounts are kept in memory"
            );
            Arc::new(MemoryStore::new(Arc::clone(&clock)))
        },
    };

    let secret = std::env::var("AUTH_SECRET")
        .ok()
        .filter(|secret| !secret.is_empty())
        .ok_or(ConfigError::MissingVariable("AUTH_SECRET"))?;
    let sessions = SessionIssuer::new(
        &config.url,
        secret.as_bytes(),
        config.session.max_age()?,
        clock,
    );

    let verifier = Arc::new(Argon2Verifier::new(&config.argon2)?);
    let accounts = Arc::new(AccountService::new(
        store,
        verifier,
        sessions,
        config.password,
        config.session.update_age()?,
    ));

    let metrics = match telemetry::setup_metrics_recorder() {
        Ok(handle) => Some(handle),
        Err(err) => {
            tracing::warn!(error = %err, "prometheus recorder not installed");
            None
        },
    };

    Ok(AppState {
        config,
        accounts,
        metrics,
    })
}
