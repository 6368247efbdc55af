//! HTTP server initialization and routing

use axum::{middleware, routing::get, Router};
use log::{error, info};
use std::sync::Arc;
use tower_cookies::CookieManagerLayer;
use tower_http::trace::TraceLayer;

use crate::core::session::guard::require_session;
use crate::core::shared::state::AppState;
use crate::core::ui::not_found;
use crate::core::urls::ApiUrls;
use crate::security::CorsConfig;

use super::{health_check, health_check_simple, shutdown_signal};

/// Every route. Pages and the JSON API sit behind the session guard; sign-in
/// pages, health checks and the 404 page do not.
pub fn build_router(state: Arc<AppState>) -> Router {
    let protected = Router::new()
        .merge(crate::dashboard::configure_dashboard_routes())
        .merge(crate::documents::configure_document_routes())
        .merge(crate::processes::configure_process_routes())
        .merge(crate::nonconformities::configure_nonconformity_routes())
        .merge(crate::audits::configure_audit_routes())
        .merge(crate::kpis::configure_kpi_routes())
        .merge(crate::risks::configure_risk_routes())
        .merge(crate::training::configure_training_routes())
        .merge(crate::directory::configure_directory_routes())
        .route_layer(middleware::from_fn_with_state(state.clone(), require_session));

    let public = Router::new()
        .merge(crate::auth::configure_auth_routes())
        .route(ApiUrls::HEALTH, get(health_check_simple))
        .route(ApiUrls::API_HEALTH, get(health_check));

    let cors = CorsConfig::from_origins(&state.config.server.cors_origins).build();

    Router::new()
        .merge(protected)
        .merge(public)
        .fallback(not_found)
        .with_state(state)
        .layer(CookieManagerLayer::new())
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}

pub async fn run_server(state: Arc<AppState>) -> std::io::Result<()> {
    let addr = state.config.bind_address();
    let app = build_router(Arc::clone(&state));

    let listener = match tokio::net::TcpListener::bind(&addr).await {
        Ok(l) => l,
        Err(e) => {
            error!("Failed to bind to {addr}: {e} - is another instance running?");
            return Err(e);
        }
    };
    info!("HTTP server listening on {addr}");

    let result = axum::serve(listener, app.into_make_service())
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(std::io::Error::other);

    state.sessions.shutdown().await;
    result
}
