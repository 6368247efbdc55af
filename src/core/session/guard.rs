//! Session guard for protected routes.

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};
use std::sync::Arc;
use tower_cookies::Cookies;

use crate::core::error::QmsError;
use crate::core::shared::state::AppState;
use crate::core::urls::{ApiUrls, PageUrls};

/// Resolves the session cookie before the handler runs. Without a session,
/// pages redirect to sign-in and API calls get 401; the handler never runs.
pub async fn require_session(
    State(state): State<Arc<AppState>>,
    cookies: Cookies,
    mut req: Request,
    next: Next,
) -> Response {
    let token = cookies
        .get(state.cookie_name())
        .map(|c| c.value().to_string());

    match state.sessions.resolve(token.as_deref()).await {
        Some(session) => {
            req.extensions_mut().insert(session.user.clone());
            req.extensions_mut().insert(session);
            next.run(req).await
        }
        None if req.uri().path().starts_with(ApiUrls::PREFIX) => {
            QmsError::Unauthorized.into_response()
        }
        None => Redirect::to(PageUrls::AUTH).into_response(),
    }
}
