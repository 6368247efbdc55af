//! Sign-in, sign-up and sign-out pages.

use axum::{
    extract::State,
    response::{Html, IntoResponse, Redirect, Response},
    routing::{get, post},
    Form, Router,
};
use log::{info, warn};
use serde::Deserialize;
use std::sync::Arc;
use tower_cookies::cookie::SameSite;
use tower_cookies::{Cookie, Cookies};

use crate::core::error::QmsError;
use crate::core::records::RecordStore;
use crate::core::session::{CurrentUser, Session};
use crate::core::shared::state::AppState;
use crate::core::ui::components::{html_escape, render_notices, Notice};
use crate::core::ui::layout::render_bare;
use crate::core::urls::PageUrls;
use crate::directory::{ensure_default_role, ensure_profile};

#[derive(Debug, Deserialize)]
pub struct SignInForm {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct SignUpForm {
    pub email: String,
    pub password: String,
    #[serde(default)]
    pub full_name: Option<String>,
}

pub fn session_cookie(state: &AppState, session: &Session) -> Cookie<'static> {
    Cookie::build((state.cookie_name().to_string(), session.token.clone()))
        .path("/")
        .http_only(true)
        .secure(state.config.session.cookie_secure)
        .same_site(SameSite::Lax)
        .max_age(time::Duration::hours(state.config.session.ttl_hours))
        .build()
}

fn cookie_token(state: &AppState, cookies: &Cookies) -> Option<String> {
    cookies
        .get(state.cookie_name())
        .map(|c| c.value().to_string())
}

pub fn render_auth_page(email: &str, notices: &[Notice]) -> String {
    let email = html_escape(email);
    let content = format!(
        r##"<div class="page-header">
            <div>
                <h1>QMS ISO 9001</h1>
                <p>Système de gestion de la qualité</p>
            </div>
        </div>
        <section class="section">
            <h2 class="section-title">Connexion</h2>
            <p class="section-description">Accédez à votre espace qualité</p>
            <form method="post" action="{sign_in}" class="dialog-form">
                <div class="form-field"><label for="signin-email">Email</label><input type="email" id="signin-email" name="email" value="{email}" required></div>
                <div class="form-field"><label for="signin-password">Mot de passe</label><input type="password" id="signin-password" name="password" required></div>
                <div class="dialog-actions"><button type="submit" class="btn btn-primary">Se connecter</button></div>
            </form>
        </section>
        <section class="section">
            <h2 class="section-title">Inscription</h2>
            <p class="section-description">Créez votre compte</p>
            <form method="post" action="{sign_up}" class="dialog-form">
                <div class="form-field"><label for="signup-name">Nom complet</label><input type="text" id="signup-name" name="full_name"></div>
                <div class="form-field"><label for="signup-email">Email</label><input type="email" id="signup-email" name="email" required></div>
                <div class="form-field"><label for="signup-password">Mot de passe</label><input type="password" id="signup-password" name="password" minlength="8" required></div>
                <div class="dialog-actions"><button type="submit" class="btn btn-primary">Créer un compte</button></div>
            </form>
        </section>
        <div class="toasts">{notices}</div>"##,
        sign_in = PageUrls::AUTH_SIGN_IN,
        sign_up = PageUrls::AUTH_SIGN_UP,
        notices = render_notices(notices),
    );
    render_bare("Connexion", &content)
}

/// `GET /auth`; signed-in visitors go straight to the dashboard.
pub async fn handle_auth_page(State(state): State<Arc<AppState>>, cookies: Cookies) -> Response {
    let token = cookie_token(&state, &cookies);
    if state.sessions.resolve(token.as_deref()).await.is_some() {
        return Redirect::to(PageUrls::DASHBOARD).into_response();
    }
    Html(render_auth_page("", &[])).into_response()
}

fn auth_failure(err: QmsError, email: &str) -> Response {
    let status = err.status();
    (status, Html(render_auth_page(email, &[Notice::error(err.to_string())]))).into_response()
}

/// Profile and role bookkeeping never blocks a sign-in.
async fn prepare_account(store: &dyn RecordStore, user: &CurrentUser, full_name: Option<&str>, new_account: bool) {
    if let Err(e) = ensure_profile(store, user, full_name).await {
        warn!("Failed to create profile for {}: {e}", user.id);
    }
    if new_account {
        if let Err(e) = ensure_default_role(store, user.id).await {
            warn!("Failed to grant default role to {}: {e}", user.id);
        }
    }
}

pub async fn handle_sign_in(
    State(state): State<Arc<AppState>>,
    cookies: Cookies,
    Form(form): Form<SignInForm>,
) -> Response {
    match state.sessions.sign_in(&form.email, &form.password).await {
        Ok(session) => {
            prepare_account(&*state.store, &session.user, None, false).await;
            cookies.add(session_cookie(&state, &session));
            info!("User {} signed in", session.user.id);
            Redirect::to(PageUrls::DASHBOARD).into_response()
        }
        Err(e) => auth_failure(e.into(), &form.email),
    }
}

pub async fn handle_sign_up(
    State(state): State<Arc<AppState>>,
    cookies: Cookies,
    Form(form): Form<SignUpForm>,
) -> Response {
    match state.sessions.sign_up(&form.email, &form.password).await {
        Ok(session) => {
            prepare_account(&*state.store, &session.user, form.full_name.as_deref(), true).await;
            cookies.add(session_cookie(&state, &session));
            info!("User {} signed up", session.user.id);
            Redirect::to(PageUrls::DASHBOARD).into_response()
        }
        Err(e) => auth_failure(e.into(), &form.email),
    }
}

pub async fn handle_sign_out(State(state): State<Arc<AppState>>, cookies: Cookies) -> Redirect {
    if let Some(token) = cookie_token(&state, &cookies) {
        if let Err(e) = state.sessions.sign_out(&token).await {
            warn!("Sign-out failed: {e}");
        }
    }
    cookies.remove(
        Cookie::build((state.cookie_name().to_string(), String::new()))
            .path("/")
            .build(),
    );
    Redirect::to(PageUrls::AUTH)
}

pub fn configure_auth_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route(PageUrls::AUTH, get(handle_auth_page))
        .route(PageUrls::AUTH_SIGN_IN, post(handle_sign_in))
        .route(PageUrls::AUTH_SIGN_UP, post(handle_sign_up))
        .route(PageUrls::AUTH_SIGN_OUT, post(handle_sign_out))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::records::MemoryRecordStore;
    use crate::core::shared::test_utils::test_state;

    #[test]
    fn test_auth_page_keeps_email_and_notice() {
        let html = render_auth_page("a<b@example.com", &[Notice::error("Email ou mot de passe incorrect")]);
        assert!(html.contains("a&lt;b@example.com"));
        assert!(html.contains("Email ou mot de passe incorrect"));
        assert!(html.contains(PageUrls::AUTH_SIGN_UP));
    }

    #[tokio::test]
    async fn test_session_cookie_attributes() {
        let state = test_state(std::sync::Arc::new(MemoryRecordStore::new()));
        let session = state
            .sessions
            .sign_up("auditeur@example.com", "motdepasse-solide")
            .await
            .unwrap();
        let cookie = session_cookie(&state, &session);
        assert_eq!(cookie.name(), "qms_session");
        assert_eq!(cookie.value(), session.token);
        assert_eq!(cookie.http_only(), Some(true));
        assert_eq!(cookie.path(), Some("/"));
    }
}
