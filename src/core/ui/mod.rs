//! HTML rendering: layout, components and badges.

pub mod badges;
pub mod components;
pub mod layout;

use axum::{http::StatusCode, response::Html};

use crate::core::urls::PageUrls;

pub async fn not_found() -> (StatusCode, Html<String>) {
    let content = format!(
        r##"<div class="section empty-state">
            <h1>404</h1>
            <p>Oops! Page introuvable</p>
            <a class="btn btn-primary" href="{}">Retour à l'accueil</a>
        </div>"##,
        PageUrls::DASHBOARD
    );
    (
        StatusCode::NOT_FOUND,
        Html(layout::render_bare("Page introuvable", &content)),
    )
}
