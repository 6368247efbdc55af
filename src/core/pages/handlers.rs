use axum::{
    extract::{Query, State},
    response::Html,
    routing::get,
    Extension, Form, Router,
};
use serde::Deserialize;
use std::collections::HashMap;
use std::sync::Arc;

use super::{CrudPage, PageEntity, SubmitOutcome};
use crate::core::records::{FormData, RecordStore, Repository};
use crate::core::session::Session;
use crate::core::shared::state::AppState;

#[derive(Debug, Deserialize)]
pub struct PageParams {
    pub dialog: Option<String>,
}

/// `GET <page>`; `?dialog=new` opens the creation form.
pub async fn show_page<E>(
    State(state): State<Arc<AppState>>,
    Extension(session): Extension<Session>,
    Query(params): Query<PageParams>,
) -> Html<String>
where
    E: PageEntity,
    dyn RecordStore: Repository<E>,
{
    let mut page = CrudPage::<E, dyn RecordStore>::new(Arc::clone(&state.store));
    page.mount().await;
    if params.dialog.as_deref() == Some("new") {
        page.open_form();
    }
    Html(page.render(&session.user.email))
}

/// `POST <page>`: submits the creation form and renders the result.
pub async fn submit_page<E>(
    State(state): State<Arc<AppState>>,
    Extension(session): Extension<Session>,
    Form(fields): Form<HashMap<String, String>>,
) -> Html<String>
where
    E: PageEntity,
    dyn RecordStore: Repository<E>,
{
    let mut page = CrudPage::<E, dyn RecordStore>::new(Arc::clone(&state.store));
    page.open_form();
    page.fill(fields.into_iter().collect::<FormData>());

    // A successful create has already reloaded the list.
    match page.submit(Some(&session.user)).await {
        SubmitOutcome::Created(_) => {}
        _ => page.mount().await,
    }
    Html(page.render(&session.user.email))
}

pub fn page_routes<E>() -> Router<Arc<AppState>>
where
    E: PageEntity,
    dyn RecordStore: Repository<E>,
{
    Router::new().route(E::PAGE.path, get(show_page::<E>).post(submit_page::<E>))
}
