//! JSON list/create handlers shared by every record type.

use axum::{
    extract::{Query, State},
    http::StatusCode,
    routing::get,
    Extension, Json, Router,
};
use std::collections::HashMap;
use std::sync::Arc;

use super::{create_record, AuditFields, Creatable, FormData, ListQuery, Record, RecordStore, Repository};
use crate::core::error::QmsError;
use crate::core::session::CurrentUser;
use crate::core::shared::state::AppState;

pub async fn list_records<E>(
    State(state): State<Arc<AppState>>,
    Query(params): Query<HashMap<String, String>>,
) -> Result<Json<Vec<E>>, QmsError>
where
    E: Record,
    dyn RecordStore: Repository<E>,
{
    let query = ListQuery::from_params(&params)?;
    let rows = Repository::<E>::list(&*state.store, &query).await?;
    Ok(Json(rows))
}

pub async fn create_records<E>(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<CurrentUser>,
    Json(body): Json<serde_json::Value>,
) -> Result<(StatusCode, Json<E>), QmsError>
where
    E: Creatable,
    dyn RecordStore: Repository<E>,
{
    let form = FormData::from_json(&body)?;
    let created = create_record::<E, dyn RecordStore>(&*state.store, &form, &AuditFields::now(&user)).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

/// `GET` and `POST` on one collection path.
pub fn record_routes<E>(path: &str) -> Router<Arc<AppState>>
where
    E: Creatable,
    dyn RecordStore: Repository<E>,
{
    Router::new().route(path, get(list_records::<E>).post(create_records::<E>))
}
