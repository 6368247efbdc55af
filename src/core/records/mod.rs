//! Record access shared by every QMS entity.
//!
//! Each entity is a [`Record`]; stores implement [`Repository`] per entity and
//! [`RecordStore`] ties them together so handlers can hold one `Arc<dyn RecordStore>`.

pub mod api;
mod error;
mod form;
mod memory;
mod postgres;
mod query;
mod store;

pub use error::{BackendError, BackendErrorKind};
pub use form::{FieldKind, FieldSpec, FormData, ValidationError};
pub use memory::MemoryRecordStore;
pub use postgres::PgRecordStore;
pub use query::{check_filter_columns, Direction, Filter, ListQuery, Order};
pub use store::RecordStore;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fmt::Debug;
use uuid::Uuid;

use crate::core::session::CurrentUser;

pub trait Record: Clone + Debug + Serialize + Send + Sync + 'static {
    /// Insert payload; the store fills in id and timestamps.
    type New: Clone + Debug + Send + Sync + 'static;

    const TABLE: &'static str;
    const COLUMNS: &'static [&'static str];
    /// Column sets whose values must be distinct across the table. NULL never collides.
    const UNIQUE: &'static [&'static [&'static str]] = &[];
    /// `(column, table)`: a non-NULL value must be the id of a row in `table`.
    const REFERENCES: &'static [(&'static str, &'static str)] = &[];

    fn id(&self) -> Uuid;

    /// Builds the stored row the way the database defaults would.
    fn materialize(new: Self::New, id: Uuid, now: DateTime<Utc>) -> Self;
}

#[async_trait]
pub trait Repository<E: Record>: Send + Sync {
    async fn list(&self, query: &ListQuery) -> Result<Vec<E>, BackendError>;

    async fn create(&self, row: E::New) -> Result<E, BackendError>;

    async fn count(&self, filters: &[Filter]) -> Result<i64, BackendError>;
}

/// Values the server attributes to a new row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuditFields {
    pub user_id: Uuid,
    pub at: DateTime<Utc>,
}

impl AuditFields {
    pub fn now(user: &CurrentUser) -> Self {
        Self {
            user_id: user.id,
            at: Utc::now(),
        }
    }
}

/// A record users can create from a form.
pub trait Creatable: Record {
    const FIELDS: &'static [FieldSpec];

    fn from_form(form: &FormData, audit: &AuditFields) -> Result<Self::New, ValidationError>;
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CreateError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    Backend(#[from] BackendError),
}

/// Checks required fields, merges audit fields and inserts. Nothing reaches the
/// store when validation fails.
pub async fn create_record<E, R>(
    repo: &R,
    form: &FormData,
    audit: &AuditFields,
) -> Result<E, CreateError>
where
    E: Creatable,
    R: Repository<E> + ?Sized,
{
    form.check_required(E::FIELDS)?;
    let row = E::from_form(form, audit)?;
    let created = repo.create(row).await?;
    log::info!("Created {} {}", E::TABLE, created.id());
    Ok(created)
}
