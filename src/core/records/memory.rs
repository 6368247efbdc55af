use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use serde_json::Value;
use std::any::{Any, TypeId};
use std::cmp::Ordering;
use std::collections::{HashMap, HashSet};
use tokio::sync::RwLock;
use uuid::Uuid;

use super::query::check_filter_columns;
use super::{BackendError, Direction, Filter, ListQuery, Record, Repository};

/// Process-local store keyed by record type. Used when no database is configured
/// and by tests. Inserts honour the primary key, [`Record::UNIQUE`] and
/// [`Record::REFERENCES`] the way the schema constraints do.
#[derive(Default)]
pub struct MemoryRecordStore {
    tables: RwLock<Tables>,
}

#[derive(Default)]
struct Tables {
    rows: HashMap<TypeId, Box<dyn Any + Send + Sync>>,
    ids: HashMap<&'static str, HashSet<Uuid>>,
}

impl Tables {
    fn rows<E: Record>(&self) -> &[E] {
        self.rows
            .get(&TypeId::of::<E>())
            .and_then(|rows| rows.downcast_ref::<Vec<E>>())
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    fn push<E: Record>(&mut self, row: E) {
        self.ids.entry(E::TABLE).or_default().insert(row.id());
        if let Some(rows) = self
            .rows
            .entry(TypeId::of::<E>())
            .or_insert_with(|| Box::new(Vec::<E>::new()))
            .downcast_mut::<Vec<E>>()
        {
            rows.push(row);
        }
    }

    fn contains(&self, table: &str, id: Uuid) -> bool {
        self.ids.get(table).is_some_and(|ids| ids.contains(&id))
    }

    fn check_insert<E: Record>(&self, record: &E) -> Result<(), BackendError> {
        if self.contains(E::TABLE, record.id()) {
            return Err(unique_violation(&format!("{}_pkey", E::TABLE)));
        }
        let row = to_json(record)?;

        for (column, target) in E::REFERENCES {
            let value = match row.get(*column) {
                None | Some(Value::Null) => continue,
                Some(value) => value,
            };
            let found = value
                .as_str()
                .and_then(|v| Uuid::parse_str(v).ok())
                .is_some_and(|id| self.contains(target, id));
            if !found {
                return Err(BackendError::constraint(format!(
                    "insert or update on table \"{}\" violates foreign key constraint \"{}_{column}_fkey\"",
                    E::TABLE,
                    E::TABLE
                )));
            }
        }

        for columns in E::UNIQUE {
            let key = match unique_key(&row, columns) {
                Some(key) => key,
                None => continue,
            };
            for existing in self.rows::<E>() {
                if unique_key(&to_json(existing)?, columns).as_ref() == Some(&key) {
                    return Err(unique_violation(&format!(
                        "{}_{}_key",
                        E::TABLE,
                        columns.join("_")
                    )));
                }
            }
        }
        Ok(())
    }
}

fn to_json<E: Record>(row: &E) -> Result<Value, BackendError> {
    serde_json::to_value(row).map_err(|e| BackendError::query(e.to_string()))
}

/// Values of `columns`, or `None` when any of them is NULL.
fn unique_key(row: &Value, columns: &[&str]) -> Option<Vec<Value>> {
    columns
        .iter()
        .map(|c| row.get(*c).filter(|v| !v.is_null()).cloned())
        .collect()
}

fn unique_violation(constraint: &str) -> BackendError {
    BackendError::constraint(format!(
        "duplicate key value violates unique constraint \"{constraint}\""
    ))
}

impl std::fmt::Debug for MemoryRecordStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryRecordStore").finish_non_exhaustive()
    }
}

impl MemoryRecordStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts an already materialized row, keeping its id and timestamps.
    /// No constraint is checked.
    pub async fn insert_raw<E: Record>(&self, row: E) {
        self.tables.write().await.push(row);
    }

    async fn matching<E: Record>(&self, filters: &[Filter]) -> Result<Vec<(Value, E)>, BackendError> {
        let tables = self.tables.read().await;
        let mut rows = Vec::new();
        for row in tables.rows::<E>() {
            let json = to_json(row)?;
            if filters
                .iter()
                .all(|f| matches_filter(json.get(&f.column), &f.value))
            {
                rows.push((json, row.clone()));
            }
        }
        Ok(rows)
    }
}

#[async_trait]
impl<E: Record> Repository<E> for MemoryRecordStore {
    async fn list(&self, query: &ListQuery) -> Result<Vec<E>, BackendError> {
        query.check_columns::<E>()?;
        let mut rows = self.matching::<E>(&query.filters).await?;

        if let Some(order) = &query.order {
            rows.sort_by(|(a, _), (b, _)| {
                let ordering = compare_values(a.get(&order.column), b.get(&order.column));
                match order.direction {
                    Direction::Ascending => ordering,
                    Direction::Descending => ordering.reverse(),
                }
            });
        }

        let offset = query.offset.unwrap_or(0).max(0) as usize;
        let limit = query.limit.map_or(usize::MAX, |l| l.max(0) as usize);
        Ok(rows
            .into_iter()
            .skip(offset)
            .take(limit)
            .map(|(_, row)| row)
            .collect())
    }

    async fn create(&self, row: E::New) -> Result<E, BackendError> {
        let record = E::materialize(row, Uuid::new_v4(), Utc::now());
        let mut tables = self.tables.write().await;
        tables.check_insert(&record)?;
        tables.push(record.clone());
        Ok(record)
    }

    async fn count(&self, filters: &[Filter]) -> Result<i64, BackendError> {
        check_filter_columns::<E>(filters)?;
        Ok(self.matching::<E>(filters).await?.len() as i64)
    }
}

/// Equality as PostgreSQL would apply it to the typed column. Arrays match
/// when they hold the value.
fn matches_filter(field: Option<&Value>, expected: &str) -> bool {
    match field {
        Some(Value::String(s)) => s == expected || same_instant(s, expected),
        Some(Value::Array(items)) => items.iter().any(|item| matches_filter(Some(item), expected)),
        Some(Value::Number(n)) => match (n.as_f64(), expected.parse::<f64>()) {
            (Some(a), Ok(b)) => a == b,
            _ => n.to_string() == expected,
        },
        Some(Value::Bool(b)) => b.to_string() == expected,
        _ => false,
    }
}

fn same_instant(a: &str, b: &str) -> bool {
    match (DateTime::parse_from_rfc3339(a), DateTime::parse_from_rfc3339(b)) {
        (Ok(x), Ok(y)) => x == y,
        _ => false,
    }
}

/// Orders like PostgreSQL's default: NULL sorts after every value.
fn compare_values(a: Option<&Value>, b: Option<&Value>) -> Ordering {
    let a = a.filter(|v| !v.is_null());
    let b = b.filter(|v| !v.is_null());
    match (a, b) {
        (None, None) => Ordering::Equal,
        (None, Some(_)) => Ordering::Greater,
        (Some(_), None) => Ordering::Less,
        (Some(Value::Number(x)), Some(Value::Number(y))) => x
            .as_f64()
            .partial_cmp(&y.as_f64())
            .unwrap_or(Ordering::Equal),
        (Some(Value::String(x)), Some(Value::String(y))) => compare_text(x, y),
        (Some(Value::Bool(x)), Some(Value::Bool(y))) => x.cmp(y),
        (Some(x), Some(y)) => x.to_string().cmp(&y.to_string()),
    }
}

fn compare_text(a: &str, b: &str) -> Ordering {
    if let (Ok(x), Ok(y)) = (
        DateTime::parse_from_rfc3339(a),
        DateTime::parse_from_rfc3339(b),
    ) {
        return x.cmp(&y);
    }
    if let (Ok(x), Ok(y)) = (
        NaiveDate::parse_from_str(a, "%Y-%m-%d"),
        NaiveDate::parse_from_str(b, "%Y-%m-%d"),
    ) {
        return x.cmp(&y);
    }
    a.cmp(b)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::records::{BackendErrorKind, Record};
    use serde::Serialize;

    #[derive(Debug, Clone, Serialize)]
    struct Sample {
        id: Uuid,
        label: String,
        score: Option<i32>,
        due: Option<NaiveDate>,
        created_at: DateTime<Utc>,
    }

    #[derive(Debug, Clone)]
    struct NewSample {
        label: String,
        score: Option<i32>,
        due: Option<NaiveDate>,
    }

    impl Record for Sample {
        type New = NewSample;
        const TABLE: &'static str = "samples";
        const COLUMNS: &'static [&'static str] = &["id", "label", "score", "due", "created_at"];
        const UNIQUE: &'static [&'static [&'static str]] = &[&["label"], &["due"]];

        fn id(&self) -> Uuid {
            self.id
        }

        fn materialize(new: NewSample, id: Uuid, now: DateTime<Utc>) -> Self {
            Self {
                id,
                label: new.label,
                score: new.score,
                due: new.due,
                created_at: now,
            }
        }
    }

    #[derive(Debug, Clone, Serialize)]
    struct Note {
        id: Uuid,
        sample_id: Option<Uuid>,
    }

    impl Record for Note {
        type New = Option<Uuid>;
        const TABLE: &'static str = "notes";
        const COLUMNS: &'static [&'static str] = &["id", "sample_id"];
        const REFERENCES: &'static [(&'static str, &'static str)] = &[("sample_id", "samples")];

        fn id(&self) -> Uuid {
            self.id
        }

        fn materialize(sample_id: Option<Uuid>, id: Uuid, _now: DateTime<Utc>) -> Self {
            Self { id, sample_id }
        }
    }

    fn sample(label: &str, score: Option<i32>, due: Option<&str>) -> NewSample {
        NewSample {
            label: label.to_string(),
            score,
            due: due.map(|d| NaiveDate::parse_from_str(d, "%Y-%m-%d").unwrap()),
        }
    }

    async fn seeded() -> MemoryRecordStore {
        let store = MemoryRecordStore::new();
        for row in [
            sample("a", Some(3), Some("2025-01-10")),
            sample("b", None, Some("2025-03-01")),
            sample("c", Some(12), None),
        ] {
            Repository::<Sample>::create(&store, row).await.unwrap();
        }
        store
    }

    #[tokio::test]
    async fn test_create_assigns_id_and_timestamp() {
        let store = MemoryRecordStore::new();
        let created: Sample = store.create(sample("x", None, None)).await.unwrap();
        assert_ne!(created.id, Uuid::nil());
        let listed: Vec<Sample> = store.list(&ListQuery::new()).await.unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].id, created.id);
    }

    #[tokio::test]
    async fn test_descending_dates_put_nulls_first() {
        let store = seeded().await;
        let rows: Vec<Sample> = store
            .list(&ListQuery::new().order_by("due", Direction::Descending))
            .await
            .unwrap();
        let labels: Vec<&str> = rows.iter().map(|r| r.label.as_str()).collect();
        assert_eq!(labels, ["c", "b", "a"]);
    }

    #[tokio::test]
    async fn test_ascending_numbers_put_nulls_last() {
        let store = seeded().await;
        let rows: Vec<Sample> = store
            .list(&ListQuery::new().order_by("score", Direction::Ascending))
            .await
            .unwrap();
        let labels: Vec<&str> = rows.iter().map(|r| r.label.as_str()).collect();
        assert_eq!(labels, ["a", "c", "b"]);
    }

    #[tokio::test]
    async fn test_filter_limit_and_count() {
        let store = seeded().await;
        let rows: Vec<Sample> = store
            .list(&ListQuery::new().filter("score", "12"))
            .await
            .unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].label, "c");

        let page: Vec<Sample> = store
            .list(&ListQuery::new().order_by("label", Direction::Ascending).offset(1).limit(1))
            .await
            .unwrap();
        assert_eq!(page[0].label, "b");

        let total = Repository::<Sample>::count(&store, &[]).await.unwrap();
        assert_eq!(total, 3);
        let named = Repository::<Sample>::count(&store, &[Filter::eq("label", "a")])
            .await
            .unwrap();
        assert_eq!(named, 1);
    }

    #[tokio::test]
    async fn test_unknown_column_is_rejected() {
        let store = seeded().await;
        let err = Repository::<Sample>::list(&store, &ListQuery::new().filter("nope", "1"))
            .await
            .unwrap_err();
        assert_eq!(err.kind, BackendErrorKind::Query);
        assert!(Repository::<Sample>::count(&store, &[Filter::eq("nope", "1")])
            .await
            .is_err());
    }

    #[tokio::test]
    async fn test_unique_columns_are_enforced() {
        let store = seeded().await;
        let err = Repository::<Sample>::create(&store, sample("a", None, None))
            .await
            .unwrap_err();
        assert_eq!(err.kind, BackendErrorKind::Constraint);
        assert_eq!(
            err.message,
            "duplicate key value violates unique constraint \"samples_label_key\""
        );

        let err = Repository::<Sample>::create(&store, sample("d", None, Some("2025-01-10")))
            .await
            .unwrap_err();
        assert_eq!(err.kind, BackendErrorKind::Constraint);
        assert_eq!(Repository::<Sample>::count(&store, &[]).await.unwrap(), 3);

        // A second NULL due date is not a duplicate.
        Repository::<Sample>::create(&store, sample("e", None, None))
            .await
            .unwrap();
        assert_eq!(Repository::<Sample>::count(&store, &[]).await.unwrap(), 4);
    }

    #[tokio::test]
    async fn test_references_must_exist() {
        let store = MemoryRecordStore::new();
        let err = Repository::<Note>::create(&store, Some(Uuid::new_v4()))
            .await
            .unwrap_err();
        assert_eq!(err.kind, BackendErrorKind::Constraint);
        assert!(err.message.contains("notes_sample_id_fkey"));
        assert_eq!(Repository::<Note>::count(&store, &[]).await.unwrap(), 0);

        let parent: Sample = store.create(sample("p", None, None)).await.unwrap();
        let note: Note = store.create(Some(parent.id)).await.unwrap();
        assert_eq!(note.sample_id, Some(parent.id));
        let orphan: Note = store.create(None).await.unwrap();
        assert_eq!(orphan.sample_id, None);
    }

    #[tokio::test]
    async fn test_timestamp_filter_compares_instants() {
        let store = MemoryRecordStore::new();
        let created: Sample = store.create(sample("t", None, None)).await.unwrap();
        let paris = created
            .created_at
            .with_timezone(&chrono::FixedOffset::east_opt(3600).unwrap())
            .to_rfc3339();

        let rows: Vec<Sample> = store
            .list(&ListQuery::new().filter("created_at", &paris))
            .await
            .unwrap();
        assert_eq!(rows.len(), 1);
    }
}
