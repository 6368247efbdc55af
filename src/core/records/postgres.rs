use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use diesel::pg::Pg;
use diesel::prelude::*;
use std::str::FromStr;
use uuid::Uuid;

use super::{BackendError, Direction, Filter, ListQuery, RecordStore, Repository};
use crate::audits::{Audit, AuditFinding};
use crate::core::shared::schema::{
    audit_findings, audits, corrective_actions, documents, kpi_values, kpis, non_conformities,
    processes, profiles, risks, training_attendance, training_programs, training_sessions,
    user_roles,
};
use crate::core::shared::utils::DbPool;
use crate::directory::{Profile, UserRole};
use crate::documents::Document;
use crate::kpis::{Kpi, KpiValue};
use crate::nonconformities::{CorrectiveAction, NonConformity};
use crate::processes::Process;
use crate::risks::Risk;
use crate::training::{TrainingAttendance, TrainingProgram, TrainingSession};

/// PostgreSQL-backed store. Diesel calls run on the blocking pool.
#[derive(Clone)]
pub struct PgRecordStore {
    pool: DbPool,
}

impl PgRecordStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &DbPool {
        &self.pool
    }

    async fn run<T, F>(&self, work: F) -> Result<T, BackendError>
    where
        T: Send + 'static,
        F: FnOnce(&mut PgConnection) -> Result<T, BackendError> + Send + 'static,
    {
        let pool = self.pool.clone();
        tokio::task::spawn_blocking(move || {
            let mut conn = pool.get()?;
            work(&mut *conn)
        })
        .await
        .map_err(|e| BackendError::unavailable(e.to_string()))?
    }
}

/// Parses a filter value the way PostgreSQL would cast the literal.
fn parse_value<T: FromStr>(sql_type: &str, column: &str, value: &str) -> Result<T, BackendError> {
    value.parse().map_err(|_| {
        BackendError::query(format!(
            "invalid input syntax for type {sql_type}: \"{value}\" ({column})"
        ))
    })
}

/// Columns a generated repository accepts in filters and ordering.
#[cfg(test)]
trait PgColumns {
    const FILTERABLE: &'static [&'static str];
    const ORDERABLE: &'static [&'static str];
}

/// Implements `Repository<$record>` for `PgRecordStore` over one table.
///
/// Columns are grouped by SQL type so equality filters bind a value of the
/// right type; a filter on an array column matches rows whose array holds the
/// value. Every column of the table should appear in `order`.
macro_rules! pg_repository {
    (
        $record:ty => $table:ident,
        text: [$($text:ident),* $(,)?],
        uuid: [$($uuid:ident),* $(,)?],
        $(int: [$($int:ident),* $(,)?],)?
        $(float: [$($float:ident),* $(,)?],)?
        $(boolean: [$($boolean:ident),* $(,)?],)?
        $(date: [$($date:ident),* $(,)?],)?
        $(timestamp: [$($timestamp:ident),* $(,)?],)?
        $(array: [$($array:ident),* $(,)?],)?
        order: [$($order:ident),* $(,)?] $(,)?
    ) => {
        #[cfg(test)]
        impl PgColumns for $record {
            const FILTERABLE: &'static [&'static str] = &[
                $(stringify!($text),)*
                $(stringify!($uuid),)*
                $($(stringify!($int),)*)?
                $($(stringify!($float),)*)?
                $($(stringify!($boolean),)*)?
                $($(stringify!($date),)*)?
                $($(stringify!($timestamp),)*)?
                $($(stringify!($array),)*)?
            ];
            const ORDERABLE: &'static [&'static str] = &[$(stringify!($order)),*];
        }

        const _: () = {
            fn filtered(filters: &[Filter]) -> Result<$table::BoxedQuery<'static, Pg>, BackendError> {
                let mut q = $table::table.into_boxed();
                for filter in filters {
                    let (column, value) = (filter.column.as_str(), filter.value.as_str());
                    q = match column {
                        $(stringify!($text) => q.filter($table::$text.eq(value.to_string())),)*
                        $(stringify!($uuid) => {
                            q.filter($table::$uuid.eq(parse_value::<Uuid>("uuid", column, value)?))
                        })*
                        $($(stringify!($int) => {
                            q.filter($table::$int.eq(parse_value::<i32>("integer", column, value)?))
                        })*)?
                        $($(stringify!($float) => {
                            q.filter($table::$float.eq(parse_value::<f64>("double precision", column, value)?))
                        })*)?
                        $($(stringify!($boolean) => {
                            q.filter($table::$boolean.eq(parse_value::<bool>("boolean", column, value)?))
                        })*)?
                        $($(stringify!($date) => {
                            q.filter($table::$date.eq(parse_value::<NaiveDate>("date", column, value)?))
                        })*)?
                        $($(stringify!($timestamp) => {
                            let at = parse_value::<DateTime<Utc>>("timestamp with time zone", column, value)?;
                            q.filter($table::$timestamp.eq(at))
                        })*)?
                        $($(stringify!($array) => {
                            q.filter($table::$array.contains(vec![value.to_string()]))
                        })*)?
                        other => return Err(BackendError::unknown_column(stringify!($table), other)),
                    };
                }
                Ok(q)
            }

            #[async_trait]
            impl Repository<$record> for PgRecordStore {
                async fn list(&self, query: &ListQuery) -> Result<Vec<$record>, BackendError> {
                    let query = query.clone();
                    self.run(move |conn| {
                        let mut q = filtered(&query.filters)?;
                        if let Some(order) = &query.order {
                            q = match (order.column.as_str(), order.direction) {
                                $(
                                    (stringify!($order), Direction::Ascending) => q.order($table::$order.asc()),
                                    (stringify!($order), Direction::Descending) => q.order($table::$order.desc()),
                                )*
                                (other, _) => return Err(BackendError::unknown_column(stringify!($table), other)),
                            };
                        }
                        if let Some(offset) = query.offset {
                            q = q.offset(offset);
                        }
                        if let Some(limit) = query.limit {
                            q = q.limit(limit);
                        }
                        q.load::<$record>(conn).map_err(BackendError::from)
                    })
                    .await
                }

                async fn create(&self, row: <$record as super::Record>::New) -> Result<$record, BackendError> {
                    self.run(move |conn| {
                        diesel::insert_into($table::table)
                            .values(&row)
                            .get_result::<$record>(conn)
                            .map_err(BackendError::from)
                    })
                    .await
                }

                async fn count(&self, filters: &[Filter]) -> Result<i64, BackendError> {
                    let filters = filters.to_vec();
                    self.run(move |conn| {
                        filtered(&filters)?
                            .count()
                            .get_result::<i64>(conn)
                            .map_err(BackendError::from)
                    })
                    .await
                }
            }
        };
    };
}

pg_repository!(Profile => profiles,
    text: [full_name, email, department, position, phone, avatar_url],
    uuid: [id],
    timestamp: [created_at, updated_at],
    order: [id, full_name, email, department, position, phone, avatar_url, created_at, updated_at],
);

pg_repository!(UserRole => user_roles,
    text: [role],
    uuid: [id, user_id],
    timestamp: [created_at],
    order: [id, user_id, role, created_at],
);

pg_repository!(Document => documents,
    text: [document_number, title, description, category, version, status, content, file_url],
    uuid: [id, created_by, approved_by],
    date: [review_date, next_review_date],
    timestamp: [approval_date, created_at, updated_at],
    order: [
        id, document_number, title, description, category, version, status, content, file_url,
        created_by, approved_by, approval_date, review_date, next_review_date, created_at,
        updated_at,
    ],
);

pg_repository!(Process => processes,
    text: [code, name, category, description, objectives, inputs, outputs, resources, kpis],
    uuid: [id, owner_id],
    timestamp: [created_at, updated_at],
    order: [
        id, code, name, category, description, objectives, inputs, outputs, resources, kpis,
        owner_id, created_at, updated_at,
    ],
);

pg_repository!(NonConformity => non_conformities,
    text: [
        nc_number, title, description, severity, status, source, immediate_action, root_cause,
        verification_notes,
    ],
    uuid: [id, process_id, detected_by, assigned_to, verified_by],
    date: [target_close_date, actual_close_date, verification_date],
    timestamp: [detected_date, created_at, updated_at],
    order: [
        id, nc_number, title, description, severity, status, source, process_id, detected_by,
        detected_date, assigned_to, immediate_action, root_cause, target_close_date,
        actual_close_date, verification_date, verified_by, verification_notes, created_at,
        updated_at,
    ],
);

pg_repository!(CorrectiveAction => corrective_actions,
    text: [action_number, description, status, verification_notes],
    uuid: [id, nc_id, responsible_id],
    boolean: [effectiveness_verified],
    date: [target_date, completion_date],
    timestamp: [created_at, updated_at],
    order: [
        id, action_number, nc_id, description, responsible_id, status, target_date, completion_date,
        effectiveness_verified, verification_notes, created_at, updated_at,
    ],
);

pg_repository!(Audit => audits,
    text: [
        audit_number, title, audit_type, status, scope, objectives, findings_summary, report_url,
    ],
    uuid: [id, lead_auditor_id],
    date: [planned_start_date, planned_end_date, actual_start_date, actual_end_date],
    timestamp: [created_at, updated_at],
    array: [audit_team, processes_audited],
    order: [
        id, audit_number, title, audit_type, status, scope, objectives, lead_auditor_id, audit_team,
        processes_audited, planned_start_date, planned_end_date, actual_start_date, actual_end_date,
        findings_summary, report_url, created_at, updated_at,
    ],
);

pg_repository!(AuditFinding => audit_findings,
    text: [
        finding_number, finding_type, severity, description, clause_reference, evidence,
        recommendation,
    ],
    uuid: [id, audit_id],
    timestamp: [created_at, updated_at],
    order: [
        id, finding_number, audit_id, finding_type, severity, description, clause_reference,
        evidence, recommendation, created_at, updated_at,
    ],
);

pg_repository!(Kpi => kpis,
    text: [code, name, description, unit, frequency, target_operator],
    uuid: [id, owner_id, process_id],
    float: [target_value],
    timestamp: [created_at, updated_at],
    order: [
        id, code, name, description, unit, frequency, target_value, target_operator, owner_id,
        process_id, created_at, updated_at,
    ],
);

pg_repository!(KpiValue => kpi_values,
    text: [notes],
    uuid: [id, kpi_id, recorded_by],
    float: [actual_value, target_value],
    date: [period_date],
    timestamp: [created_at],
    order: [id, kpi_id, period_date, actual_value, target_value, notes, recorded_by, created_at],
);

pg_repository!(Risk => risks,
    text: [risk_number, title, description, category, mitigation_plan, status],
    uuid: [id, owner_id, process_id],
    int: [probability, impact, risk_level],
    date: [review_date],
    timestamp: [created_at, updated_at],
    order: [
        id, risk_number, title, description, category, probability, impact, risk_level,
        mitigation_plan, status, owner_id, process_id, review_date, created_at, updated_at,
    ],
);

pg_repository!(TrainingProgram => training_programs,
    text: [code, title, description, objectives, target_audience, trainer],
    uuid: [id],
    float: [duration_hours],
    timestamp: [created_at, updated_at],
    order: [
        id, code, title, description, objectives, target_audience, duration_hours, trainer,
        created_at, updated_at,
    ],
);

pg_repository!(TrainingSession => training_sessions,
    text: [location, trainer, status, notes],
    uuid: [id, program_id],
    int: [max_participants],
    timestamp: [session_date, created_at, updated_at],
    order: [
        id, program_id, session_date, location, trainer, max_participants, status, notes,
        created_at, updated_at,
    ],
);

pg_repository!(TrainingAttendance => training_attendance,
    text: [notes],
    uuid: [id, session_id, user_id],
    float: [score],
    boolean: [attended, certificate_issued],
    timestamp: [created_at],
    order: [id, session_id, user_id, attended, score, certificate_issued, notes, created_at],
);

#[async_trait]
impl RecordStore for PgRecordStore {
    fn backend_name(&self) -> &'static str {
        "postgres"
    }

    async fn health(&self) -> Result<(), BackendError> {
        self.run(|conn| {
            diesel::sql_query("SELECT 1")
                .execute(conn)
                .map(|_| ())
                .map_err(BackendError::from)
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::records::{BackendErrorKind, Record};

    fn assert_all_columns<E: Record + PgColumns>() {
        let mut columns = E::COLUMNS.to_vec();
        columns.sort_unstable();
        let mut filterable = E::FILTERABLE.to_vec();
        filterable.sort_unstable();
        let mut orderable = E::ORDERABLE.to_vec();
        orderable.sort_unstable();
        assert_eq!(filterable, columns, "{} filters", E::TABLE);
        assert_eq!(orderable, columns, "{} ordering", E::TABLE);
    }

    #[test]
    fn test_every_column_can_filter_and_order() {
        assert_all_columns::<Profile>();
        assert_all_columns::<UserRole>();
        assert_all_columns::<Document>();
        assert_all_columns::<Process>();
        assert_all_columns::<NonConformity>();
        assert_all_columns::<CorrectiveAction>();
        assert_all_columns::<Audit>();
        assert_all_columns::<AuditFinding>();
        assert_all_columns::<Kpi>();
        assert_all_columns::<KpiValue>();
        assert_all_columns::<Risk>();
        assert_all_columns::<TrainingProgram>();
        assert_all_columns::<TrainingSession>();
        assert_all_columns::<TrainingAttendance>();
    }

    #[test]
    fn test_filter_values_are_typed() {
        assert_eq!(parse_value::<i32>("integer", "impact", "4").unwrap(), 4);
        let at = parse_value::<DateTime<Utc>>(
            "timestamp with time zone",
            "detected_date",
            "2025-01-10T13:00:00+01:00",
        )
        .unwrap();
        assert_eq!(at.to_rfc3339(), "2025-01-10T12:00:00+00:00");

        let err = parse_value::<Uuid>("uuid", "nc_id", "abc").unwrap_err();
        assert_eq!(err.kind, BackendErrorKind::Query);
        assert_eq!(err.message, "invalid input syntax for type uuid: \"abc\" (nc_id)");
    }
}
