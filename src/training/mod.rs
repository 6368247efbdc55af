//! Training programmes, scheduled sessions and attendance.
//!
//! Programmes have a page; sessions and attendance are recorded through the
//! JSON API only.

use axum::Router;
use chrono::{DateTime, Utc};
use diesel::prelude::*;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

use crate::core::pages::handlers::page_routes;
use crate::core::pages::{ListHeading, PageEntity, PageMeta};
use crate::core::records::api::record_routes;
use crate::core::records::{AuditFields, Creatable, FieldSpec, FormData, Record, ValidationError};
use crate::core::shared::enums::TrainingSessionStatus;
use crate::core::shared::schema::{training_attendance, training_programs, training_sessions};
use crate::core::shared::state::AppState;
use crate::core::ui::components::{html_escape, optional_text, render_card, render_card_grid};
use crate::core::urls::{ApiUrls, PageUrls};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Queryable)]
#[diesel(table_name = training_programs)]
pub struct TrainingProgram {
    pub id: Uuid,
    pub code: String,
    pub title: String,
    pub description: Option<String>,
    pub objectives: Option<String>,
    pub target_audience: Option<String>,
    pub duration_hours: Option<f64>,
    pub trainer: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Insertable)]
#[diesel(table_name = training_programs)]
pub struct NewTrainingProgram {
    pub code: String,
    pub title: String,
    pub description: Option<String>,
    pub objectives: Option<String>,
    pub target_audience: Option<String>,
    pub duration_hours: Option<f64>,
    pub trainer: Option<String>,
}

impl Record for TrainingProgram {
    type New = NewTrainingProgram;

    const TABLE: &'static str = "training_programs";
    const COLUMNS: &'static [&'static str] = &[
        "id",
        "code",
        "title",
        "description",
        "objectives",
        "target_audience",
        "duration_hours",
        "trainer",
        "created_at",
        "updated_at",
    ];
    const UNIQUE: &'static [&'static [&'static str]] = &[&["code"]];

    fn id(&self) -> Uuid {
        self.id
    }

    fn materialize(new: NewTrainingProgram, id: Uuid, now: DateTime<Utc>) -> Self {
        Self {
            id,
            code: new.code,
            title: new.title,
            description: new.description,
            objectives: new.objectives,
            target_audience: new.target_audience,
            duration_hours: new.duration_hours,
            trainer: new.trainer,
            created_at: now,
            updated_at: now,
        }
    }
}

impl Creatable for TrainingProgram {
    const FIELDS: &'static [FieldSpec] = &[
        FieldSpec::text("code", "Code").required().placeholder("FOR-001"),
        FieldSpec::text("title", "Intitulé").required(),
        FieldSpec::textarea("description", "Description"),
        FieldSpec::range("duration_hours", "Durée (heures)", 0.0, 1000.0),
        FieldSpec::text("trainer", "Formateur"),
        FieldSpec::text("target_audience", "Public visé"),
    ];

    fn from_form(form: &FormData, _audit: &AuditFields) -> Result<NewTrainingProgram, ValidationError> {
        let duration_hours = form.number("duration_hours")?;
        if duration_hours.is_some_and(|h| h < 0.0) {
            return Err(ValidationError::invalid("duration_hours", form.raw("duration_hours")));
        }
        Ok(NewTrainingProgram {
            code: form.required("code")?,
            title: form.required("title")?,
            description: form.text("description"),
            objectives: form.text("objectives"),
            target_audience: form.text("target_audience"),
            duration_hours,
            trainer: form.text("trainer"),
        })
    }
}

fn format_hours(hours: f64) -> String {
    if hours.fract() == 0.0 {
        format!("{hours:.0} h")
    } else {
        format!("{hours:.1} h")
    }
}

impl PageEntity for TrainingProgram {
    const PAGE: PageMeta = PageMeta {
        path: PageUrls::TRAINING,
        title: "Gestion de la formation",
        subtitle: "Plans de formation et suivi des compétences",
        new_label: "Nouveau programme",
        dialog_title: "Créer un programme de formation",
        dialog_description: "Définissez le contenu et le public du programme",
        list_heading: Some(ListHeading {
            title: "Programmes de formation",
            summary: |_| "Gérez les sessions de formation et la présence".to_string(),
        }),
        empty_icon: "🎓",
        empty_message: "Aucun programme de formation",
        load_error: "Impossible de charger les programmes de formation",
        created_message: "Programme de formation créé avec succès",
        order_by: "created_at",
    };

    fn render_list(rows: &[Self]) -> String {
        let cards: Vec<String> = rows
            .iter()
            .map(|program| {
                let mut details = vec![format!(
                    "<p>{}</p>",
                    optional_text(program.description.as_deref(), "Aucune description")
                )];
                if let Some(trainer) = program.trainer.as_deref() {
                    details.push(format!("<p>Formateur : {}</p>", html_escape(trainer)));
                }
                if let Some(audience) = program.target_audience.as_deref() {
                    details.push(format!("<p>Public : {}</p>", html_escape(audience)));
                }
                let badges = program
                    .duration_hours
                    .map(|h| vec![format!(r#"<span class="badge badge-secondary">{}</span>"#, format_hours(h))])
                    .unwrap_or_default();
                render_card(&program.title, &program.code, &details.concat(), &badges)
            })
            .collect();
        render_card_grid(&cards)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Queryable)]
#[diesel(table_name = training_sessions)]
pub struct TrainingSession {
    pub id: Uuid,
    pub program_id: Uuid,
    pub session_date: DateTime<Utc>,
    pub location: Option<String>,
    pub trainer: Option<String>,
    pub max_participants: Option<i32>,
    pub status: String,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Insertable)]
#[diesel(table_name = training_sessions)]
pub struct NewTrainingSession {
    pub program_id: Uuid,
    pub session_date: DateTime<Utc>,
    pub location: Option<String>,
    pub trainer: Option<String>,
    pub max_participants: Option<i32>,
    pub notes: Option<String>,
}

impl Record for TrainingSession {
    type New = NewTrainingSession;

    const TABLE: &'static str = "training_sessions";
    const COLUMNS: &'static [&'static str] = &[
        "id",
        "program_id",
        "session_date",
        "location",
        "trainer",
        "max_participants",
        "status",
        "notes",
        "created_at",
        "updated_at",
    ];
    const REFERENCES: &'static [(&'static str, &'static str)] =
        &[("program_id", "training_programs")];

    fn id(&self) -> Uuid {
        self.id
    }

    fn materialize(new: NewTrainingSession, id: Uuid, now: DateTime<Utc>) -> Self {
        Self {
            id,
            program_id: new.program_id,
            session_date: new.session_date,
            location: new.location,
            trainer: new.trainer,
            max_participants: new.max_participants,
            status: TrainingSessionStatus::Planned.to_string(),
            notes: new.notes,
            created_at: now,
            updated_at: now,
        }
    }
}

impl Creatable for TrainingSession {
    const FIELDS: &'static [FieldSpec] = &[
        FieldSpec::text("program_id", "Programme").required(),
        FieldSpec::text("session_date", "Date de session").required(),
        FieldSpec::text("location", "Lieu"),
        FieldSpec::text("trainer", "Formateur"),
        FieldSpec::number("max_participants", "Participants max"),
        FieldSpec::textarea("notes", "Notes"),
    ];

    fn from_form(form: &FormData, _audit: &AuditFields) -> Result<NewTrainingSession, ValidationError> {
        let session_date = form
            .timestamp("session_date")?
            .ok_or_else(|| ValidationError::MissingFields(vec!["session_date".to_string()]))?;
        Ok(NewTrainingSession {
            program_id: form.required_parsed("program_id")?,
            session_date,
            location: form.text("location"),
            trainer: form.text("trainer"),
            max_participants: form.integer_in("max_participants", 1, i32::MAX)?,
            notes: form.text("notes"),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Queryable)]
#[diesel(table_name = training_attendance)]
pub struct TrainingAttendance {
    pub id: Uuid,
    pub session_id: Uuid,
    pub user_id: Uuid,
    pub attended: Option<bool>,
    pub score: Option<f64>,
    pub certificate_issued: Option<bool>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Insertable)]
#[diesel(table_name = training_attendance)]
pub struct NewTrainingAttendance {
    pub session_id: Uuid,
    pub user_id: Uuid,
    pub attended: Option<bool>,
    pub score: Option<f64>,
    pub certificate_issued: Option<bool>,
    pub notes: Option<String>,
}

impl Record for TrainingAttendance {
    type New = NewTrainingAttendance;

    const TABLE: &'static str = "training_attendance";
    const COLUMNS: &'static [&'static str] = &[
        "id",
        "session_id",
        "user_id",
        "attended",
        "score",
        "certificate_issued",
        "notes",
        "created_at",
    ];
    const UNIQUE: &'static [&'static [&'static str]] = &[&["session_id", "user_id"]];
    const REFERENCES: &'static [(&'static str, &'static str)] =
        &[("session_id", "training_sessions")];

    fn id(&self) -> Uuid {
        self.id
    }

    fn materialize(new: NewTrainingAttendance, id: Uuid, now: DateTime<Utc>) -> Self {
        Self {
            id,
            session_id: new.session_id,
            user_id: new.user_id,
            attended: new.attended.or(Some(false)),
            score: new.score,
            certificate_issued: new.certificate_issued.or(Some(false)),
            notes: new.notes,
            created_at: now,
        }
    }
}

impl Creatable for TrainingAttendance {
    const FIELDS: &'static [FieldSpec] = &[
        FieldSpec::text("session_id", "Session").required(),
        FieldSpec::text("user_id", "Participant"),
        FieldSpec::text("attended", "Présent"),
        FieldSpec::number("score", "Score"),
        FieldSpec::text("certificate_issued", "Certificat délivré"),
        FieldSpec::textarea("notes", "Notes"),
    ];

    /// Without an explicit participant the row is recorded for the caller.
    fn from_form(form: &FormData, audit: &AuditFields) -> Result<NewTrainingAttendance, ValidationError> {
        Ok(NewTrainingAttendance {
            session_id: form.required_parsed("session_id")?,
            user_id: form.uuid("user_id")?.unwrap_or(audit.user_id),
            attended: form.flag("attended")?,
            score: form.number("score")?,
            certificate_issued: form.flag("certificate_issued")?,
            notes: form.text("notes"),
        })
    }
}

pub fn configure_training_routes() -> Router<Arc<AppState>> {
    page_routes::<TrainingProgram>()
        .merge(record_routes::<TrainingProgram>(ApiUrls::TRAINING_PROGRAMS))
        .merge(record_routes::<TrainingSession>(ApiUrls::TRAINING_SESSIONS))
        .merge(record_routes::<TrainingAttendance>(ApiUrls::TRAINING_ATTENDANCE))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::pages::CrudPage;
    use crate::core::records::{create_record, MemoryRecordStore};
    use crate::core::shared::test_utils::test_user;

    #[tokio::test]
    async fn test_empty_page_placeholder() {
        let mut page = CrudPage::<TrainingProgram, _>::new(Arc::new(MemoryRecordStore::new()));
        page.mount().await;
        let html = page.render_content();
        assert!(html.contains("Programmes de formation"));
        assert!(html.contains("Aucun programme de formation"));
    }

    #[tokio::test]
    async fn test_program_card() {
        let store = MemoryRecordStore::new();
        let audit = AuditFields::now(&test_user());
        let form = FormData::new()
            .with("code", "FOR-ISO")
            .with("title", "Sensibilisation ISO 9001")
            .with("duration_hours", "3.5")
            .with("trainer", "M. Lefèvre");
        let program = create_record::<TrainingProgram, _>(&store, &form, &audit)
            .await
            .unwrap();
        assert_eq!(program.duration_hours, Some(3.5));

        let html = TrainingProgram::render_list(&[program]);
        assert!(html.contains("Sensibilisation ISO 9001"));
        assert!(html.contains("3.5 h"));
        assert!(html.contains("Aucune description"));
    }

    #[test]
    fn test_negative_duration_rejected() {
        let form = FormData::new()
            .with("code", "FOR-1")
            .with("title", "Accueil")
            .with("duration_hours", "-2");
        assert!(TrainingProgram::from_form(&form, &AuditFields::now(&test_user())).is_err());
    }

    #[tokio::test]
    async fn test_session_and_attendance_defaults() {
        let store = MemoryRecordStore::new();
        let user = test_user();
        let audit = AuditFields::now(&user);
        let program = create_record::<TrainingProgram, _>(
            &store,
            &FormData::new().with("code", "FOR-002").with("title", "Métrologie"),
            &audit,
        )
        .await
        .unwrap();
        let program_id = program.id;

        let session = create_record::<TrainingSession, _>(
            &store,
            &FormData::new()
                .with("program_id", &program_id.to_string())
                .with("session_date", "2025-06-12T09:00:00Z"),
            &audit,
        )
        .await
        .unwrap();
        assert_eq!(session.status, "planned");
        assert_eq!(session.program_id, program_id);

        let attendance = create_record::<TrainingAttendance, _>(
            &store,
            &FormData::new()
                .with("session_id", &session.id.to_string())
                .with("attended", "true"),
            &audit,
        )
        .await
        .unwrap();
        assert_eq!(attendance.user_id, user.id);
        assert_eq!(attendance.attended, Some(true));
        assert_eq!(attendance.certificate_issued, Some(false));
    }

    #[tokio::test]
    async fn test_session_requires_existing_program() {
        let store = MemoryRecordStore::new();
        let form = FormData::new()
            .with("program_id", &Uuid::new_v4().to_string())
            .with("session_date", "2025-06-12T09:00:00Z");
        let err = create_record::<TrainingSession, _>(&store, &form, &AuditFields::now(&test_user()))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("training_sessions_program_id_fkey"));
    }
}
