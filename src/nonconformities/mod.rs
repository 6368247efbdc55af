//! Non-conformities and the corrective actions raised against them.

mod ui;

use axum::Router;
use chrono::{DateTime, NaiveDate, Utc};
use diesel::prelude::*;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

use crate::core::pages::handlers::page_routes;
use crate::core::pages::{ListHeading, PageEntity, PageMeta};
use crate::core::records::api::record_routes;
use crate::core::records::{AuditFields, Creatable, FieldSpec, FormData, Record, ValidationError};
use crate::core::shared::enums::{NcSeverity, NcStatus};
use crate::core::shared::schema::{corrective_actions, non_conformities};
use crate::core::shared::state::AppState;
use crate::core::urls::{ApiUrls, PageUrls};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Queryable)]
#[diesel(table_name = non_conformities)]
pub struct NonConformity {
    pub id: Uuid,
    pub nc_number: String,
    pub title: String,
    pub description: String,
    pub severity: String,
    pub status: String,
    pub source: Option<String>,
    pub process_id: Option<Uuid>,
    pub detected_by: Uuid,
    pub detected_date: DateTime<Utc>,
    pub assigned_to: Option<Uuid>,
    pub immediate_action: Option<String>,
    pub root_cause: Option<String>,
    pub target_close_date: Option<NaiveDate>,
    pub actual_close_date: Option<NaiveDate>,
    pub verification_date: Option<NaiveDate>,
    pub verified_by: Option<Uuid>,
    pub verification_notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Insertable)]
#[diesel(table_name = non_conformities)]
pub struct NewNonConformity {
    pub nc_number: String,
    pub title: String,
    pub description: String,
    pub severity: String,
    pub source: Option<String>,
    pub process_id: Option<Uuid>,
    pub detected_by: Uuid,
    pub detected_date: DateTime<Utc>,
    pub assigned_to: Option<Uuid>,
    pub immediate_action: Option<String>,
    pub target_close_date: Option<NaiveDate>,
}

const SEVERITY_OPTIONS: &[(&str, &str)] = &[
    ("minor", "Mineure"),
    ("major", "Majeure"),
    ("critical", "Critique"),
];

impl Record for NonConformity {
    type New = NewNonConformity;

    const TABLE: &'static str = "non_conformities";
    const COLUMNS: &'static [&'static str] = &[
        "id",
        "nc_number",
        "title",
        "description",
        "severity",
        "status",
        "source",
        "process_id",
        "detected_by",
        "detected_date",
        "assigned_to",
        "immediate_action",
        "root_cause",
        "target_close_date",
        "actual_close_date",
        "verification_date",
        "verified_by",
        "verification_notes",
        "created_at",
        "updated_at",
    ];
    const UNIQUE: &'static [&'static [&'static str]] = &[&["nc_number"]];
    const REFERENCES: &'static [(&'static str, &'static str)] = &[("process_id", "processes")];

    fn id(&self) -> Uuid {
        self.id
    }

    fn materialize(new: NewNonConformity, id: Uuid, now: DateTime<Utc>) -> Self {
        Self {
            id,
            nc_number: new.nc_number,
            title: new.title,
            description: new.description,
            severity: new.severity,
            status: NcStatus::Open.to_string(),
            source: new.source,
            process_id: new.process_id,
            detected_by: new.detected_by,
            detected_date: new.detected_date,
            assigned_to: new.assigned_to,
            immediate_action: new.immediate_action,
            root_cause: None,
            target_close_date: new.target_close_date,
            actual_close_date: None,
            verification_date: None,
            verified_by: None,
            verification_notes: None,
            created_at: now,
            updated_at: now,
        }
    }
}

impl Creatable for NonConformity {
    const FIELDS: &'static [FieldSpec] = &[
        FieldSpec::text("nc_number", "Numéro NC")
            .required()
            .placeholder("NC-2025-001"),
        FieldSpec::select("severity", "Sévérité", SEVERITY_OPTIONS).required(),
        FieldSpec::text("title", "Titre").required(),
        FieldSpec::textarea("description", "Description").required(),
        FieldSpec::text("source", "Source").placeholder("Audit, réclamation client, inspection..."),
    ];

    /// The reporting user is the detector; detection time is now.
    fn from_form(form: &FormData, audit: &AuditFields) -> Result<NewNonConformity, ValidationError> {
        let severity: NcSeverity = form.required_parsed("severity")?;
        Ok(NewNonConformity {
            nc_number: form.required("nc_number")?,
            title: form.required("title")?,
            description: form.required("description")?,
            severity: severity.to_string(),
            source: form.text("source"),
            process_id: form.uuid("process_id")?,
            detected_by: audit.user_id,
            detected_date: audit.at,
            assigned_to: form.uuid("assigned_to")?,
            immediate_action: form.text("immediate_action"),
            target_close_date: form.date("target_close_date")?,
        })
    }
}

impl PageEntity for NonConformity {
    const PAGE: PageMeta = PageMeta {
        path: PageUrls::NON_CONFORMITIES,
        title: "Non-conformités",
        subtitle: "Suivi et gestion des non-conformités",
        new_label: "Nouvelle NC",
        dialog_title: "Déclarer une non-conformité",
        dialog_description: "Enregistrez les détails de la non-conformité détectée",
        list_heading: Some(ListHeading {
            title: "Liste des non-conformités",
            summary: |n| format!("{n} non-conformité(s) enregistrée(s)"),
        }),
        empty_icon: "⚠️",
        empty_message: "Aucune non-conformité enregistrée",
        load_error: "Impossible de charger les non-conformités",
        created_message: "Non-conformité créée avec succès",
        order_by: "detected_date",
    };

    fn render_list(rows: &[Self]) -> String {
        ui::render_nc_table(rows)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Queryable)]
#[diesel(table_name = corrective_actions)]
pub struct CorrectiveAction {
    pub id: Uuid,
    pub action_number: String,
    pub nc_id: Uuid,
    pub description: String,
    pub responsible_id: Uuid,
    pub status: String,
    pub target_date: NaiveDate,
    pub completion_date: Option<NaiveDate>,
    pub effectiveness_verified: Option<bool>,
    pub verification_notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Insertable)]
#[diesel(table_name = corrective_actions)]
pub struct NewCorrectiveAction {
    pub action_number: String,
    pub nc_id: Uuid,
    pub description: String,
    pub responsible_id: Uuid,
    pub target_date: NaiveDate,
}

impl Record for CorrectiveAction {
    type New = NewCorrectiveAction;

    const TABLE: &'static str = "corrective_actions";
    const COLUMNS: &'static [&'static str] = &[
        "id",
        "action_number",
        "nc_id",
        "description",
        "responsible_id",
        "status",
        "target_date",
        "completion_date",
        "effectiveness_verified",
        "verification_notes",
        "created_at",
        "updated_at",
    ];
    const UNIQUE: &'static [&'static [&'static str]] = &[&["action_number"]];
    const REFERENCES: &'static [(&'static str, &'static str)] = &[("nc_id", "non_conformities")];

    fn id(&self) -> Uuid {
        self.id
    }

    fn materialize(new: NewCorrectiveAction, id: Uuid, now: DateTime<Utc>) -> Self {
        Self {
            id,
            action_number: new.action_number,
            nc_id: new.nc_id,
            description: new.description,
            responsible_id: new.responsible_id,
            status: NcStatus::Open.to_string(),
            target_date: new.target_date,
            completion_date: None,
            effectiveness_verified: Some(false),
            verification_notes: None,
            created_at: now,
            updated_at: now,
        }
    }
}

impl Creatable for CorrectiveAction {
    const FIELDS: &'static [FieldSpec] = &[
        FieldSpec::text("action_number", "Numéro d'action").required(),
        FieldSpec::text("nc_id", "Non-conformité").required(),
        FieldSpec::textarea("description", "Description").required(),
        FieldSpec::date("target_date", "Date cible").required(),
        FieldSpec::text("responsible_id", "Responsable"),
    ];

    /// Without an explicit responsible the creator owns the action.
    fn from_form(form: &FormData, audit: &AuditFields) -> Result<NewCorrectiveAction, ValidationError> {
        Ok(NewCorrectiveAction {
            action_number: form.required("action_number")?,
            nc_id: form.required_parsed("nc_id")?,
            description: form.required("description")?,
            responsible_id: form.uuid("responsible_id")?.unwrap_or(audit.user_id),
            target_date: form.required_date("target_date")?,
        })
    }
}

pub fn configure_nonconformity_routes() -> Router<Arc<AppState>> {
    page_routes::<NonConformity>()
        .merge(record_routes::<NonConformity>(ApiUrls::NON_CONFORMITIES))
        .merge(record_routes::<CorrectiveAction>(ApiUrls::CORRECTIVE_ACTIONS))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::pages::{CrudPage, DialogState, SubmitOutcome};
    use crate::core::records::{create_record, MemoryRecordStore, Repository};
    use crate::core::shared::test_utils::test_user;
    use crate::core::ui::badges::{badge_for, BadgeVariant};

    #[tokio::test]
    async fn test_declare_nc_scenario() {
        let store = Arc::new(MemoryRecordStore::new());
        let user = test_user();
        let mut page = CrudPage::<NonConformity, _>::new(Arc::clone(&store));
        page.mount().await;

        page.open_form();
        page.fill(
            FormData::new()
                .with("nc_number", "NC-2025-001")
                .with("title", "Scratch on panel")
                .with("description", "Rayure visible sur le panneau avant")
                .with("severity", "major")
                .with("source", ""),
        );
        let outcome = page.submit(Some(&user)).await;
        assert!(matches!(outcome, SubmitOutcome::Created(_)));
        assert_eq!(page.dialog_state(), DialogState::Closed);

        let first = &page.rows()[0];
        assert_eq!(first.nc_number, "NC-2025-001");
        assert_eq!(first.source, None);
        assert_eq!(first.status, "open");
        assert_eq!(first.detected_by, user.id);
        assert_eq!(
            badge_for::<NcSeverity>(&first.severity).variant,
            BadgeVariant::Default
        );
        assert!(page.render_content().contains("tone-orange"));
    }

    #[test]
    fn test_detection_time_is_audit_time() {
        let user = test_user();
        let audit = AuditFields::now(&user);
        let form = FormData::new()
            .with("nc_number", "NC-1")
            .with("title", "T")
            .with("description", "D")
            .with("severity", "critical");
        let row = NonConformity::from_form(&form, &audit).unwrap();
        assert_eq!(row.detected_date, audit.at);
        assert_eq!(row.detected_by, user.id);
    }

    #[tokio::test]
    async fn test_listed_by_detection_date() {
        let store = MemoryRecordStore::new();
        let user = test_user();
        for (number, days_ago) in [("NC-1", 10), ("NC-2", 1), ("NC-3", 5)] {
            let form = FormData::new()
                .with("nc_number", number)
                .with("title", "T")
                .with("description", "D")
                .with("severity", "minor");
            let mut audit = AuditFields::now(&user);
            audit.at -= chrono::Duration::days(days_ago);
            let row = NonConformity::from_form(&form, &audit).unwrap();
            Repository::<NonConformity>::create(&store, row).await.unwrap();
        }
        let rows = Repository::<NonConformity>::list(&store, &NonConformity::list_query())
            .await
            .unwrap();
        let numbers: Vec<&str> = rows.iter().map(|r| r.nc_number.as_str()).collect();
        assert_eq!(numbers, ["NC-2", "NC-3", "NC-1"]);
    }

    #[test]
    fn test_corrective_action_defaults_responsible() {
        let user = test_user();
        let nc_id = Uuid::new_v4();
        let form = FormData::new()
            .with("action_number", "AC-001")
            .with("nc_id", &nc_id.to_string())
            .with("description", "Former l'équipe")
            .with("target_date", "2025-06-30");
        let row = CorrectiveAction::from_form(&form, &AuditFields::now(&user)).unwrap();
        assert_eq!(row.nc_id, nc_id);
        assert_eq!(row.responsible_id, user.id);

        let bad = form.with("nc_id", "not-a-uuid");
        assert!(CorrectiveAction::from_form(&bad, &AuditFields::now(&user)).is_err());
    }

    #[tokio::test]
    async fn test_duplicate_number_and_unknown_nc_rejected() {
        let store = MemoryRecordStore::new();
        let audit = AuditFields::now(&test_user());
        let form = FormData::new()
            .with("nc_number", "NC-2025-001")
            .with("title", "T")
            .with("description", "D")
            .with("severity", "minor");
        let nc = create_record::<NonConformity, _>(&store, &form, &audit)
            .await
            .unwrap();
        let err = create_record::<NonConformity, _>(&store, &form, &audit)
            .await
            .unwrap_err();
        assert!(err.to_string().contains("non_conformities_nc_number_key"));
        assert_eq!(Repository::<NonConformity>::count(&store, &[]).await.unwrap(), 1);

        let action = FormData::new()
            .with("action_number", "AC-001")
            .with("description", "Former l'équipe")
            .with("target_date", "2025-06-30");
        let dangling = action.clone().with("nc_id", &Uuid::new_v4().to_string());
        let err = create_record::<CorrectiveAction, _>(&store, &dangling, &audit)
            .await
            .unwrap_err();
        assert!(err.to_string().contains("corrective_actions_nc_id_fkey"));

        let linked = action.with("nc_id", &nc.id.to_string());
        let created = create_record::<CorrectiveAction, _>(&store, &linked, &audit)
            .await
            .unwrap();
        assert_eq!(created.nc_id, nc.id);
    }
}
