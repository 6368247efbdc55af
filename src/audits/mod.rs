//! Audit programme and audit findings.

mod ui;

use axum::Router;
use chrono::{DateTime, NaiveDate, Utc};
use diesel::prelude::*;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

use crate::core::pages::handlers::page_routes;
use crate::core::pages::{PageEntity, PageMeta};
use crate::core::records::api::record_routes;
use crate::core::records::{AuditFields, Creatable, FieldSpec, FormData, Record, ValidationError};
use crate::core::shared::enums::{AuditStatus, AuditType, FindingType, NcSeverity};
use crate::core::shared::schema::{audit_findings, audits};
use crate::core::shared::state::AppState;
use crate::core::urls::{ApiUrls, PageUrls};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Queryable)]
#[diesel(table_name = audits)]
pub struct Audit {
    pub id: Uuid,
    pub audit_number: String,
    pub title: String,
    pub audit_type: String,
    pub status: String,
    pub scope: String,
    pub objectives: Option<String>,
    pub lead_auditor_id: Uuid,
    pub audit_team: Option<Vec<String>>,
    pub processes_audited: Option<Vec<String>>,
    pub planned_start_date: NaiveDate,
    pub planned_end_date: NaiveDate,
    pub actual_start_date: Option<NaiveDate>,
    pub actual_end_date: Option<NaiveDate>,
    pub findings_summary: Option<String>,
    pub report_url: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Insertable)]
#[diesel(table_name = audits)]
pub struct NewAudit {
    pub audit_number: String,
    pub title: String,
    pub audit_type: String,
    pub scope: String,
    pub objectives: Option<String>,
    pub lead_auditor_id: Uuid,
    pub audit_team: Option<Vec<String>>,
    pub processes_audited: Option<Vec<String>>,
    pub planned_start_date: NaiveDate,
    pub planned_end_date: NaiveDate,
}

const TYPE_OPTIONS: &[(&str, &str)] = &[
    ("internal", "Audit interne"),
    ("external", "Audit externe"),
    ("certification", "Certification"),
    ("surveillance", "Surveillance"),
];

/// Comma-separated input as a list; blank input is no list.
fn split_list(form: &FormData, name: &str) -> Option<Vec<String>> {
    let items: Vec<String> = form
        .text(name)?
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect();
    (!items.is_empty()).then_some(items)
}

impl Record for Audit {
    type New = NewAudit;

    const TABLE: &'static str = "audits";
    const COLUMNS: &'static [&'static str] = &[
        "id",
        "audit_number",
        "title",
        "audit_type",
        "status",
        "scope",
        "objectives",
        "lead_auditor_id",
        "audit_team",
        "processes_audited",
        "planned_start_date",
        "planned_end_date",
        "actual_start_date",
        "actual_end_date",
        "findings_summary",
        "report_url",
        "created_at",
        "updated_at",
    ];
    const UNIQUE: &'static [&'static [&'static str]] = &[&["audit_number"]];

    fn id(&self) -> Uuid {
        self.id
    }

    fn materialize(new: NewAudit, id: Uuid, now: DateTime<Utc>) -> Self {
        Self {
            id,
            audit_number: new.audit_number,
            title: new.title,
            audit_type: new.audit_type,
            status: AuditStatus::Planned.to_string(),
            scope: new.scope,
            objectives: new.objectives,
            lead_auditor_id: new.lead_auditor_id,
            audit_team: new.audit_team,
            processes_audited: new.processes_audited,
            planned_start_date: new.planned_start_date,
            planned_end_date: new.planned_end_date,
            actual_start_date: None,
            actual_end_date: None,
            findings_summary: None,
            report_url: None,
            created_at: now,
            updated_at: now,
        }
    }
}

impl Creatable for Audit {
    const FIELDS: &'static [FieldSpec] = &[
        FieldSpec::text("audit_number", "Numéro d'audit")
            .required()
            .placeholder("AUD-2025-001"),
        FieldSpec::select("audit_type", "Type d'audit", TYPE_OPTIONS).required(),
        FieldSpec::text("title", "Titre").required(),
        FieldSpec::textarea("scope", "Périmètre").required(),
        FieldSpec::textarea("objectives", "Objectifs"),
        FieldSpec::date("planned_start_date", "Date de début").required(),
        FieldSpec::date("planned_end_date", "Date de fin").required(),
    ];

    fn from_form(form: &FormData, audit: &AuditFields) -> Result<NewAudit, ValidationError> {
        let audit_type: AuditType = form.required_parsed("audit_type")?;
        let start = form.required_date("planned_start_date")?;
        let end = form.required_date("planned_end_date")?;
        if end < start {
            return Err(ValidationError::InvalidValue {
                field: "planned_end_date".to_string(),
                value: form.raw("planned_end_date").to_string(),
            });
        }
        Ok(NewAudit {
            audit_number: form.required("audit_number")?,
            title: form.required("title")?,
            audit_type: audit_type.to_string(),
            scope: form.required("scope")?,
            objectives: form.text("objectives"),
            lead_auditor_id: audit.user_id,
            audit_team: split_list(form, "audit_team"),
            processes_audited: split_list(form, "processes_audited"),
            planned_start_date: start,
            planned_end_date: end,
        })
    }
}

impl PageEntity for Audit {
    const PAGE: PageMeta = PageMeta {
        path: PageUrls::AUDITS,
        title: "Audits",
        subtitle: "Planification et suivi des audits qualité",
        new_label: "Nouvel audit",
        dialog_title: "Planifier un nouvel audit",
        dialog_description: "Définissez les paramètres de l'audit",
        list_heading: None,
        empty_icon: "📋",
        empty_message: "Aucun audit planifié",
        load_error: "Impossible de charger les audits",
        created_message: "Audit créé avec succès",
        order_by: "planned_start_date",
    };

    fn render_list(rows: &[Self]) -> String {
        ui::render_audit_cards(rows)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Queryable)]
#[diesel(table_name = audit_findings)]
pub struct AuditFinding {
    pub id: Uuid,
    pub finding_number: String,
    pub audit_id: Uuid,
    pub finding_type: String,
    pub severity: Option<String>,
    pub description: String,
    pub clause_reference: Option<String>,
    pub evidence: Option<String>,
    pub recommendation: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Insertable)]
#[diesel(table_name = audit_findings)]
pub struct NewAuditFinding {
    pub finding_number: String,
    pub audit_id: Uuid,
    pub finding_type: String,
    pub severity: Option<String>,
    pub description: String,
    pub clause_reference: Option<String>,
    pub evidence: Option<String>,
    pub recommendation: Option<String>,
}

impl Record for AuditFinding {
    type New = NewAuditFinding;

    const TABLE: &'static str = "audit_findings";
    const COLUMNS: &'static [&'static str] = &[
        "id",
        "finding_number",
        "audit_id",
        "finding_type",
        "severity",
        "description",
        "clause_reference",
        "evidence",
        "recommendation",
        "created_at",
        "updated_at",
    ];
    const UNIQUE: &'static [&'static [&'static str]] = &[&["finding_number"]];
    const REFERENCES: &'static [(&'static str, &'static str)] = &[("audit_id", "audits")];

    fn id(&self) -> Uuid {
        self.id
    }

    fn materialize(new: NewAuditFinding, id: Uuid, now: DateTime<Utc>) -> Self {
        Self {
            id,
            finding_number: new.finding_number,
            audit_id: new.audit_id,
            finding_type: new.finding_type,
            severity: new.severity,
            description: new.description,
            clause_reference: new.clause_reference,
            evidence: new.evidence,
            recommendation: new.recommendation,
            created_at: now,
            updated_at: now,
        }
    }
}

impl Creatable for AuditFinding {
    const FIELDS: &'static [FieldSpec] = &[
        FieldSpec::text("finding_number", "Numéro de constat").required(),
        FieldSpec::text("audit_id", "Audit").required(),
        FieldSpec::text("finding_type", "Type de constat").required(),
        FieldSpec::textarea("description", "Description").required(),
        FieldSpec::text("severity", "Sévérité"),
        FieldSpec::text("clause_reference", "Référence de la norme").placeholder("8.5.1"),
        FieldSpec::textarea("evidence", "Preuves"),
        FieldSpec::textarea("recommendation", "Recommandation"),
    ];

    fn from_form(form: &FormData, _audit: &AuditFields) -> Result<NewAuditFinding, ValidationError> {
        let finding_type: FindingType = form.required_parsed("finding_type")?;
        let severity: Option<NcSeverity> = form.parsed("severity")?;
        Ok(NewAuditFinding {
            finding_number: form.required("finding_number")?,
            audit_id: form.required_parsed("audit_id")?,
            finding_type: finding_type.to_string(),
            severity: severity.map(|s| s.to_string()),
            description: form.required("description")?,
            clause_reference: form.text("clause_reference"),
            evidence: form.text("evidence"),
            recommendation: form.text("recommendation"),
        })
    }
}

pub fn configure_audit_routes() -> Router<Arc<AppState>> {
    page_routes::<Audit>()
        .merge(record_routes::<Audit>(ApiUrls::AUDITS))
        .merge(record_routes::<AuditFinding>(ApiUrls::AUDIT_FINDINGS))
}
