//! Key performance indicators and their periodic measurements.

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
use crate::core::shared::enums::{KpiFrequency, TargetOperator};
use crate::core::shared::schema::{kpi_values, kpis};
use crate::core::shared::state::AppState;
use crate::core::ui::badges::badge_for;
use crate::core::ui::components::{html_escape, render_table};
use crate::core::urls::{ApiUrls, PageUrls};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Queryable)]
#[diesel(table_name = kpis)]
pub struct Kpi {
    pub id: Uuid,
    pub code: String,
    pub name: String,
    pub description: Option<String>,
    pub unit: String,
    pub frequency: String,
    pub target_value: Option<f64>,
    pub target_operator: Option<String>,
    pub owner_id: Uuid,
    pub process_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Kpi {
    /// Whether a measured value meets the target; `None` without a target.
    pub fn meets_target(&self, actual: f64) -> Option<bool> {
        let target = self.target_value?;
        let operator = self
            .target_operator
            .as_deref()
            .and_then(|op| op.parse::<TargetOperator>().ok())
            .unwrap_or_default();
        Some(operator.meets(actual, target))
    }
}

#[derive(Debug, Clone, PartialEq, Insertable)]
#[diesel(table_name = kpis)]
pub struct NewKpi {
    pub code: String,
    pub name: String,
    pub description: Option<String>,
    pub unit: String,
    pub frequency: String,
    pub target_value: Option<f64>,
    pub target_operator: Option<String>,
    pub owner_id: Uuid,
    pub process_id: Option<Uuid>,
}

const FREQUENCY_OPTIONS: &[(&str, &str)] = &[
    ("monthly", "Mensuel"),
    ("quarterly", "Trimestriel"),
    ("semiannual", "Semestriel"),
    ("yearly", "Annuel"),
];

const OPERATOR_OPTIONS: &[(&str, &str)] = &[
    (">=", "Supérieur ou égal (≥)"),
    ("<=", "Inférieur ou égal (≤)"),
    ("=", "Égal (=)"),
];

impl Record for Kpi {
    type New = NewKpi;

    const TABLE: &'static str = "kpis";
    const COLUMNS: &'static [&'static str] = &[
        "id",
        "code",
        "name",
        "description",
        "unit",
        "frequency",
        "target_value",
        "target_operator",
        "owner_id",
        "process_id",
        "created_at",
        "updated_at",
    ];
    const UNIQUE: &'static [&'static [&'static str]] = &[&["code"]];
    const REFERENCES: &'static [(&'static str, &'static str)] = &[("process_id", "processes")];

    fn id(&self) -> Uuid {
        self.id
    }

    fn materialize(new: NewKpi, id: Uuid, now: DateTime<Utc>) -> Self {
        Self {
            id,
            code: new.code,
            name: new.name,
            description: new.description,
            unit: new.unit,
            frequency: new.frequency,
            target_value: new.target_value,
            target_operator: new.target_operator,
            owner_id: new.owner_id,
            process_id: new.process_id,
            created_at: now,
            updated_at: now,
        }
    }
}

impl Creatable for Kpi {
    const FIELDS: &'static [FieldSpec] = &[
        FieldSpec::text("code", "Code").required().placeholder("KPI-01"),
        FieldSpec::text("name", "Nom de l'indicateur").required(),
        FieldSpec::text("unit", "Unité").required().placeholder("%, jours, nombre..."),
        FieldSpec::select("frequency", "Fréquence", FREQUENCY_OPTIONS).required(),
        FieldSpec::number("target_value", "Valeur cible"),
        FieldSpec::select("target_operator", "Opérateur", OPERATOR_OPTIONS),
        FieldSpec::textarea("description", "Description"),
    ];

    fn from_form(form: &FormData, audit: &AuditFields) -> Result<NewKpi, ValidationError> {
        let frequency: KpiFrequency = form.required_parsed("frequency")?;
        let target_value = form.number("target_value")?;
        let operator: Option<TargetOperator> = form.parsed("target_operator")?;
        // An operator only means something next to a target.
        let target_operator = target_value.map(|_| operator.unwrap_or_default().to_string());
        Ok(NewKpi {
            code: form.required("code")?,
            name: form.required("name")?,
            description: form.text("description"),
            unit: form.required("unit")?,
            frequency: frequency.to_string(),
            target_value,
            target_operator,
            owner_id: audit.user_id,
            process_id: form.uuid("process_id")?,
        })
    }
}

impl PageEntity for Kpi {
    const PAGE: PageMeta = PageMeta {
        path: PageUrls::KPIS,
        title: "Indicateurs de performance",
        subtitle: "Suivi des KPIs et tableaux de bord",
        new_label: "Nouvel indicateur",
        dialog_title: "Créer un nouvel indicateur",
        dialog_description: "Définissez l'indicateur et sa cible",
        list_heading: Some(ListHeading {
            title: "Indicateurs clés",
            summary: |_| "Visualisez vos indicateurs de performance qualité".to_string(),
        }),
        empty_icon: "📈",
        empty_message: "Aucun indicateur configuré",
        load_error: "Impossible de charger les indicateurs",
        created_message: "Indicateur créé avec succès",
        order_by: "created_at",
    };

    fn render_list(rows: &[Self]) -> String {
        let rows: Vec<Vec<String>> = rows
            .iter()
            .map(|kpi| {
                let target = match (kpi.target_operator.as_deref(), kpi.target_value) {
                    (Some(op), Some(value)) => {
                        format!("{} {value} {}", html_escape(op), html_escape(&kpi.unit))
                    }
                    (None, Some(value)) => format!("{value} {}", html_escape(&kpi.unit)),
                    _ => "-".to_string(),
                };
                vec![
                    format!("<strong>{}</strong>", html_escape(&kpi.code)),
                    html_escape(&kpi.name),
                    html_escape(&kpi.unit),
                    badge_for::<KpiFrequency>(&kpi.frequency).render(),
                    target,
                ]
            })
            .collect();
        render_table(&["Code", "Indicateur", "Unité", "Fréquence", "Cible"], &rows)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Queryable)]
#[diesel(table_name = kpi_values)]
pub struct KpiValue {
    pub id: Uuid,
    pub kpi_id: Uuid,
    pub period_date: NaiveDate,
    pub actual_value: f64,
    pub target_value: Option<f64>,
    pub notes: Option<String>,
    pub recorded_by: Uuid,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Insertable)]
#[diesel(table_name = kpi_values)]
pub struct NewKpiValue {
    pub kpi_id: Uuid,
    pub period_date: NaiveDate,
    pub actual_value: f64,
    pub target_value: Option<f64>,
    pub notes: Option<String>,
    pub recorded_by: Uuid,
}

impl Record for KpiValue {
    type New = NewKpiValue;

    const TABLE: &'static str = "kpi_values";
    const COLUMNS: &'static [&'static str] = &[
        "id",
        "kpi_id",
        "period_date",
        "actual_value",
        "target_value",
        "notes",
        "recorded_by",
        "created_at",
    ];
    const REFERENCES: &'static [(&'static str, &'static str)] = &[("kpi_id", "kpis")];

    fn id(&self) -> Uuid {
        self.id
    }

    fn materialize(new: NewKpiValue, id: Uuid, now: DateTime<Utc>) -> Self {
        Self {
            id,
            kpi_id: new.kpi_id,
            period_date: new.period_date,
            actual_value: new.actual_value,
            target_value: new.target_value,
            notes: new.notes,
            recorded_by: new.recorded_by,
            created_at: now,
        }
    }
}

impl Creatable for KpiValue {
    const FIELDS: &'static [FieldSpec] = &[
        FieldSpec::text("kpi_id", "Indicateur").required(),
        FieldSpec::date("period_date", "Période").required(),
        FieldSpec::number("actual_value", "Valeur mesurée").required(),
        FieldSpec::number("target_value", "Valeur cible"),
        FieldSpec::textarea("notes", "Notes"),
    ];

    fn from_form(form: &FormData, audit: &AuditFields) -> Result<NewKpiValue, ValidationError> {
        Ok(NewKpiValue {
            kpi_id: form.required_parsed("kpi_id")?,
            period_date: form.required_date("period_date")?,
            actual_value: form.required_parsed("actual_value")?,
            target_value: form.number("target_value")?,
            notes: form.text("notes"),
            recorded_by: audit.user_id,
        })
    }
}

pub fn configure_kpi_routes() -> Router<Arc<AppState>> {
    page_routes::<Kpi>()
        .merge(record_routes::<Kpi>(ApiUrls::KPIS))
        .merge(record_routes::<KpiValue>(ApiUrls::KPI_VALUES))
}
