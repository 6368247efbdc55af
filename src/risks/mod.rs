//! Risk register. The level is derived from probability and impact.

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
use crate::core::shared::enums::{RiskLevel, RiskStatus};
use crate::core::shared::schema::risks;
use crate::core::shared::state::AppState;
use crate::core::ui::badges::{badge_for, BadgeSpec};
use crate::core::ui::components::{html_escape, optional_text, render_table};
use crate::core::urls::{ApiUrls, PageUrls};

pub const SCALE_MIN: i32 = 1;
pub const SCALE_MAX: i32 = 5;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Queryable)]
#[diesel(table_name = risks)]
pub struct Risk {
    pub id: Uuid,
    pub risk_number: String,
    pub title: String,
    pub description: String,
    pub category: Option<String>,
    pub probability: Option<i32>,
    pub impact: Option<i32>,
    /// `probability * impact`, 1 to 25.
    pub risk_level: Option<i32>,
    pub mitigation_plan: Option<String>,
    pub status: String,
    pub owner_id: Uuid,
    pub process_id: Option<Uuid>,
    pub review_date: Option<NaiveDate>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Risk {
    pub fn level(&self) -> Option<RiskLevel> {
        self.risk_level.map(RiskLevel::from_score)
    }
}

#[derive(Debug, Clone, PartialEq, Insertable)]
#[diesel(table_name = risks)]
pub struct NewRisk {
    pub risk_number: String,
    pub title: String,
    pub description: String,
    pub category: Option<String>,
    pub probability: Option<i32>,
    pub impact: Option<i32>,
    pub risk_level: Option<i32>,
    pub mitigation_plan: Option<String>,
    pub owner_id: Uuid,
    pub process_id: Option<Uuid>,
    pub review_date: Option<NaiveDate>,
}

pub fn risk_score(probability: Option<i32>, impact: Option<i32>) -> Option<i32> {
    Some(probability? * impact?)
}

impl Record for Risk {
    type New = NewRisk;

    const TABLE: &'static str = "risks";
    const COLUMNS: &'static [&'static str] = &[
        "id",
        "risk_number",
        "title",
        "description",
        "category",
        "probability",
        "impact",
        "risk_level",
        "mitigation_plan",
        "status",
        "owner_id",
        "process_id",
        "review_date",
        "created_at",
        "updated_at",
    ];
    const UNIQUE: &'static [&'static [&'static str]] = &[&["risk_number"]];
    const REFERENCES: &'static [(&'static str, &'static str)] = &[("process_id", "processes")];

    fn id(&self) -> Uuid {
        self.id
    }

    fn materialize(new: NewRisk, id: Uuid, now: DateTime<Utc>) -> Self {
        Self {
            id,
            risk_number: new.risk_number,
            title: new.title,
            description: new.description,
            category: new.category,
            probability: new.probability,
            impact: new.impact,
            risk_level: new.risk_level,
            mitigation_plan: new.mitigation_plan,
            status: RiskStatus::Identified.to_string(),
            owner_id: new.owner_id,
            process_id: new.process_id,
            review_date: new.review_date,
            created_at: now,
            updated_at: now,
        }
    }
}

impl Creatable for Risk {
    const FIELDS: &'static [FieldSpec] = &[
        FieldSpec::text("risk_number", "Numéro de risque")
            .required()
            .placeholder("RSK-2025-001"),
        FieldSpec::text("title", "Titre").required(),
        FieldSpec::textarea("description", "Description").required(),
        FieldSpec::text("category", "Catégorie").placeholder("Ex: Opérationnel, Fournisseur, Réglementaire"),
        FieldSpec::range("probability", "Probabilité (1-5)", 1.0, 5.0),
        FieldSpec::range("impact", "Impact (1-5)", 1.0, 5.0),
        FieldSpec::textarea("mitigation_plan", "Plan de traitement"),
        FieldSpec::date("review_date", "Date de revue"),
    ];

    fn from_form(form: &FormData, audit: &AuditFields) -> Result<NewRisk, ValidationError> {
        let probability = form.integer_in("probability", SCALE_MIN, SCALE_MAX)?;
        let impact = form.integer_in("impact", SCALE_MIN, SCALE_MAX)?;
        Ok(NewRisk {
            risk_number: form.required("risk_number")?,
            title: form.required("title")?,
            description: form.required("description")?,
            category: form.text("category"),
            probability,
            impact,
            risk_level: risk_score(probability, impact),
            mitigation_plan: form.text("mitigation_plan"),
            owner_id: audit.user_id,
            process_id: form.uuid("process_id")?,
            review_date: form.date("review_date")?,
        })
    }
}

impl PageEntity for Risk {
    const PAGE: PageMeta = PageMeta {
        path: PageUrls::RISKS,
        title: "Gestion des risques",
        subtitle: "Identification, évaluation et traitement des risques",
        new_label: "Nouveau risque",
        dialog_title: "Identifier un nouveau risque",
        dialog_description: "Décrivez le risque et évaluez sa criticité",
        list_heading: Some(ListHeading {
            title: "Matrice des risques",
            summary: |_| "Cartographie et suivi des risques identifiés".to_string(),
        }),
        empty_icon: "🛡️",
        empty_message: "Aucun risque enregistré",
        load_error: "Impossible de charger les risques",
        created_message: "Risque créé avec succès",
        order_by: "created_at",
    };

    fn render_list(rows: &[Self]) -> String {
        let rows: Vec<Vec<String>> = rows
            .iter()
            .map(|risk| {
                let level = match (risk.level(), risk.risk_level) {
                    (Some(level), Some(score)) => format!("{} {score}", level.badge().render()),
                    _ => "-".to_string(),
                };
                vec![
                    format!("<strong>{}</strong>", html_escape(&risk.risk_number)),
                    html_escape(&risk.title),
                    optional_text(risk.category.as_deref(), "-"),
                    level,
                    badge_for::<RiskStatus>(&risk.status).render(),
                ]
            })
            .collect();
        render_table(&["Numéro", "Titre", "Catégorie", "Criticité", "Statut"], &rows)
    }
}

pub fn configure_risk_routes() -> Router<Arc<AppState>> {
    page_routes::<Risk>().merge(record_routes::<Risk>(ApiUrls::RISKS))
}
