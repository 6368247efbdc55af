//! Business process map.

use axum::Router;
use chrono::{DateTime, Utc};
use diesel::prelude::*;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

use crate::core::pages::handlers::page_routes;
use crate::core::pages::{PageEntity, PageMeta};
use crate::core::records::api::record_routes;
use crate::core::records::{AuditFields, Creatable, FieldSpec, FormData, Record, ValidationError};
use crate::core::shared::schema::processes;
use crate::core::shared::state::AppState;
use crate::core::ui::components::{html_escape, optional_text, render_card, render_card_grid};
use crate::core::urls::{ApiUrls, PageUrls};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Queryable)]
#[diesel(table_name = processes)]
pub struct Process {
    pub id: Uuid,
    pub code: String,
    pub name: String,
    pub category: Option<String>,
    pub description: Option<String>,
    pub objectives: Option<String>,
    pub inputs: Option<String>,
    pub outputs: Option<String>,
    pub resources: Option<String>,
    pub kpis: Option<String>,
    pub owner_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Insertable)]
#[diesel(table_name = processes)]
pub struct NewProcess {
    pub code: String,
    pub name: String,
    pub category: Option<String>,
    pub description: Option<String>,
    pub objectives: Option<String>,
    pub inputs: Option<String>,
    pub outputs: Option<String>,
    pub resources: Option<String>,
    pub kpis: Option<String>,
    pub owner_id: Uuid,
}

impl Record for Process {
    type New = NewProcess;

    const TABLE: &'static str = "processes";
    const COLUMNS: &'static [&'static str] = &[
        "id",
        "code",
        "name",
        "category",
        "description",
        "objectives",
        "inputs",
        "outputs",
        "resources",
        "kpis",
        "owner_id",
        "created_at",
        "updated_at",
    ];
    const UNIQUE: &'static [&'static [&'static str]] = &[&["code"]];

    fn id(&self) -> Uuid {
        self.id
    }

    fn materialize(new: NewProcess, id: Uuid, now: DateTime<Utc>) -> Self {
        Self {
            id,
            code: new.code,
            name: new.name,
            category: new.category,
            description: new.description,
            objectives: new.objectives,
            inputs: new.inputs,
            outputs: new.outputs,
            resources: new.resources,
            kpis: new.kpis,
            owner_id: new.owner_id,
            created_at: now,
            updated_at: now,
        }
    }
}

impl Creatable for Process {
    const FIELDS: &'static [FieldSpec] = &[
        FieldSpec::text("name", "Nom du processus").required(),
        FieldSpec::text("code", "Code").required().placeholder("PR-01"),
        FieldSpec::text("category", "Catégorie").placeholder("Ex: Management, Réalisation, Support"),
        FieldSpec::textarea("description", "Description"),
        FieldSpec::textarea("objectives", "Objectifs"),
    ];

    fn from_form(form: &FormData, audit: &AuditFields) -> Result<NewProcess, ValidationError> {
        Ok(NewProcess {
            code: form.required("code")?,
            name: form.required("name")?,
            category: form.text("category"),
            description: form.text("description"),
            objectives: form.text("objectives"),
            inputs: form.text("inputs"),
            outputs: form.text("outputs"),
            resources: form.text("resources"),
            kpis: form.text("kpis"),
            owner_id: audit.user_id,
        })
    }
}

impl PageEntity for Process {
    const PAGE: PageMeta = PageMeta {
        path: PageUrls::PROCESSES,
        title: "Gestion des processus",
        subtitle: "Cartographie et gestion de vos processus métier",
        new_label: "Nouveau processus",
        dialog_title: "Créer un nouveau processus",
        dialog_description: "Définissez les caractéristiques du processus",
        list_heading: None,
        empty_icon: "🔀",
        empty_message: "Aucun processus pour le moment",
        load_error: "Impossible de charger les processus",
        created_message: "Processus créé avec succès",
        order_by: "created_at",
    };

    fn render_list(rows: &[Self]) -> String {
        let cards: Vec<String> = rows
            .iter()
            .map(|p| {
                render_card(
                    &p.name,
                    p.category.as_deref().unwrap_or_default(),
                    &format!(
                        r#"<p>{}</p>"#,
                        optional_text(p.description.as_deref(), "Aucune description")
                    ),
                    &[format!(r#"<code class="process-code">{}</code>"#, html_escape(&p.code))],
                )
            })
            .collect();
        render_card_grid(&cards)
    }
}

pub fn configure_process_routes() -> Router<Arc<AppState>> {
    page_routes::<Process>().merge(record_routes::<Process>(ApiUrls::PROCESSES))
}
