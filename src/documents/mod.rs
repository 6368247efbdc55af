//! Controlled documents: procedures, instructions, forms, records, policies
//! and the quality manual.

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
use crate::core::shared::enums::{DocumentCategory, DocumentStatus};
use crate::core::shared::schema::documents;
use crate::core::shared::state::AppState;
use crate::core::urls::{ApiUrls, PageUrls};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Queryable)]
#[diesel(table_name = documents)]
pub struct Document {
    pub id: Uuid,
    pub document_number: String,
    pub title: String,
    pub description: Option<String>,
    pub category: String,
    pub version: String,
    pub status: String,
    pub content: Option<String>,
    pub file_url: Option<String>,
    pub created_by: Uuid,
    pub approved_by: Option<Uuid>,
    pub approval_date: Option<DateTime<Utc>>,
    pub review_date: Option<NaiveDate>,
    pub next_review_date: Option<NaiveDate>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Version and status come from column defaults.
#[derive(Debug, Clone, PartialEq, Insertable)]
#[diesel(table_name = documents)]
pub struct NewDocument {
    pub document_number: String,
    pub title: String,
    pub description: Option<String>,
    pub category: String,
    pub content: Option<String>,
    pub file_url: Option<String>,
    pub created_by: Uuid,
    pub review_date: Option<NaiveDate>,
    pub next_review_date: Option<NaiveDate>,
}

pub const INITIAL_VERSION: &str = "1.0";

const CATEGORY_OPTIONS: &[(&str, &str)] = &[
    ("procedure", "Procédure"),
    ("instruction", "Instruction de travail"),
    ("formulaire", "Formulaire"),
    ("enregistrement", "Enregistrement"),
    ("politique", "Politique"),
    ("manuel", "Manuel qualité"),
];

impl Record for Document {
    type New = NewDocument;

    const TABLE: &'static str = "documents";
    const COLUMNS: &'static [&'static str] = &[
        "id",
        "document_number",
        "title",
        "description",
        "category",
        "version",
        "status",
        "content",
        "file_url",
        "created_by",
        "approved_by",
        "approval_date",
        "review_date",
        "next_review_date",
        "created_at",
        "updated_at",
    ];
    const UNIQUE: &'static [&'static [&'static str]] = &[&["document_number"]];

    fn id(&self) -> Uuid {
        self.id
    }

    fn materialize(new: NewDocument, id: Uuid, now: DateTime<Utc>) -> Self {
        Self {
            id,
            document_number: new.document_number,
            title: new.title,
            description: new.description,
            category: new.category,
            version: INITIAL_VERSION.to_string(),
            status: DocumentStatus::Draft.to_string(),
            content: new.content,
            file_url: new.file_url,
            created_by: new.created_by,
            approved_by: None,
            approval_date: None,
            review_date: new.review_date,
            next_review_date: new.next_review_date,
            created_at: now,
            updated_at: now,
        }
    }
}

impl Creatable for Document {
    const FIELDS: &'static [FieldSpec] = &[
        FieldSpec::text("title", "Titre").required(),
        FieldSpec::text("document_number", "Numéro de document")
            .required()
            .placeholder("PRO-001"),
        FieldSpec::select("category", "Catégorie", CATEGORY_OPTIONS).required(),
        FieldSpec::textarea("description", "Description"),
    ];

    fn from_form(form: &FormData, audit: &AuditFields) -> Result<NewDocument, ValidationError> {
        let category: DocumentCategory = form.required_parsed("category")?;
        Ok(NewDocument {
            document_number: form.required("document_number")?,
            title: form.required("title")?,
            description: form.text("description"),
            category: category.to_string(),
            content: form.text("content"),
            file_url: form.text("file_url"),
            created_by: audit.user_id,
            review_date: form.date("review_date")?,
            next_review_date: form.date("next_review_date")?,
        })
    }
}

impl PageEntity for Document {
    const PAGE: PageMeta = PageMeta {
        path: PageUrls::DOCUMENTS,
        title: "Gestion documentaire",
        subtitle: "Gérez vos documents qualité selon ISO 9001",
        new_label: "Nouveau document",
        dialog_title: "Créer un nouveau document",
        dialog_description: "Ajoutez les informations du document qualité",
        list_heading: Some(ListHeading {
            title: "Liste des documents",
            summary: |n| format!("{n} document(s) au total"),
        }),
        empty_icon: "📄",
        empty_message: "Aucun document pour le moment",
        load_error: "Impossible de charger les documents",
        created_message: "Document créé avec succès",
        order_by: "created_at",
    };

    fn render_list(rows: &[Self]) -> String {
        ui::render_document_table(rows)
    }
}

pub fn configure_document_routes() -> Router<Arc<AppState>> {
    page_routes::<Document>().merge(record_routes::<Document>(ApiUrls::DOCUMENTS))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::records::{create_record, CreateError, MemoryRecordStore, Repository};
    use crate::core::shared::test_utils::test_user;

    #[test]
    fn test_form_attaches_creator() {
        let user = test_user();
        let form = FormData::new()
            .with("title", "Manuel qualité")
            .with("document_number", "MQ-001")
            .with("category", "manuel")
            .with("description", "  ");
        let row = Document::from_form(&form, &AuditFields::now(&user)).unwrap();
        assert_eq!(row.created_by, user.id);
        assert_eq!(row.category, "manuel");
        assert_eq!(row.description, None);
    }

    #[test]
    fn test_unknown_category_is_rejected() {
        let form = FormData::new()
            .with("title", "X")
            .with("document_number", "X-1")
            .with("category", "memo");
        let err = Document::from_form(&form, &AuditFields::now(&test_user())).unwrap_err();
        assert!(matches!(err, ValidationError::InvalidValue { .. }));
    }

    #[tokio::test]
    async fn test_new_document_defaults() {
        let store = MemoryRecordStore::new();
        let form = FormData::new()
            .with("title", "Procédure achats")
            .with("document_number", "PRO-010")
            .with("category", "procedure");
        let doc = create_record::<Document, _>(&store, &form, &AuditFields::now(&test_user()))
            .await
            .unwrap();
        assert_eq!(doc.version, "1.0");
        assert_eq!(doc.status, "draft");

        let missing =
            create_record::<Document, _>(&store, &FormData::new(), &AuditFields::now(&test_user()))
                .await;
        assert_eq!(
            missing.unwrap_err(),
            CreateError::Validation(ValidationError::MissingFields(vec![
                "Titre".to_string(),
                "Numéro de document".to_string(),
                "Catégorie".to_string(),
            ]))
        );
        let all = Repository::<Document>::list(&store, &Document::list_query())
            .await
            .unwrap();
        assert_eq!(all.len(), 1);
    }

    #[tokio::test]
    async fn test_listed_most_recent_first() {
        let store = MemoryRecordStore::new();
        let user = test_user();
        for (n, days) in [("D-1", 3), ("D-2", 1), ("D-3", 2)] {
            let mut doc = Document::materialize(
                NewDocument {
                    document_number: n.to_string(),
                    title: n.to_string(),
                    description: None,
                    category: "procedure".to_string(),
                    content: None,
                    file_url: None,
                    created_by: user.id,
                    review_date: None,
                    next_review_date: None,
                },
                Uuid::new_v4(),
                Utc::now(),
            );
            doc.created_at = Utc::now() - chrono::Duration::days(days);
            store.insert_raw(doc).await;
        }
        let rows = Repository::<Document>::list(&store, &Document::list_query())
            .await
            .unwrap();
        let numbers: Vec<&str> = rows.iter().map(|d| d.document_number.as_str()).collect();
        assert_eq!(numbers, ["D-2", "D-3", "D-1"]);
    }
}
