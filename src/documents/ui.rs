use crate::core::ui::badges::badge_for;
use crate::core::ui::components::{format_datetime, html_escape, render_table};
use crate::core::shared::enums::{DocumentCategory, DocumentStatus};

use super::Document;

pub(super) fn category_label(raw: &str) -> String {
    raw.parse::<DocumentCategory>()
        .map(|c| c.label().to_string())
        .unwrap_or_else(|_| html_escape(raw))
}

pub(super) fn render_document_table(rows: &[Document]) -> String {
    let rows: Vec<Vec<String>> = rows
        .iter()
        .map(|doc| {
            vec![
                format!("<strong>{}</strong>", html_escape(&doc.document_number)),
                html_escape(&doc.title),
                category_label(&doc.category),
                html_escape(&doc.version),
                badge_for::<DocumentStatus>(&doc.status).render(),
                format_datetime(doc.created_at),
            ]
        })
        .collect();
    render_table(
        &["Numéro", "Titre", "Catégorie", "Version", "Statut", "Date de création"],
        &rows,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use uuid::Uuid;

    #[test]
    fn test_table_row() {
        let now = Utc::now();
        let doc = Document {
            id: Uuid::new_v4(),
            document_number: "PRO-001".to_string(),
            title: "Maîtrise des documents".to_string(),
            description: None,
            category: "formulaire".to_string(),
            version: "1.0".to_string(),
            status: "under_review".to_string(),
            content: None,
            file_url: None,
            created_by: Uuid::new_v4(),
            approved_by: None,
            approval_date: None,
            review_date: None,
            next_review_date: None,
            created_at: now,
            updated_at: now,
        };
        let html = render_document_table(&[doc]);
        assert!(html.contains("<strong>PRO-001</strong>"));
        assert!(html.contains("Formulaire"));
        assert!(html.contains("badge-outline"));
        assert!(html.contains("Date de création"));
    }
}
