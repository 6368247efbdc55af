use chrono::{DateTime, NaiveDate, Utc};

use crate::core::records::{FieldKind, FieldSpec, FormData};

pub fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#x27;")
}

pub fn format_date(date: NaiveDate) -> String {
    date.format("%d/%m/%Y").to_string()
}

pub fn format_datetime(at: DateTime<Utc>) -> String {
    at.format("%d/%m/%Y").to_string()
}

pub fn optional_text(value: Option<&str>, fallback: &str) -> String {
    value
        .filter(|v| !v.trim().is_empty())
        .map(html_escape)
        .unwrap_or_else(|| fallback.to_string())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeVariant {
    Success,
    Error,
}

/// Transient message shown once after an action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub variant: NoticeVariant,
    pub title: String,
    pub description: String,
}

impl Notice {
    pub fn success(description: impl Into<String>) -> Self {
        Self {
            variant: NoticeVariant::Success,
            title: "Succès".to_string(),
            description: description.into(),
        }
    }

    pub fn error(description: impl Into<String>) -> Self {
        Self {
            variant: NoticeVariant::Error,
            title: "Erreur".to_string(),
            description: description.into(),
        }
    }
}

pub fn render_notices(notices: &[Notice]) -> String {
    notices
        .iter()
        .map(|n| {
            let class = match n.variant {
                NoticeVariant::Success => "toast toast-success",
                NoticeVariant::Error => "toast toast-error",
            };
            format!(
                r#"<div class="{class}" role="status"><strong>{}</strong><p>{}</p></div>"#,
                html_escape(&n.title),
                html_escape(&n.description)
            )
        })
        .collect()
}

pub fn render_empty_state(icon: &str, message: &str) -> String {
    format!(
        r##"<div class="empty-state">
            <div class="empty-icon">{icon}</div>
            <p>{}</p>
        </div>"##,
        html_escape(message)
    )
}

pub fn render_spinner() -> String {
    r#"<div class="spinner-wrap"><div class="spinner"></div></div>"#.to_string()
}

/// Cells are already rendered HTML.
pub fn render_table(headers: &[&str], rows: &[Vec<String>]) -> String {
    let head: String = headers
        .iter()
        .map(|h| format!("<th>{}</th>", html_escape(h)))
        .collect();
    let body: String = rows
        .iter()
        .map(|cells| {
            let cells: String = cells.iter().map(|c| format!("<td>{c}</td>")).collect();
            format!("<tr>{cells}</tr>")
        })
        .collect();
    format!(
        r#"<table class="data-table"><thead><tr>{head}</tr></thead><tbody>{body}</tbody></table>"#
    )
}

pub fn render_card_grid(cards: &[String]) -> String {
    format!(r#"<div class="card-grid">{}</div>"#, cards.concat())
}

pub fn render_card(title: &str, subtitle: &str, body: &str, badges: &[String]) -> String {
    format!(
        r##"<div class="card">
            <div class="card-header">
                <div>
                    <h3 class="card-title">{}</h3>
                    <p class="card-description">{}</p>
                </div>
                <div class="card-badges">{}</div>
            </div>
            <div class="card-content">{body}</div>
        </div>"##,
        html_escape(title),
        html_escape(subtitle),
        badges.concat()
    )
}

pub fn render_field(field: &FieldSpec, form: &FormData) -> String {
    let name = field.name;
    let value = html_escape(form.raw(name));
    let required = if field.required { " required" } else { "" };
    let label = if field.required {
        format!("{} *", html_escape(field.label))
    } else {
        html_escape(field.label)
    };
    let placeholder = field
        .placeholder
        .map(|p| format!(r#" placeholder="{}""#, html_escape(p)))
        .unwrap_or_default();

    let input = match field.kind {
        FieldKind::Text => format!(
            r#"<input type="text" id="{name}" name="{name}" value="{value}"{placeholder}{required}>"#
        ),
        FieldKind::TextArea => format!(
            r#"<textarea id="{name}" name="{name}" rows="3"{placeholder}{required}>{value}</textarea>"#
        ),
        FieldKind::Date => format!(
            r#"<input type="date" id="{name}" name="{name}" value="{value}"{required}>"#
        ),
        FieldKind::Number { min, max } => {
            let min = min.map(|m| format!(r#" min="{m}""#)).unwrap_or_default();
            let max = max.map(|m| format!(r#" max="{m}""#)).unwrap_or_default();
            format!(
                r#"<input type="number" step="any" id="{name}" name="{name}" value="{value}"{min}{max}{placeholder}{required}>"#
            )
        }
        FieldKind::Select(options) => {
            let current = form.raw(name);
            let choices: String = options
                .iter()
                .map(|(option, text)| {
                    let selected = if *option == current { " selected" } else { "" };
                    format!(
                        r#"<option value="{}"{selected}>{}</option>"#,
                        html_escape(option),
                        html_escape(text)
                    )
                })
                .collect();
            format!(
                r#"<select id="{name}" name="{name}"{required}><option value="">Sélectionner</option>{choices}</select>"#
            )
        }
    };

    format!(r#"<div class="form-field"><label for="{name}">{label}</label>{input}</div>"#)
}

/// Modal creation form posting back to `action`; cancelling returns to `action`.
pub fn render_dialog(
    title: &str,
    description: &str,
    action: &str,
    fields: &[FieldSpec],
    draft: &FormData,
) -> String {
    let inputs: String = fields.iter().map(|f| render_field(f, draft)).collect();
    format!(
        r##"<div class="dialog-backdrop">
            <div class="dialog" role="dialog" aria-modal="true">
                <div class="dialog-header">
                    <h2>{}</h2>
                    <p>{}</p>
                </div>
                <form method="post" action="{action}" class="dialog-form">
                    {inputs}
                    <div class="dialog-actions">
                        <a class="btn btn-outline" href="{action}">Annuler</a>
                        <button type="submit" class="btn btn-primary">Créer</button>
                    </div>
                </form>
            </div>
        </div>"##,
        html_escape(title),
        html_escape(description)
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_html_escape() {
        assert_eq!(
            html_escape(r#"<a href="x">'R&D'</a>"#),
            "&lt;a href=&quot;x&quot;&gt;&#x27;R&amp;D&#x27;&lt;/a&gt;"
        );
    }

    #[test]
    fn test_render_field_keeps_draft_value() {
        const OPTIONS: &[(&str, &str)] = &[("minor", "Mineure"), ("major", "Majeure")];
        let field = FieldSpec::select("severity", "Sévérité", OPTIONS).required();
        let draft = FormData::new().with("severity", "major");
        let html = render_field(&field, &draft);
        assert!(html.contains(r#"<option value="major" selected>"#));
        assert!(html.contains("Sévérité *"));
        assert!(html.contains(" required"));
    }

    #[test]
    fn test_table_and_dates() {
        let html = render_table(&["Numéro"], &[vec!["NC-1".to_string()]]);
        assert!(html.contains("<th>Numéro</th>"));
        assert!(html.contains("<td>NC-1</td>"));
        let date = NaiveDate::from_ymd_opt(2025, 3, 9).unwrap();
        assert_eq!(format_date(date), "09/03/2025");
    }
}
