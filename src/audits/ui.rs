use crate::core::shared::enums::{AuditStatus, AuditType};
use crate::core::ui::badges::badge_for;
use crate::core::ui::components::{format_date, render_card, render_card_grid};

use super::Audit;

pub(super) fn render_audit_cards(rows: &[Audit]) -> String {
    let cards: Vec<String> = rows
        .iter()
        .map(|audit| {
            let body = format!(
                r#"<div class="audit-period"><span>{} - {}</span>{}</div>"#,
                format_date(audit.planned_start_date),
                format_date(audit.planned_end_date),
                badge_for::<AuditStatus>(&audit.status).render()
            );
            render_card(
                &audit.title,
                &audit.audit_number,
                &body,
                &[badge_for::<AuditType>(&audit.audit_type).render()],
            )
        })
        .collect();
    render_card_grid(&cards)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, Utc};
    use uuid::Uuid;

    #[test]
    fn test_card_shows_period_and_badges() {
        let now = Utc::now();
        let audit = Audit {
            id: Uuid::new_v4(),
            audit_number: "AUD-2025-001".to_string(),
            title: "Audit fournisseurs".to_string(),
            audit_type: "certification".to_string(),
            status: "in_progress".to_string(),
            scope: "Achats".to_string(),
            objectives: None,
            lead_auditor_id: Uuid::new_v4(),
            audit_team: None,
            processes_audited: None,
            planned_start_date: NaiveDate::from_ymd_opt(2025, 4, 1).unwrap(),
            planned_end_date: NaiveDate::from_ymd_opt(2025, 4, 3).unwrap(),
            actual_start_date: None,
            actual_end_date: None,
            findings_summary: None,
            report_url: None,
            created_at: now,
            updated_at: now,
        };
        let html = render_audit_cards(&[audit]);
        assert!(html.contains("01/04/2025 - 03/04/2025"));
        assert!(html.contains("Certification"));
        assert!(html.contains("En cours"));
    }
}
