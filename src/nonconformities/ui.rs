use crate::core::shared::enums::{NcSeverity, NcStatus};
use crate::core::ui::badges::badge_for;
use crate::core::ui::components::{format_datetime, html_escape, render_table};

use super::NonConformity;

pub(super) fn render_nc_table(rows: &[NonConformity]) -> String {
    let rows: Vec<Vec<String>> = rows
        .iter()
        .map(|nc| {
            vec![
                format!("<strong>{}</strong>", html_escape(&nc.nc_number)),
                html_escape(&nc.title),
                badge_for::<NcSeverity>(&nc.severity).render(),
                badge_for::<NcStatus>(&nc.status).render(),
                format_datetime(nc.detected_date),
            ]
        })
        .collect();
    render_table(
        &["Numéro", "Titre", "Sévérité", "Statut", "Date de détection"],
        &rows,
    )
}
