//! Landing page: headline counts of the quality system.

use axum::{extract::State, response::Html, routing::get, Extension, Json, Router};
use log::warn;
use serde::Serialize;
use std::sync::Arc;

use crate::audits::Audit;
use crate::core::records::{BackendError, Filter, Record, RecordStore, Repository};
use crate::core::session::CurrentUser;
use crate::core::shared::enums::{AuditStatus, NcStatus};
use crate::core::shared::state::AppState;
use crate::core::ui::layout::{render_layout, render_page_header};
use crate::core::urls::{ApiUrls, PageUrls};
use crate::documents::Document;
use crate::nonconformities::NonConformity;
use crate::processes::Process;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DashboardStats {
    pub documents: i64,
    pub open_non_conformities: i64,
    pub planned_audits: i64,
    pub processes: i64,
}

/// A count that fails reads as zero.
fn or_zero<E: Record>(result: Result<i64, BackendError>) -> i64 {
    result.unwrap_or_else(|e| {
        warn!("Failed to count {}: {e}", E::TABLE);
        0
    })
}

/// Issues the four counts concurrently.
pub async fn load_stats(store: &dyn RecordStore) -> DashboardStats {
    let open = [Filter::eq("status", NcStatus::Open.as_str())];
    let planned = [Filter::eq("status", AuditStatus::Planned.as_str())];

    let (documents, open_ncs, planned_audits, processes) = tokio::join!(
        Repository::<Document>::count(store, &[]),
        Repository::<NonConformity>::count(store, &open),
        Repository::<Audit>::count(store, &planned),
        Repository::<Process>::count(store, &[]),
    );

    DashboardStats {
        documents: or_zero::<Document>(documents),
        open_non_conformities: or_zero::<NonConformity>(open_ncs),
        planned_audits: or_zero::<Audit>(planned_audits),
        processes: or_zero::<Process>(processes),
    }
}

struct StatCard {
    icon: &'static str,
    title: &'static str,
    label: &'static str,
    value: i64,
}

fn render_stat(card: &StatCard) -> String {
    format!(
        r##"<div class="stat-card">
            <div class="card-header">
                <span class="stat-title">{}</span>
                <span>{}</span>
            </div>
            <div class="stat-value">{}</div>
            <p class="stat-label">{}</p>
        </div>"##,
        card.title, card.icon, card.value, card.label
    )
}

fn render_panel(title: &str, message: &str) -> String {
    format!(
        r##"<div class="section">
            <h2 class="section-title">{title}</h2>
            <p class="section-description">{message}</p>
        </div>"##
    )
}

pub fn render_dashboard(stats: &DashboardStats) -> String {
    let cards = [
        StatCard {
            icon: "📄",
            title: "Documents",
            label: "Documents actifs",
            value: stats.documents,
        },
        StatCard {
            icon: "⚠️",
            title: "Non-conformités ouvertes",
            label: "À traiter",
            value: stats.open_non_conformities,
        },
        StatCard {
            icon: "📋",
            title: "Audits planifiés",
            label: "À venir",
            value: stats.planned_audits,
        },
        StatCard {
            icon: "📈",
            title: "Processus",
            label: "Processus métier",
            value: stats.processes,
        },
    ];
    let stats_row: String = cards.iter().map(render_stat).collect();
    let panels = [
        render_panel("Actions récentes", "Aucune action récente à afficher"),
        render_panel("Alertes", "Aucune alerte en cours"),
        render_panel("Prochaines échéances", "Aucune échéance à venir"),
    ]
    .concat();

    format!(
        r##"{}
        <div class="stats-row">{stats_row}</div>
        <div class="panels">{panels}</div>"##,
        render_page_header(
            "Tableau de bord",
            "Vue d'ensemble de votre système de gestion de la qualité",
            None
        )
    )
}

pub async fn handle_dashboard(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<CurrentUser>,
) -> Html<String> {
    let stats = load_stats(&*state.store).await;
    Html(render_layout(
        "Tableau de bord",
        PageUrls::DASHBOARD,
        &user.email,
        &render_dashboard(&stats),
    ))
}

pub async fn handle_dashboard_stats(State(state): State<Arc<AppState>>) -> Json<DashboardStats> {
    Json(load_stats(&*state.store).await)
}

pub fn configure_dashboard_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route(PageUrls::DASHBOARD, get(handle_dashboard))
        .route(ApiUrls::DASHBOARD_STATS, get(handle_dashboard_stats))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::records::{create_record, AuditFields, BackendErrorKind, FormData, MemoryRecordStore};
    use crate::core::shared::test_utils::{test_user, FailingStore};

    fn nc_form(number: &str) -> FormData {
        FormData::new()
            .with("nc_number", number)
            .with("severity", "minor")
            .with("title", "Étiquetage")
            .with("description", "Étiquette illisible")
    }

    #[tokio::test]
    async fn test_counts_only_open_non_conformities() {
        let store = MemoryRecordStore::new();
        let audit = AuditFields::now(&test_user());
        for number in ["NC-1", "NC-2", "NC-3"] {
            create_record::<NonConformity, _>(&store, &nc_form(number), &audit)
                .await
                .unwrap();
        }
        let mut closed = Repository::<NonConformity>::list(&store, &Default::default())
            .await
            .unwrap()
            .remove(0);
        closed.id = uuid::Uuid::new_v4();
        closed.status = NcStatus::Closed.to_string();
        store.insert_raw(closed).await;

        let stats = load_stats(&store).await;
        assert_eq!(stats.open_non_conformities, 3);
        assert_eq!(stats.documents, 0);
    }

    #[tokio::test]
    async fn test_failed_counts_read_as_zero() {
        let store = FailingStore::new(BackendError::new(BackendErrorKind::Connection, "refused"));
        assert_eq!(load_stats(&store).await, DashboardStats::default());
    }

    #[test]
    fn test_render_dashboard() {
        let html = render_dashboard(&DashboardStats {
            documents: 4,
            open_non_conformities: 2,
            planned_audits: 1,
            processes: 7,
        });
        assert!(html.contains("Non-conformités ouvertes"));
        assert!(html.contains(r#"<div class="stat-value">7</div>"#));
        assert!(html.contains("Aucune alerte en cours"));
    }
}
