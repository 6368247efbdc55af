//! User profiles and role assignments.

use axum::{
    extract::State,
    http::StatusCode,
    response::Html,
    routing::get,
    Extension, Json, Router,
};
use chrono::{DateTime, Utc};
use diesel::prelude::*;
use log::info;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

use crate::core::error::QmsError;
use crate::core::records::api::list_records;
use crate::core::records::{
    create_record, AuditFields, BackendError, Creatable, FieldSpec, Filter, FormData, ListQuery,
    Record, RecordStore, Repository, ValidationError,
};
use crate::core::session::CurrentUser;
use crate::core::shared::enums::AppRole;
use crate::core::shared::schema::{profiles, user_roles};
use crate::core::shared::state::AppState;
use crate::core::ui::badges::BadgeSpec;
use crate::core::ui::components::{format_datetime, html_escape, optional_text, render_notices, Notice};
use crate::core::ui::layout::{render_layout, render_page_header};
use crate::core::urls::{ApiUrls, PageUrls};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Queryable)]
#[diesel(table_name = profiles)]
pub struct Profile {
    /// Same id as the authenticated user.
    pub id: Uuid,
    pub full_name: String,
    pub email: String,
    pub department: Option<String>,
    pub position: Option<String>,
    pub phone: Option<String>,
    pub avatar_url: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Insertable)]
#[diesel(table_name = profiles)]
pub struct NewProfile {
    pub id: Uuid,
    pub full_name: String,
    pub email: String,
}

impl NewProfile {
    /// Falls back to the local part of the email when no name is given.
    pub fn for_user(user: &CurrentUser, full_name: Option<&str>) -> Self {
        let full_name = full_name
            .map(str::trim)
            .filter(|n| !n.is_empty())
            .map(str::to_string)
            .unwrap_or_else(|| user.email.split('@').next().unwrap_or_default().to_string());
        Self {
            id: user.id,
            full_name,
            email: user.email.clone(),
        }
    }
}

impl Record for Profile {
    type New = NewProfile;

    const TABLE: &'static str = "profiles";
    const COLUMNS: &'static [&'static str] = &[
        "id",
        "full_name",
        "email",
        "department",
        "position",
        "phone",
        "avatar_url",
        "created_at",
        "updated_at",
    ];

    fn id(&self) -> Uuid {
        self.id
    }

    fn materialize(new: NewProfile, _id: Uuid, now: DateTime<Utc>) -> Self {
        Self {
            id: new.id,
            full_name: new.full_name,
            email: new.email,
            department: None,
            position: None,
            phone: None,
            avatar_url: None,
            created_at: now,
            updated_at: now,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Queryable)]
#[diesel(table_name = user_roles)]
pub struct UserRole {
    pub id: Uuid,
    pub user_id: Uuid,
    pub role: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Insertable)]
#[diesel(table_name = user_roles)]
pub struct NewUserRole {
    pub user_id: Uuid,
    pub role: String,
}

impl Record for UserRole {
    type New = NewUserRole;

    const TABLE: &'static str = "user_roles";
    const COLUMNS: &'static [&'static str] = &["id", "user_id", "role", "created_at"];
    const UNIQUE: &'static [&'static [&'static str]] = &[&["user_id", "role"]];

    fn id(&self) -> Uuid {
        self.id
    }

    fn materialize(new: NewUserRole, id: Uuid, now: DateTime<Utc>) -> Self {
        Self {
            id,
            user_id: new.user_id,
            role: new.role,
            created_at: now,
        }
    }
}

const ROLE_OPTIONS: &[(&str, &str)] = &[
    ("admin", "Administrateur"),
    ("quality_manager", "Responsable qualité"),
    ("auditor", "Auditeur"),
    ("user", "Utilisateur"),
];

impl Creatable for UserRole {
    const FIELDS: &'static [FieldSpec] = &[
        FieldSpec::text("user_id", "Utilisateur").required(),
        FieldSpec::select("role", "Rôle", ROLE_OPTIONS).required(),
    ];

    fn from_form(form: &FormData, _audit: &AuditFields) -> Result<NewUserRole, ValidationError> {
        let role: AppRole = form.required_parsed("role")?;
        Ok(NewUserRole {
            user_id: form.required_parsed("user_id")?,
            role: role.to_string(),
        })
    }
}

/// Returns the user's profile, creating it on first sign-in.
pub async fn ensure_profile<R>(
    store: &R,
    user: &CurrentUser,
    full_name: Option<&str>,
) -> Result<Profile, BackendError>
where
    R: Repository<Profile> + ?Sized,
{
    let query = ListQuery::new().filter("id", user.id.to_string()).limit(1);
    if let Some(profile) = store.list(&query).await?.into_iter().next() {
        return Ok(profile);
    }
    let profile = store.create(NewProfile::for_user(user, full_name)).await?;
    info!("Created profile for user {}", user.id);
    Ok(profile)
}

/// Grants the default `user` role unless the user already holds one.
pub async fn ensure_default_role<R>(store: &R, user_id: Uuid) -> Result<(), BackendError>
where
    R: Repository<UserRole> + ?Sized,
{
    let existing = store
        .count(&[Filter::eq("user_id", user_id.to_string())])
        .await?;
    if existing == 0 {
        store
            .create(NewUserRole {
                user_id,
                role: AppRole::User.to_string(),
            })
            .await?;
    }
    Ok(())
}

/// Most privileged role held; `user` when none is assigned.
pub async fn role_for<R>(store: &R, user_id: Uuid) -> Result<AppRole, BackendError>
where
    R: Repository<UserRole> + ?Sized,
{
    let query = ListQuery::new().filter("user_id", user_id.to_string());
    let role = store
        .list(&query)
        .await?
        .iter()
        .filter_map(|r| r.role.parse::<AppRole>().ok())
        .min_by_key(AppRole::rank)
        .unwrap_or_default();
    Ok(role)
}

#[derive(Debug, Clone, Serialize)]
pub struct MeResponse {
    pub profile: Profile,
    pub role: AppRole,
}

pub async fn handle_me(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<CurrentUser>,
) -> Result<Json<MeResponse>, QmsError> {
    let store: &dyn RecordStore = &*state.store;
    let profile = ensure_profile(store, &user, None).await?;
    let role = role_for(store, user.id).await?;
    Ok(Json(MeResponse { profile, role }))
}

/// Role assignment is reserved to administrators.
pub async fn handle_assign_role(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<CurrentUser>,
    Json(body): Json<serde_json::Value>,
) -> Result<(StatusCode, Json<UserRole>), QmsError> {
    let store: &dyn RecordStore = &*state.store;
    if role_for(store, user.id).await? != AppRole::Admin {
        return Err(QmsError::Forbidden(
            "seul un administrateur peut attribuer des rôles".to_string(),
        ));
    }
    let form = FormData::from_json(&body)?;
    let created = create_record::<UserRole, dyn RecordStore>(store, &form, &AuditFields::now(&user)).await?;
    info!("User {} granted role {} to {}", user.id, created.role, created.user_id);
    Ok((StatusCode::CREATED, Json(created)))
}

pub async fn handle_profile_page(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<CurrentUser>,
) -> Html<String> {
    let store: &dyn RecordStore = &*state.store;
    let (profile, role) = tokio::join!(ensure_profile(store, &user, None), role_for(store, user.id));
    let header = render_page_header("Mon profil", "Informations de votre compte", None);

    let content = match profile {
        Ok(profile) => {
            let role = role.unwrap_or_default();
            format!(
                r##"{header}
                <section class="section">
                    <h2 class="section-title">{}</h2>
                    <p class="section-description">{}</p>
                    <table class="data-table">
                        <tr><th>Rôle</th><td>{}</td></tr>
                        <tr><th>Service</th><td>{}</td></tr>
                        <tr><th>Poste</th><td>{}</td></tr>
                        <tr><th>Téléphone</th><td>{}</td></tr>
                        <tr><th>Membre depuis</th><td>{}</td></tr>
                    </table>
                </section>"##,
                html_escape(&profile.full_name),
                html_escape(&profile.email),
                role.badge().render(),
                optional_text(profile.department.as_deref(), "-"),
                optional_text(profile.position.as_deref(), "-"),
                optional_text(profile.phone.as_deref(), "-"),
                format_datetime(profile.created_at),
            )
        }
        Err(e) => {
            log::warn!("Failed to load profile for {}: {e}", user.id);
            format!(
                r#"{header}<div class="toasts">{}</div>"#,
                render_notices(&[Notice::error("Impossible de charger le profil")])
            )
        }
    };

    Html(render_layout("Mon profil", PageUrls::PROFILE, &user.email, &content))
}

pub fn configure_directory_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route(PageUrls::PROFILE, get(handle_profile_page))
        .route(ApiUrls::ME, get(handle_me))
        .route(ApiUrls::PROFILES, get(list_records::<Profile>))
        .route(
            ApiUrls::USER_ROLES,
            get(list_records::<UserRole>).post(handle_assign_role),
        )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::records::MemoryRecordStore;
    use crate::core::shared::test_utils::{test_state, test_user};

    #[tokio::test]
    async fn test_ensure_profile_is_idempotent() {
        let store = MemoryRecordStore::new();
        let user = test_user();

        let first = ensure_profile(&store, &user, Some("Claire Martin")).await.unwrap();
        let second = ensure_profile(&store, &user, None).await.unwrap();
        assert_eq!(first.id, user.id);
        assert_eq!(second, first);
        assert_eq!(second.full_name, "Claire Martin");

        let count = Repository::<Profile>::count(&store, &[]).await.unwrap();
        assert_eq!(count, 1);
    }

    #[tokio::test]
    async fn test_profile_name_defaults_to_email() {
        let store = MemoryRecordStore::new();
        let profile = ensure_profile(&store, &test_user(), Some("  ")).await.unwrap();
        assert_eq!(profile.full_name, "qualite");
    }

    #[tokio::test]
    async fn test_role_defaults_and_precedence() {
        let store = MemoryRecordStore::new();
        let user = test_user();
        assert_eq!(role_for(&store, user.id).await.unwrap(), AppRole::User);

        ensure_default_role(&store, user.id).await.unwrap();
        ensure_default_role(&store, user.id).await.unwrap();
        let held = Repository::<UserRole>::count(&store, &[]).await.unwrap();
        assert_eq!(held, 1);

        Repository::<UserRole>::create(
            &store,
            NewUserRole {
                user_id: user.id,
                role: "auditor".to_string(),
            },
        )
        .await
        .unwrap();
        assert_eq!(role_for(&store, user.id).await.unwrap(), AppRole::Auditor);
    }

    #[tokio::test]
    async fn test_assign_role_requires_admin() {
        let store = Arc::new(MemoryRecordStore::new());
        let state = test_state(store.clone());
        let caller = test_user();
        let target = Uuid::new_v4();
        let body = serde_json::json!({ "user_id": target.to_string(), "role": "auditor" });

        let err = handle_assign_role(
            State(Arc::clone(&state)),
            Extension(caller.clone()),
            Json(body.clone()),
        )
        .await
        .unwrap_err();
        assert_eq!(err.status(), StatusCode::FORBIDDEN);

        Repository::<UserRole>::create(
            &*store,
            NewUserRole {
                user_id: caller.id,
                role: "admin".to_string(),
            },
        )
        .await
        .unwrap();
        let (status, Json(granted)) = handle_assign_role(
            State(Arc::clone(&state)),
            Extension(caller.clone()),
            Json(body.clone()),
        )
        .await
        .unwrap();
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(granted.user_id, target);
        assert_eq!(role_for(&*store, target).await.unwrap(), AppRole::Auditor);

        let err = handle_assign_role(State(state), Extension(caller), Json(body))
            .await
            .unwrap_err();
        assert_eq!(err.status(), StatusCode::CONFLICT);
    }

    #[test]
    fn test_unknown_role_rejected() {
        let form = FormData::new()
            .with("user_id", &Uuid::new_v4().to_string())
            .with("role", "superuser");
        assert!(UserRole::from_form(&form, &AuditFields::now(&test_user())).is_err());
    }
}
