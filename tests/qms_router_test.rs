use async_trait::async_trait;
use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::Router;
use chrono::Utc;
use http_body_util::BodyExt;
use serde_json::{json, Value};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tower::ServiceExt;
use uuid::Uuid;

use qmsserver::core::config::{AppConfig, SecurityConfig};
use qmsserver::core::records::{
    BackendError, Filter, ListQuery, MemoryRecordStore, Record, RecordStore, Repository,
};
use qmsserver::core::session::{MemorySessionProvider, SessionContext};
use qmsserver::core::shared::state::AppState;
use qmsserver::main_module::build_router;
use qmsserver::nonconformities::NonConformity;
use qmsserver::security::PasswordHasher;

const EMAIL: &str = "responsable.qualite@example.com";
const PASSWORD: &str = "iso9001-qualite";

/// Memory store that counts list calls.
#[derive(Debug, Default)]
struct CountingStore {
    inner: MemoryRecordStore,
    lists: AtomicUsize,
}

#[async_trait]
impl<E: Record> Repository<E> for CountingStore {
    async fn list(&self, query: &ListQuery) -> Result<Vec<E>, BackendError> {
        self.lists.fetch_add(1, Ordering::SeqCst);
        Repository::<E>::list(&self.inner, query).await
    }

    async fn create(&self, row: E::New) -> Result<E, BackendError> {
        Repository::<E>::create(&self.inner, row).await
    }

    async fn count(&self, filters: &[Filter]) -> Result<i64, BackendError> {
        Repository::<E>::count(&self.inner, filters).await
    }
}

#[async_trait]
impl RecordStore for CountingStore {
    fn backend_name(&self) -> &'static str {
        "counting"
    }

    async fn health(&self) -> Result<(), BackendError> {
        Ok(())
    }
}

fn app_with(store: Arc<dyn RecordStore>) -> Router {
    let config = AppConfig {
        security: SecurityConfig {
            argon2_memory_kib: 1024,
            argon2_iterations: 1,
            argon2_parallelism: 1,
            min_password_length: 8,
        },
        ..AppConfig::default()
    };
    let hasher = PasswordHasher::new(&config.security).unwrap();
    let provider = Arc::new(MemorySessionProvider::new(
        hasher,
        chrono::Duration::hours(config.session.ttl_hours),
    ));
    let sessions = SessionContext::start(provider);
    build_router(Arc::new(AppState::new(config, store, sessions)))
}

fn get(uri: &str, cookie: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().uri(uri);
    if let Some(cookie) = cookie {
        builder = builder.header(header::COOKIE, cookie);
    }
    builder.body(Body::empty()).unwrap()
}

fn post_form(uri: &str, cookie: Option<&str>, body: &str) -> Request<Body> {
    let mut builder = Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded");
    if let Some(cookie) = cookie {
        builder = builder.header(header::COOKIE, cookie);
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

fn post_json(uri: &str, cookie: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .header(header::COOKIE, cookie)
        .body(Body::from(body.to_string()))
        .unwrap()
}

async fn body_text(response: axum::response::Response) -> String {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    String::from_utf8(bytes.to_vec()).unwrap()
}

async fn body_json(response: axum::response::Response) -> Value {
    serde_json::from_str(&body_text(response).await).unwrap()
}

fn location(response: &axum::response::Response) -> &str {
    response
        .headers()
        .get(header::LOCATION)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
}

/// Signs up and returns the `name=value` session cookie.
async fn sign_up(app: &Router) -> String {
    let body = format!("email={EMAIL}&password={PASSWORD}&full_name=Claire+Martin");
    let response = app
        .clone()
        .oneshot(post_form("/auth/sign-up", None, &body))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/");
    let set_cookie = response
        .headers()
        .get(header::SET_COOKIE)
        .and_then(|v| v.to_str().ok())
        .unwrap();
    set_cookie.split(';').next().unwrap().to_string()
}

#[tokio::test]
async fn test_signed_out_page_redirects_without_loading() {
    let store = Arc::new(CountingStore::default());
    let app = app_with(store.clone());

    let response = app.clone().oneshot(get("/documents", None)).await.unwrap();
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/auth");
    assert_eq!(store.lists.load(Ordering::SeqCst), 0);

    let response = app
        .clone()
        .oneshot(get("/documents", Some("qms_session=forged")))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(store.lists.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_signed_out_api_is_unauthorized() {
    let app = app_with(Arc::new(MemoryRecordStore::new()));
    let response = app.oneshot(get("/api/documents", None)).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let body = body_json(response).await;
    assert_eq!(body["error"], "Authentification requise");
}

#[tokio::test]
async fn test_public_routes() {
    let app = app_with(Arc::new(MemoryRecordStore::new()));

    let response = app.clone().oneshot(get("/health", None)).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["status"], "ok");

    let response = app.clone().oneshot(get("/api/health", None)).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["backend"], "memory");

    let response = app.clone().oneshot(get("/auth", None)).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert!(body_text(response).await.contains("Se connecter"));

    let response = app.oneshot(get("/nulle-part", None)).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert!(body_text(response).await.contains("Oops! Page introuvable"));
}

#[tokio::test]
async fn test_sign_up_session_lifecycle() {
    let app = app_with(Arc::new(MemoryRecordStore::new()));
    let cookie = sign_up(&app).await;

    let response = app.clone().oneshot(get("/auth", Some(&cookie))).await.unwrap();
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/");

    let response = app.clone().oneshot(get("/api/me", Some(&cookie))).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let me = body_json(response).await;
    assert_eq!(me["profile"]["email"], EMAIL);
    assert_eq!(me["profile"]["full_name"], "Claire Martin");
    assert_eq!(me["role"], "user");

    let response = app
        .clone()
        .oneshot(post_form("/auth/sign-out", Some(&cookie), ""))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/auth");

    let response = app.oneshot(get("/documents", Some(&cookie))).await.unwrap();
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/auth");
}

#[tokio::test]
async fn test_wrong_password_stays_on_auth_page() {
    let app = app_with(Arc::new(MemoryRecordStore::new()));
    sign_up(&app).await;

    let body = format!("email={EMAIL}&password=mauvais-mot-de-passe");
    let response = app
        .oneshot(post_form("/auth/sign-in", None, &body))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert!(response.headers().get(header::SET_COOKIE).is_none());
    assert!(body_text(response).await.contains("Email ou mot de passe incorrect"));
}

#[tokio::test]
async fn test_create_non_conformity_from_page() {
    let app = app_with(Arc::new(MemoryRecordStore::new()));
    let cookie = sign_up(&app).await;

    let response = app
        .clone()
        .oneshot(get("/non-conformites?dialog=new", Some(&cookie)))
        .await
        .unwrap();
    let html = body_text(response).await;
    assert!(html.contains("Aucune non-conformité"));
    assert!(html.contains(r#"name="nc_number""#));

    let form = "nc_number=NC-2025-001&severity=major&title=Produit+non+conforme&description=Cote+hors+tol%C3%A9rance";
    let response = app
        .clone()
        .oneshot(post_form("/non-conformites", Some(&cookie), form))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let html = body_text(response).await;
    assert!(html.contains("NC-2025-001"));
    assert!(html.contains("Majeure"));
    assert!(!html.contains(r#"<div class="dialog-backdrop">"#));

    let me = body_json(app.clone().oneshot(get("/api/me", Some(&cookie))).await.unwrap()).await;
    let response = app
        .oneshot(get("/api/non-conformities", Some(&cookie)))
        .await
        .unwrap();
    let rows = body_json(response).await;
    assert_eq!(rows.as_array().map(Vec::len), Some(1));
    assert_eq!(rows[0]["status"], "open");
    assert_eq!(rows[0]["detected_by"], me["profile"]["id"]);
}

#[tokio::test]
async fn test_missing_field_keeps_dialog_open() {
    let app = app_with(Arc::new(MemoryRecordStore::new()));
    let cookie = sign_up(&app).await;

    let response = app
        .clone()
        .oneshot(post_form(
            "/non-conformites",
            Some(&cookie),
            "nc_number=NC-2025-002&severity=minor&title=Sans+description",
        ))
        .await
        .unwrap();
    let html = body_text(response).await;
    assert!(html.contains(r#"<div class="dialog-backdrop">"#));
    assert!(html.contains(r#"value="NC-2025-002""#));
    assert!(html.contains("Champs obligatoires manquants"));

    let rows = body_json(
        app.oneshot(get("/api/non-conformities", Some(&cookie)))
            .await
            .unwrap(),
    )
    .await;
    assert_eq!(rows, json!([]));
}

#[tokio::test]
async fn test_audits_listed_latest_start_first() {
    let app = app_with(Arc::new(MemoryRecordStore::new()));
    let cookie = sign_up(&app).await;

    for (number, start, end) in [
        ("AUD-2025-01", "2025-02-03", "2025-02-04"),
        ("AUD-2025-02", "2025-09-15", "2025-09-16"),
    ] {
        let response = app
            .clone()
            .oneshot(post_json(
                "/api/audits",
                &cookie,
                json!({
                    "audit_number": number,
                    "audit_type": "internal",
                    "title": format!("Audit {number}"),
                    "scope": "Production",
                    "planned_start_date": start,
                    "planned_end_date": end,
                }),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);
    }

    let html = body_text(app.oneshot(get("/audits", Some(&cookie))).await.unwrap()).await;
    let later = html.find("AUD-2025-02").unwrap();
    let earlier = html.find("AUD-2025-01").unwrap();
    assert!(later < earlier);
}

#[tokio::test]
async fn test_dashboard_counts_open_non_conformities() {
    let store = Arc::new(MemoryRecordStore::new());
    let app = app_with(store.clone());
    let cookie = sign_up(&app).await;

    let mut created = Vec::new();
    for number in ["NC-1", "NC-2", "NC-3"] {
        let response = app
            .clone()
            .oneshot(post_json(
                "/api/non-conformities",
                &cookie,
                json!({
                    "nc_number": number,
                    "severity": "minor",
                    "title": "Écart",
                    "description": "Écart constaté",
                }),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);
        created.push(body_json(response).await);
    }

    let mut closed: NonConformity = serde_json::from_value(created[2].clone()).unwrap();
    closed.id = Uuid::new_v4();
    closed.nc_number = "NC-4".to_string();
    closed.status = "closed".to_string();
    closed.updated_at = Utc::now();
    store.insert_raw(closed).await;

    let response = app
        .clone()
        .oneshot(get("/api/dashboard/stats", Some(&cookie)))
        .await
        .unwrap();
    let stats = body_json(response).await;
    assert_eq!(stats["open_non_conformities"], 3);
    assert_eq!(stats["documents"], 0);

    let html = body_text(app.oneshot(get("/", Some(&cookie))).await.unwrap()).await;
    assert!(html.contains("Tableau de bord"));
    assert!(html.contains(EMAIL));
}

#[tokio::test]
async fn test_role_assignment_forbidden_for_users() {
    let app = app_with(Arc::new(MemoryRecordStore::new()));
    let cookie = sign_up(&app).await;

    let response = app
        .oneshot(post_json(
            "/api/user-roles",
            &cookie,
            json!({ "user_id": Uuid::new_v4().to_string(), "role": "admin" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}
