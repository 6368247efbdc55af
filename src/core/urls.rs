#[derive(Debug)]
pub struct PageUrls;

impl PageUrls {
    pub const DASHBOARD: &'static str = "/";
    pub const AUTH: &'static str = "/auth";
    pub const AUTH_SIGN_IN: &'static str = "/auth/sign-in";
    pub const AUTH_SIGN_UP: &'static str = "/auth/sign-up";
    pub const AUTH_SIGN_OUT: &'static str = "/auth/sign-out";
    pub const PROFILE: &'static str = "/profil";

    pub const DOCUMENTS: &'static str = "/documents";
    pub const PROCESSES: &'static str = "/processus";
    pub const NON_CONFORMITIES: &'static str = "/non-conformites";
    pub const AUDITS: &'static str = "/audits";
    pub const KPIS: &'static str = "/indicateurs";
    pub const RISKS: &'static str = "/risques";
    pub const TRAINING: &'static str = "/formation";
}

#[derive(Debug)]
pub struct ApiUrls;

impl ApiUrls {
    pub const PREFIX: &'static str = "/api/";

    // Health
    pub const HEALTH: &'static str = "/health";
    pub const API_HEALTH: &'static str = "/api/health";

    // Directory
    pub const ME: &'static str = "/api/me";
    pub const PROFILES: &'static str = "/api/profiles";
    pub const USER_ROLES: &'static str = "/api/user-roles";

    // Dashboard
    pub const DASHBOARD_STATS: &'static str = "/api/dashboard/stats";

    // Records
    pub const DOCUMENTS: &'static str = "/api/documents";
    pub const PROCESSES: &'static str = "/api/processes";
    pub const NON_CONFORMITIES: &'static str = "/api/non-conformities";
    pub const CORRECTIVE_ACTIONS: &'static str = "/api/corrective-actions";
    pub const AUDITS: &'static str = "/api/audits";
    pub const AUDIT_FINDINGS: &'static str = "/api/audit-findings";
    pub const KPIS: &'static str = "/api/kpis";
    pub const KPI_VALUES: &'static str = "/api/kpi-values";
    pub const RISKS: &'static str = "/api/risks";
    pub const TRAINING_PROGRAMS: &'static str = "/api/training-programs";
    pub const TRAINING_SESSIONS: &'static str = "/api/training-sessions";
    pub const TRAINING_ATTENDANCE: &'static str = "/api/training-attendance";
}
