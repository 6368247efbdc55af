use super::components::html_escape;
use crate::core::urls::PageUrls;

const NAV_ITEMS: &[(&str, &str, &str)] = &[
    ("📊", "Tableau de bord", PageUrls::DASHBOARD),
    ("📄", "Documents", PageUrls::DOCUMENTS),
    ("🔀", "Processus", PageUrls::PROCESSES),
    ("⚠️", "Non-conformités", PageUrls::NON_CONFORMITIES),
    ("📋", "Audits", PageUrls::AUDITS),
    ("📈", "Indicateurs", PageUrls::KPIS),
    ("🛡️", "Risques", PageUrls::RISKS),
    ("🎓", "Formation", PageUrls::TRAINING),
];

const STYLES: &str = r#"
        * { box-sizing: border-box; margin: 0; padding: 0; }
        body { font-family: -apple-system, BlinkMacSystemFont, 'Segoe UI', Roboto, sans-serif; background: #f5f5f5; color: #1a1a1a; }
        .topbar { display: flex; justify-content: space-between; align-items: center; padding: 12px 24px; background: white; border-bottom: 1px solid #e0e0e0; }
        .brand { font-size: 18px; font-weight: 600; color: #0066cc; }
        .account { display: flex; align-items: center; gap: 12px; font-size: 14px; }
        .account-label { color: #666; }
        .shell { display: flex; min-height: calc(100vh - 57px); }
        .sidebar { width: 240px; background: white; border-right: 1px solid #e0e0e0; padding: 16px 8px; }
        .nav-item { display: flex; gap: 10px; padding: 10px 12px; border-radius: 8px; color: #333; text-decoration: none; font-size: 14px; }
        .nav-item:hover { background: #f0f4f8; }
        .nav-item.active { background: #e3f2fd; color: #0066cc; font-weight: 500; }
        .main { flex: 1; padding: 24px; max-width: 1400px; }
        .page-header { display: flex; justify-content: space-between; align-items: center; margin-bottom: 24px; }
        .page-header h1 { font-size: 28px; }
        .page-header p { color: #666; margin-top: 8px; }
        .btn { display: inline-block; padding: 10px 20px; border: none; border-radius: 8px; cursor: pointer; font-size: 14px; font-weight: 500; text-decoration: none; }
        .btn-primary { background: #0066cc; color: white; }
        .btn-outline { background: white; color: #333; border: 1px solid #d0d0d0; }
        .btn-link { background: none; border: none; color: #0066cc; cursor: pointer; font-size: 14px; }
        .section { background: white; border-radius: 12px; padding: 24px; box-shadow: 0 2px 8px rgba(0,0,0,0.08); margin-bottom: 24px; }
        .section-title { font-size: 18px; font-weight: 600; }
        .section-description { font-size: 13px; color: #666; margin: 4px 0 16px; }
        .data-table { width: 100%; border-collapse: collapse; font-size: 14px; }
        .data-table th { text-align: left; color: #666; font-weight: 500; padding: 10px; border-bottom: 1px solid #e0e0e0; }
        .data-table td { padding: 10px; border-bottom: 1px solid #f0f0f0; }
        .card-grid { display: grid; grid-template-columns: repeat(auto-fill, minmax(320px, 1fr)); gap: 16px; }
        .card { background: white; border-radius: 12px; padding: 20px; box-shadow: 0 2px 8px rgba(0,0,0,0.08); }
        .card-header { display: flex; justify-content: space-between; gap: 12px; margin-bottom: 12px; }
        .card-title { font-size: 16px; font-weight: 600; }
        .card-description { font-size: 13px; color: #666; }
        .card-badges { display: flex; flex-direction: column; gap: 4px; align-items: flex-end; }
        .card-content { font-size: 14px; color: #444; }
        .stats-row { display: grid; grid-template-columns: repeat(4, 1fr); gap: 16px; margin-bottom: 24px; }
        .stat-card { background: white; border-radius: 12px; padding: 20px; box-shadow: 0 2px 8px rgba(0,0,0,0.08); }
        .stat-title { font-size: 14px; color: #666; }
        .stat-value { font-size: 32px; font-weight: 600; margin-top: 8px; }
        .stat-label { font-size: 13px; color: #666; margin-top: 4px; }
        .panels { display: grid; grid-template-columns: repeat(3, 1fr); gap: 16px; }
        .badge { display: inline-block; padding: 2px 10px; border-radius: 12px; font-size: 12px; font-weight: 500; }
        .badge-default { background: #0066cc; color: white; }
        .badge-secondary { background: #eceff1; color: #333; }
        .badge-destructive { background: #c62828; color: white; }
        .badge-outline { border: 1px solid #d0d0d0; color: #333; }
        .tone-yellow { color: #f9a825; }
        .tone-orange { color: #ef6c00; }
        .tone-red { color: #c62828; }
        .tone-green { color: #2e7d32; }
        .empty-state { text-align: center; padding: 40px; color: #666; }
        .empty-icon { font-size: 40px; opacity: 0.5; margin-bottom: 12px; }
        .spinner-wrap { display: flex; justify-content: center; padding: 32px; }
        .spinner { width: 32px; height: 32px; border-radius: 50%; border: 3px solid #e0e0e0; border-bottom-color: #0066cc; animation: spin 1s linear infinite; }
        @keyframes spin { to { transform: rotate(360deg); } }
        .toasts { position: fixed; right: 24px; bottom: 24px; display: flex; flex-direction: column; gap: 8px; z-index: 20; }
        .toast { background: white; border-radius: 8px; padding: 12px 16px; box-shadow: 0 4px 12px rgba(0,0,0,0.15); font-size: 14px; min-width: 280px; }
        .toast-success { border-left: 4px solid #2e7d32; }
        .toast-error { border-left: 4px solid #c62828; }
        .dialog-backdrop { position: fixed; inset: 0; background: rgba(0,0,0,0.4); display: flex; align-items: center; justify-content: center; z-index: 10; }
        .dialog { background: white; border-radius: 12px; padding: 24px; width: 640px; max-height: 90vh; overflow-y: auto; }
        .dialog-header p { color: #666; font-size: 14px; margin: 4px 0 16px; }
        .dialog-form { display: grid; gap: 14px; }
        .dialog-actions { display: flex; justify-content: flex-end; gap: 8px; }
        .form-field { display: grid; gap: 6px; font-size: 14px; }
        .form-field input, .form-field select, .form-field textarea { padding: 8px 10px; border: 1px solid #d0d0d0; border-radius: 6px; font: inherit; }
        .auth-wrap { max-width: 420px; margin: 60px auto; }
"#;

fn document(title: &str, body: &str) -> String {
    format!(
        r##"<!DOCTYPE html>
<html lang="fr">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>{} · QMS ISO 9001</title>
    <style>{STYLES}</style>
</head>
<body>
{body}
</body>
</html>"##,
        html_escape(title)
    )
}

/// Signed-in shell: header with account menu, navigation, page content.
pub fn render_layout(title: &str, active_path: &str, user_email: &str, content: &str) -> String {
    let nav: String = NAV_ITEMS
        .iter()
        .map(|(icon, label, path)| {
            let active = if *path == active_path { " active" } else { "" };
            format!(r#"<a class="nav-item{active}" href="{path}"><span>{icon}</span>{label}</a>"#)
        })
        .collect();

    let body = format!(
        r##"<header class="topbar">
        <a class="brand" href="{home}">QMS ISO 9001</a>
        <div class="account">
            <span class="account-label">Mon compte</span>
            <span class="account-email">{email}</span>
            <a class="btn-link" href="{profile}">Profil</a>
            <form method="post" action="{sign_out}">
                <button type="submit" class="btn-link">Déconnexion</button>
            </form>
        </div>
    </header>
    <div class="shell">
        <nav class="sidebar">{nav}</nav>
        <main class="main">{content}</main>
    </div>"##,
        home = PageUrls::DASHBOARD,
        email = html_escape(user_email),
        profile = PageUrls::PROFILE,
        sign_out = PageUrls::AUTH_SIGN_OUT,
    );
    document(title, &body)
}

/// Page without navigation, for sign-in and errors.
pub fn render_bare(title: &str, content: &str) -> String {
    document(title, &format!(r#"<main class="auth-wrap">{content}</main>"#))
}

pub fn render_page_header(title: &str, subtitle: &str, action: Option<(&str, &str)>) -> String {
    let action = action
        .map(|(href, label)| {
            format!(
                r#"<a class="btn btn-primary" href="{href}">+ {}</a>"#,
                html_escape(label)
            )
        })
        .unwrap_or_default();
    format!(
        r##"<div class="page-header">
            <div>
                <h1>{}</h1>
                <p>{}</p>
            </div>
            {action}
        </div>"##,
        html_escape(title),
        html_escape(subtitle)
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_layout_marks_active_item() {
        let html = render_layout("Audits", PageUrls::AUDITS, "a@example.com", "<p>x</p>");
        assert!(html.contains(r#"class="nav-item active" href="/audits""#));
        assert!(html.contains(r#"class="nav-item" href="/documents""#));
        assert!(html.contains("a@example.com"));
        assert!(html.contains("Déconnexion"));
    }
}
