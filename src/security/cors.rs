use axum::http::{header, request::Parts, HeaderValue, Method};
use log::info;
use tower_http::cors::{AllowOrigin, CorsLayer};

#[derive(Debug, Clone)]
pub struct CorsConfig {
    pub allowed_origins: Vec<String>,
    pub allowed_methods: Vec<Method>,
    pub allowed_headers: Vec<header::HeaderName>,
    pub allow_credentials: bool,
    pub max_age_secs: u64,
}

impl Default for CorsConfig {
    fn default() -> Self {
        Self {
            allowed_origins: vec![],
            allowed_methods: vec![Method::GET, Method::POST, Method::OPTIONS],
            allowed_headers: vec![header::CONTENT_TYPE, header::ACCEPT, header::ACCEPT_LANGUAGE],
            allow_credentials: true,
            max_age_secs: 7200,
        }
    }
}

impl CorsConfig {
    /// Explicit origins from configuration. Without any, only local
    /// development origins are accepted.
    pub fn from_origins(origins: &[String]) -> Self {
        let allowed_origins: Vec<String> = origins
            .iter()
            .map(|o| o.trim().trim_end_matches('/').to_string())
            .filter(|o| !o.is_empty())
            .collect();
        if !allowed_origins.is_empty() {
            info!("CORS configured with {} allowed origins", allowed_origins.len());
        }
        Self {
            allowed_origins,
            ..Self::default()
        }
    }

    pub fn build(self) -> CorsLayer {
        let origins: Vec<HeaderValue> = self
            .allowed_origins
            .iter()
            .filter_map(|o| o.parse().ok())
            .collect();

        let mut cors = if origins.is_empty() {
            CorsLayer::new().allow_origin(AllowOrigin::predicate(is_local_origin))
        } else {
            CorsLayer::new().allow_origin(origins)
        };

        cors = cors
            .allow_methods(self.allowed_methods)
            .allow_headers(self.allowed_headers)
            .max_age(std::time::Duration::from_secs(self.max_age_secs));

        if self.allow_credentials {
            cors = cors.allow_credentials(true);
        }
        cors
    }
}

fn is_local_origin(origin: &HeaderValue, _request: &Parts) -> bool {
    let Ok(origin) = origin.to_str() else {
        return false;
    };
    let Some(rest) = origin
        .strip_prefix("http://")
        .or_else(|| origin.strip_prefix("https://"))
    else {
        return false;
    };
    let host = rest.split(':').next().unwrap_or_default();
    matches!(host, "localhost" | "127.0.0.1") && !rest.contains('/')
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parts() -> Parts {
        axum::http::Request::new(()).into_parts().0
    }

    #[test]
    fn test_local_origins() {
        let p = parts();
        assert!(is_local_origin(&HeaderValue::from_static("http://localhost:5173"), &p));
        assert!(is_local_origin(&HeaderValue::from_static("https://127.0.0.1"), &p));
        assert!(!is_local_origin(&HeaderValue::from_static("https://evil.example"), &p));
        assert!(!is_local_origin(&HeaderValue::from_static("http://localhost.evil.example"), &p));
        assert!(!is_local_origin(&HeaderValue::from_static("javascript:alert(1)"), &p));
    }

    #[test]
    fn test_from_origins_trims() {
        let config = CorsConfig::from_origins(&[
            " https://qualite.example.com/ ".to_string(),
            String::new(),
        ]);
        assert_eq!(config.allowed_origins, vec!["https://qualite.example.com"]);
    }
}
