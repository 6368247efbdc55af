use axum::{http::StatusCode, response::IntoResponse, Json};

use crate::core::records::{BackendError, BackendErrorKind, CreateError, ValidationError};
use crate::core::session::AuthError;

#[derive(Debug, thiserror::Error)]
pub enum QmsError {
    #[error("Authentification requise")]
    Unauthorized,
    #[error("Accès refusé : {0}")]
    Forbidden(String),
    #[error("Not found: {0}")]
    NotFound(String),
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    Backend(#[from] BackendError),
    #[error(transparent)]
    Auth(#[from] AuthError),
}

impl From<CreateError> for QmsError {
    fn from(err: CreateError) -> Self {
        match err {
            CreateError::Validation(e) => Self::Validation(e),
            CreateError::Backend(e) => Self::Backend(e),
        }
    }
}

impl QmsError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::Unauthorized => StatusCode::UNAUTHORIZED,
            Self::Forbidden(_) => StatusCode::FORBIDDEN,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Validation(_) => StatusCode::BAD_REQUEST,
            Self::Backend(e) => match e.kind {
                BackendErrorKind::Constraint => StatusCode::CONFLICT,
                BackendErrorKind::NotFound => StatusCode::NOT_FOUND,
                BackendErrorKind::Query => StatusCode::BAD_REQUEST,
                BackendErrorKind::Connection | BackendErrorKind::Unavailable => {
                    StatusCode::SERVICE_UNAVAILABLE
                }
            },
            Self::Auth(AuthError::InvalidCredentials) => StatusCode::UNAUTHORIZED,
            Self::Auth(AuthError::EmailTaken) => StatusCode::CONFLICT,
            Self::Auth(AuthError::InvalidEmail | AuthError::Password(_)) => StatusCode::BAD_REQUEST,
            Self::Auth(AuthError::Backend(_)) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for QmsError {
    fn into_response(self) -> axum::response::Response {
        let status = self.status();
        if status.is_server_error() {
            log::error!("Request failed: {self}");
        }
        (status, Json(serde_json::json!({ "error": self.to_string() }))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert_eq!(QmsError::Unauthorized.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(
            QmsError::from(BackendError::constraint("duplicate key")).status(),
            StatusCode::CONFLICT
        );
        assert_eq!(
            QmsError::from(CreateError::Validation(ValidationError::MissingFields(vec![
                "Titre".into()
            ])))
            .status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            QmsError::from(BackendError::connection("refused")).status(),
            StatusCode::SERVICE_UNAVAILABLE
        );
    }
}
