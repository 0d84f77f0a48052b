use crate::strategy::{Strategy, StrategyParseError};
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Provider is not found which is pretty weird")]
    MissingProvider,

    #[error(transparent)]
    UnknownStrategy(#[from] StrategyParseError),

    #[error("strategy {0} is not configured")]
    StrategyNotConfigured(Strategy),

    #[error("login state is unknown or was already used")]
    UnknownState,

    #[error("provider callback is missing the ID token")]
    MissingIdToken,

    #[error("access token hash does not match the ID token")]
    AccessTokenHashMismatch,

    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl AuthError {
    pub fn status(&self) -> StatusCode {
        match self {
            AuthError::MissingProvider => StatusCode::INTERNAL_SERVER_ERROR,
            AuthError::UnknownStrategy(_) | AuthError::UnknownState => StatusCode::BAD_REQUEST,
            AuthError::StrategyNotConfigured(_) => StatusCode::NOT_FOUND,
            AuthError::MissingIdToken | AuthError::AccessTokenHashMismatch => {
                StatusCode::UNAUTHORIZED
            }
            AuthError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(error = ?self, "authentication failed");
        } else {
            tracing::warn!(error = %self, "authentication rejected");
        }

        // Internal details stay in the logs.
        let body = match self {
            AuthError::Internal(_) => "Something went wrong".to_string(),
            other => other.to_string(),
        };
        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_strategy_is_a_client_error() {
        let err = AuthError::from(StrategyParseError("github".into()));
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
        assert_eq!(err.to_string(), "unknown authentication strategy: \"github\"");
    }

    #[test]
    fn missing_provider_is_a_server_error() {
        let response = AuthError::MissingProvider.into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn internal_errors_are_server_errors() {
        let err = AuthError::Internal(anyhow::anyhow!("token endpoint unreachable"));
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
