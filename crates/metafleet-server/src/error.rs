use metafleet_auth::AuthFailure;
use metafleet_cache::SourceError;

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("authentication failed: {0}")]
    Auth(#[from] AuthFailure),

    #[error("metadata source error: {0}")]
    Source(#[from] SourceError),

    #[error("invalid request: {0}")]
    BadRequest(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn auth_failures_convert() {
        let err: ApiError = AuthFailure::InvalidCredentials.into();
        assert!(err.to_string().contains("invalid username or password"));
    }

    #[test]
    fn source_errors_convert() {
        let err: ApiError = SourceError::Unavailable("db down".to_string()).into();
        assert!(err.to_string().contains("db down"));
    }
}
