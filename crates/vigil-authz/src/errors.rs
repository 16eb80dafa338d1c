use thiserror::Error;

#[derive(Debug, Error)]
pub enum AuthzError {
    #[error("invalid role: {0}")]
    InvalidRole(String),
    #[error("invalid permission: {0}")]
    InvalidPermission(String),
    #[error("batch of {len} exceeds the maximum of {max}")]
    BatchTooLarge { len: usize, max: usize },
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
    #[error("not found: {0}")]
    NotFound(String),
    #[error("authority unavailable: {0}")]
    AuthorityUnavailable(String),
    #[error("internal: {0}")]
    Internal(String),
}

pub type AuthzResult<T> = Result<T, AuthzError>;

/// Stable error category reported to embedding services.
///
/// The string codes and status mapping are part of the public contract so
/// operators can tell "you may not do this" (a plain `false` from a check)
/// apart from "we could not check" (`service_unavailable`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    InvalidInput,
    NotFound,
    ServiceUnavailable,
    Internal,
}

impl ErrorCode {
    pub fn as_str(self) -> &'static str {
        match self {
            ErrorCode::InvalidInput => "invalid_input",
            ErrorCode::NotFound => "not_found",
            ErrorCode::ServiceUnavailable => "service_unavailable",
            ErrorCode::Internal => "internal",
        }
    }

    /// HTTP status an embedding service should respond with for this category.
    pub fn http_status(self) -> u16 {
        match self {
            ErrorCode::InvalidInput => 400,
            ErrorCode::NotFound => 404,
            ErrorCode::ServiceUnavailable => 503,
            ErrorCode::Internal => 500,
        }
    }
}

impl AuthzError {
    pub fn code(&self) -> ErrorCode {
        match self {
            AuthzError::InvalidRole(_)
            | AuthzError::InvalidPermission(_)
            | AuthzError::BatchTooLarge { .. }
            | AuthzError::InvalidArgument(_) => ErrorCode::InvalidInput,
            AuthzError::NotFound(_) => ErrorCode::NotFound,
            AuthzError::AuthorityUnavailable(_) => ErrorCode::ServiceUnavailable,
            AuthzError::Internal(_) => ErrorCode::Internal,
        }
    }

    pub fn http_status(&self) -> u16 {
        self.code().http_status()
    }
}
