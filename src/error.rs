use thiserror::Error;

/// Every failure a caller can observe. The HTTP rendering lives in
/// `api::error`.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Body is not JSON, or a field has the wrong type or is absent where
    /// the shape demands it.
    #[error("Malformed body: {0}")]
    MalformedBody(String),

    #[error("Missing parameter: {0:?}")]
    MissingParameters(Vec<String>),

    #[error("{0}")]
    BadRequest(String),

    #[error("Must be numeric: {0}")]
    MustBeNumeric(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Unauthorized(String),

    #[error("{0}")]
    NotAcceptable(String),

    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl ApiError {
    /// Short machine readable category rendered as `reason`.
    pub fn reason(&self) -> &'static str {
        match self {
            ApiError::MalformedBody(_) => "MalformedBody",
            ApiError::MissingParameters(_) | ApiError::BadRequest(_) => "BadRequest",
            ApiError::MustBeNumeric(_) => "MustBeNumeric",
            ApiError::NotFound(_) => "NotFound",
            ApiError::Unauthorized(_) => "Unauthorized",
            ApiError::NotAcceptable(_) => "NotAcceptable",
            ApiError::Internal(_) => "InternalError",
        }
    }

    pub fn malformed(err: serde_json::Error) -> Self {
        ApiError::MalformedBody(err.to_string())
    }
}

pub type ApiResult<T> = std::result::Result<T, ApiError>;
