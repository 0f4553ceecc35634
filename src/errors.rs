use axum::http::StatusCode;
use thiserror::Error;

/// Failures of dataset validation, stats derivation and sorting.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum StatsError {
    #[error("invalid target {0}: must be a finite number greater than zero")]
    InvalidTarget(f64),

    #[error("entity '{entity}' has no daily spend entries")]
    EmptySeries { entity: String },

    #[error("unknown sort key '{0}'")]
    UnknownSortKey(String),

    #[error("malformed entity '{entity}': {reason}")]
    MalformedEntity { entity: String, reason: String },

    #[error("malformed dataset: {0}")]
    MalformedDataset(String),

    #[error("branch '{0}' not found")]
    UnknownBranch(String),
}

#[derive(Debug)]
pub struct AppError {
    pub status: StatusCode,
    pub message: String,
}

impl AppError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: message.into(),
        }
    }

    pub fn unavailable(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::SERVICE_UNAVAILABLE,
            message: message.into(),
        }
    }

    pub fn internal(err: impl std::error::Error) -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            message: err.to_string(),
        }
    }
}

impl From<StatsError> for AppError {
    fn from(err: StatsError) -> Self {
        let status = match &err {
            StatsError::UnknownSortKey(_) => StatusCode::BAD_REQUEST,
            StatsError::UnknownBranch(_) => StatusCode::NOT_FOUND,
            StatsError::InvalidTarget(_)
            | StatsError::EmptySeries { .. }
            | StatsError::MalformedEntity { .. }
            | StatsError::MalformedDataset(_) => StatusCode::UNPROCESSABLE_ENTITY,
        };
        Self {
            status,
            message: err.to_string(),
        }
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        Self::internal(err)
    }
}

impl axum::response::IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        (self.status, self.message).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stats_errors_map_to_status() {
        let err: AppError = StatsError::UnknownSortKey("name-asc".into()).into();
        assert_eq!(err.status, StatusCode::BAD_REQUEST);
        assert_eq!(err.message, "unknown sort key 'name-asc'");

        let err: AppError = StatsError::UnknownBranch("Cork".into()).into();
        assert_eq!(err.status, StatusCode::NOT_FOUND);

        let err: AppError = StatsError::EmptySeries { entity: "Main St".into() }.into();
        assert_eq!(err.status, StatusCode::UNPROCESSABLE_ENTITY);
    }
}
