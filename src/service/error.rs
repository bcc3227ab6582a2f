use axum::http::StatusCode;
use thiserror::Error;
use uuid::Uuid;

use crate::{
    error::{ErrorMessage, HttpError},
    models::jobmodel::JobStatus,
};

#[derive(Error, Debug)]
pub enum ServiceError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Job {0} not found")]
    JobNotFound(Uuid),

    #[error("Service {0} not found")]
    ServiceNotFound(Uuid),

    #[error("Job {} cannot make this transition from status {}", .0, .1.to_str())]
    InvalidJobStatus(Uuid, JobStatus),

    #[error("Invalid state: {0}")]
    InvalidState(String),

    #[error("Job {0} has already been rated")]
    AlreadyRated(Uuid),

    #[error("Job {0} was modified concurrently, reload and retry")]
    StaleJob(Uuid),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

impl ServiceError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            ServiceError::Validation(_) => StatusCode::BAD_REQUEST,

            ServiceError::Forbidden(_) => StatusCode::FORBIDDEN,

            ServiceError::JobNotFound(_) | ServiceError::ServiceNotFound(_) => StatusCode::NOT_FOUND,

            ServiceError::InvalidJobStatus(_, _)
            | ServiceError::InvalidState(_)
            | ServiceError::AlreadyRated(_)
            | ServiceError::StaleJob(_) => StatusCode::CONFLICT,

            ServiceError::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<ServiceError> for HttpError {
    fn from(error: ServiceError) -> Self {
        match error {
            // Driver details stay in the logs.
            ServiceError::Database(ref e) => {
                tracing::error!("database error: {}", e);
                HttpError::server_error(ErrorMessage::ServerError.to_string())
            }
            _ => HttpError::new(error.to_string(), error.status_code()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kinds_map_to_http_statuses() {
        let id = Uuid::new_v4();

        assert_eq!(ServiceError::Validation("x".into()).status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(ServiceError::Forbidden("x".into()).status_code(), StatusCode::FORBIDDEN);
        assert_eq!(ServiceError::JobNotFound(id).status_code(), StatusCode::NOT_FOUND);
        assert_eq!(
            ServiceError::InvalidJobStatus(id, JobStatus::Completed).status_code(),
            StatusCode::CONFLICT
        );
        assert_eq!(ServiceError::AlreadyRated(id).status_code(), StatusCode::CONFLICT);
        assert_eq!(ServiceError::StaleJob(id).status_code(), StatusCode::CONFLICT);
    }

    #[test]
    fn database_errors_are_not_leaked_to_clients() {
        let http: HttpError = ServiceError::Database(sqlx::Error::PoolTimedOut).into();

        assert_eq!(http.status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(!http.message.contains("pool"));
    }

    #[test]
    fn invalid_status_message_names_the_status() {
        let id = Uuid::new_v4();
        let http: HttpError = ServiceError::InvalidJobStatus(id, JobStatus::InProgress).into();

        assert!(http.message.contains("in_progress"));
    }
}
