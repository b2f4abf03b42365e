use sea_orm::DbErr;
use thiserror::Error;

/// Structured failure kinds surfaced to the HTTP layer.
///
/// Every kind is reported to the caller; nothing is swallowed. Only
/// counter conflicts are retried, inside the services themselves with a
/// bounded attempt count, before surfacing as [`ServiceError::Conflict`].
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("{0} not found")]
    NotFound(String),

    #[error("user is not the project leader or a colleague")]
    Unauthorized,

    #[error("project password does not match")]
    InvalidCredentials,

    #[error("cannot join a project you lead")]
    AlreadyLeader,

    #[error("already a colleague on this project")]
    AlreadyMember,

    #[error("update already marked as read")]
    AlreadyRead,

    #[error("concurrent write conflict, retries exhausted")]
    Conflict,

    #[error("client version {client} is ahead of the latest update {latest}")]
    InvalidVersion { client: i64, latest: i64 },

    #[error(transparent)]
    Db(#[from] DbErr),
}

pub type ServiceResult<T> = Result<T, ServiceError>;

impl ServiceError {
    pub fn not_found(what: &str) -> Self {
        Self::NotFound(what.to_owned())
    }
}
