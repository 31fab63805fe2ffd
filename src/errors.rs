use thiserror::Error;

#[derive(Debug, Clone, Error)]
pub enum EngineError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Already exists: {0}")]
    AlreadyExists(String),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Database error: {0}")]
    DatabaseError(String),

    #[error("Invalid session state: {0}")]
    InvalidState(String),

    #[error("Internal error: {0}")]
    InternalError(String),
}

impl From<mongodb::error::Error> for EngineError {
    fn from(err: mongodb::error::Error) -> Self {
        EngineError::DatabaseError(err.to_string())
    }
}
impl From<mongodb::bson::ser::Error> for EngineError {
    fn from(err: mongodb::bson::ser::Error) -> Self {
        EngineError::InternalError(format!("BSON serialization error: {}", err))
    }
}
impl From<validator::ValidationErrors> for EngineError {
    fn from(err: validator::ValidationErrors) -> Self {
        EngineError::ValidationError(err.to_string())
    }
}

pub type EngineResult<T> = Result<T, EngineError>;
