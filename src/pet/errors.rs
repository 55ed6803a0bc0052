use thiserror::Error;

use crate::validation::UserIdError;

/// Errors that can arise while operating on pet state or its storage.
#[derive(Debug, Error)]
pub enum PetError {
    /// Returned when no pet exists for the requested user.
    #[error("pet not found: {0}")]
    NotFound(String),

    /// The requested pet type is not one of the supported species.
    #[error("invalid pet type: {0}")]
    InvalidPetType(String),

    /// The supplied user identifier failed validation.
    #[error("invalid user id: {0}")]
    InvalidUserId(#[from] UserIdError),

    /// Wrapper around sled's error type.
    #[error("sled error: {0}")]
    Sled(#[from] sled::Error),

    /// Wrapper around bincode serialization and deserialization errors.
    #[error("serialization error: {0}")]
    Bincode(#[from] bincode::Error),

    /// Wrapper around IO errors (directory creation, etc.).
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Returned when deserializing a record with an unexpected schema version.
    #[error("schema mismatch for {entity}: expected {expected}, got {found}")]
    SchemaMismatch {
        entity: &'static str,
        expected: u8,
        found: u8,
    },

    /// Internal error (poisoned locks, task join errors, unexpected conditions)
    #[error("internal error: {0}")]
    Internal(String),
}

impl PetError {
    /// True for errors caused by the caller's input rather than the system.
    pub fn is_client_error(&self) -> bool {
        matches!(self, PetError::InvalidPetType(_) | PetError::InvalidUserId(_))
    }
}
