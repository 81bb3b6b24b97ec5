//! Engine error model.
//! `EngineError` is the business-rule taxonomy every public operation reports.
//! `FieldError` covers values rejected before they ever reach an operation.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Deterministic rejection of an operation. Surfaced to callers verbatim and
/// never retried by the engine; a rejected operation leaves every table unchanged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Error, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EngineError {
    #[error("entity already exists")]
    EntityExists,
    #[error("entity does not exist")]
    EntityMissing,
    #[error("record already exists")]
    RecordExists,
    #[error("record does not exist")]
    RecordMissing,
    #[error("caller is not authorized for this change")]
    Unauthorized,
    #[error("caller may not read this record")]
    AccessDenied,
    #[error("access level is not grantable")]
    AccessLevelInvalid,
    /// Reserved; no operation produces it.
    #[error("participant does not exist")]
    ParticipantMissing,
    /// Reserved; no operation produces it.
    #[error("transaction type is not recognised")]
    TransactionTypeInvalid,
}

impl EngineError {
    pub fn code_str(&self) -> &'static str {
        match self {
            EngineError::EntityExists => "entity_exists",
            EngineError::EntityMissing => "entity_missing",
            EngineError::RecordExists => "record_exists",
            EngineError::RecordMissing => "record_missing",
            EngineError::Unauthorized => "unauthorized",
            EngineError::AccessDenied => "access_denied",
            EngineError::AccessLevelInvalid => "access_level_invalid",
            EngineError::ParticipantMissing => "participant_missing",
            EngineError::TransactionTypeInvalid => "transaction_type_invalid",
        }
    }

    /// Read-intent operations fail with `AccessDenied`; write operations with
    /// `Unauthorized`. Callers use this to tell the two paths apart.
    pub fn is_read_path(&self) -> bool { matches!(self, EngineError::AccessDenied) }

    /// Kinds kept in the taxonomy for future extension.
    pub fn is_reserved(&self) -> bool {
        matches!(self, EngineError::ParticipantMissing | EngineError::TransactionTypeInvalid)
    }
}

pub type EngineResult<T> = Result<T, EngineError>;

/// A value that does not fit the shape of the column it is destined for.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FieldError {
    #[error("{field} must not be empty")]
    Empty { field: &'static str },
    #[error("{field} is {len} characters, limit is {max}")]
    TooLong { field: &'static str, max: usize, len: usize },
    #[error("checksum must be exactly 32 bytes of hex: {0}")]
    Checksum(String),
    #[error("unknown tier '{0}'")]
    Tier(String),
}

#[cfg(test)]
#[path = "error_tests.rs"]
mod error_tests;
