//! Domain-level errors (no external dependencies)

use thiserror::Error;

/// Domain errors represent violations of the building-block contracts.
///
/// Declaration errors (`InvalidDeclaration`, `ConflictingDefaults`,
/// `MissingDefault`) surface when a class or attribute table is defined and
/// are always fatal. Mutation violations (`FrozenObject`, `FrozenInstance`)
/// surface at the point of mutation and are recoverable by the caller.
#[derive(Error, Debug)]
pub enum DomainError {
    #[error("object '{target}' is frozen")]
    FrozenObject { target: String },

    #[error("instance of '{target}' is frozen")]
    FrozenInstance { target: String },

    #[error("class '{class}' is already frozen")]
    AlreadyFrozen { class: String },

    #[error("cannot thaw non-existent member '{member}' in class '{class}'")]
    ThawMemberNotFound { class: String, member: String },

    #[error("invalid declaration for class '{class}': {reason}")]
    InvalidDeclaration { class: String, reason: String },

    #[error("no attribute '{attribute}' on '{target}'")]
    AttributeNotFound { target: String, attribute: String },

    #[error("cannot specify both default and default_factory for attribute '{attribute}'")]
    ConflictingDefaults { attribute: String },

    #[error("expected attribute '{attribute}' to have a default value, but it is missing")]
    MissingDefault { attribute: String },

    #[error("attribute '{attribute}' is declared on '{class}' but missing at comparison time")]
    MissingTypedAttribute { attribute: String, class: String },

    #[error("cannot create a second instance of UndefinedType")]
    DuplicateUndefined,
}

/// Result type for domain operations.
pub type DomainResult<T> = Result<T, DomainError>;
