//! Domain building blocks composed from the other utilities.

use crate::domain::error::DomainResult;
use crate::domain::typed::{typed_eq, TypedAttrs};

/// A base trait for domain patterns, where each one represents a building
/// block in its own right.
pub trait BuildingBlock {}

/// An immutable object compared by value rather than identity.
///
/// Implementors declare their attribute table through [`TypedAttrs`] and
/// keep their state immutable after construction (the freeze/thaw
/// controller or plain non-`mut` ownership both qualify).
pub trait ValueObject: BuildingBlock + TypedAttrs {
    fn value_eq(&self, other: &Self) -> DomainResult<bool>
    where
        Self: Sized,
    {
        typed_eq(self, other)
    }
}
