//! The undefined marker: a process-wide "value absent" singleton.
//!
//! `UNDEFINED` is distinct from `Option::None`: a model field holding
//! `UndefinedOr<Option<T>>` can tell "attribute never set" apart from
//! "attribute explicitly set to nothing".

use std::fmt;

use serde::{de, Deserialize, Deserializer, Serialize, Serializer};

use crate::domain::error::{DomainError, DomainResult};

/// Fixed label the marker stringifies and serializes to.
pub const UNDEFINED_LABEL: &str = "NOTHING";

/// The type of the [`UNDEFINED`] marker.
///
/// Exactly one instance exists for the whole process. The field is private,
/// so the only way to obtain a value is through the static (or a reference
/// to it); [`UndefinedType::try_new`] always fails.
pub struct UndefinedType {
    _priv: (),
}

/// The single process-wide undefined marker.
pub static UNDEFINED: UndefinedType = UndefinedType { _priv: () };

impl UndefinedType {
    /// The canonical instance.
    pub fn get() -> &'static UndefinedType {
        &UNDEFINED
    }

    /// The process-wide instance already exists; a second one cannot be
    /// created.
    pub fn try_new() -> DomainResult<UndefinedType> {
        Err(DomainError::DuplicateUndefined)
    }

    /// The marker is always falsy.
    pub const fn as_bool(&self) -> bool {
        false
    }
}

impl From<&UndefinedType> for bool {
    fn from(_: &UndefinedType) -> bool {
        false
    }
}

impl fmt::Display for UndefinedType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(UNDEFINED_LABEL)
    }
}

impl fmt::Debug for UndefinedType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<{UNDEFINED_LABEL}>")
    }
}

impl Serialize for UndefinedType {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(UNDEFINED_LABEL)
    }
}

impl<'de> Deserialize<'de> for &'static UndefinedType {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let label = String::deserialize(deserializer)?;
        if label == UNDEFINED_LABEL {
            Ok(&UNDEFINED)
        } else {
            Err(de::Error::custom(format!(
                "expected the '{UNDEFINED_LABEL}' label, got '{label}'"
            )))
        }
    }
}

/// A value that may be absent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UndefinedOr<T> {
    Defined(T),
    Undefined,
}

impl<T> UndefinedOr<T> {
    pub fn is_undefined(&self) -> bool {
        matches!(self, UndefinedOr::Undefined)
    }

    pub fn is_defined(&self) -> bool {
        !self.is_undefined()
    }

    /// The contained value, if any.
    pub fn defined(self) -> Option<T> {
        match self {
            UndefinedOr::Defined(value) => Some(value),
            UndefinedOr::Undefined => None,
        }
    }

    pub fn unwrap_or(self, fallback: T) -> T {
        match self {
            UndefinedOr::Defined(value) => value,
            UndefinedOr::Undefined => fallback,
        }
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> UndefinedOr<U> {
        match self {
            UndefinedOr::Defined(value) => UndefinedOr::Defined(f(value)),
            UndefinedOr::Undefined => UndefinedOr::Undefined,
        }
    }

    pub fn as_ref(&self) -> UndefinedOr<&T> {
        match self {
            UndefinedOr::Defined(value) => UndefinedOr::Defined(value),
            UndefinedOr::Undefined => UndefinedOr::Undefined,
        }
    }
}

impl<T> From<T> for UndefinedOr<T> {
    fn from(value: T) -> Self {
        UndefinedOr::Defined(value)
    }
}

impl<T> Default for UndefinedOr<T> {
    fn default() -> Self {
        UndefinedOr::Undefined
    }
}
