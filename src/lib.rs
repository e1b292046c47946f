//! Domain-driven design building blocks.
//!
//! Four independent, in-memory utilities composed only by user code:
//!
//! - **Freeze/thaw controller** ([`domain::frozen`]): guarded attribute/item
//!   containers whose mutation is admitted per named call site, with a
//!   strict (immutable-by-construction) and a thawable (runtime
//!   freeze/thaw) variant.
//! - **Typed-attribute equality engine** ([`domain::typed`]): equality,
//!   hashing and default injection derived from a declared per-field
//!   directive table.
//! - **Sentinel factory** ([`domain::sentinel`]): process-wide unique,
//!   identity-comparable markers, stable under copy and serialization.
//! - **Undefined marker** ([`domain::undefined`]): a single falsy
//!   "value absent" singleton, distinct from `None`.
//!
//! Everything is single-process and synchronous; the only internal
//! concurrency concern is first-creation races on the sentinel registry,
//! which are serialized.

pub mod domain;
pub mod util;
pub mod version;

pub use domain::{
    apply_defaults, sites, typed_eq, typed_hash, AttrDescriptor, AttrValue, Attribute, Attributes,
    BuildingBlock, CallSite, DomainError, DomainResult, Equality, Frozen, FrozenBuilder,
    FrozenClass, FrozenDecl, Sentinel, Thawable, ThawableClass, ThawableDecl, TypedAttrs,
    TypedObject, UndefinedOr, UndefinedType, ValueObject, THAWED_DEFAULTS, UNDEFINED,
};
pub use version::{Stage, Version, VersionError};
