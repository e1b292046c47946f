//! Domain layer: the building-block utilities.
//!
//! Four independent utilities, composed only by user code: the freeze/thaw
//! controller, the typed-attribute equality engine, the sentinel factory,
//! and the undefined marker.

pub mod building_block;
pub mod error;
pub mod frozen;
pub mod sentinel;
pub mod typed;
pub mod undefined;

pub use building_block::{BuildingBlock, ValueObject};
pub use error::{DomainError, DomainResult};
pub use frozen::{
    sites, CallSite, Frozen, FrozenBuilder, FrozenClass, FrozenDecl, Thawable, ThawableClass,
    ThawableDecl, THAWED_DEFAULTS,
};
pub use sentinel::Sentinel;
pub use typed::{
    apply_defaults, typed_eq, typed_hash, AttrDescriptor, AttrValue, Attribute, Attributes,
    AttributesBuilder, Equality, TypedAttrs, TypedObject,
};
pub use undefined::{UndefinedOr, UndefinedType, UNDEFINED};
