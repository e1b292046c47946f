//! Typed-attribute equality engine.
//!
//! A class opts in by declaring a static table of per-field directives
//! ([`Attributes`]) and implementing [`TypedAttrs`]. The engine derives
//! equality ([`typed_eq`]), hashing ([`typed_hash`]) and default-value
//! injection ([`apply_defaults`]) from that table; no field is ever
//! silently skipped — a declared comparable field that is absent at
//! comparison time is a consistency error, surfacing model drift early.

use std::any::Any;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::ptr;

use itertools::Itertools;

use crate::domain::error::{DomainError, DomainResult};
use crate::domain::undefined::{UndefinedOr, UNDEFINED_LABEL};

/// Erased attribute value: comparable and hashable across `dyn` boundaries.
///
/// Blanket-implemented for every `PartialEq + Hash + Debug + 'static` type,
/// so field getters can hand out `&dyn AttrValue` without wrapper types.
pub trait AttrValue: fmt::Debug {
    fn as_any(&self) -> &dyn Any;
    fn dyn_eq(&self, other: &dyn AttrValue) -> bool;
    fn dyn_hash(&self, state: &mut dyn Hasher);
}

impl<V: PartialEq + Hash + fmt::Debug + 'static> AttrValue for V {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn dyn_eq(&self, other: &dyn AttrValue) -> bool {
        other.as_any().downcast_ref::<V>().is_some_and(|o| self == o)
    }

    fn dyn_hash(&self, mut state: &mut dyn Hasher) {
        self.hash(&mut state);
    }
}

/// Per-field comparison/hash directives.
#[derive(Debug, Clone, Copy)]
pub struct Attribute {
    name: &'static str,
    compare: Option<bool>,
    hash: Option<bool>,
}

impl Attribute {
    pub const fn new(name: &'static str) -> Self {
        Attribute {
            name,
            compare: None,
            hash: None,
        }
    }

    /// Include the field in equality. Defaults to `true`.
    pub const fn compare(mut self, compare: bool) -> Self {
        self.compare = Some(compare);
        self
    }

    /// Include the field in hashing. Defaults to the compare directive.
    pub const fn hash(mut self, hash: bool) -> Self {
        self.hash = Some(hash);
        self
    }

    pub const fn name(&self) -> &'static str {
        self.name
    }

    pub fn is_compared(&self) -> bool {
        self.compare.unwrap_or(true)
    }

    pub fn is_hashed(&self) -> bool {
        self.hash.unwrap_or_else(|| self.is_compared())
    }
}

/// Field accessor: `Undefined` means the attribute is absent on the object.
pub type Getter<T> = fn(&T) -> UndefinedOr<&dyn AttrValue>;

/// How a declared default produces its value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DefaultKind {
    Value,
    Factory,
}

/// One field of a typed class: directives plus accessors.
pub struct AttrDescriptor<T> {
    spec: Attribute,
    get: Getter<T>,
    fill: Option<(DefaultKind, fn(&mut T))>,
    conflict: bool,
}

impl<T> AttrDescriptor<T> {
    pub fn new(spec: Attribute, get: Getter<T>) -> Self {
        AttrDescriptor {
            spec,
            get,
            fill: None,
            conflict: false,
        }
    }

    /// Declare a fixed default written by `fill`.
    ///
    /// Mutually exclusive with [`AttrDescriptor::default_factory`]; a
    /// double declaration surfaces as `ConflictingDefaults` when the table
    /// is built.
    pub fn default_value(mut self, fill: fn(&mut T)) -> Self {
        if self.fill.is_some() {
            self.conflict = true;
        } else {
            self.fill = Some((DefaultKind::Value, fill));
        }
        self
    }

    /// Declare a computed default written by `fill`.
    pub fn default_factory(mut self, fill: fn(&mut T)) -> Self {
        if self.fill.is_some() {
            self.conflict = true;
        } else {
            self.fill = Some((DefaultKind::Factory, fill));
        }
        self
    }

    pub fn spec(&self) -> &Attribute {
        &self.spec
    }

    pub fn has_default(&self) -> bool {
        self.fill.is_some()
    }
}

impl<T> fmt::Debug for AttrDescriptor<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AttrDescriptor")
            .field("spec", &self.spec)
            .field("default", &self.fill.map(|(kind, _)| kind))
            .finish()
    }
}

/// Per-class attribute table, collected once and cached in a static by the
/// implementor of [`TypedAttrs`].
pub struct Attributes<T> {
    attrs: Vec<AttrDescriptor<T>>,
}

impl<T> Attributes<T> {
    pub fn builder() -> AttributesBuilder<T> {
        AttributesBuilder { attrs: Vec::new() }
    }

    /// All declared fields, in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = &AttrDescriptor<T>> {
        self.attrs.iter()
    }

    /// Fields included in equality.
    pub fn compared(&self) -> impl Iterator<Item = &AttrDescriptor<T>> {
        self.attrs.iter().filter(|d| d.spec.is_compared())
    }

    /// Fields included in hashing.
    pub fn hashed(&self) -> impl Iterator<Item = &AttrDescriptor<T>> {
        self.attrs.iter().filter(|d| d.spec.is_hashed())
    }

    pub fn len(&self) -> usize {
        self.attrs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.attrs.is_empty()
    }
}

impl<T> fmt::Debug for Attributes<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Attributes({})",
            self.attrs.iter().map(|d| d.spec.name()).join(", ")
        )
    }
}

/// Builder surfacing declaration errors before the table is used.
pub struct AttributesBuilder<T> {
    attrs: Vec<AttrDescriptor<T>>,
}

impl<T> AttributesBuilder<T> {
    pub fn attr(mut self, descriptor: AttrDescriptor<T>) -> Self {
        self.attrs.push(descriptor);
        self
    }

    pub fn build(self) -> DomainResult<Attributes<T>> {
        for descriptor in &self.attrs {
            if descriptor.conflict {
                return Err(DomainError::ConflictingDefaults {
                    attribute: descriptor.spec.name().to_string(),
                });
            }
        }
        Ok(Attributes { attrs: self.attrs })
    }
}

/// A class whose equality and hashing derive from declared attributes.
pub trait TypedAttrs: 'static {
    fn typed_class_attrs() -> &'static Attributes<Self>
    where
        Self: Sized;
}

/// Outcome of a dynamic comparison.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Equality {
    Equal,
    NotEqual,
    /// The other object is not of a compatible type.
    NotComparable,
}

/// Dynamic comparison over type-erased objects.
pub trait TypedObject: Any {
    fn equals(&self, other: &dyn Any) -> DomainResult<Equality>;
    fn as_any_object(&self) -> &dyn Any;
}

impl<T: TypedAttrs> TypedObject for T {
    fn equals(&self, other: &dyn Any) -> DomainResult<Equality> {
        let Some(other) = other.downcast_ref::<T>() else {
            return Ok(Equality::NotComparable);
        };
        Ok(if typed_eq(self, other)? {
            Equality::Equal
        } else {
            Equality::NotEqual
        })
    }

    fn as_any_object(&self) -> &dyn Any {
        self
    }
}

fn missing<T: TypedAttrs>(descriptor: &AttrDescriptor<T>) -> DomainError {
    DomainError::MissingTypedAttribute {
        attribute: descriptor.spec.name().to_string(),
        class: std::any::type_name::<T>().to_string(),
    }
}

/// Pairwise equality over the compared fields, in declaration order.
///
/// With every field excluded from comparison the check degrades to
/// identity. An absent value on either side fails loudly instead of
/// reporting inequality.
pub fn typed_eq<T: TypedAttrs>(this: &T, other: &T) -> DomainResult<bool> {
    let mut any_compared = false;

    for descriptor in T::typed_class_attrs().compared() {
        any_compared = true;
        let other_value = match (descriptor.get)(other) {
            UndefinedOr::Defined(value) => value,
            UndefinedOr::Undefined => return Err(missing(descriptor)),
        };
        let this_value = match (descriptor.get)(this) {
            UndefinedOr::Defined(value) => value,
            UndefinedOr::Undefined => return Err(missing(descriptor)),
        };
        if !this_value.dyn_eq(other_value) {
            return Ok(false);
        }
    }

    if !any_compared {
        return Ok(ptr::eq(this, other));
    }
    Ok(true)
}

/// Hash the hash-marked field values, in declaration order.
///
/// With no field marked hashable the hash degrades to identity (address);
/// absent values hash a fixed marker.
pub fn typed_hash<T: TypedAttrs, H: Hasher>(value: &T, state: &mut H) {
    let mut any_hashed = false;

    for descriptor in T::typed_class_attrs().hashed() {
        any_hashed = true;
        match (descriptor.get)(value) {
            UndefinedOr::Defined(field) => field.dyn_hash(state),
            UndefinedOr::Undefined => UNDEFINED_LABEL.hash(state),
        }
    }

    if !any_hashed {
        (value as *const T as usize).hash(state);
    }
}

/// Populate every still-absent field from its declared default.
///
/// A field left absent by the constructor with no declared default is a
/// fatal configuration error.
pub fn apply_defaults<T: TypedAttrs>(value: &mut T) -> DomainResult<()> {
    for descriptor in T::typed_class_attrs().iter() {
        if (descriptor.get)(value).is_undefined() {
            match descriptor.fill {
                Some((_, fill)) => fill(value),
                None => {
                    return Err(DomainError::MissingDefault {
                        attribute: descriptor.spec.name().to_string(),
                    })
                }
            }
        }
    }
    Ok(())
}
