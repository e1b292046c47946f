//! Freeze/thaw controller: guarded attribute/item containers.
//!
//! Mutation on a class and its instances is routed through a guard that
//! checks the class-level frozen flag and the identity of the requesting
//! call site. Caller identity is a named exemption list: privileged callers
//! pass a [`CallSite`] token, and the guard admits the operation only when
//! the class is unfrozen or the site is in the thawed set.
//!
//! Two variants:
//! - [`FrozenClass`] / [`Frozen`]: strict. The flag is true by
//!   construction, a `false` declaration is rejected, and there is no
//!   runtime API to lift the restriction. Instances are populated through a
//!   consuming [`FrozenBuilder`].
//! - [`ThawableClass`] / [`Thawable`]: the flag may start out false, and
//!   [`ThawableClass::freeze`] / [`ThawableClass::thaw`] flip it or extend
//!   the thawed set at runtime.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use parking_lot::RwLock;
use tracing::debug;

use crate::domain::error::{DomainError, DomainResult};

/// Named call site requesting a guarded mutation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CallSite(&'static str);

impl CallSite {
    pub const fn new(name: &'static str) -> Self {
        CallSite(name)
    }

    pub const fn name(&self) -> &'static str {
        self.0
    }
}

/// Built-in call sites, thawed on every class.
pub mod sites {
    use super::CallSite;

    /// Class construction.
    pub const NEW: CallSite = CallSite::new("new");
    /// Instance initialization.
    pub const INIT: CallSite = CallSite::new("init");
    /// The `freeze` operation writing the flag.
    pub const FREEZE: CallSite = CallSite::new("freeze");
    /// The `thaw` operation writing the flag or the thawed set.
    pub const THAW: CallSite = CallSite::new("thaw");
    /// Re-entrant guarded set.
    pub const GUARD_SET: CallSite = CallSite::new("guard_set");
    /// Re-entrant guarded delete.
    pub const GUARD_DEL: CallSite = CallSite::new("guard_del");
}

/// Site names exempt from the freeze check on every class.
pub const THAWED_DEFAULTS: [&str; 6] = [
    sites::GUARD_SET.name(),
    sites::GUARD_DEL.name(),
    sites::NEW.name(),
    sites::INIT.name(),
    sites::FREEZE.name(),
    sites::THAW.name(),
];

fn site_allowed(frozen: bool, thawed: &BTreeSet<String>, site: CallSite) -> bool {
    !frozen || thawed.contains(site.name())
}

fn merge_defaults(mut thawed: BTreeSet<String>) -> BTreeSet<String> {
    thawed.extend(THAWED_DEFAULTS.iter().map(|s| (*s).to_string()));
    thawed
}

// ---------------------------------------------------------------------------
// Thawable variant
// ---------------------------------------------------------------------------

/// Declaration for a thawable class.
///
/// Invalid declarations fail at [`ThawableDecl::build`], before any
/// instance exists.
#[derive(Debug, Clone)]
pub struct ThawableDecl<V> {
    name: String,
    frozen: bool,
    thawed: BTreeSet<String>,
    members: BTreeSet<String>,
    attrs: BTreeMap<String, V>,
    items: BTreeMap<String, V>,
}

impl<V: Clone> ThawableDecl<V> {
    /// Initial frozen state, default `true`.
    pub fn frozen(mut self, frozen: bool) -> Self {
        self.frozen = frozen;
        self
    }

    /// Declare an additional thawed call site.
    pub fn thawed_site(mut self, name: &str) -> Self {
        self.thawed.insert(name.to_string());
        self
    }

    /// Declare a member name, resolvable by `thaw(..., ensure_exists)`.
    pub fn member(mut self, name: &str) -> Self {
        self.members.insert(name.to_string());
        self
    }

    /// Declare a class-level attribute.
    pub fn class_attr(mut self, key: &str, value: V) -> Self {
        self.attrs.insert(key.to_string(), value);
        self
    }

    /// Declare a class-level item.
    pub fn class_item(mut self, key: &str, value: V) -> Self {
        self.items.insert(key.to_string(), value);
        self
    }

    pub fn build(self) -> DomainResult<Arc<ThawableClass<V>>> {
        if self.name.is_empty() {
            return Err(DomainError::InvalidDeclaration {
                class: self.name,
                reason: "class name must not be empty".to_string(),
            });
        }

        let decl = self.clone();
        debug!(class = %self.name, frozen = self.frozen, "thawable class declared");
        Ok(Arc::new(ThawableClass {
            name: self.name,
            decl,
            members: self.members,
            state: RwLock::new(ClassState {
                frozen: self.frozen,
                thawed: merge_defaults(self.thawed),
                attrs: self.attrs,
                items: self.items,
            }),
        }))
    }
}

#[derive(Debug)]
struct ClassState<V> {
    frozen: bool,
    thawed: BTreeSet<String>,
    attrs: BTreeMap<String, V>,
    items: BTreeMap<String, V>,
}

/// Class object shared by all of its instances.
///
/// The frozen flag and the thawed-site set live here, so a `freeze` or
/// `thaw` call is observed by every existing instance of this exact class.
/// Subclasses carry their own independent state.
#[derive(Debug)]
pub struct ThawableClass<V> {
    name: String,
    decl: ThawableDecl<V>,
    members: BTreeSet<String>,
    state: RwLock<ClassState<V>>,
}

impl<V: Clone> ThawableClass<V> {
    pub fn declare(name: impl Into<String>) -> ThawableDecl<V> {
        ThawableDecl {
            name: name.into(),
            frozen: true,
            thawed: BTreeSet::new(),
            members: BTreeSet::new(),
            attrs: BTreeMap::new(),
            items: BTreeMap::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_frozen(&self) -> bool {
        self.state.read().frozen
    }

    /// Freeze the class and all of its existing instances.
    ///
    /// With `strict`, freezing an already frozen class is an error;
    /// otherwise it is a no-op.
    pub fn freeze(&self, strict: bool) -> DomainResult<()> {
        if strict && self.is_frozen() {
            return Err(DomainError::AlreadyFrozen {
                class: self.name.clone(),
            });
        }
        self.write_flag(sites::FREEZE, true)
    }

    /// Thaw the class entirely (`members: None`) or open the given call
    /// sites.
    ///
    /// With `ensure_exists`, every name must resolve on the class (declared
    /// member, class attribute or item) before any of them is thawed.
    pub fn thaw(&self, members: Option<&[&str]>, ensure_exists: bool) -> DomainResult<()> {
        let Some(names) = members else {
            return self.write_flag(sites::THAW, false);
        };

        if ensure_exists {
            for name in names {
                if !self.resolves(name) {
                    return Err(DomainError::ThawMemberNotFound {
                        class: self.name.clone(),
                        member: (*name).to_string(),
                    });
                }
            }
        }

        self.guard_class(sites::THAW)?;
        let mut state = self.state.write();
        state.thawed.extend(names.iter().map(|n| (*n).to_string()));
        debug!(class = %self.name, sites = ?names, "call sites thawed");
        Ok(())
    }

    /// Begin a subclass declaration.
    ///
    /// The declaration is seeded from the parent's *declared* defaults,
    /// never from its current runtime flag or thawed set: runtime `freeze`
    /// and `thaw` calls on a class do not leak into subclasses.
    pub fn subclass(&self, name: impl Into<String>) -> ThawableDecl<V> {
        let mut decl = self.decl.clone();
        decl.name = name.into();
        decl
    }

    pub fn instantiate(self: &Arc<Self>) -> Thawable<V> {
        Thawable {
            class: Arc::clone(self),
            attrs: BTreeMap::new(),
            items: BTreeMap::new(),
        }
    }

    /// Guarded class-level attribute write.
    pub fn set_attr(&self, site: CallSite, key: &str, value: V) -> DomainResult<()> {
        self.guard_class(site)?;
        self.state.write().attrs.insert(key.to_string(), value);
        Ok(())
    }

    /// Guarded class-level attribute delete.
    pub fn del_attr(&self, site: CallSite, key: &str) -> DomainResult<V> {
        self.guard_class(site)?;
        self.state.write().attrs.remove(key).ok_or_else(|| {
            DomainError::AttributeNotFound {
                target: self.name.clone(),
                attribute: key.to_string(),
            }
        })
    }

    /// Guarded class-level item write.
    pub fn set_item(&self, site: CallSite, key: &str, value: V) -> DomainResult<()> {
        self.guard_class(site)?;
        self.state.write().items.insert(key.to_string(), value);
        Ok(())
    }

    /// Guarded class-level item delete.
    pub fn del_item(&self, site: CallSite, key: &str) -> DomainResult<V> {
        self.guard_class(site)?;
        self.state.write().items.remove(key).ok_or_else(|| {
            DomainError::AttributeNotFound {
                target: self.name.clone(),
                attribute: key.to_string(),
            }
        })
    }

    /// Unguarded class-level attribute read.
    pub fn class_attr(&self, key: &str) -> Option<V> {
        self.state.read().attrs.get(key).cloned()
    }

    /// Unguarded class-level item read.
    pub fn class_item(&self, key: &str) -> Option<V> {
        self.state.read().items.get(key).cloned()
    }

    fn resolves(&self, member: &str) -> bool {
        if self.members.contains(member) {
            return true;
        }
        let state = self.state.read();
        state.attrs.contains_key(member) || state.items.contains_key(member)
    }

    // The flag itself travels through the same guarded path as ordinary
    // attributes; the freeze/thaw sites are thawed on every class.
    fn write_flag(&self, site: CallSite, frozen: bool) -> DomainResult<()> {
        self.guard_class(site)?;
        self.state.write().frozen = frozen;
        debug!(class = %self.name, frozen, "frozen flag updated");
        Ok(())
    }

    fn guard_class(&self, site: CallSite) -> DomainResult<()> {
        let state = self.state.read();
        if !site_allowed(state.frozen, &state.thawed, site) {
            return Err(DomainError::FrozenObject {
                target: self.name.clone(),
            });
        }
        Ok(())
    }

    fn guard_instance(&self, site: CallSite) -> DomainResult<()> {
        let state = self.state.read();
        if !site_allowed(state.frozen, &state.thawed, site) {
            return Err(DomainError::FrozenInstance {
                target: self.name.clone(),
            });
        }
        Ok(())
    }
}

/// Instance of a [`ThawableClass`].
#[derive(Debug, Clone)]
pub struct Thawable<V> {
    class: Arc<ThawableClass<V>>,
    attrs: BTreeMap<String, V>,
    items: BTreeMap<String, V>,
}

impl<V: Clone> Thawable<V> {
    pub fn class(&self) -> &Arc<ThawableClass<V>> {
        &self.class
    }

    /// Guarded attribute write.
    pub fn set_attr(&mut self, site: CallSite, key: &str, value: V) -> DomainResult<()> {
        self.class.guard_instance(site)?;
        self.attrs.insert(key.to_string(), value);
        Ok(())
    }

    /// Guarded attribute delete.
    pub fn del_attr(&mut self, site: CallSite, key: &str) -> DomainResult<V> {
        self.class.guard_instance(site)?;
        self.attrs.remove(key).ok_or_else(|| DomainError::AttributeNotFound {
            target: self.class.name.clone(),
            attribute: key.to_string(),
        })
    }

    /// Guarded item write.
    pub fn set_item(&mut self, site: CallSite, key: &str, value: V) -> DomainResult<()> {
        self.class.guard_instance(site)?;
        self.items.insert(key.to_string(), value);
        Ok(())
    }

    /// Guarded item delete.
    pub fn del_item(&mut self, site: CallSite, key: &str) -> DomainResult<V> {
        self.class.guard_instance(site)?;
        self.items.remove(key).ok_or_else(|| DomainError::AttributeNotFound {
            target: self.class.name.clone(),
            attribute: key.to_string(),
        })
    }

    pub fn attr(&self, key: &str) -> Option<&V> {
        self.attrs.get(key)
    }

    pub fn item(&self, key: &str) -> Option<&V> {
        self.items.get(key)
    }
}

// ---------------------------------------------------------------------------
// Strict variant
// ---------------------------------------------------------------------------

/// Declaration for a strict frozen class.
///
/// The frozen flag must remain `true`: declaring it `false` is rejected at
/// build time, and the built class exposes no runtime API to lift the
/// restriction.
#[derive(Debug, Clone)]
pub struct FrozenDecl<V> {
    name: String,
    frozen: bool,
    thawed: BTreeSet<String>,
    attrs: BTreeMap<String, V>,
    items: BTreeMap<String, V>,
}

impl<V: Clone> FrozenDecl<V> {
    pub fn frozen(mut self, frozen: bool) -> Self {
        self.frozen = frozen;
        self
    }

    /// Declare an additional thawed call site.
    pub fn thawed_site(mut self, name: &str) -> Self {
        self.thawed.insert(name.to_string());
        self
    }

    pub fn class_attr(mut self, key: &str, value: V) -> Self {
        self.attrs.insert(key.to_string(), value);
        self
    }

    pub fn class_item(mut self, key: &str, value: V) -> Self {
        self.items.insert(key.to_string(), value);
        self
    }

    pub fn build(self) -> DomainResult<Arc<FrozenClass<V>>> {
        if self.name.is_empty() {
            return Err(DomainError::InvalidDeclaration {
                class: self.name,
                reason: "class name must not be empty".to_string(),
            });
        }
        if !self.frozen {
            return Err(DomainError::InvalidDeclaration {
                class: self.name,
                reason: "the frozen flag cannot be false in a strict frozen class".to_string(),
            });
        }

        debug!(class = %self.name, "frozen class declared");
        Ok(Arc::new(FrozenClass {
            name: self.name,
            thawed: merge_defaults(self.thawed),
            state: RwLock::new(FrozenState {
                attrs: self.attrs,
                items: self.items,
            }),
        }))
    }
}

#[derive(Debug)]
struct FrozenState<V> {
    attrs: BTreeMap<String, V>,
    items: BTreeMap<String, V>,
}

/// Strict frozen class: immutable by construction.
#[derive(Debug)]
pub struct FrozenClass<V> {
    name: String,
    thawed: BTreeSet<String>,
    state: RwLock<FrozenState<V>>,
}

impl<V: Clone> FrozenClass<V> {
    pub fn declare(name: impl Into<String>) -> FrozenDecl<V> {
        FrozenDecl {
            name: name.into(),
            frozen: true,
            thawed: BTreeSet::new(),
            attrs: BTreeMap::new(),
            items: BTreeMap::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_frozen(&self) -> bool {
        true
    }

    /// Begin an instance; mutation happens on the builder, the finished
    /// instance is immutable.
    pub fn instantiate(self: &Arc<Self>) -> FrozenBuilder<V> {
        FrozenBuilder {
            class: Arc::clone(self),
            attrs: BTreeMap::new(),
            items: BTreeMap::new(),
        }
    }

    /// Guarded class-level attribute write; fails unless the site was
    /// declared thawed.
    pub fn set_attr(&self, site: CallSite, key: &str, value: V) -> DomainResult<()> {
        self.guard_class(site)?;
        self.state.write().attrs.insert(key.to_string(), value);
        Ok(())
    }

    pub fn del_attr(&self, site: CallSite, key: &str) -> DomainResult<V> {
        self.guard_class(site)?;
        self.state.write().attrs.remove(key).ok_or_else(|| {
            DomainError::AttributeNotFound {
                target: self.name.clone(),
                attribute: key.to_string(),
            }
        })
    }

    pub fn set_item(&self, site: CallSite, key: &str, value: V) -> DomainResult<()> {
        self.guard_class(site)?;
        self.state.write().items.insert(key.to_string(), value);
        Ok(())
    }

    pub fn del_item(&self, site: CallSite, key: &str) -> DomainResult<V> {
        self.guard_class(site)?;
        self.state.write().items.remove(key).ok_or_else(|| {
            DomainError::AttributeNotFound {
                target: self.name.clone(),
                attribute: key.to_string(),
            }
        })
    }

    pub fn class_attr(&self, key: &str) -> Option<V> {
        self.state.read().attrs.get(key).cloned()
    }

    pub fn class_item(&self, key: &str) -> Option<V> {
        self.state.read().items.get(key).cloned()
    }

    fn guard_class(&self, site: CallSite) -> DomainResult<()> {
        if !site_allowed(true, &self.thawed, site) {
            return Err(DomainError::FrozenObject {
                target: self.name.clone(),
            });
        }
        Ok(())
    }

    fn guard_instance(&self, site: CallSite) -> DomainResult<()> {
        if !site_allowed(true, &self.thawed, site) {
            return Err(DomainError::FrozenInstance {
                target: self.name.clone(),
            });
        }
        Ok(())
    }
}

/// Construction-time view of a strict frozen instance.
#[derive(Debug)]
pub struct FrozenBuilder<V> {
    class: Arc<FrozenClass<V>>,
    attrs: BTreeMap<String, V>,
    items: BTreeMap<String, V>,
}

impl<V: Clone> FrozenBuilder<V> {
    pub fn attr(mut self, key: &str, value: V) -> Self {
        self.attrs.insert(key.to_string(), value);
        self
    }

    pub fn item(mut self, key: &str, value: V) -> Self {
        self.items.insert(key.to_string(), value);
        self
    }

    pub fn finish(self) -> Frozen<V> {
        Frozen {
            class: self.class,
            attrs: self.attrs,
            items: self.items,
        }
    }
}

/// Instance of a [`FrozenClass`].
#[derive(Debug, Clone)]
pub struct Frozen<V> {
    class: Arc<FrozenClass<V>>,
    attrs: BTreeMap<String, V>,
    items: BTreeMap<String, V>,
}

impl<V: Clone> Frozen<V> {
    pub fn class(&self) -> &Arc<FrozenClass<V>> {
        &self.class
    }

    pub fn attr(&self, key: &str) -> Option<&V> {
        self.attrs.get(key)
    }

    pub fn item(&self, key: &str) -> Option<&V> {
        self.items.get(key)
    }

    pub fn set_attr(&mut self, site: CallSite, key: &str, value: V) -> DomainResult<()> {
        self.class.guard_instance(site)?;
        self.attrs.insert(key.to_string(), value);
        Ok(())
    }

    pub fn del_attr(&mut self, site: CallSite, key: &str) -> DomainResult<V> {
        self.class.guard_instance(site)?;
        self.attrs.remove(key).ok_or_else(|| DomainError::AttributeNotFound {
            target: self.class.name.clone(),
            attribute: key.to_string(),
        })
    }

    pub fn set_item(&mut self, site: CallSite, key: &str, value: V) -> DomainResult<()> {
        self.class.guard_instance(site)?;
        self.items.insert(key.to_string(), value);
        Ok(())
    }

    pub fn del_item(&mut self, site: CallSite, key: &str) -> DomainResult<V> {
        self.class.guard_instance(site)?;
        self.items.remove(key).ok_or_else(|| DomainError::AttributeNotFound {
            target: self.class.name.clone(),
            attribute: key.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_merged_into_declared_thawed_set() {
        let class = ThawableClass::<i64>::declare("Merged")
            .thawed_site("rebuild")
            .build()
            .unwrap();

        let state = class.state.read();
        for site in THAWED_DEFAULTS {
            assert!(state.thawed.contains(site), "missing default site {site}");
        }
        assert!(state.thawed.contains("rebuild"));
    }

    #[test]
    fn site_allowed_ignores_whitelist_when_unfrozen() {
        let thawed: BTreeSet<String> = BTreeSet::new();
        assert!(site_allowed(false, &thawed, CallSite::new("anything")));
        assert!(!site_allowed(true, &thawed, CallSite::new("anything")));
    }
}
