//! Sentinel factory: process-wide unique, identity-comparable markers.
//!
//! A sentinel is keyed by `(module, name)`. Two `make` calls with the same
//! key return the *same* `&'static Sentinel`; copies and serde round-trips
//! preserve identity. The [`sentinel!`] macro infers the module from the
//! caller's lexical context.

use std::collections::HashMap;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::ptr;
use std::sync::OnceLock;

use parking_lot::RwLock;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use tracing::debug;

type Registry = RwLock<HashMap<RegistryKey, &'static Sentinel>>;

static REGISTRY: OnceLock<Registry> = OnceLock::new();

fn registry() -> &'static Registry {
    REGISTRY.get_or_init(|| RwLock::new(HashMap::new()))
}

#[derive(Clone, PartialEq, Eq, Hash)]
struct RegistryKey {
    module: String,
    name: String,
}

/// A process-wide unique marker object.
///
/// Equality and hashing are identity-based: distinct names or modules
/// always yield distinct, non-equal sentinels.
pub struct Sentinel {
    name: String,
    module: String,
    repr: String,
}

impl Sentinel {
    /// Return the singleton sentinel for `(name, module)`.
    ///
    /// `module` defaults to this crate's name when not given; prefer the
    /// [`sentinel!`] macro, which captures the caller's module path. The
    /// display form defaults to `<last-dot-segment-of-name>`.
    ///
    /// Concurrent first-creation is serialized: lookups take the read lock
    /// only, a miss re-checks under the write lock before inserting, so all
    /// racers observe the same instance.
    pub fn make(name: &str, module: Option<&str>, repr: Option<&str>) -> &'static Sentinel {
        let module = module.unwrap_or(env!("CARGO_PKG_NAME"));
        let key = RegistryKey {
            module: module.to_string(),
            name: name.to_string(),
        };

        if let Some(&existing) = registry().read().get(&key) {
            return existing;
        }

        let mut reg = registry().write();
        if let Some(&existing) = reg.get(&key) {
            return existing;
        }

        let repr = match repr {
            Some(r) => r.to_string(),
            None => format!("<{}>", name.rsplit('.').next().unwrap_or(name)),
        };
        let sentinel: &'static Sentinel = Box::leak(Box::new(Sentinel {
            name: name.to_string(),
            module: module.to_string(),
            repr,
        }));
        reg.insert(key, sentinel);
        debug!(name = %sentinel.name, module = %sentinel.module, "sentinel registered");
        sentinel
    }

    /// Display name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Owning module.
    pub fn module(&self) -> &str {
        &self.module
    }

    /// Repr string, e.g. `<MissingValue>`.
    pub fn repr(&self) -> &str {
        &self.repr
    }
}

impl PartialEq for Sentinel {
    fn eq(&self, other: &Self) -> bool {
        ptr::eq(self, other)
    }
}

impl Eq for Sentinel {}

impl Hash for Sentinel {
    fn hash<H: Hasher>(&self, state: &mut H) {
        (self as *const Sentinel as usize).hash(state);
    }
}

impl fmt::Display for Sentinel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

impl fmt::Debug for Sentinel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.repr)
    }
}

#[derive(Serialize, Deserialize)]
struct SentinelParts {
    name: String,
    module: String,
    repr: String,
}

impl Serialize for Sentinel {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        SentinelParts {
            name: self.name.clone(),
            module: self.module.clone(),
            repr: self.repr.clone(),
        }
        .serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for &'static Sentinel {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let parts = SentinelParts::deserialize(deserializer)?;
        Ok(Sentinel::make(
            &parts.name,
            Some(&parts.module),
            Some(&parts.repr),
        ))
    }
}

/// Create (or look up) a sentinel, inferring the module from the caller.
#[macro_export]
macro_rules! sentinel {
    ($name:expr) => {
        $crate::domain::sentinel::Sentinel::make($name, Some(::core::module_path!()), None)
    };
    ($name:expr, $repr:expr) => {
        $crate::domain::sentinel::Sentinel::make(
            $name,
            Some(::core::module_path!()),
            Some($repr),
        )
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn repr_defaults_to_last_dot_segment() {
        let s = Sentinel::make("outer.inner.MissingValue", Some("unit::repr"), None);
        assert_eq!(s.repr(), "<MissingValue>");
        assert_eq!(s.to_string(), "outer.inner.MissingValue");
        assert_eq!(format!("{s:?}"), "<MissingValue>");
    }

    #[test]
    fn macro_captures_module_path() {
        let s = sentinel!("MacroScoped");
        assert_eq!(s.module(), module_path!());
    }
}
