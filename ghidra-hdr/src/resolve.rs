//! Dependency resolution: root type names → ordered closure of required types.

use std::collections::HashSet;

use indexmap::IndexMap;
use tracing::{debug, trace};

use crate::model::{Registry, TypeKind, base_type};

/// The types needed to define a set of roots, dependencies first.
///
/// Names that were referenced but never declared are kept with a `None`
/// kind so callers can tell them apart from resolved entries.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Closure {
    entries: IndexMap<String, Option<TypeKind>>,
}

impl Closure {
    /// Every entry in resolution order, resolved or not.
    pub fn entries(&self) -> impl Iterator<Item = (&str, Option<TypeKind>)> {
        self.entries.iter().map(|(name, kind)| (name.as_str(), *kind))
    }

    /// Declared entries in resolution order.
    pub fn resolved(&self) -> impl Iterator<Item = (&str, TypeKind)> {
        self.entries()
            .filter_map(|(name, kind)| kind.map(|kind| (name, kind)))
    }

    /// Referenced names with no declaration in the registry.
    pub fn missing(&self) -> impl Iterator<Item = &str> {
        self.entries()
            .filter(|(_, kind)| kind.is_none())
            .map(|(name, _)| name)
    }

    /// Resolution index of `name`.
    pub fn position(&self, name: &str) -> Option<usize> {
        self.entries.get_index_of(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    pub fn kind(&self, name: &str) -> Option<TypeKind> {
        self.entries.get(name).copied().flatten()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Resolve `roots` against `registry`.
///
/// Each root is walked depth first; a type is appended after all of its
/// dependencies. A name is marked as passed when its walk starts, so mutual
/// dependencies terminate, and an edge back to the node itself is ignored.
pub fn resolve<S: AsRef<str>>(registry: &Registry, roots: &[S]) -> Closure {
    let mut walk = Walk {
        registry,
        passed: HashSet::new(),
        closure: Closure::default(),
    };
    for root in roots {
        let name = base_type(root.as_ref());
        if walk.closure.contains(&name) {
            continue;
        }
        walk.visit(&name);
    }

    let closure = walk.closure;
    debug!(
        roots = roots.len(),
        resolved = closure.resolved().count(),
        missing = closure.missing().count(),
        "resolved dependency closure"
    );
    closure
}

struct Walk<'a> {
    registry: &'a Registry,
    passed: HashSet<String>,
    closure: Closure,
}

impl Walk<'_> {
    fn visit(&mut self, name: &str) {
        self.passed.insert(name.to_string());
        let ty = self.registry.get(name);

        if let Some(depends) = ty.and_then(|ty| ty.depends()) {
            for dep in depends {
                let dep = base_type(dep);
                if dep == name || self.passed.contains(&dep) || self.closure.contains(&dep) {
                    continue;
                }
                self.visit(&dep);
            }
        }

        match ty {
            Some(ty) => trace!(name, kind = ?ty.kind(), "resolved"),
            None => trace!(name, "no declaration"),
        }
        self.closure
            .entries
            .insert(name.to_string(), ty.map(|ty| ty.kind()));
    }
}
