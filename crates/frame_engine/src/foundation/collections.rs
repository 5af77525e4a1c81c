//! Specialized collection types
//!
//! Resource registries hand out [`SlotMap`] keys instead of references, so a
//! render item can point at its material or geometry without borrowing the
//! registry. A name index sits beside the arena for setup-time lookups like
//! `registry.id("water")`.

use std::collections::HashMap;

pub use slotmap::{Key, SlotMap};

use crate::render::error::{RenderError, RenderResult};

/// Name-indexed arena of long-lived resources.
///
/// Registries only grow: resources are registered once during setup and live
/// until the registry is dropped. Values are kept in insertion order, which
/// keeps per-frame upload passes deterministic.
#[derive(Debug)]
pub struct Registry<K: Key, V> {
    kind: &'static str,
    slots: SlotMap<K, usize>,
    names: HashMap<String, K>,
    keys: Vec<K>,
    values: Vec<V>,
}

impl<K: Key, V> Registry<K, V> {
    /// Create an empty registry. `kind` names the resource in error messages.
    pub fn new(kind: &'static str) -> Self {
        Self {
            kind,
            slots: SlotMap::with_key(),
            names: HashMap::new(),
            keys: Vec::new(),
            values: Vec::new(),
        }
    }

    /// Register a resource under a unique name
    pub fn insert(&mut self, name: impl Into<String>, value: V) -> RenderResult<K> {
        let name = name.into();
        if self.names.contains_key(&name) {
            return Err(RenderError::DuplicateResource { kind: self.kind, name });
        }

        let key = self.slots.insert(self.values.len());
        self.names.insert(name, key);
        self.keys.push(key);
        self.values.push(value);
        Ok(key)
    }

    /// Look up a handle by name
    pub fn id(&self, name: &str) -> RenderResult<K> {
        self.names
            .get(name)
            .copied()
            .ok_or_else(|| RenderError::MissingResource {
                kind: self.kind,
                name: name.to_string(),
            })
    }

    /// Borrow a resource by handle
    pub fn get(&self, key: K) -> RenderResult<&V> {
        let index = self.index_of(key)?;
        Ok(&self.values[index])
    }

    /// Mutably borrow a resource by handle
    pub fn get_mut(&mut self, key: K) -> RenderResult<&mut V> {
        let index = self.index_of(key)?;
        Ok(&mut self.values[index])
    }

    /// Position of a resource in insertion order
    pub fn index_of(&self, key: K) -> RenderResult<usize> {
        self.slots
            .get(key)
            .copied()
            .ok_or(RenderError::InvalidHandle { kind: self.kind })
    }

    /// Number of registered resources
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Whether the registry is empty
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Iterate in insertion order
    pub fn iter(&self) -> impl Iterator<Item = (K, &V)> {
        self.keys.iter().copied().zip(self.values.iter())
    }

    /// Mutably iterate in insertion order
    pub fn iter_mut(&mut self) -> impl Iterator<Item = (K, &mut V)> {
        self.keys.iter().copied().zip(self.values.iter_mut())
    }
}
