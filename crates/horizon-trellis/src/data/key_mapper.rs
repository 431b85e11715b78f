//! Bidirectional mapping between backend item identity and client keys.
//!
//! The browser never sees backend items directly; it correlates rows via
//! short opaque string keys. [`KeyMapper`] owns the key ↔ identity map for
//! one [`DataCommunicator`](super::DataCommunicator): keys are allocated on
//! first sight of an identity, reused while that identity stays mapped, and
//! dropped when items leave the active range.
//!
//! Identity is computed by an [`IdentifierProvider`]; the default renders the
//! item's `Hash`. Items whose identity-relevant fields mutate after being
//! keyed violate the contract: identity must be stable for the life of a
//! key.

use std::collections::HashMap;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use crate::data::query::{IdentifierProvider, ItemId};

/// Returns the default identifier provider, deriving identity from the
/// item's `Hash` implementation.
pub fn default_identifier_provider<T: Hash>() -> IdentifierProvider<T> {
    Arc::new(|item: &T| {
        let mut hasher = std::hash::DefaultHasher::new();
        item.hash(&mut hasher);
        format!("{:016x}", hasher.finish())
    })
}

/// Maps backend item identities to client-visible keys and back.
///
/// Keys are decimal strings from a monotonic counter, unique for the life of
/// the mapper; a key is never handed out for a second identity. Reverse
/// lookup serves the freshest item copy seen for that identity, so
/// re-fetched rows keep answering under their original key.
pub struct KeyMapper<T> {
    identifier: IdentifierProvider<T>,
    id_to_key: HashMap<ItemId, String>,
    key_to_item: HashMap<String, (ItemId, T)>,
    next_key: u64,
}

impl<T: Clone + Hash> KeyMapper<T> {
    /// Creates a mapper using the default `Hash`-derived identity.
    pub fn new() -> Self {
        Self::with_identifier_provider(default_identifier_provider())
    }
}

impl<T: Clone + Hash> Default for KeyMapper<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Clone> KeyMapper<T> {
    /// Creates a mapper with an explicit identifier provider.
    pub fn with_identifier_provider(identifier: IdentifierProvider<T>) -> Self {
        Self {
            identifier,
            id_to_key: HashMap::new(),
            key_to_item: HashMap::new(),
            next_key: 1,
        }
    }

    /// Returns the key for the item's identity, allocating one on first use.
    ///
    /// The stored item copy is replaced on every call, so the mapper always
    /// serves the most recently seen state of the item.
    pub fn key(&mut self, item: &T) -> String {
        let id = (self.identifier)(item);
        if let Some(key) = self.id_to_key.get(&id) {
            let key = key.clone();
            self.key_to_item
                .insert(key.clone(), (id, item.clone()));
            return key;
        }

        let key = self.next_key.to_string();
        self.next_key += 1;
        self.id_to_key.insert(id.clone(), key.clone());
        self.key_to_item.insert(key.clone(), (id, item.clone()));
        tracing::trace!(
            target: horizon_trellis_core::logging::targets::KEY_MAPPER,
            key,
            "allocated key"
        );
        key
    }

    /// Reverse lookup: the item mapped to `key`, or `None` for unknown or
    /// expired keys.
    ///
    /// An unknown key is not an error: the client routinely references keys
    /// for items that have since been dropped server-side.
    pub fn get(&self, key: &str) -> Option<&T> {
        self.key_to_item.get(key).map(|(_, item)| item)
    }

    /// Whether the item's identity is currently mapped.
    pub fn has(&self, item: &T) -> bool {
        self.id_to_key.contains_key(&(self.identifier)(item))
    }

    /// The key of the item's identity, if currently mapped.
    ///
    /// Unlike [`key`](Self::key) this never allocates and leaves the stored
    /// copy untouched.
    pub fn key_of(&self, item: &T) -> Option<String> {
        self.id_to_key.get(&(self.identifier)(item)).cloned()
    }

    /// The identifier provider currently in use.
    pub fn identifier_provider(&self) -> IdentifierProvider<T> {
        self.identifier.clone()
    }

    /// Replaces the stored copy for an already-mapped identity.
    ///
    /// Returns the item's key, or `None` if the identity is not mapped.
    pub fn refresh(&mut self, item: &T) -> Option<String> {
        let id = (self.identifier)(item);
        let key = self.id_to_key.get(&id)?.clone();
        self.key_to_item.insert(key.clone(), (id, item.clone()));
        Some(key)
    }

    /// Removes the mapping for the item's identity, if any.
    pub fn remove(&mut self, item: &T) {
        let id = (self.identifier)(item);
        if let Some(key) = self.id_to_key.remove(&id) {
            self.key_to_item.remove(&key);
        }
    }

    /// Removes the mapping behind `key`, if any.
    pub fn remove_key(&mut self, key: &str) {
        if let Some((id, _)) = self.key_to_item.remove(key) {
            self.id_to_key.remove(&id);
        }
    }

    /// Drops every mapping. Allocated keys are not reused afterwards.
    pub fn remove_all(&mut self) {
        self.id_to_key.clear();
        self.key_to_item.clear();
    }

    /// Replaces the identifier provider.
    ///
    /// Identity semantics change with the provider, so every prior mapping
    /// is invalidated.
    pub fn set_identifier_provider(&mut self, identifier: IdentifierProvider<T>) {
        self.identifier = identifier;
        self.remove_all();
    }

    /// Number of live mappings.
    pub fn len(&self) -> usize {
        self.key_to_item.len()
    }

    /// Whether no mappings are live.
    pub fn is_empty(&self) -> bool {
        self.key_to_item.is_empty()
    }
}
