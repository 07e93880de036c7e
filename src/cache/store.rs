// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Thread-safe object store with secondary indexes.
//!
//! Objects are keyed by `namespace/name` (or `name` for cluster scoped
//! objects). Each registered index function maps an object to zero or more
//! index values; the store keeps a reverse map from value to object keys so
//! lookups by value do not scan the whole cache.

use crate::error::{InformerError, Result};
use kube::Resource;
use parking_lot::RwLock;
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::Arc;

/// Maps an object to the values it is indexed under
pub type IndexFunc<K> = Arc<dyn Fn(&K) -> Vec<String> + Send + Sync>;

/// Named index functions
pub type Indexers<K> = BTreeMap<String, IndexFunc<K>>;

/// index value -> object keys
type Index = HashMap<String, BTreeSet<String>>;

/// Wrap a closure as an index function
pub fn index_func<K, F>(f: F) -> IndexFunc<K>
where
    F: Fn(&K) -> Vec<String> + Send + Sync + 'static,
{
    Arc::new(f)
}

/// Index objects by their namespace
pub fn namespace_index_func<K: Resource>(obj: &K) -> Vec<String> {
    vec![obj.meta().namespace.clone().unwrap_or_default()]
}

/// The store key of an object: `namespace/name`, or `name` when cluster scoped
pub fn meta_namespace_key<K: Resource>(obj: &K) -> String {
    let meta = obj.meta();
    let name = meta.name.as_deref().unwrap_or_default();
    match meta.namespace.as_deref() {
        Some(ns) if !ns.is_empty() => format!("{ns}/{name}"),
        _ => name.to_string(),
    }
}

struct Inner<K> {
    items: BTreeMap<String, Arc<K>>,
    indexers: Indexers<K>,
    indices: HashMap<String, Index>,
}

impl<K> Inner<K> {
    fn index_object(&mut self, key: &str, obj: &K) {
        for (name, func) in &self.indexers {
            let index = self.indices.entry(name.clone()).or_default();
            for value in func(obj) {
                index.entry(value).or_default().insert(key.to_string());
            }
        }
    }

    fn unindex_object(&mut self, key: &str, obj: &K) {
        for (name, func) in &self.indexers {
            let Some(index) = self.indices.get_mut(name) else {
                continue;
            };
            for value in func(obj) {
                if let Some(keys) = index.get_mut(&value) {
                    keys.remove(key);
                    if keys.is_empty() {
                        index.remove(&value);
                    }
                }
            }
        }
    }

    fn index(&self, name: &str) -> Result<Option<&Index>> {
        if !self.indexers.contains_key(name) {
            return Err(InformerError::IndexNotFound(name.to_string()));
        }
        Ok(self.indices.get(name))
    }
}

/// Indexed cache of objects shared between an informer and its readers.
///
/// Cloning is cheap and every clone sees the same data.
pub struct Indexer<K> {
    inner: Arc<RwLock<Inner<K>>>,
}

impl<K> Clone for Indexer<K> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<K: Resource> Default for Indexer<K> {
    fn default() -> Self {
        Self::new(Indexers::new())
    }
}

impl<K: Resource> Indexer<K> {
    pub fn new(indexers: Indexers<K>) -> Self {
        Self {
            inner: Arc::new(RwLock::new(Inner {
                items: BTreeMap::new(),
                indexers,
                indices: HashMap::new(),
            })),
        }
    }

    /// Insert or replace an object, returning the previous version
    pub fn add(&self, obj: K) -> Option<Arc<K>> {
        self.add_arc(Arc::new(obj))
    }

    /// Same as [`Indexer::add`]
    pub fn update(&self, obj: K) -> Option<Arc<K>> {
        self.add_arc(Arc::new(obj))
    }

    pub(crate) fn add_arc(&self, obj: Arc<K>) -> Option<Arc<K>> {
        let key = meta_namespace_key(obj.as_ref());
        let mut inner = self.inner.write();

        let old = inner.items.insert(key.clone(), obj.clone());
        if let Some(old) = &old {
            inner.unindex_object(&key, old);
        }
        inner.index_object(&key, &obj);
        old
    }

    /// Remove an object, returning the stored version if there was one
    pub fn delete(&self, obj: &K) -> Option<Arc<K>> {
        self.delete_by_key(&meta_namespace_key(obj))
    }

    pub fn delete_by_key(&self, key: &str) -> Option<Arc<K>> {
        let mut inner = self.inner.write();
        let old = inner.items.remove(key)?;
        inner.unindex_object(key, &old);
        Some(old)
    }

    /// Swap the whole content for `objects`, returning what was stored before
    pub fn replace(&self, objects: Vec<K>) -> BTreeMap<String, Arc<K>> {
        let items: BTreeMap<String, Arc<K>> = objects
            .into_iter()
            .map(|obj| (meta_namespace_key(&obj), Arc::new(obj)))
            .collect();

        let mut inner = self.inner.write();
        let old = std::mem::replace(&mut inner.items, items);

        inner.indices.clear();
        let current: Vec<(String, Arc<K>)> = inner
            .items
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();
        for (key, obj) in current {
            inner.index_object(&key, &obj);
        }
        old
    }

    /// All objects, ordered by key
    pub fn list(&self) -> Vec<Arc<K>> {
        self.inner.read().items.values().cloned().collect()
    }

    pub fn list_keys(&self) -> Vec<String> {
        self.inner.read().items.keys().cloned().collect()
    }

    pub fn get_by_key(&self, key: &str) -> Option<Arc<K>> {
        self.inner.read().items.get(key).cloned()
    }

    /// Look up the stored version of `obj`
    pub fn get(&self, obj: &K) -> Option<Arc<K>> {
        self.get_by_key(&meta_namespace_key(obj))
    }

    pub fn len(&self) -> usize {
        self.inner.read().items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.read().items.is_empty()
    }

    /// Objects whose index function `index_name` produced `value`
    pub fn by_index(&self, index_name: &str, value: &str) -> Result<Vec<Arc<K>>> {
        let inner = self.inner.read();
        let keys = inner.index(index_name)?.and_then(|index| index.get(value));

        Ok(keys
            .map(|keys| {
                keys.iter()
                    .filter_map(|key| inner.items.get(key).cloned())
                    .collect()
            })
            .unwrap_or_default())
    }

    /// Keys of the objects indexed under `value`
    pub fn index_keys(&self, index_name: &str, value: &str) -> Result<Vec<String>> {
        let inner = self.inner.read();
        let keys = inner.index(index_name)?.and_then(|index| index.get(value));
        Ok(keys
            .map(|keys| keys.iter().cloned().collect())
            .unwrap_or_default())
    }

    /// Every value currently present in an index, sorted
    pub fn list_index_func_values(&self, index_name: &str) -> Result<Vec<String>> {
        let inner = self.inner.read();
        let mut values: Vec<String> = inner
            .index(index_name)?
            .map(|index| index.keys().cloned().collect())
            .unwrap_or_default();
        values.sort();
        Ok(values)
    }

    /// Names of the registered indexers
    pub fn index_names(&self) -> Vec<String> {
        self.inner.read().indexers.keys().cloned().collect()
    }

    pub fn has_index(&self, index_name: &str) -> bool {
        self.inner.read().indexers.contains_key(index_name)
    }

    /// Register more indexers and index the objects already stored.
    ///
    /// Fails without changing anything if a name is already taken.
    pub fn add_indexers(&self, indexers: Indexers<K>) -> Result<()> {
        let mut inner = self.inner.write();

        let conflicts: Vec<&str> = indexers
            .keys()
            .filter(|name| inner.indexers.contains_key(name.as_str()))
            .map(String::as_str)
            .collect();
        if !conflicts.is_empty() {
            return Err(InformerError::IndexerConflict(format!(
                "indexer(s) already registered: {}",
                conflicts.join(", ")
            )));
        }

        for (name, func) in indexers {
            let mut index = Index::new();
            for (key, obj) in &inner.items {
                for value in func(obj) {
                    index.entry(value).or_default().insert(key.clone());
                }
            }
            inner.indices.insert(name.clone(), index);
            inner.indexers.insert(name, func);
        }
        Ok(())
    }
}
