// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Callbacks invoked by an informer when its cache changes.

/// Receives notifications about objects entering, changing in, and leaving
/// an informer's cache. All methods default to doing nothing.
pub trait ResourceEventHandler<K>: Send + Sync {
    /// `is_in_initial_list` is true for objects delivered as part of the
    /// first list, or replayed to a handler registered after sync.
    fn on_add(&self, _obj: &K, _is_in_initial_list: bool) {}

    /// Also called with `old == new` on periodic resync.
    fn on_update(&self, _old: &K, _new: &K) {}

    fn on_delete(&self, _obj: &K) {}
}

type AddFn<K> = Box<dyn Fn(&K) + Send + Sync>;
type UpdateFn<K> = Box<dyn Fn(&K, &K) + Send + Sync>;
type DeleteFn<K> = Box<dyn Fn(&K) + Send + Sync>;

/// A handler assembled from optional closures
pub struct ResourceEventHandlerFuncs<K> {
    add: Option<AddFn<K>>,
    update: Option<UpdateFn<K>>,
    delete: Option<DeleteFn<K>>,
}

impl<K> Default for ResourceEventHandlerFuncs<K> {
    fn default() -> Self {
        Self {
            add: None,
            update: None,
            delete: None,
        }
    }
}

impl<K> ResourceEventHandlerFuncs<K> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_func(mut self, f: impl Fn(&K) + Send + Sync + 'static) -> Self {
        self.add = Some(Box::new(f));
        self
    }

    pub fn update_func(mut self, f: impl Fn(&K, &K) + Send + Sync + 'static) -> Self {
        self.update = Some(Box::new(f));
        self
    }

    pub fn delete_func(mut self, f: impl Fn(&K) + Send + Sync + 'static) -> Self {
        self.delete = Some(Box::new(f));
        self
    }
}

impl<K> ResourceEventHandler<K> for ResourceEventHandlerFuncs<K> {
    fn on_add(&self, obj: &K, _is_in_initial_list: bool) {
        if let Some(f) = &self.add {
            f(obj);
        }
    }

    fn on_update(&self, old: &K, new: &K) {
        if let Some(f) = &self.update {
            f(old, new);
        }
    }

    fn on_delete(&self, obj: &K) {
        if let Some(f) = &self.delete {
            f(obj);
        }
    }
}
