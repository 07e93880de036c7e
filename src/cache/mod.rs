// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Informer caching layer on top of `kube::runtime::watcher`.

pub mod factory;
pub mod handler;
pub mod informer;
pub mod labels;
pub mod lister;
pub mod store;

pub use factory::{ListOptions, SharedInformerFactory};
pub use handler::{ResourceEventHandler, ResourceEventHandlerFuncs};
pub use informer::SharedIndexInformer;
pub use labels::Selector;
pub use lister::{Lister, NamespaceLister};
pub use store::{index_func, namespace_index_func, IndexFunc, Indexer, Indexers};
