// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Read-only queries over an informer's cache.

use crate::cache::labels::Selector;
use crate::cache::store::Indexer;
use crate::constants::indexes;
use crate::error::{InformerError, Result};
use kube::Resource;
use std::collections::BTreeMap;
use std::sync::Arc;

fn matches<K: Resource>(selector: &Selector, obj: &K) -> bool {
    if selector.is_everything() {
        return true;
    }
    match &obj.meta().labels {
        Some(labels) => selector.matches(labels),
        None => selector.matches(&BTreeMap::new()),
    }
}

/// Lists cached objects across all namespaces
pub struct Lister<K> {
    indexer: Indexer<K>,
}

impl<K> Clone for Lister<K> {
    fn clone(&self) -> Self {
        Self {
            indexer: self.indexer.clone(),
        }
    }
}

impl<K: Resource<DynamicType = ()>> Lister<K> {
    pub fn new(indexer: Indexer<K>) -> Self {
        Self { indexer }
    }

    pub fn list(&self, selector: &Selector) -> Vec<Arc<K>> {
        self.indexer
            .list()
            .into_iter()
            .filter(|obj| matches(selector, obj.as_ref()))
            .collect()
    }

    /// Restrict queries to one namespace
    pub fn namespaced(&self, namespace: &str) -> NamespaceLister<K> {
        NamespaceLister {
            indexer: self.indexer.clone(),
            namespace: namespace.to_string(),
        }
    }
}

/// Lists and gets cached objects within a single namespace
pub struct NamespaceLister<K> {
    indexer: Indexer<K>,
    namespace: String,
}

impl<K: Resource<DynamicType = ()>> NamespaceLister<K> {
    pub fn list(&self, selector: &Selector) -> Vec<Arc<K>> {
        let candidates = match self.indexer.by_index(indexes::NAMESPACE, &self.namespace) {
            Ok(objs) => objs,
            // no namespace index registered, scan the cache
            Err(_) => self
                .indexer
                .list()
                .into_iter()
                .filter(|obj| obj.meta().namespace.as_deref() == Some(self.namespace.as_str()))
                .collect(),
        };

        candidates
            .into_iter()
            .filter(|obj| matches(selector, obj.as_ref()))
            .collect()
    }

    pub fn get(&self, name: &str) -> Result<Arc<K>> {
        self.indexer
            .get_by_key(&format!("{}/{}", self.namespace, name))
            .ok_or_else(|| InformerError::NotFound {
                kind: K::plural(&()).to_string(),
                key: name.to_string(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::store::{index_func, namespace_index_func, Indexers};
    use crate::test_utils::make_pod;
    use k8s_openapi::api::core::v1::Pod;
    use kube::ResourceExt;

    fn names(pods: &[Arc<Pod>]) -> Vec<String> {
        pods.iter().map(|p| p.name_any()).collect()
    }

    fn populated(indexers: Indexers<Pod>) -> Indexer<Pod> {
        let indexer = Indexer::new(indexers);
        indexer.add(make_pod("web-1", "default", "node-a", "Running", &[("app", "nginx")]));
        indexer.add(make_pod("web-2", "default", "node-b", "Pending", &[("app", "nginx")]));
        indexer.add(make_pod("db", "default", "node-a", "Running", &[("app", "postgres")]));
        let dns_labels = [("k8s-app", "kube-dns")];
        indexer.add(make_pod("dns", "kube-system", "node-a", "Running", &dns_labels));
        indexer
    }

    #[test]
    fn test_list_everything() {
        let lister = Lister::new(populated(Indexers::new()));
        assert_eq!(
            names(&lister.list(&Selector::everything())),
            vec!["db", "web-1", "web-2", "dns"]
        );
    }

    #[test]
    fn test_list_with_selector() {
        let lister = Lister::new(populated(Indexers::new()));
        let nginx = Selector::parse("app=nginx").unwrap();
        assert_eq!(names(&lister.list(&nginx)), vec!["web-1", "web-2"]);

        let k8s_app = Selector::parse("k8s-app").unwrap();
        assert_eq!(names(&lister.list(&k8s_app)), vec!["dns"]);

        let not_nginx = Selector::parse("app!=nginx").unwrap();
        assert_eq!(names(&lister.list(&not_nginx)), vec!["db", "dns"]);
    }

    #[test]
    fn test_namespaced_list_with_and_without_index() {
        let with_index = Lister::new(populated(Indexers::from([(
            indexes::NAMESPACE.to_string(),
            index_func(namespace_index_func::<Pod>),
        )])));
        let without_index = Lister::new(populated(Indexers::new()));

        for lister in [with_index, without_index] {
            let default = lister.namespaced("default");
            assert_eq!(
                names(&default.list(&Selector::everything())),
                vec!["db", "web-1", "web-2"]
            );
            assert!(lister.namespaced("missing").list(&Selector::everything()).is_empty());
        }
    }

    #[test]
    fn test_namespaced_get() {
        let lister = Lister::new(populated(Indexers::new()));
        let pod = lister.namespaced("kube-system").get("dns").unwrap();
        assert_eq!(pod.name_any(), "dns");

        let err = lister.namespaced("default").get("dns").unwrap_err();
        assert_eq!(err.to_string(), "pods \"dns\" not found");
    }
}
