// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Informer factory: hands out one shared informer per resource type and
//! starts, syncs and stops them together.

use crate::cache::informer::{SharedIndexInformer, Watchable};
use crate::cache::lister::Lister;
use crate::cache::store::{index_func, namespace_index_func, Indexers};
use crate::constants::indexes;
use futures::future::BoxFuture;
use k8s_openapi::NamespaceResourceScope;
use kube::runtime::watcher;
use kube::{Api, Client, Resource};
use parking_lot::Mutex;
use std::any::{Any, TypeId};
use std::collections::{BTreeMap, HashMap};
use std::fmt::Write;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// The selectors of the list and watch requests an informer issues
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListOptions {
    pub label_selector: Option<String>,
    pub field_selector: Option<String>,
}

impl ListOptions {
    pub fn watcher_config(&self) -> watcher::Config {
        let mut config = watcher::Config::default();
        if let Some(labels) = &self.label_selector {
            config = config.labels(labels);
        }
        if let Some(fields) = &self.field_selector {
            config = config.fields(fields);
        }
        config
    }
}

type TweakListOptionsFn = Arc<dyn Fn(&mut ListOptions) + Send + Sync>;

/// Resource types a factory can build informers for
pub trait FactoryResource: Watchable + Resource<Scope = NamespaceResourceScope> {}

impl<K> FactoryResource for K where K: Watchable + Resource<Scope = NamespaceResourceScope> {}

/// Type-erased view of an informer, so the factory can drive informers of
/// different resource types
trait InformerLifecycle: Send + Sync {
    fn kind(&self) -> String;
    fn has_started(&self) -> bool;
    fn start(self: Arc<Self>, stop: CancellationToken) -> Option<JoinHandle<()>>;
    fn wait_for_sync<'a>(&'a self, stop: &'a CancellationToken) -> BoxFuture<'a, bool>;
}

impl<K: Watchable> InformerLifecycle for SharedIndexInformer<K> {
    fn kind(&self) -> String {
        SharedIndexInformer::kind(self)
    }

    fn has_started(&self) -> bool {
        SharedIndexInformer::has_started(self)
    }

    fn start(self: Arc<Self>, stop: CancellationToken) -> Option<JoinHandle<()>> {
        SharedIndexInformer::start(&self, stop)
    }

    fn wait_for_sync<'a>(&'a self, stop: &'a CancellationToken) -> BoxFuture<'a, bool> {
        Box::pin(self.wait_for_cache_sync(stop))
    }
}

struct Registration {
    informer: Arc<dyn Any + Send + Sync>,
    lifecycle: Arc<dyn InformerLifecycle>,
}

struct Running {
    stop: CancellationToken,
    handle: JoinHandle<()>,
}

pub struct SharedInformerFactoryBuilder {
    client: Client,
    resync: Duration,
    namespace: Option<String>,
    tweak_list_options: Option<TweakListOptionsFn>,
    custom_resync: HashMap<TypeId, (String, Duration)>,
}

impl SharedInformerFactoryBuilder {
    /// Default resync period for every informer
    pub fn resync(mut self, resync: Duration) -> Self {
        self.resync = resync;
        self
    }

    /// Only watch objects in `namespace`
    pub fn namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = Some(namespace.into());
        self
    }

    /// Adjust the list options of every informer
    pub fn tweak_list_options(
        mut self,
        tweak: impl Fn(&mut ListOptions) + Send + Sync + 'static,
    ) -> Self {
        self.tweak_list_options = Some(Arc::new(tweak));
        self
    }

    /// Override the resync period for informers of type `K`
    pub fn custom_resync<K>(mut self, resync: Duration) -> Self
    where
        K: Resource<DynamicType = ()> + 'static,
    {
        self.custom_resync
            .insert(TypeId::of::<K>(), (K::kind(&()).to_string(), resync));
        self
    }

    pub fn build(self) -> SharedInformerFactory {
        SharedInformerFactory {
            client: self.client,
            default_resync: self.resync,
            namespace: self.namespace,
            tweak_list_options: self.tweak_list_options,
            custom_resync: self.custom_resync,
            informers: Mutex::new(HashMap::new()),
            running: Mutex::new(Vec::new()),
        }
    }
}

/// Hands out shared informers and manages their lifecycle.
///
/// Every informer created by the factory shares its namespace, list options
/// and resync settings, and carries the `namespace` index.
pub struct SharedInformerFactory {
    client: Client,
    default_resync: Duration,
    namespace: Option<String>,
    tweak_list_options: Option<TweakListOptionsFn>,
    custom_resync: HashMap<TypeId, (String, Duration)>,
    informers: Mutex<HashMap<TypeId, Registration>>,
    running: Mutex<Vec<Running>>,
}

impl SharedInformerFactory {
    pub fn new(client: Client, resync: Duration) -> Self {
        Self::builder(client).resync(resync).build()
    }

    pub fn builder(client: Client) -> SharedInformerFactoryBuilder {
        SharedInformerFactoryBuilder {
            client,
            resync: Duration::ZERO,
            namespace: None,
            tweak_list_options: None,
            custom_resync: HashMap::new(),
        }
    }

    /// The effective list options, after tweaking
    pub fn list_options(&self) -> ListOptions {
        let mut options = ListOptions::default();
        if let Some(tweak) = &self.tweak_list_options {
            tweak(&mut options);
        }
        options
    }

    pub fn namespace(&self) -> Option<&str> {
        self.namespace.as_deref()
    }

    /// Resync period used for informers of type `K`
    pub fn resync_for<K: 'static>(&self) -> Duration {
        self.custom_resync
            .get(&TypeId::of::<K>())
            .map(|(_, resync)| *resync)
            .unwrap_or(self.default_resync)
    }

    /// The shared informer for `K`, created on first use
    pub fn informer<K: FactoryResource>(&self) -> Arc<SharedIndexInformer<K>> {
        let mut informers = self.informers.lock();

        if let Some(registration) = informers.get(&TypeId::of::<K>()) {
            if let Ok(informer) = registration
                .informer
                .clone()
                .downcast::<SharedIndexInformer<K>>()
            {
                return informer;
            }
        }

        let api: Api<K> = match &self.namespace {
            Some(ns) => Api::namespaced(self.client.clone(), ns),
            None => Api::all(self.client.clone()),
        };
        let informer = Arc::new(SharedIndexInformer::new(
            api,
            self.list_options().watcher_config(),
            self.resync_for::<K>(),
            Indexers::from([(
                indexes::NAMESPACE.to_string(),
                index_func(namespace_index_func::<K>),
            )]),
        ));
        debug!("Registered {} informer", informer.kind());

        informers.insert(
            TypeId::of::<K>(),
            Registration {
                informer: informer.clone(),
                lifecycle: informer.clone(),
            },
        );
        informer
    }

    pub fn lister<K: FactoryResource>(&self) -> Lister<K> {
        self.informer::<K>().lister()
    }

    /// Start every registered informer that is not running yet
    pub fn start(&self, stop: &CancellationToken) {
        let lifecycles: Vec<Arc<dyn InformerLifecycle>> = self
            .informers
            .lock()
            .values()
            .map(|r| r.lifecycle.clone())
            .collect();

        let mut running = self.running.lock();
        for lifecycle in lifecycles {
            let kind = lifecycle.kind();
            let token = stop.child_token();
            if let Some(handle) = lifecycle.start(token.clone()) {
                info!("Started {} informer", kind);
                running.push(Running {
                    stop: token,
                    handle,
                });
            }
        }
    }

    /// Wait for every started informer to sync, keyed by kind.
    ///
    /// Informers registered after the last `start` are not waited on.
    pub async fn wait_for_cache_sync(&self, stop: &CancellationToken) -> BTreeMap<String, bool> {
        let lifecycles: Vec<Arc<dyn InformerLifecycle>> = self
            .informers
            .lock()
            .values()
            .filter(|r| r.lifecycle.has_started())
            .map(|r| r.lifecycle.clone())
            .collect();

        let mut synced = BTreeMap::new();
        for lifecycle in lifecycles {
            let ok = lifecycle.wait_for_sync(stop).await;
            synced.insert(lifecycle.kind(), ok);
        }
        synced
    }

    /// Stop the started informers and wait for them to finish
    pub async fn shutdown(&self) {
        let running = std::mem::take(&mut *self.running.lock());
        for r in &running {
            r.stop.cancel();
        }
        for r in running {
            if let Err(e) = r.handle.await {
                warn!("Informer task failed: {}", e);
            }
        }
        info!("Informer factory shut down");
    }

    /// Human readable summary of what the factory watches
    pub fn describe(&self) -> String {
        let options = self.list_options();
        let mut out = String::new();

        let _ = writeln!(
            out,
            "  Namespace: {}",
            self.namespace.as_deref().unwrap_or("<all namespaces>")
        );
        let _ = writeln!(
            out,
            "  Label selector: {}",
            options.label_selector.as_deref().unwrap_or("<none>")
        );
        let _ = writeln!(
            out,
            "  Field selector: {}",
            options.field_selector.as_deref().unwrap_or("<none>")
        );
        let _ = writeln!(out, "  Default resync: {}s", self.default_resync.as_secs());

        let mut custom: Vec<&(String, Duration)> = self.custom_resync.values().collect();
        custom.sort();
        for (kind, resync) in custom {
            let _ = writeln!(out, "  Resync for {}: {}s", kind, resync.as_secs());
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::labels::Selector;
    use crate::test_utils::{make_pod, pod_list_json, MockService};
    use k8s_openapi::api::apps::v1::Deployment;
    use k8s_openapi::api::core::v1::Pod;
    use kube::ResourceExt;

    fn client() -> Client {
        MockService::new().into_client()
    }

    #[tokio::test]
    async fn test_informer_is_shared_per_type() {
        let factory = SharedInformerFactory::new(client(), Duration::from_secs(30));

        let first = factory.informer::<Pod>();
        let second = factory.informer::<Pod>();
        let deployments = factory.informer::<Deployment>();

        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(first.kind(), "Pod");
        assert_eq!(deployments.kind(), "Deployment");
        assert!(first.get_indexer().has_index(indexes::NAMESPACE));
    }

    #[tokio::test]
    async fn test_custom_resync_per_type() {
        let factory = SharedInformerFactory::builder(client())
            .resync(Duration::from_secs(30))
            .custom_resync::<Pod>(Duration::from_secs(10))
            .build();

        assert_eq!(factory.informer::<Pod>().resync_period(), Duration::from_secs(10));
        assert_eq!(
            factory.informer::<Deployment>().resync_period(),
            Duration::from_secs(30)
        );
    }

    #[tokio::test]
    async fn test_tweak_list_options_reach_watcher() {
        let factory = SharedInformerFactory::builder(client())
            .tweak_list_options(|options| {
                options.label_selector = Some("app=nginx".to_string());
                options.field_selector = Some("status.phase=Running".to_string());
            })
            .build();

        let informer = factory.informer::<Pod>();
        let config = informer.watcher_config();
        assert_eq!(config.label_selector.as_deref(), Some("app=nginx"));
        assert_eq!(config.field_selector.as_deref(), Some("status.phase=Running"));
    }

    #[tokio::test]
    async fn test_describe() {
        let factory = SharedInformerFactory::builder(client())
            .namespace("kube-system")
            .tweak_list_options(|options| options.label_selector = Some("k8s-app".to_string()))
            .custom_resync::<Deployment>(Duration::from_secs(60))
            .custom_resync::<Pod>(Duration::from_secs(10))
            .build();

        assert_eq!(
            factory.describe(),
            "  Namespace: kube-system\n\
             \x20 Label selector: k8s-app\n\
             \x20 Field selector: <none>\n\
             \x20 Default resync: 0s\n\
             \x20 Resync for Deployment: 60s\n\
             \x20 Resync for Pod: 10s\n"
        );
    }

    #[tokio::test]
    async fn test_start_sync_and_shutdown() {
        let pods = vec![
            make_pod("web-1", "default", "node-a", "Running", &[("app", "nginx")]),
            make_pod("web-2", "default", "node-b", "Running", &[]),
        ];
        let client = MockService::new()
            .on_get("/api/v1/namespaces/default/pods", 200, &pod_list_json(&pods))
            .into_client();
        let factory = SharedInformerFactory::builder(client).namespace("default").build();
        let lister = factory.lister::<Pod>();

        let stop = CancellationToken::new();
        factory.start(&stop);
        // a second start leaves the running informer alone
        factory.start(&stop);

        let sync = factory.wait_for_cache_sync(&stop);
        let synced = tokio::time::timeout(Duration::from_secs(10), sync)
            .await
            .expect("cache sync timed out");
        assert_eq!(synced, BTreeMap::from([("Pod".to_string(), true)]));

        let names: Vec<String> = lister
            .list(&Selector::everything())
            .iter()
            .map(|p| p.name_any())
            .collect();
        assert_eq!(names, vec!["web-1", "web-2"]);
        let selector = "app=nginx".parse().unwrap();
        assert_eq!(lister.namespaced("default").list(&selector).len(), 1);

        factory.shutdown().await;
        assert!(factory.running.lock().is_empty());
    }

    #[tokio::test]
    async fn test_wait_for_cache_sync_skips_informers_registered_after_start() {
        let pods = vec![make_pod("web-1", "default", "node-a", "Running", &[])];
        let client = MockService::new()
            .on_get("/api/v1/pods", 200, &pod_list_json(&pods))
            .into_client();
        let factory = SharedInformerFactory::new(client, Duration::from_secs(30));
        factory.informer::<Pod>();

        let stop = CancellationToken::new();
        factory.start(&stop);
        let deployments = factory.informer::<Deployment>();

        let sync = factory.wait_for_cache_sync(&stop);
        let synced = tokio::time::timeout(Duration::from_secs(5), sync)
            .await
            .expect("cache sync waited on an informer that was never started");
        assert_eq!(synced, BTreeMap::from([("Pod".to_string(), true)]));
        assert!(!deployments.has_started());

        factory.shutdown().await;
    }
}
