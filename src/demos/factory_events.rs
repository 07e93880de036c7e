// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Several consumers sharing the informers of one factory.

use super::{stdout, Output, Session};
use crate::cache::{ResourceEventHandler, ResourceEventHandlerFuncs, SharedInformerFactory};
use crate::error::{InformerError, Result};
use k8s_openapi::api::apps::v1::Deployment;
use k8s_openapi::api::core::v1::Pod;
use kube::ResourceExt;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

/// Reports pods coming and going
pub fn pod_monitor(out: Output) -> ResourceEventHandlerFuncs<Pod> {
    let on_delete = out.clone();
    ResourceEventHandlerFuncs::new()
        .add_func(move |pod: &Pod| out(format!("[Monitor] Pod added: {}", pod.name_any())))
        .delete_func(move |pod: &Pod| {
            on_delete(format!("[Monitor] Pod deleted: {}", pod.name_any()))
        })
}

/// Reports every pod update, resyncs included
pub fn pod_update_monitor(out: Output) -> ResourceEventHandlerFuncs<Pod> {
    ResourceEventHandlerFuncs::new()
        .update_func(move |_, pod: &Pod| {
            out(format!("[PodUpdateMonitor] Pod updated: {}", pod.name_any()))
        })
}

/// A handler with its own type instead of closures
pub struct DeploymentManager {
    out: Output,
}

impl DeploymentManager {
    pub fn new(out: Output) -> Self {
        Self { out }
    }
}

impl ResourceEventHandler<Deployment> for DeploymentManager {
    fn on_add(&self, deployment: &Deployment, _is_in_initial_list: bool) {
        (self.out)(format!("[Manager] Deployment added: {}", deployment.name_any()));
    }
}

/// Register all consumers; the pod monitors share one pod informer
pub fn register(factory: &SharedInformerFactory, out: Output) {
    let pods = factory.informer::<Pod>();
    pods.add_event_handler(pod_monitor(out.clone()));

    factory
        .informer::<Deployment>()
        .add_event_handler(DeploymentManager::new(out.clone()));

    factory.informer::<Pod>().add_event_handler(pod_update_monitor(out));
}

pub async fn run(session: &Session, stop: CancellationToken) -> Result<()> {
    let factory = SharedInformerFactory::new(session.client.clone(), session.resync_period);
    register(&factory, stdout());

    factory.start(&stop);
    let synced = factory.wait_for_cache_sync(&stop).await;
    if synced.values().any(|ok| !ok) {
        error!("Failed to sync caches: {:?}", synced);
        factory.shutdown().await;
        return Err(InformerError::CacheSyncFailed);
    }
    info!("Caches synced for {:?}", synced.keys().collect::<Vec<_>>());

    stop.cancelled().await;
    factory.shutdown().await;
    Ok(())
}
