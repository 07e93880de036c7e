// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Indexers, handlers and listers on one factory.

use super::{bracketed, node_index_func, print_lines, stdout, Output, Session};
use crate::cache::{
    index_func, Indexer, Indexers, Lister, ResourceEventHandlerFuncs, Selector,
    SharedInformerFactory,
};
use crate::constants::{indexes, selectors, DEFAULT_NAMESPACE};
use crate::error::{InformerError, Result};
use k8s_openapi::api::core::v1::Pod;
use kube::ResourceExt;
use tokio_util::sync::CancellationToken;
use tracing::error;

pub fn pod_added_printer(out: Output) -> ResourceEventHandlerFuncs<Pod> {
    ResourceEventHandlerFuncs::new()
        .add_func(move |pod: &Pod| out(format!("Pod added: {}", pod.name_any())))
}

/// Register the node index and the add handler on the factory's pod informer
pub fn setup(factory: &SharedInformerFactory, out: Output) -> Result<()> {
    let pods = factory.informer::<Pod>();
    pods.add_indexers(Indexers::from([(
        indexes::NODE.to_string(),
        index_func(node_index_func),
    )]))?;
    pods.add_event_handler(pod_added_printer(out));
    Ok(())
}

pub fn lister_report(pods: &Lister<Pod>) -> Vec<String> {
    let default_pods = pods.namespaced(DEFAULT_NAMESPACE).list(&Selector::everything());
    let nginx = Selector::parse(selectors::NGINX)
        .map(|selector| pods.list(&selector).len())
        .unwrap_or_default();

    vec![
        format!("Default namespace pods: {}", default_pods.len()),
        format!("Nginx pods: {}", nginx),
    ]
}

pub fn index_report(indexer: &Indexer<Pod>) -> Vec<String> {
    let nodes = indexer.list_index_func_values(indexes::NODE).unwrap_or_default();
    let mut lines = vec![format!("Nodes: {}", bracketed(&nodes))];
    if let Some(node) = nodes.first() {
        let on_node = indexer
            .by_index(indexes::NODE, node)
            .map(|pods| pods.len())
            .unwrap_or_default();
        lines.push(format!("Pods on {}: {}", node, on_node));
    }
    lines
}

pub async fn run(session: &Session, stop: CancellationToken) -> Result<()> {
    let factory = SharedInformerFactory::new(session.client.clone(), session.resync_period);
    setup(&factory, stdout())?;

    factory.start(&stop);
    let synced = factory.wait_for_cache_sync(&stop).await;
    if synced.values().any(|ok| !ok) {
        error!("Failed to sync caches: {:?}", synced);
        factory.shutdown().await;
        return Err(InformerError::CacheSyncFailed);
    }

    print_lines(&lister_report(&factory.lister::<Pod>()));
    print_lines(&index_report(&factory.informer::<Pod>().get_indexer()));

    stop.cancelled().await;
    factory.shutdown().await;
    Ok(())
}
