// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Add node and phase indexes to a factory informer and query them.

use super::{bracketed, node_index_func, phase_index_func, print_lines, Session};
use crate::cache::{index_func, Indexer, Indexers, SharedInformerFactory};
use crate::constants::indexes;
use crate::error::{InformerError, Result};
use crate::kubernetes::verify_connection;
use k8s_openapi::api::core::v1::Pod;
use kube::ResourceExt;
use tokio_util::sync::CancellationToken;
use tracing::error;

pub fn custom_indexers() -> Indexers<Pod> {
    Indexers::from([
        (indexes::NODE.to_string(), index_func(node_index_func)),
        (indexes::PHASE.to_string(), index_func(phase_index_func)),
    ])
}

pub fn report(indexer: &Indexer<Pod>) -> Vec<String> {
    let mut lines = Vec::new();

    let nodes = indexer.list_index_func_values(indexes::NODE).unwrap_or_default();
    lines.push(format!("Available nodes: {}", bracketed(&nodes)));

    match nodes.first() {
        Some(node) => match indexer.by_index(indexes::NODE, node) {
            Ok(pods) => {
                lines.push(format!("Pods on node '{}': {}", node, pods.len()));
                for pod in &pods {
                    lines.push(format!(
                        "  - {} (namespace: {})",
                        pod.name_any(),
                        pod.namespace().unwrap_or_default()
                    ));
                }
            }
            Err(e) => lines.push(format!("Error: {}", e)),
        },
        None => lines.push("No nodes found".to_string()),
    }

    match indexer.by_index(indexes::PHASE, "Running") {
        Ok(running) => lines.push(format!("Running pods: {}", running.len())),
        Err(e) => lines.push(format!("Error: {}", e)),
    }

    lines
}

pub async fn run(session: &Session, stop: CancellationToken) -> Result<()> {
    verify_connection(&session.client).await?;
    println!("Successfully connected to cluster");

    let factory = SharedInformerFactory::new(session.client.clone(), session.resync_period);
    let pods = factory.informer::<Pod>();
    pods.add_indexers(custom_indexers())?;

    factory.start(&stop);
    println!("Waiting for cache sync...");
    let synced = factory.wait_for_cache_sync(&stop).await;
    if synced.values().any(|ok| !ok) {
        error!("Failed to sync caches: {:?}", synced);
        factory.shutdown().await;
        return Err(InformerError::CacheSyncFailed);
    }
    println!("Cache sync completed!");

    print_lines(&report(&pods.get_indexer()));

    factory.shutdown().await;
    Ok(())
}
