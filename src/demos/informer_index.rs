// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Compare a full cache scan with namespace and node index lookups.

use super::{node_index_func, print_lines, Session};
use crate::cache::{index_func, namespace_index_func, Indexer, Indexers, SharedIndexInformer};
use crate::constants::{indexes, DEFAULT_NAMESPACE};
use crate::error::{InformerError, Result};
use crate::kubernetes::resources::pod_node_name;
use clap::Args;
use k8s_openapi::api::core::v1::Pod;
use kube::runtime::watcher;
use kube::{Api, ResourceExt};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{error, warn};

#[derive(Args, Debug, Clone, Default)]
pub struct IndexArgs {
    /// Node to look up through the node index (defaults to the first known node)
    #[arg(long)]
    pub node: Option<String>,
}

pub fn pod_indexers() -> Indexers<Pod> {
    Indexers::from([
        (indexes::NAMESPACE.to_string(), index_func(namespace_index_func::<Pod>)),
        (indexes::NODE.to_string(), index_func(node_index_func)),
    ])
}

fn detail(pod: &Pod) -> String {
    format!(
        "  Name: {}, Namespace: {}, Node: {}",
        pod.name_any(),
        pod.namespace().unwrap_or_default(),
        pod_node_name(pod)
    )
}

/// Everything the program prints once the cache has synced
pub fn report(indexer: &Indexer<Pod>, node: Option<&str>) -> Vec<String> {
    let all = indexer.list();
    let mut lines = vec![format!("Found {} pods", all.len())];
    for pod in &all {
        lines.push(format!(
            "Pod: {}/{} \nNode: {}\n",
            pod.namespace().unwrap_or_default(),
            pod.name_any(),
            pod_node_name(pod)
        ));
    }

    lines.push("\n=== With Namespace Index ===".to_string());
    match indexer.by_index(indexes::NAMESPACE, DEFAULT_NAMESPACE) {
        Ok(pods) => {
            lines.push(format!("Pods in {} namespace: {}", DEFAULT_NAMESPACE, pods.len()));
            lines.push("Pod details from namespace index:".to_string());
            lines.extend(pods.iter().map(|pod| detail(pod)));
        }
        Err(e) => lines.push(format!("Error getting indexed values: {}", e)),
    }

    lines.push("\n=== With Node Index ===".to_string());
    let node = node.map(str::to_string).or_else(|| {
        indexer
            .list_index_func_values(indexes::NODE)
            .ok()
            .and_then(|nodes| nodes.into_iter().find(|n| !n.is_empty()))
    });
    match node {
        Some(node) => match indexer.by_index(indexes::NODE, &node) {
            Ok(pods) => {
                lines.push(format!("Pods on node {}: {}", node, pods.len()));
                lines.extend(pods.iter().map(|pod| {
                    format!(
                        "  Name: {}, Namespace: {}",
                        pod.name_any(),
                        pod.namespace().unwrap_or_default()
                    )
                }));
            }
            Err(e) => lines.push(format!("Error getting indexed values: {}", e)),
        },
        None => lines.push("No nodes found".to_string()),
    }

    lines
}

pub async fn run(session: &Session, args: &IndexArgs, stop: CancellationToken) -> Result<()> {
    let api: Api<Pod> = Api::all(session.client.clone());
    let informer = Arc::new(SharedIndexInformer::new(
        api,
        watcher::Config::default(),
        session.resync_period,
        pod_indexers(),
    ));
    let task = informer.start(stop.clone());

    println!("Waiting for caches to sync...");
    if !informer.wait_for_cache_sync(&stop).await {
        error!("Failed to sync caches");
        return Err(InformerError::CacheSyncFailed);
    }

    print_lines(&report(&informer.get_indexer(), args.node.as_deref()));

    stop.cancel();
    if let Some(task) = task {
        if let Err(e) = task.await {
            warn!("Pod informer task failed: {}", e);
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::demos::testing::session;
    use crate::test_utils::{make_pod, pod_list_json, MockService};

    fn indexer() -> Indexer<Pod> {
        let indexer = Indexer::new(pod_indexers());
        indexer.add(make_pod("web-1", "default", "node-b", "Running", &[]));
        indexer.add(make_pod("web-2", "default", "node-a", "Running", &[]));
        indexer.add(make_pod("pending", "default", "", "Pending", &[]));
        indexer.add(make_pod("dns", "kube-system", "node-a", "Running", &[]));
        indexer
    }

    #[test]
    fn test_report_defaults_to_first_node() {
        let lines = report(&indexer(), None);
        assert_eq!(
            lines,
            vec![
                "Found 4 pods",
                "Pod: default/pending \nNode: \n",
                "Pod: default/web-1 \nNode: node-b\n",
                "Pod: default/web-2 \nNode: node-a\n",
                "Pod: kube-system/dns \nNode: node-a\n",
                "\n=== With Namespace Index ===",
                "Pods in default namespace: 3",
                "Pod details from namespace index:",
                "  Name: pending, Namespace: default, Node: ",
                "  Name: web-1, Namespace: default, Node: node-b",
                "  Name: web-2, Namespace: default, Node: node-a",
                "\n=== With Node Index ===",
                "Pods on node node-a: 2",
                "  Name: web-2, Namespace: default",
                "  Name: dns, Namespace: kube-system",
            ]
        );
    }

    #[test]
    fn test_report_with_explicit_node() {
        let lines = report(&indexer(), Some("node-b"));
        assert!(lines.contains(&"Pods on node node-b: 1".to_string()));

        let lines = report(&indexer(), Some("node-z"));
        assert_eq!(lines.last().unwrap(), "Pods on node node-z: 0");
    }

    #[test]
    fn test_report_empty_cache() {
        let lines = report(&Indexer::new(pod_indexers()), None);
        assert_eq!(lines.first().unwrap(), "Found 0 pods");
        assert_eq!(lines.last().unwrap(), "No nodes found");
    }

    #[tokio::test]
    async fn test_run_against_mock_cluster() {
        let pods = vec![make_pod("web-1", "default", "node-a", "Running", &[])];
        let client = MockService::new()
            .on_get("/api/v1/pods", 200, &pod_list_json(&pods))
            .into_client();

        let session = session(client);
        let args = IndexArgs::default();
        let run = run(&session, &args, CancellationToken::new());
        tokio::time::timeout(std::time::Duration::from_secs(10), run)
            .await
            .expect("program did not finish")
            .unwrap();
    }
}
