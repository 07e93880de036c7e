// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Query pods and deployments through listers instead of the API server.

use super::{print_lines, Session};
use crate::cache::{Lister, Selector, SharedInformerFactory};
use crate::constants::{selectors, DEFAULT_NAMESPACE};
use crate::error::{InformerError, Result};
use crate::kubernetes::resources::deployment_replicas;
use crate::kubernetes::verify_connection;
use k8s_openapi::api::apps::v1::Deployment;
use k8s_openapi::api::core::v1::Pod;
use kube::ResourceExt;
use std::collections::BTreeMap;
use tokio_util::sync::CancellationToken;
use tracing::error;

fn count_matching(pods: &Lister<Pod>, selector: &str) -> Result<usize> {
    let selector = Selector::parse(selector)?;
    Ok(pods.list(&selector).len())
}

/// The lister queries, in the order they are printed
pub fn report(pods: &Lister<Pod>, deployments: &Lister<Deployment>) -> Vec<String> {
    let mut lines = Vec::new();

    let all = pods.list(&Selector::everything());
    lines.push(format!("Total pods (all namespaces): {}", all.len()));

    let mut per_namespace: BTreeMap<String, usize> = BTreeMap::new();
    for pod in &all {
        *per_namespace.entry(pod.namespace().unwrap_or_default()).or_default() += 1;
    }
    lines.push("Pods per namespace:".to_string());
    for (ns, count) in &per_namespace {
        lines.push(format!("  {}: {} pods", ns, count));
    }

    let default_pods = pods.namespaced(DEFAULT_NAMESPACE).list(&Selector::everything());
    lines.push(format!("Pods in {} namespace: {}", DEFAULT_NAMESPACE, default_pods.len()));

    if let Some(first) = all.first() {
        let namespace = first.namespace().unwrap_or_default();
        match pods.namespaced(&namespace).get(&first.name_any()) {
            Ok(pod) => lines.push(format!(
                "Found pod: {} in namespace: {}",
                pod.name_any(),
                pod.namespace().unwrap_or_default()
            )),
            Err(e) => lines.push(format!("Pod not found: {}", e)),
        }
    }

    match count_matching(pods, selectors::NGINX) {
        Ok(nginx) => {
            lines.push(format!("Nginx pods: {}", nginx));
            if nginx == 0 {
                if let Ok(system) = count_matching(pods, selectors::K8S_APP) {
                    lines.push(format!("Pods with k8s-app label: {}", system));
                }
            }
        }
        Err(e) => {
            lines.push(format!("Error: {}", e));
            return lines;
        }
    }

    let all_deployments = deployments.list(&Selector::everything());
    lines.push(format!("Total deployments (all namespaces): {}", all_deployments.len()));
    if !all_deployments.is_empty() {
        lines.push("Deployments:".to_string());
        for deployment in &all_deployments {
            lines.push(format!(
                "  {}/{} (replicas: {})",
                deployment.namespace().unwrap_or_default(),
                deployment.name_any(),
                deployment_replicas(deployment)
            ));
        }
    }

    lines
}

pub async fn run(session: &Session, stop: CancellationToken) -> Result<()> {
    verify_connection(&session.client).await?;
    println!("Successfully connected to cluster");

    let factory = SharedInformerFactory::new(session.client.clone(), session.resync_period);
    let pods = factory.lister::<Pod>();
    let deployments = factory.lister::<Deployment>();

    factory.start(&stop);
    println!("Waiting for cache sync...");
    let synced = factory.wait_for_cache_sync(&stop).await;
    if synced.values().any(|ok| !ok) {
        error!("Failed to sync caches: {:?}", synced);
        factory.shutdown().await;
        return Err(InformerError::CacheSyncFailed);
    }
    println!("Cache sync completed!");

    print_lines(&report(&pods, &deployments));
    println!("Lister demonstration completed!");

    factory.shutdown().await;
    Ok(())
}
