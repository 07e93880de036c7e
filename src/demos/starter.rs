// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Connect to the cluster and list the pods of the default namespace.

use super::{stdout, Output, Session};
use crate::constants::DEFAULT_NAMESPACE;
use crate::error::Result;
use crate::kubernetes::resources::list_pods;
use k8s_openapi::api::core::v1::Pod;
use kube::ResourceExt;
use tracing::warn;

pub fn pod_lines(pods: &[Pod]) -> Vec<String> {
    pods.iter()
        .map(|pod| format!("Pod Name: {}", pod.name_any()))
        .collect()
}

pub async fn run(session: &Session) -> Result<()> {
    run_with_output(session, stdout()).await
}

/// Announce the cluster, then list its pods. A failed list is printed and
/// does not fail the program.
pub async fn run_with_output(session: &Session, out: Output) -> Result<()> {
    out(format!("Connected to external cluster: {}", session.host));

    match list_pods(&session.client, DEFAULT_NAMESPACE).await {
        Ok(pods) => {
            for line in pod_lines(&pods) {
                out(line);
            }
        }
        Err(e) => {
            warn!("Failed to list pods: {}", e);
            out(format!("Error: {}", e));
        }
    }
    Ok(())
}
