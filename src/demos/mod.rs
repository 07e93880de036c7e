// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! The informer programs, one module per subcommand.
//!
//! Programs print their results to stdout. Event handlers write through an
//! [`Output`] so the lines they produce can be captured in tests.

pub mod create_deployment;
pub mod factory_complete;
pub mod factory_custom_index;
pub mod factory_events;
pub mod factory_lister;
pub mod factory_options;
pub mod informer_events;
pub mod informer_index;
pub mod poll_pods;
pub mod starter;

use crate::config::Config;
use crate::error::Result;
use crate::kubernetes::client::connect;
use crate::kubernetes::resources::{pod_node_name, pod_phase};
use k8s_openapi::api::core::v1::Pod;
use kube::Client;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

/// Destination of the lines printed by event handlers
pub type Output = Arc<dyn Fn(String) + Send + Sync>;

/// Print lines to stdout
pub fn stdout() -> Output {
    Arc::new(|line: String| println!("{line}"))
}

pub(crate) fn print_lines(lines: &[String]) {
    for line in lines {
        println!("{line}");
    }
}

/// A connected client plus the settings every program shares
#[derive(Clone)]
pub struct Session {
    pub client: Client,
    /// API server address from the kubeconfig
    pub host: String,
    pub resync_period: Duration,
}

impl Session {
    pub async fn connect(config: &Config) -> Result<Self> {
        let (client, host) = connect(config).await?;
        info!("Using cluster {}", host);
        Ok(Self {
            client,
            host,
            resync_period: config.resync_period,
        })
    }
}

/// Index pods by the node they are scheduled on; unscheduled pods land under ""
pub fn node_index_func(pod: &Pod) -> Vec<String> {
    vec![pod_node_name(pod)]
}

/// Index pods by `status.phase`
pub fn phase_index_func(pod: &Pod) -> Vec<String> {
    vec![pod_phase(pod)]
}

/// Render a list of strings the way the programs print them: `[a b c]`
pub(crate) fn bracketed(values: &[String]) -> String {
    format!("[{}]", values.join(" "))
}


#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::make_pod;

    #[test]
    fn test_index_funcs() {
        let pod = make_pod("web-1", "default", "node-a", "Running", &[]);
        assert_eq!(node_index_func(&pod), vec!["node-a"]);
        assert_eq!(phase_index_func(&pod), vec!["Running"]);

        let pending = make_pod("web-2", "default", "", "", &[]);
        assert_eq!(node_index_func(&pending), vec![""]);
    }

    #[test]
    fn test_bracketed() {
        assert_eq!(bracketed(&[]), "[]");
        assert_eq!(
            bracketed(&["node-a".to_string(), "node-b".to_string()]),
            "[node-a node-b]"
        );
    }
}
