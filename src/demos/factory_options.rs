// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! The ways a factory can be scoped: namespace, selectors, per-type resync.

use super::{print_lines, Session};
use crate::cache::SharedInformerFactory;
use crate::constants::{selectors, DEFAULT_NAMESPACE};
use crate::error::Result;
use crate::kubernetes::verify_connection;
use k8s_openapi::api::apps::v1::Deployment;
use k8s_openapi::api::core::v1::Pod;
use kube::Client;
use std::time::Duration;

/// Build the six factory variants, each with a title
pub fn variants(client: &Client, resync: Duration) -> Vec<(&'static str, SharedInformerFactory)> {
    vec![
        ("Default factory", SharedInformerFactory::new(client.clone(), resync)),
        (
            "Namespace scoped factory",
            SharedInformerFactory::builder(client.clone())
                .resync(resync)
                .namespace(DEFAULT_NAMESPACE)
                .build(),
        ),
        (
            "Label selector factory",
            SharedInformerFactory::builder(client.clone())
                .resync(resync)
                .tweak_list_options(|options| {
                    options.label_selector = Some(selectors::NGINX.to_string())
                })
                .build(),
        ),
        (
            "Field selector factory",
            SharedInformerFactory::builder(client.clone())
                .resync(resync)
                .tweak_list_options(|options| {
                    options.field_selector = Some(selectors::RUNNING.to_string())
                })
                .build(),
        ),
        (
            "Combined filters factory",
            SharedInformerFactory::builder(client.clone())
                .resync(resync)
                .namespace("kube-system")
                .tweak_list_options(|options| {
                    options.label_selector = Some(selectors::K8S_APP.to_string());
                    options.field_selector = Some(selectors::RUNNING.to_string());
                })
                .build(),
        ),
        (
            "Custom resync factory",
            SharedInformerFactory::builder(client.clone())
                .resync(resync)
                .custom_resync::<Pod>(Duration::from_secs(10))
                .custom_resync::<Deployment>(Duration::from_secs(60))
                .build(),
        ),
    ]
}

pub fn report(factories: &[(&str, SharedInformerFactory)]) -> Vec<String> {
    factories
        .iter()
        .map(|(title, factory)| format!("{}:\n{}", title, factory.describe()))
        .collect()
}

pub async fn run(session: &Session) -> Result<()> {
    verify_connection(&session.client).await?;
    println!("Successfully connected to cluster");

    let factories = variants(&session.client, session.resync_period);
    print_lines(&report(&factories));
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::demos::testing::session;
    use crate::test_utils::{namespace_list_json, MockService};

    #[tokio::test]
    async fn test_variants() {
        let client = MockService::new().into_client();
        let factories = variants(&client, Duration::from_secs(30));
        assert_eq!(factories.len(), 6);

        let (_, combined) = &factories[4];
        assert_eq!(combined.namespace(), Some("kube-system"));
        let options = combined.list_options();
        assert_eq!(options.label_selector.as_deref(), Some("k8s-app"));
        assert_eq!(options.field_selector.as_deref(), Some("status.phase=Running"));

        let (_, custom) = &factories[5];
        assert_eq!(custom.resync_for::<Pod>(), Duration::from_secs(10));
        assert_eq!(custom.resync_for::<Deployment>(), Duration::from_secs(60));

        let (_, plain) = &factories[0];
        assert_eq!(plain.namespace(), None);
        assert_eq!(plain.resync_for::<Pod>(), Duration::from_secs(30));
    }

    #[tokio::test]
    async fn test_report() {
        let client = MockService::new().into_client();
        let lines = report(&variants(&client, Duration::from_secs(30)));

        assert_eq!(
            lines[1],
            "Namespace scoped factory:\n\
             \x20 Namespace: default\n\
             \x20 Label selector: <none>\n\
             \x20 Field selector: <none>\n\
             \x20 Default resync: 30s\n"
        );
        assert!(lines[5].contains("  Resync for Pod: 10s\n"));
    }

    #[tokio::test]
    async fn test_run_verifies_connection() {
        let client = MockService::new()
            .on_get("/api/v1/namespaces", 200, &namespace_list_json(&["default"]))
            .into_client();
        assert!(run(&session(client)).await.is_ok());
    }
}
