// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Pod and Deployment helpers shared by the programs

use crate::constants::nginx;
use crate::error::Result;
use k8s_openapi::api::apps::v1::{Deployment, DeploymentSpec};
use k8s_openapi::api::core::v1::{Container, Pod, PodSpec, PodTemplateSpec};
use k8s_openapi::apimachinery::pkg::apis::meta::v1::LabelSelector;
use kube::{
    api::{ListParams, ObjectMeta, PostParams},
    Api, Client, ResourceExt,
};
use std::collections::BTreeMap;
use tracing::{debug, instrument};

/// `namespace/name` of an object
pub fn object_ref<K: ResourceExt>(obj: &K) -> String {
    match obj.namespace() {
        Some(ns) => format!("{}/{}", ns, obj.name_any()),
        None => obj.name_any(),
    }
}

/// The node a pod is scheduled on, empty when unscheduled
pub fn pod_node_name(pod: &Pod) -> String {
    pod.spec
        .as_ref()
        .and_then(|s| s.node_name.clone())
        .unwrap_or_default()
}

/// The pod phase, empty when the status is not populated yet
pub fn pod_phase(pod: &Pod) -> String {
    pod.status
        .as_ref()
        .and_then(|s| s.phase.clone())
        .unwrap_or_default()
}

/// Desired replicas of a deployment; the API server defaults an unset value to 1
pub fn deployment_replicas(deployment: &Deployment) -> i32 {
    deployment
        .spec
        .as_ref()
        .and_then(|s| s.replicas)
        .unwrap_or(1)
}

/// The nginx Deployment used by the `create-deployment` program
pub fn nginx_deployment(namespace: &str) -> Deployment {
    let labels = BTreeMap::from([("app".to_string(), nginx::APP_LABEL.to_string())]);

    Deployment {
        metadata: ObjectMeta {
            name: Some(nginx::DEPLOYMENT_NAME.to_string()),
            namespace: Some(namespace.to_string()),
            ..Default::default()
        },
        spec: Some(DeploymentSpec {
            replicas: Some(nginx::REPLICAS),
            selector: LabelSelector {
                match_labels: Some(labels.clone()),
                ..Default::default()
            },
            template: PodTemplateSpec {
                metadata: Some(ObjectMeta {
                    labels: Some(labels),
                    ..Default::default()
                }),
                spec: Some(PodSpec {
                    containers: vec![Container {
                        name: nginx::CONTAINER_NAME.to_string(),
                        image: Some(nginx::IMAGE.to_string()),
                        ..Default::default()
                    }],
                    ..Default::default()
                }),
            },
            ..Default::default()
        }),
        ..Default::default()
    }
}

/// Create a deployment and return what the API server stored
#[instrument(skip(client, deployment), fields(deployment = %deployment.name_any()))]
pub async fn create_deployment(
    client: &Client,
    namespace: &str,
    deployment: &Deployment,
) -> Result<Deployment> {
    let deployments: Api<Deployment> = Api::namespaced(client.clone(), namespace);
    let created = deployments.create(&PostParams::default(), deployment).await?;
    debug!("Deployment created with uid {:?}", created.metadata.uid);
    Ok(created)
}

/// List the pods of one namespace straight from the API server
#[instrument(skip(client))]
pub async fn list_pods(client: &Client, namespace: &str) -> Result<Vec<Pod>> {
    let pods: Api<Pod> = Api::namespaced(client.clone(), namespace);
    Ok(pods.list(&ListParams::default()).await?.items)
}
