// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

/// Default informer resync period in seconds
pub const DEFAULT_RESYNC_SECS: u64 = 30;

/// Namespace most of the programs query
pub const DEFAULT_NAMESPACE: &str = "default";

/// Names of the indexers registered on pod informers
pub mod indexes {
    /// Built-in index on `metadata.namespace`
    pub const NAMESPACE: &str = "namespace";
    /// Index on `spec.nodeName`
    pub const NODE: &str = "node";
    /// Index on `status.phase`
    pub const PHASE: &str = "phase";
}

/// The nginx deployment created by the `create-deployment` program
pub mod nginx {
    pub const DEPLOYMENT_NAME: &str = "nginx-deployment";
    pub const APP_LABEL: &str = "nginx-app";
    pub const CONTAINER_NAME: &str = "nginx-app";
    pub const IMAGE: &str = "nginx:1.21";
    pub const REPLICAS: i32 = 3;
}

/// Label selectors used by the lister programs
pub mod selectors {
    pub const NGINX: &str = "app=nginx";
    pub const K8S_APP: &str = "k8s-app";
    pub const RUNNING: &str = "status.phase=Running";
}
