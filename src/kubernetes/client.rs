// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Client creation from a kubeconfig file and connectivity checks

use crate::config::Config;
use crate::error::{InformerError, Result};
use k8s_openapi::api::core::v1::Namespace;
use kube::{
    api::ListParams,
    config::{KubeConfigOptions, Kubeconfig},
    Api, Client, Config as KConfig,
};
use std::path::Path;
use tracing::{debug, info, instrument};

/// Load the client configuration from the kubeconfig file named in `config`
#[instrument(skip(config), fields(kubeconfig = %config.kubeconfig.display()))]
pub async fn load_client_config(config: &Config) -> Result<KConfig> {
    let kubeconfig = read_kubeconfig(&config.kubeconfig).await?;
    client_config_from_kubeconfig(kubeconfig).await
}

/// Read a kubeconfig file. Relative certificate and key paths are resolved
/// against the directory holding the file.
pub async fn read_kubeconfig(path: &Path) -> Result<Kubeconfig> {
    let read_failed = |e: String| {
        InformerError::KubeconfigError(format!("Failed to read {}: {}", path.display(), e))
    };
    let owned = path.to_path_buf();
    tokio::task::spawn_blocking(move || Kubeconfig::read_from(&owned))
        .await
        .map_err(|e| read_failed(e.to_string()))?
        .map_err(|e| read_failed(e.to_string()))
}

/// Build a client configuration from a parsed kubeconfig
pub async fn client_config_from_kubeconfig(kubeconfig: Kubeconfig) -> Result<KConfig> {
    let client_config = KConfig::from_custom_kubeconfig(kubeconfig, &KubeConfigOptions::default())
        .await
        .map_err(|e| InformerError::KubeconfigError(format!("Failed to build config: {}", e)))?;

    debug!("Using API server {}", client_config.cluster_url);
    Ok(client_config)
}

/// Create a Kubernetes client from a loaded client configuration
pub fn create_client(client_config: KConfig) -> Result<Client> {
    Client::try_from(client_config)
        .map_err(|e| InformerError::KubeconfigError(format!("Failed to create client: {}", e)))
}

/// Load the kubeconfig and connect, returning the client and the API server host
pub async fn connect(config: &Config) -> Result<(Client, String)> {
    let client_config = load_client_config(config).await?;
    let host = cluster_host(&client_config);
    let client = create_client(client_config)?;
    Ok((client, host))
}

/// The API server address as shown to the user
pub fn cluster_host(client_config: &KConfig) -> String {
    client_config
        .cluster_url
        .to_string()
        .trim_end_matches('/')
        .to_string()
}

/// Check that the cluster answers by listing namespaces
#[instrument(skip(client))]
pub async fn verify_connection(client: &Client) -> Result<()> {
    let namespaces: Api<Namespace> = Api::all(client.clone());
    let list = namespaces.list(&ListParams::default().limit(1)).await?;
    info!("Cluster reachable, saw {} namespace(s) in first page", list.items.len());
    Ok(())
}
