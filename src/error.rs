// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0
use thiserror::Error;

#[derive(Error, Debug)]
pub enum InformerError {
    #[error("Kubernetes API error: {0}")]
    KubeError(#[from] kube::Error),

    #[error("Failed to load kubeconfig: {0}")]
    KubeconfigError(String),

    #[error("Could not determine home directory")]
    HomeDirNotFound,

    #[error("Invalid label selector: {0}")]
    InvalidSelector(String),

    #[error("Index with name {0} does not exist")]
    IndexNotFound(String),

    #[error("Indexer conflict: {0}")]
    IndexerConflict(String),

    #[error("Informer for {0} has already started")]
    AlreadyStarted(String),

    #[error("{kind} \"{key}\" not found")]
    NotFound { kind: String, key: String },

    #[error("Failed to sync caches")]
    CacheSyncFailed,
}

pub type Result<T> = std::result::Result<T, InformerError>;
