// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0
use crate::constants::DEFAULT_RESYNC_SECS;
use crate::error::{InformerError, Result};
use clap::Args;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Connection flags shared by every program
#[derive(Args, Debug, Clone, Default)]
pub struct ClientArgs {
    /// Location of the kubeconfig file (defaults to ~/.kube/config)
    #[arg(long, global = true, env = "KUBECONFIG")]
    pub kubeconfig: Option<PathBuf>,

    /// Informer resync period in seconds, 0 disables resync
    #[arg(long, global = true, env = "INFORMER_RESYNC_SECS", default_value_t = DEFAULT_RESYNC_SECS)]
    pub resync_period: u64,
}

/// Runtime configuration resolved from command line flags and environment
#[derive(Debug, Clone)]
pub struct Config {
    /// Path of the kubeconfig file used to build the client
    pub kubeconfig: PathBuf,
    pub resync_period: Duration,
}

impl Config {
    /// Resolve configuration from parsed flags
    pub fn from_args(args: &ClientArgs) -> Result<Self> {
        let kubeconfig = resolve_kubeconfig(args.kubeconfig.as_deref(), home::home_dir())?;

        Ok(Config {
            kubeconfig,
            resync_period: Duration::from_secs(args.resync_period),
        })
    }
}

/// Pick the kubeconfig path: an explicit value wins, otherwise `<home>/.kube/config`.
///
/// `KUBECONFIG` may hold a list of paths; only the first one is used.
pub fn resolve_kubeconfig(explicit: Option<&Path>, home: Option<PathBuf>) -> Result<PathBuf> {
    if let Some(path) = explicit {
        let first = std::env::split_paths(path.as_os_str())
            .find(|p| !p.as_os_str().is_empty());
        if let Some(first) = first {
            return Ok(first);
        }
    }

    let home = home.ok_or(InformerError::HomeDirNotFound)?;
    Ok(home.join(".kube").join("config"))
}
