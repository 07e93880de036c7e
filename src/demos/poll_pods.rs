// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Poll the API server for pod phases, the way one would without an informer.
//!
//! Every round trip lists all pods again, which is what informers avoid.

use super::{print_lines, Session};
use crate::constants::DEFAULT_NAMESPACE;
use crate::error::Result;
use crate::kubernetes::resources::{list_pods, pod_phase};
use clap::Args;
use k8s_openapi::api::core::v1::Pod;
use kube::ResourceExt;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

#[derive(Args, Debug, Clone)]
pub struct PollArgs {
    /// Seconds to wait between polls
    #[arg(long, default_value_t = 2)]
    pub interval: u64,

    /// Stop after this many polls
    #[arg(long)]
    pub iterations: Option<u64>,
}

pub fn report(pods: &[Pod]) -> Vec<String> {
    let mut lines: Vec<String> = pods
        .iter()
        .map(|pod| format!("{}: {}", pod.name_any(), pod_phase(pod)))
        .collect();
    lines.push("---".to_string());
    lines
}

/// Poll until `stop` fires or the iteration limit is reached; returns the
/// number of polls done
pub async fn run(session: &Session, args: &PollArgs, stop: &CancellationToken) -> Result<u64> {
    let mut polls = 0;

    loop {
        match list_pods(&session.client, DEFAULT_NAMESPACE).await {
            Ok(pods) => print_lines(&report(&pods)),
            Err(e) => warn!("Failed to list pods: {}", e),
        }
        polls += 1;

        if args.iterations.is_some_and(|max| polls >= max) {
            debug!("Reached {} polls", polls);
            break;
        }

        tokio::select! {
            _ = stop.cancelled() => break,
            _ = tokio::time::sleep(Duration::from_secs(args.interval)) => {}
        }
    }

    Ok(polls)
}
