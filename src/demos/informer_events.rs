// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! A single pod informer with two handlers sharing its watch.

use super::{stdout, Output, Session};
use crate::cache::{Indexers, ResourceEventHandlerFuncs, SharedIndexInformer};
use crate::error::{InformerError, Result};
use crate::kubernetes::resources::object_ref;
use k8s_openapi::api::core::v1::Pod;
use kube::runtime::watcher;
use kube::Api;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

/// Prints every add, update and delete
pub fn pod_event_printer(out: Output) -> ResourceEventHandlerFuncs<Pod> {
    let (on_add, on_update, on_delete) = (out.clone(), out.clone(), out);
    ResourceEventHandlerFuncs::new()
        .add_func(move |pod: &Pod| on_add(format!("(+) Pod added: {}", object_ref(pod))))
        .update_func(move |_, new: &Pod| {
            on_update(format!("(*) Pod updated: {}", object_ref(new)))
        })
        .delete_func(move |pod: &Pod| {
            on_delete(format!("(-) Pod deleted: {}", object_ref(pod)))
        })
}

/// A second consumer of the same informer, only interested in adds
pub fn second_controller(out: Output) -> ResourceEventHandlerFuncs<Pod> {
    ResourceEventHandlerFuncs::new()
        .add_func(move |pod: &Pod| {
            out(format!("[SECOND-CONTROLLER] Also saw pod: {}", object_ref(pod)))
        })
}

pub async fn run(session: &Session, stop: CancellationToken) -> Result<()> {
    let api: Api<Pod> = Api::all(session.client.clone());
    let informer = Arc::new(SharedIndexInformer::new(
        api,
        watcher::Config::default(),
        session.resync_period,
        Indexers::new(),
    ));
    let task = informer.start(stop.clone());

    println!("Waiting for caches to sync...");
    if !informer.wait_for_cache_sync(&stop).await {
        error!("Failed to sync caches");
        return Err(InformerError::CacheSyncFailed);
    }

    informer.add_event_handler(pod_event_printer(stdout()));
    informer.add_event_handler(second_controller(stdout()));

    stop.cancelled().await;
    info!("Shutting down pod informer");
    if let Some(task) = task {
        if let Err(e) = task.await {
            warn!("Pod informer task failed: {}", e);
        }
    }
    Ok(())
}
