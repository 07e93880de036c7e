// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Shared informer: one watch per resource type feeding an indexed cache and
//! any number of event handlers.

use crate::cache::handler::ResourceEventHandler;
use crate::cache::lister::Lister;
use crate::cache::store::{Indexer, Indexers};
use crate::error::{InformerError, Result};
use futures::{Stream, StreamExt};
use kube::runtime::{watcher, WatchStreamExt};
use kube::{Api, Resource};
use parking_lot::RwLock;
use serde::de::DeserializeOwned;
use std::fmt::Debug;
use std::pin::pin;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, Interval, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, warn};

/// Bounds a type needs to be watched and cached
pub trait Watchable:
    Resource<DynamicType = ()> + Clone + DeserializeOwned + Debug + Send + Sync + 'static
{
}

impl<K> Watchable for K where
    K: Resource<DynamicType = ()> + Clone + DeserializeOwned + Debug + Send + Sync + 'static
{
}

type Handlers<K> = RwLock<Vec<Arc<dyn ResourceEventHandler<K>>>>;

/// Watches one resource type and keeps an indexed local cache of it.
///
/// Handlers registered on the informer all share its single watch.
pub struct SharedIndexInformer<K: Watchable> {
    api: Api<K>,
    watcher_config: watcher::Config,
    resync_period: Duration,
    indexer: Indexer<K>,
    handlers: Handlers<K>,
    started: AtomicBool,
    synced: watch::Sender<bool>,
}

impl<K: Watchable> SharedIndexInformer<K> {
    pub fn new(
        api: Api<K>,
        watcher_config: watcher::Config,
        resync_period: Duration,
        indexers: Indexers<K>,
    ) -> Self {
        let (synced, _) = watch::channel(false);
        Self {
            api,
            watcher_config,
            resync_period,
            indexer: Indexer::new(indexers),
            handlers: RwLock::new(Vec::new()),
            started: AtomicBool::new(false),
            synced,
        }
    }

    /// Kind of the watched resource, for logs
    pub fn kind(&self) -> String {
        K::kind(&()).to_string()
    }

    pub fn resync_period(&self) -> Duration {
        self.resync_period
    }

    pub fn watcher_config(&self) -> &watcher::Config {
        &self.watcher_config
    }

    /// Register a handler.
    ///
    /// A handler added after the cache synced is first told about every
    /// cached object through `on_add(obj, true)`.
    pub fn add_event_handler(&self, handler: impl ResourceEventHandler<K> + 'static) {
        let handler: Arc<dyn ResourceEventHandler<K>> = Arc::new(handler);
        let mut handlers = self.handlers.write();

        if self.has_synced() {
            let cached = self.indexer.list();
            debug!("Replaying {} cached {} objects to new handler", cached.len(), self.kind());
            for obj in &cached {
                handler.on_add(obj, true);
            }
        }
        handlers.push(handler);
    }

    /// Add indexers; only possible before the informer starts
    pub fn add_indexers(&self, indexers: Indexers<K>) -> Result<()> {
        if self.started.load(Ordering::SeqCst) {
            return Err(InformerError::AlreadyStarted(self.kind()));
        }
        self.indexer.add_indexers(indexers)
    }

    pub fn get_store(&self) -> Indexer<K> {
        self.indexer.clone()
    }

    pub fn get_indexer(&self) -> Indexer<K> {
        self.indexer.clone()
    }

    pub fn lister(&self) -> Lister<K> {
        Lister::new(self.indexer.clone())
    }

    pub fn has_started(&self) -> bool {
        self.started.load(Ordering::SeqCst)
    }

    pub fn has_synced(&self) -> bool {
        *self.synced.borrow()
    }

    /// Wait until the initial list has been stored. Returns false if `stop`
    /// fires first.
    pub async fn wait_for_cache_sync(&self, stop: &CancellationToken) -> bool {
        let mut synced = self.synced.subscribe();
        let wait = async move {
            loop {
                if *synced.borrow_and_update() {
                    return true;
                }
                if synced.changed().await.is_err() {
                    return false;
                }
            }
        };

        tokio::select! {
            biased;
            synced = wait => synced,
            _ = stop.cancelled() => false,
        }
    }

    /// Spawn the watch loop. Returns `None` if the informer already runs.
    pub fn start(self: &Arc<Self>, stop: CancellationToken) -> Option<JoinHandle<()>> {
        if self.started.swap(true, Ordering::SeqCst) {
            debug!("{} informer already started", self.kind());
            return None;
        }
        Some(tokio::spawn(self.clone().run(stop)))
    }

    /// Watch the API server until `stop` is cancelled
    #[instrument(skip_all, fields(kind = %self.kind()))]
    async fn run(self: Arc<Self>, stop: CancellationToken) {
        let events = watcher(self.api.clone(), self.watcher_config.clone()).default_backoff();
        self.process(events, stop).await;
    }

    /// Apply watcher events to the cache and notify handlers
    pub(crate) async fn process<S>(&self, events: S, stop: CancellationToken)
    where
        S: Stream<Item = std::result::Result<watcher::Event<K>, watcher::Error>> + Send,
    {
        info!("Starting {} informer", self.kind());

        let mut events = pin!(events);
        let mut resync = (!self.resync_period.is_zero()).then(|| {
            let mut interval = interval_at(Instant::now() + self.resync_period, self.resync_period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
            interval
        });
        let mut relist: Option<Vec<K>> = None;

        loop {
            tokio::select! {
                _ = stop.cancelled() => break,
                _ = next_tick(&mut resync) => self.resync(),
                event = events.next() => match event {
                    Some(Ok(event)) => self.handle_event(event, &mut relist),
                    Some(Err(e)) => warn!("{} watch failed, retrying: {}", self.kind(), e),
                    None => {
                        warn!("{} watch stream ended", self.kind());
                        break;
                    }
                },
            }
        }

        info!("Stopped {} informer", self.kind());
    }

    fn handle_event(&self, event: watcher::Event<K>, relist: &mut Option<Vec<K>>) {
        match event {
            watcher::Event::Init => {
                debug!("{} list started", self.kind());
                *relist = Some(Vec::new());
            }
            watcher::Event::InitApply(obj) => relist.get_or_insert_with(Vec::new).push(obj),
            watcher::Event::InitDone => {
                let objects = relist.take().unwrap_or_default();
                self.replace(objects);
            }
            watcher::Event::Apply(obj) => {
                let new = Arc::new(obj);
                match self.indexer.add_arc(new.clone()) {
                    Some(old) => self.dispatch(|h| h.on_update(&old, &new)),
                    None => self.dispatch(|h| h.on_add(&new, false)),
                }
            }
            watcher::Event::Delete(obj) => {
                let old = self.indexer.delete(&obj);
                let last = old.as_deref().unwrap_or(&obj);
                self.dispatch(|h| h.on_delete(last));
            }
        }
    }

    /// Swap in a complete list. The first list is delivered as adds; later
    /// re-lists are diffed against the cache.
    fn replace(&self, objects: Vec<K>) {
        let first_list = !self.has_synced();
        let old = self.indexer.replace(objects);
        let current = self.indexer.list();
        info!("{} list complete with {} objects", self.kind(), current.len());

        // Held until synced is set, so a handler registering meanwhile either
        // receives this list or the replay.
        let handlers = self.handlers.read();
        for new in &current {
            let key = crate::cache::store::meta_namespace_key(new.as_ref());
            match old.get(&key) {
                Some(prev) if !first_list => notify(&handlers, |h| h.on_update(prev, new)),
                _ => notify(&handlers, |h| h.on_add(new, first_list)),
            }
        }

        if !first_list {
            for (key, prev) in &old {
                if self.indexer.get_by_key(key).is_none() {
                    notify(&handlers, |h| h.on_delete(prev));
                }
            }
        }

        self.synced.send_replace(true);
    }

    /// Re-deliver every cached object as an update
    fn resync(&self) {
        if !self.has_synced() {
            return;
        }
        let cached = self.indexer.list();
        debug!("Resyncing {} {} objects", cached.len(), self.kind());
        for obj in &cached {
            self.dispatch(|h| h.on_update(obj, obj));
        }
    }

    fn dispatch(&self, f: impl Fn(&dyn ResourceEventHandler<K>)) {
        notify(&self.handlers.read(), f);
    }
}

fn notify<K>(
    handlers: &[Arc<dyn ResourceEventHandler<K>>],
    f: impl Fn(&dyn ResourceEventHandler<K>),
) {
    for handler in handlers {
        f(handler.as_ref());
    }
}

async fn next_tick(resync: &mut Option<Interval>) {
    match resync {
        Some(interval) => {
            interval.tick().await;
        }
        None => std::future::pending().await,
    }
}
