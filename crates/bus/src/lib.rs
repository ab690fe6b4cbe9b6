// SPDX-License-Identifier: MIT

#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! quorum-bus: in-process typed pub/sub with ring-buffer and priority lanes.
//!
//! Non-priority subscribers get bounded, drop-oldest delivery so a stalled
//! consumer never backs up the publisher. Priority subscribers get a
//! blocking-send guarantee instead: a stalled priority consumer stalls
//! [`EventBus::publish_priority`] callers, which is the documented tradeoff
//! for never silently dropping a high-priority event.

mod error;
mod ring;

pub use error::BusError;
pub use ring::RingReceiver;

use parking_lot::RwLock;
use quorum_core::{Event, ProjectId, SubscriptionId};
use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use tokio::sync::mpsc;
use tracing::{debug, trace};

#[derive(Debug, Clone)]
pub struct BusConfig {
    /// Buffer size for [`EventBus::subscribe`] channels.
    pub default_buffer: usize,
    /// Buffer size for [`EventBus::subscribe_priority`] channels.
    pub priority_buffer: usize,
}

impl Default for BusConfig {
    fn default() -> Self {
        Self { default_buffer: 100, priority_buffer: 50 }
    }
}

/// An active subscription's filter: `None` fields mean "match everything".
struct Filter {
    project_id: Option<ProjectId>,
    types: Option<HashSet<String>>,
}

impl Filter {
    fn matches(&self, event: &Event) -> bool {
        event.matches_project(self.project_id)
            && self.types.as_ref().map_or(true, |types| types.contains(event.type_tag()))
    }
}

enum SubscriberKind {
    Ring(ring::RingSender),
    Priority(mpsc::Sender<Event>),
}

struct Subscriber {
    id: SubscriptionId,
    filter: Filter,
    kind: SubscriberKind,
}

/// The receive side handed back from [`EventBus::subscribe_priority`].
pub struct PriorityReceiver {
    rx: mpsc::Receiver<Event>,
}

impl PriorityReceiver {
    pub async fn recv(&mut self) -> Option<Event> {
        self.rx.recv().await
    }
}

pub struct EventBus {
    config: BusConfig,
    subscribers: RwLock<Vec<Subscriber>>,
    next_id: AtomicU64,
    dropped_count: AtomicU64,
    closed: AtomicBool,
}

impl EventBus {
    pub fn new(config: BusConfig) -> Self {
        Self { config, subscribers: RwLock::new(Vec::new()), next_id: AtomicU64::new(1), dropped_count: AtomicU64::new(0), closed: AtomicBool::new(false) }
    }

    fn allocate_id(&self) -> SubscriptionId {
        SubscriptionId::from_raw(self.next_id.fetch_add(1, Ordering::Relaxed))
    }

    /// Returns a receive-only channel with ring-buffer, drop-oldest
    /// delivery. `project_id = None` receives every project; `types = None`
    /// receives every event type. On a closed bus the returned channel is
    /// already closed.
    pub fn subscribe(&self, project_id: Option<ProjectId>, types: Option<HashSet<String>>) -> (SubscriptionId, RingReceiver) {
        let id = self.allocate_id();
        let (tx, rx) = ring::channel(self.config.default_buffer);
        if self.closed.load(Ordering::SeqCst) {
            tx.close();
            return (id, rx);
        }
        self.subscribers.write().push(Subscriber { id, filter: Filter { project_id, types }, kind: SubscriberKind::Ring(tx) });
        (id, rx)
    }

    /// Same filtering as [`Self::subscribe`] but with a smaller buffer and
    /// blocking-send delivery via [`Self::publish_priority`].
    pub fn subscribe_priority(&self, project_id: Option<ProjectId>, types: Option<HashSet<String>>) -> (SubscriptionId, PriorityReceiver) {
        let id = self.allocate_id();
        let (tx, rx) = mpsc::channel(self.config.priority_buffer.max(1));
        if self.closed.load(Ordering::SeqCst) {
            drop(tx);
            return (id, PriorityReceiver { rx });
        }
        self.subscribers.write().push(Subscriber { id, filter: Filter { project_id, types }, kind: SubscriberKind::Priority(tx) });
        (id, PriorityReceiver { rx })
    }

    /// Removes the subscription and closes its channel. Idempotent: calling
    /// with an id that is already gone is a no-op.
    pub fn unsubscribe(&self, id: SubscriptionId) {
        let mut subs = self.subscribers.write();
        if let Some(pos) = subs.iter().position(|s| s.id == id) {
            let removed = subs.remove(pos);
            if let SubscriberKind::Ring(tx) = &removed.kind {
                tx.close();
            }
        }
    }

    /// Non-blocking ring-buffer delivery to every matching subscriber
    /// (priority subscribers included — they get ring semantics here, the
    /// blocking guarantee is reserved for [`Self::publish_priority`]).
    pub fn publish(&self, event: Event) {
        if self.closed.load(Ordering::SeqCst) {
            return;
        }
        let subs = self.subscribers.read();
        for sub in subs.iter() {
            if !sub.filter.matches(&event) {
                continue;
            }
            match &sub.kind {
                SubscriberKind::Ring(tx) => {
                    if tx.send(event.clone()) {
                        self.dropped_count.fetch_add(1, Ordering::Relaxed);
                        trace!(subscription = %sub.id, "dropped oldest event to admit new one");
                    }
                }
                SubscriberKind::Priority(tx) => match tx.try_send(event.clone()) {
                    Ok(()) => {}
                    Err(mpsc::error::TrySendError::Full(_)) => {
                        self.dropped_count.fetch_add(1, Ordering::Relaxed);
                        debug!(subscription = %sub.id, "priority subscriber full on non-priority publish, dropped");
                    }
                    Err(mpsc::error::TrySendError::Closed(_)) => {}
                },
            }
        }
    }

    /// Delivers to matching non-priority subscribers with ring semantics,
    /// then performs a blocking send to every matching priority subscriber.
    /// May block if any priority consumer is slow to drain — that is the
    /// documented contract, not a bug.
    pub async fn publish_priority(&self, event: Event) {
        if self.closed.load(Ordering::SeqCst) {
            return;
        }
        let mut priority_targets = Vec::new();
        {
            let subs = self.subscribers.read();
            for sub in subs.iter() {
                if !sub.filter.matches(&event) {
                    continue;
                }
                match &sub.kind {
                    SubscriberKind::Ring(tx) => {
                        if tx.send(event.clone()) {
                            self.dropped_count.fetch_add(1, Ordering::Relaxed);
                        }
                    }
                    SubscriberKind::Priority(tx) => priority_targets.push(tx.clone()),
                }
            }
        }
        for tx in priority_targets {
            let _ = tx.send(event.clone()).await;
        }
    }

    pub fn dropped_count(&self) -> u64 {
        self.dropped_count.load(Ordering::Relaxed)
    }

    /// Idempotent: closes every subscriber channel and refuses further
    /// publishes and subscriptions.
    pub fn close(&self) {
        if self.closed.swap(true, Ordering::SeqCst) {
            return;
        }
        let mut subs = self.subscribers.write();
        for sub in subs.drain(..) {
            if let SubscriberKind::Ring(tx) = &sub.kind {
                tx.close();
            }
        }
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(BusConfig::default())
    }
}

#[cfg(test)]
#[path = "lib_tests.rs"]
mod tests;
