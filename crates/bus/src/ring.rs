// SPDX-License-Identifier: MIT

//! Bounded ring buffer backing non-priority subscriptions: full buffers drop
//! the oldest queued event rather than block the publisher.

use parking_lot::Mutex;
use quorum_core::Event;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::Notify;

struct Inner {
    buffer: Mutex<VecDeque<Event>>,
    capacity: usize,
    closed: AtomicBool,
    notify: Notify,
}

/// Producer handle held by the bus; never exposed to subscribers directly.
#[derive(Clone)]
pub(crate) struct RingSender {
    inner: Arc<Inner>,
}

/// Consumer handle returned to a subscriber by `EventBus::subscribe`.
pub struct RingReceiver {
    inner: Arc<Inner>,
}

pub(crate) fn channel(capacity: usize) -> (RingSender, RingReceiver) {
    let inner = Arc::new(Inner {
        buffer: Mutex::new(VecDeque::with_capacity(capacity)),
        capacity: capacity.max(1),
        closed: AtomicBool::new(false),
        notify: Notify::new(),
    });
    (RingSender { inner: inner.clone() }, RingReceiver { inner })
}

impl RingSender {
    /// Ring-buffer delivery: push the event, dropping the oldest queued
    /// event first if the buffer is already at capacity. Returns `true` if
    /// an event was dropped to make room.
    pub(crate) fn send(&self, event: Event) -> bool {
        let mut buf = self.inner.buffer.lock();
        let dropped = if buf.len() >= self.inner.capacity {
            buf.pop_front();
            true
        } else {
            false
        };
        buf.push_back(event);
        drop(buf);
        self.inner.notify.notify_one();
        dropped
    }

    pub(crate) fn close(&self) {
        self.inner.closed.store(true, Ordering::SeqCst);
        self.inner.notify.notify_waiters();
    }
}

impl RingReceiver {
    /// Waits for the next event, or `None` once the channel is closed and
    /// drained.
    pub async fn recv(&mut self) -> Option<Event> {
        loop {
            if let Some(event) = self.inner.buffer.lock().pop_front() {
                return Some(event);
            }
            if self.inner.closed.load(Ordering::SeqCst) {
                return None;
            }
            self.inner.notify.notified().await;
        }
    }
}
