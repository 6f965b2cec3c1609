//! Bounded inbox shared between the listener thread and the tick consumer.
//!
//! Backpressure policy: a push onto a full queue evicts the oldest queued
//! item to admit the newest. Memory stays bounded and the network thread
//! never blocks; under load only temporal resolution degrades.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use crossbeam_channel::{bounded, Receiver, Sender, TrySendError};

use oscrec_types::InboxItem;

/// Create the inbox pair. Producer side is cloneable and lives on the
/// listener thread (and any thread holding a command sender); the consumer
/// side belongs to the tick context.
pub fn inbox(capacity: usize) -> (InboxProducer, InboxConsumer) {
    let (tx, rx) = bounded(capacity.max(1));
    let dropped = Arc::new(AtomicU64::new(0));
    (
        InboxProducer {
            tx,
            rx: rx.clone(),
            dropped: Arc::clone(&dropped),
        },
        InboxConsumer { rx, dropped },
    )
}

#[derive(Clone)]
pub struct InboxProducer {
    tx: Sender<InboxItem>,
    // Producer-side receiver clone used only to evict the oldest item on
    // overflow (crossbeam channels are MPMC).
    rx: Receiver<InboxItem>,
    dropped: Arc<AtomicU64>,
}

impl InboxProducer {
    /// Enqueue an item, evicting the oldest queued item if the inbox is full.
    /// Never blocks.
    pub fn push(&self, item: InboxItem) {
        let mut item = item;
        loop {
            match self.tx.try_send(item) {
                Ok(()) => return,
                Err(TrySendError::Full(back)) => {
                    if self.rx.try_recv().is_ok() {
                        self.dropped.fetch_add(1, Ordering::Relaxed);
                    }
                    item = back;
                }
                // Consumer is gone; nothing left to deliver to.
                Err(TrySendError::Disconnected(_)) => return,
            }
        }
    }
}

pub struct InboxConsumer {
    rx: Receiver<InboxItem>,
    dropped: Arc<AtomicU64>,
}

impl InboxConsumer {
    /// Pop up to `max` items in arrival order. Anything beyond `max` stays
    /// queued for the next tick.
    pub fn drain(&self, max: usize) -> Vec<InboxItem> {
        let mut items = Vec::new();
        while items.len() < max {
            match self.rx.try_recv() {
                Ok(item) => items.push(item),
                Err(_) => break,
            }
        }
        items
    }

    /// Number of items evicted by overflow since the last call.
    pub fn take_dropped(&self) -> u64 {
        self.dropped.swap(0, Ordering::Relaxed)
    }

    pub fn len(&self) -> usize {
        self.rx.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rx.is_empty()
    }
}
