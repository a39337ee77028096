//! # Command Channel
//!
//! A single-consumer work queue. Producers never block and never lose
//! items: while no consumer is attached, items pile up in arrival order.
//! Attaching a consumer hands it the whole backlog first, then new items as
//! they are produced.
//!
//! ```text
//!  send(a) send(b)            attach()            send(c)
//!  ┌────────────┐        ┌──────────────┐      ┌──────────────┐
//!  │ backlog a b│  ───►  │ consumer#1   │ ───► │ consumer#1   │
//!  └────────────┘        │   a, b       │      │   c          │
//!                        └──────────────┘      └──────────────┘
//! ```
//!
//! Only one consumer is attached at a time. Attaching again detaches the
//! previous receiver; whatever it had not taken yet stays queued for the new
//! one, since the backlog belongs to the queue. Dropping a receiver detaches
//! it. This is what lets navigation intents issued while the View Host is
//! torn down survive until the next host comes up.

use std::collections::VecDeque;
use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::Notify;

struct Shared<M> {
    queue: VecDeque<M>,
    /// Generation of the attached consumer, if any.
    attached: Option<u64>,
    next_generation: u64,
}

/// Producer side. Cloning yields another handle to the same queue.
pub struct WorkQueue<M> {
    shared: Arc<Mutex<Shared<M>>>,
    notify: Arc<Notify>,
}

impl<M> Clone for WorkQueue<M> {
    fn clone(&self) -> Self {
        Self {
            shared: Arc::clone(&self.shared),
            notify: Arc::clone(&self.notify),
        }
    }
}

impl<M> Default for WorkQueue<M> {
    fn default() -> Self {
        Self::new()
    }
}

impl<M> WorkQueue<M> {
    pub fn new() -> Self {
        Self {
            shared: Arc::new(Mutex::new(Shared {
                queue: VecDeque::new(),
                attached: None,
                next_generation: 1,
            })),
            notify: Arc::new(Notify::new()),
        }
    }

    pub fn send(&self, item: M) {
        self.shared.lock().queue.push_back(item);
        self.notify.notify_waiters();
    }

    /// Attach a new consumer, detaching any previous one.
    pub fn attach(&self) -> WorkReceiver<M> {
        let generation = {
            let mut shared = self.shared.lock();
            let generation = shared.next_generation;
            shared.next_generation += 1;
            shared.attached = Some(generation);
            generation
        };
        // Wake a previous consumer parked in recv() so it sees it was replaced
        self.notify.notify_waiters();
        WorkReceiver {
            shared: Arc::clone(&self.shared),
            notify: Arc::clone(&self.notify),
            generation,
        }
    }

    /// Items waiting for a consumer.
    pub fn backlog(&self) -> usize {
        self.shared.lock().queue.len()
    }

    pub fn has_consumer(&self) -> bool {
        self.shared.lock().attached.is_some()
    }
}

/// Consumer side of a [`WorkQueue`].
pub struct WorkReceiver<M> {
    shared: Arc<Mutex<Shared<M>>>,
    notify: Arc<Notify>,
    generation: u64,
}

impl<M> WorkReceiver<M> {
    pub fn is_attached(&self) -> bool {
        self.shared.lock().attached == Some(self.generation)
    }

    /// Take the next item without waiting. `None` when the queue is empty or
    /// this receiver has been replaced.
    pub fn try_recv(&mut self) -> Option<M> {
        let mut shared = self.shared.lock();
        if shared.attached != Some(self.generation) {
            return None;
        }
        shared.queue.pop_front()
    }

    /// Wait for the next item. Resolves to `None` once this receiver is
    /// detached.
    pub async fn recv(&mut self) -> Option<M> {
        loop {
            let notified = self.notify.notified();
            tokio::pin!(notified);
            // Register before checking, so a send in between is not missed
            notified.as_mut().enable();
            {
                let mut shared = self.shared.lock();
                if shared.attached != Some(self.generation) {
                    return None;
                }
                if let Some(item) = shared.queue.pop_front() {
                    return Some(item);
                }
            }
            notified.await;
        }
    }

    /// Take everything currently queued.
    pub fn drain(&mut self) -> Vec<M> {
        std::iter::from_fn(|| self.try_recv()).collect()
    }

    pub fn detach(self) {
        drop(self);
    }
}

impl<M> Drop for WorkReceiver<M> {
    fn drop(&mut self) {
        let mut shared = self.shared.lock();
        if shared.attached == Some(self.generation) {
            shared.attached = None;
        }
        drop(shared);
        self.notify.notify_waiters();
    }
}
