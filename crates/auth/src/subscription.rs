//! Scoped subscriptions to auth-state notifications.
//!
//! A provider owns a [`SubscriberRegistry`] and hands out [`Subscription`]
//! handles. A handle is the only way to receive notifications and it
//! unregisters itself when dropped, so a torn-down gate never leaves a live
//! callback behind.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError, Weak};

use tokio::sync::mpsc;

use crate::session::AuthStateChange;

/// Subscription to the identity provider's auth-state stream.
pub type AuthSubscription = Subscription<AuthStateChange>;

/// Fan-out registry of live subscribers.
///
/// - No IO
/// - Broadcast: every live subscriber gets a copy of each message
/// - Subscribers that went away are pruned while publishing
#[derive(Debug)]
pub struct SubscriberRegistry<M> {
    next_id: AtomicU64,
    subscribers: Mutex<Vec<(u64, mpsc::UnboundedSender<M>)>>,
}

impl<M> SubscriberRegistry<M>
where
    M: Clone + Send + 'static,
{
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            next_id: AtomicU64::new(1),
            subscribers: Mutex::new(Vec::new()),
        })
    }

    /// Register a new subscriber. Messages published after this call returns
    /// are delivered to it.
    pub fn subscribe(self: &Arc<Self>) -> Subscription<M> {
        let (tx, rx) = mpsc::unbounded_channel();
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);

        self.subscribers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push((id, tx));

        tracing::debug!(subscription_id = id, "auth-state subscription registered");

        Subscription {
            id,
            receiver: rx,
            registry: Arc::downgrade(self),
        }
    }

    /// Deliver `message` to every live subscriber. Returns how many received it.
    pub fn publish(&self, message: M) -> usize {
        let mut subs = self
            .subscribers
            .lock()
            .unwrap_or_else(PoisonError::into_inner);

        subs.retain(|(_, tx)| tx.send(message.clone()).is_ok());
        subs.len()
    }
}

impl<M> SubscriberRegistry<M> {
    pub fn len(&self) -> usize {
        self.subscribers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn remove(&self, id: u64) {
        self.subscribers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .retain(|(sub_id, _)| *sub_id != id);
    }
}

/// Owned subscription handle.
///
/// Dropping the handle (or calling [`Subscription::unsubscribe`]) releases the
/// registration.
#[derive(Debug)]
pub struct Subscription<M> {
    id: u64,
    receiver: mpsc::UnboundedReceiver<M>,
    registry: Weak<SubscriberRegistry<M>>,
}

impl<M> Subscription<M> {
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Wait for the next message. `None` once the provider is gone.
    pub async fn recv(&mut self) -> Option<M> {
        self.receiver.recv().await
    }

    /// Take a queued message without waiting.
    pub fn try_recv(&mut self) -> Option<M> {
        self.receiver.try_recv().ok()
    }

    /// Explicitly release the registration.
    pub fn unsubscribe(self) {
        drop(self);
    }
}

impl<M> Drop for Subscription<M> {
    fn drop(&mut self) {
        self.receiver.close();
        if let Some(registry) = self.registry.upgrade() {
            registry.remove(self.id);
            tracing::debug!(subscription_id = self.id, "auth-state subscription released");
        }
    }
}
