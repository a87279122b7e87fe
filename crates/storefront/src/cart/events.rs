//! Cart change notifications.
//!
//! A [`CartEvents`] handle is shared by everything that mutates or displays
//! the cart. Mutators call [`CartEvents::notify`]; views hold a
//! [`CartSubscription`] and reload when it fires.

use tokio::sync::broadcast;
use tokio::sync::broadcast::error::{RecvError, TryRecvError};
use tracing::debug;

use super::reconciler::CartSource;

const DEFAULT_CAPACITY: usize = 16;

/// Something about the cart changed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CartEvent {
    Changed {
        /// Tier the post-mutation cart was read from.
        source: CartSource,
        /// Units in the cart after the change.
        item_count: u64,
    },
}

/// Publisher side of cart notifications. Cheap to clone.
#[derive(Debug, Clone)]
pub struct CartEvents {
    sender: broadcast::Sender<CartEvent>,
}

impl Default for CartEvents {
    fn default() -> Self {
        Self::new()
    }
}

impl CartEvents {
    #[must_use]
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }

    /// Create a channel that buffers up to `capacity` unseen events per
    /// subscriber before older ones are dropped.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    /// Announce a change to every current subscriber.
    pub fn notify(&self, event: CartEvent) {
        // No subscribers is fine
        if let Ok(receivers) = self.sender.send(event) {
            debug!(receivers, ?event, "Cart change broadcast");
        }
    }

    /// Start listening for changes made after this call.
    #[must_use]
    pub fn subscribe(&self) -> CartSubscription {
        CartSubscription {
            receiver: self.sender.subscribe(),
        }
    }

    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

/// Listener side of cart notifications.
#[derive(Debug)]
pub struct CartSubscription {
    receiver: broadcast::Receiver<CartEvent>,
}

impl CartSubscription {
    /// Wait for the next change.
    ///
    /// A subscriber that fell behind skips the events it missed. Returns
    /// `None` once every publisher is gone.
    pub async fn changed(&mut self) -> Option<CartEvent> {
        loop {
            match self.receiver.recv().await {
                Ok(event) => return Some(event),
                Err(RecvError::Lagged(skipped)) => {
                    debug!(skipped, "Cart subscriber lagged");
                }
                Err(RecvError::Closed) => return None,
            }
        }
    }

    /// Take the most recent pending change without waiting.
    pub fn latest(&mut self) -> Option<CartEvent> {
        let mut latest = None;
        loop {
            match self.receiver.try_recv() {
                Ok(event) => latest = Some(event),
                Err(TryRecvError::Lagged(_)) => {}
                Err(TryRecvError::Empty | TryRecvError::Closed) => return latest,
            }
        }
    }
}
