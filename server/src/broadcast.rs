use tokio::sync::broadcast;

use crate::models::MessageView;

const CHANNEL_CAPACITY: usize = 256;

/// Fan-out of accepted messages to live subscribers
///
/// Delivery is best effort: nothing is acknowledged, retried, or kept for
/// subscribers that connect later.
#[derive(Clone)]
pub struct BroadcastGateway {
    sender: broadcast::Sender<MessageView>,
}

impl BroadcastGateway {
    pub fn new() -> Self {
        let (sender, _) = broadcast::channel(CHANNEL_CAPACITY);
        Self { sender }
    }

    /// Deliver to every current subscriber; returns how many there were
    pub fn publish(&self, message: MessageView) -> usize {
        // send only fails when nobody is listening
        self.sender.send(message).unwrap_or(0)
    }

    pub fn subscribe(&self) -> Subscription {
        Subscription {
            receiver: self.sender.subscribe(),
        }
    }

    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for BroadcastGateway {
    fn default() -> Self {
        Self::new()
    }
}

/// Stream of messages published after the subscription was created
pub struct Subscription {
    receiver: broadcast::Receiver<MessageView>,
}

impl Subscription {
    /// Next published message, or `None` once the gateway is gone.
    /// A subscriber that falls behind skips what it missed.
    pub async fn recv(&mut self) -> Option<MessageView> {
        loop {
            match self.receiver.recv().await {
                Ok(message) => return Some(message),
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    tracing::warn!(skipped, "subscriber lagged behind broadcast channel");
                }
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        }
    }
}
