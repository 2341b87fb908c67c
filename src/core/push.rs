//! Fan-out hub for market update push messages
//!
//! Messages are serialized once and broadcast to every WebSocket
//! subscriber. Slow subscribers that fall behind the channel capacity
//! miss intermediate updates and resume at the newest one, which is the
//! right behavior for snapshot streams.

use serde::Serialize;
use serde_json::json;
use tokio::sync::broadcast;
use tracing::debug;

pub const MARKET_UPDATE_CHANNEL: &str = "market_update";

const CHANNEL_CAPACITY: usize = 32;

#[derive(Debug, Clone)]
pub struct PushHub {
    tx: broadcast::Sender<String>,
}

impl PushHub {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(CHANNEL_CAPACITY);
        Self { tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<String> {
        self.tx.subscribe()
    }

    /// Serializes `payload` into a channel envelope and broadcasts it.
    /// Returns the number of subscribers that received it.
    pub fn publish<T: Serialize>(&self, channel: &str, payload: &T) -> usize {
        let message = json!({ "channel": channel, "data": payload }).to_string();
        match self.tx.send(message) {
            Ok(receivers) => receivers,
            Err(_) => {
                debug!(channel, "no push subscribers connected");
                0
            }
        }
    }

    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

impl Default for PushHub {
    fn default() -> Self {
        Self::new()
    }
}
