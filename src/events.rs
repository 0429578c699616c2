use tokio::sync::broadcast;

use crate::types::{execution_payload::ExecutionPayload, header::BeaconBlockHeader};

/// Per-subscriber queue depth before the oldest undelivered event is dropped.
pub const DEFAULT_FEED_CAPACITY: usize = 16;

/// A verified chain head paired with the execution payload it commits to.
/// Each subscriber receives its own clone.
#[derive(Debug, Clone, PartialEq)]
pub struct ChainHeadEvent {
    pub header: BeaconBlockHeader,
    pub payload: ExecutionPayload,
}

/// Fan-out feed for [`ChainHeadEvent`]s.
///
/// Delivery is best-effort: a subscriber that falls more than the queue
/// capacity behind loses the oldest events and observes the gap as a
/// [`broadcast::error::RecvError::Lagged`]. The publisher never blocks.
#[derive(Debug, Clone)]
pub struct ChainHeadFeed {
    sender: broadcast::Sender<ChainHeadEvent>,
}

impl ChainHeadFeed {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<ChainHeadEvent> {
        self.sender.subscribe()
    }

    /// Delivers `event` to all current subscribers. Publishing with no
    /// subscribers is not an error; the event is simply dropped.
    pub fn publish(&self, event: ChainHeadEvent) {
        let _ = self.sender.send(event);
    }

    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for ChainHeadFeed {
    fn default() -> Self {
        Self::new(DEFAULT_FEED_CAPACITY)
    }
}

#[cfg(test)]
mod tests {
    use tokio::sync::broadcast::error::{RecvError, TryRecvError};

    use super::*;

    fn event(slot: u64) -> ChainHeadEvent {
        ChainHeadEvent {
            header: BeaconBlockHeader {
                slot,
                ..Default::default()
            },
            payload: ExecutionPayload::default(),
        }
    }

    #[tokio::test]
    async fn delivers_to_all_subscribers() {
        let feed = ChainHeadFeed::default();
        let mut first = feed.subscribe();
        let mut second = feed.subscribe();

        feed.publish(event(1));

        assert_eq!(first.recv().await.unwrap().header.slot, 1);
        assert_eq!(second.recv().await.unwrap().header.slot, 1);
    }

    #[tokio::test]
    async fn lagging_subscriber_skips_oldest() {
        let feed = ChainHeadFeed::new(1);
        let mut rx = feed.subscribe();

        feed.publish(event(1));
        feed.publish(event(2));

        assert!(matches!(rx.recv().await, Err(RecvError::Lagged(1))));
        assert_eq!(rx.recv().await.unwrap().header.slot, 2);
    }

    #[tokio::test]
    async fn dropped_subscription_unregisters() {
        let feed = ChainHeadFeed::default();
        let rx = feed.subscribe();
        assert_eq!(feed.subscriber_count(), 1);

        drop(rx);
        assert_eq!(feed.subscriber_count(), 0);

        // Publishing into the void must not error out the driver.
        feed.publish(event(1));
    }

    #[tokio::test]
    async fn no_event_before_publish() {
        let feed = ChainHeadFeed::default();
        let mut rx = feed.subscribe();
        assert!(matches!(rx.try_recv(), Err(TryRecvError::Empty)));
    }
}
