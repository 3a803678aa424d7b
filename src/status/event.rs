//! Typed change notifications.

use tokio::sync::broadcast;
use tokio_stream::wrappers::BroadcastStream;
use tokio_stream::{Stream, StreamExt};
use tracing::{debug, warn};

use crate::model::{ConfigStatus, DeviceId, VpnServerId};

use super::StatusEvent;

/// A change other components may react to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigEvent {
    /// A configuration changed status.
    StatusChanged {
        /// The device
        device: DeviceId,
        /// Status before
        previous: ConfigStatus,
        /// Status after
        current: ConfigStatus,
        /// The event that caused it
        reason: StatusEvent,
    },
    /// The peer set of a VPN server changed.
    PeersChanged {
        /// The server
        server: VpnServerId,
    },
}

/// Broadcast channel for [`ConfigEvent`]s.
///
/// Publishing never blocks and never fails: without subscribers the event is
/// dropped, and a lagging subscriber loses the oldest events.
#[derive(Debug, Clone)]
pub struct EventBus {
    sender: broadcast::Sender<ConfigEvent>,
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(Self::DEFAULT_CAPACITY)
    }
}

impl EventBus {
    /// Buffer size used by [`EventBus::default`].
    pub const DEFAULT_CAPACITY: usize = 256;

    /// Creates a bus buffering up to `capacity` events per subscriber.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    /// Publishes an event.
    pub fn publish(&self, event: ConfigEvent) {
        debug!("Publishing {event:?}");
        // Err only means nobody is listening.
        let _ = self.sender.send(event);
    }

    /// Subscribes to events published from now on.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<ConfigEvent> {
        self.sender.subscribe()
    }

    /// Returns the events published from now on as a stream.
    ///
    /// Lag is logged and skipped.
    pub fn stream(&self) -> impl Stream<Item = ConfigEvent> + Send + 'static {
        BroadcastStream::new(self.subscribe()).filter_map(|item| match item {
            Ok(event) => Some(event),
            Err(e) => {
                warn!("Event subscriber lagged: {e}");
                None
            }
        })
    }
}
