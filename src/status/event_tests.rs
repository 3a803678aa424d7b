//! Tests for the event channel.

use tokio_stream::StreamExt;

use crate::model::ConfigStatus;
use crate::status::{ConfigEvent, EventBus, StatusEvent};

fn status_changed() -> ConfigEvent {
    ConfigEvent::StatusChanged {
        device: "d1".into(),
        previous: ConfigStatus::Modified,
        current: ConfigStatus::Applied,
        reason: StatusEvent::AgentApplied,
    }
}

#[tokio::test]
async fn subscribers_receive_published_events() {
    let bus = EventBus::default();
    let mut rx = bus.subscribe();

    bus.publish(status_changed());

    assert_eq!(rx.recv().await.unwrap(), status_changed());
}

#[test]
fn publishing_without_subscribers_is_silent() {
    let bus = EventBus::new(4);
    bus.publish(ConfigEvent::PeersChanged {
        server: "v1".into(),
    });
}

#[tokio::test]
async fn stream_yields_events_in_order() {
    let bus = EventBus::default();
    let mut stream = Box::pin(bus.stream());

    bus.publish(status_changed());
    bus.publish(ConfigEvent::PeersChanged {
        server: "v1".into(),
    });

    assert_eq!(stream.next().await, Some(status_changed()));
    assert_eq!(
        stream.next().await,
        Some(ConfigEvent::PeersChanged {
            server: "v1".into()
        })
    );
}

#[tokio::test]
async fn stream_skips_lagged_events() {
    let bus = EventBus::new(1);
    let mut stream = Box::pin(bus.stream());

    bus.publish(status_changed());
    bus.publish(ConfigEvent::PeersChanged {
        server: "v1".into(),
    });

    assert_eq!(
        stream.next().await,
        Some(ConfigEvent::PeersChanged {
            server: "v1".into()
        })
    );
}
