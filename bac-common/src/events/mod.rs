//! Event types for the break-away controller
//!
//! Provides the notification definitions and the EventBus that delivers them
//! to external listeners.

mod status_types;

pub use status_types::{ChannelStatus, ChannelStatusChanged, StatusChange};

use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use uuid::Uuid;

use crate::config::{ChannelDescriptor, ResumeStrategy};

/// Receiving end of an [`EventBus`] subscription
pub type EventReceiver = broadcast::Receiver<ControlEvent>;

/// Controller event types
///
/// Events are broadcast via EventBus in the order the controller produced
/// them and can be serialized for forwarding to monitoring clients.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ControlEvent {
    /// A channel's derived status changed
    ///
    /// Raised by configuration changes and by every successful trigger or
    /// return.
    ChannelStatusChanged {
        channel: ChannelDescriptor,
        status: ChannelStatus,
        change: StatusChange,
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// Break-away content was spliced into a transmission list
    BreakAwayTriggered {
        channel: ChannelDescriptor,
        /// Paired break-away list index
        break_away_list: u32,
        /// Server timecode at which the content airs (`HH:MM:SS:FF`)
        break_time: String,
        /// Whether the on-air event was split
        split: bool,
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// A channel came back from break-away
    BreakAwayReturned {
        channel: ChannelDescriptor,
        strategy: ResumeStrategy,
        /// Break-away event playback resumed from, if any
        resumed_event: Option<Uuid>,
        timestamp: chrono::DateTime<chrono::Utc>,
    },
}

impl ControlEvent {
    /// Event type name for filtering and logging
    pub fn event_type(&self) -> &str {
        match self {
            ControlEvent::ChannelStatusChanged { .. } => "ChannelStatusChanged",
            ControlEvent::BreakAwayTriggered { .. } => "BreakAwayTriggered",
            ControlEvent::BreakAwayReturned { .. } => "BreakAwayReturned",
        }
    }

    /// Wrap a status notification with the current time
    pub fn status_changed(notification: &ChannelStatusChanged) -> Self {
        ControlEvent::ChannelStatusChanged {
            channel: notification.channel.clone(),
            status: notification.status.clone(),
            change: notification.change,
            timestamp: chrono::Utc::now(),
        }
    }
}

/// Event distribution bus
///
/// Thin wrapper over a tokio broadcast channel. Sending never blocks, so the
/// synchronous controller can emit from any thread; listeners receive with
/// `recv().await` or `try_recv()`.
///
/// # Examples
///
/// ```
/// use bac_common::events::EventBus;
///
/// let bus = EventBus::new(100);
/// let mut rx = bus.subscribe();
/// assert_eq!(bus.subscriber_count(), 1);
/// assert!(rx.try_recv().is_err());
/// ```
#[derive(Clone)]
pub struct EventBus {
    tx: broadcast::Sender<ControlEvent>,
    capacity: usize,
}

impl EventBus {
    /// Creates a new EventBus with specified channel capacity
    ///
    /// * `capacity` - Number of events to buffer before lagging receivers
    ///   start losing the oldest ones
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx, capacity }
    }

    /// Subscribe to all future events
    pub fn subscribe(&self) -> EventReceiver {
        self.tx.subscribe()
    }

    /// Emit an event to all subscribers
    ///
    /// Returns `Err` if no subscribers are listening.
    #[allow(clippy::result_large_err)]
    pub fn emit(
        &self,
        event: ControlEvent,
    ) -> Result<usize, broadcast::error::SendError<ControlEvent>> {
        self.tx.send(event)
    }

    /// Emit an event, ignoring if no subscribers are listening
    pub fn emit_lossy(&self, event: ControlEvent) {
        let _ = self.tx.send(event);
    }

    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_notification() -> ChannelStatusChanged {
        ChannelStatusChanged::new(
            ChannelDescriptor::new("MAIN1", 1),
            ChannelStatus {
                has_break_away: true,
                in_break_away: false,
                default_path: "/d".to_string(),
                sequence_path: "/s".to_string(),
            },
            StatusChange::Added,
        )
    }

    #[test]
    fn test_emit_delivers_in_order() {
        let bus = EventBus::new(16);
        let mut rx = bus.subscribe();

        let notification = sample_notification();
        bus.emit(ControlEvent::status_changed(&notification)).unwrap();
        bus.emit_lossy(ControlEvent::BreakAwayReturned {
            channel: notification.channel.clone(),
            strategy: ResumeStrategy::Slide,
            resumed_event: None,
            timestamp: chrono::Utc::now(),
        });

        let first = rx.try_recv().expect("first event");
        assert_eq!(first.event_type(), "ChannelStatusChanged");
        let second = rx.try_recv().expect("second event");
        assert_eq!(second.event_type(), "BreakAwayReturned");
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_emit_without_subscribers_errors() {
        let bus = EventBus::new(4);
        assert!(bus.emit(ControlEvent::status_changed(&sample_notification())).is_err());
        // lossy emission is silent
        bus.emit_lossy(ControlEvent::status_changed(&sample_notification()));
        assert_eq!(bus.capacity(), 4);
    }

    #[test]
    fn test_event_serializes_with_type_tag() {
        let event = ControlEvent::status_changed(&sample_notification());
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "ChannelStatusChanged");
        assert_eq!(json["change"], "Added");
        assert_eq!(json["channel"]["server"], "MAIN1");
        assert_eq!(json["status"]["has_break_away"], true);
    }
}
