//! Playout list model
//!
//! Lists and events are owned by the external playout list service. These
//! types describe the slice of that model the break-away controller reads
//! and writes.

use crate::timecode::{FrameRate, TimeCode};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ============================================================================
// Flag Sets
// ============================================================================

/// Event control flags
///
/// Only [`EventControl::AUTO_TIMED`] and [`EventControl::AUTO_UPCOUNT`] drive
/// controller decisions; the remaining bits are carried through untouched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct EventControl(u16);

impl EventControl {
    /// Event fires at its absolute on-air time (hard start)
    pub const AUTO_TIMED: EventControl = EventControl(1 << 0);
    /// Open-ended event that counts up instead of a fixed duration
    pub const AUTO_UPCOUNT: EventControl = EventControl(1 << 1);
    /// Event follows the previous one automatically
    pub const AUTO_PLAY: EventControl = EventControl(1 << 2);
    /// Event is switched to air by the router
    pub const AUTO_SWITCH: EventControl = EventControl(1 << 3);
    /// Event requires manual take
    pub const MANUAL_START: EventControl = EventControl(1 << 4);

    pub const fn empty() -> Self {
        EventControl(0)
    }

    pub const fn bits(self) -> u16 {
        self.0
    }

    pub const fn from_bits(bits: u16) -> Self {
        EventControl(bits)
    }

    pub fn contains(self, other: EventControl) -> bool {
        self.0 & other.0 == other.0
    }

    pub fn insert(&mut self, other: EventControl) {
        self.0 |= other.0;
    }

    pub fn remove(&mut self, other: EventControl) {
        self.0 &= !other.0;
    }

    pub fn is_empty(self) -> bool {
        self.0 == 0
    }
}

impl std::ops::BitOr for EventControl {
    type Output = EventControl;

    fn bitor(self, rhs: EventControl) -> EventControl {
        EventControl(self.0 | rhs.0)
    }
}

/// Event status flags reported by the playout engine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct EventStatus(u16);

impl EventStatus {
    /// Event is currently on air
    pub const RUNNING: EventStatus = EventStatus(1 << 0);
    /// Event has finished playing
    pub const DONE: EventStatus = EventStatus(1 << 1);
    /// Media is cued on the device
    pub const CUED: EventStatus = EventStatus(1 << 2);
    /// Playback was pre-rolled
    pub const PREROLLED: EventStatus = EventStatus(1 << 3);
    /// Event was skipped
    pub const SKIPPED: EventStatus = EventStatus(1 << 4);

    pub const fn empty() -> Self {
        EventStatus(0)
    }

    pub const fn bits(self) -> u16 {
        self.0
    }

    pub const fn from_bits(bits: u16) -> Self {
        EventStatus(bits)
    }

    pub fn contains(self, other: EventStatus) -> bool {
        self.0 & other.0 == other.0
    }

    pub fn insert(&mut self, other: EventStatus) {
        self.0 |= other.0;
    }

    pub fn remove(&mut self, other: EventStatus) {
        self.0 &= !other.0;
    }

    /// Drop every status bit
    pub fn clear(&mut self) {
        self.0 = 0;
    }

    pub fn is_empty(self) -> bool {
        self.0 == 0
    }
}

impl std::ops::BitOr for EventStatus {
    type Output = EventStatus;

    fn bitor(self, rhs: EventStatus) -> EventStatus {
        EventStatus(self.0 | rhs.0)
    }
}

// ============================================================================
// Events
// ============================================================================

/// Primary events carry air time; secondary events (comments, markers) do not
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub enum EventType {
    Primary,
    Secondary,
}

/// One item in a playout list
#[derive(Debug, Clone, PartialEq)]
pub struct Event {
    pub id: Uuid,
    pub event_type: EventType,
    pub on_air_time: TimeCode,
    pub duration: TimeCode,
    /// Start-of-message offset into the source material
    pub som: TimeCode,
    pub control: EventControl,
    pub status: EventStatus,
    pub title: String,
    /// Free text, used by audit markers
    pub comment: String,
}

impl Event {
    /// Primary event with zero SOM and no flags
    pub fn primary(title: impl Into<String>, on_air_time: TimeCode, duration: TimeCode) -> Self {
        let rate = on_air_time.rate();
        Self {
            id: Uuid::new_v4(),
            event_type: EventType::Primary,
            on_air_time,
            duration,
            som: TimeCode::zero(rate),
            control: EventControl::empty(),
            status: EventStatus::empty(),
            title: title.into(),
            comment: String::new(),
        }
    }

    /// Zero-length secondary comment event
    pub fn comment(comment: impl Into<String>, rate: FrameRate) -> Self {
        Self {
            id: Uuid::new_v4(),
            event_type: EventType::Secondary,
            on_air_time: TimeCode::zero(rate),
            duration: TimeCode::zero(rate),
            som: TimeCode::zero(rate),
            control: EventControl::empty(),
            status: EventStatus::empty(),
            title: String::new(),
            comment: comment.into(),
        }
    }

    pub fn is_primary(&self) -> bool {
        self.event_type == EventType::Primary
    }

    pub fn is_auto_timed(&self) -> bool {
        self.control.contains(EventControl::AUTO_TIMED)
    }

    pub fn is_auto_upcount(&self) -> bool {
        self.control.contains(EventControl::AUTO_UPCOUNT)
    }

    pub fn is_running(&self) -> bool {
        self.status.contains(EventStatus::RUNNING)
    }

    pub fn is_done(&self) -> bool {
        self.status.contains(EventStatus::DONE)
    }

    /// On-air time plus duration
    pub fn end_time(&self) -> TimeCode {
        self.on_air_time + self.duration
    }
}

// ============================================================================
// Lists
// ============================================================================

/// Role of a list on a playout server
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub enum ListType {
    /// Transmission list
    Sequence,
    /// Break-away content list
    Breakaway,
    Other,
}

/// Where an inserted event lands in a list
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertPosition {
    Head,
    Tail,
    /// Immediately after the event with this id
    After(Uuid),
}

/// Auto-On attribute of a transmission/break-away list pair
///
/// Tells the playout service how hard-start flags travel when events move
/// between the two lists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub enum AoAttribute {
    /// No propagation
    Off,
    /// The controller tags hard starts itself
    AutoOn,
    /// The service preserves hard starts on its own
    Save,
}

/// Index of the last primary event in `events`
pub fn last_primary_index(events: &[Event]) -> Option<usize> {
    events.iter().rposition(Event::is_primary)
}

/// Index of the first primary event strictly after `index`
pub fn next_primary_index(events: &[Event], index: usize) -> Option<usize> {
    events
        .iter()
        .enumerate()
        .skip(index + 1)
        .find(|(_, e)| e.is_primary())
        .map(|(i, _)| i)
}

/// Index of the last primary event strictly before `index`
pub fn previous_primary_index(events: &[Event], index: usize) -> Option<usize> {
    events[..index.min(events.len())].iter().rposition(Event::is_primary)
}
