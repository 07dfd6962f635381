//! Broken-position search
//!
//! Locates the break-away event that should be on air at the moment the
//! transmission list's break-away content runs out.

use super::core::BreakAwayController;
use crate::service::PlayoutListService;
use bac_common::config::{self, ChannelDescriptor};
use bac_common::interval::is_between;
use bac_common::list::{last_primary_index, Event};
use bac_common::TimeCode;
use tracing::debug;
use uuid::Uuid;

/// Resume point inside the break-away list
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BrokenPosition {
    pub event_id: Uuid,
    /// Air time left on the event from the resume point
    pub remaining: TimeCode,
    /// The transmission content ends in the gap before this event's hard
    /// start, so it has not begun and keeps its start time
    pub before_hard_start: bool,
}

impl<S: PlayoutListService> BreakAwayController<S> {
    /// Find where playback of the break-away list should pick up
    ///
    /// With `verify_min_fragment`, a resume point that would leave less than
    /// the channel's minimum fragment moves to the following event.
    pub fn find_broken_position(&self, server: &str, tx_list: u32, verify_min_fragment: bool) -> Option<BrokenPosition> {
        let ba_list = self.paired_break_away_list(server, tx_list)?;
        let config = self.configuration();
        let min_fragment_ms = config::min_fragment_ms(&config, &ChannelDescriptor::new(server, tx_list));

        let tx_events = self.access.get_list(server, tx_list);
        let ba_events = self.access.get_list(server, ba_list);
        locate_broken_position(&tx_events, &ba_events, min_fragment_ms, verify_min_fragment)
    }
}

/// Search `ba_events` for the event in progress when `tx_events` ends
pub(super) fn locate_broken_position(
    tx_events: &[Event],
    ba_events: &[Event],
    min_fragment_ms: u64,
    verify_min_fragment: bool,
) -> Option<BrokenPosition> {
    let last_tx = &tx_events[last_primary_index(tx_events)?];
    let tx_end = last_tx.end_time();
    let min_fragment = TimeCode::from_millis(i64::try_from(min_fragment_ms).ok()?, tx_end.rate());

    let candidates: Vec<&Event> = ba_events
        .iter()
        .filter(|e| e.is_primary() && !e.is_done())
        .collect();

    let mut tentative = None;
    // The gap before the first candidate opens where the last transmission
    // event starts
    let mut prev_end = last_tx.on_air_time;

    for (i, event) in candidates.iter().enumerate() {
        let start = event.on_air_time;
        let end = event.end_time();

        if event.is_running() && event.is_auto_upcount() {
            tentative = Some(full(event));
            prev_end = end;
            continue;
        }

        // [start, end)
        if is_between(tx_end, start, end) && tx_end != end {
            let remaining = end - tx_end;
            if verify_min_fragment && remaining < min_fragment {
                debug!(event = %event.id, %remaining, "Resume fragment too short, moving to next event");
                return candidates.get(i + 1).map(|next| full(next));
            }
            return Some(BrokenPosition {
                event_id: event.id,
                remaining,
                before_hard_start: false,
            });
        }

        // [prev_end, start): tx content ends in the gap before a hard start
        if event.is_auto_timed() && is_between(tx_end, prev_end, start) && tx_end != start {
            return Some(BrokenPosition {
                before_hard_start: true,
                ..full(event)
            });
        }

        prev_end = end;
    }

    tentative
}

fn full(event: &Event) -> BrokenPosition {
    BrokenPosition {
        event_id: event.id,
        remaining: event.duration,
        before_hard_start: false,
    }
}
