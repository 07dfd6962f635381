//! Return from break-away
//!
//! **Strategies:**
//! - Resume in progress (Jip): pick the break-away list up where it would be
//!   now, trimming the event in progress
//! - Resume at boundary (Slide): replay the break-away list from its head
//!   after the transmission content

use super::broken_position::{locate_broken_position, BrokenPosition};
use super::core::BreakAwayController;
use crate::error::{Error, Result};
use crate::service::PlayoutListService;
use bac_common::config::{self, ChannelDescriptor, ResumeStrategy};
use bac_common::events::{ChannelStatusChanged, ControlEvent, StatusChange};
use bac_common::list::{last_primary_index, AoAttribute, Event, EventControl, InsertPosition};
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Audit comment left by a resume-in-progress return
pub const JIP_MARKER: &str = "Jip";
/// Audit comment left by a resume-at-boundary return
pub const SLIDE_MARKER: &str = "Return / From Break-Away";

impl<S: PlayoutListService> BreakAwayController<S> {
    /// Return `tx_list` from break-away with the channel's configured strategy
    pub fn return_from_break_away(&self, server: &str, tx_list: u32) -> Result<ChannelStatusChanged> {
        let channel = ChannelDescriptor::new(server, tx_list);
        match self.resume_strategy(&channel) {
            ResumeStrategy::JoinInProgress => self.return_resume_in_progress(server, tx_list),
            ResumeStrategy::Slide => self.return_at_boundary(server, tx_list),
            ResumeStrategy::Unspecified => {
                warn!(%channel, "Channel belongs to no break-away group");
                Err(Error::UnspecifiedResumeStrategy { channel })
            }
        }
    }

    /// Resume the break-away list at the point it would have reached
    pub fn return_resume_in_progress(&self, server: &str, tx_list: u32) -> Result<ChannelStatusChanged> {
        let channel = ChannelDescriptor::new(server, tx_list);
        let ba_list = self.break_away_in_progress(&channel)?;
        let config = self.configuration();
        info!(%channel, ba_list, "Returning from break-away (resume in progress)");

        let tx_events = self.access.get_list(server, tx_list);
        let return_marker = last_primary_index(&tx_events).map(|i| tx_events[i].id);
        let ba_events = self.access.get_list(server, ba_list);
        let broken = locate_broken_position(
            &tx_events,
            &ba_events,
            config::min_fragment_ms(&config, &channel),
            true,
        );
        debug!(%channel, ?broken, "Broken position located");

        if !self.access.unthread(server, tx_list, ba_list) {
            return Err(Error::OperationFailed);
        }

        let prepared = match broken {
            Some(position) => self.trim_resume_event(server, ba_list, &ba_events, position),
            None => self.release_head_hard_start(server, tx_list, ba_list, &ba_events),
        };
        let restored = prepared
            && self
                .access
                .fast_restore(server, tx_list, ba_list, broken.map(|p| p.event_id));

        if restored {
            self.insert_marker(server, tx_list, return_marker, JIP_MARKER);
        }

        let cleared = restored && self.access.delete_all_events(server, ba_list);
        // Re-thread whatever happened above
        let rethreaded = self.access.thread(server, tx_list, ba_list);
        if !(cleared && rethreaded) {
            warn!(%channel, restored, cleared, rethreaded, "Resume in progress failed");
            return Err(Error::OperationFailed);
        }

        Ok(self.finish_return(&channel, ResumeStrategy::JoinInProgress, broken.map(|p| p.event_id)))
    }

    /// Replay the whole break-away list after the transmission content
    pub fn return_at_boundary(&self, server: &str, tx_list: u32) -> Result<ChannelStatusChanged> {
        let channel = ChannelDescriptor::new(server, tx_list);
        let ba_list = self.break_away_in_progress(&channel)?;
        info!(%channel, ba_list, "Returning from break-away (resume at boundary)");

        let tx_events = self.access.get_list(server, tx_list);
        let return_marker = tx_events.last().map(|e| e.id);
        let ba_events = self.access.get_list(server, ba_list);

        if !self.release_head_hard_start(server, tx_list, ba_list, &ba_events) {
            return Err(Error::OperationFailed);
        }
        if !self.access.fast_restore(server, tx_list, ba_list, None) {
            return Err(Error::OperationFailed);
        }

        self.insert_marker(server, tx_list, return_marker, SLIDE_MARKER);

        if !self.access.delete_all_events(server, ba_list) {
            return Err(Error::OperationFailed);
        }

        Ok(self.finish_return(&channel, ResumeStrategy::Slide, None))
    }

    // ========================================================================
    // Steps
    // ========================================================================

    /// Paired break-away list, provided the channel is in break-away
    fn break_away_in_progress(&self, channel: &ChannelDescriptor) -> Result<u32> {
        if !self.access.break_away_state(&channel.server, channel.list) {
            info!(%channel, "Return requested but channel is not in break-away");
            return Err(Error::OperationFailed);
        }
        self.paired_break_away_list(&channel.server, channel.list).ok_or_else(|| {
            warn!(%channel, "No break-away list paired with transmission list");
            Error::OperationFailed
        })
    }

    /// Shorten the resume event to what is left of it and make it follow on,
    /// unless it is still waiting for its hard start
    fn trim_resume_event(&self, server: &str, ba_list: u32, ba_events: &[Event], position: BrokenPosition) -> bool {
        let Some(mut event) = ba_events.iter().find(|e| e.id == position.event_id).cloned() else {
            warn!(server, ba_list, event = %position.event_id, "Resume event vanished from break-away list");
            return false;
        };

        if event.duration != position.remaining {
            let played = event.duration - position.remaining;
            event.som = played + event.som;
            event.duration = position.remaining;
        }
        if !position.before_hard_start {
            event.control.remove(EventControl::AUTO_TIMED);
        }
        self.access.modify_event(server, ba_list, event)
    }

    /// Drop the hard start of the first primary break-away event unless the
    /// service preserves hard starts itself
    fn release_head_hard_start(&self, server: &str, tx_list: u32, ba_list: u32, ba_events: &[Event]) -> bool {
        if self.access.ao_attribute(server, tx_list, ba_list) == Some(AoAttribute::Save) {
            return true;
        }
        match ba_events.iter().find(|e| e.is_primary()) {
            Some(head) if head.is_auto_timed() => {
                let mut head = head.clone();
                head.control.remove(EventControl::AUTO_TIMED);
                self.access.modify_event(server, ba_list, head)
            }
            _ => true,
        }
    }

    /// Best-effort audit comment after `after`, or at the head when the list
    /// had nothing to anchor to
    fn insert_marker(&self, server: &str, tx_list: u32, after: Option<Uuid>, text: &str) {
        let rate = self
            .access
            .server_time_code(server, tx_list)
            .map(|now| now.rate())
            .unwrap_or_default();
        let position = after.map_or(InsertPosition::Head, InsertPosition::After);
        if !self.access.insert_event(server, tx_list, position, Event::comment(text, rate)) {
            warn!(server, tx_list, marker = text, "Failed to record return marker");
        }
    }

    fn finish_return(
        &self,
        channel: &ChannelDescriptor,
        strategy: ResumeStrategy,
        resumed_event: Option<Uuid>,
    ) -> ChannelStatusChanged {
        if !self.access.set_break_away_state(&channel.server, channel.list, false) {
            warn!(%channel, "Playout service did not accept break-away state");
        }
        self.events.emit_lossy(ControlEvent::BreakAwayReturned {
            channel: channel.clone(),
            strategy,
            resumed_event,
            timestamp: chrono::Utc::now(),
        });
        info!(%channel, %strategy, "Returned from break-away");
        self.notify_status(channel, StatusChange::BreakAwayEnded)
    }
}
