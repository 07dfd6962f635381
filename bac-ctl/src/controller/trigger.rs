//! Break-away trigger
//!
//! **Responsibilities:**
//! - Compute the break geometry (when to cut, whether the on-air event is
//!   split, what remainder is left to resume later)
//! - Move the not-yet-aired content into the paired break-away list
//! - Append the caller's content to the transmission list, hard-started at
//!   the break time
//! - Bracket the mutation with un-thread / re-thread of the list pair

use super::core::BreakAwayController;
use crate::error::{Error, Result};
use crate::service::PlayoutListService;
use bac_common::config::{self, ChannelDescriptor};
use bac_common::events::{ChannelStatusChanged, ControlEvent, StatusChange};
use bac_common::list::{
    next_primary_index, previous_primary_index, AoAttribute, Event, EventControl, InsertPosition,
};
use bac_common::TimeCode;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Audit comment recorded on the transmission list when a break-away starts
pub const IMMEDIATE_MARKER: &str = "Immediate";

// ============================================================================
// Geometry
// ============================================================================

/// Everything the break decision depends on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GeometryInputs {
    /// Server clock when the trigger was received
    pub now: TimeCode,
    /// Time the playout engine needs before a list change can air
    pub latency: TimeCode,
    /// Shortest remainder a split may leave
    pub min_fragment: TimeCode,
    /// Duration stored on the on-air event
    pub saved_duration: TimeCode,
    /// Time left on the on-air event
    pub remaining: TimeCode,
    /// On-air event is open-ended
    pub upcount: bool,
    /// Duration of the next primary event, when there is one
    pub next_duration: Option<TimeCode>,
}

/// Remainder of a split event, resumed later from the break-away list
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Remainder {
    pub duration: TimeCode,
    pub som: TimeCode,
}

/// Transmission event the break is anchored to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BrokenEvent {
    /// The event on air when the trigger arrived
    #[default]
    OnAir,
    /// The primary event after it; it still airs, wholly or up to the split
    Next,
}

/// Outcome of the break decision
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BreakGeometry {
    /// When the break-away content airs
    pub break_time: TimeCode,
    /// Present when an event is split at the break
    pub remainder: Option<Remainder>,
    /// Last event to air before the break; everything after it is backed up
    pub broken_event: BrokenEvent,
}

impl BreakGeometry {
    fn split(break_time: TimeCode, duration: TimeCode, som: TimeCode) -> Self {
        Self {
            break_time,
            remainder: Some(Remainder { duration, som }),
            broken_event: BrokenEvent::OnAir,
        }
    }

    fn boundary(break_time: TimeCode) -> Self {
        Self {
            break_time,
            remainder: None,
            broken_event: BrokenEvent::OnAir,
        }
    }

    pub fn is_split(&self) -> bool {
        self.remainder.is_some()
    }
}

/// Decide where the break lands
///
/// Candidate break times are compared as offsets from `now` so a break that
/// straddles midnight is decided exactly like one that does not.
///
/// ```rust
/// use bac_common::{FrameRate, TimeCode};
/// use bac_ctl::controller::{compute_break_geometry, GeometryInputs};
///
/// let s = |n| TimeCode::from_seconds(n, FrameRate::Fps25);
/// let geometry = compute_break_geometry(&GeometryInputs {
///     now: s(100),
///     latency: s(10),
///     min_fragment: s(2),
///     saved_duration: s(30),
///     remaining: s(15),
///     upcount: false,
///     next_duration: None,
/// });
/// assert_eq!(geometry.break_time, s(110));
/// assert_eq!(geometry.remainder.unwrap().duration, s(5));
/// ```
pub fn compute_break_geometry(inputs: &GeometryInputs) -> BreakGeometry {
    let GeometryInputs {
        now,
        latency,
        min_fragment,
        saved_duration,
        remaining,
        upcount,
        next_duration,
    } = *inputs;
    let zero = TimeCode::zero(now.rate());

    if upcount {
        return BreakGeometry::split(now + latency, saved_duration, zero);
    }

    // Event ends exactly when the latency runs out: cut on the boundary
    if remaining == latency {
        return BreakGeometry::boundary(now + remaining);
    }

    // SOM is D-R+L on both sides of L+m, so the remainder always ends where
    // the event does
    let threshold = latency + min_fragment;
    if remaining >= threshold {
        let elapsed_at_break = saved_duration - remaining + latency;
        return BreakGeometry::split(now + latency, remaining - latency, elapsed_at_break);
    }

    if remaining < latency {
        if let Some(next) = next_duration {
            // now+R+m against now+L, then against the next event's end now+R+D2
            if remaining + min_fragment < latency {
                if min_fragment < next {
                    return BreakGeometry {
                        break_time: now + remaining + min_fragment,
                        remainder: Some(Remainder {
                            duration: next + min_fragment,
                            som: min_fragment,
                        }),
                        broken_event: BrokenEvent::Next,
                    };
                }
                return BreakGeometry {
                    broken_event: BrokenEvent::Next,
                    ..BreakGeometry::boundary(now + remaining + next)
                };
            }
        }
    }

    BreakGeometry::boundary(now + remaining)
}

// ============================================================================
// Trigger
// ============================================================================

/// Result of a successful trigger call
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TriggerOutcome {
    /// Content was spliced in and the channel is in break-away
    Triggered {
        geometry: BreakGeometry,
        notification: ChannelStatusChanged,
    },
    /// Nothing was on air; the lists were left untouched
    NothingOnAir,
}

impl<S: PlayoutListService> BreakAwayController<S> {
    /// Splice `content` into the transmission list `tx_list` on `server`
    ///
    /// Any failed mutation step returns [`Error::OperationFailed`]; the lists
    /// may then be partially modified.
    pub fn trigger_break_away(&self, server: &str, tx_list: u32, content: Vec<Event>) -> Result<TriggerOutcome> {
        let channel = ChannelDescriptor::new(server, tx_list);
        let config = self.configuration();
        info!(%channel, events = content.len(), "Break-away trigger received");

        if content.is_empty() {
            warn!(%channel, "Break-away content is empty");
            return Err(Error::OperationFailed);
        }

        let ba_list = self.paired_break_away_list(server, tx_list).ok_or_else(|| {
            warn!(%channel, "No break-away list paired with transmission list");
            Error::OperationFailed
        })?;

        let Some((on_air_id, remaining)) = self.access.on_air_position(server, tx_list) else {
            // Reported as success with nothing changed; see DESIGN.md
            warn!(%channel, "No event on air; break-away trigger ignored");
            return Ok(TriggerOutcome::NothingOnAir);
        };

        let tx_events = self.access.get_list(server, tx_list);
        let on_air_index = tx_events.iter().position(|e| e.id == on_air_id).ok_or_else(|| {
            warn!(%channel, %on_air_id, "On-air event missing from transmission list");
            Error::OperationFailed
        })?;
        let now = self.access.server_time_code(server, tx_list).ok_or(Error::OperationFailed)?;
        let rate = now.rate();

        let next_index = next_primary_index(&tx_events, on_air_index);
        let latency = i64::try_from(self.settings.latency_ms).map_err(|_| Error::OperationFailed)?;
        let min_fragment =
            i64::try_from(config::min_fragment_ms(&config, &channel)).map_err(|_| Error::OperationFailed)?;
        let inputs = GeometryInputs {
            now,
            latency: TimeCode::from_millis(latency, rate),
            min_fragment: TimeCode::from_millis(min_fragment, rate),
            saved_duration: tx_events[on_air_index].duration,
            remaining,
            upcount: tx_events[on_air_index].is_auto_upcount(),
            next_duration: next_index.map(|i| tx_events[i].duration),
        };
        let geometry = compute_break_geometry(&inputs);
        debug!(
            %channel,
            now = %now,
            remaining = %remaining,
            break_time = %geometry.break_time,
            split = geometry.is_split(),
            "Break geometry computed"
        );

        // Move the unaired content aside
        let broken_index = match geometry.broken_event {
            BrokenEvent::OnAir => on_air_index,
            BrokenEvent::Next => next_index.ok_or(Error::OperationFailed)?,
        };
        let broken_position = match geometry.remainder {
            Some(remainder) => {
                self.split_into_break_away(server, tx_list, ba_list, &tx_events, broken_index, remainder)?;
                tx_events[broken_index].id
            }
            None => {
                let resume_index = next_primary_index(&tx_events, broken_index);
                if let Some(resume) = resume_index {
                    if !self.access.fast_backup(server, tx_list, ba_list, tx_events[resume].id) {
                        return Err(Error::OperationFailed);
                    }
                }
                let boundary = resume_index.unwrap_or(tx_events.len());
                previous_primary_index(&tx_events, boundary)
                    .map(|i| tx_events[i].id)
                    .unwrap_or(tx_events[broken_index].id)
            }
        };

        // Append the break-away content, hard-started at the break time
        let mut content = content;
        tag_hard_start(&mut content[0], geometry.break_time);
        if !self.access.insert_event_list(server, tx_list, InsertPosition::Tail, content) {
            return Err(Error::OperationFailed);
        }
        if self.access.ao_attribute(server, tx_list, ba_list) != Some(AoAttribute::Save) {
            self.tag_break_away_head(server, ba_list, geometry.break_time);
        }

        let marker = Event::comment(IMMEDIATE_MARKER, rate);
        if !self.access.insert_event(server, tx_list, InsertPosition::After(broken_position), marker) {
            warn!(%channel, "Failed to record break-away marker");
        }

        // Commit the combined change to the playout engine
        let unthreaded = self.access.unthread(server, tx_list, ba_list);
        let rethreaded = self.access.thread(server, tx_list, ba_list);
        if !(unthreaded && rethreaded) {
            return Err(Error::OperationFailed);
        }

        if !self.access.set_break_away_state(server, tx_list, true) {
            warn!(%channel, "Playout service did not accept break-away state");
        }
        self.events.emit_lossy(ControlEvent::BreakAwayTriggered {
            channel: channel.clone(),
            break_away_list: ba_list,
            break_time: geometry.break_time.to_string(),
            split: geometry.is_split(),
            timestamp: chrono::Utc::now(),
        });
        info!(%channel, break_time = %geometry.break_time, split = geometry.is_split(), "Break-away triggered");

        let notification = self.notify_status(&channel, StatusChange::BreakAwayStarted);
        Ok(TriggerOutcome::Triggered { geometry, notification })
    }

    /// Back up everything after the broken event and park its remainder at
    /// the head of the break-away list
    fn split_into_break_away(
        &self,
        server: &str,
        tx_list: u32,
        ba_list: u32,
        tx_events: &[Event],
        broken_index: usize,
        remainder: Remainder,
    ) -> Result<()> {
        let broken = &tx_events[broken_index];

        let wanted = if broken.is_auto_timed() && !broken.is_running() {
            AoAttribute::Save
        } else {
            AoAttribute::AutoOn
        };
        if self.access.ao_attribute(server, tx_list, ba_list) != Some(wanted)
            && !self.access.set_ao_attribute(server, tx_list, ba_list, wanted)
        {
            return Err(Error::OperationFailed);
        }

        if let Some(next) = next_primary_index(tx_events, broken_index) {
            if !self.access.fast_backup(server, tx_list, ba_list, tx_events[next].id) {
                return Err(Error::OperationFailed);
            }
        }

        let mut parked = broken.clone();
        parked.id = Uuid::new_v4();
        parked.status.clear();
        parked.duration = remainder.duration;
        parked.som = remainder.som;
        if !self.access.insert_event(server, ba_list, InsertPosition::Head, parked) {
            return Err(Error::OperationFailed);
        }

        if !self.access.thread(server, tx_list, ba_list) {
            return Err(Error::OperationFailed);
        }
        Ok(())
    }

    /// Hard-start the first primary break-away event at `break_time`
    ///
    /// The backed-up events reach the break-away list asynchronously, so the
    /// list is polled a bounded number of times. Best effort: a miss is only
    /// logged.
    fn tag_break_away_head(&self, server: &str, ba_list: u32, break_time: TimeCode) -> bool {
        let attempts = self.settings.ao_poll_attempts;
        for attempt in 1..=attempts {
            let head = self
                .access
                .get_list(server, ba_list)
                .into_iter()
                .find(Event::is_primary);
            if let Some(mut head) = head {
                tag_hard_start(&mut head, break_time);
                debug!(server, ba_list, attempt, "Tagged break-away head event");
                return self.access.modify_event(server, ba_list, head);
            }
            if attempt < attempts {
                self.sleeper.sleep(self.settings.ao_poll_interval());
            }
        }
        warn!(server, ba_list, attempts, "Break-away head event never appeared");
        false
    }
}

fn tag_hard_start(event: &mut Event, at: TimeCode) {
    event.on_air_time = at;
    event.control.insert(EventControl::AUTO_TIMED);
}
