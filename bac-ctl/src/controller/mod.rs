//! Break-away controller
//!
//! **Module Structure:**
//! - `core.rs`: Construction, configuration slot, status queries, list pairing
//! - `trigger.rs`: Break geometry and the trigger operation
//! - `broken_position.rs`: Search for the resume point in the break-away list
//! - `resume.rs`: Resume-in-progress and resume-at-boundary returns
//! - `config_diff.rs`: Configuration replacement and status-change diff

mod broken_position;
mod config_diff;
mod core;
mod resume;
mod trigger;

pub use broken_position::BrokenPosition;
pub use config_diff::diff_configurations;
pub use core::{BreakAwayController, Sleeper, ThreadSleeper};
pub use resume::{JIP_MARKER, SLIDE_MARKER};
pub use trigger::{
    compute_break_geometry, BreakGeometry, BrokenEvent, GeometryInputs, Remainder, TriggerOutcome, IMMEDIATE_MARKER,
};
