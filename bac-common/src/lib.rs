//! # Break-Away Controller Common Library
//!
//! Shared code for the break-away controller including:
//! - Frame-accurate timecode and circular interval containment
//! - Playout list and event model
//! - Break-away configuration and TOML loading
//! - Channel status notifications and the EventBus

pub mod config;
pub mod error;
pub mod events;
pub mod interval;
pub mod list;
pub mod timecode;

pub use error::{Error, Result};
pub use timecode::{FrameRate, TimeCode};
