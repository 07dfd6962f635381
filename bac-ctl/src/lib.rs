//! # Break-Away Controller Library (bac-ctl)
//!
//! Decision core for splicing break-away content into a live playout
//! transmission list and resuming the original sequence afterwards.
//!
//! **Purpose:** Compute frame-accurate break geometry, drive the list
//! mutations through a fault-swallowing adapter over the playout list
//! service, and announce per-channel status changes.
//!
//! **Architecture:** Synchronous engines over a [`service::PlayoutListService`]
//! trait; notifications are returned to the caller and broadcast on a
//! [`bac_common::events::EventBus`].

pub mod controller;
pub mod error;
pub mod list_access;
pub mod service;

pub use controller::{BreakAwayController, TriggerOutcome};
pub use error::{Error, Result};
pub use list_access::ListAccess;
pub use service::{PlayoutListService, ServiceFault, ServiceResult};
