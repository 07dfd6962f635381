//! Error types for bac-ctl
//!
//! Playout service faults never appear here: the list access adapter has
//! already reduced them to boolean outcomes. What crosses the public boundary
//! is the single terminal failure of a trigger or return, plus the
//! configuration-absent case.

use bac_common::config::ChannelDescriptor;
use thiserror::Error;

/// Main error type for the controller
#[derive(Error, Debug)]
pub enum Error {
    /// A required list mutation reported failure; lists may be partially
    /// modified
    #[error("Break-away operation failed")]
    OperationFailed,

    /// The channel belongs to no break-away group, so no resume strategy
    /// applies
    #[error("No resume strategy configured for {channel}")]
    UnspecifiedResumeStrategy { channel: ChannelDescriptor },

    /// Configuration or timecode errors from the common library
    #[error(transparent)]
    Common(#[from] bac_common::Error),
}

/// Convenience Result type using bac-ctl Error
pub type Result<T> = std::result::Result<T, Error>;
