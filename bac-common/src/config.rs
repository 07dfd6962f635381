//! Break-away configuration model and TOML loading
//!
//! A configuration is an ordered list of break-away groups, each naming the
//! channels it governs. Lookups (`group_for`, `min_fragment_ms`,
//! `resume_strategy`, `channel_status`) take the configuration explicitly so
//! that callers always work on one consistent snapshot.
//!
//! # File Format
//!
//! ```toml
//! [controller]
//! latency_ms = 10000
//! client_name = "BAC"
//!
//! [[groups]]
//! name = "News"
//! default_path = "/media/default"
//! sequence_path = "/media/news"
//! min_fragment_ms = 2000
//! jip = true
//! channels = [{ server = "MAIN1", list = 1 }]
//! ```

use crate::events::ChannelStatus;
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::time::Duration;

// ============================================================================
// Channels and Groups
// ============================================================================

/// One controlled transmission list: (server name, list index)
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ChannelDescriptor {
    pub server: String,
    pub list: u32,
}

impl ChannelDescriptor {
    pub fn new(server: impl Into<String>, list: u32) -> Self {
        Self {
            server: server.into(),
            list,
        }
    }
}

impl fmt::Display for ChannelDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.server, self.list)
    }
}

/// Named policy bucket shared by a set of channels
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BreakAwayGroup {
    pub name: String,
    #[serde(default)]
    pub channels: Vec<ChannelDescriptor>,
    #[serde(default)]
    pub default_path: String,
    #[serde(default)]
    pub sequence_path: String,
    /// Shortest remainder a split may leave, in milliseconds
    #[serde(default)]
    pub min_fragment_ms: u64,
    /// true: resume in progress; false: resume at the next boundary
    #[serde(default)]
    pub jip: bool,
}

impl BreakAwayGroup {
    pub fn contains(&self, channel: &ChannelDescriptor) -> bool {
        self.channels.iter().any(|c| c == channel)
    }
}

/// Ordered set of break-away groups
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Configuration {
    #[serde(default)]
    pub groups: Vec<BreakAwayGroup>,
}

impl Configuration {
    pub fn new(groups: Vec<BreakAwayGroup>) -> Self {
        Self { groups }
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    /// Every channel in group order, first occurrence only
    pub fn channels(&self) -> Vec<ChannelDescriptor> {
        let mut seen: Vec<ChannelDescriptor> = Vec::new();
        for channel in self.groups.iter().flat_map(|g| g.channels.iter()) {
            if !seen.contains(channel) {
                seen.push(channel.clone());
            }
        }
        seen
    }

    pub fn contains(&self, channel: &ChannelDescriptor) -> bool {
        self.group_for(channel).is_some()
    }

    /// First group governing `channel`
    pub fn group_for(&self, channel: &ChannelDescriptor) -> Option<&BreakAwayGroup> {
        self.groups.iter().find(|g| g.contains(channel))
    }
}

// ============================================================================
// Lookups
// ============================================================================

/// How a channel comes back from break-away
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub enum ResumeStrategy {
    /// Join the interrupted event at its elapsed position
    JoinInProgress,
    /// Resume at the next natural event boundary
    Slide,
    /// Channel has no group; no resume is possible
    Unspecified,
}

impl fmt::Display for ResumeStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResumeStrategy::JoinInProgress => write!(f, "JoinInProgress"),
            ResumeStrategy::Slide => write!(f, "Slide"),
            ResumeStrategy::Unspecified => write!(f, "Unspecified"),
        }
    }
}

/// Minimum fragment of the channel's group, 0 when ungoverned
pub fn min_fragment_ms(config: &Configuration, channel: &ChannelDescriptor) -> u64 {
    config
        .group_for(channel)
        .map(|g| g.min_fragment_ms)
        .unwrap_or(0)
}

pub fn resume_strategy(config: &Configuration, channel: &ChannelDescriptor) -> ResumeStrategy {
    match config.group_for(channel) {
        Some(group) if group.jip => ResumeStrategy::JoinInProgress,
        Some(_) => ResumeStrategy::Slide,
        None => ResumeStrategy::Unspecified,
    }
}

/// Project configuration plus live break-away state into a channel status
pub fn channel_status(
    config: &Configuration,
    channel: &ChannelDescriptor,
    in_break_away: bool,
) -> ChannelStatus {
    match config.group_for(channel) {
        Some(group) => ChannelStatus {
            has_break_away: true,
            in_break_away,
            default_path: group.default_path.clone(),
            sequence_path: group.sequence_path.clone(),
        },
        None => ChannelStatus {
            has_break_away: false,
            in_break_away,
            default_path: String::new(),
            sequence_path: String::new(),
        },
    }
}

// ============================================================================
// Controller Settings
// ============================================================================

const DEFAULT_LATENCY_MS: u64 = 10_000;
const DEFAULT_CLIENT_NAME: &str = "BreakAwayController";
const DEFAULT_AO_POLL_ATTEMPTS: u32 = 20;
const DEFAULT_AO_POLL_INTERVAL_MS: u64 = 50;
/// Longest span on the 24 hour timeline
const MAX_SPAN_MS: u64 = 86_400_000;

/// Engine tuning that is not per-channel
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ControllerSettings {
    /// Time the playout engine needs between a list change and air
    pub latency_ms: u64,
    /// Identity used when locking lists
    pub client_name: String,
    /// Attempts to find the break-away head event after back-up
    pub ao_poll_attempts: u32,
    pub ao_poll_interval_ms: u64,
}

impl ControllerSettings {
    pub fn ao_poll_interval(&self) -> Duration {
        Duration::from_millis(self.ao_poll_interval_ms)
    }
}

impl Default for ControllerSettings {
    fn default() -> Self {
        Self {
            latency_ms: DEFAULT_LATENCY_MS,
            client_name: DEFAULT_CLIENT_NAME.to_string(),
            ao_poll_attempts: DEFAULT_AO_POLL_ATTEMPTS,
            ao_poll_interval_ms: DEFAULT_AO_POLL_INTERVAL_MS,
        }
    }
}

/// Whole configuration document: settings plus groups
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ControllerConfig {
    #[serde(default)]
    pub controller: ControllerSettings,
    #[serde(default)]
    pub groups: Vec<BreakAwayGroup>,
}

impl ControllerConfig {
    /// Parse and validate a TOML document
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: ControllerConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a TOML file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config = Self::from_toml_str(&content)?;
        tracing::info!(
            path = %path.display(),
            groups = config.groups.len(),
            "Loaded break-away configuration"
        );
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.controller.client_name.trim().is_empty() {
            return Err(Error::Config("client_name must not be empty".to_string()));
        }
        if self.controller.ao_poll_attempts == 0 {
            return Err(Error::Config("ao_poll_attempts must be at least 1".to_string()));
        }
        if self.controller.latency_ms > MAX_SPAN_MS {
            return Err(Error::Config(format!(
                "latency_ms {} exceeds one day",
                self.controller.latency_ms
            )));
        }
        for group in &self.groups {
            if group.min_fragment_ms > MAX_SPAN_MS {
                return Err(Error::Config(format!(
                    "Group {:?} min_fragment_ms {} exceeds one day",
                    group.name, group.min_fragment_ms
                )));
            }
            for channel in &group.channels {
                if channel.server.trim().is_empty() {
                    return Err(Error::Config(format!(
                        "Group {:?} has a channel with an empty server name",
                        group.name
                    )));
                }
                if channel.list == 0 {
                    return Err(Error::Config(format!(
                        "Group {:?} references list 0 on {} (lists are numbered from 1)",
                        group.name, channel.server
                    )));
                }
            }
        }
        Ok(())
    }

    /// Group part of the document
    pub fn configuration(&self) -> Configuration {
        Configuration::new(self.groups.clone())
    }
}
