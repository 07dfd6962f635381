//! Controller core
//!
//! **Responsibilities:**
//! - Own the list access adapter, settings, event bus and configuration slot
//! - Derive channel status and resume strategy from a configuration snapshot
//! - Resolve the break-away list paired with a transmission list
//! - Emit status notifications

use crate::list_access::ListAccess;
use crate::service::PlayoutListService;
use bac_common::config::{
    self, ChannelDescriptor, Configuration, ControllerConfig, ControllerSettings, ResumeStrategy,
};
use bac_common::events::{
    ChannelStatus, ChannelStatusChanged, ControlEvent, EventBus, EventReceiver, StatusChange,
};
use bac_common::list::ListType;
use std::sync::{Arc, RwLock};
use std::time::Duration;
use tracing::{debug, info};

const EVENT_BUS_CAPACITY: usize = 256;

/// Blocking pause used between polls of the break-away list
pub trait Sleeper: Send + Sync {
    fn sleep(&self, duration: Duration);
}

/// Sleeps the calling thread
#[derive(Debug, Default, Clone, Copy)]
pub struct ThreadSleeper;

impl Sleeper for ThreadSleeper {
    fn sleep(&self, duration: Duration) {
        std::thread::sleep(duration);
    }
}

/// Decision core of the break-away controller
///
/// All operations are synchronous and run on the caller's thread. The live
/// configuration sits in one slot; every operation takes a snapshot at entry
/// so a concurrent [`BreakAwayController::apply_configuration`] never changes
/// the configuration under a running trigger or return.
pub struct BreakAwayController<S> {
    pub(super) access: ListAccess<S>,
    pub(super) settings: ControllerSettings,
    pub(super) config: RwLock<Arc<Configuration>>,
    pub(super) events: EventBus,
    pub(super) sleeper: Box<dyn Sleeper>,
}

impl<S: PlayoutListService> BreakAwayController<S> {
    pub fn new(service: S, settings: ControllerSettings, configuration: Configuration) -> Self {
        info!(
            client = %settings.client_name,
            latency_ms = settings.latency_ms,
            groups = configuration.groups.len(),
            "Break-away controller initialized"
        );
        Self {
            access: ListAccess::new(service, settings.client_name.clone()),
            settings,
            config: RwLock::new(Arc::new(configuration)),
            events: EventBus::new(EVENT_BUS_CAPACITY),
            sleeper: Box::new(ThreadSleeper),
        }
    }

    /// Build from a loaded configuration document
    pub fn from_config(service: S, config: ControllerConfig) -> Self {
        let configuration = config.configuration();
        Self::new(service, config.controller, configuration)
    }

    /// Replace the sleeper used by the break-away poll
    pub fn with_sleeper(mut self, sleeper: impl Sleeper + 'static) -> Self {
        self.sleeper = Box::new(sleeper);
        self
    }

    pub fn subscribe(&self) -> EventReceiver {
        self.events.subscribe()
    }

    pub fn event_bus(&self) -> &EventBus {
        &self.events
    }

    pub fn list_access(&self) -> &ListAccess<S> {
        &self.access
    }

    pub fn settings(&self) -> &ControllerSettings {
        &self.settings
    }

    /// Snapshot of the live configuration
    pub fn configuration(&self) -> Arc<Configuration> {
        let slot = self.config.read().unwrap_or_else(|poisoned| poisoned.into_inner());
        Arc::clone(&slot)
    }

    pub(super) fn replace_configuration(&self, configuration: Configuration) {
        let mut slot = self.config.write().unwrap_or_else(|poisoned| poisoned.into_inner());
        *slot = Arc::new(configuration);
    }

    // ========================================================================
    // Status queries
    // ========================================================================

    /// Current status of `channel`, recomputed from configuration and service
    pub fn channel_status(&self, channel: &ChannelDescriptor) -> ChannelStatus {
        let config = self.configuration();
        self.status_under(&config, channel)
    }

    pub(super) fn status_under(&self, config: &Configuration, channel: &ChannelDescriptor) -> ChannelStatus {
        let in_break_away = self.access.break_away_state(&channel.server, channel.list);
        config::channel_status(config, channel, in_break_away)
    }

    pub fn resume_strategy(&self, channel: &ChannelDescriptor) -> ResumeStrategy {
        config::resume_strategy(&self.configuration(), channel)
    }

    /// Break-away list paired with `tx_list` on `server`
    ///
    /// The n-th Sequence list pairs with the n-th Breakaway list, counting
    /// lists from 1.
    pub fn paired_break_away_list(&self, server: &str, tx_list: u32) -> Option<u32> {
        let count = self.access.list_count(server)?;

        let mut sequences = Vec::new();
        let mut break_aways = Vec::new();
        for index in 1..=count {
            match self.access.list_type(server, index) {
                Some(ListType::Sequence) => sequences.push(index),
                Some(ListType::Breakaway) => break_aways.push(index),
                _ => {}
            }
        }

        let position = sequences.iter().position(|&l| l == tx_list)?;
        let paired = break_aways.get(position).copied();
        debug!(server, tx_list, ?paired, "Resolved break-away list pairing");
        paired
    }

    // ========================================================================
    // Notifications
    // ========================================================================

    pub(super) fn notify(&self, notification: &ChannelStatusChanged) {
        info!(
            channel = %notification.channel,
            change = %notification.change,
            has_break_away = notification.status.has_break_away,
            in_break_away = notification.status.in_break_away,
            "Channel status changed"
        );
        self.events.emit_lossy(ControlEvent::status_changed(notification));
    }

    /// Recompute status, emit, and return the notification
    pub(super) fn notify_status(&self, channel: &ChannelDescriptor, change: StatusChange) -> ChannelStatusChanged {
        let notification = ChannelStatusChanged::new(channel.clone(), self.channel_status(channel), change);
        self.notify(&notification);
        notification
    }
}
