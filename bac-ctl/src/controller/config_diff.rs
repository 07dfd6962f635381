//! Configuration replacement
//!
//! Turns a configuration change into the per-channel status notifications a
//! listener needs to stay in sync.

use super::core::BreakAwayController;
use crate::service::PlayoutListService;
use bac_common::config::{self, ChannelDescriptor, Configuration};
use bac_common::events::{ChannelStatusChanged, StatusChange};
use tracing::info;

/// Status changes implied by moving from `old` to `new`
///
/// A first configuration (no groups in `old`) reports every channel as
/// [`StatusChange::Present`]. Otherwise removals come first, in `old` order,
/// followed by additions and updates in `new` order. Channels whose status is
/// unchanged produce nothing.
pub fn diff_configurations<F>(old: &Configuration, new: &Configuration, in_break_away: F) -> Vec<ChannelStatusChanged>
where
    F: Fn(&ChannelDescriptor) -> bool,
{
    let new_channels = new.channels();

    if old.is_empty() {
        return new_channels
            .into_iter()
            .map(|channel| {
                let status = config::channel_status(new, &channel, in_break_away(&channel));
                ChannelStatusChanged::new(channel, status, StatusChange::Present)
            })
            .collect();
    }

    let old_channels = old.channels();
    let mut changes = Vec::new();

    for channel in old_channels.iter().filter(|c| !new_channels.contains(c)) {
        let status = config::channel_status(new, channel, in_break_away(channel));
        changes.push(ChannelStatusChanged::new(channel.clone(), status, StatusChange::Removed));
    }

    for channel in new_channels {
        let active = in_break_away(&channel);
        let status = config::channel_status(new, &channel, active);
        if old_channels.contains(&channel) {
            if config::channel_status(old, &channel, active) != status {
                changes.push(ChannelStatusChanged::new(channel, status, StatusChange::Updated));
            }
        } else {
            changes.push(ChannelStatusChanged::new(channel, status, StatusChange::Added));
        }
    }

    changes
}

impl<S: PlayoutListService> BreakAwayController<S> {
    /// Install `new` as the live configuration and announce what changed
    pub fn apply_configuration(&self, new: Configuration) -> Vec<ChannelStatusChanged> {
        let old = self.configuration();
        let changes = diff_configurations(&old, &new, |channel| {
            self.access.break_away_state(&channel.server, channel.list)
        });
        info!(groups = new.groups.len(), changes = changes.len(), "Configuration replaced");

        self.replace_configuration(new);
        for change in &changes {
            self.notify(change);
        }
        changes
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bac_common::config::BreakAwayGroup;

    fn group(name: &str, path: &str, channels: &[(&str, u32)]) -> BreakAwayGroup {
        BreakAwayGroup {
            name: name.to_string(),
            channels: channels
                .iter()
                .map(|(server, list)| ChannelDescriptor::new(*server, *list))
                .collect(),
            default_path: path.to_string(),
            sequence_path: format!("{path}/seq"),
            min_fragment_ms: 2_000,
            jip: false,
        }
    }

    fn idle(_: &ChannelDescriptor) -> bool {
        false
    }

    fn kinds(changes: &[ChannelStatusChanged]) -> Vec<(String, StatusChange)> {
        changes
            .iter()
            .map(|c| (c.channel.to_string(), c.change))
            .collect()
    }

    #[test]
    fn test_first_configuration_reports_present() {
        let new = Configuration::new(vec![group("news", "/news", &[("A", 1), ("B", 2)])]);
        let changes = diff_configurations(&Configuration::default(), &new, idle);

        assert_eq!(
            kinds(&changes),
            vec![
                ("A/1".to_string(), StatusChange::Present),
                ("B/2".to_string(), StatusChange::Present),
            ]
        );
        assert!(changes.iter().all(|c| c.status.has_break_away));
    }

    #[test]
    fn test_identical_configuration_is_silent() {
        let config = Configuration::new(vec![group("news", "/news", &[("A", 1), ("B", 2)])]);
        assert!(diff_configurations(&config, &config.clone(), idle).is_empty());
    }

    #[test]
    fn test_removals_precede_additions() {
        let old = Configuration::new(vec![group("news", "/news", &[("A", 1), ("B", 2)])]);
        let new = Configuration::new(vec![group("news", "/news", &[("B", 2), ("C", 3)])]);
        let changes = diff_configurations(&old, &new, idle);

        assert_eq!(
            kinds(&changes),
            vec![
                ("A/1".to_string(), StatusChange::Removed),
                ("C/3".to_string(), StatusChange::Added),
            ]
        );
        assert!(!changes[0].status.has_break_away);
        assert!(changes[1].status.has_break_away);
    }

    #[test]
    fn test_path_change_is_an_update() {
        let old = Configuration::new(vec![group("news", "/news", &[("A", 1)])]);
        let new = Configuration::new(vec![group("news", "/other", &[("A", 1)])]);
        let changes = diff_configurations(&old, &new, idle);

        assert_eq!(kinds(&changes), vec![("A/1".to_string(), StatusChange::Updated)]);
        assert_eq!(changes[0].status.default_path, "/other");
    }

    #[test]
    fn test_removed_channel_keeps_live_break_away_state() {
        let old = Configuration::new(vec![group("news", "/news", &[("A", 1)])]);
        let new = Configuration::new(vec![group("sport", "/sport", &[("B", 1)])]);
        let changes = diff_configurations(&old, &new, |c| c.server == "A");

        assert_eq!(changes[0].change, StatusChange::Removed);
        assert!(changes[0].status.in_break_away);
        assert!(!changes[0].status.has_break_away);
    }

    #[test]
    fn test_emptying_configuration_removes_everything() {
        let old = Configuration::new(vec![group("news", "/news", &[("A", 1), ("B", 2)])]);
        let changes = diff_configurations(&old, &Configuration::default(), idle);

        assert_eq!(changes.len(), 2);
        assert!(changes.iter().all(|c| c.change == StatusChange::Removed));
    }
}
