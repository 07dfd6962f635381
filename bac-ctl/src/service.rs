//! Playout list service contract
//!
//! The playout list service stores and plays the lists. It is reached through
//! this narrow synchronous trait; every call may fail with a [`ServiceFault`].
//! The controller never inspects which fault occurred: the
//! [`crate::list_access::ListAccess`] adapter reduces every fault to a
//! boolean or empty outcome.

use bac_common::list::{AoAttribute, Event, InsertPosition, ListType};
use bac_common::TimeCode;
use thiserror::Error;
use uuid::Uuid;

/// Closed set of faults the playout list service reports
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ServiceFault {
    #[error("Processing error: {0}")]
    Processing(String),

    #[error("List not enabled")]
    ListNotEnabled,

    #[error("List locked by another client")]
    ListLocked,

    #[error("Event fault: {0}")]
    Event(String),

    #[error("Service fault: {0}")]
    Generic(String),
}

pub type ServiceResult<T> = std::result::Result<T, ServiceFault>;

/// Synchronous API of the external playout list service
///
/// The authenticated session is owned by the implementation. Lists are
/// numbered from 1 per server.
pub trait PlayoutListService {
    fn get_list(&self, server: &str, list: u32) -> ServiceResult<Vec<Event>>;

    fn insert_event(
        &self,
        server: &str,
        list: u32,
        position: InsertPosition,
        event: Event,
    ) -> ServiceResult<()>;

    fn insert_event_list(
        &self,
        server: &str,
        list: u32,
        position: InsertPosition,
        events: Vec<Event>,
    ) -> ServiceResult<()>;

    /// Replace the stored event carrying `event.id`
    fn modify_event(&self, server: &str, list: u32, event: Event) -> ServiceResult<()>;

    fn delete_all_events(&self, server: &str, list: u32) -> ServiceResult<()>;

    fn lock_list(&self, server: &str, list: u32, client: &str) -> ServiceResult<()>;

    fn unlock_list(&self, server: &str, list: u32, client: &str) -> ServiceResult<()>;

    /// Pair `tx_list` with `ba_list` so the engine plays them together
    fn perform_list_thread(&self, server: &str, tx_list: u32, ba_list: u32) -> ServiceResult<()>;

    fn perform_list_unthread(&self, server: &str, tx_list: u32, ba_list: u32) -> ServiceResult<()>;

    /// Move events from `from` (inclusive) to the end of `tx_list` onto the
    /// end of `ba_list`
    fn perform_break_away_fast_backup(
        &self,
        server: &str,
        tx_list: u32,
        ba_list: u32,
        from: Uuid,
    ) -> ServiceResult<()>;

    /// Move break-away events from `from` (inclusive, or the whole list when
    /// `None`) onto the end of `tx_list`
    fn perform_break_away_fast_restore(
        &self,
        server: &str,
        tx_list: u32,
        ba_list: u32,
        from: Option<Uuid>,
    ) -> ServiceResult<()>;

    /// On-air event id and its remaining duration, `None` when idle
    fn get_on_air_event_position(
        &self,
        server: &str,
        list: u32,
    ) -> ServiceResult<Option<(Uuid, TimeCode)>>;

    /// Server clock, carrying the list's frame rate
    fn get_server_time_code(&self, server: &str, list: u32) -> ServiceResult<TimeCode>;

    fn get_list_type(&self, server: &str, list: u32) -> ServiceResult<ListType>;

    fn get_list_count(&self, server: &str) -> ServiceResult<u32>;

    fn get_break_away_state(&self, server: &str, list: u32) -> ServiceResult<bool>;

    fn change_break_away_state(&self, server: &str, list: u32, active: bool) -> ServiceResult<()>;

    fn get_ao_attribute(&self, server: &str, tx_list: u32, ba_list: u32) -> ServiceResult<AoAttribute>;

    fn set_ao_attribute_for_list_pair(
        &self,
        server: &str,
        tx_list: u32,
        ba_list: u32,
        attribute: AoAttribute,
    ) -> ServiceResult<()>;
}
