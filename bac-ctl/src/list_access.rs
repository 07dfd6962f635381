//! List Access Adapter
//!
//! Every call to the playout list service goes through [`ListAccess`]. Faults
//! are logged and reduced to `false`, an empty list, or `None`; nothing is
//! retried. Inserts, modifications and deletions run under the list lock,
//! acquired with the controller's client name and released by a scoped guard
//! on every exit path.

use crate::service::{PlayoutListService, ServiceResult};
use bac_common::list::{AoAttribute, Event, InsertPosition, ListType};
use bac_common::TimeCode;
use tracing::warn;
use uuid::Uuid;

/// Fault-swallowing wrapper around a [`PlayoutListService`]
pub struct ListAccess<S> {
    service: S,
    client_name: String,
}

impl<S: PlayoutListService> ListAccess<S> {
    pub fn new(service: S, client_name: impl Into<String>) -> Self {
        Self {
            service,
            client_name: client_name.into(),
        }
    }

    /// Underlying service (for callers that own a test double)
    pub fn service(&self) -> &S {
        &self.service
    }

    pub fn client_name(&self) -> &str {
        &self.client_name
    }

    // ========================================================================
    // Uniform call shapes
    // ========================================================================

    /// Run `op`, mapping any fault to `false`
    pub fn try_bool<F>(&self, operation: &str, op: F) -> bool
    where
        F: FnOnce(&S) -> ServiceResult<()>,
    {
        match op(&self.service) {
            Ok(()) => true,
            Err(fault) => {
                warn!(operation, error = %fault, "Playout service call failed");
                false
            }
        }
    }

    /// Run `op`, mapping any fault to an empty sequence
    pub fn try_list<T, F>(&self, operation: &str, op: F) -> Vec<T>
    where
        F: FnOnce(&S) -> ServiceResult<Vec<T>>,
    {
        match op(&self.service) {
            Ok(items) => items,
            Err(fault) => {
                warn!(operation, error = %fault, "Playout service call failed");
                Vec::new()
            }
        }
    }

    /// Run `op`, mapping any fault to `None`
    pub fn try_value<T, F>(&self, operation: &str, op: F) -> Option<T>
    where
        F: FnOnce(&S) -> ServiceResult<T>,
    {
        match op(&self.service) {
            Ok(value) => Some(value),
            Err(fault) => {
                warn!(operation, error = %fault, "Playout service call failed");
                None
            }
        }
    }

    // ========================================================================
    // Locking
    // ========================================================================

    /// Acquire the list lock; released when the guard drops
    pub fn lock(&self, server: &str, list: u32) -> Option<ListLock<'_, S>> {
        let acquired = self.try_bool("lock_list", |s| s.lock_list(server, list, &self.client_name));
        acquired.then(|| ListLock {
            access: self,
            server: server.to_string(),
            list,
        })
    }

    fn locked<F>(&self, server: &str, list: u32, operation: &str, op: F) -> bool
    where
        F: FnOnce(&S) -> ServiceResult<()>,
    {
        match self.lock(server, list) {
            Some(_guard) => self.try_bool(operation, op),
            None => false,
        }
    }

    // ========================================================================
    // Reads
    // ========================================================================

    pub fn get_list(&self, server: &str, list: u32) -> Vec<Event> {
        self.try_list("get_list", |s| s.get_list(server, list))
    }

    pub fn on_air_position(&self, server: &str, list: u32) -> Option<(Uuid, TimeCode)> {
        self.try_value("get_on_air_event_position", |s| {
            s.get_on_air_event_position(server, list)
        })
        .flatten()
    }

    pub fn server_time_code(&self, server: &str, list: u32) -> Option<TimeCode> {
        self.try_value("get_server_time_code", |s| s.get_server_time_code(server, list))
    }

    pub fn list_type(&self, server: &str, list: u32) -> Option<ListType> {
        self.try_value("get_list_type", |s| s.get_list_type(server, list))
    }

    pub fn list_count(&self, server: &str) -> Option<u32> {
        self.try_value("get_list_count", |s| s.get_list_count(server))
    }

    /// Break-away state as reported by the service; a fault reads as inactive
    pub fn break_away_state(&self, server: &str, list: u32) -> bool {
        self.try_value("get_break_away_state", |s| s.get_break_away_state(server, list))
            .unwrap_or(false)
    }

    pub fn ao_attribute(&self, server: &str, tx_list: u32, ba_list: u32) -> Option<AoAttribute> {
        self.try_value("get_ao_attribute", |s| s.get_ao_attribute(server, tx_list, ba_list))
    }

    // ========================================================================
    // Locked mutations
    // ========================================================================

    pub fn insert_event(&self, server: &str, list: u32, position: InsertPosition, event: Event) -> bool {
        self.locked(server, list, "insert_event", |s| {
            s.insert_event(server, list, position, event)
        })
    }

    pub fn insert_event_list(
        &self,
        server: &str,
        list: u32,
        position: InsertPosition,
        events: Vec<Event>,
    ) -> bool {
        self.locked(server, list, "insert_event_list", |s| {
            s.insert_event_list(server, list, position, events)
        })
    }

    pub fn modify_event(&self, server: &str, list: u32, event: Event) -> bool {
        self.locked(server, list, "modify_event", |s| s.modify_event(server, list, event))
    }

    pub fn delete_all_events(&self, server: &str, list: u32) -> bool {
        self.locked(server, list, "delete_all_events", |s| s.delete_all_events(server, list))
    }

    // ========================================================================
    // List pair operations
    // ========================================================================

    pub fn thread(&self, server: &str, tx_list: u32, ba_list: u32) -> bool {
        self.try_bool("perform_list_thread", |s| {
            s.perform_list_thread(server, tx_list, ba_list)
        })
    }

    pub fn unthread(&self, server: &str, tx_list: u32, ba_list: u32) -> bool {
        self.try_bool("perform_list_unthread", |s| {
            s.perform_list_unthread(server, tx_list, ba_list)
        })
    }

    pub fn fast_backup(&self, server: &str, tx_list: u32, ba_list: u32, from: Uuid) -> bool {
        self.try_bool("perform_break_away_fast_backup", |s| {
            s.perform_break_away_fast_backup(server, tx_list, ba_list, from)
        })
    }

    pub fn fast_restore(&self, server: &str, tx_list: u32, ba_list: u32, from: Option<Uuid>) -> bool {
        self.try_bool("perform_break_away_fast_restore", |s| {
            s.perform_break_away_fast_restore(server, tx_list, ba_list, from)
        })
    }

    pub fn set_break_away_state(&self, server: &str, list: u32, active: bool) -> bool {
        self.try_bool("change_break_away_state", |s| {
            s.change_break_away_state(server, list, active)
        })
    }

    pub fn set_ao_attribute(&self, server: &str, tx_list: u32, ba_list: u32, attribute: AoAttribute) -> bool {
        self.try_bool("set_ao_attribute_for_list_pair", |s| {
            s.set_ao_attribute_for_list_pair(server, tx_list, ba_list, attribute)
        })
    }
}

/// Held list lock; unlocks exactly once when dropped
pub struct ListLock<'a, S: PlayoutListService> {
    access: &'a ListAccess<S>,
    server: String,
    list: u32,
}

impl<S: PlayoutListService> Drop for ListLock<'_, S> {
    fn drop(&mut self) {
        let access = self.access;
        let (server, list) = (&self.server, self.list);
        access.try_bool("unlock_list", |s| s.unlock_list(server, list, &access.client_name));
    }
}
