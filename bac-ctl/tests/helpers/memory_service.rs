//! In-memory playout list service
//!
//! Behaves like a single playout server: lists keyed by (server, index),
//! moves on back-up/restore, one clock, one on-air position per list.
//! Mutations require the caller to hold the list lock, so any path that
//! skips the lock fails loudly.

use bac_common::list::{AoAttribute, Event, InsertPosition, ListType};
use bac_common::{FrameRate, TimeCode};
use bac_ctl::service::{PlayoutListService, ServiceFault, ServiceResult};
use std::collections::{HashMap, HashSet};
use std::sync::{Mutex, MutexGuard};
use uuid::Uuid;

type ListKey = (String, u32);

fn key(server: &str, list: u32) -> ListKey {
    (server.to_string(), list)
}

/// Observable state of the fake server
pub struct State {
    pub lists: HashMap<ListKey, Vec<Event>>,
    pub list_types: HashMap<ListKey, ListType>,
    pub list_counts: HashMap<String, u32>,
    pub on_air: HashMap<ListKey, (Uuid, TimeCode)>,
    pub clock: TimeCode,
    pub break_away: HashMap<ListKey, bool>,
    pub ao: HashMap<(String, u32, u32), AoAttribute>,
    pub threaded: HashSet<(String, u32, u32)>,

    /// Every call, in order, by trait method name
    pub calls: Vec<&'static str>,
    pub locks_held: HashMap<ListKey, String>,
    pub lock_count: usize,
    pub unlock_count: usize,

    /// Trait method names that fault when called
    pub failing: HashSet<&'static str>,
    /// Reads of a list that still see it empty (models asynchronous back-up)
    pub hidden_reads: HashMap<ListKey, u32>,
}

pub struct MemoryPlayoutService {
    state: Mutex<State>,
}

impl MemoryPlayoutService {
    pub fn new(rate: FrameRate) -> Self {
        Self {
            state: Mutex::new(State {
                lists: HashMap::new(),
                list_types: HashMap::new(),
                list_counts: HashMap::new(),
                on_air: HashMap::new(),
                clock: TimeCode::zero(rate),
                break_away: HashMap::new(),
                ao: HashMap::new(),
                threaded: HashSet::new(),
                calls: Vec::new(),
                locks_held: HashMap::new(),
                lock_count: 0,
                unlock_count: 0,
                failing: HashSet::new(),
                hidden_reads: HashMap::new(),
            }),
        }
    }

    pub fn state(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap()
    }

    /// Declare `count` lists on `server` with the given types (index from 1)
    pub fn with_lists(self, server: &str, types: &[ListType]) -> Self {
        {
            let mut state = self.state();
            state.list_counts.insert(server.to_string(), types.len() as u32);
            for (i, list_type) in types.iter().enumerate() {
                let index = i as u32 + 1;
                state.list_types.insert(key(server, index), *list_type);
                state.lists.insert(key(server, index), Vec::new());
            }
        }
        self
    }

    pub fn set_list(&self, server: &str, list: u32, events: Vec<Event>) {
        self.state().lists.insert(key(server, list), events);
    }

    pub fn list(&self, server: &str, list: u32) -> Vec<Event> {
        self.state().lists.get(&key(server, list)).cloned().unwrap_or_default()
    }

    pub fn set_on_air(&self, server: &str, list: u32, event: Uuid, remaining: TimeCode) {
        self.state().on_air.insert(key(server, list), (event, remaining));
    }

    pub fn set_clock(&self, now: TimeCode) {
        self.state().clock = now;
    }

    pub fn set_break_away(&self, server: &str, list: u32, active: bool) {
        self.state().break_away.insert(key(server, list), active);
    }

    pub fn is_break_away(&self, server: &str, list: u32) -> bool {
        self.state().break_away.get(&key(server, list)).copied().unwrap_or(false)
    }

    pub fn set_ao(&self, server: &str, tx_list: u32, ba_list: u32, attribute: AoAttribute) {
        self.state().ao.insert((server.to_string(), tx_list, ba_list), attribute);
    }

    pub fn fail(&self, operation: &'static str) {
        self.state().failing.insert(operation);
    }

    pub fn hide_reads(&self, server: &str, list: u32, reads: u32) {
        self.state().hidden_reads.insert(key(server, list), reads);
    }

    pub fn calls(&self) -> Vec<&'static str> {
        self.state().calls.clone()
    }

    pub fn called(&self, operation: &str) -> bool {
        self.state().calls.iter().any(|c| *c == operation)
    }

    /// Record the call and fault if it was marked failing
    fn enter(&self, operation: &'static str) -> ServiceResult<MutexGuard<'_, State>> {
        let mut state = self.state();
        state.calls.push(operation);
        if state.failing.contains(operation) {
            return Err(ServiceFault::Processing(format!("injected fault in {operation}")));
        }
        Ok(state)
    }
}

fn require_lock(state: &State, server: &str, list: u32) -> ServiceResult<()> {
    if state.locks_held.contains_key(&key(server, list)) {
        Ok(())
    } else {
        Err(ServiceFault::Generic(format!("{server}/{list} mutated without lock")))
    }
}

fn list_mut<'a>(state: &'a mut State, server: &str, list: u32) -> ServiceResult<&'a mut Vec<Event>> {
    state.lists.get_mut(&key(server, list)).ok_or(ServiceFault::ListNotEnabled)
}

fn position_of(events: &[Event], id: Uuid) -> ServiceResult<usize> {
    events
        .iter()
        .position(|e| e.id == id)
        .ok_or_else(|| ServiceFault::Event(format!("event {id} not found")))
}

fn insert_at(events: &mut Vec<Event>, position: InsertPosition, new: Vec<Event>) -> ServiceResult<()> {
    let index = match position {
        InsertPosition::Head => 0,
        InsertPosition::Tail => events.len(),
        InsertPosition::After(id) => position_of(events, id)? + 1,
    };
    events.splice(index..index, new);
    Ok(())
}

impl PlayoutListService for MemoryPlayoutService {
    fn get_list(&self, server: &str, list: u32) -> ServiceResult<Vec<Event>> {
        let mut state = self.enter("get_list")?;
        if let Some(hidden) = state.hidden_reads.get_mut(&key(server, list)) {
            if *hidden > 0 {
                *hidden -= 1;
                return Ok(Vec::new());
            }
        }
        state
            .lists
            .get(&key(server, list))
            .cloned()
            .ok_or(ServiceFault::ListNotEnabled)
    }

    fn insert_event(&self, server: &str, list: u32, position: InsertPosition, event: Event) -> ServiceResult<()> {
        let mut state = self.enter("insert_event")?;
        require_lock(&state, server, list)?;
        insert_at(list_mut(&mut state, server, list)?, position, vec![event])
    }

    fn insert_event_list(
        &self,
        server: &str,
        list: u32,
        position: InsertPosition,
        events: Vec<Event>,
    ) -> ServiceResult<()> {
        let mut state = self.enter("insert_event_list")?;
        require_lock(&state, server, list)?;
        insert_at(list_mut(&mut state, server, list)?, position, events)
    }

    fn modify_event(&self, server: &str, list: u32, event: Event) -> ServiceResult<()> {
        let mut state = self.enter("modify_event")?;
        require_lock(&state, server, list)?;
        let events = list_mut(&mut state, server, list)?;
        let index = position_of(events, event.id)?;
        events[index] = event;
        Ok(())
    }

    fn delete_all_events(&self, server: &str, list: u32) -> ServiceResult<()> {
        let mut state = self.enter("delete_all_events")?;
        require_lock(&state, server, list)?;
        list_mut(&mut state, server, list)?.clear();
        Ok(())
    }

    fn lock_list(&self, server: &str, list: u32, client: &str) -> ServiceResult<()> {
        let mut state = self.enter("lock_list")?;
        if state.locks_held.contains_key(&key(server, list)) {
            return Err(ServiceFault::ListLocked);
        }
        state.locks_held.insert(key(server, list), client.to_string());
        state.lock_count += 1;
        Ok(())
    }

    fn unlock_list(&self, server: &str, list: u32, client: &str) -> ServiceResult<()> {
        let mut state = self.enter("unlock_list")?;
        let held_by_client = state
            .locks_held
            .get(&key(server, list))
            .is_some_and(|holder| holder == client);
        if !held_by_client {
            return Err(ServiceFault::Generic(format!("{server}/{list} not locked by {client}")));
        }
        state.locks_held.remove(&key(server, list));
        state.unlock_count += 1;
        Ok(())
    }

    fn perform_list_thread(&self, server: &str, tx_list: u32, ba_list: u32) -> ServiceResult<()> {
        let mut state = self.enter("perform_list_thread")?;
        state.threaded.insert((server.to_string(), tx_list, ba_list));
        Ok(())
    }

    fn perform_list_unthread(&self, server: &str, tx_list: u32, ba_list: u32) -> ServiceResult<()> {
        let mut state = self.enter("perform_list_unthread")?;
        state.threaded.remove(&(server.to_string(), tx_list, ba_list));
        Ok(())
    }

    fn perform_break_away_fast_backup(
        &self,
        server: &str,
        tx_list: u32,
        ba_list: u32,
        from: Uuid,
    ) -> ServiceResult<()> {
        let mut state = self.enter("perform_break_away_fast_backup")?;
        let tx = list_mut(&mut state, server, tx_list)?;
        let index = position_of(tx, from)?;
        let moved: Vec<Event> = tx.drain(index..).collect();
        list_mut(&mut state, server, ba_list)?.extend(moved);
        Ok(())
    }

    fn perform_break_away_fast_restore(
        &self,
        server: &str,
        tx_list: u32,
        ba_list: u32,
        from: Option<Uuid>,
    ) -> ServiceResult<()> {
        let mut state = self.enter("perform_break_away_fast_restore")?;
        let ba = list_mut(&mut state, server, ba_list)?;
        let index = match from {
            Some(id) => position_of(ba, id)?,
            None => 0,
        };
        let moved: Vec<Event> = ba.drain(index..).collect();
        list_mut(&mut state, server, tx_list)?.extend(moved);
        Ok(())
    }

    fn get_on_air_event_position(&self, server: &str, list: u32) -> ServiceResult<Option<(Uuid, TimeCode)>> {
        let state = self.enter("get_on_air_event_position")?;
        Ok(state.on_air.get(&key(server, list)).copied())
    }

    fn get_server_time_code(&self, _server: &str, _list: u32) -> ServiceResult<TimeCode> {
        let state = self.enter("get_server_time_code")?;
        Ok(state.clock)
    }

    fn get_list_type(&self, server: &str, list: u32) -> ServiceResult<ListType> {
        let state = self.enter("get_list_type")?;
        state
            .list_types
            .get(&key(server, list))
            .copied()
            .ok_or(ServiceFault::ListNotEnabled)
    }

    fn get_list_count(&self, server: &str) -> ServiceResult<u32> {
        let state = self.enter("get_list_count")?;
        Ok(state.list_counts.get(server).copied().unwrap_or(0))
    }

    fn get_break_away_state(&self, server: &str, list: u32) -> ServiceResult<bool> {
        let state = self.enter("get_break_away_state")?;
        Ok(state.break_away.get(&key(server, list)).copied().unwrap_or(false))
    }

    fn change_break_away_state(&self, server: &str, list: u32, active: bool) -> ServiceResult<()> {
        let mut state = self.enter("change_break_away_state")?;
        state.break_away.insert(key(server, list), active);
        Ok(())
    }

    fn get_ao_attribute(&self, server: &str, tx_list: u32, ba_list: u32) -> ServiceResult<AoAttribute> {
        let state = self.enter("get_ao_attribute")?;
        Ok(state
            .ao
            .get(&(server.to_string(), tx_list, ba_list))
            .copied()
            .unwrap_or(AoAttribute::Off))
    }

    fn set_ao_attribute_for_list_pair(
        &self,
        server: &str,
        tx_list: u32,
        ba_list: u32,
        attribute: AoAttribute,
    ) -> ServiceResult<()> {
        let mut state = self.enter("set_ao_attribute_for_list_pair")?;
        state.ao.insert((server.to_string(), tx_list, ba_list), attribute);
        Ok(())
    }
}
