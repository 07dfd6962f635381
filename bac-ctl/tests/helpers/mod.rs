//! Test helper modules for bac-ctl integration tests
//!
//! Provides reusable test infrastructure components:
//! - MemoryPlayoutService: in-memory playout server with fault injection and
//!   lock accounting
//! - CountingSleeper: records break-away polls without waiting
//! - Fixtures: a one-server channel with a transmission/break-away list pair

#![allow(dead_code)]

pub mod memory_service;

pub use memory_service::MemoryPlayoutService;

use bac_common::config::{BreakAwayGroup, ChannelDescriptor, Configuration, ControllerSettings};
use bac_common::list::{Event, EventStatus, ListType};
use bac_common::{FrameRate, TimeCode};
use bac_ctl::controller::{BreakAwayController, Sleeper};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

pub const SERVER: &str = "MAIN1";
pub const TX: u32 = 1;
pub const BA: u32 = 2;
pub const RATE: FrameRate = FrameRate::Fps25;

pub type TestController = BreakAwayController<MemoryPlayoutService>;

/// Seconds at the fixture frame rate
pub fn secs(n: i64) -> TimeCode {
    TimeCode::from_seconds(n, RATE)
}

/// Counts sleeps instead of blocking
#[derive(Clone, Default)]
pub struct CountingSleeper {
    pub count: Arc<AtomicUsize>,
}

impl CountingSleeper {
    pub fn sleeps(&self) -> usize {
        self.count.load(Ordering::SeqCst)
    }
}

impl Sleeper for CountingSleeper {
    fn sleep(&self, _duration: Duration) {
        self.count.fetch_add(1, Ordering::SeqCst);
    }
}

/// Break-away group governing the fixture channel
pub fn group(jip: bool) -> BreakAwayGroup {
    BreakAwayGroup {
        name: "News".to_string(),
        channels: vec![ChannelDescriptor::new(SERVER, TX)],
        default_path: "/playout/default".to_string(),
        sequence_path: "/playout/news".to_string(),
        min_fragment_ms: 2_000,
        jip,
    }
}

/// One server, list 1 transmission, list 2 break-away
pub fn service() -> MemoryPlayoutService {
    MemoryPlayoutService::new(RATE).with_lists(SERVER, &[ListType::Sequence, ListType::Breakaway])
}

/// Controller with 10 s latency and the fixture group
pub fn controller(service: MemoryPlayoutService, jip: bool) -> (TestController, CountingSleeper) {
    controller_with(service, Configuration::new(vec![group(jip)]))
}

pub fn controller_with(service: MemoryPlayoutService, configuration: Configuration) -> (TestController, CountingSleeper) {
    let sleeper = CountingSleeper::default();
    let settings = ControllerSettings {
        latency_ms: 10_000,
        client_name: "TestClient".to_string(),
        ..ControllerSettings::default()
    };
    let controller = BreakAwayController::new(service, settings, configuration).with_sleeper(sleeper.clone());
    (controller, sleeper)
}

/// Transmission schedule A (100 s, 30 s), B (130 s, 20 s), C (150 s, 10 s)
/// with A on air
pub fn schedule(service: &MemoryPlayoutService) -> [Event; 3] {
    let mut a = Event::primary("A", secs(100), secs(30));
    a.status.insert(EventStatus::RUNNING);
    let b = Event::primary("B", secs(130), secs(20));
    let c = Event::primary("C", secs(150), secs(10));
    service.set_list(SERVER, TX, vec![a.clone(), b.clone(), c.clone()]);
    [a, b, c]
}

/// Put `event` on air with `remaining` left and move the clock accordingly
pub fn on_air(service: &MemoryPlayoutService, event: &Event, remaining: TimeCode) {
    service.set_on_air(SERVER, TX, event.id, remaining);
    service.set_clock(event.end_time() - remaining);
}

/// Break-away content payload
pub fn content(titles: &[&str]) -> Vec<Event> {
    titles
        .iter()
        .map(|title| Event::primary(*title, secs(0), secs(60)))
        .collect()
}

pub fn service_of(controller: &TestController) -> &MemoryPlayoutService {
    controller.list_access().service()
}

pub fn titles(events: &[Event]) -> Vec<String> {
    events
        .iter()
        .map(|e| {
            if e.is_primary() {
                e.title.clone()
            } else {
                format!("#{}", e.comment)
            }
        })
        .collect()
}
