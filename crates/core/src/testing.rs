//! Instrumented engine doubles shared by the unit tests.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use staffplay_engine::{EngineFactory, EngineSettings, EventProducer, HostSurface, NotationEngine};
use staffplay_transport::{EngineEvent, EngineTrack, Score};

use crate::{PlayerConfig, Session};

#[derive(Debug, Clone, PartialEq)]
pub enum EngineCall {
    PlayPause,
    Stop,
    MasterVolume(f32),
    MasterTune(i32),
    TrackMute(usize, bool),
    TrackVolume(usize, f32),
    Destroy,
}

/// Engine that only records the commands it receives.
#[derive(Debug, Default)]
pub struct RecordingEngine {
    pub calls: Vec<EngineCall>,
}

impl NotationEngine for RecordingEngine {
    fn play_pause(&mut self) {
        self.calls.push(EngineCall::PlayPause);
    }

    fn stop(&mut self) {
        self.calls.push(EngineCall::Stop);
    }

    fn set_master_volume(&mut self, volume: f32) {
        self.calls.push(EngineCall::MasterVolume(volume));
    }

    fn set_master_tune(&mut self, cents: i32) {
        self.calls.push(EngineCall::MasterTune(cents));
    }

    fn set_track_mute(&mut self, index: usize, muted: bool) {
        self.calls.push(EngineCall::TrackMute(index, muted));
    }

    fn set_track_volume(&mut self, index: usize, volume: f32) {
        self.calls.push(EngineCall::TrackVolume(index, volume));
    }

    fn destroy(&mut self) {
        self.calls.push(EngineCall::Destroy);
    }
}

/// Shared bookkeeping of every instance a [`FakeFactory`] built.
#[derive(Default)]
pub struct Rig {
    pub live: Cell<usize>,
    pub max_live: Cell<usize>,
    pub created: Cell<usize>,
    pub fail_next: Cell<bool>,
    pub last_settings: RefCell<Option<EngineSettings>>,
    calls: RefCell<Vec<EngineCall>>,
    producers: RefCell<Vec<EventProducer<EngineEvent>>>,
}

impl Rig {
    /// Push an event from the most recently constructed instance.
    pub fn emit(&self, event: EngineEvent) -> bool {
        let count = self.producers.borrow().len();
        count > 0 && self.emit_from(count - 1, event)
    }

    /// Push an event from the `instance`-th constructed engine. Returns false
    /// when that instance has been torn down.
    pub fn emit_from(&self, instance: usize, event: EngineEvent) -> bool {
        let mut producers = self.producers.borrow_mut();
        match producers.get_mut(instance) {
            Some(producer) if !producer.is_abandoned() => producer.push(event).is_ok(),
            _ => false,
        }
    }

    pub fn calls(&self) -> Vec<EngineCall> {
        self.calls.borrow().clone()
    }

    pub fn clear_calls(&self) {
        self.calls.borrow_mut().clear();
    }
}

pub struct FakeEngine {
    rig: Rc<Rig>,
}

impl FakeEngine {
    fn record(&self, call: EngineCall) {
        self.rig.calls.borrow_mut().push(call);
    }
}

impl NotationEngine for FakeEngine {
    fn play_pause(&mut self) {
        self.record(EngineCall::PlayPause);
    }

    fn stop(&mut self) {
        self.record(EngineCall::Stop);
    }

    fn set_master_volume(&mut self, volume: f32) {
        self.record(EngineCall::MasterVolume(volume));
    }

    fn set_master_tune(&mut self, cents: i32) {
        self.record(EngineCall::MasterTune(cents));
    }

    fn set_track_mute(&mut self, index: usize, muted: bool) {
        self.record(EngineCall::TrackMute(index, muted));
    }

    fn set_track_volume(&mut self, index: usize, volume: f32) {
        self.record(EngineCall::TrackVolume(index, volume));
    }

    fn destroy(&mut self) {
        self.record(EngineCall::Destroy);
    }
}

impl Drop for FakeEngine {
    fn drop(&mut self) {
        self.rig.live.set(self.rig.live.get() - 1);
    }
}

#[derive(Debug, Default)]
pub struct FakeSurface {
    pub drawn: bool,
    pub clears: usize,
}

impl HostSurface for FakeSurface {
    fn clear(&mut self) {
        self.drawn = false;
        self.clears += 1;
    }

    fn scroll_target(&self) -> Option<String> {
        Some("score-scroll".to_string())
    }
}

pub struct FakeFactory {
    rig: Rc<Rig>,
}

impl EngineFactory for FakeFactory {
    type Engine = FakeEngine;
    type Surface = FakeSurface;

    fn create(
        &mut self,
        surface: &mut FakeSurface,
        settings: EngineSettings,
        events: EventProducer<EngineEvent>,
    ) -> anyhow::Result<FakeEngine> {
        assert!(!surface.drawn, "surface still holds a previous score");
        if self.rig.fail_next.take() {
            anyhow::bail!("no audio context available");
        }

        let rig = &self.rig;
        rig.live.set(rig.live.get() + 1);
        rig.max_live.set(rig.max_live.get().max(rig.live.get()));
        rig.created.set(rig.created.get() + 1);
        *rig.last_settings.borrow_mut() = Some(settings);
        rig.producers.borrow_mut().push(events);
        surface.drawn = true;

        Ok(FakeEngine { rig: rig.clone() })
    }
}

pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

pub fn session_with(config: PlayerConfig) -> (Session<FakeFactory>, Rc<Rig>) {
    init_logging();
    let rig = Rc::new(Rig::default());
    let factory = FakeFactory { rig: rig.clone() };
    (Session::new(factory, FakeSurface::default(), config), rig)
}

pub fn session() -> (Session<FakeFactory>, Rc<Rig>) {
    session_with(PlayerConfig::default())
}

pub fn score(track_names: &[&str]) -> Score {
    Score {
        title: "Canon in D".to_string(),
        artist: "Pachelbel".to_string(),
        tracks: track_names.iter().map(|n| EngineTrack::new(*n)).collect(),
    }
}
