//! Drive a session without a browser: `cargo run --example headless -- song.musicxml`.
//!
//! The stand-in engine only counts `<score-part` elements and reports one
//! track per part, which is enough to exercise the controller end to end.

use std::path::PathBuf;

use staffplay_core::{
    Candidate, EngineEvent, EngineFactory, EngineSettings, EngineTrack, EventProducer, HostSurface,
    NoFetch, NotationEngine, PlayerConfig, PlayerState, Score, Session, SourceReader,
    session_to_snapshot,
};

struct ConsoleSurface;

impl HostSurface for ConsoleSurface {
    fn clear(&mut self) {
        log::debug!("surface cleared");
    }

    fn scroll_target(&self) -> Option<String> {
        None
    }
}

struct ConsoleEngine {
    events: EventProducer<EngineEvent>,
    playing: bool,
}

impl NotationEngine for ConsoleEngine {
    fn play_pause(&mut self) {
        self.playing = !self.playing;
        let state = if self.playing {
            PlayerState::Playing
        } else {
            PlayerState::Paused
        };
        let _ = self.events.push(EngineEvent::PlayerStateChanged {
            state,
            stopped: false,
        });
    }

    fn stop(&mut self) {
        self.playing = false;
        let _ = self.events.push(EngineEvent::PlayerStateChanged {
            state: PlayerState::Paused,
            stopped: true,
        });
    }

    fn set_master_volume(&mut self, volume: f32) {
        log::info!("master volume {volume}");
    }

    fn set_master_tune(&mut self, cents: i32) {
        log::info!("master tune {cents} cents");
    }

    fn set_track_mute(&mut self, index: usize, muted: bool) {
        log::info!("track {index} muted: {muted}");
    }

    fn set_track_volume(&mut self, index: usize, volume: f32) {
        log::info!("track {index} volume {volume}");
    }
}

struct ConsoleFactory;

impl EngineFactory for ConsoleFactory {
    type Engine = ConsoleEngine;
    type Surface = ConsoleSurface;

    fn create(
        &mut self,
        _surface: &mut ConsoleSurface,
        settings: EngineSettings,
        mut events: EventProducer<EngineEvent>,
    ) -> anyhow::Result<ConsoleEngine> {
        let text = String::from_utf8_lossy(&settings.file);
        let parts = text.matches("<score-part ").count();
        let score = Score {
            tracks: (0..parts).map(|i| EngineTrack::new(format!("Part {}", i + 1))).collect(),
            ..Score::default()
        };
        let _ = events.push(EngineEvent::ScoreParsed(Some(score)));
        let _ = events.push(EngineEvent::RenderFinished);

        Ok(ConsoleEngine {
            events,
            playing: false,
        })
    }
}

fn main() -> anyhow::Result<()> {
    env_logger::init();

    let paths: Vec<PathBuf> = std::env::args().skip(1).map(PathBuf::from).collect();
    if paths.is_empty() {
        anyhow::bail!("usage: headless <score.musicxml>...");
    }

    let reader = SourceReader::new(NoFetch);
    let mut session = Session::new(ConsoleFactory, ConsoleSurface, PlayerConfig::load());

    let candidates = paths.into_iter().map(Candidate::from_path).collect();
    let offer = session.offer_files(candidates, &reader);
    println!("offer: {offer:?}");
    if session.active_name().is_none() {
        session.choose_file(0, &reader);
    }
    session.poll();

    session.play_pause();
    session.poll();
    session.stop();
    session.poll();

    println!("{}", serde_json::to_string_pretty(&session_to_snapshot(&session))?);
    Ok(())
}
