use serde::{Deserialize, Serialize};
use staffplay_engine::{EngineFactory, EngineHost, EngineInitError, NotationEngine};
use staffplay_source::{Candidate, Fetcher, ReadError, ScoreBuffer, SourceInput, SourceReader};
use staffplay_transport::{EngineEvent, PlaybackState, Score, TrackControl, TransportState, TuningPreset};

use crate::config::PlayerConfig;
use crate::error::{EngineRuntimeError, SessionError};
use crate::files::{FileList, Offer};
use crate::tracks::TrackControls;
use crate::transport::TransportSync;

/// Shown when an offer contained no notation files.
pub const NO_COMPATIBLE_FILES: &str = "No MusicXML files found.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionPhase {
    #[default]
    Idle,
    Loading,
    Ready,
    Error,
}

/// Identifies one load attempt. Hand it back to [`Session::complete_read`]
/// once the source bytes are available.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadTicket {
    request_id: u64,
    name: String,
}

impl LoadTicket {
    pub fn request_id(&self) -> u64 {
        self.request_id
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadOutcome {
    /// The engine was constructed; the session waits for the parsed score.
    Started,
    /// The load failed and the session is in the error phase.
    Failed,
    /// A newer request superseded this one; its result was discarded.
    Stale,
}

/// The playback session controller: one loaded score at a time.
///
/// All state transitions happen here. Source reads may run elsewhere; their
/// results come back through [`Session::complete_read`] and are checked
/// against the current request. Engine notifications are drained with
/// [`Session::poll`].
pub struct Session<F: EngineFactory> {
    host: EngineHost<F>,
    phase: SessionPhase,
    request_id: u64,
    active_name: Option<String>,
    score_title: Option<String>,
    notice: Option<String>,
    error: Option<SessionError>,
    tracks: TrackControls,
    transport: TransportSync,
    files: FileList,
}

impl<F: EngineFactory> Session<F> {
    pub fn new(factory: F, surface: F::Surface, config: PlayerConfig) -> Self {
        Self {
            host: EngineHost::new(factory, surface, config.engine_options()),
            phase: SessionPhase::Idle,
            request_id: 0,
            active_name: None,
            score_title: None,
            notice: None,
            error: None,
            tracks: TrackControls::default(),
            transport: TransportSync::new(config.default_transport()),
            files: FileList::default(),
        }
    }

    /// Start a new load attempt for the source called `name`.
    ///
    /// Any previous engine instance is released immediately and every
    /// earlier ticket becomes stale.
    pub fn begin_load(&mut self, name: impl Into<String>) -> LoadTicket {
        let name = name.into();
        self.request_id += 1;
        self.host.invalidate(self.request_id);

        self.phase = SessionPhase::Loading;
        self.active_name = Some(name.clone());
        self.clear_derived();

        log::info!(target: "session", "loading '{name}' (request {})", self.request_id);
        LoadTicket {
            request_id: self.request_id,
            name,
        }
    }

    /// Resume a load once its source has been read.
    pub fn complete_read(
        &mut self,
        ticket: LoadTicket,
        result: Result<ScoreBuffer, ReadError>,
    ) -> LoadOutcome {
        if ticket.request_id != self.request_id {
            match &result {
                Ok(_) => log::debug!(
                    target: "session",
                    "discarding stale read of '{}' (request {} < {})",
                    ticket.name,
                    ticket.request_id,
                    self.request_id
                ),
                Err(e) => log::debug!(
                    target: "session",
                    "swallowing stale read failure of '{}': {e}",
                    ticket.name
                ),
            }
            return LoadOutcome::Stale;
        }

        let buffer = match result {
            Ok(buffer) => buffer,
            Err(e) => {
                self.fail(e.into());
                return LoadOutcome::Failed;
            }
        };

        match self.host.replace(ticket.request_id, &buffer) {
            Ok(()) => LoadOutcome::Started,
            Err(EngineInitError::Superseded { .. }) => LoadOutcome::Stale,
            Err(e) => {
                self.fail(e.into());
                LoadOutcome::Failed
            }
        }
    }

    /// Read `input` with `reader` and hand it to the engine in one step.
    pub fn load<R: Fetcher>(&mut self, input: &SourceInput, reader: &SourceReader<R>) -> LoadOutcome {
        let ticket = self.begin_load(input.display_name());
        let result = reader.read(input);
        self.complete_read(ticket, result)
    }

    /// Offer files from the host's file selection.
    ///
    /// Only notation files are kept. A single one is loaded right away;
    /// several have to be picked with [`Session::choose_file`].
    pub fn offer_files<R: Fetcher>(
        &mut self,
        candidates: Vec<Candidate>,
        reader: &SourceReader<R>,
    ) -> Offer {
        let offer = self.files.offer(candidates);
        match offer {
            Offer::NoCompatibleFiles => {
                self.reset();
                self.notice = Some(NO_COMPATIBLE_FILES.to_string());
            }
            Offer::AutoLoad => {
                self.choose_file(0, reader);
            }
            Offer::Choose(count) => {
                log::info!(target: "session", "{count} files listed, waiting for a choice");
            }
        }
        offer
    }

    /// Mark file entry `index` active and start loading it. The caller reads
    /// the returned input and completes the ticket.
    pub fn begin_file(&mut self, index: usize) -> Option<(LoadTicket, SourceInput)> {
        let candidate = self.files.activate(index)?.clone();
        let ticket = self.begin_load(candidate.name);
        Some((ticket, candidate.input))
    }

    pub fn choose_file<R: Fetcher>(&mut self, index: usize, reader: &SourceReader<R>) -> Option<LoadOutcome> {
        let (ticket, input) = self.begin_file(index)?;
        let result = reader.read(&input);
        Some(self.complete_read(ticket, result))
    }

    /// Back to idle: the engine is released and all derived state dropped.
    /// Pending loads become stale.
    pub fn reset(&mut self) {
        self.request_id += 1;
        self.host.invalidate(self.request_id);
        self.phase = SessionPhase::Idle;
        self.active_name = None;
        self.files.clear_active();
        self.clear_derived();
        log::info!(target: "session", "session reset");
    }

    fn clear_derived(&mut self) {
        self.tracks.clear();
        self.transport.reset();
        self.score_title = None;
        self.notice = None;
        self.error = None;
    }

    fn fail(&mut self, error: SessionError) {
        log::warn!(
            target: "session",
            "load of '{}' failed: {error}",
            self.active_name.as_deref().unwrap_or("<unknown>")
        );
        self.phase = SessionPhase::Error;
        self.tracks.clear();
        self.transport.reset();
        self.score_title = None;
        self.error = Some(error);
    }

    /// Apply every event the live engine queued since the last poll.
    /// Returns whether anything was applied.
    pub fn poll(&mut self) -> bool {
        let events = self.host.drain_events();
        let changed = !events.is_empty();
        for event in events {
            self.handle_event(event);
        }
        changed
    }

    /// Apply one event of the current engine instance.
    pub fn handle_event(&mut self, event: EngineEvent) {
        match event {
            EngineEvent::ScoreParsed(Some(score)) => self.on_score_parsed(score),
            EngineEvent::ScoreParsed(None) => {
                let name = self.active_name.clone().unwrap_or_default();
                self.on_runtime_error(EngineRuntimeError::EmptyScore { name });
            }
            EngineEvent::RenderFinished => {
                log::info!(
                    target: "session",
                    "render finished for '{}'",
                    self.active_name.as_deref().unwrap_or_default()
                );
            }
            EngineEvent::PlayerStateChanged { state, stopped } => {
                if self.phase == SessionPhase::Ready {
                    self.transport
                        .on_state_changed(PlaybackState::from_player(state, stopped));
                } else {
                    log::debug!(target: "session", "player state {state:?} ignored in {:?}", self.phase);
                }
            }
            EngineEvent::PlayerFinished => {
                if self.phase == SessionPhase::Ready {
                    self.transport.on_finished();
                }
            }
            EngineEvent::Error(fault) => {
                let name = self.active_name.as_deref().unwrap_or_default();
                let error = EngineRuntimeError::from_fault(&fault, name);
                self.on_runtime_error(error);
            }
        }
    }

    fn on_score_parsed(&mut self, score: Score) {
        if self.phase != SessionPhase::Loading {
            log::debug!(target: "session", "score parsed ignored in {:?}", self.phase);
            return;
        }

        self.tracks.replace(&score.tracks);
        self.transport.reset();
        if let Some(engine) = self.host.engine_mut() {
            self.transport.apply_to(engine);
        }
        self.score_title = Some(score.headline());
        self.phase = SessionPhase::Ready;

        log::info!(
            target: "session",
            "'{}' ready with {} track(s)",
            self.active_name.as_deref().unwrap_or_default(),
            self.tracks.len()
        );
    }

    fn on_runtime_error(&mut self, error: EngineRuntimeError) {
        match self.phase {
            SessionPhase::Loading => self.fail(error.into()),
            SessionPhase::Ready => {
                // Transport commands are refused in Error.
                if let Some(engine) = self.host.engine_mut() {
                    engine.stop();
                }
                self.fail(error.into());
            }
            phase => log::debug!(target: "session", "engine error ignored in {phase:?}: {error}"),
        }
    }

    pub fn set_master_volume(&mut self, volume: f32) -> bool {
        self.transport.set_master_volume(self.host.engine_mut(), volume)
    }

    pub fn set_master_tune_cents(&mut self, cents: i32) -> bool {
        self.transport.set_master_tune_cents(self.host.engine_mut(), cents)
    }

    pub fn apply_tuning(&mut self, preset: TuningPreset) -> bool {
        self.transport.apply_preset(self.host.engine_mut(), preset)
    }

    pub fn play_pause(&mut self) -> bool {
        let ready = self.controls_enabled();
        self.transport.play_pause(self.host.engine_mut(), ready)
    }

    pub fn stop(&mut self) -> bool {
        let ready = self.controls_enabled();
        self.transport.stop(self.host.engine_mut(), ready)
    }

    pub fn set_track_muted(&mut self, index: usize, muted: bool) -> bool {
        self.tracks.set_muted(self.host.engine_mut(), index, muted)
    }

    pub fn toggle_track_muted(&mut self, index: usize) -> bool {
        self.tracks.toggle_muted(self.host.engine_mut(), index)
    }

    pub fn set_track_volume(&mut self, index: usize, volume: f32) -> bool {
        self.tracks.set_volume(self.host.engine_mut(), index, volume)
    }

    pub fn toggle_track_highlight(&mut self, index: usize) -> bool {
        self.tracks.toggle_highlight(index)
    }

    pub fn phase(&self) -> SessionPhase {
        self.phase
    }

    pub fn active_name(&self) -> Option<&str> {
        self.active_name.as_deref()
    }

    pub fn score_title(&self) -> Option<&str> {
        self.score_title.as_deref()
    }

    pub fn notice(&self) -> Option<&str> {
        self.notice.as_deref()
    }

    pub fn error(&self) -> Option<&SessionError> {
        self.error.as_ref()
    }

    pub fn error_message(&self) -> Option<String> {
        self.error.as_ref().map(ToString::to_string)
    }

    pub fn tracks(&self) -> &[TrackControl] {
        self.tracks.as_slice()
    }

    pub fn highlighted_track(&self) -> Option<usize> {
        self.tracks.highlighted()
    }

    pub fn transport(&self) -> &TransportState {
        self.transport.state()
    }

    pub fn transport_label(&self) -> &'static str {
        self.transport.transport_label()
    }

    /// Transport buttons are usable only while a score is ready to play.
    pub fn controls_enabled(&self) -> bool {
        self.phase == SessionPhase::Ready && self.host.is_live()
    }

    pub fn files(&self) -> &FileList {
        &self.files
    }

    pub fn engine_live(&self) -> bool {
        self.host.is_live()
    }

    pub fn host(&self) -> &EngineHost<F> {
        &self.host
    }

    /// Status line for the header.
    pub fn headline(&self) -> String {
        let name = self.active_name.as_deref().unwrap_or_default();
        match self.phase {
            SessionPhase::Idle => self.notice.clone().unwrap_or_else(|| "No file selected".to_string()),
            SessionPhase::Loading => format!("Loading: {name}..."),
            SessionPhase::Ready => self
                .score_title
                .clone()
                .unwrap_or_else(|| Score::default().headline()),
            SessionPhase::Error => format!("Error: {}", self.error_message().unwrap_or_default()),
        }
    }
}
