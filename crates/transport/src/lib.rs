use serde::{Deserialize, Serialize};

/// Master tune offset for concert pitch, A = 440 Hz.
pub const A440_CENTS: i32 = 0;

/// Master tune offset for baroque pitch, A = 415 Hz.
pub const A415_CENTS: i32 = -101;

/// Clamp a gain value into `0.0..=1.0`. NaN collapses to silence.
#[inline]
pub fn clamp_volume(volume: f32) -> f32 {
    if volume.is_nan() {
        0.0
    } else {
        volume.clamp(0.0, 1.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlaybackState {
    #[default]
    Stopped,
    Playing,
    Paused,
}

impl PlaybackState {
    pub fn is_playing(&self) -> bool {
        matches!(self, PlaybackState::Playing)
    }

    /// Map a player state change reported by the engine.
    ///
    /// Engines only distinguish playing from paused; a pause that came from a
    /// stop command carries `stopped = true`.
    pub fn from_player(state: PlayerState, stopped: bool) -> Self {
        match state {
            PlayerState::Playing => PlaybackState::Playing,
            PlayerState::Paused if stopped => PlaybackState::Stopped,
            PlayerState::Paused => PlaybackState::Paused,
        }
    }

    /// Text for the play/pause button.
    pub fn transport_label(&self) -> &'static str {
        if self.is_playing() { "Pause" } else { "Play" }
    }
}

/// Player state as reported by the notation engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlayerState {
    Paused,
    Playing,
}

/// Named reference pitches for the master tune control.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TuningPreset {
    A440,
    A415,
}

impl TuningPreset {
    pub fn cents(&self) -> i32 {
        match self {
            TuningPreset::A440 => A440_CENTS,
            TuningPreset::A415 => A415_CENTS,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            TuningPreset::A440 => "A=440Hz",
            TuningPreset::A415 => "A=415Hz",
        }
    }
}

/// Master transport settings of a ready session.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TransportState {
    pub master_volume: f32,
    pub master_tune_cents: i32,
    pub playback: PlaybackState,
}

impl TransportState {
    pub fn new(master_volume: f32, master_tune_cents: i32) -> Self {
        Self {
            master_volume: clamp_volume(master_volume),
            master_tune_cents,
            playback: PlaybackState::Stopped,
        }
    }

    pub fn cents_label(&self) -> String {
        format!("{} cents", self.master_tune_cents)
    }
}

impl Default for TransportState {
    fn default() -> Self {
        Self::new(1.0, A440_CENTS)
    }
}

/// Per-track playback settings as held by the engine.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrackPlayback {
    pub is_mute: bool,
    pub volume: f32,
}

impl Default for TrackPlayback {
    fn default() -> Self {
        Self {
            is_mute: false,
            volume: 1.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct EngineTrack {
    pub name: String,
    pub playback: TrackPlayback,
}

impl EngineTrack {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            playback: TrackPlayback::default(),
        }
    }
}

/// A parsed score as reported by the engine's `ScoreParsed` event.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Score {
    pub title: String,
    pub artist: String,
    pub tracks: Vec<EngineTrack>,
}

impl Score {
    /// "Title - Artist", with placeholders for missing metadata.
    pub fn headline(&self) -> String {
        let title = non_empty(&self.title).unwrap_or("Untitled Score");
        let artist = non_empty(&self.artist).unwrap_or("Unknown Artist");
        format!("{title} - {artist}")
    }
}

fn non_empty(s: &str) -> Option<&str> {
    let trimmed = s.trim();
    (!trimmed.is_empty()).then_some(trimmed)
}

/// UI-facing control record for one engine track.
#[derive(Debug, Clone, PartialEq)]
pub struct TrackControl {
    pub index: usize,
    pub display_name: String,
    pub muted: bool,
    pub volume: f32,
    pub highlighted: bool,
}

impl TrackControl {
    pub fn from_engine(index: usize, track: &EngineTrack) -> Self {
        let display_name = non_empty(&track.name)
            .map(str::to_string)
            .unwrap_or_else(|| format!("Track {}", index + 1));

        Self {
            index,
            display_name,
            muted: track.playback.is_mute,
            volume: clamp_volume(track.playback.volume),
            highlighted: false,
        }
    }

    /// Text for the mute button: the action a click would perform.
    pub fn mute_label(&self) -> &'static str {
        if self.muted { "Unmute" } else { "Mute" }
    }
}

/// Structured error categories an engine may attach to an error event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineErrorKind {
    ScoreLoad,
    SoundFontLoad,
}

/// Payload of the engine's error event. Either part may be missing.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EngineFault {
    pub kind: Option<EngineErrorKind>,
    pub message: Option<String>,
}

impl EngineFault {
    pub fn new(kind: EngineErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind: Some(kind),
            message: Some(message.into()),
        }
    }

    pub fn message(message: impl Into<String>) -> Self {
        Self {
            kind: None,
            message: Some(message.into()),
        }
    }
}

/// Lifecycle notifications pushed by an engine instance.
#[derive(Debug, Clone, PartialEq)]
pub enum EngineEvent {
    /// The score finished parsing. `None` when the engine fired without a score.
    ScoreParsed(Option<Score>),
    RenderFinished,
    PlayerStateChanged { state: PlayerState, stopped: bool },
    PlayerFinished,
    Error(EngineFault),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clamp_volume() {
        assert_eq!(clamp_volume(-0.5), 0.0);
        assert_eq!(clamp_volume(0.25), 0.25);
        assert_eq!(clamp_volume(3.0), 1.0);
        assert_eq!(clamp_volume(f32::NAN), 0.0);
    }

    #[test]
    fn test_playback_from_player() {
        assert_eq!(
            PlaybackState::from_player(PlayerState::Playing, false),
            PlaybackState::Playing
        );
        assert_eq!(
            PlaybackState::from_player(PlayerState::Paused, false),
            PlaybackState::Paused
        );
        assert_eq!(
            PlaybackState::from_player(PlayerState::Paused, true),
            PlaybackState::Stopped
        );
    }

    #[test]
    fn test_transport_label_follows_playback() {
        assert_eq!(PlaybackState::Playing.transport_label(), "Pause");
        assert_eq!(PlaybackState::Paused.transport_label(), "Play");
        assert_eq!(PlaybackState::Stopped.transport_label(), "Play");
    }

    #[test]
    fn test_tuning_presets() {
        assert_eq!(TuningPreset::A440.cents(), 0);
        assert_eq!(TuningPreset::A415.cents(), -101);
    }

    #[test]
    fn test_transport_defaults() {
        let transport = TransportState::default();
        assert_eq!(transport.master_volume, 1.0);
        assert_eq!(transport.master_tune_cents, 0);
        assert_eq!(transport.playback, PlaybackState::Stopped);
        assert_eq!(transport.cents_label(), "0 cents");
    }

    #[test]
    fn test_score_headline_fallbacks() {
        let score = Score::default();
        assert_eq!(score.headline(), "Untitled Score - Unknown Artist");

        let score = Score {
            title: "Air".to_string(),
            artist: "J. S. Bach".to_string(),
            tracks: vec![],
        };
        assert_eq!(score.headline(), "Air - J. S. Bach");
    }

    #[test]
    fn test_track_control_from_engine() {
        let mut track = EngineTrack::new("");
        track.playback = TrackPlayback {
            is_mute: true,
            volume: 1.7,
        };

        let control = TrackControl::from_engine(2, &track);
        assert_eq!(control.index, 2);
        assert_eq!(control.display_name, "Track 3");
        assert!(control.muted);
        assert_eq!(control.volume, 1.0);
        assert!(!control.highlighted);
        assert_eq!(control.mute_label(), "Unmute");
    }
}
