//! Serializable view of a [`Session`] for the UI layer.
//!
//! The UI re-renders its lists, buttons and sliders from a snapshot taken
//! after every action. Nothing here writes back into the session.

use serde::{Deserialize, Serialize};
use staffplay_engine::EngineFactory;
use staffplay_transport::PlaybackState;

use crate::session::{Session, SessionPhase};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionSnapshot {
    pub phase: SessionPhase,
    pub headline: String,
    pub active_name: Option<String>,
    pub error_message: Option<String>,
    /// Placeholder text for the parts panel when there are no track controls.
    pub parts_message: Option<String>,
    pub transport: TransportSnapshot,
    pub tracks: Vec<TrackSummary>,
    pub files: Vec<FileEntry>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransportSnapshot {
    pub master_volume: f32,
    pub master_tune_cents: i32,
    pub cents_label: String,
    pub playback: PlaybackState,
    pub play_pause_label: String,
    pub controls_enabled: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackSummary {
    pub index: usize,
    pub name: String,
    pub muted: bool,
    pub mute_label: String,
    pub volume: f32,
    pub highlighted: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileEntry {
    pub name: String,
    pub active: bool,
}

fn parts_message<F: EngineFactory>(session: &Session<F>) -> Option<String> {
    let message = match session.phase() {
        SessionPhase::Loading => "Loading score data...",
        SessionPhase::Ready if session.tracks().is_empty() => "No parts (tracks) found in this score.",
        SessionPhase::Ready => return None,
        SessionPhase::Idle | SessionPhase::Error => "Load a score to see individual parts.",
    };
    Some(message.to_string())
}

pub fn session_to_snapshot<F: EngineFactory>(session: &Session<F>) -> SessionSnapshot {
    let transport = session.transport();
    let active_file = session.files().active();

    SessionSnapshot {
        phase: session.phase(),
        headline: session.headline(),
        active_name: session.active_name().map(str::to_string),
        error_message: session.error_message(),
        parts_message: parts_message(session),
        transport: TransportSnapshot {
            master_volume: transport.master_volume,
            master_tune_cents: transport.master_tune_cents,
            cents_label: transport.cents_label(),
            playback: transport.playback,
            play_pause_label: session.transport_label().to_string(),
            controls_enabled: session.controls_enabled(),
        },
        tracks: session
            .tracks()
            .iter()
            .map(|track| TrackSummary {
                index: track.index,
                name: track.display_name.clone(),
                muted: track.muted,
                mute_label: track.mute_label().to_string(),
                volume: track.volume,
                highlighted: track.highlighted,
            })
            .collect(),
        files: session
            .files()
            .entries()
            .iter()
            .enumerate()
            .map(|(i, entry)| FileEntry {
                name: entry.name.clone(),
                active: active_file == Some(i),
            })
            .collect(),
    }
}

impl SessionSnapshot {
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}
