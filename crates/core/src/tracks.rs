use staffplay_engine::NotationEngine;
use staffplay_transport::{EngineTrack, TrackControl, clamp_volume};

/// One control record per engine track, in the engine's order.
pub fn derive_controls(tracks: &[EngineTrack]) -> Vec<TrackControl> {
    tracks
        .iter()
        .enumerate()
        .map(|(index, track)| TrackControl::from_engine(index, track))
        .collect()
}

/// Per-track controls of the loaded score.
///
/// Mute and volume edits are written to the record and to the live engine.
/// Highlighting is purely local; at most one track is highlighted.
#[derive(Debug, Default)]
pub struct TrackControls {
    controls: Vec<TrackControl>,
}

impl TrackControls {
    pub fn replace(&mut self, tracks: &[EngineTrack]) {
        self.controls = derive_controls(tracks);
    }

    pub fn clear(&mut self) {
        self.controls.clear();
    }

    pub fn as_slice(&self) -> &[TrackControl] {
        &self.controls
    }

    pub fn get(&self, index: usize) -> Option<&TrackControl> {
        self.controls.get(index)
    }

    pub fn len(&self) -> usize {
        self.controls.len()
    }

    pub fn is_empty(&self) -> bool {
        self.controls.is_empty()
    }

    pub fn highlighted(&self) -> Option<usize> {
        self.controls.iter().position(|c| c.highlighted)
    }

    /// Returns false (and changes nothing) when no engine is live or the
    /// index does not name a track of the current score.
    pub fn set_muted<E: NotationEngine>(
        &mut self,
        engine: Option<&mut E>,
        index: usize,
        muted: bool,
    ) -> bool {
        let Some((engine, control)) = self.target(engine, index, "mute") else {
            return false;
        };
        control.muted = muted;
        engine.set_track_mute(index, muted);
        log::debug!(target: "session", "track '{}' muted: {muted}", control.display_name);
        true
    }

    pub fn toggle_muted<E: NotationEngine>(&mut self, engine: Option<&mut E>, index: usize) -> bool {
        match self.controls.get(index) {
            Some(control) => {
                let muted = !control.muted;
                self.set_muted(engine, index, muted)
            }
            None => {
                log::warn!(target: "session", "cannot toggle mute: no track {index}");
                false
            }
        }
    }

    /// Volume is clamped into `0.0..=1.0` before it is applied.
    pub fn set_volume<E: NotationEngine>(
        &mut self,
        engine: Option<&mut E>,
        index: usize,
        volume: f32,
    ) -> bool {
        let Some((engine, control)) = self.target(engine, index, "set volume") else {
            return false;
        };
        let volume = clamp_volume(volume);
        control.volume = volume;
        engine.set_track_volume(index, volume);
        true
    }

    /// Toggle the highlight on `index`, clearing any other highlighted track.
    pub fn toggle_highlight(&mut self, index: usize) -> bool {
        let Some(was_highlighted) = self.controls.get(index).map(|c| c.highlighted) else {
            log::warn!(target: "session", "cannot highlight: no track {index}");
            return false;
        };

        for control in &mut self.controls {
            control.highlighted = false;
        }
        self.controls[index].highlighted = !was_highlighted;
        true
    }

    fn target<'a, E: NotationEngine>(
        &'a mut self,
        engine: Option<&'a mut E>,
        index: usize,
        action: &str,
    ) -> Option<(&'a mut E, &'a mut TrackControl)> {
        let Some(engine) = engine else {
            log::warn!(target: "session", "cannot {action} track {index}: no engine loaded");
            return None;
        };
        let Some(control) = self.controls.get_mut(index) else {
            log::warn!(target: "session", "cannot {action} track {index}: out of range");
            return None;
        };
        Some((engine, control))
    }
}
