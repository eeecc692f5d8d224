use staffplay_engine::NotationEngine;
use staffplay_transport::{PlaybackState, TransportState, TuningPreset, clamp_volume};

/// Master volume, tuning and play/pause/stop, mirrored against the engine.
#[derive(Debug, Clone)]
pub struct TransportSync {
    state: TransportState,
    defaults: TransportState,
}

impl TransportSync {
    pub fn new(defaults: TransportState) -> Self {
        Self {
            state: defaults,
            defaults,
        }
    }

    pub fn state(&self) -> &TransportState {
        &self.state
    }

    pub fn playback(&self) -> PlaybackState {
        self.state.playback
    }

    pub fn reset(&mut self) {
        self.state = self.defaults;
    }

    /// Push the current master settings into a freshly loaded engine.
    pub fn apply_to<E: NotationEngine>(&self, engine: &mut E) {
        engine.set_master_volume(self.state.master_volume);
        engine.set_master_tune(self.state.master_tune_cents);
    }

    pub fn set_master_volume<E: NotationEngine>(&mut self, engine: Option<&mut E>, volume: f32) -> bool {
        let Some(engine) = engine else {
            log::debug!(target: "session", "master volume ignored: no engine loaded");
            return false;
        };
        let volume = clamp_volume(volume);
        self.state.master_volume = volume;
        engine.set_master_volume(volume);
        true
    }

    pub fn set_master_tune_cents<E: NotationEngine>(&mut self, engine: Option<&mut E>, cents: i32) -> bool {
        let Some(engine) = engine else {
            log::debug!(target: "session", "master tune ignored: no engine loaded");
            return false;
        };
        self.state.master_tune_cents = cents;
        engine.set_master_tune(cents);
        log::info!(target: "session", "master tune set to {cents} cents");
        true
    }

    pub fn apply_preset<E: NotationEngine>(&mut self, engine: Option<&mut E>, preset: TuningPreset) -> bool {
        let applied = self.set_master_tune_cents(engine, preset.cents());
        if applied {
            log::info!(target: "session", "tuning set to {}", preset.label());
        }
        applied
    }

    /// Forward play/pause. `ready` is false unless a score is fully loaded.
    pub fn play_pause<E: NotationEngine>(&mut self, engine: Option<&mut E>, ready: bool) -> bool {
        match engine {
            Some(engine) if ready => {
                engine.play_pause();
                true
            }
            _ => {
                log::debug!(target: "session", "play/pause ignored: player not ready");
                false
            }
        }
    }

    pub fn stop<E: NotationEngine>(&mut self, engine: Option<&mut E>, ready: bool) -> bool {
        match engine {
            Some(engine) if ready => {
                engine.stop();
                true
            }
            _ => {
                log::debug!(target: "session", "stop ignored: player not ready");
                false
            }
        }
    }

    pub fn on_state_changed(&mut self, playback: PlaybackState) {
        self.state.playback = playback;
    }

    /// Playback reached the end of the score.
    pub fn on_finished(&mut self) {
        self.state.playback = PlaybackState::Stopped;
    }

    pub fn transport_label(&self) -> &'static str {
        self.state.playback.transport_label()
    }
}

impl Default for TransportSync {
    fn default() -> Self {
        Self::new(TransportState::default())
    }
}
