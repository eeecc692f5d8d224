//! Ownership of the external notation engine.
//!
//! An [`EngineHost`] owns the render surface and at most one live engine
//! instance. Replacing the score always tears the old instance down and
//! clears the surface before the next instance is constructed.

use std::sync::Arc;

use staffplay_source::ScoreBuffer;
use staffplay_transport::EngineEvent;

pub use rtrb::Producer as EventProducer;

/// Capacity of the per-instance event queue.
pub const EVENT_QUEUE_CAPACITY: usize = 64;

/// Voice bank used when no other sound font is configured.
pub const DEFAULT_SOUND_FONT: &str =
    "https://cdn.jsdelivr.net/npm/@coderline/alphatab@latest/dist/soundfont/sonivox.sf2";

/// A render target the engine draws into.
pub trait HostSurface {
    /// Remove everything a previous engine instance rendered.
    fn clear(&mut self);

    /// Element the engine scrolls to follow the playback cursor.
    fn scroll_target(&self) -> Option<String>;
}

/// Commands understood by a live engine instance.
pub trait NotationEngine {
    fn play_pause(&mut self);
    fn stop(&mut self);
    fn set_master_volume(&mut self, volume: f32);
    fn set_master_tune(&mut self, cents: i32);
    fn set_track_mute(&mut self, index: usize, muted: bool);
    fn set_track_volume(&mut self, index: usize, volume: f32);

    /// Explicit teardown. Engines without one rely on being dropped.
    fn destroy(&mut self) {}
}

/// Builds engine instances. Construction is synchronous; anything the engine
/// loads afterwards (the sound font) reports back through `events`.
pub trait EngineFactory {
    type Engine: NotationEngine;
    type Surface: HostSurface;

    fn create(
        &mut self,
        surface: &mut Self::Surface,
        settings: EngineSettings,
        events: EventProducer<EngineEvent>,
    ) -> anyhow::Result<Self::Engine>;
}

/// Settings handed to the engine at construction.
#[derive(Debug, Clone)]
pub struct EngineSettings {
    pub file: Arc<[u8]>,
    pub enable_player: bool,
    pub enable_user_interaction: bool,
    pub sound_font: String,
    pub scroll_element: Option<String>,
}

/// Host-level options applied to every constructed instance.
#[derive(Debug, Clone)]
pub struct EngineOptions {
    pub sound_font: String,
    pub scroll_to_surface: bool,
}

impl Default for EngineOptions {
    fn default() -> Self {
        Self {
            sound_font: DEFAULT_SOUND_FONT.to_string(),
            scroll_to_surface: true,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum EngineInitError {
    #[error("The player could not be started for '{name}': {source}")]
    Construct {
        name: String,
        #[source]
        source: anyhow::Error,
    },

    #[error("load request {generation} was superseded by request {latest}")]
    Superseded { generation: u64, latest: u64 },
}

/// A live engine instance and the receiving end of its event queue.
pub struct EngineHandle<E> {
    generation: u64,
    name: String,
    engine: E,
    events: rtrb::Consumer<EngineEvent>,
}

impl<E: NotationEngine> EngineHandle<E> {
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn engine(&self) -> &E {
        &self.engine
    }

    pub fn engine_mut(&mut self) -> &mut E {
        &mut self.engine
    }

    pub fn pop_event(&mut self) -> Option<EngineEvent> {
        self.events.pop().ok()
    }
}

pub struct EngineHost<F: EngineFactory> {
    factory: F,
    surface: F::Surface,
    options: EngineOptions,
    current: Option<EngineHandle<F::Engine>>,
    latest_generation: u64,
}

impl<F: EngineFactory> EngineHost<F> {
    pub fn new(factory: F, surface: F::Surface, options: EngineOptions) -> Self {
        Self {
            factory,
            surface,
            options,
            current: None,
            latest_generation: 0,
        }
    }

    /// Tear down the current instance (if any) and construct one for `buffer`.
    ///
    /// `generation` must grow with every load request. A call carrying an
    /// older generation than one already seen is rejected without touching
    /// the live instance.
    pub fn replace(&mut self, generation: u64, buffer: &ScoreBuffer) -> Result<(), EngineInitError> {
        if generation < self.latest_generation {
            log::debug!(
                target: "engine",
                "ignoring stale replace for '{}' ({generation} < {})",
                buffer.name(),
                self.latest_generation
            );
            return Err(EngineInitError::Superseded {
                generation,
                latest: self.latest_generation,
            });
        }
        self.latest_generation = generation;

        self.release();

        let (producer, consumer) = rtrb::RingBuffer::<EngineEvent>::new(EVENT_QUEUE_CAPACITY);
        let settings = EngineSettings {
            file: buffer.bytes_arc().clone(),
            enable_player: true,
            enable_user_interaction: true,
            sound_font: self.options.sound_font.clone(),
            scroll_element: if self.options.scroll_to_surface {
                self.surface.scroll_target()
            } else {
                None
            },
        };

        log::info!(
            target: "engine",
            "constructing engine for '{}' ({} bytes, generation {generation})",
            buffer.name(),
            buffer.len()
        );

        let engine = match self.factory.create(&mut self.surface, settings, producer) {
            Ok(engine) => engine,
            Err(source) => {
                // A half-built instance may have drawn into the surface.
                self.surface.clear();
                log::warn!(target: "engine", "engine construction failed: {source:#}");
                return Err(EngineInitError::Construct {
                    name: buffer.name().to_string(),
                    source,
                });
            }
        };

        self.current = Some(EngineHandle {
            generation,
            name: buffer.name().to_string(),
            engine,
            events: consumer,
        });
        Ok(())
    }

    /// Mark `generation` as the newest request and release the live instance.
    ///
    /// Used when a new load starts: nothing from the old instance may reach
    /// the session while the new source is still being read.
    pub fn invalidate(&mut self, generation: u64) {
        self.latest_generation = self.latest_generation.max(generation);
        self.release();
    }

    /// Destroy the live instance, drop it with its queued events and clear
    /// the surface. Returns whether an instance was live.
    pub fn release(&mut self) -> bool {
        let released = match self.current.take() {
            Some(mut handle) => {
                log::info!(
                    target: "engine",
                    "releasing engine for '{}' (generation {})",
                    handle.name,
                    handle.generation
                );
                handle.engine.destroy();
                drop(handle);
                true
            }
            None => false,
        };
        self.surface.clear();
        released
    }

    pub fn is_live(&self) -> bool {
        self.current.is_some()
    }

    pub fn latest_generation(&self) -> u64 {
        self.latest_generation
    }

    pub fn handle(&self) -> Option<&EngineHandle<F::Engine>> {
        self.current.as_ref()
    }

    pub fn handle_mut(&mut self) -> Option<&mut EngineHandle<F::Engine>> {
        self.current.as_mut()
    }

    pub fn engine_mut(&mut self) -> Option<&mut F::Engine> {
        self.current.as_mut().map(EngineHandle::engine_mut)
    }

    /// Take every event queued by the live instance so far.
    pub fn drain_events(&mut self) -> Vec<EngineEvent> {
        let mut events = Vec::new();
        if let Some(handle) = self.current.as_mut() {
            while let Some(event) = handle.pop_event() {
                events.push(event);
            }
        }
        events
    }

    pub fn factory(&self) -> &F {
        &self.factory
    }

    pub fn surface(&self) -> &F::Surface {
        &self.surface
    }
}

impl<F: EngineFactory> Drop for EngineHost<F> {
    fn drop(&mut self) {
        self.release();
    }
}
