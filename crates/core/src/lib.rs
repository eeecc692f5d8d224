pub mod config;
pub mod error;
pub mod files;
pub mod session;
pub mod snapshot;
pub mod tracks;
pub mod transport;

#[cfg(test)]
mod testing;

pub use config::PlayerConfig;
pub use error::{EngineRuntimeError, RuntimeFailure, SessionError};
pub use files::{FileList, Offer};
pub use session::{LoadOutcome, LoadTicket, NO_COMPATIBLE_FILES, Session, SessionPhase};
pub use snapshot::{SessionSnapshot, session_to_snapshot};
pub use tracks::{TrackControls, derive_controls};
pub use transport::TransportSync;

pub use staffplay_engine::{
    EngineFactory, EngineHost, EngineInitError, EngineOptions, EngineSettings, EventProducer,
    HostSurface, NotationEngine,
};
pub use staffplay_source::{
    Candidate, DirFetcher, FetchError, FetchResponse, Fetcher, NoFetch, ReadError, ReadFailure,
    ScoreBuffer, SourceInput, SourceReader, is_notation_file,
};
pub use staffplay_transport::{
    EngineErrorKind, EngineEvent, EngineFault, EngineTrack, PlaybackState, PlayerState, Score,
    TrackControl, TrackPlayback, TransportState, TuningPreset,
};
