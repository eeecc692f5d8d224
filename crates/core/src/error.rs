use staffplay_engine::EngineInitError;
use staffplay_source::ReadError;
use staffplay_transport::{EngineErrorKind, EngineFault};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuntimeFailure {
    ScoreLoadFailure,
    VoiceBankLoadFailure,
    Unspecified,
}

/// Failures the engine reports after it was constructed.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum EngineRuntimeError {
    #[error(
        "Error loading the score: {name}. It might be corrupted or not a supported MusicXML format."
    )]
    ScoreLoad { name: String },

    #[error("Error loading SoundFont. Check network connection and SoundFont URL.")]
    VoiceBankLoad,

    #[error("Failed to properly load score data from {name}.")]
    EmptyScore { name: String },

    #[error("{message}")]
    Unspecified { message: String },
}

impl EngineRuntimeError {
    /// Classify an engine error payload. A structured kind wins over the
    /// free-form message.
    pub fn from_fault(fault: &EngineFault, name: &str) -> Self {
        match fault.kind {
            Some(EngineErrorKind::ScoreLoad) => EngineRuntimeError::ScoreLoad {
                name: name.to_string(),
            },
            Some(EngineErrorKind::SoundFontLoad) => EngineRuntimeError::VoiceBankLoad,
            None => EngineRuntimeError::Unspecified {
                message: fault
                    .message
                    .as_deref()
                    .map(str::trim)
                    .filter(|m| !m.is_empty())
                    .unwrap_or("An error occurred in the notation engine.")
                    .to_string(),
            },
        }
    }

    pub fn kind(&self) -> RuntimeFailure {
        match self {
            EngineRuntimeError::ScoreLoad { .. } | EngineRuntimeError::EmptyScore { .. } => {
                RuntimeFailure::ScoreLoadFailure
            }
            EngineRuntimeError::VoiceBankLoad => RuntimeFailure::VoiceBankLoadFailure,
            EngineRuntimeError::Unspecified { .. } => RuntimeFailure::Unspecified,
        }
    }
}

/// Why a session ended up in the error phase. `Display` is the message shown
/// to the user.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error(transparent)]
    Read(#[from] ReadError),

    #[error(transparent)]
    EngineInit(#[from] EngineInitError),

    #[error(transparent)]
    Runtime(#[from] EngineRuntimeError),
}

#[cfg(test)]
mod tests {
    use super::*;
    use staffplay_source::ReadFailure;

    #[test]
    fn test_structured_kind_wins_over_message() {
        let fault = EngineFault::new(EngineErrorKind::SoundFontLoad, "HTTP 503");
        let err = EngineRuntimeError::from_fault(&fault, "song.xml");
        assert_eq!(err, EngineRuntimeError::VoiceBankLoad);
        assert_eq!(err.kind(), RuntimeFailure::VoiceBankLoadFailure);

        let fault = EngineFault::new(EngineErrorKind::ScoreLoad, "unexpected token");
        let err = EngineRuntimeError::from_fault(&fault, "song.xml");
        assert_eq!(err.kind(), RuntimeFailure::ScoreLoadFailure);
        assert!(err.to_string().contains("song.xml"));
    }

    #[test]
    fn test_unstructured_fault_messages() {
        let err = EngineRuntimeError::from_fault(&EngineFault::message("worker crashed"), "a.xml");
        assert_eq!(err.to_string(), "worker crashed");
        assert_eq!(err.kind(), RuntimeFailure::Unspecified);

        let err = EngineRuntimeError::from_fault(&EngineFault::default(), "a.xml");
        assert_eq!(err.to_string(), "An error occurred in the notation engine.");
    }

    #[test]
    fn test_messages_are_distinct_per_kind() {
        let unreadable = SessionError::from(ReadError::Io {
            name: "a.xml".to_string(),
            source: std::io::Error::other("permission denied"),
        });
        let missing = SessionError::from(ReadError::NotFound {
            path: "scores/a.xml".to_string(),
            status: 404,
        });
        let parse = SessionError::from(EngineRuntimeError::ScoreLoad {
            name: "a.xml".to_string(),
        });
        let voices = SessionError::from(EngineRuntimeError::VoiceBankLoad);

        let messages = [
            unreadable.to_string(),
            missing.to_string(),
            parse.to_string(),
            voices.to_string(),
        ];
        for (i, a) in messages.iter().enumerate() {
            for b in &messages[i + 1..] {
                assert_ne!(a, b);
            }
        }

        if let SessionError::Read(e) = &unreadable {
            assert_eq!(e.reason(), ReadFailure::IoFailure);
        }
    }
}
