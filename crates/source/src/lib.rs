//! Turns a user-selected file, dropped bytes or a bundled path into a
//! [`ScoreBuffer`] that can be handed to the notation engine.

use std::fmt;
use std::fs;
use std::io;
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;

/// File extensions accepted as notation files (compared case-insensitively).
pub const NOTATION_EXTENSIONS: [&str; 3] = ["xml", "musicxml", "mxl"];

/// Returns true if `name` ends in a recognized notation-file extension.
pub fn is_notation_file(name: &str) -> bool {
    let lower = name.to_ascii_lowercase();
    NOTATION_EXTENSIONS.iter().any(|ext| {
        lower
            .strip_suffix(ext)
            .is_some_and(|rest| rest.ends_with('.'))
    })
}

/// The last path component, used as the human-readable name of a source.
pub fn display_name(path: &str) -> String {
    Path::new(path)
        .file_name()
        .and_then(|n| n.to_str())
        .map(str::to_string)
        .unwrap_or_else(|| path.to_string())
}

/// Where the bytes of a score come from.
#[derive(Clone)]
pub enum SourceInput {
    /// A file chosen by the user on the local filesystem.
    File { path: PathBuf },
    /// Bytes already acquired by the host (e.g. drag and drop).
    Bytes { name: String, bytes: Arc<[u8]> },
    /// A path resolved through the host's [`Fetcher`].
    Fetch { path: String },
}

impl SourceInput {
    pub fn display_name(&self) -> String {
        match self {
            SourceInput::File { path } => path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_else(|| path.display().to_string()),
            SourceInput::Bytes { name, .. } => name.clone(),
            SourceInput::Fetch { path } => display_name(path),
        }
    }
}

impl fmt::Debug for SourceInput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SourceInput::File { path } => f.debug_struct("File").field("path", path).finish(),
            SourceInput::Bytes { name, bytes } => f
                .debug_struct("Bytes")
                .field("name", name)
                .field("len", &bytes.len())
                .finish(),
            SourceInput::Fetch { path } => f.debug_struct("Fetch").field("path", path).finish(),
        }
    }
}

/// One entry offered by the host's file selection.
#[derive(Debug, Clone)]
pub struct Candidate {
    pub name: String,
    pub input: SourceInput,
}

impl Candidate {
    pub fn new(name: impl Into<String>, input: SourceInput) -> Self {
        Self {
            name: name.into(),
            input,
        }
    }

    pub fn from_path(path: impl Into<PathBuf>) -> Self {
        let input = SourceInput::File { path: path.into() };
        Self {
            name: input.display_name(),
            input,
        }
    }

    pub fn is_compatible(&self) -> bool {
        is_notation_file(&self.name)
    }
}

/// Keep only candidates whose names carry a notation-file extension.
pub fn filter_compatible(candidates: Vec<Candidate>) -> Vec<Candidate> {
    candidates.into_iter().filter(Candidate::is_compatible).collect()
}

/// Complete binary content of a score plus its display name.
///
/// The bytes are reference counted, so handing a buffer to the engine and
/// keeping it around is cheap.
#[derive(Clone)]
pub struct ScoreBuffer {
    name: String,
    bytes: Arc<[u8]>,
}

impl ScoreBuffer {
    pub fn new(name: impl Into<String>, bytes: impl Into<Arc<[u8]>>) -> Self {
        Self {
            name: name.into(),
            bytes: bytes.into(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    #[inline]
    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn bytes_arc(&self) -> &Arc<[u8]> {
        &self.bytes
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

impl fmt::Debug for ScoreBuffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScoreBuffer")
            .field("name", &self.name)
            .field("len", &self.bytes.len())
            .finish()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadFailure {
    IoFailure,
    NotFound,
    NetworkFailure,
}

#[derive(Debug, thiserror::Error)]
pub enum ReadError {
    #[error("The file '{name}' could not be read: {source}")]
    Io {
        name: String,
        #[source]
        source: io::Error,
    },

    #[error("No file found at '{path}' (status {status})")]
    NotFound { path: String, status: u16 },

    #[error("Network error while fetching '{path}': {message}")]
    Network {
        path: String,
        status: Option<u16>,
        message: String,
    },
}

impl ReadError {
    pub fn reason(&self) -> ReadFailure {
        match self {
            ReadError::Io { .. } => ReadFailure::IoFailure,
            ReadError::NotFound { .. } => ReadFailure::NotFound,
            ReadError::Network { .. } => ReadFailure::NetworkFailure,
        }
    }

    pub fn status(&self) -> Option<u16> {
        match self {
            ReadError::Io { .. } => None,
            ReadError::NotFound { status, .. } => Some(*status),
            ReadError::Network { status, .. } => *status,
        }
    }
}

/// Status and body of a fetch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchResponse {
    pub status: u16,
    pub bytes: Vec<u8>,
}

impl FetchResponse {
    pub fn ok(bytes: Vec<u8>) -> Self {
        Self { status: 200, bytes }
    }

    pub fn status(status: u16) -> Self {
        Self {
            status,
            bytes: Vec::new(),
        }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// A fetch that failed before any status was received.
#[derive(Debug, thiserror::Error)]
#[error("{0}")]
pub struct FetchError(pub String);

/// Network access provided by the host environment.
pub trait Fetcher {
    fn fetch(&self, path: &str) -> Result<FetchResponse, FetchError>;
}

impl<F: Fetcher + ?Sized> Fetcher for &F {
    fn fetch(&self, path: &str) -> Result<FetchResponse, FetchError> {
        (**self).fetch(path)
    }
}

/// Serves fetch paths from a local directory, e.g. bundled example scores.
///
/// Missing files answer 404 and paths that try to leave the root answer 403,
/// the way a static file server would.
#[derive(Debug, Clone)]
pub struct DirFetcher {
    root: PathBuf,
}

impl DirFetcher {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Resolve a fetch path below the root, rejecting `..` and absolute parts.
    fn resolve(&self, path: &str) -> Option<PathBuf> {
        let relative = Path::new(path.trim_start_matches('/'));
        let mut resolved = self.root.clone();
        for component in relative.components() {
            match component {
                Component::Normal(part) => resolved.push(part),
                Component::CurDir => {}
                _ => return None,
            }
        }
        Some(resolved)
    }
}

impl Fetcher for DirFetcher {
    fn fetch(&self, path: &str) -> Result<FetchResponse, FetchError> {
        let Some(resolved) = self.resolve(path) else {
            return Ok(FetchResponse::status(403));
        };

        if resolved.is_dir() {
            return Ok(FetchResponse::status(404));
        }

        match fs::read(&resolved) {
            Ok(bytes) => Ok(FetchResponse::ok(bytes)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(FetchResponse::status(404)),
            Err(e) => Err(FetchError(e.to_string())),
        }
    }
}

/// Fetcher for hosts without network access; every fetch fails.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoFetch;

impl Fetcher for NoFetch {
    fn fetch(&self, _path: &str) -> Result<FetchResponse, FetchError> {
        Err(FetchError("network access is not available".to_string()))
    }
}

/// Reads [`SourceInput`]s into [`ScoreBuffer`]s. Holds no session state.
#[derive(Debug, Clone, Default)]
pub struct SourceReader<F = NoFetch> {
    fetcher: F,
}

impl<F: Fetcher> SourceReader<F> {
    pub fn new(fetcher: F) -> Self {
        Self { fetcher }
    }

    pub fn read(&self, input: &SourceInput) -> Result<ScoreBuffer, ReadError> {
        let name = input.display_name();
        log::debug!(target: "source", "reading {:?}", input);

        let buffer = match input {
            SourceInput::File { path } => {
                let bytes = fs::read(path).map_err(|source| ReadError::Io {
                    name: name.clone(),
                    source,
                })?;
                ScoreBuffer::new(name, bytes)
            }
            SourceInput::Bytes { bytes, .. } => ScoreBuffer::new(name, bytes.clone()),
            SourceInput::Fetch { path } => {
                let response = self.fetcher.fetch(path).map_err(|e| ReadError::Network {
                    path: path.clone(),
                    status: None,
                    message: e.to_string(),
                })?;
                check_status(path, &response)?;
                ScoreBuffer::new(name, response.bytes)
            }
        };

        log::debug!(target: "source", "read {} bytes from '{}'", buffer.len(), buffer.name());
        Ok(buffer)
    }
}

fn check_status(path: &str, response: &FetchResponse) -> Result<(), ReadError> {
    match response.status {
        _ if response.is_success() => Ok(()),
        404 | 410 => Err(ReadError::NotFound {
            path: path.to_string(),
            status: response.status,
        }),
        status => Err(ReadError::Network {
            path: path.to_string(),
            status: Some(status),
            message: format!("server answered with status {status}"),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    struct StaticFetcher(Result<FetchResponse, String>);

    impl Fetcher for StaticFetcher {
        fn fetch(&self, _path: &str) -> Result<FetchResponse, FetchError> {
            self.0.clone().map_err(FetchError)
        }
    }

    #[test]
    fn test_notation_extensions() {
        assert!(is_notation_file("song.musicxml"));
        assert!(is_notation_file("SONG.XML"));
        assert!(is_notation_file("archive.Mxl"));
        assert!(!is_notation_file("notes.txt"));
        assert!(!is_notation_file("musicxml"));
        assert!(!is_notation_file("song.musicxml.bak"));
        assert!(is_notation_file(".xml"));
        assert!(is_notation_file(".MXL"));
        assert!(!is_notation_file("archivemxl"));
    }

    #[test]
    fn test_filter_compatible_keeps_order() {
        let candidates = vec![
            Candidate::from_path("a.xml"),
            Candidate::from_path("b.pdf"),
            Candidate::from_path("c.mxl"),
        ];

        let kept = filter_compatible(candidates);
        let names: Vec<_> = kept.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["a.xml", "c.mxl"]);
    }

    #[test]
    fn test_display_names() {
        assert_eq!(display_name("scores/bach/air.musicxml"), "air.musicxml");
        let input = SourceInput::File {
            path: PathBuf::from("/tmp/x/song.xml"),
        };
        assert_eq!(input.display_name(), "song.xml");
    }

    #[test]
    fn test_read_local_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("song.musicxml");
        fs::write(&path, b"<score-partwise/>").unwrap();

        let reader = SourceReader::new(NoFetch);
        let buffer = reader.read(&SourceInput::File { path }).unwrap();

        assert_eq!(buffer.name(), "song.musicxml");
        assert_eq!(buffer.bytes(), b"<score-partwise/>");
    }

    #[test]
    fn test_read_missing_local_file_is_io_failure() {
        let dir = tempdir().unwrap();
        let reader = SourceReader::new(NoFetch);
        let err = reader
            .read(&SourceInput::File {
                path: dir.path().join("gone.xml"),
            })
            .unwrap_err();

        assert_eq!(err.reason(), ReadFailure::IoFailure);
        assert!(err.to_string().contains("gone.xml"));
    }

    #[test]
    fn test_read_bytes_shares_buffer() {
        let bytes: Arc<[u8]> = Arc::from(vec![1u8, 2, 3]);
        let reader = SourceReader::new(NoFetch);
        let buffer = reader
            .read(&SourceInput::Bytes {
                name: "dropped.mxl".to_string(),
                bytes: bytes.clone(),
            })
            .unwrap();

        assert_eq!(buffer.name(), "dropped.mxl");
        assert!(Arc::ptr_eq(buffer.bytes_arc(), &bytes));
    }

    #[test]
    fn test_fetch_status_mapping() {
        let input = SourceInput::Fetch {
            path: "examples/air.musicxml".to_string(),
        };

        let ok = SourceReader::new(StaticFetcher(Ok(FetchResponse::ok(vec![7]))));
        let buffer = ok.read(&input).unwrap();
        assert_eq!(buffer.name(), "air.musicxml");
        assert_eq!(buffer.bytes(), &[7]);

        let missing = SourceReader::new(StaticFetcher(Ok(FetchResponse::status(404))));
        let err = missing.read(&input).unwrap_err();
        assert_eq!(err.reason(), ReadFailure::NotFound);
        assert_eq!(err.status(), Some(404));

        let broken = SourceReader::new(StaticFetcher(Ok(FetchResponse::status(500))));
        let err = broken.read(&input).unwrap_err();
        assert_eq!(err.reason(), ReadFailure::NetworkFailure);
        assert_eq!(err.status(), Some(500));

        let offline = SourceReader::new(StaticFetcher(Err("connection refused".to_string())));
        let err = offline.read(&input).unwrap_err();
        assert_eq!(err.reason(), ReadFailure::NetworkFailure);
        assert_eq!(err.status(), None);
    }

    #[test]
    fn test_dir_fetcher() {
        let dir = tempdir().unwrap();
        fs::create_dir(dir.path().join("scores")).unwrap();
        fs::write(dir.path().join("scores/air.musicxml"), b"air").unwrap();
        let fetcher = DirFetcher::new(dir.path());

        let found = fetcher.fetch("/scores/air.musicxml").unwrap();
        assert_eq!(found, FetchResponse::ok(b"air".to_vec()));

        let missing = fetcher.fetch("scores/none.xml").unwrap();
        assert_eq!(missing.status, 404);

        let escape = fetcher.fetch("../secret.xml").unwrap();
        assert_eq!(escape.status, 403);

        assert_eq!(fetcher.fetch("").unwrap().status, 404);
        assert_eq!(fetcher.fetch("/").unwrap().status, 404);
        assert_eq!(fetcher.fetch("scores").unwrap().status, 404);
    }
}
