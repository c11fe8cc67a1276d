use std::io;
use std::path::PathBuf;

/// Errors that can occur when reading, querying or expanding desktop entries.
#[derive(Debug, thiserror::Error)]
pub enum DesktopEntryError {
    /// The entry file could not be read.
    #[error("IO error reading {}: {source}", .path.display())]
    Io {
        /// File that was being read
        path: PathBuf,
        /// Underlying error
        #[source]
        source: io::Error,
    },

    /// A key/value line appeared before the first group header.
    #[error("line {line}: content before any group header: {content}")]
    ContentBeforeGroup {
        /// 1-based line number
        line: usize,
        /// The offending line
        content: String,
    },

    /// A line is neither a comment, a group header nor a `key=value` pair.
    #[error("line {line}: unrecognized line: {content}")]
    InvalidLine {
        /// 1-based line number
        line: usize,
        /// The offending line
        content: String,
    },

    /// An empty key name was passed to a lookup.
    #[error("key name must not be empty")]
    EmptyKey,

    /// The Exec template takes a single argument but a different count was given.
    #[error("this application accepts exactly one argument, got {0}")]
    ArgumentCount(usize),

    /// The entry's `Type` is not `Application`.
    #[error("not an application (Type is {})", .0.as_deref().unwrap_or("missing"))]
    NotAnApplication(Option<String>),

    /// The `Desktop Entry` group has no `Exec` key.
    #[error("desktop entry has no Exec key")]
    MissingExec,

    /// A remote URI was given where a local path is required.
    #[error("cannot resolve remote resource to a local path: {0}")]
    RemoteResource(String),

    /// A relative path could not be made absolute.
    #[error("cannot make {path:?} absolute: {source}")]
    AbsolutePath {
        /// The path as given
        path: String,
        /// Underlying error
        #[source]
        source: io::Error,
    },

    /// The expanded command line could not be split into words.
    #[error("invalid command line: {0}")]
    BadCommandLine(String),

    /// No desktop file with the given id exists in the application directories.
    #[error("no desktop file found for {0}")]
    NotFound(String),
}

/// Broad category of a [`DesktopEntryError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Reading or locating the file failed
    Io,
    /// The file content is malformed
    Parse,
    /// The caller passed bad arguments
    Usage,
    /// The entry cannot support the requested operation
    Semantic,
}

impl DesktopEntryError {
    /// Returns the category this error belongs to.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Io { .. } | Self::NotFound(_) => ErrorKind::Io,
            Self::ContentBeforeGroup { .. } | Self::InvalidLine { .. } => ErrorKind::Parse,
            Self::EmptyKey | Self::ArgumentCount(_) => ErrorKind::Usage,
            Self::NotAnApplication(_)
            | Self::MissingExec
            | Self::RemoteResource(_)
            | Self::AbsolutePath { .. }
            | Self::BadCommandLine(_) => ErrorKind::Semantic,
        }
    }
}

/// Result type for desktop entry operations.
pub type Result<T> = std::result::Result<T, DesktopEntryError>;
