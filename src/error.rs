
use std::error::Error as StdError;
use std::fmt::{self, Debug, Display};

/// Discriminant for every failure this crate can report.
///
/// Callers are expected to branch on the kind rather than parse messages.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum ErrorKind {
    InvalidQuery,
    IncompatibleQueries,
    InvalidWord,
    WordNotFound,
    AnalyzeTextFailed,
    KanaParseFailed,
    InferenceFailed,
    InvalidModelData,
    InvalidModelFormat,
    ModelAlreadyLoaded,
    StyleAlreadyLoaded,
    ModelNotFound,
    StyleNotFound,
    LoadUserDictFailed,
    SaveUserDictFailed,
}

impl ErrorKind {
    pub fn name(&self) -> &'static str {
        match self {
            Self::InvalidQuery => "invalid-query",
            Self::IncompatibleQueries => "incompatible-queries",
            Self::InvalidWord => "invalid-word",
            Self::WordNotFound => "word-not-found",
            Self::AnalyzeTextFailed => "analyze-text-failed",
            Self::KanaParseFailed => "kana-parse-failed",
            Self::InferenceFailed => "inference-failed",
            Self::InvalidModelData => "invalid-model-data",
            Self::InvalidModelFormat => "invalid-model-format",
            Self::ModelAlreadyLoaded => "model-already-loaded",
            Self::StyleAlreadyLoaded => "style-already-loaded",
            Self::ModelNotFound => "model-not-found",
            Self::StyleNotFound => "style-not-found",
            Self::LoadUserDictFailed => "load-user-dict-failed",
            Self::SaveUserDictFailed => "save-user-dict-failed",
        }
    }
}

impl Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// The single error type of this crate: a kind tag, a human-readable
/// message, and an optional underlying cause.
pub struct Error {
    kind: ErrorKind,
    message: String,
    source: Option<Box<dyn StdError + Send + Sync>>,
}

impl Error {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            source: None,
        }
    }

    pub fn with_source(
        kind: ErrorKind,
        message: impl Into<String>,
        source: impl Into<Box<dyn StdError + Send + Sync>>,
    ) -> Self {
        Self {
            kind,
            message: message.into(),
            source: Some(source.into()),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl Debug for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        if let Some(source) = &self.source {
            write!(f, "Error({}): {} ({})", self.kind.name(), self.message, source)
        } else {
            write!(f, "Error({}): {}", self.kind.name(), self.message)
        }
    }
}

impl Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl StdError for Error {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        self.source
            .as_deref()
            .map(|source| source as &(dyn StdError + 'static))
    }
}

pub type Result<T> = std::result::Result<T, Error>;
