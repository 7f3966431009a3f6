//! Error types for the quiz engine.
//!
//! Most failure paths in the engine degrade to a safe default instead of
//! surfacing an error. The types here cover the few places where the caller
//! has to decide what to do next.

use std::fmt;

use thiserror::Error;

/// Problems found while building a [`QuestionBank`](crate::bank::QuestionBank).
#[derive(Debug, Error)]
pub enum BankError {
    #[error("category file not found: {0}")]
    MissingFile(String),

    #[error("category file {file} is not valid UTF-8")]
    NotUtf8 { file: String },

    #[error("unable to parse category {file}: {source}")]
    Parse {
        file: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("question {question} in category '{category}' has answer index {index} outside 0..4")]
    AnswerOutOfRange {
        category: String,
        question: usize,
        index: usize,
    },

    #[error("category '{0}' is defined more than once")]
    DuplicateCategory(String),

    #[error("default category '{0}' is not in the bank")]
    MissingDefault(String),
}

/// Failures of the persisted key/value layer.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error(transparent)]
    Sqlite(#[from] rusqlite::Error),

    #[error("unable to create storage directory: {0}")]
    Io(#[from] std::io::Error),

    #[error("no application data directory available")]
    NoDataDir,

    #[error("unable to encode value: {0}")]
    Encode(#[from] serde_json::Error),
}

/// Reasons a session could not be initialized.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SessionError {
    /// The resolved category has no questions; the caller should send the
    /// player back to category selection.
    #[error("category '{0}' has no questions")]
    EmptyCategory(String),
}

/// The input field a validation message belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, strum_macros::Display)]
#[strum(serialize_all = "lowercase")]
pub enum Field {
    Name,
    Category,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldError {
    pub field: Field,
    pub message: &'static str,
}

/// Every field problem of a start request, reported together.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationErrors {
    errors: Vec<FieldError>,
}

impl ValidationErrors {
    pub fn push(&mut self, field: Field, message: &'static str) {
        self.errors.push(FieldError { field, message });
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn len(&self) -> usize {
        self.errors.len()
    }

    pub fn get(&self, field: Field) -> Option<&'static str> {
        self.errors
            .iter()
            .find(|e| e.field == field)
            .map(|e| e.message)
    }

    pub fn iter(&self) -> impl Iterator<Item = &FieldError> {
        self.errors.iter()
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for e in &self.errors {
            if !first {
                write!(f, "; ")?;
            }
            write!(f, "{}: {}", e.field, e.message)?;
            first = false;
        }
        Ok(())
    }
}

impl std::error::Error for ValidationErrors {}

/// Why [`Quiz::start_session`](crate::quiz::Quiz::start_session) refused to start.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StartError {
    #[error("invalid start request: {0}")]
    Invalid(#[from] ValidationErrors),

    #[error(transparent)]
    Session(#[from] SessionError),
}
