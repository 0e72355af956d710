use std::fmt;

use thiserror::Error;

#[derive(Debug, Error)]
#[error(transparent)]
pub struct Error(Box<ErrorKind>);

impl Error {
    pub fn kind(&self) -> &ErrorKind {
        self.0.as_ref()
    }

    pub fn into_kind(self) -> ErrorKind {
        *self.0
    }

    pub fn invalid_arg(name: impl Into<String>, message: impl Into<String>) -> Error {
        Error(
            ErrorKind::InvalidArgument {
                name: name.into(),
                message: message.into(),
            }
            .into(),
        )
    }

    pub fn invalid_operation(name: impl Into<String>) -> Error {
        Error(ErrorKind::InvalidOperation { name: name.into() }.into())
    }

    pub fn empty_input(operation: impl Into<String>) -> Error {
        Error(
            ErrorKind::EmptyInput {
                operation: operation.into(),
            }
            .into(),
        )
    }

    pub fn io(context: impl Into<String>, source: std::io::Error) -> Error {
        Error(
            ErrorKind::Io {
                context: context.into(),
                source,
            }
            .into(),
        )
    }

    /// Folds a list of interruption occurrences into a single `Interrupted` error.
    ///
    /// The first occurrence becomes the primary cause, the rest are kept as
    /// suppressed causes in their original order. Returns `None` for an empty list.
    pub fn interrupted(occurrences: impl IntoIterator<Item = Interruption>) -> Option<Error> {
        let mut occurrences = occurrences.into_iter();
        let primary = occurrences.next()?;
        Some(Error(
            ErrorKind::Interrupted {
                primary,
                suppressed: occurrences.collect(),
            }
            .into(),
        ))
    }

    pub fn is_interrupted(&self) -> bool {
        matches!(self.kind(), ErrorKind::Interrupted { .. })
    }

    /// Total number of interruption occurrences carried by this error
    /// (primary plus suppressed), or zero for any other error kind.
    pub fn interruption_count(&self) -> usize {
        match self.kind() {
            ErrorKind::Interrupted { suppressed, .. } => 1 + suppressed.len(),
            _ => 0,
        }
    }

    /// Iterates over all interruption occurrences, primary first.
    pub fn interruptions(&self) -> impl Iterator<Item = &Interruption> {
        let (primary, suppressed) = match self.kind() {
            ErrorKind::Interrupted {
                primary,
                suppressed,
            } => (Some(primary), suppressed.as_slice()),
            _ => (None, &[][..]),
        };
        primary.into_iter().chain(suppressed.iter())
    }
}

#[derive(Debug, Error)]
pub enum ErrorKind {
    #[error("invalid argument {name}: {message}")]
    InvalidArgument { name: String, message: String },

    #[error("invalid operation {name}")]
    InvalidOperation { name: String },

    #[error("{operation}: input sequence is empty")]
    EmptyInput { operation: String },

    #[error("interrupted: {primary} ({} suppressed)", .suppressed.len())]
    Interrupted {
        primary: Interruption,
        suppressed: Vec<Interruption>,
    },

    #[error("IO error for '{context}': {source}")]
    Io {
        context: String,
        source: std::io::Error,
    },
}

/// A single wait that ended without producing a result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Interruption {
    /// Position of the awaited task within its batch.
    pub task_index: usize,
    pub reason: InterruptReason,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InterruptReason {
    /// The task was removed from the queue by a pool shutdown before any worker picked it up.
    Discarded,
    /// The result slot was closed without a value for any other reason.
    Abandoned,
}

impl fmt::Display for Interruption {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.reason {
            InterruptReason::Discarded => {
                write!(f, "task #{} discarded by pool shutdown", self.task_index)
            }
            InterruptReason::Abandoned => {
                write!(f, "task #{} abandoned without a result", self.task_index)
            }
        }
    }
}

impl From<ErrorKind> for Error {
    fn from(kind: ErrorKind) -> Self {
        Error(kind.into())
    }
}
