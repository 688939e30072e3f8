use std::fmt;

use destination_core::{Destination, FetchFailure, Origin};

/// Failure reported by a collaborator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchError {
    pub kind: FailureKind,
    pub message: String,
}

impl FetchError {
    pub fn new(kind: FailureKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

impl fmt::Display for FetchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.message.is_empty() {
            write!(f, "{}", self.kind)
        } else {
            write!(f, "{}: {}", self.kind, self.message)
        }
    }
}

impl From<FetchError> for FetchFailure {
    fn from(err: FetchError) -> Self {
        FetchFailure::new(err.to_string())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    NotFound,
    PermissionDenied,
    Timeout,
    Unavailable,
    InvalidResponse,
    Cancelled,
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureKind::NotFound => write!(f, "printer not found"),
            FailureKind::PermissionDenied => write!(f, "permission denied"),
            FailureKind::Timeout => write!(f, "timeout"),
            FailureKind::Unavailable => write!(f, "service unavailable"),
            FailureKind::InvalidResponse => write!(f, "invalid response"),
            FailureKind::Cancelled => write!(f, "cancelled"),
        }
    }
}

/// One page of cloud search results. `done` marks the last page for the
/// requested origin.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CloudSearchBatch {
    pub origin: Option<Origin>,
    pub printers: Vec<Destination>,
    pub done: bool,
}
