//! Work item and result data model
//!
//! A [`PendingItem`] is what sits in the frontier after a successful claim; it
//! becomes a [`WorkItem`] at dequeue time, when its sequence id is assigned.
//! Each dispatched work item produces exactly one [`ProcessingResult`].

use chrono::{DateTime, Utc};
use std::fmt;
use std::time::Duration;
use thiserror::Error;

/// A claimed identifier waiting in the frontier for a worker slot
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingItem {
    /// Canonical identifier
    pub identifier: String,

    /// Distance from the root (root = 0)
    pub depth: u32,

    /// Identifier of the node whose processing produced this item
    pub discovered_from: Option<String>,
}

impl PendingItem {
    /// Creates the pending item for a traversal root
    pub fn root(identifier: impl Into<String>) -> Self {
        Self {
            identifier: identifier.into(),
            depth: 0,
            discovered_from: None,
        }
    }

    /// Creates a pending item discovered while processing `parent`
    pub fn child_of(parent: &WorkItem, identifier: impl Into<String>) -> Self {
        Self {
            identifier: identifier.into(),
            depth: parent.depth + 1,
            discovered_from: Some(parent.identifier.clone()),
        }
    }

    /// Turns this pending item into a dispatchable work item
    pub fn into_work_item(self, sequence_id: u64) -> WorkItem {
        WorkItem {
            identifier: self.identifier,
            sequence_id,
            depth: self.depth,
            discovered_from: self.discovered_from,
        }
    }
}

/// A unit of work dispatched to exactly one worker
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkItem {
    /// Canonical identifier; equal identifiers are the same node
    pub identifier: String,

    /// Assigned monotonically at dequeue, for ordering and debugging
    pub sequence_id: u64,

    /// Distance from the root (root = 0)
    pub depth: u32,

    /// First discoverer of this node; `None` for the root
    pub discovered_from: Option<String>,
}

/// Per-node failure, recorded on the node's result and never propagated
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProcessError {
    /// The fetch itself failed (timeout, refused connection, DNS)
    #[error("transport error: {message}")]
    Transport { message: String },

    /// A response arrived with a non-success status
    #[error("HTTP {status_code}")]
    Protocol { status_code: u16 },

    /// The content could not be processed for links
    #[error("malformed content: {message}")]
    MalformedContent { message: String },

    /// The work was aborted by cancellation after it had started
    #[error("cancelled")]
    Cancelled,

    /// The worker task panicked
    #[error("worker panicked: {message}")]
    Panicked { message: String },
}

impl ProcessError {
    /// Stable label for this error kind, used in exports
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Transport { .. } => "transport_error",
            Self::Protocol { .. } => "protocol_error",
            Self::MalformedContent { .. } => "malformed_content",
            Self::Cancelled => "cancelled",
            Self::Panicked { .. } => "panicked",
        }
    }

    /// The HTTP status received, if any
    pub fn status_code(&self) -> Option<u16> {
        match self {
            Self::Protocol { status_code } => Some(*status_code),
            _ => None,
        }
    }
}

/// What a processor hands back to the engine for one work item
#[derive(Debug, Clone)]
pub struct Processed<T> {
    /// Success payload or the per-node error
    pub outcome: Result<T, ProcessError>,

    /// Canonical, in-scope identifiers discovered, in discovery order
    pub discovered: Vec<String>,
}

impl<T> Processed<T> {
    /// A successful outcome with discovered identifiers
    pub fn success(payload: T, discovered: Vec<String>) -> Self {
        Self {
            outcome: Ok(payload),
            discovered,
        }
    }

    /// A failed outcome; failures never discover anything
    pub fn failure(error: ProcessError) -> Self {
        Self {
            outcome: Err(error),
            discovered: Vec::new(),
        }
    }
}

/// Status value a payload contributes to exports
///
/// The crawler reports its HTTP status; payloads without one return `None`
/// and are exported with the `ok` label.
pub trait StatusCode {
    fn status_code(&self) -> Option<u16> {
        None
    }
}

impl StatusCode for () {}

/// The immutable outcome of processing one work item
#[derive(Debug, Clone)]
pub struct ProcessingResult<T> {
    /// The work item this result belongs to
    pub item: WorkItem,

    /// Success payload or per-node error
    pub outcome: Result<T, ProcessError>,

    /// Time spent processing, excluding the gate wait
    pub elapsed: Duration,

    /// Time spent waiting for the permit this item ran under
    ///
    /// Only the last acquisition counts: a permit taken while the frontier
    /// was momentarily empty is released, and the wait starts over.
    pub gate_wait: Duration,

    /// Canonical identifiers discovered by this node
    pub discovered: Vec<String>,

    /// When processing began
    pub timestamp: DateTime<Utc>,
}

impl<T> ProcessingResult<T> {
    /// The node's identifier
    pub fn identifier(&self) -> &str {
        &self.item.identifier
    }

    /// Returns true if processing succeeded
    pub fn is_success(&self) -> bool {
        self.outcome.is_ok()
    }

    /// The per-node error, if processing failed
    pub fn error(&self) -> Option<&ProcessError> {
        self.outcome.as_ref().err()
    }
}

impl<T: StatusCode> ProcessingResult<T> {
    /// Status column value: the HTTP status when known, else the outcome label
    pub fn status_label(&self) -> String {
        match &self.outcome {
            Ok(payload) => payload
                .status_code()
                .map(|code| code.to_string())
                .unwrap_or_else(|| "ok".to_string()),
            Err(error) => error
                .status_code()
                .map(|code| code.to_string())
                .unwrap_or_else(|| error.kind().to_string()),
        }
    }
}

impl fmt::Display for WorkItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "#{} [depth {}] {}",
            self.sequence_id, self.depth, self.identifier
        )
    }
}
