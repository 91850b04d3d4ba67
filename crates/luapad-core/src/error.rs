use std::fmt;

use thiserror::Error;

use crate::scheduler::CoroutineStatus;
use crate::session::SessionId;

/// Source text failed to compile. No session exists afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("failed to compile {chunk}: {message}")]
pub struct CompileError {
    /// Chunk name the source was loaded under
    pub chunk: String,
    /// Message produced by the Lua compiler
    pub message: String,
}

/// Which boundary crossing a contained guest failure came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DiagnosticKind {
    /// Source failed to compile
    Compile,
    /// The first resume failed before any yield
    Invocation,
    /// A later resume failed after at least one yield
    Runtime,
    /// A setup/update/draw frame callback failed
    Callback,
}

impl fmt::Display for DiagnosticKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            DiagnosticKind::Compile => "compile error",
            DiagnosticKind::Invocation => "invocation error",
            DiagnosticKind::Runtime => "runtime error",
            DiagnosticKind::Callback => "callback error",
        };
        f.write_str(name)
    }
}

/// A guest failure converted into a host-side message
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("[session {session}] {kind}: {message}")]
pub struct Diagnostic {
    pub session: SessionId,
    pub kind: DiagnosticKind,
    pub message: String,
}

impl Diagnostic {
    pub fn new(session: SessionId, kind: DiagnosticKind, message: impl Into<String>) -> Self {
        Self {
            session,
            kind,
            message: message.into(),
        }
    }
}

/// Tagged failure produced by a marshalling adapter.
///
/// The registrar decides whether this becomes a default value or a guest error.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MarshalError {
    #[error("missing argument")]
    Missing,
    #[error("expected {expected}, found {found}")]
    TypeMismatch {
        expected: &'static str,
        found: &'static str,
    },
    #[error("expected {expected} channel values, found {found}")]
    ChannelCount { expected: &'static str, found: usize },
}

/// Scheduler entry point called in the wrong coroutine state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum SchedulerError {
    #[error("coroutine cannot be resumed while {0}")]
    NotResumable(CoroutineStatus),
}
