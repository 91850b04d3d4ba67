//! Resumable execution of a session's entry chunk
//!
//! The compiled chunk runs inside a Lua thread. Each resume runs guest code until it
//! yields through `update()` or `sleep(seconds)`, returns, or fails. The yield values
//! tell the scheduler when the next resume is due.

use std::fmt;
use std::time::Duration;

use mlua::{MultiValue, Thread, ThreadStatus, Value};
use tracing::debug;

use crate::containment;
use crate::error::{DiagnosticKind, SchedulerError};

/// Marker yielded by the per-frame primitive
pub const FRAME_YIELD: &str = "luapad.frame";

/// Marker yielded by the timed-sleep primitive, followed by the delay in seconds
pub const SLEEP_YIELD: &str = "luapad.sleep";

/// Upper bound on a single sleep
pub const MAX_SLEEP: Duration = Duration::from_secs(24 * 60 * 60);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CoroutineStatus {
    NotStarted,
    Running,
    Suspended,
    Completed,
    Failed,
}

impl CoroutineStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, CoroutineStatus::Completed | CoroutineStatus::Failed)
    }
}

impl fmt::Display for CoroutineStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            CoroutineStatus::NotStarted => "NOT_STARTED",
            CoroutineStatus::Running => "RUNNING",
            CoroutineStatus::Suspended => "SUSPENDED",
            CoroutineStatus::Completed => "COMPLETED",
            CoroutineStatus::Failed => "FAILED",
        };
        f.write_str(name)
    }
}

/// Why the coroutine last suspended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SuspensionRequest {
    /// Resume on the next render tick
    NextTick,
    /// Resume once a host timer of this length fires
    After(Duration),
}

/// Result of a single resume
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResumeOutcome {
    Yielded(SuspensionRequest),
    Returned,
    Failed {
        kind: DiagnosticKind,
        message: String,
    },
}

/// State machine around the Lua thread running a session's entry chunk
pub struct ExecutionCoroutine {
    thread: Thread,
    status: CoroutineStatus,
    suspension: Option<SuspensionRequest>,
    resumes: u64,
    yields: u64,
    failure: Option<String>,
}

impl ExecutionCoroutine {
    pub fn new(thread: Thread) -> Self {
        Self {
            thread,
            status: CoroutineStatus::NotStarted,
            suspension: None,
            resumes: 0,
            yields: 0,
            failure: None,
        }
    }

    pub fn status(&self) -> CoroutineStatus {
        self.status
    }

    /// Reason of the current suspension, if suspended
    pub fn suspension(&self) -> Option<SuspensionRequest> {
        self.suspension
    }

    /// Number of resumes issued, the first one included
    pub fn resumes(&self) -> u64 {
        self.resumes
    }

    pub fn yields(&self) -> u64 {
        self.yields
    }

    /// Message captured when the coroutine failed
    pub fn failure(&self) -> Option<&str> {
        self.failure.as_deref()
    }

    /// First resume, with no arguments. A failure here is an invocation error.
    pub fn run(&mut self) -> Result<ResumeOutcome, SchedulerError> {
        if self.status != CoroutineStatus::NotStarted {
            return Err(SchedulerError::NotResumable(self.status));
        }
        Ok(self.step(DiagnosticKind::Invocation))
    }

    /// Continue a suspended coroutine. A failure here is a runtime error.
    pub fn resume(&mut self) -> Result<ResumeOutcome, SchedulerError> {
        if self.status != CoroutineStatus::Suspended {
            return Err(SchedulerError::NotResumable(self.status));
        }
        Ok(self.step(DiagnosticKind::Runtime))
    }

    /// Force a terminal state without running more guest code
    pub fn terminate(&mut self) {
        if !self.status.is_terminal() {
            self.status = CoroutineStatus::Completed;
        }
        self.suspension = None;
    }

    fn step(&mut self, failure_kind: DiagnosticKind) -> ResumeOutcome {
        self.status = CoroutineStatus::Running;
        self.suspension = None;
        self.resumes += 1;

        let thread = &self.thread;
        let result = containment::contain(|| thread.resume::<MultiValue>(()));

        match result {
            Ok(values) if self.thread.status() == ThreadStatus::Resumable => {
                let request = suspension_from(&values);
                self.status = CoroutineStatus::Suspended;
                self.suspension = Some(request);
                self.yields += 1;
                debug!(target: "scripting", "Coroutine yielded {:?} after resume {}", request, self.resumes);
                ResumeOutcome::Yielded(request)
            }
            Ok(_) => {
                self.status = CoroutineStatus::Completed;
                ResumeOutcome::Returned
            }
            Err(message) => {
                self.status = CoroutineStatus::Failed;
                self.failure = Some(message.clone());
                ResumeOutcome::Failed {
                    kind: failure_kind,
                    message,
                }
            }
        }
    }
}

/// Decode the values passed to `coroutine.yield`.
///
/// Anything other than the sleep marker, including a bare `coroutine.yield()`,
/// waits for the next tick.
pub fn suspension_from(values: &MultiValue) -> SuspensionRequest {
    let mut values = values.iter();
    match (values.next(), values.next()) {
        (Some(Value::String(marker)), delay) if *marker.as_bytes() == *SLEEP_YIELD.as_bytes() => {
            let seconds = match delay {
                Some(Value::Number(n)) => *n,
                Some(Value::Integer(n)) => *n as f64,
                _ => 0.0,
            };
            SuspensionRequest::After(sleep_duration(seconds))
        }
        _ => SuspensionRequest::NextTick,
    }
}

fn sleep_duration(seconds: f64) -> Duration {
    if !seconds.is_finite() || seconds <= 0.0 {
        return Duration::ZERO;
    }
    Duration::try_from_secs_f64(seconds)
        .unwrap_or(MAX_SLEEP)
        .min(MAX_SLEEP)
}
