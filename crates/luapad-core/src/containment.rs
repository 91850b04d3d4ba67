//! Protected boundary crossings and diagnostic delivery

use std::any::Any;
use std::cell::RefCell;
use std::panic::{self, AssertUnwindSafe};
use std::rc::Rc;

use tracing::{debug, error};

use crate::error::Diagnostic;

/// Receives every contained guest failure
pub trait DiagnosticSink {
    fn report(&self, diagnostic: &Diagnostic);
}

/// Sink that only logs
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

impl DiagnosticSink for TracingSink {
    fn report(&self, diagnostic: &Diagnostic) {
        error!(
            target: "scripting",
            session = %diagnostic.session,
            kind = %diagnostic.kind,
            "{}",
            diagnostic.message
        );
    }
}

/// Sink that keeps diagnostics in memory.
///
/// Clones share one buffer, so a host can hand a clone to the session manager
/// and read messages back from its own copy.
#[derive(Debug, Clone, Default)]
pub struct DiagnosticLog {
    entries: Rc<RefCell<Vec<Diagnostic>>>,
}

impl DiagnosticLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entries(&self) -> Vec<Diagnostic> {
        self.entries.borrow().clone()
    }

    /// Drain everything reported so far
    pub fn take(&self) -> Vec<Diagnostic> {
        std::mem::take(&mut *self.entries.borrow_mut())
    }

    pub fn len(&self) -> usize {
        self.entries.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.borrow().is_empty()
    }
}

impl DiagnosticSink for DiagnosticLog {
    fn report(&self, diagnostic: &Diagnostic) {
        self.entries.borrow_mut().push(diagnostic.clone());
    }
}

/// Run one boundary crossing, turning both Lua errors and host panics into a message
pub fn contain<T, F>(f: F) -> Result<T, String>
where
    F: FnOnce() -> mlua::Result<T>,
{
    match panic::catch_unwind(AssertUnwindSafe(f)) {
        Ok(Ok(value)) => Ok(value),
        Ok(Err(err)) => {
            debug!(target: "scripting", "Contained Lua error: {}", err);
            Err(error_message(&err))
        }
        Err(payload) => Err(format!("host panic: {}", panic_message(payload.as_ref()))),
    }
}

/// One-line message for a Lua error: the innermost cause without its traceback
fn error_message(err: &mlua::Error) -> String {
    let text = match err {
        mlua::Error::RuntimeError(message) => message.clone(),
        mlua::Error::SyntaxError { message, .. } => message.clone(),
        mlua::Error::CallbackError { cause, .. } => return error_message(cause),
        other => other.to_string(),
    };
    // Tracebacks start on the second line
    text.lines().next().unwrap_or_default().trim_end().to_string()
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(message) = payload.downcast_ref::<&str>() {
        message
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message
    } else {
        "unknown panic"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::DiagnosticKind;
    use crate::session::SessionId;

    #[test]
    fn test_contain_passes_values_through() {
        assert_eq!(contain(|| Ok(7)), Ok(7));
    }

    #[test]
    fn test_contain_converts_lua_errors() {
        let result: Result<(), String> =
            contain(|| Err(mlua::Error::RuntimeError("boom".to_string())));
        assert_eq!(result, Err("boom".to_string()));
    }

    #[test]
    fn test_error_message_drops_traceback() {
        let err = mlua::Error::RuntimeError(
            "test.lua:1: late\nstack traceback:\n\t[C]: in function 'error'".to_string(),
        );
        assert_eq!(error_message(&err), "test.lua:1: late");
    }

    #[test]
    fn test_error_message_unwraps_callback_cause() {
        let err = mlua::Error::CallbackError {
            traceback: "stack traceback:\n\t[C]: in ?".to_string(),
            cause: std::sync::Arc::new(mlua::Error::RuntimeError(
                "bad argument #1 to 'drawRect' (x)".to_string(),
            )),
        };
        assert_eq!(error_message(&err), "bad argument #1 to 'drawRect' (x)");
    }

    #[test]
    fn test_lua_raised_errors_are_one_line() {
        let lua = mlua::Lua::new();
        let result: Result<(), String> = contain(|| {
            lua.load("error('late')")
                .set_name("=test.lua")
                .exec()
        });
        assert_eq!(result, Err("test.lua:1: late".to_string()));
    }

    #[test]
    fn test_contain_catches_panics() {
        let result: Result<(), String> = contain(|| panic!("host bug"));
        assert_eq!(result, Err("host panic: host bug".to_string()));
    }

    #[test]
    fn test_log_clones_share_entries() {
        let log = DiagnosticLog::new();
        let sink = log.clone();
        sink.report(&Diagnostic::new(
            SessionId::new(1),
            DiagnosticKind::Runtime,
            "oops",
        ));

        assert_eq!(log.len(), 1);
        assert_eq!(log.take()[0].message, "oops");
        assert!(sink.is_empty());
    }
}
