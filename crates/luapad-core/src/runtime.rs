//! The session manager: one current session, driven by render ticks and host timers

use std::rc::Rc;
use std::time::Instant;

use tracing::{debug, info, warn};

use crate::clock::FrameTime;
use crate::config::RuntimeConfig;
use crate::containment::DiagnosticSink;
use crate::context::HostContext;
use crate::error::{CompileError, Diagnostic, DiagnosticKind};
use crate::input::PointerState;
use crate::scheduler::{CoroutineStatus, ResumeOutcome, SuspensionRequest};
use crate::session::{InterpreterSession, SessionId, Wake};
use crate::sprites::{Sprite, TextureRegistry};
use crate::surface::SharedSurface;
use crate::timer::TimerManager;

/// Owns the current session and everything that outlives a single run.
///
/// All entry points take `now` from the host so ticks and timers can be driven
/// from a real clock or a simulated one.
pub struct SessionManager {
    config: RuntimeConfig,
    surface: SharedSurface,
    textures: Rc<dyn TextureRegistry>,
    sink: Box<dyn DiagnosticSink>,
    timers: TimerManager,
    pointer: PointerState,
    current: Option<InterpreterSession>,
    next_id: u64,
}

impl SessionManager {
    pub fn new(
        config: RuntimeConfig,
        surface: SharedSurface,
        textures: Rc<dyn TextureRegistry>,
        sink: Box<dyn DiagnosticSink>,
    ) -> Self {
        Self {
            config,
            surface,
            textures,
            sink,
            timers: TimerManager::new(),
            pointer: PointerState::default(),
            current: None,
            next_id: 1,
        }
    }

    /// Retire the current session, then compile `source` into a fresh one.
    ///
    /// The new coroutine is NOT_STARTED; call [`run`](Self::run) for the first resume.
    /// A compile failure is reported to the sink and leaves no session behind.
    pub fn start_session(
        &mut self,
        source: &str,
        chunk: &str,
        now: Instant,
    ) -> Result<SessionId, CompileError> {
        if let Some(previous) = self.current.take() {
            info!(target: "scripting", "Replacing session {}", previous.id());
            self.retire(previous);
        }
        self.surface.borrow_mut().reset();

        let id = SessionId::new(self.next_id);
        self.next_id += 1;

        let context = HostContext::new(
            self.surface.clone(),
            self.textures.clone(),
            &self.config,
            self.pointer,
            now,
        )
        .shared();

        match InterpreterSession::open(id, source, chunk, context, self.config.marshalling) {
            Ok(session) => {
                info!(target: "scripting", "Started session {} ({})", id, chunk);
                self.current = Some(session);
                Ok(id)
            }
            Err(err) => {
                self.sink
                    .report(&Diagnostic::new(id, DiagnosticKind::Compile, err.message.clone()));
                Err(err)
            }
        }
    }

    /// First resume of the current session
    pub fn run(&mut self, now: Instant) -> Option<ResumeOutcome> {
        match self.current.as_ref().map(|s| s.coroutine().status()) {
            Some(CoroutineStatus::NotStarted) => self.resume_current(now),
            _ => None,
        }
    }

    /// Start a session and give it its first resume
    pub fn run_source(
        &mut self,
        source: &str,
        chunk: &str,
        now: Instant,
    ) -> Result<SessionId, CompileError> {
        let id = self.start_session(source, chunk, now)?;
        self.run(now);
        Ok(id)
    }

    /// Stop scheduling the current session. Safe to call repeatedly.
    ///
    /// The session stays current in its closed state so its last frame remains
    /// on screen; its interpreter is dropped when the next run replaces it.
    pub fn stop_session(&mut self) {
        let Some(session) = self.current.as_mut() else {
            return;
        };
        if !session.is_active() {
            return;
        }
        let id = session.id();
        // A session waits on at most one timer
        if let Wake::Timer(timer) = session.wake() {
            self.timers.cancel_timer(timer);
        }
        session.close();
        info!(target: "scripting", "Stopped session {}", id);
    }

    /// One render tick: frame clock, due timers, at most one resume, frame callbacks.
    ///
    /// Returns whether the coroutine was resumed.
    pub fn tick(&mut self, now: Instant) -> bool {
        let dt = match self.current.as_ref() {
            Some(session) if session.is_active() => {
                session.context().borrow_mut().clock_mut().tick(now).dt
            }
            _ => return false,
        };

        let mut resumed = self.fire_timers(now);
        if !resumed && self.current.as_ref().map(|s| s.wake()) == Some(Wake::NextTick) {
            resumed = self.resume_current(now).is_some();
        }

        self.run_frame_callbacks(dt);
        resumed
    }

    /// Host timer callback. Resumes the current coroutine if its sleep timer is due.
    ///
    /// Timers owned by a replaced or stopped session are dropped without resuming anything.
    pub fn fire_timers(&mut self, now: Instant) -> bool {
        let mut resumed = false;
        for fired in self.timers.tick(now) {
            let awaited = self.current.as_ref().is_some_and(|session| {
                session.is_active()
                    && session.id() == fired.owner
                    && session.wake() == Wake::Timer(fired.id)
            });
            if !awaited || resumed {
                debug!(target: "timers", "Suppressing stale {:?} of session {}", fired.id, fired.owner);
                continue;
            }
            resumed = self.resume_current(now).is_some();
        }
        resumed
    }

    /// Earliest moment a sleeping coroutine may need a resume
    pub fn next_deadline(&self) -> Option<Instant> {
        self.timers.next_deadline()
    }

    pub fn set_pointer(&mut self, pointer: PointerState) {
        self.pointer = pointer;
        if let Some(session) = &self.current {
            session.context().borrow_mut().set_pointer(pointer);
        }
    }

    pub fn resize(&mut self, width: f64, height: f64) {
        debug!(target: "scripting", "Surface resized to {}x{}", width, height);
        self.surface.borrow_mut().resize(width, height);
    }

    pub fn status(&self) -> Option<CoroutineStatus> {
        self.current.as_ref().map(|s| s.coroutine().status())
    }

    pub fn current_id(&self) -> Option<SessionId> {
        self.current.as_ref().map(|s| s.id())
    }

    pub fn current(&self) -> Option<&InterpreterSession> {
        self.current.as_ref()
    }

    /// Resumes issued to the current coroutine so far
    pub fn resumes(&self) -> u64 {
        self.current
            .as_ref()
            .map_or(0, |s| s.coroutine().resumes())
    }

    /// Snapshot of the current session's sprites
    pub fn sprites(&self) -> Vec<Sprite> {
        self.current.as_ref().map_or_else(Vec::new, |s| {
            s.context().borrow().sprites().iter().cloned().collect()
        })
    }

    /// Frame clock state of the current session
    pub fn frame_time(&self) -> Option<FrameTime> {
        self.current.as_ref().map(|s| {
            let context = s.context().borrow();
            FrameTime {
                dt: context.clock().dt(),
                frame_index: context.clock().frame_index(),
            }
        })
    }

    /// Guest-visible natives of the current session
    pub fn binding_count(&self) -> usize {
        self.current.as_ref().map_or(0, |s| s.bindings().len())
    }

    pub fn fps(&self) -> f64 {
        self.current
            .as_ref()
            .map_or(0.0, |s| s.context().borrow().clock().fps())
    }

    pub fn pending_timers(&self) -> usize {
        self.timers.active_count()
    }

    pub fn config(&self) -> &RuntimeConfig {
        &self.config
    }

    fn retire(&mut self, mut session: InterpreterSession) {
        session.close();
        self.timers.cancel_owned_by(session.id());
    }

    fn resume_current(&mut self, now: Instant) -> Option<ResumeOutcome> {
        let session = self.current.as_mut()?;
        let id = session.id();
        let first = session.coroutine().status() == CoroutineStatus::NotStarted;
        session.set_wake(Wake::Idle);

        let outcome = if first {
            session.coroutine_mut().run()
        } else {
            session.coroutine_mut().resume()
        };
        let outcome = match outcome {
            Ok(outcome) => outcome,
            Err(err) => {
                warn!(target: "scripting", "Session {}: {}", id, err);
                return None;
            }
        };

        match &outcome {
            ResumeOutcome::Yielded(SuspensionRequest::NextTick) => {
                session.set_wake(Wake::NextTick);
            }
            ResumeOutcome::Yielded(SuspensionRequest::After(delay)) => {
                let timer = self.timers.schedule_timer(now, *delay, id);
                session.set_wake(Wake::Timer(timer));
            }
            ResumeOutcome::Returned => {
                info!(target: "scripting", "Session {} completed", id);
            }
            ResumeOutcome::Failed { kind, message } => {
                self.sink.report(&Diagnostic::new(id, *kind, message.clone()));
            }
        }

        if session.stop_requested() {
            self.stop_session();
        }
        Some(outcome)
    }

    fn run_frame_callbacks(&mut self, dt: f64) {
        let Some(session) = self.current.as_mut() else {
            return;
        };
        if !session.is_active()
            || session.coroutine().status() != CoroutineStatus::Completed
            || !session.has_frame_callbacks()
        {
            return;
        }

        let id = session.id();
        session.context().borrow_mut().clear();
        if let Err(message) = session.run_frame_callbacks(dt) {
            self.sink
                .report(&Diagnostic::new(id, DiagnosticKind::Callback, message));
            self.stop_session();
            return;
        }

        if session.stop_requested() {
            self.stop_session();
        }
    }
}

impl Drop for SessionManager {
    fn drop(&mut self) {
        if let Some(session) = self.current.take() {
            self.retire(session);
        }
    }
}
