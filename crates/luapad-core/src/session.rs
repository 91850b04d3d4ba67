//! One guest environment per run

use std::fmt;

use mlua::{Function, IntoLuaMulti, Lua, Table, Value};
use tracing::debug;

use crate::bindings;
use crate::config::MarshalPolicy;
use crate::containment;
use crate::context::SharedContext;
use crate::error::CompileError;
use crate::registrar::Registrar;
use crate::scheduler::ExecutionCoroutine;
use crate::timer::TimerId;

/// Identity of a session. Timers carry it so a replaced session is never resumed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SessionId(u64);

impl SessionId {
    pub fn new(id: u64) -> Self {
        Self(id)
    }

    pub fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Lifecycle {
    Active,
    Closed,
}

/// What the suspended coroutine is waiting for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Wake {
    Idle,
    NextTick,
    Timer(TimerId),
}

/// Resolves names against the native API first, then the script's own globals,
/// then the standard library. Assignments land in the script's globals.
const ENVIRONMENT: &str = r#"
local api, user, base = ...
return setmetatable({}, {
  __index = function(_, key)
    local value = api[key]
    if value ~= nil then return value end
    value = user[key]
    if value ~= nil then return value end
    return base[key]
  end,
  __newindex = user,
})
"#;

/// A live guest environment with its entry coroutine
pub struct InterpreterSession {
    id: SessionId,
    lifecycle: Lifecycle,
    wake: Wake,
    bindings: Vec<&'static str>,
    context: SharedContext,
    coroutine: ExecutionCoroutine,
    /// Globals assigned by the script
    user: Table,
    callbacks_started: bool,
    // Declared last so every Lua reference above is released first
    lua: Lua,
}

impl InterpreterSession {
    /// Allocate an interpreter, install the native API and compile `source`.
    ///
    /// On failure no session exists and nothing of the interpreter survives.
    pub fn open(
        id: SessionId,
        source: &str,
        chunk: &str,
        context: SharedContext,
        policy: MarshalPolicy,
    ) -> Result<Self, CompileError> {
        let lua = Lua::new();
        let built = containment::contain(|| {
            let api = lua.create_table()?;
            let mut registrar = Registrar::new(&lua, api.clone(), context.clone(), policy);
            for binding in bindings::catalogue() {
                registrar.register_function(binding)?;
            }
            registrar.install_yield_primitives()?;
            let installed = registrar.into_installed();

            let user = lua.create_table()?;
            let env: Table = lua
                .load(ENVIRONMENT)
                .set_name("=luapad.env")
                .call((api, user.clone(), lua.globals()))?;

            let entry = lua
                .load(source)
                .set_name(format!("@{chunk}"))
                .set_environment(env)
                .into_function()?;
            let thread = lua.create_thread(entry)?;
            Ok((installed, user, thread))
        });

        let (bindings, user, thread) = built.map_err(|message| CompileError {
            chunk: chunk.to_string(),
            message,
        })?;
        debug!(target: "scripting", "Session {} installed {} bindings", id, bindings.len());

        Ok(Self {
            id,
            lifecycle: Lifecycle::Active,
            wake: Wake::Idle,
            bindings,
            context,
            coroutine: ExecutionCoroutine::new(thread),
            user,
            callbacks_started: false,
            lua,
        })
    }

    pub fn id(&self) -> SessionId {
        self.id
    }

    pub fn is_active(&self) -> bool {
        self.lifecycle == Lifecycle::Active
    }

    /// Guest-visible names installed by the registrar
    pub fn bindings(&self) -> &[&'static str] {
        &self.bindings
    }

    pub fn context(&self) -> &SharedContext {
        &self.context
    }

    pub fn coroutine(&self) -> &ExecutionCoroutine {
        &self.coroutine
    }

    pub fn coroutine_mut(&mut self) -> &mut ExecutionCoroutine {
        &mut self.coroutine
    }

    pub fn wake(&self) -> Wake {
        self.wake
    }

    pub fn set_wake(&mut self, wake: Wake) {
        self.wake = wake;
    }

    pub fn stop_requested(&self) -> bool {
        self.context.borrow().stop_requested()
    }

    /// Whether the script defined any of `setup`, `update` or `draw`
    pub fn has_frame_callbacks(&self) -> bool {
        ["setup", "update", "draw"]
            .iter()
            .any(|name| user_function(&self.user, name).is_some())
    }

    /// Run `setup()` on the first call, then `update(dt)` and `draw()`
    pub fn run_frame_callbacks(&mut self, dt: f64) -> Result<(), String> {
        let first = !self.callbacks_started;
        self.callbacks_started = true;
        let user = &self.user;

        containment::contain(|| {
            if first {
                call_user(user, "setup", ())?;
            }
            call_user(user, "update", dt)?;
            call_user(user, "draw", ())
        })
    }

    /// Mark the coroutine terminal and free what the interpreter can release.
    ///
    /// The interpreter itself is dropped with the session.
    pub fn close(&mut self) {
        if self.lifecycle == Lifecycle::Closed {
            return;
        }
        self.lifecycle = Lifecycle::Closed;
        self.wake = Wake::Idle;
        self.coroutine.terminate();
        if let Err(err) = self.lua.gc_collect() {
            debug!(target: "scripting", "Session {} collection failed: {}", self.id, err);
        }
    }
}

fn user_function(user: &Table, name: &str) -> Option<Function> {
    match user.raw_get::<Value>(name) {
        Ok(Value::Function(function)) => Some(function),
        _ => None,
    }
}

fn call_user(user: &Table, name: &str, args: impl IntoLuaMulti) -> mlua::Result<()> {
    match user_function(user, name) {
        Some(function) => function.call::<()>(args),
        None => Ok(()),
    }
}
