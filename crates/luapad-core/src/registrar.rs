//! Installs native bindings into a session's guest namespace
//!
//! A binding is a name, an ordered argument contract and a plain host function.
//! The registrar builds the Lua-side function: it walks the call arguments against
//! the contract, runs each through its marshalling adapter, calls the host function
//! with typed [`Args`] and converts the returned [`Ret`] values back.

use mlua::{Lua, MultiValue, Table, Value};
use tracing::debug;

use crate::config::MarshalPolicy;
use crate::context::{HostContext, SharedContext};
use crate::error::MarshalError;
use crate::input::PointerState;
use crate::marshal;
use crate::scheduler::{FRAME_YIELD, SLEEP_YIELD};
use crate::surface::Color;

/// Expected shape of one positional argument
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamKind {
    Number,
    /// Packed integer or channel table
    Color,
    Text,
    /// Sprite or texture handle
    Handle,
    /// Two-component table such as a velocity
    Vec2,
}

/// A converted argument as handed to a host function
#[derive(Debug, Clone, PartialEq)]
pub enum Arg {
    Number(f64),
    Color(Color),
    Text(String),
    Handle(u32),
    Vec2(f64, f64),
}

/// One entry of a binding's argument contract
#[derive(Debug, Clone, PartialEq)]
pub struct Param {
    pub name: &'static str,
    pub kind: ParamKind,
    /// Value used when the argument is absent or cannot be converted
    pub default: Arg,
    pub optional: bool,
}

impl Param {
    pub fn number(name: &'static str) -> Self {
        Self::required(name, ParamKind::Number, Arg::Number(0.0))
    }

    pub fn color(name: &'static str) -> Self {
        Self::required(name, ParamKind::Color, Arg::Color(Color::BLACK))
    }

    pub fn text(name: &'static str) -> Self {
        Self::required(name, ParamKind::Text, Arg::Text(String::new()))
    }

    /// Handle 0 never resolves to a host object
    pub fn handle(name: &'static str) -> Self {
        Self::required(name, ParamKind::Handle, Arg::Handle(0))
    }

    pub fn vec2(name: &'static str) -> Self {
        Self::required(name, ParamKind::Vec2, Arg::Vec2(0.0, 0.0))
    }

    /// Mark the parameter optional with a documented default
    pub fn or(mut self, default: Arg) -> Self {
        self.default = default;
        self.optional = true;
        self
    }

    fn required(name: &'static str, kind: ParamKind, default: Arg) -> Self {
        Self {
            name,
            kind,
            default,
            optional: false,
        }
    }

    fn convert(&self, value: &Value) -> Result<Arg, MarshalError> {
        match self.kind {
            ParamKind::Number => marshal::to_number(value).map(Arg::Number),
            ParamKind::Color => marshal::to_color(value).map(Arg::Color),
            ParamKind::Text => marshal::to_text(value).map(Arg::Text),
            ParamKind::Handle => marshal::to_handle(value).map(Arg::Handle),
            ParamKind::Vec2 => marshal::to_vec2(value).map(|(x, y)| Arg::Vec2(x, y)),
        }
    }
}

/// Converted arguments in contract order
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Args(Vec<Arg>);

impl Args {
    #[cfg(test)]
    pub(crate) fn new(args: Vec<Arg>) -> Self {
        Self(args)
    }

    pub fn number(&self, index: usize) -> f64 {
        match self.0.get(index) {
            Some(Arg::Number(n)) => *n,
            _ => 0.0,
        }
    }

    pub fn color(&self, index: usize) -> Color {
        match self.0.get(index) {
            Some(Arg::Color(color)) => *color,
            _ => Color::BLACK,
        }
    }

    pub fn text(&self, index: usize) -> &str {
        match self.0.get(index) {
            Some(Arg::Text(text)) => text,
            _ => "",
        }
    }

    pub fn handle(&self, index: usize) -> u32 {
        match self.0.get(index) {
            Some(Arg::Handle(handle)) => *handle,
            _ => 0,
        }
    }

    pub fn vec2(&self, index: usize) -> (f64, f64) {
        match self.0.get(index) {
            Some(Arg::Vec2(x, y)) => (*x, *y),
            _ => (0.0, 0.0),
        }
    }
}

/// A value returned to the guest
#[derive(Debug, Clone, PartialEq)]
pub enum Ret {
    Nil,
    Number(f64),
    Handle(u32),
    /// Becomes `{x = .., y = .., pressed = ..}`
    Pointer(PointerState),
}

/// Host side of a binding
pub type HostFn = fn(&mut HostContext, &Args) -> Vec<Ret>;

/// Descriptor mapping a guest-callable name to a host function
#[derive(Clone)]
pub struct NativeBinding {
    pub name: &'static str,
    pub contract: Vec<Param>,
    /// Number of values the guest receives; missing results are padded with nil
    pub returns: usize,
    pub host: HostFn,
}

impl NativeBinding {
    pub fn new(name: &'static str, contract: Vec<Param>, returns: usize, host: HostFn) -> Self {
        Self {
            name,
            contract,
            returns,
            host,
        }
    }
}

/// Builds the guest API table of one session
pub struct Registrar<'lua> {
    lua: &'lua Lua,
    api: Table,
    context: SharedContext,
    policy: MarshalPolicy,
    installed: Vec<&'static str>,
}

impl<'lua> Registrar<'lua> {
    pub fn new(lua: &'lua Lua, api: Table, context: SharedContext, policy: MarshalPolicy) -> Self {
        Self {
            lua,
            api,
            context,
            policy,
            installed: Vec::new(),
        }
    }

    /// Install `binding` under its name in the API table
    pub fn register_function(&mut self, binding: NativeBinding) -> mlua::Result<()> {
        let NativeBinding {
            name,
            contract,
            returns,
            host,
        } = binding;
        let context = self.context.clone();
        let policy = self.policy;

        let function = self.lua.create_function(move |lua, values: MultiValue| {
            let args = read_args(name, &contract, values, policy)?;
            let results = {
                let mut ctx = context.borrow_mut();
                host(&mut ctx, &args)
            };
            into_multi(lua, results, returns)
        })?;

        self.api.set(name, function)?;
        self.installed.push(name);
        Ok(())
    }

    /// Install `update()` and `sleep(seconds)`, the only two suspension points.
    ///
    /// They have to be Lua functions: a coroutine can only yield from Lua code.
    pub fn install_yield_primitives(&mut self) -> mlua::Result<()> {
        let install: mlua::Function = self
            .lua
            .load(YIELD_PRIMITIVES)
            .set_name("=luapad.yield")
            .into_function()?;
        install.call::<()>((self.api.clone(), FRAME_YIELD, SLEEP_YIELD))?;
        self.installed.push("update");
        self.installed.push("sleep");
        Ok(())
    }

    /// Names installed, in registration order
    pub fn into_installed(self) -> Vec<&'static str> {
        self.installed
    }
}

const YIELD_PRIMITIVES: &str = r#"
local api, frame, sleep = ...
local yield = coroutine.yield
api.update = function() return yield(frame) end
api.sleep = function(seconds) return yield(sleep, seconds) end
"#;

fn read_args(
    name: &'static str,
    contract: &[Param],
    values: MultiValue,
    policy: MarshalPolicy,
) -> mlua::Result<Args> {
    let mut values = values.into_iter();
    let mut args = Vec::with_capacity(contract.len());

    for (index, param) in contract.iter().enumerate() {
        let value = values.next().unwrap_or(Value::Nil);
        let arg = match param.convert(&value) {
            Ok(arg) => arg,
            Err(MarshalError::Missing) if param.optional => param.default.clone(),
            Err(err) => match policy {
                MarshalPolicy::Permissive => {
                    debug!(
                        target: "scripting",
                        "{}: argument #{} ({}) {}; using default",
                        name,
                        index + 1,
                        param.name,
                        err
                    );
                    param.default.clone()
                }
                MarshalPolicy::Strict => {
                    return Err(mlua::Error::RuntimeError(format!(
                        "bad argument #{} to '{}' ({}): {}",
                        index + 1,
                        name,
                        param.name,
                        err
                    )));
                }
            },
        };
        args.push(arg);
    }

    Ok(Args(args))
}

fn into_multi(lua: &Lua, mut results: Vec<Ret>, returns: usize) -> mlua::Result<MultiValue> {
    results.resize(returns, Ret::Nil);
    results
        .into_iter()
        .map(|ret| match ret {
            Ret::Nil => Ok(Value::Nil),
            Ret::Number(n) => Ok(Value::Number(n)),
            Ret::Handle(handle) => Ok(Value::Integer(i64::from(handle))),
            Ret::Pointer(pointer) => {
                let table = lua.create_table()?;
                table.set("x", pointer.x)?;
                table.set("y", pointer.y)?;
                table.set("pressed", pointer.pressed)?;
                Ok(Value::Table(table))
            }
        })
        .collect()
}
