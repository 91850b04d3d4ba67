/// Lua script bridge for a real-time drawing surface
///
/// A script runs as a coroutine inside its own interpreter session. The host drives it
/// one render tick at a time; `update()` yields until the next tick and `sleep(seconds)`
/// until a host timer fires. Native bindings draw into a [`RenderSurface`] and manage
/// sprites addressed by integer handles.
pub mod bindings;
pub mod clock;
pub mod config;
pub mod containment;
pub mod context;
pub mod demos;
pub mod error;
pub mod input;
pub mod marshal;
pub mod registrar;
pub mod runtime;
pub mod scheduler;
pub mod session;
pub mod sprites;
pub mod surface;
pub mod timer;

// Re-export the types hosts need to drive a session
pub use clock::{FrameClock, FrameTime};
pub use config::{LuapadConfig, MarshalPolicy, RuntimeConfig};
pub use containment::{DiagnosticLog, DiagnosticSink, TracingSink};
pub use error::{CompileError, Diagnostic, DiagnosticKind, MarshalError};
pub use input::PointerState;
pub use runtime::SessionManager;
pub use scheduler::{CoroutineStatus, ResumeOutcome, SuspensionRequest};
pub use session::SessionId;
pub use sprites::{Sprite, TextureId, TextureInfo, TextureRegistry, TextureTable};
pub use surface::{
    Canvas, Color, DebugText, DrawCmd, Fill, RenderSurface, SharedSurface, MAX_CIRCLE_SEGMENTS,
};
pub use timer::{TimerId, TimerManager};
