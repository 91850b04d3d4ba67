pub mod luapad_config;
pub mod paths;
pub mod runtime_config;
pub mod surface_config;

pub use luapad_config::{ConfigError, LoggingConfig, LuapadConfig};
pub use paths::ProjectPaths;
pub use runtime_config::{MarshalPolicy, RuntimeConfig};
pub use surface_config::{SurfaceConfig, TextureConfig};
