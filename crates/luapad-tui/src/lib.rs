pub mod app;
pub mod event_handler;
pub mod logging;
pub mod textures;
pub mod ui;

pub use app::{App, ScriptSource};
pub use event_handler::{EventHandler, TuiEvent};
pub use ui::try_init_tui;
