use std::cell::RefCell;
use std::collections::VecDeque;
use std::fs;
use std::path::PathBuf;
use std::rc::Rc;
use std::time::Instant;

use crossterm::event::{KeyCode, KeyEvent, MouseButton, MouseEvent, MouseEventKind};
use luapad_core::{
    demos, Canvas, DiagnosticLog, DiagnosticSink, LuapadConfig, PointerState, RenderSurface,
    SessionManager, SharedSurface, Sprite, TracingSink,
};
use ratatui::layout::Rect;
use tracing::{info, warn};

use crate::event_handler::TuiEvent;
use crate::textures::GlyphTextures;

const MAX_MESSAGES: usize = 200;

/// Where the run action reads script text from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScriptSource {
    File(PathBuf),
    Demo(&'static str),
}

impl ScriptSource {
    /// Chunk name used in error messages
    pub fn chunk_name(&self) -> String {
        match self {
            ScriptSource::File(path) => path
                .file_name()
                .map(|name| name.to_string_lossy().into_owned())
                .unwrap_or_else(|| path.display().to_string()),
            ScriptSource::Demo(name) => format!("{name}.lua"),
        }
    }

    pub fn read(&self) -> std::io::Result<String> {
        match self {
            ScriptSource::File(path) => fs::read_to_string(path),
            ScriptSource::Demo(name) => demos::get(name)
                .map(|demo| demo.source.to_string())
                .ok_or_else(|| {
                    std::io::Error::new(
                        std::io::ErrorKind::NotFound,
                        format!("no bundled demo named '{name}'"),
                    )
                }),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageLevel {
    Info,
    Error,
}

/// A line in the on-screen message log
#[derive(Debug, Clone)]
pub struct Message {
    pub text: String,
    pub level: MessageLevel,
    pub timestamp: chrono::DateTime<chrono::Local>,
}

pub struct App {
    pub manager: SessionManager,
    pub canvas: Rc<RefCell<Canvas>>,
    pub textures: Rc<GlyphTextures>,
    pub source: ScriptSource,
    pub messages: VecDeque<Message>,
    pub should_quit: bool,
    diagnostics: DiagnosticLog,
    /// Inner area the canvas was last rendered into
    canvas_area: Rect,
    pointer: PointerState,
}

impl App {
    pub fn new(config: &LuapadConfig, source: ScriptSource) -> Self {
        let canvas = Canvas::new(
            config.surface.width,
            config.surface.height,
            config.surface.background_color(),
        )
        .shared();
        let surface: SharedSurface = canvas.clone();
        let textures = Rc::new(GlyphTextures::from_config(&config.textures));
        let diagnostics = DiagnosticLog::new();

        let manager = SessionManager::new(
            config.runtime.clone(),
            surface,
            textures.clone(),
            Box::new(diagnostics.clone()),
        );

        Self {
            manager,
            canvas,
            textures,
            source,
            messages: VecDeque::new(),
            should_quit: false,
            diagnostics,
            canvas_area: Rect::default(),
            pointer: PointerState::default(),
        }
    }

    /// Re-read the source and replace the running session
    pub fn run_source(&mut self, now: Instant) {
        let text = match self.source.read() {
            Ok(text) => text,
            Err(e) => {
                warn!("Failed to read {:?}: {}", self.source, e);
                self.push_message(MessageLevel::Error, format!("cannot read script: {e}"));
                return;
            }
        };

        let chunk = self.source.chunk_name();
        if self.manager.run_source(&text, &chunk, now).is_ok() {
            self.push_message(MessageLevel::Info, format!("running {chunk}"));
        }
        self.drain_diagnostics();
    }

    pub fn stop(&mut self) {
        self.manager.stop_session();
        self.push_message(MessageLevel::Info, "stopped".to_string());
    }

    /// Switch to the next bundled demo and run it
    pub fn next_demo(&mut self, now: Instant) {
        let current = match &self.source {
            ScriptSource::Demo(name) => *name,
            ScriptSource::File(_) => "",
        };
        self.source = ScriptSource::Demo(demos::next_after(current).name);
        info!("Switching to {:?}", self.source);
        self.run_source(now);
    }

    pub fn tick(&mut self, now: Instant) {
        self.manager.tick(now);
        self.drain_diagnostics();
    }

    pub fn fire_timers(&mut self, now: Instant) {
        self.manager.fire_timers(now);
        self.drain_diagnostics();
    }

    pub fn next_deadline(&self) -> Option<Instant> {
        self.manager.next_deadline()
    }

    pub fn sprites(&self) -> Vec<Sprite> {
        self.manager.sprites()
    }

    pub fn handle_event(&mut self, event: TuiEvent, now: Instant) {
        match event {
            TuiEvent::Key(key) => self.handle_key(key, now),
            TuiEvent::Mouse(mouse) => self.handle_mouse(mouse),
            TuiEvent::Resize(_, _) => {
                // The new canvas area is picked up on the next render
            }
            TuiEvent::Quit => {
                info!("Received Ctrl+C signal, shutting down...");
                self.should_quit = true;
            }
        }
    }

    fn handle_key(&mut self, key: KeyEvent, now: Instant) {
        match key.code {
            KeyCode::Char('r') => self.run_source(now),
            KeyCode::Char('s') => self.stop(),
            KeyCode::Char('n') => self.next_demo(now),
            KeyCode::Char('q') | KeyCode::Esc => self.should_quit = true,
            _ => {}
        }
    }

    fn handle_mouse(&mut self, mouse: MouseEvent) {
        let pressed = match mouse.kind {
            MouseEventKind::Down(MouseButton::Left) | MouseEventKind::Drag(MouseButton::Left) => {
                true
            }
            MouseEventKind::Up(MouseButton::Left) => false,
            MouseEventKind::Moved => self.pointer.pressed,
            _ => return,
        };

        let Some((x, y)) = self.surface_point(mouse.column, mouse.row) else {
            return;
        };
        self.pointer = PointerState::new(x, y, pressed);
        self.manager.set_pointer(self.pointer);
    }

    /// Map a terminal cell to surface coordinates (origin top-left)
    pub fn surface_point(&self, column: u16, row: u16) -> Option<(f64, f64)> {
        let area = self.canvas_area;
        if area.width == 0
            || area.height == 0
            || column < area.x
            || row < area.y
            || column >= area.x + area.width
            || row >= area.y + area.height
        {
            return None;
        }

        let (width, height) = self.canvas.borrow().size();
        let x = (f64::from(column - area.x) + 0.5) / f64::from(area.width) * width;
        let y = (f64::from(row - area.y) + 0.5) / f64::from(area.height) * height;
        Some((x, y))
    }

    /// Record where the canvas is drawn; the surface tracks its braille resolution
    pub fn set_canvas_area(&mut self, area: Rect) {
        if area == self.canvas_area {
            return;
        }
        self.canvas_area = area;
        if area.width > 0 && area.height > 0 {
            self.manager
                .resize(f64::from(area.width) * 2.0, f64::from(area.height) * 4.0);
        }
    }

    pub fn push_message(&mut self, level: MessageLevel, text: String) {
        if self.messages.len() >= MAX_MESSAGES {
            self.messages.pop_front();
        }
        self.messages.push_back(Message {
            text,
            level,
            timestamp: chrono::Local::now(),
        });
    }

    fn drain_diagnostics(&mut self) {
        for diagnostic in self.diagnostics.take() {
            TracingSink.report(&diagnostic);
            self.push_message(MessageLevel::Error, diagnostic.to_string());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossterm::event::{KeyModifiers, MouseEvent};

    fn app() -> App {
        App::new(&LuapadConfig::default(), ScriptSource::Demo("bounce"))
    }

    #[test]
    fn test_demo_source_runs() {
        let mut app = app();
        app.run_source(Instant::now());
        assert!(app.manager.current_id().is_some());
        assert_eq!(app.messages.back().unwrap().level, MessageLevel::Info);
    }

    #[test]
    fn test_compile_errors_become_messages() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.lua");
        fs::write(&path, "drawRect(").unwrap();

        let mut app = App::new(&LuapadConfig::default(), ScriptSource::File(path));
        app.run_source(Instant::now());

        let last = app.messages.back().unwrap();
        assert_eq!(last.level, MessageLevel::Error);
        assert!(last.text.contains("compile error"), "{}", last.text);
    }

    #[test]
    fn test_next_demo_cycles() {
        let mut app = app();
        app.next_demo(Instant::now());
        assert_eq!(app.source, ScriptSource::Demo("clock"));
    }

    #[test]
    fn test_mouse_maps_into_surface() {
        let mut app = app();
        app.set_canvas_area(Rect::new(10, 5, 40, 20));
        assert_eq!(app.canvas.borrow().size(), (80.0, 80.0));

        app.handle_mouse(MouseEvent {
            kind: MouseEventKind::Down(MouseButton::Left),
            column: 10,
            row: 5,
            modifiers: KeyModifiers::NONE,
        });
        assert_eq!(app.pointer, PointerState::new(1.0, 2.0, true));

        assert_eq!(app.surface_point(0, 0), None);
    }

    #[test]
    fn test_quit_key() {
        let mut app = app();
        app.handle_event(
            TuiEvent::Key(KeyEvent::new(KeyCode::Char('q'), KeyModifiers::NONE)),
            Instant::now(),
        );
        assert!(app.should_quit);
    }
}
