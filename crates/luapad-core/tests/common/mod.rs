// Shared harness for driving real scripts through a SessionManager

#![allow(dead_code)]

use std::cell::RefCell;
use std::rc::Rc;
use std::time::{Duration, Instant};

use luapad_core::{
    Canvas, Color, DiagnosticLog, DrawCmd, RuntimeConfig, SessionManager, SharedSurface,
    TextureId, TextureInfo, TextureTable,
};

pub const WIDTH: f64 = 320.0;
pub const HEIGHT: f64 = 180.0;

pub struct Harness {
    pub manager: SessionManager,
    pub canvas: Rc<RefCell<Canvas>>,
    pub log: DiagnosticLog,
    base: Instant,
}

impl Harness {
    pub fn new() -> Self {
        Self::with_config(RuntimeConfig {
            seed: Some(1),
            ..RuntimeConfig::default()
        })
    }

    pub fn with_config(config: RuntimeConfig) -> Self {
        let canvas = Canvas::new(WIDTH, HEIGHT, Color::BLACK).shared();
        let surface: SharedSurface = canvas.clone();

        let mut textures = TextureTable::new();
        textures.insert(
            "ship.png",
            TextureInfo {
                id: TextureId(0),
                width: 8.0,
                height: 8.0,
            },
        );

        let log = DiagnosticLog::new();
        let manager =
            SessionManager::new(config, surface, Rc::new(textures), Box::new(log.clone()));

        Self {
            manager,
            canvas,
            log,
            base: Instant::now(),
        }
    }

    /// Scheduled time `ms` milliseconds after the harness was created
    pub fn at(&self, ms: u64) -> Instant {
        self.base + Duration::from_millis(ms)
    }

    /// Start `source` and give it its first resume at t = 0
    pub fn run(&mut self, source: &str) {
        let now = self.at(0);
        self.manager
            .run_source(source, "test.lua", now)
            .expect("script should compile");
    }

    pub fn tick(&mut self, ms: u64) -> bool {
        let now = self.at(ms);
        self.manager.tick(now)
    }

    /// Tick `count` frames, 16ms apart, starting after `from_ms`
    pub fn tick_frames(&mut self, from_ms: u64, count: u64) {
        for frame in 1..=count {
            self.tick(from_ms + frame * 16);
        }
    }

    pub fn commands(&self) -> Vec<DrawCmd> {
        self.canvas.borrow().commands().cloned().collect()
    }

    pub fn draw_count(&self) -> usize {
        self.canvas.borrow().command_count()
    }
}
