//! Render surface interface and the retained canvas the hosts draw from
//!
//! Bindings never rasterise anything themselves. They push [`DrawCmd`]s into a
//! [`RenderSurface`]; the host presents whatever the surface holds after each tick.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;

/// Oldest commands are dropped past this point when a script never calls `clear()`
pub const MAX_RETAINED_COMMANDS: usize = 65_536;

/// Packed 0xRRGGBB color with a separate alpha channel
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Color {
    pub rgb: u32,
    pub alpha: f64,
}

impl Color {
    pub const BLACK: Color = Color {
        rgb: 0x000000,
        alpha: 1.0,
    };
    pub const WHITE: Color = Color {
        rgb: 0xffffff,
        alpha: 1.0,
    };

    /// Opaque color from a packed integer; bits above 24 are discarded
    pub fn from_packed(rgb: u32) -> Self {
        Self {
            rgb: rgb & 0x00ff_ffff,
            alpha: 1.0,
        }
    }

    /// Color from channel values in [0, 1]. Alpha defaults to 1.0.
    pub fn from_channels(r: f64, g: f64, b: f64, a: Option<f64>) -> Self {
        let rgb = (channel_byte(r) << 16) | (channel_byte(g) << 8) | channel_byte(b);
        Self {
            rgb,
            alpha: a.unwrap_or(1.0).clamp(0.0, 1.0),
        }
    }

    pub fn red(self) -> u8 {
        ((self.rgb >> 16) & 0xff) as u8
    }

    pub fn green(self) -> u8 {
        ((self.rgb >> 8) & 0xff) as u8
    }

    pub fn blue(self) -> u8 {
        (self.rgb & 0xff) as u8
    }
}

fn channel_byte(value: f64) -> u32 {
    (value.clamp(0.0, 1.0) * 255.0).round() as u32
}

/// Whether a closed shape is filled or only stroked
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fill {
    Solid,
    Outline,
}

impl Fill {
    /// Guest-side outline flag: any non-zero value means outline
    pub fn from_outline_flag(flag: f64) -> Self {
        if flag != 0.0 {
            Fill::Outline
        } else {
            Fill::Solid
        }
    }
}

/// Most vertices a polygon circle may request
pub const MAX_CIRCLE_SEGMENTS: u32 = 360;

/// One immediate-mode draw primitive in surface coordinates (origin top-left)
#[derive(Debug, Clone, PartialEq)]
pub enum DrawCmd {
    Circle {
        x: f64,
        y: f64,
        radius: f64,
        /// Polygon vertex hint, at most [`MAX_CIRCLE_SEGMENTS`]; 0 means as smooth as the surface can draw
        segments: u32,
        color: Color,
        fill: Fill,
    },
    Rect {
        x: f64,
        y: f64,
        width: f64,
        height: f64,
        color: Color,
        fill: Fill,
    },
    Line {
        x1: f64,
        y1: f64,
        x2: f64,
        y2: f64,
        color: Color,
        thickness: f64,
    },
}

/// The single on-screen debug text node written by `printAt`
#[derive(Debug, Clone, PartialEq)]
pub struct DebugText {
    pub x: f64,
    pub y: f64,
    pub text: String,
}

/// Drawing surface consumed by the native bindings
pub trait RenderSurface {
    fn draw(&mut self, cmd: DrawCmd);

    /// Drop every retained primitive. The debug text node is kept.
    fn clear(&mut self);

    fn set_background(&mut self, color: Color);

    /// Insert or replace the debug text node
    fn set_debug_text(&mut self, text: DebugText);

    /// Logical (width, height)
    fn size(&self) -> (f64, f64);

    fn resize(&mut self, width: f64, height: f64);

    /// Blank the surface before a new session starts
    fn reset(&mut self) {
        self.clear();
    }
}

/// Surface handle shared between the host and the bindings of the live session
pub type SharedSurface = Rc<RefCell<dyn RenderSurface>>;

/// Retained command buffer. Commands persist until `clear()`.
#[derive(Debug, Clone)]
pub struct Canvas {
    commands: VecDeque<DrawCmd>,
    background: Color,
    debug_text: Option<DebugText>,
    width: f64,
    height: f64,
}

impl Canvas {
    pub fn new(width: f64, height: f64, background: Color) -> Self {
        Self {
            commands: VecDeque::new(),
            background,
            debug_text: None,
            width,
            height,
        }
    }

    /// Wrap the canvas so it can be handed to a session manager and still read by the host
    pub fn shared(self) -> Rc<RefCell<Canvas>> {
        Rc::new(RefCell::new(self))
    }

    pub fn commands(&self) -> impl Iterator<Item = &DrawCmd> {
        self.commands.iter()
    }

    pub fn command_count(&self) -> usize {
        self.commands.len()
    }

    pub fn background(&self) -> Color {
        self.background
    }

    pub fn debug_text(&self) -> Option<&DebugText> {
        self.debug_text.as_ref()
    }
}

impl RenderSurface for Canvas {
    fn draw(&mut self, cmd: DrawCmd) {
        if self.commands.len() >= MAX_RETAINED_COMMANDS {
            self.commands.pop_front();
        }
        self.commands.push_back(cmd);
    }

    fn clear(&mut self) {
        self.commands.clear();
    }

    fn set_background(&mut self, color: Color) {
        self.background = color;
    }

    fn set_debug_text(&mut self, text: DebugText) {
        self.debug_text = Some(text);
    }

    fn size(&self) -> (f64, f64) {
        (self.width, self.height)
    }

    fn resize(&mut self, width: f64, height: f64) {
        self.width = width.max(0.0);
        self.height = height.max(0.0);
    }

    fn reset(&mut self) {
        self.commands.clear();
        self.debug_text = None;
    }
}
