/// Pointer (mouse or touch) state as last reported by the host
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct PointerState {
    pub x: f64,
    pub y: f64,
    pub pressed: bool,
}

impl PointerState {
    pub fn new(x: f64, y: f64, pressed: bool) -> Self {
        Self { x, y, pressed }
    }
}
