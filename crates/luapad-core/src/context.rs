use std::cell::RefCell;
use std::rc::Rc;
use std::time::Instant;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::debug;

use crate::clock::FrameClock;
use crate::config::RuntimeConfig;
use crate::input::PointerState;
use crate::sprites::{
    Sprite, SpriteArena, SpriteHandle, TextureHandle, TextureHandles, TextureRegistry,
};
use crate::surface::{Color, DebugText, DrawCmd, SharedSurface};

/// Context shared by the native bindings of one session
pub type SharedContext = Rc<RefCell<HostContext>>;

/// Everything a binding may touch while a session runs.
///
/// Built when a session starts and dropped with it, so sprites, loaded textures
/// and frame timing never leak from one run into the next.
pub struct HostContext {
    /// Surface the session draws into
    surface: SharedSurface,
    /// Collaborator resolving `loadImage` paths
    textures: Rc<dyn TextureRegistry>,
    loaded_textures: TextureHandles,
    sprites: SpriteArena,
    sprite_step: f64,
    clock: FrameClock,
    pointer: PointerState,
    rng: StdRng,
    /// Set by the guest `stop()` binding
    stop_requested: bool,
}

impl HostContext {
    pub fn new(
        surface: SharedSurface,
        textures: Rc<dyn TextureRegistry>,
        config: &RuntimeConfig,
        pointer: PointerState,
        now: Instant,
    ) -> Self {
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        let mut clock = FrameClock::new(config.fps_window());
        clock.reset(now);

        Self {
            surface,
            textures,
            loaded_textures: TextureHandles::default(),
            sprites: SpriteArena::new(),
            sprite_step: config.sprite_step,
            clock,
            pointer,
            rng,
            stop_requested: false,
        }
    }

    pub fn shared(self) -> SharedContext {
        Rc::new(RefCell::new(self))
    }

    // ===== Surface =====

    pub fn draw(&mut self, cmd: DrawCmd) {
        self.surface.borrow_mut().draw(cmd);
    }

    pub fn clear(&mut self) {
        self.surface.borrow_mut().clear();
    }

    pub fn set_background(&mut self, color: Color) {
        self.surface.borrow_mut().set_background(color);
    }

    pub fn print_at(&mut self, x: f64, y: f64, text: String) {
        self.surface
            .borrow_mut()
            .set_debug_text(DebugText { x, y, text });
    }

    pub fn surface_size(&self) -> (f64, f64) {
        self.surface.borrow().size()
    }

    // ===== Textures and sprites =====

    pub fn load_texture(&mut self, path: &str) -> Option<TextureHandle> {
        self.loaded_textures.load(self.textures.as_ref(), path)
    }

    pub fn create_sprite(&mut self) -> SpriteHandle {
        let handle = self.sprites.create();
        debug!(target: "scripting", "Created sprite {:?}", handle);
        handle
    }

    /// Bind a loaded texture to a sprite; unknown handles are ignored
    pub fn set_sprite_texture(&mut self, sprite: SpriteHandle, texture: TextureHandle) {
        let info = self.loaded_textures.get(texture).cloned();
        match (self.sprites.get_mut(sprite), info) {
            (Some(sprite), Some(info)) => sprite.texture = Some(info),
            _ => debug!(target: "scripting", "Ignoring texture {:?} for sprite {:?}", texture, sprite),
        }
    }

    pub fn sprite_mut(&mut self, handle: SpriteHandle) -> Option<&mut Sprite> {
        self.sprites.get_mut(handle)
    }

    pub fn update_sprites(&mut self) {
        let bounds = self.surface_size();
        self.sprites.update(self.sprite_step, bounds);
    }

    pub fn sprites(&self) -> &SpriteArena {
        &self.sprites
    }

    // ===== Queries =====

    pub fn clock(&self) -> &FrameClock {
        &self.clock
    }

    pub fn clock_mut(&mut self) -> &mut FrameClock {
        &mut self.clock
    }

    pub fn pointer(&self) -> PointerState {
        self.pointer
    }

    pub fn set_pointer(&mut self, pointer: PointerState) {
        self.pointer = pointer;
    }

    /// `floor(random() * max)`
    pub fn random(&mut self, max: f64) -> f64 {
        (self.rng.gen::<f64>() * max).floor()
    }

    // ===== Control =====

    pub fn request_stop(&mut self) {
        self.stop_requested = true;
    }

    pub fn stop_requested(&self) -> bool {
        self.stop_requested
    }
}
