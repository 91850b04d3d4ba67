//! Host-owned sprites and textures, addressed from Lua by integer handles
//!
//! Handles index into per-session arenas. A handle that outlives its session, or
//! was never issued, resolves to nothing instead of to a stale host object.

use std::collections::HashMap;

use crate::surface::Color;

/// Identifier assigned by the texture collaborator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TextureId(pub u32);

/// A preloaded texture as reported by the collaborator
#[derive(Debug, Clone, PartialEq)]
pub struct TextureInfo {
    pub id: TextureId,
    pub width: f64,
    pub height: f64,
}

/// Resolves preloaded textures by path. Loading assets is the host's job.
pub trait TextureRegistry {
    fn resolve(&self, path: &str) -> Option<TextureInfo>;
}

/// Path-keyed texture table
#[derive(Debug, Clone, Default)]
pub struct TextureTable {
    entries: HashMap<String, TextureInfo>,
}

impl TextureTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, path: impl Into<String>, info: TextureInfo) {
        self.entries.insert(path.into(), info);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl TextureRegistry for TextureTable {
    fn resolve(&self, path: &str) -> Option<TextureInfo> {
        self.entries.get(path).cloned()
    }
}

/// Guest-visible handle for a loaded texture (1-based)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TextureHandle(pub u32);

/// Guest-visible handle for a sprite (1-based)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SpriteHandle(pub u32);

/// Textures resolved by `loadImage` during one session
#[derive(Debug, Default)]
pub struct TextureHandles {
    loaded: Vec<TextureInfo>,
}

impl TextureHandles {
    /// Resolve `path` and hand out a handle, reusing the handle of an earlier load
    pub fn load(&mut self, registry: &dyn TextureRegistry, path: &str) -> Option<TextureHandle> {
        let info = registry.resolve(path)?;
        let index = match self.loaded.iter().position(|loaded| loaded.id == info.id) {
            Some(index) => index,
            None => {
                self.loaded.push(info);
                self.loaded.len() - 1
            }
        };
        Some(TextureHandle(index as u32 + 1))
    }

    pub fn get(&self, handle: TextureHandle) -> Option<&TextureInfo> {
        let index = (handle.0 as usize).checked_sub(1)?;
        self.loaded.get(index)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Sprite {
    pub texture: Option<TextureInfo>,
    pub x: f64,
    pub y: f64,
    /// Velocity in surface units per update step
    pub vx: f64,
    pub vy: f64,
    pub tint: Color,
}

impl Sprite {
    fn new() -> Self {
        Self {
            texture: None,
            x: 0.0,
            y: 0.0,
            vx: 0.0,
            vy: 0.0,
            tint: Color::WHITE,
        }
    }

    /// Footprint used for edge bouncing; zero until a texture is bound
    pub fn size(&self) -> (f64, f64) {
        self.texture
            .as_ref()
            .map(|texture| (texture.width, texture.height))
            .unwrap_or((0.0, 0.0))
    }
}

/// Every sprite created by the running session, in creation order
#[derive(Debug, Default)]
pub struct SpriteArena {
    sprites: Vec<Sprite>,
}

impl SpriteArena {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn create(&mut self) -> SpriteHandle {
        self.sprites.push(Sprite::new());
        SpriteHandle(self.sprites.len() as u32)
    }

    pub fn get(&self, handle: SpriteHandle) -> Option<&Sprite> {
        let index = (handle.0 as usize).checked_sub(1)?;
        self.sprites.get(index)
    }

    pub fn get_mut(&mut self, handle: SpriteHandle) -> Option<&mut Sprite> {
        let index = (handle.0 as usize).checked_sub(1)?;
        self.sprites.get_mut(index)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Sprite> {
        self.sprites.iter()
    }

    pub fn len(&self) -> usize {
        self.sprites.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sprites.is_empty()
    }

    /// Move every sprite by `velocity * step` and reflect it off the surface edges
    pub fn update(&mut self, step: f64, bounds: (f64, f64)) {
        let (width, height) = bounds;
        for sprite in &mut self.sprites {
            let (w, h) = sprite.size();
            sprite.x += sprite.vx * step;
            sprite.y += sprite.vy * step;
            bounce(&mut sprite.x, &mut sprite.vx, w, width);
            bounce(&mut sprite.y, &mut sprite.vy, h, height);
        }
    }
}

fn bounce(position: &mut f64, velocity: &mut f64, extent: f64, limit: f64) {
    if *position < 0.0 {
        *position = 0.0;
        *velocity = velocity.abs();
    } else if *position + extent > limit {
        *position = (limit - extent).max(0.0);
        *velocity = -velocity.abs();
    }
}
