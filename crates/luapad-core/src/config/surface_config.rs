use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::sprites::{TextureId, TextureInfo, TextureTable};
use crate::surface::Color;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SurfaceConfig {
    /// Logical width used until the host reports a size (default: 320)
    #[serde(default = "default_width")]
    pub width: f64,

    #[serde(default = "default_height")]
    pub height: f64,

    /// Initial background as packed 0xRRGGBB (default: 0x1099bb)
    #[serde(default = "default_background")]
    pub background: u32,
}

fn default_width() -> f64 {
    320.0
}

fn default_height() -> f64 {
    180.0
}

fn default_background() -> u32 {
    0x1099bb
}

impl Default for SurfaceConfig {
    fn default() -> Self {
        Self {
            width: default_width(),
            height: default_height(),
            background: default_background(),
        }
    }
}

impl SurfaceConfig {
    pub fn background_color(&self) -> Color {
        Color::from_packed(self.background)
    }
}

/// A preloaded texture, keyed by the path scripts pass to `loadImage`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextureConfig {
    /// Character the terminal host draws for sprites using this texture
    #[serde(default = "default_glyph")]
    pub glyph: char,

    #[serde(default = "default_texture_size")]
    pub width: f64,

    #[serde(default = "default_texture_size")]
    pub height: f64,
}

fn default_glyph() -> char {
    '*'
}

fn default_texture_size() -> f64 {
    8.0
}

/// Build the registry `loadImage` resolves against. Ids follow path order.
pub fn texture_table(textures: &BTreeMap<String, TextureConfig>) -> TextureTable {
    let mut table = TextureTable::new();
    for (index, (path, texture)) in textures.iter().enumerate() {
        table.insert(
            path.clone(),
            TextureInfo {
                id: TextureId(index as u32),
                width: texture.width,
                height: texture.height,
            },
        );
    }
    table
}
