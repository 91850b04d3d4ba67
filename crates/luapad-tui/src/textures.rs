//! Glyph textures for sprites drawn in the terminal

use std::collections::BTreeMap;

use luapad_core::config::surface_config::texture_table;
use luapad_core::config::TextureConfig;
use luapad_core::{TextureId, TextureInfo, TextureRegistry, TextureTable};

/// Glyph used for sprites without a texture
pub const DEFAULT_GLYPH: char = '•';

/// Texture registry built from `[textures]` in the config, plus the glyph of each texture
#[derive(Debug, Clone, Default)]
pub struct GlyphTextures {
    table: TextureTable,
    glyphs: Vec<char>,
}

impl GlyphTextures {
    pub fn from_config(textures: &BTreeMap<String, TextureConfig>) -> Self {
        Self {
            table: texture_table(textures),
            // Texture ids follow the map's order
            glyphs: textures.values().map(|texture| texture.glyph).collect(),
        }
    }

    pub fn glyph(&self, texture: Option<TextureId>) -> char {
        texture
            .and_then(|id| self.glyphs.get(id.0 as usize).copied())
            .unwrap_or(DEFAULT_GLYPH)
    }

    pub fn len(&self) -> usize {
        self.table.len()
    }

    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }
}

impl TextureRegistry for GlyphTextures {
    fn resolve(&self, path: &str) -> Option<TextureInfo> {
        self.table.resolve(path)
    }
}
