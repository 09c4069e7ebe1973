use std::{collections::HashMap, path::Path, sync::Arc};

use crate::{HanabiError, Result};

/// Sprite applied to every rendered point.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Sprite {
    /// Soft glow texture decoded from an image file.
    Glow(GlowTexture),
    /// Flat-colored points, used when no usable texture is available.
    Flat,
}

/// Decoded glow texture as tightly packed RGBA8 pixels.
#[derive(Clone, PartialEq, Eq)]
pub struct GlowTexture {
    pub name: String,
    pub width: u32,
    pub height: u32,
    pub rgba: Arc<[u8]>,
}

impl GlowTexture {
    /// Decodes the whole image. Truncated or corrupt files are rejected.
    pub fn parse(name: impl Into<String>, bytes: &[u8]) -> Result<Self> {
        let name = name.into();
        let image = image::load_from_memory(bytes)?.into_rgba8();
        let (width, height) = image.dimensions();

        Ok(Self {
            name,
            width,
            height,
            rgba: image.into_raw().into(),
        })
    }
}

impl std::fmt::Debug for GlowTexture {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GlowTexture")
            .field("name", &self.name)
            .field("width", &self.width)
            .field("height", &self.height)
            .field("bytes", &self.rgba.len())
            .finish()
    }
}

/// Registry for textures referenced by the renderer.
#[derive(Debug, Default)]
pub struct AssetStore {
    textures: HashMap<String, GlowTexture>,
}

impl AssetStore {
    pub fn new() -> Self {
        Self {
            textures: HashMap::new(),
        }
    }

    pub fn register_texture(&mut self, texture: GlowTexture) {
        self.textures.insert(texture.name.clone(), texture);
    }

    /// Reads and registers a texture file under its path.
    pub fn load_texture(&mut self, path: impl AsRef<Path>) -> Result<&GlowTexture> {
        let path = path.as_ref();
        let name = path.display().to_string();
        let bytes = std::fs::read(path)?;
        let texture = GlowTexture::parse(name.clone(), &bytes)?;
        self.register_texture(texture);
        self.texture(&name)
            .ok_or_else(|| HanabiError::msg(format!("texture `{name}` vanished after load")))
    }

    pub fn texture(&self, name: &str) -> Option<&GlowTexture> {
        self.textures.get(name)
    }

    /// Resolves the sprite for points. Missing or malformed textures degrade
    /// to [`Sprite::Flat`].
    pub fn resolve_sprite(&mut self, path: Option<&str>) -> Sprite {
        let Some(path) = path else {
            return Sprite::Flat;
        };

        if let Some(texture) = self.texture(path) {
            return Sprite::Glow(texture.clone());
        }

        match self.load_texture(path) {
            Ok(texture) => {
                tracing::debug!(
                    texture = %texture.name,
                    width = texture.width,
                    height = texture.height,
                    "glow texture loaded"
                );
                Sprite::Glow(texture.clone())
            }
            Err(err) => {
                tracing::warn!(path, %err, "glow texture unavailable, using flat points");
                Sprite::Flat
            }
        }
    }
}
