/// Sampled textures from decoded images

use std::sync::Arc;
use crate::device::{GraphicsDevice, Texture, TextureDesc, TextureFormat};
use crate::error::{Error, Result};
use crate::engine_debug;

/// Decoded image as handed over by the image decoder
///
/// Pixels are tightly packed RGBA8, row-major, top row first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageData {
    pub width: u32,
    pub height: u32,
    pub pixels: Vec<u8>,
}

impl ImageData {
    /// Wrap decoded pixels, checking their length against the size
    pub fn new(width: u32, height: u32, pixels: Vec<u8>) -> Result<Self> {
        let image = Self { width, height, pixels };
        image.validate()?;
        Ok(image)
    }

    /// Single-colour image, handy as a placeholder texture
    pub fn solid(width: u32, height: u32, rgba: [u8; 4]) -> Self {
        let pixels = rgba.repeat(width as usize * height as usize);
        Self { width, height, pixels }
    }

    fn validate(&self) -> Result<()> {
        let expected = self.width as u64 * self.height as u64 * TextureFormat::R8G8B8A8_UNORM.bytes_per_pixel() as u64;
        if self.width == 0 || self.height == 0 {
            return Err(Error::InvalidResource(format!(
                "image size {}x{} is empty",
                self.width, self.height
            )));
        }
        if self.pixels.len() as u64 != expected {
            return Err(Error::InvalidResource(format!(
                "{}x{} RGBA8 image needs {} bytes, got {}",
                self.width,
                self.height,
                expected,
                self.pixels.len()
            )));
        }
        Ok(())
    }
}

/// Create a sampled RGBA8 texture from a decoded image
pub fn create_texture(device: &dyn GraphicsDevice, label: &str, image: &ImageData) -> Result<Arc<dyn Texture>> {
    image.validate()?;
    let texture = device.create_texture(&TextureDesc {
        label,
        width: image.width,
        height: image.height,
        format: TextureFormat::R8G8B8A8_UNORM,
        data: &image.pixels,
    })?;
    engine_debug!("wiz3d::Texture", "Created '{}' ({}x{})", label, image.width, image.height);
    Ok(texture)
}
