use crate::color::Rgb;
use crate::error::RenderError;

/// Largest image the renderer will allocate: 2²⁸ pixels (16384 × 16384),
/// which is 1 GiB of RGBA.
pub const MAX_PIXELS: usize = 1 << 28;

/// Check that a `width` × `height` RGBA image is non-empty and within
/// [`MAX_PIXELS`], returning its size in bytes.
pub fn checked_byte_len(width: u32, height: u32) -> crate::Result<usize> {
    let invalid = || RenderError::InvalidDimensions { width, height };
    if width == 0 || height == 0 {
        return Err(invalid());
    }
    let pixels = (width as usize)
        .checked_mul(height as usize)
        .filter(|&p| p <= MAX_PIXELS)
        .ok_or_else(invalid)?;
    pixels
        .checked_mul(RenderBuffer::BYTES_PER_PIXEL)
        .ok_or_else(invalid)
}

/// An RGBA pixel buffer representing a rendered image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderBuffer {
    pub width: u32,
    pub height: u32,
    /// RGBA pixel data, 4 bytes per pixel, row-major order.
    pub pixels: Vec<u8>,
}

impl RenderBuffer {
    pub const BYTES_PER_PIXEL: usize = 4;

    /// Create a new buffer filled with black (opaque).
    ///
    /// Fails for empty images and anything over [`MAX_PIXELS`].
    pub fn new(width: u32, height: u32) -> crate::Result<Self> {
        let mut pixels = vec![0u8; checked_byte_len(width, height)?];
        for chunk in pixels.chunks_exact_mut(Self::BYTES_PER_PIXEL) {
            chunk[3] = 255;
        }
        Ok(Self {
            width,
            height,
            pixels,
        })
    }

    pub fn pixel_count(&self) -> usize {
        self.width as usize * self.height as usize
    }

    /// Write the pixel at linear index `y * width + x`.
    #[inline]
    pub fn set_linear(&mut self, index: usize, color: Rgb) {
        let start = index * Self::BYTES_PER_PIXEL;
        self.pixels[start..start + Self::BYTES_PER_PIXEL].copy_from_slice(&color.to_rgba());
    }

    /// The RGBA bytes of pixels `[start, end)` in linear order.
    pub fn span_mut(&mut self, start: usize, end: usize) -> &mut [u8] {
        &mut self.pixels[start * Self::BYTES_PER_PIXEL..end * Self::BYTES_PER_PIXEL]
    }

    /// Read back the color at `(x, y)`; alpha is always opaque.
    pub fn get(&self, x: u32, y: u32) -> Rgb {
        let start = (y as usize * self.width as usize + x as usize) * Self::BYTES_PER_PIXEL;
        Rgb::new(
            self.pixels[start],
            self.pixels[start + 1],
            self.pixels[start + 2],
        )
    }

    /// Consume the buffer, yielding its raw RGBA bytes.
    pub fn into_raw(self) -> Vec<u8> {
        self.pixels
    }
}
