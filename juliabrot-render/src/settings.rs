use juliabrot_core::{FractalParams, FractalVariant, Viewport};

use crate::color::{color_for, ColorScheme, Rgb};

/// Everything needed to render one image, captured once per request.
///
/// Fields are private and there are no mutators: a render works from the
/// snapshot it was started with, and later changes only affect the next one.
/// The value is `Copy`, so a render thread receives its own copy.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RenderSettings {
    viewport: Viewport,
    variant: FractalVariant,
    params: FractalParams,
    scheme: ColorScheme,
}

impl RenderSettings {
    /// Bundle already-validated parts. [`Viewport::new`] and
    /// [`FractalParams::new`] are where the checks happen.
    pub fn new(
        viewport: Viewport,
        variant: FractalVariant,
        params: FractalParams,
        scheme: ColorScheme,
    ) -> Self {
        Self {
            viewport,
            variant,
            params,
            scheme,
        }
    }

    pub fn viewport(&self) -> &Viewport {
        &self.viewport
    }

    pub fn variant(&self) -> FractalVariant {
        self.variant
    }

    pub fn params(&self) -> &FractalParams {
        &self.params
    }

    pub fn scheme(&self) -> &ColorScheme {
        &self.scheme
    }

    pub fn max_iterations(&self) -> u32 {
        self.params.max_iterations
    }

    pub fn width(&self) -> u32 {
        self.viewport.width
    }

    pub fn height(&self) -> u32 {
        self.viewport.height
    }

    pub fn total_pixels(&self) -> usize {
        self.viewport.pixel_count()
    }

    /// Escape-time count for the pixel at linear index `y * width + x`.
    #[inline]
    pub fn iterations_at(&self, index: usize) -> u32 {
        let width = self.viewport.width as usize;
        let x = (index % width) as u32;
        let y = (index / width) as u32;
        let point = self.viewport.pixel_to_complex(x, y);
        self.variant.evaluate(point, &self.params)
    }

    /// Final color of the pixel at linear index `y * width + x`:
    /// map, iterate, then color.
    #[inline]
    pub fn color_at(&self, index: usize) -> Rgb {
        color_for(
            self.iterations_at(index),
            self.params.max_iterations,
            &self.scheme,
        )
    }

    /// The same view, fractal and colors at another output size.
    pub fn resized(&self, width: u32, height: u32) -> crate::Result<Self> {
        crate::buffer::checked_byte_len(width, height)?;
        Ok(Self {
            viewport: self.viewport.with_size(width, height)?,
            ..*self
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use juliabrot_core::Complex;

    fn small() -> RenderSettings {
        RenderSettings::new(
            Viewport::new(1.0, Complex::ZERO, 4, 4).unwrap(),
            FractalVariant::Mandelbrot,
            FractalParams::new(50).unwrap(),
            ColorScheme::Vibrant,
        )
    }

    #[test]
    fn centre_pixel_is_in_the_set_and_black() {
        let s = small();
        let index = 2 * 4 + 2;
        assert_eq!(s.iterations_at(index), 50);
        assert_eq!(s.color_at(index), Rgb::BLACK);
    }

    #[test]
    fn corner_pixel_escapes() {
        let s = small();
        // (0, 0) maps to -1 - 1i, which escapes quickly.
        assert!(s.iterations_at(0) < 50);
        assert_ne!(s.color_at(0), Rgb::BLACK);
    }

    #[test]
    fn resized_keeps_everything_but_size() {
        let s = small();
        let big = s.resized(640, 480).unwrap();
        assert_eq!(big.total_pixels(), 640 * 480);
        assert_eq!(big.viewport().zoom, s.viewport().zoom);
        assert_eq!(big.variant(), s.variant());
        assert_eq!(big.scheme(), s.scheme());
        assert!(s.resized(0, 480).is_err());
        assert!(s.resized(u32::MAX, u32::MAX).is_err());
    }
}
