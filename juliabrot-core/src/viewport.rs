use tracing::debug;

use crate::complex::Complex;
use crate::error::CoreError;

/// Map a pixel coordinate to a point on the complex plane.
///
/// The horizontal and vertical axes are scaled independently, so a
/// non-square canvas stretches the plane rather than cropping it.
/// `zoom`, `width` and `height` must be positive; [`Viewport::new`] is the
/// checked entry point.
#[inline]
pub fn map_pixel(
    x: f64,
    y: f64,
    width: f64,
    height: f64,
    zoom: f64,
    offset_re: f64,
    offset_im: f64,
) -> Complex {
    Complex::new(
        (x - width / 2.0) / (0.5 * zoom * width) + offset_re,
        (y - height / 2.0) / (0.5 * zoom * height) + offset_im,
    )
}

/// The visible region of the complex plane and the canvas it is drawn on.
///
/// At `zoom = 1` the canvas spans `[-1, 1)` around `offset` on both axes;
/// the default `zoom = 0.5` doubles that so the whole Mandelbrot set fits.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    pub zoom: f64,

    /// Complex-plane point shown at the canvas centre.
    pub offset: Complex,

    /// Canvas width in pixels.
    pub width: u32,

    /// Canvas height in pixels.
    pub height: u32,
}

impl Viewport {
    /// Lower bound every zoom mutator clamps to.
    pub const MIN_ZOOM: f64 = 0.5;
    pub const DEFAULT_ZOOM: f64 = 0.5;

    /// Create a viewport with explicit parameters.
    pub fn new(zoom: f64, offset: Complex, width: u32, height: u32) -> crate::Result<Self> {
        if width == 0 || height == 0 {
            return Err(CoreError::InvalidViewport {
                reason: format!("dimensions must be > 0, got {width}×{height}"),
            });
        }
        if zoom <= 0.0 || !zoom.is_finite() {
            return Err(CoreError::InvalidViewport {
                reason: format!("zoom must be positive and finite, got {zoom}"),
            });
        }
        if !offset.re.is_finite() || !offset.im.is_finite() {
            return Err(CoreError::InvalidViewport {
                reason: format!("offset must be finite, got {offset}"),
            });
        }
        Ok(Self {
            zoom,
            offset,
            width,
            height,
        })
    }

    /// The reset view: default zoom, centred on the origin.
    pub fn default_view(width: u32, height: u32) -> crate::Result<Self> {
        Self::new(Self::DEFAULT_ZOOM, Complex::ZERO, width, height)
    }

    /// Map a pixel coordinate to its complex-plane point.
    #[inline]
    pub fn pixel_to_complex(&self, px: u32, py: u32) -> Complex {
        map_pixel(
            px as f64,
            py as f64,
            self.width as f64,
            self.height as f64,
            self.zoom,
            self.offset.re,
            self.offset.im,
        )
    }

    /// Total number of pixels on the canvas.
    pub fn pixel_count(&self) -> usize {
        self.width as usize * self.height as usize
    }

    /// Step the zoom additively (`+1`, `-10`, ...), clamped to [`MIN_ZOOM`](Self::MIN_ZOOM).
    pub fn zoom_by(&mut self, delta: f64) {
        self.zoom = Self::clamp_zoom(self.zoom + delta);
        debug!(zoom = self.zoom, "Zoom step");
    }

    /// Scale the zoom multiplicatively, clamped to [`MIN_ZOOM`](Self::MIN_ZOOM).
    pub fn scale_zoom(&mut self, factor: f64) {
        self.zoom = Self::clamp_zoom(self.zoom * factor);
    }

    /// Re-centre the view on the complex point under a canvas pixel.
    pub fn center_on(&mut self, px: f64, py: f64) {
        self.offset = map_pixel(
            px,
            py,
            self.width as f64,
            self.height as f64,
            self.zoom,
            self.offset.re,
            self.offset.im,
        );
        debug!(offset = %self.offset, "Centred on pixel");
    }

    /// Back to the default zoom and origin, keeping the canvas size.
    pub fn reset(&mut self) {
        self.zoom = Self::DEFAULT_ZOOM;
        self.offset = Complex::ZERO;
    }

    /// The same view drawn on a canvas of a different pixel size.
    pub fn with_size(&self, width: u32, height: u32) -> crate::Result<Self> {
        Self::new(self.zoom, self.offset, width, height)
    }

    /// Raise `zoom` to at least [`MIN_ZOOM`](Self::MIN_ZOOM). NaN becomes the minimum.
    pub fn clamp_zoom(zoom: f64) -> f64 {
        if zoom.is_nan() {
            return Self::MIN_ZOOM;
        }
        zoom.max(Self::MIN_ZOOM)
    }
}

/// Default slow-zoom speed; larger values zoom faster per frame.
pub const DEFAULT_ZOOM_SPEED: f64 = 50.0;

/// Per-frame multiplicative zoom factor of a slow zoom at `speed`.
///
/// Speed 50 gives 1.015, so each frame magnifies by 1.5 %.
pub fn slow_zoom_factor(speed: f64) -> f64 {
    1.0 + 0.01 * (1.0 + speed / 100.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPSILON: f64 = 1e-12;

    #[test]
    fn centre_pixel_maps_to_offset() {
        let vp = Viewport::new(1.0, Complex::new(-0.5, 0.25), 100, 80).unwrap();
        let c = vp.pixel_to_complex(50, 40);
        assert!((c.re - (-0.5)).abs() < EPSILON);
        assert!((c.im - 0.25).abs() < EPSILON);
    }

    #[test]
    fn corners_at_unit_zoom() {
        let vp = Viewport::new(1.0, Complex::ZERO, 100, 100).unwrap();

        let tl = vp.pixel_to_complex(0, 0);
        assert!((tl.re - (-1.0)).abs() < EPSILON);
        assert!((tl.im - (-1.0)).abs() < EPSILON);

        // y grows downward and so does the imaginary part.
        let br = vp.pixel_to_complex(99, 99);
        assert!((br.re - 0.98).abs() < EPSILON);
        assert!((br.im - 0.98).abs() < EPSILON);
    }

    #[test]
    fn axes_scale_independently() {
        let vp = Viewport::new(1.0, Complex::ZERO, 200, 100).unwrap();
        let right = vp.pixel_to_complex(199, 50);
        let bottom = vp.pixel_to_complex(100, 99);
        assert!((right.re - 0.99).abs() < EPSILON);
        assert!((bottom.im - 0.98).abs() < EPSILON);
    }

    #[test]
    fn free_function_matches_method() {
        let vp = Viewport::new(3.0, Complex::new(0.1, -0.2), 64, 48).unwrap();
        let a = vp.pixel_to_complex(7, 9);
        let b = map_pixel(7.0, 9.0, 64.0, 48.0, 3.0, 0.1, -0.2);
        assert_eq!(a, b);
    }

    #[test]
    fn invalid_dimensions() {
        assert!(Viewport::new(1.0, Complex::ZERO, 0, 100).is_err());
        assert!(Viewport::new(1.0, Complex::ZERO, 100, 0).is_err());
    }

    #[test]
    fn invalid_zoom() {
        assert!(Viewport::new(0.0, Complex::ZERO, 100, 100).is_err());
        assert!(Viewport::new(-1.0, Complex::ZERO, 100, 100).is_err());
        assert!(Viewport::new(f64::NAN, Complex::ZERO, 100, 100).is_err());
        assert!(Viewport::new(f64::INFINITY, Complex::ZERO, 100, 100).is_err());
    }

    #[test]
    fn zoom_steps_clamp_to_minimum() {
        let mut vp = Viewport::default_view(100, 100).unwrap();
        vp.zoom_by(10.0);
        assert!((vp.zoom - 10.5).abs() < EPSILON);
        vp.zoom_by(-1000.0);
        assert_eq!(vp.zoom, Viewport::MIN_ZOOM);
        vp.scale_zoom(0.1);
        assert_eq!(vp.zoom, Viewport::MIN_ZOOM);
        vp.scale_zoom(4.0);
        assert!((vp.zoom - 2.0).abs() < EPSILON);
    }

    #[test]
    fn center_on_pixel_then_reset() {
        let mut vp = Viewport::new(1.0, Complex::ZERO, 100, 100).unwrap();
        vp.center_on(75.0, 25.0);
        assert!((vp.offset.re - 0.5).abs() < EPSILON);
        assert!((vp.offset.im - (-0.5)).abs() < EPSILON);

        // The clicked point is now at the centre.
        let c = vp.pixel_to_complex(50, 50);
        assert!((c.re - 0.5).abs() < EPSILON);

        vp.reset();
        assert_eq!(vp.zoom, Viewport::DEFAULT_ZOOM);
        assert_eq!(vp.offset, Complex::ZERO);
        assert_eq!(vp.width, 100);
    }

    #[test]
    fn with_size_keeps_view() {
        let vp = Viewport::new(4.0, Complex::new(-0.75, 0.1), 300, 200).unwrap();
        let big = vp.with_size(4096, 3072).unwrap();
        assert_eq!(big.zoom, vp.zoom);
        assert_eq!(big.offset, vp.offset);
        assert_eq!(big.pixel_count(), 4096 * 3072);
        assert!(vp.with_size(0, 10).is_err());
    }

    #[test]
    fn explicit_zoom_is_clamped() {
        assert_eq!(Viewport::clamp_zoom(0.1), Viewport::MIN_ZOOM);
        assert_eq!(Viewport::clamp_zoom(-3.0), Viewport::MIN_ZOOM);
        assert_eq!(Viewport::clamp_zoom(f64::NAN), Viewport::MIN_ZOOM);
        assert_eq!(Viewport::clamp_zoom(7.0), 7.0);
    }

    #[test]
    fn slow_zoom_compounds_per_frame() {
        assert!((slow_zoom_factor(DEFAULT_ZOOM_SPEED) - 1.015).abs() < EPSILON);
        assert!((slow_zoom_factor(0.0) - 1.01).abs() < EPSILON);

        let mut vp = Viewport::default_view(100, 100).unwrap();
        for _ in 0..10 {
            vp.scale_zoom(slow_zoom_factor(DEFAULT_ZOOM_SPEED));
        }
        assert!((vp.zoom - 0.5 * 1.015f64.powi(10)).abs() < EPSILON);
    }
}
