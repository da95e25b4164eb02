use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::error::RenderError;

// ---------------------------------------------------------------------------
// RGB
// ---------------------------------------------------------------------------

/// An 8-bit-per-channel color.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const BLACK: Self = Self::new(0, 0, 0);
    pub const WHITE: Self = Self::new(255, 255, 255);

    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Parse `#rrggbb` (the leading `#` is optional).
    pub fn from_hex(hex: &str) -> crate::Result<Self> {
        let digits = hex.trim().trim_start_matches('#');
        let invalid = || RenderError::InvalidColor {
            value: hex.to_string(),
        };
        if digits.len() != 6 {
            return Err(invalid());
        }
        let bits = u32::from_str_radix(digits, 16).map_err(|_| invalid())?;
        Ok(Self::new(
            ((bits >> 16) & 0xFF) as u8,
            ((bits >> 8) & 0xFF) as u8,
            (bits & 0xFF) as u8,
        ))
    }

    /// Lowercase `#rrggbb`.
    pub fn to_hex(self) -> String {
        format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }

    #[inline]
    pub fn to_rgba(self) -> [u8; 4] {
        [self.r, self.g, self.b, 255]
    }

    /// A uniformly drawn color below `#ffffff`.
    pub fn random(rng: &mut impl Rng) -> Self {
        let bits: u32 = rng.gen_range(0..0xFF_FFFF);
        Self::new((bits >> 16) as u8, (bits >> 8) as u8, bits as u8)
    }
}

// ---------------------------------------------------------------------------
// Gradient stops
// ---------------------------------------------------------------------------

/// The three stops of the user-defined gradient.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GradientStops {
    pub start: Rgb,
    pub middle: Rgb,
    pub end: Rgb,
}

impl GradientStops {
    pub fn new(start: Rgb, middle: Rgb, end: Rgb) -> Self {
        Self { start, middle, end }
    }

    /// Build from three hex strings, e.g. from a render request.
    pub fn from_hex(start: &str, middle: &str, end: &str) -> crate::Result<Self> {
        Ok(Self::new(
            Rgb::from_hex(start)?,
            Rgb::from_hex(middle)?,
            Rgb::from_hex(end)?,
        ))
    }

    /// Two linear segments: `start → middle` over `[0, 0.5)`, `middle → end` over `[0.5, 1]`.
    pub fn sample(&self, t: f64) -> Rgb {
        if t < 0.5 {
            lerp_rgb(self.start, self.middle, t * 2.0)
        } else {
            lerp_rgb(self.middle, self.end, t * 2.0 - 1.0)
        }
    }
}

/// Which gradient stops [`GradientStops::randomize`] replaces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StopSelection {
    #[default]
    All,
    Start,
    Middle,
    End,
}

impl GradientStops {
    /// Replace the selected stops with random colors, leaving the rest alone.
    pub fn randomize(&mut self, which: StopSelection, rng: &mut impl Rng) {
        match which {
            StopSelection::All => {
                self.start = Rgb::random(rng);
                self.middle = Rgb::random(rng);
                self.end = Rgb::random(rng);
            }
            StopSelection::Start => self.start = Rgb::random(rng),
            StopSelection::Middle => self.middle = Rgb::random(rng),
            StopSelection::End => self.end = Rgb::random(rng),
        }
    }
}

impl Default for GradientStops {
    /// Black → red → white.
    fn default() -> Self {
        Self::new(Rgb::BLACK, Rgb::new(255, 0, 0), Rgb::WHITE)
    }
}

// ---------------------------------------------------------------------------
// Color schemes
// ---------------------------------------------------------------------------

/// How an iteration count becomes a color.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ColorScheme {
    Grayscale,
    /// White outside the set, black inside.
    BlackWhite,
    Fire,
    Cool,
    /// Full hue sweep at 100 % saturation, 50 % lightness.
    #[default]
    Vibrant,
    Custom(GradientStops),
    /// A scheme tag this engine does not know. Every pixel renders black.
    Unsupported,
}

impl ColorScheme {
    /// Lowercase tag used in render requests and preferences.
    pub fn tag(&self) -> &'static str {
        match self {
            Self::Grayscale => "grayscale",
            Self::BlackWhite => "blackwhite",
            Self::Fire => "fire",
            Self::Cool => "cool",
            Self::Vibrant => "vibrant",
            Self::Custom(_) => "custom",
            Self::Unsupported => "unsupported",
        }
    }

    pub fn is_supported(&self) -> bool {
        !matches!(self, Self::Unsupported)
    }
}

/// Map an escape-time count to a color.
///
/// `n >= max_iterations` is the set-membership sentinel and is black under
/// every scheme. Otherwise `t = n / max_iterations` lies in `[0, 1)`.
pub fn color_for(n: u32, max_iterations: u32, scheme: &ColorScheme) -> Rgb {
    if n >= max_iterations {
        return Rgb::BLACK;
    }
    let t = n as f64 / max_iterations as f64;

    match scheme {
        ColorScheme::Grayscale => {
            let gray = channel(255.0 * t);
            Rgb::new(gray, gray, gray)
        }
        ColorScheme::BlackWhite => Rgb::WHITE,
        ColorScheme::Fire => Rgb::new(channel(255.0 * t), channel(100.0 * t), 0),
        ColorScheme::Cool => Rgb::new(0, channel(255.0 * t), channel(255.0 * (1.0 - t))),
        ColorScheme::Vibrant => hsl_to_rgb((360.0 * t).floor(), 1.0, 0.5),
        ColorScheme::Custom(stops) => stops.sample(t),
        ColorScheme::Unsupported => Rgb::BLACK,
    }
}

/// Floor a channel value already known to lie in `[0, 255]`.
#[inline]
fn channel(v: f64) -> u8 {
    v.floor().clamp(0.0, 255.0) as u8
}

fn lerp_rgb(a: Rgb, b: Rgb, u: f64) -> Rgb {
    let lerp = |x: u8, y: u8| channel(x as f64 + (y as f64 - x as f64) * u);
    Rgb::new(lerp(a.r, b.r), lerp(a.g, b.g), lerp(a.b, b.b))
}

/// CSS-style HSL → RGB. `hue` in degrees, `saturation` and `lightness` in `[0, 1]`.
pub fn hsl_to_rgb(hue: f64, saturation: f64, lightness: f64) -> Rgb {
    let chroma = (1.0 - (2.0 * lightness - 1.0).abs()) * saturation;
    let h = hue.rem_euclid(360.0) / 60.0;
    let x = chroma * (1.0 - (h % 2.0 - 1.0).abs());
    let (r1, g1, b1) = match h as u32 {
        0 => (chroma, x, 0.0),
        1 => (x, chroma, 0.0),
        2 => (0.0, chroma, x),
        3 => (0.0, x, chroma),
        4 => (x, 0.0, chroma),
        _ => (chroma, 0.0, x),
    };
    let m = lightness - chroma / 2.0;
    let to_u8 = |v: f64| ((v + m) * 255.0).round().clamp(0.0, 255.0) as u8;
    Rgb::new(to_u8(r1), to_u8(g1), to_u8(b1))
}
