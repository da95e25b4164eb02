//! The render request message and its conversion into [`RenderSettings`].

use serde::{Deserialize, Serialize};

use juliabrot_core::{Complex, FractalParams, FractalVariant, Viewport};

use crate::buffer::checked_byte_len;
use crate::color::{ColorScheme, GradientStops};
use crate::error::RenderError;
use crate::settings::RenderSettings;

/// Color-scheme tag as it appears on the wire.
///
/// Unrecognised tags are kept (not rejected) so the render still produces a
/// complete image; they map to [`ColorScheme::Unsupported`].
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum SchemeTag {
    Grayscale,
    BlackWhite,
    Fire,
    Cool,
    #[default]
    Vibrant,
    Custom,
    Unknown(String),
}

impl From<String> for SchemeTag {
    fn from(tag: String) -> Self {
        match tag.to_ascii_lowercase().as_str() {
            "grayscale" => Self::Grayscale,
            "blackwhite" => Self::BlackWhite,
            "fire" => Self::Fire,
            "cool" => Self::Cool,
            "vibrant" => Self::Vibrant,
            "custom" => Self::Custom,
            _ => Self::Unknown(tag),
        }
    }
}

impl From<SchemeTag> for String {
    fn from(tag: SchemeTag) -> Self {
        match tag {
            SchemeTag::Grayscale => "grayscale".into(),
            SchemeTag::BlackWhite => "blackwhite".into(),
            SchemeTag::Fire => "fire".into(),
            SchemeTag::Cool => "cool".into(),
            SchemeTag::Vibrant => "vibrant".into(),
            SchemeTag::Custom => "custom".into(),
            SchemeTag::Unknown(tag) => tag,
        }
    }
}

impl std::str::FromStr for SchemeTag {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::from(s.to_string()))
    }
}

/// Fractal selector as it appears on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VariantTag {
    #[default]
    Mandelbrot,
    Julia,
}

/// Hex strings for the three custom gradient stops.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomColors {
    pub start: String,
    pub middle: String,
    pub end: String,
}

impl Default for CustomColors {
    fn default() -> Self {
        let stops = GradientStops::default();
        Self::from(stops)
    }
}

impl From<GradientStops> for CustomColors {
    fn from(stops: GradientStops) -> Self {
        Self {
            start: stops.start.to_hex(),
            middle: stops.middle.to_hex(),
            end: stops.end.to_hex(),
        }
    }
}

/// A high-resolution render request, sent from the controller side to a
/// render context.
///
/// Optional fields fall back to defaults: missing `custom_colors` uses the
/// black → red → white gradient and a missing `julia_constant` uses
/// [`FractalVariant::DEFAULT_JULIA_C`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RenderRequest {
    pub width: u32,
    pub height: u32,
    pub zoom: f64,
    #[serde(default)]
    pub offset_real: f64,
    #[serde(default)]
    pub offset_imag: f64,
    pub max_iterations: u32,
    #[serde(default)]
    pub color_scheme: SchemeTag,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub custom_colors: Option<CustomColors>,
    #[serde(default)]
    pub variant: VariantTag,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub julia_constant: Option<Complex>,
}

impl RenderRequest {
    /// Validate and snapshot the request.
    ///
    /// Fails on zero or oversized dimensions (see
    /// [`MAX_PIXELS`](crate::buffer::MAX_PIXELS)), non-positive zoom, zero
    /// iterations or a malformed custom color. Nothing is rendered for a rejected request.
    pub fn to_settings(&self) -> crate::Result<RenderSettings> {
        checked_byte_len(self.width, self.height)?;
        let viewport = Viewport::new(
            self.zoom,
            Complex::new(self.offset_real, self.offset_imag),
            self.width,
            self.height,
        )?;
        let params = FractalParams::new(self.max_iterations)?;
        let variant = match self.variant {
            VariantTag::Mandelbrot => FractalVariant::Mandelbrot,
            VariantTag::Julia => FractalVariant::Julia {
                c: self
                    .julia_constant
                    .unwrap_or(FractalVariant::DEFAULT_JULIA_C),
            },
        };
        let scheme = self.scheme()?;
        Ok(RenderSettings::new(viewport, variant, params, scheme))
    }

    fn scheme(&self) -> crate::Result<ColorScheme> {
        Ok(match &self.color_scheme {
            SchemeTag::Grayscale => ColorScheme::Grayscale,
            SchemeTag::BlackWhite => ColorScheme::BlackWhite,
            SchemeTag::Fire => ColorScheme::Fire,
            SchemeTag::Cool => ColorScheme::Cool,
            SchemeTag::Vibrant => ColorScheme::Vibrant,
            SchemeTag::Custom => {
                let stops = match &self.custom_colors {
                    Some(c) => GradientStops::from_hex(&c.start, &c.middle, &c.end)?,
                    None => GradientStops::default(),
                };
                ColorScheme::Custom(stops)
            }
            SchemeTag::Unknown(_) => ColorScheme::Unsupported,
        })
    }

    /// Build the request describing an existing settings snapshot.
    pub fn from_settings(settings: &RenderSettings) -> Self {
        let vp = settings.viewport();
        let (color_scheme, custom_colors) = match settings.scheme() {
            ColorScheme::Grayscale => (SchemeTag::Grayscale, None),
            ColorScheme::BlackWhite => (SchemeTag::BlackWhite, None),
            ColorScheme::Fire => (SchemeTag::Fire, None),
            ColorScheme::Cool => (SchemeTag::Cool, None),
            ColorScheme::Vibrant => (SchemeTag::Vibrant, None),
            ColorScheme::Custom(stops) => (SchemeTag::Custom, Some(CustomColors::from(*stops))),
            ColorScheme::Unsupported => (SchemeTag::Unknown("unsupported".into()), None),
        };
        let (variant, julia_constant) = match settings.variant() {
            FractalVariant::Mandelbrot => (VariantTag::Mandelbrot, None),
            FractalVariant::Julia { c } => (VariantTag::Julia, Some(c)),
        };
        Self {
            width: vp.width,
            height: vp.height,
            zoom: vp.zoom,
            offset_real: vp.offset.re,
            offset_imag: vp.offset.im,
            max_iterations: settings.max_iterations(),
            color_scheme,
            custom_colors,
            variant,
            julia_constant,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::color::Rgb;

    fn base() -> RenderRequest {
        RenderRequest {
            width: 960,
            height: 720,
            zoom: 0.5,
            offset_real: 0.0,
            offset_imag: 0.0,
            max_iterations: 100,
            color_scheme: SchemeTag::Fire,
            custom_colors: None,
            variant: VariantTag::Mandelbrot,
            julia_constant: None,
        }
    }

    #[test]
    fn valid_request_converts() {
        let s = base().to_settings().unwrap();
        assert_eq!(s.width(), 960);
        assert_eq!(s.height(), 720);
        assert_eq!(s.max_iterations(), 100);
        assert_eq!(*s.scheme(), ColorScheme::Fire);
        assert_eq!(s.variant(), FractalVariant::Mandelbrot);
    }

    #[test]
    fn structural_errors_are_rejected() {
        let mut r = base();
        r.width = 0;
        assert!(matches!(
            r.to_settings(),
            Err(RenderError::InvalidDimensions { width: 0, height: 720 })
        ));

        for (width, height) in [(u32::MAX, u32::MAX), (20_000, 20_000)] {
            let mut r = base();
            r.width = width;
            r.height = height;
            assert!(matches!(
                r.to_settings(),
                Err(RenderError::InvalidDimensions { .. })
            ));
        }

        let mut r = base();
        r.zoom = 0.0;
        assert!(matches!(r.to_settings(), Err(RenderError::Core(_))));

        let mut r = base();
        r.max_iterations = 0;
        assert!(matches!(r.to_settings(), Err(RenderError::Core(_))));

        let mut r = base();
        r.color_scheme = SchemeTag::Custom;
        r.custom_colors = Some(CustomColors {
            start: "#000000".into(),
            middle: "nope".into(),
            end: "#ffffff".into(),
        });
        assert!(matches!(r.to_settings(), Err(RenderError::InvalidColor { .. })));
    }

    #[test]
    fn julia_defaults_constant() {
        let mut r = base();
        r.variant = VariantTag::Julia;
        let s = r.to_settings().unwrap();
        assert_eq!(s.variant().julia_c(), Some(FractalVariant::DEFAULT_JULIA_C));

        r.julia_constant = Some(Complex::new(0.285, 0.01));
        let s = r.to_settings().unwrap();
        assert_eq!(s.variant().julia_c(), Some(Complex::new(0.285, 0.01)));
    }

    #[test]
    fn custom_defaults_to_black_red_white() {
        let mut r = base();
        r.color_scheme = SchemeTag::Custom;
        let s = r.to_settings().unwrap();
        assert_eq!(
            *s.scheme(),
            ColorScheme::Custom(GradientStops::new(
                Rgb::BLACK,
                Rgb::new(255, 0, 0),
                Rgb::WHITE
            ))
        );
    }

    #[test]
    fn wire_format_from_json() {
        let json = r##"{
            "width": 2048,
            "height": 1536,
            "zoom": 3.5,
            "offset_real": -0.75,
            "offset_imag": 0.1,
            "max_iterations": 500,
            "color_scheme": "custom",
            "custom_colors": { "start": "#112233", "middle": "#445566", "end": "#778899" },
            "variant": "julia",
            "julia_constant": { "real": -0.8, "imag": 0.156 }
        }"##;
        let r: RenderRequest = serde_json::from_str(json).unwrap();
        assert_eq!(r.color_scheme, SchemeTag::Custom);
        assert_eq!(r.variant, VariantTag::Julia);

        let s = r.to_settings().unwrap();
        assert_eq!(s.total_pixels(), 2048 * 1536);
        assert_eq!(s.viewport().offset, Complex::new(-0.75, 0.1));
        assert_eq!(s.variant().julia_c(), Some(Complex::new(-0.8, 0.156)));
        match s.scheme() {
            ColorScheme::Custom(stops) => assert_eq!(stops.middle, Rgb::new(0x44, 0x55, 0x66)),
            other => panic!("expected custom scheme, got {other:?}"),
        }
    }

    #[test]
    fn unknown_scheme_tag_is_not_an_error() {
        let json = r#"{"width":4,"height":4,"zoom":1,"max_iterations":10,"color_scheme":"psychedelic"}"#;
        let r: RenderRequest = serde_json::from_str(json).unwrap();
        assert_eq!(r.color_scheme, SchemeTag::Unknown("psychedelic".into()));
        let s = r.to_settings().unwrap();
        assert_eq!(*s.scheme(), ColorScheme::Unsupported);
    }

    #[test]
    fn from_settings_describes_the_same_render() {
        let mut r = base();
        r.color_scheme = SchemeTag::Custom;
        r.custom_colors = Some(CustomColors::default());
        r.variant = VariantTag::Julia;
        r.julia_constant = Some(Complex::new(-0.4, 0.6));
        let s = r.to_settings().unwrap();
        assert_eq!(RenderRequest::from_settings(&s), r);
    }
}
