//! Output sizes for high-resolution renders.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::RenderError;

/// Named output sizes. All presets are 4:3.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ResolutionPreset {
    #[serde(rename = "720")]
    R720,
    #[default]
    #[serde(rename = "1080")]
    R1080,
    #[serde(rename = "2k")]
    R2k,
    #[serde(rename = "4k")]
    R4k,
    /// Width and height supplied separately by the user.
    #[serde(rename = "custom")]
    Custom,
}

impl ResolutionPreset {
    pub const ALL: [Self; 5] = [Self::R720, Self::R1080, Self::R2k, Self::R4k, Self::Custom];

    /// Fixed `(width, height)`, or `None` for [`Custom`](Self::Custom).
    pub fn dimensions(self) -> Option<(u32, u32)> {
        match self {
            Self::R720 => Some((960, 720)),
            Self::R1080 => Some((1440, 1080)),
            Self::R2k => Some((2048, 1536)),
            Self::R4k => Some((4096, 3072)),
            Self::Custom => None,
        }
    }

    pub fn tag(self) -> &'static str {
        match self {
            Self::R720 => "720",
            Self::R1080 => "1080",
            Self::R2k => "2k",
            Self::R4k => "4k",
            Self::Custom => "custom",
        }
    }

    /// Resolve to concrete dimensions, parsing the custom fields when needed.
    ///
    /// The custom text is only looked at for [`Custom`](Self::Custom).
    pub fn resolve(self, custom_width: &str, custom_height: &str) -> crate::Result<(u32, u32)> {
        match self.dimensions() {
            Some(dims) => Ok(dims),
            None => Ok((parse_dimension(custom_width)?, parse_dimension(custom_height)?)),
        }
    }
}

impl fmt::Display for ResolutionPreset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

impl FromStr for ResolutionPreset {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|p| p.tag().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| format!("unknown resolution {s:?} (expected 720, 1080, 2k, 4k or custom)"))
    }
}

/// Parse a user-entered width or height.
///
/// Rejects anything that is not a whole number greater than zero.
pub fn parse_dimension(text: &str) -> crate::Result<u32> {
    let invalid = || RenderError::InvalidDimension {
        value: text.to_string(),
    };
    let value: u32 = text.trim().parse().map_err(|_| invalid())?;
    if value == 0 {
        return Err(invalid());
    }
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn preset_dimensions() {
        assert_eq!(ResolutionPreset::R720.dimensions(), Some((960, 720)));
        assert_eq!(ResolutionPreset::R1080.dimensions(), Some((1440, 1080)));
        assert_eq!(ResolutionPreset::R2k.dimensions(), Some((2048, 1536)));
        assert_eq!(ResolutionPreset::R4k.dimensions(), Some((4096, 3072)));
        assert_eq!(ResolutionPreset::Custom.dimensions(), None);
    }

    #[test]
    fn parse_preset_tags() {
        for preset in ResolutionPreset::ALL {
            assert_eq!(preset.tag().parse::<ResolutionPreset>().unwrap(), preset);
        }
        assert_eq!("4K".parse::<ResolutionPreset>().unwrap(), ResolutionPreset::R4k);
        assert!("8k".parse::<ResolutionPreset>().is_err());
    }

    #[test]
    fn custom_dimensions_are_validated() {
        assert_eq!(ResolutionPreset::Custom.resolve("800", " 600 ").unwrap(), (800, 600));
        for bad in ["", "abc", "0", "-5", "12.5", "1e3"] {
            assert!(
                matches!(
                    ResolutionPreset::Custom.resolve(bad, "600"),
                    Err(RenderError::InvalidDimension { .. })
                ),
                "{bad:?} should be rejected"
            );
        }
    }

    #[test]
    fn presets_ignore_custom_text() {
        assert_eq!(ResolutionPreset::R2k.resolve("junk", "").unwrap(), (2048, 1536));
    }

    #[test]
    fn serde_uses_tags() {
        let json = serde_json::to_string(&ResolutionPreset::R2k).unwrap();
        assert_eq!(json, "\"2k\"");
        let back: ResolutionPreset = serde_json::from_str("\"720\"").unwrap();
        assert_eq!(back, ResolutionPreset::R720);
    }
}
