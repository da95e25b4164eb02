use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{debug, error, info};

use juliabrot_core::{Complex, FractalParams, FractalVariant};
use juliabrot_render::{CustomColors, ResolutionPreset, SchemeTag};

// ---------------------------------------------------------------------------
// Application preferences
// ---------------------------------------------------------------------------

/// Defaults for every render, stored as `preferences.json` beside the
/// executable. Command-line flags override these per run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppPreferences {
    /// Size of the live-view canvas that `--center-on` pixel coordinates
    /// refer to.
    #[serde(default = "default_canvas_width")]
    pub canvas_width: u32,
    #[serde(default = "default_canvas_height")]
    pub canvas_height: u32,

    #[serde(default)]
    pub resolution: ResolutionPreset,
    /// Raw text for the custom resolution fields; validated only when the
    /// custom preset is in use.
    #[serde(default = "default_custom_width")]
    pub custom_width: String,
    #[serde(default = "default_custom_height")]
    pub custom_height: String,

    #[serde(default = "default_max_iterations")]
    pub max_iterations: u32,
    #[serde(default)]
    pub color_scheme: SchemeTag,
    #[serde(default)]
    pub custom_colors: CustomColors,
    #[serde(default = "default_julia_constant")]
    pub julia_constant: Complex,

    /// Empty means `images/` next to the executable.
    #[serde(default)]
    pub output_dir: String,
    #[serde(default = "default_output_file_name")]
    pub output_file_name: String,
}

fn default_canvas_width() -> u32 {
    800
}
fn default_canvas_height() -> u32 {
    600
}
fn default_custom_width() -> String {
    "1920".into()
}
fn default_custom_height() -> String {
    "1440".into()
}
fn default_max_iterations() -> u32 {
    FractalParams::DEFAULT_MAX_ITERATIONS
}
fn default_julia_constant() -> Complex {
    FractalVariant::DEFAULT_JULIA_C
}
fn default_output_file_name() -> String {
    "juliabrot.png".into()
}

impl Default for AppPreferences {
    fn default() -> Self {
        Self {
            canvas_width: default_canvas_width(),
            canvas_height: default_canvas_height(),
            resolution: ResolutionPreset::default(),
            custom_width: default_custom_width(),
            custom_height: default_custom_height(),
            max_iterations: default_max_iterations(),
            color_scheme: SchemeTag::default(),
            custom_colors: CustomColors::default(),
            julia_constant: default_julia_constant(),
            output_dir: String::new(),
            output_file_name: default_output_file_name(),
        }
    }
}

impl AppPreferences {
    /// Load preferences from `path`, falling back to defaults.
    pub fn load(path: &Path) -> Self {
        if !path.exists() {
            debug!("No preferences file at {}", path.display());
            return Self::default();
        }
        match fs::read_to_string(path) {
            Ok(json) => match serde_json::from_str::<AppPreferences>(&json) {
                Ok(prefs) => {
                    info!("Loaded preferences from {}", path.display());
                    prefs
                }
                Err(e) => {
                    error!("Failed to parse preferences: {e}");
                    Self::default()
                }
            },
            Err(e) => {
                error!("Failed to read preferences file: {e}");
                Self::default()
            }
        }
    }

    /// Persist preferences to `path`. Failures are logged, not returned.
    pub fn save(&self, path: &Path) {
        if let Some(parent) = path.parent() {
            if let Err(e) = fs::create_dir_all(parent) {
                error!("Failed to create preferences directory: {e}");
                return;
            }
        }
        match serde_json::to_string_pretty(self) {
            Ok(json) => {
                if let Err(e) = fs::write(path, &json) {
                    error!("Failed to write preferences: {e}");
                } else {
                    info!("Saved preferences to {}", path.display());
                }
            }
            Err(e) => error!("Failed to serialize preferences: {e}"),
        }
    }
}
