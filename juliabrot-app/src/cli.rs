use std::path::{Path, PathBuf};

use clap::{Args, Parser, Subcommand, ValueEnum};
use rand::Rng;
use tracing::info;

use juliabrot_core::{slow_zoom_factor, Complex, Viewport, DEFAULT_ZOOM_SPEED};
use juliabrot_render::{
    CustomColors, GradientStops, RenderRequest, ResolutionPreset, SchemeTag, StopSelection,
    VariantTag,
};

use crate::app_dir;
use crate::error::AppError;
use crate::preferences::AppPreferences;

/// Escape-time Mandelbrot and Julia renderer.
///
/// Example:
///   juliabrot render --resolution 4k --zoom 40 --offset-real=-0.745 --scheme fire
#[derive(Parser, Debug)]
#[command(name = "juliabrot", version, about)]
pub struct Cli {
    /// Preferences file (defaults to preferences.json next to the executable)
    #[arg(long, global = true, value_name = "FILE")]
    pub preferences: Option<PathBuf>,

    /// Write the effective settings of this run back to the preferences file
    #[arg(long, global = true)]
    pub save_preferences: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Render at full resolution in the background, reporting progress
    Render(RenderArgs),
    /// Render the live-view canvas synchronously
    Preview(PreviewArgs),
    /// Print the render request these options describe, as JSON
    Request(RenderArgs),
}

#[derive(Args, Debug)]
pub struct RenderArgs {
    #[command(flatten)]
    pub view: ViewArgs,

    /// Output size preset (720, 1080, 2k, 4k, custom)
    #[arg(long)]
    pub resolution: Option<ResolutionPreset>,

    /// Custom output width; implies --resolution custom
    #[arg(long)]
    pub width: Option<String>,

    /// Custom output height; implies --resolution custom
    #[arg(long)]
    pub height: Option<String>,

    /// Read the whole render request from a JSON file instead of flags
    #[arg(long, value_name = "FILE", conflicts_with_all = ["resolution", "width", "height"])]
    pub request: Option<PathBuf>,

    /// Output PNG path
    #[arg(long, short, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Render a slow-zoom sequence of this many frames, numbered after the output name
    #[arg(long, value_name = "N", value_parser = clap::value_parser!(u32).range(1..))]
    pub zoom_frames: Option<u32>,

    /// Slow-zoom speed; each frame zooms by 1 % x (1 + SPEED / 100) [default: 50]
    #[arg(long, value_name = "SPEED", requires = "zoom_frames")]
    pub zoom_speed: Option<f64>,
}

#[derive(Args, Debug)]
pub struct PreviewArgs {
    #[command(flatten)]
    pub view: ViewArgs,

    /// Output image path (format from the extension)
    #[arg(long, short, value_name = "FILE")]
    pub output: Option<PathBuf>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum VariantArg {
    Mandelbrot,
    Julia,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum StopArg {
    All,
    Start,
    Middle,
    End,
}

impl From<StopArg> for StopSelection {
    fn from(arg: StopArg) -> Self {
        match arg {
            StopArg::All => StopSelection::All,
            StopArg::Start => StopSelection::Start,
            StopArg::Middle => StopSelection::Middle,
            StopArg::End => StopSelection::End,
        }
    }
}

impl From<VariantArg> for VariantTag {
    fn from(arg: VariantArg) -> Self {
        match arg {
            VariantArg::Mandelbrot => VariantTag::Mandelbrot,
            VariantArg::Julia => VariantTag::Julia,
        }
    }
}

/// View and coloring options shared by every subcommand.
#[derive(Args, Debug)]
pub struct ViewArgs {
    #[arg(long, value_enum, default_value_t = VariantArg::Mandelbrot)]
    pub variant: VariantArg,

    /// Julia constant as RE,IM
    #[arg(long, value_name = "RE,IM", value_parser = parse_complex, allow_hyphen_values = true)]
    pub julia_c: Option<Complex>,

    #[arg(long, allow_hyphen_values = true)]
    pub zoom: Option<f64>,

    #[arg(long, allow_hyphen_values = true)]
    pub offset_real: Option<f64>,

    #[arg(long, allow_hyphen_values = true)]
    pub offset_imag: Option<f64>,

    /// Re-centre on this live-view canvas pixel before zooming
    #[arg(long, value_name = "X,Y", value_parser = parse_pixel)]
    pub center_on: Option<(f64, f64)>,

    /// Additive zoom step, repeatable (e.g. --zoom-by 10 --zoom-by 100)
    #[arg(long, value_name = "DELTA", allow_hyphen_values = true)]
    pub zoom_by: Vec<f64>,

    #[arg(long)]
    pub iterations: Option<u32>,

    /// Color scheme (grayscale, blackwhite, fire, cool, vibrant, custom)
    #[arg(long)]
    pub scheme: Option<SchemeTag>,

    /// Custom gradient start color (#rrggbb)
    #[arg(long)]
    pub start_color: Option<String>,

    /// Custom gradient middle color (#rrggbb)
    #[arg(long)]
    pub middle_color: Option<String>,

    /// Custom gradient end color (#rrggbb)
    #[arg(long)]
    pub end_color: Option<String>,

    /// Replace custom gradient stops with random colors
    #[arg(
        long,
        value_enum,
        value_name = "STOPS",
        num_args = 0..=1,
        default_missing_value = "all"
    )]
    pub randomize_colors: Option<StopArg>,
}

fn parse_pair(s: &str) -> Option<(f64, f64)> {
    let (l, r) = s.split_once(',')?;
    Some((l.trim().parse().ok()?, r.trim().parse().ok()?))
}

fn parse_complex(s: &str) -> Result<Complex, String> {
    parse_pair(s)
        .map(|(re, im)| Complex::new(re, im))
        .ok_or_else(|| format!("could not parse complex number {s:?}, expected RE,IM"))
}

fn parse_pixel(s: &str) -> Result<(f64, f64), String> {
    parse_pair(s).ok_or_else(|| format!("could not parse pixel {s:?}, expected X,Y"))
}

impl ViewArgs {
    /// Fold these options over `prefs`, writing back what the run will use.
    pub fn apply_to(&self, prefs: &mut AppPreferences) -> Result<(), AppError> {
        if let Some(n) = self.iterations {
            prefs.max_iterations = n;
        }
        if let Some(scheme) = &self.scheme {
            prefs.color_scheme = scheme.clone();
        }
        let colors = &mut prefs.custom_colors;
        for (flag, slot) in [
            (&self.start_color, &mut colors.start),
            (&self.middle_color, &mut colors.middle),
            (&self.end_color, &mut colors.end),
        ] {
            if let Some(hex) = flag {
                *slot = hex.clone();
            }
        }
        if let Some(c) = self.julia_c {
            prefs.julia_constant = c;
        }
        self.apply_random_colors(prefs, &mut rand::thread_rng())
    }

    /// Apply `--randomize-colors` after any explicit stop colors.
    fn apply_random_colors(&self, prefs: &mut AppPreferences, rng: &mut impl Rng) -> Result<(), AppError> {
        let Some(which) = self.randomize_colors else {
            return Ok(());
        };
        let colors = &prefs.custom_colors;
        let mut stops = GradientStops::from_hex(&colors.start, &colors.middle, &colors.end)?;
        stops.randomize(which.into(), rng);
        prefs.custom_colors = CustomColors::from(stops);
        info!(
            start = %prefs.custom_colors.start,
            middle = %prefs.custom_colors.middle,
            end = %prefs.custom_colors.end,
            "Randomized custom colors"
        );
        Ok(())
    }

    /// Build the live-view viewport on the preferences canvas, then apply the
    /// navigation flags in order: explicit zoom and offset, centre, zoom steps.
    pub fn live_view(&self, prefs: &AppPreferences) -> Result<Viewport, AppError> {
        let view = Viewport::default_view(prefs.canvas_width, prefs.canvas_height)?;
        let zoom = self.zoom.map_or(view.zoom, Viewport::clamp_zoom);
        let offset = Complex::new(
            self.offset_real.unwrap_or(view.offset.re),
            self.offset_imag.unwrap_or(view.offset.im),
        );
        let mut view = Viewport::new(zoom, offset, view.width, view.height)?;
        if let Some((x, y)) = self.center_on {
            view.center_on(x, y);
        }
        for &delta in &self.zoom_by {
            view.zoom_by(delta);
        }
        Ok(view)
    }

    /// A request for `view` redrawn at `width` × `height`.
    pub fn request(
        &self,
        prefs: &AppPreferences,
        view: &Viewport,
        width: u32,
        height: u32,
    ) -> RenderRequest {
        let variant = VariantTag::from(self.variant);
        let custom_colors = (prefs.color_scheme == SchemeTag::Custom)
            .then(|| prefs.custom_colors.clone());
        let julia_constant = (variant == VariantTag::Julia).then_some(prefs.julia_constant);
        RenderRequest {
            width,
            height,
            zoom: view.zoom,
            offset_real: view.offset.re,
            offset_imag: view.offset.im,
            max_iterations: prefs.max_iterations,
            color_scheme: prefs.color_scheme.clone(),
            custom_colors,
            variant,
            julia_constant,
        }
    }
}

impl RenderArgs {
    /// Resolve flags and preferences into the request to render.
    ///
    /// Updates `prefs` with every value taken from the command line.
    pub fn to_request(&self, prefs: &mut AppPreferences) -> Result<RenderRequest, AppError> {
        if let Some(path) = &self.request {
            let json = std::fs::read_to_string(path).map_err(|source| AppError::Read {
                path: path.clone(),
                source,
            })?;
            return serde_json::from_str(&json).map_err(|source| AppError::Request {
                path: path.clone(),
                source,
            });
        }

        self.view.apply_to(prefs)?;
        if let Some(w) = &self.width {
            prefs.custom_width = w.clone();
        }
        if let Some(h) = &self.height {
            prefs.custom_height = h.clone();
        }
        prefs.resolution = match self.resolution {
            Some(preset) => preset,
            None if self.width.is_some() || self.height.is_some() => ResolutionPreset::Custom,
            None => prefs.resolution,
        };
        let (width, height) = prefs
            .resolution
            .resolve(&prefs.custom_width, &prefs.custom_height)?;

        let live = self.view.live_view(prefs)?;
        let view = live.with_size(width, height)?;
        Ok(self.view.request(prefs, &view, width, height))
    }

    pub fn output_path(&self, prefs: &AppPreferences) -> PathBuf {
        self.output.clone().unwrap_or_else(|| {
            app_dir::output_directory(&prefs.output_dir).join(&prefs.output_file_name)
        })
    }

    /// The frames to render: just `request`, or a slow zoom starting from it
    /// when `--zoom-frames` is given.
    pub fn frames(&self, request: RenderRequest) -> Vec<RenderRequest> {
        let Some(count) = self.zoom_frames else {
            return vec![request];
        };
        let factor = slow_zoom_factor(self.zoom_speed.unwrap_or(DEFAULT_ZOOM_SPEED));
        let mut view = Viewport {
            zoom: request.zoom,
            offset: Complex::new(request.offset_real, request.offset_imag),
            width: request.width,
            height: request.height,
        };
        (0..count)
            .map(|_| {
                let frame = RenderRequest {
                    zoom: view.zoom,
                    ..request.clone()
                };
                view.scale_zoom(factor);
                frame
            })
            .collect()
    }
}

/// `dir/name.png` becomes `dir/name_0007.png` for frame 7.
pub fn frame_path(base: &Path, frame: usize) -> PathBuf {
    let stem = base.file_stem().and_then(|s| s.to_str()).unwrap_or("frame");
    let ext = base.extension().and_then(|e| e.to_str()).unwrap_or("png");
    base.with_file_name(format!("{stem}_{frame:04}.{ext}"))
}

impl PreviewArgs {
    /// The live-view request at canvas size.
    pub fn to_request(&self, prefs: &mut AppPreferences) -> Result<RenderRequest, AppError> {
        self.view.apply_to(prefs)?;
        let view = self.view.live_view(prefs)?;
        Ok(self.view.request(prefs, &view, view.width, view.height))
    }

    pub fn output_path(&self, prefs: &AppPreferences) -> PathBuf {
        self.output.clone().unwrap_or_else(|| {
            app_dir::output_directory(&prefs.output_dir).join(format!("preview_{}", prefs.output_file_name))
        })
    }
}
