//! PNG export with embedded render metadata (tEXt chunks).

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use tracing::debug;

use juliabrot_core::{FractalVariant, ESCAPE_RADIUS_SQ};

use crate::buffer::RenderBuffer;
use crate::error::RenderError;
use crate::settings::RenderSettings;

/// Write `image` to `path` as an RGBA PNG, tagged with the settings that
/// produced it.
pub fn export_png(image: &RenderBuffer, settings: &RenderSettings, path: &Path) -> crate::Result<()> {
    let file = File::create(path)?;
    write_png(BufWriter::new(file), image, settings)?;
    debug!(
        width = image.width,
        height = image.height,
        path = %path.display(),
        "Exported PNG"
    );
    Ok(())
}

/// Encode `image` as PNG bytes in memory.
pub fn encode_png(image: &RenderBuffer, settings: &RenderSettings) -> crate::Result<Vec<u8>> {
    let mut bytes = Vec::new();
    write_png(&mut bytes, image, settings)?;
    Ok(bytes)
}

fn write_png<W: Write>(writer: W, image: &RenderBuffer, settings: &RenderSettings) -> crate::Result<()> {
    if image.width == 0 || image.height == 0 {
        return Err(RenderError::InvalidDimensions {
            width: image.width,
            height: image.height,
        });
    }

    let mut encoder = png::Encoder::new(writer, image.width, image.height);
    encoder.set_color(png::ColorType::Rgba);
    encoder.set_depth(png::BitDepth::Eight);
    encoder.set_compression(png::Compression::Default);

    encoder.add_text_chunk("Software".to_string(), "Juliabrot".to_string())?;
    encoder.add_text_chunk("Description".to_string(), describe(settings))?;
    for (key, value) in metadata_pairs(settings) {
        encoder.add_text_chunk(key.to_string(), value)?;
    }

    let mut png_writer = encoder.write_header()?;
    png_writer.write_image_data(&image.pixels)?;
    png_writer.finish()?;
    Ok(())
}

fn describe(settings: &RenderSettings) -> String {
    let vp = settings.viewport();
    let mut desc = format!(
        "{} - Center: {}, Zoom: {}, Iterations: {}",
        settings.variant().label(),
        vp.offset,
        vp.zoom,
        settings.max_iterations(),
    );
    if let Some(c) = settings.variant().julia_c() {
        desc.push_str(&format!(", Julia C: {c}"));
    }
    desc
}

fn metadata_pairs(settings: &RenderSettings) -> Vec<(&'static str, String)> {
    let vp = settings.viewport();
    let mut pairs = vec![
        ("Juliabrot.Variant", settings.variant().label().to_string()),
        ("Juliabrot.CenterRe", vp.offset.re.to_string()),
        ("Juliabrot.CenterIm", vp.offset.im.to_string()),
        ("Juliabrot.Zoom", vp.zoom.to_string()),
        ("Juliabrot.MaxIterations", settings.max_iterations().to_string()),
        ("Juliabrot.EscapeRadius", ESCAPE_RADIUS_SQ.sqrt().to_string()),
        ("Juliabrot.ColorScheme", settings.scheme().tag().to_string()),
        ("Juliabrot.Resolution", format!("{}x{}", vp.width, vp.height)),
    ];
    if let FractalVariant::Julia { c } = settings.variant() {
        pairs.push(("Juliabrot.JuliaC_Re", c.re.to_string()));
        pairs.push(("Juliabrot.JuliaC_Im", c.im.to_string()));
    }
    pairs
}
