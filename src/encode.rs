use crate::{Error, Result};
use chrono::{DateTime, Local};
use image::{ImageBuffer, Rgba};
use std::path::{Path, PathBuf};

fn to_image(data: &[u8], width: u32, height: u32) -> Result<ImageBuffer<Rgba<u8>, Vec<u8>>> {
    ImageBuffer::<Rgba<u8>, _>::from_raw(width, height, data.to_vec()).ok_or(
        Error::ImageProcessing(image::ImageError::Parameter(
            image::error::ParameterError::from_kind(
                image::error::ParameterErrorKind::DimensionMismatch,
            ),
        )),
    )
}

/// Encodes RGBA8 pixels as PNG bytes.
pub fn to_png(data: &[u8], width: u32, height: u32) -> Result<Vec<u8>> {
    let img = to_image(data, width, height)?;
    let mut png_data = Vec::new();
    img.write_to(&mut std::io::Cursor::new(&mut png_data), image::ImageFormat::Png)?;
    Ok(png_data)
}

/// Writes RGBA8 pixels to `path` as PNG.
pub fn save_png<P: AsRef<Path>>(data: &[u8], width: u32, height: u32, path: P) -> Result<()> {
    let path = path.as_ref();
    let png = to_png(data, width, height)?;
    std::fs::write(path, png).map_err(|e| Error::IoWithContext {
        operation: format!("writing '{}'", path.display()),
        source: e,
    })?;
    log::info!("Saved {}x{} snip to {}", width, height, path.display());
    Ok(())
}

/// `minisnip_YYYYMMDD-HHMMSS-fff.png`
pub fn file_name(now: DateTime<Local>) -> String {
    format!("minisnip_{}.png", now.format("%Y%m%d-%H%M%S-%3f"))
}

/// Timestamped PNG path inside `dir`, or the system temp dir.
pub fn default_output_path(dir: Option<&Path>) -> PathBuf {
    let dir = dir.map(Path::to_path_buf).unwrap_or_else(std::env::temp_dir);
    dir.join(file_name(Local::now()))
}
