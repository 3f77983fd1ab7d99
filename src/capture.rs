use crate::{encode, Error, Rect, Result};
use image::{imageops, Rgba, RgbaImage};
use std::path::Path;

/// Pixels grabbed from the screen, tightly packed RGBA8.
#[derive(Debug, Clone)]
pub struct CaptureResult {
    data: Vec<u8>,
    width: u32,
    height: u32,
}

impl CaptureResult {
    pub fn new(data: Vec<u8>, width: u32, height: u32) -> Self {
        Self { data, width, height }
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn into_data(self) -> Vec<u8> {
        self.data
    }

    pub fn to_png(&self) -> Result<Vec<u8>> {
        encode::to_png(&self.data, self.width, self.height)
    }

    pub fn save_png<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        encode::save_png(&self.data, self.width, self.height, path)
    }
}

impl From<RgbaImage> for CaptureResult {
    fn from(img: RgbaImage) -> Self {
        let (width, height) = img.dimensions();
        Self::new(img.into_raw(), width, height)
    }
}

/// One output's share of a capture: where it lands and what it shows.
#[derive(Debug, Clone)]
pub(crate) struct Piece {
    pub area: Rect,
    pub image: RgbaImage,
}

/// Clips a requested region to the virtual screen.
///
/// Everything outside `screen` would come back black anyway, and the canvas
/// is allocated at the region's size, so `-g` cannot ask for more pixels than
/// the outputs cover.
pub(crate) fn clamp_to_screen(region: Rect, screen: Rect) -> Result<Rect> {
    if region.is_empty() {
        return Err(Error::InvalidRegion(format!("empty region {}", region)));
    }

    let clamped = region.intersection(&screen).ok_or_else(|| {
        Error::InvalidRegion(format!("{} is outside the virtual screen {}", region, screen))
    })?;
    if clamped != region {
        log::debug!("Clamped {} to {}", region, clamped);
    }
    Ok(clamped)
}

/// Stitches per-output pieces into a single image covering `region`.
///
/// Pieces whose pixel size differs from their logical area (scaled outputs)
/// are resampled to the logical size. Uncovered pixels stay opaque black.
pub(crate) fn composite(region: Rect, pieces: Vec<Piece>) -> Result<RgbaImage> {
    if region.is_empty() {
        return Err(Error::InvalidRegion(format!("empty region {}", region)));
    }

    let mut canvas = RgbaImage::from_pixel(
        region.width() as u32,
        region.height() as u32,
        Rgba([0, 0, 0, 255]),
    );

    for piece in pieces {
        let area = piece.area;
        if !area.intersects(&region) {
            log::warn!("Dropping piece {} outside of {}", area, region);
            continue;
        }

        let (w, h) = (area.width() as u32, area.height() as u32);
        let image = if piece.image.dimensions() != (w, h) {
            log::debug!(
                "Resampling {}x{} frame to {}x{}",
                piece.image.width(),
                piece.image.height(),
                w,
                h
            );
            imageops::resize(&piece.image, w, h, imageops::FilterType::Triangle)
        } else {
            piece.image
        };

        imageops::replace(
            &mut canvas,
            &image,
            (area.x() - region.x()) as i64,
            (area.y() - region.y()) as i64,
        );
    }

    Ok(canvas)
}
