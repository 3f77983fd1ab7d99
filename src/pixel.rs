use crate::{Error, Result};
use image::RgbaImage;
use wayland_client::protocol::wl_shm;

/// Byte layout of a 32-bit shm format as it sits in memory (little-endian).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Layout {
    Bgra { opaque: bool },
    Rgba { opaque: bool },
}

fn layout(format: wl_shm::Format) -> Result<Layout> {
    match format {
        wl_shm::Format::Xrgb8888 => Ok(Layout::Bgra { opaque: true }),
        wl_shm::Format::Argb8888 => Ok(Layout::Bgra { opaque: false }),
        wl_shm::Format::Xbgr8888 => Ok(Layout::Rgba { opaque: true }),
        wl_shm::Format::Abgr8888 => Ok(Layout::Rgba { opaque: false }),
        other => Err(Error::UnsupportedFormat(format!("{:?}", other))),
    }
}

/// Converts a screencopy frame into a tightly packed RGBA image.
///
/// `stride` may be wider than `width * 4`; trailing row padding is skipped.
/// `y_invert` flips rows, as some compositors hand frames over bottom-up.
pub fn frame_to_rgba(
    data: &[u8],
    width: u32,
    height: u32,
    stride: u32,
    format: wl_shm::Format,
    y_invert: bool,
) -> Result<RgbaImage> {
    let layout = layout(format)?;
    let row_bytes = width as usize * 4;
    let stride = stride as usize;

    if stride < row_bytes || data.len() < stride * height as usize {
        return Err(Error::BufferCreation(format!(
            "frame buffer too small: {} bytes for {}x{} with stride {}",
            data.len(),
            width,
            height,
            stride
        )));
    }

    let mut out = Vec::with_capacity(row_bytes * height as usize);
    for row in 0..height as usize {
        let src_row = if y_invert { height as usize - 1 - row } else { row };
        let start = src_row * stride;
        for px in data[start..start + row_bytes].chunks_exact(4) {
            let (r, g, b, a) = match layout {
                Layout::Bgra { opaque } => (px[2], px[1], px[0], if opaque { 255 } else { px[3] }),
                Layout::Rgba { opaque } => (px[0], px[1], px[2], if opaque { 255 } else { px[3] }),
            };
            out.extend_from_slice(&[r, g, b, a]);
        }
    }

    RgbaImage::from_raw(width, height, out).ok_or_else(|| {
        Error::BufferCreation(format!("failed to build {}x{} image", width, height))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn xrgb_is_swizzled_and_made_opaque() {
        // One pixel, memory order B G R X.
        let data = [0x10, 0x20, 0x30, 0x00];
        let img = frame_to_rgba(&data, 1, 1, 4, wl_shm::Format::Xrgb8888, false).unwrap();
        assert_eq!(img.get_pixel(0, 0).0, [0x30, 0x20, 0x10, 0xFF]);
    }

    #[test]
    fn abgr_keeps_alpha() {
        let data = [1, 2, 3, 128];
        let img = frame_to_rgba(&data, 1, 1, 4, wl_shm::Format::Abgr8888, false).unwrap();
        assert_eq!(img.get_pixel(0, 0).0, [1, 2, 3, 128]);
    }

    #[test]
    fn stride_padding_is_skipped() {
        // 1x2 image with 8-byte stride; padding bytes are 0xEE.
        let data = [
            0, 0, 255, 0, 0xEE, 0xEE, 0xEE, 0xEE, // red
            255, 0, 0, 0, 0xEE, 0xEE, 0xEE, 0xEE, // blue
        ];
        let img = frame_to_rgba(&data, 1, 2, 8, wl_shm::Format::Xrgb8888, false).unwrap();
        assert_eq!(img.get_pixel(0, 0).0, [255, 0, 0, 255]);
        assert_eq!(img.get_pixel(0, 1).0, [0, 0, 255, 255]);
    }

    #[test]
    fn y_invert_flips_rows() {
        let data = [
            0, 0, 255, 0, // red, top in memory
            255, 0, 0, 0, // blue
        ];
        let img = frame_to_rgba(&data, 1, 2, 4, wl_shm::Format::Xrgb8888, true).unwrap();
        assert_eq!(img.get_pixel(0, 0).0, [0, 0, 255, 255]);
        assert_eq!(img.get_pixel(0, 1).0, [255, 0, 0, 255]);
    }

    #[test]
    fn unsupported_format_is_an_error() {
        let data = [0u8; 4];
        let err = frame_to_rgba(&data, 1, 1, 4, wl_shm::Format::Rgb565, false).unwrap_err();
        assert!(matches!(err, Error::UnsupportedFormat(_)));
    }

    #[test]
    fn short_buffer_is_an_error() {
        let data = [0u8; 7];
        assert!(frame_to_rgba(&data, 1, 2, 4, wl_shm::Format::Xrgb8888, false).is_err());
    }
}
