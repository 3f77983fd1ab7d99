pub mod capture;
pub mod clipboard;
pub mod encode;
pub mod error;
pub mod geometry;
pub mod output;
pub mod overlay;
pub mod pixel;
pub mod selection;

mod shm;
mod wayland_capture;

pub use capture::CaptureResult;
pub use error::{Error, Result};
pub use geometry::{Point, Rect};
pub use output::Output;
pub use selection::{Phase, Release, Selection};

use capture::{clamp_to_screen, composite, Piece};
use wayland_capture::WaylandCapture;
use wayland_client::Connection;

/// Main interface: pick a region interactively and grab its pixels.
pub struct Minisnip {
    connection: Connection,
    outputs: Vec<Output>,
}

impl Minisnip {
    /// Connect to the Wayland display from the environment and read the
    /// output layout.
    pub fn new() -> Result<Self> {
        let connection = Connection::connect_to_env()
            .map_err(|e| Error::WaylandConnection(format!("Failed to connect to Wayland: {}", e)))?;
        let outputs = output::enumerate(&connection)?;
        Ok(Self {
            connection,
            outputs,
        })
    }

    pub fn outputs(&self) -> &[Output] {
        &self.outputs
    }

    /// Bounding box of every output in the global logical space.
    pub fn virtual_screen(&self) -> Rect {
        Rect::bounding(self.outputs.iter().map(|o| o.geometry)).unwrap_or_default()
    }

    /// Show the overlay and wait for a drag. `None` means the user cancelled.
    pub fn select_region(&mut self) -> Result<Option<Rect>> {
        overlay::select_region(&self.connection, &self.outputs)
    }

    /// Capture the whole virtual screen.
    pub fn capture_all(&mut self) -> Result<CaptureResult> {
        let region = self.virtual_screen();
        self.capture_region(region)
    }

    /// Capture a region given in global logical coordinates.
    ///
    /// The region may span several outputs. It is first clipped to the
    /// virtual screen; gaps between outputs inside it come back black.
    pub fn capture_region(&mut self, region: Rect) -> Result<CaptureResult> {
        let region = clamp_to_screen(region, self.virtual_screen())?;

        let targets: Vec<(&Output, Rect)> = self
            .outputs
            .iter()
            .filter_map(|output| {
                region
                    .intersection(&output.geometry)
                    .map(|area| (output, area))
            })
            .collect();

        if targets.is_empty() {
            return Err(Error::InvalidRegion(format!(
                "{} does not overlap any output",
                region
            )));
        }

        let mut capture = WaylandCapture::new(&self.connection)?;
        let mut pieces = Vec::with_capacity(targets.len());
        for (output, area) in targets {
            let local = area.translate(-output.geometry.x(), -output.geometry.y());
            let image = capture.capture_output_region(output, local)?;
            pieces.push(Piece { area, image });
        }

        let image = composite(region, pieces)?;
        log::info!("Captured {} ({}x{} px)", region, image.width(), image.height());
        Ok(CaptureResult::from(image))
    }
}
