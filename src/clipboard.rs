use crate::{CaptureResult, Result};
use arboard::{Clipboard, ImageData};
use std::borrow::Cow;

/// Puts the capture on the system clipboard.
///
/// On Linux the owning process has to keep serving the data. With `wait`
/// this call blocks until another client takes the clipboard over; without
/// it the image is only pasteable while the process is alive.
pub fn copy_image(capture: &CaptureResult, wait: bool) -> Result<()> {
    let image = ImageData {
        width: capture.width() as usize,
        height: capture.height() as usize,
        bytes: Cow::Borrowed(capture.data()),
    };

    let mut clipboard = Clipboard::new()?;

    #[cfg(target_os = "linux")]
    {
        use arboard::SetExtLinux;

        if wait {
            log::info!("Serving clipboard until another application takes it over");
            clipboard.set().wait().image(image)?;
        } else {
            clipboard.set_image(image)?;
        }
    }

    #[cfg(not(target_os = "linux"))]
    {
        let _ = wait;
        clipboard.set_image(image)?;
    }

    log::info!(
        "Copied {}x{} image to clipboard",
        capture.width(),
        capture.height()
    );
    Ok(())
}
