use crate::output::Output;
use crate::pixel::frame_to_rgba;
use crate::shm::ShmBuffer;
use crate::{Error, Rect, Result};
use image::RgbaImage;
use wayland_client::{
    globals::{registry_queue_init, GlobalListContents},
    protocol::{
        wl_buffer::WlBuffer,
        wl_registry::WlRegistry,
        wl_shm::{self, WlShm},
        wl_shm_pool::WlShmPool,
    },
    Connection, Dispatch, EventQueue, Proxy, QueueHandle, WEnum,
};
use wayland_protocols_wlr::screencopy::v1::client::{
    zwlr_screencopy_frame_v1::{self, ZwlrScreencopyFrameV1},
    zwlr_screencopy_manager_v1::ZwlrScreencopyManagerV1,
};

#[derive(Debug, Clone, Copy)]
struct BufferSpec {
    format: wl_shm::Format,
    width: u32,
    height: u32,
    stride: u32,
}

#[derive(Debug, Default)]
struct FrameState {
    buffer: Option<BufferSpec>,
    buffer_done: bool,
    y_invert: bool,
    ready: bool,
    failed: Option<String>,
}

struct CaptureState {
    shm: WlShm,
    manager: ZwlrScreencopyManagerV1,
    frame: FrameState,
}

/// Grabs output pixels through `zwlr_screencopy_manager_v1`.
pub(crate) struct WaylandCapture {
    queue: EventQueue<CaptureState>,
    state: CaptureState,
}

impl WaylandCapture {
    pub fn new(conn: &Connection) -> Result<Self> {
        let (globals, queue) = registry_queue_init::<CaptureState>(conn).map_err(|e| {
            Error::WaylandConnection(format!("Failed to initialize Wayland globals: {}", e))
        })?;
        let qh = queue.handle();

        let manager = globals
            .bind::<ZwlrScreencopyManagerV1, _, _>(&qh, 1..=3, ())
            .map_err(|_| {
                Error::UnsupportedProtocol("zwlr_screencopy_manager_v1 not available".to_string())
            })?;
        let shm = globals
            .bind::<WlShm, _, _>(&qh, 1..=1, ())
            .map_err(|_| Error::UnsupportedProtocol("wl_shm not available".to_string()))?;

        Ok(Self {
            queue,
            state: CaptureState {
                shm,
                manager,
                frame: FrameState::default(),
            },
        })
    }

    /// Captures `local` (output-relative, logical) from one output.
    ///
    /// The returned image is in buffer pixels, which exceed the logical size
    /// on scaled outputs.
    pub fn capture_output_region(&mut self, output: &Output, local: Rect) -> Result<RgbaImage> {
        log::debug!("Capturing {} from output {}", local, output.name);

        self.state.frame = FrameState::default();
        let qh = self.queue.handle();
        let frame = self.state.manager.capture_output_region(
            0,
            &output.handle,
            local.x(),
            local.y(),
            local.width(),
            local.height(),
            &qh,
            (),
        );

        let result = self.copy_frame(&frame, &qh);
        frame.destroy();
        result
    }

    fn copy_frame(
        &mut self,
        frame: &ZwlrScreencopyFrameV1,
        qh: &QueueHandle<CaptureState>,
    ) -> Result<RgbaImage> {
        // Version 3 announces every buffer type and then buffer_done; older
        // managers only ever send the single shm buffer event.
        let announces_done = self.state.manager.version() >= 3;

        let spec = loop {
            if let Some(reason) = self.state.frame.failed.take() {
                return Err(Error::FrameCapture(reason));
            }
            if let Some(spec) = self.state.frame.buffer {
                if self.state.frame.buffer_done || !announces_done {
                    break spec;
                }
            }
            self.dispatch()?;
        };

        log::debug!(
            "Frame buffer: {:?} {}x{} stride {}",
            spec.format,
            spec.width,
            spec.height,
            spec.stride
        );

        let buffer = ShmBuffer::new(
            &self.state.shm,
            qh,
            spec.width,
            spec.height,
            spec.stride,
            spec.format,
            0,
        )?;
        frame.copy(buffer.wl_buffer());

        while !self.state.frame.ready {
            if let Some(reason) = self.state.frame.failed.take() {
                return Err(Error::FrameCapture(reason));
            }
            self.dispatch()?;
        }

        frame_to_rgba(
            buffer.pixels(),
            buffer.width(),
            buffer.height(),
            buffer.stride(),
            spec.format,
            self.state.frame.y_invert,
        )
    }

    fn dispatch(&mut self) -> Result<()> {
        self.queue
            .blocking_dispatch(&mut self.state)
            .map(|_| ())
            .map_err(|e| Error::FrameCapture(format!("Failed to dispatch frame events: {}", e)))
    }
}

impl Dispatch<WlRegistry, GlobalListContents> for CaptureState {
    fn event(
        _: &mut Self,
        _: &WlRegistry,
        _: <WlRegistry as Proxy>::Event,
        _: &GlobalListContents,
        _: &Connection,
        _: &QueueHandle<Self>,
    ) {
    }
}

impl Dispatch<WlShm, ()> for CaptureState {
    fn event(
        _: &mut Self,
        _: &WlShm,
        _: <WlShm as Proxy>::Event,
        _: &(),
        _: &Connection,
        _: &QueueHandle<Self>,
    ) {
    }
}

impl Dispatch<WlShmPool, ()> for CaptureState {
    fn event(
        _: &mut Self,
        _: &WlShmPool,
        _: <WlShmPool as Proxy>::Event,
        _: &(),
        _: &Connection,
        _: &QueueHandle<Self>,
    ) {
    }
}

impl Dispatch<WlBuffer, usize> for CaptureState {
    fn event(
        _: &mut Self,
        _: &WlBuffer,
        _: <WlBuffer as Proxy>::Event,
        _: &usize,
        _: &Connection,
        _: &QueueHandle<Self>,
    ) {
    }
}

impl Dispatch<ZwlrScreencopyManagerV1, ()> for CaptureState {
    fn event(
        _: &mut Self,
        _: &ZwlrScreencopyManagerV1,
        _: <ZwlrScreencopyManagerV1 as Proxy>::Event,
        _: &(),
        _: &Connection,
        _: &QueueHandle<Self>,
    ) {
    }
}

impl Dispatch<ZwlrScreencopyFrameV1, ()> for CaptureState {
    fn event(
        state: &mut Self,
        _: &ZwlrScreencopyFrameV1,
        event: zwlr_screencopy_frame_v1::Event,
        _: &(),
        _: &Connection,
        _: &QueueHandle<Self>,
    ) {
        use zwlr_screencopy_frame_v1::Event;

        let frame = &mut state.frame;
        match event {
            Event::Buffer {
                format,
                width,
                height,
                stride,
            } => match format {
                WEnum::Value(format) => {
                    frame.buffer = Some(BufferSpec {
                        format,
                        width,
                        height,
                        stride,
                    });
                }
                WEnum::Unknown(raw) => {
                    frame.failed = Some(format!("unknown shm format {:#x}", raw));
                }
            },
            Event::Flags { flags } => {
                if let WEnum::Value(flags) = flags {
                    frame.y_invert = flags.contains(zwlr_screencopy_frame_v1::Flags::YInvert);
                }
            }
            Event::BufferDone => {
                frame.buffer_done = true;
            }
            Event::Ready { .. } => {
                frame.ready = true;
            }
            Event::Failed => {
                frame.failed = Some("compositor reported failure".to_string());
            }
            other => {
                log::debug!("Ignoring screencopy event: {:?}", other);
            }
        }
    }
}
