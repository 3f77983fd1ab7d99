//! Full-screen selection overlay built on wlr-layer-shell.
//!
//! One layer surface is placed on every output so that together they cover
//! the virtual screen. Pointer positions arrive surface-local and are shifted
//! by the output origin before they reach the [`Selection`]; see
//! [`surface_to_global`] and [`global_to_surface`].

use crate::geometry::{Point, Rect};
use crate::output::Output;
use crate::selection::{Release, Selection};
use crate::shm::ShmBuffer;
use crate::{Error, Result};
use std::time::Duration;
use wayland_client::{
    globals::{registry_queue_init, GlobalListContents},
    protocol::{
        wl_buffer::{self, WlBuffer},
        wl_compositor::WlCompositor,
        wl_keyboard::{self, WlKeyboard},
        wl_pointer::{self, WlPointer},
        wl_registry::WlRegistry,
        wl_seat::{self, WlSeat},
        wl_shm::{self, WlShm},
        wl_shm_pool::WlShmPool,
        wl_surface::WlSurface,
    },
    Connection, Dispatch, Proxy, QueueHandle, WEnum,
};
use wayland_protocols::wp::cursor_shape::v1::client::{
    wp_cursor_shape_device_v1::{self, WpCursorShapeDeviceV1},
    wp_cursor_shape_manager_v1::WpCursorShapeManagerV1,
};
use wayland_protocols_wlr::layer_shell::v1::client::{
    zwlr_layer_shell_v1::{self, ZwlrLayerShellV1},
    zwlr_layer_surface_v1::{self, ZwlrLayerSurfaceV1},
};

const BTN_LEFT: u32 = 272; // evdev
const KEY_ESC: u32 = 1; // evdev

const BORDER_WIDTH: i32 = 2;

// ARGB8888, premultiplied.
const DIM_ARGB: u32 = 28 << 24;
const SELECTION_FILL_ARGB: u32 = 25 << 24;
const BORDER_ARGB: u32 = 0xFFFF_FFFF;

const CURSOR_SHAPE: wp_cursor_shape_device_v1::Shape =
    wp_cursor_shape_device_v1::Shape::Crosshair;

/// Time the compositor gets to repaint without the overlay before the grab.
const SETTLE_DELAY: Duration = Duration::from_millis(150);

/// Maps a pointer position on the surface covering `origin` to global
/// logical coordinates.
pub fn surface_to_global(origin: Rect, surface_x: f64, surface_y: f64) -> Point {
    Point::new(surface_x, surface_y).offset(origin.x() as f64, origin.y() as f64)
}

/// Maps a global rectangle into the local coordinates of the surface covering
/// `origin`.
///
/// The result is not clipped, so a selection that started on another output
/// keeps its far edges off-surface and [`paint`] draws no border there.
pub fn global_to_surface(origin: Rect, rect: Rect) -> Rect {
    rect.translate(-origin.x(), -origin.y())
}

/// Paints one overlay frame into an ARGB8888 buffer.
///
/// `selection` is in surface-local coordinates and may extend past the
/// surface; it is clipped.
pub fn paint(buf: &mut [u8], width: u32, height: u32, stride: u32, selection: Option<Rect>) {
    let surface = Rect::new(0, 0, width as i32, height as i32);
    fill_rect(buf, stride, surface, surface, DIM_ARGB);

    let Some(sel) = selection.filter(|r| !r.is_empty()) else {
        return;
    };

    fill_rect(buf, stride, surface, sel, SELECTION_FILL_ARGB);

    let bw = BORDER_WIDTH.min(sel.width()).min(sel.height());
    let edges = [
        Rect::new(sel.x(), sel.y(), sel.width(), bw),
        Rect::new(sel.x(), sel.bottom() - bw, sel.width(), bw),
        Rect::new(sel.x(), sel.y(), bw, sel.height()),
        Rect::new(sel.right() - bw, sel.y(), bw, sel.height()),
    ];
    for edge in edges {
        fill_rect(buf, stride, surface, edge, BORDER_ARGB);
    }
}

fn fill_rect(buf: &mut [u8], stride: u32, surface: Rect, rect: Rect, argb: u32) {
    let Some(area) = rect.intersection(&surface) else {
        return;
    };
    let px = argb.to_le_bytes();
    let stride = stride as usize;

    for y in area.y()..area.bottom() {
        let row = y as usize * stride;
        let start = row + area.x() as usize * 4;
        let end = row + area.right() as usize * 4;
        if end > buf.len() {
            return;
        }
        for chunk in buf[start..end].chunks_exact_mut(4) {
            chunk.copy_from_slice(&px);
        }
    }
}

struct OverlaySurface {
    /// Logical geometry of the output this surface covers.
    origin: Rect,
    surface: WlSurface,
    layer_surface: ZwlrLayerSurfaceV1,
    buffer: Option<ShmBuffer>,
    configured: bool,
    /// A repaint was requested while the compositor held the buffer.
    dirty: bool,
    /// Part of the selection (global coords) visible in the last frame.
    shown: Option<Rect>,
}

struct OverlayState {
    shm: WlShm,
    pointer: Option<WlPointer>,
    keyboard: Option<WlKeyboard>,
    cursor_shape: Option<WpCursorShapeManagerV1>,
    cursor_device: Option<WpCursorShapeDeviceV1>,
    surfaces: Vec<OverlaySurface>,
    pointer_on: Option<usize>,
    cursor: Option<Point>,
    selection: Selection,
    error: Option<Error>,
}

impl OverlayState {
    fn is_finished(&self) -> bool {
        self.selection.is_finished() || self.error.is_some()
    }

    fn to_global(&self, idx: usize, surface_x: f64, surface_y: f64) -> Option<Point> {
        let origin = self.surfaces.get(idx)?.origin;
        Some(surface_to_global(origin, surface_x, surface_y))
    }

    fn redraw_all(&mut self) {
        for idx in 0..self.surfaces.len() {
            self.redraw(idx, false);
        }
    }

    fn redraw(&mut self, idx: usize, force: bool) {
        let selection = self.selection.current_rect();
        let Some(s) = self.surfaces.get_mut(idx) else {
            return;
        };
        if !s.configured {
            return;
        }
        let Some(buffer) = s.buffer.as_mut() else {
            return;
        };

        let visible = selection.and_then(|r| r.intersection(&s.origin));
        if !force && !s.dirty && visible == s.shown {
            return;
        }
        if buffer.busy {
            s.dirty = true;
            return;
        }

        let local = selection.map(|r| global_to_surface(s.origin, r));
        let (width, height, stride) = (buffer.width(), buffer.height(), buffer.stride());
        paint(buffer.pixels_mut(), width, height, stride, local);

        s.surface.attach(Some(buffer.wl_buffer()), 0, 0);
        s.surface.damage(0, 0, width as i32, height as i32);
        s.surface.commit();

        buffer.busy = true;
        s.dirty = false;
        s.shown = visible;
    }

    fn configure(&mut self, idx: usize, width: u32, height: u32, qh: &QueueHandle<Self>) {
        let Some(s) = self.surfaces.get_mut(idx) else {
            return;
        };

        // A zero size leaves the choice to us: use the output's logical size.
        let width = if width == 0 { s.origin.width() as u32 } else { width };
        let height = if height == 0 { s.origin.height() as u32 } else { height };

        let needs_buffer = s
            .buffer
            .as_ref()
            .map_or(true, |b| b.width() != width || b.height() != height);

        if needs_buffer {
            match ShmBuffer::new(
                &self.shm,
                qh,
                width,
                height,
                width * 4,
                wl_shm::Format::Argb8888,
                idx,
            ) {
                Ok(buffer) => s.buffer = Some(buffer),
                Err(e) => {
                    log::error!("Failed to create overlay buffer: {}", e);
                    self.error = Some(e);
                    return;
                }
            }
        }

        s.configured = true;
        self.redraw(idx, true);
    }

    fn hide(&mut self) {
        for s in self.surfaces.drain(..) {
            s.layer_surface.destroy();
            s.surface.destroy();
        }
        if let Some(device) = self.cursor_device.take() {
            device.destroy();
        }
        if let Some(manager) = self.cursor_shape.take() {
            manager.destroy();
        }
        if let Some(pointer) = self.pointer.take() {
            if pointer.version() >= 3 {
                pointer.release();
            }
        }
        if let Some(keyboard) = self.keyboard.take() {
            if keyboard.version() >= 3 {
                keyboard.release();
            }
        }
    }
}

/// Shows the overlay and blocks until the user finishes a drag or cancels.
///
/// Returns `None` when cancelled. The overlay is gone from the screen when
/// this returns.
pub(crate) fn select_region(conn: &Connection, outputs: &[Output]) -> Result<Option<Rect>> {
    let (globals, mut queue) = registry_queue_init::<OverlayState>(conn)
        .map_err(|e| Error::WaylandConnection(format!("Failed to initialize registry: {}", e)))?;
    let qh = queue.handle();

    let missing = |name: &str| Error::UnsupportedProtocol(format!("{} not available", name));
    let compositor = globals
        .bind::<WlCompositor, _, _>(&qh, 1..=4, ())
        .map_err(|_| missing("wl_compositor"))?;
    let shm = globals
        .bind::<WlShm, _, _>(&qh, 1..=1, ())
        .map_err(|_| missing("wl_shm"))?;
    let _seat = globals
        .bind::<WlSeat, _, _>(&qh, 1..=7, ())
        .map_err(|_| missing("wl_seat"))?;
    let layer_shell = globals
        .bind::<ZwlrLayerShellV1, _, _>(&qh, 1..=4, ())
        .map_err(|_| missing("zwlr_layer_shell_v1"))?;
    let cursor_shape = match globals.bind::<WpCursorShapeManagerV1, _, _>(&qh, 1..=1, ()) {
        Ok(manager) => Some(manager),
        Err(_) => {
            log::debug!("wp_cursor_shape_manager_v1 not available, keeping the default cursor");
            None
        }
    };

    let surfaces = outputs
        .iter()
        .enumerate()
        .map(|(idx, output)| {
            let surface = compositor.create_surface(&qh, ());
            let layer_surface = layer_shell.get_layer_surface(
                &surface,
                Some(&output.handle),
                zwlr_layer_shell_v1::Layer::Overlay,
                "minisnip".to_string(),
                &qh,
                idx,
            );
            layer_surface.set_anchor(zwlr_layer_surface_v1::Anchor::all());
            layer_surface.set_exclusive_zone(-1);
            layer_surface.set_keyboard_interactivity(
                zwlr_layer_surface_v1::KeyboardInteractivity::Exclusive,
            );
            layer_surface.set_size(0, 0);
            surface.commit();

            OverlaySurface {
                origin: output.geometry,
                surface,
                layer_surface,
                buffer: None,
                configured: false,
                dirty: false,
                shown: None,
            }
        })
        .collect();

    let mut state = OverlayState {
        shm,
        pointer: None,
        keyboard: None,
        cursor_shape,
        cursor_device: None,
        surfaces,
        pointer_on: None,
        cursor: None,
        selection: Selection::new(),
        error: None,
    };
    log::info!("Overlay shown on {} output(s)", state.surfaces.len());

    while !state.is_finished() {
        queue
            .blocking_dispatch(&mut state)
            .map_err(|e| Error::Overlay(format!("Failed to dispatch events: {}", e)))?;
    }

    state.hide();
    queue
        .roundtrip(&mut state)
        .map_err(|e| Error::Overlay(format!("Failed to hide overlay: {}", e)))?;
    std::thread::sleep(SETTLE_DELAY);

    if let Some(err) = state.error.take() {
        return Err(err);
    }
    Ok(state.selection.result())
}

impl Dispatch<WlRegistry, GlobalListContents> for OverlayState {
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

impl Dispatch<WlCompositor, ()> for OverlayState {
    fn event(
        _: &mut Self,
        _: &WlCompositor,
        _: <WlCompositor as Proxy>::Event,
        _: &(),
        _: &Connection,
        _: &QueueHandle<Self>,
    ) {
    }
}

impl Dispatch<WlShm, ()> for OverlayState {
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

impl Dispatch<WlShmPool, ()> for OverlayState {
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

impl Dispatch<WlSurface, ()> for OverlayState {
    fn event(
        _: &mut Self,
        _: &WlSurface,
        _: <WlSurface as Proxy>::Event,
        _: &(),
        _: &Connection,
        _: &QueueHandle<Self>,
    ) {
    }
}

impl Dispatch<ZwlrLayerShellV1, ()> for OverlayState {
    fn event(
        _: &mut Self,
        _: &ZwlrLayerShellV1,
        _: <ZwlrLayerShellV1 as Proxy>::Event,
        _: &(),
        _: &Connection,
        _: &QueueHandle<Self>,
    ) {
    }
}

impl Dispatch<WlBuffer, usize> for OverlayState {
    fn event(
        state: &mut Self,
        _: &WlBuffer,
        event: wl_buffer::Event,
        idx: &usize,
        _: &Connection,
        _: &QueueHandle<Self>,
    ) {
        if let wl_buffer::Event::Release = event {
            let Some(s) = state.surfaces.get_mut(*idx) else {
                return;
            };
            if let Some(buffer) = s.buffer.as_mut() {
                buffer.busy = false;
            }
            if s.dirty {
                state.redraw(*idx, true);
            }
        }
    }
}

impl Dispatch<ZwlrLayerSurfaceV1, usize> for OverlayState {
    fn event(
        state: &mut Self,
        layer_surface: &ZwlrLayerSurfaceV1,
        event: zwlr_layer_surface_v1::Event,
        idx: &usize,
        _: &Connection,
        qh: &QueueHandle<Self>,
    ) {
        match event {
            zwlr_layer_surface_v1::Event::Configure {
                serial,
                width,
                height,
            } => {
                log::debug!("Overlay surface {} configured: {}x{}", idx, width, height);
                layer_surface.ack_configure(serial);
                state.configure(*idx, width, height, qh);
            }
            zwlr_layer_surface_v1::Event::Closed => {
                log::warn!("Compositor closed overlay surface {}", idx);
                state.selection.cancel();
            }
            _ => {}
        }
    }
}

impl Dispatch<WlSeat, ()> for OverlayState {
    fn event(
        state: &mut Self,
        seat: &WlSeat,
        event: wl_seat::Event,
        _: &(),
        _: &Connection,
        qh: &QueueHandle<Self>,
    ) {
        if let wl_seat::Event::Capabilities {
            capabilities: WEnum::Value(caps),
        } = event
        {
            if caps.contains(wl_seat::Capability::Pointer) && state.pointer.is_none() {
                let pointer = seat.get_pointer(qh, ());
                state.cursor_device = state
                    .cursor_shape
                    .as_ref()
                    .map(|manager| manager.get_pointer(&pointer, qh, ()));
                state.pointer = Some(pointer);
            }
            if caps.contains(wl_seat::Capability::Keyboard) && state.keyboard.is_none() {
                state.keyboard = Some(seat.get_keyboard(qh, ()));
            }
        }
    }
}

impl Dispatch<WlPointer, ()> for OverlayState {
    fn event(
        state: &mut Self,
        _: &WlPointer,
        event: wl_pointer::Event,
        _: &(),
        _: &Connection,
        _: &QueueHandle<Self>,
    ) {
        match event {
            wl_pointer::Event::Enter {
                serial,
                surface,
                surface_x,
                surface_y,
            } => {
                // Without a shape device the compositor keeps whatever cursor it had.
                if let Some(device) = &state.cursor_device {
                    device.set_shape(serial, CURSOR_SHAPE);
                }
                state.pointer_on = state.surfaces.iter().position(|s| s.surface == surface);
                if let Some(idx) = state.pointer_on {
                    state.cursor = state.to_global(idx, surface_x, surface_y);
                }
            }
            wl_pointer::Event::Leave { .. } => {
                state.pointer_on = None;
            }
            wl_pointer::Event::Motion {
                surface_x,
                surface_y,
                ..
            } => {
                // While the button is held the compositor keeps sending motion
                // relative to the surface the drag started on, even past its edges.
                let Some(idx) = state.pointer_on else {
                    return;
                };
                state.cursor = state.to_global(idx, surface_x, surface_y);
                if let Some(at) = state.cursor {
                    if state.selection.motion(at).is_some() {
                        state.redraw_all();
                    }
                }
            }
            wl_pointer::Event::Button {
                button,
                state: button_state,
                ..
            } => {
                if button != BTN_LEFT {
                    return;
                }
                let Some(at) = state.cursor else {
                    return;
                };
                match button_state {
                    WEnum::Value(wl_pointer::ButtonState::Pressed) => {
                        state.selection.press(at);
                        state.redraw_all();
                    }
                    WEnum::Value(wl_pointer::ButtonState::Released) => {
                        if let Release::Discarded = state.selection.release(at) {
                            state.redraw_all();
                        }
                    }
                    _ => {}
                }
            }
            _ => {}
        }
    }
}

impl Dispatch<WpCursorShapeManagerV1, ()> for OverlayState {
    fn event(
        _: &mut Self,
        _: &WpCursorShapeManagerV1,
        _: <WpCursorShapeManagerV1 as Proxy>::Event,
        _: &(),
        _: &Connection,
        _: &QueueHandle<Self>,
    ) {
    }
}

impl Dispatch<WpCursorShapeDeviceV1, ()> for OverlayState {
    fn event(
        _: &mut Self,
        _: &WpCursorShapeDeviceV1,
        _: <WpCursorShapeDeviceV1 as Proxy>::Event,
        _: &(),
        _: &Connection,
        _: &QueueHandle<Self>,
    ) {
    }
}

impl Dispatch<WlKeyboard, ()> for OverlayState {
    fn event(
        state: &mut Self,
        _: &WlKeyboard,
        event: wl_keyboard::Event,
        _: &(),
        _: &Connection,
        _: &QueueHandle<Self>,
    ) {
        if let wl_keyboard::Event::Key {
            key,
            state: WEnum::Value(wl_keyboard::KeyState::Pressed),
            ..
        } = event
        {
            if key == KEY_ESC {
                state.selection.cancel();
            }
        }
    }
}
