use crate::{Error, Rect, Result};
use wayland_client::{
    globals::{registry_queue_init, GlobalListContents},
    protocol::{
        wl_output::{self, WlOutput},
        wl_registry::WlRegistry,
    },
    Connection, Dispatch, Proxy, QueueHandle, WEnum,
};
use wayland_protocols::xdg::xdg_output::zv1::client::{
    zxdg_output_manager_v1::ZxdgOutputManagerV1,
    zxdg_output_v1::{self, ZxdgOutputV1},
};

/// A monitor as the compositor lays it out in the global logical space.
#[derive(Debug, Clone)]
pub struct Output {
    pub name: String,
    pub geometry: Rect,
    pub scale: i32,
    pub(crate) handle: WlOutput,
}

#[derive(Debug, Clone)]
struct OutputInfo {
    name: Option<String>,
    position: (i32, i32),
    mode_size: (i32, i32),
    transform: wl_output::Transform,
    scale: i32,
    logical_position: Option<(i32, i32)>,
    logical_size: Option<(i32, i32)>,
}

impl Default for OutputInfo {
    fn default() -> Self {
        Self {
            name: None,
            position: (0, 0),
            mode_size: (0, 0),
            transform: wl_output::Transform::Normal,
            scale: 1,
            logical_position: None,
            logical_size: None,
        }
    }
}

impl OutputInfo {
    /// xdg-output's logical box when we have it, otherwise derived from the
    /// current mode, scale and transform.
    fn logical_geometry(&self) -> Rect {
        let (x, y) = self.logical_position.unwrap_or(self.position);

        let (width, height) = self.logical_size.unwrap_or_else(|| {
            let scale = self.scale.max(1);
            let (w, h) = (self.mode_size.0 / scale, self.mode_size.1 / scale);
            match self.transform {
                wl_output::Transform::_90
                | wl_output::Transform::_270
                | wl_output::Transform::Flipped90
                | wl_output::Transform::Flipped270 => (h, w),
                _ => (w, h),
            }
        });

        Rect::new(x, y, width, height)
    }
}

#[derive(Default)]
struct OutputState {
    infos: Vec<OutputInfo>,
}

/// Lists the compositor's outputs with their logical geometry.
pub(crate) fn enumerate(conn: &Connection) -> Result<Vec<Output>> {
    let (globals, mut queue) = registry_queue_init::<OutputState>(conn)
        .map_err(|e| Error::WaylandConnection(format!("Failed to initialize registry: {}", e)))?;
    let qh = queue.handle();
    let mut state = OutputState::default();

    let output_globals: Vec<(u32, u32)> = globals.contents().with_list(|list| {
        list.iter()
            .filter(|global| global.interface == WlOutput::interface().name)
            .map(|global| (global.name, global.version))
            .collect()
    });

    let mut handles = Vec::with_capacity(output_globals.len());
    for (idx, (name, version)) in output_globals.into_iter().enumerate() {
        let handle = globals
            .registry()
            .bind::<WlOutput, _, _>(name, version.min(4), &qh, idx);
        state.infos.push(OutputInfo::default());
        handles.push(handle);
    }

    if handles.is_empty() {
        return Err(Error::NoOutputs);
    }

    queue
        .roundtrip(&mut state)
        .map_err(|e| Error::WaylandConnection(format!("Failed to get output information: {}", e)))?;

    match globals.bind::<ZxdgOutputManagerV1, _, _>(&qh, 1..=3, ()) {
        Ok(manager) => {
            let xdg_outputs: Vec<ZxdgOutputV1> = handles
                .iter()
                .enumerate()
                .map(|(idx, handle)| manager.get_xdg_output(handle, &qh, idx))
                .collect();
            queue.roundtrip(&mut state).map_err(|e| {
                Error::WaylandConnection(format!("Failed to get xdg-output information: {}", e))
            })?;
            for xdg_output in xdg_outputs {
                xdg_output.destroy();
            }
            manager.destroy();
        }
        Err(_) => {
            log::warn!("zxdg_output_manager_v1 not available, deriving layout from wl_output");
        }
    }

    let outputs: Vec<Output> = state
        .infos
        .iter()
        .zip(handles)
        .enumerate()
        .map(|(idx, (info, handle))| Output {
            name: info
                .name
                .clone()
                .unwrap_or_else(|| format!("output-{}", idx)),
            geometry: info.logical_geometry(),
            scale: info.scale.max(1),
            handle,
        })
        .filter(|output| !output.geometry.is_empty())
        .collect();

    for output in &outputs {
        log::info!(
            "Output {}: {} (scale {})",
            output.name,
            output.geometry,
            output.scale
        );
    }

    if outputs.is_empty() {
        return Err(Error::NoOutputs);
    }
    Ok(outputs)
}

impl Dispatch<WlRegistry, GlobalListContents> for OutputState {
    fn event(
        _: &mut Self,
        _: &WlRegistry,
        _: <WlRegistry as Proxy>::Event,
        _: &GlobalListContents,
        _: &Connection,
        _: &QueueHandle<Self>,
    ) {
        // Hotplug during a single snip is not tracked.
    }
}

impl Dispatch<WlOutput, usize> for OutputState {
    fn event(
        state: &mut Self,
        _: &WlOutput,
        event: wl_output::Event,
        idx: &usize,
        _: &Connection,
        _: &QueueHandle<Self>,
    ) {
        let Some(info) = state.infos.get_mut(*idx) else {
            return;
        };

        match event {
            wl_output::Event::Geometry { x, y, transform, .. } => {
                info.position = (x, y);
                if let WEnum::Value(transform) = transform {
                    info.transform = transform;
                }
            }
            wl_output::Event::Mode {
                flags,
                width,
                height,
                ..
            } => {
                if let WEnum::Value(flags) = flags {
                    if flags.contains(wl_output::Mode::Current) {
                        info.mode_size = (width, height);
                    }
                }
            }
            wl_output::Event::Scale { factor } => {
                info.scale = factor;
            }
            wl_output::Event::Name { name } => {
                info.name = Some(name);
            }
            _ => {}
        }
    }
}

impl Dispatch<ZxdgOutputManagerV1, ()> for OutputState {
    fn event(
        _: &mut Self,
        _: &ZxdgOutputManagerV1,
        _: <ZxdgOutputManagerV1 as Proxy>::Event,
        _: &(),
        _: &Connection,
        _: &QueueHandle<Self>,
    ) {
    }
}

impl Dispatch<ZxdgOutputV1, usize> for OutputState {
    fn event(
        state: &mut Self,
        _: &ZxdgOutputV1,
        event: zxdg_output_v1::Event,
        idx: &usize,
        _: &Connection,
        _: &QueueHandle<Self>,
    ) {
        let Some(info) = state.infos.get_mut(*idx) else {
            return;
        };

        match event {
            zxdg_output_v1::Event::LogicalPosition { x, y } => {
                info.logical_position = Some((x, y));
            }
            zxdg_output_v1::Event::LogicalSize { width, height } => {
                info.logical_size = Some((width, height));
            }
            zxdg_output_v1::Event::Name { name } => {
                if info.name.is_none() {
                    info.name = Some(name);
                }
            }
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn logical_geometry_prefers_xdg_output() {
        let info = OutputInfo {
            position: (0, 0),
            mode_size: (3840, 2160),
            scale: 2,
            logical_position: Some((1920, 0)),
            logical_size: Some((2560, 1440)),
            ..Default::default()
        };
        assert_eq!(info.logical_geometry(), Rect::new(1920, 0, 2560, 1440));
    }

    #[test]
    fn logical_geometry_divides_mode_by_scale() {
        let info = OutputInfo {
            position: (-1920, 0),
            mode_size: (3840, 2160),
            scale: 2,
            ..Default::default()
        };
        assert_eq!(info.logical_geometry(), Rect::new(-1920, 0, 1920, 1080));
    }

    #[test]
    fn logical_geometry_swaps_for_rotated_outputs() {
        let info = OutputInfo {
            mode_size: (1920, 1080),
            transform: wl_output::Transform::_90,
            ..Default::default()
        };
        assert_eq!(info.logical_geometry(), Rect::new(0, 0, 1080, 1920));
    }
}
