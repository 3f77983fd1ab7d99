use crate::{Error, Result};
use memmap2::MmapMut;
use std::fs::File;
use std::os::fd::AsFd;
use wayland_client::{
    protocol::{
        wl_buffer::WlBuffer,
        wl_shm::{self, WlShm},
        wl_shm_pool::WlShmPool,
    },
    Dispatch, QueueHandle,
};

/// A `wl_buffer` backed by an anonymous temp file mapped into our address space.
pub(crate) struct ShmBuffer {
    _file: File,
    mmap: MmapMut,
    pool: WlShmPool,
    buffer: WlBuffer,
    width: u32,
    height: u32,
    stride: u32,
    /// Set after attach, cleared on `wl_buffer.release`.
    pub busy: bool,
}

impl ShmBuffer {
    /// `tag` becomes the buffer's user data so release events can be routed.
    pub fn new<D>(
        shm: &WlShm,
        qh: &QueueHandle<D>,
        width: u32,
        height: u32,
        stride: u32,
        format: wl_shm::Format,
        tag: usize,
    ) -> Result<Self>
    where
        D: Dispatch<WlShmPool, ()> + Dispatch<WlBuffer, usize> + 'static,
    {
        let size = (stride as usize)
            .checked_mul(height as usize)
            .filter(|&size| size > 0 && size <= i32::MAX as usize)
            .ok_or_else(|| {
                Error::BufferCreation(format!(
                    "invalid buffer size {}x{} (stride {})",
                    width, height, stride
                ))
            })?;

        let file = tempfile::tempfile().map_err(|e| Error::IoWithContext {
            operation: "creating shm backing file".to_string(),
            source: e,
        })?;
        file.set_len(size as u64).map_err(|e| Error::IoWithContext {
            operation: format!("resizing shm backing file to {} bytes", size),
            source: e,
        })?;

        let mmap = unsafe {
            MmapMut::map_mut(&file)
                .map_err(|e| Error::BufferCreation(format!("mmap failed: {}", e)))?
        };

        let pool = shm.create_pool(file.as_fd(), size as i32, qh, ());
        let buffer = pool.create_buffer(
            0,
            width as i32,
            height as i32,
            stride as i32,
            format,
            qh,
            tag,
        );

        Ok(Self {
            _file: file,
            mmap,
            pool,
            buffer,
            width,
            height,
            stride,
            busy: false,
        })
    }

    pub fn wl_buffer(&self) -> &WlBuffer {
        &self.buffer
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn stride(&self) -> u32 {
        self.stride
    }

    pub fn pixels(&self) -> &[u8] {
        &self.mmap[..]
    }

    pub fn pixels_mut(&mut self) -> &mut [u8] {
        &mut self.mmap[..]
    }
}

impl Drop for ShmBuffer {
    fn drop(&mut self) {
        self.buffer.destroy();
        self.pool.destroy();
    }
}
