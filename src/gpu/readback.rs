// ============================================================================
// ASYNC GPU READBACK — double-buffered staging for stall-free presentation
// ============================================================================

use std::sync::mpsc;

use super::surface::OutputSurface;

const BYTES_PER_PIXEL: u32 = 16;

/// `width * 16` rounded up to wgpu's 256-byte row alignment.
pub fn padded_bytes_per_row(width: u32) -> u32 {
    let align = wgpu::COPY_BYTES_PER_ROW_ALIGNMENT;
    (width * BYTES_PER_PIXEL).div_ceil(align) * align
}

/// Metadata about what's in a pending readback buffer.
#[derive(Clone, Copy, Debug)]
struct ReadbackMeta {
    width: u32,
    height: u32,
    padded_bytes_per_row: u32,
}

enum MapStatus {
    Idle,
    Waiting,
    Ready(ReadbackMeta),
    Failed,
}

/// One completed readback: tightly packed RGBA f32 pixels.
pub struct ReadbackFrame {
    pub width: u32,
    pub height: u32,
    pub pixels: Vec<f32>,
}

/// Double-buffered async readback.  Never calls `Maintain::Wait`: each frame
/// reads the *previous* frame's staging buffer if its mapping has finished
/// while the GPU copies the current frame into the other one.
///
/// Flow per frame:
///   1. `try_read()`: non-blocking poll, take previous frame's pixels if ready
///   2. `enqueue_copy()`: copy the surface into the write buffer, submit,
///      start `map_async`, swap
pub struct AsyncReadback {
    buffers: [Option<wgpu::Buffer>; 2],
    write_idx: usize,
    buf_size: u64,
    read_pending: bool,
    read_rx: Option<mpsc::Receiver<Result<(), wgpu::BufferAsyncError>>>,
    read_meta: Option<ReadbackMeta>,
}

impl AsyncReadback {
    pub fn new() -> Self {
        Self {
            buffers: [None, None],
            write_idx: 0,
            buf_size: 0,
            read_pending: false,
            read_rx: None,
            read_meta: None,
        }
    }

    pub fn is_pending(&self) -> bool {
        self.read_pending
    }

    /// Ensure both staging buffers exist with at least `size` bytes.
    fn ensure_buffers(&mut self, device: &wgpu::Device, size: u64) {
        if self.buf_size >= size && self.buffers.iter().all(Option::is_some) {
            return;
        }
        // Old buffers are dropped below; a pending map on them is cancelled.
        self.cancel_pending();
        for (i, slot) in self.buffers.iter_mut().enumerate() {
            *slot = Some(device.create_buffer(&wgpu::BufferDescriptor {
                label: Some(if i == 0 { "readback_0" } else { "readback_1" }),
                size,
                usage: wgpu::BufferUsages::COPY_DST | wgpu::BufferUsages::MAP_READ,
                mapped_at_creation: false,
            }));
        }
        self.buf_size = size;
    }

    /// Copy `surface` into the current write buffer and start mapping it.
    /// Skipped while the other buffer is still waiting to be read, so at most
    /// one map is in flight.
    pub fn enqueue_copy(&mut self, device: &wgpu::Device, queue: &wgpu::Queue, surface: &OutputSurface) {
        if self.read_pending {
            return;
        }
        let (width, height) = (surface.width(), surface.height());
        let padded = padded_bytes_per_row(width);
        self.ensure_buffers(device, padded as u64 * height as u64);

        let Some(buf) = self.buffers[self.write_idx].as_ref() else {
            return;
        };

        let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("readback_encoder"),
        });
        encoder.copy_texture_to_buffer(
            wgpu::ImageCopyTexture {
                texture: &surface.texture,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            wgpu::ImageCopyBuffer {
                buffer: buf,
                layout: wgpu::ImageDataLayout {
                    offset: 0,
                    bytes_per_row: Some(padded),
                    rows_per_image: Some(height),
                },
            },
            wgpu::Extent3d {
                width,
                height,
                depth_or_array_layers: 1,
            },
        );
        queue.submit(std::iter::once(encoder.finish()));

        let (tx, rx) = mpsc::channel();
        buf.slice(..).map_async(wgpu::MapMode::Read, move |result| {
            let _ = tx.send(result);
        });

        self.write_idx = 1 - self.write_idx;
        self.read_pending = true;
        self.read_rx = Some(rx);
        self.read_meta = Some(ReadbackMeta {
            width,
            height,
            padded_bytes_per_row: padded,
        });
    }

    /// Where the in-flight map stands.  A map that can no longer complete
    /// (callback dropped, metadata lost) is cleared so copies resume.
    fn poll_status(&mut self) -> MapStatus {
        if !self.read_pending {
            return MapStatus::Idle;
        }
        let received = match self.read_rx.as_ref() {
            Some(rx) => rx.try_recv(),
            None => Err(mpsc::TryRecvError::Disconnected),
        };
        let status = match received {
            Ok(status) => status,
            Err(mpsc::TryRecvError::Empty) => return MapStatus::Waiting,
            Err(mpsc::TryRecvError::Disconnected) => {
                tracing::warn!("readback map callback dropped, discarding pending copy");
                self.cancel_pending();
                return MapStatus::Failed;
            }
        };

        let meta = self.read_meta.take();
        self.read_pending = false;
        self.read_rx = None;
        match (status, meta) {
            (Ok(()), Some(meta)) => MapStatus::Ready(meta),
            (Ok(()), None) => {
                tracing::warn!("readback finished without frame metadata");
                if let Some(buf) = self.buffers[1 - self.write_idx].as_ref() {
                    buf.unmap();
                }
                MapStatus::Failed
            }
            (Err(e), _) => {
                tracing::warn!(error = %e, "readback mapping failed");
                MapStatus::Failed
            }
        }
    }

    /// Non-blocking read of the previous copy.  Pumps callbacks with
    /// `Maintain::Poll` and returns `None` until the mapping completes.
    pub fn try_read(&mut self, device: &wgpu::Device) -> Option<ReadbackFrame> {
        if !self.read_pending {
            return None;
        }

        device.poll(wgpu::Maintain::Poll);

        let MapStatus::Ready(meta) = self.poll_status() else {
            return None;
        };
        let buf = self.buffers[1 - self.write_idx].as_ref()?;

        let slice = buf.slice(..);
        let mapped = slice.get_mapped_range();
        let padded = meta.padded_bytes_per_row as usize;
        let tight = (meta.width * BYTES_PER_PIXEL) as usize;
        let mut pixels = Vec::with_capacity(meta.width as usize * meta.height as usize * 4);
        for row in 0..meta.height as usize {
            let start = row * padded;
            pixels.extend_from_slice(bytemuck::cast_slice(&mapped[start..start + tight]));
        }
        drop(mapped);
        buf.unmap();

        Some(ReadbackFrame {
            width: meta.width,
            height: meta.height,
            pixels,
        })
    }

    /// Cancel any pending readback without reading data.
    pub fn cancel_pending(&mut self) {
        if self.read_pending {
            // Dropping the receiver ignores the map_async callback's result.
            self.read_rx = None;
            self.read_meta = None;
            self.read_pending = false;
        }
    }
}

impl Default for AsyncReadback {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rows_are_256_aligned() {
        assert_eq!(padded_bytes_per_row(1), 256);
        assert_eq!(padded_bytes_per_row(16), 256);
        assert_eq!(padded_bytes_per_row(17), 512);
        assert_eq!(padded_bytes_per_row(1000), 16128);
        assert_eq!(padded_bytes_per_row(1024), 16384);
    }

    #[test]
    fn fresh_readback_has_nothing_pending() {
        let mut rb = AsyncReadback::new();
        assert!(!rb.is_pending());
        assert!(matches!(rb.poll_status(), MapStatus::Idle));
    }

    fn pending(rb: &mut AsyncReadback) -> mpsc::Sender<Result<(), wgpu::BufferAsyncError>> {
        let (tx, rx) = mpsc::channel();
        rb.read_pending = true;
        rb.read_rx = Some(rx);
        rb.read_meta = Some(ReadbackMeta {
            width: 4,
            height: 2,
            padded_bytes_per_row: padded_bytes_per_row(4),
        });
        tx
    }

    #[test]
    fn waiting_map_stays_pending() {
        let mut rb = AsyncReadback::new();
        let _tx = pending(&mut rb);
        assert!(matches!(rb.poll_status(), MapStatus::Waiting));
        assert!(rb.is_pending());
    }

    #[test]
    fn dropped_callback_unblocks_copies() {
        let mut rb = AsyncReadback::new();
        drop(pending(&mut rb));
        assert!(matches!(rb.poll_status(), MapStatus::Failed));
        assert!(!rb.is_pending());
        assert!(rb.read_rx.is_none());
        assert!(rb.read_meta.is_none());
    }

    #[test]
    fn completed_map_yields_its_metadata() {
        let mut rb = AsyncReadback::new();
        let tx = pending(&mut rb);
        tx.send(Ok(())).unwrap();
        match rb.poll_status() {
            MapStatus::Ready(meta) => assert_eq!((meta.width, meta.height), (4, 2)),
            _ => panic!("map should be ready"),
        }
        assert!(!rb.is_pending());
    }

    #[test]
    fn lost_metadata_is_a_failed_read() {
        let mut rb = AsyncReadback::new();
        let tx = pending(&mut rb);
        rb.read_meta = None;
        tx.send(Ok(())).unwrap();
        assert!(matches!(rb.poll_status(), MapStatus::Failed));
        assert!(!rb.is_pending());
    }
}
