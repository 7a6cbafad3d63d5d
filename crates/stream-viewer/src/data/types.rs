//! GPU-side data types for the stream viewer.

use super::point_cloud::PointCloud;

/// Per-frame uniform, respecting std140 layout.
/// Must match `PointUniform` in the points shader.
#[repr(C)]
#[derive(Clone, Copy, bytemuck::Pod, bytemuck::Zeroable, Debug)]
pub struct PointUniformStd140 {
    /// World → view transform.
    pub view: [[f32; 4]; 4],
    /// View → clip transform, depth in [0, 1].
    pub proj: [[f32; 4]; 4],
    /// Linear RGBA point colour.
    pub color: [f32; 4],
    /// Side length of each point quad in world units.
    pub point_size: f32,
    pub _pad: [f32; 3],
}

// Buffer size must match the WGSL struct (148 B rounded up to 16).
const _: [(); 160] = [(); core::mem::size_of::<PointUniformStd140>()];

/// Bytes per streamed point: `vec3<f32>`.
pub const POINT_STRIDE: u64 = 12;

/// Smallest vertex buffer ever allocated, in points.
const MIN_CAPACITY: u64 = 1024;

/// GPU mirror of a [`PointCloud`]. The vertex buffer only grows; smaller
/// clouds are written into the front of it.
#[derive(Debug)]
pub struct PointCloudGpu {
    /// Vertex buffer of tightly packed `[f32; 3]` positions.
    pub vtx: wgpu::Buffer,
    /// Points the buffer can hold.
    pub capacity: u64,
    /// Points currently valid in `vtx`.
    pub len: u32,
}

impl PointCloudGpu {
    pub fn new(device: &wgpu::Device) -> Self {
        Self {
            vtx: Self::create_vtx(device, MIN_CAPACITY),
            capacity: MIN_CAPACITY,
            len: 0,
        }
    }

    /// Copies the cloud to the GPU if it changed since the last upload.
    /// Clouds larger than the device's biggest buffer are drawn truncated.
    /// Returns whether anything was written.
    pub fn sync(&mut self, device: &wgpu::Device, queue: &wgpu::Queue, cloud: &mut PointCloud) -> bool {
        if !cloud.needs_update() {
            return false;
        }

        let limit = max_points(device.limits().max_buffer_size);
        let count = cloud.point_count() as u64;
        let drawn = count.min(limit);
        if drawn < count {
            log::warn!(
                "Cloud of {} points exceeds the GPU buffer limit; drawing the first {}",
                count,
                drawn
            );
        }

        if drawn > self.capacity {
            let capacity = grown_capacity(drawn, limit);
            log::debug!("Growing point buffer {} -> {} points", self.capacity, capacity);
            self.vtx = Self::create_vtx(device, capacity);
            self.capacity = capacity;
        }

        if drawn > 0 {
            let floats = drawn as usize * 3;
            queue.write_buffer(&self.vtx, 0, bytemuck::cast_slice(&cloud.vertices()[..floats]));
        }
        self.len = drawn as u32;
        cloud.mark_uploaded();

        true
    }

    fn create_vtx(device: &wgpu::Device, capacity: u64) -> wgpu::Buffer {
        device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Point Cloud Vertices"),
            size: capacity * POINT_STRIDE,
            usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        })
    }
}

/// Points that fit in one buffer of `max_buffer_size` bytes and can still be
/// counted by a `u32` draw call.
fn max_points(max_buffer_size: u64) -> u64 {
    (max_buffer_size / POINT_STRIDE).min(u32::MAX as u64)
}

/// Next capacity for `needed` points: doubled, but never past `limit`.
fn grown_capacity(needed: u64, limit: u64) -> u64 {
    needed
        .checked_next_power_of_two()
        .unwrap_or(limit)
        .clamp(needed, limit)
}

#[cfg(test)]
mod tests {
    use super::*;

    const DOWNLEVEL_MAX_BUFFER: u64 = 1 << 28;

    #[test]
    fn capacity_doubles_below_limit() {
        let limit = max_points(DOWNLEVEL_MAX_BUFFER);
        assert_eq!(grown_capacity(1025, limit), 2048);
        assert_eq!(grown_capacity(4096, limit), 4096);
    }

    #[test]
    fn capacity_never_exceeds_buffer_limit() {
        let limit = max_points(DOWNLEVEL_MAX_BUFFER);
        assert_eq!(limit, 22_369_621);

        // 2^24 + 1 points would double to 402 MB.
        let needed = (1 << 24) + 1;
        assert_eq!(grown_capacity(needed, limit), limit);
        assert!(grown_capacity(needed, limit) * POINT_STRIDE <= DOWNLEVEL_MAX_BUFFER);

        // A cloud that fits exactly is not rejected by the doubling.
        assert_eq!(grown_capacity(limit, limit), limit);
    }

    #[test]
    fn point_limit_fits_a_draw_call() {
        assert_eq!(max_points(u64::MAX), u32::MAX as u64);
    }
}
