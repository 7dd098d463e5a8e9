//! Size checks applied before textures or frames are allocated.

/// Capacity of a render backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GpuLimits {
    /// Largest atlas edge in texels.
    pub max_texture_dim: u32,
    /// Largest single buffer binding.
    pub max_buffer_bytes: u64,
    /// Memory the backend may spend on volumes and frames.
    pub available_memory: u64,
}

impl Default for GpuLimits {
    /// Conservative values for an unknown device.
    fn default() -> Self {
        Self {
            max_texture_dim: 16 * 1024,
            max_buffer_bytes: 256 << 20,
            available_memory: 2 << 30,
        }
    }
}

impl GpuLimits {
    /// Limits of host memory: no per-texture or per-buffer caps.
    pub fn host(available_memory: u64) -> Self {
        Self { max_texture_dim: u32::MAX, max_buffer_bytes: u64::MAX, available_memory }
    }

    /// Whether an atlas of this size can be uploaded.
    pub fn fits_texture(&self, width: u32, height: u32) -> bool {
        width.max(height) <= self.max_texture_dim
    }

    /// Whether one buffer of `bytes` fits a binding and half of the memory.
    pub fn fits_buffer(&self, bytes: u64) -> bool {
        bytes <= self.max_buffer_bytes.min(self.available_memory / 2)
    }

    /// Bytes needed for an RGBA32F frame.
    pub fn frame_bytes(width: u32, height: u32) -> u64 {
        u64::from(width) * u64::from(height) * 16
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fits() {
        let l = GpuLimits::default();
        assert!(l.fits_texture(16384, 100));
        assert!(!l.fits_texture(16385, 100));
        assert!(l.fits_buffer(GpuLimits::frame_bytes(1024, 1024)));
        assert!(!l.fits_buffer(u64::MAX));
    }

    #[test]
    fn test_host_limits_only_bound_memory() {
        let l = GpuLimits::host(1 << 30);
        assert!(l.fits_texture(100_000, 100_000));
        assert!(l.fits_buffer(512 << 20));
        assert!(!l.fits_buffer((512 << 20) + 1));
    }
}
