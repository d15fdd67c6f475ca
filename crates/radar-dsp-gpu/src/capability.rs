//! GPU Capability Probe.
//!
//! Read once per device at start-up and consulted by kernel-variant
//! selection and by the device buffer manager's shared-memory admission
//! check.

use std::sync::Arc;

use cudarc::driver::sys::CUdevice_attribute;
use cudarc::driver::CudaDevice;

use radar_dsp_core::error::DspError;

#[derive(Debug, Clone, Copy)]
pub struct GpuCapabilities {
    pub max_threads_per_block: u32,
    pub shared_mem_per_block_bytes: u32,
    pub warp_size: u32,
    pub memory_clock_khz: u32,
    pub global_memory_bus_width_bits: u32,
}

impl GpuCapabilities {
    /// Query a live device's attributes. `ordinal` selects which
    /// physical GPU to enumerate.
    pub fn probe(ordinal: usize) -> Result<(Arc<CudaDevice>, Self), DspError> {
        let device = CudaDevice::new(ordinal).map_err(|e| DspError::DeviceLost { reason: e.to_string() })?;

        let attr = |a: CUdevice_attribute| -> Result<u32, DspError> {
            device
                .attribute(a)
                .map(|v| v as u32)
                .map_err(|e| DspError::DeviceLost { reason: e.to_string() })
        };

        let caps = GpuCapabilities {
            max_threads_per_block: attr(CUdevice_attribute::CU_DEVICE_ATTRIBUTE_MAX_THREADS_PER_BLOCK)?,
            shared_mem_per_block_bytes: attr(CUdevice_attribute::CU_DEVICE_ATTRIBUTE_MAX_SHARED_MEMORY_PER_BLOCK)?,
            warp_size: attr(CUdevice_attribute::CU_DEVICE_ATTRIBUTE_WARP_SIZE)?,
            memory_clock_khz: attr(CUdevice_attribute::CU_DEVICE_ATTRIBUTE_MEMORY_CLOCK_RATE)?,
            global_memory_bus_width_bits: attr(CUdevice_attribute::CU_DEVICE_ATTRIBUTE_GLOBAL_MEMORY_BUS_WIDTH)?,
        };

        tracing::info!(
            ordinal,
            max_threads_per_block = caps.max_threads_per_block,
            shared_mem_per_block_bytes = caps.shared_mem_per_block_bytes,
            warp_size = caps.warp_size,
            "probed GPU capabilities"
        );

        Ok((device, caps))
    }

    /// Bytes of dynamic shared memory a stage's launch would need, given
    /// `num_freqs` rows of `num_taps_per_filter` complex taps each. Used
    /// by the buffer manager's admission check.
    pub fn shared_mem_required_bytes(num_freqs: usize, num_taps_per_filter: usize) -> u64 {
        const COMPLEX_SIZE_BYTES: u64 = 8; // two f32 lanes
        num_freqs as u64 * num_taps_per_filter as u64 * COMPLEX_SIZE_BYTES
    }

    /// Reject a launch whose required shared memory would exceed the
    /// device's per-block capacity. Fatal for the sequence that
    /// requested it, not for the process.
    pub fn check_shared_mem_budget(&self, num_freqs: usize, num_taps_per_filter: usize) -> Result<(), DspError> {
        let required = Self::shared_mem_required_bytes(num_freqs, num_taps_per_filter);
        if required > self.shared_mem_per_block_bytes as u64 {
            return Err(DspError::KernelConfigInvalid {
                reason: format!(
                    "stage requires {} bytes of shared memory, device allows {}",
                    required, self.shared_mem_per_block_bytes
                ),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shared_mem_required_bytes_matches_layout_formula() {
        assert_eq!(GpuCapabilities::shared_mem_required_bytes(4, 256), 4 * 256 * 8);
    }

    #[test]
    fn rejects_oversized_shared_mem_request() {
        let caps = GpuCapabilities {
            max_threads_per_block: 1024,
            shared_mem_per_block_bytes: 1024,
            warp_size: 32,
            memory_clock_khz: 1_000_000,
            global_memory_bus_width_bits: 256,
        };
        assert!(caps.check_shared_mem_budget(4, 256).is_err());
        assert!(caps.check_shared_mem_budget(1, 16).is_ok());
    }
}
