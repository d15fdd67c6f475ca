//! Device Buffer Manager.
//!
//! Scoped acquisition of every device buffer one pipeline instance needs:
//! the raw sample buffer, the three stages' filter banks, the three
//! intermediate decimated outputs, and the host-side landing buffer for
//! the final stage. All allocations are per-instance and freed together
//! on teardown (`Drop`), never shared across instances.

use std::sync::Arc;

use cudarc::driver::{CudaDevice, CudaSlice};

use radar_dsp_core::error::DspError;

fn alloc_failure(what: &'static str) -> impl Fn(cudarc::driver::DriverError) -> DspError {
    move |_| DspError::AllocationFailure { what }
}

/// Complex samples are stored as interleaved `(re, im)` `f32` pairs, so a
/// buffer of `n` complex samples is `2 * n` floats wide (see
/// `kernel_source.rs`).
fn complex_floats(n: usize) -> usize {
    2 * n
}

/// Every device-side buffer one pipeline instance owns for the duration
/// of a sequence. Freed when dropped.
pub struct DeviceBufferSet {
    pub rf_samples_d: CudaSlice<f32>,
    pub first_stage_bp_filters_d: CudaSlice<f32>,
    pub second_stage_filters_d: CudaSlice<f32>,
    pub third_stage_filters_d: CudaSlice<f32>,
    pub stage1_out_d: CudaSlice<f32>,
    pub stage2_out_d: CudaSlice<f32>,
    pub stage3_out_d: CudaSlice<f32>,
}

impl DeviceBufferSet {
    /// Allocate every device buffer a sequence needs, sized from the
    /// sequence's own layout. Allocation failure here fails this sequence
    /// only: the caller reports and destroys the instance, the
    /// pipeline continues with the next sequence.
    #[allow(clippy::too_many_arguments)]
    pub fn allocate(
        device: &Arc<CudaDevice>,
        num_antennas: usize,
        samples_per_antenna: usize,
        stage1_num_freqs: usize,
        stage1_num_taps: usize,
        stage2_num_taps: usize,
        stage3_num_taps: usize,
        stage1_out_len: usize,
        stage2_out_len: usize,
        stage3_out_len: usize,
    ) -> Result<Self, DspError> {
        let rf_samples_d = device
            .alloc_zeros::<f32>(complex_floats(num_antennas * samples_per_antenna))
            .map_err(alloc_failure("rf_samples_d"))?;

        let first_stage_bp_filters_d = device
            .alloc_zeros::<f32>(complex_floats(stage1_num_freqs * stage1_num_taps))
            .map_err(alloc_failure("first_stage_bp_filters_d"))?;
        let second_stage_filters_d = device
            .alloc_zeros::<f32>(complex_floats(stage2_num_taps))
            .map_err(alloc_failure("second_stage_filters_d"))?;
        let third_stage_filters_d = device
            .alloc_zeros::<f32>(complex_floats(stage3_num_taps))
            .map_err(alloc_failure("third_stage_filters_d"))?;

        let stage1_out_d =
            device.alloc_zeros::<f32>(complex_floats(stage1_out_len)).map_err(alloc_failure("stage1_out_d"))?;
        let stage2_out_d =
            device.alloc_zeros::<f32>(complex_floats(stage2_out_len)).map_err(alloc_failure("stage2_out_d"))?;
        let stage3_out_d =
            device.alloc_zeros::<f32>(complex_floats(stage3_out_len)).map_err(alloc_failure("stage3_out_d"))?;

        Ok(Self {
            rf_samples_d,
            first_stage_bp_filters_d,
            second_stage_filters_d,
            third_stage_filters_d,
            stage1_out_d,
            stage2_out_d,
            stage3_out_d,
        })
    }
}

/// The pinned host buffer the final D->H copy lands in, page-locked via
/// `cuMemHostAlloc` (`cudarc::driver::result::malloc_host`) so the copy
/// engine can transfer into it without staging through a bounce buffer,
/// and so the D->H copy in `orchestrator.rs` can be issued asynchronously
/// rather than blocking the calling thread itself. `cudarc`'s safe
/// `CudaDevice` wrapper has no pinned-allocation call, so this drops to
/// its `result` tier the same way `launch.rs`'s kernel launch drops to an
/// `unsafe` call for the one thing the safe layer doesn't cover. Freed via
/// `cuMemFreeHost` on drop; lifetime scoped to one instance exactly like
/// the device buffers above.
pub struct PinnedHostOutput {
    ptr: std::ptr::NonNull<f32>,
    len: usize,
}

// The pointer is host memory owned exclusively by this struct; nothing
// about it is thread-affine.
unsafe impl Send for PinnedHostOutput {}

impl PinnedHostOutput {
    pub fn alloc(num_complex_samples: usize) -> Result<Self, DspError> {
        let len = complex_floats(num_complex_samples);
        // No special flags: page-locked, not portable across contexts,
        // not mapped into device address space - all this buffer needs.
        let raw = unsafe { cudarc::driver::result::malloc_host::<f32>(len, 0) }
            .map_err(alloc_failure("pinned_host_output"))?;
        let ptr = std::ptr::NonNull::new(raw).ok_or(DspError::AllocationFailure { what: "pinned_host_output" })?;
        unsafe { std::ptr::write_bytes(ptr.as_ptr(), 0, len) };
        Ok(Self { ptr, len })
    }

    pub fn as_interleaved_floats(&self) -> &[f32] {
        unsafe { std::slice::from_raw_parts(self.ptr.as_ptr(), self.len) }
    }

    pub fn as_interleaved_floats_mut(&mut self) -> &mut [f32] {
        unsafe { std::slice::from_raw_parts_mut(self.ptr.as_ptr(), self.len) }
    }
}

impl Drop for PinnedHostOutput {
    fn drop(&mut self) {
        if let Err(e) = unsafe { cudarc::driver::result::free_host(self.ptr.as_ptr().cast()) } {
            tracing::warn!(error = %e, "failed to free pinned host output buffer");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn complex_floats_doubles_sample_count() {
        assert_eq!(complex_floats(10), 20);
    }

    // `PinnedHostOutput::alloc` calls into the live CUDA driver
    // (`cuMemHostAlloc`) and so, like `DeviceBufferSet::allocate`, has no
    // unit test here; it needs a real device context. See the crate-level
    // note on GPU-resident code coverage.
}
