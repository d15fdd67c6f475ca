//! The three timing markers a pipeline instance records on its stream:
//! `initial_start`, `kernel_start` and `stop`. Wraps `cudarc`'s driver
//! events the same thin way `buffers.rs` wraps device allocations — one
//! struct per instance, freed when the instance is.

use std::sync::Arc;

use cudarc::driver::{CudaDevice, CudaEvent, CudaStream};

use radar_dsp_core::error::DspError;

fn event_failure(reason: &'static str) -> impl Fn(cudarc::driver::DriverError) -> DspError {
    move |e| DspError::AsyncCopyError { reason: format!("{reason}: {e}") }
}

/// The three events of one pipeline instance, in the order they are
/// recorded: `initial_start` before the H->D copy is enqueued,
/// `kernel_start` once the copy-complete callback fires, `stop` after
/// the final D->H copy is enqueued.
pub struct StageEvents {
    pub initial_start: CudaEvent,
    pub kernel_start: CudaEvent,
    pub stop: CudaEvent,
}

impl StageEvents {
    pub fn create(device: &Arc<CudaDevice>) -> Result<Self, DspError> {
        Ok(Self {
            initial_start: device.new_event(None).map_err(event_failure("failed to create initial_start event"))?,
            kernel_start: device.new_event(None).map_err(event_failure("failed to create kernel_start event"))?,
            stop: device.new_event(None).map_err(event_failure("failed to create stop event"))?,
        })
    }

    pub fn record_initial_start(&self, stream: &CudaStream) -> Result<(), DspError> {
        self.initial_start.record(stream).map_err(event_failure("failed to record initial_start"))
    }

    pub fn record_kernel_start(&self, stream: &CudaStream) -> Result<(), DspError> {
        self.kernel_start.record(stream).map_err(event_failure("failed to record kernel_start"))
    }

    pub fn record_stop(&self, stream: &CudaStream) -> Result<(), DspError> {
        self.stop.record(stream).map_err(event_failure("failed to record stop"))
    }

    /// Block the calling (finalisation worker) thread until `stop` has
    /// completed on the device.
    pub fn synchronize_stop(&self) -> Result<(), DspError> {
        self.stop.synchronize().map_err(event_failure("failed to synchronize stop event"))
    }

    /// Total elapsed time from `initial_start` to `stop`, in milliseconds.
    /// Must be called after `synchronize_stop`.
    pub fn total_elapsed_ms(&self) -> Result<f32, DspError> {
        self.initial_start.elapsed_ms(&self.stop).map_err(event_failure("failed to compute total elapsed time"))
    }

    /// Kernel-only elapsed time from `kernel_start` to `stop`, in
    /// milliseconds. Reported to the timing channel as the back-pressure
    /// signal downstream consumers throttle on.
    pub fn kernel_elapsed_ms(&self) -> Result<f32, DspError> {
        self.kernel_start.elapsed_ms(&self.stop).map_err(event_failure("failed to compute kernel elapsed time"))
    }
}
