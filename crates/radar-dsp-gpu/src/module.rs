//! Compiles and loads the two decimation kernel variants once per device,
//! at start-up, the same "probe once" lifecycle the capability probe
//! follows: kernel source never changes per-sequence, only the launch
//! geometry does.

use std::sync::Arc;

use cudarc::driver::{CudaDevice, CudaFunction};
use cudarc::nvrtc::compile_ptx;

use radar_dsp_core::error::DspError;

use crate::kernel_source::{
    LARGE_VARIANT_ENTRY_POINT, LARGE_VARIANT_SRC, SMALL_VARIANT_ENTRY_POINT, SMALL_VARIANT_SRC,
};

const MODULE_NAME: &str = "radar_dsp_decimate";

/// Both compiled kernel entry points, resident on one device for the
/// lifetime of the process. A pipeline instance never compiles or loads
/// anything itself; it only looks up a function handle here and launches
/// it with its own geometry.
pub struct DecimationModule {
    small: CudaFunction,
    large: CudaFunction,
}

impl DecimationModule {
    pub fn load(device: &Arc<CudaDevice>) -> Result<Self, DspError> {
        let small_ptx = compile_ptx(SMALL_VARIANT_SRC)
            .map_err(|e| DspError::KernelConfigInvalid { reason: format!("failed to compile small-variant kernel: {e}") })?;
        let large_ptx = compile_ptx(LARGE_VARIANT_SRC)
            .map_err(|e| DspError::KernelConfigInvalid { reason: format!("failed to compile large-variant kernel: {e}") })?;

        device
            .load_ptx(small_ptx, MODULE_NAME, &[SMALL_VARIANT_ENTRY_POINT])
            .map_err(|e| DspError::DeviceLost { reason: format!("failed to load small-variant module: {e}") })?;
        device
            .load_ptx(large_ptx, MODULE_NAME, &[LARGE_VARIANT_ENTRY_POINT])
            .map_err(|e| DspError::DeviceLost { reason: format!("failed to load large-variant module: {e}") })?;

        let small = device
            .get_func(MODULE_NAME, SMALL_VARIANT_ENTRY_POINT)
            .ok_or_else(|| DspError::DeviceLost { reason: "small-variant kernel function not found after load".to_string() })?;
        let large = device
            .get_func(MODULE_NAME, LARGE_VARIANT_ENTRY_POINT)
            .ok_or_else(|| DspError::DeviceLost { reason: "large-variant kernel function not found after load".to_string() })?;

        Ok(Self { small, large })
    }

    /// A cheap handle to the compiled function for `variant`; `CudaFunction`
    /// is a lightweight reference into the loaded module, so cloning it
    /// per-launch (to hand an owned value to `LaunchAsync`) is free.
    pub fn function(&self, variant: crate::launch::KernelVariant) -> CudaFunction {
        match variant {
            crate::launch::KernelVariant::Small => self.small.clone(),
            crate::launch::KernelVariant::Large => self.large.clone(),
        }
    }
}
