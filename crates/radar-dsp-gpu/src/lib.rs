//! GPU-facing components of the decimation pipeline: the device buffer
//! manager, the decimation kernels and their launch geometry, the
//! parallel reduction primitive, the GPU capability probe, and the
//! module/event wrappers the orchestrator drives them through.
//!
//! `reference` and `reduction` additionally provide a scalar CPU model of
//! the same algorithm, used by this crate's and the pipeline crate's unit
//! tests in place of a CUDA device.

pub mod buffers;
pub mod capability;
pub mod events;
pub mod kernel_source;
pub mod launch;
pub mod module;
pub mod reduction;
pub mod reference;

pub use buffers::{DeviceBufferSet, PinnedHostOutput};
pub use capability::GpuCapabilities;
pub use events::StageEvents;
pub use launch::{build_launch_geometry, select_kernel_variant, KernelVariant, LaunchGeometry};
pub use module::DecimationModule;
pub use reduction::simulate_block_reduction;
pub use reference::cpu_decimate_stage;
