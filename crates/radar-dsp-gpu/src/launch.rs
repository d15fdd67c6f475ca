//! Kernel launch geometry and variant selection.

use radar_dsp_core::error::DspError;

use crate::capability::GpuCapabilities;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KernelVariant {
    /// `num_taps * num_freqs <= maxThreadsPerBlock`; one thread per (tap,
    /// frequency) pair.
    Small,
    /// `maxThreadsPerBlock < num_taps * num_freqs <= 2 * maxThreadsPerBlock`;
    /// each thread handles two adjacent taps.
    Large,
}

#[derive(Debug, Clone, Copy)]
pub struct LaunchGeometry {
    pub variant: KernelVariant,
    pub grid_x: u32,
    pub grid_y: u32,
    pub block_x: u32,
    pub block_y: u32,
    pub shared_mem_bytes: u32,
}

/// Choose the small or large kernel variant for a stage, or reject the
/// configuration outright when `num_taps * num_freqs` exceeds twice
/// `maxThreadsPerBlock`.
pub fn select_kernel_variant(
    num_taps: usize,
    num_freqs: usize,
    caps: &GpuCapabilities,
) -> Result<KernelVariant, DspError> {
    let total = num_taps * num_freqs;
    let max = caps.max_threads_per_block as usize;
    if total > 2 * max {
        return Err(DspError::KernelConfigInvalid {
            reason: format!("num_taps * num_freqs ({total}) exceeds 2x maxThreadsPerBlock ({max})"),
        });
    }
    if total > max {
        Ok(KernelVariant::Large)
    } else {
        Ok(KernelVariant::Small)
    }
}

/// Build the full launch geometry for one stage over `samples_per_antenna`
/// input samples, `num_antennas` channels, a filter bank of `num_freqs x
/// num_taps`, and decimation rate `dm_rate`.
pub fn build_launch_geometry(
    samples_per_antenna: usize,
    num_antennas: usize,
    num_freqs: usize,
    num_taps: usize,
    dm_rate: usize,
    caps: &GpuCapabilities,
) -> Result<LaunchGeometry, DspError> {
    if dm_rate == 0 || samples_per_antenna % dm_rate != 0 {
        return Err(DspError::KernelConfigInvalid {
            reason: "samples_per_antenna must be an exact multiple of dm_rate".to_string(),
        });
    }

    let variant = select_kernel_variant(num_taps, num_freqs, caps)?;

    caps.check_shared_mem_budget(num_freqs, num_taps)?;

    let grid_x = (samples_per_antenna / dm_rate) as u32;
    let grid_y = num_antennas as u32;

    let (block_x, block_y) = match variant {
        KernelVariant::Small => (num_taps as u32, num_freqs as u32),
        KernelVariant::Large => ((num_taps / 2) as u32, num_freqs as u32),
    };

    let shared_mem_bytes = GpuCapabilities::shared_mem_required_bytes(num_freqs, num_taps) as u32;

    Ok(LaunchGeometry { variant, grid_x, grid_y, block_x, block_y, shared_mem_bytes })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn caps(max_threads: u32) -> GpuCapabilities {
        GpuCapabilities {
            max_threads_per_block: max_threads,
            shared_mem_per_block_bytes: 1 << 16,
            warp_size: 32,
            memory_clock_khz: 1_000_000,
            global_memory_bus_width_bits: 256,
        }
    }

    #[test]
    fn selects_small_variant_when_under_threads_limit() {
        assert_eq!(select_kernel_variant(256, 2, &caps(1024)).unwrap(), KernelVariant::Small);
    }

    #[test]
    fn selects_large_variant_when_between_one_and_two_x_limit() {
        // num_taps=1024, num_freqs=2 -> 2048 total, > 1024 but <= 2048.
        assert_eq!(select_kernel_variant(1024, 2, &caps(1024)).unwrap(), KernelVariant::Large);
    }

    #[test]
    fn rejects_configuration_beyond_two_x_limit() {
        assert!(select_kernel_variant(2048, 2, &caps(1024)).is_err());
    }

    #[test]
    fn geometry_grid_dims_follow_samples_and_antennas() {
        let c = caps(1024);
        let geom = build_launch_geometry(1_000_000, 16, 1, 256, 500, &c).unwrap();
        assert_eq!(geom.grid_x, 2000);
        assert_eq!(geom.grid_y, 16);
        assert_eq!(geom.variant, KernelVariant::Small);
        assert_eq!(geom.block_x, 256);
        assert_eq!(geom.block_y, 1);
    }

    #[test]
    fn large_variant_halves_block_x() {
        let c = caps(1024);
        let geom = build_launch_geometry(2048, 1, 2, 1024, 1, &c).unwrap();
        assert_eq!(geom.variant, KernelVariant::Large);
        assert_eq!(geom.block_x, 512);
        assert_eq!(geom.block_y, 2);
    }

    #[test]
    fn rejects_non_divisible_decimation_rate() {
        let c = caps(1024);
        assert!(build_launch_geometry(1_000_001, 16, 1, 256, 500, &c).is_err());
    }
}
