//! Parallel Reduction primitive.
//!
//! The real reduction runs on-device inside the decimation kernels
//! (`kernel_source.rs`). This module provides a host-side simulation of
//! the exact same algorithm — tree halving down to a warp, then
//! lane-shuffle for the last steps — so the documented reduction
//! strategy itself can be unit tested without a GPU.

use radar_dsp_core::dsp_types::ComplexSample;

/// Simulate the block-wide reduction over `values` (length must be a
/// power of two, the warp width `warp_size` dividing the
/// post-tree remainder). Produces the same sum a numerically correct
/// kernel would, by construction; its purpose is to pin down the shape
/// of the algorithm (tree then shuffle) so a kernel rewrite that
/// preserves the final-warp unrolling can be checked against it.
pub fn simulate_block_reduction(values: &[ComplexSample], warp_size: usize) -> ComplexSample {
    assert!(values.len().is_power_of_two(), "reduction input length must be a power of two");
    let mut row = values.to_vec();
    let mut n = row.len();

    while n > warp_size {
        n /= 2;
        for i in 0..n {
            row[i] += row[i + n];
        }
    }

    simulate_warp_shuffle_reduction(&row[..n])
}

/// Simulate `warpSize`-wide `__shfl_down_sync` reduction by splitting each
/// complex lane into its two real primitives and reducing each
/// independently, since hardware shuffle moves 32-bit lanes.
fn simulate_warp_shuffle_reduction(warp: &[ComplexSample]) -> ComplexSample {
    let mut re: Vec<f32> = warp.iter().map(|c| c.re).collect();
    let mut im: Vec<f32> = warp.iter().map(|c| c.im).collect();

    let mut offset = warp.len() / 2;
    while offset > 0 {
        for lane in 0..offset {
            re[lane] += re[lane + offset];
            im[lane] += im[lane + offset];
        }
        offset /= 2;
    }

    ComplexSample::new(re[0], im[0])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reduction_matches_plain_sum() {
        let values: Vec<ComplexSample> =
            (0..256).map(|i| ComplexSample::new(i as f32, -(i as f32))).collect();
        let expected: ComplexSample = values.iter().copied().fold(ComplexSample::default(), |a, b| a + b);
        let actual = simulate_block_reduction(&values, 32);
        assert!((actual - expected).norm() < 1e-3);
    }

    #[test]
    fn reduction_of_single_warp_matches_sum() {
        let values: Vec<ComplexSample> = (0..32).map(|i| ComplexSample::new(1.0, i as f32)).collect();
        let expected: ComplexSample = values.iter().copied().fold(ComplexSample::default(), |a, b| a + b);
        let actual = simulate_block_reduction(&values, 32);
        assert!((actual - expected).norm() < 1e-3);
    }

    #[test]
    #[should_panic]
    fn rejects_non_power_of_two_input() {
        let values = vec![ComplexSample::default(); 6];
        simulate_block_reduction(&values, 32);
    }
}
