//! Host-side CPU reference model of the per-block decimation algorithm,
//! used to check the kernel source's documented semantics without
//! requiring a CUDA device: the output layout equation, linearity and
//! frequency isolation.
//!
//! This mirrors the edge policy exactly: an out-of-range input sample
//! contributes zero rather than being skipped, matching both kernel
//! variants' bounds check.

use radar_dsp_core::dsp_types::{AntennaSampleBlock, ComplexSample, DecimatedBlock, FilterBank};
use radar_dsp_core::error::DspError;

use crate::reduction::simulate_block_reduction;

/// Run one decimation stage over `input` with `filters`, producing a
/// `DecimatedBlock` whose layout matches `out[f, a, k] = sum_t in[a, k *
/// dm_rate + t] * tap[f, t]`.
pub fn cpu_decimate_stage(
    input: &AntennaSampleBlock,
    filters: &FilterBank,
    dm_rate: usize,
    warp_size: usize,
) -> Result<DecimatedBlock, DspError> {
    if dm_rate == 0 || input.samples_per_antenna() % dm_rate != 0 {
        return Err(DspError::InvalidLayout {
            reason: "samples_per_antenna must be an exact multiple of dm_rate",
        });
    }

    let num_freqs = filters.num_freqs();
    let num_taps = filters.num_taps();
    let num_antennas = input.num_antennas();
    let samples_out = input.samples_per_antenna() / dm_rate;

    let mut out = DecimatedBlock::zeroed(num_freqs, num_antennas, samples_out);

    for f in 0..num_freqs {
        let taps = filters.taps_for_freq(f);
        for a in 0..num_antennas {
            let antenna_samples = input.antenna(a);
            for k in 0..samples_out {
                let dec_offset = k * dm_rate;
                let products: Vec<ComplexSample> = (0..num_taps)
                    .map(|t| {
                        let sample = antenna_samples.get(dec_offset + t).copied().unwrap_or_default();
                        sample * taps[t]
                    })
                    .collect();
                let sum = simulate_block_reduction(&products, warp_size);
                out.set(f, a, k, sum);
            }
        }
    }

    Ok(out)
}

#[cfg(test)]
mod tests {
    use std::f32::consts::PI;

    use super::*;
    use radar_dsp_core::dsp_types::MIN_FILTER_TAPS;

    fn unit_impulse_filter(num_freqs: usize, num_taps: usize) -> FilterBank {
        let mut taps = vec![ComplexSample::default(); num_freqs * num_taps];
        for f in 0..num_freqs {
            taps[f * num_taps] = ComplexSample::new(1.0, 0.0);
        }
        FilterBank::new(num_freqs, num_taps, taps).unwrap()
    }

    #[test]
    fn impulse_response_recovers_input_samples() {
        let num_taps = MIN_FILTER_TAPS;
        let samples_per_antenna = 32;
        let mut input = AntennaSampleBlock::zeroed(samples_per_antenna, 1);
        for (i, s) in input.antenna_mut(0).iter_mut().enumerate() {
            *s = ComplexSample::new(i as f32, 0.0);
        }

        let filters = unit_impulse_filter(1, num_taps);
        let out = cpu_decimate_stage(&input, &filters, 1, 32).unwrap();

        for k in 0..samples_per_antenna {
            assert_eq!(out.get(0, 0, k), ComplexSample::new(k as f32, 0.0));
        }
    }

    #[test]
    fn linearity_holds_within_tolerance() {
        let num_taps = MIN_FILTER_TAPS;
        let samples_per_antenna = 16;
        let filters = unit_impulse_filter(1, num_taps);

        let mut x = AntennaSampleBlock::zeroed(samples_per_antenna, 1);
        let mut y = AntennaSampleBlock::zeroed(samples_per_antenna, 1);
        for i in 0..samples_per_antenna {
            x.antenna_mut(0)[i] = ComplexSample::new(i as f32, 0.5 * i as f32);
            y.antenna_mut(0)[i] = ComplexSample::new(-(i as f32), 1.0);
        }

        let (alpha, beta) = (ComplexSample::new(2.0, 0.0), ComplexSample::new(-1.0, 0.5));
        let mut combined = AntennaSampleBlock::zeroed(samples_per_antenna, 1);
        for i in 0..samples_per_antenna {
            combined.antenna_mut(0)[i] = alpha * x.antenna(0)[i] + beta * y.antenna(0)[i];
        }

        let out_x = cpu_decimate_stage(&x, &filters, 1, 32).unwrap();
        let out_y = cpu_decimate_stage(&y, &filters, 1, 32).unwrap();
        let out_combined = cpu_decimate_stage(&combined, &filters, 1, 32).unwrap();

        for k in 0..samples_per_antenna {
            let expected = alpha * out_x.get(0, 0, k) + beta * out_y.get(0, 0, k);
            assert!((out_combined.get(0, 0, k) - expected).norm() < 1e-4);
        }
    }

    #[test]
    fn frequency_isolation_between_two_channels() {
        let num_taps = 64;
        let samples_per_antenna = 256;
        let sample_rate = 1.0;
        let freqs_normalized = [0.1f32, -0.1];

        let mut taps = Vec::with_capacity(2 * num_taps);
        for &f0 in &freqs_normalized {
            let proto: Vec<f32> = (0..num_taps)
                .map(|n| {
                    let m = (num_taps - 1) as f32;
                    let x = n as f32 - m / 2.0;
                    let cutoff = 0.05f32;
                    let sinc = if x == 0.0 { 2.0 * cutoff } else { (2.0 * PI * cutoff * x).sin() / (PI * x) };
                    let window = 0.54 - 0.46 * (2.0 * PI * n as f32 / m).cos();
                    sinc * window
                })
                .collect();
            let dc_gain: f32 = proto.iter().sum();
            let normalized: Vec<f32> = proto.iter().map(|t| t / dc_gain).collect();
            for (n, &t) in normalized.iter().enumerate() {
                let phase = 2.0 * PI * f0 * n as f32;
                taps.push(ComplexSample::new(t * phase.cos(), t * phase.sin()));
            }
        }
        let filters = FilterBank::new(2, num_taps, taps).unwrap();

        let mut input = AntennaSampleBlock::zeroed(samples_per_antenna, 1);
        for (n, s) in input.antenna_mut(0).iter_mut().enumerate() {
            let phase = 2.0 * PI * freqs_normalized[0] * n as f32;
            *s = ComplexSample::new(phase.cos(), phase.sin());
        }

        let out = cpu_decimate_stage(&input, &filters, 1, 32).unwrap();

        let settle = num_taps / 1;
        let steady: Vec<ComplexSample> = (settle..samples_per_antenna).map(|k| out.get(0, 0, k)).collect();
        let mean_mag_ch0: f32 = steady.iter().map(|c| c.norm()).sum::<f32>() / steady.len() as f32;
        assert!((mean_mag_ch0 - 1.0).abs() < 0.05, "channel 0 magnitude {}", mean_mag_ch0);

        let steady_other: Vec<ComplexSample> = (settle..samples_per_antenna).map(|k| out.get(1, 0, k)).collect();
        let mean_mag_ch1: f32 = steady_other.iter().map(|c| c.norm()).sum::<f32>() / steady_other.len() as f32;
        assert!(mean_mag_ch1 < 0.05, "channel 1 magnitude {}", mean_mag_ch1);
    }

    #[test]
    fn rejects_non_divisible_decimation_rate() {
        let filters = unit_impulse_filter(1, MIN_FILTER_TAPS);
        let input = AntennaSampleBlock::zeroed(10, 1);
        assert!(cpu_decimate_stage(&input, &filters, 3, 32).is_err());
    }
}
