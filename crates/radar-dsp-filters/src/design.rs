use std::f64::consts::PI;

use num::Zero;
use radar_dsp_core::dsp_types::{is_power_of_two, ComplexSample, FilterBank, MAX_FILTER_TAPS, MIN_FILTER_TAPS};
use radar_dsp_core::error::DspError;

fn next_pow2(n: usize) -> usize {
    if n <= 1 {
        return 1;
    }
    let mut p = 1usize;
    while p < n {
        p <<= 1;
    }
    p
}

/// Length of a windowed-sinc FIR (Hamming window, ~53 dB stopband
/// attenuation) needed to achieve a given normalised transition
/// bandwidth, rounded up to the next power of two and clamped to
/// `[MIN_FILTER_TAPS, MAX_FILTER_TAPS]`.
///
/// `transition_bw` is the transition band width divided by the input
/// sample rate.
pub fn ideal_filter_length(transition_bw: f64) -> usize {
    assert!(transition_bw > 0.0 && transition_bw < 0.5);
    // Standard Hamming-window design rule of thumb: N ~= 3.3 / transition_bw.
    let ideal = (3.3 / transition_bw).ceil() as usize;
    next_pow2(ideal).clamp(MIN_FILTER_TAPS, MAX_FILTER_TAPS)
}

/// Real-valued windowed-sinc lowpass prototype, Hamming windowed,
/// normalised so its taps sum to 1 (i.e. unity DC gain). `cutoff` is the
/// normalised cutoff frequency (cycles/sample, in `(0, 0.5)`).
fn lowpass_prototype(num_taps: usize, cutoff: f64) -> Vec<f64> {
    assert!(cutoff > 0.0 && cutoff < 0.5);
    let m = num_taps as f64 - 1.0;
    let mut taps: Vec<f64> = (0..num_taps)
        .map(|n| {
            let x = n as f64 - m / 2.0;
            let sinc = if x == 0.0 {
                2.0 * cutoff
            } else {
                (2.0 * PI * cutoff * x).sin() / (PI * x)
            };
            let window = 0.54 - 0.46 * (2.0 * PI * n as f64 / m).cos();
            sinc * window
        })
        .collect();

    let dc_gain: f64 = taps.iter().sum();
    if dc_gain != 0.0 {
        for t in taps.iter_mut() {
            *t /= dc_gain;
        }
    }
    taps
}

/// Modulate a real lowpass prototype to a complex bandpass filter
/// centred at `center_freq` (normalised, cycles/sample). Because the
/// prototype sums to 1, the modulated filter's gain at its own centre
/// frequency is exactly 1 regardless of the offset.
fn modulate_bandpass(prototype: &[f64], center_freq: f64) -> Vec<ComplexSample> {
    prototype
        .iter()
        .enumerate()
        .map(|(n, &tap)| {
            let phase = 2.0 * PI * center_freq * n as f64;
            ComplexSample::new((tap * phase.cos()) as f32, (tap * phase.sin()) as f32)
        })
        .collect()
}

fn zero_pad_to(taps: Vec<ComplexSample>, target_len: usize) -> Vec<ComplexSample> {
    let mut taps = taps;
    taps.resize(target_len, ComplexSample::zero());
    taps
}

/// Build stage 1's bank of complex bandpass filters, one per receive
/// frequency. `rx_frequencies_hz` are offsets from the local
/// oscillator; `input_rate_hz` is the stage's input sample rate;
/// `dm_rate` is stage 1's decimation rate, used to size the transition
/// band relative to the decimated output Nyquist.
pub fn build_stage1_filters(
    rx_frequencies_hz: &[f64],
    input_rate_hz: f64,
    dm_rate: usize,
) -> Result<FilterBank, DspError> {
    if rx_frequencies_hz.is_empty() {
        return Err(DspError::InvalidLayout { reason: "at least one receive frequency is required" });
    }
    if dm_rate == 0 {
        return Err(DspError::InvalidLayout { reason: "decimation rate must be non-zero" });
    }

    let output_rate_hz = input_rate_hz / dm_rate as f64;
    let cutoff = 0.5 * output_rate_hz / input_rate_hz * 0.8;
    let transition_bw = 0.5 * output_rate_hz / input_rate_hz * 0.2;
    let num_taps = ideal_filter_length(transition_bw);
    let prototype = lowpass_prototype(num_taps, cutoff);

    let mut all_taps = Vec::with_capacity(rx_frequencies_hz.len() * num_taps);
    for &freq_hz in rx_frequencies_hz {
        let center_freq = freq_hz / input_rate_hz;
        let bandpass = modulate_bandpass(&prototype, center_freq);
        all_taps.extend(zero_pad_to(bandpass, num_taps));
    }

    FilterBank::new(rx_frequencies_hz.len(), num_taps, all_taps)
}

/// Build the single real-valued lowpass filter shared by stages 2 and 3.
/// Returned as a `FilterBank` with `num_freqs() == 1`; the kernel launch
/// folds frequency into the antenna/channel dimension for these stages.
pub fn build_lowpass_stage_filter(input_rate_hz: f64, dm_rate: usize) -> Result<FilterBank, DspError> {
    if dm_rate == 0 {
        return Err(DspError::InvalidLayout { reason: "decimation rate must be non-zero" });
    }
    let output_rate_hz = input_rate_hz / dm_rate as f64;
    let cutoff = 0.5 * output_rate_hz / input_rate_hz * 0.8;
    let transition_bw = 0.5 * output_rate_hz / input_rate_hz * 0.2;
    let num_taps = ideal_filter_length(transition_bw);
    let prototype = lowpass_prototype(num_taps, cutoff);

    let taps: Vec<ComplexSample> = prototype.iter().map(|&t| ComplexSample::new(t as f32, 0.0)).collect();
    debug_assert!(is_power_of_two(taps.len()));
    FilterBank::new(1, num_taps, taps)
}

/// Dispatch to the right design routine for a given stage index
/// (0-based: 0 = stage 1, 1 = stage 2, 2 = stage 3). For stages 2 and 3,
/// `pass_freqs` is ignored: the lowpass prototype is the same for every
/// channel.
pub fn build_stage_filters(
    stage_idx: usize,
    pass_freqs_hz: &[f64],
    input_rate_hz: f64,
    dm_rate: usize,
) -> Result<FilterBank, DspError> {
    match stage_idx {
        0 => build_stage1_filters(pass_freqs_hz, input_rate_hz, dm_rate),
        1 | 2 => build_lowpass_stage_filter(input_rate_hz, dm_rate),
        _ => Err(DspError::InvalidLayout { reason: "stage index must be 0, 1 or 2 (three stages fixed by design)" }),
    }
}
