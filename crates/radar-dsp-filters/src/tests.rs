use super::*;

fn dc_gain_at(taps: &[radar_dsp_core::dsp_types::ComplexSample], center_freq: f64) -> f64 {
    use std::f64::consts::PI;
    let mut acc = num_complex::Complex::new(0.0f64, 0.0f64);
    for (n, tap) in taps.iter().enumerate() {
        let phase = -2.0 * PI * center_freq * n as f64;
        let rot = num_complex::Complex::new(phase.cos(), phase.sin());
        acc += num_complex::Complex::new(tap.re as f64, tap.im as f64) * rot;
    }
    acc.norm()
}

#[test]
fn stage1_filter_lengths_are_powers_of_two() {
    let bank = build_stage1_filters(&[10_000.0, -10_000.0, 5_000.0], 5_000_000.0, 500).unwrap();
    assert!(radar_dsp_core::dsp_types::is_power_of_two(bank.num_taps()));
    assert_eq!(bank.num_freqs(), 3);
}

#[test]
fn stage1_unity_gain_at_each_centre_frequency() {
    let freqs = [12_500.0, -12_500.0];
    let input_rate = 5_000_000.0;
    let bank = build_stage1_filters(&freqs, input_rate, 500).unwrap();
    for (f, &freq_hz) in freqs.iter().enumerate() {
        let taps = bank.taps_for_freq(f);
        let gain = dc_gain_at(taps, freq_hz / input_rate);
        assert!((gain - 1.0).abs() < 0.05, "gain at freq {} was {}", freq_hz, gain);
    }
}

#[test]
fn lowpass_stage_filter_has_single_frequency_and_unity_dc_gain() {
    let bank = build_lowpass_stage_filter(100_000.0, 5).unwrap();
    assert_eq!(bank.num_freqs(), 1);
    let taps = bank.taps_for_freq(0);
    let gain = dc_gain_at(taps, 0.0);
    assert!((gain - 1.0).abs() < 1e-6, "DC gain was {}", gain);
}

#[test]
fn build_stage_filters_dispatches_by_stage_index() {
    let freqs = [10_000.0];
    let stage1 = build_stage_filters(0, &freqs, 5_000_000.0, 500).unwrap();
    assert_eq!(stage1.num_freqs(), 1);

    let stage2 = build_stage_filters(1, &freqs, 10_000.0, 5).unwrap();
    assert_eq!(stage2.num_freqs(), 1);

    let stage3 = build_stage_filters(2, &freqs, 2_000.0, 2).unwrap();
    assert_eq!(stage3.num_freqs(), 1);

    assert!(build_stage_filters(3, &freqs, 2_000.0, 2).is_err());
}

#[test]
fn rejects_empty_receive_frequency_list() {
    assert!(build_stage1_filters(&[], 5_000_000.0, 500).is_err());
}

#[test]
fn rejects_zero_decimation_rate() {
    assert!(build_stage1_filters(&[10_000.0], 5_000_000.0, 0).is_err());
    assert!(build_lowpass_stage_filter(5_000_000.0, 0).is_err());
}

#[test]
fn ideal_filter_length_is_clamped_to_invariant_range() {
    assert_eq!(ideal_filter_length(0.49), radar_dsp_core::dsp_types::MIN_FILTER_TAPS);
    assert_eq!(ideal_filter_length(1e-6), radar_dsp_core::dsp_types::MAX_FILTER_TAPS);
}
