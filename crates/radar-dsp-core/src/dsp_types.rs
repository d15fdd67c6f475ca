//! Data types used for signal processing: sample, filter-bank and
//! decimated-block layouts shared by every crate in the workspace.

use num::Zero;

use crate::error::DspError;

pub type RealSample = f32;
pub type ComplexSample = num_complex::Complex<RealSample>;

/// Monotonic receiver sample counter.
pub type SampleCount = i64;

/// Minimum and maximum allowed filter length.
pub const MIN_FILTER_TAPS: usize = 4;
pub const MAX_FILTER_TAPS: usize = 2048;

/// Three decimation stages, fixed by the present design.
pub const NUM_STAGES: usize = 3;

pub fn is_power_of_two(n: usize) -> bool {
    n != 0 && (n & (n - 1)) == 0
}

/// A contiguous block of complex samples for every antenna, laid out
/// antenna-major: all samples for antenna 0, then all for antenna 1, etc.
#[derive(Clone)]
pub struct AntennaSampleBlock {
    samples_per_antenna: usize,
    num_antennas: usize,
    data: Vec<ComplexSample>,
}

impl AntennaSampleBlock {
    pub fn zeroed(samples_per_antenna: usize, num_antennas: usize) -> Self {
        Self {
            samples_per_antenna,
            num_antennas,
            data: vec![ComplexSample::zero(); samples_per_antenna * num_antennas],
        }
    }

    /// Build from an existing flat, antenna-major sample buffer.
    pub fn from_vec(
        samples_per_antenna: usize,
        num_antennas: usize,
        data: Vec<ComplexSample>,
    ) -> Result<Self, DspError> {
        if data.len() != samples_per_antenna * num_antennas {
            return Err(DspError::InvalidLayout {
                reason: "antenna sample block length does not match samples_per_antenna * num_antennas",
            });
        }
        Ok(Self { samples_per_antenna, num_antennas, data })
    }

    pub fn samples_per_antenna(&self) -> usize {
        self.samples_per_antenna
    }

    pub fn num_antennas(&self) -> usize {
        self.num_antennas
    }

    pub fn antenna(&self, a: usize) -> &[ComplexSample] {
        let start = a * self.samples_per_antenna;
        &self.data[start..start + self.samples_per_antenna]
    }

    pub fn antenna_mut(&mut self, a: usize) -> &mut [ComplexSample] {
        let start = a * self.samples_per_antenna;
        &mut self.data[start..start + self.samples_per_antenna]
    }

    pub fn as_slice(&self) -> &[ComplexSample] {
        &self.data
    }
}

/// A complex FIR filter bank for a single decimation stage: one filter of
/// `num_taps` complex taps per receive frequency, laid out frequency-major.
/// Filter length is a power of two (zero-padded if necessary), which the
/// warp-level reduction in the kernels relies on.
#[derive(Clone)]
pub struct FilterBank {
    num_freqs: usize,
    num_taps: usize,
    taps: Vec<ComplexSample>,
}

impl FilterBank {
    pub fn new(num_freqs: usize, num_taps: usize, taps: Vec<ComplexSample>) -> Result<Self, DspError> {
        if !is_power_of_two(num_taps) || num_taps < MIN_FILTER_TAPS || num_taps > MAX_FILTER_TAPS {
            return Err(DspError::InvalidLayout {
                reason: "filter length must be a power of two between 4 and 2048",
            });
        }
        if taps.len() != num_freqs * num_taps {
            return Err(DspError::InvalidLayout {
                reason: "filter bank tap buffer length does not match num_freqs * num_taps",
            });
        }
        Ok(Self { num_freqs, num_taps, taps })
    }

    pub fn num_freqs(&self) -> usize {
        self.num_freqs
    }

    pub fn num_taps(&self) -> usize {
        self.num_taps
    }

    pub fn taps_for_freq(&self, f: usize) -> &[ComplexSample] {
        let start = f * self.num_taps;
        &self.taps[start..start + self.num_taps]
    }

    pub fn as_slice(&self) -> &[ComplexSample] {
        &self.taps
    }
}

/// Output of one decimation stage: `num_freqs × num_antennas ×
/// (samples_in / dm_rate)` samples, laid out frequency-major, then
/// antenna-major within a frequency, then time-major within an antenna.
#[derive(Clone)]
pub struct DecimatedBlock {
    num_freqs: usize,
    num_antennas: usize,
    samples_per_channel: usize,
    data: Vec<ComplexSample>,
}

impl DecimatedBlock {
    pub fn zeroed(num_freqs: usize, num_antennas: usize, samples_per_channel: usize) -> Self {
        Self {
            num_freqs,
            num_antennas,
            samples_per_channel,
            data: vec![ComplexSample::zero(); num_freqs * num_antennas * samples_per_channel],
        }
    }

    pub fn from_vec(
        num_freqs: usize,
        num_antennas: usize,
        samples_per_channel: usize,
        data: Vec<ComplexSample>,
    ) -> Result<Self, DspError> {
        if data.len() != num_freqs * num_antennas * samples_per_channel {
            return Err(DspError::InvalidLayout {
                reason: "decimated block length does not match num_freqs * num_antennas * samples_per_channel",
            });
        }
        Ok(Self { num_freqs, num_antennas, samples_per_channel, data })
    }

    pub fn num_freqs(&self) -> usize {
        self.num_freqs
    }

    pub fn num_antennas(&self) -> usize {
        self.num_antennas
    }

    pub fn samples_per_channel(&self) -> usize {
        self.samples_per_channel
    }

    fn index(&self, f: usize, a: usize, k: usize) -> usize {
        (f * self.num_antennas + a) * self.samples_per_channel + k
    }

    pub fn get(&self, f: usize, a: usize, k: usize) -> ComplexSample {
        self.data[self.index(f, a, k)]
    }

    pub fn set(&mut self, f: usize, a: usize, k: usize, value: ComplexSample) {
        let idx = self.index(f, a, k);
        self.data[idx] = value;
    }

    /// Slice of one (frequency, antenna) channel's time series.
    pub fn channel(&self, f: usize, a: usize) -> &[ComplexSample] {
        let start = self.index(f, a, 0);
        &self.data[start..start + self.samples_per_channel]
    }

    pub fn channel_mut(&mut self, f: usize, a: usize) -> &mut [ComplexSample] {
        let start = self.index(f, a, 0);
        &mut self.data[start..start + self.samples_per_channel]
    }

    pub fn as_slice(&self) -> &[ComplexSample] {
        &self.data
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_non_power_of_two_filter_length() {
        let taps = vec![ComplexSample::default(); 2 * 6];
        assert!(FilterBank::new(2, 6, taps).is_err());
    }

    #[test]
    fn decimated_block_uses_frequency_antenna_time_layout() {
        let mut block = DecimatedBlock::zeroed(2, 3, 4);
        block.set(1, 2, 3, ComplexSample::new(1.0, -1.0));
        assert_eq!(block.get(1, 2, 3), ComplexSample::new(1.0, -1.0));
        // frequency-major, then antenna-major, then time-major
        let expected_index = (1 * 3 + 2) * 4 + 3;
        assert_eq!(block.as_slice()[expected_index], ComplexSample::new(1.0, -1.0));
    }

    #[test]
    fn antenna_block_rejects_mismatched_length() {
        assert!(AntennaSampleBlock::from_vec(10, 2, vec![ComplexSample::default(); 5]).is_err());
    }
}
