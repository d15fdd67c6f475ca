//! Per-sequence request descriptor: the start-of-sequence parameters
//! radar control hands the core for one pulse transmission.

use crate::dsp_types::NUM_STAGES;
use crate::error::DspError;

pub type SequenceNumber = u32;

/// Start-of-sequence request from radar control: one pulse transmission's
/// worth of receive parameters.
#[derive(Debug, Clone)]
pub struct SequenceRequest {
    pub sequence_num: SequenceNumber,
    /// Receive centre frequencies, in Hz, relative to the local oscillator.
    pub rx_frequencies_hz: Vec<f64>,
    /// Decimation rate for each of the three stages, applied in order.
    pub dm_rates: [usize; NUM_STAGES],
    /// Input sample rate, in Hz.
    pub sample_rate_hz: f64,
    /// Number of samples recorded per antenna for this sequence.
    pub samples_per_antenna: usize,
    /// Main array element count.
    pub main_antenna_count: usize,
    /// Interferometer array element count.
    pub intf_antenna_count: usize,
    /// Name of the shared-memory ring-buffer slot holding this sequence's
    /// raw samples.
    pub ringbuffer_slot: String,
}

impl SequenceRequest {
    pub fn num_antennas(&self) -> usize {
        self.main_antenna_count + self.intf_antenna_count
    }

    pub fn num_freqs(&self) -> usize {
        self.rx_frequencies_hz.len()
    }

    pub fn total_dm_rate(&self) -> usize {
        self.dm_rates.iter().product()
    }

    /// Validate the invariant that `samples_per_antenna` is divisible by
    /// the product of the three stage decimation rates.
    pub fn validate(&self) -> Result<(), DspError> {
        let total = self.total_dm_rate();
        if total == 0 {
            return Err(DspError::InvalidLayout {
                reason: "decimation rates must all be non-zero",
            });
        }
        if self.samples_per_antenna % total != 0 {
            return Err(DspError::InvalidLayout {
                reason: "samples_per_antenna must be divisible by the product of the three decimation rates",
            });
        }
        if self.rx_frequencies_hz.is_empty() {
            return Err(DspError::InvalidLayout {
                reason: "at least one receive frequency is required",
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_request() -> SequenceRequest {
        SequenceRequest {
            sequence_num: 1,
            rx_frequencies_hz: vec![1.0e6],
            dm_rates: [10, 10, 5],
            sample_rate_hz: 5.0e6,
            samples_per_antenna: 1_000_000,
            main_antenna_count: 16,
            intf_antenna_count: 4,
            ringbuffer_slot: "slot0".to_string(),
        }
    }

    #[test]
    fn accepts_evenly_divisible_sample_count() {
        assert!(sample_request().validate().is_ok());
    }

    #[test]
    fn rejects_indivisible_sample_count() {
        let mut req = sample_request();
        req.samples_per_antenna = 1_000_001;
        assert!(req.validate().is_err());
    }

    #[test]
    fn num_antennas_sums_both_arrays() {
        assert_eq!(sample_request().num_antennas(), 20);
    }
}
