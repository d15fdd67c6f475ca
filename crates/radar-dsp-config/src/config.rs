//! The enumerated configuration options this core consumes, and the
//! immutable shared handle the rest of the workspace holds onto them
//! through.

use std::sync::Arc;

use radar_dsp_core::dsp_types::{MAX_FILTER_TAPS, NUM_STAGES};

use crate::endpoint::Endpoint;

#[derive(Debug, Clone)]
pub struct DspConfig {
    pub main_antenna_count: usize,
    pub intf_antenna_count: usize,

    pub max_rx_sample_rate_hz: f64,
    pub max_output_sample_rate_hz: f64,

    /// Fixed at 3 in the present design; kept as a field so a config file
    /// that disagrees is rejected by `validate()` rather than silently
    /// ignored.
    pub max_filtering_stages: usize,
    pub max_filter_taps_per_stage: usize,

    pub ringbuffer_name: String,
    pub ringbuffer_size_bytes: u64,

    pub ack_endpoint: Endpoint,
    pub timing_endpoint: Endpoint,
}

impl DspConfig {
    /// Sanity-check the configuration once at start-up, so that a bad
    /// config file is rejected with a descriptive error instead of
    /// surfacing as a kernel-launch failure deep inside the first
    /// sequence.
    pub fn validate(&self) -> Result<(), String> {
        if self.main_antenna_count == 0 {
            return Err("main_antenna_count must be non-zero".to_string());
        }
        if self.max_filtering_stages != NUM_STAGES {
            return Err(format!(
                "max_filtering_stages must be {} in the present design, got {}",
                NUM_STAGES, self.max_filtering_stages
            ));
        }
        if self.max_filter_taps_per_stage == 0 || self.max_filter_taps_per_stage > MAX_FILTER_TAPS {
            return Err(format!(
                "max_filter_taps_per_stage must be between 1 and {}",
                MAX_FILTER_TAPS
            ));
        }
        if self.max_rx_sample_rate_hz <= 0.0 || self.max_output_sample_rate_hz <= 0.0 {
            return Err("sample rates must be positive".to_string());
        }
        if self.max_output_sample_rate_hz > self.max_rx_sample_rate_hz {
            return Err("max_output_sample_rate must not exceed max_rx_sample_rate".to_string());
        }
        if self.ringbuffer_name.is_empty() {
            return Err("ringbuffer_name must not be empty".to_string());
        }
        Ok(())
    }
}

/// Immutable configuration shared across every pipeline instance. No
/// mutable runtime state is required, so this is just a cloneable `Arc`
/// handle rather than a lock-guarded one.
#[derive(Clone)]
pub struct SharedConfig(Arc<DspConfig>);

impl SharedConfig {
    pub fn new(cfg: DspConfig) -> Result<Self, String> {
        cfg.validate()?;
        Ok(Self(Arc::new(cfg)))
    }

    pub fn config(&self) -> Arc<DspConfig> {
        Arc::clone(&self.0)
    }
}
