//! Configuration for the HF radar DSP core.
//!
//! This crate owns only the enumerated options the core itself consumes.
//! The site configuration loader that decides radar-wide parameters
//! (beam patterns, transmit waveforms, scheduling) is an external
//! collaborator; this crate just loads the slice of configuration this
//! core needs.

pub mod config;
pub mod endpoint;
pub mod toml_config;

pub use config::{DspConfig, SharedConfig};
pub use endpoint::Endpoint;
