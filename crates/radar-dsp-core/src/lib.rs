//! Core data model for the HF radar receive-side decimation pipeline
//!
//! This crate provides fundamental types and utilities shared by every
//! other crate in the workspace: the sample/filter/output layouts of
//! the data model, the per-sequence descriptor, the pipeline error type,
//! and the ack/timing wire messages exchanged with the transmit driver.

pub mod dsp_types;
pub mod error;
pub mod messages;
pub mod sequence;

pub use dsp_types::*;
pub use error::DspError;
pub use messages::{AckMessage, SequenceStatus, TimingMessage};
pub use sequence::{SequenceNumber, SequenceRequest};
