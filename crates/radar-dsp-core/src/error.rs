//! Pipeline error kinds and the per-kind recovery policy.
//!
//! `DspError::is_fatal` tells a caller whether the error ends the process
//! (device loss) or only the sequence that hit it.

use std::fmt;

#[derive(Debug, Clone, PartialEq)]
pub enum DspError {
    /// A data-model invariant was violated while constructing a buffer
    /// (filter length, layout length). Not itself a runtime error raised
    /// during a kernel launch, but it is the precondition check that
    /// keeps a malformed buffer from ever reaching one.
    InvalidLayout { reason: &'static str },

    /// A device allocation failed. Fails this sequence only.
    AllocationFailure { what: &'static str },

    /// Kernel launch geometry exceeds 2x maxThreadsPerBlock, or the
    /// required shared memory exceeds the device's per-block capacity.
    /// Fails this sequence only.
    KernelConfigInvalid { reason: String },

    /// The named shared-memory ring-buffer slot does not exist. Fails
    /// this sequence only; no ack is sent.
    SlotMissing { slot_name: String },

    /// Stream callback: the async H->D or D->H copy reported an error.
    /// Fails this sequence; teardown is attempted best-effort.
    AsyncCopyError { reason: String },

    /// Sending on an outbound message channel failed. The message is
    /// logged and dropped; the sequence still completes.
    MessageSendFailure { channel: &'static str },

    /// Any CUDA/driver API call reporting the device itself is gone.
    /// Fatal to the whole process.
    DeviceLost { reason: String },
}

impl DspError {
    /// True if this error kind is fatal to the whole process rather than
    /// just the sequence that triggered it.
    pub fn is_fatal(&self) -> bool {
        matches!(self, DspError::DeviceLost { .. })
    }
}

impl fmt::Display for DspError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DspError::InvalidLayout { reason } => write!(f, "invalid buffer layout: {}", reason),
            DspError::AllocationFailure { what } => write!(f, "device allocation failed: {}", what),
            DspError::KernelConfigInvalid { reason } => write!(f, "invalid kernel launch configuration: {}", reason),
            DspError::SlotMissing { slot_name } => write!(f, "shared-memory slot '{}' does not exist", slot_name),
            DspError::AsyncCopyError { reason } => write!(f, "asynchronous copy failed: {}", reason),
            DspError::MessageSendFailure { channel } => write!(f, "failed to send message on {} channel", channel),
            DspError::DeviceLost { reason } => write!(f, "GPU device lost: {}", reason),
        }
    }
}

impl std::error::Error for DspError {}
