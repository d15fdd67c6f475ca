//! Ack and timing wire messages exchanged with the transmit driver.
//!
//! Both message kinds are encoded with `bitcode` and are meant to be
//! framed with a big-endian `u32` length prefix by the transport that
//! sends them (see `radar_dsp_pipeline::messaging`).

use bitcode::{Decode, Encode};

use crate::sequence::SequenceNumber;

/// Sentinel kernel time reported for a failed sequence.
pub const FAILED_KERNEL_TIME_MS: f32 = -1.0;

/// Outcome tag carried alongside a timing message. `Ok` is the only
/// status for which `kernel_time_ms` is meaningful; every other variant
/// always carries the `FAILED_KERNEL_TIME_MS` sentinel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Encode, Decode)]
pub enum SequenceStatus {
    Ok,
    AllocationFailure,
    KernelConfigInvalid,
    SlotMissing,
    AsyncCopyError,
}

/// Ack message: tells the transmit side that raw samples have left the
/// ring buffer and the slot is reusable.
#[derive(Debug, Clone, Copy, PartialEq, Encode, Decode)]
pub struct AckMessage {
    pub sequence_num: SequenceNumber,
}

/// Timing message: reported once per completed (or failed) sequence.
/// `kernel_time_ms` is the back-pressure signal downstream consumers
/// throttle submission on.
#[derive(Debug, Clone, Copy, PartialEq, Encode, Decode)]
pub struct TimingMessage {
    pub sequence_num: SequenceNumber,
    pub kernel_time_ms: f32,
    pub total_time_ms: f32,
    pub status: SequenceStatus,
}

impl TimingMessage {
    pub fn success(sequence_num: SequenceNumber, kernel_time_ms: f32, total_time_ms: f32) -> Self {
        Self { sequence_num, kernel_time_ms, total_time_ms, status: SequenceStatus::Ok }
    }

    pub fn failed(sequence_num: SequenceNumber, status: SequenceStatus) -> Self {
        assert!(status != SequenceStatus::Ok, "failed() requires a non-Ok status");
        Self {
            sequence_num,
            kernel_time_ms: FAILED_KERNEL_TIME_MS,
            total_time_ms: FAILED_KERNEL_TIME_MS,
            status,
        }
    }

    pub fn is_failure(&self) -> bool {
        self.status != SequenceStatus::Ok
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ack_roundtrips_through_bitcode() {
        let ack = AckMessage { sequence_num: 42 };
        let encoded = bitcode::encode(&ack);
        let decoded: AckMessage = bitcode::decode(&encoded).unwrap();
        assert_eq!(decoded, ack);
    }

    #[test]
    fn failed_timing_carries_sentinel() {
        let msg = TimingMessage::failed(7, SequenceStatus::SlotMissing);
        assert_eq!(msg.kernel_time_ms, FAILED_KERNEL_TIME_MS);
        assert!(msg.is_failure());

        let encoded = bitcode::encode(&msg);
        let decoded: TimingMessage = bitcode::decode(&encoded).unwrap();
        assert_eq!(decoded, msg);
    }

    #[test]
    fn success_timing_roundtrips() {
        let msg = TimingMessage::success(7, 3.2, 4.1);
        let encoded = bitcode::encode(&msg);
        let decoded: TimingMessage = bitcode::decode(&encoded).unwrap();
        assert_eq!(decoded, msg);
        assert!(!decoded.is_failure());
    }
}
