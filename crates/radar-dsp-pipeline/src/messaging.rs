//! Back-pressure and messaging.
//!
//! Ack and timing messages are length-prefixed `bitcode`-encoded frames: a
//! big-endian `u32` byte count followed by the payload. This crate only
//! encodes frames and hands them to a `crossbeam_channel::Sender<Vec<u8>>`;
//! the host binary owns the actual transport (TCP/unix socket per
//! `radar_dsp_config::Endpoint`) and reads off the channel's receiving end
//! to write frames out on a single detached thread that owns the real I/O.

use bitcode::Encode;
use crossbeam_channel::Sender;

use radar_dsp_core::messages::{AckMessage, TimingMessage};

/// Encode `msg` as a length-prefixed `bitcode` frame.
pub fn encode_frame<T: Encode>(msg: &T) -> Vec<u8> {
    let payload = bitcode::encode(msg);
    let mut frame = Vec::with_capacity(4 + payload.len());
    frame.extend_from_slice(&(payload.len() as u32).to_be_bytes());
    frame.extend_from_slice(&payload);
    frame
}

/// The two outbound channels a pipeline instance emits to. Each channel
/// is single-producer from the core's perspective; sending never blocks
/// the hot path beyond the channel's own buffer.
#[derive(Clone)]
pub struct MessageBus {
    ack_tx: Sender<Vec<u8>>,
    timing_tx: Sender<Vec<u8>>,
}

impl MessageBus {
    pub fn new(ack_tx: Sender<Vec<u8>>, timing_tx: Sender<Vec<u8>>) -> Self {
        Self { ack_tx, timing_tx }
    }

    /// Send an ack. A channel send failure is logged and the message is
    /// dropped; the sequence still completes.
    pub fn send_ack(&self, msg: AckMessage) {
        if self.ack_tx.send(encode_frame(&msg)).is_err() {
            tracing::warn!(sequence_num = msg.sequence_num, "failed to send ack, channel disconnected");
        }
    }

    /// Send a timing report. Same drop-and-continue policy as `send_ack`.
    pub fn send_timing(&self, msg: TimingMessage) {
        if self.timing_tx.send(encode_frame(&msg)).is_err() {
            tracing::warn!(sequence_num = msg.sequence_num, "failed to send timing report, channel disconnected");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use radar_dsp_core::messages::SequenceStatus;

    #[test]
    fn encode_frame_prefixes_big_endian_length() {
        let msg = AckMessage { sequence_num: 7 };
        let frame = encode_frame(&msg);
        let declared_len = u32::from_be_bytes(frame[0..4].try_into().unwrap()) as usize;
        assert_eq!(declared_len, frame.len() - 4);

        let decoded: AckMessage = bitcode::decode(&frame[4..]).unwrap();
        assert_eq!(decoded, msg);
    }

    #[test]
    fn message_bus_delivers_ack_and_timing() {
        let (ack_tx, ack_rx) = crossbeam_channel::unbounded();
        let (timing_tx, timing_rx) = crossbeam_channel::unbounded();
        let bus = MessageBus::new(ack_tx, timing_tx);

        bus.send_ack(AckMessage { sequence_num: 3 });
        bus.send_timing(TimingMessage::success(3, 1.5, 2.0));

        let ack_frame = ack_rx.try_recv().unwrap();
        let ack: AckMessage = bitcode::decode(&ack_frame[4..]).unwrap();
        assert_eq!(ack.sequence_num, 3);

        let timing_frame = timing_rx.try_recv().unwrap();
        let timing: TimingMessage = bitcode::decode(&timing_frame[4..]).unwrap();
        assert_eq!(timing.sequence_num, 3);
        assert_eq!(timing.status, SequenceStatus::Ok);
    }

    #[test]
    fn send_on_disconnected_channel_does_not_panic() {
        let (ack_tx, ack_rx) = crossbeam_channel::unbounded();
        let (timing_tx, _timing_rx) = crossbeam_channel::unbounded();
        drop(ack_rx);
        let bus = MessageBus::new(ack_tx, timing_tx);
        bus.send_ack(AckMessage { sequence_num: 1 });
    }
}
