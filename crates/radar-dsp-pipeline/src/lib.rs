//! Pipeline orchestration and back-pressure messaging.
//!
//! This crate wires together every other crate in the workspace into the
//! per-sequence state machine: `DspCore` admits a `SequenceRequest`,
//! spawns one worker per sequence, and that worker drives the sequence
//! through the device buffer manager, the decimation kernels and the
//! filter designer to a decimated output block, emitting an ack and a
//! timing report along the way.
//!
//! Also hosts the `RingBufferSource` seam, the external ring-buffer
//! collaborator's interface, that the orchestrator calls through.

pub mod messaging;
pub mod orchestrator;
pub mod ringbuffer;

pub use messaging::{encode_frame, MessageBus};
pub use orchestrator::{DspCore, PipelineInstance, PipelineState};
pub use ringbuffer::{InMemoryRingBuffer, RingBufferSlot, RingBufferSource};
