//! The `RingBufferSource` seam the core talks through to the shared-memory
//! ring buffer the transmit driver writes into.
//!
//! The real ring-buffer implementation is an external collaborator and
//! stays out of scope here; this crate only defines the trait the
//! orchestrator calls through, plus a test-only in-memory double that
//! stands in for the shared-memory slots during tests.

use std::collections::HashMap;
use std::sync::Mutex;

use radar_dsp_core::dsp_types::AntennaSampleBlock;
use radar_dsp_core::error::DspError;

/// A leased slot: the orchestrator instance owns it for the duration of
/// one sequence and releases it explicitly at teardown. Modeled as a
/// lease with the ack as a separate signal: the ack tells the controller
/// it is free to prepare the next sequence, but the slot itself is not
/// reusable until `release` runs.
pub trait RingBufferSlot: Send {
    fn samples(&self) -> &AntennaSampleBlock;
    /// Consume the lease, making the underlying slot reusable by the
    /// transmit driver. Idempotent: dropping the slot without calling
    /// `release` is safe.
    fn release(self: Box<Self>);
}

/// Opens, reads and releases named shared-memory slots, identified by a
/// handle name string. `acquire` returns `DspError::SlotMissing` when the
/// name does not exist.
pub trait RingBufferSource: Send + Sync {
    fn acquire(
        &self,
        slot_name: &str,
        samples_per_antenna: usize,
        num_antennas: usize,
    ) -> Result<Box<dyn RingBufferSlot>, DspError>;
}

struct InMemorySlot {
    name: String,
    samples: AntennaSampleBlock,
    released: std::sync::Arc<Mutex<Vec<String>>>,
}

impl RingBufferSlot for InMemorySlot {
    fn samples(&self) -> &AntennaSampleBlock {
        &self.samples
    }

    fn release(self: Box<Self>) {
        self.released.lock().unwrap().push(self.name);
    }
}

/// Test-only in-memory ring buffer: slots are pre-registered by name and
/// consumed (not removed) on `acquire`, so the same fixture can back
/// repeated sequences in a test. Tracks release order for assertions
/// about lease/ack/teardown ordering.
pub struct InMemoryRingBuffer {
    slots: HashMap<String, AntennaSampleBlock>,
    released: std::sync::Arc<Mutex<Vec<String>>>,
}

impl InMemoryRingBuffer {
    pub fn new() -> Self {
        Self { slots: HashMap::new(), released: std::sync::Arc::new(Mutex::new(Vec::new())) }
    }

    pub fn with_slot(mut self, name: impl Into<String>, samples: AntennaSampleBlock) -> Self {
        self.slots.insert(name.into(), samples);
        self
    }

    pub fn released_slots(&self) -> Vec<String> {
        self.released.lock().unwrap().clone()
    }
}

impl Default for InMemoryRingBuffer {
    fn default() -> Self {
        Self::new()
    }
}

impl RingBufferSource for InMemoryRingBuffer {
    fn acquire(
        &self,
        slot_name: &str,
        samples_per_antenna: usize,
        num_antennas: usize,
    ) -> Result<Box<dyn RingBufferSlot>, DspError> {
        let samples = self
            .slots
            .get(slot_name)
            .cloned()
            .ok_or_else(|| DspError::SlotMissing { slot_name: slot_name.to_string() })?;

        if samples.samples_per_antenna() != samples_per_antenna || samples.num_antennas() != num_antennas {
            return Err(DspError::InvalidLayout {
                reason: "ring buffer slot does not match the requested sequence's sample layout",
            });
        }

        Ok(Box::new(InMemorySlot { name: slot_name.to_string(), samples, released: self.released.clone() }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn acquire_missing_slot_reports_slot_missing() {
        let rb = InMemoryRingBuffer::new();
        let err = rb.acquire("nope", 10, 2).unwrap_err();
        assert!(matches!(err, DspError::SlotMissing { .. }));
    }

    #[test]
    fn acquire_existing_slot_returns_its_samples() {
        let block = AntennaSampleBlock::zeroed(4, 2);
        let rb = InMemoryRingBuffer::new().with_slot("rx_main", block);
        let slot = rb.acquire("rx_main", 4, 2).unwrap();
        assert_eq!(slot.samples().samples_per_antenna(), 4);
    }

    #[test]
    fn release_is_recorded_and_idempotent_to_drop() {
        let block = AntennaSampleBlock::zeroed(4, 1);
        let rb = InMemoryRingBuffer::new().with_slot("s0", block);
        let slot = rb.acquire("s0", 4, 1).unwrap();
        slot.release();
        assert_eq!(rb.released_slots(), vec!["s0".to_string()]);

        // Dropping a never-released slot (failure path) must not panic.
        let block2 = AntennaSampleBlock::zeroed(4, 1);
        let rb2 = InMemoryRingBuffer::new().with_slot("s1", block2);
        let slot2 = rb2.acquire("s1", 4, 1).unwrap();
        drop(slot2);
    }

    #[test]
    fn acquire_rejects_mismatched_layout() {
        let block = AntennaSampleBlock::zeroed(4, 2);
        let rb = InMemoryRingBuffer::new().with_slot("s0", block);
        assert!(rb.acquire("s0", 8, 2).is_err());
    }
}
