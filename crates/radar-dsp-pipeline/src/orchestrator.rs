//! Pipeline orchestrator and the per-sequence state machine it drives.
//!
//! Each admitted sequence gets its own dedicated host worker thread and
//! its own GPU stream: active sequences are owned one-to-one by
//! orchestrator instances that execute concurrently, each on its own GPU
//! stream. Rather than registering a CUDA-runtime stream-completion
//! callback (whose exact surface varies across driver-API wrappers), the
//! sequence's own worker thread plays that role directly: it blocks only
//! at the two points where the device can legitimately make it wait (the
//! copy-complete wait and the final `stop`-event wait), exactly where a
//! registered callback would otherwise fire, and does the same
//! ack/timing/teardown work a callback would hand off to a short-lived
//! worker. Concurrency across sequences falls out of spawning one such
//! thread per sequence, each bound to its own stream, detaching the
//! sequence's lifetime from the thread that admitted it.

use std::sync::Arc;

use cudarc::driver::{CudaDevice, CudaSlice, CudaStream, LaunchAsync, LaunchConfig};

use radar_dsp_config::DspConfig;
use radar_dsp_core::dsp_types::{ComplexSample, DecimatedBlock, FilterBank, NUM_STAGES};
use radar_dsp_core::error::DspError;
use radar_dsp_core::messages::{AckMessage, SequenceStatus, TimingMessage};
use radar_dsp_core::sequence::SequenceRequest;
use radar_dsp_filters::build_stage_filters;
use radar_dsp_gpu::buffers::{DeviceBufferSet, PinnedHostOutput};
use radar_dsp_gpu::capability::GpuCapabilities;
use radar_dsp_gpu::events::StageEvents;
use radar_dsp_gpu::launch::build_launch_geometry;
use radar_dsp_gpu::module::DecimationModule;

use crate::messaging::MessageBus;
use crate::ringbuffer::RingBufferSource;

/// States of a pipeline instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineState {
    Init,
    Copying,
    CopyAcked,
    Stage1,
    Stage2,
    Stage3,
    Draining,
    Done,
    Failed,
}

/// How many complex channels and samples-per-channel stage `s` (0-based)
/// consumes and produces: stage 1 runs one bandpass filter per receive
/// frequency over each antenna; stages 2 and 3 fold frequency into the
/// antenna dimension and run a single lowpass filter over each
/// (frequency, antenna) pair independently.
#[derive(Debug, Clone, Copy)]
struct StageLayout {
    num_freqs: usize,
    num_channels: usize,
    samples_in: usize,
    samples_out: usize,
    dm_rate: usize,
}

fn stage_layouts(request: &SequenceRequest) -> [StageLayout; NUM_STAGES] {
    let num_antennas = request.num_antennas();
    let num_freqs = request.num_freqs();

    let mut samples_in = request.samples_per_antenna;
    let mut layouts = Vec::with_capacity(NUM_STAGES);
    for (stage_idx, &dm_rate) in request.dm_rates.iter().enumerate() {
        let (stage_num_freqs, num_channels) =
            if stage_idx == 0 { (num_freqs, num_antennas) } else { (1, num_freqs * num_antennas) };
        let samples_out = samples_in / dm_rate;
        layouts.push(StageLayout { num_freqs: stage_num_freqs, num_channels, samples_in, samples_out, dm_rate });
        samples_in = samples_out;
    }
    match layouts.try_into() {
        Ok(a) => a,
        Err(_) => unreachable!("exactly NUM_STAGES layouts are pushed above"),
    }
}

/// Build every stage's filter bank for one sequence, threading each
/// stage's output sample rate into the next.
fn build_all_stage_filters(request: &SequenceRequest) -> Result<[FilterBank; NUM_STAGES], DspError> {
    let mut input_rate_hz = request.sample_rate_hz;
    let mut banks = Vec::with_capacity(NUM_STAGES);
    for (stage_idx, &dm_rate) in request.dm_rates.iter().enumerate() {
        let bank = build_stage_filters(stage_idx, &request.rx_frequencies_hz, input_rate_hz, dm_rate)?;
        input_rate_hz /= dm_rate as f64;
        banks.push(bank);
    }
    match banks.try_into() {
        Ok(a) => a,
        Err(_) => unreachable!("exactly NUM_STAGES banks are pushed above"),
    }
}

fn complex_to_interleaved(samples: &[ComplexSample]) -> Vec<f32> {
    let mut out = Vec::with_capacity(samples.len() * 2);
    for s in samples {
        out.push(s.re);
        out.push(s.im);
    }
    out
}

fn interleaved_to_complex(floats: &[f32]) -> Vec<ComplexSample> {
    floats.chunks_exact(2).map(|c| ComplexSample::new(c[0], c[1])).collect()
}

/// Launch one stage's kernel on `stream`. Variant selection
/// and the shared-memory admission check happen inside
/// `build_launch_geometry` before anything is enqueued, so a
/// configuration that would overflow the device is rejected here rather
/// than inside the kernel.
fn launch_stage(
    module: &DecimationModule,
    caps: &GpuCapabilities,
    stream: &CudaStream,
    layout: &StageLayout,
    num_taps: usize,
    input: &CudaSlice<f32>,
    taps: &CudaSlice<f32>,
    output: &mut CudaSlice<f32>,
) -> Result<(), DspError> {
    let geometry =
        build_launch_geometry(layout.samples_in, layout.num_channels, layout.num_freqs, num_taps, layout.dm_rate, caps)?;

    let cfg = LaunchConfig {
        grid_dim: (geometry.grid_x, geometry.grid_y, 1),
        block_dim: (geometry.block_x, geometry.block_y, 1),
        shared_mem_bytes: geometry.shared_mem_bytes,
    };

    let params = (
        input,
        taps,
        &mut *output,
        layout.samples_in as i32,
        num_taps as i32,
        layout.num_freqs as i32,
        layout.dm_rate as i32,
    );

    let func = module.function(geometry.variant);
    unsafe { func.launch_on_stream(stream, cfg, params) }
        .map_err(|e| DspError::AsyncCopyError { reason: format!("kernel launch failed: {e}") })
}

/// Per-sequence handle: owns the GPU stream, the three timing events,
/// every device allocation, the pinned
/// host output buffer, the ring-buffer lease and the outbound message
/// bus reference, for the duration of one sequence.
pub struct PipelineInstance {
    device: Arc<CudaDevice>,
    module: Arc<DecimationModule>,
    caps: GpuCapabilities,
    bus: MessageBus,
    ringbuffer: Arc<dyn RingBufferSource>,
    output_tx: crossbeam_channel::Sender<DecimatedBlock>,
    request: SequenceRequest,
    state: PipelineState,
}

impl PipelineInstance {
    pub fn new(
        device: Arc<CudaDevice>,
        module: Arc<DecimationModule>,
        caps: GpuCapabilities,
        bus: MessageBus,
        ringbuffer: Arc<dyn RingBufferSource>,
        output_tx: crossbeam_channel::Sender<DecimatedBlock>,
        request: SequenceRequest,
    ) -> Self {
        Self { device, module, caps, bus, ringbuffer, output_tx, request, state: PipelineState::Init }
    }

    pub fn state(&self) -> PipelineState {
        self.state
    }

    /// Run the full state machine to completion. Never panics on a
    /// per-sequence failure: every `DspError` kind other than
    /// `DeviceLost` is converted to a failed timing report and the
    /// instance tears itself down cleanly. `DeviceLost` is propagated so
    /// the caller can treat it as fatal to the process.
    pub fn run(mut self) -> Result<(), DspError> {
        match self.run_inner() {
            Ok(()) => {
                self.state = PipelineState::Done;
                Ok(())
            }
            Err(e) if e.is_fatal() => Err(e),
            Err(e) => {
                self.state = PipelineState::Failed;
                self.bus.send_timing(TimingMessage::failed(self.request.sequence_num, status_for(&e)));
                tracing::warn!(sequence_num = self.request.sequence_num, error = %e, "sequence failed");
                Ok(())
            }
        }
    }

    fn run_inner(&mut self) -> Result<(), DspError> {
        self.request.validate()?;

        self.state = PipelineState::Init;
        let stream = self.device.fork_default_stream().map_err(|e| DspError::DeviceLost { reason: e.to_string() })?;
        // Every allocation and copy this thread issues through `self.device`
        // from here on is enqueued on `stream`, not the device's own
        // default stream, so the whole per-sequence pipeline - buffers,
        // copies, kernels, events - is actually ordered on one private
        // stream and can overlap with other sequences on their own.
        stream.bind_to_thread().map_err(|e| DspError::DeviceLost { reason: e.to_string() })?;
        let events = StageEvents::create(&self.device)?;
        events.record_initial_start(&stream)?;

        // Step 2: acquire the ring-buffer slot and enqueue the H->D copy.
        self.state = PipelineState::Copying;
        let slot = self.ringbuffer.acquire(
            &self.request.ringbuffer_slot,
            self.request.samples_per_antenna,
            self.request.num_antennas(),
        )?;

        let layouts = stage_layouts(&self.request);
        let filter_banks = build_all_stage_filters(&self.request)?;

        for (stage_idx, bank) in filter_banks.iter().enumerate() {
            self.caps.check_shared_mem_budget(layouts[stage_idx].num_freqs, bank.num_taps())?;
        }

        let mut buffers = DeviceBufferSet::allocate(
            &self.device,
            self.request.num_antennas(),
            self.request.samples_per_antenna,
            filter_banks[0].num_freqs(),
            filter_banks[0].num_taps(),
            filter_banks[1].num_taps(),
            filter_banks[2].num_taps(),
            layouts[0].num_freqs * layouts[0].num_channels * layouts[0].samples_out,
            layouts[1].num_freqs * layouts[1].num_channels * layouts[1].samples_out,
            layouts[2].num_freqs * layouts[2].num_channels * layouts[2].samples_out,
        )?;

        let host_input = complex_to_interleaved(slot.samples().as_slice());
        self.device
            .htod_copy_into(host_input, &mut buffers.rf_samples_d)
            .map_err(|e| DspError::AsyncCopyError { reason: format!("H->D sample copy failed: {e}") })?;

        // Step 3: copy-complete callback, realised as this thread blocking
        // on `stream` until the H->D copy it just enqueued has actually
        // drained the ring-buffer slot. Only once that wait returns has
        // the samples genuinely left the slot, so only then is it safe to
        // tell the controller it may reuse it; kernel_start is marked
        // after, so the ack always precedes it.
        stream
            .synchronize()
            .map_err(|e| DspError::AsyncCopyError { reason: format!("H->D copy synchronize failed: {e}") })?;
        self.state = PipelineState::CopyAcked;
        self.bus.send_ack(AckMessage { sequence_num: self.request.sequence_num });
        events.record_kernel_start(&stream)?;

        // Step 4: copy every stage's filter bank to the device.
        self.device
            .htod_copy_into(complex_to_interleaved(filter_banks[0].as_slice()), &mut buffers.first_stage_bp_filters_d)
            .map_err(|e| DspError::AsyncCopyError { reason: format!("stage 1 filter copy failed: {e}") })?;
        self.device
            .htod_copy_into(complex_to_interleaved(filter_banks[1].as_slice()), &mut buffers.second_stage_filters_d)
            .map_err(|e| DspError::AsyncCopyError { reason: format!("stage 2 filter copy failed: {e}") })?;
        self.device
            .htod_copy_into(complex_to_interleaved(filter_banks[2].as_slice()), &mut buffers.third_stage_filters_d)
            .map_err(|e| DspError::AsyncCopyError { reason: format!("stage 3 filter copy failed: {e}") })?;

        // Step 5: stage 1 -> stage 2 -> stage 3, stage s+1 consuming
        // stage s's device output directly.
        self.state = PipelineState::Stage1;
        launch_stage(
            &self.module,
            &self.caps,
            &stream,
            &layouts[0],
            filter_banks[0].num_taps(),
            &buffers.rf_samples_d,
            &buffers.first_stage_bp_filters_d,
            &mut buffers.stage1_out_d,
        )?;

        self.state = PipelineState::Stage2;
        launch_stage(
            &self.module,
            &self.caps,
            &stream,
            &layouts[1],
            filter_banks[1].num_taps(),
            &buffers.stage1_out_d,
            &buffers.second_stage_filters_d,
            &mut buffers.stage2_out_d,
        )?;

        self.state = PipelineState::Stage3;
        launch_stage(
            &self.module,
            &self.caps,
            &stream,
            &layouts[2],
            filter_banks[2].num_taps(),
            &buffers.stage2_out_d,
            &buffers.third_stage_filters_d,
            &mut buffers.stage3_out_d,
        )?;

        // Step 6/7: async D->H copy of the final stage's output into
        // pinned host memory, then record stop. The copy is enqueued on
        // `stream` and not waited on here; `host_output` is only read
        // after `events.synchronize_stop()` below, which blocks on the
        // `stop` event recorded immediately after on the same stream, so
        // the copy is guaranteed complete by the time it's touched.
        self.state = PipelineState::Draining;
        let final_len = layouts[2].num_freqs * layouts[2].num_channels * layouts[2].samples_out;
        let mut host_output = PinnedHostOutput::alloc(final_len)?;
        self.device
            .dtoh_copy_into(&buffers.stage3_out_d, host_output.as_interleaved_floats_mut())
            .map_err(|e| DspError::AsyncCopyError { reason: format!("D->H output copy failed: {e}") })?;
        events.record_stop(&stream)?;

        // Step 8: finalisation. Synchronise stop, report timing, tear
        // down every resource, release the ring-buffer slot.
        events.synchronize_stop()?;
        let total_ms = events.total_elapsed_ms()?;
        let kernel_ms = events.kernel_elapsed_ms()?;
        self.bus.send_timing(TimingMessage::success(self.request.sequence_num, kernel_ms, total_ms));

        // Stages 2-3 fold frequency into the channel dimension, but the
        // channel order (frequency-major, then antenna) matches
        // `DecimatedBlock`'s own layout exactly, so the final buffer can
        // be reinterpreted directly back into (frequency, antenna, time)
        // without a reshuffle.
        let out_block = DecimatedBlock::from_vec(
            self.request.num_freqs(),
            self.request.num_antennas(),
            layouts[2].samples_out,
            interleaved_to_complex(host_output.as_interleaved_floats()),
        )?;
        slot.release();
        let _ = self.output_tx.send(out_block);

        Ok(())
    }
}

fn status_for(err: &DspError) -> SequenceStatus {
    match err {
        DspError::AllocationFailure { .. } => SequenceStatus::AllocationFailure,
        DspError::KernelConfigInvalid { .. } => SequenceStatus::KernelConfigInvalid,
        DspError::SlotMissing { .. } => SequenceStatus::SlotMissing,
        DspError::AsyncCopyError { .. } => SequenceStatus::AsyncCopyError,
        DspError::InvalidLayout { .. } => SequenceStatus::KernelConfigInvalid,
        DspError::MessageSendFailure { .. } | DspError::DeviceLost { .. } => SequenceStatus::AsyncCopyError,
    }
}

/// The long-lived, per-process object that admits sequences and spawns
/// one worker thread per sequence. Holds no per-sequence mutable state
/// itself.
pub struct DspCore {
    device: Arc<CudaDevice>,
    module: Arc<DecimationModule>,
    caps: GpuCapabilities,
    config: Arc<DspConfig>,
    bus: MessageBus,
    ringbuffer: Arc<dyn RingBufferSource>,
    output_tx: crossbeam_channel::Sender<DecimatedBlock>,
}

impl DspCore {
    pub fn new(
        device: Arc<CudaDevice>,
        caps: GpuCapabilities,
        config: Arc<DspConfig>,
        bus: MessageBus,
        ringbuffer: Arc<dyn RingBufferSource>,
        output_tx: crossbeam_channel::Sender<DecimatedBlock>,
    ) -> Result<Self, DspError> {
        let module = DecimationModule::load(&device)?;
        Ok(Self { device, module: Arc::new(module), caps, config, bus, ringbuffer, output_tx })
    }

    pub fn config(&self) -> &DspConfig {
        &self.config
    }

    /// Admit a new sequence, created on arrival of a new sequence number
    /// from radar control. Spawns a dedicated worker thread and returns
    /// immediately; the caller is never blocked by a sequence's
    /// processing.
    ///
    /// Returns the `JoinHandle` so the caller (or tests) can observe
    /// completion; production callers are expected to detach it.
    pub fn submit_sequence(&self, request: SequenceRequest) -> std::thread::JoinHandle<Result<(), DspError>> {
        let instance = PipelineInstance::new(
            self.device.clone(),
            self.module.clone(),
            self.caps,
            self.bus.clone(),
            self.ringbuffer.clone(),
            self.output_tx.clone(),
            request,
        );
        std::thread::spawn(move || instance.run())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_request() -> SequenceRequest {
        SequenceRequest {
            sequence_num: 1,
            rx_frequencies_hz: vec![1.0e6, -1.0e6],
            dm_rates: [10, 10, 5],
            sample_rate_hz: 5.0e6,
            samples_per_antenna: 500_000,
            main_antenna_count: 16,
            intf_antenna_count: 4,
            ringbuffer_slot: "s0".to_string(),
        }
    }

    #[test]
    fn stage_layouts_chain_sample_counts_and_fold_frequency() {
        let req = sample_request();
        let layouts = stage_layouts(&req);
        assert_eq!(layouts[0].num_freqs, 2);
        assert_eq!(layouts[0].num_channels, 20);
        assert_eq!(layouts[0].samples_in, 500_000);
        assert_eq!(layouts[0].samples_out, 50_000);

        assert_eq!(layouts[1].num_freqs, 1);
        assert_eq!(layouts[1].num_channels, 40);
        assert_eq!(layouts[1].samples_in, 50_000);
        assert_eq!(layouts[1].samples_out, 5_000);

        assert_eq!(layouts[2].num_freqs, 1);
        assert_eq!(layouts[2].num_channels, 40);
        assert_eq!(layouts[2].samples_in, 5_000);
        assert_eq!(layouts[2].samples_out, 1_000);
    }

    #[test]
    fn status_for_maps_every_error_kind() {
        assert_eq!(status_for(&DspError::AllocationFailure { what: "x" }), SequenceStatus::AllocationFailure);
        assert_eq!(
            status_for(&DspError::SlotMissing { slot_name: "x".to_string() }),
            SequenceStatus::SlotMissing
        );
        assert_eq!(
            status_for(&DspError::KernelConfigInvalid { reason: "x".to_string() }),
            SequenceStatus::KernelConfigInvalid
        );
    }

    #[test]
    fn complex_interleave_roundtrips() {
        let samples = vec![ComplexSample::new(1.0, -1.0), ComplexSample::new(0.5, 2.5)];
        let floats = complex_to_interleaved(&samples);
        assert_eq!(floats, vec![1.0, -1.0, 0.5, 2.5]);
        assert_eq!(interleaved_to_complex(&floats), samples);
    }
}
