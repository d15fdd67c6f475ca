use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;

use radar_dsp_config::toml_config;
use radar_dsp_core::dsp_types::{AntennaSampleBlock, ComplexSample};
use radar_dsp_core::sequence::SequenceRequest;
use radar_dsp_gpu::GpuCapabilities;
use radar_dsp_pipeline::{DspCore, InMemoryRingBuffer, MessageBus};

mod logging;
mod transport;

#[derive(Parser, Debug)]
#[command(author, version, about = "HF radar receive-side decimation DSP core")]
struct Args {
    /// TOML config with antenna counts, sample-rate limits and message endpoints
    config: String,

    /// Which physical GPU to probe and run on
    #[arg(long, default_value_t = 0)]
    gpu_ordinal: usize,

    /// Run a self-contained smoke-test sequence instead of idling for an
    /// external integration to call `DspCore::submit_sequence`.
    #[arg(long)]
    demo: bool,
}

fn load_config(path: &str) -> radar_dsp_config::SharedConfig {
    match toml_config::from_file(path) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("failed to load configuration from {}: {}", path, e);
            std::process::exit(1);
        }
    }
}

/// Build one synthetic single-tone antenna block for the `--demo` smoke
/// test: a single dominant tone placed so exactly one receive
/// frequency's bandpass filter should pass it through.
fn synthetic_tone_block(samples_per_antenna: usize, num_antennas: usize, sample_rate_hz: f64, tone_hz: f64) -> AntennaSampleBlock {
    let mut block = AntennaSampleBlock::zeroed(samples_per_antenna, num_antennas);
    for a in 0..num_antennas {
        for (n, sample) in block.antenna_mut(a).iter_mut().enumerate() {
            let phase = 2.0 * std::f64::consts::PI * tone_hz * (n as f64) / sample_rate_hz;
            *sample = ComplexSample::new(phase.cos() as f32, phase.sin() as f32);
        }
    }
    block
}

fn run_demo(core: &DspCore, num_antennas: usize, sample_rate_hz: f64) {
    let request = SequenceRequest {
        sequence_num: 1,
        rx_frequencies_hz: vec![1.0e6, -1.0e6],
        dm_rates: [10, 10, 5],
        sample_rate_hz,
        samples_per_antenna: 500_000,
        main_antenna_count: num_antennas.saturating_sub(4),
        intf_antenna_count: 4.min(num_antennas),
        ringbuffer_slot: "demo_slot".to_string(),
    };

    tracing::info!(sequence_num = request.sequence_num, "submitting demo sequence");
    let handle = core.submit_sequence(request);
    match handle.join() {
        Ok(Ok(())) => tracing::info!("demo sequence finished"),
        Ok(Err(e)) => tracing::error!(error = %e, "demo sequence hit a fatal device error"),
        Err(_) => tracing::error!("demo sequence worker thread panicked"),
    }
}

fn main() {
    logging::setup_logging();
    eprintln!("=== HF Radar DSP Core ===");

    let args = Args::parse();
    let shared_config = load_config(&args.config);
    let config = shared_config.config();

    let (device, caps) = match GpuCapabilities::probe(args.gpu_ordinal) {
        Ok(pair) => pair,
        Err(e) => {
            eprintln!("failed to probe GPU {}: {}", args.gpu_ordinal, e);
            std::process::exit(1);
        }
    };

    let (ack_tx, ack_rx) = crossbeam_channel::unbounded();
    let (timing_tx, timing_rx) = crossbeam_channel::unbounded();
    let bus = MessageBus::new(ack_tx, timing_tx);
    let _ack_sink = transport::spawn_frame_sink("ack", config.ack_endpoint.clone(), ack_rx);
    let _timing_sink = transport::spawn_frame_sink("timing", config.timing_endpoint.clone(), timing_rx);

    let (output_tx, output_rx) = crossbeam_channel::unbounded();
    std::thread::spawn(move || {
        for block in output_rx.iter() {
            tracing::info!(
                num_freqs = block.num_freqs(),
                num_antennas = block.num_antennas(),
                samples_per_channel = block.samples_per_channel(),
                "decimated block ready for downstream processing"
            );
        }
    });

    let num_antennas = config.main_antenna_count + config.intf_antenna_count;
    let ringbuffer: Arc<dyn radar_dsp_pipeline::RingBufferSource> = if args.demo {
        let samples = synthetic_tone_block(500_000, num_antennas, config.max_rx_sample_rate_hz, 1.0e6);
        Arc::new(InMemoryRingBuffer::new().with_slot("demo_slot", samples))
    } else {
        Arc::new(InMemoryRingBuffer::new())
    };

    let core = match DspCore::new(device, caps, config.clone(), bus, ringbuffer, output_tx) {
        Ok(core) => core,
        Err(e) => {
            eprintln!("failed to initialise DSP core: {}", e);
            std::process::exit(1);
        }
    };

    let running = Arc::new(AtomicBool::new(true));
    let r = running.clone();
    ctrlc::set_handler(move || {
        r.store(false, Ordering::SeqCst);
    })
    .expect("failed to set Ctrl+C handler");

    if args.demo {
        run_demo(&core, num_antennas, config.max_rx_sample_rate_hz);
        return;
    }

    // Submitting sequences is the job of whatever radar-control
    // integration links against this core; this binary only owns process
    // lifecycle and waits for shutdown once everything is wired up.
    tracing::info!("DSP core ready, waiting for sequences via DspCore::submit_sequence");
    while running.load(Ordering::SeqCst) {
        std::thread::sleep(Duration::from_millis(100));
    }
    tracing::info!("shutting down");
}
