//! Drains one outbound message channel (ack or timing) onto the wire.
//! Frames arriving on the channel are already length-prefixed by
//! `radar_dsp_pipeline::messaging::encode_frame`, so this module only
//! owns the socket and retries the connection, keeping framing and
//! connection lifecycle as separate concerns.

use std::io::Write;
use std::net::TcpStream;
use std::os::unix::net::UnixStream;
use std::time::Duration;

use crossbeam_channel::Receiver;

use radar_dsp_config::Endpoint;

const RECONNECT_DELAY: Duration = Duration::from_secs(1);

trait FrameSink {
    fn write_frame(&mut self, frame: &[u8]) -> std::io::Result<()>;
}

impl FrameSink for TcpStream {
    fn write_frame(&mut self, frame: &[u8]) -> std::io::Result<()> {
        self.write_all(frame)?;
        self.flush()
    }
}

impl FrameSink for UnixStream {
    fn write_frame(&mut self, frame: &[u8]) -> std::io::Result<()> {
        self.write_all(frame)?;
        self.flush()
    }
}

fn connect(endpoint: &Endpoint) -> std::io::Result<Box<dyn FrameSink + Send>> {
    match endpoint {
        Endpoint::Tcp { host, port } => {
            let stream = TcpStream::connect((host.as_str(), *port))?;
            Ok(Box::new(stream))
        }
        Endpoint::UnixSocket { path } => {
            let stream = UnixStream::connect(path)?;
            Ok(Box::new(stream))
        }
    }
}

/// Detach a thread that owns `rx` and writes every frame it receives to
/// `endpoint`, reconnecting on failure. The frame that failed to send is
/// dropped, matching the orchestrator's own "log and drop" policy for a
/// channel it cannot reach.
pub fn spawn_frame_sink(name: &'static str, endpoint: Endpoint, rx: Receiver<Vec<u8>>) -> std::thread::JoinHandle<()> {
    std::thread::spawn(move || {
        let mut sink: Option<Box<dyn FrameSink + Send>> = None;
        for frame in rx.iter() {
            loop {
                if sink.is_none() {
                    match connect(&endpoint) {
                        Ok(s) => sink = Some(s),
                        Err(e) => {
                            tracing::warn!(channel = name, %endpoint, error = %e, "failed to connect, retrying");
                            std::thread::sleep(RECONNECT_DELAY);
                            continue;
                        }
                    }
                }

                let s = sink.as_mut().unwrap();
                match s.write_frame(&frame) {
                    Ok(()) => break,
                    Err(e) => {
                        tracing::warn!(channel = name, %endpoint, error = %e, "send failed, reconnecting");
                        sink = None;
                    }
                }
            }
        }
        tracing::info!(channel = name, "outbound channel closed, sink thread exiting");
    })
}
