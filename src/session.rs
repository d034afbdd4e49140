//! Streaming session lifecycle and the encode-and-transmit pump.
//!
//! A [`Session`] is one connect-to-close lifetime of the encoder/container/
//! transport triple. It is never reused: the reconnect driver tears the whole
//! thing down and builds a fresh one, so no encoder state (GOP structure,
//! rate-control history) leaks across reconnects.

use crate::buffer::{double_buffer, FrameReader, FrameWriter};
use crate::config::{RetryConfig, StreamConfig};
use crate::encode::{VideoEncoder, X264Encoder};
use crate::error::{Error, Result};
use crate::frame::FrameBuffer;
use crate::output::{PacketSink, RtmpSink};
use crate::pacing::Pacer;

use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

/// One live streaming session, generic over the encoder and sink boundaries.
pub struct Session<E, S> {
    reader: FrameReader<FrameBuffer>,
    encoder: Option<E>,
    sink: Option<S>,
    pacer: Pacer,
    next_pts: i64,
    frames_sent: u64,
}

/// The production session type: libx264 into FLV over RTMP.
pub type RtmpSession = Session<X264Encoder, RtmpSink>;

impl RtmpSession {
    /// Build a complete session: frame pair, encoder, then the RTMP sink
    /// (which opens the connection and writes the header). A failure at any
    /// step drops everything already built, so no partial session is ever
    /// left live and the next attempt starts from a clean slate.
    pub fn connect(config: &StreamConfig) -> Result<(Self, FrameWriter<FrameBuffer>)> {
        config.validate()?;

        let front = FrameBuffer::new(config.resolution());
        let back = FrameBuffer::new(config.resolution());
        let (writer, reader) = double_buffer(front, back);

        let encoder = X264Encoder::open(config)?;
        let sink = RtmpSink::open(config, &encoder)?;

        let mut pacer = Pacer::for_framerate(config.framerate());
        pacer.start(Instant::now());

        Ok((Session::new(reader, encoder, sink, pacer), writer))
    }
}

impl<E: VideoEncoder, S: PacketSink> Session<E, S> {
    pub fn new(reader: FrameReader<FrameBuffer>, encoder: E, sink: S, pacer: Pacer) -> Self {
        Self {
            reader,
            encoder: Some(encoder),
            sink: Some(sink),
            pacer,
            next_pts: 1,
            frames_sent: 0,
        }
    }

    /// Encode the current front buffer and transmit everything the encoder
    /// has ready.
    ///
    /// The pts is strictly increasing by one per call starting at 1. If the
    /// producer has not swapped since the last call, the same front buffer is
    /// encoded again under a new pts; a duplicate frame is normal operation
    /// with decoupled rates, not an error.
    ///
    /// The front buffer stays locked across submit and drain, so a producer
    /// swap blocks until the frame is fully handed off (the blocking-swap
    /// policy, see `buffer`).
    pub fn send_frame(&mut self) -> Result<()> {
        let encoder = self.encoder.as_mut().ok_or(Error::SessionClosed)?;
        let sink = self.sink.as_mut().ok_or(Error::SessionClosed)?;
        let pts = self.next_pts;

        self.reader.with_front(|frame| -> Result<()> {
            frame.set_pts(pts);
            encoder.submit(frame)?;
            // Drain in emission order; None means nothing more for now.
            while let Some(packet) = encoder.receive()? {
                sink.write(packet)?;
            }
            Ok(())
        })?;

        self.next_pts += 1;
        self.frames_sent += 1;
        if self.frames_sent % 256 == 0 {
            tracing::info!(
                frames = self.frames_sent,
                overruns = self.pacer.overruns(),
                "streaming"
            );
        }
        Ok(())
    }

    /// Pump frames at the fixed schedule until an error or a stop request.
    pub fn send_loop(&mut self, stop: &AtomicBool) -> Result<()> {
        while !stop.load(Ordering::SeqCst) {
            self.send_frame()?;
            self.pacer.delay_until_next();
        }
        Ok(())
    }

    /// Frames submitted so far in this session.
    pub fn frames_sent(&self) -> u64 {
        self.frames_sent
    }

    /// Tear down in dependency order: transport flush/close first, then the
    /// encoder; the frame pair goes with the session itself. Safe to call
    /// more than once.
    pub fn close(&mut self) {
        if let Some(mut sink) = self.sink.take() {
            let _ = sink.close();
        }
        self.encoder.take();
    }
}

impl<E, S> Drop for Session<E, S> {
    fn drop(&mut self) {
        self.sink.take();
        self.encoder.take();
    }
}

/// Capped exponential reconnect delay.
pub struct Backoff {
    next: Duration,
    initial: Duration,
    max: Duration,
}

impl Backoff {
    pub fn new(retry: &RetryConfig) -> Self {
        Self {
            next: retry.initial_delay(),
            initial: retry.initial_delay(),
            max: retry.max_delay(),
        }
    }

    /// Current delay; doubles for the next failure, up to the cap.
    pub fn next_delay(&mut self) -> Duration {
        let delay = self.next;
        self.next = (self.next * 2).min(self.max);
        delay
    }

    /// Call after a successful connect so the next failure starts small.
    pub fn reset(&mut self) {
        self.next = self.initial;
    }
}

/// Reconnect driver: connect, hand the fresh [`FrameWriter`] to the capture
/// thread, stream until failure, tear down, back off, retry. Runs until a
/// stop is requested, the capture thread goes away, or a non-recoverable
/// error (bad configuration) surfaces.
pub fn run(
    config: &StreamConfig,
    retry: &RetryConfig,
    stop: &AtomicBool,
    writer_tx: &crossbeam_channel::Sender<FrameWriter<FrameBuffer>>,
) -> Result<()> {
    drive(config, retry, stop, writer_tx, RtmpSession::connect)
}

/// Driver body, generic over the connect step so the teardown/reconnect
/// sequencing can be exercised without a network or codec.
fn drive<E, S, C>(
    config: &StreamConfig,
    retry: &RetryConfig,
    stop: &AtomicBool,
    writer_tx: &crossbeam_channel::Sender<FrameWriter<FrameBuffer>>,
    mut connect: C,
) -> Result<()>
where
    E: VideoEncoder,
    S: PacketSink,
    C: FnMut(&StreamConfig) -> Result<(Session<E, S>, FrameWriter<FrameBuffer>)>,
{
    config.validate()?;
    let mut backoff = Backoff::new(retry);

    while !stop.load(Ordering::SeqCst) {
        match connect(config) {
            Ok((mut session, writer)) => {
                if writer_tx.send(writer).is_err() {
                    tracing::info!("capture thread gone, stopping");
                    session.close();
                    return Ok(());
                }
                backoff.reset();

                match session.send_loop(stop) {
                    Ok(()) => {
                        session.close();
                        return Ok(());
                    }
                    Err(e) => {
                        tracing::error!(frames = session.frames_sent(), "session failed: {}", e);
                        session.close();
                        if !e.is_recoverable() {
                            return Err(e);
                        }
                    }
                }
            }
            Err(e) => {
                tracing::warn!("connect to {} failed: {}", config.url_masked(), e);
                if !e.is_recoverable() {
                    return Err(e);
                }
            }
        }

        let delay = backoff.next_delay();
        tracing::info!("reconnecting in {:?}", delay);
        sleep_until_stop(delay, stop);
    }
    Ok(())
}

/// Sleep out a backoff delay, waking promptly if a stop is requested.
fn sleep_until_stop(delay: Duration, stop: &AtomicBool) {
    let deadline = Instant::now() + delay;
    while !stop.load(Ordering::SeqCst) {
        let remaining = match deadline.checked_duration_since(Instant::now()) {
            Some(remaining) => remaining,
            None => break,
        };
        std::thread::sleep(remaining.min(Duration::from_millis(50)));
    }
}
