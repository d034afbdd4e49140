//! Capture driver: the producer thread.
//!
//! The rendering engine behind the [`Render`] trait is an external
//! collaborator; it must fill the YUV420P surface completely (converting from
//! its native pixel layout itself) before the driver requests a swap.
//!
//! The thread runs on its own fixed tick, independent of the encode side, and
//! outlives any single session: whenever the reconnect driver builds a fresh
//! session it delivers the new [`FrameWriter`] over a channel and the thread
//! adopts it at the next tick. Swapping into a writer whose session already
//! died is harmless; nobody reads the frames.

use crate::buffer::FrameWriter;
use crate::error::Result;
use crate::frame::{FrameBuffer, Surface};

use crossbeam_channel::{Receiver, RecvTimeoutError};
use std::thread::JoinHandle;
use std::time::Duration;

/// Renderer collaborator boundary.
pub trait Render: Send {
    /// Draw the next image into the surface. Every plane must be fully
    /// written; the previous contents are undefined from the renderer's
    /// point of view.
    fn render(&mut self, surface: &mut Surface<'_>) -> Result<()>;
}

/// Spawn the long-lived producer thread.
///
/// `tick` is the producer's own frame clock; the channel doubles as the stop
/// signal — when every sender is dropped the thread exits.
pub fn spawn_capture<R: Render + 'static>(
    mut renderer: R,
    tick: Duration,
    writer_rx: Receiver<FrameWriter<FrameBuffer>>,
) -> JoinHandle<()> {
    std::thread::Builder::new()
        .name("capture".into())
        .spawn(move || {
            let mut writer: Option<FrameWriter<FrameBuffer>> = None;
            loop {
                match writer_rx.recv_timeout(tick) {
                    Ok(fresh) => {
                        tracing::debug!("capture adopted a new session writer");
                        writer = Some(fresh);
                    }
                    Err(RecvTimeoutError::Timeout) => {}
                    Err(RecvTimeoutError::Disconnected) => break,
                }

                if let Some(w) = writer.as_mut() {
                    {
                        let mut surface = w.back_mut().surface();
                        if let Err(e) = renderer.render(&mut surface) {
                            tracing::error!("render failed: {}", e);
                            continue;
                        }
                    }
                    // May block while the consumer is mid-encode.
                    w.swap();
                }
            }
            tracing::info!("capture thread stopped");
        })
        .expect("failed to spawn capture thread")
}

/// Built-in renderer: a scrolling gradient, enough to verify a stream
/// end-to-end without a real rendering engine attached.
#[derive(Default)]
pub struct TestPattern {
    frame: u64,
}

impl Render for TestPattern {
    fn render(&mut self, surface: &mut Surface<'_>) -> Result<()> {
        let width = surface.width() as usize;
        let height = surface.height() as usize;
        let phase = self.frame as usize;
        self.frame += 1;

        let stride = surface.stride(0);
        let luma = surface.plane_mut(0);
        for y in 0..height {
            for x in 0..width {
                luma[y * stride + x] = ((x + y + phase * 2) & 0xff) as u8;
            }
        }

        // Chroma planes cover half the resolution in each direction.
        let cw = width.div_ceil(2);
        let ch = height.div_ceil(2);
        for plane in 1..=2 {
            let stride = surface.stride(plane);
            let shift = if plane == 1 { phase } else { 255 - (phase & 0xff) };
            let data = surface.plane_mut(plane);
            for y in 0..ch {
                for x in 0..cw {
                    data[y * stride + x] = ((x * 2 + shift) & 0xff) as u8;
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::buffer::double_buffer;
    use crate::types::Resolution;

    /// Renderer that stamps its call count into the first luma byte.
    struct Stamp(u8);

    impl Render for Stamp {
        fn render(&mut self, surface: &mut Surface<'_>) -> Result<()> {
            self.0 = self.0.wrapping_add(1);
            surface.plane_mut(0)[0] = self.0;
            Ok(())
        }
    }

    #[test]
    fn test_pattern_fills_all_planes() {
        let mut buf = FrameBuffer::new(Resolution::new(64, 36));
        let mut pattern = TestPattern::default();
        pattern.render(&mut buf.surface()).unwrap();
        let first = buf.surface().plane_mut(0)[0];

        // A second render moves the gradient.
        pattern.render(&mut buf.surface()).unwrap();
        assert_ne!(buf.surface().plane_mut(0)[0], first);
    }

    #[test]
    fn capture_thread_renders_and_swaps() {
        let res = Resolution::new(64, 36);
        let (writer, reader) = double_buffer(FrameBuffer::new(res), FrameBuffer::new(res));
        let (tx, rx) = crossbeam_channel::bounded(1);

        let handle = spawn_capture(Stamp(0), Duration::from_millis(1), rx);
        tx.send(writer).unwrap();

        // Give the thread a few ticks, then the front buffer must carry a
        // nonzero stamp.
        std::thread::sleep(Duration::from_millis(50));
        let stamped = reader.with_front(|frame| frame.surface().plane_mut(0)[0]);
        assert_ne!(stamped, 0);

        // Dropping the sender stops the thread.
        drop(tx);
        handle.join().unwrap();
    }
}
