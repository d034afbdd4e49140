//! Framecast — fixed-rate frame pipeline for live streaming
//!
//! Takes a continuously rendered image source, encodes it with libx264 at a
//! fixed frame rate, and pushes FLV over a persistent RTMP connection,
//! reconnecting with capped exponential backoff when the stream drops.
//!
//! Two long-lived threads share exactly one synchronized region: the
//! producer renders into the back frame buffer and swaps; the consumer
//! encodes the front buffer, transmits, and paces itself against wall-clock
//! deadlines so the stream neither drifts nor stutters.
//!
//! # Example
//!
//! ```rust,no_run
//! use framecast::{spawn_capture, session, RetryConfig, StreamConfig, TestPattern};
//! use std::sync::atomic::AtomicBool;
//! use std::time::Duration;
//!
//! fn main() -> framecast::Result<()> {
//!     let config = StreamConfig::new("rtmp://live.example/app/key")
//!         .with_resolution(1280, 720)
//!         .with_fps(25);
//!
//!     let (writer_tx, writer_rx) = crossbeam_channel::bounded(1);
//!     let _capture = spawn_capture(TestPattern::default(), Duration::from_millis(7), writer_rx);
//!
//!     let stop = AtomicBool::new(false);
//!     session::run(&config, &RetryConfig::default(), &stop, &writer_tx)
//! }
//! ```

pub mod buffer;
pub mod capture;
pub mod config;
pub mod encode;
pub mod error;
pub mod frame;
pub mod output;
pub mod pacing;
pub mod session;
pub mod types;

// Re-exports for convenience
pub use buffer::{double_buffer, FrameReader, FrameWriter};
pub use capture::{spawn_capture, Render, TestPattern};
pub use config::{RetryConfig, StreamConfig};
pub use encode::{VideoEncoder, X264Encoder};
pub use error::{Error, Result};
pub use frame::{FrameBuffer, Surface};
pub use output::{PacketSink, RtmpSink};
pub use pacing::{Pacer, Wait};
pub use session::{Backoff, RtmpSession, Session};
pub use types::{EncodedPacket, Framerate, Resolution};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
