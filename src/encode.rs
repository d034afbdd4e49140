//! H.264 encoding via FFmpeg (libx264).
//!
//! The pump only sees the [`VideoEncoder`] trait: submit one frame, then
//! drain until the encoder says "no data yet". libx264 buffers internally,
//! so zero, one, or several packets per submitted frame are all normal.

use crate::config::StreamConfig;
use crate::error::{Error, Result};
use crate::frame::FrameBuffer;
use crate::types::EncodedPacket;

use ffmpeg_next as ffmpeg;
use ffmpeg_next::format::Pixel;
use ffmpeg_next::{Dictionary, Rational};

/// Encoder collaborator boundary.
pub trait VideoEncoder {
    /// Submit a pts-stamped frame. Failure is fatal for the session.
    fn submit(&mut self, frame: &FrameBuffer) -> Result<()>;

    /// Pull the next ready packet. `Ok(None)` means no data yet, which ends
    /// the drain for this frame; `Err` is fatal for the session.
    fn receive(&mut self) -> Result<Option<EncodedPacket>>;
}

/// libx264 encoder tuned for low-latency live streaming.
pub struct X264Encoder {
    encoder: ffmpeg::encoder::Video,
    time_base: Rational,
}

impl X264Encoder {
    /// Configure and open the encoder from the stream configuration.
    pub fn open(config: &StreamConfig) -> Result<Self> {
        ffmpeg::init().map_err(|e| Error::EncoderInit(e.to_string()))?;

        let codec = ffmpeg::encoder::find_by_name("libx264").ok_or_else(|| {
            Error::EncoderInit("libx264 not found, install FFmpeg with x264 support".into())
        })?;

        let time_base = Rational::new(1, config.fps as i32);

        let context = ffmpeg::codec::context::Context::new_with_codec(codec);
        let mut encoder = context
            .encoder()
            .video()
            .map_err(|e| Error::EncoderInit(e.to_string()))?;

        encoder.set_width(config.width);
        encoder.set_height(config.height);
        encoder.set_format(Pixel::YUV420P);
        encoder.set_time_base(time_base);
        encoder.set_frame_rate(Some(Rational::new(config.fps as i32, 1)));
        encoder.set_gop(15);
        encoder.set_max_b_frames(5);
        // FLV wants SPS/PPS in extradata rather than in-band.
        encoder.set_flags(ffmpeg::codec::Flags::GLOBAL_HEADER);

        // Leave rate-control headroom below the ceiling so the connection is
        // not saturated by the nominal bitrate.
        let target_kbps = if config.bitrate_kbps > 500 {
            config.bitrate_kbps - 500
        } else {
            config.bitrate_kbps
        };

        let mut opts = Dictionary::new();
        opts.set("preset", "veryfast");
        opts.set("tune", "zerolatency");
        opts.set("b", &format!("{}k", target_kbps));
        opts.set("maxrate", &format!("{}k", config.bitrate_kbps));
        opts.set("bufsize", &format!("{}k", config.bitrate_kbps));
        opts.set("qmin", "0");
        opts.set("qmax", "69");
        opts.set("x264-params", "keyint=30:min-keyint=3");

        let encoder = encoder
            .open_with(opts)
            .map_err(|e| Error::EncoderInit(format!("failed to open libx264: {}", e)))?;

        tracing::info!(
            "encoder initialized: libx264 {}x{} @ {} fps, {} kbps",
            config.width,
            config.height,
            config.fps,
            config.bitrate_kbps
        );

        Ok(Self { encoder, time_base })
    }

    /// Encoder time base (1/fps); packet timestamps are expressed in it.
    pub fn time_base(&self) -> Rational {
        self.time_base
    }

    /// Opened encoder handle, used to seed the output stream's parameters.
    pub(crate) fn inner(&self) -> &ffmpeg::encoder::Video {
        &self.encoder
    }
}

impl VideoEncoder for X264Encoder {
    fn submit(&mut self, frame: &FrameBuffer) -> Result<()> {
        self.encoder
            .send_frame(frame.inner())
            .map_err(|e| Error::EncodingFailed(format!("send_frame: {}", e)))
    }

    fn receive(&mut self) -> Result<Option<EncodedPacket>> {
        let mut packet = ffmpeg::Packet::empty();
        match self.encoder.receive_packet(&mut packet) {
            Ok(()) => Ok(Some(EncodedPacket {
                data: packet.data().map(|d| d.to_vec()).unwrap_or_default(),
                pts: packet.pts().unwrap_or(0),
                dts: packet.dts().unwrap_or(0),
                duration: packet.duration(),
                keyframe: packet.is_key(),
            })),
            Err(ffmpeg::Error::Other { errno }) if errno == ffmpeg::error::EAGAIN => Ok(None),
            Err(ffmpeg::Error::Eof) => Ok(None),
            Err(e) => Err(Error::EncodingFailed(format!("receive_packet: {}", e))),
        }
    }
}
