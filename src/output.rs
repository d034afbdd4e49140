//! Stream output: FLV container over RTMP.
//!
//! The pump only sees the [`PacketSink`] trait; the concrete sink owns the
//! FFmpeg output context and the open network connection, rescales packet
//! timestamps into the stream time base, and preserves submission order.

use crate::config::StreamConfig;
use crate::encode::X264Encoder;
use crate::error::{Error, Result};
use crate::types::EncodedPacket;

use ffmpeg_next as ffmpeg;
use ffmpeg_next::Rational;

/// Transport/container collaborator boundary.
pub trait PacketSink {
    /// Write one packet. Packets must reach the wire in call order; a write
    /// failure ends the session.
    fn write(&mut self, packet: EncodedPacket) -> Result<()>;

    /// Flush and close the output. Safe to call more than once.
    fn close(&mut self) -> Result<()>;
}

/// FLV-over-RTMP output.
///
/// Opening the sink opens the network connection and writes the container
/// header; there is no separate connect step.
pub struct RtmpSink {
    output: Option<ffmpeg::format::context::Output>,
    stream_index: usize,
    /// Time base the encoder stamps packets in (1/fps).
    source_time_base: Rational,
    url_masked: String,
    packets_written: u64,
    bytes_written: u64,
}

impl RtmpSink {
    /// Connect to the RTMP server and write the FLV header. The stream is
    /// parameterized from the already-opened encoder (SPS/PPS extradata,
    /// resolution, codec id).
    pub fn open(config: &StreamConfig, encoder: &X264Encoder) -> Result<Self> {
        // Config-class error on purpose: an unusable scheme must not be
        // retried by the reconnect driver.
        if !config.url.starts_with("rtmp://") && !config.url.starts_with("rtmps://") {
            return Err(Error::Config(
                "URL must start with rtmp:// or rtmps://".into(),
            ));
        }

        ffmpeg::init().map_err(|e| Error::Rtmp(e.to_string()))?;

        let mut options = ffmpeg::Dictionary::new();
        options.set("flvflags", "no_duration_filesize");
        options.set("rtmp_live", "live");

        let mut output = ffmpeg::format::output_as_with(&config.url, "flv", options)
            .map_err(|e| Error::ConnectionFailed(format!("failed to open RTMP output: {}", e)))?;

        let codec = ffmpeg::encoder::find(ffmpeg::codec::Id::H264)
            .ok_or_else(|| Error::Muxer("H264 codec not found".into()))?;

        let stream_index = {
            let mut stream = output
                .add_stream(codec)
                .map_err(|e| Error::Muxer(format!("failed to add video stream: {}", e)))?;
            stream.set_parameters(encoder.inner());
            stream.set_time_base(encoder.time_base());
            stream.set_rate(Rational::new(config.fps as i32, 1));
            stream.index()
        };

        let url_masked = config.url_masked();
        tracing::info!("connecting to {}", url_masked);

        // This performs the RTMP handshake; failure here leaves nothing live.
        output
            .write_header()
            .map_err(|e| Error::ConnectionFailed(format!("failed to write header: {}", e)))?;

        tracing::info!(
            "connected: {} ({} @ {} fps)",
            url_masked,
            config.resolution(),
            config.fps
        );

        Ok(Self {
            output: Some(output),
            stream_index,
            source_time_base: encoder.time_base(),
            url_masked,
            packets_written: 0,
            bytes_written: 0,
        })
    }
}

impl PacketSink for RtmpSink {
    fn write(&mut self, packet: EncodedPacket) -> Result<()> {
        let output = self.output.as_mut().ok_or(Error::SessionClosed)?;

        let size = packet.data.len();
        let mut pkt = ffmpeg::Packet::copy(&packet.data);
        pkt.set_pts(Some(packet.pts));
        pkt.set_dts(Some(packet.dts));
        pkt.set_duration(packet.duration);
        pkt.set_stream(self.stream_index);
        if packet.keyframe {
            pkt.set_flags(ffmpeg::codec::packet::Flags::KEY);
        }

        let stream = output
            .stream(self.stream_index)
            .ok_or_else(|| Error::Muxer("video stream not found".into()))?;
        pkt.rescale_ts(self.source_time_base, stream.time_base());

        pkt.write_interleaved(output)
            .map_err(|e| Error::Rtmp(format!("write failed: {}", e)))?;

        self.packets_written += 1;
        self.bytes_written += size as u64;
        Ok(())
    }

    fn close(&mut self) -> Result<()> {
        if let Some(mut output) = self.output.take() {
            // Best effort: the trailer rarely matters for a live FLV stream
            // and the connection may already be gone.
            if let Err(e) = output.write_trailer() {
                tracing::debug!("trailer not written: {}", e);
            }
            tracing::info!(
                "stream closed: {} ({} packets, {} bytes)",
                self.url_masked,
                self.packets_written,
                self.bytes_written
            );
        }
        Ok(())
    }
}

impl Drop for RtmpSink {
    fn drop(&mut self) {
        let _ = self.close();
    }
}
