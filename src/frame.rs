//! Frame buffer backed by an FFmpeg video frame.
//!
//! Two of these form the double buffer: the renderer fills one through
//! [`Surface`] while the encoder reads the other. The pixel format is fixed
//! to YUV420P, which is what the x264 encoder consumes directly; converting
//! the renderer's native layout into this one is the renderer's job.

use crate::types::Resolution;

use ffmpeg_next as ffmpeg;
use ffmpeg_next::format::Pixel;

/// A YUV420P pixel buffer with per-plane strides.
pub struct FrameBuffer {
    frame: ffmpeg::frame::Video,
}

impl FrameBuffer {
    /// Allocate a zeroed frame of the given size.
    pub fn new(resolution: Resolution) -> Self {
        let frame = ffmpeg::frame::Video::new(Pixel::YUV420P, resolution.width, resolution.height);
        Self { frame }
    }

    pub fn width(&self) -> u32 {
        self.frame.width()
    }

    pub fn height(&self) -> u32 {
        self.frame.height()
    }

    /// Number of pixel planes (3 for YUV420P).
    pub fn planes(&self) -> usize {
        self.frame.planes()
    }

    /// Row byte count of a plane.
    pub fn stride(&self, plane: usize) -> usize {
        self.frame.stride(plane)
    }

    /// Writable view for the renderer.
    pub fn surface(&mut self) -> Surface<'_> {
        Surface { frame: &mut self.frame }
    }

    pub fn set_pts(&mut self, pts: i64) {
        self.frame.set_pts(Some(pts));
    }

    pub fn pts(&self) -> Option<i64> {
        self.frame.pts()
    }

    pub(crate) fn inner(&self) -> &ffmpeg::frame::Video {
        &self.frame
    }
}

/// Writable per-plane view of a [`FrameBuffer`].
///
/// The renderer must fill every plane completely before the owning thread
/// requests a swap; the buffer contents between frames are whatever the
/// previous render (or the encoder's last read) left behind.
pub struct Surface<'a> {
    frame: &'a mut ffmpeg::frame::Video,
}

impl Surface<'_> {
    pub fn width(&self) -> u32 {
        self.frame.width()
    }

    pub fn height(&self) -> u32 {
        self.frame.height()
    }

    pub fn planes(&self) -> usize {
        self.frame.planes()
    }

    /// Row byte count of a plane. Chroma planes of YUV420P cover half the
    /// luma resolution in each direction.
    pub fn stride(&self, plane: usize) -> usize {
        self.frame.stride(plane)
    }

    /// Mutable pixel data of one plane.
    pub fn plane_mut(&mut self, plane: usize) -> &mut [u8] {
        self.frame.data_mut(plane)
    }
}
