//! Common types used throughout Framecast

use serde::{Deserialize, Serialize};

/// Video resolution
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Resolution {
    pub width: u32,
    pub height: u32,
}

impl Resolution {
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    // Common resolutions
    pub const HD_720P: Self = Self::new(1280, 720);
    pub const FHD_1080P: Self = Self::new(1920, 1080);

    /// Calculate total pixels
    pub fn pixels(&self) -> u64 {
        self.width as u64 * self.height as u64
    }
}

impl Default for Resolution {
    fn default() -> Self {
        Self::HD_720P
    }
}

impl std::fmt::Display for Resolution {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

/// Framerate representation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Framerate(pub u32);

impl Framerate {
    pub const fn new(fps: u32) -> Self {
        Self(fps)
    }

    pub const FPS_24: Self = Self::new(24);
    pub const FPS_25: Self = Self::new(25);
    pub const FPS_30: Self = Self::new(30);
    pub const FPS_60: Self = Self::new(60);

    pub fn fps(&self) -> u32 {
        self.0
    }

    /// Target inter-frame interval in microseconds, integer division.
    /// At 24 fps this is 41_666 us; the remainder is accepted drift.
    /// A zero framerate is clamped to one frame per second.
    pub fn interval_us(&self) -> u64 {
        1_000_000 / u64::from(self.0.max(1))
    }

    /// Target inter-frame interval as a `Duration`
    pub fn interval(&self) -> std::time::Duration {
        std::time::Duration::from_micros(self.interval_us())
    }
}

impl Default for Framerate {
    fn default() -> Self {
        Self::FPS_25
    }
}

impl std::fmt::Display for Framerate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} fps", self.0)
    }
}

/// Encoded packet (output from the encoder, input to the sink)
#[derive(Debug, Clone)]
pub struct EncodedPacket {
    /// Compressed bitstream data
    pub data: Vec<u8>,
    /// Presentation timestamp in the encoder time base (1/fps)
    pub pts: i64,
    /// Decode timestamp in the encoder time base
    pub dts: i64,
    /// Duration in the encoder time base
    pub duration: i64,
    /// Is this a keyframe?
    pub keyframe: bool,
}

impl EncodedPacket {
    /// Size in bytes
    pub fn size(&self) -> usize {
        self.data.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn interval_is_exact_integer_division() {
        // Zero clamps to 1 fps instead of dividing by zero.
        assert_eq!(Framerate::new(0).interval_us(), 1_000_000);
        assert_eq!(Framerate::new(1).interval_us(), 1_000_000);
        assert_eq!(Framerate::new(24).interval_us(), 41_666);
        assert_eq!(Framerate::new(25).interval_us(), 40_000);
        assert_eq!(Framerate::new(30).interval_us(), 33_333);
        assert_eq!(Framerate::new(60).interval_us(), 16_666);
    }

    #[test]
    fn interval_duration_matches_micros() {
        let fr = Framerate::FPS_25;
        assert_eq!(fr.interval(), std::time::Duration::from_micros(40_000));
    }

    #[test]
    fn resolution_display() {
        assert_eq!(Resolution::HD_720P.to_string(), "1280x720");
        assert_eq!(Resolution::new(1920, 1080).pixels(), 2_073_600);
    }
}
