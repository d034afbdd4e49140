//! Configuration types for Framecast

use crate::error::{Error, Result};
use crate::types::{Framerate, Resolution};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Stream configuration, immutable once the pipeline starts.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StreamConfig {
    /// Destination RTMP URL (including the stream key)
    pub url: String,
    /// Frame width in pixels
    pub width: u32,
    /// Frame height in pixels
    pub height: u32,
    /// Target framerate
    pub fps: u32,
    /// Target bitrate in kbps
    pub bitrate_kbps: u32,
}

impl Default for StreamConfig {
    fn default() -> Self {
        Self {
            url: String::new(),
            width: 1280,
            height: 720,
            fps: 25,
            bitrate_kbps: 5000,
        }
    }
}

impl StreamConfig {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            ..Default::default()
        }
    }

    pub fn with_resolution(mut self, width: u32, height: u32) -> Self {
        self.width = width;
        self.height = height;
        self
    }

    pub fn with_fps(mut self, fps: u32) -> Self {
        self.fps = fps;
        self
    }

    pub fn with_bitrate_kbps(mut self, bitrate: u32) -> Self {
        self.bitrate_kbps = bitrate;
        self
    }

    /// Load configuration from a TOML file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        toml::from_str(&text).map_err(|e| Error::Config(format!("invalid config file: {}", e)))
    }

    /// Validate the configuration before a session is built from it
    pub fn validate(&self) -> Result<()> {
        if self.url.is_empty() {
            return Err(Error::Config("destination URL is required".into()));
        }
        // A wrong scheme is a configuration mistake, not a transient network
        // failure; catching it here keeps the reconnect loop from retrying it.
        if !self.url.starts_with("rtmp://") && !self.url.starts_with("rtmps://") {
            return Err(Error::Config(format!(
                "destination must be an rtmp:// or rtmps:// URL, got {}",
                self.url
            )));
        }
        if self.width == 0 || self.height == 0 {
            return Err(Error::Config(format!(
                "resolution must be positive, got {}x{}",
                self.width, self.height
            )));
        }
        if self.fps == 0 {
            return Err(Error::Config("framerate must be positive".into()));
        }
        if self.bitrate_kbps == 0 {
            return Err(Error::Config("bitrate must be positive".into()));
        }
        Ok(())
    }

    pub fn resolution(&self) -> Resolution {
        Resolution::new(self.width, self.height)
    }

    pub fn framerate(&self) -> Framerate {
        Framerate::new(self.fps)
    }

    /// Destination URL with the stream key portion masked for logging
    pub fn url_masked(&self) -> String {
        if let Some(idx) = self.url.rfind('/') {
            format!("{}/*****", &self.url[..idx])
        } else {
            "rtmp://*****".to_string()
        }
    }
}

/// Reconnect backoff configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetryConfig {
    /// Delay before the first retry
    pub initial_delay_ms: u64,
    /// Cap on the doubling delay
    pub max_delay_ms: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            initial_delay_ms: 250,
            max_delay_ms: 15_000,
        }
    }
}

impl RetryConfig {
    pub fn initial_delay(&self) -> Duration {
        Duration::from_millis(self.initial_delay_ms)
    }

    pub fn max_delay(&self) -> Duration {
        Duration::from_millis(self.max_delay_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn default_config_matches_720p25() {
        let config = StreamConfig::default();
        assert_eq!(config.resolution(), Resolution::HD_720P);
        assert_eq!(config.fps, 25);
        assert_eq!(config.bitrate_kbps, 5000);
    }

    #[test]
    fn validate_rejects_missing_url() {
        let config = StreamConfig::default();
        assert!(config.validate().is_err());
        assert!(StreamConfig::new("rtmp://live.example/app/key")
            .validate()
            .is_ok());
    }

    #[test]
    fn validate_rejects_non_rtmp_scheme() {
        // Classified as a config error so the reconnect driver exits instead
        // of retrying a destination that can never work.
        assert!(matches!(
            StreamConfig::new("https://live.example/app/key").validate(),
            Err(Error::Config(_))
        ));
        assert!(StreamConfig::new("rtmps://live.example/app/key")
            .validate()
            .is_ok());
    }

    #[test]
    fn validate_rejects_zero_fields() {
        let base = StreamConfig::new("rtmp://live.example/app/key");
        assert!(base.clone().with_resolution(0, 720).validate().is_err());
        assert!(base.clone().with_resolution(1280, 0).validate().is_err());
        assert!(base.clone().with_fps(0).validate().is_err());
        assert!(base.clone().with_bitrate_kbps(0).validate().is_err());
    }

    #[test]
    fn url_masking_hides_stream_key() {
        let config = StreamConfig::new("rtmp://live.example/app/secret-key");
        assert_eq!(config.url_masked(), "rtmp://live.example/app/*****");
        assert!(!config.url_masked().contains("secret-key"));
    }

    #[test]
    fn config_loads_from_toml() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            "url = \"rtmp://live.example/app/key\"\nwidth = 1920\nheight = 1080\nfps = 30\nbitrate_kbps = 6000"
        )
        .unwrap();

        let config = StreamConfig::from_file(file.path()).unwrap();
        assert_eq!(config.width, 1920);
        assert_eq!(config.fps, 30);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn bad_toml_is_a_config_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "width = \"wide\"").unwrap();
        assert!(matches!(
            StreamConfig::from_file(file.path()),
            Err(Error::Config(_))
        ));
    }
}
