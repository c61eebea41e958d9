use serde::{Deserialize, Serialize};

use crate::audio::{LoopLimits, SessionSettings};

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct Config {
    pub app_name: &'static str,
    pub app_version: &'static str,

    // Decoder session
    pub decoder_sample_rate: i32,
    pub decoder_frames_per_packet: i32,
    pub decoder_max_internal_frames: usize,
    pub decoder_max_engine_calls: usize,

    // Stream input
    pub stream_chunk_size: usize,

    // Logging
    pub log_filter: &'static str,
}

impl Config {
    /// Build the configuration from the values `build.rs` read out of
    /// `config.toml` at compile time.
    pub fn new() -> Result<Self, &'static str> {
        Ok(Self {
            app_name: env!("APP_NAME"),
            app_version: env!("APP_VERSION"),

            decoder_sample_rate: env!("DECODER_SAMPLE_RATE").parse()
                .map_err(|_| "Failed to parse DECODER_SAMPLE_RATE")?,
            decoder_frames_per_packet: env!("DECODER_FRAMES_PER_PACKET").parse()
                .map_err(|_| "Failed to parse DECODER_FRAMES_PER_PACKET")?,
            decoder_max_internal_frames: env!("DECODER_MAX_INTERNAL_FRAMES").parse()
                .map_err(|_| "Failed to parse DECODER_MAX_INTERNAL_FRAMES")?,
            decoder_max_engine_calls: env!("DECODER_MAX_ENGINE_CALLS").parse()
                .map_err(|_| "Failed to parse DECODER_MAX_ENGINE_CALLS")?,

            stream_chunk_size: env!("STREAM_CHUNK_SIZE").parse()
                .map_err(|_| "Failed to parse STREAM_CHUNK_SIZE")?,

            log_filter: env!("LOG_FILTER"),
        })
    }

    pub fn session_settings(&self) -> SessionSettings {
        SessionSettings {
            sample_rate: self.decoder_sample_rate,
            frames_per_packet: self.decoder_frames_per_packet,
            limits: LoopLimits {
                max_internal_frames: self.decoder_max_internal_frames,
                max_engine_calls: self.decoder_max_engine_calls,
            },
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::new().expect("Failed to create default Config from build-time environment variables")
    }
}
