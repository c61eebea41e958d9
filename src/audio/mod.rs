//! audio - SILK decode sessions and stream helpers
//!
//! A [`DecoderSession`] owns the opaque state of a [`CodecEngine`] and drives
//! the per-packet sub-frame loop. [`SilkStreamDecoder`] and [`PcmWriter`]
//! build on it to turn `.silk` byte streams into 16-bit PCM.

mod engine;
mod error;
mod frame_loop;
mod session;
#[cfg(feature = "silk-sdk")]
mod silk_sdk;
mod silk_stream;
pub mod stream_decoder;
mod writer;

pub use engine::{
    is_silk_rate, max_subframe_samples, CodecEngine, DecodeControl, EngineError, Subframe, SubframeStatus,
    DEFAULT_SAMPLE_RATE, SUBFRAME_DURATION_MS, SILK_SAMPLE_RATES,
};
pub use error::{DecodeError, Result};
pub use frame_loop::{LoopLimits, PacketReport, PacketStatus, MAX_ENGINE_CALLS, MAX_INTERNAL_FRAMES};
pub use session::{DecodeStats, DecoderSession, SessionHandle, SessionSettings};
#[cfg(feature = "silk-sdk")]
pub use silk_sdk::SilkSdkEngine;
pub use silk_stream::{
    samples_to_bytes, SilkStreamDecoder, StreamStats, MAX_PACKET_PCM_BYTES, SILK_MAGIC,
};
pub use stream_decoder::StreamDecoder;
pub use writer::{transcode, PcmWriter, TranscodeSummary};
