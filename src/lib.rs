//! SILK speech decoding: session lifecycle, the per-packet sub-frame loop and
//! stream/file helpers on top of a pluggable codec engine.

pub mod audio;
pub mod config;

pub use audio::{
    CodecEngine, DecodeControl, DecodeError, DecoderSession, PacketReport, PacketStatus,
    PcmWriter, SessionHandle, SessionSettings, SilkStreamDecoder,
};
pub use config::Config;
