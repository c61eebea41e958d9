//! Generic stream decoder trait for chunked compressed-audio input.

use anyhow::Result;

/// A trait for audio stream decoders that turn compressed bytes, delivered
/// in arbitrary chunks, into 16-bit PCM samples.
///
/// Implementations keep any partial packet between calls, so a chunk may end
/// anywhere in the stream.
pub trait StreamDecoder: Send {
    /// Decode compressed audio bytes into PCM samples.
    fn decode(&mut self, data: &[u8]) -> Result<Vec<i16>>;
}
