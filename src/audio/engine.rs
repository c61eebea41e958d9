//! The capability surface a speech codec must provide to be driven by a
//! [`DecoderSession`](super::session::DecoderSession).
//!
//! The engine owns the signal-processing math; this layer only sizes and hands
//! over the opaque state, reads back the continuation flag and counts samples.

use thiserror::Error;

/// Sample rate a fresh session decodes to.
pub const DEFAULT_SAMPLE_RATE: i32 = 24000;

/// Output rates the SILK decoder accepts for `API_sampleRate`.
pub const SILK_SAMPLE_RATES: [i32; 7] = [8000, 12000, 16000, 24000, 32000, 44100, 48000];

/// Duration of one SILK sub-frame in milliseconds.
pub const SUBFRAME_DURATION_MS: usize = 20;

/// Control record shared between a session and its engine.
///
/// `sample_rate` is only changed through the session's rate setter;
/// `more_internal_frames` and `frame_size` are written by the engine after
/// every sub-frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DecodeControl {
    pub sample_rate: i32,
    pub frames_per_packet: i32,
    pub more_internal_frames: bool,
    pub frame_size: i32,
}

impl Default for DecodeControl {
    fn default() -> Self {
        Self {
            sample_rate: DEFAULT_SAMPLE_RATE,
            frames_per_packet: 1,
            more_internal_frames: false,
            frame_size: 0,
        }
    }
}

/// How a single sub-frame came out of the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubframeStatus {
    /// Samples were reconstructed from the payload.
    Decoded,
    /// The engine produced concealment samples instead of a real decode.
    Concealed,
}

/// Result of one successful engine call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Subframe {
    pub samples: usize,
    pub status: SubframeStatus,
}

impl Subframe {
    pub fn decoded(samples: usize) -> Self {
        Self {
            samples,
            status: SubframeStatus::Decoded,
        }
    }

    pub fn concealed(samples: usize) -> Self {
        Self {
            samples,
            status: SubframeStatus::Concealed,
        }
    }
}

/// Failure reported by the codec engine itself.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EngineError {
    /// Native status code returned by the engine.
    #[error("engine returned status {0}")]
    Status(i32),

    /// Engine reported more samples than the output slice it was given.
    #[error("engine produced {produced} samples into a {capacity}-sample buffer")]
    Overrun { produced: usize, capacity: usize },

    #[error("{0}")]
    Other(String),
}

/// A speech codec able to decode one sub-frame at a time into caller memory.
///
/// Implementations must be stateless themselves: everything that persists
/// between calls lives in the `state` region the session allocates from
/// [`state_size`](CodecEngine::state_size).
pub trait CodecEngine {
    /// Number of bytes of opaque decoder state.
    fn state_size(&self) -> usize;

    /// Prepare a zeroed state region for the first packet.
    fn init_state(&self, state: &mut [u8]) -> Result<(), EngineError>;

    /// Decode the next sub-frame of `input` into `output`.
    ///
    /// The engine must update `control.more_internal_frames` to say whether
    /// the packet still holds undecoded sub-frames.
    fn decode_subframe(
        &self,
        state: &mut [u8],
        control: &mut DecodeControl,
        lost: bool,
        input: &[u8],
        output: &mut [i16],
    ) -> Result<Subframe, EngineError>;

    /// Whether the engine can resample its output to `rate`.
    fn supports_sample_rate(&self, rate: i32) -> bool {
        rate > 0
    }

    /// Upper bound on samples one call may produce at the control's rate.
    fn max_subframe_samples(&self, control: &DecodeControl) -> usize {
        max_subframe_samples(control.sample_rate)
    }
}

/// Samples in one 20 ms sub-frame at `sample_rate`.
pub fn max_subframe_samples(sample_rate: i32) -> usize {
    let rate = sample_rate.max(0) as usize;
    (rate * SUBFRAME_DURATION_MS).div_ceil(1000)
}

pub fn is_silk_rate(rate: i32) -> bool {
    SILK_SAMPLE_RATES.contains(&rate)
}

impl<E: CodecEngine + ?Sized> CodecEngine for Box<E> {
    fn state_size(&self) -> usize {
        (**self).state_size()
    }

    fn init_state(&self, state: &mut [u8]) -> Result<(), EngineError> {
        (**self).init_state(state)
    }

    fn decode_subframe(
        &self,
        state: &mut [u8],
        control: &mut DecodeControl,
        lost: bool,
        input: &[u8],
        output: &mut [i16],
    ) -> Result<Subframe, EngineError> {
        (**self).decode_subframe(state, control, lost, input, output)
    }

    fn supports_sample_rate(&self, rate: i32) -> bool {
        (**self).supports_sample_rate(rate)
    }

    fn max_subframe_samples(&self, control: &DecodeControl) -> usize {
        (**self).max_subframe_samples(control)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn subframe_length_follows_rate() {
        assert_eq!(max_subframe_samples(8000), 160);
        assert_eq!(max_subframe_samples(24000), 480);
        assert_eq!(max_subframe_samples(44100), 882);
        assert_eq!(max_subframe_samples(48000), 960);
    }

    #[test]
    fn default_control_matches_fresh_session() {
        let control = DecodeControl::default();
        assert_eq!(control.sample_rate, 24000);
        assert_eq!(control.frames_per_packet, 1);
        assert!(!control.more_internal_frames);
    }

    #[test]
    fn silk_rate_table() {
        assert!(is_silk_rate(16000));
        assert!(!is_silk_rate(22050));
        assert!(!is_silk_rate(0));
    }
}
