//! Errors surfaced by decode sessions and the stream helpers built on them.

use thiserror::Error;

use super::engine::EngineError;

/// Errors that can occur while creating or driving a decode session.
#[derive(Error, Debug)]
pub enum DecodeError {
    /// The session record or the engine state could not be allocated.
    #[error("failed to allocate {bytes} bytes of decoder state")]
    AllocationFailure { bytes: usize },

    /// The handle was never created or has already been destroyed.
    #[error("decoder session is not live")]
    InvalidSession,

    /// The engine does not accept this output rate.
    #[error("unsupported sample rate: {0} Hz")]
    InvalidSampleRate(i32),

    /// The engine reported a failure while decoding a sub-frame.
    #[error("engine failed on sub-frame {subframe}: {source}")]
    DecodeFailure {
        subframe: usize,
        #[source]
        source: EngineError,
    },

    /// The engine kept the continuation flag raised past the hard ceiling.
    #[error("sub-frame chain did not terminate after {calls} engine calls")]
    IterationCeiling { calls: usize },

    /// The output slice cannot hold the next sub-frame.
    #[error("output buffer too small: need {needed} samples, {available} available")]
    BufferTooSmall { needed: usize, available: usize },

    /// The byte stream is not a SILK stream.
    #[error("invalid SILK stream: {0}")]
    InvalidStream(String),

    /// A whole stream went through without yielding a single sample.
    #[error("no PCM decoded from {packets} packets ({failed} failed)")]
    NoAudio { packets: u64, failed: u64 },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl DecodeError {
    /// Whether the session can keep decoding after this error.
    ///
    /// Allocation and validity errors mean there is no session to continue
    /// with; everything else only spoils the current packet.
    pub fn is_recoverable(&self) -> bool {
        !matches!(
            self,
            DecodeError::AllocationFailure { .. } | DecodeError::InvalidSession
        )
    }
}

pub type Result<T> = std::result::Result<T, DecodeError>;
