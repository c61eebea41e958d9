//! Per-packet decode loop.
//!
//! A SILK packet may chain several sub-frames; the engine raises
//! `more_internal_frames` after each one until the chain is exhausted. The loop
//! accumulates the produced PCM behind a write cursor and guards against
//! packets that claim unbounded chains in two ways:
//!
//! - a reset valve: once more than `max_internal_frames` sub-frames were
//!   decoded, everything decoded so far for the packet is dropped and the
//!   accumulators start over;
//! - a hard ceiling on engine calls per packet, past which the packet fails.

use super::engine::{CodecEngine, DecodeControl, EngineError, SubframeStatus};
use super::error::{DecodeError, Result};

/// Sub-frames a well-formed packet may hold before the reset valve trips.
pub const MAX_INTERNAL_FRAMES: usize = 5;

/// Engine calls per packet after which decoding is abandoned.
pub const MAX_ENGINE_CALLS: usize = 4 * MAX_INTERNAL_FRAMES + 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoopLimits {
    pub max_internal_frames: usize,
    pub max_engine_calls: usize,
}

impl Default for LoopLimits {
    fn default() -> Self {
        Self {
            max_internal_frames: MAX_INTERNAL_FRAMES,
            max_engine_calls: MAX_ENGINE_CALLS,
        }
    }
}

/// Outcome of one packet, as seen by the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PacketStatus {
    /// Every sub-frame was decoded from payload.
    Complete,
    /// At least one returned sub-frame was concealed by the engine.
    Partial,
    /// The reset valve tripped; output holds only post-reset sub-frames.
    Reset,
}

/// Accounting for one decoded packet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PacketReport {
    /// PCM bytes written to the front of the output buffer.
    pub bytes: usize,
    pub samples: usize,
    /// Sub-frames that contributed to `samples`.
    pub subframes: usize,
    /// Total engine calls, including sub-frames discarded by resets.
    pub engine_calls: usize,
    pub resets: usize,
    pub discarded_samples: usize,
    pub status: PacketStatus,
}

/// Decode every sub-frame of `input` into the front of `output`.
pub(crate) fn decode_packet<E: CodecEngine + ?Sized>(
    engine: &E,
    state: &mut [u8],
    control: &mut DecodeControl,
    input: &[u8],
    output: &mut [i16],
    limits: &LoopLimits,
) -> Result<PacketReport> {
    let mut cursor = 0usize;
    let mut total_samples = 0usize;
    let mut subframe_count = 0usize;
    let mut engine_calls = 0usize;
    let mut resets = 0usize;
    let mut discarded_samples = 0usize;
    let mut concealed = false;

    loop {
        if engine_calls >= limits.max_engine_calls {
            log::error!(
                "Sub-frame chain still open after {} engine calls, abandoning packet of {} bytes",
                engine_calls,
                input.len()
            );
            return Err(DecodeError::IterationCeiling {
                calls: engine_calls,
            });
        }

        let available = output.len() - cursor;
        let needed = engine.max_subframe_samples(control);
        if available < needed {
            return Err(DecodeError::BufferTooSmall { needed, available });
        }

        let subframe = engine
            .decode_subframe(state, control, false, input, &mut output[cursor..])
            .map_err(|source| DecodeError::DecodeFailure {
                subframe: subframe_count,
                source,
            })?;
        engine_calls += 1;

        if subframe.samples > available {
            return Err(DecodeError::DecodeFailure {
                subframe: subframe_count,
                source: EngineError::Overrun {
                    produced: subframe.samples,
                    capacity: available,
                },
            });
        }

        subframe_count += 1;
        cursor += subframe.samples;
        total_samples += subframe.samples;
        concealed |= subframe.status == SubframeStatus::Concealed;

        if subframe_count > limits.max_internal_frames {
            log::warn!(
                "Sub-frame count {} exceeds limit {}, discarding {} decoded samples",
                subframe_count,
                limits.max_internal_frames,
                total_samples
            );
            discarded_samples += total_samples;
            resets += 1;
            cursor = 0;
            total_samples = 0;
            subframe_count = 0;
            concealed = false;
        }

        if !control.more_internal_frames {
            break;
        }
    }

    let status = if resets > 0 {
        PacketStatus::Reset
    } else if concealed {
        PacketStatus::Partial
    } else {
        PacketStatus::Complete
    };

    Ok(PacketReport {
        bytes: total_samples * 2,
        samples: total_samples,
        subframes: subframe_count,
        engine_calls,
        resets,
        discarded_samples,
        status,
    })
}
