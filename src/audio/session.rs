//! Decode session lifecycle: state allocation, rate control and the
//! handle used by callers that create and destroy sessions explicitly.

use super::engine::{CodecEngine, DecodeControl, DEFAULT_SAMPLE_RATE};
use super::error::{DecodeError, Result};
use super::frame_loop::{decode_packet, LoopLimits, PacketReport, PacketStatus};

/// Parameters a session starts with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionSettings {
    pub sample_rate: i32,
    pub frames_per_packet: i32,
    pub limits: LoopLimits,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            sample_rate: DEFAULT_SAMPLE_RATE,
            frames_per_packet: 1,
            limits: LoopLimits::default(),
        }
    }
}

/// Running totals over the life of a session.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct DecodeStats {
    pub packets: u64,
    pub subframes: u64,
    pub bytes: u64,
    /// Times the sub-frame reset valve tripped.
    pub runaway_resets: u64,
    pub discarded_samples: u64,
    pub partial_packets: u64,
    pub failed_packets: u64,
}

impl DecodeStats {
    fn record(&mut self, report: &PacketReport) {
        self.packets += 1;
        self.subframes += report.subframes as u64;
        self.bytes += report.bytes as u64;
        self.runaway_resets += report.resets as u64;
        self.discarded_samples += report.discarded_samples as u64;
        if report.status == PacketStatus::Partial {
            self.partial_packets += 1;
        }
    }
}

/// One decode stream: an engine, the opaque state it works on and the
/// control record passed to it on every call.
pub struct DecoderSession<E: CodecEngine> {
    engine: E,
    state: Box<[u8]>,
    control: DecodeControl,
    limits: LoopLimits,
    stats: DecodeStats,
}

impl<E: CodecEngine> DecoderSession<E> {
    /// Create a session decoding to 24 kHz, one frame per packet.
    pub fn new(engine: E) -> Result<Self> {
        Self::with_settings(engine, SessionSettings::default())
    }

    pub fn with_settings(engine: E, settings: SessionSettings) -> Result<Self> {
        if !engine.supports_sample_rate(settings.sample_rate) {
            return Err(DecodeError::InvalidSampleRate(settings.sample_rate));
        }

        let size = engine.state_size();
        let mut state = allocate_state(size)?;
        engine
            .init_state(&mut state)
            .map_err(|source| DecodeError::DecodeFailure {
                subframe: 0,
                source,
            })?;

        log::debug!(
            "Decoder session created: state={} bytes, rate={}Hz, frames/packet={}",
            size,
            settings.sample_rate,
            settings.frames_per_packet
        );

        Ok(Self {
            engine,
            state,
            control: DecodeControl {
                sample_rate: settings.sample_rate,
                frames_per_packet: settings.frames_per_packet,
                ..DecodeControl::default()
            },
            limits: settings.limits,
            stats: DecodeStats::default(),
        })
    }

    /// Change the rate the engine resamples its output to.
    pub fn set_sample_rate(&mut self, rate: i32) -> Result<()> {
        if !self.engine.supports_sample_rate(rate) {
            return Err(DecodeError::InvalidSampleRate(rate));
        }
        if rate != self.control.sample_rate {
            log::info!(
                "Decoder sample rate {}Hz -> {}Hz",
                self.control.sample_rate,
                rate
            );
        }
        self.control.sample_rate = rate;
        Ok(())
    }

    pub fn sample_rate(&self) -> i32 {
        self.control.sample_rate
    }

    pub fn control(&self) -> &DecodeControl {
        &self.control
    }

    pub fn stats(&self) -> &DecodeStats {
        &self.stats
    }

    pub fn engine(&self) -> &E {
        &self.engine
    }

    /// Decode one packet into `output`, returning the number of PCM bytes
    /// written (two per sample).
    pub fn decode(&mut self, input: &[u8], output: &mut [i16]) -> Result<usize> {
        self.decode_packet(input, output).map(|report| report.bytes)
    }

    /// Like [`decode`](Self::decode) but returns the full packet accounting.
    pub fn decode_packet(&mut self, input: &[u8], output: &mut [i16]) -> Result<PacketReport> {
        let result = decode_packet(
            &self.engine,
            &mut self.state,
            &mut self.control,
            input,
            output,
            &self.limits,
        );
        match &result {
            Ok(report) => self.stats.record(report),
            Err(e) => {
                self.stats.failed_packets += 1;
                log::error!("Packet decode error: {}", e);
            }
        }
        result
    }
}

fn allocate_state(size: usize) -> Result<Box<[u8]>> {
    if size == 0 {
        return Err(DecodeError::AllocationFailure { bytes: 0 });
    }
    let mut state = Vec::new();
    state
        .try_reserve_exact(size)
        .map_err(|_| DecodeError::AllocationFailure { bytes: size })?;
    state.resize(size, 0u8);
    Ok(state.into_boxed_slice())
}

/// A session reference that can be destroyed explicitly and reports
/// [`DecodeError::InvalidSession`] when used afterwards.
pub struct SessionHandle<E: CodecEngine> {
    session: Option<DecoderSession<E>>,
}

impl<E: CodecEngine> SessionHandle<E> {
    pub fn create(engine: E) -> Result<Self> {
        Self::create_with(engine, SessionSettings::default())
    }

    pub fn create_with(engine: E, settings: SessionSettings) -> Result<Self> {
        Ok(Self {
            session: Some(DecoderSession::with_settings(engine, settings)?),
        })
    }

    /// A handle that owns no session.
    pub fn null() -> Self {
        Self { session: None }
    }

    pub fn is_live(&self) -> bool {
        self.session.is_some()
    }

    /// Release the engine state and the session. Does nothing on a handle
    /// that is already empty.
    pub fn destroy(&mut self) {
        if let Some(session) = self.session.take() {
            log::debug!(
                "Decoder session destroyed after {} packets",
                session.stats.packets
            );
        }
    }

    pub fn set_sample_rate(&mut self, rate: i32) -> Result<()> {
        self.session_mut()?.set_sample_rate(rate)
    }

    pub fn decode(&mut self, input: &[u8], output: &mut [i16]) -> Result<usize> {
        self.session_mut()?.decode(input, output)
    }

    pub fn decode_packet(&mut self, input: &[u8], output: &mut [i16]) -> Result<PacketReport> {
        self.session_mut()?.decode_packet(input, output)
    }

    pub fn session(&self) -> Result<&DecoderSession<E>> {
        self.session.as_ref().ok_or(DecodeError::InvalidSession)
    }

    pub fn session_mut(&mut self) -> Result<&mut DecoderSession<E>> {
        self.session.as_mut().ok_or(DecodeError::InvalidSession)
    }
}

impl<E: CodecEngine> From<DecoderSession<E>> for SessionHandle<E> {
    fn from(session: DecoderSession<E>) -> Self {
        Self {
            session: Some(session),
        }
    }
}
