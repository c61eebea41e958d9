//! Decoding of whole SILK v3 byte streams (as stored in `.silk` voice files).
//!
//! Layout: an optional `0x02` byte, the 9-byte `#!SILK_V3` magic, then a run
//! of packets each prefixed with its length as a little-endian `i16`.
//! Non-positive lengths are end/padding markers and are skipped.

use bytes::{Buf, BytesMut};

use super::engine::{max_subframe_samples, CodecEngine, SUBFRAME_DURATION_MS};
use super::error::{DecodeError, Result};
use super::frame_loop::MAX_INTERNAL_FRAMES;
use super::session::{DecodeStats, DecoderSession};
use super::stream_decoder::StreamDecoder;

pub const SILK_MAGIC: &[u8; 9] = b"#!SILK_V3";

/// Leading byte some producers put in front of the magic.
pub const TENCENT_PREFIX: u8 = 0x02;

/// Highest API rate in kHz the engine can be asked for.
pub const MAX_API_FS_KHZ: usize = 48;

/// PCM bytes one packet may decode to at the highest rate.
pub const MAX_PACKET_PCM_BYTES: usize =
    ((SUBFRAME_DURATION_MS * MAX_API_FS_KHZ) << 1) * MAX_INTERNAL_FRAMES;

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct StreamStats {
    pub header_found: bool,
    pub packets: u64,
    /// Length prefixes <= 0 that were skipped.
    pub markers: u64,
    /// Packets the engine failed on; their audio is lost.
    pub failed_packets: u64,
    /// Bytes still waiting for the rest of their packet.
    pub buffered_bytes: usize,
}

pub struct SilkStreamDecoder<E: CodecEngine> {
    session: DecoderSession<E>,
    remainder: BytesMut,
    scratch: Vec<i16>,
    pending: Vec<i16>,
    header_found: bool,
    closed: bool,
    packets: u64,
    markers: u64,
    failed_packets: u64,
}

impl<E: CodecEngine> SilkStreamDecoder<E> {
    pub fn new(engine: E) -> Result<Self> {
        Ok(Self::with_session(DecoderSession::new(engine)?))
    }

    pub fn with_session(session: DecoderSession<E>) -> Self {
        // One slot beyond the sub-frame limit so the reset valve, not the
        // bounds check, handles over-long chains.
        let scratch_len = (MAX_INTERNAL_FRAMES + 1) * max_subframe_samples(48000);
        Self {
            session,
            remainder: BytesMut::new(),
            scratch: vec![0i16; scratch_len],
            pending: Vec::new(),
            header_found: false,
            closed: false,
            packets: 0,
            markers: 0,
            failed_packets: 0,
        }
    }

    pub fn set_sample_rate(&mut self, rate: i32) -> Result<()> {
        self.session.set_sample_rate(rate)
    }

    pub fn session(&self) -> &DecoderSession<E> {
        &self.session
    }

    pub fn decode_stats(&self) -> &DecodeStats {
        self.session.stats()
    }

    pub fn stats(&self) -> StreamStats {
        StreamStats {
            header_found: self.header_found,
            packets: self.packets,
            markers: self.markers,
            failed_packets: self.failed_packets,
            buffered_bytes: self.remainder.len(),
        }
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    /// Feed the next chunk and return the PCM of every packet it completes.
    ///
    /// A failing packet is dropped and the rest of the chunk is still
    /// decoded. The first failure is then returned, and the PCM decoded in
    /// this call is handed out by the next call or by [`flush`](Self::flush).
    pub fn push_samples(&mut self, data: &[u8]) -> Result<Vec<i16>> {
        if self.closed || data.is_empty() {
            return Ok(Vec::new());
        }
        self.remainder.extend_from_slice(data);

        if !self.header_found && !self.consume_header()? {
            return Ok(Vec::new());
        }

        let mut first_error = None;
        while self.remainder.len() >= 2 {
            let len = i16::from_le_bytes([self.remainder[0], self.remainder[1]]);
            if len <= 0 {
                log::debug!("Skipping SILK length marker {}", len);
                self.markers += 1;
                self.remainder.advance(2);
                continue;
            }

            let len = len as usize;
            if self.remainder.len() < len + 2 {
                break;
            }

            let mut packet = self.remainder.split_to(len + 2);
            packet.advance(2);
            self.packets += 1;

            match self.session.decode_packet(&packet, &mut self.scratch) {
                Ok(report) => self
                    .pending
                    .extend_from_slice(&self.scratch[..report.samples]),
                Err(e) => {
                    self.failed_packets += 1;
                    first_error.get_or_insert(e);
                }
            }
        }

        match first_error {
            Some(e) => Err(e),
            None => Ok(std::mem::take(&mut self.pending)),
        }
    }

    /// [`push_samples`](Self::push_samples) with the PCM as little-endian bytes.
    pub fn push(&mut self, data: &[u8]) -> Result<Vec<u8>> {
        self.push_samples(data).map(samples_to_bytes)
    }

    /// Hand out any PCM still held back by a failed chunk.
    pub fn flush(&mut self) -> Vec<u8> {
        samples_to_bytes(std::mem::take(&mut self.pending))
    }

    /// Stop accepting input. Returns whatever [`flush`](Self::flush) would;
    /// calling it again returns nothing.
    pub fn close(&mut self) -> Vec<u8> {
        if self.closed {
            return Vec::new();
        }
        self.closed = true;
        if !self.remainder.is_empty() {
            log::warn!(
                "Dropping {} bytes of incomplete SILK packet at end of stream",
                self.remainder.len()
            );
            self.remainder.clear();
        }
        self.flush()
    }

    /// Returns `Ok(false)` while too few bytes have arrived to judge.
    fn consume_header(&mut self) -> Result<bool> {
        let offset = usize::from(self.remainder[0] == TENCENT_PREFIX);
        let end = offset + SILK_MAGIC.len();
        if self.remainder.len() < end {
            return Ok(false);
        }

        if &self.remainder[offset..end] != SILK_MAGIC {
            let head = String::from_utf8_lossy(&self.remainder[offset..end]).into_owned();
            self.remainder.clear();
            return Err(DecodeError::InvalidStream(format!(
                "missing {} header, found {:?}",
                String::from_utf8_lossy(SILK_MAGIC),
                head
            )));
        }

        self.remainder.advance(end);
        self.header_found = true;
        log::debug!("SILK header found (prefixed: {})", offset == 1);
        Ok(true)
    }
}

impl<E: CodecEngine + Send> StreamDecoder for SilkStreamDecoder<E> {
    fn decode(&mut self, data: &[u8]) -> anyhow::Result<Vec<i16>> {
        Ok(self.push_samples(data)?)
    }
}

pub fn samples_to_bytes(samples: Vec<i16>) -> Vec<u8> {
    let mut bytes = Vec::with_capacity(samples.len() * 2);
    for s in samples {
        bytes.extend_from_slice(&s.to_le_bytes());
    }
    bytes
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::engine::{DecodeControl, EngineError, Subframe};

    /// Emits one sub-frame per call whose samples all equal the first
    /// payload byte; `0xEE` fails the packet.
    struct EchoEngine;

    impl CodecEngine for EchoEngine {
        fn state_size(&self) -> usize {
            8
        }

        fn init_state(&self, _state: &mut [u8]) -> std::result::Result<(), EngineError> {
            Ok(())
        }

        fn decode_subframe(
            &self,
            _state: &mut [u8],
            control: &mut DecodeControl,
            _lost: bool,
            input: &[u8],
            output: &mut [i16],
        ) -> std::result::Result<Subframe, EngineError> {
            if input[0] == 0xEE {
                return Err(EngineError::Status(-1));
            }
            control.more_internal_frames = false;
            let n = 4;
            output[..n].fill(i16::from(input[0]));
            Ok(Subframe::decoded(n))
        }
    }

    fn packet(body: &[u8]) -> Vec<u8> {
        let mut p = (body.len() as i16).to_le_bytes().to_vec();
        p.extend_from_slice(body);
        p
    }

    #[test]
    fn scratch_covers_one_slot_past_the_limit() {
        let decoder = SilkStreamDecoder::new(EchoEngine).unwrap();
        assert_eq!(decoder.scratch.len(), 5760);
        assert_eq!(MAX_PACKET_PCM_BYTES, 9600);
    }

    #[test]
    fn header_split_across_chunks() {
        let mut decoder = SilkStreamDecoder::new(EchoEngine).unwrap();
        assert!(decoder.push(b"\x02#!SIL").unwrap().is_empty());
        assert!(!decoder.stats().header_found);
        let mut rest = b"K_V3".to_vec();
        rest.extend(packet(&[7, 1, 1]));
        let pcm = decoder.push_samples(&rest).unwrap();
        assert_eq!(pcm, vec![7; 4]);
        assert!(decoder.stats().header_found);
    }

    #[test]
    fn failed_packet_does_not_stop_the_rest_of_the_chunk() {
        let mut decoder = SilkStreamDecoder::new(EchoEngine).unwrap();
        let mut data = SILK_MAGIC.to_vec();
        data.extend(packet(&[3, 0]));
        data.extend(packet(&[0xEE]));
        data.extend(packet(&[5]));
        data.extend(packet(&[6, 6]));

        assert!(matches!(
            decoder.push(&data),
            Err(DecodeError::DecodeFailure { .. })
        ));
        let mut expected = vec![3; 4];
        expected.extend([5; 4]);
        expected.extend([6; 4]);
        assert_eq!(decoder.flush(), samples_to_bytes(expected));
        assert_eq!(decoder.stats().buffered_bytes, 0);
        assert_eq!(decoder.stats().packets, 4);
        assert_eq!(decoder.stats().failed_packets, 1);
    }

    #[test]
    fn first_of_several_failures_is_reported() {
        let mut decoder = SilkStreamDecoder::new(EchoEngine).unwrap();
        let mut data = SILK_MAGIC.to_vec();
        data.extend(packet(&[0xEE, 1]));
        data.extend(packet(&[2]));
        data.extend(packet(&[0xEE]));

        match decoder.push_samples(&data) {
            Err(DecodeError::DecodeFailure { subframe: 0, .. }) => {}
            other => panic!("expected DecodeFailure, got {:?}", other),
        }
        assert_eq!(decoder.stats().failed_packets, 2);
        assert_eq!(decoder.close(), samples_to_bytes(vec![2; 4]));
    }

    #[test]
    fn usable_as_boxed_stream_decoder() {
        let mut decoder: Box<dyn StreamDecoder> =
            Box::new(SilkStreamDecoder::new(EchoEngine).unwrap());
        let mut data = SILK_MAGIC.to_vec();
        data.extend(packet(&[9]));
        assert_eq!(decoder.decode(&data).unwrap(), vec![9; 4]);
        assert!(decoder.decode(b"\x05\x00ab").unwrap().is_empty());
    }

    #[test]
    fn samples_are_little_endian() {
        assert_eq!(samples_to_bytes(vec![0x0102, -1]), vec![0x02, 0x01, 0xFF, 0xFF]);
    }
}
