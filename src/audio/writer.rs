//! `io::Write` adapter: SILK bytes in, PCM bytes out to an inner writer.

use std::io::{self, Read, Write};

use super::engine::CodecEngine;
use super::error::{DecodeError, Result};
use super::session::DecodeStats;
use super::silk_stream::{SilkStreamDecoder, StreamStats};

pub struct PcmWriter<W: Write, E: CodecEngine> {
    output: W,
    decoder: SilkStreamDecoder<E>,
    last_chunk_len: usize,
}

impl<W: Write, E: CodecEngine> PcmWriter<W, E> {
    pub fn new(output: W, engine: E) -> Result<Self> {
        Ok(Self::with_decoder(output, SilkStreamDecoder::new(engine)?))
    }

    pub fn with_decoder(output: W, decoder: SilkStreamDecoder<E>) -> Self {
        Self {
            output,
            decoder,
            last_chunk_len: 0,
        }
    }

    pub fn decoder(&self) -> &SilkStreamDecoder<E> {
        &self.decoder
    }

    pub fn decoder_mut(&mut self) -> &mut SilkStreamDecoder<E> {
        &mut self.decoder
    }

    /// PCM bytes produced by the most recent `write`.
    pub fn last_chunk_len(&self) -> usize {
        self.last_chunk_len
    }

    /// Close the decoder, write out anything it still held and return the
    /// inner writer.
    pub fn finish(mut self) -> Result<W> {
        let tail = self.decoder.close();
        if !tail.is_empty() {
            self.output.write_all(&tail)?;
        }
        self.output.flush()?;
        Ok(self.output)
    }
}

impl<W: Write, E: CodecEngine> Write for PcmWriter<W, E> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let pcm = self
            .decoder
            .push(buf)
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
        self.last_chunk_len = pcm.len();
        if !pcm.is_empty() {
            self.output.write_all(&pcm)?;
        }
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        let pending = self.decoder.flush();
        if !pending.is_empty() {
            self.output.write_all(&pending)?;
        }
        self.output.flush()
    }
}

/// Totals for one [`transcode`] run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TranscodeSummary {
    pub input_bytes: usize,
    pub sample_rate: i32,
    pub stream: StreamStats,
    pub decode: DecodeStats,
}

/// Decode all of `input` into `output`, `chunk_size` bytes at a time.
///
/// Packets the engine fails on are logged and skipped. A missing header,
/// an output error or a stream that yields no PCM at all ends the run with
/// an error.
pub fn transcode<R: Read, W: Write, E: CodecEngine>(
    mut input: R,
    output: W,
    decoder: SilkStreamDecoder<E>,
    chunk_size: usize,
) -> Result<(W, TranscodeSummary)> {
    let mut writer = PcmWriter::with_decoder(output, decoder);
    let mut chunk = vec![0u8; chunk_size.max(1)];
    let mut input_bytes = 0usize;
    loop {
        let n = input.read(&mut chunk)?;
        if n == 0 {
            break;
        }
        input_bytes += n;
        if let Err(e) = writer.write_all(&chunk[..n]) {
            match into_decode_error(e) {
                err @ DecodeError::Io(_) => return Err(err),
                err if writer.decoder().stats().header_found && err.is_recoverable() => {
                    log::error!("Decode error at input offset {}: {}", input_bytes, err);
                }
                err => return Err(err),
            }
        }
    }

    let summary = TranscodeSummary {
        input_bytes,
        sample_rate: writer.decoder().session().sample_rate(),
        stream: writer.decoder().stats(),
        decode: *writer.decoder().decode_stats(),
    };
    let output = writer.finish()?;

    if summary.decode.bytes == 0 {
        return Err(DecodeError::NoAudio {
            packets: summary.stream.packets,
            failed: summary.stream.failed_packets,
        });
    }
    Ok((output, summary))
}

/// Recover the decoder error `PcmWriter::write` wrapped in an `io::Error`.
fn into_decode_error(e: io::Error) -> DecodeError {
    if !e.get_ref().is_some_and(|inner| inner.is::<DecodeError>()) {
        return DecodeError::Io(e);
    }
    match e.into_inner().map(|inner| inner.downcast::<DecodeError>()) {
        Some(Ok(err)) => *err,
        _ => DecodeError::InvalidStream("unreadable decoder error".to_string()),
    }
}
