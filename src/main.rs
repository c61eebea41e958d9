use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::PathBuf;
use std::time::Instant;

use anyhow::Context;
use clap::Parser;
use silk_decode_rs::audio::{transcode, CodecEngine, SilkStreamDecoder};
use silk_decode_rs::{Config, DecoderSession};

/// Decode a SILK v3 voice file to raw 16-bit little-endian PCM
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Input SILK file
    #[arg(short, long)]
    input: PathBuf,

    /// Output raw PCM file
    #[arg(short, long)]
    output: PathBuf,

    /// Output sample rate (Hz); defaults to the configured decoder rate
    #[arg(short, long)]
    sample_rate: Option<i32>,
}

fn main() -> anyhow::Result<()> {
    let config = Config::new().unwrap_or_default();

    // 初始化日志
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(config.log_filter))
        .init();

    let args = Args::parse();
    log::info!("{} {} starting", config.app_name, config.app_version);

    decode_file(&config, &args)
}

#[cfg(feature = "silk-sdk")]
fn decode_file(config: &Config, args: &Args) -> anyhow::Result<()> {
    run(config, args, silk_decode_rs::audio::SilkSdkEngine::new())
}

#[cfg(not(feature = "silk-sdk"))]
fn decode_file(_config: &Config, _args: &Args) -> anyhow::Result<()> {
    anyhow::bail!("no SILK engine linked; rebuild with `--features silk-sdk`")
}

#[cfg_attr(not(feature = "silk-sdk"), allow(dead_code))]
fn run<E: CodecEngine>(config: &Config, args: &Args, engine: E) -> anyhow::Result<()> {
    let mut session = DecoderSession::with_settings(engine, config.session_settings())
        .context("Failed to create decoder session")?;
    if let Some(rate) = args.sample_rate {
        session.set_sample_rate(rate)?;
    }

    let input = File::open(&args.input)
        .with_context(|| format!("Failed to open {}", args.input.display()))?;
    let output = File::create(&args.output)
        .with_context(|| format!("Failed to create {}", args.output.display()))?;

    let start = Instant::now();
    let (_, summary) = transcode(
        BufReader::new(input),
        BufWriter::new(output),
        SilkStreamDecoder::with_session(session),
        config.stream_chunk_size,
    )
    .with_context(|| format!("Failed to decode {}", args.input.display()))?;

    let stats = summary.decode;
    log::info!(
        "Decoded {} -> {}: {} input bytes, {} packets, {} PCM bytes @ {}Hz in {:?}",
        args.input.display(),
        args.output.display(),
        summary.input_bytes,
        summary.stream.packets,
        stats.bytes,
        summary.sample_rate,
        start.elapsed(),
    );
    if stats.runaway_resets > 0 || stats.failed_packets > 0 {
        log::warn!(
            "{} sub-frame resets ({} samples discarded), {} failed packets",
            stats.runaway_resets,
            stats.discarded_samples,
            stats.failed_packets
        );
    }
    Ok(())
}
