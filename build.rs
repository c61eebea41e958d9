use std::fs;
use std::path::Path;
use serde::Deserialize;

#[derive(Deserialize)]
struct Config {
    application: Application,
    decoder: Decoder,
    stream: Stream,
    log: Log,
}

#[derive(Deserialize)]
struct Application {
    name: String,
    version: String,
}

#[derive(Deserialize)]
struct Decoder {
    sample_rate: i32,
    frames_per_packet: i32,
    max_internal_frames: usize,
    max_engine_calls: usize,
}

#[derive(Deserialize)]
struct Stream {
    chunk_size: usize,
}

#[derive(Deserialize)]
struct Log {
    filter: String,
}

// 在编译时读取 config.toml 并设置环境变量
fn main() {
    println!("cargo:rerun-if-changed=config.toml");

    let config_path = Path::new("config.toml");
    if !config_path.exists() {
        panic!("config.toml not found!");
    }

    let config_str = fs::read_to_string(config_path).expect("Failed to read config.toml");
    let config: Config = toml::from_str(&config_str).expect("Failed to parse config.toml");

    if config.decoder.max_engine_calls <= config.decoder.max_internal_frames {
        panic!("decoder.max_engine_calls must be larger than decoder.max_internal_frames");
    }

    println!("cargo:rustc-env=APP_NAME={}", config.application.name);
    println!("cargo:rustc-env=APP_VERSION={}", config.application.version);

    // 解码器配置
    println!("cargo:rustc-env=DECODER_SAMPLE_RATE={}", config.decoder.sample_rate);
    println!("cargo:rustc-env=DECODER_FRAMES_PER_PACKET={}", config.decoder.frames_per_packet);
    println!("cargo:rustc-env=DECODER_MAX_INTERNAL_FRAMES={}", config.decoder.max_internal_frames);
    println!("cargo:rustc-env=DECODER_MAX_ENGINE_CALLS={}", config.decoder.max_engine_calls);

    println!("cargo:rustc-env=STREAM_CHUNK_SIZE={}", config.stream.chunk_size);
    println!("cargo:rustc-env=LOG_FILTER={}", config.log.filter);

    if std::env::var_os("CARGO_FEATURE_SILK_SDK").is_some() {
        link_silk_sdk();
    }
}

// SILK SDK 链接：musl 使用静态库，其他目标通过 pkg-config 查找
fn link_silk_sdk() {
    let target = std::env::var("TARGET").unwrap_or_default();

    if target.contains("musl") {
        if let Ok(sysroot) = std::env::var("MUSL_SYSROOT") {
            println!("cargo:rustc-link-search=native={}/usr/lib", sysroot);
        }
        println!("cargo:rustc-link-lib=static=SKP_SILK_SDK");
        return;
    }

    pkg_config::Config::new()
        .probe("SKP_SILK_SDK")
        .expect("Failed to find SKP_SILK_SDK. Build the SILK SDK and expose it via pkg-config.");
}
