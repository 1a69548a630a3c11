//! Cloudverb offline renderer
//!
//! Runs a WAV file (or a unit impulse) through the reverb and writes the
//! result as 32-bit float WAV.
//!
//! ## Usage
//!
//! ```text
//! cloudverb-render <input.wav | --impulse> <output.wav> [--config FILE] [--stereo] [--tail SECONDS]
//! ```
//!
//! - `--config FILE`: YAML [`ReverbConfig`] with parameter overrides
//! - `--stereo`: render a Left/Right pair sharing the configuration
//! - `--tail SECONDS`: silence appended so the tail can ring out (default 5)
//!
//! Multi-channel input is downmixed to mono. Set `RUST_LOG=debug` for
//! verbose output.

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};

use cloudverb_core::config::read_config;
use cloudverb_core::{Arena, ChannelSide, ReverbConfig, ReverbController};

const USAGE: &str = "Usage: cloudverb-render <input.wav | --impulse> <output.wav> \
                     [--config FILE] [--stereo] [--tail SECONDS]";

const DEFAULT_TAIL_SECONDS: f32 = 5.0;

/// Where the dry signal comes from
#[derive(Debug, Clone, PartialEq)]
enum Source {
    File(PathBuf),
    Impulse,
}

#[derive(Debug, Clone, PartialEq)]
struct Args {
    source: Source,
    output: PathBuf,
    config: Option<PathBuf>,
    stereo: bool,
    tail_seconds: f32,
}

fn parse_args(args: &[String]) -> Result<Args> {
    let mut positional = Vec::new();
    let mut impulse = false;
    let mut config = None;
    let mut stereo = false;
    let mut tail_seconds = DEFAULT_TAIL_SECONDS;

    let mut iter = args.iter();
    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "--impulse" => impulse = true,
            "--stereo" => stereo = true,
            "--config" => {
                let path = iter.next().context("--config needs a file")?;
                config = Some(PathBuf::from(path));
            }
            "--tail" => {
                let value = iter.next().context("--tail needs a number of seconds")?;
                tail_seconds = value
                    .parse()
                    .with_context(|| format!("Invalid --tail value: {}", value))?;
                if !(tail_seconds >= 0.0 && tail_seconds.is_finite()) {
                    bail!("--tail must be a non-negative number of seconds");
                }
            }
            flag if flag.starts_with("--") => bail!("Unknown option: {}", flag),
            _ => positional.push(PathBuf::from(arg)),
        }
    }

    let (source, output) = match (impulse, positional.as_slice()) {
        (true, [output]) => (Source::Impulse, output.clone()),
        (false, [input, output]) => (Source::File(input.clone()), output.clone()),
        _ => bail!("{}", USAGE),
    };

    Ok(Args {
        source,
        output,
        config,
        stereo,
        tail_seconds,
    })
}

/// Read a WAV file as mono samples, returning them with the sample rate
fn read_wav(path: &Path) -> Result<(Vec<f32>, u32)> {
    let reader =
        hound::WavReader::open(path).with_context(|| format!("Failed to open {:?}", path))?;
    let spec = reader.spec();
    let channels = spec.channels.max(1) as usize;

    log::info!(
        "Input: {} ch, {} Hz, {}-bit {:?}",
        channels,
        spec.sample_rate,
        spec.bits_per_sample,
        spec.sample_format
    );

    let samples: Vec<f32> = match spec.sample_format {
        hound::SampleFormat::Int => {
            let scale = 1.0 / (1i64 << (spec.bits_per_sample - 1)) as f32;
            reader
                .into_samples::<i32>()
                .map(|s| s.map(|v| v as f32 * scale))
                .collect::<Result<Vec<f32>, _>>()
        }
        hound::SampleFormat::Float => reader.into_samples::<f32>().collect::<Result<Vec<f32>, _>>(),
    }
    .with_context(|| format!("Failed to decode {:?}", path))?;

    let mono = samples
        .chunks(channels)
        .map(|frame| frame.iter().sum::<f32>() / channels as f32)
        .collect();
    Ok((mono, spec.sample_rate))
}

fn write_wav(path: &Path, channels: u16, sample_rate: u32, interleaved: &[f32]) -> Result<()> {
    let spec = hound::WavSpec {
        channels,
        sample_rate,
        bits_per_sample: 32,
        sample_format: hound::SampleFormat::Float,
    };
    let mut writer =
        hound::WavWriter::create(path, spec).with_context(|| format!("Failed to create {:?}", path))?;
    for &sample in interleaved {
        writer.write_sample(sample)?;
    }
    writer.finalize().with_context(|| format!("Failed to finalize {:?}", path))?;
    Ok(())
}

/// Append `tail` samples of silence and round up to whole blocks
fn pad_input(mut input: Vec<f32>, tail: usize, block_size: usize) -> Vec<f32> {
    let len = (input.len() + tail).div_ceil(block_size) * block_size;
    input.resize(len, 0.0);
    input
}

fn render(config: &ReverbConfig, input: &[f32]) -> Result<Vec<f32>> {
    let mut arena = Arena::new(ReverbController::required_bytes(config));
    let mut alloc = arena.allocator();
    let mut reverb = ReverbController::new(config, &mut alloc)
        .with_context(|| format!("Failed to build {} channel", config.side.name()))?;

    let mut output = vec![0.0; input.len()];
    reverb.tick_mixed(input, &mut output);
    Ok(output)
}

fn load_reverb_config(path: Option<&Path>) -> Result<ReverbConfig> {
    let Some(path) = path else {
        return Ok(ReverbConfig::default());
    };
    let config = read_config(path)?;
    for (param, raw) in config.parameter_overrides() {
        log::info!(
            "  {} = {} ({}{})",
            param.name(),
            raw,
            param.scale(raw),
            param.unit()
        );
    }
    Ok(config)
}

fn run(args: Args) -> Result<()> {
    let mut config = load_reverb_config(args.config.as_deref())?;

    let input = match &args.source {
        Source::File(path) => {
            let (samples, sample_rate) = read_wav(path)?;
            if sample_rate != config.sample_rate {
                log::info!("Using the input's sample rate {} Hz", sample_rate);
                config.sample_rate = sample_rate;
            }
            samples
        }
        Source::Impulse => vec![1.0],
    };
    config.validate().context("Invalid reverb configuration")?;

    let tail = (args.tail_seconds * config.sample_rate_f32()) as usize;
    let input = pad_input(input, tail, config.block_size);
    log::info!(
        "Rendering {} samples ({:.2}s) {}",
        input.len(),
        input.len() as f32 / config.sample_rate_f32(),
        if args.stereo { "stereo" } else { "mono" }
    );

    let (channels, interleaved) = if args.stereo {
        let left = render(&config.with_side(ChannelSide::Left), &input)?;
        let right = render(&config.with_side(ChannelSide::Right), &input)?;
        let interleaved: Vec<f32> = left.iter().zip(&right).flat_map(|(&l, &r)| [l, r]).collect();
        (2, interleaved)
    } else {
        (1, render(&config, &input)?)
    };

    let peak = interleaved.iter().fold(0.0f32, |peak, &s| peak.max(s.abs()));
    log::info!("Peak level {:.1} dBFS", 20.0 * peak.max(1e-10).log10());

    write_wav(&args.output, channels, config.sample_rate, &interleaved)?;
    log::info!("Wrote {:?}", args.output);
    Ok(())
}

fn main() -> Result<()> {
    // Set RUST_LOG=debug for verbose output
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp_millis()
        .init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let args = parse_args(&args)?;
    run(args)
}
