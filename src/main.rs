//! narrate - Convert plain-text files into narrated audio using neural TTS

mod audio;
mod config;
mod text;
mod tts;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use config::NarrateConfig;
use indicatif::{ProgressBar, ProgressStyle};
use std::path::{Path, PathBuf};
use tts::{SpeechService, SynthesisOptions};

/// Synthesis attempts per chunk before the run aborts.
const MAX_RETRIES: u32 = 3;

#[derive(Parser, Debug)]
#[command(name = "narrate")]
#[command(about = "Convert plain-text files into narrated audio using neural TTS", long_about = None)]
#[command(version)]
struct Args {
    /// Path to the source text file
    input: Option<PathBuf>,

    /// Output file path (default: <input-name>.mp3)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Voice short name, e.g. "en-US-JennyNeural"
    #[arg(short, long)]
    voice: Option<String>,

    /// Speech rate adjustment, e.g. "+10%" for faster or "-10%" for slower
    #[arg(long)]
    rate: Option<String>,

    /// Speech pitch adjustment, e.g. "+2Hz" or "-2Hz"
    #[arg(long)]
    pitch: Option<String>,

    /// Maximum characters per request to the speech service
    #[arg(long)]
    max_chars: Option<usize>,

    /// Speech service region, e.g. "westeurope"
    #[arg(long)]
    region: Option<String>,

    /// Enable debug output
    #[arg(short, long, default_value_t = false)]
    debug: bool,

    /// Subcommands
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// List the voices available from the speech service
    Voices,
    /// Configuration management
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand, Debug)]
enum ConfigAction {
    /// Show current configuration
    Show,
    /// Set the default voice
    SetVoice {
        /// Voice short name, e.g. "en-US-JennyNeural"
        voice: String,
    },
    /// Set the default rate adjustment
    SetRate {
        /// Signed percentage, e.g. "+10%"
        rate: String,
    },
    /// Set the default pitch adjustment
    SetPitch {
        /// Signed Hz offset, e.g. "-2Hz"
        pitch: String,
    },
    /// Set the default maximum characters per request
    SetMaxChars {
        /// Value (at least 1)
        value: usize,
    },
    /// Set the speech service region
    SetRegion {
        /// Region name, e.g. "eastus"
        region: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    if args.debug {
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("debug")).init();
    } else {
        env_logger::init();
    }

    let config = NarrateConfig::load().context("Failed to load configuration")?;

    match &args.command {
        Some(Commands::Voices) => return list_voices(&args, &config).await,
        Some(Commands::Config { action }) => return handle_config_command(action),
        None => {}
    }

    let input_path = args.input.clone().ok_or_else(|| {
        anyhow::anyhow!("Input file path is required. Run 'narrate --help' for usage.")
    })?;

    if !input_path.exists() {
        anyhow::bail!("Input file not found: {}", input_path.display());
    }

    let output_path = args
        .output
        .clone()
        .unwrap_or_else(|| default_output_path(&input_path));

    let options = build_options(&args, &config)?;
    let max_chars = args.max_chars.unwrap_or(config.max_chars);
    if max_chars == 0 {
        anyhow::bail!("--max-chars must be at least 1");
    }

    let text = std::fs::read_to_string(&input_path)
        .with_context(|| format!("Failed to read {}", input_path.display()))?;

    eprintln!("Processing text into chunks...");
    let chunks = text::chunk_text(&text, max_chars);
    if chunks.is_empty() {
        anyhow::bail!("Input file does not contain any readable text");
    }
    eprintln!("Generating audiobook with {} chunk(s)...", chunks.len());

    let region = args.region.as_deref().or(config.region.as_deref());
    let service = tts::create_service(region)?;

    synthesize_chunks(service.as_ref(), &chunks, &options, &output_path).await?;

    let metadata = std::fs::metadata(&output_path)?;
    let size_mb = metadata.len() as f64 / (1024.0 * 1024.0);
    eprintln!("Output: {} ({:.1} MB)", output_path.display(), size_mb);

    Ok(())
}

/// Synthesize every chunk in order, appending the audio to the output file.
async fn synthesize_chunks(
    service: &dyn SpeechService,
    chunks: &[String],
    options: &SynthesisOptions,
    output_path: &Path,
) -> Result<()> {
    let mut sink = audio::AudioSink::create(output_path)?;

    let pb = ProgressBar::new(chunks.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} ({eta}) {msg}")
            .unwrap()
            .progress_chars("#>-"),
    );

    for (index, chunk) in chunks.iter().enumerate() {
        let audio = service
            .synthesize_with_retry(chunk, options, MAX_RETRIES)
            .await
            .with_context(|| format!("Failed to synthesize chunk {}/{}", index + 1, chunks.len()))?;
        sink.append(&audio)?;
        pb.inc(1);
    }

    let bytes = sink.finish()?;
    pb.finish_with_message(format!("{} chunks, {} bytes of audio", chunks.len(), bytes));

    Ok(())
}

/// Fetch and print the available voices.
async fn list_voices(args: &Args, config: &NarrateConfig) -> Result<()> {
    let region = args.region.as_deref().or(config.region.as_deref());
    let service = tts::create_service(region)?;

    eprintln!("Fetching voice list...");
    let mut voices = service
        .list_voices()
        .await
        .context("Failed to fetch voices from the speech service")?;

    voices.sort_by(|a, b| a.short_name.cmp(&b.short_name));
    for voice in &voices {
        println!(
            "{:<40} {:<8} {:<8} {}",
            voice.short_name, voice.locale, voice.gender, voice.display_name
        );
    }

    eprintln!();
    eprintln!("{} voices available", voices.len());
    eprintln!("Default voice: {}", tts::default_voice(&voices));
    Ok(())
}

/// Resolve synthesis options from flags and config, flags winning.
fn build_options(args: &Args, config: &NarrateConfig) -> Result<SynthesisOptions> {
    let voice = args
        .voice
        .clone()
        .or_else(|| config.voice.clone())
        .unwrap_or_else(|| tts::DEFAULT_VOICE.to_string());
    let rate = args.rate.clone().unwrap_or_else(|| config.rate.clone());
    let pitch = args.pitch.clone().unwrap_or_else(|| config.pitch.clone());

    if !tts::is_valid_rate(&rate) {
        anyhow::bail!("Invalid rate '{}'. Use a signed percentage like '+10%' or '-5%'", rate);
    }
    if !tts::is_valid_pitch(&pitch) {
        anyhow::bail!("Invalid pitch '{}'. Use a signed Hz offset like '+2Hz' or '-4Hz'", pitch);
    }

    Ok(SynthesisOptions::new()
        .with_voice(voice)
        .with_rate(rate)
        .with_pitch(pitch))
}

/// Derive the output path from the input file name.
fn default_output_path(input: &Path) -> PathBuf {
    match input.file_stem() {
        Some(stem) => input.with_file_name(format!("{}.mp3", stem.to_string_lossy())),
        None => PathBuf::from("audiobook.mp3"),
    }
}

fn handle_config_command(action: &ConfigAction) -> Result<()> {
    match action {
        ConfigAction::Show => {
            let config = NarrateConfig::load()?;
            println!("Configuration file: {:?}", NarrateConfig::config_path()?);
            println!();
            match &config.voice {
                Some(voice) => println!("voice = \"{}\"", voice),
                None => println!("voice = (default: {})", tts::DEFAULT_VOICE),
            }
            println!("rate = \"{}\"", config.rate);
            println!("pitch = \"{}\"", config.pitch);
            println!("max_chars = {}", config.max_chars);
            match &config.region {
                Some(region) => println!("region = \"{}\"", region),
                None => println!("region = (default: {})", tts::azure::DEFAULT_REGION),
            }
        }
        ConfigAction::SetVoice { voice } => {
            let mut config = NarrateConfig::load()?;
            config.voice = Some(voice.clone());
            config.save()?;
            println!("Default voice set to: {}", voice);
        }
        ConfigAction::SetRate { rate } => {
            if !tts::is_valid_rate(rate) {
                anyhow::bail!("Invalid rate '{}'. Use a signed percentage like '+10%'", rate);
            }
            let mut config = NarrateConfig::load()?;
            config.rate = rate.clone();
            config.save()?;
            println!("Default rate set to: {}", rate);
        }
        ConfigAction::SetPitch { pitch } => {
            if !tts::is_valid_pitch(pitch) {
                anyhow::bail!("Invalid pitch '{}'. Use a signed Hz offset like '+2Hz'", pitch);
            }
            let mut config = NarrateConfig::load()?;
            config.pitch = pitch.clone();
            config.save()?;
            println!("Default pitch set to: {}", pitch);
        }
        ConfigAction::SetMaxChars { value } => {
            if *value == 0 {
                anyhow::bail!("max_chars must be at least 1");
            }
            let mut config = NarrateConfig::load()?;
            config.max_chars = *value;
            config.save()?;
            println!("Default max_chars set to: {}", value);
        }
        ConfigAction::SetRegion { region } => {
            let mut config = NarrateConfig::load()?;
            config.region = Some(region.clone());
            config.save()?;
            println!("Speech service region set to: {}", region);
        }
    }
    Ok(())
}
