use std::{
    path::{Path, PathBuf},
    time::{Duration, Instant},
};

use clap::{Parser, Subcommand};
use hanabi_core::{
    AssetStore, AudioBackend, AudioBuffer, DeviceFeed, EngineConfig, HanabiError, RenderGraph,
    Simulation,
};
use tracing_subscriber::EnvFilter;

fn main() -> hanabi_core::Result<()> {
    init_tracing();

    let cli = Cli::parse();

    match cli.command {
        Commands::Run(args) => run(args),
        Commands::Config { output } => print_config(output.as_deref()),
    }
}

fn run(args: RunArgs) -> hanabi_core::Result<()> {
    let mut config = match &args.config {
        Some(path) => EngineConfig::from_path(path)?,
        None => EngineConfig::default(),
    };
    if args.seed.is_some() {
        config.seed = args.seed;
    }
    if args.mute {
        config.audio.primary = None;
        config.audio.secondary = None;
    }
    tracing::info!(frames = args.frames, seed = ?config.seed, "starting fireworks");

    let sprite = AssetStore::new().resolve_sprite(config.render.glow_texture.as_deref());
    let frame_ms = config.render.frame_millis();
    let frame_rate = config.render.frame_rate as u64;

    let mut sim = Simulation::new(config, RenderGraph::with_sprite(sprite), TraceAudio)?;

    if let Some(device) = &args.camera {
        sim.attach_backdrop(&mut DeviceFeed::new(device));
    }
    // Loads finish in the background; cues before then are simply missed.
    let _loads = sim.load_audio();
    if args.consent {
        sim.grant_audio_consent();
    }

    let frame_duration = Duration::from_secs_f64(frame_ms / 1000.0);
    let mut bodies = 0;
    let mut shaped = 0;
    let mut peak_live = 0;

    for frame in 1..=args.frames {
        let started = Instant::now();
        let report = sim.frame(frame_ms);
        bodies += report.launched.bodies;
        shaped += report.launched.shaped;
        peak_live = peak_live.max(report.live_main + report.live_background);

        if frame % frame_rate == 0 {
            let summary = sim.surface().draw()?;
            tracing::info!(
                second = frame / frame_rate,
                main = report.live_main,
                background = report.live_background,
                points = summary.points,
                ghosts = summary.ghosts,
                "frame"
            );
        }

        if args.realtime {
            if let Some(rest) = frame_duration.checked_sub(started.elapsed()) {
                std::thread::sleep(rest);
            }
        }
    }

    let cues = sim.cue_stats();
    let render = sim.into_surface().stats();
    let summary = serde_json::json!({
        "frames": args.frames,
        "bodies_launched": bodies,
        "shaped_launched": shaped,
        "peak_live_entities": peak_live,
        "cues": cues,
        "render": render,
    });

    tracing::info!(bodies, shaped, cues_played = cues.played, "run finished");
    match &args.report {
        Some(path) => std::fs::write(path, serde_json::to_string_pretty(&summary)?)?,
        None => println!("{}", serde_json::to_string_pretty(&summary)?),
    }
    Ok(())
}

fn print_config(output: Option<&Path>) -> hanabi_core::Result<()> {
    let json = EngineConfig::default().to_json_pretty()?;
    match output {
        Some(path) => {
            tracing::info!(?path, "writing default configuration");
            std::fs::write(path, json)?;
        }
        None => println!("{json}"),
    }
    Ok(())
}

/// Audio backend for headless runs: accepts any non-empty file and logs cues.
struct TraceAudio;

impl AudioBackend for TraceAudio {
    fn decode(&self, label: &str, bytes: &[u8]) -> hanabi_core::Result<AudioBuffer> {
        if bytes.is_empty() {
            return Err(HanabiError::audio(format!("`{label}` is empty")));
        }
        Ok(AudioBuffer::new(label, bytes.to_vec()))
    }

    fn resume(&self) -> hanabi_core::Result<()> {
        Ok(())
    }

    fn play(&self, buffer: &AudioBuffer) {
        tracing::debug!(cue = %buffer.label, "cue played");
    }
}

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .try_init();
}

#[derive(Parser, Debug)]
#[command(author, version, about = "Procedural fireworks simulation", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run the simulation headless and print a summary.
    Run(RunArgs),
    /// Print the default configuration as JSON.
    Config {
        /// Write to this file instead of stdout.
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

#[derive(clap::Args, Debug)]
struct RunArgs {
    /// JSON configuration file; missing fields use the defaults.
    #[arg(short, long)]
    config: Option<PathBuf>,
    /// Seed for reproducible runs.
    #[arg(short, long)]
    seed: Option<u64>,
    /// Number of frames to simulate.
    #[arg(short, long, default_value_t = 1800)]
    frames: u64,
    /// Pace frames to the configured frame rate.
    #[arg(long)]
    realtime: bool,
    /// Grant audio consent at startup.
    #[arg(long)]
    consent: bool,
    /// Skip loading sound cues.
    #[arg(long)]
    mute: bool,
    /// Video device shown behind the fireworks.
    #[arg(long)]
    camera: Option<PathBuf>,
    /// Write the summary JSON to this file instead of stdout.
    #[arg(long)]
    report: Option<PathBuf>,
}
