//! gridsynth CLI: live playback, WAV export and preset listing.
//!
//! Usage:
//!   gs-cli play --drums pattern.json
//!   gs-cli play --demo --seconds 10
//!   gs-cli render --drums pattern.json --steps 64 out.wav
//!   gs-cli presets

use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::PoisonError;
use std::time::{Duration, Instant};

use anyhow::{bail, Context};
use clap::{Args, Parser, Subcommand};
use gs_master::{
    AudioOutput, CpalOutput, GridTarget, Workstation, WorkstationBuilder, WorkstationConfig, PRESETS,
};
use tracing::warn;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "gs-cli")]
#[command(author, version, about = "Step-sequenced synth and drum machine", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Play patterns on the default audio device
    Play(PlayArgs),

    /// Render patterns offline to a WAV file
    Render(RenderArgs),

    /// List the synth presets
    Presets,
}

/// Options shared by `play` and `render`.
#[derive(Args)]
struct PatternArgs {
    /// Workstation config (TOML)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Drum pattern snapshot (JSON)
    #[arg(long)]
    drums: Option<PathBuf>,

    /// Synth pattern snapshot (JSON)
    #[arg(long)]
    synth: Option<PathBuf>,

    /// Tempo, overriding the snapshots
    #[arg(long)]
    bpm: Option<f32>,

    /// Preset name, overriding the config
    #[arg(short, long)]
    preset: Option<String>,

    /// Start from a built-in demo pattern instead of empty grids
    #[arg(long)]
    demo: bool,
}

#[derive(Args)]
struct PlayArgs {
    #[command(flatten)]
    pattern: PatternArgs,

    /// Stop after this many seconds (default: play until interrupted)
    #[arg(short, long)]
    seconds: Option<f32>,
}

#[derive(Args)]
struct RenderArgs {
    #[command(flatten)]
    pattern: PatternArgs,

    /// Number of steps to render
    #[arg(long, default_value_t = 64)]
    steps: usize,

    /// Output WAV file
    output: PathBuf,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let cli = Cli::parse();
    match cli.command {
        Commands::Play(args) => play(args),
        Commands::Render(args) => render(args),
        Commands::Presets => {
            list_presets();
            Ok(())
        }
    }
}

fn load_config(path: Option<&Path>) -> WorkstationConfig {
    let Some(path) = path else {
        return WorkstationConfig::default();
    };
    WorkstationConfig::load(path).unwrap_or_else(|err| {
        warn!(%err, "using default configuration");
        WorkstationConfig::default()
    })
}

/// Four on the floor with offbeat hats and a root/fifth bass line.
fn fill_demo<O: AudioOutput>(ws: &Workstation<O>) {
    let config = ws.config();
    let (synth_rows, drum_rows) = (config.synth_rows, config.drum_rows);
    {
        let mut drums = ws.drum_grid().write().unwrap_or_else(PoisonError::into_inner);
        for column in 0..drums.columns() {
            if column % 4 == 0 {
                drums.set(0, column, true);
            }
            if column % 8 == 4 && drum_rows > 1 {
                drums.set(1, column, true);
            }
            if column % 4 == 2 && drum_rows > 2 {
                drums.set(2, column, true);
            }
        }
    }
    let mut synth = ws.synth_grid().write().unwrap_or_else(PoisonError::into_inner);
    // rows count down from the highest pitch
    let root = synth_rows.saturating_sub(1 + 12);
    let fifth = root.saturating_sub(7);
    for column in (0..synth.columns()).step_by(2) {
        let row = if column % 8 == 6 { fifth } else { root };
        synth.set(row, column, true);
    }
}

/// Apply snapshots, tempo and preset from the command line.
fn prepare<O: AudioOutput>(ws: &mut Workstation<O>, args: &PatternArgs) -> anyhow::Result<()> {
    if args.demo {
        fill_demo(ws);
    }
    if let Some(path) = &args.synth {
        ws.load_snapshot(path, GridTarget::Synth);
    }
    if let Some(path) = &args.drums {
        ws.load_snapshot(path, GridTarget::Drums);
    }
    if let Some(bpm) = args.bpm {
        ws.set_bpm(bpm)?;
    }
    if let Some(name) = &args.preset {
        ws.load_preset_by_name(name)?;
    }
    Ok(())
}

fn play(args: PlayArgs) -> anyhow::Result<()> {
    let config = load_config(args.pattern.config.as_deref());
    let output = CpalOutput::new().context("opening audio device")?;
    let mut ws = WorkstationBuilder::new(config, output).build()?;
    prepare(&mut ws, &args.pattern)?;

    let columns = ws.config().columns;
    println!("Tempo:   {} BPM", ws.bpm().get());
    println!("Preset:  {}", ws.current_preset().preset().map_or("?", |p| p.name));
    println!("Columns: {columns}");
    println!();

    ws.play()?;
    let started = Instant::now();
    let limit = args.seconds.map(Duration::from_secs_f32);
    while limit.map_or(true, |limit| started.elapsed() < limit) {
        if let Some(column) = ws.highlighted_column() {
            let bar: String = (0..columns).map(|c| if c == column { '#' } else { '.' }).collect();
            print!("\r{bar} {:>3}", column + 1);
            let _ = std::io::stdout().flush();
        }
        std::thread::sleep(Duration::from_millis(10));
    }
    ws.stop();

    println!("\rDone.{:width$}", "", width = columns + 4);
    Ok(())
}

fn render(args: RenderArgs) -> anyhow::Result<()> {
    if args.steps == 0 {
        bail!("--steps must be at least 1");
    }
    let config = load_config(args.pattern.config.as_deref());
    let mut ws = WorkstationBuilder::headless(config).build()?;
    prepare(&mut ws, &args.pattern)?;

    println!(
        "Rendering {} steps at {} BPM to {}...",
        args.steps,
        ws.bpm().get(),
        args.output.display()
    );
    ws.render_to_wav(&args.output, args.steps)
        .with_context(|| format!("rendering {}", args.output.display()))?;
    println!("Done.");
    Ok(())
}

fn list_presets() {
    for (i, preset) in PRESETS.iter().enumerate() {
        let p = &preset.params;
        println!(
            "{i:>2}  {:<16} {:<8} dist {:.1}  cutoff {:.2}",
            preset.name,
            p.waveform.name(),
            p.distortion,
            p.cutoff
        );
    }
}
