#![deny(unsafe_code)]
//! CLI binary for keylight, the per-key lighting engine.
//!
//! Subcommands:
//! - `render [EFFECT...]`: composite effects for N frames, print the result
//! - `list`: print available effects and compositing backends

mod error;

use std::path::PathBuf;
use std::process;
use std::time::Duration;

use clap::{Parser, Subcommand};
use error::CliError;
use keylight_core::composite::{self, Kernel};
use keylight_core::BlendMode;
use keylight_effects::{EffectKind, LayerSpec, LayerStack, Scene};
use serde_json::Value;
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

#[derive(Parser)]
#[command(name = "keylight", about = "Per-key keyboard lighting engine")]
struct Cli {
    /// Output as JSON instead of human-readable text.
    #[arg(long, global = true)]
    json: bool,

    /// Log more (-v debug, -vv trace). Logs go to stderr.
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Composite effects for N frames and print the final key colors.
    Render {
        /// Effect names, bottom layer first (e.g. "fill stars").
        effects: Vec<String>,

        /// Load the whole scene from a JSON file instead of flags.
        #[arg(long, conflicts_with_all = ["effects", "keys", "frames", "interval_ms", "mode", "params", "seed"])]
        scene: Option<PathBuf>,

        /// Number of keys.
        #[arg(short, long, default_value_t = 16)]
        keys: usize,

        /// Number of frames to render.
        #[arg(short, long, default_value_t = 1)]
        frames: usize,

        /// Milliseconds between frames.
        #[arg(long, default_value_t = 16)]
        interval_ms: u64,

        /// Blend mode for every layer above the bottom one (normal, multiply).
        #[arg(short, long, default_value = "normal")]
        mode: String,

        /// Effect parameters as a JSON object keyed by effect name.
        #[arg(long, default_value = "{}")]
        params: String,

        /// Compositing backend (auto, generic, sse2, avx2).
        #[arg(short, long, default_value = "auto")]
        backend: String,

        /// PRNG seed for deterministic output.
        #[arg(long, default_value_t = 42)]
        seed: u64,
    },
    /// List available effects and compositing backends.
    List,
}

/// Settings for a scene assembled from command line flags.
struct SceneFlags {
    effects: Vec<String>,
    keys: usize,
    frames: usize,
    interval_ms: u64,
    mode: String,
    params: String,
    seed: u64,
}

fn build_scene(flags: SceneFlags) -> Result<Scene, CliError> {
    if flags.effects.is_empty() {
        return Err(CliError::Input("no effects given (or use --scene)".into()));
    }
    let mode = BlendMode::from_name(&flags.mode)
        .ok_or_else(|| CliError::Input(format!("unknown blend mode: {}", flags.mode)))?;
    let params: Value = serde_json::from_str(&flags.params)
        .map_err(|e| CliError::Input(format!("invalid --params JSON: {e}")))?;
    if !params.is_object() {
        return Err(CliError::Input("--params must be a JSON object".into()));
    }

    let mut scene = Scene::new(flags.keys, flags.seed);
    scene.frames = flags.frames;
    scene.interval_ms = flags.interval_ms;
    scene.layers = flags
        .effects
        .iter()
        .enumerate()
        .map(|(index, name)| {
            let mut layer = LayerSpec::new(name);
            if let Some(p) = params.get(name) {
                layer.params = p.clone();
            }
            if index > 0 {
                layer.blend_mode = mode;
            }
            layer
        })
        .collect();
    scene.validate()?;
    Ok(scene)
}

fn select_backend(name: &str) -> Result<&'static dyn Kernel, CliError> {
    if name == "auto" {
        return Ok(composite::kernel());
    }
    composite::by_name(name).map_err(|e| CliError::Input(e.to_string()))
}

fn run(cli: Cli) -> Result<(), CliError> {
    match cli.command {
        Command::List => {
            let effects = EffectKind::list_effects();
            let backends: Vec<&str> = composite::available().iter().map(|k| k.name()).collect();
            if cli.json {
                let info = serde_json::json!({
                    "effects": effects,
                    "backends": backends,
                    "selected": composite::kernel().name(),
                });
                println!("{}", serde_json::to_string_pretty(&info)?);
            } else {
                println!("Effects:");
                for name in effects {
                    println!("  {name}");
                }
                println!("Backends:");
                println!("  {} (selected: {})", backends.join(", "), composite::kernel().name());
            }
        }
        Command::Render {
            effects,
            scene,
            keys,
            frames,
            interval_ms,
            mode,
            params,
            backend,
            seed,
        } => {
            let scene = match scene {
                Some(path) => Scene::load(path)?,
                None => build_scene(SceneFlags {
                    effects,
                    keys,
                    frames,
                    interval_ms,
                    mode,
                    params,
                    seed,
                })?,
            };
            let kernel = select_backend(&backend)?;
            tracing::debug!(backend = kernel.name(), frames = scene.frames, "rendering");

            let mut stack = LayerStack::from_scene(&scene)?;
            let interval = Duration::from_millis(scene.interval_ms);
            for frame in 0..scene.frames {
                let elapsed = if frame == 0 { Duration::ZERO } else { interval };
                stack.render_frame_with(kernel, elapsed);
            }

            let entries: Vec<String> = stack.output().iter().map(|c| c.to_hex()).collect();
            if cli.json {
                let info = serde_json::json!({
                    "keys": scene.keys,
                    "frames": scene.frames,
                    "seed": scene.seed,
                    "backend": kernel.name(),
                    "entries": entries,
                });
                println!("{}", serde_json::to_string_pretty(&info)?);
            } else {
                for hex in entries {
                    println!("{hex}");
                }
            }
        }
    }

    Ok(())
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => Level::WARN,
        1 => Level::DEBUG,
        _ => Level::TRACE,
    };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .finish();
    if tracing::subscriber::set_global_default(subscriber).is_err() {
        eprintln!("warning: logging already initialised");
    }
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);
    let json_mode = cli.json;
    if let Err(e) = run(cli) {
        if json_mode {
            eprintln!("{}", serde_json::to_string_pretty(&e.to_json()).unwrap_or_default());
        } else {
            eprintln!("error: {e}");
        }
        process::exit(e.exit_code());
    }
}
