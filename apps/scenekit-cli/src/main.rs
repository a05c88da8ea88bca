use anyhow::bail;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use scenekit_common::ViewportSize;
use scenekit_frame::{
    EventHub, FrameLoopController, FrameTimer, HostEvent, ManualClock, ManualScheduler,
    ScenePreset, Stage, StageConfig, ViewportSync, VirtualHost,
};
use scenekit_render::{DebugTextRenderer, RenderTarget, Renderer};
use scenekit_tools::PanelValue;

#[derive(Parser)]
#[command(name = "scenekit-cli", about = "Headless scenekit runs")]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List scene presets
    Info,
    /// Step the frame loop on a simulated clock and print each frame
    Run {
        /// Scene preset; overrides the config file
        #[arg(short, long)]
        scene: Option<ScenePreset>,
        /// Stage config (.yaml, .yml or .json)
        #[arg(short, long)]
        config: Option<PathBuf>,
        /// Number of frames to render
        #[arg(short, long, default_value = "3")]
        frames: u64,
        /// Simulated display refresh rate
        #[arg(long, default_value = "60")]
        fps: f64,
        /// Print timing statistics as JSON instead of frame text
        #[arg(long)]
        json: bool,
    },
    /// Simulate a window resize and report what the viewport applied
    Resize {
        /// Starting size, e.g. 800x600
        #[arg(long, default_value = "800x600", value_parser = parse_size)]
        from: (f64, f64),
        /// New size
        #[arg(long, value_parser = parse_size)]
        to: (f64, f64),
        /// Device pixel ratio of the simulated display
        #[arg(long, default_value = "1")]
        dpr: f64,
        /// Pixel ratio cap
        #[arg(long, default_value = "2")]
        max_pixel_ratio: f64,
        /// Also double-click to toggle fullscreen
        #[arg(long)]
        fullscreen: bool,
    },
    /// Show a preset's debug panel with current values
    Panel {
        #[arg(short, long, default_value = "textures")]
        scene: ScenePreset,
    },
}

fn parse_size(s: &str) -> Result<(f64, f64), String> {
    let (w, h) = s
        .split_once(['x', 'X'])
        .ok_or_else(|| format!("expected WIDTHxHEIGHT, got {s:?}"))?;
    let parse = |v: &str| {
        v.trim()
            .parse::<f64>()
            .map_err(|e| format!("bad dimension {v:?}: {e}"))
    };
    Ok((parse(w)?, parse(h)?))
}

fn load_config(path: Option<&PathBuf>, scene: Option<ScenePreset>) -> anyhow::Result<StageConfig> {
    let mut config = match path {
        Some(path) => StageConfig::load(path)?,
        None => StageConfig::default(),
    };
    if let Some(preset) = scene {
        config.preset = preset;
    }
    Ok(config)
}

fn describe<R: Renderer>(stage: &Stage<R>) -> String {
    let target = stage.renderer.target();
    let (bw, bh) = target.drawing_buffer_size();
    format!(
        "viewport={} aspect={:.4} pixel_ratio={} buffer={}x{}",
        stage.viewport,
        stage.camera.aspect(),
        target.pixel_ratio(),
        bw,
        bh
    )
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Info => {
            println!("scenekit-cli v{}", env!("CARGO_PKG_VERSION"));
            println!("presets:");
            for preset in ScenePreset::ALL {
                let setup = preset.build(ViewportSize::default().aspect_ratio())?;
                println!(
                    "  {:<18} nodes={} rig={} panel={}",
                    preset.name(),
                    setup.scene.node_count(),
                    setup.rig.name(),
                    setup.panel.len()
                );
            }
        }
        Commands::Run {
            scene,
            config,
            frames,
            fps,
            json,
        } => {
            if !(fps.is_finite() && fps > 0.0) {
                bail!("fps must be positive, got {fps}");
            }
            let config = load_config(config.as_ref(), scene)?;
            let renderer =
                DebugTextRenderer::new(RenderTarget::new(config.window.size(), config.max_pixel_ratio));
            let stage = Stage::new(config.build_setup()?, renderer);

            let mut controller = FrameLoopController::new(ManualClock::new(), stage)
                .with_timer(FrameTimer::new(config.frame_history));
            let mut scheduler = ManualScheduler::new();
            controller.start(&mut scheduler);

            for _ in 0..frames {
                let Some(handle) = scheduler.take_pending() else {
                    break;
                };
                if let Some(report) = controller.on_frame(handle, &mut scheduler)? {
                    if !json {
                        print!("{}", report.output);
                    }
                }
                controller.clock_mut().advance(1.0 / fps);
            }
            controller.stop(&mut scheduler);

            let stats = controller.stats();
            if json {
                println!("{}", serde_json::to_string_pretty(&stats)?);
            } else {
                println!(
                    "{} frames, {:.3}s simulated, {:.1} fps",
                    stats.frames, stats.elapsed, stats.fps
                );
            }
        }
        Commands::Resize {
            from,
            to,
            dpr,
            max_pixel_ratio,
            fullscreen,
        } => {
            let mut host = VirtualHost::new(from.0, from.1, dpr);
            let setup = ScenePreset::Geometries.build(ViewportSize::from_logical(from.0, from.1).aspect_ratio())?;
            let renderer = DebugTextRenderer::new(RenderTarget::new(
                ViewportSize::from_logical(from.0, from.1),
                max_pixel_ratio,
            ));
            let mut stage = Stage::new(setup, renderer);

            let mut hub = EventHub::new();
            ViewportSync::new(max_pixel_ratio).attach(&mut hub);

            hub.dispatch(&HostEvent::Resized, &mut stage, &mut host);
            println!("before: {}", describe(&stage));

            host.size = to;
            hub.dispatch(&HostEvent::Resized, &mut stage, &mut host);
            println!("after:  {}", describe(&stage));

            if fullscreen {
                hub.dispatch(&HostEvent::DoubleClick, &mut stage, &mut host);
                match host.fullscreen_path() {
                    Some(path) => println!("fullscreen: entered via {path:?}"),
                    None => println!("fullscreen: off"),
                }
            }
        }
        Commands::Panel { scene } => {
            let setup = scene.build(ViewportSize::default().aspect_ratio())?;
            if setup.panel.is_empty() {
                println!("{scene}: no debug panel");
                return Ok(());
            }
            println!(
                "{} ({})",
                setup.panel.title(),
                if setup.panel.is_collapsed() { "collapsed" } else { "open" }
            );
            for (index, control) in setup.panel.controls().iter().enumerate() {
                let value = match setup.panel.read(index, &setup.scene)? {
                    PanelValue::Number(v) => format!("{v:.2}"),
                    PanelValue::Bool(b) => b.to_string(),
                    PanelValue::Color(c) => format!("#{:06x}", c.to_hex()),
                    PanelValue::Trigger => "(button)".into(),
                };
                println!(
                    "  [{index}] {:<12} {:?} targets={} = {value}",
                    control.label,
                    control.property,
                    control.targets.len()
                );
            }
        }
    }

    Ok(())
}
