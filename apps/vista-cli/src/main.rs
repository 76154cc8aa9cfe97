use anyhow::Context;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;
use vista_assets::{AssetSource, BuiltinAssets, DirAssets};
use vista_input::{DragTracker, PointerEvent};
use vista_render::RecordingApi;
use vista_scene::{Demo, FrameTime, SceneConfig, create_renderer};

#[derive(Parser)]
#[command(name = "vista-cli", about = "Headless runner for the vista demo scenes")]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print crate versions
    Info,
    /// Render frames of a demo into a recording backend and print the calls
    Frames {
        /// Scene to run: heightmap, particles or air-hockey
        #[arg(short, long, default_value = "heightmap")]
        demo: Demo,
        /// Number of frames to render
        #[arg(short = 'n', long, default_value = "3")]
        frames: u64,
        /// Simulated frame rate
        #[arg(long, default_value = "60")]
        fps: f32,
        #[arg(long, default_value = "1280")]
        width: u32,
        #[arg(long, default_value = "720")]
        height: u32,
        /// Horizontal drag in pixels applied before every frame
        #[arg(long, default_value = "0")]
        drag: f32,
        /// YAML scene configuration
        #[arg(long)]
        config: Option<PathBuf>,
        /// Directory with shaders/ and textures/ overriding the builtin assets
        #[arg(long)]
        assets: Option<PathBuf>,
        /// Print every recorded call of the last frame
        #[arg(long)]
        dump: bool,
    },
    /// Print the default scene configuration as YAML
    Config,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .init();

    match cli.command {
        Commands::Info => {
            println!("vista-cli v{}", env!("CARGO_PKG_VERSION"));
            println!("common: {}", vista_common::crate_info());
            println!("render: {}", vista_render::crate_info());
            println!("assets: {}", vista_assets::crate_info());
            println!("input: {}", vista_input::crate_info());
            println!("scene: {}", vista_scene::crate_info());
            let demos: Vec<&str> = Demo::ALL.iter().map(|d| d.as_str()).collect();
            println!("demos: {}", demos.join(", "));
        }
        Commands::Frames {
            demo,
            frames,
            fps,
            width,
            height,
            drag,
            config,
            assets,
            dump,
        } => {
            anyhow::ensure!(fps > 0.0, "fps must be positive, got {fps}");

            let config = match config {
                Some(path) => SceneConfig::load(&path)
                    .with_context(|| format!("loading config {}", path.display()))?,
                None => SceneConfig::default(),
            };
            let assets: Box<dyn AssetSource> = match assets {
                Some(dir) => Box::new(DirAssets::new(dir)),
                None => Box::new(BuiltinAssets::new()),
            };

            let mut api = RecordingApi::new();
            let mut renderer = create_renderer(demo, &config);
            renderer
                .on_surface_created(&mut api, assets.as_ref())
                .with_context(|| format!("creating the {demo} scene"))?;
            renderer.on_surface_changed(&mut api, width, height);
            println!(
                "{demo}: {} programs, {} buffers, {} textures after setup",
                api.program_count(),
                api.buffer_count(),
                api.texture_count()
            );

            let mut tracker = DragTracker::new();
            if drag != 0.0 {
                tracker.handle(PointerEvent::Down(glam::Vec2::ZERO));
            }
            let mut pointer = glam::Vec2::ZERO;

            for frame in 0..frames {
                if drag != 0.0 {
                    pointer.x += drag;
                    if let Some(d) = tracker.handle(PointerEvent::Move(pointer)) {
                        renderer.handle_touch_drag(d.dx, d.dy);
                    }
                }
                api.take_commands();
                let time = FrameTime::from_secs(frame as f32 / fps);
                renderer.on_draw_frame(&mut api, time)?;
                tracing::debug!(frame, draws = api.draws().count(), "frame recorded");
            }

            let stats = renderer.stats();
            println!(
                "frames={} elapsed={:.3}s surface={}x{} live_particles={} draws_last_frame={}",
                stats.frames,
                stats.elapsed,
                stats.width,
                stats.height,
                stats.live_particles,
                api.draws().count()
            );
            if dump {
                print!("{}", api.summary());
            }

            renderer.on_surface_destroyed(&mut api);
            tracing::debug!(
                programs = api.program_count(),
                buffers = api.buffer_count(),
                textures = api.texture_count(),
                "scene released"
            );
        }
        Commands::Config => {
            print!("{}", SceneConfig::default().to_yaml()?);
        }
    }

    Ok(())
}
