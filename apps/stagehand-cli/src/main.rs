use std::path::PathBuf;
use std::time::Duration;

use anyhow::Context;
use clap::{Parser, Subcommand};
use glam::Vec2;
use stagehand_common::{LocalTransform, NodeId, NodeKind};
use stagehand_coroutine::{
    from_fn, AsyncHandle, CoroutineError, ExitReason, Resume, Step, StopTokenSource,
    YieldInstruction,
};
use stagehand_render::{DebugTextRenderer, FrameRenderer, ResourceKind, ResourceTable};
use stagehand_runtime::{App, RuntimeConfig};
use stagehand_scene::SceneTree;
use stagehand_tools::SceneInspector;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "stagehand-cli", about = "CLI tool for stagehand operations")]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print engine version and crate info
    Info,
    /// Resolve a vertex through a chain of transforms, root first
    Resolve {
        /// Node transform as `x,y,angle,sx,sy`; repeat for each level, root first
        #[arg(short, long = "node", value_parser = parse_transform, required = true)]
        nodes: Vec<LocalTransform>,
        /// Vertex in the leaf's local space
        #[arg(long, value_parser = parse_vec2, default_value = "0,0")]
        vertex: Vec2,
        /// Local offset applied before the leaf transform
        #[arg(long, value_parser = parse_vec2, default_value = "0,0")]
        offset: Vec2,
    },
    /// Build the demo scene and print every node
    Inspect,
    /// Run the demo scene in the headless frame loop
    Run {
        /// JSON runtime config
        #[arg(short, long)]
        config: Option<PathBuf>,
        /// Override the frame limit
        #[arg(short, long)]
        frames: Option<u64>,
    },
}

fn parse_floats<const N: usize>(s: &str) -> Result<[f32; N], String> {
    let parts: Vec<f32> = s
        .split(',')
        .map(|p| p.trim().parse::<f32>().map_err(|e| format!("`{p}`: {e}")))
        .collect::<Result<_, _>>()?;
    parts
        .try_into()
        .map_err(|got: Vec<f32>| format!("expected {N} comma-separated numbers, got {}", got.len()))
}

fn parse_vec2(s: &str) -> Result<Vec2, String> {
    let [x, y] = parse_floats::<2>(s)?;
    Ok(Vec2::new(x, y))
}

fn parse_transform(s: &str) -> Result<LocalTransform, String> {
    let [x, y, angle, sx, sy] = parse_floats::<5>(s)?;
    Ok(LocalTransform::from_location(Vec2::new(x, y))
        .with_angle(angle)
        .with_scale(Vec2::new(sx, sy)))
}

/// Ids of the interesting nodes in the demo scene.
struct Demo {
    ship: NodeId,
    turret: NodeId,
    beacon: NodeId,
}

fn build_demo_scene(scene: &mut SceneTree) -> anyhow::Result<Demo> {
    let world = scene.spawn(
        NodeKind::GROUP,
        LocalTransform::from_location(Vec2::new(100.0, 100.0)),
    );
    let ship = scene.spawn_child(
        world,
        NodeKind::POLYGON,
        LocalTransform::from_location(Vec2::new(10.0, 0.0)).with_scale(Vec2::new(2.0, 1.0)),
    )?;
    scene.set_vertices(
        ship,
        vec![Vec2::new(0.0, 1.0), Vec2::new(-1.0, -1.0), Vec2::new(1.0, -1.0)],
    )?;
    let turret = scene.spawn_child(
        ship,
        NodeKind::POLYGON,
        LocalTransform::from_location(Vec2::new(0.0, 0.5)),
    )?;
    scene.set_vertices(turret, vec![Vec2::ZERO, Vec2::new(0.0, 2.0)])?;
    scene.set_anchor(turret, Vec2::new(0.0, -0.25))?;
    let beacon = scene.spawn_child(
        world,
        NodeKind::MARKER,
        LocalTransform::from_location(Vec2::new(0.0, 5.0)).with_angle(90.0),
    )?;
    Ok(Demo {
        ship,
        turret,
        beacon,
    })
}

fn scene_error(e: impl std::fmt::Display) -> CoroutineError {
    CoroutineError::Message(e.to_string())
}

fn spawn_demo_coroutines(app: &mut App, demo: &Demo) -> anyhow::Result<()> {
    // Spin the turret a little every frame for half a second of frames.
    let turret = demo.turret;
    let mut spins = 0u32;
    app.spawn(from_fn(move |scene: &mut SceneTree, _| {
        let mut t = scene.get(turret).ok_or_else(|| scene_error("turret gone"))?.transform;
        t.angle = (t.angle + 15.0) % 360.0;
        scene.set_transform(turret, t).map_err(scene_error)?;
        spins += 1;
        Ok(if spins >= 30 { Step::Done } else { Step::NextFrame })
    }))?;

    // Wait for a background "route lookup", then move the ship there.
    let ship = demo.ship;
    let mut route = Some(AsyncHandle::spawn(|| {
        std::thread::sleep(Duration::from_millis(40));
        Ok::<_, String>(Vec2::new(-20.0, 15.0))
    }));
    app.spawn(from_fn(move |scene: &mut SceneTree, input| match input {
        Resume::Start => {
            let handle = route.take().ok_or_else(|| scene_error("route requested twice"))?;
            Ok(Step::Yield(handle.into()))
        }
        other => {
            let target: Vec2 = other.into_value()?;
            let mut t = scene.get(ship).ok_or_else(|| scene_error("ship gone"))?.transform;
            t.location = target;
            scene.set_transform(ship, t).map_err(scene_error)?;
            tracing::info!(x = target.x, y = target.y, "ship moved");
            Ok(Step::Done)
        }
    }))?;

    // A failing load; the failure lands in this coroutine only.
    let mut missing = Some(AsyncHandle::<String>::spawn(|| {
        Err(format!("{} not found", "beacon.ogg"))
    }));
    let beacon = demo.beacon;
    app.spawn(from_fn(move |scene: &mut SceneTree, input| match input {
        Resume::Start => {
            let handle = missing.take().ok_or_else(|| scene_error("load requested twice"))?;
            Ok(Step::Yield(handle.into()))
        }
        Resume::Failed(err) => {
            tracing::warn!(%err, "beacon sound unavailable, hiding beacon");
            scene
                .set_transform(beacon, LocalTransform::default().with_scale(Vec2::ZERO))
                .map_err(scene_error)?;
            Ok(Step::Done)
        }
        _ => Ok(Step::Done),
    }))?;

    // Playback pump on a worker thread, polling its stop token once per buffer.
    let mut sources: ResourceTable<Vec<i16>> = ResourceTable::new();
    let buffer = sources.acquire(ResourceKind::AudioBuffer, vec![0; 256]);
    let mut playback = Some(StopTokenSource::new());
    let token = playback
        .as_ref()
        .map(StopTokenSource::token)
        .context("playback source missing")?;
    let mut pump = Some(AsyncHandle::spawn(move || {
        let mut buffers = 0u32;
        while !token.is_stop_requested() {
            buffers += 1;
            std::thread::sleep(Duration::from_millis(5));
        }
        Ok::<_, String>(buffers)
    }));
    let mut stage = 0u8;
    app.spawn(from_fn(move |_: &mut SceneTree, input| {
        stage += 1;
        match stage {
            1 => Ok(Step::Yield(YieldInstruction::delay(Duration::from_millis(100)))),
            2 => {
                // Leaving the playback scope stops the pump.
                if let Some(source) = playback.take() {
                    source.dispose();
                }
                let handle = pump.take().ok_or_else(|| scene_error("pump awaited twice"))?;
                Ok(Step::Yield(handle.into()))
            }
            _ => {
                let filled: u32 = input.into_value()?;
                let samples = sources.release(buffer).map_err(scene_error)?;
                tracing::info!(filled, samples = samples.len(), "playback finished");
                if let Err(err) = sources.get(buffer) {
                    tracing::debug!(%err, "buffer handle is stale after release");
                }
                Ok(Step::Done)
            }
        }
    }))?;

    Ok(())
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)))
        .init();

    match cli.command {
        Commands::Info => {
            println!("stagehand-cli v{}", env!("CARGO_PKG_VERSION"));
            println!("common: {}", stagehand_common::crate_info());
            println!("scene: {}", stagehand_scene::crate_info());
            println!("coroutine: {}", stagehand_coroutine::crate_info());
            println!("render: {}", stagehand_render::crate_info());
            println!("runtime: {}", stagehand_runtime::crate_info());
            println!("tools: {}", stagehand_tools::crate_info());
        }
        Commands::Resolve {
            nodes,
            vertex,
            offset,
        } => {
            let mut scene = SceneTree::new();
            let mut leaf: Option<NodeId> = None;
            for transform in nodes {
                let id = match leaf {
                    Some(parent) => scene.spawn_child(parent, NodeKind::GROUP, transform)?,
                    None => scene.spawn(NodeKind::GROUP, transform),
                };
                leaf = Some(id);
            }
            let leaf = leaf.context("at least one --node is required")?;
            let world = scene.resolve(leaf, vertex, offset)?;
            println!(
                "({:.4}, {:.4}) + offset ({:.4}, {:.4}) -> ({:.4}, {:.4}) through {} level(s)",
                vertex.x,
                vertex.y,
                offset.x,
                offset.y,
                world.x,
                world.y,
                scene.depth(leaf)? + 1
            );
        }
        Commands::Inspect => {
            let mut scene = SceneTree::new();
            build_demo_scene(&mut scene)?;
            println!("{}", SceneInspector::summary(&scene));
            for info in SceneInspector::list_nodes(&scene)? {
                println!("{info}");
            }
        }
        Commands::Run { config, frames } => {
            let mut config = match config {
                Some(path) => RuntimeConfig::load(&path)
                    .with_context(|| format!("loading {}", path.display()))?,
                None => RuntimeConfig::default(),
            };
            if frames.is_some() {
                config.max_frames = frames;
            }

            let mut app = App::new(config)?;
            let demo = build_demo_scene(app.scene_mut())?;
            spawn_demo_coroutines(&mut app, &demo)?;

            let ran = app.run_headless()?;
            for exit in app.drain_exits() {
                match exit.reason {
                    ExitReason::Faulted(err) => {
                        println!("{} faulted on frame {}: {err}", exit.id, exit.frame)
                    }
                    reason => println!("{} exited on frame {}: {reason:?}", exit.id, exit.frame),
                }
            }
            println!(
                "Ran {ran} frames at {} fps target (avg {:?}, max {:?}), {} coroutine(s) still live",
                app.config().target_fps,
                app.timer().average(),
                app.timer().max(),
                app.scheduler().len()
            );
            print!("{}", DebugTextRenderer::default().render(app.scene())?);
            println!("{}", SceneInspector::summary(app.scene()));
        }
    }

    Ok(())
}
