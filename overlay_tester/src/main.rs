use anyhow::Context;
use clap::Parser;
use ghost_vision::{
    BlockCategory, BlockPos, ChannelTransport, DiskImageStore, GhostConfig, GhostPipeline,
    ImageStore, InboundMessage, MemoryImageStore, OverlayCube, ProfileData, RenderSink,
    SpatialQuery, TextChannel, Vec3, Viewer,
};
use ghost_vision::core_modules::profile::encode_texture_payload;
use image::{Rgba, RgbaImage};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::{Duration, Instant};
use tokio::sync::mpsc::UnboundedSender;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// Drives the ghost head engine through a simulated walk and writes a
/// top-down picture of the final overlay.
#[derive(Parser, Debug)]
#[command(name = "overlay_tester")]
struct Args {
    /// Number of 50 ms ticks to simulate.
    #[arg(long, default_value_t = 160)]
    ticks: u64,

    /// JSON config overriding the engine defaults.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Where to write the top-down overlay PNG.
    #[arg(long, default_value = "overlay.png")]
    output: PathBuf,

    /// Read skins from this store root instead of generating them.
    #[arg(long)]
    skins: Option<PathBuf>,

    /// Number of ghost heads to place.
    #[arg(long, default_value_t = 4)]
    ghosts: i32,
}

const TICK: Duration = Duration::from_millis(50);
const HEAD_Y: i32 = 64;
const PIXELS_PER_BLOCK: u32 = 12;

// --- Simulated world ---

#[derive(Default)]
struct SimWorld {
    heads: Mutex<HashMap<BlockPos, Option<ProfileData>>>,
}

impl SimWorld {
    fn place(&self, pos: BlockPos, profile: Option<ProfileData>) {
        self.heads
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(pos, profile);
    }

    fn break_block(&self, pos: BlockPos) {
        self.heads
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&pos);
    }
}

impl SpatialQuery for SimWorld {
    fn category_at(&self, pos: BlockPos) -> BlockCategory {
        let heads = self.heads.lock().unwrap_or_else(PoisonError::into_inner);
        if heads.contains_key(&pos) {
            BlockCategory::Skull
        } else {
            BlockCategory::Other
        }
    }

    fn profile_at(&self, pos: BlockPos) -> Option<ProfileData> {
        let heads = self.heads.lock().unwrap_or_else(PoisonError::into_inner);
        heads.get(&pos).cloned().flatten()
    }
}

fn head_profile(texture_id: &str) -> ProfileData {
    ProfileData::with_texture_payload(encode_texture_payload(&format!(
        "http://textures.minecraft.net/texture/{texture_id}"
    )))
}

// --- Generated skins ---

fn patterned_skin(seed: u8) -> RgbaImage {
    RgbaImage::from_fn(64, 64, |x, y| {
        let v = (x as u8).wrapping_mul(7) ^ (y as u8).wrapping_mul(13) ^ seed;
        Rgba([v, v.wrapping_add(40), 255 - v, 255])
    })
}

/// A copy of `base` with a couple of pixels touched up inside the
/// fingerprint region, still well above the match threshold.
fn near_copy(base: &RgbaImage) -> RgbaImage {
    let mut skin = base.clone();
    skin.put_pixel(9, 1, Rgba([0, 0, 0, 255]));
    skin.put_pixel(20, 6, Rgba([0, 0, 0, 255]));
    skin
}

struct Skins {
    store: Arc<dyn ImageStore>,
    ghost_ids: Vec<String>,
    decoy_id: Option<String>,
}

fn build_skins(args: &Args, config: &GhostConfig) -> Skins {
    if let Some(root) = &args.skins {
        tracing::info!(root = %root.display(), "Using skin store on disk");
        return Skins {
            store: Arc::new(DiskImageStore::new(root.clone())),
            ghost_ids: config.reference_textures.clone(),
            decoy_id: None,
        };
    }

    let store = MemoryImageStore::new();
    let mut ghost_ids = Vec::new();
    for (i, reference) in config.reference_textures.iter().enumerate() {
        let base = patterned_skin((i as u8).wrapping_mul(31).wrapping_add(5));
        let ghost_id = format!("simghost{i}");
        store.insert(ghost_id.clone(), near_copy(&base));
        store.insert(reference.clone(), base);
        ghost_ids.push(ghost_id);
    }
    let decoy_id = "simdecoy".to_string();
    store.insert(decoy_id.clone(), patterned_skin(200));

    Skins {
        store: Arc::new(store),
        ghost_ids,
        decoy_id: Some(decoy_id),
    }
}

// --- Output ---

struct ConsoleText;

impl TextChannel for ConsoleText {
    fn send_line(&self, line: &str) {
        println!("[ghost] {line}");
    }
}

/// Records the last frame's cubes in world space.
#[derive(Default)]
struct TopDownSink {
    eye: Vec3,
    cubes: Vec<OverlayCube>,
}

impl TopDownSink {
    fn begin_frame(&mut self, eye: Vec3) {
        self.eye = eye;
        self.cubes.clear();
    }

    fn render(&self, path: &Path, viewer: Vec3) -> anyhow::Result<()> {
        let world_min: Vec<Vec3> = self.cubes.iter().map(|c| c.min.add(self.eye)).collect();
        let (mut lo_x, mut lo_z, mut hi_x, mut hi_z) = (viewer.x, viewer.z, viewer.x, viewer.z);
        for min in &world_min {
            lo_x = lo_x.min(min.x);
            lo_z = lo_z.min(min.z);
            hi_x = hi_x.max(min.x + 1.0);
            hi_z = hi_z.max(min.z + 1.0);
        }
        let (lo_x, lo_z) = (lo_x.floor() - 2.0, lo_z.floor() - 2.0);
        let width = ((hi_x.ceil() + 2.0 - lo_x) as u32) * PIXELS_PER_BLOCK;
        let height = ((hi_z.ceil() + 2.0 - lo_z) as u32) * PIXELS_PER_BLOCK;

        let mut img = RgbaImage::from_pixel(width, height, Rgba([24, 24, 28, 255]));
        let to_px = |x: f64, z: f64| {
            (
                ((x - lo_x) * PIXELS_PER_BLOCK as f64) as u32,
                ((z - lo_z) * PIXELS_PER_BLOCK as f64) as u32,
            )
        };

        for (cube, min) in self.cubes.iter().zip(&world_min) {
            let [r, g, b, a] = cube.color.to_rgba8();
            let alpha = a as f32 / 255.0;
            let (px, pz) = to_px(min.x, min.z);
            for dx in 0..PIXELS_PER_BLOCK {
                for dz in 0..PIXELS_PER_BLOCK {
                    let (x, y) = (px + dx, pz + dz);
                    if x >= width || y >= height {
                        continue;
                    }
                    let under = img.get_pixel(x, y).0;
                    let mix = |top: u8, bottom: u8| {
                        (top as f32 * alpha + bottom as f32 * (1.0 - alpha)).round() as u8
                    };
                    img.put_pixel(
                        x,
                        y,
                        Rgba([mix(r, under[0]), mix(g, under[1]), mix(b, under[2]), 255]),
                    );
                }
            }
        }

        let (vx, vz) = to_px(viewer.x, viewer.z);
        if vx < width && vz < height {
            img.put_pixel(vx, vz, Rgba([255, 255, 255, 255]));
        }

        img.save(path)
            .with_context(|| format!("writing overlay image to {}", path.display()))?;
        Ok(())
    }
}

impl RenderSink for TopDownSink {
    fn draw_cube(&mut self, cube: &OverlayCube) {
        self.cubes.push(*cube);
    }
}

// --- Particle feed ---

/// Keeps a flame going next to `target` and some unrelated smoke elsewhere.
async fn feed_particles(tx: UnboundedSender<InboundMessage>, target: BlockPos, until: Instant) {
    let mut interval = tokio::time::interval(Duration::from_millis(100));
    let flame_origin = target.center().add(Vec3::new(0.1, -0.2, 0.15));
    let smoke_origin = target.center().add(Vec3::new(4.0, 0.0, 0.0));
    while Instant::now() < until {
        interval.tick().await;
        let messages = [
            InboundMessage::Particles {
                effect: "flame".to_string(),
                origin: flame_origin,
                count: 2,
            },
            InboundMessage::Particles {
                effect: "smoke".to_string(),
                origin: smoke_origin,
                count: 5,
            },
        ];
        for message in messages {
            if tx.send(message).is_err() {
                return;
            }
        }
    }
    tracing::debug!("Particle feed finished");
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();

    let args = Args::parse();

    // --- 1. Configuration ---
    let config = match &args.config {
        Some(path) => GhostConfig::from_json_file(path)
            .with_context(|| format!("loading config from {}", path.display()))?,
        None => GhostConfig::default(),
    };
    let skins = build_skins(&args, &config);
    if skins.ghost_ids.is_empty() {
        anyhow::bail!("no reference textures configured");
    }

    // --- 2. World Setup ---
    // Ghosts sit along +x, six blocks apart. A decoy and a bare skull sit
    // between them.
    let world = SimWorld::default();
    let mut ghosts = Vec::new();
    for i in 0..args.ghosts.max(1) {
        let pos = BlockPos::new(6 * i, HEAD_Y, 3);
        let id = &skins.ghost_ids[i as usize % skins.ghost_ids.len()];
        world.place(pos, Some(head_profile(id)));
        ghosts.push(pos);
    }
    if let Some(decoy) = &skins.decoy_id {
        world.place(BlockPos::new(3, HEAD_Y, 3), Some(head_profile(decoy)));
    }
    world.place(BlockPos::new(9, HEAD_Y, -3), None);

    // --- 3. Engine & Transport ---
    let text: Arc<dyn TextChannel> = Arc::new(ConsoleText);
    let mut pipeline = GhostPipeline::new(config, skins.store, text);
    let (tx, transport) = ChannelTransport::unbounded();

    let start = Instant::now();
    let run_for = TICK * args.ticks as u32;
    let flamed = ghosts[ghosts.len() - 1];
    let feeder = tokio::spawn(feed_particles(tx, flamed, start + run_for));

    // --- 4. Simulation Loop ---
    // The viewer walks from one end of the row to the other, claims the
    // first ghost by hand and breaks the second one halfway through.
    let path_start = Vec3::new(-4.5, HEAD_Y as f64 + 1.0, 0.5);
    let path_end = Vec3::new(6.0 * args.ghosts as f64 + 2.0, HEAD_Y as f64 + 1.0, 0.5);
    let mut viewer = Viewer::stationary(path_start);
    let mut sink = TopDownSink::default();
    let mut interval = tokio::time::interval(TICK);

    for tick in 0..args.ticks {
        interval.tick().await;
        let now = Instant::now();
        let progress = tick as f64 / args.ticks.max(1) as f64;
        viewer = Viewer {
            previous: viewer.current,
            current: path_start.lerp(path_end, progress),
        };

        let report = pipeline.on_tick(&world, &viewer, &transport, now);
        if let Some(scan) = &report.scan {
            tracing::debug!(
                tick,
                queued = scan.queued.len(),
                verified = scan.verified.len(),
                "Scan finished"
            );
        }

        if tick == args.ticks / 3 {
            pipeline.on_interact(ghosts[0], &world, now);
        }
        if tick == args.ticks / 2 && ghosts.len() > 2 {
            tracing::info!(pos = %ghosts[1], "Breaking a ghost head");
            world.break_block(ghosts[1]);
        }

        sink.begin_frame(viewer.interpolated(1.0));
        let frame = pipeline.on_render_frame(&world, &viewer, 1.0, &mut sink, now);
        for change in &frame.changes {
            tracing::info!(pos = %change.pos, from = ?change.from, to = ?change.to, "State change");
        }
    }

    // --- 5. Report ---
    pipeline.on_outgoing_text("//ghoststatus");
    sink.render(&args.output, viewer.current)?;
    tracing::info!(output = %args.output.display(), cubes = sink.cubes.len(), "Overlay written");

    drop(transport);
    feeder.abort();
    Ok(())
}
