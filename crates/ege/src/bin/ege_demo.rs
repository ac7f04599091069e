//! # EGE Demo
//!
//! Bounces a few rectangles through the full pipeline.
//!
//! ```text
//! ege-demo --frames 300
//! ege-demo --config demo.toml --backend log
//! RUST_LOG=ege=debug ege-demo
//! ```

use std::path::PathBuf;

use anyhow::Context as _;
use clap::Parser;
use ege::core::Rect;
use ege::{BackendKind, Event, Layer, RenderContext, Runtime, RuntimeConfig};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser, Debug)]
#[command(name = "ege-demo", version, about = "Run the EGE bouncing-rect demo")]
struct Cli {
    /// TOML config file.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Stop after this many frames (overrides the config).
    #[arg(long)]
    frames: Option<u64>,

    /// Backend to use: headless or log (overrides the config).
    #[arg(long)]
    backend: Option<BackendKind>,
}

/// A rectangle moving at constant speed, reflecting off the edges.
struct Bouncer {
    x: f32,
    y: f32,
    vx: f32,
    vy: f32,
    size: i16,
    color: u32,
}

/// Background plus bouncing rectangles.
struct BounceLayer {
    width: f32,
    height: f32,
    bouncers: Vec<Bouncer>,
    clicks: u32,
}

impl BounceLayer {
    #[allow(clippy::cast_precision_loss)]
    fn new(width: usize, height: usize) -> Self {
        let colors = [0xFFE0_4040, 0xFF40_E040, 0xFF40_40E0, 0xFFE0_E040];
        let bouncers = colors
            .iter()
            .zip(1u8..)
            .map(|(&color, n)| {
                let k = f32::from(n);
                Bouncer {
                    x: 10.0 * k,
                    y: 7.0 * k,
                    vx: 40.0 + 15.0 * k,
                    vy: 30.0 + 10.0 * k,
                    size: 8 + 4 * i16::from(n),
                    color,
                }
            })
            .collect();

        Self {
            width: width as f32,
            height: height as f32,
            bouncers,
            clicks: 0,
        }
    }
}

impl Layer for BounceLayer {
    fn name(&self) -> &str {
        "bounce"
    }

    fn on_event(&mut self, event: &Event) -> bool {
        if event.is_left_click() {
            self.clicks += 1;
            for b in &mut self.bouncers {
                b.vx = -b.vx;
            }
            return true;
        }
        false
    }

    fn on_update(&mut self, dt: f32) {
        for b in &mut self.bouncers {
            let size = f32::from(b.size);
            b.x += b.vx * dt;
            b.y += b.vy * dt;
            if b.x < 0.0 || b.x + size > self.width {
                b.vx = -b.vx;
                b.x = b.x.clamp(0.0, (self.width - size).max(0.0));
            }
            if b.y < 0.0 || b.y + size > self.height {
                b.vy = -b.vy;
                b.y = b.y.clamp(0.0, (self.height - size).max(0.0));
            }
        }
    }

    #[allow(clippy::cast_possible_truncation)]
    fn on_render(&mut self, ctx: &mut RenderContext<'_, '_>) {
        ctx.commands.push_clear(0xFF10_1018);
        for (layer, b) in (1u8..).zip(&self.bouncers) {
            let rect = Rect::new(b.x as i16, b.y as i16, b.size, b.size);
            if let Err(err) = ctx.commands.try_push_rect(layer, b.color, rect.x, rect.y, rect.w, rect.h) {
                tracing::warn!(%err, "rect dropped");
                break;
            }
        }
    }

    fn on_exit(&mut self) {
        tracing::info!(clicks = self.clicks, "bounce layer exiting");
    }
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "ege=info,ege_demo=info".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => RuntimeConfig::load(path)
            .with_context(|| format!("failed to load {}", path.display()))?,
        None => RuntimeConfig {
            max_frames: Some(300),
            ..RuntimeConfig::default()
        },
    };
    if let Some(frames) = cli.frames {
        config.max_frames = Some(frames);
    }
    if let Some(backend) = cli.backend {
        config.backend = backend;
    }

    let layer = BounceLayer::new(config.width, config.height);
    let mut runtime = Runtime::from_config(config).context("failed to create runtime")?;
    runtime.push_layer(layer);
    runtime.init().context("failed to initialize runtime")?;

    let stop = runtime.stop_handle();
    let result = runtime.run();
    runtime.teardown();

    let frames = result.context("runtime loop failed")?;
    tracing::info!(frames, stopped = stop.is_stopped(), "demo finished");
    Ok(())
}
