//! End-to-end runs of the runtime with the reference backends.

#![allow(missing_docs)]

use ege::core::Command;
use ege::{
    Backend, BackendKind, Event, HeadlessBackend, InputEvent, Layer, RenderContext, Runtime, RuntimeConfig,
};

fn config(width: usize, height: usize) -> RuntimeConfig {
    RuntimeConfig {
        width,
        height,
        target_fps: 0,
        audio: false,
        ..RuntimeConfig::default()
    }
}

/// Draws a background and a square that moves one pixel per frame.
struct Slider;

impl Layer for Slider {
    #[allow(clippy::cast_possible_truncation)]
    fn on_render(&mut self, ctx: &mut RenderContext<'_, '_>) {
        ctx.commands.push_clear(0xFF00_0000);
        ctx.commands.push_rect(0, 0xFFFF_FFFF, ctx.frame as i16, 0, 2, 2);
    }
}

/// Builds its commands in scratch memory first.
struct ScratchUser {
    rects: usize,
}

impl Layer for ScratchUser {
    #[allow(clippy::cast_possible_truncation)]
    fn on_render(&mut self, ctx: &mut RenderContext<'_, '_>) {
        let xs = ctx.scratch.alloc_slice::<i16>(self.rects).unwrap();
        for (i, x) in xs.iter_mut().enumerate() {
            *x = (i * 3) as i16;
        }
        for &x in xs.iter() {
            ctx.commands.push_rect(1, 0xFF00_FF00, x, x, 1, 1);
        }
    }
}

/// Swallows quit requests.
struct QuitGuard {
    seen: u32,
}

impl Layer for QuitGuard {
    fn on_event(&mut self, event: &Event) -> bool {
        if event.is_shutdown() {
            self.seen += 1;
            return true;
        }
        false
    }
}

#[test]
fn frames_reach_the_canvas_in_order() {
    let mut runtime = Runtime::new(config(16, 4), HeadlessBackend::new()).unwrap();
    runtime.push_layer(Slider);
    runtime.init().unwrap();

    for frame in 0..5usize {
        runtime.step().unwrap();
        let canvas = runtime.backend().canvas().unwrap();
        assert_eq!(canvas.pixel(frame, 0), Some(0xFFFF_FFFF));
        assert_eq!(canvas.pixel(frame + 1, 1), Some(0xFFFF_FFFF));
        assert_eq!(canvas.pixel(frame + 2, 0), Some(0xFF00_0000));
    }

    assert_eq!(
        runtime.last_frame().commands(),
        &[Command::Clear { color: 0xFF00_0000 }, Command::rect(0, 0xFFFF_FFFF, 4, 0, 2, 2)]
    );
    runtime.teardown();
}

#[test]
fn scratch_memory_is_fresh_every_frame() {
    let config = RuntimeConfig { scratch_bytes: 64, ..config(32, 32) };
    let mut runtime = Runtime::new(config, HeadlessBackend::new()).unwrap();
    // 20 x i16 = 40 bytes per frame: only fits if the arena is reset each frame.
    runtime.push_layer(ScratchUser { rects: 20 });
    runtime.init().unwrap();

    for _ in 0..10 {
        let stats = runtime.step().unwrap();
        assert_eq!(stats.commands, 20);
    }
}

#[test]
fn consumed_quit_does_not_stop() {
    let config = RuntimeConfig { max_frames: Some(3), ..config(8, 8) };
    let mut runtime = Runtime::new(config, HeadlessBackend::new()).unwrap();
    runtime.push_layer(QuitGuard { seen: 0 });
    runtime.init().unwrap();

    runtime.backend_mut().inject(Event::QUIT);
    assert_eq!(runtime.run().unwrap(), 3);
    assert!(!runtime.stop_handle().is_stopped());
}

#[test]
fn stop_from_another_thread() {
    let mut runtime = Runtime::new(config(8, 8), HeadlessBackend::new()).unwrap();
    runtime.init().unwrap();
    let stop = runtime.stop_handle();

    let stopper = std::thread::spawn(move || {
        std::thread::sleep(std::time::Duration::from_millis(20));
        stop.stop();
    });

    let frames = runtime.run().unwrap();
    stopper.join().unwrap();
    assert!(frames > 0);
    assert_eq!(runtime.backend().presented(), frames);
}

#[test]
fn input_is_counted_per_frame() {
    let mut runtime = Runtime::new(config(8, 8), HeadlessBackend::new()).unwrap();
    runtime.init().unwrap();

    let backend = runtime.backend_mut();
    backend.inject(InputEvent::MouseMotion { x: 1, y: 1 }.into());
    backend.inject(InputEvent::Key { code: 13, pressed: true }.into());

    assert_eq!(runtime.step().unwrap().events, 2);
    assert_eq!(runtime.step().unwrap().events, 0);
}

#[test]
fn log_backend_from_config() {
    let config = RuntimeConfig::from_toml_str(
        r#"
        backend = "log"
        target_fps = 0
        max_frames = 4
        "#,
    )
    .unwrap();
    assert_eq!(config.backend, BackendKind::Log);

    let mut runtime = Runtime::from_config(config).unwrap();
    runtime.init().unwrap();
    assert_eq!(runtime.run().unwrap(), 4);
    assert_eq!(runtime.backend().name(), "log");
    assert_eq!(runtime.pipeline_stats().presented, 4);
    runtime.teardown();
}

#[test]
fn config_file_round_trip() {
    let path = std::env::temp_dir().join(format!("ege-config-{}.toml", std::process::id()));
    std::fs::write(&path, "width = 40\nheight = 30\nslow_frame_ms = 5\n").unwrap();

    let config = RuntimeConfig::load(&path).unwrap();
    std::fs::remove_file(&path).unwrap();

    assert_eq!((config.width, config.height), (40, 30));
    assert_eq!(config.slow_frame_ms, 5);
}
