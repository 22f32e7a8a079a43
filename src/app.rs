//! winit host: owns the window, forwards resizes to the engine, drives the
//! refresh loop and stands in for the external video controller.

use std::sync::Arc;

use image::RgbaImage;
use log::{error, info, warn};
use winit::dpi::LogicalSize;
use winit::event::{Event, WindowEvent};
use winit::event_loop::EventLoopBuilder;
use winit::window::WindowBuilder;

use crate::config::EngineConfig;
use crate::engine::DisplayEngine;
use crate::error::Result;
use crate::renderer::Renderer;
use crate::scheduler::{FrameClock, WallClock};
use crate::sequencer::PlayOutcome;
use crate::textures::spawn_loads;
use crate::viewport::Viewport;

#[derive(Debug)]
pub enum HostEvent {
    TextureLoaded {
        index: usize,
        result: Result<RgbaImage>,
    },
    TransitionComplete,
}

/// Simulated video playback: cycles the clip list and reports when the
/// current clip has run for `clip_seconds`.
#[derive(Clone, Debug)]
pub struct ClipTimer {
    clips: Vec<String>,
    current: usize,
    clip_seconds: f32,
    started_at: f32,
    ended: bool,
}

impl ClipTimer {
    pub fn new(clips: Vec<String>, clip_seconds: f32, now: f32) -> Self {
        Self {
            clips,
            current: 0,
            clip_seconds,
            started_at: now,
            ended: false,
        }
    }

    pub fn current(&self) -> Option<&str> {
        self.clips.get(self.current).map(String::as_str)
    }

    /// True exactly once per clip, on the first poll past its end.
    pub fn poll(&mut self, now: f32) -> bool {
        if self.ended || now - self.started_at < self.clip_seconds {
            return false;
        }
        self.ended = true;
        info!("clip {:?} ended, fading out", self.current());
        true
    }

    pub fn advance(&mut self, now: f32) {
        if !self.clips.is_empty() {
            self.current = (self.current + 1) % self.clips.len();
        }
        self.started_at = now;
        self.ended = false;
        info!("playing {:?}, opacity restored", self.current());
    }
}

fn logical_size(size: winit::dpi::PhysicalSize<u32>, scale: f64) -> LogicalSize<u32> {
    size.to_logical(scale)
}

pub async fn arun(config: EngineConfig) -> Result<()> {
    cfg_if::cfg_if! {
        if #[cfg(target_arch = "wasm32")] {
            std::panic::set_hook(Box::new(console_error_panic_hook::hook));
            let _ = console_log::init_with_level(log::Level::Debug);
        } else {
            env_logger::init();
        }
    }

    let event_loop = EventLoopBuilder::<HostEvent>::with_user_event().build()?;
    let window = Arc::new(
        WindowBuilder::new()
            .with_title("bloom-pulse")
            .build(&event_loop)?,
    );

    #[cfg(target_arch = "wasm32")]
    {
        use winit::platform::web::WindowExtWebSys;
        let appended = web_sys::window()
            .and_then(|win| win.document())
            .and_then(|doc| {
                let body = doc.body()?;
                let canvas = web_sys::Element::from(window.canvas()?);
                body.append_child(&canvas).ok()?;
                Some(())
            });
        if appended.is_none() {
            warn!("couldn't append canvas to document body");
        }
    }

    let scale = window.scale_factor();
    let size = logical_size(window.inner_size(), scale);
    let viewport = Viewport::new(size.width, size.height, scale as f32);

    let mut engine = DisplayEngine::new(&config, viewport, WallClock::new());
    let mut renderer = Renderer::new(window.clone(), engine.state().viewport.buffer_size(), &config).await?;

    let proxy = event_loop.create_proxy();
    let loader = proxy.clone();
    spawn_loads(&config.textures, move |index, result| {
        if loader.send_event(HostEvent::TextureLoaded { index, result }).is_err() {
            warn!("texture {index} decoded after the event loop closed");
        }
    });

    let host_clock = WallClock::new();
    let mut clip = ClipTimer::new(config.clips.clone(), config.clip_seconds, host_clock.elapsed());
    info!("playing {:?}", clip.current());

    engine.start();
    window.request_redraw();

    event_loop.run(move |event, target| match event {
        Event::UserEvent(HostEvent::TextureLoaded { index, result }) => match result {
            Ok(image) => renderer.upload_texture(index, &image),
            Err(err) => renderer.mark_failed(index, &err),
        },
        Event::UserEvent(HostEvent::TransitionComplete) => clip.advance(host_clock.elapsed()),
        Event::AboutToWait => {
            if clip.poll(host_clock.elapsed()) {
                let notify = proxy.clone();
                let outcome = engine.play(Box::new(move || {
                    let _ = notify.send_event(HostEvent::TransitionComplete);
                }));
                if outcome == PlayOutcome::Rejected {
                    clip.advance(host_clock.elapsed());
                }
            }
        }
        Event::WindowEvent { event, .. } => match event {
            WindowEvent::Resized(physical) => {
                let size = logical_size(physical, window.scale_factor());
                if let Some(buffers) = engine.on_resize(size.width, size.height) {
                    renderer.set_size(buffers);
                }
                window.request_redraw();
            }
            WindowEvent::ScaleFactorChanged { scale_factor, .. } => {
                if let Some(buffers) = engine.on_scale_factor(scale_factor as f32) {
                    renderer.set_size(buffers);
                }
            }
            WindowEvent::RedrawRequested => {
                let Some(state) = engine.tick() else {
                    return;
                };
                match renderer.render(state) {
                    Ok(()) => {}
                    Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => renderer.reconfigure(),
                    Err(wgpu::SurfaceError::OutOfMemory) => {
                        error!("surface out of memory, shutting down");
                        target.exit();
                    }
                    Err(err) => warn!("frame skipped: {err}"),
                }
                if engine.is_running() {
                    window.request_redraw();
                }
            }
            WindowEvent::CloseRequested => target.exit(),
            _ => {}
        },
        Event::LoopExiting => {
            engine.dispose();
        }
        _ => {}
    })?;
    Ok(())
}

/// Runs the display with its default configuration.
#[cfg_attr(target_arch = "wasm32", wasm_bindgen::prelude::wasm_bindgen(start))]
pub fn run() {
    cfg_if::cfg_if! {
        if #[cfg(target_arch = "wasm32")] {
            wasm_bindgen_futures::spawn_local(async {
                if let Err(err) = arun(EngineConfig::default()).await {
                    error!("{err}");
                }
            });
        } else {
            if let Err(err) = run_with(EngineConfig::default()) {
                error!("{err}");
            }
        }
    }
}

#[cfg(not(target_arch = "wasm32"))]
pub fn run_with(config: EngineConfig) -> Result<()> {
    pollster::block_on(arun(config))
}
