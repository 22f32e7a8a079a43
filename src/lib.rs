mod app;
mod bloom_pass;
mod config;
mod engine;
mod error;
mod geometry;
mod renderer;
mod scene_pass;
mod scheduler;
mod selector;
mod sequencer;
mod textures;
mod timeline;
mod uniforms;
mod viewport;

pub use app::{arun, run, ClipTimer, HostEvent};
#[cfg(not(target_arch = "wasm32"))]
pub use app::run_with;
pub use bloom_pass::BloomParams;
pub use config::EngineConfig;
pub use engine::{DisplayEngine, EngineState};
pub use error::{EngineError, Result};
pub use scheduler::{FrameClock, FrameScheduler, WallClock};
pub use selector::{select, SelectorState, TexturePair, TexturePool, TextureSlot};
pub use sequencer::{OnComplete, PlayOutcome, TransitionSequencer, TransitionStep};
pub use timeline::{Ease, Milestone, Ramp, RampTarget, Timeline};
pub use uniforms::UniformState;
pub use viewport::{BufferSize, Camera, Viewport};
