//! The display engine as an explicit state record plus the transitions that
//! mutate it: frame ticks, transition playback, resizes and disposal.

use log::{debug, info};

use crate::bloom_pass::BloomParams;
use crate::config::{EngineConfig, TEXTURE_POOL_SIZE};
use crate::scheduler::{FrameClock, FrameScheduler};
use crate::selector::{select, SelectorState};
use crate::sequencer::{OnComplete, PlayOutcome, TransitionSequencer};
use crate::timeline::{Milestone, RampTarget, Timeline};
use crate::uniforms::UniformState;
use crate::viewport::{apply_resize, apply_scale, camera_for, BufferSize, Camera, Viewport};

#[derive(Clone, Debug, PartialEq)]
pub struct EngineState {
    pub viewport: Viewport,
    pub camera: Camera,
    pub selector: SelectorState,
    pub uniforms: UniformState,
    pub bloom: BloomParams,
}

impl EngineState {
    pub fn new(viewport: Viewport, initial_index: usize, pool_len: usize) -> Self {
        Self {
            camera: camera_for(&viewport),
            viewport,
            selector: SelectorState::new(initial_index % pool_len.max(1)),
            uniforms: UniformState::default(),
            bloom: BloomParams::default(),
        }
    }

    fn set(&mut self, target: RampTarget, value: f32) {
        match target {
            RampTarget::Distortion => self.uniforms.distortion = value,
            RampTarget::BloomStrength => self.bloom.strength = value,
            RampTarget::Progress => self.uniforms.progress = value,
        }
    }

    fn swap_pair(&mut self, pool_len: usize) {
        let (selector, pair) = select(self.selector, pool_len);
        self.selector = selector;
        self.uniforms.set_pair(pair);
        debug!("texture pair now ({}, {})", pair.a, pair.b);
    }
}

pub struct DisplayEngine<C> {
    state: EngineState,
    pool_len: usize,
    scheduler: FrameScheduler<C>,
    sequencer: TransitionSequencer,
    resize_subscribed: bool,
}

impl<C: FrameClock> DisplayEngine<C> {
    pub fn new(config: &EngineConfig, viewport: Viewport, clock: C) -> Self {
        let pool_len = if config.textures.is_empty() {
            TEXTURE_POOL_SIZE
        } else {
            config.textures.len()
        };
        info!(
            "display engine created: {}x{} @{}x, {} textures, start index {}",
            viewport.width, viewport.height, viewport.scale, pool_len, config.initial_index
        );
        Self {
            state: EngineState::new(viewport, config.initial_index, pool_len),
            pool_len,
            scheduler: FrameScheduler::new(clock),
            sequencer: TransitionSequencer::new(Timeline::bloom_pulse()),
            resize_subscribed: true,
        }
    }

    pub fn state(&self) -> &EngineState {
        &self.state
    }

    pub fn pool_len(&self) -> usize {
        self.pool_len
    }

    pub fn start(&mut self) {
        self.scheduler.start();
    }

    pub fn is_running(&self) -> bool {
        self.scheduler.is_running()
    }

    pub fn is_transitioning(&self) -> bool {
        self.sequencer.is_active()
    }

    /// Starts the bloom-pulse transition. `on_complete` runs once, when the
    /// transition clock reaches its end.
    pub fn play(&mut self, on_complete: OnComplete) -> PlayOutcome {
        if !self.resize_subscribed {
            debug!("play after dispose ignored");
            return PlayOutcome::Rejected;
        }
        let now = self.scheduler.now();
        let outcome = self.sequencer.play(now, on_complete);
        if outcome == PlayOutcome::Started {
            self.advance_transition(now);
        }
        outcome
    }

    /// Advances one display refresh. All uniform writes for the frame are
    /// applied before the state is handed back for rendering.
    pub fn tick(&mut self) -> Option<&EngineState> {
        let now = self.scheduler.tick()?;
        self.state.uniforms.time = now;
        self.advance_transition(now);
        Some(&self.state)
    }

    fn advance_transition(&mut self, now: f32) {
        let Some(step) = self.sequencer.advance(now) else {
            return;
        };
        for (target, value) in step.values {
            self.state.set(target, value);
        }
        for milestone in step.milestones {
            match milestone {
                Milestone::InitialPair => self.state.swap_pair(self.pool_len),
                Milestone::NextPair => {
                    self.state.swap_pair(self.pool_len);
                    self.state.selector.is_first_selection = false;
                }
                Milestone::Complete => debug!("transition complete, notifying host"),
            }
        }
        if let Some(on_complete) = step.on_complete {
            on_complete();
        }
    }

    /// Returns the new buffer size when the render and bloom buffers must follow.
    pub fn on_resize(&mut self, width: u32, height: u32) -> Option<BufferSize> {
        if !self.resize_subscribed {
            return None;
        }
        let size = apply_resize(&mut self.state.viewport, &mut self.state.camera, width, height)?;
        debug!("resized to {width}x{height}, buffers {}x{}", size.width, size.height);
        Some(size)
    }

    pub fn on_scale_factor(&mut self, scale: f32) -> Option<BufferSize> {
        if !self.resize_subscribed {
            return None;
        }
        apply_scale(&mut self.state.viewport, scale)
    }

    /// Stops the frame loop, cancels a running transition without notifying
    /// the host, and drops the resize subscription. Safe to call repeatedly.
    pub fn dispose(&mut self) -> bool {
        if !self.scheduler.dispose() {
            return false;
        }
        if self.sequencer.cancel() {
            debug!("in-flight transition cancelled by dispose");
        }
        self.resize_subscribed = false;
        info!("display engine disposed");
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scheduler::tests::ManualClock;
    use crate::selector::TexturePair;
    use std::cell::Cell;
    use std::rc::Rc;

    fn engine() -> (DisplayEngine<ManualClock>, ManualClock) {
        let clock = ManualClock::default();
        let mut engine = DisplayEngine::new(&EngineConfig::default(), Viewport::new(1280, 720, 1.0), clock.clone());
        engine.start();
        (engine, clock)
    }

    fn counter() -> (Rc<Cell<u32>>, OnComplete) {
        let calls = Rc::new(Cell::new(0));
        let inner = calls.clone();
        (calls, Box::new(move || inner.set(inner.get() + 1)))
    }

    fn pair(engine: &DisplayEngine<ManualClock>) -> TexturePair {
        engine.state().uniforms.pair().unwrap()
    }

    fn run_frame(engine: &mut DisplayEngine<ManualClock>, clock: &ManualClock, t: f32) {
        clock.set(t);
        engine.tick();
    }

    #[test]
    fn test_initial_state() {
        let (engine, _) = engine();
        let state = engine.state();
        assert_eq!(state.uniforms, UniformState::default());
        assert_eq!(state.selector, SelectorState::new(1));
        assert_eq!(state.bloom, BloomParams::default());
        assert_eq!(engine.pool_len(), 6);
    }

    #[test]
    fn test_tick_writes_time() {
        let (mut engine, clock) = engine();
        clock.set(1.25);
        let state = engine.tick().unwrap();
        assert_eq!(state.uniforms.time, 1.25);
    }

    #[test]
    fn test_transition_peak_and_end() {
        let (mut engine, clock) = engine();
        let (calls, cb) = counter();
        assert_eq!(engine.play(cb), PlayOutcome::Started);

        run_frame(&mut engine, &clock, 1.999);
        assert!((engine.state().uniforms.distortion - 5.0).abs() < 0.01);
        assert!((engine.state().bloom.strength - 20.0).abs() < 0.1);

        run_frame(&mut engine, &clock, 2.0);
        assert_eq!(engine.state().uniforms.distortion, 5.0);
        assert_eq!(engine.state().bloom.strength, 20.0);

        run_frame(&mut engine, &clock, 3.99);
        assert_eq!(calls.get(), 0);

        run_frame(&mut engine, &clock, 4.0);
        let state = engine.state();
        assert_eq!(state.uniforms.distortion, 0.0);
        assert_eq!(state.bloom.strength, 0.0);
        assert_eq!(state.uniforms.progress, 1.0);
        assert_eq!(calls.get(), 1);

        run_frame(&mut engine, &clock, 6.0);
        assert_eq!(calls.get(), 1);
        assert!(!engine.is_transitioning());
    }

    #[test]
    fn test_pair_sequence_across_transitions() {
        let (mut engine, clock) = engine();

        let (_, cb) = counter();
        let _ = engine.play(cb);
        assert_eq!(pair(&engine), TexturePair { a: 1, b: 2 });
        assert!(engine.state().selector.is_first_selection);
        run_frame(&mut engine, &clock, 2.0);
        assert_eq!(pair(&engine), TexturePair { a: 1, b: 2 });
        assert!(!engine.state().selector.is_first_selection);
        run_frame(&mut engine, &clock, 4.0);

        let (_, cb) = counter();
        let _ = engine.play(cb);
        assert_eq!(pair(&engine), TexturePair { a: 2, b: 3 });
        run_frame(&mut engine, &clock, 6.0);
        assert_eq!(pair(&engine), TexturePair { a: 3, b: 4 });
        run_frame(&mut engine, &clock, 8.0);

        let (_, cb) = counter();
        let _ = engine.play(cb);
        assert_eq!(pair(&engine), TexturePair { a: 4, b: 5 });
        run_frame(&mut engine, &clock, 10.0);
        assert_eq!(pair(&engine), TexturePair { a: 5, b: 0 });
    }

    #[test]
    fn test_progress_restarts_each_transition() {
        let (mut engine, clock) = engine();
        let (_, cb) = counter();
        let _ = engine.play(cb);
        run_frame(&mut engine, &clock, 4.0);
        assert_eq!(engine.state().uniforms.progress, 1.0);

        let (_, cb) = counter();
        let _ = engine.play(cb);
        assert_eq!(engine.state().uniforms.progress, 0.0);
        run_frame(&mut engine, &clock, 6.0);
        assert!((engine.state().uniforms.progress - 0.5).abs() < 1e-4);
    }

    #[test]
    fn test_play_while_running_rejected() {
        let (mut engine, clock) = engine();
        let (first, cb) = counter();
        let _ = engine.play(cb);
        run_frame(&mut engine, &clock, 1.0);
        let (second, cb) = counter();
        assert_eq!(engine.play(cb), PlayOutcome::Rejected);
        assert_eq!(pair(&engine), TexturePair { a: 1, b: 2 });
        run_frame(&mut engine, &clock, 4.0);
        assert_eq!((first.get(), second.get()), (1, 0));
    }

    #[test]
    fn test_dispose_stops_time_and_cancels_transition() {
        let (mut engine, clock) = engine();
        let (calls, cb) = counter();
        let _ = engine.play(cb);
        run_frame(&mut engine, &clock, 1.0);
        assert!(engine.dispose());
        assert!(!engine.dispose());

        clock.set(10.0);
        assert!(engine.tick().is_none());
        assert_eq!(engine.state().uniforms.time, 1.0);
        assert_eq!(calls.get(), 0);
        assert!(!engine.is_running());

        let (late, cb) = counter();
        assert_eq!(engine.play(cb), PlayOutcome::Rejected);
        assert_eq!(late.get(), 0);
    }

    #[test]
    fn test_resize_through_engine() {
        let (mut engine, _) = engine();
        assert_eq!(engine.on_resize(1280, 720), None);
        assert_eq!(engine.on_resize(1000, 500), Some(BufferSize { width: 1000, height: 500 }));
        assert_eq!(engine.state().camera.aspect, 2.0);
        assert!(engine.on_resize(1000, 0).is_some());
        assert_eq!(engine.state().camera.aspect, 2.0);

        engine.dispose();
        assert_eq!(engine.on_resize(300, 300), None);
        assert_eq!(engine.state().viewport.width, 1000);
    }

    #[test]
    fn test_uniforms_complete_before_render() {
        let (mut engine, clock) = engine();
        let (_, cb) = counter();
        let _ = engine.play(cb);
        clock.set(2.0);
        let state = engine.tick().unwrap().clone();
        assert_eq!(state.uniforms.time, 2.0);
        assert_eq!(state.uniforms.distortion, 5.0);
        assert_eq!(state.bloom.strength, 20.0);
        assert!((state.uniforms.progress - 0.5).abs() < 1e-4);
        assert_eq!(state.uniforms.pair(), Some(TexturePair { a: 1, b: 2 }));
    }
}
