use web_time::Instant;

/// Source of engine time in seconds since construction.
pub trait FrameClock {
    fn elapsed(&self) -> f32;
}

pub struct WallClock {
    start: Instant,
}

impl WallClock {
    pub fn new() -> Self {
        Self { start: Instant::now() }
    }
}

impl Default for WallClock {
    fn default() -> Self {
        Self::new()
    }
}

impl FrameClock for WallClock {
    fn elapsed(&self) -> f32 {
        self.start.elapsed().as_secs_f32()
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum SchedulerState {
    Idle,
    Running,
    Disposed,
}

/// Drives the per-refresh tick. The host asks for another refresh only while
/// [`FrameScheduler::is_running`] holds.
pub struct FrameScheduler<C> {
    clock: C,
    state: SchedulerState,
}

impl<C: FrameClock> FrameScheduler<C> {
    pub fn new(clock: C) -> Self {
        Self {
            clock,
            state: SchedulerState::Idle,
        }
    }

    pub fn start(&mut self) {
        if self.state == SchedulerState::Idle {
            self.state = SchedulerState::Running;
        }
    }

    pub fn is_running(&self) -> bool {
        self.state == SchedulerState::Running
    }

    pub fn now(&self) -> f32 {
        self.clock.elapsed()
    }

    /// Elapsed time for this refresh, or `None` once the loop is stopped.
    pub fn tick(&mut self) -> Option<f32> {
        self.is_running().then(|| self.clock.elapsed())
    }

    /// Cancels all further ticks. Returns `false` if already disposed.
    pub fn dispose(&mut self) -> bool {
        let was_disposed = self.state == SchedulerState::Disposed;
        self.state = SchedulerState::Disposed;
        !was_disposed
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::cell::Cell;
    use std::rc::Rc;

    #[derive(Clone, Default)]
    pub(crate) struct ManualClock(pub Rc<Cell<f32>>);

    impl ManualClock {
        pub(crate) fn set(&self, t: f32) {
            self.0.set(t);
        }
    }

    impl FrameClock for ManualClock {
        fn elapsed(&self) -> f32 {
            self.0.get()
        }
    }

    #[test]
    fn test_tick_requires_start() {
        let clock = ManualClock::default();
        let mut scheduler = FrameScheduler::new(clock.clone());
        clock.set(0.5);
        assert_eq!(scheduler.tick(), None);
        scheduler.start();
        assert_eq!(scheduler.tick(), Some(0.5));
        clock.set(0.75);
        assert_eq!(scheduler.tick(), Some(0.75));
    }

    #[test]
    fn test_dispose_stops_ticks_and_is_idempotent() {
        let clock = ManualClock::default();
        let mut scheduler = FrameScheduler::new(clock.clone());
        scheduler.start();
        assert!(scheduler.dispose());
        assert!(!scheduler.dispose());
        clock.set(3.0);
        assert_eq!(scheduler.tick(), None);
        scheduler.start();
        assert!(!scheduler.is_running());
        assert_eq!(scheduler.tick(), None);
    }

    #[test]
    fn test_wall_clock_is_monotonic() {
        let clock = WallClock::new();
        let a = clock.elapsed();
        let b = clock.elapsed();
        assert!(a >= 0.0);
        assert!(b >= a);
    }
}
