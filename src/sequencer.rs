use log::{debug, warn};

use crate::timeline::{Milestone, RampTarget, Timeline};

pub type OnComplete = Box<dyn FnOnce()>;

#[must_use]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PlayOutcome {
    Started,
    /// A transition is already running; the new request was dropped.
    Rejected,
}

struct ActiveTransition {
    started_at: f32,
    next_milestone: usize,
    on_complete: Option<OnComplete>,
}

/// What changed between the previous advance and `now`.
pub struct TransitionStep {
    pub t: f32,
    pub values: Vec<(RampTarget, f32)>,
    /// Milestones crossed since the previous step, in time order.
    pub milestones: Vec<Milestone>,
    /// Present exactly once, on the step that crosses [`Milestone::Complete`].
    pub on_complete: Option<OnComplete>,
}

/// Runs at most one timeline at a time against the engine clock.
pub struct TransitionSequencer {
    timeline: Timeline,
    active: Option<ActiveTransition>,
}

impl TransitionSequencer {
    pub fn new(timeline: Timeline) -> Self {
        Self {
            timeline,
            active: None,
        }
    }

    pub fn is_active(&self) -> bool {
        self.active.is_some()
    }

    pub fn play(&mut self, now: f32, on_complete: OnComplete) -> PlayOutcome {
        if self.active.is_some() {
            warn!("transition already running, ignoring play request");
            return PlayOutcome::Rejected;
        }
        debug!("transition started at {now:.3}s");
        self.active = Some(ActiveTransition {
            started_at: now,
            next_milestone: 0,
            on_complete: Some(on_complete),
        });
        PlayOutcome::Started
    }

    /// Samples the running timeline at engine time `now`.
    pub fn advance(&mut self, now: f32) -> Option<TransitionStep> {
        let active = self.active.as_mut()?;
        let t = (now - active.started_at).max(0.0);

        let values = self.timeline.sample(t).collect();
        let mut milestones = Vec::new();
        let mut on_complete = None;
        let mut finished = false;

        for &(at, milestone) in &self.timeline.milestones()[active.next_milestone..] {
            if at > t {
                break;
            }
            active.next_milestone += 1;
            milestones.push(milestone);
            if milestone == Milestone::Complete {
                on_complete = active.on_complete.take();
                finished = true;
            }
        }

        let drained = active.next_milestone >= self.timeline.milestones().len();
        if finished || (drained && t >= self.timeline.duration()) {
            debug!("transition finished at t={t:.3}s");
            self.active = None;
        }

        Some(TransitionStep {
            t,
            values,
            milestones,
            on_complete,
        })
    }

    /// Drops the running transition without invoking its completion.
    pub fn cancel(&mut self) -> bool {
        self.active.take().is_some()
    }
}
