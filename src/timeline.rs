//! Explicit transition timeline: parameter ramps and milestones evaluated
//! against one transition-local clock.

use crate::config::{
    BLOOM_STRENGTH_PEAK, DISTORTION_PEAK, PROGRESS_DURATION, PROGRESS_START, TRANSITION_DURATION,
    TRANSITION_MIDPOINT,
};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Ease {
    Linear,
    InQuad,
    OutQuad,
    InOutQuad,
    InCubic,
    OutCubic,
    InOutCubic,
}

impl Ease {
    pub fn apply(self, t: f32) -> f32 {
        let t = t.clamp(0.0, 1.0);
        match self {
            Self::Linear => t,
            Self::InQuad => t * t,
            Self::OutQuad => 1.0 - (1.0 - t) * (1.0 - t),
            Self::InOutQuad => {
                if t < 0.5 {
                    2.0 * t * t
                } else {
                    1.0 - (-2.0 * t + 2.0).powi(2) / 2.0
                }
            }
            Self::InCubic => t * t * t,
            Self::OutCubic => 1.0 - (1.0 - t).powi(3),
            Self::InOutCubic => {
                if t < 0.5 {
                    4.0 * t * t * t
                } else {
                    1.0 - (-2.0 * t + 2.0).powi(3) / 2.0
                }
            }
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RampTarget {
    Distortion,
    BloomStrength,
    Progress,
}

impl RampTarget {
    pub const ALL: [RampTarget; 3] = [Self::Distortion, Self::BloomStrength, Self::Progress];
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Ramp {
    pub target: RampTarget,
    pub from: f32,
    pub to: f32,
    pub start: f32,
    pub duration: f32,
    pub ease: Ease,
}

impl Ramp {
    pub fn end(&self) -> f32 {
        self.start + self.duration
    }

    pub fn value_at(&self, t: f32) -> f32 {
        let local = if self.duration > 0.0 {
            (t - self.start) / self.duration
        } else if t >= self.start {
            1.0
        } else {
            0.0
        };
        self.from + (self.to - self.from) * self.ease.apply(local)
    }
}

/// Side effects pinned to a point on the transition clock.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Milestone {
    /// Populate the pair shown while the pulse builds up.
    InitialPair,
    /// Peak of the pulse: swap to the next pair.
    NextPair,
    /// End of the transition: notify the host.
    Complete,
}

#[derive(Clone, Debug)]
pub struct Timeline {
    ramps: Vec<Ramp>,
    /// Sorted by time.
    milestones: Vec<(f32, Milestone)>,
}

impl Timeline {
    pub fn new(ramps: Vec<Ramp>, mut milestones: Vec<(f32, Milestone)>) -> Self {
        milestones.sort_by(|a, b| a.0.total_cmp(&b.0));
        Self { ramps, milestones }
    }

    /// The bloom-pulse transition played when a clip ends.
    pub fn bloom_pulse() -> Self {
        let mid = TRANSITION_MIDPOINT;
        let tail = TRANSITION_DURATION - TRANSITION_MIDPOINT;
        Self::new(
            vec![
                Ramp { target: RampTarget::Distortion, from: 0.0, to: DISTORTION_PEAK, start: 0.0, duration: mid, ease: Ease::InOutCubic },
                Ramp { target: RampTarget::Distortion, from: DISTORTION_PEAK, to: 0.0, start: mid, duration: tail, ease: Ease::InOutCubic },
                Ramp { target: RampTarget::BloomStrength, from: 0.0, to: BLOOM_STRENGTH_PEAK, start: 0.0, duration: mid, ease: Ease::InCubic },
                Ramp { target: RampTarget::BloomStrength, from: BLOOM_STRENGTH_PEAK, to: 0.0, start: mid, duration: tail, ease: Ease::OutCubic },
                Ramp { target: RampTarget::Progress, from: 0.0, to: 1.0, start: PROGRESS_START, duration: PROGRESS_DURATION, ease: Ease::Linear },
            ],
            vec![
                (0.0, Milestone::InitialPair),
                (mid, Milestone::NextPair),
                (TRANSITION_DURATION, Milestone::Complete),
            ],
        )
    }

    pub fn duration(&self) -> f32 {
        let ramps = self.ramps.iter().map(Ramp::end);
        let milestones = self.milestones.iter().map(|(at, _)| *at);
        ramps.chain(milestones).fold(0.0, f32::max)
    }

    pub fn milestones(&self) -> &[(f32, Milestone)] {
        &self.milestones
    }

    /// Value of `target` at transition time `t`, or `None` if nothing ramps it.
    ///
    /// The ramp that started most recently wins. Before the first ramp of a
    /// target starts, the target holds that ramp's `from` value.
    pub fn value_at(&self, target: RampTarget, t: f32) -> Option<f32> {
        let mut first: Option<&Ramp> = None;
        let mut current: Option<&Ramp> = None;
        for ramp in self.ramps.iter().filter(|r| r.target == target) {
            if first.map_or(true, |f| ramp.start < f.start) {
                first = Some(ramp);
            }
            if ramp.start <= t && current.map_or(true, |c| ramp.start >= c.start) {
                current = Some(ramp);
            }
        }
        match (current, first) {
            (Some(ramp), _) => Some(ramp.value_at(t)),
            (None, Some(ramp)) => Some(ramp.from),
            (None, None) => None,
        }
    }

    pub fn sample(&self, t: f32) -> impl Iterator<Item = (RampTarget, f32)> + '_ {
        RampTarget::ALL
            .into_iter()
            .filter_map(move |target| self.value_at(target, t).map(|v| (target, v)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: f32, b: f32) -> bool {
        (a - b).abs() < 1e-4
    }

    #[test]
    fn test_ease_endpoints() {
        for ease in [
            Ease::Linear,
            Ease::InQuad,
            Ease::OutQuad,
            Ease::InOutQuad,
            Ease::InCubic,
            Ease::OutCubic,
            Ease::InOutCubic,
        ] {
            assert_eq!(ease.apply(0.0), 0.0);
            assert_eq!(ease.apply(1.0), 1.0);
            assert_eq!(ease.apply(-3.0), 0.0);
            assert_eq!(ease.apply(7.0), 1.0);
        }
    }

    #[test]
    fn test_ease_shapes() {
        assert!(Ease::InQuad.apply(0.5) < 0.5);
        assert!(Ease::OutQuad.apply(0.5) > 0.5);
        assert!(approx(Ease::InOutQuad.apply(0.5), 0.5));
        assert!(approx(Ease::InOutQuad.apply(0.25), 0.125));
        assert!(approx(Ease::InCubic.apply(0.5), 0.125));
        assert!(approx(Ease::OutCubic.apply(0.5), 0.875));
        assert!(approx(Ease::InOutCubic.apply(0.25), 0.0625));
        assert!(approx(Ease::InOutCubic.apply(0.5), 0.5));
    }

    #[test]
    fn test_pulse_ramps_are_cubic() {
        let timeline = Timeline::bloom_pulse();
        let at = |target, t| timeline.value_at(target, t).unwrap();
        assert!(approx(at(RampTarget::Distortion, 0.5), 0.3125));
        assert!(approx(at(RampTarget::Distortion, 3.5), 0.3125));
        assert!(approx(at(RampTarget::BloomStrength, 1.0), 2.5));
        assert!(approx(at(RampTarget::BloomStrength, 3.0), 2.5));
    }

    #[test]
    fn test_pulse_peaks_at_midpoint() {
        let timeline = Timeline::bloom_pulse();
        assert_eq!(timeline.value_at(RampTarget::Distortion, 2.0), Some(5.0));
        assert_eq!(timeline.value_at(RampTarget::BloomStrength, 2.0), Some(20.0));
        let just_before = timeline.value_at(RampTarget::Distortion, 1.999).unwrap();
        assert!(5.0 - just_before < 1e-3);
    }

    #[test]
    fn test_pulse_settles_at_end() {
        let timeline = Timeline::bloom_pulse();
        for t in [4.0, 4.5, 100.0] {
            assert_eq!(timeline.value_at(RampTarget::Distortion, t), Some(0.0));
            assert_eq!(timeline.value_at(RampTarget::BloomStrength, t), Some(0.0));
            assert_eq!(timeline.value_at(RampTarget::Progress, t), Some(1.0));
        }
    }

    #[test]
    fn test_progress_holds_until_its_ramp_starts() {
        let timeline = Timeline::bloom_pulse();
        assert_eq!(timeline.value_at(RampTarget::Progress, 0.0), Some(0.0));
        assert_eq!(timeline.value_at(RampTarget::Progress, 1.49), Some(0.0));
        assert!(approx(timeline.value_at(RampTarget::Progress, 2.0).unwrap(), 0.5));
        assert_eq!(timeline.value_at(RampTarget::Progress, 2.5), Some(1.0));
    }

    #[test]
    fn test_bloom_eases_differ_per_half() {
        let timeline = Timeline::bloom_pulse();
        // ease-in on the way up: below the linear midpoint
        assert!(timeline.value_at(RampTarget::BloomStrength, 1.0).unwrap() < 10.0);
        // ease-out on the way down: drops faster than linear
        assert!(timeline.value_at(RampTarget::BloomStrength, 3.0).unwrap() < 10.0);
    }

    #[test]
    fn test_milestones_sorted_and_duration() {
        let timeline = Timeline::new(
            vec![],
            vec![(4.0, Milestone::Complete), (0.0, Milestone::InitialPair), (2.0, Milestone::NextPair)],
        );
        let order: Vec<_> = timeline.milestones().iter().map(|(_, m)| *m).collect();
        assert_eq!(order, [Milestone::InitialPair, Milestone::NextPair, Milestone::Complete]);
        assert_eq!(Timeline::bloom_pulse().duration(), 4.0);
    }

    #[test]
    fn test_untargeted_parameter_is_none() {
        let timeline = Timeline::new(vec![], vec![]);
        assert_eq!(timeline.value_at(RampTarget::Distortion, 1.0), None);
        assert_eq!(timeline.sample(1.0).count(), 0);
    }
}
