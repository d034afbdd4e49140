//! Fixed-schedule frame pacing.
//!
//! Each deadline is the previous deadline plus the target interval, never
//! `now` plus the interval: a frame that overruns its budget is reported and
//! the schedule simply carries on, so one slow frame neither shifts every
//! following frame nor makes the pacer try to catch up by shortening an
//! interval.

use std::time::{Duration, Instant};

/// Outcome of one scheduling step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Wait {
    /// Sleep this long to land on the deadline.
    Sleep(Duration),
    /// The deadline already passed by this much.
    Overrun(Duration),
}

/// Paces a send loop to a fixed inter-frame interval.
pub struct Pacer {
    interval: Duration,
    deadline: Option<Instant>,
    overruns: u64,
}

impl Pacer {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            deadline: None,
            overruns: 0,
        }
    }

    pub fn for_framerate(framerate: crate::types::Framerate) -> Self {
        Self::new(framerate.interval())
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Anchor the schedule: the first deadline becomes `now + interval`.
    pub fn start(&mut self, now: Instant) {
        self.deadline = Some(now + self.interval);
    }

    /// Frames that missed their deadline so far.
    pub fn overruns(&self) -> u64 {
        self.overruns
    }

    /// Next deadline, if the schedule has been anchored.
    pub fn next_deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Advance the schedule by one frame. Pure bookkeeping: the caller does
    /// the sleeping. The deadline always moves to `deadline + interval`,
    /// regardless of how late `now` is.
    pub fn step(&mut self, now: Instant) -> Wait {
        let deadline = match self.deadline {
            Some(d) => d,
            None => {
                self.start(now);
                self.deadline.unwrap()
            }
        };
        self.deadline = Some(deadline + self.interval);

        if let Some(remaining) = deadline.checked_duration_since(now) {
            Wait::Sleep(remaining)
        } else {
            self.overruns += 1;
            Wait::Overrun(now - deadline)
        }
    }

    /// Sleep until the next deadline; report (and absorb) an overrun.
    pub fn delay_until_next(&mut self) {
        match self.step(Instant::now()) {
            Wait::Sleep(remaining) => {
                if remaining > Duration::ZERO {
                    std::thread::sleep(remaining);
                }
            }
            Wait::Overrun(by) => {
                tracing::warn!(
                    over_us = by.as_micros() as u64,
                    total = self.overruns,
                    "slow frame: missed pacing deadline"
                );
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const INTERVAL: Duration = Duration::from_micros(40_000);

    #[test]
    fn first_step_targets_one_interval_out() {
        let mut pacer = Pacer::new(INTERVAL);
        let base = Instant::now();
        pacer.start(base);

        match pacer.step(base + Duration::from_millis(5)) {
            Wait::Sleep(d) => assert_eq!(d, Duration::from_millis(35)),
            other => panic!("expected sleep, got {:?}", other),
        }
    }

    #[test]
    fn deadlines_form_arithmetic_sequence() {
        let mut pacer = Pacer::new(INTERVAL);
        let base = Instant::now();
        pacer.start(base);

        // Irregular arrival times, including one badly late frame.
        let samples = [5_000u64, 41_000, 120_001, 125_000, 199_000];
        for offset in samples {
            pacer.step(base + Duration::from_micros(offset));
        }

        // After five steps the next deadline is exactly base + 6 intervals,
        // independent of how late any individual sample arrived.
        assert_eq!(pacer.next_deadline(), Some(base + INTERVAL * 6));
    }

    #[test]
    fn overrun_is_reported_not_absorbed() {
        let mut pacer = Pacer::new(INTERVAL);
        let base = Instant::now();
        pacer.start(base);

        // First frame 20ms past its 40ms deadline.
        match pacer.step(base + Duration::from_millis(60)) {
            Wait::Overrun(by) => assert_eq!(by, Duration::from_millis(20)),
            other => panic!("expected overrun, got {:?}", other),
        }
        assert_eq!(pacer.overruns(), 1);

        // The schedule did not re-base: the next deadline is still the
        // original base + 2 intervals, so this step owes only 20ms.
        match pacer.step(base + Duration::from_millis(60)) {
            Wait::Sleep(d) => assert_eq!(d, Duration::from_millis(20)),
            other => panic!("expected sleep, got {:?}", other),
        }
    }

    #[test]
    fn exactly_on_deadline_counts_as_sleep_zero() {
        let mut pacer = Pacer::new(INTERVAL);
        let base = Instant::now();
        pacer.start(base);
        assert_eq!(pacer.step(base + INTERVAL), Wait::Sleep(Duration::ZERO));
        assert_eq!(pacer.overruns(), 0);
    }

    #[test]
    fn unanchored_step_starts_the_schedule() {
        let mut pacer = Pacer::new(INTERVAL);
        let base = Instant::now();
        assert_eq!(pacer.step(base), Wait::Sleep(INTERVAL));
        assert_eq!(pacer.next_deadline(), Some(base + INTERVAL * 2));
    }
}
