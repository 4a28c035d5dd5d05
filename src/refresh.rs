//! Live-mode refresh scheduling.
//!
//! The controller is a two-state machine (Idle / Running) that decides *when*
//! a pipeline cycle may start; it never runs the cycle itself. The TUI event
//! loop owns the controller, asks it `poll(now)` on every iteration, and
//! reports cycle completion back. Keeping the controller free of timers and
//! I/O makes the scheduling contract testable with plain `Instant` math.
//!
//! Invariants:
//! - at most one cycle is in flight at any time
//! - enabling triggers one immediate cycle
//! - while a cycle is in flight, an elapsed deadline defers the next trigger
//!   until the cycle completes (cycles never overlap)
//! - a failed cycle does not stop the timer; `disable()` is the only way out
//!   of Running

use std::time::Instant;

use crate::domain::{FetchRequest, RefreshConfig};

#[derive(Debug)]
enum State {
    Idle,
    Running {
        config: RefreshConfig,
        next_due: Instant,
        in_flight: bool,
    },
}

#[derive(Debug)]
pub struct RefreshController {
    state: State,
}

impl RefreshController {
    pub fn new() -> Self {
        Self { state: State::Idle }
    }

    pub fn is_running(&self) -> bool {
        matches!(self.state, State::Running { .. })
    }

    pub fn config(&self) -> Option<&RefreshConfig> {
        match &self.state {
            State::Idle => None,
            State::Running { config, .. } => Some(config),
        }
    }

    /// Idle -> Running. The first cycle is due immediately.
    pub fn enable(&mut self, config: RefreshConfig, now: Instant) {
        self.state = State::Running {
            config,
            next_due: now,
            in_flight: false,
        };
    }

    /// Running -> Idle. An in-flight fetch is allowed to complete; its result
    /// is discarded by the caller (generation check) once it returns.
    pub fn disable(&mut self) {
        self.state = State::Idle;
    }

    /// Ask whether a cycle should start now. Returns the request to fetch and
    /// marks the cycle in flight; the next deadline is scheduled relative to
    /// this trigger so a slow cycle shifts (rather than bunches) later ones.
    pub fn poll(&mut self, now: Instant) -> Option<FetchRequest> {
        let State::Running {
            config,
            next_due,
            in_flight,
        } = &mut self.state
        else {
            return None;
        };

        if *in_flight || now < *next_due {
            return None;
        }

        *in_flight = true;
        *next_due = now + config.interval();
        Some(config.request.clone())
    }

    /// Report that the in-flight cycle finished (successfully or not). A
    /// deadline that elapsed mid-cycle is already in the past, so the
    /// deferred trigger fires on the next `poll`.
    pub fn cycle_finished(&mut self) {
        if let State::Running { in_flight, .. } = &mut self.state {
            *in_flight = false;
        }
    }

    /// Time remaining until the next trigger, for the status line.
    pub fn due_in(&self, now: Instant) -> Option<std::time::Duration> {
        match &self.state {
            State::Idle => None,
            State::Running { next_due, .. } => {
                Some(next_due.saturating_duration_since(now))
            }
        }
    }
}

impl Default for RefreshController {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{FetchMode, IntervalCode, PeriodCode};
    use std::time::Duration;

    fn config(secs: u64) -> RefreshConfig {
        let request = FetchRequest {
            ticker: "AAPL".to_string(),
            mode: FetchMode::Period(PeriodCode::Mo1),
            interval: IntervalCode::D1,
        };
        RefreshConfig::new(secs, request).unwrap()
    }

    #[test]
    fn enable_triggers_one_immediate_cycle() {
        let t0 = Instant::now();
        let mut ctl = RefreshController::new();
        ctl.enable(config(5), t0);

        assert!(ctl.poll(t0).is_some());
        // No second trigger while the first is in flight.
        assert!(ctl.poll(t0).is_none());
    }

    #[test]
    fn one_cycle_per_interval_elapsed() {
        let t0 = Instant::now();
        let s = Duration::from_secs(1);
        let mut ctl = RefreshController::new();
        ctl.enable(config(5), t0);

        assert!(ctl.poll(t0).is_some());
        ctl.cycle_finished();

        // Nothing due before the interval elapses.
        assert!(ctl.poll(t0 + 3 * s).is_none());
        assert!(ctl.poll(t0 + 5 * s).is_some());
        ctl.cycle_finished();
        assert!(ctl.poll(t0 + 6 * s).is_none());
        assert!(ctl.poll(t0 + 10 * s).is_some());
    }

    #[test]
    fn slow_cycle_defers_instead_of_overlapping() {
        let t0 = Instant::now();
        let s = Duration::from_secs(1);
        let mut ctl = RefreshController::new();
        ctl.enable(config(5), t0);

        assert!(ctl.poll(t0).is_some());

        // The cycle is still running when the 5s deadline elapses: no trigger.
        assert!(ctl.poll(t0 + 5 * s).is_none());
        assert!(ctl.poll(t0 + 7 * s).is_none());

        // It completes at t0+7s; the deferred trigger fires on the next poll,
        // and the following deadline is scheduled from the trigger, not t0.
        ctl.cycle_finished();
        assert!(ctl.poll(t0 + 7 * s).is_some());
        ctl.cycle_finished();
        assert!(ctl.poll(t0 + 11 * s).is_none());
        assert!(ctl.poll(t0 + 12 * s).is_some());
    }

    #[test]
    fn failure_keeps_the_timer_running() {
        let t0 = Instant::now();
        let s = Duration::from_secs(1);
        let mut ctl = RefreshController::new();
        ctl.enable(config(5), t0);

        assert!(ctl.poll(t0).is_some());
        // Caller reports completion the same way on failure.
        ctl.cycle_finished();

        assert!(ctl.is_running());
        assert!(ctl.poll(t0 + 5 * s).is_some());
    }

    #[test]
    fn disable_stops_triggers() {
        let t0 = Instant::now();
        let s = Duration::from_secs(1);
        let mut ctl = RefreshController::new();
        ctl.enable(config(5), t0);

        assert!(ctl.poll(t0).is_some());
        ctl.disable();
        ctl.cycle_finished();

        assert!(!ctl.is_running());
        assert!(ctl.poll(t0 + 60 * s).is_none());
        assert!(ctl.due_in(t0).is_none());
    }
}
