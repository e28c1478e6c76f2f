//! Work-unit timer controller.
//!
//! The controller is the stateful engine of the crate: it owns one
//! [`SessionState`], the single clock resource, and the two observer lists.
//! It does not run a thread -- the host calls [`TimerController::tick`] once
//! per second, and the controller advances whichever countdown the clock is
//! bound to.
//!
//! ## Command policy
//!
//! Every command is synchronous. A command issued in the wrong phase, with an
//! out-of-range index, or against a completed unit is a silent no-op, never
//! an error: callers guard with the query methods, and no-ops keep the
//! machine robust against stale UI actions. Each successful mutation is
//! immediately followed by a state-changed emission carrying a snapshot copy.
//!
//! ## Cursor vs. active unit
//!
//! `current_index` and the unit actually counting down may diverge after
//! `start_unit` navigation. `pause`, `resume`, and `remove_unit` therefore
//! locate the active unit by scanning unit phases, never by trusting the
//! cursor.

use chrono::Utc;

use crate::events::{Observers, SubscriptionId};
use crate::session::{SessionPhase, SessionSnapshot, SessionState, UnitPhase, WorkUnit};

use super::clock::ActiveClock;

/// Durations and advance policy, normally loaded from the TOML config.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TimerSettings {
    /// Countdown preset for a fresh or reset work unit, in seconds.
    pub work_secs: u32,
    /// Break countdown started after each resolved unit, in seconds.
    pub break_secs: u32,
    /// Start the next unit automatically when the break countdown expires.
    /// When false the session parks in idle instead.
    pub auto_advance: bool,
}

impl Default for TimerSettings {
    fn default() -> Self {
        Self {
            work_secs: 25 * 60,
            break_secs: 5 * 60,
            auto_advance: true,
        }
    }
}

pub struct TimerController {
    state: SessionState,
    settings: TimerSettings,
    clock: ActiveClock,
    disposed: bool,
    state_observers: Observers<SessionState>,
    complete_observers: Observers<WorkUnit>,
}

impl TimerController {
    pub fn new(settings: TimerSettings) -> Self {
        Self {
            state: SessionState::idle(),
            settings,
            clock: ActiveClock::Stopped,
            disposed: false,
            state_observers: Observers::new(),
            complete_observers: Observers::new(),
        }
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn phase(&self) -> SessionPhase {
        self.state.phase
    }

    /// Snapshot copy of the full session. Callers never see the live state.
    pub fn state(&self) -> SessionState {
        self.state.clone()
    }

    pub fn plan(&self) -> Vec<WorkUnit> {
        self.state.plan.clone()
    }

    pub fn current_unit(&self) -> Option<WorkUnit> {
        self.state.current_unit().cloned()
    }

    pub fn working_unit(&self) -> Option<WorkUnit> {
        self.state.working_unit().cloned()
    }

    /// Break time while on break, the working unit's time while working,
    /// otherwise the cursor unit's remaining time.
    pub fn seconds_left(&self) -> u32 {
        match self.state.phase {
            SessionPhase::Break => self.state.break_seconds_left,
            SessionPhase::Working => self
                .state
                .working_unit()
                .map(|u| u.seconds_left)
                .unwrap_or(0),
            _ => self
                .state
                .current_unit()
                .map(|u| u.seconds_left)
                .unwrap_or(0),
        }
    }

    pub fn settings(&self) -> TimerSettings {
        self.settings
    }

    pub fn is_disposed(&self) -> bool {
        self.disposed
    }

    // ── Event streams ────────────────────────────────────────────────

    /// Fires after every successful mutation with a snapshot of the session.
    pub fn on_state_change(
        &mut self,
        listener: impl FnMut(&SessionState) + 'static,
    ) -> SubscriptionId {
        self.state_observers.subscribe(listener)
    }

    /// Fires exactly once per unit expiry with a copy of the expired unit.
    pub fn on_timer_complete(
        &mut self,
        listener: impl FnMut(&WorkUnit) + 'static,
    ) -> SubscriptionId {
        self.complete_observers.subscribe(listener)
    }

    pub fn unsubscribe_state_change(&mut self, id: SubscriptionId) -> bool {
        self.state_observers.unsubscribe(id)
    }

    pub fn unsubscribe_timer_complete(&mut self, id: SubscriptionId) -> bool {
        self.complete_observers.unsubscribe(id)
    }

    // ── Commands ─────────────────────────────────────────────────────

    /// Replace the plan wholesale and reset the cursor. The session phase is
    /// left untouched.
    pub fn set_plan(&mut self, units: Vec<WorkUnit>) {
        if self.disposed {
            return;
        }
        self.state.plan = units;
        self.state.current_index = 0;
        self.emit_state();
    }

    /// Begin working the cursor unit from idle.
    pub fn start(&mut self) {
        if self.disposed || self.state.phase != SessionPhase::Idle {
            return;
        }
        let index = self.state.current_index;
        match self.state.plan.get(index) {
            Some(unit) if !unit.is_completed() => {}
            _ => return,
        }
        self.activate(index);
        self.emit_state();
    }

    /// Pause the currently working unit, wherever it is in the plan.
    pub fn pause(&mut self) {
        if self.disposed || self.state.phase != SessionPhase::Working {
            return;
        }
        let Some(index) = self.state.working_unit_index() else {
            return;
        };
        self.state.plan[index].phase = UnitPhase::Paused;
        self.state.phase = SessionPhase::Paused;
        self.state.started_at = None;
        self.clock.stop();
        self.emit_state();
    }

    /// Resume the paused unit. Prefers the unit actually marked paused over
    /// the cursor unit and moves the cursor to it.
    pub fn resume(&mut self) {
        if self.disposed || self.state.phase != SessionPhase::Paused {
            return;
        }
        let index = self
            .state
            .paused_unit_index()
            .unwrap_or(self.state.current_index);
        match self.state.plan.get(index) {
            Some(unit) if !unit.is_completed() => {}
            _ => return,
        }
        self.activate(index);
        self.emit_state();
    }

    /// Pause everything and drop to idle. The plan is preserved; this is the
    /// "exit for now" command, distinct from [`TimerController::clear_plan`].
    pub fn stop(&mut self) {
        if self.disposed {
            return;
        }
        if let Some(index) = self.state.working_unit_index() {
            self.state.plan[index].phase = UnitPhase::Paused;
        }
        self.state.phase = SessionPhase::Idle;
        self.state.started_at = None;
        self.clock.stop();
        self.emit_state();
    }

    /// Destroy the session: clock stopped, plan discarded, back to idle.
    pub fn clear_plan(&mut self) {
        if self.disposed {
            return;
        }
        self.clock.stop();
        self.state = SessionState::idle();
        self.emit_state();
    }

    /// Jump to unit `index` without going through idle, auto-pausing
    /// whatever was working.
    pub fn start_unit(&mut self, index: usize) {
        if self.disposed || self.state.phase == SessionPhase::Logging {
            return;
        }
        match self.state.plan.get(index) {
            Some(unit) if !unit.is_completed() => {}
            _ => return,
        }
        if let Some(working) = self.state.working_unit_index() {
            if working != index {
                self.state.plan[working].phase = UnitPhase::Paused;
            }
        }
        self.activate(index);
        self.emit_state();
    }

    /// Reset a unit's countdown to the full work duration. A working unit
    /// keeps working; a paused or pending unit goes back to pending. When
    /// the reset consumed the only paused unit of a paused session, the
    /// session drops to idle.
    pub fn reset_unit(&mut self, index: usize) {
        if self.disposed {
            return;
        }
        let Some(unit) = self.state.plan.get_mut(index) else {
            return;
        };
        if unit.is_completed() {
            return;
        }
        unit.seconds_left = self.settings.work_secs;
        if unit.phase != UnitPhase::Working {
            unit.phase = UnitPhase::Pending;
            if self.state.phase == SessionPhase::Paused
                && self.state.paused_unit_index().is_none()
            {
                self.state.phase = SessionPhase::Idle;
            }
        }
        self.emit_state();
    }

    /// Remove a unit from the plan. The working unit cannot be removed.
    pub fn remove_unit(&mut self, index: usize) {
        if self.disposed {
            return;
        }
        match self.state.plan.get(index) {
            Some(unit) if unit.phase != UnitPhase::Working => {}
            _ => return,
        }
        self.state.plan.remove(index);
        if self.state.plan.is_empty() {
            self.clock.stop();
            self.state = SessionState::idle();
            self.emit_state();
            return;
        }
        if index < self.state.current_index {
            self.state.current_index -= 1;
        }
        if self.state.current_index >= self.state.plan.len() {
            self.state.current_index = self.state.plan.len() - 1;
        }
        if self.state.phase == SessionPhase::Paused && self.state.paused_unit_index().is_none() {
            self.state.phase = SessionPhase::Idle;
        }
        self.emit_state();
    }

    /// Reorder the plan. The cursor keeps pointing at the same logical unit.
    pub fn move_unit(&mut self, from: usize, to: usize) {
        if self.disposed
            || from == to
            || from >= self.state.plan.len()
            || to >= self.state.plan.len()
        {
            return;
        }
        let unit = self.state.plan.remove(from);
        self.state.plan.insert(to, unit);
        let cursor = self.state.current_index;
        if cursor == from {
            self.state.current_index = to;
        } else if from < cursor && to >= cursor {
            self.state.current_index = cursor - 1;
        } else if from > cursor && to <= cursor {
            self.state.current_index = cursor + 1;
        }
        self.emit_state();
    }

    /// Advance whichever countdown the clock is bound to by one second.
    ///
    /// The host calls this at 1 Hz. When the working unit reaches zero the
    /// clock stops, the session enters the logging phase, and timer-complete
    /// fires exactly once with that unit's snapshot. When the break reaches
    /// zero the session either advances to the next unit (`auto_advance`)
    /// or parks in idle.
    pub fn tick(&mut self) {
        if self.disposed {
            return;
        }
        match self.clock {
            ActiveClock::Stopped => {}
            ActiveClock::Work => {
                let Some(index) = self.state.working_unit_index() else {
                    return;
                };
                let unit = &mut self.state.plan[index];
                unit.seconds_left = unit.seconds_left.saturating_sub(1);
                if unit.seconds_left == 0 {
                    self.clock.stop();
                    // Parked at zero; a resolving command completes it.
                    unit.phase = UnitPhase::Paused;
                    self.state.current_index = index;
                    self.state.phase = SessionPhase::Logging;
                    self.state.started_at = None;
                    let expired = self.state.plan[index].clone();
                    self.emit_state();
                    self.complete_observers.emit(&expired);
                } else {
                    self.emit_state();
                }
            }
            ActiveClock::Break => {
                self.state.break_seconds_left = self.state.break_seconds_left.saturating_sub(1);
                if self.state.break_seconds_left == 0 {
                    self.clock.stop();
                    if self.settings.auto_advance {
                        self.advance_to_next();
                    } else {
                        self.state.phase = SessionPhase::Idle;
                        self.state.started_at = None;
                    }
                }
                self.emit_state();
            }
        }
    }

    /// Resolve the expired unit as logged and start the break.
    pub fn mark_logged(&mut self, hours: f64, external_ref: Option<String>) {
        if self.disposed || self.state.phase != SessionPhase::Logging {
            return;
        }
        let index = self.state.current_index;
        let Some(unit) = self.state.plan.get_mut(index) else {
            return;
        };
        unit.logged = true;
        unit.logged_hours = Some(hours);
        unit.external_log_ref = external_ref;
        unit.phase = UnitPhase::Completed;
        unit.completed_at = Some(Utc::now());
        self.begin_break();
        self.emit_state();
    }

    /// Resolve the expired unit without logging and start the break.
    pub fn skip_logging(&mut self) {
        if self.disposed || self.state.phase != SessionPhase::Logging {
            return;
        }
        let index = self.state.current_index;
        let Some(unit) = self.state.plan.get_mut(index) else {
            return;
        };
        unit.phase = UnitPhase::Completed;
        unit.completed_at = Some(Utc::now());
        self.begin_break();
        self.emit_state();
    }

    /// Resolve the expired unit by carrying its minutes forward: the unit's
    /// own carried minutes plus `minutes` move to the next pending or paused
    /// unit after the cursor. With no eligible unit the minutes are dropped.
    pub fn defer_to_next(&mut self, minutes: u32) {
        if self.disposed || self.state.phase != SessionPhase::Logging {
            return;
        }
        let index = self.state.current_index;
        let Some(unit) = self.state.plan.get_mut(index) else {
            return;
        };
        let carried = unit.deferred_minutes.saturating_add(minutes);
        unit.phase = UnitPhase::Completed;
        unit.completed_at = Some(Utc::now());
        let next = self
            .state
            .plan
            .iter()
            .enumerate()
            .skip(index + 1)
            .find(|(_, u)| u.accepts_deferral())
            .map(|(i, _)| i);
        if let Some(next) = next {
            let target = &mut self.state.plan[next];
            target.deferred_minutes = target.deferred_minutes.saturating_add(carried);
        }
        self.begin_break();
        self.emit_state();
    }

    /// Out-of-band completion: log a unit before its timer expires. If the
    /// unit was working, the clock stops and the session drops straight to
    /// idle, bypassing logging and break.
    pub fn mark_unit_logged(&mut self, index: usize, hours: f64, external_ref: Option<String>) {
        if self.disposed {
            return;
        }
        let Some(unit) = self.state.plan.get_mut(index) else {
            return;
        };
        if unit.is_completed() {
            return;
        }
        let was_working = unit.phase == UnitPhase::Working;
        unit.logged = true;
        unit.logged_hours = Some(hours);
        unit.external_log_ref = external_ref;
        unit.phase = UnitPhase::Completed;
        unit.completed_at = Some(Utc::now());
        if was_working {
            self.clock.stop();
            self.state.phase = SessionPhase::Idle;
            self.state.started_at = None;
        } else if self.state.phase == SessionPhase::Logging && index == self.state.current_index {
            // The unit awaiting resolution was completed out of band.
            self.state.phase = SessionPhase::Idle;
        } else if self.state.phase == SessionPhase::Paused
            && self.state.paused_unit_index().is_none()
        {
            self.state.phase = SessionPhase::Idle;
        }
        self.emit_state();
    }

    /// Mid-session partial log: accumulate hours and restart the countdown
    /// without completing the unit. The unit keeps working.
    pub fn log_and_continue(&mut self, index: usize, hours: f64) {
        if self.disposed {
            return;
        }
        let Some(unit) = self.state.plan.get_mut(index) else {
            return;
        };
        if unit.phase != UnitPhase::Working {
            return;
        }
        unit.logged_hours = Some(unit.logged_hours.unwrap_or(0.0) + hours);
        unit.seconds_left = self.settings.work_secs;
        self.emit_state();
    }

    /// Leave the break and start the next remaining unit, or drop to idle
    /// when the plan is exhausted.
    pub fn start_next_unit(&mut self) {
        if self.disposed || self.state.phase != SessionPhase::Break {
            return;
        }
        self.clock.stop();
        self.advance_to_next();
        self.emit_state();
    }

    /// Cut the break short. Identical to [`TimerController::start_next_unit`].
    pub fn skip_break(&mut self) {
        self.start_next_unit();
    }

    /// Phase-dependent convenience: idle starts, working pauses, paused
    /// resumes, break advances. A no-op in the logging phase, which requires
    /// an explicit resolving command.
    pub fn toggle(&mut self) {
        match self.state.phase {
            SessionPhase::Idle => self.start(),
            SessionPhase::Working => self.pause(),
            SessionPhase::Paused => self.resume(),
            SessionPhase::Break => self.start_next_unit(),
            SessionPhase::Logging => {}
        }
    }

    /// Rebuild the session from a persisted snapshot.
    ///
    /// The clock is stopped first. A `logging` phase is preserved verbatim
    /// -- the caller still owes a resolving command. Every other phase is
    /// forced to idle and any working unit is coerced to paused: nothing was
    /// lost in the restart, but nothing resumes automatically either. The
    /// plan is deep-copied so later mutations cannot alias the snapshot.
    pub fn restore_state(&mut self, snapshot: &SessionSnapshot) {
        if self.disposed {
            return;
        }
        self.clock.stop();
        let mut plan = snapshot.plan.clone();
        let phase = if snapshot.phase == SessionPhase::Logging {
            SessionPhase::Logging
        } else {
            for unit in &mut plan {
                if unit.phase == UnitPhase::Working {
                    unit.phase = UnitPhase::Paused;
                }
            }
            SessionPhase::Idle
        };
        let current_index = snapshot.current_index.min(plan.len().saturating_sub(1));
        self.state = SessionState {
            phase,
            plan,
            current_index,
            break_seconds_left: snapshot.break_seconds_left,
            started_at: None,
        };
        self.emit_state();
    }

    /// Tear the controller down. Later commands and ticks are no-ops and no
    /// further events fire.
    pub fn dispose(&mut self) {
        self.clock.stop();
        self.disposed = true;
        self.state_observers.clear();
        self.complete_observers.clear();
    }

    // ── Internal ─────────────────────────────────────────────────────

    /// Make unit `index` the working unit and bind the clock to it. The
    /// caller has already validated the index.
    fn activate(&mut self, index: usize) {
        self.state.plan[index].phase = UnitPhase::Working;
        self.state.current_index = index;
        self.state.phase = SessionPhase::Working;
        self.state.started_at = Some(Utc::now());
        self.clock.start_work();
    }

    fn begin_break(&mut self) {
        self.state.phase = SessionPhase::Break;
        self.state.break_seconds_left = self.settings.break_secs;
        self.state.started_at = Some(Utc::now());
        self.clock.start_break();
    }

    /// Scan forward from the cursor for the next unit that can still run.
    /// The cursor unit itself counts when it never ran, which happens after
    /// the just-finished unit is removed and a later unit slides into its
    /// slot.
    fn advance_to_next(&mut self) {
        let from = match self.state.current_unit() {
            Some(unit) if !unit.is_completed() => self.state.current_index,
            _ => self.state.current_index + 1,
        };
        let next = self
            .state
            .plan
            .iter()
            .enumerate()
            .skip(from)
            .find(|(_, u)| !u.is_completed())
            .map(|(i, _)| i);
        self.state.break_seconds_left = 0;
        match next {
            Some(index) => self.activate(index),
            None => {
                self.state.phase = SessionPhase::Idle;
                self.state.started_at = None;
            }
        }
    }

    fn emit_state(&mut self) {
        let snapshot = self.state.clone();
        self.state_observers.emit(&snapshot);
    }
}
