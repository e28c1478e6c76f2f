//! Session state aggregate.
//!
//! The session is what the timer controller owns and mutates: the global
//! phase, the ordered plan, the cursor, and the break countdown. This module
//! is pure -- construction and derivation helpers only, no clock and no I/O.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::unit::{UnitPhase, WorkUnit};

/// Session-wide phase, orthogonal to each unit's own [`UnitPhase`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionPhase {
    Idle,
    Working,
    Paused,
    /// A unit's countdown reached zero and the caller owes a resolving
    /// command (`mark_logged` / `skip_logging` / `defer_to_next`).
    Logging,
    Break,
}

/// The aggregate owned by the controller.
///
/// `current_index` is a cursor into `plan`. It is *not* guaranteed to point
/// at the working or paused unit -- free navigation via `start_unit` lets
/// them diverge, and pause/resume locate the active unit by scanning unit
/// phases instead.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionState {
    pub phase: SessionPhase,
    pub plan: Vec<WorkUnit>,
    pub current_index: usize,
    /// Counts down only while `phase == Break`.
    pub break_seconds_left: u32,
    /// When the current working/break interval began. Advisory only.
    #[serde(default)]
    pub started_at: Option<DateTime<Utc>>,
}

impl SessionState {
    /// Empty idle session, the state at process start.
    pub fn idle() -> Self {
        Self {
            phase: SessionPhase::Idle,
            plan: Vec::new(),
            current_index: 0,
            break_seconds_left: 0,
            started_at: None,
        }
    }

    /// Unit under the cursor, if the plan is non-empty.
    pub fn current_unit(&self) -> Option<&WorkUnit> {
        self.plan.get(self.current_index)
    }

    /// Index of the unit actually counting down, found by scan.
    pub fn working_unit_index(&self) -> Option<usize> {
        self.plan.iter().position(|u| u.phase == UnitPhase::Working)
    }

    pub fn working_unit(&self) -> Option<&WorkUnit> {
        self.working_unit_index().map(|i| &self.plan[i])
    }

    /// Index of the first paused unit, found by scan.
    pub fn paused_unit_index(&self) -> Option<usize> {
        self.plan.iter().position(|u| u.phase == UnitPhase::Paused)
    }

    pub fn completed_count(&self) -> usize {
        self.plan.iter().filter(|u| u.is_completed()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.plan.is_empty()
    }
}

impl Default for SessionState {
    fn default() -> Self {
        Self::idle()
    }
}
