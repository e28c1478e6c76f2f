//! Work unit model.
//!
//! A work unit is one planned, independently timed block of work tied to an
//! external task reference. Pure data -- all behavior lives in the timer
//! controller.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Lifecycle sub-state of a single work unit.
///
/// `Completed` is terminal: no command re-activates a completed unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UnitPhase {
    Pending,
    Working,
    Paused,
    Completed,
}

/// One planned block of work and its outcome.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkUnit {
    /// External task identifier; `0` means "unassigned".
    pub task_ref: u64,
    pub task_label: String,
    pub activity_ref: u64,
    pub activity_label: String,
    #[serde(default)]
    pub comment: Option<String>,
    /// This unit's own countdown, independent of any other unit's.
    pub seconds_left: u32,
    pub phase: UnitPhase,
    #[serde(default)]
    pub logged: bool,
    #[serde(default)]
    pub logged_hours: Option<f64>,
    /// Opaque reference returned by the external logging sink.
    #[serde(default)]
    pub external_log_ref: Option<String>,
    #[serde(default)]
    pub completed_at: Option<DateTime<Utc>>,
    /// Minutes carried in from a prior unit that was deferred instead of
    /// logged. Only ever grows.
    #[serde(default)]
    pub deferred_minutes: u32,
}

impl WorkUnit {
    /// Create a pending unit preset to the configured work duration.
    pub fn new(
        task_ref: u64,
        task_label: impl Into<String>,
        activity_ref: u64,
        activity_label: impl Into<String>,
        work_secs: u32,
    ) -> Self {
        Self {
            task_ref,
            task_label: task_label.into(),
            activity_ref,
            activity_label: activity_label.into(),
            comment: None,
            seconds_left: work_secs,
            phase: UnitPhase::Pending,
            logged: false,
            logged_hours: None,
            external_log_ref: None,
            completed_at: None,
            deferred_minutes: 0,
        }
    }

    pub fn with_comment(mut self, comment: impl Into<String>) -> Self {
        self.comment = Some(comment.into());
        self
    }

    pub fn is_completed(&self) -> bool {
        self.phase == UnitPhase::Completed
    }

    pub fn is_assigned(&self) -> bool {
        self.task_ref != 0
    }

    /// True while the unit can still accept carried-over minutes.
    pub fn accepts_deferral(&self) -> bool {
        matches!(self.phase, UnitPhase::Pending | UnitPhase::Paused)
    }
}
