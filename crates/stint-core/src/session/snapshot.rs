//! Persisted session snapshot.
//!
//! The snapshot is the serializable projection of session state used for
//! crash/restart recovery. Encoding is plain serde; decoding is defensive,
//! field by field, because the snapshot may come from an older build or a
//! partially written file: a malformed plan entry is dropped rather than
//! aborting the whole restore, and every scalar is clamped or defaulted into
//! a valid range.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::state::{SessionPhase, SessionState};
use super::unit::WorkUnit;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionSnapshot {
    pub plan: Vec<WorkUnit>,
    pub current_index: usize,
    pub phase: SessionPhase,
    pub break_seconds_left: u32,
    /// Day the snapshot belongs to. Recorded only -- whether a snapshot from
    /// a previous day should be discarded is the caller's policy.
    pub today: NaiveDate,
    pub last_active_at: DateTime<Utc>,
}

impl SessionSnapshot {
    /// Capture the current session.
    pub fn capture(state: &SessionState) -> Self {
        Self {
            plan: state.plan.clone(),
            current_index: state.current_index,
            phase: state.phase,
            break_seconds_left: state.break_seconds_left,
            today: Utc::now().date_naive(),
            last_active_at: Utc::now(),
        }
    }

    pub fn encode(&self) -> String {
        // SessionSnapshot contains nothing that can fail to serialize.
        serde_json::to_string(self).unwrap_or_else(|_| "{}".into())
    }

    /// Parse a stored snapshot string. Fails only on syntactically invalid
    /// JSON; structural problems are repaired by [`SessionSnapshot::from_json`].
    pub fn decode(raw: &str) -> Result<Self, serde_json::Error> {
        let value: Value = serde_json::from_str(raw)?;
        Ok(Self::from_json(&value))
    }

    /// Rebuild a snapshot from loosely structured JSON.
    ///
    /// - plan entries that fail validation are dropped;
    /// - `current_index` is clamped into the plan;
    /// - an unrecognized `phase` defaults to `idle`;
    /// - `break_seconds_left` is clamped to >= 0;
    /// - `today` / `last_active_at` fall back to now when unparseable.
    pub fn from_json(value: &Value) -> Self {
        let plan: Vec<WorkUnit> = value
            .get("plan")
            .and_then(Value::as_array)
            .map(|entries| {
                entries
                    .iter()
                    .filter_map(|entry| serde_json::from_value(entry.clone()).ok())
                    .collect()
            })
            .unwrap_or_default();

        let max_index = plan.len().saturating_sub(1);
        let current_index = value
            .get("current_index")
            .and_then(Value::as_u64)
            .map(|i| (i as usize).min(max_index))
            .unwrap_or(0);

        let phase = value
            .get("phase")
            .cloned()
            .and_then(|p| serde_json::from_value(p).ok())
            .unwrap_or(SessionPhase::Idle);

        let break_seconds_left = value
            .get("break_seconds_left")
            .and_then(Value::as_i64)
            .map(|s| s.max(0).min(u32::MAX as i64) as u32)
            .unwrap_or(0);

        let today = value
            .get("today")
            .and_then(Value::as_str)
            .and_then(|s| s.parse::<NaiveDate>().ok())
            .unwrap_or_else(|| Utc::now().date_naive());

        let last_active_at = value
            .get("last_active_at")
            .and_then(Value::as_str)
            .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
            .map(|t| t.with_timezone(&Utc))
            .unwrap_or_else(Utc::now);

        Self {
            plan,
            current_index,
            phase,
            break_seconds_left,
            today,
            last_active_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn round_trip_preserves_plan() {
        let mut state = SessionState::idle();
        state.plan = vec![WorkUnit::new(7, "write docs", 3, "Documentation", 1500)];
        state.current_index = 0;

        let snapshot = SessionSnapshot::capture(&state);
        let restored = SessionSnapshot::decode(&snapshot.encode()).unwrap();
        assert_eq!(restored.plan.len(), 1);
        assert_eq!(restored.plan[0].task_ref, 7);
        assert_eq!(restored.plan[0].seconds_left, 1500);
        assert_eq!(restored.phase, SessionPhase::Idle);
    }

    #[test]
    fn malformed_plan_entries_are_dropped() {
        let value = json!({
            "plan": [
                {
                    "task_ref": 1, "task_label": "ok", "activity_ref": 2,
                    "activity_label": "dev", "seconds_left": 300, "phase": "pending"
                },
                { "task_label": "missing numeric fields" },
                { "task_ref": 3, "seconds_left": -5 },
                "not even an object"
            ],
            "phase": "working",
            "current_index": 0
        });
        let snapshot = SessionSnapshot::from_json(&value);
        assert_eq!(snapshot.plan.len(), 1);
        assert_eq!(snapshot.plan[0].task_ref, 1);
    }

    #[test]
    fn cursor_is_clamped_into_plan() {
        let value = json!({
            "plan": [
                {
                    "task_ref": 1, "task_label": "a", "activity_ref": 1,
                    "activity_label": "x", "seconds_left": 10, "phase": "pending"
                },
                {
                    "task_ref": 2, "task_label": "b", "activity_ref": 1,
                    "activity_label": "x", "seconds_left": 10, "phase": "pending"
                }
            ],
            "current_index": 99
        });
        assert_eq!(SessionSnapshot::from_json(&value).current_index, 1);
    }

    #[test]
    fn cursor_on_empty_plan_is_zero() {
        let snapshot = SessionSnapshot::from_json(&json!({ "current_index": 5 }));
        assert_eq!(snapshot.current_index, 0);
        assert!(snapshot.plan.is_empty());
    }

    #[test]
    fn unknown_phase_defaults_to_idle() {
        let snapshot = SessionSnapshot::from_json(&json!({ "phase": "hibernating" }));
        assert_eq!(snapshot.phase, SessionPhase::Idle);
    }

    #[test]
    fn negative_break_seconds_clamp_to_zero() {
        let snapshot = SessionSnapshot::from_json(&json!({ "break_seconds_left": -30 }));
        assert_eq!(snapshot.break_seconds_left, 0);
    }

    #[test]
    fn bad_timestamps_fall_back_to_now() {
        let before = Utc::now();
        let snapshot = SessionSnapshot::from_json(&json!({
            "last_active_at": "yesterday-ish",
            "today": "not a date"
        }));
        assert!(snapshot.last_active_at >= before);
        assert_eq!(snapshot.today, Utc::now().date_naive());
    }

    #[test]
    fn decode_rejects_invalid_json() {
        assert!(SessionSnapshot::decode("{ nope").is_err());
    }
}
