pub mod config;
pub mod plan;
pub mod timer;
pub mod worklog;

use chrono::Utc;
use stint_core::{Config, Database, SessionSnapshot, SessionState, TimerController, WorkUnit};

const SNAPSHOT_KEY: &str = "session_snapshot";

/// Read the stored session snapshot, if there is one worth keeping.
///
/// A snapshot from a previous day is discarded -- the plan belongs to the
/// day it was made.
pub fn load_snapshot(db: &Database) -> Option<SessionSnapshot> {
    let raw = db.kv_get(SNAPSHOT_KEY).ok().flatten()?;
    let snapshot = SessionSnapshot::decode(&raw).ok()?;
    (snapshot.today == Utc::now().date_naive()).then_some(snapshot)
}

/// Rebuild the controller from the stored snapshot.
pub fn load_controller(db: &Database, config: &Config) -> TimerController {
    let mut controller = TimerController::new(config.timer_settings());
    if let Some(snapshot) = load_snapshot(db) {
        controller.restore_state(&snapshot);
    }
    controller
}

pub fn save_controller(
    db: &Database,
    controller: &TimerController,
) -> Result<(), Box<dyn std::error::Error>> {
    let snapshot = SessionSnapshot::capture(&controller.state());
    db.kv_set(SNAPSHOT_KEY, &snapshot.encode())?;
    Ok(())
}

/// Append a unit to the stored plan without disturbing the live session.
///
/// Going through the controller would mean `set_plan`, which resets the
/// cursor to the front of the plan. Editing the snapshot directly keeps the
/// cursor and phase exactly where the session left them, so a resolution
/// owed on an expired unit still lands on that unit.
pub fn append_to_plan(
    db: &Database,
    unit: WorkUnit,
) -> Result<SessionSnapshot, Box<dyn std::error::Error>> {
    let mut snapshot =
        load_snapshot(db).unwrap_or_else(|| SessionSnapshot::capture(&SessionState::idle()));
    snapshot.plan.push(unit);
    snapshot.last_active_at = Utc::now();
    db.kv_set(SNAPSHOT_KEY, &snapshot.encode())?;
    Ok(snapshot)
}

pub fn print_status(controller: &TimerController) -> Result<(), Box<dyn std::error::Error>> {
    println!("{}", serde_json::to_string_pretty(&controller.state())?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use stint_core::{SessionPhase, TimerSettings, UnitPhase};

    fn unit(task_ref: u64) -> WorkUnit {
        WorkUnit::new(task_ref, format!("task {task_ref}"), 9, "Development", 2)
    }

    fn short_settings() -> TimerSettings {
        TimerSettings {
            work_secs: 2,
            break_secs: 1,
            auto_advance: true,
        }
    }

    #[test]
    fn append_preserves_cursor_and_phase_of_a_live_session() {
        let db = Database::open_memory().unwrap();
        let mut c = TimerController::new(short_settings());
        c.set_plan(vec![unit(1), unit(2)]);
        c.start_unit(1);
        c.tick();
        c.tick();
        assert_eq!(c.phase(), SessionPhase::Logging);
        save_controller(&db, &c).unwrap();

        append_to_plan(&db, unit(9)).unwrap();

        let mut fresh = load_controller(&db, &Config::default());
        assert_eq!(fresh.phase(), SessionPhase::Logging);
        assert_eq!(fresh.state().current_index, 1);

        // The owed resolution still lands on the unit that expired.
        fresh.mark_logged(0.5, None);
        let plan = fresh.plan();
        assert_eq!(plan.len(), 3);
        assert!(plan[1].logged);
        assert_eq!(plan[1].phase, UnitPhase::Completed);
        assert!(!plan[0].logged);
        assert_eq!(plan[2].task_ref, 9);
        assert_eq!(plan[2].phase, UnitPhase::Pending);
    }

    #[test]
    fn append_to_an_empty_store_starts_a_fresh_plan() {
        let db = Database::open_memory().unwrap();
        let snapshot = append_to_plan(&db, unit(7)).unwrap();
        assert_eq!(snapshot.plan.len(), 1);
        assert_eq!(snapshot.phase, SessionPhase::Idle);
        let c = load_controller(&db, &Config::default());
        assert_eq!(c.plan().len(), 1);
    }
}
