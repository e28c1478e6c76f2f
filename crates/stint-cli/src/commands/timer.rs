use std::time::Duration;

use clap::Subcommand;
use stint_core::{Config, Database, SessionPhase, TimerController};

use super::{load_controller, print_status, save_controller};

#[derive(Subcommand)]
pub enum TimerAction {
    /// Start the cursor unit from idle
    Start,
    /// Pause the working unit
    Pause,
    /// Resume the paused unit
    Resume,
    /// Pause everything and drop to idle, keeping the plan
    Stop,
    /// Phase-dependent start/pause/resume/next
    Toggle,
    /// Jump to a unit without going through idle
    StartUnit { index: usize },
    /// Reset a unit's countdown to the full work duration
    ResetUnit { index: usize },
    /// Leave the break and start the next unit
    Next,
    /// Cut the break short
    SkipBreak,
    /// Resolve the expired unit: record hours, then advance to break
    Log {
        hours: f64,
        #[arg(long)]
        comment: Option<String>,
    },
    /// Resolve the expired unit without logging
    SkipLog,
    /// Resolve the expired unit by carrying minutes to the next unit
    Defer { minutes: u32 },
    /// Log a unit before its timer expires
    LogUnit { index: usize, hours: f64 },
    /// Log partial hours against the working unit and restart its countdown
    LogPartial { index: usize, hours: f64 },
    /// Print the session state as JSON
    Status,
    /// Drive the countdown at 1 Hz until it needs attention
    Watch,
}

pub fn run(action: TimerAction) -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::load()?;
    let db = Database::open()?;
    let mut controller = load_controller(&db, &config);

    match action {
        TimerAction::Start => controller.start(),
        TimerAction::Pause => controller.pause(),
        TimerAction::Resume => controller.resume(),
        TimerAction::Stop => controller.stop(),
        TimerAction::Toggle => controller.toggle(),
        TimerAction::StartUnit { index } => controller.start_unit(index),
        TimerAction::ResetUnit { index } => controller.reset_unit(index),
        TimerAction::Next => controller.start_next_unit(),
        TimerAction::SkipBreak => controller.skip_break(),
        TimerAction::Log { hours, comment } => log_current(&db, &mut controller, hours, comment)?,
        TimerAction::SkipLog => controller.skip_logging(),
        TimerAction::Defer { minutes } => controller.defer_to_next(minutes),
        TimerAction::LogUnit { index, hours } => log_unit(&db, &mut controller, index, hours)?,
        TimerAction::LogPartial { index, hours } => {
            log_partial(&db, &mut controller, index, hours)?
        }
        TimerAction::Status => {}
        TimerAction::Watch => {
            watch(&db, &mut controller)?;
            return Ok(());
        }
    }

    print_status(&controller)?;
    save_controller(&db, &controller)?;
    Ok(())
}

/// Resolve the logging phase: the worklog write happens first, and the
/// controller only advances once the record exists. On a failed write the
/// session stays in logging and the command can simply be retried.
fn log_current(
    db: &Database,
    controller: &mut TimerController,
    hours: f64,
    comment: Option<String>,
) -> Result<(), Box<dyn std::error::Error>> {
    if controller.phase() != SessionPhase::Logging {
        return Ok(());
    }
    let Some(unit) = controller.current_unit() else {
        return Ok(());
    };
    let comment = comment.or(unit.comment);
    let log_ref = db.record_log(unit.task_ref, unit.activity_ref, hours, comment.as_deref())?;
    controller.mark_logged(hours, Some(log_ref));
    Ok(())
}

fn log_unit(
    db: &Database,
    controller: &mut TimerController,
    index: usize,
    hours: f64,
) -> Result<(), Box<dyn std::error::Error>> {
    let Some(unit) = controller.plan().into_iter().nth(index) else {
        return Ok(());
    };
    if unit.is_completed() {
        return Ok(());
    }
    let log_ref = db.record_log(
        unit.task_ref,
        unit.activity_ref,
        hours,
        unit.comment.as_deref(),
    )?;
    controller.mark_unit_logged(index, hours, Some(log_ref));
    Ok(())
}

fn log_partial(
    db: &Database,
    controller: &mut TimerController,
    index: usize,
    hours: f64,
) -> Result<(), Box<dyn std::error::Error>> {
    match controller.working_unit() {
        Some(unit) if controller.state().working_unit_index() == Some(index) => {
            db.record_log(unit.task_ref, unit.activity_ref, hours, unit.comment.as_deref())?;
            controller.log_and_continue(index, hours);
            Ok(())
        }
        _ => Ok(()),
    }
}

/// A restored session never resumes on its own: the countdown came back
/// idle with the interrupted unit parked as paused. Watch is the host that
/// decides to continue the day. Prefers the paused unit, falls back to the
/// first unit at or after the cursor that can still run. Returns true when
/// a unit is counting down again.
fn resume_restored(controller: &mut TimerController) -> bool {
    if controller.phase() != SessionPhase::Idle {
        return false;
    }
    let state = controller.state();
    let index = state.paused_unit_index().or_else(|| {
        state
            .plan
            .iter()
            .enumerate()
            .skip(state.current_index)
            .find(|(_, u)| !u.is_completed())
            .map(|(i, _)| i)
    });
    match index {
        Some(index) => {
            controller.start_unit(index);
            controller.phase() == SessionPhase::Working
        }
        None => false,
    }
}

/// Drive `tick()` at 1 Hz, persisting after every change, until the session
/// stops counting down (expiry, exhausted plan, or nothing running).
fn watch(db: &Database, controller: &mut TimerController) -> Result<(), Box<dyn std::error::Error>> {
    controller.on_timer_complete(|unit| {
        eprintln!(
            "unit complete: task {} ({}) -- log, skip-log, or defer",
            unit.task_ref, unit.task_label
        );
    });

    if resume_restored(controller) {
        save_controller(db, controller)?;
    }

    if !matches!(
        controller.phase(),
        SessionPhase::Working | SessionPhase::Break
    ) {
        print_status(controller)?;
        return Ok(());
    }

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_time()
        .build()?;
    runtime.block_on(async {
        let mut interval = tokio::time::interval(Duration::from_secs(1));
        interval.tick().await; // first tick resolves immediately
        loop {
            interval.tick().await;
            controller.tick();
            save_controller(db, controller)?;
            eprintln!(
                "{:?}: {}s left",
                controller.phase(),
                controller.seconds_left()
            );
            if !matches!(
                controller.phase(),
                SessionPhase::Working | SessionPhase::Break
            ) {
                break;
            }
        }
        Ok::<(), Box<dyn std::error::Error>>(())
    })?;

    print_status(controller)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use stint_core::{SessionSnapshot, TimerSettings, WorkUnit};

    fn unit(task_ref: u64, secs: u32) -> WorkUnit {
        WorkUnit::new(task_ref, format!("task {task_ref}"), 9, "Development", secs)
    }

    #[test]
    fn watch_resumes_a_round_tripped_working_session() {
        let mut c = TimerController::new(TimerSettings::default());
        c.set_plan(vec![unit(1, 1500), unit(2, 1500)]);
        c.start();
        let snapshot = SessionSnapshot::capture(&c.state());

        let mut fresh = TimerController::new(TimerSettings::default());
        fresh.restore_state(&snapshot);
        assert_eq!(fresh.phase(), SessionPhase::Idle);

        assert!(resume_restored(&mut fresh));
        assert_eq!(fresh.phase(), SessionPhase::Working);
        assert_eq!(fresh.working_unit().unwrap().seconds_left, 1500);
        fresh.tick();
        assert_eq!(fresh.working_unit().unwrap().seconds_left, 1499);
    }

    #[test]
    fn watch_picks_the_next_pending_unit_when_nothing_is_paused() {
        let mut c = TimerController::new(TimerSettings::default());
        c.set_plan(vec![unit(1, 1500), unit(2, 1500)]);
        c.mark_unit_logged(0, 0.5, None);
        assert!(resume_restored(&mut c));
        assert_eq!(c.state().working_unit_index(), Some(1));
    }

    #[test]
    fn watch_leaves_a_finished_day_alone() {
        let mut c = TimerController::new(TimerSettings::default());
        c.set_plan(vec![unit(1, 1500)]);
        c.mark_unit_logged(0, 0.5, None);
        assert!(!resume_restored(&mut c));
        assert_eq!(c.phase(), SessionPhase::Idle);
    }
}
