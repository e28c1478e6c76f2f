use clap::Subcommand;
use stint_core::{Config, Database, WorkUnit};

use super::{append_to_plan, load_controller, print_status, save_controller};

#[derive(Subcommand)]
pub enum PlanAction {
    /// Append a work unit to the plan
    Add {
        /// External task identifier (0 = unassigned)
        #[arg(long, default_value = "0")]
        task: u64,
        /// Task label
        #[arg(long, default_value = "")]
        label: String,
        /// Activity identifier
        #[arg(long, default_value = "0")]
        activity: u64,
        /// Activity label
        #[arg(long, default_value = "")]
        activity_label: String,
        /// Free-form comment
        #[arg(long)]
        comment: Option<String>,
    },
    /// Print the plan as JSON
    List,
    /// Remove the unit at an index
    Remove { index: usize },
    /// Move a unit to a new position
    Move { from: usize, to: usize },
    /// Discard the whole plan
    Clear,
}

pub fn run(action: PlanAction) -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::load()?;
    let db = Database::open()?;

    match action {
        // Appending edits the stored snapshot directly so a running
        // session's cursor and phase survive untouched.
        PlanAction::Add {
            task,
            label,
            activity,
            activity_label,
            comment,
        } => {
            let mut unit = WorkUnit::new(
                task,
                label,
                activity,
                activity_label,
                config.timer_settings().work_secs,
            );
            if let Some(comment) = comment {
                unit = unit.with_comment(comment);
            }
            let snapshot = append_to_plan(&db, unit)?;
            println!("{}", serde_json::to_string_pretty(&snapshot.plan)?);
        }
        PlanAction::List => {
            let controller = load_controller(&db, &config);
            println!("{}", serde_json::to_string_pretty(&controller.plan())?);
        }
        PlanAction::Remove { index } => {
            let mut controller = load_controller(&db, &config);
            controller.remove_unit(index);
            print_status(&controller)?;
            save_controller(&db, &controller)?;
        }
        PlanAction::Move { from, to } => {
            let mut controller = load_controller(&db, &config);
            controller.move_unit(from, to);
            print_status(&controller)?;
            save_controller(&db, &controller)?;
        }
        PlanAction::Clear => {
            let mut controller = load_controller(&db, &config);
            controller.clear_plan();
            print_status(&controller)?;
            save_controller(&db, &controller)?;
        }
    }

    Ok(())
}
