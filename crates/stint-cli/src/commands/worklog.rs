use clap::Subcommand;
use stint_core::Database;

#[derive(Subcommand)]
pub enum LogAction {
    /// Today's worklog entries as JSON, newest first
    List,
    /// Entry count and total hours for today
    Summary,
}

pub fn run(action: LogAction) -> Result<(), Box<dyn std::error::Error>> {
    let db = Database::open()?;
    match action {
        LogAction::List => {
            println!("{}", serde_json::to_string_pretty(&db.logs_today()?)?);
        }
        LogAction::Summary => {
            println!("{}", serde_json::to_string_pretty(&db.summary_today()?)?);
        }
    }
    Ok(())
}
