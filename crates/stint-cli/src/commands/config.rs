use clap::Subcommand;
use stint_core::Config;

#[derive(Subcommand)]
pub enum ConfigAction {
    /// Print the configuration as TOML
    Show,
    /// Update duration and advance settings
    Set {
        #[arg(long)]
        work_minutes: Option<u32>,
        #[arg(long)]
        break_minutes: Option<u32>,
        #[arg(long)]
        auto_advance: Option<bool>,
    },
}

pub fn run(action: ConfigAction) -> Result<(), Box<dyn std::error::Error>> {
    let mut config = Config::load()?;
    match action {
        ConfigAction::Show => {
            print!("{}", toml::to_string_pretty(&config)?);
        }
        ConfigAction::Set {
            work_minutes,
            break_minutes,
            auto_advance,
        } => {
            if let Some(minutes) = work_minutes {
                config.timer.work_minutes = minutes;
            }
            if let Some(minutes) = break_minutes {
                config.timer.break_minutes = minutes;
            }
            if let Some(auto) = auto_advance {
                config.timer.auto_advance = auto;
            }
            config.save()?;
            print!("{}", toml::to_string_pretty(&config)?);
        }
    }
    Ok(())
}
