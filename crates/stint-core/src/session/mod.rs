mod snapshot;
mod state;
mod unit;

pub use snapshot::SessionSnapshot;
pub use state::{SessionPhase, SessionState};
pub use unit::{UnitPhase, WorkUnit};
