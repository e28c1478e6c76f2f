//! The single countdown clock resource.
//!
//! The work countdown and the break countdown are mutually exclusive states
//! of one underlying 1 Hz clock. The controller owns this handle explicitly;
//! there is no ambient timer, and start/stop are idempotent so transitions
//! can call them unconditionally.

/// Which countdown, if any, the next tick should advance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ActiveClock {
    #[default]
    Stopped,
    Work,
    Break,
}

impl ActiveClock {
    /// Switch to the work countdown, stopping the break countdown if it was
    /// running.
    pub fn start_work(&mut self) {
        *self = ActiveClock::Work;
    }

    /// Switch to the break countdown, stopping the work countdown if it was
    /// running.
    pub fn start_break(&mut self) {
        *self = ActiveClock::Break;
    }

    pub fn stop(&mut self) {
        *self = ActiveClock::Stopped;
    }

    pub fn is_running(self) -> bool {
        self != ActiveClock::Stopped
    }
}
