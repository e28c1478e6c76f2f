mod clock;
mod controller;

pub use clock::ActiveClock;
pub use controller::{TimerController, TimerSettings};
