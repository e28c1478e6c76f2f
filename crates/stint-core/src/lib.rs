//! # Stint Core Library
//!
//! Core business logic for Stint, a work-unit day planner: the user plans a
//! day as an ordered list of fixed-length work units, each bound to an
//! external task reference, runs a countdown per unit, and reconciles the
//! elapsed time into logged hours.
//!
//! ## Architecture
//!
//! - **Timer Controller**: the state machine driving per-unit countdowns and
//!   the session phases (idle, working, paused, logging, break). It has no
//!   internal thread -- the host calls `tick()` at 1 Hz.
//! - **Session model**: pure data for work units, the session aggregate, and
//!   the defensively decoded recovery snapshot.
//! - **Storage**: SQLite snapshot/worklog persistence and TOML configuration.
//!
//! ## Key Components
//!
//! - [`TimerController`]: command surface and event streams
//! - [`SessionState`] / [`WorkUnit`]: the session aggregate
//! - [`SessionSnapshot`]: crash/restart recovery codec
//! - [`Database`] / [`Config`]: persistence and configuration

pub mod error;
pub mod events;
pub mod session;
pub mod storage;
pub mod timer;

pub use error::{ConfigError, CoreError, StorageError};
pub use events::{Observers, SubscriptionId};
pub use session::{SessionPhase, SessionSnapshot, SessionState, UnitPhase, WorkUnit};
pub use storage::{Config, Database, LogEntry, LogSummary};
pub use timer::{ActiveClock, TimerController, TimerSettings};
