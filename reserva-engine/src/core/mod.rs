//! Engine Core
//!
//! Configuration, state wiring and background-task management.

pub mod config;
pub mod state;
pub mod tasks;

pub use config::EngineConfig;
pub use state::EngineState;
pub use tasks::{BackgroundTasks, TaskKind};
