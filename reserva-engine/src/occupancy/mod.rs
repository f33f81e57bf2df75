//! Occupancy Core
//!
//! The table lifecycle state machine, the unified release-deadline policy
//! and the periodic auto-release sweeper.

pub mod machine;
pub mod policy;
pub mod sweeper;

pub use machine::{OccupancyService, SweepStats};
pub use policy::ReleasePolicy;
pub use sweeper::AutoReleaseSweeper;
