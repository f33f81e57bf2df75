//! Unified Result Types
//!
//! Provides type aliases for commonly used Result types across the engine

use crate::utils::EngineError;

/// Engine-level Result type
///
/// Used by the booking facade, scheduling core and occupancy services
pub type EngineResult<T> = Result<T, EngineError>;
