//! Infrastructure adapters and runtime bootstrap.

pub mod error;
pub mod fallback;
pub mod remote;
pub mod telemetry;
