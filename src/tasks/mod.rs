//! Background Tasks Module
//!
//! Contains background tasks that run periodically during server operation.
//!
//! # Tasks
//! - Expiry sweep: Purges expired entries from the served collections

mod sweep;

pub use sweep::spawn_sweep_task;
