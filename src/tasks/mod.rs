//! Background Tasks Module
//!
//! Contains background tasks that run periodically during server operation.
//!
//! # Tasks
//! - Expiry sweep: drops expired cache entries that were never read again

mod cleanup;

pub use cleanup::spawn_cleanup_task;
