//! Background Tasks Module
//!
//! Contains background tasks that run periodically during server operation.
//!
//! # Tasks
//! - Expired-entry sweep: physically removes dead rows between writes

mod sweep;

pub use sweep::spawn_sweep_task;
