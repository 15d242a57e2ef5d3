//! # haven-worker
//!
//! Scheduled background maintenance for Haven: sweeping lapsed
//! invitations into their terminal state and purging refresh and reset
//! tokens that can never authenticate again.

pub mod jobs;
pub mod scheduler;

pub use jobs::CleanupJob;
pub use scheduler::CronScheduler;
