pub mod client;
pub mod config;
pub mod coordinator;
pub mod error;
pub mod logger;
pub mod models;
pub mod scheduler;

pub use client::{GenerationBackend, ImageClient};
pub use config::{Config, RetryPolicy, MAX_RETRIES};
pub use coordinator::RequestCoordinator;
pub use error::{GenerationError, Result};
pub use models::*;
pub use scheduler::{ScheduledTask, TaskScheduler};
