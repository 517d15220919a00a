pub mod error;
pub mod lifecycle;
pub mod metrics;
pub mod progress;
pub mod retry;
pub mod state;
