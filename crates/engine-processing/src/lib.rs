pub mod error;
pub mod loader;
pub mod pipeline;
pub mod retry;
pub mod transform;
