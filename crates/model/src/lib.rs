pub mod core;
pub mod error;
pub mod partition;
pub mod records;
pub mod sink;
pub mod source;
