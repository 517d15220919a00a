pub mod decode;
pub mod error;
pub mod fetch;
pub mod scratch;
pub mod sink;
pub mod stage;
