pub mod descriptor;
pub mod resolver;
pub mod template;

pub use descriptor::{SourceDescriptor, SourceFormat};
pub use resolver::{DatasetSource, SourceResolver};
