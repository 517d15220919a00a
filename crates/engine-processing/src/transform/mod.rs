pub mod normalize;
pub mod pipeline;
