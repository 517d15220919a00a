use model::records::chunk::Chunk;
use std::sync::Arc;

/// An in-place rewrite of a chunk. Returns how many values it turned into
/// nulls; transforms never fail.
pub trait ChunkTransform: Send + Sync {
    fn name(&self) -> &'static str;

    fn apply(&self, chunk: &mut Chunk) -> usize;
}

pub trait TransformPipelineExt {
    fn add_if<T, F>(self, condition: bool, factory: F) -> Self
    where
        T: ChunkTransform + 'static,
        F: FnOnce() -> T;
}

#[derive(Clone)]
pub struct TransformPipeline {
    transforms: Vec<Arc<dyn ChunkTransform>>,
}

impl TransformPipeline {
    pub fn new() -> Self {
        Self {
            transforms: Vec::new(),
        }
    }

    pub fn apply(&self, chunk: &mut Chunk) -> usize {
        self.transforms
            .iter()
            .map(|transform| transform.apply(chunk))
            .sum()
    }

    pub fn add_transform<T: ChunkTransform + 'static>(mut self, transform: T) -> Self {
        self.transforms.push(Arc::new(transform));
        self
    }

    pub fn names(&self) -> Vec<&'static str> {
        self.transforms.iter().map(|t| t.name()).collect()
    }
}

impl TransformPipelineExt for TransformPipeline {
    fn add_if<T, F>(mut self, condition: bool, factory: F) -> Self
    where
        T: ChunkTransform + 'static,
        F: FnOnce() -> T,
    {
        if condition {
            self = self.add_transform(factory());
        }
        self
    }
}

impl Default for TransformPipeline {
    fn default() -> Self {
        Self::new()
    }
}
