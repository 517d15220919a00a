use crate::transform::pipeline::{ChunkTransform, TransformPipeline, TransformPipelineExt};
use model::{
    core::{data_type::DataType, value::Value},
    records::chunk::Chunk,
};
use tracing::warn;

/// Reinterprets every column whose name contains `datetime` as a timestamp.
pub struct TimestampCoercion;

impl ChunkTransform for TimestampCoercion {
    fn name(&self) -> &'static str {
        "timestamp_coercion"
    }

    fn apply(&self, chunk: &mut Chunk) -> usize {
        let targets: Vec<usize> = chunk
            .columns()
            .iter()
            .enumerate()
            .filter(|(_, c)| c.name.contains("datetime"))
            .map(|(idx, _)| idx)
            .collect();

        targets
            .into_iter()
            .map(|idx| {
                chunk.map_column(idx, DataType::Timestamp, |value| {
                    value.as_timestamp().map_or(Value::Null, Value::Timestamp)
                })
            })
            .sum()
    }
}

/// Coerces named columns to 64-bit integers.
pub struct IntegerCoercion {
    columns: Vec<String>,
}

impl IntegerCoercion {
    pub fn new(columns: Vec<String>) -> Self {
        Self { columns }
    }
}

impl ChunkTransform for IntegerCoercion {
    fn name(&self) -> &'static str {
        "integer_coercion"
    }

    fn apply(&self, chunk: &mut Chunk) -> usize {
        let targets: Vec<usize> = self
            .columns
            .iter()
            .filter_map(|name| chunk.column_index(name))
            .collect();

        targets
            .into_iter()
            .map(|idx| chunk.map_column(idx, DataType::Long, to_integer))
            .sum()
    }
}

fn to_integer(value: &Value) -> Value {
    if let Some(v) = value.as_i64() {
        return Value::Int(v);
    }
    // "3.0" style text still denotes an integer.
    match value.as_f64() {
        Some(f) if f.is_finite() && f.fract() == 0.0 && f.abs() < i64::MAX as f64 => {
            Value::Int(f as i64)
        }
        _ => Value::Null,
    }
}

/// Per-column coercion rules applied to every chunk before it is written.
#[derive(Clone)]
pub struct SchemaNormalizer {
    pipeline: TransformPipeline,
}

impl SchemaNormalizer {
    pub fn new(numeric_columns: Vec<String>) -> Self {
        let pipeline = TransformPipeline::new()
            .add_transform(TimestampCoercion)
            .add_if(!numeric_columns.is_empty(), || {
                IntegerCoercion::new(numeric_columns)
            });
        Self { pipeline }
    }

    /// Normalize in place. Returns the number of values that could not be
    /// coerced and were replaced by null.
    pub fn normalize(&self, chunk: &mut Chunk) -> usize {
        let nulled = self.pipeline.apply(chunk);
        if nulled > 0 {
            warn!(nulled, rows = chunk.len(), "Coerced invalid values to null");
        }
        nulled
    }
}
