use crate::error::DecodeError;
use arrow::{
    array::{
        Array, ArrayRef, BooleanArray, Date32Array, Float64Array, Int64Array, StringArray,
        TimestampMicrosecondArray,
    },
    compute::{cast, concat_batches},
    datatypes::{DataType as ArrowType, TimeUnit},
    record_batch::RecordBatch,
};
use model::{
    core::{data_type::DataType, value::Value},
    records::chunk::{Chunk, Column},
};
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use std::{fs::File, path::Path};
use tracing::debug;

/// Columnar source. The whole file is materialized on open and handed out
/// in slices of `chunk_size` rows.
pub struct ParquetChunks {
    batch: RecordBatch,
    columns: Vec<Column>,
    chunk_size: usize,
    offset: usize,
    emitted: bool,
}

impl ParquetChunks {
    pub fn open(path: &Path, chunk_size: usize) -> Result<Self, DecodeError> {
        let builder = ParquetRecordBatchReaderBuilder::try_new(File::open(path)?)?;
        let schema = builder.schema().clone();
        let batches = builder.build()?.collect::<Result<Vec<_>, _>>()?;
        let batch = concat_batches(&schema, &batches)?;

        let columns = schema
            .fields()
            .iter()
            .map(|field| Column::new(field.name().clone(), column_type(field.data_type())))
            .collect();

        debug!(rows = batch.num_rows(), path = %path.display(), "Read columnar source");
        Ok(Self {
            batch,
            columns,
            chunk_size,
            offset: 0,
            emitted: false,
        })
    }

    fn convert(&self, slice: &RecordBatch) -> Result<Chunk, DecodeError> {
        let values = slice
            .columns()
            .iter()
            .zip(&self.columns)
            .map(|(array, column)| column_values(array, column.data_type))
            .collect::<Result<Vec<_>, _>>()?;

        let rows = (0..slice.num_rows())
            .map(|row| values.iter().map(|col| col[row].clone()).collect())
            .collect();

        Chunk::new(self.columns.clone(), rows).map_err(|e| DecodeError::Malformed(e.to_string()))
    }
}

impl Iterator for ParquetChunks {
    type Item = Result<Chunk, DecodeError>;

    fn next(&mut self) -> Option<Self::Item> {
        let total = self.batch.num_rows();
        if total == 0 {
            if self.emitted {
                return None;
            }
            self.emitted = true;
            return Some(Ok(Chunk::empty(self.columns.clone())));
        }
        if self.offset >= total {
            return None;
        }

        let len = self.chunk_size.min(total - self.offset);
        let slice = self.batch.slice(self.offset, len);
        self.offset += len;
        self.emitted = true;
        Some(self.convert(&slice))
    }
}

fn column_type(data_type: &ArrowType) -> DataType {
    match data_type {
        ArrowType::Int8
        | ArrowType::Int16
        | ArrowType::Int32
        | ArrowType::Int64
        | ArrowType::UInt8
        | ArrowType::UInt16
        | ArrowType::UInt32
        | ArrowType::UInt64 => DataType::Long,
        ArrowType::Float16
        | ArrowType::Float32
        | ArrowType::Float64
        | ArrowType::Decimal128(..)
        | ArrowType::Decimal256(..) => DataType::Double,
        ArrowType::Boolean => DataType::Boolean,
        ArrowType::Date32 | ArrowType::Date64 => DataType::Date,
        ArrowType::Timestamp(..) => DataType::Timestamp,
        _ => DataType::String,
    }
}

fn downcast<T: 'static>(array: &ArrayRef) -> Result<&T, DecodeError> {
    array
        .as_any()
        .downcast_ref::<T>()
        .ok_or_else(|| DecodeError::Malformed(format!("unexpected array type {}", array.data_type())))
}

fn collect<A, F>(array: &A, mut f: F) -> Vec<Value>
where
    A: Array,
    F: FnMut(usize) -> Value,
{
    (0..array.len())
        .map(|i| if array.is_null(i) { Value::Null } else { f(i) })
        .collect()
}

fn column_values(array: &ArrayRef, data_type: DataType) -> Result<Vec<Value>, DecodeError> {
    let values = match data_type {
        DataType::Long => {
            let converted = cast(array.as_ref(), &ArrowType::Int64)?;
            let typed = downcast::<Int64Array>(&converted)?;
            collect(typed, |i| Value::Int(typed.value(i)))
        }
        DataType::Double => {
            let converted = cast(array.as_ref(), &ArrowType::Float64)?;
            let typed = downcast::<Float64Array>(&converted)?;
            collect(typed, |i| Value::Float(typed.value(i)))
        }
        DataType::Boolean => {
            let typed = downcast::<BooleanArray>(array)?;
            collect(typed, |i| Value::Boolean(typed.value(i)))
        }
        DataType::Date => {
            let converted = cast(array.as_ref(), &ArrowType::Date32)?;
            let typed = downcast::<Date32Array>(&converted)?;
            collect(typed, |i| typed.value_as_date(i).map_or(Value::Null, Value::Date))
        }
        DataType::Timestamp => {
            let target = ArrowType::Timestamp(TimeUnit::Microsecond, None);
            let converted = cast(array.as_ref(), &target)?;
            let typed = downcast::<TimestampMicrosecondArray>(&converted)?;
            collect(typed, |i| typed.value_as_datetime(i).map_or(Value::Null, Value::Timestamp))
        }
        DataType::String => {
            let converted = cast(array.as_ref(), &ArrowType::Utf8)?;
            let typed = downcast::<StringArray>(&converted)?;
            collect(typed, |i| Value::String(typed.value(i).to_string()))
        }
    };
    Ok(values)
}
