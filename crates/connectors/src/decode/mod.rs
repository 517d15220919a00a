pub mod csv;
pub mod parquet;

use crate::error::DecodeError;
use model::{records::chunk::Chunk, source::SourceFormat};
use std::path::Path;

pub const DEFAULT_CHUNK_SIZE: usize = 100_000;

/// A finite, single-pass sequence of chunks read from one scratch file.
pub type ChunkStream = Box<dyn Iterator<Item = Result<Chunk, DecodeError>> + Send>;

/// Open `path` as `format`. Row formats stream; the columnar format reads
/// the whole file up front and then slices it.
pub fn decode(path: &Path, format: SourceFormat, chunk_size: usize) -> Result<ChunkStream, DecodeError> {
    let chunk_size = chunk_size.max(1);
    match format {
        SourceFormat::CsvGzip => Ok(Box::new(csv::CsvChunks::gzip(path, chunk_size)?)),
        SourceFormat::Csv => Ok(Box::new(csv::CsvChunks::plain(path, chunk_size)?)),
        SourceFormat::Parquet => Ok(Box::new(parquet::ParquetChunks::open(path, chunk_size)?)),
    }
}
