use crate::error::DecodeError;
use flate2::read::MultiGzDecoder;
use model::{
    core::{data_type::DataType, value::Value},
    records::chunk::{Chunk, Column},
};
use std::{
    fs::File,
    io::{BufReader, Read},
    path::Path,
};
use tracing::warn;

const READ_BUFFER_BYTES: usize = 1024 * 1024;

/// Rows with more cells than the header that a source may contain before
/// the whole decode is rejected.
pub const MAX_BAD_RECORDS: usize = 1000;

/// Delimited text split into chunks of at most `chunk_size` rows. Column
/// types are inferred per chunk from the cells it holds.
///
/// Short rows are padded with nulls. Rows wider than the header are
/// skipped and counted against [`MAX_BAD_RECORDS`].
pub struct CsvChunks {
    reader: csv::Reader<Box<dyn Read + Send>>,
    headers: Vec<String>,
    chunk_size: usize,
    bad_records: usize,
    emitted: bool,
    done: bool,
}

impl CsvChunks {
    pub fn gzip(path: &Path, chunk_size: usize) -> Result<Self, DecodeError> {
        let file = BufReader::with_capacity(READ_BUFFER_BYTES, File::open(path)?);
        Self::from_reader(Box::new(MultiGzDecoder::new(file)), chunk_size)
    }

    pub fn plain(path: &Path, chunk_size: usize) -> Result<Self, DecodeError> {
        let file = BufReader::with_capacity(READ_BUFFER_BYTES, File::open(path)?);
        Self::from_reader(Box::new(file), chunk_size)
    }

    pub fn from_reader(input: Box<dyn Read + Send>, chunk_size: usize) -> Result<Self, DecodeError> {
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .trim(csv::Trim::Headers)
            .from_reader(input);
        let headers: Vec<String> = reader.headers()?.iter().map(str::to_string).collect();
        if headers.is_empty() || headers.iter().all(String::is_empty) {
            return Err(DecodeError::MissingHeader);
        }
        Ok(Self {
            reader,
            headers,
            chunk_size,
            bad_records: 0,
            emitted: false,
            done: false,
        })
    }

    fn read_records(&mut self) -> Result<Vec<csv::StringRecord>, DecodeError> {
        let mut records = Vec::with_capacity(self.chunk_size.min(16_384));
        let mut record = csv::StringRecord::new();
        while records.len() < self.chunk_size {
            if !self.reader.read_record(&mut record)? {
                self.done = true;
                break;
            }
            if record.len() > self.headers.len() {
                self.skip_bad_record(&record)?;
                continue;
            }
            records.push(record.clone());
        }
        Ok(records)
    }

    fn skip_bad_record(&mut self, record: &csv::StringRecord) -> Result<(), DecodeError> {
        self.bad_records += 1;
        let line = record.position().map_or(0, |p| p.line());
        if self.bad_records > MAX_BAD_RECORDS {
            return Err(DecodeError::Malformed(format!(
                "more than {MAX_BAD_RECORDS} rows wider than the header (last at line {line})"
            )));
        }
        warn!(
            line,
            cells = record.len(),
            expected = self.headers.len(),
            "Skipping row wider than the header"
        );
        Ok(())
    }

    fn build_chunk(&self, records: &[csv::StringRecord]) -> Result<Chunk, DecodeError> {
        let columns: Vec<Column> = self
            .headers
            .iter()
            .enumerate()
            .map(|(idx, name)| {
                let data_type = DataType::infer(records.iter().map(|r| r.get(idx).unwrap_or("")));
                Column::new(name.clone(), data_type)
            })
            .collect();

        let rows = records
            .iter()
            .map(|record| {
                columns
                    .iter()
                    .enumerate()
                    .map(|(idx, col)| record.get(idx).map_or(Value::Null, |cell| col.data_type.parse_cell(cell)))
                    .collect()
            })
            .collect();

        Chunk::new(columns, rows).map_err(|e| DecodeError::Malformed(e.to_string()))
    }
}

impl Iterator for CsvChunks {
    type Item = Result<Chunk, DecodeError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }

        let records = match self.read_records() {
            Ok(records) => records,
            Err(err) => {
                self.done = true;
                return Some(Err(err));
            }
        };

        if records.is_empty() {
            if self.emitted {
                return None;
            }
            // Header-only source: still hand out the schema.
            self.emitted = true;
            let columns = self
                .headers
                .iter()
                .map(|name| Column::new(name.clone(), DataType::String))
                .collect();
            return Some(Ok(Chunk::empty(columns)));
        }

        self.emitted = true;
        Some(self.build_chunk(&records))
    }
}
