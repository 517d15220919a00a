use crate::core::value::Value;
use serde::{Deserialize, Serialize};
use std::{borrow::Cow, fmt};

/// Column types a chunk may declare. The set is closed; anything the
/// decoders cannot map more precisely lands in `String` (TEXT).
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum DataType {
    Long,
    Double,
    Boolean,
    Date,
    Timestamp,
    String,
}

impl DataType {
    pub fn from_postgres_type(type_name: &str) -> Result<Self, String> {
        let normalized = Self::normalize_type_name(type_name);
        let data_type = match normalized.as_str() {
            "bigint" | "int8" | "integer" | "int" | "int4" | "smallint" | "int2" | "bigserial"
            | "serial" => DataType::Long,
            "double precision" | "float8" | "real" | "float4" | "numeric" | "decimal" => {
                DataType::Double
            }
            "boolean" | "bool" => DataType::Boolean,
            "date" => DataType::Date,
            "timestamp" | "timestamp without time zone" | "timestamptz"
            | "timestamp with time zone" => DataType::Timestamp,
            "text" | "varchar" | "character varying" | "char" | "character" | "bpchar"
            | "name" => DataType::String,
            _ => return Err(format!("Unknown Postgres column type: {type_name}")),
        };
        Ok(data_type)
    }

    pub fn postgres_name(&self) -> Cow<'static, str> {
        match self {
            DataType::Long => Cow::Borrowed("BIGINT"),
            DataType::Double => Cow::Borrowed("DOUBLE PRECISION"),
            DataType::Boolean => Cow::Borrowed("BOOLEAN"),
            DataType::Date => Cow::Borrowed("DATE"),
            DataType::Timestamp => Cow::Borrowed("TIMESTAMP"),
            DataType::String => Cow::Borrowed("TEXT"),
        }
    }

    /// Infer the narrowest type that every non-empty cell of a text column
    /// parses as. Columns with no non-empty cells are TEXT.
    pub fn infer<'a>(cells: impl IntoIterator<Item = &'a str>) -> DataType {
        let mut seen_any = false;
        let mut long = true;
        let mut double = true;
        let mut boolean = true;

        for cell in cells {
            if cell.is_empty() {
                continue;
            }
            seen_any = true;
            long = long && cell.parse::<i64>().is_ok();
            double = double && is_numeric(cell);
            boolean = boolean && parse_bool(cell).is_some();
            if !long && !double && !boolean {
                return DataType::String;
            }
        }

        match (seen_any, long, double, boolean) {
            (false, ..) => DataType::String,
            (true, true, _, _) => DataType::Long,
            (true, _, true, _) => DataType::Double,
            (true, _, _, true) => DataType::Boolean,
            _ => DataType::String,
        }
    }

    /// Parse one text cell as this type. Empty cells and cells that do not
    /// parse become `Value::Null`.
    pub fn parse_cell(&self, cell: &str) -> Value {
        if cell.is_empty() {
            return Value::Null;
        }
        match self {
            DataType::Long => cell.parse().map(Value::Int).unwrap_or(Value::Null),
            DataType::Double => {
                if is_numeric(cell) {
                    cell.parse().map(Value::Float).unwrap_or(Value::Null)
                } else {
                    Value::Null
                }
            }
            DataType::Boolean => parse_bool(cell).map(Value::Boolean).unwrap_or(Value::Null),
            DataType::Date => crate::core::value::parse_date(cell)
                .map(Value::Date)
                .unwrap_or(Value::Null),
            DataType::Timestamp => crate::core::value::parse_timestamp(cell)
                .map(Value::Timestamp)
                .unwrap_or(Value::Null),
            DataType::String => Value::String(cell.to_string()),
        }
    }

    fn normalize_type_name(type_name: &str) -> String {
        let lowered = type_name.trim().to_ascii_lowercase();
        match lowered.find('(') {
            Some(idx) => lowered[..idx].trim_end().to_string(),
            None => lowered,
        }
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.postgres_name())
    }
}

fn is_numeric(cell: &str) -> bool {
    cell.bytes().any(|b| b.is_ascii_digit()) && cell.parse::<f64>().is_ok()
}

fn parse_bool(cell: &str) -> Option<bool> {
    if cell.eq_ignore_ascii_case("true") {
        Some(true)
    } else if cell.eq_ignore_ascii_case("false") {
        Some(false)
    } else {
        None
    }
}
