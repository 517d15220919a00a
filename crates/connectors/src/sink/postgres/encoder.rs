use model::core::{utils::escape_csv_string, value::Value};

/// Encodes values for `COPY ... FROM STDIN WITH (FORMAT csv, NULL '\N')`.
pub struct PgCopyEncoder;

impl PgCopyEncoder {
    /// Written unquoted. Text is always quoted, and COPY only matches
    /// unquoted fields against the NULL string, so a literal `\N` stays text.
    pub const NULL: &'static str = "\\N";

    pub fn encode_value(value: &Value) -> String {
        match value {
            Value::Null => Self::NULL.to_string(),
            Value::String(s) => escape_csv_string(s),
            Value::Boolean(v) => v.to_string(),
            Value::Int(v) => v.to_string(),
            Value::Float(v) => ryu::Buffer::new().format(*v).to_string(),
            Value::Date(d) => d.format("%Y-%m-%d").to_string(),
            Value::Timestamp(ts) => ts.format("%Y-%m-%d %H:%M:%S%.6f").to_string(),
        }
    }

    /// One CSV line, newline-terminated, appended to `out`.
    pub fn encode_row(row: &[Value], out: &mut String) {
        for (i, value) in row.iter().enumerate() {
            if i > 0 {
                out.push(',');
            }
            out.push_str(&Self::encode_value(value));
        }
        out.push('\n');
    }
}
