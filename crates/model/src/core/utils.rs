/// Escape CSV per PostgreSQL COPY CSV rules:
/// - field is wrapped in double quotes
/// - internal `"` becomes `""`
/// - commas, newlines, tabs are safe because quoting protects them
pub fn escape_csv_string(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 2);
    out.push('"');

    for ch in s.chars() {
        if ch == '"' {
            out.push('"');
        }
        out.push(ch);
    }

    out.push('"');
    out
}

/// Quote an identifier for Postgres DDL, doubling embedded quotes.
pub fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

/// Last path segment of a URL or filesystem location, ignoring any query
/// string or fragment.
pub fn file_name_of(location: &str) -> &str {
    let end = location.find(['?', '#']).unwrap_or(location.len());
    let path = &location[..end];
    let path = path.trim_end_matches('/');
    path.rsplit('/').next().unwrap_or(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn escapes_quotes() {
        assert_eq!(escape_csv_string(r#"a"b"#), r#""a""b""#);
        assert_eq!(escape_csv_string("x,y"), "\"x,y\"");
    }

    #[test]
    fn quotes_identifiers() {
        assert_eq!(quote_ident("VendorID"), "\"VendorID\"");
        assert_eq!(quote_ident("we\"ird"), "\"we\"\"ird\"");
    }

    #[test]
    fn file_name_ignores_query() {
        assert_eq!(
            file_name_of("https://host/a/b/green_tripdata_2020-01.csv.gz?x=1#frag"),
            "green_tripdata_2020-01.csv.gz"
        );
        assert_eq!(file_name_of("file:///tmp/zones.csv"), "zones.csv");
        assert_eq!(file_name_of("plain.parquet"), "plain.parquet");
    }
}
