use crate::error::CliError;
use std::{collections::HashMap, fs, path::Path};

/// Process environment merged with an optional `.env` file. Read once at
/// startup and handed to the config; file entries win.
#[derive(Debug, Clone)]
pub struct EnvManager {
    vars: HashMap<String, String>,
}

impl EnvManager {
    pub fn new() -> Self {
        Self {
            vars: std::env::vars().collect(),
        }
    }

    /// System environment plus `path`, or plus `./.env` when it exists.
    pub fn load(path: Option<&str>) -> Result<Self, CliError> {
        let mut env = Self::new();
        match path {
            Some(path) => env.load_from_file(path)?,
            None if Path::new(".env").is_file() => env.load_from_file(".env")?,
            None => {}
        }
        Ok(env)
    }

    pub fn load_from_file<P: AsRef<Path>>(&mut self, path: P) -> Result<(), CliError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|e| {
            CliError::Config(format!("Failed to read env file {}: {}", path.display(), e))
        })?;

        self.parse_env_content(&content)
    }

    pub fn all(&self) -> &HashMap<String, String> {
        &self.vars
    }

    fn parse_env_content(&mut self, content: &str) -> Result<(), CliError> {
        for (line_num, line) in content.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let line = line.strip_prefix("export ").unwrap_or(line);

            let Some((key, value)) = line.split_once('=') else {
                return Err(CliError::Config(format!(
                    "Invalid env file: malformed line {} (expected KEY=VALUE)",
                    line_num + 1
                )));
            };
            let key = key.trim();
            if key.is_empty() {
                return Err(CliError::Config(format!(
                    "Invalid env file: empty key at line {}",
                    line_num + 1
                )));
            }

            self.vars
                .insert(key.to_string(), Self::unquote_value(value));
        }

        Ok(())
    }

    fn unquote_value(value: &str) -> String {
        let value = value.trim();
        for quote in ['"', '\''] {
            if value.len() >= 2 && value.starts_with(quote) && value.ends_with(quote) {
                return value[1..value.len() - 1].to_string();
            }
        }
        value.to_string()
    }
}

impl Default for EnvManager {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn empty() -> EnvManager {
        EnvManager {
            vars: HashMap::new(),
        }
    }

    #[test]
    fn test_parse_basic_env() {
        let mut env = empty();
        let content = r#"
# Postgres
PGUSER=root
export PGHOST=localhost
        "#;

        env.parse_env_content(content).unwrap();
        assert_eq!(env.vars.get("PGUSER").unwrap(), "root");
        assert_eq!(env.vars.get("PGHOST").unwrap(), "localhost");
    }

    #[test]
    fn test_parse_quoted_values() {
        let mut env = empty();
        let content = r#"
PGPASSWORD="pass word"
S3_SECRET_KEY='abc=def'
PGPORT=5432
        "#;

        env.parse_env_content(content).unwrap();
        assert_eq!(env.vars.get("PGPASSWORD").unwrap(), "pass word");
        assert_eq!(env.vars.get("S3_SECRET_KEY").unwrap(), "abc=def");
        assert_eq!(env.vars.get("PGPORT").unwrap(), "5432");
    }

    #[test]
    fn test_invalid_env_format() {
        let mut env = empty();
        assert!(env.parse_env_content("INVALID LINE WITHOUT EQUALS").is_err());
        assert!(env.parse_env_content("=value").is_err());
    }

    #[test]
    fn test_file_overrides_system() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("local.env");
        std::fs::write(&path, "TRIPLOAD_TEST_ONLY_VAR=from-file\n").unwrap();

        let env = EnvManager::load(Some(path.to_str().unwrap())).unwrap();
        assert_eq!(env.all().get("TRIPLOAD_TEST_ONLY_VAR").unwrap(), "from-file");
    }
}
