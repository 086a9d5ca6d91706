//! Secret references in configuration values.
//!
//! `access_token` in `config.toml` may point at the token instead of holding it:
//!
//! - `pass::path/in/store` runs `pass show path/in/store` and takes the first line
//! - `env::VAR_NAME` reads `$VAR_NAME`
//! - `file::/path/to/token` reads the first line of a file
//! - anything else is the value itself

use std::path::PathBuf;

/// A parsed configuration value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SecretRef {
    Pass(String),
    Env(String),
    File(PathBuf),
    Plain(String),
}

impl SecretRef {
    pub fn parse(value: &str) -> Self {
        if let Some(path) = value.strip_prefix("pass::") {
            Self::Pass(path.to_string())
        } else if let Some(var) = value.strip_prefix("env::") {
            Self::Env(var.to_string())
        } else if let Some(path) = value.strip_prefix("file::") {
            Self::File(PathBuf::from(path))
        } else {
            Self::Plain(value.to_string())
        }
    }

    /// Returns true if the value is stored outside the config file.
    pub fn is_reference(&self) -> bool {
        !matches!(self, Self::Plain(_))
    }

    /// Fetches the referenced value. Surrounding whitespace is trimmed.
    pub fn resolve(&self) -> Result<String, String> {
        let value = match self {
            Self::Pass(path) => resolve_pass(path)?,
            Self::Env(var) => std::env::var(var)
                .map_err(|_| format!("environment variable `{}` is not set", var))?,
            Self::File(path) => {
                let content = std::fs::read_to_string(path)
                    .map_err(|e| format!("failed to read {}: {}", path.display(), e))?;
                first_line(&content)
                    .ok_or_else(|| format!("{} is empty", path.display()))?
            }
            Self::Plain(value) => value.clone(),
        };
        Ok(value.trim().to_string())
    }
}

/// Resolves a value that may contain a secret reference prefix.
pub fn resolve(value: &str) -> Result<String, String> {
    SecretRef::parse(value).resolve()
}

fn resolve_pass(path: &str) -> Result<String, String> {
    let output = std::process::Command::new("pass")
        .arg("show")
        .arg(path)
        .output()
        .map_err(|e| format!("failed to run `pass show {}`: {}", path, e))?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(format!(
            "`pass show {}` failed ({}): {}",
            path,
            output.status,
            stderr.trim()
        ));
    }

    first_line(&String::from_utf8_lossy(&output.stdout))
        .ok_or_else(|| format!("`pass show {}` produced no output", path))
}

fn first_line(content: &str) -> Option<String> {
    content
        .lines()
        .map(str::trim)
        .find(|line| !line.is_empty())
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn parse_prefixes() {
        assert_eq!(SecretRef::parse("pass::google/token"), SecretRef::Pass("google/token".into()));
        assert_eq!(SecretRef::parse("env::TOKEN"), SecretRef::Env("TOKEN".into()));
        assert_eq!(
            SecretRef::parse("file::/run/token"),
            SecretRef::File(PathBuf::from("/run/token"))
        );
        assert_eq!(SecretRef::parse("ya29.abc"), SecretRef::Plain("ya29.abc".into()));
        assert!(!SecretRef::parse("ya29.abc").is_reference());
        assert!(SecretRef::parse("env::X").is_reference());
    }

    #[test]
    fn plain_text_passthrough() {
        assert_eq!(resolve("ya29.token").unwrap(), "ya29.token");
        assert_eq!(resolve("").unwrap(), "");
    }

    #[test]
    fn env_prefix_resolves() {
        unsafe {
            std::env::set_var("_SLOTBOOK_TEST_TOKEN", "  token-from-env\n");
        }
        assert_eq!(resolve("env::_SLOTBOOK_TEST_TOKEN").unwrap(), "token-from-env");
        unsafe {
            std::env::remove_var("_SLOTBOOK_TEST_TOKEN");
        }
    }

    #[test]
    fn env_prefix_missing_var_errors() {
        let err = resolve("env::_SLOTBOOK_NONEXISTENT_VAR_12345").unwrap_err();
        assert!(err.contains("not set"));
    }

    #[test]
    fn file_prefix_reads_first_line() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "\nya29.from-file\nsecond line").unwrap();

        let value = format!("file::{}", file.path().display());
        assert_eq!(resolve(&value).unwrap(), "ya29.from-file");
    }

    #[test]
    fn file_prefix_empty_file_errors() {
        let file = tempfile::NamedTempFile::new().unwrap();
        let value = format!("file::{}", file.path().display());
        assert!(resolve(&value).unwrap_err().contains("empty"));
    }

    #[test]
    fn pass_prefix_unknown_entry_errors() {
        // Fails whether or not `pass` is installed.
        assert!(resolve("pass::slotbook/nonexistent/entry/12345").is_err());
    }
}
