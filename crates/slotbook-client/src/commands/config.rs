//! Configuration commands.

use crate::config::ClientConfig;
use crate::error::{ClientError, ClientResult};
use crate::secret::SecretRef;

/// Dump the current configuration to stdout.
///
/// Inline access tokens are masked.
pub fn dump(config: &ClientConfig) -> ClientResult<()> {
    #[allow(unused_mut)]
    let mut config = config.clone();
    #[cfg(feature = "google")]
    if let Some(ref mut google) = config.google {
        google.access_token = google.access_token.as_deref().map(mask);
    }

    let toml_str = toml::to_string_pretty(&config)
        .map_err(|e| ClientError::Config(format!("failed to serialize config: {}", e)))?;
    println!("# config.toml ({})", ClientConfig::default_path().display());
    println!("{}", toml_str);

    Ok(())
}

/// Validate the configuration.
pub fn validate(config: &ClientConfig) -> ClientResult<()> {
    config.validate().map_err(ClientError::Config)?;

    #[cfg(feature = "google")]
    match config.google {
        Some(ref google) => {
            google.to_provider_config().map_err(ClientError::Secret)?;
            println!("Google access token resolved.");
        }
        None => println!("No [google] section; scheduling commands will fail."),
    }

    println!("Configuration is valid.");
    Ok(())
}

/// Show the configuration file path.
pub fn path() -> ClientResult<()> {
    println!("config: {}", ClientConfig::default_path().display());
    Ok(())
}

fn mask(value: &str) -> String {
    if SecretRef::parse(value).is_reference() {
        value.to_string()
    } else {
        "********".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mask_keeps_references() {
        assert_eq!(mask("env::GOOGLE_TOKEN"), "env::GOOGLE_TOKEN");
        assert_eq!(mask("pass::google/token"), "pass::google/token");
        assert_eq!(mask("ya29.secret"), "********");
    }
}
