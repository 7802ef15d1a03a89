use std::{fs, path::Path};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{Result, database::DatabaseConfig};

#[derive(Debug, PartialEq, Eq, Clone, Hash, Deserialize, Serialize)]
pub struct BackendConfig {
	pub database: DatabaseConfig,
}

impl BackendConfig {
	pub fn from_toml(content: &str) -> Result<Self> {
		Ok(toml::from_str(content).map_err(ConfigError::from)?)
	}

	/// Loads the configuration from a TOML file.
	pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
		let content = fs::read_to_string(path).map_err(ConfigError::from)?;
		Self::from_toml(&content)
	}
}

#[derive(Debug, Error)]
pub enum ConfigError {
	#[error("failed to read configuration: {0}")]
	Io(#[from] std::io::Error),
	#[error("invalid configuration: {0}")]
	Toml(#[from] toml::de::Error),
}

#[cfg(test)]
mod test {
	use super::*;
	use crate::BackendError;

	#[test]
	fn test_parse() {
		let config = BackendConfig::from_toml(
			r#"
			[database]
			url = "sqlite://:memory:"
			max-connections = 1
			"#,
		)
		.unwrap();
		assert_eq!(config.database.url, "sqlite://:memory:");
		assert_eq!(config.database.max_connections, 1);
	}

	#[test]
	fn test_default_max_connections() {
		let config = BackendConfig::from_toml(
			r#"
			[database]
			url = "postgres://popcorn@localhost/popcorn"
			"#,
		)
		.unwrap();
		assert_eq!(config.database.max_connections, 3);
	}

	#[test]
	fn test_missing_database() {
		assert!(matches!(
			BackendConfig::from_toml(""),
			Err(BackendError::ConfigError(ConfigError::Toml(_)))
		));
	}

	#[test]
	fn test_missing_file() {
		assert!(matches!(
			BackendConfig::load("/nonexistent/popcorn.toml"),
			Err(BackendError::ConfigError(ConfigError::Io(_)))
		));
	}
}
