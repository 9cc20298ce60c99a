//! This module provides helpers for working with environment
//! variables, together with a struct holding every runtime setting.

use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use anyhow::Context;

/// Wrapper around [std::env::var] which adds [anyhow] context around errors.
pub fn get_var(name: &str) -> anyhow::Result<String> {
	std::env::var(name).with_context(|| format!("Missing ${name} environment variable"))
}

/// Reads and parses an environment variable, if it is set at all.
pub fn get_optional_var<T>(name: &str) -> anyhow::Result<Option<T>>
where
	T: FromStr,
	T::Err: std::error::Error + Send + Sync + 'static,
{
	match std::env::var(name) {
		Ok(value) => {
			let parsed = value
				.trim()
				.parse()
				.with_context(|| format!("${name} has an invalid value `{value}`"))?;
			Ok(Some(parsed))
		}
		Err(std::env::VarError::NotPresent) => Ok(None),
		Err(e) => Err(e).with_context(|| format!("Could not read ${name}")),
	}
}

/// Reads an environment variable containing a directory path,
/// creating the directory if it doesn't exist.
pub fn get_env_dir_path(name: &str, default_to: Option<&str>) -> anyhow::Result<PathBuf> {
	let var = get_var(name);
	let var = match default_to {
		None => var?,
		Some(other) => var.or_else(|_| get_var(other))?,
	};

	let path = PathBuf::from_str(&var).with_context(|| format!("${name} is not a valid path"))?;

	if !path.exists() {
		std::fs::create_dir_all(&path).with_context(|| format!("Could not create ${name}"))?;
	}

	Ok(path)
}

pub const DEFAULT_LEADERBOARD_SIZE: usize = 10;

#[derive(Clone, Debug)]
pub struct BotConfig {
	/// Directory holding the database. Without one, the database only lives
	/// in memory.
	data_dir: Option<PathBuf>,

	/// How many entries the ranking command displays.
	pub leaderboard_size: usize,

	/// Period of the background job re-assigning rank roles in every guild.
	/// Roles are only updated on demand when this is not set.
	pub role_sync_interval: Option<Duration>,
}

impl BotConfig {
	/// Reads the whole configuration from the environment, creating the data
	/// directory in the process.
	pub fn from_env() -> anyhow::Result<Self> {
		let leaderboard_size = get_optional_var::<usize>("DPSBOARD_LEADERBOARD_SIZE")?
			.unwrap_or(DEFAULT_LEADERBOARD_SIZE);
		if leaderboard_size == 0 {
			anyhow::bail!("$DPSBOARD_LEADERBOARD_SIZE must be positive");
		}

		let role_sync_interval = get_optional_var::<u64>("DPSBOARD_ROLE_SYNC_MINUTES")?
			.filter(|minutes| *minutes > 0)
			.map(|minutes| Duration::from_secs(minutes * 60));

		Ok(Self {
			data_dir: Some(get_env_dir_path("DPSBOARD_DATA_DIR", Some("STATE_DIRECTORY"))?),
			leaderboard_size,
			role_sync_interval,
		})
	}

	/// Default settings around an existing data directory.
	pub fn with_data_dir(data_dir: PathBuf) -> Self {
		Self {
			data_dir: Some(data_dir),
			..Self::ephemeral()
		}
	}

	/// Default settings, keeping nothing once the process exits.
	pub fn ephemeral() -> Self {
		Self {
			data_dir: None,
			leaderboard_size: DEFAULT_LEADERBOARD_SIZE,
			role_sync_interval: None,
		}
	}

	pub fn data_dir(&self) -> Option<&Path> {
		self.data_dir.as_deref()
	}

	pub fn db_path(&self) -> Option<PathBuf> {
		self.data_dir.as_ref().map(|dir| dir.join("db.sqlite"))
	}
}
