//! Layered settings for the command-line tool
//!
//! Values are merged from several sources in priority order
//! (environment variables > settings file > defaults). Command-line flags are
//! applied on top by the caller.

use std::fs;
use std::path::{Path, PathBuf};

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;
use wiregraph::graph::{DEFAULT_MAX_RESOLUTION_DEPTH, GeneratorOptions};

/// Settings file looked up in the working directory when none is given.
pub const DEFAULT_SETTINGS_FILE: &str = "wiregraph.toml";

/// Prefix of environment variables that override settings.
pub const ENV_PREFIX: &str = "WIREGRAPH_";

/// Error type for settings sources
#[non_exhaustive]
#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
	/// The settings file exists but could not be read.
	#[error("IO error: {0}")]
	Io(#[from] std::io::Error),

	/// The settings file is not valid TOML.
	#[error("TOML error: {0}")]
	Toml(#[from] toml::de::Error),

	/// Merged values do not form valid settings.
	#[error("Invalid settings: {0}")]
	Json(#[from] serde_json::Error),

	/// An environment variable holds a value of the wrong shape.
	#[error("Invalid value `{value}` for `{key}`: {reason}")]
	InvalidValue {
		key: String,
		value: String,
		reason: String,
	},
}

/// Trait for settings sources
pub trait SettingsSource {
	/// Load the values this source provides
	fn load(&self) -> Result<IndexMap<String, Value>, SettingsError>;

	/// Get the priority of this source (higher = more important)
	fn priority(&self) -> u8;

	/// Get a description of this source
	fn description(&self) -> String;
}

/// Settings of one `wiregraph` run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
	/// Generated source file; standard output when unset.
	pub output: Option<PathBuf>,
	/// Graphviz rendering of the dependency graph.
	pub dot_output: Option<PathBuf>,
	/// Imports added to every generated file.
	pub additional_imports: Vec<String>,
	pub max_resolution_depth: usize,
	/// Generate independent roots concurrently.
	pub parallel: bool,
}

impl Default for Settings {
	fn default() -> Self {
		Self {
			output: None,
			dot_output: None,
			additional_imports: Vec::new(),
			max_resolution_depth: DEFAULT_MAX_RESOLUTION_DEPTH,
			parallel: true,
		}
	}
}

impl Settings {
	/// Merges `sources` in ascending priority; later keys win.
	pub fn from_sources(sources: &[&dyn SettingsSource]) -> Result<Self, SettingsError> {
		let mut ordered: Vec<&dyn SettingsSource> = sources.to_vec();
		ordered.sort_by_key(|source| source.priority());

		let mut merged = serde_json::Map::new();
		for source in ordered {
			let values = source.load()?;
			debug!(source = %source.description(), keys = values.len(), "loaded settings source");
			merged.extend(values);
		}
		Ok(serde_json::from_value(Value::Object(merged))?)
	}

	/// Loads the settings file (if present) and `WIREGRAPH_*` variables
	/// from `vars`.
	pub fn load(
		path: &Path,
		vars: impl IntoIterator<Item = (String, String)>,
	) -> Result<Self, SettingsError> {
		let file = TomlFileSource::new(path);
		let env = EnvSource::new(vars);
		Self::from_sources(&[&file, &env])
	}

	/// The options the graph core honors.
	pub fn generator_options(&self) -> GeneratorOptions {
		GeneratorOptions {
			max_resolution_depth: self.max_resolution_depth,
			parallel: self.parallel,
		}
	}
}

/// TOML settings file source; a missing file provides nothing.
pub struct TomlFileSource {
	path: PathBuf,
}

impl TomlFileSource {
	pub fn new(path: impl Into<PathBuf>) -> Self {
		Self { path: path.into() }
	}
}

impl SettingsSource for TomlFileSource {
	fn load(&self) -> Result<IndexMap<String, Value>, SettingsError> {
		if !self.path.exists() {
			return Ok(IndexMap::new());
		}

		let content = fs::read_to_string(&self.path)?;
		let table: toml::Table = toml::from_str(&content)?;
		let mut values = IndexMap::with_capacity(table.len());
		for (key, value) in table {
			values.insert(key, serde_json::to_value(value)?);
		}
		Ok(values)
	}

	fn priority(&self) -> u8 {
		50
	}

	fn description(&self) -> String {
		format!("TOML file: {}", self.path.display())
	}
}

/// Environment variable source over an explicit variable list, so callers
/// pass `std::env::vars()` and tests pass fixed pairs.
pub struct EnvSource {
	vars: Vec<(String, String)>,
}

impl EnvSource {
	pub fn new(vars: impl IntoIterator<Item = (String, String)>) -> Self {
		Self {
			vars: vars.into_iter().collect(),
		}
	}
}

impl SettingsSource for EnvSource {
	fn load(&self) -> Result<IndexMap<String, Value>, SettingsError> {
		let mut values = IndexMap::new();
		for (key, value) in &self.vars {
			let Some(name) = key.strip_prefix(ENV_PREFIX) else {
				continue;
			};
			let name = name.to_lowercase();
			let parsed = match name.as_str() {
				"output" | "dot_output" => Value::String(value.clone()),
				"additional_imports" => Value::Array(
					value
						.split(',')
						.map(str::trim)
						.filter(|import| !import.is_empty())
						.map(|import| Value::String(import.to_string()))
						.collect(),
				),
				"max_resolution_depth" => {
					let depth = value.trim().parse::<u64>().map_err(|error| {
						SettingsError::InvalidValue {
							key: key.clone(),
							value: value.clone(),
							reason: error.to_string(),
						}
					})?;
					Value::Number(depth.into())
				}
				"parallel" => Value::Bool(parse_bool(key, value)?),
				_ => continue,
			};
			values.insert(name, parsed);
		}
		Ok(values)
	}

	fn priority(&self) -> u8 {
		100 // Highest priority
	}

	fn description(&self) -> String {
		format!("Environment variables (prefix: {ENV_PREFIX})")
	}
}

fn parse_bool(key: &str, value: &str) -> Result<bool, SettingsError> {
	match value.trim().to_lowercase().as_str() {
		"true" | "1" | "yes" | "on" => Ok(true),
		"false" | "0" | "no" | "off" => Ok(false),
		_ => Err(SettingsError::InvalidValue {
			key: key.to_string(),
			value: value.to_string(),
			reason: "expected a boolean".to_string(),
		}),
	}
}
