//! Manifest discovery and loading
//!
//! A manifest is the JSON form of one module's components:
//! `{ "imports": [...], "instantiables": [...] }`. Directories are searched
//! recursively for `*.json` files.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, bail};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::debug;
use walkdir::WalkDir;
use wiregraph::types::Instantiable;

/// Components and imports declared by one module.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Manifest {
	pub imports: Vec<String>,
	pub instantiables: Vec<Instantiable>,
}

impl Manifest {
	/// Reads and decodes one manifest file.
	pub fn load(path: &Path) -> anyhow::Result<Self> {
		let content = fs::read_to_string(path)
			.with_context(|| format!("Failed to read manifest {}", path.display()))?;
		let manifest: Self = serde_json::from_str(&content)
			.with_context(|| format!("Failed to parse manifest {}", path.display()))?;
		debug!(
			path = %path.display(),
			instantiables = manifest.instantiables.len(),
			"loaded manifest"
		);
		Ok(manifest)
	}

	/// Appends `other`'s imports and components after this manifest's.
	pub fn merge(&mut self, other: Manifest) {
		self.imports.extend(other.imports);
		self.instantiables.extend(other.instantiables);
	}
}

/// Collect manifest files from the given paths.
///
/// Files are taken as given; directories contribute every `*.json` file
/// below them. The result is sorted and free of duplicates.
///
/// # Errors
///
/// Returns an error if a path does not exist.
pub fn collect_manifest_paths(inputs: &[PathBuf]) -> anyhow::Result<Vec<PathBuf>> {
	let mut files = Vec::new();
	for input in inputs {
		if input.is_file() {
			files.push(input.clone());
		} else if input.is_dir() {
			for entry in WalkDir::new(input)
				.follow_links(true)
				.into_iter()
				.filter_map(|entry| entry.ok())
			{
				let entry_path = entry.path();
				if entry_path.is_file() && entry_path.extension().is_some_and(|ext| ext == "json") {
					files.push(entry_path.to_path_buf());
				}
			}
		} else {
			bail!("Path does not exist: {}", input.display());
		}
	}
	files.sort();
	files.dedup();
	Ok(files)
}

/// Loads every manifest under `inputs` and merges them in path order.
pub fn load_manifests(inputs: &[PathBuf], parallel: bool) -> anyhow::Result<Manifest> {
	let paths = collect_manifest_paths(inputs)?;
	let manifests: Vec<Manifest> = if parallel {
		paths
			.par_iter()
			.map(|path| Manifest::load(path))
			.collect::<anyhow::Result<_>>()?
	} else {
		paths
			.iter()
			.map(|path| Manifest::load(path))
			.collect::<anyhow::Result<_>>()?
	};

	let mut merged = Manifest::default();
	for manifest in manifests {
		merged.merge(manifest);
	}
	debug!(
		manifests = paths.len(),
		instantiables = merged.instantiables.len(),
		"merged manifests"
	);
	Ok(merged)
}

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::rstest;

	const STORE_MANIFEST: &str = r#"{
		"imports": ["Foundation"],
		"instantiables": [
			{ "concrete_type": { "simple": { "name": "Store" } } }
		]
	}"#;

	const ROOT_MANIFEST: &str = r#"{
		"imports": ["UIKit"],
		"instantiables": [
			{
				"concrete_type": { "simple": { "name": "AppRoot" } },
				"is_root": true,
				"dependencies": [
					{
						"property": { "label": "store", "type": { "simple": { "name": "Store" } } },
						"source": { "kind": "instantiated" }
					}
				]
			}
		]
	}"#;

	#[rstest]
	fn collects_json_files_sorted() {
		// Arrange
		let dir = tempfile::tempdir().unwrap();
		let nested = dir.path().join("nested");
		fs::create_dir(&nested).unwrap();
		fs::write(dir.path().join("b.json"), "{}").unwrap();
		fs::write(nested.join("a.json"), "{}").unwrap();
		fs::write(dir.path().join("notes.txt"), "").unwrap();

		// Act
		let files = collect_manifest_paths(&[dir.path().to_path_buf()]).unwrap();

		// Assert
		assert_eq!(files, vec![dir.path().join("b.json"), nested.join("a.json")]);
	}

	#[rstest]
	fn nonexistent_path_is_an_error() {
		// Act
		let result = collect_manifest_paths(&[PathBuf::from("/nonexistent/wiregraph/manifest")]);

		// Assert
		assert!(result.unwrap_err().to_string().contains("does not exist"));
	}

	#[rstest]
	#[case(true)]
	#[case(false)]
	fn manifests_merge_in_path_order(#[case] parallel: bool) {
		// Arrange
		let dir = tempfile::tempdir().unwrap();
		fs::write(dir.path().join("2-store.json"), STORE_MANIFEST).unwrap();
		fs::write(dir.path().join("1-root.json"), ROOT_MANIFEST).unwrap();

		// Act
		let manifest = load_manifests(&[dir.path().to_path_buf()], parallel).unwrap();

		// Assert
		assert_eq!(manifest.imports, vec!["UIKit".to_string(), "Foundation".to_string()]);
		let types: Vec<String> = manifest
			.instantiables
			.iter()
			.map(|instantiable| instantiable.concrete_type.to_string())
			.collect();
		assert_eq!(types, vec!["AppRoot", "Store"]);
		assert!(manifest.instantiables[0].is_root);
	}

	#[rstest]
	fn malformed_manifest_names_the_file() {
		// Arrange
		let dir = tempfile::tempdir().unwrap();
		let path = dir.path().join("broken.json");
		fs::write(&path, "{ \"instantiables\": 3 }").unwrap();

		// Act
		let error = load_manifests(&[path.clone()], false).unwrap_err();

		// Assert
		assert!(error.to_string().contains("broken.json"));
	}
}
