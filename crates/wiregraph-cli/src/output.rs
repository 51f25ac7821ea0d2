//! Writing generated files.

use std::fs;
use std::path::Path;

/// Writes `content` to `path` unless the file already holds exactly that
/// content, so unchanged output keeps its timestamp and does not trigger
/// downstream rebuilds.
///
/// The write goes through a temporary file in the same directory followed by
/// a rename.
///
/// # Returns
///
/// Whether the file was written.
pub fn write_if_changed(path: &Path, content: &str) -> std::io::Result<bool> {
	if fs::read_to_string(path).is_ok_and(|existing| existing == content) {
		return Ok(false);
	}

	if let Some(parent) = path.parent()
		&& !parent.as_os_str().is_empty()
	{
		fs::create_dir_all(parent)?;
	}

	let tmp_path = path.with_extension("tmp");
	fs::write(&tmp_path, content)?;
	if let Err(e) = fs::rename(&tmp_path, path) {
		let _ = fs::remove_file(&tmp_path);
		return Err(e);
	}
	Ok(true)
}
