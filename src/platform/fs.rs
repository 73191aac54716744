// logfind - platform/fs.rs
//
// Filesystem helpers for log files: path resolution, opening, rollover.

use crate::util::constants;
use std::fs::{self, File, OpenOptions};
use std::io::{self, BufReader};
use std::path::{Path, PathBuf};

/// `<dir>/<name>.log`
pub fn log_file_path(dir: &Path, name: &str) -> PathBuf {
    dir.join(format!("{name}.{}", constants::LOG_FILE_EXTENSION))
}

/// `<path>.<index>`, the name of the index-th backup of `path`.
pub fn backup_path(path: &Path, index: u32) -> PathBuf {
    let mut name = path.as_os_str().to_os_string();
    name.push(format!(".{index}"));
    PathBuf::from(name)
}

/// Open a log for sequential reading. The handle closes when dropped.
pub fn open_for_read(path: &Path) -> io::Result<BufReader<File>> {
    File::open(path).map(BufReader::new)
}

/// Open (creating the parent directory and the file as needed) for
/// appending records.
pub fn open_for_append(path: &Path) -> io::Result<File> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    OpenOptions::new().create(true).append(true).open(path)
}

/// Shift an existing log out of the way before a fresh run.
///
/// With `backup_count` N > 0: `path.(N-1)` -> `path.N`, ..., `path` ->
/// `path.1`; the oldest backup is overwritten. With 0 the file is truncated.
/// Does nothing when `path` does not exist.
pub fn roll_over(path: &Path, backup_count: u32) -> io::Result<()> {
    if !path.exists() {
        return Ok(());
    }
    if backup_count == 0 {
        File::create(path)?;
        tracing::debug!(path = %path.display(), "Log truncated");
        return Ok(());
    }

    for index in (1..backup_count).rev() {
        let from = backup_path(path, index);
        if from.exists() {
            fs::rename(&from, backup_path(path, index + 1))?;
        }
    }
    fs::rename(path, backup_path(path, 1))?;
    tracing::debug!(path = %path.display(), backup_count, "Log rolled over");
    Ok(())
}
