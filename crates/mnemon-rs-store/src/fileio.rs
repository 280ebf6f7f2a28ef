//! Filesystem layout and atomic record writes.

use crate::codec::{COMPRESSED_SUFFIX, PLAIN_SUFFIX};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// Subdirectory holding record files.
pub(crate) const MEMORIES_DIR: &str = "memories";
/// Reserved subdirectories created alongside it.
const RESERVED_DIRS: [&str; 2] = ["index", "logs"];

/// Create the data-directory layout: `memories/`, `index/`, and `logs/`,
/// each with mode 0755.
pub(crate) fn ensure_layout(data_dir: &Path) -> io::Result<()> {
    create_dir(&data_dir.join(MEMORIES_DIR))?;
    for reserved in RESERVED_DIRS {
        create_dir(&data_dir.join(reserved))?;
    }
    Ok(())
}

#[cfg(unix)]
fn create_dir(dir: &Path) -> io::Result<()> {
    use std::os::unix::fs::DirBuilderExt;
    if dir.exists() {
        return Ok(());
    }
    fs::DirBuilder::new().recursive(true).mode(0o755).create(dir)
}

#[cfg(not(unix))]
fn create_dir(dir: &Path) -> io::Result<()> {
    fs::create_dir_all(dir)
}

/// Path of a record file under the memories directory.
pub(crate) fn record_path(memories_dir: &Path, id: &str, suffix: &str) -> PathBuf {
    memories_dir.join(format!("{id}{suffix}"))
}

/// Locate a record file regardless of which compression suffix it was
/// written with.
pub(crate) fn find_record_file(memories_dir: &Path, id: &str) -> Option<PathBuf> {
    for suffix in [COMPRESSED_SUFFIX, PLAIN_SUFFIX] {
        let candidate = record_path(memories_dir, id, suffix);
        if candidate.exists() {
            return Some(candidate);
        }
    }
    None
}

/// Write `bytes` to `<path>.tmp` and move it into place with an atomic
/// rename; the temp file is removed if the rename fails.
pub(crate) fn atomic_write(path: &Path, bytes: &[u8]) -> io::Result<()> {
    let mut temp = path.as_os_str().to_owned();
    temp.push(".tmp");
    let temp = PathBuf::from(temp);

    fs::write(&temp, bytes)?;
    if let Err(err) = fs::rename(&temp, path) {
        let _ = fs::remove_file(&temp);
        return Err(err);
    }
    Ok(())
}

/// Record files (and their byte sizes) under the memories directory.
///
/// Returns an empty list when the directory does not exist yet.
pub(crate) fn list_record_files(memories_dir: &Path) -> io::Result<Vec<(PathBuf, u64)>> {
    let entries = match fs::read_dir(memories_dir) {
        Ok(entries) => entries,
        Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(err) => return Err(err),
    };

    let mut files = Vec::new();
    for entry in entries {
        let entry = entry?;
        let name = entry.file_name();
        let name = name.to_string_lossy();
        if !name.ends_with(COMPRESSED_SUFFIX) && !name.ends_with(PLAIN_SUFFIX) {
            continue;
        }
        let metadata = entry.metadata()?;
        files.push((entry.path(), metadata.len()));
    }
    Ok(files)
}

/// Total size of every entry in the memories directory.
pub(crate) fn directory_size(memories_dir: &Path) -> u64 {
    list_record_files(memories_dir)
        .map(|files| files.iter().map(|(_, size)| size).sum())
        .unwrap_or(0)
}
