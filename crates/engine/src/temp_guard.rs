//! Temporary files placed next to their destination.
//!
//! A transfer writes into `.name.XXXXXX` in the destination directory and
//! renames over the final name only once every byte is on disk. The
//! [`TempFileGuard`] removes the temporary file on every other exit path.
//! A process killed mid-transfer gets no such cleanup, so
//! [`remove_stale_tmpfiles`] clears those leftovers on the next run.

use std::collections::HashSet;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// Random suffix length without the separating dot.
const SUFFIX_LEN: usize = 6;

const RAND_CHARS: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789";

const MAX_OPEN_ATTEMPTS: u32 = 100;

/// NAME_MAX on common filesystems.
const NAME_MAX: usize = 255;

/// Hidden sibling name for `dest` without the random suffix: `.name.`.
fn temp_prefix(dest: &Path) -> (PathBuf, String) {
    let file_name = dest
        .file_name()
        .map_or_else(|| "mirror".to_owned(), |name| name.to_string_lossy().into_owned());
    let stem = file_name.strip_prefix('.').unwrap_or(&file_name);

    // Leave room for the leading dot, the separator and the suffix.
    let budget = NAME_MAX - SUFFIX_LEN - 2;
    let mut end = stem.len().min(budget);
    while end > 0 && !stem.is_char_boundary(end) {
        end -= 1;
    }

    let dir = dest.parent().unwrap_or_else(|| Path::new("."));
    (dir.to_path_buf(), format!(".{}.", &stem[..end]))
}

fn random_suffix() -> io::Result<String> {
    let mut bytes = [0u8; SUFFIX_LEN];
    getrandom::fill(&mut bytes)
        .map_err(|error| io::Error::other(format!("no entropy for temporary name: {error}")))?;
    Ok(bytes
        .iter()
        .map(|&byte| RAND_CHARS[usize::from(byte) % RAND_CHARS.len()] as char)
        .collect())
}

/// Creates a fresh temporary file next to `dest` with `O_EXCL` semantics.
pub fn open_tmpfile(dest: &Path) -> io::Result<(fs::File, TempFileGuard)> {
    let (dir, prefix) = temp_prefix(dest);
    for _ in 0..MAX_OPEN_ATTEMPTS {
        let candidate = dir.join(format!("{prefix}{}", random_suffix()?));
        match fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&candidate)
        {
            Ok(file) => return Ok((file, TempFileGuard::new(candidate))),
            Err(error) if error.kind() == io::ErrorKind::AlreadyExists => {}
            Err(error) => return Err(error),
        }
    }
    Err(io::Error::new(
        io::ErrorKind::AlreadyExists,
        format!(
            "no free temporary name for '{}' after {MAX_OPEN_ATTEMPTS} attempts",
            dest.display()
        ),
    ))
}

/// Removes temporary siblings of `names` in `dir` left by an interrupted run.
///
/// Only regular files named exactly like [`open_tmpfile`] output for one of
/// `names` are removed; a name that is itself in `names` is kept. Returns
/// the removed paths.
pub fn remove_stale_tmpfiles(dir: &Path, names: &[&str]) -> io::Result<Vec<PathBuf>> {
    if names.is_empty() {
        return Ok(Vec::new());
    }
    let prefixes: HashSet<String> = names
        .iter()
        .map(|name| temp_prefix(&dir.join(name)).1)
        .collect();

    let mut removed = Vec::new();
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        let file_name = entry.file_name();
        let Some(name) = file_name.to_str() else {
            continue;
        };
        let Some(split) = name.len().checked_sub(SUFFIX_LEN) else {
            continue;
        };
        if !name.is_char_boundary(split) || names.contains(&name) {
            continue;
        }
        let (prefix, suffix) = name.split_at(split);
        if !prefixes.contains(prefix) || !suffix.bytes().all(|byte| RAND_CHARS.contains(&byte)) {
            continue;
        }
        if entry.file_type()?.is_file() {
            let path = entry.path();
            fs::remove_file(&path)?;
            removed.push(path);
        }
    }
    Ok(removed)
}

/// Deletes its temporary file on drop unless persisted.
#[derive(Debug)]
pub struct TempFileGuard {
    path: PathBuf,
    keep_on_drop: bool,
}

impl TempFileGuard {
    /// Guards an existing path.
    #[must_use]
    pub const fn new(path: PathBuf) -> Self {
        Self {
            path,
            keep_on_drop: false,
        }
    }

    /// Temporary file path.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Renames the temporary file over `dest`, replacing any previous file.
    ///
    /// On failure the guard stays armed and the temporary file is removed
    /// when the guard drops.
    pub fn persist(&mut self, dest: &Path) -> io::Result<()> {
        fs::rename(&self.path, dest)?;
        self.keep_on_drop = true;
        Ok(())
    }
}

impl Drop for TempFileGuard {
    fn drop(&mut self) {
        if !self.keep_on_drop {
            let _ = fs::remove_file(&self.path);
        }
    }
}
