use crate::entry::WalkEntry;
use crate::error::WalkError;
use logging::trace_walk;
use std::ffi::OsString;
use std::fs;
use std::path::PathBuf;

/// Children-first iterator over the directories of a tree.
pub struct Walker {
    include_root: bool,
    stack: Vec<DirectoryState>,
}

impl Walker {
    pub(crate) fn new(root: PathBuf, include_root: bool) -> Result<Self, WalkError> {
        let metadata = fs::symlink_metadata(&root)
            .map_err(|error| WalkError::root_metadata(root.clone(), error))?;
        if !metadata.is_dir() {
            return Err(WalkError::root_not_directory(root));
        }

        let state = DirectoryState::enter(root, PathBuf::new(), 0)?;
        Ok(Self {
            include_root,
            stack: vec![state],
        })
    }
}

impl Iterator for Walker {
    type Item = Result<WalkEntry, WalkError>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let state = self.stack.last_mut()?;

            if let Some(name) = state.next_name() {
                let full_path = state.fs_path.join(&name);
                let relative_path = state.relative_path.join(&name);
                let depth = state.depth + 1;
                match DirectoryState::enter(full_path, relative_path, depth) {
                    Ok(child) => self.stack.push(child),
                    Err(error) => return Some(Err(error)),
                }
                continue;
            }

            let finished = self.stack.pop()?;
            if finished.depth == 0 && !self.include_root {
                return None;
            }
            trace_walk!("leaving directory: {:?}", finished.fs_path);
            return Some(Ok(finished.into_entry()));
        }
    }
}

#[derive(Clone, Debug)]
struct DirectoryState {
    fs_path: PathBuf,
    relative_path: PathBuf,
    subdirectories: Vec<OsString>,
    index: usize,
    depth: usize,
}

impl DirectoryState {
    fn enter(fs_path: PathBuf, relative_path: PathBuf, depth: usize) -> Result<Self, WalkError> {
        let read_dir =
            fs::read_dir(&fs_path).map_err(|error| WalkError::read_dir(fs_path.clone(), error))?;

        let mut subdirectories = Vec::new();
        for entry in read_dir {
            let entry = entry.map_err(|error| WalkError::read_dir_entry(fs_path.clone(), error))?;
            // DirEntry::file_type does not traverse symlinks.
            let is_dir = entry
                .file_type()
                .map_err(|error| WalkError::read_dir_entry(fs_path.clone(), error))?
                .is_dir();
            if is_dir {
                subdirectories.push(entry.file_name());
            }
        }
        subdirectories.sort();

        trace_walk!(
            "entering directory: {:?} ({} subdirectories)",
            fs_path,
            subdirectories.len()
        );

        Ok(Self {
            fs_path,
            relative_path,
            subdirectories,
            index: 0,
            depth,
        })
    }

    fn next_name(&mut self) -> Option<OsString> {
        let name = self.subdirectories.get(self.index)?.clone();
        self.index += 1;
        Some(name)
    }

    fn into_entry(self) -> WalkEntry {
        WalkEntry {
            full_path: self.fs_path,
            relative_path: self.relative_path,
            depth: self.depth,
        }
    }
}
