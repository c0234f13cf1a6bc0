// Copyright (c) Contributors to the envgen project.
// SPDX-License-Identifier: Apache-2.0

//! Filesystem access used by config loading and workspace discovery.
//!
//! Discovery never touches `std::fs` directly so it can run against
//! [`MemoryFileTree`] in tests.

use std::collections::{BTreeMap, BTreeSet};
use std::path::{Component, Path, PathBuf};

#[cfg(test)]
#[path = "./tree_test.rs"]
mod tree_test;

/// One entry of a directory listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TreeEntry {
    pub path: PathBuf,
    pub is_dir: bool,
}

impl TreeEntry {
    pub fn file_name(&self) -> Option<&str> {
        self.path.file_name().and_then(|n| n.to_str())
    }
}

/// Read-only view of a directory tree.
pub trait FileTree {
    /// List the direct children of `dir`.
    fn read_dir(&self, dir: &Path) -> std::io::Result<Vec<TreeEntry>>;

    fn read_to_string(&self, path: &Path) -> std::io::Result<String>;

    fn is_file(&self, path: &Path) -> bool;
}

/// The real filesystem.
#[derive(Debug, Clone, Copy, Default)]
pub struct OsFileTree;

impl FileTree for OsFileTree {
    fn read_dir(&self, dir: &Path) -> std::io::Result<Vec<TreeEntry>> {
        let mut entries = Vec::new();
        for entry in std::fs::read_dir(dir)? {
            let entry = entry?;
            entries.push(TreeEntry {
                path: entry.path(),
                is_dir: entry.file_type()?.is_dir(),
            });
        }
        Ok(entries)
    }

    fn read_to_string(&self, path: &Path) -> std::io::Result<String> {
        std::fs::read_to_string(path)
    }

    fn is_file(&self, path: &Path) -> bool {
        path.is_file()
    }
}

/// An in-memory tree of files. Directories exist implicitly as the parents
/// of added files, or explicitly through [`MemoryFileTree::dir`].
#[derive(Debug, Clone, Default)]
pub struct MemoryFileTree {
    files: BTreeMap<PathBuf, String>,
    dirs: BTreeSet<PathBuf>,
}

impl MemoryFileTree {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a file, creating its parent directories.
    pub fn file<P: AsRef<Path>, S: Into<String>>(mut self, path: P, content: S) -> Self {
        let path = normalize(path.as_ref());
        self.add_parents(&path);
        self.files.insert(path, content.into());
        self
    }

    /// Add an empty directory.
    pub fn dir<P: AsRef<Path>>(mut self, path: P) -> Self {
        let path = normalize(path.as_ref());
        self.add_parents(&path);
        self.dirs.insert(path);
        self
    }

    fn add_parents(&mut self, path: &Path) {
        let mut current = path.parent();
        while let Some(parent) = current {
            if parent.as_os_str().is_empty() {
                break;
            }
            self.dirs.insert(parent.to_path_buf());
            current = parent.parent();
        }
    }
}

fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                out.pop();
            }
            other => out.push(other),
        }
    }
    out
}

fn not_found(path: &Path) -> std::io::Error {
    std::io::Error::new(
        std::io::ErrorKind::NotFound,
        format!("{} does not exist", path.display()),
    )
}

impl FileTree for MemoryFileTree {
    fn read_dir(&self, dir: &Path) -> std::io::Result<Vec<TreeEntry>> {
        let dir = normalize(dir);
        if !self.dirs.contains(&dir) {
            return Err(not_found(&dir));
        }
        let files = self.files.keys().map(|p| (p, false));
        let dirs = self.dirs.iter().map(|p| (p, true));
        Ok(files
            .chain(dirs)
            .filter(|(path, _)| path.parent() == Some(dir.as_path()))
            .map(|(path, is_dir)| TreeEntry {
                path: path.clone(),
                is_dir,
            })
            .collect())
    }

    fn read_to_string(&self, path: &Path) -> std::io::Result<String> {
        let path = normalize(path);
        self.files.get(&path).cloned().ok_or_else(|| not_found(&path))
    }

    fn is_file(&self, path: &Path) -> bool {
        self.files.contains_key(&normalize(path))
    }
}
