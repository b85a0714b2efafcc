//! Depth-first filesystem traversal

use std::fs::{self, Metadata};
use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;

/// Result type for traversal
pub type WalkResult<T> = Result<T, WalkError>;

/// Traversal errors
#[derive(Debug, Error)]
pub enum WalkError {
    #[error("cannot resolve {path}: {source}")]
    Resolve {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("cannot stat {path}: {source}")]
    Stat {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("cannot read directory {path}: {source}")]
    ReadDir {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// What to do after visiting an entry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Visit {
    /// Descend into the entry if it is a directory
    Continue,
    /// Do not descend into this entry
    Skip,
    /// Stop the whole walk
    Abort,
}

/// A visited path and its metadata
#[derive(Debug)]
pub struct Entry {
    pub path: PathBuf,
    pub metadata: Metadata,
}

/// Visits a tree in pre-order, siblings sorted by name
#[derive(Debug, Default, Clone, Copy)]
pub struct Walker;

impl Walker {
    pub fn new() -> Self {
        Self
    }

    /// Walks `root`, which is made absolute first. Aborting is not an error.
    pub fn walk<F>(&self, root: &Path, mut handler: F) -> WalkResult<()>
    where
        F: FnMut(&Entry) -> Visit,
    {
        let root = absolute(root)?;
        self.visit(root, &mut handler).map(|_| ())
    }

    /// Returns false once the walk has been aborted
    fn visit<F>(&self, path: PathBuf, handler: &mut F) -> WalkResult<bool>
    where
        F: FnMut(&Entry) -> Visit,
    {
        let metadata = fs::metadata(&path).map_err(|source| WalkError::Stat {
            path: path.clone(),
            source,
        })?;
        let entry = Entry { path, metadata };

        match handler(&entry) {
            Visit::Abort => return Ok(false),
            Visit::Skip => return Ok(true),
            Visit::Continue if !entry.metadata.is_dir() => return Ok(true),
            Visit::Continue => {}
        }

        let read_dir_err = |source| WalkError::ReadDir {
            path: entry.path.clone(),
            source,
        };
        let mut children = Vec::new();
        for child in fs::read_dir(&entry.path).map_err(read_dir_err)? {
            children.push(child.map_err(read_dir_err)?.file_name());
        }
        children.sort();

        for name in children {
            if !self.visit(entry.path.join(name), handler)? {
                return Ok(false);
            }
        }
        Ok(true)
    }
}

fn absolute(path: &Path) -> WalkResult<PathBuf> {
    if path.is_absolute() {
        return Ok(path.to_path_buf());
    }
    std::env::current_dir()
        .map(|cwd| cwd.join(path))
        .map_err(|source| WalkError::Resolve {
            path: path.to_path_buf(),
            source,
        })
}
