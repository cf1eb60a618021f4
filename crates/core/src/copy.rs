// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Atomic I/O for a single backing copy
//!
//! A copy is one named byte container. Writes go to a deterministic
//! sibling temp name, are flushed, then renamed over the destination so a
//! crash at any instant leaves either the old or the new contents intact.

use std::fs::{self, File};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

/// One enabled backing copy. Disabled slots are never constructed; they
/// are represented as `None` upstream.
#[derive(Debug, Clone)]
pub struct CopyFile {
    path: PathBuf,
}

impl CopyFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the raw contents. `None` means the copy is absent; a present
    /// zero-length file reads as `Some(vec![])`.
    pub fn read(&self) -> io::Result<Option<Vec<u8>>> {
        match fs::read(&self.path) {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// Atomically replace the copy's contents.
    ///
    /// The temp name is deterministic so a stale temp left by a crash is
    /// overwritten on the next commit rather than accumulating.
    pub fn write(&self, bytes: &[u8]) -> io::Result<()> {
        let tmp = self.temp_path();
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        {
            let mut file = File::create(&tmp)?;
            file.write_all(bytes)?;
            // sync before rename so the rename never publishes a partial file
            file.sync_all()?;
        }
        fs::rename(&tmp, &self.path)?;
        sync_parent_dir(&self.path)?;

        tracing::debug!(path = %self.path.display(), bytes = bytes.len(), "copy written");
        Ok(())
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self.path.as_os_str().to_os_string();
        name.push(".tmp");
        PathBuf::from(name)
    }
}

/// Flush the directory entry so the rename itself is durable
fn sync_parent_dir(path: &Path) -> io::Result<()> {
    let parent = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    File::open(parent)?.sync_all()
}

#[cfg(test)]
#[path = "copy_tests.rs"]
mod tests;
