/*
    mkdeb - Rust library for assembling Debian binary packages
    Copyright (C) 2023  NotSludgeBomb

    This program is free software: you can redistribute it and/or modify
    it under the terms of the GNU General Public License as published by
    the Free Software Foundation, either version 3 of the License, or
    (at your option) any later version.

    This program is distributed in the hope that it will be useful,
    but WITHOUT ANY WARRANTY; without even the implied warranty of
    MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
    GNU General Public License for more details.

    You should have received a copy of the GNU General Public License
    along with this program.  If not, see <https://www.gnu.org/licenses/>.
*/

use std::fs;
use std::path::Path;
#[cfg(unix)]
use std::os::unix::fs::MetadataExt;

use chrono::{DateTime, Utc};

// File type bits, laid out the way Unix `st_mode` does it
pub const MODE_TYPE_MASK: u32 = 0o170000;
pub const MODE_DIR: u32 = 0o040000;
pub const MODE_REGULAR: u32 = 0o100000;
pub const MODE_SYMLINK: u32 = 0o120000;
pub const MODE_PERM_MASK: u32 = 0o7777;

/// Returns true if `mode` carries the directory type bits.
pub fn mode_is_dir(mode: u32) -> bool {
    mode & MODE_TYPE_MASK == MODE_DIR
}

/// Returns true if `mode` carries the symbolic link type bits.
pub fn mode_is_symlink(mode: u32) -> bool {
    mode & MODE_TYPE_MASK == MODE_SYMLINK
}

/// A filesystem-like view of a file, used to describe the payload handed to
/// a package and to look at archive entries as if they were on disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileInfo {
    name: String,               // Base name
    size: u64,                  // Size of the payload in bytes
    mode: u32,                  // Type and permission bits
    mod_time: DateTime<Utc>,    // Modification time
}

impl FileInfo {
    /// Creates a FileInfo from its parts.
    pub fn new(name: &str, size: u64, mode: u32, mod_time: DateTime<Utc>) -> Self {
        Self {
            name: name.to_string(),
            size,
            mode,
            mod_time,
        }
    }

    /// Describes a regular file of `size` bytes with `0644` permissions.
    pub fn regular(name: &str, size: u64, mod_time: DateTime<Utc>) -> Self {
        Self::new(name, size, MODE_REGULAR | 0o644, mod_time)
    }

    /// Reads a FileInfo from the metadata of `path`, without following symlinks.
    #[cfg(unix)]
    pub fn from_path<P: AsRef<Path>>(path: P) -> std::io::Result<Self> {
        let metadata = fs::symlink_metadata(&path)?;
        Ok(Self {
            name: base_name(&path),
            size: if metadata.is_file() { metadata.len() } else { 0 },
            mode: metadata.mode(),
            mod_time: metadata.modified()?.into(),
        })
    }

    // Same function but for Windows, as file modes are a Unix feature
    #[cfg(windows)]
    pub fn from_path<P: AsRef<Path>>(path: P) -> std::io::Result<Self> {
        let metadata = fs::symlink_metadata(&path)?;
        let mode = if metadata.is_dir() {
            MODE_DIR | 0o755
        } else if metadata.file_type().is_symlink() {
            MODE_SYMLINK | 0o777
        } else {
            MODE_REGULAR | 0o644
        };
        Ok(Self {
            name: base_name(&path),
            size: if metadata.is_file() { metadata.len() } else { 0 },
            mode,
            mod_time: metadata.modified()?.into(),
        })
    }

    /// Returns the file's base name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the file's size.
    pub fn size(&self) -> u64 {
        self.size
    }

    /// Returns the file's type and permission bits.
    pub fn mode(&self) -> u32 {
        self.mode
    }

    /// Returns the file's permission bits only.
    pub fn permissions(&self) -> u32 {
        self.mode & MODE_PERM_MASK
    }

    /// Returns the file's modification time.
    pub fn mod_time(&self) -> DateTime<Utc> {
        self.mod_time
    }

    /// Returns whether the file is a directory.
    pub fn is_dir(&self) -> bool {
        mode_is_dir(self.mode)
    }
}

fn base_name<P: AsRef<Path>>(path: P) -> String {
    path.as_ref()
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default()
}
