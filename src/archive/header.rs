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

use std::io;
use std::time::UNIX_EPOCH;

use chrono::{DateTime, TimeZone, Utc};

use crate::shared::*;

/// Describes one member of an archive, independently of the codec and the
/// container it lives in.
///
/// The member's type is carried in `mode`, using the same type bits as a Unix
/// `st_mode`: [`MODE_DIR`] for directories, [`MODE_SYMLINK`] for symbolic
/// links, and [`MODE_REGULAR`] for regular files. Directory names get a single
/// trailing slash when written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Header {
    pub name: String,             // Path inside the archive, slash separated
    pub link_name: String,        // Symbolic link target, empty otherwise
    pub size: u64,                // Payload size, zero unless regular file
    pub mode: u32,                // Type and permission bits
    pub user: String,             // Owner name
    pub group: String,            // Group name
    pub mod_time: DateTime<Utc>,  // Modification time
}

impl Default for Header {
    fn default() -> Self {
        Self {
            name: String::new(),
            link_name: String::new(),
            size: 0,
            mode: MODE_REGULAR | 0o644,
            user: "root".to_string(),
            group: "root".to_string(),
            mod_time: DateTime::<Utc>::from(UNIX_EPOCH),
        }
    }
}

impl Header {
    /// Creates a header for a directory with the given permissions.
    ///
    /// The name is stored with a single trailing slash, the way it reads back
    /// from an archive.
    pub fn directory(name: &str, permissions: u32, mod_time: DateTime<Utc>) -> Self {
        Self {
            name: format!("{}/", name.trim_end_matches('/')),
            mode: MODE_DIR | (permissions & MODE_PERM_MASK),
            mod_time,
            ..Default::default()
        }
    }

    /// Creates a header for a regular file of `size` bytes.
    pub fn file(name: &str, size: u64, permissions: u32, mod_time: DateTime<Utc>) -> Self {
        Self {
            name: name.to_string(),
            size,
            mode: MODE_REGULAR | (permissions & MODE_PERM_MASK),
            mod_time,
            ..Default::default()
        }
    }

    /// Creates a header for a symbolic link pointing at `target`.
    pub fn symlink(name: &str, target: &str, mod_time: DateTime<Utc>) -> Self {
        Self {
            name: name.to_string(),
            link_name: target.to_string(),
            mode: MODE_SYMLINK | 0o777,
            mod_time,
            ..Default::default()
        }
    }

    /// Returns whether the header describes a directory.
    pub fn is_dir(&self) -> bool {
        mode_is_dir(self.mode)
    }

    /// Returns whether the header describes a symbolic link.
    pub fn is_symlink(&self) -> bool {
        mode_is_symlink(self.mode)
    }

    /// Returns whether the header describes a regular file with a payload.
    pub fn is_regular(&self) -> bool {
        self.mode & MODE_TYPE_MASK == MODE_REGULAR
    }

    /// Returns the header as a filesystem-like view.
    pub fn file_info(&self) -> FileInfo {
        let name = self
            .name
            .trim_end_matches('/')
            .rsplit('/')
            .next()
            .unwrap_or_default();
        FileInfo::new(name, self.size, self.mode, self.mod_time)
    }

    // Directory first, then symlink, anything else is a regular file
    pub(crate) fn entry_type(&self) -> tar::EntryType {
        if self.is_dir() {
            tar::EntryType::Directory
        } else if self.is_symlink() {
            tar::EntryType::Symlink
        } else {
            tar::EntryType::Regular
        }
    }

    // Name as stored in the tar record
    pub(crate) fn tar_name(&self) -> String {
        if self.is_dir() && !self.name.ends_with('/') {
            format!("{}/", self.name)
        } else {
            self.name.clone()
        }
    }

    // Size as stored in the tar record
    pub(crate) fn tar_size(&self) -> u64 {
        match self.entry_type() {
            tar::EntryType::Regular => self.size,
            _ => 0,
        }
    }

    /// Converts the header into a GNU tar record.
    ///
    /// The name and link fields are copied byte for byte, so a leading `./`
    /// survives. Anything longer than the record's 100 byte fields is cut off
    /// here, and it's up to the [`Writer`](crate::archive::Writer) to emit the
    /// GNU long name records that carry the full value.
    pub fn to_tar(&self) -> io::Result<tar::Header> {
        let mut header = tar::Header::new_gnu();
        header.set_entry_type(self.entry_type());
        fill(&mut header.as_old_mut().name, self.tar_name().as_bytes());
        fill(&mut header.as_old_mut().linkname, self.link_name.as_bytes());
        header.set_size(self.tar_size());
        header.set_mode(self.mode & MODE_PERM_MASK);
        header.set_uid(0);
        header.set_gid(0);
        header.set_mtime(self.mod_time.timestamp().max(0) as u64);
        if !self.user.is_empty() {
            header.set_username(&self.user)?;
        }
        if !self.group.is_empty() {
            header.set_groupname(&self.group)?;
        }
        header.set_cksum();
        Ok(header)
    }

    /// Builds a header from a tar record and the full name and link values
    /// the archive reader resolved for it.
    pub fn from_tar(
        header: &tar::Header,
        name: &[u8],
        link_name: Option<&[u8]>,
        size: u64,
    ) -> io::Result<Self> {
        let kind = match header.entry_type() {
            tar::EntryType::Directory => MODE_DIR,
            tar::EntryType::Symlink => MODE_SYMLINK,
            tar::EntryType::Regular | tar::EntryType::Continuous => MODE_REGULAR,
            _ => 0,
        };
        let mtime = header.mtime()?;
        let mod_time = i64::try_from(mtime)
            .ok()
            .and_then(|secs| Utc.timestamp_opt(secs, 0).single())
            .ok_or_else(|| io::Error::new(io::ErrorKind::InvalidData, "invalid modification time"))?;
        let text = |field: std::result::Result<Option<&str>, std::str::Utf8Error>| {
            field
                .map(|value| value.unwrap_or_default().to_string())
                .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))
        };

        Ok(Self {
            name: String::from_utf8_lossy(name).into_owned(),
            link_name: link_name
                .map(|link| String::from_utf8_lossy(link).into_owned())
                .unwrap_or_default(),
            size: if kind == MODE_REGULAR { size } else { 0 },
            mode: kind | (header.mode()? & MODE_PERM_MASK),
            user: text(header.username())?,
            group: text(header.groupname())?,
            mod_time,
        })
    }
}

// Copies as much of `value` as fits into a zeroed record field
fn fill(slot: &mut [u8], value: &[u8]) {
    let len = value.len().min(slot.len());
    slot[..len].copy_from_slice(&value[..len]);
}
