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

//! Compression-agnostic tar archives.
//!
//! A [`Reader`] decodes a tar stream sitting behind one of the supported
//! decompression filters, and a [`Writer`] encodes one behind a compression
//! filter. Both speak in terms of [`Header`], which doesn't care about the
//! codec or the container.
//!
//! Not every codec works in both directions. Reading accepts uncompressed,
//! gzip, bzip2, and XZ streams, while writing only produces gzip and XZ, since
//! those are the only two a Deb package ever needs.

mod header;
mod reader;
mod writer;

pub use header::*;
pub use reader::*;
pub use writer::*;

use std::fmt;

use crate::error::{Error, Result};

const GZIP_MAGIC: &[u8] = &[0x1f, 0x8b];
const BZIP2_MAGIC: &[u8] = b"BZh";
const XZ_MAGIC: &[u8] = &[0xfd, 0x37, 0x7a, 0x58, 0x5a, 0x00];

/// The codec sitting in front of a tar stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Compression {
    None,
    Bzip2,
    Gzip,
    Xz,
}

impl Compression {
    /// Guesses the codec from the first bytes of a stream.
    ///
    /// Returns `None` when no known magic number matches, which usually means
    /// the stream is a plain tar archive.
    pub fn sniff(magic: &[u8]) -> Option<Self> {
        if magic.starts_with(GZIP_MAGIC) {
            Some(Compression::Gzip)
        } else if magic.starts_with(BZIP2_MAGIC) {
            Some(Compression::Bzip2)
        } else if magic.starts_with(XZ_MAGIC) {
            Some(Compression::Xz)
        } else {
            None
        }
    }

    /// Picks the codec from a file name's extension, as used for the members
    /// of a Deb package.
    pub fn from_file_name(name: &str) -> Result<Self> {
        match name.rsplit_once('.') {
            Some((_, "gz")) => Ok(Compression::Gzip),
            Some((_, "bz2")) => Ok(Compression::Bzip2),
            Some((_, "xz")) => Ok(Compression::Xz),
            Some((_, "tar")) => Ok(Compression::None),
            _ => Err(Error::UnsupportedCompression(name.to_string())),
        }
    }

    /// Returns the magic number a stream in this format starts with.
    pub(crate) fn magic(&self) -> &'static [u8] {
        match self {
            Compression::None => &[],
            Compression::Bzip2 => BZIP2_MAGIC,
            Compression::Gzip => GZIP_MAGIC,
            Compression::Xz => XZ_MAGIC,
        }
    }

    // Converts Compression to &str
    pub fn as_str(&self) -> &str {
        match self {
            Compression::None => "none",
            Compression::Bzip2 => "bzip2",
            Compression::Gzip => "gzip",
            Compression::Xz => "xz",
        }
    }
}

// Numeric codec identifiers, in the order the formats were historically added
impl TryFrom<u8> for Compression {
    type Error = Error;

    fn try_from(id: u8) -> Result<Self> {
        match id {
            0 => Ok(Compression::None),
            1 => Ok(Compression::Bzip2),
            2 => Ok(Compression::Gzip),
            3 => Ok(Compression::Xz),
            _ => Err(Error::UnsupportedCompression(format!("codec id {}", id))),
        }
    }
}

impl fmt::Display for Compression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
