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

use std::io::{self, Read, Write};

use flate2::write::GzEncoder;
use flate2::Compression as GzLevel;
use xz::write::XzEncoder;

use super::{Compression, Header};
use crate::error::{Error, Result};

// Level used for XZ streams, xz(1)'s default
const XZ_LEVEL: u32 = 6;
// Size of a tar record's name and link fields
const NAME_LEN: usize = 100;
const BLOCK_LEN: u64 = 512;

// Compression filter sitting behind the tar encoder
enum Encoder<W: Write> {
    Gzip(GzEncoder<W>),
    Xz(XzEncoder<W>),
}

impl<W: Write> Encoder<W> {
    // Writes the compression trailer
    fn finish(self) -> io::Result<W> {
        match self {
            Encoder::Gzip(w) => w.finish(),
            Encoder::Xz(w) => w.finish(),
        }
    }
}

impl<W: Write> Write for Encoder<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        match self {
            Encoder::Gzip(w) => w.write(buf),
            Encoder::Xz(w) => w.write(buf),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        match self {
            Encoder::Gzip(w) => w.flush(),
            Encoder::Xz(w) => w.flush(),
        }
    }
}

/// Writes a tar archive through a compression filter.
///
/// Only gzip and XZ can be written. The archive isn't valid until
/// [`Writer::close`] has written the tar end-of-archive marker and the
/// compression trailer.
pub struct Writer<W: Write> {
    builder: tar::Builder<Encoder<W>>,
}

impl<W: Write> Writer<W> {
    /// Creates a writer that compresses into `output`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnsupportedCompression`] for anything but
    /// [`Compression::Gzip`] and [`Compression::Xz`].
    pub fn new(output: W, compression: Compression) -> Result<Self> {
        let encoder = match compression {
            Compression::Gzip => Encoder::Gzip(GzEncoder::new(output, GzLevel::default())),
            Compression::Xz => Encoder::Xz(XzEncoder::new(output, XZ_LEVEL)),
            Compression::None | Compression::Bzip2 => {
                return Err(Error::UnsupportedCompression(format!(
                    "cannot write {} archives",
                    compression
                )));
            }
        };
        Ok(Self {
            builder: tar::Builder::new(encoder),
        })
    }

    /// Appends an entry, copying exactly `header.size` bytes of payload from
    /// `data` for regular files and nothing for anything else.
    ///
    /// Names and link targets too long for a tar record are preceded by GNU
    /// long name records, so they are never truncated.
    ///
    /// # Errors
    ///
    /// Fails with an `UnexpectedEof` I/O error if `data` runs out before
    /// `header.size` bytes were copied. Entries written before this one are
    /// left intact.
    pub fn append<R: Read>(&mut self, header: &Header, data: R) -> Result<u64> {
        let name = header.tar_name();
        if name.len() > NAME_LEN {
            self.append_long(tar::EntryType::GNULongName, name.as_bytes())?;
        }
        if header.link_name.len() > NAME_LEN {
            self.append_long(tar::EntryType::GNULongLink, header.link_name.as_bytes())?;
        }

        let record = header.to_tar()?;
        let size = header.tar_size();
        let out = self.builder.get_mut();
        out.write_all(record.as_bytes())?;
        let copied = io::copy(&mut data.take(size), out)?;
        if copied < size {
            return Err(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                format!(
                    "payload of `{}` ended after {} of {} bytes",
                    header.name, copied, size
                ),
            )
            .into());
        }
        pad(out, size)?;
        Ok(copied)
    }

    // Writes a GNU long name or long link record carrying `value`
    fn append_long(&mut self, kind: tar::EntryType, value: &[u8]) -> Result<()> {
        let mut record = tar::Header::new_gnu();
        let name = b"././@LongLink";
        record.as_old_mut().name[..name.len()].copy_from_slice(name);
        record.set_entry_type(kind);
        record.set_mode(0o644);
        record.set_uid(0);
        record.set_gid(0);
        record.set_mtime(0);
        // Terminated by a NUL byte
        let size = value.len() as u64 + 1;
        record.set_size(size);
        record.set_cksum();

        let out = self.builder.get_mut();
        out.write_all(record.as_bytes())?;
        out.write_all(value)?;
        out.write_all(&[0])?;
        pad(out, size)?;
        Ok(())
    }

    /// Finishes the archive and returns the underlying output.
    ///
    /// Writes the tar end-of-archive marker first and the compression trailer
    /// second.
    pub fn close(self) -> Result<W> {
        let encoder = self.builder.into_inner()?;
        Ok(encoder.finish()?)
    }
}

impl Writer<Vec<u8>> {
    /// Creates a writer that compresses into memory.
    ///
    /// The bytes only become available from [`Writer::close`], once the
    /// archive is complete and its final length is known.
    pub fn buffer(compression: Compression) -> Result<Self> {
        Self::new(Vec::new(), compression)
    }
}

// Pads a payload of `size` bytes to the next record boundary
fn pad<W: Write>(out: &mut W, size: u64) -> io::Result<()> {
    let remaining = (BLOCK_LEN - size % BLOCK_LEN) % BLOCK_LEN;
    out.write_all(&[0u8; BLOCK_LEN as usize][..remaining as usize])
}
