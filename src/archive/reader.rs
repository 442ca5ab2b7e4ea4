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

use std::io::{self, BufRead, BufReader, Read};

use bzip2::read::BzDecoder;
use flate2::read::GzDecoder;
use xz::read::XzDecoder;

use super::{Compression, Header};
use crate::error::Result;

// Decompression filter sitting in front of the tar decoder
enum Decoder<R: Read> {
    None(BufReader<R>),
    Bzip2(BzDecoder<BufReader<R>>),
    Gzip(GzDecoder<BufReader<R>>),
    Xz(XzDecoder<BufReader<R>>),
}

impl<R: Read> Read for Decoder<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        match self {
            Decoder::None(r) => r.read(buf),
            Decoder::Bzip2(r) => r.read(buf),
            Decoder::Gzip(r) => r.read(buf),
            Decoder::Xz(r) => r.read(buf),
        }
    }
}

/// Reads a tar archive through a decompression filter.
///
/// Entries are visited in stream order through [`Reader::entries`], and the
/// iterator ending is the normal end of the archive. The decompression handle
/// is released when the reader is dropped.
///
/// # Example
///
/// ```
/// use std::io::Read;
/// use mkdeb::archive::{Compression, Reader};
///
/// fn list(input: std::fs::File) -> mkdeb::Result<()> {
///     let mut reader = Reader::new(input, Compression::Gzip)?;
///     for entry in reader.entries()? {
///         let mut entry = entry?;
///         let mut buf = Vec::new();
///         entry.read_to_end(&mut buf)?;
///         println!("{} ({} bytes)", entry.header().name, buf.len());
///     }
///     Ok(())
/// }
/// ```
pub struct Reader<R: Read> {
    archive: tar::Archive<Decoder<R>>,
}

impl<R: Read> Reader<R> {
    /// Opens a reader over `input`, decompressing it with `compression`.
    ///
    /// # Errors
    ///
    /// Fails if the stream doesn't start with the codec's magic number, or if
    /// it can't be read at all.
    pub fn new(input: R, compression: Compression) -> Result<Self> {
        let mut input = BufReader::new(input);
        check_magic(&mut input, compression)?;

        let decoder = match compression {
            Compression::None => Decoder::None(input),
            Compression::Bzip2 => Decoder::Bzip2(BzDecoder::new(input)),
            Compression::Gzip => Decoder::Gzip(GzDecoder::new(input)),
            Compression::Xz => Decoder::Xz(XzDecoder::new(input)),
        };

        Ok(Self {
            archive: tar::Archive::new(decoder),
        })
    }

    /// Returns an iterator over the archive's entries.
    ///
    /// This may only be called once per reader, as the archive is a forward
    /// only stream.
    pub fn entries(&mut self) -> Result<Entries<'_, R>> {
        Ok(Entries {
            inner: self.archive.entries()?,
        })
    }
}

fn check_magic<R: Read>(input: &mut BufReader<R>, compression: Compression) -> Result<()> {
    let magic = compression.magic();
    if magic.is_empty() {
        return Ok(());
    }
    if !input.fill_buf()?.starts_with(magic) {
        return Err(io::Error::new(
            io::ErrorKind::InvalidData,
            format!("stream is missing the {} header", compression),
        )
        .into());
    }
    Ok(())
}

/// Iterator over the entries of a [`Reader`].
pub struct Entries<'a, R: 'a + Read> {
    inner: tar::Entries<'a, Decoder<R>>,
}

impl<'a, R: 'a + Read> Iterator for Entries<'a, R> {
    type Item = Result<Entry<'a, R>>;

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next().map(|entry| Entry::new(entry?))
    }
}

/// One archive member: its header, and a reader over its payload.
///
/// Reading stops at the end of the member's payload, and whatever is left
/// unread is skipped when the iterator moves on.
pub struct Entry<'a, R: 'a + Read> {
    header: Header,
    inner: tar::Entry<'a, Decoder<R>>,
}

impl<'a, R: 'a + Read> Entry<'a, R> {
    fn new(inner: tar::Entry<'a, Decoder<R>>) -> Result<Self> {
        let header = Header::from_tar(
            inner.header(),
            &inner.path_bytes(),
            inner.link_name_bytes().as_deref(),
            inner.size(),
        )?;
        Ok(Self { header, inner })
    }

    /// Returns the entry's header.
    pub fn header(&self) -> &Header {
        &self.header
    }
}

impl<'a, R: 'a + Read> Read for Entry<'a, R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.inner.read(buf)
    }
}
