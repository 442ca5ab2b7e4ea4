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

//! Feeding upstream sources into a [`Package`].
//!
//! An upstream source is either an archive, opened with [`open_upstream`] and
//! walked with [`import_archive`], or a directory on disk, added with
//! [`add_tree`]. Deciding where each upstream path gets installed is up to the
//! caller.

use std::fs;
use std::io::{self, BufRead, BufReader, Read};
use std::path::Path;

use tracing::debug;

use crate::archive::{Compression, Reader};
use crate::binary::Package;
use crate::error::{Context, Result};
use crate::shared::FileInfo;

/// Where an upstream entry gets installed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Destination {
    pub path: String,     // Absolute install path
    pub conf_file: bool,  // Whether to register the path as a conffile
}

impl Destination {
    /// Installs to `path`.
    pub fn new(path: &str) -> Self {
        Self {
            path: path.to_string(),
            conf_file: false,
        }
    }

    /// Installs to `path` and registers it as a configuration file.
    pub fn conf_file(path: &str) -> Self {
        Self {
            path: path.to_string(),
            conf_file: true,
        }
    }
}

/// Counts of what an import did.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ImportStats {
    pub imported: usize,
    pub skipped: usize,
}

/// Opens an upstream archive, picking the codec from its magic number.
///
/// Streams without a known magic number are read as plain tar archives.
pub fn open_upstream<R: Read>(input: R) -> Result<Reader<BufReader<R>>> {
    let mut input = BufReader::new(input);
    let compression = Compression::sniff(input.fill_buf().context("cannot peek upstream archive")?)
        .unwrap_or(Compression::None);
    debug!("upstream archive is {} compressed", compression);
    Reader::new(input, compression).context("cannot open upstream archive")
}

/// Drops the first `n` segments of an archive path, ignoring a leading `./`.
///
/// Returns `None` when nothing is left, which is the case for the stripped
/// directories themselves.
pub fn strip_components(name: &str, n: usize) -> Option<&str> {
    let mut rest = name.trim_start_matches("./");
    for _ in 0..n {
        rest = rest.split_once('/')?.1;
    }
    match rest.is_empty() {
        true => None,
        false => Some(rest),
    }
}

/// Adds the entries of an upstream archive to `package`.
///
/// Each entry name, with `strip` leading segments removed and no trailing
/// slash, is handed to `map`. Entries it maps are added as directories, files,
/// or links depending on their type, and entries it doesn't map are skipped.
/// Anything that isn't one of those three types, such as a hard link or a
/// device, is skipped too.
pub fn import_archive<R, F>(
    package: &mut Package,
    reader: &mut Reader<R>,
    strip: usize,
    mut map: F,
) -> Result<ImportStats>
where
    R: Read,
    F: FnMut(&str) -> Option<Destination>,
{
    let mut stats = ImportStats::default();

    for entry in reader.entries()? {
        let mut entry = entry.context("cannot read upstream archive")?;
        let header = entry.header().clone();

        let name = match strip_components(&header.name, strip) {
            Some(name) => name.trim_end_matches('/').to_string(),
            None => {
                stats.skipped += 1;
                continue;
            }
        };
        let destination = match map(&name) {
            Some(destination) => destination,
            None => {
                debug!("skipped {}", name);
                stats.skipped += 1;
                continue;
            }
        };

        if header.is_dir() {
            package
                .add_dir(&destination.path, header.mode)
                .with_context(|| format!("cannot import `{}`", name))?;
        } else if header.is_symlink() {
            package
                .add_link(&destination.path, &header.link_name)
                .with_context(|| format!("cannot import `{}`", name))?;
        } else if header.is_regular() {
            package
                .add_file(&destination.path, &mut entry, &header.file_info())
                .with_context(|| format!("cannot import `{}`", name))?;
        } else {
            debug!("skipped {}, not a file, directory, or link", name);
            stats.skipped += 1;
            continue;
        }

        if destination.conf_file {
            package.register_conf_file(&destination.path);
        }
        debug!("imported {} as {} ({} bytes)", name, destination.path, header.size);
        stats.imported += 1;
    }

    Ok(stats)
}

/// Recursively adds directory `from` to the package as `to`.
///
/// This adds all files, links, and sub-directories to `to`. For example, if you
/// had a directory `test` containing the files `foo` and `bar`, then you can
/// add those files as `/usr/bin/foo` and `/usr/bin/bar` with
/// `add_tree(&mut package, "test", "/usr/bin")?;`
///
/// Entries are visited in file name order, so the resulting archive doesn't
/// depend on the order the filesystem lists them in.
///
/// # Errors
///
/// This function may return an error if `from` doesn't exist.
pub fn add_tree<P: AsRef<Path>>(package: &mut Package, from: P, to: &str) -> Result<ImportStats> {
    let from = from.as_ref();
    let to = to.trim_end_matches('/');
    let mut stats = ImportStats::default();

    for file_result in walkdir::WalkDir::new(from).sort_by_file_name() {
        let file = file_result.map_err(io::Error::from)?;
        // Cutting the `from` directory out of the path
        let relative = file
            .path()
            .strip_prefix(from)
            .map_err(|e| io::Error::new(io::ErrorKind::Other, e))?
            .components()
            .map(|component| component.as_os_str().to_string_lossy())
            .collect::<Vec<_>>()
            .join("/");
        let destination = match relative.is_empty() {
            true if to.is_empty() => continue,
            true => to.to_string(),
            false => format!("{}/{}", to, relative),
        };

        let info = FileInfo::from_path(file.path())
            .with_context(|| format!("cannot stat `{}`", file.path().display()))?;
        let file_type = file.file_type();
        if file_type.is_dir() {
            package.add_dir(&destination, info.mode())?;
        } else if file_type.is_symlink() {
            let target = fs::read_link(file.path())
                .with_context(|| format!("cannot read link `{}`", file.path().display()))?;
            package.add_link(&destination, &target.to_string_lossy())?;
        } else if file_type.is_file() {
            let source = fs::File::open(file.path())
                .with_context(|| format!("cannot open `{}`", file.path().display()))?;
            package.add_file(&destination, source, &info)?;
        } else {
            stats.skipped += 1;
            continue;
        }
        stats.imported += 1;
    }

    Ok(stats)
}
