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

use std::collections::HashSet;
use std::io::{self, Read, Write};

use chrono::{DateTime, Utc};
use tracing::{debug, info};

use crate::archive::{Compression, Header, Writer};
use crate::binary::{Control, Version};
use crate::error::{Context, Error, Result};
use crate::shared::*;

// Contents of the `debian-binary` member
const FORMAT_VERSION: &[u8] = b"2.0\n";
const DEFAULT_DIR_MODE: u32 = 0o755;

/// A Deb package being assembled.
///
/// Control files and data are streamed into two compressed tar archives as
/// they're added: a gzip one for the control files and an XZ one for the
/// installed tree. Every path added to the data archive is preceded by one
/// entry for each of its parent directories, which dpkg requires. Calling
/// [`Package::write`] consumes the package and frames both archives into the
/// final `ar` file.
///
/// # Example
///
/// ```
/// use std::fs::File;
/// use mkdeb::FileInfo;
/// use mkdeb::binary::{Package, Version};
///
/// fn main() -> mkdeb::Result<()> {
///     let mut package = Package::new("hello", "amd64", Version::new(0, "1.0.0", "1"))?;
///     package
///         .control_mut()
///         .set_description("says hello")
///         .set_depends(vec!["libc6".to_string()]);
///
///     let script = b"#!/bin/sh\necho hello\n";
///     package.add_file(
///         "/usr/bin/hello",
///         &script[..],
///         &FileInfo::new("hello", script.len() as u64, 0o100755, chrono::Utc::now()),
///     )?;
///
///     let file_name = package.file_name();
///     package.write(File::create(file_name)?)?;
///     Ok(())
/// }
/// ```
pub struct Package {
    name: String,
    arch: String,
    version: Version,
    control: Control,

    mod_time: DateTime<Utc>,         // Timestamp of generated entries
    dirs: HashSet<String>,           // Directories already in the data archive
    control_archive: Writer<Vec<u8>>,
    data_archive: Writer<Vec<u8>>,
    md5sums: String,                 // Contents of the `md5sums` control file
    conf_files: Vec<String>,         // Contents of the `conffiles` control file
}

impl Package {
    /// Creates an empty package.
    pub fn new(name: &str, arch: &str, version: Version) -> Result<Self> {
        let control_archive =
            Writer::buffer(Compression::Gzip).context("cannot create control archive")?;
        let data_archive = Writer::buffer(Compression::Xz).context("cannot create data archive")?;

        Ok(Self {
            name: name.to_string(),
            arch: arch.to_string(),
            version,
            control: Control::new(),
            mod_time: Utc::now(),
            dirs: HashSet::new(),
            control_archive,
            data_archive,
            md5sums: String::new(),
            conf_files: Vec::new(),
        })
    }

    /// Sets the timestamp used for generated entries, such as parent
    /// directories, links, and the `ar` members.
    pub fn with_mod_time(mut self, mod_time: DateTime<Utc>) -> Self {
        self.mod_time = mod_time;
        self
    }

    /// Returns the package's name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the package's architecture.
    pub fn arch(&self) -> &str {
        &self.arch
    }

    /// Returns the package's version.
    pub fn version(&self) -> &Version {
        &self.version
    }

    /// Returns the package's control metadata.
    pub fn control(&self) -> &Control {
        &self.control
    }

    /// Returns the package's control metadata for editing.
    ///
    /// The name, version, and architecture are overwritten from the package
    /// when it's written.
    pub fn control_mut(&mut self) -> &mut Control {
        &mut self.control
    }

    /// Returns the registered configuration files, in registration order.
    pub fn conf_files(&self) -> &[String] {
        &self.conf_files
    }

    /// Returns the conventional file name for the package:
    /// `<name>_<version>_<arch>.deb`, without the version's epoch.
    pub fn file_name(&self) -> String {
        format!(
            "{}_{}_{}.deb",
            self.name,
            self.version.without_epoch(),
            self.arch
        )
    }

    /// Adds a file to the control archive, such as a maintainer script.
    ///
    /// The payload is copied as is, and isn't listed in `md5sums`.
    pub fn add_control_file<R: Read>(&mut self, name: &str, data: R, info: &FileInfo) -> Result<()> {
        let header = Header::file(name, info.size(), info.permissions(), info.mod_time());
        self.control_archive
            .append(&header, data)
            .with_context(|| format!("cannot add control file `{}`", name))?;
        debug!("added control file {} ({} bytes)", name, info.size());
        Ok(())
    }

    /// Adds a directory to the data archive, along with any missing parents.
    ///
    /// Adding a directory that is already in the archive does nothing.
    pub fn add_dir(&mut self, path: &str, mode: u32) -> Result<()> {
        let path = normalize(path)?;
        if path == "/" || self.dirs.contains(&path) {
            return Ok(());
        }
        self.ensure_parent(&path)?;
        self.dirs.insert(path.clone());

        let header = Header::directory(&format!(".{}", path), mode, self.mod_time);
        self.data_archive
            .append(&header, io::empty())
            .with_context(|| format!("cannot add directory `{}`", path))?;
        debug!("added directory {}", path);
        Ok(())
    }

    /// Adds a regular file to the data archive, along with any missing
    /// parents.
    ///
    /// Exactly `info.size()` bytes are copied from `data`. They're hashed on
    /// the way through, and the digest is appended to `md5sums`. The size is
    /// added to the control's installed size.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidPath`] for the root, and for a path that was
    /// already added as a directory.
    pub fn add_file<R: Read>(&mut self, path: &str, data: R, info: &FileInfo) -> Result<()> {
        let path = self.leaf_path(path)?;
        self.ensure_parent(&path)?;

        let header = Header::file(
            &format!(".{}", path),
            info.size(),
            info.permissions(),
            info.mod_time(),
        );
        let mut reader = DigestReader::new(data);
        let size = self
            .data_archive
            .append(&header, &mut reader)
            .with_context(|| format!("cannot add file `{}`", path))?;

        self.md5sums
            .push_str(&format!("{:x}  {}\n", reader.digest.compute(), &path[1..]));
        self.control.add_installed_size(size);
        debug!("added file {} ({} bytes)", path, size);
        Ok(())
    }

    /// Adds a symbolic link at `dst` pointing to `src`, along with any
    /// missing parents of `dst`.
    ///
    /// `dst` follows the same rules as in [`Package::add_file`], and `src`
    /// can't be empty.
    pub fn add_link(&mut self, dst: &str, src: &str) -> Result<()> {
        let dst = self.leaf_path(dst)?;
        if src.is_empty() {
            return Err(Error::InvalidPath(format!("{} -> (empty target)", dst)));
        }
        self.ensure_parent(&dst)?;

        let header = Header::symlink(&format!(".{}", dst), src, self.mod_time);
        self.data_archive
            .append(&header, io::empty())
            .with_context(|| format!("cannot add link `{}`", dst))?;
        debug!("added link {} -> {}", dst, src);
        Ok(())
    }

    /// Marks `path` as a configuration file.
    pub fn register_conf_file(&mut self, path: &str) {
        self.conf_files.push(path.to_string());
    }

    /// Writes the package to `output` and returns it.
    ///
    /// The generated `conffiles`, `control`, and `md5sums` files are added to
    /// the control archive, both archives are closed, and the three `ar`
    /// members are written in order. If this fails, whatever reached `output`
    /// is not a usable package.
    pub fn write<W: Write>(mut self, output: W) -> Result<W> {
        let version = self.version.to_string();
        self.control
            .set_name(&self.name)
            .set_version(&version)
            .set_architecture(&self.arch);

        if !self.conf_files.is_empty() {
            let conf_files = format!("{}\n", self.conf_files.join("\n"));
            self.add_generated("conffiles", conf_files.as_bytes())?;
        }
        let control = self.control.serialize();
        self.add_generated("control", &control)?;
        let md5sums = std::mem::take(&mut self.md5sums);
        self.add_generated("md5sums", md5sums.as_bytes())?;

        let file_name = self.file_name();

        let control_tar = self
            .control_archive
            .close()
            .context("cannot close control archive")?;
        let data_tar = self
            .data_archive
            .close()
            .context("cannot close data archive")?;

        let mut archive = ar::Builder::new(output);
        let mtime = self.mod_time.timestamp().max(0) as u64;
        let members = [
            ("debian-binary", FORMAT_VERSION),
            ("control.tar.gz", control_tar.as_slice()),
            ("data.tar.xz", data_tar.as_slice()),
        ];
        for (name, contents) in members {
            let mut header = ar::Header::new(name.as_bytes().to_vec(), contents.len() as u64);
            header.set_mode(MODE_REGULAR | 0o644);
            header.set_mtime(mtime);
            header.set_uid(0);
            header.set_gid(0);
            archive
                .append(&header, contents)
                .with_context(|| format!("cannot append {}", name))?;
        }

        info!(
            "wrote {} (control {} bytes, data {} bytes)",
            file_name,
            control_tar.len(),
            data_tar.len()
        );
        archive.into_inner().context("cannot write package")
    }

    // Adds a control file produced by the package itself
    fn add_generated(&mut self, name: &str, contents: &[u8]) -> Result<()> {
        let info = FileInfo::regular(name, contents.len() as u64, self.mod_time);
        self.add_control_file(name, contents, &info)
    }

    // Normalizes the path of a file or link, which can't be the root or
    // an existing directory
    fn leaf_path(&self, path: &str) -> Result<String> {
        let normalized = normalize(path)?;
        if normalized == "/" || self.dirs.contains(&normalized) {
            return Err(Error::InvalidPath(path.to_string()));
        }
        Ok(normalized)
    }

    // Adds the parent of `path` to the data archive if it isn't there yet,
    // which in turn adds its own parent, up to the root
    fn ensure_parent(&mut self, path: &str) -> Result<()> {
        let parent = match path.rsplit_once('/') {
            Some((parent, _)) if !parent.is_empty() => parent,
            _ => return Ok(()),
        };
        if self.dirs.contains(parent) {
            return Ok(());
        }
        self.add_dir(parent, DEFAULT_DIR_MODE)
    }
}

// Checks that `path` is absolute and clean, and drops any trailing slash
fn normalize(path: &str) -> Result<String> {
    let relative = path
        .strip_prefix('/')
        .ok_or_else(|| Error::InvalidPath(path.to_string()))?;
    let relative = relative.strip_suffix('/').unwrap_or(relative);
    if relative.is_empty() {
        return Ok("/".to_string());
    }
    if relative
        .split('/')
        .any(|segment| segment.is_empty() || segment == "." || segment == "..")
    {
        return Err(Error::InvalidPath(path.to_string()));
    }
    Ok(format!("/{}", relative))
}

// Hashes the bytes read through it
struct DigestReader<R> {
    inner: R,
    digest: md5::Context,
}

impl<R: Read> DigestReader<R> {
    fn new(inner: R) -> Self {
        Self {
            inner,
            digest: md5::Context::new(),
        }
    }
}

impl<R: Read> Read for DigestReader<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let read = self.inner.read(buf)?;
        self.digest.consume(&buf[..read]);
        Ok(read)
    }
}
