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

use std::io::Read;

use crate::archive::{Compression, Header, Reader};
use crate::binary::Control;
use crate::error::{Context, Error, Result};

/// A built package read back from its `ar` envelope.
///
/// The control and data archives are kept compressed, and are only decoded
/// when their entries are asked for.
pub struct DebArchive {
    members: Vec<String>,             // Member names, in archive order
    format_version: String,           // Contents of `debian-binary`
    control: (Compression, Vec<u8>),  // Compressed control archive
    data: (Compression, Vec<u8>),     // Compressed data archive
}

impl DebArchive {
    /// Reads a package from `input`.
    ///
    /// # Errors
    ///
    /// Fails with [`Error::Malformed`] if any of the three members is missing,
    /// and with [`Error::UnsupportedCompression`] if a sub-archive uses a codec
    /// that can't be read.
    pub fn read<R: Read>(input: R) -> Result<Self> {
        let mut archive = ar::Archive::new(input);
        let mut members = Vec::new();
        let mut format_version = None;
        let mut control = None;
        let mut data = None;

        while let Some(entry) = archive.next_entry() {
            let mut entry = entry.context("cannot read package member")?;
            let name = String::from_utf8_lossy(entry.header().identifier()).into_owned();
            let mut contents = Vec::new();
            entry
                .read_to_end(&mut contents)
                .with_context(|| format!("cannot read {}", name))?;

            if name == "debian-binary" {
                format_version = Some(String::from_utf8_lossy(&contents).trim().to_string());
            } else if name.starts_with("control.tar") {
                control = Some((Compression::from_file_name(&name)?, contents));
            } else if name.starts_with("data.tar") {
                data = Some((Compression::from_file_name(&name)?, contents));
            }
            members.push(name);
        }

        Ok(Self {
            members,
            format_version: format_version
                .ok_or_else(|| Error::Malformed("missing debian-binary".to_string()))?,
            control: control
                .ok_or_else(|| Error::Malformed("missing control archive".to_string()))?,
            data: data.ok_or_else(|| Error::Malformed("missing data archive".to_string()))?,
        })
    }

    /// Returns the names of the package's members, in archive order.
    pub fn members(&self) -> &[String] {
        &self.members
    }

    /// Returns the package format version, usually `2.0`.
    pub fn format_version(&self) -> &str {
        &self.format_version
    }

    /// Decodes every entry of the control archive.
    pub fn control_entries(&self) -> Result<Vec<(Header, Vec<u8>)>> {
        read_entries(&self.control.1, self.control.0).context("cannot read control archive")
    }

    /// Decodes every entry of the data archive.
    pub fn data_entries(&self) -> Result<Vec<(Header, Vec<u8>)>> {
        read_entries(&self.data.1, self.data.0).context("cannot read data archive")
    }

    /// Returns the contents of the control file called `name`, if any.
    pub fn control_file(&self, name: &str) -> Result<Option<Vec<u8>>> {
        Ok(self
            .control_entries()?
            .into_iter()
            .find(|(header, _)| header.name.trim_start_matches("./") == name)
            .map(|(_, contents)| contents))
    }

    /// Parses the package's `control` file.
    pub fn control(&self) -> Result<Control> {
        let contents = self
            .control_file("control")?
            .ok_or_else(|| Error::Malformed("missing control file".to_string()))?;
        Control::parse(&String::from_utf8_lossy(&contents))
    }
}

fn read_entries(bytes: &[u8], compression: Compression) -> Result<Vec<(Header, Vec<u8>)>> {
    let mut reader = Reader::new(bytes, compression)?;
    let mut output = Vec::new();
    for entry in reader.entries()? {
        let mut entry = entry?;
        let mut contents = Vec::new();
        entry.read_to_end(&mut contents)?;
        output.push((entry.header().clone(), contents));
    }
    Ok(output)
}
