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

use std::fmt;
use std::str::FromStr;
use std::sync::OnceLock;

use regex::Regex;

use crate::error::Error;

/// A Deb package version: `[epoch:]upstream[-revision]`.
///
/// More about the format here:
/// https://www.debian.org/doc/debian-policy/ch-controlfields.html#version
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Version {
    epoch: u32,
    upstream: String,
    revision: String,
}

impl Version {
    /// Creates a version from its three parts.
    pub fn new(epoch: u32, upstream: &str, revision: &str) -> Self {
        Self {
            epoch,
            upstream: upstream.to_string(),
            revision: revision.to_string(),
        }
    }

    /// Returns the version's epoch.
    pub fn epoch(&self) -> u32 {
        self.epoch
    }

    /// Returns the upstream version.
    pub fn upstream(&self) -> &str {
        &self.upstream
    }

    /// Returns the Debian revision.
    pub fn revision(&self) -> &str {
        &self.revision
    }

    /// Renders the version without its epoch, as used in package file names.
    pub fn without_epoch(&self) -> String {
        match self.revision.is_empty() {
            true => self.upstream.clone(),
            false => format!("{}-{}", self.upstream, self.revision),
        }
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.epoch > 0 {
            write!(f, "{}:", self.epoch)?;
        }
        f.write_str(&self.without_epoch())
    }
}

impl FromStr for Version {
    type Err = Error;

    // The revision is whatever follows the last hyphen
    fn from_str(input: &str) -> Result<Self, Self::Err> {
        static VERSION: OnceLock<Regex> = OnceLock::new();
        let regex = VERSION.get_or_init(|| {
            Regex::new(r"^(?:(\d+):)?([0-9][A-Za-z0-9.+~:-]*?)(?:-([A-Za-z0-9.+~]+))?$")
                .expect("version pattern is valid")
        });

        let captures = regex
            .captures(input)
            .ok_or_else(|| Error::InvalidVersion(input.to_string()))?;
        let epoch = match captures.get(1) {
            Some(epoch) => epoch
                .as_str()
                .parse()
                .map_err(|_| Error::InvalidVersion(input.to_string()))?,
            None => 0,
        };

        Ok(Self {
            epoch,
            upstream: captures[2].to_string(),
            revision: captures
                .get(3)
                .map(|revision| revision.as_str().to_string())
                .unwrap_or_default(),
        })
    }
}
