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

//! Build and read binary Deb packages.
//!
//! Binary packages contain executable programs, documentation for said executables,
//! configuration files, libraries, etc. Basically, anything that's not source code.
//!
//! A package is made of three `ar` members, in this order:
//!
//! - `debian-binary`, holding the format version `2.0`
//! - `control.tar.gz`, holding `control`, `md5sums`, an optional `conffiles`,
//!   and any maintainer scripts
//! - `data.tar.xz`, holding the installed tree with every path prefixed by `.`

mod control;
mod inspect;
mod package;
mod version;

pub use control::*;
pub use inspect::*;
pub use package::*;
pub use version::*;
