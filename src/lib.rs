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

//! A pure Rust library for assembling Debian binary packages from upstream
//! sources.
//!
//! The [`archive`] module reads and writes tar archives behind a choice of
//! compression codecs. The [`binary`] module builds on it to stream files into
//! a package and frame the result as a `.deb`, and [`import`] feeds upstream
//! archives or directories into a package.

pub mod archive;
pub mod binary;
mod error;
pub mod import;
mod shared;
#[cfg(test)]
mod test;

pub use error::*;
pub use shared::*;
