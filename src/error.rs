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

use std::fmt::Display;
use std::io;

/// Shorthand for results returned by this crate.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised while reading archives or assembling packages.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The requested codec is not available in this direction.
    #[error("unsupported compression: {0}")]
    UnsupportedCompression(String),

    /// A control field name that doesn't exist.
    #[error("invalid control field `{0}`")]
    InvalidField(String),

    /// A value whose type doesn't match the control field.
    #[error("invalid value for control field `{0}`")]
    InvalidValue(String),

    #[error("invalid package path `{0}`")]
    InvalidPath(String),

    #[error("invalid version `{0}`")]
    InvalidVersion(String),

    /// A package read back from bytes is missing something it needs.
    #[error("malformed package: {0}")]
    Malformed(String),

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("{context}: {source}")]
    Context {
        context: String,
        #[source]
        source: Box<Error>,
    },
}

impl Error {
    /// Wraps the error with a description of what was being attempted.
    pub fn context<C: Display>(self, context: C) -> Self {
        Error::Context {
            context: context.to_string(),
            source: Box::new(self),
        }
    }

    /// Returns the innermost error, skipping any context layers.
    pub fn root(&self) -> &Error {
        match self {
            Error::Context { source, .. } => source.root(),
            other => other,
        }
    }
}

/// Adds context to any result whose error converts into [`Error`].
pub trait Context<T> {
    fn context<C: Display>(self, context: C) -> Result<T>;

    fn with_context<C: Display, F: FnOnce() -> C>(self, f: F) -> Result<T>;
}

impl<T, E: Into<Error>> Context<T> for std::result::Result<T, E> {
    fn context<C: Display>(self, context: C) -> Result<T> {
        self.map_err(|e| Into::<Error>::into(e).context(context))
    }

    fn with_context<C: Display, F: FnOnce() -> C>(self, f: F) -> Result<T> {
        self.map_err(|e| Into::<Error>::into(e).context(f()))
    }
}
