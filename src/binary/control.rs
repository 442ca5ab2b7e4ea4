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

use crate::error::{Error, Result};

/// Column at which descriptions are wrapped.
pub const DESCRIPTION_WIDTH: usize = 76;

const DEFAULT_VERSION: &str = "0.0.0";
const DEFAULT_PRIORITY: &str = "extra";
const DEFAULT_ARCHITECTURE: &str = "all";

/// The control fields a package can carry.
///
/// More about these fields here:
/// https://www.debian.org/doc/debian-policy/ch-controlfields.html#binary-package-control-files-debian-control
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Field {
    Package,
    Version,
    Section,
    Priority,
    Architecture,
    Depends,
    PreDepends,
    Recommends,
    Suggests,
    Enhances,
    Breaks,
    Conflicts,
    InstalledSize,
    Maintainer,
    Description,
    Homepage,
}

impl Field {
    // Converts Field to &str
    pub fn as_str(&self) -> &str {
        match self {
            Field::Package => "Package",
            Field::Version => "Version",
            Field::Section => "Section",
            Field::Priority => "Priority",
            Field::Architecture => "Architecture",
            Field::Depends => "Depends",
            Field::PreDepends => "Pre-Depends",
            Field::Recommends => "Recommends",
            Field::Suggests => "Suggests",
            Field::Enhances => "Enhances",
            Field::Breaks => "Breaks",
            Field::Conflicts => "Conflicts",
            Field::InstalledSize => "Installed-Size",
            Field::Maintainer => "Maintainer",
            Field::Description => "Description",
            Field::Homepage => "Homepage",
        }
    }

    // Converts &str to Field
    // Field names are case-insensitive, and the hyphen is optional
    pub fn from(input: &str) -> Result<Self> {
        let key = input.replace('-', "").to_ascii_lowercase();
        match key.as_str() {
            "package" | "name" => Ok(Field::Package),
            "version" => Ok(Field::Version),
            "section" => Ok(Field::Section),
            "priority" => Ok(Field::Priority),
            "architecture" => Ok(Field::Architecture),
            "depends" => Ok(Field::Depends),
            "predepends" => Ok(Field::PreDepends),
            "recommends" => Ok(Field::Recommends),
            "suggests" => Ok(Field::Suggests),
            "enhances" => Ok(Field::Enhances),
            "breaks" => Ok(Field::Breaks),
            "conflicts" => Ok(Field::Conflicts),
            "installedsize" => Ok(Field::InstalledSize),
            "maintainer" => Ok(Field::Maintainer),
            "description" => Ok(Field::Description),
            "homepage" => Ok(Field::Homepage),
            _ => Err(Error::InvalidField(input.to_string())),
        }
    }

    fn is_relation(&self) -> bool {
        matches!(
            self,
            Field::Depends
                | Field::PreDepends
                | Field::Recommends
                | Field::Suggests
                | Field::Enhances
                | Field::Breaks
                | Field::Conflicts
        )
    }
}

/// A value handed to [`Control::set`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldValue {
    Text(String),
    List(Vec<String>),
    Size(u64),
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        FieldValue::Text(value.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(value: String) -> Self {
        FieldValue::Text(value)
    }
}

impl From<Vec<String>> for FieldValue {
    fn from(value: Vec<String>) -> Self {
        FieldValue::List(value)
    }
}

impl From<Vec<&str>> for FieldValue {
    fn from(value: Vec<&str>) -> Self {
        FieldValue::List(value.into_iter().map(str::to_string).collect())
    }
}

impl From<u64> for FieldValue {
    fn from(value: u64) -> Self {
        FieldValue::Size(value)
    }
}

/// A package's control file.
///
/// `Priority` and `Architecture` fall back to `extra` and `all` when left
/// empty, and `Installed-Size` is kept in bytes and written in KiB.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Control {
    name: String,
    version: String,
    section: String,
    priority: String,
    architecture: String,
    depends: Vec<String>,
    pre_depends: Vec<String>,
    recommends: Vec<String>,
    suggests: Vec<String>,
    enhances: Vec<String>,
    breaks: Vec<String>,
    conflicts: Vec<String>,
    installed_size: u64,
    maintainer: String,
    description: String,
    homepage: String,
}

impl Default for Control {
    fn default() -> Self {
        Self {
            name: String::new(),
            version: DEFAULT_VERSION.to_string(),
            section: String::new(),
            priority: DEFAULT_PRIORITY.to_string(),
            architecture: DEFAULT_ARCHITECTURE.to_string(),
            depends: Vec::new(),
            pre_depends: Vec::new(),
            recommends: Vec::new(),
            suggests: Vec::new(),
            enhances: Vec::new(),
            breaks: Vec::new(),
            conflicts: Vec::new(),
            installed_size: 0,
            maintainer: String::new(),
            description: String::new(),
            homepage: String::new(),
        }
    }
}

impl Control {
    /// Creates a control with the default version, priority, and architecture.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets `key` to `value`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidField`] if `key` isn't a known field, and
    /// [`Error::InvalidValue`] if `value` doesn't have the field's type: text
    /// for plain fields, a list for relations, and a size for
    /// `Installed-Size`.
    pub fn set<V: Into<FieldValue>>(&mut self, key: &str, value: V) -> Result<()> {
        self.set_field(Field::from(key)?, value.into())
    }

    /// Same as [`Control::set`], with the field already resolved.
    pub fn set_field(&mut self, field: Field, value: FieldValue) -> Result<()> {
        match value {
            FieldValue::Text(text) => match self.text_mut(field) {
                Some(slot) => *slot = text,
                None => return Err(Error::InvalidValue(field.as_str().to_string())),
            },
            FieldValue::List(list) => match self.list_mut(field) {
                Some(slot) => *slot = list,
                None => return Err(Error::InvalidValue(field.as_str().to_string())),
            },
            FieldValue::Size(size) if field == Field::InstalledSize => {
                self.installed_size = size;
            }
            FieldValue::Size(_) => return Err(Error::InvalidValue(field.as_str().to_string())),
        }
        Ok(())
    }

    fn text_mut(&mut self, field: Field) -> Option<&mut String> {
        match field {
            Field::Package => Some(&mut self.name),
            Field::Version => Some(&mut self.version),
            Field::Section => Some(&mut self.section),
            Field::Priority => Some(&mut self.priority),
            Field::Architecture => Some(&mut self.architecture),
            Field::Maintainer => Some(&mut self.maintainer),
            Field::Description => Some(&mut self.description),
            Field::Homepage => Some(&mut self.homepage),
            _ => None,
        }
    }

    fn list_mut(&mut self, field: Field) -> Option<&mut Vec<String>> {
        match field {
            Field::Depends => Some(&mut self.depends),
            Field::PreDepends => Some(&mut self.pre_depends),
            Field::Recommends => Some(&mut self.recommends),
            Field::Suggests => Some(&mut self.suggests),
            Field::Enhances => Some(&mut self.enhances),
            Field::Breaks => Some(&mut self.breaks),
            Field::Conflicts => Some(&mut self.conflicts),
            _ => None,
        }
    }

    /// Sets the package's name.
    pub fn set_name(&mut self, name: &str) -> &mut Self {
        self.name = name.to_string();
        self
    }

    /// Sets the package's version.
    pub fn set_version(&mut self, version: &str) -> &mut Self {
        self.version = version.to_string();
        self
    }

    /// Sets the package's section.
    pub fn set_section(&mut self, section: &str) -> &mut Self {
        self.section = section.to_string();
        self
    }

    /// Sets the package's priority.
    pub fn set_priority(&mut self, priority: &str) -> &mut Self {
        self.priority = priority.to_string();
        self
    }

    /// Sets the package's architecture.
    pub fn set_architecture(&mut self, architecture: &str) -> &mut Self {
        self.architecture = architecture.to_string();
        self
    }

    /// Sets the package's dependencies.
    pub fn set_depends(&mut self, depends: Vec<String>) -> &mut Self {
        self.depends = depends;
        self
    }

    /// Sets the package's pre-dependencies.
    pub fn set_pre_depends(&mut self, pre_depends: Vec<String>) -> &mut Self {
        self.pre_depends = pre_depends;
        self
    }

    /// Sets the package's recommends.
    pub fn set_recommends(&mut self, recommends: Vec<String>) -> &mut Self {
        self.recommends = recommends;
        self
    }

    /// Sets the package's suggests.
    pub fn set_suggests(&mut self, suggests: Vec<String>) -> &mut Self {
        self.suggests = suggests;
        self
    }

    /// Sets the package's enhances.
    pub fn set_enhances(&mut self, enhances: Vec<String>) -> &mut Self {
        self.enhances = enhances;
        self
    }

    /// Sets the package's breaks.
    pub fn set_breaks(&mut self, breaks: Vec<String>) -> &mut Self {
        self.breaks = breaks;
        self
    }

    /// Sets the package's conflicts.
    pub fn set_conflicts(&mut self, conflicts: Vec<String>) -> &mut Self {
        self.conflicts = conflicts;
        self
    }

    /// Sets the package's installed size, in bytes.
    pub fn set_installed_size(&mut self, size: u64) -> &mut Self {
        self.installed_size = size;
        self
    }

    /// Adds `size` bytes to the package's installed size.
    pub fn add_installed_size(&mut self, size: u64) -> &mut Self {
        self.installed_size += size;
        self
    }

    /// Sets the package's maintainer.
    pub fn set_maintainer(&mut self, maintainer: &str) -> &mut Self {
        self.maintainer = maintainer.to_string();
        self
    }

    /// Sets the package's description.
    pub fn set_description(&mut self, description: &str) -> &mut Self {
        self.description = description.to_string();
        self
    }

    /// Sets the package's homepage.
    pub fn set_homepage(&mut self, homepage: &str) -> &mut Self {
        self.homepage = homepage.to_string();
        self
    }

    /// Returns the package's name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the package's version.
    pub fn version(&self) -> &str {
        &self.version
    }

    /// Returns the package's section.
    pub fn section(&self) -> &str {
        &self.section
    }

    /// Returns the package's priority.
    pub fn priority(&self) -> &str {
        or_default(&self.priority, DEFAULT_PRIORITY)
    }

    /// Returns the package's architecture.
    pub fn architecture(&self) -> &str {
        or_default(&self.architecture, DEFAULT_ARCHITECTURE)
    }

    /// Returns the package's dependencies.
    pub fn depends(&self) -> &[String] {
        &self.depends
    }

    /// Returns the package's pre-dependencies.
    pub fn pre_depends(&self) -> &[String] {
        &self.pre_depends
    }

    /// Returns the package's recommends.
    pub fn recommends(&self) -> &[String] {
        &self.recommends
    }

    /// Returns the package's suggests.
    pub fn suggests(&self) -> &[String] {
        &self.suggests
    }

    /// Returns the package's enhances.
    pub fn enhances(&self) -> &[String] {
        &self.enhances
    }

    /// Returns the package's breaks.
    pub fn breaks(&self) -> &[String] {
        &self.breaks
    }

    /// Returns the package's conflicts.
    pub fn conflicts(&self) -> &[String] {
        &self.conflicts
    }

    /// Returns the package's installed size, in bytes.
    pub fn installed_size(&self) -> u64 {
        self.installed_size
    }

    /// Returns the package's maintainer.
    pub fn maintainer(&self) -> &str {
        &self.maintainer
    }

    /// Returns the package's description.
    pub fn description(&self) -> &str {
        &self.description
    }

    /// Returns the package's homepage.
    pub fn homepage(&self) -> &str {
        &self.homepage
    }

    /// Converts the control into a dpkg-readable control file.
    pub fn serialize(&self) -> Vec<u8> {
        self.to_string().into_bytes()
    }

    /// Reads a control file back.
    ///
    /// Continuation lines are joined with newlines, and a continuation line
    /// holding a lone `.` becomes an empty line.
    ///
    /// # Errors
    ///
    /// Fails with [`Error::InvalidField`] on a field this model doesn't know
    /// about, and [`Error::Malformed`] on lines that aren't fields at all.
    pub fn parse(input: &str) -> Result<Self> {
        let mut output = Self::default();
        let mut current: Option<(Field, String)> = None;

        for line in input.lines() {
            if line.trim().is_empty() {
                continue;
            }
            if line.starts_with(' ') || line.starts_with('\t') {
                let (_, value) = current.as_mut().ok_or_else(|| {
                    Error::Malformed(format!("continuation line without a field: `{}`", line))
                })?;
                let rest = &line[1..];
                value.push('\n');
                if rest != "." {
                    value.push_str(rest);
                }
                continue;
            }

            if let Some((field, value)) = current.take() {
                output.apply(field, value)?;
            }
            let (key, value) = line
                .split_once(':')
                .ok_or_else(|| Error::Malformed(format!("invalid control line `{}`", line)))?;
            current = Some((Field::from(key.trim())?, value.trim().to_string()));
        }
        if let Some((field, value)) = current.take() {
            output.apply(field, value)?;
        }

        Ok(output)
    }

    // Stores a raw field value read from a control file
    fn apply(&mut self, field: Field, value: String) -> Result<()> {
        let value = if field.is_relation() {
            FieldValue::List(
                value
                    .split(',')
                    .map(str::trim)
                    .filter(|relation| !relation.is_empty())
                    .map(str::to_string)
                    .collect(),
            )
        } else if field == Field::InstalledSize {
            let kib: u64 = value
                .trim()
                .parse()
                .map_err(|_| Error::InvalidValue(field.as_str().to_string()))?;
            let bytes = kib
                .checked_mul(1024)
                .ok_or_else(|| Error::InvalidValue(field.as_str().to_string()))?;
            FieldValue::Size(bytes)
        } else {
            FieldValue::Text(value)
        };
        self.set_field(field, value)
    }
}

impl fmt::Display for Control {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Package: {}", self.name)?;
        writeln!(f, "Version: {}", self.version)?;
        if !self.section.is_empty() {
            writeln!(f, "Section: {}", self.section)?;
        }
        writeln!(f, "Priority: {}", self.priority())?;
        writeln!(f, "Architecture: {}", self.architecture())?;
        let relations = [
            (Field::Depends, &self.depends),
            (Field::PreDepends, &self.pre_depends),
            (Field::Recommends, &self.recommends),
            (Field::Suggests, &self.suggests),
            (Field::Enhances, &self.enhances),
            (Field::Breaks, &self.breaks),
            (Field::Conflicts, &self.conflicts),
        ];
        for (field, relation) in relations {
            if !relation.is_empty() {
                writeln!(f, "{}: {}", field.as_str(), relation.join(", "))?;
            }
        }
        if self.installed_size > 0 {
            writeln!(f, "Installed-Size: {}", self.installed_size / 1024)?;
        }
        if !self.maintainer.is_empty() {
            writeln!(f, "Maintainer: {}", self.maintainer)?;
        }
        writeln!(f, "Description: {}", format_description(&self.description))?;
        if !self.homepage.is_empty() {
            writeln!(f, "Homepage: {}", self.homepage)?;
        }
        Ok(())
    }
}

fn or_default<'a>(value: &'a str, default: &'a str) -> &'a str {
    match value.is_empty() {
        true => default,
        false => value,
    }
}

/// Formats a description the way control files expect it: wrapped at
/// [`DESCRIPTION_WIDTH`] columns, with blank lines turned into a lone `.` and
/// every line after the first indented by one space.
pub fn format_description(description: &str) -> String {
    let description = description.trim();
    if description.is_empty() {
        return String::new();
    }

    let mut lines = Vec::new();
    for line in description.lines() {
        if line.trim().is_empty() {
            lines.push(".".to_string());
        } else {
            wrap_line(line, DESCRIPTION_WIDTH, &mut lines);
        }
    }
    lines.join("\n ")
}

// Greedy word wrap. Spacing inside a line is kept, except where the line is
// broken. Words longer than `width` are left whole.
fn wrap_line(line: &str, width: usize, out: &mut Vec<String>) {
    let mut wrap = Wrap {
        width,
        out,
        line: String::new(),
        line_len: 0,
        space: String::new(),
    };
    let mut word = String::new();

    for ch in line.chars() {
        if ch == ' ' || ch == '\t' {
            if !word.is_empty() {
                wrap.push_word(&word);
                word.clear();
            }
            wrap.space.push(ch);
        } else {
            word.push(ch);
        }
    }
    if !word.is_empty() {
        wrap.push_word(&word);
    }
    wrap.finish();
}

struct Wrap<'a> {
    width: usize,
    out: &'a mut Vec<String>,
    line: String,
    line_len: usize,
    space: String,
}

impl Wrap<'_> {
    fn push_word(&mut self, word: &str) {
        let word_len = word.chars().count();
        let space_len = self.space.chars().count();
        if self.line_len > 0 && self.line_len + space_len + word_len > self.width {
            self.out.push(std::mem::take(&mut self.line));
            self.line_len = 0;
        } else {
            self.line.push_str(&self.space);
            self.line_len += space_len;
        }
        self.space.clear();
        self.line.push_str(word);
        self.line_len += word_len;
    }

    fn finish(self) {
        if !self.line.is_empty() {
            self.out.push(self.line);
        }
    }
}
