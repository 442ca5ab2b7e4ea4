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

use crate::binary::*;
use crate::*;

const EMPTY: &str = "Package: \nVersion: 0.0.0\nPriority: extra\nArchitecture: all\nDescription: \n";

#[test]
fn control_empty() {
    assert_eq!(Control::new().to_string(), EMPTY);
}

#[test]
fn control_fields() {
    let mut control = Control::new();
    control
        .set_name("foo")
        .set_version("1.2.3")
        .set_section("admin")
        .set_priority("optional")
        .set_architecture("amd64")
        .set_depends(vec!["foo".to_string(), "bar (>= 1.2.3)".to_string()])
        .set_pre_depends(vec!["dpkg".to_string()])
        .set_recommends(vec!["baz".to_string()])
        .set_suggests(vec!["qux".to_string()])
        .set_enhances(vec!["quux".to_string()])
        .set_breaks(vec!["old-foo (<< 1.0)".to_string()])
        .set_conflicts(vec!["other-foo".to_string()])
        .set_installed_size(4096)
        .set_maintainer("Foo Bar <foo@example.org>")
        .set_description("foo utility")
        .set_homepage("https://example.org");

    let expected = "Package: foo
Version: 1.2.3
Section: admin
Priority: optional
Architecture: amd64
Depends: foo, bar (>= 1.2.3)
Pre-Depends: dpkg
Recommends: baz
Suggests: qux
Enhances: quux
Breaks: old-foo (<< 1.0)
Conflicts: other-foo
Installed-Size: 4
Maintainer: Foo Bar <foo@example.org>
Description: foo utility
Homepage: https://example.org
";
    assert_eq!(control.to_string(), expected);
    assert_eq!(control.serialize(), expected.as_bytes());
}

#[test]
fn control_defaults_survive_empty_values() {
    let mut control = Control::new();
    control.set_priority("").set_architecture("");
    assert_eq!(control.priority(), "extra");
    assert_eq!(control.architecture(), "all");
    assert_eq!(control.to_string(), EMPTY);
}

#[test]
fn control_installed_size_rounds_down() {
    let mut control = Control::new();
    control.add_installed_size(1000).add_installed_size(2000);
    assert_eq!(control.installed_size(), 3000);
    assert!(control.to_string().contains("Installed-Size: 2\n"));
}

#[test]
fn control_description_wrap() {
    let words = vec!["word"; 20].join(" ");
    let mut control = Control::new();
    control.set_description(&format!("  Summary\n\n{}\n", words));

    let expected = format!(
        "Package: \nVersion: 0.0.0\nPriority: extra\nArchitecture: all\nDescription: Summary\n .\n {}\n {}\n",
        vec!["word"; 15].join(" "),
        vec!["word"; 5].join(" "),
    );
    assert_eq!(control.to_string(), expected);
}

#[test]
fn description_lines_fit() {
    let text = "Lorem ipsum dolor sit amet, consectetur adipiscing elit, sed do eiusmod \
                tempor incididunt ut labore et dolore magna aliqua. Ut enim ad minim veniam, \
                quis nostrud exercitation ullamco laboris nisi ut aliquip ex ea commodo.";
    let formatted = format_description(text);
    let lines: Vec<&str> = formatted.split("\n ").collect();
    assert!(lines.len() > 1);
    for line in &lines {
        assert!(line.chars().count() <= DESCRIPTION_WIDTH, "too long: {:?}", line);
    }
    assert_eq!(lines.join(" "), text);
}

#[test]
fn description_long_word_is_kept() {
    let word = "x".repeat(100);
    assert_eq!(format_description(&format!("short {}", word)), format!("short\n {}", word));
}

#[test]
fn control_set() -> Result<()> {
    let mut control = Control::new();
    control.set("Name", "foo")?;
    control.set("Version", "1.2.3".to_string())?;
    control.set("PreDepends", vec!["dpkg"])?;
    control.set("depends", vec!["libc6".to_string()])?;
    control.set("Installed-Size", 2048u64)?;
    control.set("Description", "foo utility")?;

    assert_eq!(control.name(), "foo");
    assert_eq!(control.version(), "1.2.3");
    assert_eq!(control.pre_depends(), ["dpkg".to_string()]);
    assert_eq!(control.depends(), ["libc6".to_string()]);
    assert_eq!(control.installed_size(), 2048);
    assert_eq!(control.description(), "foo utility");
    Ok(())
}

#[test]
fn control_set_invalid() {
    let mut control = Control::new();
    assert!(matches!(
        control.set("Essential", "yes"),
        Err(Error::InvalidField(field)) if field == "Essential"
    ));
    assert!(matches!(
        control.set("Depends", "foo"),
        Err(Error::InvalidValue(field)) if field == "Depends"
    ));
    assert!(matches!(
        control.set("Maintainer", vec!["foo"]),
        Err(Error::InvalidValue(_))
    ));
    assert!(matches!(
        control.set("Installed-Size", "12"),
        Err(Error::InvalidValue(_))
    ));
    assert!(matches!(
        control.set("Homepage", 12u64),
        Err(Error::InvalidValue(_))
    ));
    assert_eq!(control, Control::new());
}

#[test]
fn control_parse() -> Result<()> {
    let mut control = Control::new();
    control
        .set_name("foo")
        .set_version("1:1.2.3-1")
        .set_architecture("arm64")
        .set_depends(vec!["libc6 (>= 2.31)".to_string(), "zlib1g".to_string()])
        .set_installed_size(10240)
        .set_description(&format!("Summary\n\n{}", vec!["word"; 20].join(" ")));
    let text = control.to_string();

    let parsed = Control::parse(&text)?;
    assert_eq!(parsed.name(), "foo");
    assert_eq!(parsed.version(), "1:1.2.3-1");
    assert_eq!(parsed.architecture(), "arm64");
    assert_eq!(parsed.depends(), control.depends());
    assert_eq!(parsed.installed_size(), 10240);
    assert!(parsed.description().starts_with("Summary\n\nword"));
    assert_eq!(parsed.to_string(), text);
    Ok(())
}

#[test]
fn control_parse_invalid() {
    assert!(matches!(
        Control::parse("Package: foo\nEssential: yes\n"),
        Err(Error::InvalidField(_))
    ));
    assert!(matches!(
        Control::parse(" orphan continuation\n"),
        Err(Error::Malformed(_))
    ));
    assert!(matches!(
        Control::parse("Package foo\n"),
        Err(Error::Malformed(_))
    ));
    assert!(matches!(
        Control::parse("Package: foo\nInstalled-Size: 18446744073709551615\n"),
        Err(Error::InvalidValue(_))
    ));
    assert!(matches!(
        Control::parse("Package: foo\nInstalled-Size: lots\n"),
        Err(Error::InvalidValue(_))
    ));
}

#[test]
fn version_rendering() {
    assert_eq!(Version::new(0, "1.2.3", "").to_string(), "1.2.3");
    assert_eq!(Version::new(1, "1.2.3", "").to_string(), "1:1.2.3");
    assert_eq!(Version::new(0, "1.2.3", "1").to_string(), "1.2.3-1");
    assert_eq!(Version::new(1, "1.2.3", "1").to_string(), "1:1.2.3-1");
    assert_eq!(Version::new(1, "1.2.3", "1").without_epoch(), "1.2.3-1");
}

#[test]
fn version_parsing() -> Result<()> {
    assert_eq!("1.2.3".parse::<Version>()?, Version::new(0, "1.2.3", ""));
    assert_eq!("1:1.2.3".parse::<Version>()?, Version::new(1, "1.2.3", ""));
    assert_eq!("1.2.3-1".parse::<Version>()?, Version::new(0, "1.2.3", "1"));
    assert_eq!(
        "2:1.0-rc1-0ubuntu1".parse::<Version>()?,
        Version::new(2, "1.0-rc1", "0ubuntu1")
    );
    assert_eq!(
        "1.2.3-1~mkdeb1".parse::<Version>()?,
        Version::new(0, "1.2.3", "1~mkdeb1")
    );
    assert!(matches!("".parse::<Version>(), Err(Error::InvalidVersion(_))));
    assert!(matches!("abc".parse::<Version>(), Err(Error::InvalidVersion(_))));
    assert!(matches!("1.0 beta".parse::<Version>(), Err(Error::InvalidVersion(_))));
    Ok(())
}
