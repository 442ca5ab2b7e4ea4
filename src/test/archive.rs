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

use std::io::{ErrorKind, Read, Write};

use crate::archive::*;
use crate::test::test_time;
use crate::*;

fn sample() -> Vec<(Header, Vec<u8>)> {
    vec![
        (Header::directory("dir/", 0o755, test_time()), Vec::new()),
        (
            Header::file("dir/file1", 4, 0o644, test_time()),
            b"foo\n".to_vec(),
        ),
        (Header::file("dir/file2", 0, 0o600, test_time()), Vec::new()),
        (Header::symlink("link", "dir/file1", test_time()), Vec::new()),
    ]
}

fn write_sample(compression: Compression) -> Result<Vec<u8>> {
    let mut writer = Writer::buffer(compression)?;
    for (header, contents) in sample() {
        writer.append(&header, contents.as_slice())?;
    }
    writer.close()
}

fn read_all(bytes: &[u8], compression: Compression) -> Result<Vec<(Header, Vec<u8>)>> {
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

// Plain tar archive written straight through the tar crate
fn plain_tar() -> Vec<u8> {
    let mut builder = tar::Builder::new(Vec::new());

    let mut header = tar::Header::new_gnu();
    header.as_old_mut().name[..4].copy_from_slice(b"dir/");
    header.set_entry_type(tar::EntryType::Directory);
    header.set_mode(0o755);
    header.set_size(0);
    header.set_mtime(test_time().timestamp() as u64);
    header.set_cksum();
    builder.append(&header, std::io::empty()).unwrap();

    let mut header = tar::Header::new_gnu();
    header.set_mode(0o644);
    header.set_size(4);
    header.set_mtime(test_time().timestamp() as u64);
    builder
        .append_data(&mut header, "dir/file1", &b"foo\n"[..])
        .unwrap();

    builder.into_inner().unwrap()
}

fn check_plain(entries: &[(Header, Vec<u8>)]) {
    assert_eq!(entries.len(), 2);
    assert_eq!(entries[0].0.name, "dir/");
    assert!(entries[0].0.is_dir());
    assert_eq!(entries[0].0.mode, MODE_DIR | 0o755);
    assert_eq!(entries[1].0.name, "dir/file1");
    assert_eq!(entries[1].0.size, 4);
    assert_eq!(entries[1].0.mode, MODE_REGULAR | 0o644);
    assert_eq!(entries[1].0.mod_time, test_time());
    assert_eq!(entries[1].1, b"foo\n");
}

#[test]
fn gzip_round_trip() -> Result<()> {
    let bytes = write_sample(Compression::Gzip)?;
    assert_eq!(Compression::sniff(&bytes), Some(Compression::Gzip));
    assert_eq!(read_all(&bytes, Compression::Gzip)?, sample());
    Ok(())
}

#[test]
fn xz_round_trip() -> Result<()> {
    let bytes = write_sample(Compression::Xz)?;
    assert_eq!(Compression::sniff(&bytes), Some(Compression::Xz));
    assert_eq!(read_all(&bytes, Compression::Xz)?, sample());
    Ok(())
}

#[test]
fn read_uncompressed() -> Result<()> {
    let bytes = plain_tar();
    assert_eq!(Compression::sniff(&bytes), None);
    check_plain(&read_all(&bytes, Compression::None)?);
    Ok(())
}

#[test]
fn read_bzip2() -> Result<()> {
    let mut encoder = bzip2::write::BzEncoder::new(Vec::new(), bzip2::Compression::default());
    encoder.write_all(&plain_tar())?;
    let bytes = encoder.finish()?;
    assert_eq!(Compression::sniff(&bytes), Some(Compression::Bzip2));
    check_plain(&read_all(&bytes, Compression::Bzip2)?);
    Ok(())
}

#[test]
fn read_malformed_gzip() {
    let result = Reader::new(&b"definitely not gzip"[..], Compression::Gzip);
    assert!(matches!(result, Err(Error::Io(_))));
}

#[test]
fn unsupported_compression() {
    assert!(matches!(
        Writer::new(Vec::new(), Compression::None),
        Err(Error::UnsupportedCompression(_))
    ));
    assert!(matches!(
        Writer::buffer(Compression::Bzip2),
        Err(Error::UnsupportedCompression(_))
    ));
    assert!(matches!(
        Compression::try_from(42u8),
        Err(Error::UnsupportedCompression(_))
    ));
    assert_eq!(Compression::try_from(3u8).unwrap(), Compression::Xz);
    assert!(matches!(
        Compression::from_file_name("data.tar.zst"),
        Err(Error::UnsupportedCompression(_))
    ));
    assert_eq!(
        Compression::from_file_name("control.tar.gz").unwrap(),
        Compression::Gzip
    );
}

#[test]
fn unread_payload_is_skipped() -> Result<()> {
    let bytes = write_sample(Compression::Gzip)?;
    let mut reader = Reader::new(bytes.as_slice(), Compression::Gzip)?;
    let mut entries = reader.entries()?;

    entries.next().unwrap()?;
    let mut file1 = entries.next().unwrap()?;
    let mut buf = [0u8; 2];
    file1.read_exact(&mut buf)?;
    assert_eq!(&buf, b"fo");
    drop(file1);

    let mut file2 = entries.next().unwrap()?;
    assert_eq!(file2.header().name, "dir/file2");
    let mut rest = Vec::new();
    assert_eq!(file2.read_to_end(&mut rest)?, 0);
    drop(file2);

    assert_eq!(entries.next().unwrap()?.header().name, "link");
    assert!(entries.next().is_none());
    Ok(())
}

#[test]
fn long_names_are_kept() -> Result<()> {
    let name = format!("./{}/file", "nested".repeat(30));
    let target = format!("../{}", "target".repeat(25));
    let entries = vec![
        (
            Header::file(&name, 3, 0o644, test_time()),
            b"abc".to_vec(),
        ),
        (
            Header::symlink(&format!("{}-link", name), &target, test_time()),
            Vec::new(),
        ),
    ];

    let mut writer = Writer::buffer(Compression::Xz)?;
    for (header, contents) in &entries {
        writer.append(header, contents.as_slice())?;
    }
    let bytes = writer.close()?;

    assert_eq!(read_all(&bytes, Compression::Xz)?, entries);
    Ok(())
}

#[test]
fn short_payload_fails() -> Result<()> {
    let mut writer = Writer::buffer(Compression::Gzip)?;
    let header = Header::file("short", 10, 0o644, test_time());
    match writer.append(&header, &b"abc"[..]) {
        Err(Error::Io(e)) => assert_eq!(e.kind(), ErrorKind::UnexpectedEof),
        other => panic!("unexpected result: {:?}", other),
    }
    Ok(())
}

#[test]
fn header_to_tar() -> Result<()> {
    let dir = Header::directory("dir", 0o755, test_time()).to_tar()?;
    assert_eq!(dir.entry_type(), tar::EntryType::Directory);
    assert_eq!(&*dir.path_bytes(), b"dir/");
    assert_eq!(dir.username().unwrap(), Some("root"));

    let link = Header::symlink("./link", "target", test_time()).to_tar()?;
    assert_eq!(link.entry_type(), tar::EntryType::Symlink);
    assert_eq!(&*link.path_bytes(), b"./link");
    assert_eq!(&*link.link_name_bytes().unwrap(), b"target");
    assert_eq!(link.size()?, 0);

    let file = Header::file("./file", 7, 0o644, test_time()).to_tar()?;
    assert_eq!(file.entry_type(), tar::EntryType::Regular);
    assert_eq!(file.size()?, 7);
    assert_eq!(file.mode()?, 0o644);
    assert_eq!(file.mtime()?, test_time().timestamp() as u64);
    Ok(())
}

#[test]
fn directory_names_read_back_unchanged() -> Result<()> {
    let written = vec![
        Header::directory("dir", 0o755, test_time()),
        Header::directory("./nested/dir//", 0o700, test_time()),
    ];
    assert_eq!(written[0].name, "dir/");
    assert_eq!(written[1].name, "./nested/dir/");

    let mut writer = Writer::buffer(Compression::Gzip)?;
    for header in &written {
        writer.append(header, std::io::empty())?;
    }
    let bytes = writer.close()?;
    let read: Vec<Header> = read_all(&bytes, Compression::Gzip)?
        .into_iter()
        .map(|(header, _)| header)
        .collect();
    assert_eq!(read, written);
    Ok(())
}

#[test]
fn header_file_info() {
    let header = Header::directory("path/to/dir/", 0o755, test_time());
    let info = header.file_info();
    assert_eq!(info.name(), "dir");
    assert_eq!(info.size(), 0);
    assert_eq!(info.mode(), MODE_DIR | 0o755);
    assert_eq!(info.permissions(), 0o755);
    assert_eq!(info.mod_time(), test_time());
    assert!(info.is_dir());

    let info = Header::file("file1", 4, 0o644, test_time()).file_info();
    assert_eq!(info.name(), "file1");
    assert_eq!(info.size(), 4);
    assert!(!info.is_dir());
}
