// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

fn parse_ok(text: &str) -> Vec<(String, String)> {
    parse(text, Path::new("init.conf")).unwrap()
}

#[test]
fn parses_simple_rows() {
    let entries = parse_ok("SYS_PRODUCT_ID=20-19602\nSYS_PRODUCT_DATE=20221107\n");
    assert_eq!(
        entries,
        vec![
            ("SYS_PRODUCT_ID".to_string(), "20-19602".to_string()),
            ("SYS_PRODUCT_DATE".to_string(), "20221107".to_string()),
        ]
    );
}

#[test]
fn trailing_newline_is_optional() {
    let entries = parse_ok("k=v");
    assert_eq!(entries, vec![("k".to_string(), "v".to_string())]);
}

#[test]
fn skips_empty_and_whitespace_lines() {
    let entries = parse_ok("\n  \nk=v\n\t\nother=1\n");
    assert_eq!(entries.len(), 2);
}

#[test]
fn value_may_contain_equals() {
    let entries = parse_ok("formula=a=b\n");
    assert_eq!(entries[0].1, "a=b");
}

#[test]
fn malformed_line_reports_line_number() {
    let err = parse("good=1\nno separator\n", Path::new("f")).unwrap_err();
    assert!(matches!(err, Error::MalformedInput { line: 2, .. }));
}

#[test]
fn empty_key_is_malformed() {
    assert!(parse("=value\n", Path::new("f")).is_err());
}

#[test]
fn empty_value_is_malformed() {
    assert!(parse("key=\n", Path::new("f")).is_err());
}

#[test]
fn repeated_key_last_wins_in_store() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("user_a");
    std::fs::write(&path, "k=first\nk=second\n").unwrap();

    let store = LegacyStore::open(Section::User, CopyFile::new(&path)).unwrap();
    assert_eq!(store.entries().get("k").map(String::as_str), Some("second"));
}

#[test]
fn store_roundtrip() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("user_a");

    let mut store = LegacyStore::open(Section::User, CopyFile::new(&path)).unwrap();
    assert!(store.entries().is_empty());

    let image: AttrMap = [("alpha", "1"), ("beta", "two words")]
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    store.commit(image.clone()).unwrap();

    let text = std::fs::read_to_string(&path).unwrap();
    assert_eq!(text, "alpha=1\nbeta=two words\n");

    let reopened = LegacyStore::open(Section::User, CopyFile::new(&path)).unwrap();
    assert_eq!(*reopened.entries(), image);
}

#[test]
fn corrupt_file_is_an_open_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("user_a");
    std::fs::write(&path, "not a row at all\n").unwrap();
    assert!(LegacyStore::open(Section::User, CopyFile::new(&path)).is_err());
}
