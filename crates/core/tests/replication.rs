// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Integration tests for crash and corruption tolerance
//!
//! Each test drives the manager the way the CLI does: one manager per
//! invocation, damage injected between invocations.

use nvram_core::config::{ENV_SYSTEM_A, ENV_SYSTEM_B, ENV_USER_A, ENV_USER_B};
use nvram_core::{Config, Error, Op, Output, Request, StoreManager};
use std::collections::HashMap;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

fn invoke(dir: &TempDir, system_mode: bool, ops: Vec<Op>) -> Result<Vec<Output>, Error> {
    let mut vars: HashMap<String, String> = HashMap::new();
    for (key, name) in [
        (ENV_USER_A, "user_a"),
        (ENV_USER_B, "user_b"),
        (ENV_SYSTEM_A, "system_a"),
        (ENV_SYSTEM_B, "system_b"),
    ] {
        vars.insert(
            key.to_string(),
            dir.path().join(name).to_string_lossy().into_owned(),
        );
    }
    let config = Config::from_lookup(move |key| vars.get(key).cloned()).unwrap();
    let mut mgr = StoreManager::open(&config)?;
    mgr.execute(&Request { system_mode, ops })
        .map(|response| response.outputs)
}

fn set(key: &str, value: &str) -> Op {
    Op::Set {
        key: key.to_string(),
        value: value.to_string(),
    }
}

fn get(key: &str) -> Op {
    Op::Get {
        key: key.to_string(),
    }
}

fn get_value(dir: &TempDir, key: &str) -> String {
    match invoke(dir, false, vec![get(key)]).unwrap().remove(0) {
        Output::Value(v) => v,
        other => panic!("unexpected output: {other:?}"),
    }
}

fn counter_of(path: &Path) -> u64 {
    nvram_core::blob::decode(&fs::read(path).unwrap())
        .unwrap()
        .counter
}

#[test]
fn survives_truncation_of_either_copy() {
    let dir = TempDir::new().unwrap();
    invoke(&dir, false, vec![set("k", "v1")]).unwrap();

    for name in ["user_a", "user_b"] {
        let path = dir.path().join(name);
        let saved = fs::read(&path).unwrap();
        fs::write(&path, b"").unwrap();
        assert_eq!(get_value(&dir, "k"), "v1");
        fs::write(&path, &saved).unwrap();
    }
}

#[test]
fn heals_after_truncation_and_advances_counter_by_one() {
    let dir = TempDir::new().unwrap();
    invoke(&dir, false, vec![set("k", "v1")]).unwrap();
    fs::write(dir.path().join("user_a"), b"").unwrap();

    assert_eq!(get_value(&dir, "k"), "v1");
    invoke(&dir, false, vec![set("k", "v2")]).unwrap();

    let counter_a = counter_of(&dir.path().join("user_a"));
    let counter_b = counter_of(&dir.path().join("user_b"));
    assert_eq!(counter_a.abs_diff(counter_b), 1);
    assert_eq!(get_value(&dir, "k"), "v2");
}

#[test]
fn interrupted_write_leaves_previous_state() {
    let dir = TempDir::new().unwrap();
    invoke(&dir, false, vec![set("k", "v1")]).unwrap();
    invoke(&dir, false, vec![set("k", "v2")]).unwrap();

    // a crash between temp write and rename leaves a partial temp file
    // next to whichever slot the next commit targets
    fs::write(dir.path().join("user_a.tmp"), b"partial write junk").unwrap();

    assert_eq!(get_value(&dir, "k"), "v2");
    invoke(&dir, false, vec![set("k", "v3")]).unwrap();
    assert_eq!(get_value(&dir, "k"), "v3");
    assert!(!dir.path().join("user_a.tmp").exists());
}

#[test]
fn bit_rot_in_one_copy_is_invisible_and_healed() {
    let dir = TempDir::new().unwrap();
    invoke(&dir, false, vec![set("k", "v1")]).unwrap();
    invoke(&dir, false, vec![set("k", "v2")]).unwrap();

    // flip a byte in the live copy (B after the second commit)
    let path = dir.path().join("user_b");
    let mut bytes = fs::read(&path).unwrap();
    let last = bytes.len() - 1;
    bytes[last] ^= 0xff;
    fs::write(&path, &bytes).unwrap();

    // falls back to the stale copy's state
    assert_eq!(get_value(&dir, "k"), "v1");

    invoke(&dir, false, vec![set("k", "v4")]).unwrap();
    assert_eq!(get_value(&dir, "k"), "v4");
    assert!(nvram_core::blob::decode(&fs::read(dir.path().join("user_a")).unwrap()).is_some());
    assert!(nvram_core::blob::decode(&fs::read(dir.path().join("user_b")).unwrap()).is_some());
}

#[test]
fn counters_order_invocations() {
    let dir = TempDir::new().unwrap();
    for i in 0..6 {
        invoke(&dir, false, vec![set("k", &format!("v{i}"))]).unwrap();
    }
    let counter_a = counter_of(&dir.path().join("user_a"));
    let counter_b = counter_of(&dir.path().join("user_b"));
    assert_eq!(counter_a.max(counter_b), 6);
    assert_eq!(counter_a.abs_diff(counter_b), 1);
    assert_eq!(get_value(&dir, "k"), "v5");
}

#[test]
fn sections_commit_independently() {
    let dir = TempDir::new().unwrap();
    invoke(&dir, false, vec![set("k", "user-val")]).unwrap();

    // system section untouched by user commits
    assert!(!dir.path().join("system_a").exists());
    assert!(!dir.path().join("system_b").exists());
}
