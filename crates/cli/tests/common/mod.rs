// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Shared test utilities for CLI integration tests.

#![allow(dead_code)]

use assert_cmd::Command;
use std::path::PathBuf;
use tempfile::TempDir;

/// Unlock token matching the compiled-in value
pub const UNLOCK_TOKEN: &str = "16440";

/// Environment variables the tests control; cleared from the ambient
/// environment so runs are hermetic
const CONTROLLED_ENV: &[&str] = &[
    "NVRAM_SYSTEM_A",
    "NVRAM_SYSTEM_B",
    "NVRAM_USER_A",
    "NVRAM_USER_B",
    "NVRAM_SYSTEM_UNLOCK",
    "NVRAM_ALLOW_ALL_PREFIXES",
    "NVRAM_INIT_ENABLED",
    "NVRAM_VALID_ATTRIBUTES",
    "NVRAM_FORMAT",
    "NVRAM_DEBUG",
    "RUST_LOG",
];

/// A temp directory holding all four copy files for one test store
pub struct TestStore {
    temp: TempDir,
}

impl TestStore {
    pub fn new() -> Self {
        Self {
            temp: TempDir::new().expect("failed to create temp directory"),
        }
    }

    pub fn path(&self, name: &str) -> PathBuf {
        self.temp.path().join(name)
    }

    /// A `nvram` invocation with copy paths pointing into the temp dir
    pub fn cmd(&self) -> Command {
        let mut cmd = Command::cargo_bin("nvram").expect("nvram binary");
        for key in CONTROLLED_ENV {
            cmd.env_remove(key);
        }
        cmd.env("NVRAM_USER_A", self.path("user_a"));
        cmd.env("NVRAM_USER_B", self.path("user_b"));
        cmd.env("NVRAM_SYSTEM_A", self.path("system_a"));
        cmd.env("NVRAM_SYSTEM_B", self.path("system_b"));
        cmd
    }

    /// Same as `cmd` but with the system section unlocked
    pub fn unlocked_cmd(&self) -> Command {
        let mut cmd = self.cmd();
        cmd.env("NVRAM_SYSTEM_UNLOCK", UNLOCK_TOKEN);
        cmd
    }
}
