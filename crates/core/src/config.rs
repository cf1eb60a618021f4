// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Process configuration read once at startup
//!
//! All knobs come from the environment; the resulting [`Config`] is passed
//! by value into the store manager. Nothing reads the environment after
//! startup.

use crate::error::Error;
use crate::format::FormatKind;
use std::env;
use std::path::PathBuf;

pub const ENV_SYSTEM_A: &str = "NVRAM_SYSTEM_A";
pub const ENV_SYSTEM_B: &str = "NVRAM_SYSTEM_B";
pub const ENV_USER_A: &str = "NVRAM_USER_A";
pub const ENV_USER_B: &str = "NVRAM_USER_B";
pub const ENV_SYSTEM_UNLOCK: &str = "NVRAM_SYSTEM_UNLOCK";
pub const ENV_ALLOW_ALL_PREFIXES: &str = "NVRAM_ALLOW_ALL_PREFIXES";
pub const ENV_INIT_ENABLED: &str = "NVRAM_INIT_ENABLED";
pub const ENV_VALID_ATTRIBUTES: &str = "NVRAM_VALID_ATTRIBUTES";
pub const ENV_FORMAT: &str = "NVRAM_FORMAT";
pub const ENV_DEBUG: &str = "NVRAM_DEBUG";

/// Token an operator must supply to mutate the system section.
/// A production/development fence, not a security boundary.
pub const SYSTEM_UNLOCK_TOKEN: &str = "16440";

const DEFAULT_SYSTEM_A: &str = "/var/lib/nvram/system_a";
const DEFAULT_SYSTEM_B: &str = "/var/lib/nvram/system_b";
const DEFAULT_USER_A: &str = "/var/lib/nvram/user_a";
const DEFAULT_USER_B: &str = "/var/lib/nvram/user_b";

/// Resolved process configuration
#[derive(Debug, Clone)]
pub struct Config {
    pub format: FormatKind,
    /// Copy paths; `None` means the copy slot is disabled
    pub system_a: Option<PathBuf>,
    pub system_b: Option<PathBuf>,
    pub user_a: Option<PathBuf>,
    pub user_b: Option<PathBuf>,
    /// True when the unlock token matched the configured value
    pub system_unlocked: bool,
    pub allow_all_prefixes: bool,
    pub init_enabled: bool,
    /// Colon-separated whitelist; when present every key written must appear
    pub valid_attributes: Option<Vec<String>>,
    pub debug: bool,
}

impl Config {
    /// Read configuration from the process environment
    pub fn from_env() -> Result<Self, Error> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Read configuration through a lookup closure (testable without
    /// mutating the process environment)
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, Error> {
        let format = match lookup(ENV_FORMAT).as_deref() {
            None | Some("") | Some("default") => FormatKind::Default,
            Some("legacy") => FormatKind::Legacy,
            Some("platform") => FormatKind::Platform,
            Some(other) => {
                return Err(Error::Config(format!(
                    "unknown {ENV_FORMAT} value: {other:?}"
                )))
            }
        };

        let system_unlocked = lookup(ENV_SYSTEM_UNLOCK).as_deref() == Some(SYSTEM_UNLOCK_TOKEN);

        let valid_attributes = match lookup(ENV_VALID_ATTRIBUTES).as_deref() {
            None | Some("") | Some("none") => None,
            Some(list) => Some(
                list.split(':')
                    .filter(|name| !name.is_empty())
                    .map(str::to_string)
                    .collect(),
            ),
        };

        let debug = lookup(ENV_DEBUG)
            .and_then(|v| v.parse::<i64>().ok())
            .unwrap_or(0)
            != 0;

        Ok(Self {
            format,
            system_a: copy_path(&lookup, ENV_SYSTEM_A, DEFAULT_SYSTEM_A),
            system_b: copy_path(&lookup, ENV_SYSTEM_B, DEFAULT_SYSTEM_B),
            user_a: copy_path(&lookup, ENV_USER_A, DEFAULT_USER_A),
            user_b: copy_path(&lookup, ENV_USER_B, DEFAULT_USER_B),
            system_unlocked,
            allow_all_prefixes: yes(&lookup, ENV_ALLOW_ALL_PREFIXES),
            init_enabled: yes(&lookup, ENV_INIT_ENABLED),
            valid_attributes,
            debug,
        })
    }
}

/// An empty path means "this copy is disabled"
fn copy_path(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &str,
    default: &str,
) -> Option<PathBuf> {
    match lookup(key) {
        Some(path) if path.is_empty() => None,
        Some(path) => Some(PathBuf::from(path)),
        None => Some(PathBuf::from(default)),
    }
}

fn yes(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> bool {
    lookup(key).as_deref() == Some("yes")
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
