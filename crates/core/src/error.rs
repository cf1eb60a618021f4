// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Error taxonomy for store operations
//!
//! Validation errors are raised before any commit; io errors may surface
//! after a partial commit (sections are independently atomic).

use crate::attrs::Section;
use std::path::PathBuf;
use thiserror::Error;

/// Errors from the attribute store
#[derive(Debug, Error)]
pub enum Error {
    #[error("key not found: {0}")]
    NotFound(String),
    #[error("invalid key {0:?}: {1}")]
    InvalidKey(String, &'static str),
    #[error("invalid value for {0:?}: {1}")]
    InvalidValue(String, &'static str),
    #[error("key {key:?} not allowed in {section} section")]
    PrefixViolation { key: String, section: Section },
    #[error("system section is write locked")]
    SystemLocked,
    #[error("init is disabled")]
    InitDisabled,
    #[error("attribute {0:?} not in valid attribute list")]
    NotWhitelisted(String),
    #[error("{}: malformed line {line}", path.display())]
    MalformedInput { path: PathBuf, line: usize },
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("{0} section corrupt: no copy decodes")]
    CorruptStore(Section),
    #[error("{0} section is disabled")]
    DisabledSection(Section),
    #[error("entry too large: {0:?}")]
    EntryTooLarge(String),
    #[error("invalid request: {0}")]
    InvalidRequest(&'static str),
    #[error("invalid configuration: {0}")]
    Config(String),
    #[error("{format} format: {message}")]
    Format {
        format: &'static str,
        message: String,
    },
}
