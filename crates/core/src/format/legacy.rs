// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Legacy line-oriented text format
//!
//! One entry per line, `KEY=VALUE`, trailing newline optional. The same
//! parser serves init-file ingestion under every format. Unlike the
//! default codec, a malformed file is an error rather than a silent
//! fall-back to the other copy; there is no other copy.

use crate::attrs::{AttrMap, Section};
use crate::copy::CopyFile;
use crate::error::Error;
use crate::section::SectionStore;
use std::path::Path;

/// Parse legacy-format text. Empty and whitespace-only lines are
/// skipped; the first malformed line (no `=`, empty key, empty value)
/// aborts with its line number. Repeated keys behave as repeated
/// assignments.
pub fn parse(text: &str, path: &Path) -> Result<Vec<(String, String)>, Error> {
    let mut entries = Vec::new();
    for (idx, raw) in text.lines().enumerate() {
        let line = raw.trim_start();
        if line.is_empty() {
            continue;
        }
        let malformed = || Error::MalformedInput {
            path: path.to_path_buf(),
            line: idx + 1,
        };
        let eq = line.find('=').ok_or_else(malformed)?;
        let (key, value) = (&line[..eq], &line[eq + 1..]);
        if key.is_empty() || value.is_empty() {
            return Err(malformed());
        }
        entries.push((key.to_string(), value.to_string()));
    }
    Ok(entries)
}

fn render(image: &AttrMap) -> String {
    let mut out = String::new();
    for (key, value) in image {
        out.push_str(key);
        out.push('=');
        out.push_str(value);
        out.push('\n');
    }
    out
}

/// Single-copy section store over the legacy text encoding
pub struct LegacyStore {
    section: Section,
    file: CopyFile,
    image: AttrMap,
}

impl LegacyStore {
    pub fn open(section: Section, file: CopyFile) -> Result<Self, Error> {
        let image = match file.read()? {
            None => AttrMap::new(),
            Some(bytes) if bytes.is_empty() => AttrMap::new(),
            Some(bytes) => {
                let text = String::from_utf8(bytes).map_err(|_| Error::MalformedInput {
                    path: file.path().to_path_buf(),
                    line: 1,
                })?;
                parse(&text, file.path())?.into_iter().collect()
            }
        };
        Ok(Self {
            section,
            file,
            image,
        })
    }
}

impl SectionStore for LegacyStore {
    fn section(&self) -> Section {
        self.section
    }

    fn entries(&self) -> &AttrMap {
        &self.image
    }

    fn commit(&mut self, image: AttrMap) -> Result<(), Error> {
        self.file.write(render(&image).as_bytes())?;
        self.image = image;
        Ok(())
    }
}

#[cfg(test)]
#[path = "legacy_tests.rs"]
mod tests;
