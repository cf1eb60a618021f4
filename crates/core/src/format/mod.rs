// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! On-disk format selection
//!
//! The default format is the replicated A/B blob store. The legacy and
//! platform formats are single-copy alternative encodings kept for
//! existing deployments; both refuse a configured B slot.

pub mod legacy;
pub mod platform;

use crate::attrs::Section;
use crate::copy::CopyFile;
use crate::error::Error;
use crate::section::{ReplicatedStore, SectionStore};
use legacy::LegacyStore;
use platform::PlatformStore;
use std::path::PathBuf;

/// Selected on-disk encoder
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormatKind {
    Default,
    Legacy,
    Platform,
}

/// Open one section's store under the selected format.
///
/// Returns `Ok(None)` when both copy paths are disabled; operations
/// routed to such a section fail upstream.
pub fn open_section(
    format: FormatKind,
    section: Section,
    path_a: Option<PathBuf>,
    path_b: Option<PathBuf>,
) -> Result<Option<Box<dyn SectionStore>>, Error> {
    if path_a.is_none() && path_b.is_none() {
        return Ok(None);
    }

    let store: Box<dyn SectionStore> = match format {
        FormatKind::Default => Box::new(ReplicatedStore::open(
            section,
            path_a.map(CopyFile::new),
            path_b.map(CopyFile::new),
        )?),
        FormatKind::Legacy => Box::new(LegacyStore::open(
            section,
            single_copy("legacy", section, path_a, path_b)?,
        )?),
        FormatKind::Platform => Box::new(PlatformStore::open(
            section,
            single_copy("platform", section, path_a, path_b)?,
        )?),
    };
    Ok(Some(store))
}

/// Legacy and platform formats support a single (A) copy only
fn single_copy(
    format: &'static str,
    section: Section,
    path_a: Option<PathBuf>,
    path_b: Option<PathBuf>,
) -> Result<CopyFile, Error> {
    if path_b.is_some() {
        return Err(Error::Format {
            format,
            message: format!("{section} section: single (A) copy only"),
        });
    }
    match path_a {
        Some(path) => Ok(CopyFile::new(path)),
        None => Err(Error::Format {
            format,
            message: format!("{section} section: copy A required"),
        }),
    }
}
