// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Container codec for the default on-disk format
//!
//! A blob is a fixed header followed by a length-prefixed entry body:
//!
//! ```text
//! magic (4) | version (4, LE) | counter (8, LE) | body len (4, LE) | crc32 (4, LE)
//! body: repeated { key len (2, BE) | key | value len (2, BE) | value }
//! ```
//!
//! The generation counter sits in the header, before the CRC, so copy
//! selection can compare counters without hashing bodies. The CRC covers
//! the body only.

use crate::attrs::AttrMap;
use crate::error::Error;

pub const MAGIC: [u8; 4] = *b"NVAT";
pub const FORMAT_VERSION: u32 = 1;
pub const HEADER_LEN: usize = 24;

/// A decoded section image with its generation counter
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Blob {
    pub counter: u64,
    pub entries: AttrMap,
}

/// Encode an attribute image under the given generation counter.
///
/// Fails only when an entry exceeds the u16 length fields; callers
/// validate sizes long before this point.
pub fn encode(entries: &AttrMap, counter: u64) -> Result<Vec<u8>, Error> {
    let mut body = Vec::new();
    for (key, value) in entries {
        let key_len =
            u16::try_from(key.len()).map_err(|_| Error::EntryTooLarge(key.clone()))?;
        let value_len =
            u16::try_from(value.len()).map_err(|_| Error::EntryTooLarge(key.clone()))?;
        body.extend_from_slice(&key_len.to_be_bytes());
        body.extend_from_slice(key.as_bytes());
        body.extend_from_slice(&value_len.to_be_bytes());
        body.extend_from_slice(value.as_bytes());
    }

    let body_len = u32::try_from(body.len())
        .map_err(|_| Error::EntryTooLarge("section body".to_string()))?;

    let mut out = Vec::with_capacity(HEADER_LEN + body.len());
    out.extend_from_slice(&MAGIC);
    out.extend_from_slice(&FORMAT_VERSION.to_le_bytes());
    out.extend_from_slice(&counter.to_le_bytes());
    out.extend_from_slice(&body_len.to_le_bytes());
    out.extend_from_slice(&crc32fast::hash(&body).to_le_bytes());
    out.extend_from_slice(&body);
    Ok(out)
}

/// Decode a blob. Returns `None` for every flavor of invalid; callers
/// must not distinguish why a copy failed to decode.
pub fn decode(bytes: &[u8]) -> Option<Blob> {
    if bytes.len() < HEADER_LEN {
        return None;
    }
    if bytes[0..4] != MAGIC {
        return None;
    }
    let version = u32::from_le_bytes(bytes[4..8].try_into().ok()?);
    if version != FORMAT_VERSION {
        return None;
    }
    let counter = u64::from_le_bytes(bytes[8..16].try_into().ok()?);
    let body_len = u32::from_le_bytes(bytes[16..20].try_into().ok()?) as usize;
    let crc = u32::from_le_bytes(bytes[20..24].try_into().ok()?);

    let body = &bytes[HEADER_LEN..];
    if body.len() != body_len {
        return None;
    }
    if crc32fast::hash(body) != crc {
        return None;
    }

    let mut entries = AttrMap::new();
    let mut pos = 0;
    while pos < body.len() {
        let (key, next) = take_field(body, pos)?;
        let (value, next) = take_field(body, next)?;
        pos = next;

        let key = String::from_utf8(key.to_vec()).ok()?;
        let value = String::from_utf8(value.to_vec()).ok()?;
        if entries.insert(key, value).is_some() {
            // duplicate key
            return None;
        }
    }

    Some(Blob { counter, entries })
}

fn take_field(body: &[u8], pos: usize) -> Option<(&[u8], usize)> {
    let len_end = pos.checked_add(2)?;
    if len_end > body.len() {
        return None;
    }
    let len = u16::from_be_bytes(body[pos..len_end].try_into().ok()?) as usize;
    let end = len_end.checked_add(len)?;
    if end > body.len() {
        return None;
    }
    Some((&body[len_end..end], end))
}

#[cfg(test)]
#[path = "blob_tests.rs"]
mod tests;
