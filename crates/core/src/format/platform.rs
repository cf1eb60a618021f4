// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Platform format: fixed-schema binary record with typed fields
//!
//! A single 1024-byte little-endian header. Field layout is frozen for
//! backwards compatibility; the header version gates which fields exist.
//! Version 0 carries `name`; version 1 adds `serial` (u64) and `flags`
//! (u32). Integer fields accept decimal or `0x`-prefixed hex on set and
//! are emitted as lowercase hex.

use crate::attrs::{AttrMap, Section};
use crate::copy::CopyFile;
use crate::error::Error;
use crate::section::SectionStore;

const MAGIC: u32 = 0x5441_4c50;
pub const HEADER_SIZE: usize = 1024;
pub const SUPPORTED_VERSION: u32 = 1;

const MAGIC_OFF: usize = 0;
const VERSION_OFF: usize = 4;
const NAME_OFF: usize = 8;
const NAME_LEN: usize = 64;
const SERIAL_OFF: usize = 72;
const FLAGS_OFF: usize = 80;
const CRC_OFF: usize = HEADER_SIZE - 4;

/// Parse a typed integer: decimal or `0x`-prefixed hex
pub fn parse_int(text: &str) -> Option<u64> {
    if let Some(hex) = text.strip_prefix("0x").or_else(|| text.strip_prefix("0X")) {
        u64::from_str_radix(hex, 16).ok()
    } else {
        text.parse().ok()
    }
}

fn field_error(key: &str, reason: &str) -> Error {
    Error::Format {
        format: "platform",
        message: format!("field {key:?}: {reason}"),
    }
}

/// Single-copy section store over the platform header
pub struct PlatformStore {
    section: Section,
    file: CopyFile,
    image: AttrMap,
}

impl PlatformStore {
    pub fn open(section: Section, file: CopyFile) -> Result<Self, Error> {
        let image = match file.read()? {
            Some(bytes) if bytes.len() >= HEADER_SIZE => {
                parse_header(&bytes[..HEADER_SIZE])?
            }
            _ => {
                tracing::debug!(%section, "platform header not found");
                AttrMap::new()
            }
        };
        Ok(Self {
            section,
            file,
            image,
        })
    }
}

impl SectionStore for PlatformStore {
    fn section(&self) -> Section {
        self.section
    }

    fn entries(&self) -> &AttrMap {
        &self.image
    }

    fn commit(&mut self, image: AttrMap) -> Result<(), Error> {
        let header = render_header(&image)?;
        self.file.write(&header)?;
        self.image = image;
        Ok(())
    }
}

/// Decode header fields into an attribute image. An unparseable header
/// reads as an empty section; a header newer than this build is an error.
fn parse_header(buf: &[u8]) -> Result<AttrMap, Error> {
    let mut image = AttrMap::new();

    let stored_crc = read_u32(buf, CRC_OFF);
    if crc32fast::hash(&buf[..CRC_OFF]) != stored_crc || read_u32(buf, MAGIC_OFF) != MAGIC {
        tracing::debug!("platform header invalid");
        return Ok(image);
    }

    let version = read_u32(buf, VERSION_OFF);
    if version > SUPPORTED_VERSION {
        return Err(Error::Format {
            format: "platform",
            message: format!(
                "header version {version} newer than supported {SUPPORTED_VERSION}"
            ),
        });
    }

    let name_field = &buf[NAME_OFF..NAME_OFF + NAME_LEN];
    let name_end = match name_field.iter().position(|&b| b == 0) {
        Some(end) => end,
        None => {
            // missing terminator, treat the whole header as invalid
            tracing::debug!("platform header name unterminated");
            return Ok(image);
        }
    };
    if name_end > 0 {
        match std::str::from_utf8(&name_field[..name_end]) {
            Ok(name) => {
                image.insert("name".to_string(), name.to_string());
            }
            Err(_) => {
                tracing::debug!("platform header name not utf-8");
                return Ok(AttrMap::new());
            }
        }
    }

    if version >= 1 {
        let serial = read_u64(buf, SERIAL_OFF);
        let flags = read_u32(buf, FLAGS_OFF);
        image.insert("serial".to_string(), format!("{serial:#x}"));
        image.insert("flags".to_string(), format!("{flags:#x}"));
    }

    Ok(image)
}

/// Encode an attribute image as a fresh header at the supported version
fn render_header(image: &AttrMap) -> Result<Vec<u8>, Error> {
    let mut buf = vec![0u8; HEADER_SIZE];
    buf[MAGIC_OFF..MAGIC_OFF + 4].copy_from_slice(&MAGIC.to_le_bytes());
    buf[VERSION_OFF..VERSION_OFF + 4].copy_from_slice(&SUPPORTED_VERSION.to_le_bytes());

    for (key, value) in image {
        match key.as_str() {
            "name" => {
                if value.len() >= NAME_LEN {
                    return Err(field_error(key, "value too long"));
                }
                buf[NAME_OFF..NAME_OFF + value.len()].copy_from_slice(value.as_bytes());
            }
            "serial" => {
                let serial =
                    parse_int(value).ok_or_else(|| field_error(key, "invalid integer"))?;
                buf[SERIAL_OFF..SERIAL_OFF + 8].copy_from_slice(&serial.to_le_bytes());
            }
            "flags" => {
                let wide =
                    parse_int(value).ok_or_else(|| field_error(key, "invalid integer"))?;
                let flags =
                    u32::try_from(wide).map_err(|_| field_error(key, "value out of range"))?;
                buf[FLAGS_OFF..FLAGS_OFF + 4].copy_from_slice(&flags.to_le_bytes());
            }
            _ => return Err(field_error(key, "unknown field")),
        }
    }

    let crc = crc32fast::hash(&buf[..CRC_OFF]);
    buf[CRC_OFF..].copy_from_slice(&crc.to_le_bytes());
    Ok(buf)
}

fn read_u32(buf: &[u8], off: usize) -> u32 {
    let mut raw = [0u8; 4];
    raw.copy_from_slice(&buf[off..off + 4]);
    u32::from_le_bytes(raw)
}

fn read_u64(buf: &[u8], off: usize) -> u64 {
    let mut raw = [0u8; 8];
    raw.copy_from_slice(&buf[off..off + 8]);
    u64::from_le_bytes(raw)
}

#[cfg(test)]
#[path = "platform_tests.rs"]
mod tests;
