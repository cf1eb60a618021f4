// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Replicated A/B store for one section
//!
//! Two copy slots hold encoded blobs; the one with the greater generation
//! counter is live. Commits publish to the stale slot with counter + 1, so
//! the previous state stays readable until the new blob is durable, and a
//! corrupted slot is rewritten within one commit cycle.

use crate::attrs::{AttrMap, Section};
use crate::blob::{self, Blob};
use crate::copy::CopyFile;
use crate::error::Error;
use std::fmt;

/// One section's backing store, behind which the on-disk format varies
pub trait SectionStore {
    fn section(&self) -> Section;
    /// True when data is present but no copy decodes. Reads must fail;
    /// mutations start from an empty image.
    fn is_corrupt(&self) -> bool {
        false
    }
    /// Live image. Empty when the section is empty or corrupt.
    fn entries(&self) -> &AttrMap;
    /// Publish a new image, replacing the live one
    fn commit(&mut self, image: AttrMap) -> Result<(), Error>;
}

/// Copy slot name
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Slot {
    A,
    B,
}

impl fmt::Display for Slot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Slot::A => write!(f, "A"),
            Slot::B => write!(f, "B"),
        }
    }
}

/// State of one copy slot at open
#[derive(Debug)]
enum SlotState {
    Absent,
    Empty,
    Invalid,
    Valid(Blob),
}

/// Default-format section store replicated over two copies
pub struct ReplicatedStore {
    section: Section,
    slot_a: Option<CopyFile>,
    slot_b: Option<CopyFile>,
    image: AttrMap,
    counter: u64,
    live: Option<Slot>,
    corrupt: bool,
}

impl ReplicatedStore {
    /// Bring up a section by reading both copies and selecting the
    /// freshest valid blob. At least one slot must be enabled.
    pub fn open(
        section: Section,
        slot_a: Option<CopyFile>,
        slot_b: Option<CopyFile>,
    ) -> Result<Self, Error> {
        if slot_a.is_none() && slot_b.is_none() {
            return Err(Error::DisabledSection(section));
        }

        let state_a = read_slot(&slot_a)?;
        let state_b = read_slot(&slot_b)?;
        let corrupt = matches!(
            (&state_a, &state_b),
            (SlotState::Invalid, SlotState::Invalid)
        );

        let (live, blob) = select_live(state_a, state_b);
        let (counter, image) = match blob {
            Some(blob) => (blob.counter, blob.entries),
            None => (0, AttrMap::new()),
        };

        match live {
            Some(slot) => {
                tracing::debug!(%section, %slot, counter, "live copy selected")
            }
            None => tracing::debug!(%section, corrupt, "no live copy"),
        }

        Ok(Self {
            section,
            slot_a,
            slot_b,
            image,
            counter,
            live,
            corrupt,
        })
    }

    /// Slot currently holding the live blob
    pub fn live_slot(&self) -> Option<Slot> {
        self.live
    }

    /// Generation counter of the live blob (0 when empty)
    pub fn counter(&self) -> u64 {
        self.counter
    }

    fn slot_file(&self, slot: Slot) -> Option<&CopyFile> {
        match slot {
            Slot::A => self.slot_a.as_ref(),
            Slot::B => self.slot_b.as_ref(),
        }
    }
}

impl SectionStore for ReplicatedStore {
    fn section(&self) -> Section {
        self.section
    }

    fn is_corrupt(&self) -> bool {
        self.corrupt
    }

    fn entries(&self) -> &AttrMap {
        &self.image
    }

    fn commit(&mut self, image: AttrMap) -> Result<(), Error> {
        let counter = self.counter + 1;
        let bytes = blob::encode(&image, counter)?;

        let live = match self.live {
            Some(live) => {
                // publish to the stale slot; with a single enabled slot
                // this degrades to overwrite-in-place via atomic rename
                let stale = match live {
                    Slot::A => Slot::B,
                    Slot::B => Slot::A,
                };
                let target = if self.slot_file(stale).is_some() {
                    stale
                } else {
                    live
                };
                self.write_slot(target, &bytes)?;
                target
            }
            None => {
                // counter restart: no slot holds valid data, publish to
                // every enabled slot so either survives alone
                if self.slot_a.is_some() {
                    self.write_slot(Slot::A, &bytes)?;
                }
                if self.slot_b.is_some() {
                    self.write_slot(Slot::B, &bytes)?;
                }
                if self.slot_a.is_some() {
                    Slot::A
                } else {
                    Slot::B
                }
            }
        };

        self.image = image;
        self.counter = counter;
        self.live = Some(live);
        self.corrupt = false;
        Ok(())
    }
}

impl ReplicatedStore {
    fn write_slot(&self, slot: Slot, bytes: &[u8]) -> Result<(), Error> {
        // slot_file is always Some for targets chosen by commit
        if let Some(file) = self.slot_file(slot) {
            file.write(bytes)?;
            tracing::debug!(section = %self.section, %slot, "copy committed");
        }
        Ok(())
    }
}

fn read_slot(file: &Option<CopyFile>) -> Result<SlotState, Error> {
    let file = match file {
        Some(f) => f,
        None => return Ok(SlotState::Absent),
    };
    Ok(match file.read()? {
        None => SlotState::Absent,
        Some(bytes) if bytes.is_empty() => SlotState::Empty,
        Some(bytes) => match blob::decode(&bytes) {
            Some(blob) => SlotState::Valid(blob),
            None => SlotState::Invalid,
        },
    })
}

/// Freshness rule: greater counter wins; a tie prefers A
fn select_live(state_a: SlotState, state_b: SlotState) -> (Option<Slot>, Option<Blob>) {
    match (state_a, state_b) {
        (SlotState::Valid(a), SlotState::Valid(b)) => {
            if b.counter > a.counter {
                (Some(Slot::B), Some(b))
            } else {
                (Some(Slot::A), Some(a))
            }
        }
        (SlotState::Valid(a), _) => (Some(Slot::A), Some(a)),
        (_, SlotState::Valid(b)) => (Some(Slot::B), Some(b)),
        _ => (None, None),
    }
}

#[cfg(test)]
#[path = "section_tests.rs"]
mod tests;
