// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Store manager: section routing, privilege, batch commit
//!
//! Owns both section stores. Every operation in a request is validated
//! before anything is applied, so a failing request has no side effects.
//! Mutations are applied in order to in-memory images and each dirty
//! section is committed exactly once, user before system.

use crate::attrs::{self, AttrMap, Section, SYSTEM_PREFIX};
use crate::config::Config;
use crate::error::Error;
use crate::format::{self, legacy};
use crate::operation::{Op, Output, Request, Response};
use crate::section::SectionStore;
use std::fs;

/// A validated operation bound to its target section
#[derive(Debug)]
enum Planned {
    Get { section: Section, key: String },
    Set { section: Section, key: String, value: String },
    Del { section: Section, key: String },
    List { section: Section },
}

/// Owns the user and system section stores for one invocation
pub struct StoreManager {
    user: Option<Box<dyn SectionStore>>,
    system: Option<Box<dyn SectionStore>>,
    system_unlocked: bool,
    allow_all_prefixes: bool,
    init_enabled: bool,
    valid_attributes: Option<Vec<String>>,
}

impl StoreManager {
    /// Bring up both sections from configuration
    pub fn open(config: &Config) -> Result<Self, Error> {
        let user = format::open_section(
            config.format,
            Section::User,
            config.user_a.clone(),
            config.user_b.clone(),
        )?;
        let system = format::open_section(
            config.format,
            Section::System,
            config.system_a.clone(),
            config.system_b.clone(),
        )?;

        Ok(Self {
            user,
            system,
            system_unlocked: config.system_unlocked,
            allow_all_prefixes: config.allow_all_prefixes,
            init_enabled: config.init_enabled,
            valid_attributes: config.valid_attributes.clone(),
        })
    }

    /// Execute one request: validate every operation, apply in order,
    /// commit each affected section once
    pub fn execute(&mut self, request: &Request) -> Result<Response, Error> {
        let planned = self.plan(request)?;
        self.apply(&planned)
    }

    fn plan(&self, request: &Request) -> Result<Vec<Planned>, Error> {
        let reads = request.ops.iter().filter(|op| op.is_read()).count();
        if reads > 0 && reads < request.ops.len() {
            return Err(Error::InvalidRequest(
                "cannot mix read and write operations",
            ));
        }

        let mut planned = Vec::new();
        for op in &request.ops {
            tracing::debug!(?op, system_mode = request.system_mode, "planning");
            match op {
                Op::Get { key } => {
                    let section = if request.system_mode {
                        Section::System
                    } else {
                        attrs::section_for_key(key)
                    };
                    self.require_enabled(section)?;
                    planned.push(Planned::Get {
                        section,
                        key: key.clone(),
                    });
                }
                Op::List => {
                    let section = mode_section(request.system_mode);
                    self.require_enabled(section)?;
                    planned.push(Planned::List { section });
                }
                Op::Set { key, value } => {
                    let section = mode_section(request.system_mode);
                    self.validate_set(section, key, value)?;
                    planned.push(Planned::Set {
                        section,
                        key: key.clone(),
                        value: value.clone(),
                    });
                }
                Op::Del { key } => {
                    let section = mode_section(request.system_mode);
                    attrs::validate_key(key)?;
                    self.check_write_prefix(section, key)?;
                    self.check_privilege(section)?;
                    self.require_enabled(section)?;
                    planned.push(Planned::Del {
                        section,
                        key: key.clone(),
                    });
                }
                Op::Init { path } => {
                    // init ingests a legacy file as system-section sets
                    if !self.init_enabled {
                        return Err(Error::InitDisabled);
                    }
                    if !self.system_unlocked {
                        return Err(Error::SystemLocked);
                    }
                    let text = fs::read_to_string(path)?;
                    for (key, value) in legacy::parse(&text, path)? {
                        self.validate_set(Section::System, &key, &value)?;
                        planned.push(Planned::Set {
                            section: Section::System,
                            key,
                            value,
                        });
                    }
                }
            }
        }
        Ok(planned)
    }

    fn apply(&mut self, planned: &[Planned]) -> Result<Response, Error> {
        let mut outputs = Vec::new();
        let mut images = WorkingImages::default();

        // clone the image of every section the batch writes to
        for op in planned {
            if let Planned::Set { section, .. } | Planned::Del { section, .. } = op {
                if images.get(*section).is_none() {
                    let store = self.store(*section)?;
                    images.put(*section, store.entries().clone());
                }
            }
        }

        for op in planned {
            match op {
                Planned::Get { section, key } => {
                    let store = self.store(*section)?;
                    if store.is_corrupt() {
                        return Err(Error::CorruptStore(*section));
                    }
                    let value = store
                        .entries()
                        .get(key)
                        .cloned()
                        .ok_or_else(|| Error::NotFound(key.clone()))?;
                    outputs.push(Output::Value(value));
                }
                Planned::List { section } => {
                    let store = self.store(*section)?;
                    if store.is_corrupt() {
                        return Err(Error::CorruptStore(*section));
                    }
                    let listing = store
                        .entries()
                        .iter()
                        .map(|(k, v)| (k.clone(), v.clone()))
                        .collect();
                    outputs.push(Output::Listing(listing));
                }
                Planned::Set { section, key, value } => {
                    images.set(*section, key, value);
                }
                Planned::Del { section, key } => {
                    // deleting an absent key is a silent no-op
                    images.del(*section, key);
                }
            }
        }

        for section in [Section::User, Section::System] {
            if let Some(image) = images.take_dirty(section) {
                tracing::debug!(%section, "committing batch");
                self.store_mut(section)?.commit(image)?;
            }
        }

        Ok(Response { outputs })
    }

    fn validate_set(&self, section: Section, key: &str, value: &str) -> Result<(), Error> {
        attrs::validate_key(key)?;
        attrs::validate_value(key, value)?;
        self.check_whitelist(key)?;
        self.check_write_prefix(section, key)?;
        self.check_privilege(section)?;
        self.require_enabled(section)
    }

    /// Outbound prefix policy. The system prefix is never writable from
    /// user mode, even with `allow_all_prefixes`.
    fn check_write_prefix(&self, section: Section, key: &str) -> Result<(), Error> {
        let violation = match section {
            Section::User => key.starts_with(SYSTEM_PREFIX),
            Section::System => !key.starts_with(SYSTEM_PREFIX) && !self.allow_all_prefixes,
        };
        if violation {
            return Err(Error::PrefixViolation {
                key: key.to_string(),
                section,
            });
        }
        Ok(())
    }

    fn check_privilege(&self, section: Section) -> Result<(), Error> {
        if section == Section::System && !self.system_unlocked {
            return Err(Error::SystemLocked);
        }
        Ok(())
    }

    fn check_whitelist(&self, key: &str) -> Result<(), Error> {
        if let Some(list) = &self.valid_attributes {
            if !list.iter().any(|name| name == key) {
                return Err(Error::NotWhitelisted(key.to_string()));
            }
        }
        Ok(())
    }

    fn require_enabled(&self, section: Section) -> Result<(), Error> {
        self.store(section).map(|_| ())
    }

    fn store(&self, section: Section) -> Result<&dyn SectionStore, Error> {
        let slot = match section {
            Section::User => &self.user,
            Section::System => &self.system,
        };
        slot.as_deref().ok_or(Error::DisabledSection(section))
    }

    fn store_mut(&mut self, section: Section) -> Result<&mut dyn SectionStore, Error> {
        let slot = match section {
            Section::User => &mut self.user,
            Section::System => &mut self.system,
        };
        match slot {
            Some(store) => Ok(store.as_mut()),
            None => Err(Error::DisabledSection(section)),
        }
    }
}

fn mode_section(system_mode: bool) -> Section {
    if system_mode {
        Section::System
    } else {
        Section::User
    }
}

/// Per-section working image with change tracking. A set to an identical
/// value or a delete of an absent key leaves the section clean, so the
/// batch does not bump its counter.
#[derive(Default)]
struct WorkingImages {
    user: Option<(AttrMap, bool)>,
    system: Option<(AttrMap, bool)>,
}

impl WorkingImages {
    fn slot(&mut self, section: Section) -> &mut Option<(AttrMap, bool)> {
        match section {
            Section::User => &mut self.user,
            Section::System => &mut self.system,
        }
    }

    fn get(&mut self, section: Section) -> Option<&(AttrMap, bool)> {
        self.slot(section).as_ref()
    }

    fn put(&mut self, section: Section, image: AttrMap) {
        *self.slot(section) = Some((image, false));
    }

    fn set(&mut self, section: Section, key: &str, value: &str) {
        if let Some((image, dirty)) = self.slot(section) {
            if image.get(key).map(String::as_str) != Some(value) {
                image.insert(key.to_string(), value.to_string());
                *dirty = true;
            }
        }
    }

    fn del(&mut self, section: Section, key: &str) {
        if let Some((image, dirty)) = self.slot(section) {
            if image.remove(key).is_some() {
                *dirty = true;
            }
        }
    }

    fn take_dirty(&mut self, section: Section) -> Option<AttrMap> {
        let slot = self.slot(section);
        if matches!(slot, Some((_, true))) {
            slot.take().map(|(image, _)| image)
        } else {
            None
        }
    }
}

#[cfg(test)]
#[path = "manager_tests.rs"]
mod tests;
