// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Argument parsing for the flag form and the legacy subcommand form
//!
//! Batch semantics are order-sensitive, so repeated operation flags are
//! re-assembled into command-line order from their `ArgMatches` indices.

use crate::output::OutputFormat;
use anyhow::{bail, Result};
use clap::{ArgAction, ArgMatches, Parser};
use nvram_core::{Op, Request};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "nvram")]
#[command(about = "Non-volatile attribute store")]
#[command(version)]
#[command(after_help = "\
Legacy command form: nvram [set KEY VALUE | get KEY | delete KEY | list]
Copy paths, unlock token and format are read from NVRAM_* environment
variables; an empty path disables that copy.")]
pub struct Cli {
    /// Address the system section
    #[arg(long, conflicts_with = "user")]
    pub sys: bool,

    /// Address the user section (the default; explicit form for the
    /// platform format)
    #[arg(long)]
    pub user: bool,

    /// Write an attribute (repeatable; committed as one batch)
    #[arg(long, num_args = 2, value_names = ["KEY", "VALUE"], action = ArgAction::Append)]
    pub set: Vec<String>,

    /// Read an attribute (repeatable)
    #[arg(long, value_name = "KEY", action = ArgAction::Append)]
    pub get: Vec<String>,

    /// Delete an attribute (repeatable; absent keys are ignored)
    #[arg(long, value_name = "KEY", action = ArgAction::Append)]
    pub del: Vec<String>,

    /// List the section's attributes
    #[arg(long)]
    pub list: bool,

    /// Ingest attributes from a legacy-format file (requires unlock and
    /// NVRAM_INIT_ENABLED=yes)
    #[arg(long, value_name = "PATH")]
    pub init: Option<PathBuf>,

    /// Output format
    #[arg(long, value_enum, default_value = "text")]
    pub format: OutputFormat,

    /// Legacy subcommand form (mutually exclusive with operation flags)
    #[arg(value_name = "COMMAND", num_args = 0..=3)]
    pub command: Vec<String>,
}

/// Assemble the request, preserving command-line operation order
pub fn collect_request(cli: &Cli, matches: &ArgMatches) -> Result<Request> {
    let system_mode = cli.sys;

    if !cli.command.is_empty() {
        if !cli.set.is_empty()
            || !cli.get.is_empty()
            || !cli.del.is_empty()
            || cli.list
            || cli.init.is_some()
        {
            bail!("subcommand form cannot be combined with operation flags");
        }
        return Ok(Request {
            system_mode,
            ops: vec![parse_command(&cli.command)?],
        });
    }

    let mut ops: Vec<(usize, Op)> = Vec::new();

    if let Some(indices) = matches.indices_of("set") {
        let indices: Vec<usize> = indices.collect();
        for (pair, idx) in cli.set.chunks(2).zip(indices.chunks(2)) {
            ops.push((
                idx[0],
                Op::Set {
                    key: pair[0].clone(),
                    value: pair[1].clone(),
                },
            ));
        }
    }
    if let Some(indices) = matches.indices_of("get") {
        for (key, idx) in cli.get.iter().zip(indices) {
            ops.push((idx, Op::Get { key: key.clone() }));
        }
    }
    if let Some(indices) = matches.indices_of("del") {
        for (key, idx) in cli.del.iter().zip(indices) {
            ops.push((idx, Op::Del { key: key.clone() }));
        }
    }
    if cli.list {
        ops.push((matches.index_of("list").unwrap_or(0), Op::List));
    }
    if let Some(path) = &cli.init {
        ops.push((
            matches.index_of("init").unwrap_or(0),
            Op::Init { path: path.clone() },
        ));
    }

    ops.sort_by_key(|(idx, _)| *idx);
    let mut ops: Vec<Op> = ops.into_iter().map(|(_, op)| op).collect();

    // no operations defaults to list
    if ops.is_empty() {
        ops.push(Op::List);
    }

    Ok(Request { system_mode, ops })
}

fn parse_command(parts: &[String]) -> Result<Op> {
    let arity = |expected: usize, name: &str| -> Result<()> {
        if parts.len() != expected + 1 {
            bail!("wrong number of arguments for command {name}");
        }
        Ok(())
    };

    match parts[0].as_str() {
        "set" => {
            arity(2, "set")?;
            Ok(Op::Set {
                key: parts[1].clone(),
                value: parts[2].clone(),
            })
        }
        "get" => {
            arity(1, "get")?;
            Ok(Op::Get {
                key: parts[1].clone(),
            })
        }
        "delete" => {
            arity(1, "delete")?;
            Ok(Op::Del {
                key: parts[1].clone(),
            })
        }
        "list" => {
            arity(0, "list")?;
            Ok(Op::List)
        }
        other => bail!("unknown command: {other}"),
    }
}

#[cfg(test)]
#[path = "args_tests.rs"]
mod tests;
