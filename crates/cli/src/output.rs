// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Output formatting for read results

use clap::ValueEnum;
use nvram_core::{Output, Response};
use serde::Serialize;
use std::collections::BTreeMap;

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(Serialize)]
#[serde(untagged)]
enum JsonOutput<'a> {
    Value(&'a str),
    Listing(BTreeMap<&'a str, &'a str>),
}

/// Print each read result: `value` for get, `key=value` rows for list
pub fn print_response(response: &Response, format: OutputFormat) {
    for output in &response.outputs {
        match format {
            OutputFormat::Text => match output {
                Output::Value(value) => println!("{value}"),
                Output::Listing(entries) => {
                    for (key, value) in entries {
                        println!("{key}={value}");
                    }
                }
            },
            OutputFormat::Json => {
                let json = match output {
                    Output::Value(value) => JsonOutput::Value(value),
                    Output::Listing(entries) => JsonOutput::Listing(
                        entries
                            .iter()
                            .map(|(k, v)| (k.as_str(), v.as_str()))
                            .collect(),
                    ),
                };
                if let Ok(text) = serde_json::to_string_pretty(&json) {
                    println!("{text}");
                }
            }
        }
    }
}
