// This file is part of the terraform-provider-junos project
//
// Copyright (C) ANEO, 2024-2024. All rights reserved.
//
// Licensed under the Apache License, Version 2.0 (the "License")
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Junos CLI configuration syntax helpers and device session.

use std::num::ParseIntError;

use thiserror::Error;

pub mod secret;
pub mod session;
pub mod setfile;

pub use session::{JunosClient, Session, Settings};

pub const SET_LS: &str = "set ";
pub const SHOW_CONFIG: &str = "show configuration ";
pub const PIPE_DISPLAY_SET_RELATIVE: &str = " | display set relative";
pub const ID_SEPARATOR: &str = "_-_";
pub const DEFAULT_ROUTING_INSTANCE: &str = "default";

#[derive(Debug, Error)]
pub enum Error {
    #[error("can't read values for {what} in {line:?}: not enough fields")]
    NotEnoughFields { what: String, line: String },
    #[error("failed to convert value from {value:?} to integer: {source}")]
    NotANumber {
        value: String,
        #[source]
        source: ParseIntError,
    },
    #[error("can't decode $9$ secret: {0}")]
    BadSecret(&'static str),
    #[error("`{cmd}` failed with status code {status}: {stderr}")]
    CommandFailed {
        cmd: String,
        status: i32,
        stderr: String,
    },
    #[error("`{cmd}` timed out after {timeout}s")]
    Timeout { cmd: String, timeout: u64 },
    #[error("commit failed:\n{}", .0.join("\n"))]
    CommitFailed(Vec<String>),
    #[error("failed to write setfile {path:?}: {source}")]
    Setfile {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error(transparent)]
    Transport(#[from] anyhow::Error),
}

/// Iterate over the statements of a `display set relative` output,
/// without their leading `set `.
pub fn config_lines(output: &str) -> impl Iterator<Item = &str> {
    output
        .lines()
        .map(str::trim)
        .filter_map(|line| line.strip_prefix(SET_LS))
        .map(str::trim)
}

/// Strip `prefix` from `item` in place, returning whether it was present.
pub fn cut_prefix(item: &mut &str, prefix: &str) -> bool {
    match item.strip_prefix(prefix) {
        Some(rest) => {
            *item = rest;
            true
        }
        None => false,
    }
}

pub fn trim_quotes(value: &str) -> &str {
    value.trim_matches('"')
}

pub fn quote(value: &str) -> String {
    format!("\"{value}\"")
}

/// Split a statement on spaces, keeping quoted words together.
pub fn fields(line: &str) -> Vec<&str> {
    let mut fields = Vec::new();
    let mut start = None;
    let mut quoted = false;
    let mut escaped = false;

    for (i, c) in line.char_indices() {
        match c {
            _ if escaped => escaped = false,
            '\\' => {
                escaped = true;
                start.get_or_insert(i);
            }
            '"' => {
                quoted = !quoted;
                start.get_or_insert(i);
            }
            ' ' if !quoted => {
                if let Some(s) = start.take() {
                    fields.push(&line[s..i]);
                }
            }
            _ => {
                start.get_or_insert(i);
            }
        }
    }
    if let Some(s) = start {
        fields.push(&line[s..]);
    }
    fields
}

/// Same as [`fields`] but fails when less than `count` fields are found.
pub fn expect_fields<'s>(line: &'s str, count: usize, what: &str) -> Result<Vec<&'s str>, Error> {
    let fields = fields(line);
    if fields.len() < count {
        return Err(Error::NotEnoughFields {
            what: what.to_owned(),
            line: line.to_owned(),
        });
    }
    Ok(fields)
}

pub fn parse_number(value: &str) -> Result<i64, Error> {
    value.parse().map_err(|source| Error::NotANumber {
        value: value.to_owned(),
        source,
    })
}

/// Configuration prefix of a routing instance, empty for the master instance.
pub fn routing_instance_prefix(routing_instance: &str) -> String {
    if routing_instance.is_empty() || routing_instance == DEFAULT_ROUTING_INSTANCE {
        String::new()
    } else {
        format!("routing-instances {routing_instance} ")
    }
}

pub fn join_id(parts: &[&str]) -> String {
    parts.join(ID_SEPARATOR)
}

/// Split a resource id in exactly `count` parts.
pub fn split_id(id: &str, count: usize) -> Option<Vec<&str>> {
    let parts: Vec<_> = id.split(ID_SEPARATOR).collect();
    if parts.len() == count && parts.iter().all(|part| !part.is_empty()) {
        Some(parts)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_lines_only_keep_set_statements() {
        let output = "\r\nset protocol tcp\r\n## comment\nset description \"a b\"\n\n";
        let lines: Vec<_> = config_lines(output).collect();
        assert_eq!(lines, vec!["protocol tcp", "description \"a b\""]);
    }

    #[test]
    fn cut_prefix_strips_in_place() {
        let mut item = "term t1 protocol udp";
        assert!(cut_prefix(&mut item, "term "));
        assert_eq!(item, "t1 protocol udp");
        assert!(!cut_prefix(&mut item, "term "));
        assert_eq!(item, "t1 protocol udp");
    }

    #[test]
    fn fields_keep_quoted_words() {
        assert_eq!(
            fields("as-path-prepend \"65000 65001\" extra"),
            vec!["as-path-prepend", "\"65000 65001\"", "extra"]
        );
        assert_eq!(fields("  a  b "), vec!["a", "b"]);
        assert_eq!(fields("msg \"say \\\"hi\\\"\""), vec!["msg", "\"say \\\"hi\\\"\""]);
    }

    #[test]
    fn expect_fields_reports_not_enough_fields() {
        let err = expect_fields("security-model usm", 4, "default-context-prefix").unwrap_err();
        assert_eq!(
            err.to_string(),
            "can't read values for default-context-prefix in \"security-model usm\": not enough fields"
        );
        assert_eq!(expect_fields("a b c", 3, "x").unwrap(), vec!["a", "b", "c"]);
    }

    #[test]
    fn routing_instance_prefix_skips_default() {
        assert_eq!(routing_instance_prefix("default"), "");
        assert_eq!(routing_instance_prefix(""), "");
        assert_eq!(routing_instance_prefix("ri1"), "routing-instances ri1 ");
    }

    #[test]
    fn ids_are_split_in_exact_parts() {
        assert_eq!(join_id(&["n", "g", "default"]), "n_-_g_-_default");
        assert_eq!(split_id("n_-_g_-_default", 3), Some(vec!["n", "g", "default"]));
        assert_eq!(split_id("n_-_g", 3), None);
        assert_eq!(split_id("n_-__-_default", 3), None);
    }

    #[test]
    fn numbers_are_parsed_with_context() {
        assert_eq!(parse_number("42").unwrap(), 42);
        assert!(parse_number("4x")
            .unwrap_err()
            .to_string()
            .starts_with("failed to convert value from \"4x\""));
    }
}
