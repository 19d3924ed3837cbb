//! Line grammars for protocol responses.
//!
//! The protocol has exactly three line shapes worth parsing, each kept
//! as a named rule with a pattern compiled once:
//!
//! - `STAT <name> <number>` — one stat entry
//! - `STAT items:<id>:number ...` — a slab id
//! - `ITEM <key> [<size>; <expires>]` — one cachedump entry
//!
//! Anything else (protocol chatter, decorated stats) is not an error;
//! callers simply skip lines that do not match.

use std::sync::LazyLock;

use regex::Regex;

use crate::types::{KeyDetail, StatValue};

static STAT_LINE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^STAT (\S+) ([0-9]+\.?[0-9]*)$").expect("stat line pattern"));

// Prefix match on purpose: decorated fields such as items:<id>:number_hot
// also yield the id, so callers can see duplicates, matching the server's
// per-class reporting.
static SLAB_LINE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^STAT items:([0-9]+):number").expect("slab line pattern"));

static ITEM_LINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^ITEM (\S+) \[([0-9]+)(?: b)?; ([0-9]+)(?: s)?\]").expect("item line pattern")
});

/// Parse a `STAT <name> <number>` line into a name/value pair.
///
/// A trailing carriage return is stripped first. Values with a decimal
/// point become floats, the rest integers.
pub fn stat_line(line: &str) -> Option<(String, StatValue)> {
    let line = line.strip_suffix('\r').unwrap_or(line);
    let caps = STAT_LINE.captures(line)?;
    let value = StatValue::parse(&caps[2])?;
    Some((caps[1].to_string(), value))
}

/// Extract the slab id from a `STAT items:<id>:number` line.
pub fn slab_line(line: &str) -> Option<u32> {
    let line = line.strip_suffix('\r').unwrap_or(line);
    SLAB_LINE.captures(line)?[1].parse().ok()
}

/// Parse an `ITEM <key> [<size>; <expires>]` cachedump line.
///
/// Accepts both the bare form (`[10; 123]`) and the server's unit-suffixed
/// form (`[10 b; 123 s]`).
pub fn item_line(line: &str) -> Option<KeyDetail> {
    let line = line.strip_suffix('\r').unwrap_or(line);
    let caps = ITEM_LINE.captures(line)?;
    Some(KeyDetail {
        key: caps[1].to_string(),
        size: caps[2].parse().ok()?,
        expires: caps[3].parse().ok()?,
    })
}
