//! Instance discovery via the host process table.
//!
//! The contract is narrow: given process-listing text, return the set of
//! ports named by a `-p <port>` flag on lines mentioning the memcached
//! binary. No matching process is a legitimate state, not an error.

use std::collections::BTreeSet;
use std::sync::LazyLock;

use regex::Regex;
use tracing::warn;

/// Process name that identifies a cache instance.
pub const BIN_NAME: &str = "memcached";

static PORT_FLAG: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)-p\s+([0-9]+)").expect("port flag pattern"));

/// Extract listening ports from process-listing text.
///
/// A line counts when it names the target binary and is not the search
/// command's own listing line (anything mentioning `grep`). Duplicate
/// ports collapse into the set.
pub fn parse_listen_ports(listing: &str) -> BTreeSet<u16> {
    let mut ports = BTreeSet::new();
    for line in listing.lines() {
        let line = line.trim();
        if !line.contains(BIN_NAME) || line.contains("grep") {
            continue;
        }
        if let Some(caps) = PORT_FLAG.captures(line) {
            if let Ok(port) = caps[1].parse::<u16>() {
                ports.insert(port);
            }
        }
    }
    ports
}

/// Run `ps -ef` and extract the listening ports of every memcached
/// process. Spawn failures log a warning and yield the empty set.
pub async fn find_instances() -> BTreeSet<u16> {
    match tokio::process::Command::new("ps").arg("-ef").output().await {
        Ok(output) => parse_listen_ports(&String::from_utf8_lossy(&output.stdout)),
        Err(e) => {
            warn!(error = %e, "process listing failed");
            BTreeSet::new()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn finds_port_and_skips_grep_line() {
        let listing = concat!(
            "memcache  1001     1  0 10:00 ?        00:00:01 /usr/bin/memcached -d -p 11211 -u memcache -m 64\n",
            "root      2002  1999  0 10:05 pts/0    00:00:00 grep memcached\n",
        );
        let ports = parse_listen_ports(listing);
        assert_eq!(ports, BTreeSet::from([11211]));
    }

    #[test]
    fn multiple_instances() {
        let listing = concat!(
            "memcache  1001 1 0 10:00 ? 00:00:01 memcached -d -p 11211 -m 64\n",
            "memcache  1002 1 0 10:00 ? 00:00:01 memcached -d -p 11212 -m 64\n",
        );
        let ports = parse_listen_ports(listing);
        assert_eq!(ports, BTreeSet::from([11211, 11212]));
    }

    #[test]
    fn duplicate_ports_collapse() {
        let listing = concat!(
            "memcache  1001 1 0 10:00 ? 00:00:01 memcached -p 11211\n",
            "memcache  1001 1 0 10:00 ? 00:00:01 memcached -p 11211\n",
        );
        assert_eq!(parse_listen_ports(listing).len(), 1);
    }

    #[test]
    fn uppercase_flag_accepted() {
        let listing = "memcache 1 1 0 x ? t memcached -P 11213\n";
        assert_eq!(parse_listen_ports(listing), BTreeSet::from([11213]));
    }

    #[test]
    fn unrelated_processes_ignored() {
        let listing = concat!(
            "redis     3003 1 0 10:00 ? 00:00:01 redis-server -p 6379\n",
            "root      4004 1 0 10:00 ? 00:00:00 sshd -p 22\n",
        );
        assert!(parse_listen_ports(listing).is_empty());
    }

    #[test]
    fn memcached_without_port_flag_ignored() {
        let listing = "memcache 1001 1 0 10:00 ? 00:00:01 memcached -d -m 64\n";
        assert!(parse_listen_ports(listing).is_empty());
    }

    #[test]
    fn empty_listing_is_empty_set() {
        assert!(parse_listen_ports("").is_empty());
    }
}
