// src/core/targets.rs

use crate::core::error::{Result, ScanError};
use crate::core::models::ScanTask;
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashSet;
use std::path::Path;
use url::Url;

static RE_HOSTNAME: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(?i)[a-z0-9](?:[a-z0-9-]{0,61}[a-z0-9])?(?:\.[a-z0-9](?:[a-z0-9-]{0,61}[a-z0-9])?)*\.?$")
        .expect("hostname pattern is valid")
});
static RE_IPV4: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(?:25[0-5]|2[0-4]\d|1\d\d|[1-9]?\d)(?:\.(?:25[0-5]|2[0-4]\d|1\d\d|[1-9]?\d)){3}$")
        .expect("ipv4 pattern is valid")
});

/// Splits free-form user input into raw target strings.
///
/// Targets are separated by whitespace or commas. A token of the form `@path`
/// is replaced by the lines of that file; blank lines and `#` comments are
/// ignored.
pub fn parse_target_input(input: &str) -> Result<Vec<String>> {
    let mut targets = Vec::new();
    for token in input.split(|c: char| c.is_whitespace() || c == ',').filter(|t| !t.is_empty()) {
        match token.strip_prefix('@') {
            Some(path) => targets.extend(read_target_file(Path::new(path))?),
            None => targets.push(token.to_string()),
        }
    }
    Ok(targets)
}

fn read_target_file(path: &Path) -> Result<Vec<String>> {
    let content = std::fs::read_to_string(path).map_err(|source| ScanError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(content
        .lines()
        .map(|line| line.split('#').next().unwrap_or("").trim())
        .filter(|line| !line.is_empty())
        .map(String::from)
        .collect())
}

/// Reduces a raw target (`https://Host:8443/path`, `host`, `host:443`) to `host[:port]`.
pub fn normalize_target(raw: &str) -> Result<String> {
    let raw = raw.trim();
    let invalid = |reason: &str| ScanError::InvalidTarget {
        target: raw.to_string(),
        reason: reason.to_string(),
    };
    if raw.is_empty() {
        return Err(invalid("empty target"));
    }

    let with_scheme = if raw.contains("://") { raw.to_string() } else { format!("https://{}", raw) };
    let url = Url::parse(&with_scheme).map_err(|e| invalid(&e.to_string()))?;
    if !url.username().is_empty() || url.password().is_some() {
        return Err(invalid("credentials are not allowed in targets"));
    }
    let host = url.host_str().ok_or_else(|| invalid("missing host"))?.to_ascii_lowercase();

    let is_ipv6 = host.starts_with('[');
    if !is_ipv6 && !RE_IPV4.is_match(&host) && !RE_HOSTNAME.is_match(&host) {
        return Err(invalid("not a valid hostname or IP address"));
    }
    if !is_ipv6 && host.chars().all(|c| c.is_ascii_digit() || c == '.') && !RE_IPV4.is_match(&host) {
        return Err(invalid("not a valid IPv4 address"));
    }

    // `Url` drops the scheme's default port, so recover an explicit one by hand.
    let explicit_port = raw_port(raw);
    Ok(match url.port().map(u32::from).or(explicit_port) {
        Some(port) => format!("{}:{}", host, port),
        None => host,
    })
}

fn raw_port(raw: &str) -> Option<u32> {
    let authority = raw.split("://").last()?.split(['/', '?', '#']).next()?;
    let (_, port) = authority.rsplit_once(':')?;
    if authority.ends_with(']') {
        return None;
    }
    port.parse().ok()
}

/// Normalizes, validates and deduplicates targets, keeping first-seen order.
///
/// Invalid entries are kept in place as errors so the caller can report them
/// per target.
pub fn prepare_targets(raw: &[String]) -> Vec<std::result::Result<ScanTask, ScanError>> {
    let mut seen = HashSet::new();
    let mut prepared = Vec::with_capacity(raw.len());
    for entry in raw {
        match normalize_target(entry) {
            Ok(target) => {
                if seen.insert(target.clone()) {
                    prepared.push(Ok(ScanTask::new(target)));
                }
            }
            Err(e) => {
                if seen.insert(entry.trim().to_string()) {
                    prepared.push(Err(e));
                }
            }
        }
    }
    prepared
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalizes_common_forms() {
        assert_eq!(normalize_target("Example.COM").unwrap(), "example.com");
        assert_eq!(normalize_target("example.com:8443").unwrap(), "example.com:8443");
        assert_eq!(normalize_target("https://example.com/login?x=1").unwrap(), "example.com");
        assert_eq!(normalize_target("https://example.com:443/").unwrap(), "example.com:443");
        assert_eq!(normalize_target("10.0.0.1").unwrap(), "10.0.0.1");
        assert_eq!(normalize_target("[::1]:8443").unwrap(), "[::1]:8443");
    }

    #[test]
    fn rejects_malformed_targets() {
        for bad in ["", "   ", "exa mple.com", "-bad-.com", "host:99999", "user:pw@example.com", "999.1.1.1"] {
            assert!(
                matches!(normalize_target(bad), Err(ScanError::InvalidTarget { .. })),
                "{:?} should be rejected",
                bad
            );
        }
    }

    #[test]
    fn prepare_dedups_and_keeps_order() {
        let raw: Vec<String> = ["b.example.com", "a.example.com", "B.example.com", "bad host", "https://a.example.com"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        let prepared = prepare_targets(&raw);
        assert_eq!(prepared.len(), 3);
        assert_eq!(prepared[0].as_ref().unwrap().target, "b.example.com");
        assert_eq!(prepared[1].as_ref().unwrap().target, "a.example.com");
        assert!(prepared[2].is_err());
    }

    #[test]
    fn input_splits_on_commas_and_whitespace() {
        let targets = parse_target_input("a.com, b.com\nc.com:8443").unwrap();
        assert_eq!(targets, ["a.com", "b.com", "c.com:8443"]);
    }

    #[test]
    fn input_expands_target_files() {
        let path = std::env::temp_dir().join(format!("tls-sweep-targets-{}.txt", std::process::id()));
        std::fs::write(&path, "# staging\nx.example.com\n\ny.example.com # api\n").unwrap();
        let targets = parse_target_input(&format!("first.com @{}", path.display())).unwrap();
        let _ = std::fs::remove_file(&path);
        assert_eq!(targets, ["first.com", "x.example.com", "y.example.com"]);
    }

    #[test]
    fn missing_target_file_is_an_error() {
        assert!(parse_target_input("@/nonexistent/tls-sweep/targets.txt").is_err());
    }
}
