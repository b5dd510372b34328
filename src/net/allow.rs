//! Allow-list matching for outbound hosts.

/// Check a hostname against one allow-list pattern.
///
/// Patterns: `*`/`**` match anything; `*.domain` matches any host ending in
/// `.domain` as well as the bare `domain`; anything else is a literal,
/// case-insensitive host.
fn matches_pattern(host: &str, pattern: &str) -> bool {
    let pattern = pattern.to_ascii_lowercase();
    if pattern == "*" || pattern == "**" {
        return true;
    }
    if let Some(domain) = pattern.strip_prefix("*.") {
        return host == domain || host.ends_with(&format!(".{}", domain));
    }
    host == pattern
}

/// True if `host` is permitted by any entry of the allow-list.
pub fn host_allowed(host: &str, allow_list: &[String]) -> bool {
    let host = host.to_ascii_lowercase();
    allow_list.iter().any(|p| matches_pattern(&host, p))
}
