//! Client compatibility heuristic.
//!
//! Older APT releases cannot follow a redirect to a signed object-storage URL.
//! The thresholds below are observed behaviour of specific APT versions, not a
//! version ordering: 1.x, 2.0.x and 2.1.x fail; 2.2.0 and later work.
//!
//! Known identities:
//! - `Debian APT-HTTP/1.3 (1.6.18)`
//! - `Debian APT-HTTP/1.3 (2.0.11) non-interactive`
//! - `Debian APT-HTTP/1.3 (2.2.4)`
//! - `Debian APT-HTTP/1.3 (2.4.13)`

/// First User-Agent field of an APT client
pub const AGENT_LABEL: &str = "Debian";

/// Prefix of the second User-Agent field of an APT HTTP client
pub const PROTOCOL_PREFIX: &str = "APT-HTTP";

/// Whether a client must be proxied instead of redirected.
///
/// Anything not recognisable as an APT HTTP identity with a numeric
/// `(MAJOR.MINOR...)` version is treated as able to follow redirects.
pub fn is_redirect_incompatible(user_agent: &str) -> bool {
    let fields: Vec<&str> = user_agent.split_whitespace().collect();
    if fields.len() < 3 {
        return false;
    }
    if fields[0] != AGENT_LABEL || !fields[1].starts_with(PROTOCOL_PREFIX) {
        return false;
    }

    let parts: Vec<&str> = fields[2]
        .trim_matches(|c| c == '(' || c == ')')
        .split('.')
        .collect();
    if parts.len() < 2 {
        return false;
    }

    let Ok(major) = parts[0].parse::<i32>() else {
        return false;
    };
    if major < 2 {
        return true;
    }
    if major > 2 {
        return false;
    }

    // 2.x: only 2.0 and 2.1 are affected
    parts[1].parse::<i32>().is_ok_and(|minor| minor < 2)
}
