//! Address-literal parsing shared by every role driver.
//!
//! Accepts `[v6]:port`, `[v6]`, a bare v6 literal (more than one `:`),
//! `v4:port`, `v4`, or the empty string (caller's default).

/// IP family as inferred from the literal's form, not a resolved address.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Family {
    /// Address was empty; family is ambiguous until combined with a peer.
    Unspecified,
    V4,
    V6,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedAddr {
    /// Empty when the input was empty ("any interface"/default).
    pub host: String,
    pub port: u16,
    pub family: Family,
}

/// Parse a host[:port] literal, falling back to `default_port` when no port
/// is present. An empty `addr` yields `Family::Unspecified` with an empty
/// host — callers resolve the ambiguity against the session's other
/// endpoint, defaulting to v4 if both ends are unspecified.
pub fn parse_addr(addr: &str, default_port: u16) -> ParsedAddr {
    if addr.is_empty() {
        return ParsedAddr {
            host: String::new(),
            port: default_port,
            family: Family::Unspecified,
        };
    }

    if let Some(rest) = addr.strip_prefix('[') {
        if let Some(end) = rest.find(']') {
            let host = rest[..end].to_string();
            let tail = &rest[end + 1..];
            let port = tail
                .strip_prefix(':')
                .and_then(|p| p.parse().ok())
                .unwrap_or(default_port);
            return ParsedAddr {
                host,
                port,
                family: Family::V6,
            };
        }
    }

    if addr.matches(':').count() > 1 {
        return ParsedAddr {
            host: addr.to_string(),
            port: default_port,
            family: Family::V6,
        };
    }

    if let Some((host, port)) = addr.split_once(':') {
        return ParsedAddr {
            host: host.to_string(),
            port: port.parse().unwrap_or(default_port),
            family: Family::V4,
        };
    }

    ParsedAddr {
        host: addr.to_string(),
        port: default_port,
        family: Family::V4,
    }
}

/// Resolve the effective family for a sender/controller pairing: v6 if
/// either endpoint is v6, otherwise v4 — v4 is also the tie-break when
/// both endpoints are unspecified (see design notes' open question).
pub fn effective_family(local: &ParsedAddr, remote: &ParsedAddr) -> Family {
    if local.family == Family::V6 || remote.family == Family::V6 {
        Family::V6
    } else {
        Family::V4
    }
}

/// The bind host to use for an unspecified/empty literal, per `family`.
pub fn wildcard_host(family: Family) -> &'static str {
    match family {
        Family::V6 => "::",
        _ => "0.0.0.0",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_defaults_unspecified() {
        let a = parse_addr("", 20000);
        assert_eq!(a.host, "");
        assert_eq!(a.port, 20000);
        assert_eq!(a.family, Family::Unspecified);
    }

    #[test]
    fn bracketed_v6_with_port() {
        let a = parse_addr("[::1]:40862", 0);
        assert_eq!(a.host, "::1");
        assert_eq!(a.port, 40862);
        assert_eq!(a.family, Family::V6);
    }

    #[test]
    fn bracketed_v6_without_port() {
        let a = parse_addr("[::1]", 20001);
        assert_eq!(a.host, "::1");
        assert_eq!(a.port, 20001);
        assert_eq!(a.family, Family::V6);
    }

    #[test]
    fn bare_v6_literal() {
        let a = parse_addr("fe80::1", 20001);
        assert_eq!(a.host, "fe80::1");
        assert_eq!(a.family, Family::V6);
    }

    #[test]
    fn v4_with_port() {
        let a = parse_addr("127.0.0.1:40862", 0);
        assert_eq!(a.host, "127.0.0.1");
        assert_eq!(a.port, 40862);
        assert_eq!(a.family, Family::V4);
    }

    #[test]
    fn v4_without_port() {
        let a = parse_addr("127.0.0.1", 20000);
        assert_eq!(a.port, 20000);
        assert_eq!(a.family, Family::V4);
    }

    #[test]
    fn effective_family_prefers_v6() {
        let v6 = parse_addr("::1", 0);
        let v4 = parse_addr("127.0.0.1", 0);
        assert_eq!(effective_family(&v6, &v4), Family::V6);
        assert_eq!(effective_family(&v4, &v4), Family::V4);
    }
}
