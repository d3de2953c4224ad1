//! Input validation at the network boundary.
//!
//! Pure functions with no internal state — safe for concurrent use without
//! synchronization. Everything user-supplied passes through here before a
//! request payload is built.

use std::net::{IpAddr, Ipv6Addr};
use std::str::FromStr;

/// The closed set of DNS record types accepted by the upstream API.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordType {
    A,
    Mx,
    Cname,
    Alias,
    Txt,
    Ns,
    Aaaa,
    Srv,
    Tlsa,
    Caa,
    Https,
    Svcb,
}

impl RecordType {
    /// All supported record types, in upstream wire order.
    pub const ALL: [RecordType; 12] = [
        RecordType::A,
        RecordType::Mx,
        RecordType::Cname,
        RecordType::Alias,
        RecordType::Txt,
        RecordType::Ns,
        RecordType::Aaaa,
        RecordType::Srv,
        RecordType::Tlsa,
        RecordType::Caa,
        RecordType::Https,
        RecordType::Svcb,
    ];

    /// Canonical upper-case form sent on the wire.
    pub fn as_str(self) -> &'static str {
        match self {
            RecordType::A => "A",
            RecordType::Mx => "MX",
            RecordType::Cname => "CNAME",
            RecordType::Alias => "ALIAS",
            RecordType::Txt => "TXT",
            RecordType::Ns => "NS",
            RecordType::Aaaa => "AAAA",
            RecordType::Srv => "SRV",
            RecordType::Tlsa => "TLSA",
            RecordType::Caa => "CAA",
            RecordType::Https => "HTTPS",
            RecordType::Svcb => "SVCB",
        }
    }

    /// Whether a record of this type must carry a numeric priority.
    pub fn requires_priority(self) -> bool {
        matches!(self, RecordType::Mx | RecordType::Srv)
    }
}

impl FromStr for RecordType {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        RecordType::ALL
            .iter()
            .copied()
            .find(|rt| rt.as_str().eq_ignore_ascii_case(s))
            .ok_or(())
    }
}

/// Validate a hostname: 1–253 characters of dot-separated labels, each label
/// 1–63 alphanumerics/hyphens, no label starting or ending with a hyphen.
///
/// Rejects empty labels, so `invalid..com`, `-.com`, and a trailing dot all
/// fail.
pub fn validate_domain(domain: &str) -> bool {
    if domain.is_empty() || domain.len() > 253 {
        return false;
    }
    domain.split('.').all(|label| {
        !label.is_empty()
            && label.len() <= 63
            && !label.starts_with('-')
            && !label.ends_with('-')
            && label.chars().all(|c| c.is_ascii_alphanumeric() || c == '-')
    })
}

/// Validate a syntactically well-formed IPv4 or IPv6 address.
///
/// IPv6 zone-id suffixes (`fe80::1%eth0`) are accepted — `std::net` does not
/// parse them, so the zone is split off before parsing.
pub fn validate_ip(addr: &str) -> bool {
    if let Some((candidate, zone)) = addr.split_once('%') {
        return !zone.is_empty() && candidate.parse::<Ipv6Addr>().is_ok();
    }
    addr.parse::<IpAddr>().is_ok()
}

/// Case-insensitive membership test against the closed record-type set.
pub fn validate_record_type(record_type: &str) -> bool {
    record_type.parse::<RecordType>().is_ok()
}

/// Strip ASCII control characters (0x00–0x1F, 0x7F) and the C1 range
/// (0x80–0x9F), trim surrounding whitespace, and truncate to `max_len`
/// characters. Never panics.
pub fn sanitize_string(input: &str, max_len: usize) -> String {
    let cleaned: String = input
        .chars()
        .filter(|c| {
            let cp = *c as u32;
            cp > 0x1f && !(0x7f..=0x9f).contains(&cp)
        })
        .collect();
    cleaned.trim().chars().take(max_len).collect()
}
