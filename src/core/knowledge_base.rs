//! Static, read-only lookup tables that turn raw auditor check identifiers
//! into protocol support and known-vulnerability verdicts.
//!
//! Adding a protocol or a vulnerability is a one-line change to a table below;
//! the aggregator never special-cases individual identifiers.

use std::fmt;

/// High-level grouping used for recommendations and the details panel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum FindingCategory {
    Protocols,
    Vulnerabilities,
    Certificates,
    Ciphers,
    Other,
}

impl fmt::Display for FindingCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FindingCategory::Protocols => write!(f, "Protocols"),
            FindingCategory::Vulnerabilities => write!(f, "Vulnerabilities"),
            FindingCategory::Certificates => write!(f, "Certificates"),
            FindingCategory::Ciphers => write!(f, "Ciphers"),
            FindingCategory::Other => write!(f, "Other"),
        }
    }
}

/// A protocol version the auditor probes for.
pub struct ProtocolDetail {
    /// Check identifier emitted by the auditor (e.g. "TLS1_2").
    pub id: &'static str,
    /// Display label (e.g. "TLS 1.2").
    pub label: &'static str,
    /// Offering this protocol is itself a weakness.
    pub legacy: bool,
}

pub static PROTOCOLS: &[ProtocolDetail] = &[
    ProtocolDetail { id: "SSLv2", label: "SSLv2", legacy: true },
    ProtocolDetail { id: "SSLv3", label: "SSLv3", legacy: true },
    ProtocolDetail { id: "TLS1", label: "TLS 1.0", legacy: true },
    ProtocolDetail { id: "TLS1_1", label: "TLS 1.1", legacy: true },
    ProtocolDetail { id: "TLS1_2", label: "TLS 1.2", legacy: false },
    ProtocolDetail { id: "TLS1_3", label: "TLS 1.3", legacy: false },
];

/// A named vulnerability check and what it means.
pub struct VulnerabilityDetail {
    pub id: &'static str,
    pub description: &'static str,
    /// CVE identifiers the auditor may attach to this check.
    pub cves: &'static [&'static str],
}

pub static VULNERABILITIES: &[VulnerabilityDetail] = &[
    VulnerabilityDetail {
        id: "heartbleed",
        description: "Critical vulnerability allowing memory disclosure",
        cves: &["CVE-2014-0160"],
    },
    VulnerabilityDetail {
        id: "CCS",
        description: "ChangeCipherSpec injection vulnerability",
        cves: &["CVE-2014-0224"],
    },
    VulnerabilityDetail {
        id: "ticketbleed",
        description: "Session ticket memory disclosure in F5 BIG-IP",
        cves: &["CVE-2016-9244"],
    },
    VulnerabilityDetail {
        id: "ROBOT",
        description: "Return Of Bleichenbacher Oracle Threat",
        cves: &["CVE-2017-17382", "CVE-2017-17427", "CVE-2017-17428", "CVE-2017-13098"],
    },
    VulnerabilityDetail {
        id: "secure_renego",
        description: "Missing secure renegotiation support",
        cves: &["CVE-2009-3555"],
    },
    VulnerabilityDetail {
        id: "secure_client_renego",
        description: "Client-initiated renegotiation denial of service",
        cves: &["CVE-2011-1473"],
    },
    VulnerabilityDetail {
        id: "CRIME_TLS",
        description: "Compression Ratio Info-leak Made Easy",
        cves: &["CVE-2012-4929"],
    },
    VulnerabilityDetail {
        id: "BREACH",
        description: "HTTP compression side channel on secrets in responses",
        cves: &["CVE-2013-3587"],
    },
    VulnerabilityDetail {
        id: "POODLE_SSL",
        description: "Padding Oracle On Downgraded Legacy Encryption",
        cves: &["CVE-2014-3566"],
    },
    VulnerabilityDetail {
        id: "SWEET32",
        description: "Birthday attacks on 64-bit block ciphers",
        cves: &["CVE-2016-2183", "CVE-2016-6329"],
    },
    VulnerabilityDetail {
        id: "FREAK",
        description: "Factoring RSA Export Keys vulnerability",
        cves: &["CVE-2015-0204"],
    },
    VulnerabilityDetail {
        id: "DROWN",
        description: "Decrypting RSA with Obsolete and Weakened eNcryption",
        cves: &["CVE-2016-0800", "CVE-2016-0703"],
    },
    VulnerabilityDetail {
        id: "LOGJAM",
        description: "Diffie-Hellman key exchange vulnerability",
        cves: &["CVE-2015-4000"],
    },
    VulnerabilityDetail {
        id: "BEAST",
        description: "Browser Exploit Against SSL/TLS",
        cves: &["CVE-2011-3389"],
    },
    VulnerabilityDetail {
        id: "LUCKY13",
        description: "Lucky Thirteen timing attack",
        cves: &["CVE-2013-0169"],
    },
    VulnerabilityDetail {
        id: "RC4",
        description: "Biased keystream of the RC4 cipher",
        cves: &["CVE-2013-2566", "CVE-2015-2808"],
    },
];

pub fn protocol(id: &str) -> Option<&'static ProtocolDetail> {
    PROTOCOLS.iter().find(|p| p.id == id)
}

/// Looks a vulnerability up by check id first, then by any CVE it lists.
///
/// `cve` may hold several space-separated identifiers, as the auditor emits.
pub fn vulnerability(id: &str, cve: Option<&str>) -> Option<&'static VulnerabilityDetail> {
    if let Some(detail) = VULNERABILITIES.iter().find(|v| v.id.eq_ignore_ascii_case(id)) {
        return Some(detail);
    }
    let cve = cve?;
    cve.split_whitespace()
        .find_map(|c| VULNERABILITIES.iter().find(|v| v.cves.iter().any(|known| known.eq_ignore_ascii_case(c))))
}

/// Coarse category for an auditor check identifier.
pub fn category(id: &str) -> FindingCategory {
    if protocol(id).is_some() {
        FindingCategory::Protocols
    } else if vulnerability(id, None).is_some() {
        FindingCategory::Vulnerabilities
    } else if id.starts_with("cert") || id == "OCSP_stapling" || id == "certificate_transparency" {
        FindingCategory::Certificates
    } else if id.starts_with("cipher") {
        FindingCategory::Ciphers
    } else {
        FindingCategory::Other
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn finds_vulnerability_by_id_case_insensitively() {
        let detail = vulnerability("HEARTBLEED", None).unwrap();
        assert_eq!(detail.id, "heartbleed");
    }

    #[test]
    fn finds_vulnerability_by_any_listed_cve() {
        let detail = vulnerability("some_other_check", Some("CVE-2016-2183 CVE-2016-6329")).unwrap();
        assert_eq!(detail.id, "SWEET32");
        assert!(vulnerability("nothing", Some("CVE-1999-0001")).is_none());
    }

    #[test]
    fn categorizes_common_checks() {
        assert_eq!(category("TLS1_3"), FindingCategory::Protocols);
        assert_eq!(category("LOGJAM"), FindingCategory::Vulnerabilities);
        assert_eq!(category("cert_notAfter"), FindingCategory::Certificates);
        assert_eq!(category("cipherlist_NULL"), FindingCategory::Ciphers);
        assert_eq!(category("HSTS"), FindingCategory::Other);
    }

    #[test]
    fn legacy_protocols_are_flagged() {
        assert!(protocol("SSLv3").unwrap().legacy);
        assert!(!protocol("TLS1_3").unwrap().legacy);
    }
}
