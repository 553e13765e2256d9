//! Legal-domain labels and the keyword table that defines them.
//!
//! The label set is closed: every clause and every rule is tagged with zero or
//! more of these domains. The keyword table is the ontology's source of truth;
//! [`crate::OntologyIndex`] compiles it into a single matcher.

use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// A fixed legal topic label.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Domain {
    DataCollection,
    DataRetention,
    DataSharing,
    Consent,
    SecurityPractices,
    BreachResponse,
    UserRights,
    Grievance,
    PolicyChanges,
    Liability,
    IntermediaryDuties,
    SensitiveData,
    ChildrenData,
    LoggingAudit,
}

/// Ordered set of domains. Ordering keeps reports and prompts deterministic.
pub type DomainSet = BTreeSet<Domain>;

impl Domain {
    pub const ALL: [Domain; 14] = [
        Domain::DataCollection,
        Domain::DataRetention,
        Domain::DataSharing,
        Domain::Consent,
        Domain::SecurityPractices,
        Domain::BreachResponse,
        Domain::UserRights,
        Domain::Grievance,
        Domain::PolicyChanges,
        Domain::Liability,
        Domain::IntermediaryDuties,
        Domain::SensitiveData,
        Domain::ChildrenData,
        Domain::LoggingAudit,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::DataCollection => "DATA_COLLECTION",
            Self::DataRetention => "DATA_RETENTION",
            Self::DataSharing => "DATA_SHARING",
            Self::Consent => "CONSENT",
            Self::SecurityPractices => "SECURITY_PRACTICES",
            Self::BreachResponse => "BREACH_RESPONSE",
            Self::UserRights => "USER_RIGHTS",
            Self::Grievance => "GRIEVANCE",
            Self::PolicyChanges => "POLICY_CHANGES",
            Self::Liability => "LIABILITY",
            Self::IntermediaryDuties => "INTERMEDIARY_DUTIES",
            Self::SensitiveData => "SENSITIVE_DATA",
            Self::ChildrenData => "CHILDREN_DATA",
            Self::LoggingAudit => "LOGGING_AUDIT",
        }
    }
}

impl fmt::Display for Domain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when a label does not name any [`Domain`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown domain label: {0:?}")]
pub struct UnknownDomain(pub String);

/// Canonicalize a free-form domain label: trim, uppercase, and fold spaces and
/// hyphens to underscores. `" Data_Sharing "` becomes `"DATA_SHARING"`.
pub fn normalize_label(label: &str) -> String {
    label
        .trim()
        .chars()
        .map(|c| match c {
            ' ' | '-' => '_',
            c => c.to_ascii_uppercase(),
        })
        .collect()
}

impl FromStr for Domain {
    type Err = UnknownDomain;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let canonical = normalize_label(s);
        Domain::ALL
            .into_iter()
            .find(|d| d.as_str() == canonical)
            .ok_or_else(|| UnknownDomain(s.to_string()))
    }
}

/// Keyword lists per domain, in definition order.
///
/// A keyword listed under several domains resolves to the domain defined last.
pub const KEYWORD_TABLE: &[(Domain, &[&str])] = &[
    (
        Domain::DataCollection,
        &[
            "collect", "obtain", "gather", "process", "harvest", "record", "capture", "track",
            "monitor", "log", "observe", "acquire", "receive", "store", "cookies", "pixels",
            "beacons", "fingerprint", "telemetry", "analytics", "input", "submission",
            "automated", "profiling",
        ],
    ),
    (
        Domain::DataRetention,
        &[
            "retain", "retention", "store", "storage", "keep", "archive", "preserve", "maintain",
            "hold", "duration", "period", "timeline", "deletion", "purge", "erase", "disposal",
            "record keeping", "life cycle", "expiry", "rolling period",
        ],
    ),
    (
        Domain::DataSharing,
        &[
            "share", "transfer", "disclose", "disclosure", "distribute", "transmit", "exchange",
            "third party", "partner", "vendor", "affiliate", "subsidiary", "processor",
            "service provider", "outsource", "cross-border", "international transfer",
            "recipient", "sell", "rent", "monetize", "broker", "joint venture",
        ],
    ),
    (
        Domain::Consent,
        &[
            "consent", "agree", "agreement", "permission", "permit", "allow", "authorization",
            "opt-in", "opt-out", "subscribe", "acknowledge", "accept", "assent", "voluntary",
            "withdraw", "revoke", "choice", "preference", "affirmative action", "unconditional",
        ],
    ),
    (
        Domain::SecurityPractices,
        &[
            "security", "secure", "safeguard", "protect", "protection", "encryption",
            "encrypted", "cryptography", "firewall", "hashing", "salt", "access control",
            "authentication", "authorization", "integrity", "confidentiality", "ISO",
            "ISO 27001", "SOC2", "audit", "vulnerability", "patch", "ssl", "tls", "https",
            "physical security", "technical measures", "organizational measures",
        ],
    ),
    (
        Domain::BreachResponse,
        &[
            "breach", "incident", "compromise", "hack", "leak", "loss", "unauthorized access",
            "report", "notify", "notification", "alert", "inform", "mitigate", "remedy",
            "CERT-In", "CSIRT", "response team", "root cause analysis", "forensic",
            "Data Protection Board", "6 hours",
        ],
    ),
    (
        Domain::UserRights,
        &[
            "right to", "access", "rectify", "correction", "correct", "update", "modify",
            "delete", "erasure", "forget", "withdraw", "portability", "download", "copy",
            "review", "restrict", "object", "nominate", "nominee", "representative", "summary",
        ],
    ),
    (
        Domain::Grievance,
        &[
            "grievance", "complaint", "concern", "dispute", "redressal", "officer", "nodal",
            "contact", "support", "helpdesk", "ombudsman", "resolution", "ticket", "escalation",
            "email", "address", "phone", "feedback", "15 days", "24 hours",
        ],
    ),
    (
        Domain::PolicyChanges,
        &[
            "change", "update", "modify", "amend", "alter", "revise", "revision", "version",
            "effective date", "notification", "notice", "inform", "alert", "post", "publish",
            "discretion",
        ],
    ),
    (
        Domain::Liability,
        &[
            "liability", "liable", "responsible", "responsibility", "indemnify", "indemnity",
            "guarantee", "warranty", "warrant", "damages", "loss", "risk", "disclaimer",
            "limitation", "exclude", "hold harmless",
        ],
    ),
    (
        Domain::IntermediaryDuties,
        &[
            "intermediary", "content", "upload", "publish", "host", "transmit", "remove",
            "takedown", "disable", "block", "due diligence", "rules", "regulations", "unlawful",
            "prohibited", "court order", "agency", "law enforcement", "Chief Compliance Officer",
            "Nodal Contact Person",
        ],
    ),
    (
        Domain::SensitiveData,
        &[
            "sensitive", "spdi", "financial", "bank", "credit card", "payment", "password",
            "biometric", "physical", "physiological", "mental health", "medical", "records",
            "history", "sexual", "orientation", "caste", "tribe", "religious", "political",
            "transgender status", "intersex status",
        ],
    ),
    (
        Domain::ChildrenData,
        &[
            "child", "children", "minor", "under 18", "age", "parent", "parental", "guardian",
            "verifiable", "verification", "detrimental", "well-being", "tracking", "monitoring",
            "targeted advertising", "behavioral monitoring",
        ],
    ),
    (
        Domain::LoggingAudit,
        &[
            "log", "logging", "audit trail", "system event", "timestamp", "NTP", "synchronized",
            "rolling", "period", "network", "traffic", "IP address", "access log", "ICT logs",
            "180 days",
        ],
    ),
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_domain_labels() {
        assert_eq!(normalize_label("data_retention"), "DATA_RETENTION");
        assert_eq!(normalize_label(" Data_Sharing "), "DATA_SHARING");
        assert_eq!(normalize_label("SECURITY_PRACTICES"), "SECURITY_PRACTICES");
        assert_eq!(normalize_label("children data"), "CHILDREN_DATA");
        assert_eq!(normalize_label("breach-response"), "BREACH_RESPONSE");
    }

    #[test]
    fn parse_round_trips_every_label() {
        for domain in Domain::ALL {
            assert_eq!(domain.as_str().parse::<Domain>(), Ok(domain));
        }
    }

    #[test]
    fn parse_rejects_unknown_label() {
        let err = "MARKETING".parse::<Domain>().unwrap_err();
        assert_eq!(err, UnknownDomain("MARKETING".into()));
    }

    #[test]
    fn serde_uses_canonical_labels() {
        let json = serde_json::to_string(&Domain::ChildrenData).unwrap();
        assert_eq!(json, "\"CHILDREN_DATA\"");
        let parsed: Domain = serde_json::from_str("\"LOGGING_AUDIT\"").unwrap();
        assert_eq!(parsed, Domain::LoggingAudit);
    }

    #[test]
    fn every_domain_has_keywords() {
        for domain in Domain::ALL {
            assert!(
                KEYWORD_TABLE.iter().any(|(d, kws)| *d == domain && !kws.is_empty()),
                "{domain} has no keywords"
            );
        }
    }
}
