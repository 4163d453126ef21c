pub mod dns;
pub mod whois;

use chrono::{DateTime, Utc};
use serde::Serialize;

/// Resolved IP/geo data for the analyzed host. All fields optional: a
/// failed or skipped lookup yields [`GeoRecord::unknown`] and the engine
/// carries on.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct GeoRecord {
    pub ip: Option<String>,
    pub country: Option<String>,
    pub region: Option<String>,
    pub city: Option<String>,
    pub org: Option<String>,
    pub isp: Option<String>,
}

impl GeoRecord {
    pub fn unknown() -> Self {
        Self::default()
    }
}

/// WHOIS registration data. Unknown placeholder on lookup failure.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct WhoisRecord {
    pub registrar: Option<String>,
    pub registration_date: Option<DateTime<Utc>>,
    pub expiration_date: Option<DateTime<Utc>>,
    pub name_servers: Vec<String>,
    pub registrant_country: Option<String>,
    pub registrant_org: Option<String>,
}

impl WhoisRecord {
    pub fn unknown() -> Self {
        Self::default()
    }

    /// Domain age in days at `now`, when the registration date is known.
    pub fn age_days(&self, now: DateTime<Utc>) -> Option<u32> {
        self.registration_date
            .map(|created| (now - created).num_days().max(0) as u32)
    }
}

/// Certificate metadata supplied by a [`CertificateInspector`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CertificateInfo {
    pub is_valid: bool,
    pub issuer: Option<String>,
    pub expiry_date: Option<DateTime<Utc>>,
    /// 0-100; values below the configured floor count against transport.
    pub trust_score: u8,
}

impl CertificateInfo {
    /// Neutral placeholder: treated as valid with a middling trust score
    /// so absent certificate data never penalizes a site.
    pub fn unknown() -> Self {
        Self {
            is_valid: true,
            issuer: None,
            expiry_date: None,
            trust_score: 60,
        }
    }
}

/// Pre-computed behavioral findings from an external probe. The engine
/// only consumes these booleans; it never simulates page behavior itself.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct BehavioralSignals {
    pub forced_redirects: bool,
    pub keylogger_patterns: bool,
    pub dom_manipulation: bool,
}

impl BehavioralSignals {
    pub fn none() -> Self {
        Self::default()
    }

    pub fn any(&self) -> bool {
        self.forced_redirects || self.keylogger_patterns || self.dom_manipulation
    }
}

/// Reputation data from an external threat-intelligence provider.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ReputationRecord {
    pub blacklist_hits: Vec<String>,
    pub domain_age_days: Option<u32>,
}

impl ReputationRecord {
    pub fn unknown() -> Self {
        Self::default()
    }
}

/// Everything the layer evaluators may consult beyond the URL features.
/// Fully materialized before evaluation starts; evaluators never perform
/// lookups of their own.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct EnrichmentContext {
    pub geo: GeoRecord,
    pub whois: WhoisRecord,
    pub certificate: Option<CertificateInfo>,
    pub behavioral: BehavioralSignals,
    pub reputation: ReputationRecord,
}

impl EnrichmentContext {
    /// Context with every collaborator unavailable. Analyses run against
    /// this degrade gracefully instead of failing.
    pub fn unknown() -> Self {
        Self::default()
    }
}

/// Supplies certificate metadata for a host, or `None` when unavailable.
pub trait CertificateInspector: Send + Sync {
    fn inspect(&self, host: &str) -> Option<CertificateInfo>;
}

/// Supplies pre-computed behavioral findings for a page.
pub trait BehavioralProbe: Send + Sync {
    fn probe(&self, url: &str, html: Option<&str>) -> BehavioralSignals;
}

/// Supplies blacklist and domain-age intelligence for a host.
pub trait ReputationProvider: Send + Sync {
    fn lookup(&self, host: &str) -> ReputationRecord;
}

/// Default inspector: no certificate data available.
pub struct NullCertificateInspector;

impl CertificateInspector for NullCertificateInspector {
    fn inspect(&self, _host: &str) -> Option<CertificateInfo> {
        None
    }
}

/// Default probe: no behavioral signals.
pub struct NullBehavioralProbe;

impl BehavioralProbe for NullBehavioralProbe {
    fn probe(&self, _url: &str, _html: Option<&str>) -> BehavioralSignals {
        BehavioralSignals::none()
    }
}

/// Default provider: no reputation data.
pub struct NullReputationProvider;

impl ReputationProvider for NullReputationProvider {
    fn lookup(&self, _host: &str) -> ReputationRecord {
        ReputationRecord::unknown()
    }
}
