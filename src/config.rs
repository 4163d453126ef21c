use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::error::AnalysisError;

/// The single versioned rule table: every list, point value, weight and
/// threshold the engine consults lives here. Defaults are the canonical
/// values; a YAML file can override any section.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RuleConfig {
    pub version: String,
    pub lists: ListConfig,
    pub points: PointConfig,
    pub weights: WeightConfig,
    pub status: StatusConfig,
    pub verdict: VerdictThresholds,
    pub confidence: ConfidenceConfig,
}

impl Default for RuleConfig {
    fn default() -> Self {
        Self {
            version: env!("CARGO_PKG_VERSION").to_string(),
            lists: ListConfig::default(),
            points: PointConfig::default(),
            weights: WeightConfig::default(),
            status: StatusConfig::default(),
            verdict: VerdictThresholds::default(),
            confidence: ConfidenceConfig::default(),
        }
    }
}

impl RuleConfig {
    pub fn load_from_file(path: &Path) -> Result<Self, AnalysisError> {
        let content = fs::read_to_string(path)?;
        let config: RuleConfig = serde_yaml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject weight and threshold combinations that would make scoring
    /// meaningless before any URL is analyzed.
    pub fn validate(&self) -> Result<(), AnalysisError> {
        for (name, weight) in self.weights.named() {
            if !(weight > 0.0 && weight <= 1.0) {
                return Err(AnalysisError::Config(format!(
                    "layer weight for {name} must be in (0, 1], got {weight}"
                )));
            }
        }
        for (name, thresholds) in self.status.named() {
            if thresholds.warn >= thresholds.fail {
                return Err(AnalysisError::Config(format!(
                    "warn threshold must be below fail threshold for {name} ({} >= {})",
                    thresholds.warn, thresholds.fail
                )));
            }
        }
        if self.verdict.suspicious >= self.verdict.phishing {
            return Err(AnalysisError::Config(format!(
                "suspicious verdict threshold {} must be below phishing threshold {}",
                self.verdict.suspicious, self.verdict.phishing
            )));
        }
        if self.verdict.medium_threat >= self.verdict.high_threat {
            return Err(AnalysisError::Config(format!(
                "medium threat threshold {} must be below high threat threshold {}",
                self.verdict.medium_threat, self.verdict.high_threat
            )));
        }
        if self.lists.keyword_flag_threshold == 0 {
            return Err(AnalysisError::Config(
                "keyword_flag_threshold must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

/// Fixed lookup lists consulted by the feature extractor.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ListConfig {
    /// TLDs associated with free or heavily abused registrars. Entries
    /// carry the leading dot and are matched as host suffixes.
    pub suspicious_tlds: Vec<String>,
    pub shorteners: Vec<String>,
    pub tunnel_services: Vec<String>,
    pub brands: Vec<String>,
    pub suspicious_keywords: Vec<String>,
    /// Keyword count at which the "suspicious keywords" flag fires.
    /// 3 against the 14-entry default list.
    pub keyword_flag_threshold: usize,
}

impl Default for ListConfig {
    fn default() -> Self {
        Self {
            suspicious_tlds: [
                ".tk", ".ml", ".ga", ".cf", ".gq", ".top", ".click", ".xyz", ".work", ".link",
                ".info", ".biz", ".icu", ".cc", ".ws", ".site", ".fun", ".shop", ".rest", ".buzz",
                ".monster", ".cam", ".quest", ".lat", ".pw",
            ]
            .iter()
            .map(|s| s.to_string())
            .collect(),
            shorteners: [
                "bit.ly",
                "tinyurl",
                "t.co",
                "goo.gl",
                "ow.ly",
                "is.gd",
                "cutt.ly",
                "rb.gy",
                "tiny.cc",
                "v.gd",
                "shorturl.at",
            ]
            .iter()
            .map(|s| s.to_string())
            .collect(),
            tunnel_services: [
                "ngrok.io",
                "ngrok-free.app",
                "trycloudflare.com",
                "loca.lt",
                "serveo.net",
                "localtunnel.me",
                "pagekite.me",
                "telebit.io",
            ]
            .iter()
            .map(|s| s.to_string())
            .collect(),
            brands: [
                "paypal",
                "amazon",
                "apple",
                "microsoft",
                "google",
                "netflix",
                "facebook",
                "instagram",
                "chase",
                "wellsfargo",
                "bankofamerica",
                "dhl",
                "fedex",
                "usps",
                "ebay",
                "coinbase",
                "binance",
            ]
            .iter()
            .map(|s| s.to_string())
            .collect(),
            suspicious_keywords: [
                "verify",
                "secure",
                "account",
                "update",
                "confirm",
                "login",
                "signin",
                "banking",
                "suspended",
                "urgent",
                "alert",
                "unlock",
                "restore",
                "password",
            ]
            .iter()
            .map(|s| s.to_string())
            .collect(),
            keyword_flag_threshold: 3,
        }
    }
}

/// Per-rule point contributions, grouped by layer.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PointConfig {
    pub infrastructure: InfrastructurePoints,
    pub transport: TransportPoints,
    pub content: ContentPoints,
    pub brand: BrandPoints,
    pub behavioral: BehavioralPoints,
    pub reputation: ReputationPoints,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct InfrastructurePoints {
    pub tunnel_service: i32,
    pub dynamic_domain: i32,
    pub ip_host: i32,
    pub suspicious_tld: i32,
    pub shortener: i32,
    pub deep_subdomains: i32,
}

impl Default for InfrastructurePoints {
    fn default() -> Self {
        Self {
            tunnel_service: 45,
            dynamic_domain: 30,
            ip_host: 35,
            suspicious_tld: 25,
            shortener: 15,
            deep_subdomains: 10,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TransportPoints {
    pub plain_http: i32,
    pub invalid_certificate: i32,
    pub low_trust_certificate: i32,
    /// Trust score below which a certificate counts as low-trust.
    pub trust_score_floor: u8,
}

impl Default for TransportPoints {
    fn default() -> Self {
        Self {
            plain_http: 25,
            invalid_certificate: 20,
            low_trust_certificate: 10,
            trust_score_floor: 50,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ContentPoints {
    pub credential_forms: i32,
    pub obfuscated_script: i32,
    pub external_post_targets: i32,
    pub hidden_fields: i32,
    /// Hidden inputs at or above this count contribute points.
    pub hidden_field_threshold: usize,
}

impl Default for ContentPoints {
    fn default() -> Self {
        Self {
            credential_forms: 28,
            obfuscated_script: 32,
            external_post_targets: 22,
            hidden_fields: 10,
            hidden_field_threshold: 3,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BrandPoints {
    pub impersonation: i32,
    /// Extra points when impersonation coincides with keyword pressure.
    pub keyword_context_bonus: i32,
}

impl Default for BrandPoints {
    fn default() -> Self {
        Self {
            impersonation: 38,
            keyword_context_bonus: 12,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BehavioralPoints {
    pub forced_redirects: i32,
    pub keylogger_patterns: i32,
    pub dom_manipulation: i32,
}

impl Default for BehavioralPoints {
    fn default() -> Self {
        Self {
            forced_redirects: 30,
            keylogger_patterns: 40,
            dom_manipulation: 20,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ReputationPoints {
    pub blacklist_first_hit: i32,
    pub blacklist_extra_hit: i32,
    pub blacklist_extra_cap: i32,
    pub young_domain: i32,
    pub recent_domain: i32,
    pub young_domain_days: u32,
    pub recent_domain_days: u32,
}

impl Default for ReputationPoints {
    fn default() -> Self {
        Self {
            blacklist_first_hit: 50,
            blacklist_extra_hit: 10,
            blacklist_extra_cap: 20,
            young_domain: 35,
            recent_domain: 15,
            young_domain_days: 30,
            recent_domain_days: 90,
        }
    }
}

/// Relative layer weights for the weighted-sum aggregation.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WeightConfig {
    pub infrastructure: f32,
    pub transport: f32,
    pub content: f32,
    pub brand: f32,
    pub behavioral: f32,
    pub reputation: f32,
}

impl Default for WeightConfig {
    fn default() -> Self {
        Self {
            infrastructure: 0.30,
            transport: 0.15,
            content: 0.15,
            brand: 0.20,
            behavioral: 0.10,
            reputation: 0.10,
        }
    }
}

impl WeightConfig {
    fn named(&self) -> [(&'static str, f32); 6] {
        [
            ("infrastructure", self.infrastructure),
            ("transport", self.transport),
            ("content", self.content),
            ("brand", self.brand),
            ("behavioral", self.behavioral),
            ("reputation", self.reputation),
        ]
    }
}

/// Pass/Warn/Fail cutoffs applied to each layer's own 0-100 score.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct StatusThresholds {
    pub warn: u8,
    pub fail: u8,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StatusConfig {
    pub infrastructure: StatusThresholds,
    pub transport: StatusThresholds,
    pub content: StatusThresholds,
    pub brand: StatusThresholds,
    pub behavioral: StatusThresholds,
    pub reputation: StatusThresholds,
}

impl Default for StatusConfig {
    fn default() -> Self {
        Self {
            infrastructure: StatusThresholds { warn: 15, fail: 40 },
            transport: StatusThresholds { warn: 20, fail: 35 },
            content: StatusThresholds { warn: 15, fail: 35 },
            brand: StatusThresholds { warn: 15, fail: 40 },
            behavioral: StatusThresholds { warn: 15, fail: 40 },
            reputation: StatusThresholds { warn: 15, fail: 40 },
        }
    }
}

impl StatusConfig {
    fn named(&self) -> [(&'static str, StatusThresholds); 6] {
        [
            ("infrastructure", self.infrastructure),
            ("transport", self.transport),
            ("content", self.content),
            ("brand", self.brand),
            ("behavioral", self.behavioral),
            ("reputation", self.reputation),
        ]
    }
}

/// Verdict and threat-level cutoffs applied to the final risk score, plus
/// the corroboration floors used when independent layers agree.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct VerdictThresholds {
    pub phishing: u8,
    pub suspicious: u8,
    pub high_threat: u8,
    pub medium_threat: u8,
    /// Risk floor when a brand-impersonation failure is corroborated by an
    /// independent signal (abusive TLD or keyword flood).
    pub corroborated_brand_floor: u8,
    /// Risk floor for a single definitive signal (tunnel host) or a layer
    /// failure corroborated by two or more non-passing layers.
    pub corroborated_floor: u8,
}

impl Default for VerdictThresholds {
    fn default() -> Self {
        Self {
            phishing: 70,
            suspicious: 40,
            high_threat: 65,
            medium_threat: 35,
            corroborated_brand_floor: 72,
            corroborated_floor: 45,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ConfidenceConfig {
    pub base: u8,
    pub strong_signal_bonus: u8,
    pub https_bonus: u8,
    pub extreme_band_bonus: u8,
    pub extreme_high: u8,
    pub extreme_low: u8,
    pub cap: u8,
}

impl Default for ConfidenceConfig {
    fn default() -> Self {
        Self {
            base: 80,
            strong_signal_bonus: 15,
            https_bonus: 5,
            extreme_band_bonus: 10,
            extreme_high: 70,
            extreme_low: 20,
            cap: 99,
        }
    }
}
