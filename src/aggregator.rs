use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;

use crate::config::RuleConfig;
use crate::enrichment::EnrichmentContext;
use crate::features::UrlFeatures;
use crate::layers::{LayerResult, LayerStatus};

/// Final three-way classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub enum Verdict {
    Legitimate,
    Suspicious,
    ConfirmedPhishing,
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Verdict::Legitimate => write!(f, "LEGITIMATE"),
            Verdict::Suspicious => write!(f, "SUSPICIOUS"),
            Verdict::ConfirmedPhishing => write!(f, "CONFIRMED PHISHING"),
        }
    }
}

/// Coarse severity label derived from the same score as the verdict, with
/// its own thresholds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub enum ThreatLevel {
    Low,
    Medium,
    High,
}

impl fmt::Display for ThreatLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ThreatLevel::Low => write!(f, "LOW"),
            ThreatLevel::Medium => write!(f, "MEDIUM"),
            ThreatLevel::High => write!(f, "HIGH"),
        }
    }
}

/// Output of the aggregation step.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Aggregate {
    pub risk_score: u8,
    pub verdict: Verdict,
    pub threat_level: ThreatLevel,
    pub confidence: u8,
}

/// Combine layer results into the final risk score and classification.
///
/// The base is the weighted sum of clamped layer scores. On top of that,
/// definitive signal combinations escalate the score into the band they
/// belong in: a brand-impersonation failure corroborated by an abusive TLD
/// or keyword flood lands in the phishing band, and a tunnel host or any
/// corroborated layer failure is floored at the suspicious band. Floors
/// only ever raise the score, so adding a triggered rule never lowers the
/// result.
pub fn aggregate(
    layers: &BTreeMap<String, LayerResult>,
    features: &UrlFeatures,
    ctx: &EnrichmentContext,
    config: &RuleConfig,
) -> Aggregate {
    let weighted: f32 = layers
        .values()
        .map(|layer| f32::from(layer.score.min(100)) * layer.weight)
        .sum();
    let mut risk = weighted.round().clamp(0.0, 100.0) as u8;

    let fail_count = layers
        .values()
        .filter(|l| l.status == LayerStatus::Fail)
        .count();
    let non_pass_count = layers
        .values()
        .filter(|l| l.status != LayerStatus::Pass)
        .count();

    let brand_failed = layers
        .get("brand")
        .map(|l| l.status == LayerStatus::Fail)
        .unwrap_or(false);

    if brand_failed && (features.suspicious_tld || features.has_suspicious_keywords) {
        risk = risk.max(config.verdict.corroborated_brand_floor);
        log::debug!(
            "brand impersonation corroborated for {}; risk floored at {}",
            features.host,
            config.verdict.corroborated_brand_floor
        );
    }

    if features.tunnel_service.is_some() || (fail_count >= 1 && non_pass_count >= 2) {
        risk = risk.max(config.verdict.corroborated_floor);
    }

    let verdict = verdict_for(risk, config);
    let threat_level = threat_level_for(risk, config);
    let confidence = confidence_for(risk, features, ctx, config);

    Aggregate {
        risk_score: risk,
        verdict,
        threat_level,
        confidence,
    }
}

/// Pure function of the risk score alone.
pub fn verdict_for(risk_score: u8, config: &RuleConfig) -> Verdict {
    if risk_score >= config.verdict.phishing {
        Verdict::ConfirmedPhishing
    } else if risk_score >= config.verdict.suspicious {
        Verdict::Suspicious
    } else {
        Verdict::Legitimate
    }
}

/// Pure function of the risk score alone.
pub fn threat_level_for(risk_score: u8, config: &RuleConfig) -> ThreatLevel {
    if risk_score >= config.verdict.high_threat {
        ThreatLevel::High
    } else if risk_score >= config.verdict.medium_threat {
        ThreatLevel::Medium
    } else {
        ThreatLevel::Low
    }
}

fn confidence_for(
    risk_score: u8,
    features: &UrlFeatures,
    ctx: &EnrichmentContext,
    config: &RuleConfig,
) -> u8 {
    let c = &config.confidence;
    let mut confidence = u32::from(c.base);

    // One definitive high-severity signal makes the call easier to trust.
    if features.tunnel_service.is_some() || features.mimics_known_brand {
        confidence += u32::from(c.strong_signal_bonus);
    }

    let https_ok = features.uses_https
        && ctx.certificate.as_ref().map(|cert| cert.is_valid).unwrap_or(true);
    if https_ok {
        confidence += u32::from(c.https_bonus);
    }

    if risk_score > c.extreme_high || risk_score < c.extreme_low {
        confidence += u32::from(c.extreme_band_bonus);
    }

    confidence.min(u32::from(c.cap)) as u8
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::StatusThresholds;
    use crate::layers::LayerResult;

    fn layer(score: u8, weight: f32, thresholds: StatusThresholds) -> LayerResult {
        LayerResult::build(
            i32::from(score),
            weight,
            thresholds,
            vec!["finding".to_string()],
            "clean",
        )
    }

    fn default_thresholds() -> StatusThresholds {
        StatusThresholds { warn: 15, fail: 40 }
    }

    fn layers_with_scores(scores: &[(&str, u8, f32)]) -> BTreeMap<String, LayerResult> {
        scores
            .iter()
            .map(|(name, score, weight)| {
                (name.to_string(), layer(*score, *weight, default_thresholds()))
            })
            .collect()
    }

    #[test]
    fn weighted_sum_is_clamped_to_100() {
        let config = RuleConfig::default();
        let layers = layers_with_scores(&[
            ("infrastructure", 100, 0.30),
            ("transport", 100, 0.15),
            ("content", 100, 0.15),
            ("brand", 100, 0.20),
            ("behavioral", 100, 0.10),
            ("reputation", 100, 0.10),
        ]);
        let result = aggregate(
            &layers,
            &UrlFeatures::default(),
            &EnrichmentContext::unknown(),
            &config,
        );
        assert_eq!(result.risk_score, 100);
        assert_eq!(result.verdict, Verdict::ConfirmedPhishing);
        assert_eq!(result.threat_level, ThreatLevel::High);
    }

    #[test]
    fn zero_layers_score_zero() {
        let config = RuleConfig::default();
        let layers = layers_with_scores(&[("infrastructure", 0, 0.30), ("brand", 0, 0.20)]);
        let result = aggregate(
            &layers,
            &UrlFeatures::default(),
            &EnrichmentContext::unknown(),
            &config,
        );
        assert_eq!(result.risk_score, 0);
        assert_eq!(result.verdict, Verdict::Legitimate);
        assert_eq!(result.threat_level, ThreatLevel::Low);
    }

    #[test]
    fn verdict_thresholds_are_pure_functions_of_score() {
        let config = RuleConfig::default();
        assert_eq!(verdict_for(39, &config), Verdict::Legitimate);
        assert_eq!(verdict_for(40, &config), Verdict::Suspicious);
        assert_eq!(verdict_for(69, &config), Verdict::Suspicious);
        assert_eq!(verdict_for(70, &config), Verdict::ConfirmedPhishing);

        assert_eq!(threat_level_for(34, &config), ThreatLevel::Low);
        assert_eq!(threat_level_for(35, &config), ThreatLevel::Medium);
        assert_eq!(threat_level_for(65, &config), ThreatLevel::High);
    }

    #[test]
    fn corroborated_brand_failure_lands_in_phishing_band() {
        let config = RuleConfig::default();
        let layers = layers_with_scores(&[
            ("infrastructure", 25, 0.30),
            ("brand", 50, 0.20),
        ]);
        let mut features = UrlFeatures::default();
        features.mimics_known_brand = true;
        features.suspicious_tld = true;

        let result = aggregate(&layers, &features, &EnrichmentContext::unknown(), &config);
        assert!(result.risk_score >= config.verdict.phishing);
        assert_eq!(result.verdict, Verdict::ConfirmedPhishing);
        assert_eq!(result.threat_level, ThreatLevel::High);
    }

    #[test]
    fn corroborated_failure_floors_at_suspicious() {
        let config = RuleConfig::default();
        // Infrastructure fails, transport warns: two non-passing layers.
        let layers = layers_with_scores(&[
            ("infrastructure", 50, 0.30),
            ("transport", 25, 0.15),
        ]);
        let result = aggregate(
            &layers,
            &UrlFeatures::default(),
            &EnrichmentContext::unknown(),
            &config,
        );
        assert!(result.risk_score >= config.verdict.suspicious);
        assert!(result.verdict >= Verdict::Suspicious);
    }

    #[test]
    fn single_uncorroborated_failure_is_not_floored() {
        let config = RuleConfig::default();
        let layers = layers_with_scores(&[("content", 50, 0.15)]);
        let result = aggregate(
            &layers,
            &UrlFeatures::default(),
            &EnrichmentContext::unknown(),
            &config,
        );
        assert_eq!(result.risk_score, 8);
        assert_eq!(result.verdict, Verdict::Legitimate);
    }

    #[test]
    fn tunnel_host_floors_at_suspicious() {
        let config = RuleConfig::default();
        let layers = layers_with_scores(&[("infrastructure", 75, 0.30)]);
        let mut features = UrlFeatures::default();
        features.tunnel_service = Some("ngrok.io".to_string());

        let result = aggregate(&layers, &features, &EnrichmentContext::unknown(), &config);
        assert!(result.risk_score >= config.verdict.suspicious);
        assert!(result.verdict >= Verdict::Suspicious);
    }

    #[test]
    fn adding_a_triggered_layer_never_lowers_risk() {
        let config = RuleConfig::default();
        let base = layers_with_scores(&[("infrastructure", 25, 0.30), ("brand", 50, 0.20)]);
        let mut more = base.clone();
        more.insert(
            "reputation".to_string(),
            layer(50, 0.10, default_thresholds()),
        );

        let features = UrlFeatures::default();
        let ctx = EnrichmentContext::unknown();
        let before = aggregate(&base, &features, &ctx, &config).risk_score;
        let after = aggregate(&more, &features, &ctx, &config).risk_score;
        assert!(after >= before);
    }

    #[test]
    fn confidence_bonuses_accumulate_and_cap() {
        let config = RuleConfig::default();
        let layers = layers_with_scores(&[("brand", 50, 0.20)]);

        let mut features = UrlFeatures::default();
        features.mimics_known_brand = true;
        features.suspicious_tld = true;
        features.uses_https = true;

        let result = aggregate(&layers, &features, &EnrichmentContext::unknown(), &config);
        // 80 base + 15 strong + 5 https + 10 extreme band, capped at 99.
        assert_eq!(result.confidence, 99);

        let features = UrlFeatures {
            uses_https: true,
            ..UrlFeatures::default()
        };
        let clean = layers_with_scores(&[("brand", 0, 0.20)]);
        let result = aggregate(&clean, &features, &EnrichmentContext::unknown(), &config);
        // 80 base + 5 https + 10 extreme-low band.
        assert_eq!(result.confidence, 95);
    }
}
