use super::{LayerEvaluator, LayerResult};
use crate::config::{InfrastructurePoints, RuleConfig, StatusThresholds};
use crate::enrichment::EnrichmentContext;
use crate::features::UrlFeatures;

/// Domain and hosting infrastructure: tunnel providers, throwaway domain
/// patterns, raw-IP hosts, abused TLDs, shorteners, subdomain stuffing.
pub struct InfrastructureLayer {
    points: InfrastructurePoints,
    thresholds: StatusThresholds,
    weight: f32,
}

impl InfrastructureLayer {
    pub fn from_config(config: &RuleConfig) -> Self {
        Self {
            points: config.points.infrastructure.clone(),
            thresholds: config.status.infrastructure,
            weight: config.weights.infrastructure,
        }
    }
}

impl LayerEvaluator for InfrastructureLayer {
    fn name(&self) -> &'static str {
        "infrastructure"
    }

    fn weight(&self) -> f32 {
        self.weight
    }

    fn evaluate(&self, features: &UrlFeatures, _ctx: &EnrichmentContext) -> LayerResult {
        let mut score = 0;
        let mut findings = Vec::new();

        if let Some(tunnel) = &features.tunnel_service {
            score += self.points.tunnel_service;
            findings.push(format!(
                "Hosted on tunnel/ephemeral provider {tunnel}, commonly abused for short-lived phishing pages"
            ));
        }

        if features.is_dynamic_domain {
            score += self.points.dynamic_domain;
            findings.push(format!(
                "Host {} looks auto-generated or temporary",
                features.host
            ));
        }

        if features.has_ip_address_host {
            score += self.points.ip_host;
            findings.push(format!(
                "URL addresses the server by raw IP ({}) instead of a domain name",
                features.host
            ));
        }

        if features.suspicious_tld {
            score += self.points.suspicious_tld;
            findings.push(format!(
                "Domain uses a top-level domain with a high abuse rate ({})",
                features.host
            ));
        }

        if features.is_known_shortener {
            score += self.points.shortener;
            findings.push("URL goes through a link shortener, hiding the real destination".to_string());
        }

        if features.has_subdomains {
            score += self.points.deep_subdomains;
            findings.push(format!(
                "Unusually deep subdomain nesting ({} labels)",
                features.subdomain_depth
            ));
        }

        LayerResult::build(
            score,
            self.weight,
            self.thresholds,
            findings,
            "No infrastructure anomalies detected",
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::FeatureExtractor;
    use crate::layers::LayerStatus;

    fn evaluate(url: &str) -> LayerResult {
        let config = RuleConfig::default();
        let features = FeatureExtractor::new(config.lists.clone())
            .extract(url, None)
            .unwrap();
        InfrastructureLayer::from_config(&config)
            .evaluate(&features, &EnrichmentContext::unknown())
    }

    #[test]
    fn tunnel_host_fails_with_high_contribution() {
        let result = evaluate("https://abc123.ngrok.io");
        // Tunnel alone contributes 45 before weighting; dynamic stacking on top.
        assert!(result.score >= 45);
        assert_eq!(result.status, LayerStatus::Fail);
    }

    #[test]
    fn ip_host_fails() {
        let result = evaluate("http://192.168.1.1/login");
        assert_eq!(result.status, LayerStatus::Fail);
        assert!(result
            .findings
            .iter()
            .any(|f| f.contains("raw IP")));
    }

    #[test]
    fn suspicious_tld_alone_warns() {
        let result = evaluate("https://innocuous-name.tk");
        assert_eq!(result.score, 25);
        assert_eq!(result.status, LayerStatus::Warn);
    }

    #[test]
    fn clean_host_passes_with_clean_finding() {
        let result = evaluate("https://www.example.com");
        assert_eq!(result.score, 0);
        assert_eq!(result.status, LayerStatus::Pass);
        assert_eq!(result.findings.len(), 1);
    }
}
