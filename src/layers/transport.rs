use super::{LayerEvaluator, LayerResult};
use crate::config::{RuleConfig, StatusThresholds, TransportPoints};
use crate::enrichment::EnrichmentContext;
use crate::features::UrlFeatures;

/// Transport security: encryption on the wire and certificate health when
/// an inspector supplied certificate metadata.
pub struct TransportLayer {
    points: TransportPoints,
    thresholds: StatusThresholds,
    weight: f32,
}

impl TransportLayer {
    pub fn from_config(config: &RuleConfig) -> Self {
        Self {
            points: config.points.transport.clone(),
            thresholds: config.status.transport,
            weight: config.weights.transport,
        }
    }
}

impl LayerEvaluator for TransportLayer {
    fn name(&self) -> &'static str {
        "transport"
    }

    fn weight(&self) -> f32 {
        self.weight
    }

    fn evaluate(&self, features: &UrlFeatures, ctx: &EnrichmentContext) -> LayerResult {
        let mut score = 0;
        let mut findings = Vec::new();

        if !features.uses_https {
            score += self.points.plain_http;
            findings.push("Connection is plain HTTP; anything entered travels unencrypted".to_string());
        }

        if let Some(cert) = &ctx.certificate {
            if !cert.is_valid {
                score += self.points.invalid_certificate;
                match &cert.issuer {
                    Some(issuer) => findings.push(format!(
                        "Certificate failed validation (issuer: {issuer})"
                    )),
                    None => findings.push("Certificate failed validation".to_string()),
                }
            } else if cert.trust_score < self.points.trust_score_floor {
                score += self.points.low_trust_certificate;
                findings.push(format!(
                    "Certificate trust score is low ({})",
                    cert.trust_score
                ));
            }
        }

        LayerResult::build(
            score,
            self.weight,
            self.thresholds,
            findings,
            "Transport and certificate checks passed",
        )
    }
}
