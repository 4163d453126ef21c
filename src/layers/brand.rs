use super::{LayerEvaluator, LayerResult};
use crate::config::{BrandPoints, RuleConfig, StatusThresholds};
use crate::enrichment::EnrichmentContext;
use crate::features::UrlFeatures;

/// Brand impersonation: hosts carrying a known brand token (or typosquat)
/// outside the brand's own domain, worsened by social-pressure keywords.
pub struct BrandLayer {
    points: BrandPoints,
    thresholds: StatusThresholds,
    weight: f32,
}

impl BrandLayer {
    pub fn from_config(config: &RuleConfig) -> Self {
        Self {
            points: config.points.brand.clone(),
            thresholds: config.status.brand,
            weight: config.weights.brand,
        }
    }
}

impl LayerEvaluator for BrandLayer {
    fn name(&self) -> &'static str {
        "brand"
    }

    fn weight(&self) -> f32 {
        self.weight
    }

    fn evaluate(&self, features: &UrlFeatures, _ctx: &EnrichmentContext) -> LayerResult {
        let mut score = 0;
        let mut findings = Vec::new();

        if features.mimics_known_brand {
            score += self.points.impersonation;
            match &features.matched_brand {
                Some(brand) => findings.push(format!(
                    "Host {} imitates the {brand} brand without being its official domain",
                    features.host
                )),
                None => findings.push(format!(
                    "Host {} imitates a well-known brand",
                    features.host
                )),
            }

            if features.has_suspicious_keywords {
                score += self.points.keyword_context_bonus;
                findings.push(format!(
                    "Impersonation is combined with {} pressure keyword(s) in the URL",
                    features.suspicious_keyword_count
                ));
            }
        }

        LayerResult::build(
            score,
            self.weight,
            self.thresholds,
            findings,
            "No brand impersonation detected",
        )
    }
}
