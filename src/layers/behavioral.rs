use super::{LayerEvaluator, LayerResult};
use crate::config::{BehavioralPoints, RuleConfig, StatusThresholds};
use crate::enrichment::EnrichmentContext;
use crate::features::UrlFeatures;

/// Runtime behavior of the page, as reported by an external probe. The
/// layer only scores pre-computed signals; with the default null probe
/// every analysis passes here.
pub struct BehavioralLayer {
    points: BehavioralPoints,
    thresholds: StatusThresholds,
    weight: f32,
}

impl BehavioralLayer {
    pub fn from_config(config: &RuleConfig) -> Self {
        Self {
            points: config.points.behavioral.clone(),
            thresholds: config.status.behavioral,
            weight: config.weights.behavioral,
        }
    }
}

impl LayerEvaluator for BehavioralLayer {
    fn name(&self) -> &'static str {
        "behavioral"
    }

    fn weight(&self) -> f32 {
        self.weight
    }

    fn evaluate(&self, _features: &UrlFeatures, ctx: &EnrichmentContext) -> LayerResult {
        let mut score = 0;
        let mut findings = Vec::new();
        let signals = &ctx.behavioral;

        if signals.forced_redirects {
            score += self.points.forced_redirects;
            findings.push("Page forces redirects away from the requested address".to_string());
        }

        if signals.keylogger_patterns {
            score += self.points.keylogger_patterns;
            findings.push("Scripts register keystroke listeners consistent with keylogging".to_string());
        }

        if signals.dom_manipulation {
            score += self.points.dom_manipulation;
            findings.push("Scripts rewrite page content after load (DOM manipulation)".to_string());
        }

        LayerResult::build(
            score,
            self.weight,
            self.thresholds,
            findings,
            "No hostile page behavior reported",
        )
    }
}
