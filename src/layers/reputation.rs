use super::{LayerEvaluator, LayerResult};
use crate::config::{ReputationPoints, RuleConfig, StatusThresholds};
use crate::enrichment::EnrichmentContext;
use crate::features::UrlFeatures;

/// Threat intelligence: blacklist membership and WHOIS-derived domain age.
/// Unknown data contributes nothing; a freshly registered domain or a
/// blacklisted host dominates the layer.
pub struct ReputationLayer {
    points: ReputationPoints,
    thresholds: StatusThresholds,
    weight: f32,
}

impl ReputationLayer {
    pub fn from_config(config: &RuleConfig) -> Self {
        Self {
            points: config.points.reputation.clone(),
            thresholds: config.status.reputation,
            weight: config.weights.reputation,
        }
    }
}

impl LayerEvaluator for ReputationLayer {
    fn name(&self) -> &'static str {
        "reputation"
    }

    fn weight(&self) -> f32 {
        self.weight
    }

    fn evaluate(&self, _features: &UrlFeatures, ctx: &EnrichmentContext) -> LayerResult {
        let mut score = 0;
        let mut findings = Vec::new();
        let reputation = &ctx.reputation;

        if let Some((first, rest)) = reputation.blacklist_hits.split_first() {
            let extra = (rest.len() as i32 * self.points.blacklist_extra_hit)
                .min(self.points.blacklist_extra_cap);
            score += self.points.blacklist_first_hit + extra;
            findings.push(format!(
                "Domain is listed on {} blacklist(s), first: {first}",
                reputation.blacklist_hits.len()
            ));
        }

        if let Some(age) = reputation.domain_age_days {
            if age < self.points.young_domain_days {
                score += self.points.young_domain;
                findings.push(format!(
                    "Domain was registered only {age} day(s) ago"
                ));
            } else if age < self.points.recent_domain_days {
                score += self.points.recent_domain;
                findings.push(format!("Domain is recently registered ({age} days old)"));
            }
        }

        LayerResult::build(
            score,
            self.weight,
            self.thresholds,
            findings,
            "No negative reputation data on record",
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::enrichment::ReputationRecord;
    use crate::layers::LayerStatus;

    fn layer() -> ReputationLayer {
        ReputationLayer::from_config(&RuleConfig::default())
    }

    fn evaluate(record: ReputationRecord) -> LayerResult {
        let mut ctx = EnrichmentContext::unknown();
        ctx.reputation = record;
        layer().evaluate(&UrlFeatures::default(), &ctx)
    }

    #[test]
    fn unknown_reputation_passes() {
        let result = evaluate(ReputationRecord::unknown());
        assert_eq!(result.score, 0);
        assert_eq!(result.status, LayerStatus::Pass);
    }

    #[test]
    fn single_blacklist_hit_fails() {
        let result = evaluate(ReputationRecord {
            blacklist_hits: vec!["openphish".to_string()],
            domain_age_days: None,
        });
        assert_eq!(result.score, 50);
        assert_eq!(result.status, LayerStatus::Fail);
    }

    #[test]
    fn extra_blacklist_hits_are_capped() {
        let result = evaluate(ReputationRecord {
            blacklist_hits: (0..6).map(|i| format!("list-{i}")).collect(),
            domain_age_days: None,
        });
        // 50 + min(5 * 10, 20) = 70.
        assert_eq!(result.score, 70);
    }

    #[test]
    fn domain_age_bands_score_as_configured() {
        let result = evaluate(ReputationRecord {
            blacklist_hits: vec![],
            domain_age_days: Some(10),
        });
        assert_eq!(result.score, 35);

        let result = evaluate(ReputationRecord {
            blacklist_hits: vec![],
            domain_age_days: Some(60),
        });
        assert_eq!(result.score, 15);
        assert_eq!(result.status, LayerStatus::Warn);

        let result = evaluate(ReputationRecord {
            blacklist_hits: vec![],
            domain_age_days: Some(400),
        });
        assert_eq!(result.score, 0);
    }
}
