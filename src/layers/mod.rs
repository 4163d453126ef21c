pub mod behavioral;
pub mod brand;
pub mod content;
pub mod infrastructure;
pub mod reputation;
pub mod transport;

use serde::Serialize;
use std::collections::BTreeMap;
use std::panic::{catch_unwind, AssertUnwindSafe};

use crate::config::{RuleConfig, StatusThresholds};
use crate::enrichment::EnrichmentContext;
use crate::features::UrlFeatures;

/// Qualitative outcome of one layer against its own thresholds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum LayerStatus {
    Pass,
    Warn,
    Fail,
}

/// One layer's verdict: a clamped sub-score, its status, the findings that
/// produced it, and the weight the aggregator applies.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LayerResult {
    pub score: u8,
    pub status: LayerStatus,
    pub findings: Vec<String>,
    pub weight: f32,
}

impl LayerResult {
    /// Clamp the accumulated score, derive the status, and guarantee a
    /// non-empty findings list.
    pub fn build(
        raw_score: i32,
        weight: f32,
        thresholds: StatusThresholds,
        mut findings: Vec<String>,
        clean_finding: &str,
    ) -> Self {
        let score = raw_score.clamp(0, 100) as u8;
        let status = if score >= thresholds.fail {
            LayerStatus::Fail
        } else if score >= thresholds.warn {
            LayerStatus::Warn
        } else {
            LayerStatus::Pass
        };
        if findings.is_empty() {
            findings.push(clean_finding.to_string());
        }
        Self {
            score,
            status,
            findings,
            weight,
        }
    }

    /// Neutral substitute used when an evaluator faults.
    fn neutral(weight: f32, layer_name: &str) -> Self {
        Self {
            score: 0,
            status: LayerStatus::Pass,
            findings: vec![format!("{layer_name} layer could not be evaluated")],
            weight,
        }
    }
}

/// A pure risk dimension: features (+ enrichment) in, [`LayerResult`] out.
/// Evaluators hold no mutable state and may run in any order.
pub trait LayerEvaluator: Send + Sync {
    fn name(&self) -> &'static str;
    fn weight(&self) -> f32;
    fn evaluate(&self, features: &UrlFeatures, ctx: &EnrichmentContext) -> LayerResult;
}

/// The full set of layer evaluators, built from one rule table.
pub struct LayerSet {
    evaluators: Vec<Box<dyn LayerEvaluator>>,
}

impl LayerSet {
    pub fn from_config(config: &RuleConfig) -> Self {
        Self {
            evaluators: vec![
                Box::new(infrastructure::InfrastructureLayer::from_config(config)),
                Box::new(transport::TransportLayer::from_config(config)),
                Box::new(content::ContentLayer::from_config(config)),
                Box::new(brand::BrandLayer::from_config(config)),
                Box::new(behavioral::BehavioralLayer::from_config(config)),
                Box::new(reputation::ReputationLayer::from_config(config)),
            ],
        }
    }

    /// Run every evaluator. A panicking evaluator is replaced by a neutral
    /// pass-through result so one faulty layer never aborts the analysis.
    pub fn evaluate_all(
        &self,
        features: &UrlFeatures,
        ctx: &EnrichmentContext,
    ) -> BTreeMap<String, LayerResult> {
        let mut results = BTreeMap::new();
        for evaluator in &self.evaluators {
            let outcome = catch_unwind(AssertUnwindSafe(|| evaluator.evaluate(features, ctx)));
            let result = match outcome {
                Ok(result) => result,
                Err(_) => {
                    log::error!(
                        "layer evaluator {} faulted; substituting neutral result",
                        evaluator.name()
                    );
                    LayerResult::neutral(evaluator.weight(), evaluator.name())
                }
            };
            debug_assert!(!result.findings.is_empty());
            results.insert(evaluator.name().to_string(), result);
        }
        results
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn build_clamps_score_and_derives_status() {
        let thresholds = StatusThresholds { warn: 15, fail: 40 };

        let result = LayerResult::build(250, 0.3, thresholds, vec!["x".into()], "clean");
        assert_eq!(result.score, 100);
        assert_eq!(result.status, LayerStatus::Fail);

        let result = LayerResult::build(-10, 0.3, thresholds, vec![], "clean");
        assert_eq!(result.score, 0);
        assert_eq!(result.status, LayerStatus::Pass);

        let result = LayerResult::build(20, 0.3, thresholds, vec!["x".into()], "clean");
        assert_eq!(result.status, LayerStatus::Warn);
    }

    #[test]
    fn build_inserts_clean_finding_when_empty() {
        let thresholds = StatusThresholds { warn: 15, fail: 40 };
        let result = LayerResult::build(0, 0.1, thresholds, vec![], "nothing unusual");
        assert_eq!(result.findings, vec!["nothing unusual".to_string()]);
    }

    #[test]
    fn evaluate_all_covers_every_layer() {
        let config = RuleConfig::default();
        let layers = LayerSet::from_config(&config);
        let features = UrlFeatures::default();
        let ctx = EnrichmentContext::unknown();

        let results = layers.evaluate_all(&features, &ctx);
        let names: Vec<&str> = results.keys().map(String::as_str).collect();
        assert_eq!(
            names,
            vec![
                "behavioral",
                "brand",
                "content",
                "infrastructure",
                "reputation",
                "transport"
            ]
        );
        assert!(results.values().all(|r| !r.findings.is_empty()));
    }

    #[test]
    fn faulting_evaluator_is_contained() {
        struct PanickingLayer;
        impl LayerEvaluator for PanickingLayer {
            fn name(&self) -> &'static str {
                "panicking"
            }
            fn weight(&self) -> f32 {
                0.5
            }
            fn evaluate(&self, _: &UrlFeatures, _: &EnrichmentContext) -> LayerResult {
                panic!("internal fault");
            }
        }

        let layers = LayerSet {
            evaluators: vec![Box::new(PanickingLayer)],
        };
        let results = layers.evaluate_all(&UrlFeatures::default(), &EnrichmentContext::unknown());
        let result = &results["panicking"];
        assert_eq!(result.score, 0);
        assert_eq!(result.status, LayerStatus::Pass);
        assert!(!result.findings.is_empty());
    }
}
