use serde::Serialize;
use std::collections::BTreeMap;
use std::time::Duration;

use chrono::Utc;

use crate::aggregator::{aggregate, ThreatLevel, Verdict};
use crate::config::RuleConfig;
use crate::enrichment::dns::IpResolver;
use crate::enrichment::whois::WhoisClient;
use crate::enrichment::{
    BehavioralProbe, CertificateInfo, CertificateInspector, EnrichmentContext,
    NullBehavioralProbe, NullCertificateInspector, NullReputationProvider, ReputationProvider,
};
use crate::error::AnalysisError;
use crate::explanation::explain;
use crate::features::{FeatureExtractor, UrlFeatures};
use crate::layers::{LayerResult, LayerSet};

/// One analysis request. Immutable once submitted; optional fields let a
/// caller hand over data it already holds instead of having the engine
/// collect it.
#[derive(Debug, Clone, Default)]
pub struct AnalysisInput {
    pub url: String,
    pub ip_address: Option<String>,
    pub hosting_country: Option<String>,
    pub html_content: Option<String>,
    pub certificate: Option<CertificateInfo>,
}

impl AnalysisInput {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            ..Self::default()
        }
    }
}

/// Pipeline stages, in order. `Failed` is terminal and only reachable
/// from a URL that cannot be parsed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum AnalysisStage {
    Idle,
    Extracting,
    Enriching,
    Evaluating,
    Aggregating,
    Explaining,
    Done,
    Failed,
}

impl AnalysisStage {
    pub fn percent(self) -> u8 {
        match self {
            AnalysisStage::Idle => 0,
            AnalysisStage::Extracting => 15,
            AnalysisStage::Enriching => 40,
            AnalysisStage::Evaluating => 70,
            AnalysisStage::Aggregating => 85,
            AnalysisStage::Explaining => 95,
            AnalysisStage::Done => 100,
            AnalysisStage::Failed => 100,
        }
    }
}

/// Observer for staged progress feedback. Cosmetic: reporting has no
/// effect on the result.
pub type ProgressObserver = Box<dyn Fn(AnalysisStage, u8) + Send + Sync>;

/// The complete outcome of one analysis. Built once, never mutated.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnalysisResult {
    pub url: String,
    pub risk_score: u8,
    pub verdict: Verdict,
    pub threat_level: ThreatLevel,
    pub confidence: u8,
    pub layers: BTreeMap<String, LayerResult>,
    pub red_flags: Vec<String>,
    pub recommendations: Vec<String>,
    pub features: UrlFeatures,
}

/// Sequences extraction, enrichment, evaluation, aggregation and
/// explanation. Stateless across requests: two calls with identical
/// inputs and identical provider responses yield identical results.
pub struct Analyzer {
    config: RuleConfig,
    extractor: FeatureExtractor,
    layers: LayerSet,
    ip_resolver: Option<IpResolver>,
    whois: Option<WhoisClient>,
    certificate_inspector: Box<dyn CertificateInspector>,
    behavioral_probe: Box<dyn BehavioralProbe>,
    reputation_provider: Box<dyn ReputationProvider>,
    observer: Option<ProgressObserver>,
}

impl Analyzer {
    /// Offline engine: no network collectors, null providers. Everything
    /// the layers see comes from the input itself.
    pub fn new(config: RuleConfig) -> Self {
        let extractor = FeatureExtractor::new(config.lists.clone());
        let layers = LayerSet::from_config(&config);
        Self {
            config,
            extractor,
            layers,
            ip_resolver: None,
            whois: None,
            certificate_inspector: Box::new(NullCertificateInspector),
            behavioral_probe: Box::new(NullBehavioralProbe),
            reputation_provider: Box::new(NullReputationProvider),
            observer: None,
        }
    }

    /// Enable DNS and WHOIS collection with the given per-lookup timeout.
    pub fn with_network(mut self, timeout: Duration) -> Self {
        self.ip_resolver = Some(IpResolver::new(timeout));
        self.whois = Some(WhoisClient::new(timeout));
        self
    }

    pub fn with_certificate_inspector(mut self, inspector: Box<dyn CertificateInspector>) -> Self {
        self.certificate_inspector = inspector;
        self
    }

    pub fn with_behavioral_probe(mut self, probe: Box<dyn BehavioralProbe>) -> Self {
        self.behavioral_probe = probe;
        self
    }

    pub fn with_reputation_provider(mut self, provider: Box<dyn ReputationProvider>) -> Self {
        self.reputation_provider = provider;
        self
    }

    pub fn with_observer(mut self, observer: ProgressObserver) -> Self {
        self.observer = Some(observer);
        self
    }

    fn report(&self, stage: AnalysisStage) {
        if let Some(observer) = &self.observer {
            observer(stage, stage.percent());
        }
    }

    /// Full analysis: extract, enrich (concurrently, with timeouts),
    /// evaluate, aggregate, explain.
    pub async fn analyze(&self, input: &AnalysisInput) -> Result<AnalysisResult, AnalysisError> {
        self.report(AnalysisStage::Extracting);
        let features = match self
            .extractor
            .extract(&input.url, input.html_content.as_deref())
        {
            Ok(features) => features,
            Err(e) => {
                self.report(AnalysisStage::Failed);
                return Err(e);
            }
        };

        self.report(AnalysisStage::Enriching);
        let ctx = self.enrich(&features, input).await;

        Ok(self.finish(input, features, &ctx))
    }

    /// The pure core: evaluate against an already-materialized context.
    /// Used directly by tests and deterministic callers.
    pub fn analyze_offline(
        &self,
        input: &AnalysisInput,
        ctx: &EnrichmentContext,
    ) -> Result<AnalysisResult, AnalysisError> {
        self.report(AnalysisStage::Extracting);
        let features = match self
            .extractor
            .extract(&input.url, input.html_content.as_deref())
        {
            Ok(features) => features,
            Err(e) => {
                self.report(AnalysisStage::Failed);
                return Err(e);
            }
        };

        Ok(self.finish(input, features, ctx))
    }

    fn finish(
        &self,
        input: &AnalysisInput,
        features: UrlFeatures,
        ctx: &EnrichmentContext,
    ) -> AnalysisResult {
        self.report(AnalysisStage::Evaluating);
        let layers = self.layers.evaluate_all(&features, ctx);

        self.report(AnalysisStage::Aggregating);
        let aggregate = aggregate(&layers, &features, ctx, &self.config);

        self.report(AnalysisStage::Explaining);
        let explanation = explain(&features, ctx, aggregate.verdict, &self.config);

        self.report(AnalysisStage::Done);
        log::info!(
            "analyzed {}: score {} verdict {} threat {}",
            input.url,
            aggregate.risk_score,
            aggregate.verdict,
            aggregate.threat_level
        );

        AnalysisResult {
            url: input.url.clone(),
            risk_score: aggregate.risk_score,
            verdict: aggregate.verdict,
            threat_level: aggregate.threat_level,
            confidence: aggregate.confidence,
            layers,
            red_flags: explanation.red_flags,
            recommendations: explanation.recommendations,
            features,
        }
    }

    /// Materialize the enrichment context. Independent lookups run
    /// concurrently; each degrades to its unknown placeholder on failure,
    /// so enrichment can never fail the analysis.
    async fn enrich(&self, features: &UrlFeatures, input: &AnalysisInput) -> EnrichmentContext {
        let mut ctx = EnrichmentContext::unknown();

        let (geo, whois) = tokio::join!(
            async {
                match &self.ip_resolver {
                    Some(resolver) => Some(resolver.resolve(&features.host).await),
                    None => None,
                }
            },
            async {
                match &self.whois {
                    Some(client) if !features.has_ip_address_host => {
                        Some(client.lookup(&features.host).await)
                    }
                    _ => None,
                }
            }
        );

        if let Some(geo) = geo {
            ctx.geo = geo;
        }
        if let Some(whois) = whois {
            ctx.whois = whois;
        }

        // Caller-supplied context always wins over collected data.
        if let Some(ip) = &input.ip_address {
            ctx.geo.ip = Some(ip.clone());
        }
        if let Some(country) = &input.hosting_country {
            ctx.geo.country = Some(country.clone());
        }

        ctx.certificate = input
            .certificate
            .clone()
            .or_else(|| self.certificate_inspector.inspect(&features.host));

        ctx.behavioral = self
            .behavioral_probe
            .probe(&features.full_url, input.html_content.as_deref());

        ctx.reputation = self.reputation_provider.lookup(&features.host);
        if ctx.reputation.domain_age_days.is_none() {
            ctx.reputation.domain_age_days = ctx.whois.age_days(Utc::now());
        }

        ctx
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    fn analyzer() -> Analyzer {
        Analyzer::new(RuleConfig::default())
    }

    #[test]
    fn invalid_url_fails_without_partial_result() {
        let result = analyzer().analyze_offline(
            &AnalysisInput::new("http://"),
            &EnrichmentContext::unknown(),
        );
        assert!(matches!(result, Err(AnalysisError::InvalidUrl { .. })));
    }

    #[test]
    fn offline_analysis_is_idempotent() {
        let analyzer = analyzer();
        let input = AnalysisInput::new("https://paypal-secure-verify.tk/account");
        let ctx = EnrichmentContext::unknown();

        let first = analyzer.analyze_offline(&input, &ctx).unwrap();
        let second = analyzer.analyze_offline(&input, &ctx).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn progress_observer_sees_stages_in_order() {
        let seen: Arc<Mutex<Vec<AnalysisStage>>> = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let analyzer = Analyzer::new(RuleConfig::default()).with_observer(Box::new(
            move |stage, _percent| {
                sink.lock().unwrap().push(stage);
            },
        ));

        analyzer
            .analyze_offline(
                &AnalysisInput::new("https://example.com"),
                &EnrichmentContext::unknown(),
            )
            .unwrap();

        let stages = seen.lock().unwrap().clone();
        assert_eq!(
            stages,
            vec![
                AnalysisStage::Extracting,
                AnalysisStage::Evaluating,
                AnalysisStage::Aggregating,
                AnalysisStage::Explaining,
                AnalysisStage::Done,
            ]
        );
    }

    #[test]
    fn failed_stage_reported_for_bad_url() {
        let seen: Arc<Mutex<Vec<AnalysisStage>>> = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let analyzer = Analyzer::new(RuleConfig::default()).with_observer(Box::new(
            move |stage, _percent| {
                sink.lock().unwrap().push(stage);
            },
        ));

        let _ = analyzer.analyze_offline(
            &AnalysisInput::new("http://"),
            &EnrichmentContext::unknown(),
        );

        let stages = seen.lock().unwrap().clone();
        assert_eq!(
            stages,
            vec![AnalysisStage::Extracting, AnalysisStage::Failed]
        );
    }

    #[test]
    fn percent_is_monotonic_across_stages() {
        let order = [
            AnalysisStage::Idle,
            AnalysisStage::Extracting,
            AnalysisStage::Enriching,
            AnalysisStage::Evaluating,
            AnalysisStage::Aggregating,
            AnalysisStage::Explaining,
            AnalysisStage::Done,
        ];
        for pair in order.windows(2) {
            assert!(pair[0].percent() < pair[1].percent());
        }
    }

    #[tokio::test]
    async fn offline_analyzer_analyze_matches_offline_path() {
        // With no network collectors and null providers, the async path
        // must produce exactly what the pure path produces.
        let analyzer = analyzer();
        let input = AnalysisInput::new("https://www.google.com");

        let from_async = analyzer.analyze(&input).await.unwrap();
        let from_offline = analyzer
            .analyze_offline(&input, &EnrichmentContext::unknown())
            .unwrap();
        assert_eq!(from_async, from_offline);
    }
}
