pub mod aggregator;
pub mod analyzer;
pub mod config;
pub mod enrichment;
pub mod error;
pub mod explanation;
pub mod features;
pub mod layers;

pub use aggregator::{Aggregate, ThreatLevel, Verdict};
pub use analyzer::{AnalysisInput, AnalysisResult, AnalysisStage, Analyzer};
pub use config::RuleConfig;
pub use enrichment::EnrichmentContext;
pub use error::AnalysisError;
pub use features::UrlFeatures;
pub use layers::{LayerResult, LayerStatus};
