pub mod html;

use regex::Regex;
use serde::Serialize;
use std::net::Ipv4Addr;
use url::Url;

use crate::config::ListConfig;
use crate::error::AnalysisError;

/// Flat, typed feature record derived from one URL (plus optional HTML).
/// Immutable once extracted; every layer evaluator consumes this.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct UrlFeatures {
    pub scheme: String,
    pub host: String,
    pub path: String,
    pub full_url: String,

    pub has_ip_address_host: bool,
    pub suspicious_tld: bool,
    pub is_known_shortener: bool,
    pub subdomain_depth: usize,
    pub has_subdomains: bool,
    pub uses_https: bool,
    pub url_length: usize,
    pub path_has_special_chars: bool,
    pub mimics_known_brand: bool,
    pub matched_brand: Option<String>,
    pub has_redirect_param: bool,
    pub suspicious_keyword_count: usize,
    pub has_suspicious_keywords: bool,
    pub tunnel_service: Option<String>,
    pub is_dynamic_domain: bool,

    pub credential_form_count: usize,
    pub has_obfuscated_script: bool,
    pub hidden_field_count: usize,
    pub external_post_targets: Vec<String>,
}

/// Parses URLs into [`UrlFeatures`]. Pure: same input, same output.
pub struct FeatureExtractor {
    lists: ListConfig,
    embedded_quad: Regex,
    dynamic_label: Regex,
    html: html::HtmlFeatureParser,
}

impl FeatureExtractor {
    pub fn new(lists: ListConfig) -> Self {
        Self {
            lists,
            embedded_quad: Regex::new(r"\d{1,3}(?:\.\d{1,3}){3}").unwrap(),
            dynamic_label: Regex::new(r"^(?:[0-9a-f]{8,}|(?:random|temp|test)\d+)$").unwrap(),
            html: html::HtmlFeatureParser::new(),
        }
    }

    /// Prefix scheme-less input with https:// so bare hostnames parse.
    pub fn normalize(raw: &str) -> String {
        let trimmed = raw.trim();
        if trimmed.starts_with("http://") || trimmed.starts_with("https://") {
            trimmed.to_string()
        } else {
            format!("https://{trimmed}")
        }
    }

    pub fn extract(
        &self,
        raw_url: &str,
        html_content: Option<&str>,
    ) -> Result<UrlFeatures, AnalysisError> {
        let normalized = Self::normalize(raw_url);
        let parsed = Url::parse(&normalized)
            .map_err(|e| AnalysisError::invalid_url(raw_url, e.to_string()))?;

        let host = match parsed.host_str() {
            Some(h) if !h.is_empty() => h.to_lowercase(),
            _ => return Err(AnalysisError::invalid_url(raw_url, "URL has no host")),
        };
        let scheme = parsed.scheme().to_lowercase();
        if scheme != "http" && scheme != "https" {
            return Err(AnalysisError::invalid_url(
                raw_url,
                format!("unsupported scheme {scheme:?}"),
            ));
        }
        let path = parsed.path().to_string();
        let full_url = normalized.to_lowercase();

        let has_ip_address_host = host.parse::<Ipv4Addr>().is_ok();
        let suspicious_tld = self
            .lists
            .suspicious_tlds
            .iter()
            .any(|tld| host.ends_with(tld.as_str()));
        // Dotted tokens match as whole hosts or suffixes so that e.g.
        // "t.co" never matches microsoft.com; bare tokens match anywhere.
        let is_known_shortener = self
            .lists
            .shorteners
            .iter()
            .any(|s| {
                if s.contains('.') {
                    host == s.as_str() || host.ends_with(&format!(".{s}"))
                } else {
                    host.contains(s.as_str())
                }
            })
            || self.embedded_quad.is_match(&host);

        let subdomain_depth = host.split('.').count();
        let has_subdomains = subdomain_depth > 3;

        let (mimics_known_brand, matched_brand) = self.detect_brand_mimicry(&host);

        let suspicious_keyword_count = self
            .lists
            .suspicious_keywords
            .iter()
            .filter(|k| full_url.contains(k.as_str()))
            .count();
        let has_suspicious_keywords =
            suspicious_keyword_count >= self.lists.keyword_flag_threshold;

        let path_and_query = match parsed.query() {
            Some(q) => format!("{}?{}", path.to_lowercase(), q.to_lowercase()),
            None => path.to_lowercase(),
        };
        let has_redirect_param = ["redirect", "r=", "url=", "goto="]
            .iter()
            .any(|marker| path_and_query.contains(marker));

        let tunnel_service = self
            .lists
            .tunnel_services
            .iter()
            .find(|t| host == t.as_str() || host.ends_with(&format!(".{t}")))
            .cloned();

        let first_label = host.split('.').next().unwrap_or("");
        let is_dynamic_domain =
            tunnel_service.is_some() || self.dynamic_label.is_match(first_label);

        let path_has_special_chars = path
            .chars()
            .any(|c| !(c.is_ascii_alphanumeric() || matches!(c, '/' | '-' | '.' | '_')));

        let mut features = UrlFeatures {
            scheme: scheme.clone(),
            host,
            path,
            full_url,
            has_ip_address_host,
            suspicious_tld,
            is_known_shortener,
            subdomain_depth,
            has_subdomains,
            uses_https: scheme == "https",
            url_length: normalized.len(),
            path_has_special_chars,
            mimics_known_brand,
            matched_brand,
            has_redirect_param,
            suspicious_keyword_count,
            has_suspicious_keywords,
            tunnel_service,
            is_dynamic_domain,
            ..UrlFeatures::default()
        };

        if let Some(html_content) = html_content {
            let page = self.html.parse(html_content, &features.host);
            features.credential_form_count = page.credential_form_count;
            features.has_obfuscated_script = page.has_obfuscated_script;
            features.hidden_field_count = page.hidden_field_count;
            features.external_post_targets = page.external_post_targets;
        }

        log::debug!(
            "extracted features for {}: tld={} brand={:?} keywords={} tunnel={:?}",
            features.host,
            features.suspicious_tld,
            features.matched_brand,
            features.suspicious_keyword_count,
            features.tunnel_service
        );

        Ok(features)
    }

    /// A host mimics a brand when it carries the brand token (or a
    /// typosquatted variant) without being the brand's own domain.
    fn detect_brand_mimicry(&self, host: &str) -> (bool, Option<String>) {
        for brand in &self.lists.brands {
            let is_official = ["com", "net", "org"].iter().any(|tld| {
                let official = format!("{brand}.{tld}");
                host == official || host.ends_with(&format!(".{official}"))
            });
            if is_official {
                continue;
            }

            if host.contains(brand.as_str()) {
                return (true, Some(brand.clone()));
            }

            for variant in typosquat_variants(brand) {
                if host.contains(&variant) {
                    return (true, Some(brand.clone()));
                }
            }
        }
        (false, None)
    }
}

/// Character-substitution variants commonly used to typosquat a brand
/// token: o->0, e->3, a->@, i->1, l->1, plus the all-substitutions form.
fn typosquat_variants(brand: &str) -> Vec<String> {
    let substitutions: [(char, char); 5] =
        [('o', '0'), ('e', '3'), ('a', '@'), ('i', '1'), ('l', '1')];

    let mut variants = Vec::new();
    for (from, to) in substitutions {
        let variant: String = brand
            .chars()
            .map(|c| if c == from { to } else { c })
            .collect();
        if variant != brand {
            variants.push(variant);
        }
    }

    let combined: String = brand
        .chars()
        .map(|c| match c {
            'o' => '0',
            'e' => '3',
            'a' => '@',
            'i' | 'l' => '1',
            other => other,
        })
        .collect();
    if combined != brand && !variants.contains(&combined) {
        variants.push(combined);
    }

    variants
}
