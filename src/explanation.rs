use crate::aggregator::Verdict;
use crate::config::RuleConfig;
use crate::enrichment::EnrichmentContext;
use crate::features::UrlFeatures;

/// Red flags and recommendations for one analysis.
#[derive(Debug, Clone, PartialEq)]
pub struct Explanation {
    pub red_flags: Vec<String>,
    pub recommendations: Vec<String>,
}

/// Derive the user-facing explanation from the same inputs the layers
/// scored. Ordering is fixed: infrastructure first, then brand, content,
/// behavioral, transport, reputation. Neither list is ever empty.
pub fn explain(
    features: &UrlFeatures,
    ctx: &EnrichmentContext,
    verdict: Verdict,
    config: &RuleConfig,
) -> Explanation {
    let mut red_flags = Vec::new();
    let mut recommendations = Vec::new();

    // Infrastructure.
    if let Some(tunnel) = &features.tunnel_service {
        red_flags.push(format!(
            "The site is hosted through the {tunnel} tunneling service rather than real infrastructure"
        ));
        recommendations
            .push("Legitimate organizations do not serve login pages through tunnel hosts".to_string());
    }
    if features.is_dynamic_domain && features.tunnel_service.is_none() {
        red_flags.push("The domain name looks machine-generated and disposable".to_string());
    }
    if features.has_ip_address_host {
        red_flags.push("The address is a raw IP instead of a named website".to_string());
        recommendations
            .push("Type the organization's known web address yourself instead of following this link".to_string());
    }
    if features.suspicious_tld {
        red_flags.push("The domain ending is one that free and abused registrars hand out".to_string());
    }
    if features.is_known_shortener {
        red_flags.push("The link passes through a URL shortener that hides its destination".to_string());
        recommendations.push("Expand shortened links before trusting them".to_string());
    }

    // Brand.
    if features.mimics_known_brand {
        match &features.matched_brand {
            Some(brand) => red_flags.push(format!(
                "The address imitates {brand} but is not the official {brand} domain"
            )),
            None => red_flags.push("The address imitates a well-known brand".to_string()),
        }
        recommendations
            .push("Reach the brand through its official website or app, never through this link".to_string());
    }
    if features.has_suspicious_keywords {
        red_flags.push(format!(
            "The URL is packed with pressure words ({} of them) typical of credential phishing",
            features.suspicious_keyword_count
        ));
    }
    if features.has_redirect_param {
        red_flags.push("The URL carries a redirect parameter that can bounce you elsewhere".to_string());
    }

    // Content.
    if features.credential_form_count > 0 {
        red_flags.push("The page asks for credentials".to_string());
        recommendations.push("Do not submit passwords or email addresses on this page".to_string());
    }
    if features.has_obfuscated_script {
        red_flags.push("The page hides what its scripts do behind obfuscation".to_string());
    }
    if !features.external_post_targets.is_empty() {
        red_flags.push("Form data is sent to a different domain than the page itself".to_string());
    }

    // Behavioral.
    if ctx.behavioral.any() {
        red_flags.push("The page shows hostile runtime behavior (redirects, key capture, or content rewriting)".to_string());
    }

    // Transport.
    if !features.uses_https {
        red_flags.push("The connection is unencrypted (no HTTPS)".to_string());
        recommendations.push("Never enter sensitive data over a plain HTTP connection".to_string());
    }
    if let Some(cert) = &ctx.certificate {
        if !cert.is_valid {
            red_flags.push("The site's certificate failed validation".to_string());
        }
    }

    // Reputation.
    if !ctx.reputation.blacklist_hits.is_empty() {
        red_flags.push(format!(
            "The domain already appears on {} threat blacklist(s)",
            ctx.reputation.blacklist_hits.len()
        ));
    }
    if let Some(age) = ctx.reputation.domain_age_days {
        if age < config.points.reputation.young_domain_days {
            red_flags.push(format!(
                "The domain was registered only {age} day(s) ago"
            ));
        }
    }

    // Verdict-level boilerplate leads the recommendation list.
    match verdict {
        Verdict::ConfirmedPhishing => {
            recommendations.insert(
                0,
                "Do not enter credentials or personal information on this site".to_string(),
            );
            recommendations.insert(
                1,
                "Close the page and report the URL to your security team or provider".to_string(),
            );
        }
        Verdict::Suspicious => {
            recommendations.insert(
                0,
                "Treat this site with caution and verify it through an independent channel".to_string(),
            );
        }
        Verdict::Legitimate => {}
    }

    if red_flags.is_empty() {
        red_flags.push("No red flags identified for this URL".to_string());
    }
    if recommendations.is_empty() {
        recommendations.push("Maintain standard browsing practices".to_string());
    }

    Explanation {
        red_flags,
        recommendations,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::FeatureExtractor;

    fn features_for(url: &str) -> UrlFeatures {
        FeatureExtractor::new(RuleConfig::default().lists)
            .extract(url, None)
            .unwrap()
    }

    #[test]
    fn clean_url_gets_exactly_one_flag_and_recommendation() {
        let explanation = explain(
            &features_for("https://www.example.org"),
            &EnrichmentContext::unknown(),
            Verdict::Legitimate,
            &RuleConfig::default(),
        );
        assert_eq!(
            explanation.red_flags,
            vec!["No red flags identified for this URL".to_string()]
        );
        assert_eq!(
            explanation.recommendations,
            vec!["Maintain standard browsing practices".to_string()]
        );
    }

    #[test]
    fn phishing_verdict_prepends_credential_warning() {
        let explanation = explain(
            &features_for("https://paypal-secure-verify.tk/account"),
            &EnrichmentContext::unknown(),
            Verdict::ConfirmedPhishing,
            &RuleConfig::default(),
        );
        assert!(explanation.recommendations[0].contains("Do not enter credentials"));
        assert!(explanation.red_flags.len() >= 3);
    }

    #[test]
    fn infrastructure_flags_come_before_brand_flags() {
        let explanation = explain(
            &features_for("https://paypal-login.tk"),
            &EnrichmentContext::unknown(),
            Verdict::Suspicious,
            &RuleConfig::default(),
        );
        let tld_pos = explanation
            .red_flags
            .iter()
            .position(|f| f.contains("domain ending"))
            .unwrap();
        let brand_pos = explanation
            .red_flags
            .iter()
            .position(|f| f.contains("imitates"))
            .unwrap();
        assert!(tld_pos < brand_pos);
    }

    #[test]
    fn suspicious_verdict_prepends_caution() {
        let explanation = explain(
            &features_for("http://192.168.1.1/login"),
            &EnrichmentContext::unknown(),
            Verdict::Suspicious,
            &RuleConfig::default(),
        );
        assert!(explanation.recommendations[0].contains("caution"));
    }
}
