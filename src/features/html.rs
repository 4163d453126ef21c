use regex::Regex;
use url::Url;

/// Features pulled out of raw page HTML. Only produced when the caller
/// supplies page content; absent HTML leaves all counts at zero.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PageFeatures {
    pub credential_form_count: usize,
    pub has_obfuscated_script: bool,
    pub hidden_field_count: usize,
    pub external_post_targets: Vec<String>,
}

/// Regex-based HTML feature extraction. Markup from phishing kits is
/// rarely well-formed, so matching is deliberately permissive.
pub struct HtmlFeatureParser {
    credential_input: Regex,
    hidden_input: Regex,
    form_action: Regex,
    hex_escape_run: Regex,
}

impl HtmlFeatureParser {
    pub fn new() -> Self {
        Self {
            credential_input: Regex::new(
                r#"(?i)<input[^>]*type\s*=\s*["']?(?:password|email)"#,
            )
            .unwrap(),
            hidden_input: Regex::new(r#"(?i)<input[^>]*type\s*=\s*["']?hidden"#).unwrap(),
            form_action: Regex::new(r#"(?i)<form[^>]*action\s*=\s*["']([^"']+)["']"#).unwrap(),
            hex_escape_run: Regex::new(r"(?i)(?:\\x[0-9a-f]{2}){4,}").unwrap(),
        }
    }

    pub fn parse(&self, html: &str, page_host: &str) -> PageFeatures {
        let credential_form_count = self.credential_input.find_iter(html).count();
        let hidden_field_count = self.hidden_input.find_iter(html).count();

        let has_obfuscated_script = html.contains("eval(")
            || html.contains("atob(")
            || html.contains("fromCharCode")
            || self.hex_escape_run.is_match(html);

        // Form actions pointing off-host, in document order.
        let mut external_post_targets = Vec::new();
        for cap in self.form_action.captures_iter(html) {
            let action = cap[1].trim();
            if let Ok(target) = Url::parse(action) {
                if let Some(target_host) = target.host_str() {
                    let target_host = target_host.to_lowercase();
                    if target_host != page_host
                        && !target_host.ends_with(&format!(".{page_host}"))
                    {
                        external_post_targets.push(action.to_string());
                    }
                }
            }
        }

        PageFeatures {
            credential_form_count,
            has_obfuscated_script,
            hidden_field_count,
            external_post_targets,
        }
    }
}

impl Default for HtmlFeatureParser {
    fn default() -> Self {
        Self::new()
    }
}
