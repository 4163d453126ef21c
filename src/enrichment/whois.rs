use anyhow::{anyhow, Result};
use chrono::{DateTime, NaiveDate, Utc};
use regex::Regex;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, SystemTime};
use tokio::sync::RwLock;

use super::WhoisRecord;

struct CacheEntry {
    record: WhoisRecord,
    cached_at: SystemTime,
}

/// WHOIS lookups over TCP port 43 with a TTL-bounded in-process cache.
/// `lookup` never fails: any connection, timeout, or parse problem
/// degrades to [`WhoisRecord::unknown`].
pub struct WhoisClient {
    cache: Arc<RwLock<HashMap<String, CacheEntry>>>,
    cache_ttl: Duration,
    timeout: Duration,
    date_patterns: Vec<Regex>,
}

impl WhoisClient {
    pub fn new(timeout: Duration) -> Self {
        let date_patterns = [
            r"(?i)creation\s*date[:\s]+([^\r\n]+)",
            r"(?i)created[:\s]+([^\r\n]+)",
            r"(?i)registered\s*on[:\s]+([^\r\n]+)",
            r"(?i)registration\s*date[:\s]+([^\r\n]+)",
            r"(?i)domain\s*created[:\s]+([^\r\n]+)",
        ]
        .iter()
        .map(|p| Regex::new(p).unwrap())
        .collect();

        Self {
            cache: Arc::new(RwLock::new(HashMap::new())),
            cache_ttl: Duration::from_secs(24 * 60 * 60),
            timeout,
            date_patterns,
        }
    }

    /// Strip subdomains down to the registrable domain for the query.
    /// Handles common two-part TLDs like co.uk and com.au.
    pub fn root_domain(domain: &str) -> String {
        let parts: Vec<&str> = domain.split('.').collect();
        if parts.len() < 2 {
            return domain.to_string();
        }

        if parts.len() >= 3 {
            let two_part = format!("{}.{}", parts[parts.len() - 2], parts[parts.len() - 1]);
            let common_two_part_tlds = [
                "co.uk", "com.au", "co.jp", "co.kr", "com.br", "co.za", "com.mx", "co.in",
                "co.nz", "org.uk", "net.au", "gov.uk", "ac.uk",
            ];
            if common_two_part_tlds.contains(&two_part.as_str()) {
                return format!(
                    "{}.{}.{}",
                    parts[parts.len() - 3],
                    parts[parts.len() - 2],
                    parts[parts.len() - 1]
                );
            }
        }

        format!("{}.{}", parts[parts.len() - 2], parts[parts.len() - 1])
    }

    pub async fn lookup(&self, domain: &str) -> WhoisRecord {
        let root = Self::root_domain(&domain.to_lowercase());

        if root.is_empty() || !root.contains('.') || root.contains(' ') {
            log::warn!("refusing WHOIS query for malformed domain {root:?}");
            return WhoisRecord::unknown();
        }

        {
            let cache = self.cache.read().await;
            if let Some(entry) = cache.get(&root) {
                let age = SystemTime::now()
                    .duration_since(entry.cached_at)
                    .unwrap_or(Duration::ZERO);
                if age < self.cache_ttl {
                    log::debug!("WHOIS cache hit for {root}");
                    return entry.record.clone();
                }
            }
        }

        let record = match self.fetch(&root).await {
            Ok(record) => record,
            Err(e) => {
                log::warn!("WHOIS lookup for {root} failed, using unknown record: {e}");
                WhoisRecord::unknown()
            }
        };

        let mut cache = self.cache.write().await;
        cache.insert(
            root,
            CacheEntry {
                record: record.clone(),
                cached_at: SystemTime::now(),
            },
        );

        record
    }

    async fn fetch(&self, domain: &str) -> Result<WhoisRecord> {
        let server = Self::server_for(domain);
        log::debug!("querying WHOIS server {server} for {domain}");

        match self.query(server, domain).await {
            Ok(text) => Ok(self.parse(&text)),
            Err(e) => {
                log::debug!("primary WHOIS server {server} failed: {e}");
                let text = self.query("whois.iana.org", domain).await?;
                Ok(self.parse(&text))
            }
        }
    }

    fn server_for(domain: &str) -> &'static str {
        let tld = domain.rsplit('.').next().unwrap_or("");
        match tld {
            "com" | "net" => "whois.verisign-grs.com",
            "org" => "whois.pir.org",
            "info" => "whois.afilias.net",
            "io" => "whois.nic.io",
            "us" => "whois.nic.us",
            "uk" => "whois.nic.uk",
            "de" => "whois.denic.de",
            "tk" => "whois.dot.tk",
            "ml" => "whois.dot.ml",
            "ga" => "whois.dot.ga",
            "cf" => "whois.dot.cf",
            _ => "whois.iana.org",
        }
    }

    async fn query(&self, server: &str, domain: &str) -> Result<String> {
        use tokio::io::{AsyncReadExt, AsyncWriteExt};
        use tokio::net::TcpStream;
        use tokio::time::timeout;

        let mut stream =
            timeout(self.timeout, TcpStream::connect(format!("{server}:43"))).await??;

        stream.write_all(format!("{domain}\r\n").as_bytes()).await?;

        let mut response = String::new();
        timeout(self.timeout, stream.read_to_string(&mut response)).await??;

        if response.is_empty() {
            return Err(anyhow!("empty WHOIS response from {server}"));
        }
        Ok(response)
    }

    /// Pull the fields the engine cares about out of free-form WHOIS text.
    pub fn parse(&self, text: &str) -> WhoisRecord {
        let mut record = WhoisRecord::unknown();

        for pattern in &self.date_patterns {
            if let Some(cap) = pattern.captures(text) {
                if let Some(date) = parse_whois_date(cap[1].trim()) {
                    record.registration_date = Some(date);
                    break;
                }
            }
        }

        record.registrar = capture_line(text, r"(?i)registrar[:\s]+([^\r\n]+)");
        record.registrant_country = capture_line(text, r"(?i)registrant\s+country[:\s]+([^\r\n]+)");
        record.registrant_org =
            capture_line(text, r"(?i)registrant\s+organi[sz]ation[:\s]+([^\r\n]+)");

        if let Some(expiry) =
            capture_line(text, r"(?i)(?:registry\s+)?expir\w*\s*date[:\s]+([^\r\n]+)")
        {
            record.expiration_date = parse_whois_date(expiry.trim());
        }

        let ns_regex = Regex::new(r"(?i)name\s*server[:\s]+([^\r\n]+)").unwrap();
        for cap in ns_regex.captures_iter(text) {
            record.name_servers.push(cap[1].trim().to_lowercase());
        }

        record
    }
}

fn capture_line(text: &str, pattern: &str) -> Option<String> {
    Regex::new(pattern)
        .ok()?
        .captures(text)
        .map(|cap| cap[1].trim().to_string())
}

/// WHOIS servers emit dates in a handful of formats; try them in order.
fn parse_whois_date(raw: &str) -> Option<DateTime<Utc>> {
    let cleaned = raw.split_whitespace().next()?;

    if let Ok(parsed) = DateTime::parse_from_rfc3339(cleaned) {
        return Some(parsed.with_timezone(&Utc));
    }

    for format in ["%Y-%m-%d", "%d-%b-%Y", "%d.%m.%Y", "%Y/%m/%d"] {
        if let Ok(date) = NaiveDate::parse_from_str(cleaned, format) {
            return date.and_hms_opt(0, 0, 0).map(|dt| dt.and_utc());
        }
    }

    None
}
