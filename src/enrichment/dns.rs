use hickory_resolver::config::{ResolverConfig, ResolverOpts};
use hickory_resolver::TokioAsyncResolver;
use std::time::Duration;

use super::GeoRecord;

/// Resolves a hostname to its first IP address. Geo attribution beyond the
/// address itself is left to an external provider; a failed or timed-out
/// lookup yields [`GeoRecord::unknown`].
pub struct IpResolver {
    resolver: TokioAsyncResolver,
    timeout: Duration,
}

impl IpResolver {
    pub fn new(timeout: Duration) -> Self {
        let resolver = TokioAsyncResolver::tokio_from_system_conf().unwrap_or_else(|e| {
            log::debug!("system resolver config unavailable ({e}), using defaults");
            TokioAsyncResolver::tokio(ResolverConfig::default(), ResolverOpts::default())
        });
        Self { resolver, timeout }
    }

    pub async fn resolve(&self, host: &str) -> GeoRecord {
        // An IP-literal host resolves to itself.
        if host.parse::<std::net::IpAddr>().is_ok() {
            return GeoRecord {
                ip: Some(host.to_string()),
                ..GeoRecord::unknown()
            };
        }

        match tokio::time::timeout(self.timeout, self.resolver.lookup_ip(host)).await {
            Ok(Ok(lookup)) => match lookup.iter().next() {
                Some(ip) => GeoRecord {
                    ip: Some(ip.to_string()),
                    ..GeoRecord::unknown()
                },
                None => GeoRecord::unknown(),
            },
            Ok(Err(e)) => {
                log::warn!("DNS resolution for {host} failed, using unknown record: {e}");
                GeoRecord::unknown()
            }
            Err(_) => {
                log::warn!("DNS resolution for {host} timed out, using unknown record");
                GeoRecord::unknown()
            }
        }
    }
}
