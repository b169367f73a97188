use std::env;
use std::net::SocketAddr;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct RelayConfig {
    pub bind: SocketAddr,
    /// Overrides the built-in public STUN set when non-empty.
    pub stun_urls: Vec<String>,
    pub turn_upstream_url: Option<String>,
    pub turn_secret: Option<String>,
    pub turn_timeout: Duration,
}

impl RelayConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let bind = env::var("TANDEM_BIND")
            .ok()
            .and_then(|addr| addr.parse().ok())
            .unwrap_or(defaults.bind);
        let stun_urls = env::var("TANDEM_STUN_URLS")
            .map(|urls| {
                urls.split(',')
                    .map(str::trim)
                    .filter(|url| !url.is_empty())
                    .map(str::to_owned)
                    .collect()
            })
            .unwrap_or_default();
        let turn_upstream_url = env::var("TANDEM_TURN_UPSTREAM_URL")
            .ok()
            .filter(|url| !url.trim().is_empty());
        let turn_secret = env::var("TANDEM_TURN_SECRET")
            .ok()
            .filter(|secret| !secret.is_empty());
        let turn_timeout = env::var("TANDEM_TURN_TIMEOUT_MS")
            .ok()
            .and_then(|ms| ms.parse().ok())
            .map(Duration::from_millis)
            .unwrap_or(defaults.turn_timeout);

        Self {
            bind,
            stun_urls,
            turn_upstream_url,
            turn_secret,
            turn_timeout,
        }
    }
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            bind: SocketAddr::from(([0, 0, 0, 0], 3000)),
            stun_urls: Vec::new(),
            turn_upstream_url: None,
            turn_secret: None,
            turn_timeout: Duration::from_secs(5),
        }
    }
}
