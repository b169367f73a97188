use crate::config::RelayConfig;
use crate::credentials::UpstreamCredentials;
use tandem_core::utils::default_stun_servers;
use tandem_core::{IceServerConfig, ParticipantId};
use tracing::{debug, info, warn};

/// Hands out ICE server lists: the fixed STUN set, plus TURN entries from the
/// upstream credential service when a secret is configured.
///
/// Never fails. Upstream problems degrade the answer to STUN only.
#[derive(Clone)]
pub struct CredentialBroker {
    stun: Vec<IceServerConfig>,
    upstream: Option<UpstreamCredentials>,
}

impl CredentialBroker {
    pub fn new(stun: Vec<IceServerConfig>, upstream: Option<UpstreamCredentials>) -> Self {
        Self { stun, upstream }
    }

    pub fn stun_only() -> Self {
        Self::new(default_stun_servers(), None)
    }

    pub fn from_config(config: &RelayConfig) -> Self {
        let stun = if config.stun_urls.is_empty() {
            default_stun_servers()
        } else {
            vec![IceServerConfig::stun(config.stun_urls.iter().cloned())]
        };

        let upstream = match (&config.turn_upstream_url, &config.turn_secret) {
            (Some(url), Some(secret)) => {
                info!("TURN credentials will be fetched from {}", url);
                Some(UpstreamCredentials::new(
                    url.clone(),
                    secret.clone(),
                    config.turn_timeout,
                ))
            }
            (Some(url), None) => {
                warn!("TURN upstream {} configured without a secret, serving STUN only", url);
                None
            }
            (None, _) => {
                info!("No TURN upstream configured, serving STUN only");
                None
            }
        };

        Self::new(stun, upstream)
    }

    pub fn has_upstream(&self) -> bool {
        self.upstream.is_some()
    }

    pub async fn ice_servers(&self, participant: &ParticipantId) -> Vec<IceServerConfig> {
        let mut servers = self.stun.clone();

        let Some(upstream) = &self.upstream else {
            return servers;
        };

        match upstream.fetch(participant).await {
            Ok(turn) => {
                debug!("Fetched {} TURN entries for {}", turn.len(), participant);
                servers.extend(turn);
            }
            Err(e) => {
                warn!(
                    "TURN credential fetch from {} failed for {}: {}",
                    upstream.url(),
                    participant,
                    e
                );
            }
        }
        servers
    }
}
