use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tandem_core::{IceServerConfig, ParticipantId};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CredentialError {
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("malformed upstream response: {0}")]
    Malformed(String),
}

/// Client for the service that issues short-lived TURN credentials.
#[derive(Clone)]
pub struct UpstreamCredentials {
    url: String,
    secret: String,
    timeout: Duration,
    client: Client,
}

#[derive(Serialize)]
struct CredentialRequest<'a> {
    participant: &'a ParticipantId,
}

/// Accepts both `{"iceServers": [...]}` (or `ice_servers`) and a bare array.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum UpstreamResponse {
    Wrapped {
        #[serde(rename = "iceServers", alias = "ice_servers")]
        ice_servers: Vec<UpstreamServer>,
    },
    Bare(Vec<UpstreamServer>),
}

#[derive(Debug, Deserialize)]
struct UpstreamServer {
    #[serde(default)]
    urls: Option<OneOrMany>,
    #[serde(default)]
    url: Option<String>,
    #[serde(default)]
    username: Option<String>,
    #[serde(default)]
    credential: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum OneOrMany {
    One(String),
    Many(Vec<String>),
}

impl UpstreamCredentials {
    pub fn new(url: impl Into<String>, secret: impl Into<String>, timeout: Duration) -> Self {
        Self {
            url: url.into(),
            secret: secret.into(),
            timeout,
            client: Client::new(),
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub async fn fetch(
        &self,
        participant: &ParticipantId,
    ) -> Result<Vec<IceServerConfig>, CredentialError> {
        let response = self
            .client
            .post(&self.url)
            .bearer_auth(&self.secret)
            .timeout(self.timeout)
            .json(&CredentialRequest { participant })
            .send()
            .await?
            .error_for_status()?;

        let body = response.bytes().await?;
        parse_upstream(&body)
    }
}

pub(crate) fn parse_upstream(body: &[u8]) -> Result<Vec<IceServerConfig>, CredentialError> {
    let parsed: UpstreamResponse =
        serde_json::from_slice(body).map_err(|e| CredentialError::Malformed(e.to_string()))?;

    let entries = match parsed {
        UpstreamResponse::Wrapped { ice_servers } => ice_servers,
        UpstreamResponse::Bare(entries) => entries,
    };

    let servers: Vec<IceServerConfig> = entries
        .into_iter()
        .filter_map(|entry| {
            let urls = match (entry.urls, entry.url) {
                (Some(OneOrMany::Many(urls)), _) => urls,
                (Some(OneOrMany::One(url)), _) | (None, Some(url)) => vec![url],
                (None, None) => return None,
            };
            let urls: Vec<String> = urls.into_iter().filter(|u| !u.is_empty()).collect();
            if urls.is_empty() {
                return None;
            }
            Some(IceServerConfig {
                urls,
                username: entry.username,
                credential: entry.credential,
            })
        })
        .collect();

    if servers.is_empty() {
        return Err(CredentialError::Malformed(
            "response contained no usable ice servers".to_owned(),
        ));
    }
    Ok(servers)
}
