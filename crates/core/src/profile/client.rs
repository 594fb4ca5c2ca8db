//! HTTP access to the commander profile and fleet carrier endpoints.

use std::time::Duration;

use chrono::Utc;
use reqwest::StatusCode;
use serde_json::Value;
use tracing::{debug, warn};

use super::{ProfileError, ProfileSnapshot};
use crate::models::RemoteCarrier;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Pulls the commander profile, and optionally the fleet carrier, over HTTP.
#[derive(Debug, Clone)]
pub struct ProfileClient {
    http: reqwest::Client,
    profile_url: String,
    carrier_url: Option<String>,
    token: Option<String>,
}

impl ProfileClient {
    /// Client for `profile_url`, authenticating with `token` when given.
    ///
    /// Fails only if the HTTP client cannot be built.
    pub fn new(
        profile_url: impl Into<String>,
        token: Option<String>,
    ) -> Result<Self, ProfileError> {
        let http = reqwest::Client::builder()
            .gzip(true)
            .timeout(REQUEST_TIMEOUT)
            .user_agent(concat!("fleetwatch/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self {
            http,
            profile_url: profile_url.into(),
            carrier_url: None,
            token,
        })
    }

    /// Also fetch the fleet carrier from `carrier_url` on every profile fetch.
    pub fn with_carrier_url(mut self, carrier_url: Option<String>) -> Self {
        self.carrier_url = carrier_url;
        self
    }

    /// `None` when the endpoint has nothing to say (204).
    async fn get_json(&self, url: &str) -> Result<Option<Value>, ProfileError> {
        let mut request = self.http.get(url);
        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }
        let response = request.send().await?;
        let status = response.status();
        if status == StatusCode::NO_CONTENT {
            return Ok(None);
        }
        if !status.is_success() {
            return Err(ProfileError::Status(status.as_u16()));
        }
        let body = response.bytes().await?;
        Ok(Some(serde_json::from_slice(&body)?))
    }

    /// Fetch and decode the profile. A failing carrier fetch only drops the carrier.
    pub async fn fetch_profile(&self) -> Result<ProfileSnapshot, ProfileError> {
        let fetched_at = Utc::now();
        let value = self
            .get_json(&self.profile_url)
            .await?
            .ok_or_else(|| ProfileError::Malformed("empty profile response".to_string()))?;
        let snapshot = ProfileSnapshot::from_json(&value, fetched_at)?;
        debug!(
            shipyard = snapshot.shipyard.len(),
            has_current = snapshot.current_ship.is_some(),
            "Fetched profile"
        );

        let Some(carrier_url) = &self.carrier_url else {
            return Ok(snapshot);
        };
        let carrier = match self.fetch_carrier(carrier_url).await {
            Ok(carrier) => carrier,
            Err(err) => {
                warn!(%err, "Fleet carrier fetch failed");
                None
            }
        };
        Ok(snapshot.with_carrier(carrier))
    }

    async fn fetch_carrier(&self, url: &str) -> Result<Option<RemoteCarrier>, ProfileError> {
        let fetched_at = Utc::now();
        match self.get_json(url).await? {
            Some(value) => RemoteCarrier::from_json(&value, fetched_at).map(Some),
            None => Ok(None),
        }
    }
}
