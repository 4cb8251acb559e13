//! HTTP client for the registry.

use reqwest::StatusCode;
use tracing::{debug, info};
use watchout_protocols::{AddPlayerResponse, HeartRateReport, RegisterRequest};

use crate::error::{Error, Result};

/// Talks to the registry's HTTP API.
#[derive(Debug, Clone)]
pub struct RegistryClient {
    http: reqwest::Client,
    base_url: String,
}

impl RegistryClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    /// Register this player.
    ///
    /// A duplicate id is [`Error::IdConflict`]; any other failure is
    /// [`Error::Registry`]. Both are fatal to the player.
    pub async fn register(&self, request: &RegisterRequest) -> Result<AddPlayerResponse> {
        let url = format!("{}/players/add", self.base_url);
        let response = self.http.post(&url).json(request).send().await?;

        match response.status() {
            StatusCode::CONFLICT => Err(Error::IdConflict(request.id)),
            status if status.is_success() => {
                let reply: AddPlayerResponse = response.json().await?;
                info!(
                    "Registered as player {} at ({}, {}), {} players already in",
                    request.id,
                    reply.x,
                    reply.y,
                    reply.players.len()
                );
                Ok(reply)
            }
            status => Err(Error::Registry(format!(
                "registration failed with status {status}"
            ))),
        }
    }

    /// Upload one batch of heart-rate averages.
    pub async fn report_heart_rate(&self, report: &HeartRateReport) -> Result<()> {
        let url = format!("{}/players/heart-rate", self.base_url);
        self.http
            .post(&url)
            .json(report)
            .send()
            .await?
            .error_for_status()?;
        debug!("Sent {} heart-rate averages", report.averages.len());
        Ok(())
    }
}
