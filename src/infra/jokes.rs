//! HTTP client for the upstream joke API.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Url};
use tracing::debug;

use crate::application::jokes::{JokeSource, JokeSourceError};
use crate::domain::jokes::Joke;

use super::error::InfraError;

pub struct HttpJokeSource {
    client: Client,
    endpoint: Url,
}

impl HttpJokeSource {
    pub fn new(endpoint: Url, timeout: Duration) -> Result<Self, InfraError> {
        let client = Client::builder()
            .user_agent(Self::user_agent())
            .timeout(timeout)
            .build()
            .map_err(|err| InfraError::configuration(format!("failed to build joke client: {err}")))?;
        Ok(Self { client, endpoint })
    }

    pub fn user_agent() -> &'static str {
        concat!("jester/", env!("CARGO_PKG_VERSION"))
    }
}

#[async_trait]
impl JokeSource for HttpJokeSource {
    async fn fetch_one(&self) -> Result<Joke, JokeSourceError> {
        let response = self
            .client
            .get(self.endpoint.clone())
            .send()
            .await
            .map_err(|err| JokeSourceError::Request(err.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(JokeSourceError::Status {
                status: status.as_u16(),
            });
        }

        let payload = response
            .json::<serde_json::Value>()
            .await
            .map_err(|err| JokeSourceError::Decode(err.to_string()))?;

        debug!(
            target = "jester::infra::jokes",
            endpoint = %self.endpoint,
            "Fetched joke from upstream"
        );
        Ok(Joke(payload))
    }
}
