use super::client::HttpClient;
use crate::config::Settings;
use anyhow::Result;
use async_trait::async_trait;

/// [`HttpClient`] backed by a single `reqwest::Client`.
pub struct BasicClient(reqwest::Client);

impl BasicClient {
    /// A client with reqwest's defaults: no deadline at all.
    pub fn new() -> Self {
        Self(reqwest::Client::new())
    }

    /// A client that applies the request and connect deadlines from `settings`.
    pub fn from_settings(settings: &Settings) -> Result<Self> {
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = settings.timeout {
            builder = builder.timeout(timeout);
        }
        if let Some(connect_timeout) = settings.connect_timeout {
            builder = builder.connect_timeout(connect_timeout);
        }
        Ok(Self(builder.build()?))
    }
}

impl Default for BasicClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl HttpClient for BasicClient {
    async fn execute(&self, req: reqwest::Request) -> reqwest::Result<reqwest::Response> {
        self.0.execute(req).await
    }
}
