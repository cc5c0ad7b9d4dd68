// HTTP client for a remote motor service
use crate::application::motor_api::MotorApi;
use crate::domain::sample::MotorSample;
use crate::domain::session::{Ack, SessionConfig};
use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::Serialize;

#[derive(Debug, Clone)]
pub struct HttpMotorClient {
    base_url: String,
    client: reqwest::Client,
}

impl HttpMotorClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            client: reqwest::Client::new(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn post<B: Serialize + ?Sized>(&self, path: &str, body: Option<&B>) -> Result<Ack> {
        let mut request = self.client.post(self.url(path));
        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request
            .send()
            .await
            .with_context(|| format!("Failed to reach motor service at {}", self.base_url))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            anyhow::bail!("Motor service call {} failed with status {}: {}", path, status, body);
        }

        response
            .json::<Ack>()
            .await
            .context("Failed to parse motor service acknowledgement")
    }
}

#[async_trait]
impl MotorApi for HttpMotorClient {
    async fn start_session(&self, config: SessionConfig) -> Result<Ack> {
        self.post("/session/start", Some(&config)).await
    }

    async fn push_sample(&self, sample: MotorSample) -> Result<Ack> {
        self.post("/session/sample", Some(&sample)).await
    }

    async fn end_session(&self) -> Result<Ack> {
        self.post::<()>("/session/end", None).await
    }
}
