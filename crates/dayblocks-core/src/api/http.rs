//! HTTP implementation of [`DayBackend`].

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Response};
use serde::de::DeserializeOwned;
use tracing::debug;
use url::Url;

use super::backend::DayBackend;
use super::contracts::{
    CompleteBlockRequest, CompletionRecord, ProductivityReport, SequenceResponse, SessionRecord,
    SleepRecord, StartSessionRequest, StartSessionResponse,
};
use crate::config::ServerConfig;
use crate::error::ApiError;

const TODAY_SEQUENCE: &str = "today-sequence";
const START_SESSION: &str = "start-session";
const END_SESSION: &str = "end-session";
const COMPLETE_BLOCK: &str = "complete-block";
const PRODUCTIVITY: &str = "productivity-percentage";
const SLEEP: &str = "get-sleep";
const SESSIONS: &str = "sessions";
const MONTHLY_COMPLETIONS: &str = "monthly-completions";

/// Client for the dayblocks server.
#[derive(Debug, Clone)]
pub struct HttpBackend {
    http_client: Client,
    base: Url,
}

impl HttpBackend {
    /// Create a client rooted at `base_url`.
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, ApiError> {
        let mut base = Url::parse(base_url)?;
        // Url::join drops the last path segment unless the base ends in '/'.
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }
        let http_client = Client::builder().timeout(timeout).build()?;
        Ok(Self { http_client, base })
    }

    pub fn from_config(config: &ServerConfig) -> Result<Self, ApiError> {
        Self::new(
            &config.base_url,
            Duration::from_secs(config.request_timeout_secs),
        )
    }

    pub fn base_url(&self) -> &Url {
        &self.base
    }

    fn endpoint(&self, path: &str) -> Result<Url, ApiError> {
        Ok(self.base.join(path)?)
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        let url = self.endpoint(path)?;
        debug!(%url, "GET");
        let resp = self.http_client.get(url).send().await?;
        Ok(check(path, resp).await?.json().await?)
    }
}

/// Turn non-success statuses into [`ApiError::Status`].
async fn check(endpoint: &str, resp: Response) -> Result<Response, ApiError> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }
    let body = resp.text().await.unwrap_or_default();
    Err(ApiError::Status {
        endpoint: endpoint.to_string(),
        status: status.as_u16(),
        body,
    })
}

#[async_trait]
impl DayBackend for HttpBackend {
    async fn today_sequence(&self) -> Result<SequenceResponse, ApiError> {
        let seq: SequenceResponse = self.get_json(TODAY_SEQUENCE).await?;
        seq.validate()?;
        Ok(seq)
    }

    async fn start_session(
        &self,
        request: &StartSessionRequest,
    ) -> Result<StartSessionResponse, ApiError> {
        let url = self.endpoint(START_SESSION)?;
        debug!(%url, ?request, "POST");
        let resp = self.http_client.post(url).json(request).send().await?;
        let started: StartSessionResponse = check(START_SESSION, resp).await?.json().await?;
        started.validate()?;
        Ok(started)
    }

    async fn end_session(&self, session_id: &str) -> Result<(), ApiError> {
        let url = self.endpoint(END_SESSION)?;
        debug!(%url, session_id, "POST");
        let resp = self
            .http_client
            .post(url)
            .query(&[("id", session_id)])
            .send()
            .await?;
        check(END_SESSION, resp).await?;
        Ok(())
    }

    async fn complete_block(&self, request: &CompleteBlockRequest) -> Result<(), ApiError> {
        let url = self.endpoint(COMPLETE_BLOCK)?;
        debug!(%url, ?request, "POST");
        let resp = self.http_client.post(url).json(request).send().await?;
        check(COMPLETE_BLOCK, resp).await?;
        Ok(())
    }

    async fn productivity(&self) -> Result<ProductivityReport, ApiError> {
        let report: ProductivityReport = self.get_json(PRODUCTIVITY).await?;
        report.validate()?;
        Ok(report)
    }

    async fn sleep_records(&self) -> Result<Vec<SleepRecord>, ApiError> {
        self.get_json(SLEEP).await
    }

    async fn sessions(&self) -> Result<Vec<SessionRecord>, ApiError> {
        self.get_json(SESSIONS).await
    }

    async fn monthly_completions(&self) -> Result<Vec<CompletionRecord>, ApiError> {
        self.get_json(MONTHLY_COMPLETIONS).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base_url_gains_trailing_slash() {
        let backend = HttpBackend::new("http://localhost:8080/api", Duration::from_secs(1)).unwrap();
        assert_eq!(
            backend.endpoint(TODAY_SEQUENCE).unwrap().as_str(),
            "http://localhost:8080/api/today-sequence"
        );
    }

    #[test]
    fn rejects_unparseable_base_url() {
        assert!(matches!(
            HttpBackend::new("not a url", Duration::from_secs(1)),
            Err(ApiError::Url(_))
        ));
    }
}
