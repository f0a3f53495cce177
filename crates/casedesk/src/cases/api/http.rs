use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Method, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, info, warn};

use super::{ApiError, CaseApi, DirectoryApi};
use crate::cases::domain::{CaseId, CaseKind, CaseRecord, Employee, Partner, TypeRef, UserBasicInfo};
use crate::cases::evaluation::{CatalogEntry, HandlerEvaluationSubmission};
use crate::cases::validation::CasePayload;
use crate::config::ApiConfig;

/// reqwest-backed client for the case API.
///
/// Only the collection fetch retries, and only on HTTP 401. Mutations are never retried.
#[derive(Debug, Clone)]
pub struct HttpCaseApi {
    client: Client,
    base_url: String,
    token: Option<String>,
    auth_retries: u32,
    retry_delay: Duration,
}

impl HttpCaseApi {
    pub fn new(base_url: impl Into<String>) -> Result<Self, ApiError> {
        Self::from_config(&ApiConfig {
            base_url: Some(base_url.into()),
            ..ApiConfig::default()
        })
    }

    pub fn from_config(config: &ApiConfig) -> Result<Self, ApiError> {
        let base_url = config
            .base_url
            .as_deref()
            .map(|url| url.trim_end_matches('/').to_string())
            .ok_or_else(|| ApiError::Transport("case API base URL is not configured".to_string()))?;

        let mut builder = Client::builder();
        if let Some(timeout) = config.request_timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder
            .build()
            .map_err(|err| ApiError::Transport(format!("failed to build HTTP client: {err}")))?;

        Ok(Self {
            client,
            base_url,
            token: config.token.clone(),
            auth_retries: config.auth_retries,
            retry_delay: config.retry_delay,
        })
    }

    pub fn with_retry_policy(mut self, auth_retries: u32, retry_delay: Duration) -> Self {
        self.auth_retries = auth_retries;
        self.retry_delay = retry_delay;
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let url = format!("{}/api/{}", self.base_url, path.trim_start_matches('/'));
        let builder = self.client.request(method, url);
        match &self.token {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    async fn send(&self, request: RequestBuilder) -> Result<Response, ApiError> {
        let response = request
            .send()
            .await
            .map_err(|err| ApiError::Transport(err.to_string()))?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        Err(ApiError::from_response(
            status.as_u16(),
            status.canonical_reason(),
            &body,
        ))
    }

    async fn send_json<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T, ApiError> {
        let response = self.send(request).await?;
        let body = response
            .text()
            .await
            .map_err(|err| ApiError::Transport(err.to_string()))?;
        serde_json::from_str(&body).map_err(|err| ApiError::Parse(err.to_string()))
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        self.send_json(self.request(Method::GET, path)).await
    }

    async fn put_json<B, T>(&self, path: &str, body: &B) -> Result<T, ApiError>
    where
        B: Serialize + Sync + ?Sized,
        T: DeserializeOwned,
    {
        self.send_json(self.request(Method::PUT, path).json(body))
            .await
    }
}

fn case_path(kind: CaseKind, id: &CaseId, suffix: Option<&str>) -> String {
    match suffix {
        Some(suffix) => format!("{}/{}/{}", kind.resource(), id, suffix),
        None => format!("{}/{}", kind.resource(), id),
    }
}

#[async_trait]
impl CaseApi for HttpCaseApi {
    async fn list(&self, kind: CaseKind) -> Result<Vec<CaseRecord>, ApiError> {
        let mut attempt = 0;
        loop {
            match self.get_json::<Vec<CaseRecord>>(kind.resource()).await {
                Err(err) if err.is_unauthorized() && attempt < self.auth_retries => {
                    attempt += 1;
                    warn!(
                        kind = kind.label(),
                        attempt,
                        max_retries = self.auth_retries,
                        "case list unauthorized, retrying"
                    );
                    tokio::time::sleep(self.retry_delay).await;
                }
                Ok(records) => {
                    info!(kind = kind.label(), count = records.len(), "fetched case list");
                    return Ok(records);
                }
                Err(err) => return Err(err),
            }
        }
    }

    async fn create(&self, kind: CaseKind, payload: &CasePayload) -> Result<CaseRecord, ApiError> {
        debug!(kind = kind.label(), "creating case");
        self.send_json(self.request(Method::POST, kind.resource()).json(payload))
            .await
    }

    async fn update(
        &self,
        kind: CaseKind,
        id: &CaseId,
        payload: &CasePayload,
    ) -> Result<CaseRecord, ApiError> {
        self.put_json(&case_path(kind, id, None), payload).await
    }

    async fn delete(&self, kind: CaseKind, id: &CaseId) -> Result<(), ApiError> {
        self.send(self.request(Method::DELETE, &case_path(kind, id, None)))
            .await
            .map(|_| ())
    }

    async fn evaluate(
        &self,
        kind: CaseKind,
        id: &CaseId,
        submission: &HandlerEvaluationSubmission,
    ) -> Result<CaseRecord, ApiError> {
        self.put_json(&case_path(kind, id, Some("evaluation")), submission)
            .await
    }

    async fn set_in_progress(&self, kind: CaseKind, id: &CaseId) -> Result<CaseRecord, ApiError> {
        self.send_json(self.request(Method::PUT, &case_path(kind, id, Some("set-in-progress"))))
            .await
    }

    async fn close(&self, kind: CaseKind, id: &CaseId) -> Result<CaseRecord, ApiError> {
        self.send_json(self.request(Method::PUT, &case_path(kind, id, Some("close"))))
            .await
    }
}

#[async_trait]
impl DirectoryApi for HttpCaseApi {
    async fn employees(&self) -> Result<Vec<Employee>, ApiError> {
        self.get_json("employees/list").await
    }

    async fn partners(&self) -> Result<Vec<Partner>, ApiError> {
        self.get_json("partners/list").await
    }

    async fn case_types(&self, kind: CaseKind) -> Result<Vec<TypeRef>, ApiError> {
        match kind.type_catalog() {
            Some(catalog) => self.get_json(catalog).await,
            None => Ok(Vec::new()),
        }
    }

    async fn current_user(&self) -> Result<UserBasicInfo, ApiError> {
        self.get_json("user/basic-info").await
    }

    async fn evaluation_catalog(&self) -> Result<Vec<CatalogEntry>, ApiError> {
        self.get_json("evaluation-config").await
    }
}
