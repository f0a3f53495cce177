//! Boundary to the case API: one async trait for the case collections, one for the lookup
//! directories, plus the HTTP and in-memory implementations.

mod http;
mod memory;

pub use http::HttpCaseApi;
pub use memory::InMemoryCaseApi;

use async_trait::async_trait;
use axum::http::StatusCode;
use serde::Deserialize;

use super::domain::{CaseId, CaseKind, CaseRecord, Employee, Partner, TypeRef, UserBasicInfo};
use super::evaluation::{CatalogEntry, HandlerEvaluationSubmission};
use super::validation::CasePayload;

/// Case collection endpoints, `/api/{resource}` for each [`CaseKind`].
#[async_trait]
pub trait CaseApi: Send + Sync {
    async fn list(&self, kind: CaseKind) -> Result<Vec<CaseRecord>, ApiError>;
    async fn create(&self, kind: CaseKind, payload: &CasePayload) -> Result<CaseRecord, ApiError>;
    async fn update(
        &self,
        kind: CaseKind,
        id: &CaseId,
        payload: &CasePayload,
    ) -> Result<CaseRecord, ApiError>;
    async fn delete(&self, kind: CaseKind, id: &CaseId) -> Result<(), ApiError>;
    async fn evaluate(
        &self,
        kind: CaseKind,
        id: &CaseId,
        submission: &HandlerEvaluationSubmission,
    ) -> Result<CaseRecord, ApiError>;
    async fn set_in_progress(&self, kind: CaseKind, id: &CaseId) -> Result<CaseRecord, ApiError>;
    async fn close(&self, kind: CaseKind, id: &CaseId) -> Result<CaseRecord, ApiError>;
}

/// Lookup endpoints feeding the form dropdowns.
#[async_trait]
pub trait DirectoryApi: Send + Sync {
    async fn employees(&self) -> Result<Vec<Employee>, ApiError>;
    async fn partners(&self) -> Result<Vec<Partner>, ApiError>;
    /// Type catalog for `kind`; kinds without a catalog return an empty list.
    async fn case_types(&self, kind: CaseKind) -> Result<Vec<TypeRef>, ApiError>;
    async fn current_user(&self) -> Result<UserBasicInfo, ApiError>;
    /// Evaluation option lists keyed by role and category. Empty when nothing is configured.
    async fn evaluation_catalog(&self) -> Result<Vec<CatalogEntry>, ApiError>;
}

/// Failure of a call to the case API.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ApiError {
    /// Non-2xx response; `message` is the server's `error` text or `HTTP <status>: <reason>`.
    #[error("{message}")]
    Http { status: u16, message: String },
    #[error("unexpected response body: {0}")]
    Parse(String),
    #[error("request failed: {0}")]
    Transport(String),
}

#[derive(Deserialize)]
struct ErrorBody {
    error: String,
}

impl ApiError {
    /// Build the error for a non-2xx response from its status line and body.
    pub fn from_response(status: u16, reason: Option<&str>, body: &str) -> Self {
        let message = match serde_json::from_str::<ErrorBody>(body) {
            Ok(parsed) if !parsed.error.trim().is_empty() => parsed.error,
            _ => format!("HTTP {}: {}", status, reason.unwrap_or("Unknown Status")),
        };
        ApiError::Http { status, message }
    }

    pub fn not_found(what: impl std::fmt::Display) -> Self {
        ApiError::Http {
            status: 404,
            message: format!("{what} not found"),
        }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        ApiError::Http {
            status: 400,
            message: message.into(),
        }
    }

    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Http { status, .. } => Some(*status),
            ApiError::Parse(_) | ApiError::Transport(_) => None,
        }
    }

    pub fn is_unauthorized(&self) -> bool {
        self.status() == Some(401)
    }

    /// Status to answer with when relaying this error from the service.
    pub fn upstream_status(&self) -> StatusCode {
        match self {
            ApiError::Http { status, .. } => StatusCode::from_u16(*status)
                .ok()
                .filter(|code| code.is_client_error() || code.is_server_error())
                .unwrap_or(StatusCode::BAD_GATEWAY),
            ApiError::Parse(_) | ApiError::Transport(_) => StatusCode::BAD_GATEWAY,
        }
    }
}
