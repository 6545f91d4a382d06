//! Query lifecycle: turns a request descriptor into at most one network call
//! per request token and keeps the panel state for the latest token.
//!
//! ```text
//! idle ──token change──▶ pending ──completion──▶ resolved | failed
//!   ▲                       ▲                          │
//!   └──── token cleared ────┴────── token change ──────┘
//! ```

use std::sync::Arc;

use serde_json::Value;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;

use crate::dto::{QueryPayload, QuerySnapshot};
use crate::encoding::encode_uri_component;
use crate::models::{QueryType, RequestToken};
use crate::transport::AnnotationTransport;

/// Placeholder shown as the result before any query was submitted.
pub const WAITING_FOR_QUERIES: &str = "waiting for queries";

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum QueryError {
    #[error("no endpoint specified")]
    NoEndpoint,

    #[error("no secret specified")]
    NoSecret,

    /// Send or parse failure, carrying the underlying message.
    #[error("{0}")]
    Transport(String),
}

/// Outcome handed to the result callback, for success and failure alike.
pub type QueryResult = Result<Value, QueryError>;

pub type ResultCallback = Arc<dyn Fn(&QueryResult) + Send + Sync>;

/// Inputs of the query component.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryRequest {
    pub token: Option<RequestToken>,
    pub endpoint: Option<String>,
    pub secret: Option<String>,
    /// Carried along but never sent.
    pub id: Option<String>,
    pub query_type: QueryType,
    pub annotation: Option<String>,
}

fn non_empty(value: Option<&String>) -> Option<&str> {
    value.map(String::as_str).filter(|v| !v.is_empty())
}

impl QueryRequest {
    /// URL and body for this request, or the first validation failure.
    pub fn prepare(&self) -> Result<(String, QueryPayload), QueryError> {
        let endpoint = non_empty(self.endpoint.as_ref()).ok_or(QueryError::NoEndpoint)?;
        let secret = non_empty(self.secret.as_ref()).ok_or(QueryError::NoSecret)?;

        let url = format!("{endpoint}{}", self.query_type.path_suffix());
        let payload = QueryPayload {
            s: secret.to_string(),
            annotation: non_empty(self.annotation.as_ref()).map(encode_uri_component),
        };
        Ok((url, payload))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueryStatus {
    Idle,
    Pending,
    Resolved(String),
    Failed(String),
}

/// A network call to perform on behalf of `token`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Dispatch {
    pub token: RequestToken,
    pub url: String,
    pub payload: QueryPayload,
}

/// Synchronous state machine behind [`AnnoStoreQuery`].
#[derive(Debug, Clone)]
pub struct QueryLifecycle {
    token: Option<RequestToken>,
    status: QueryStatus,
    query_url: Option<String>,
}

impl Default for QueryLifecycle {
    fn default() -> Self {
        Self::new()
    }
}

impl QueryLifecycle {
    pub const fn new() -> Self {
        Self {
            token: None,
            status: QueryStatus::Idle,
            query_url: None,
        }
    }

    pub const fn status(&self) -> &QueryStatus {
        &self.status
    }

    pub const fn token(&self) -> Option<&RequestToken> {
        self.token.as_ref()
    }

    /// Feeds new inputs. Only a changed token does anything: panel state is
    /// cleared, then either validation settles the state or a [`Dispatch`] is
    /// returned for the caller to execute.
    pub fn receive(&mut self, request: &QueryRequest) -> Option<Dispatch> {
        if request.token == self.token {
            return None;
        }

        self.token.clone_from(&request.token);
        self.status = QueryStatus::Pending;
        self.query_url = None;

        let Some(token) = request.token.clone() else {
            self.status = QueryStatus::Idle;
            return None;
        };

        match request.prepare() {
            Ok((url, payload)) => {
                tracing::info!("Issuing query {} to {}", token, url);
                Some(Dispatch {
                    token,
                    url,
                    payload,
                })
            }
            Err(e) => {
                tracing::info!("Query {} rejected: {}", token, e);
                self.status = QueryStatus::Failed(e.to_string());
                None
            }
        }
    }

    /// Applies a network completion. Completions for a token other than the
    /// latest one, or arriving after the state already settled, are dropped.
    /// Returns whether the completion was applied.
    pub fn complete(&mut self, token: &RequestToken, url: String, result: &QueryResult) -> bool {
        if self.token.as_ref() != Some(token) {
            tracing::debug!(
                "Discarding stale completion for {} (latest is {:?})",
                token,
                self.token
            );
            return false;
        }
        if self.status != QueryStatus::Pending {
            return false;
        }

        self.query_url = Some(url);
        self.status = match result {
            Ok(value) => QueryStatus::Resolved(value.to_string()),
            Err(e) => QueryStatus::Failed(e.to_string()),
        };
        true
    }

    pub fn snapshot(&self) -> QuerySnapshot {
        let (query_result, error) = match &self.status {
            QueryStatus::Idle => (Some(WAITING_FOR_QUERIES.to_string()), None),
            QueryStatus::Pending => (None, None),
            QueryStatus::Resolved(result) => (Some(result.clone()), None),
            QueryStatus::Failed(error) => (None, Some(error.clone())),
        };
        QuerySnapshot {
            query_url: self.query_url.clone(),
            query_result,
            error,
        }
    }
}

/// Query component: owns the lifecycle, runs dispatched calls on the tokio
/// runtime and reports applied completions through the result callback.
pub struct AnnoStoreQuery {
    lifecycle: Mutex<QueryLifecycle>,
    transport: Arc<dyn AnnotationTransport>,
    on_result: ResultCallback,
}

impl AnnoStoreQuery {
    pub fn new(transport: Arc<dyn AnnotationTransport>, on_result: ResultCallback) -> Self {
        Self {
            lifecycle: Mutex::new(QueryLifecycle::new()),
            transport,
            on_result,
        }
    }

    /// Passes new inputs to the lifecycle. When they carry a new, valid token
    /// the request is spawned and its handle returned.
    pub async fn update(self: &Arc<Self>, request: QueryRequest) -> Option<JoinHandle<()>> {
        let dispatch = self.lifecycle.lock().await.receive(&request)?;

        let query = Arc::clone(self);
        Some(tokio::spawn(async move {
            query.execute(dispatch).await;
        }))
    }

    async fn execute(&self, dispatch: Dispatch) {
        let Dispatch {
            token,
            url,
            payload,
        } = dispatch;

        let result = self
            .transport
            .post(&url, &payload)
            .await
            .map_err(|e| QueryError::Transport(e.to_string()));

        let applied = self
            .lifecycle
            .lock()
            .await
            .complete(&token, url, &result);

        if applied {
            (self.on_result)(&result);
        }
    }

    pub async fn snapshot(&self) -> QuerySnapshot {
        self.lifecycle.lock().await.snapshot()
    }

    pub async fn status(&self) -> QueryStatus {
        self.lifecycle.lock().await.status().clone()
    }

    /// Latest token the lifecycle acted on.
    pub async fn token(&self) -> Option<RequestToken> {
        self.lifecycle.lock().await.token().cloned()
    }
}
