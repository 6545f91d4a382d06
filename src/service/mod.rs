use crate::{
    dto::{FormUpdate, StoreSnapshot},
    models::{QueryType, RequestToken, default_annotation},
    query::{AnnoStoreQuery, QueryRequest, QueryResult, ResultCallback},
    transport::AnnotationTransport,
};

use chrono::Utc;
use std::sync::Arc;
use tokio::{
    sync::{Mutex, watch},
    task::JoinHandle,
};

#[derive(Debug, Clone)]
struct FormState {
    secret: Option<String>,
    id: Option<String>,
    query_type: QueryType,
    annotation: Option<String>,
    query_timestamp: Option<RequestToken>,
}

impl Default for FormState {
    fn default() -> Self {
        Self {
            secret: None,
            id: None,
            query_type: QueryType::None,
            annotation: Some(default_annotation()),
            query_timestamp: None,
        }
    }
}

/// Form component. Holds the editable fields and the endpoint, mints a
/// request token on submit and feeds the query component.
pub struct AnnoStore {
    endpoint: Option<String>,
    form: Mutex<FormState>,
    query: Arc<AnnoStoreQuery>,
    last_result: watch::Receiver<Option<QueryResult>>,
}

impl AnnoStore {
    pub fn new(endpoint: Option<String>, transport: Arc<dyn AnnotationTransport>) -> Self {
        let (result_tx, last_result) = watch::channel(None);
        let on_result: ResultCallback = Arc::new(move |result: &QueryResult| {
            result_tx.send_replace(Some(result.clone()));
        });

        Self {
            endpoint: endpoint.filter(|e| !e.is_empty()),
            form: Mutex::new(FormState::default()),
            query: Arc::new(AnnoStoreQuery::new(transport, on_result)),
            last_result,
        }
    }

    pub fn endpoint(&self) -> Option<&str> {
        self.endpoint.as_deref()
    }

    /// Applies field edits. Edits never start a query by themselves.
    pub async fn edit(&self, update: FormUpdate) -> Option<JoinHandle<()>> {
        // The form guard stays held until the query component has seen the
        // request, so inputs reach it in token order.
        let mut form = self.form.lock().await;
        if let Some(secret) = update.secret {
            form.secret = Some(secret);
        }
        if let Some(id) = update.id {
            form.id = Some(id);
        }
        if let Some(query_type) = update.query_type {
            form.query_type = query_type;
        }
        if let Some(annotation) = update.annotation {
            form.annotation = Some(annotation);
        }
        let request = self.query_request(&form);
        self.query.update(request).await
    }

    /// Mints a fresh request token from the clock and hands the current
    /// fields to the query component.
    pub async fn submit(&self) -> (RequestToken, Option<JoinHandle<()>>) {
        let mut form = self.form.lock().await;
        let token = RequestToken::next_after(
            form.query_timestamp.as_ref(),
            Utc::now().timestamp_millis(),
        );
        tracing::info!("Submitting query {}", token);
        form.query_timestamp = Some(token.clone());
        let request = self.query_request(&form);
        let handle = self.query.update(request).await;
        drop(form);
        (token, handle)
    }

    fn query_request(&self, form: &FormState) -> QueryRequest {
        QueryRequest {
            token: form.query_timestamp.clone(),
            endpoint: self.endpoint.clone(),
            secret: form.secret.clone(),
            id: form.id.clone(),
            query_type: form.query_type,
            annotation: form.annotation.clone(),
        }
    }

    /// Last outcome reported by the query component.
    pub fn last_result(&self) -> Option<QueryResult> {
        self.last_result.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<Option<QueryResult>> {
        self.last_result.clone()
    }

    pub async fn snapshot(&self) -> StoreSnapshot {
        let form = self.form.lock().await.clone();
        StoreSnapshot {
            endpoint: self.endpoint.clone(),
            secret: form.secret,
            id: form.id,
            query_type: form.query_type,
            annotation: form.annotation,
            query_timestamp: form.query_timestamp,
            query: self.query.snapshot().await,
        }
    }
}
