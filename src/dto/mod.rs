use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::models::{QueryType, RequestToken};

/// Body POSTed to the annotation endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryPayload {
    /// Secret
    pub s: String,
    /// URI-component-encoded annotation text
    pub annotation: Option<String>,
}

/// Partial update of the form fields. Absent fields are left unchanged.
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct FormUpdate {
    pub secret: Option<String>,
    pub id: Option<String>,
    pub query_type: Option<QueryType>,
    pub annotation: Option<String>,
}

/// Fields posted by the HTML form. Browsers omit nothing but send empty
/// strings for blank inputs.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct FormSubmission {
    #[serde(default)]
    pub secret: String,
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub query_type: String,
    #[serde(default)]
    pub annotation: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct SubmitResponse {
    /// Token identifying the submitted query
    pub query_timestamp: RequestToken,
}

/// Query panel as displayed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct QuerySnapshot {
    /// URL of the last completed request
    pub query_url: Option<String>,
    /// Stringified JSON response, or the waiting placeholder
    pub query_result: Option<String>,
    /// Error message
    pub error: Option<String>,
}

/// Whole page state.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct StoreSnapshot {
    pub endpoint: Option<String>,
    pub secret: Option<String>,
    pub id: Option<String>,
    pub query_type: QueryType,
    pub annotation: Option<String>,
    pub query_timestamp: Option<RequestToken>,
    pub query: QuerySnapshot,
}
