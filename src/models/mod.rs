use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Operation selector appended to the endpoint path.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum QueryType {
    #[default]
    None,
    Save,
    Edit,
    Delete,
}

impl QueryType {
    /// Choices offered by the form's select, in display order.
    pub const SELECTABLE: [Self; 3] = [Self::Save, Self::Edit, Self::Delete];

    /// Literal suffix appended to the endpoint. `None` contributes nothing.
    pub const fn path_suffix(self) -> &'static str {
        match self {
            Self::None => "",
            Self::Save => "save",
            Self::Edit => "edit",
            Self::Delete => "delete",
        }
    }
}

impl fmt::Display for QueryType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.path_suffix())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown query type '{0}'")]
pub struct UnknownQueryType(pub String);

impl FromStr for QueryType {
    type Err = UnknownQueryType;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "" | "none" => Ok(Self::None),
            "save" => Ok(Self::Save),
            "edit" => Ok(Self::Edit),
            "delete" => Ok(Self::Delete),
            other => Err(UnknownQueryType(other.to_string())),
        }
    }
}

/// Opaque identity of one submit. A change of token is the only thing that
/// starts a new query.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
pub struct RequestToken(String);

impl RequestToken {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Millisecond timestamp token. Never returns a token equal to or older
    /// than `previous`, so back-to-back submits stay distinct.
    pub fn next_after(previous: Option<&Self>, now_millis: i64) -> Self {
        let floor = previous
            .and_then(|p| p.0.parse::<i64>().ok())
            .map_or(i64::MIN, |p| p.saturating_add(1));
        Self(now_millis.max(floor).to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RequestToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Annotation text the form starts with.
pub const DEFAULT_ANNOTATION: &str = r#"{"type":"annotation","motivation":"supplementing","body":[{"id":"sometarget","type":"DataSet","value":{"hello":"world"},"format":"application/json"}]}"#;

pub fn default_annotation() -> String {
    DEFAULT_ANNOTATION.to_string()
}
