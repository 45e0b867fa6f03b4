use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Bucket and key of the object that triggered the invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadEvent {
    pub bucket: String,
    pub key: String,
}

/// Custom metadata attached to the uploaded object when it was stored.
///
/// `Default` is the degraded value used when the metadata cannot be read.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ObjectMetadata {
    pub original_name: String,
    pub activity_id: String,
    pub external_id: String,
}

/// Short-lived bearer token for the Strava API.
#[derive(Clone, PartialEq, Eq)]
pub struct AccessToken(String);

impl AccessToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("AccessToken(<redacted>)")
    }
}

#[derive(Debug, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
}

/// Current state of a Strava activity.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActivityInfo {
    #[serde(default)]
    pub id: Option<u64>,
    pub name: String,
    /// Name of the original file uploaded to Strava
    #[serde(default)]
    pub external_id: Option<String>,
    #[serde(flatten)]
    pub other: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmailMessage {
    pub sender: String,
    pub to: Vec<String>,
    pub cc: Vec<String>,
    pub subject: String,
    pub html_body: String,
    pub text_body: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum DispatchStatus {
    Sent { message_id: String },
    Failed { reason: String },
}

/// What a completed invocation reports back to the runtime.
#[derive(Debug, Clone, Serialize)]
pub struct InvocationOutcome {
    pub bucket: String,
    pub key: String,
    pub activity_id: String,
    pub current_activity_name: String,
    pub name_changed: bool,
    pub metadata_degraded: bool,
    pub dispatch: DispatchStatus,
}
