//! Request and response bodies of the backend endpoints.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::event::{Event, RawEvent};

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct AuthStatus {
    #[serde(rename = "isAuthenticated", default)]
    pub is_authenticated: bool,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct EventsResponse {
    #[serde(default)]
    pub events: Vec<RawEvent>,
}

#[derive(Debug, Serialize)]
pub struct WelcomeRequest<'a> {
    pub events: &'a [RawEvent],
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct WelcomeResponse {
    #[serde(default)]
    pub message: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SearchResponse {
    #[serde(default)]
    pub answer: Option<String>,
    #[serde(default)]
    pub events: Vec<SearchHit>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SearchHit {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub start: Option<String>,
    #[serde(default)]
    pub end: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Serialize)]
pub struct EditOrDeleteRequest<'a> {
    pub query: &'a str,
    pub event: &'a Event,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EditStatus {
    Success,
    /// The backend could not classify the request.
    Unknown,
}

#[derive(Debug, Clone, Deserialize)]
pub struct EditOrDeleteResponse {
    pub status: EditStatus,
    #[serde(default)]
    pub message: Option<String>,
}

impl EditOrDeleteResponse {
    pub fn is_soft_failure(&self) -> bool {
        self.status == EditStatus::Unknown
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum SpeechToTextResponse {
    Transcribed { text: String },
    Failed { error: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn edit_status_parses_soft_failure() {
        let parsed: EditOrDeleteResponse =
            serde_json::from_str(r#"{"status":"unknown","message":"Could not tell what to change"}"#).unwrap();
        assert!(parsed.is_soft_failure());

        let parsed: EditOrDeleteResponse = serde_json::from_str(r#"{"status":"success"}"#).unwrap();
        assert!(!parsed.is_soft_failure());
        assert!(parsed.message.is_none());
    }

    #[test]
    fn edit_status_rejects_unlisted_values() {
        assert!(serde_json::from_str::<EditOrDeleteResponse>(r#"{"status":"maybe"}"#).is_err());
    }

    #[test]
    fn speech_to_text_is_text_or_error() {
        let ok: SpeechToTextResponse = serde_json::from_str(r#"{"text":"lunch with sam"}"#).unwrap();
        assert_eq!(ok, SpeechToTextResponse::Transcribed { text: "lunch with sam".to_string() });

        let err: SpeechToTextResponse = serde_json::from_str(r#"{"error":"no audio"}"#).unwrap();
        assert_eq!(err, SpeechToTextResponse::Failed { error: "no audio".to_string() });
    }

    #[test]
    fn auth_status_defaults_to_unauthenticated() {
        let status: AuthStatus = serde_json::from_str("{}").unwrap();
        assert!(!status.is_authenticated);
    }
}
