use async_trait::async_trait;
use reqwest::{Method, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use crate::errors::{ChronosError, Result};
use crate::models::api::{
    AuthStatus, EditOrDeleteRequest, EditOrDeleteResponse, EventsResponse, SearchResponse,
    SpeechToTextResponse, WelcomeRequest, WelcomeResponse,
};
use crate::models::event::{Event, RawEvent};
use crate::models::schedule::{SchedulingRequest, StatusResponse};
use crate::service::session::Session;

/// Backend operations used by the tracker, the refresh loop and the CLI.
#[async_trait]
pub trait ChronosApi: Send + Sync {
    async fn auth_status(&self) -> Result<AuthStatus>;
    async fn list_events(&self) -> Result<Vec<RawEvent>>;
    async fn schedule_status(&self, request: &SchedulingRequest) -> Result<StatusResponse>;
    async fn welcome_message(&self, events: &[RawEvent]) -> Result<Option<String>>;
    async fn search(&self, query: &str) -> Result<SearchResponse>;
    async fn edit_or_delete(&self, query: &str, event: &Event) -> Result<EditOrDeleteResponse>;
    async fn speech_to_text(&self, audio: Vec<u8>, file_name: &str) -> Result<SpeechToTextResponse>;
}

pub struct ChronosClient {
    http: reqwest::Client,
    base_url: String,
    session: Session,
}

impl ChronosClient {
    pub fn new(base_url: &str, session: Session) -> Result<Self> {
        let http = reqwest::Client::builder().cookie_store(true).build()?;
        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            session,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let url = format!("{}{}", self.base_url, path);
        let builder = self.http.request(method, url);
        match self.session.token() {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }
}

/// Reads the body once, maps non-2xx to [`ChronosError::Status`] and decodes
/// the JSON payload.
async fn read_json<T: DeserializeOwned>(response: Response) -> Result<T> {
    let status = response.status();
    let url = response.url().path().to_string();
    let text = response.text().await?;

    if !status.is_success() {
        warn!(%url, status = status.as_u16(), "backend returned an error status");
        return Err(ChronosError::Status {
            status: status.as_u16(),
            body: text,
        });
    }

    serde_json::from_str(&text).map_err(|e| {
        debug!(%url, body = %text, "response body did not match the expected shape");
        ChronosError::Decode(format!("{} from {}", e, url))
    })
}

#[async_trait]
impl ChronosApi for ChronosClient {
    async fn auth_status(&self) -> Result<AuthStatus> {
        let response = self.request(Method::GET, "/api/auth-status").send().await?;
        read_json(response).await
    }

    async fn list_events(&self) -> Result<Vec<RawEvent>> {
        let response = self.request(Method::GET, "/api/events").send().await?;
        let parsed: EventsResponse = read_json(response).await?;
        debug!(count = parsed.events.len(), "fetched events");
        Ok(parsed.events)
    }

    async fn schedule_status(&self, request: &SchedulingRequest) -> Result<StatusResponse> {
        let response = self
            .request(Method::POST, "/api/schedule/status")
            .json(request)
            .send()
            .await?;
        read_json(response).await
    }

    async fn welcome_message(&self, events: &[RawEvent]) -> Result<Option<String>> {
        let response = self
            .request(Method::POST, "/api/welcome_msg")
            .json(&WelcomeRequest { events })
            .send()
            .await?;
        let parsed: WelcomeResponse = read_json(response).await?;
        Ok(parsed.message)
    }

    async fn search(&self, query: &str) -> Result<SearchResponse> {
        let response = self
            .request(Method::GET, "/api/search")
            .query(&[("q", query)])
            .send()
            .await?;
        read_json(response).await
    }

    async fn edit_or_delete(&self, query: &str, event: &Event) -> Result<EditOrDeleteResponse> {
        let response = self
            .request(Method::POST, "/api/editOrDelete")
            .json(&EditOrDeleteRequest { query, event })
            .send()
            .await?;
        read_json(response).await
    }

    async fn speech_to_text(&self, audio: Vec<u8>, file_name: &str) -> Result<SpeechToTextResponse> {
        let part = reqwest::multipart::Part::bytes(audio).file_name(file_name.to_string());
        let form = reqwest::multipart::Form::new().part("audio", part);
        let response = self
            .request(Method::POST, "/api/speech-to-text")
            .multipart(form)
            .send()
            .await?;
        read_json(response).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use wiremock::matchers::{body_json, header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client(server: &MockServer, token: Option<&str>) -> ChronosClient {
        let session = match token {
            Some(token) => Session::with_token(token),
            None => Session::anonymous(),
        };
        ChronosClient::new(&server.uri(), session).unwrap()
    }

    #[tokio::test]
    async fn sends_bearer_token_when_logged_in() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/auth-status"))
            .and(header("Authorization", "Bearer tok-123"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"isAuthenticated": true})))
            .expect(1)
            .mount(&server)
            .await;

        let status = client(&server, Some("tok-123")).auth_status().await.unwrap();
        assert!(status.is_authenticated);
    }

    #[tokio::test]
    async fn lists_raw_events() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/events"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "events": [
                    {"id": "1", "summary": "Standup", "start": {"dateTime": "2026-10-19T09:00:00Z"}, "end": {"dateTime": "2026-10-19T09:15:00Z"}, "colorId": "7"}
                ]
            })))
            .mount(&server)
            .await;

        let events = client(&server, None).list_events().await.unwrap();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].summary.as_deref(), Some("Standup"));
        assert_eq!(events[0].color_id.as_deref(), Some("7"));
    }

    #[tokio::test]
    async fn posts_full_request_to_status_endpoint() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/schedule/status"))
            .and(body_json(serde_json::json!({
                "query": "coffee with connor on wednesday",
                "preferences": ["no meetings before 9am"]
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "message": "Finding a slot", "stage": "availability", "complete": false
            })))
            .mount(&server)
            .await;

        let request = SchedulingRequest::new(
            "coffee with connor on wednesday",
            vec!["no meetings before 9am".to_string()],
        );
        let status = client(&server, None).schedule_status(&request).await.unwrap();
        assert!(!status.complete);
        assert_eq!(status.stage.as_deref(), Some("availability"));
    }

    #[tokio::test]
    async fn maps_error_status_with_body() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/schedule/status"))
            .respond_with(ResponseTemplate::new(500).set_body_string("model exploded"))
            .mount(&server)
            .await;

        let request = SchedulingRequest::new("lunch", vec![]);
        let err = client(&server, None).schedule_status(&request).await.unwrap_err();
        match err {
            ChronosError::Status { status, body } => {
                assert_eq!(status, 500);
                assert_eq!(body, "model exploded");
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[tokio::test]
    async fn rejects_non_json_body() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/events"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>login</html>"))
            .mount(&server)
            .await;

        let err = client(&server, None).list_events().await.unwrap_err();
        assert!(matches!(err, ChronosError::Decode(_)));
    }

    #[tokio::test]
    async fn searches_with_query_parameter() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/search"))
            .and(query_param("q", "dentist"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "answer": "Your dentist visit is on Friday.",
                "events": [{"title": "Dentist", "start": "2026-10-23T14:00:00Z"}]
            })))
            .mount(&server)
            .await;

        let result = client(&server, None).search("dentist").await.unwrap();
        assert_eq!(result.answer.as_deref(), Some("Your dentist visit is on Friday."));
        assert_eq!(result.events[0].title.as_deref(), Some("Dentist"));
    }

    #[tokio::test]
    async fn edit_or_delete_sends_query_and_event() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/editOrDelete"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "status": "unknown", "message": "Not sure what to change"
            })))
            .mount(&server)
            .await;

        let event = Event::new(
            "e1",
            "Standup",
            Utc.with_ymd_and_hms(2026, 10, 19, 9, 0, 0).unwrap(),
            Utc.with_ymd_and_hms(2026, 10, 19, 9, 15, 0).unwrap(),
        );
        let result = client(&server, None)
            .edit_or_delete("move it later", &event)
            .await
            .unwrap();
        assert!(result.is_soft_failure());

        let received = server.received_requests().await.unwrap();
        let body: serde_json::Value = serde_json::from_slice(&received[0].body).unwrap();
        assert_eq!(body["query"], "move it later");
        assert_eq!(body["event"]["id"], "e1");
    }

    #[tokio::test]
    async fn uploads_audio_for_transcription() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/speech-to-text"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"text": "lunch on friday"})))
            .mount(&server)
            .await;

        let result = client(&server, None)
            .speech_to_text(vec![1, 2, 3], "clip.webm")
            .await
            .unwrap();
        assert_eq!(result, SpeechToTextResponse::Transcribed { text: "lunch on friday".to_string() });
    }

    #[tokio::test]
    async fn welcome_message_posts_events() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/welcome_msg"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"message": "Busy week ahead!"})))
            .mount(&server)
            .await;

        let message = client(&server, None).welcome_message(&[]).await.unwrap();
        assert_eq!(message.as_deref(), Some("Busy week ahead!"));
    }
}
