//! Microsoft Graph client for online meeting transcripts.
//!
//! Provides:
//! - Transcript retrieval (list transcripts, download the first as WebVTT)
//! - Online meeting id resolution from a meeting join URL
//! - App-only (client credentials) authentication

use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use reqwest::{StatusCode, Url};
use serde::Deserialize;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::bot::MeetingResolver;
use crate::config::GraphConfig;
use crate::transcripts::TranscriptSource;

mod token;

use token::TokenProvider;

#[derive(Debug, Error)]
pub enum GraphError {
    #[error("Graph client is not configured: {0} is missing")]
    NotConfigured(&'static str),
    #[error("Graph token request failed with status {status}: {message}")]
    Token { status: StatusCode, message: String },
    #[error("Graph API request failed with status {status}: {body}")]
    Api { status: StatusCode, body: String },
    #[error("Graph HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("Failed to parse Graph response: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("Invalid Graph path segment: {0:?}")]
    InvalidSegment(String),
}

#[derive(Debug, Deserialize)]
struct ODataList<T> {
    #[serde(default = "Vec::new")]
    value: Vec<T>,
}

#[derive(Debug, Deserialize)]
struct TranscriptMetadata {
    id: Option<String>,
}

#[derive(Debug, Deserialize)]
struct OnlineMeeting {
    id: String,
}

/// Credentials that must all be present before any request is made.
struct Credentials {
    user_id: String,
    tokens: TokenProvider,
}

pub struct GraphClient {
    client: reqwest::Client,
    endpoint: Url,
    /// Name of the first missing setting when unconfigured.
    credentials: Result<Credentials, &'static str>,
}

impl GraphClient {
    pub fn new(config: &GraphConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()
            .context("Failed to build Graph HTTP client")?;

        let endpoint = Url::parse(config.endpoint.trim_end_matches('/'))
            .with_context(|| format!("Invalid Graph endpoint: {}", config.endpoint))?;
        if endpoint.cannot_be_a_base() {
            bail!("Invalid Graph endpoint: {}", config.endpoint);
        }
        let credentials = Self::credentials(config);

        match &credentials {
            Ok(_) => info!("Initialized Graph client with endpoint: {}", endpoint),
            Err(missing) => warn!(
                "Graph client is not configured ({} is missing); transcript lookups will report no transcript",
                missing
            ),
        }

        Ok(Self {
            client,
            endpoint,
            credentials,
        })
    }

    fn credentials(config: &GraphConfig) -> Result<Credentials, &'static str> {
        fn required<'a>(value: &'a Option<String>, name: &'static str) -> Result<&'a str, &'static str> {
            value
                .as_deref()
                .filter(|v| !v.trim().is_empty())
                .ok_or(name)
        }

        let tenant_id = required(&config.tenant_id, "graph.tenant_id")?;
        let client_id = required(&config.client_id, "graph.client_id")?;
        let client_secret = required(&config.client_secret, "graph.client_secret")?;
        let user_id = required(&config.user_id, "graph.user_id")?;

        Ok(Credentials {
            user_id: user_id.to_string(),
            tokens: TokenProvider::new(&config.authority, tenant_id, client_id, client_secret),
        })
    }

    pub fn is_configured(&self) -> bool {
        self.credentials.is_ok()
    }

    fn ready(&self) -> Result<&Credentials, GraphError> {
        self.credentials
            .as_ref()
            .map_err(|missing| GraphError::NotConfigured(*missing))
    }

    /// Endpoint extended by `segments`, each percent-encoded as exactly one
    /// path segment (`/`, `?`, `#` and `%` included).
    fn url(&self, segments: &[&str]) -> Result<Url, GraphError> {
        if let Some(dot) = segments.iter().find(|s| matches!(**s, "." | "..")) {
            return Err(GraphError::InvalidSegment(dot.to_string()));
        }

        let mut url = self.endpoint.clone();
        url.path_segments_mut()
            .map_err(|_| GraphError::InvalidSegment(self.endpoint.to_string()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    async fn get(&self, url: Url, query: &[(&str, &str)]) -> Result<String, GraphError> {
        let credentials = self.ready()?;
        let token = credentials.tokens.access_token(&self.client).await?;

        debug!("GET {}", url);
        let response = self
            .client
            .get(url)
            .query(query)
            .bearer_auth(token)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            return Err(GraphError::Api { status, body });
        }

        Ok(body)
    }

    /// Download the first transcript of an online meeting as WebVTT.
    ///
    /// Returns an empty string when the meeting has no transcripts.
    pub async fn meeting_transcript(&self, meeting_id: &str) -> Result<String, GraphError> {
        let user_id = self.ready()?.user_id.as_str();
        let transcripts_url = self.url(&[user_id, "onlineMeetings", meeting_id, "transcripts"])?;

        let body = self.get(transcripts_url, &[]).await?;
        let transcripts: ODataList<TranscriptMetadata> = serde_json::from_str(&body)?;

        let Some(transcript_id) = transcripts.value.into_iter().next().and_then(|t| t.id) else {
            debug!("Meeting {} has no transcripts yet", meeting_id);
            return Ok(String::new());
        };

        let content_url = self.url(&[
            user_id,
            "onlineMeetings",
            meeting_id,
            "transcripts",
            transcript_id.as_str(),
            "content",
        ])?;
        let content = self.get(content_url, &[("$format", "text/vtt")]).await?;

        info!(
            "Downloaded transcript {} for meeting {}: {} chars",
            transcript_id,
            meeting_id,
            content.len()
        );
        Ok(content)
    }

    /// Look up the online meeting id for a Teams join URL.
    pub async fn online_meeting_id(&self, join_web_url: &str) -> Result<Option<String>, GraphError> {
        let user_id = self.ready()?.user_id.as_str();
        // OData string literals escape a quote by doubling it.
        let filter = format!("JoinWebUrl eq '{}'", join_web_url.replace('\'', "''"));

        let meetings_url = self.url(&[user_id, "onlineMeetings"])?;
        let body = self
            .get(meetings_url, &[("$filter", filter.as_str())])
            .await?;
        let meetings: ODataList<OnlineMeeting> = serde_json::from_str(&body)?;

        Ok(meetings.value.into_iter().next().map(|m| m.id))
    }
}

#[async_trait]
impl TranscriptSource for GraphClient {
    fn name(&self) -> &'static str {
        "Microsoft Graph"
    }

    async fn fetch_transcript(&self, meeting_id: &str) -> Result<String> {
        Ok(self.meeting_transcript(meeting_id).await?)
    }
}

#[async_trait]
impl MeetingResolver for GraphClient {
    async fn resolve_meeting_id(&self, join_web_url: &str) -> Result<Option<String>> {
        Ok(self.online_meeting_id(join_web_url).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const USER: &str = "organizer-1";

    fn config_for(server: &MockServer) -> GraphConfig {
        GraphConfig {
            tenant_id: Some("tenant-1".to_string()),
            client_id: Some("client-1".to_string()),
            client_secret: Some("secret".to_string()),
            user_id: Some(USER.to_string()),
            endpoint: format!("{}/beta/users", server.uri()),
            authority: server.uri(),
            timeout_seconds: 5,
        }
    }

    async fn mount_token(server: &MockServer) {
        Mock::given(method("POST"))
            .and(path("/tenant-1/oauth2/v2.0/token"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "expires_in": 3599,
                "access_token": "token-abc"
            })))
            .mount(server)
            .await;
    }

    #[tokio::test]
    async fn test_fetches_first_transcript_as_vtt() {
        let server = MockServer::start().await;
        mount_token(&server).await;

        let transcripts_path = format!("/beta/users/{USER}/onlineMeetings/meeting-1/transcripts");
        Mock::given(method("GET"))
            .and(path(transcripts_path.as_str()))
            .and(header("authorization", "Bearer token-abc"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "value": [
                    { "id": "t-1", "createdDateTime": "2024-01-01T10:00:00Z" },
                    { "id": "t-2", "createdDateTime": "2024-01-01T11:00:00Z" }
                ]
            })))
            .mount(&server)
            .await;

        let vtt = "WEBVTT\n\n00:00:00.000 --> 00:00:02.000\n<v Ada>Hello</v>\n";
        Mock::given(method("GET"))
            .and(path(format!("{transcripts_path}/t-1/content").as_str()))
            .and(query_param("$format", "text/vtt"))
            .respond_with(ResponseTemplate::new(200).set_body_string(vtt))
            .mount(&server)
            .await;

        let client = GraphClient::new(&config_for(&server)).unwrap();
        assert_eq!(client.fetch_transcript("meeting-1").await.unwrap(), vtt);
    }

    #[tokio::test]
    async fn test_no_transcripts_returns_empty() {
        let server = MockServer::start().await;
        mount_token(&server).await;

        Mock::given(method("GET"))
            .and(path(format!("/beta/users/{USER}/onlineMeetings/meeting-2/transcripts").as_str()))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({ "value": [] })))
            .mount(&server)
            .await;

        let client = GraphClient::new(&config_for(&server)).unwrap();
        assert_eq!(client.fetch_transcript("meeting-2").await.unwrap(), "");
    }

    #[tokio::test]
    async fn test_api_error_is_reported() {
        let server = MockServer::start().await;
        mount_token(&server).await;

        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(403).set_body_string("Forbidden"))
            .mount(&server)
            .await;

        let client = GraphClient::new(&config_for(&server)).unwrap();
        let err = client.meeting_transcript("meeting-3").await.unwrap_err();
        assert!(matches!(err, GraphError::Api { status, .. } if status == StatusCode::FORBIDDEN));
    }

    #[tokio::test]
    async fn test_unconfigured_client_fails_without_requests() {
        let server = MockServer::start().await;
        let mut config = config_for(&server);
        config.client_secret = None;

        let client = GraphClient::new(&config).unwrap();
        assert!(!client.is_configured());

        let err = client.meeting_transcript("meeting-1").await.unwrap_err();
        assert!(matches!(err, GraphError::NotConfigured("graph.client_secret")));
        assert!(server.received_requests().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_resolves_meeting_id_from_join_url() {
        let server = MockServer::start().await;
        mount_token(&server).await;

        let join_url = "https://teams.microsoft.com/l/meetup-join/19%3ameeting_abc";
        Mock::given(method("GET"))
            .and(path(format!("/beta/users/{USER}/onlineMeetings").as_str()))
            .and(query_param("$filter", format!("JoinWebUrl eq '{join_url}'").as_str()))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "value": [{ "id": "MSpkYzE3" }]
            })))
            .mount(&server)
            .await;

        let client = GraphClient::new(&config_for(&server)).unwrap();
        assert_eq!(
            client.resolve_meeting_id(join_url).await.unwrap(),
            Some("MSpkYzE3".to_string())
        );
    }

    #[tokio::test]
    async fn test_meeting_id_stays_one_path_segment() {
        let server = MockServer::start().await;
        mount_token(&server).await;

        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({ "value": [] })))
            .mount(&server)
            .await;

        let client = GraphClient::new(&config_for(&server)).unwrap();
        assert_eq!(client.fetch_transcript("a/../b").await.unwrap(), "");
        assert_eq!(
            client
                .fetch_transcript("../../victim/onlineMeetings/secret")
                .await
                .unwrap(),
            ""
        );

        let paths: Vec<String> = server
            .received_requests()
            .await
            .unwrap()
            .into_iter()
            .filter(|request| request.method.as_str() == "GET")
            .map(|request| request.url.path().to_string())
            .collect();
        assert_eq!(
            paths,
            vec![
                format!("/beta/users/{USER}/onlineMeetings/a%2F..%2Fb/transcripts"),
                format!(
                    "/beta/users/{USER}/onlineMeetings/..%2F..%2Fvictim%2FonlineMeetings%2Fsecret/transcripts"
                ),
            ]
        );
    }

    #[tokio::test]
    async fn test_dot_segment_ids_are_rejected() {
        let server = MockServer::start().await;
        mount_token(&server).await;

        let client = GraphClient::new(&config_for(&server)).unwrap();
        for id in [".", ".."] {
            let err = client.meeting_transcript(id).await.unwrap_err();
            assert!(matches!(err, GraphError::InvalidSegment(ref segment) if segment == id));
        }
        assert!(server.received_requests().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_transcript_id_is_encoded_in_content_url() {
        let server = MockServer::start().await;
        mount_token(&server).await;

        let transcripts_path = format!("/beta/users/{USER}/onlineMeetings/meeting-1/transcripts");
        Mock::given(method("GET"))
            .and(path(transcripts_path.as_str()))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "value": [{ "id": "../../other" }]
            })))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path(format!("{transcripts_path}/..%2F..%2Fother/content").as_str()))
            .respond_with(ResponseTemplate::new(200).set_body_string("WEBVTT"))
            .expect(1)
            .mount(&server)
            .await;

        let client = GraphClient::new(&config_for(&server)).unwrap();
        assert_eq!(client.fetch_transcript("meeting-1").await.unwrap(), "WEBVTT");
    }

    #[test]
    fn test_invalid_endpoint_is_rejected() {
        let config = GraphConfig {
            endpoint: "not a url".to_string(),
            ..GraphConfig::default()
        };
        assert!(GraphClient::new(&config).is_err());
    }

    #[tokio::test]
    async fn test_join_url_quotes_are_escaped_in_filter() {
        let server = MockServer::start().await;
        mount_token(&server).await;

        let join_url = "https://teams.example.com/join/x' or startswith(subject,'a";
        Mock::given(method("GET"))
            .and(path(format!("/beta/users/{USER}/onlineMeetings").as_str()))
            .and(query_param(
                "$filter",
                "JoinWebUrl eq 'https://teams.example.com/join/x'' or startswith(subject,''a'",
            ))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({ "value": [] })))
            .expect(1)
            .mount(&server)
            .await;

        let client = GraphClient::new(&config_for(&server)).unwrap();
        assert_eq!(client.resolve_meeting_id(join_url).await.unwrap(), None);
    }
}
