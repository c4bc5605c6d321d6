// ABOUTME: Blocking HTTP client for the transcript editing service
// ABOUTME: Handles login, auth headers, document metadata and audio fetch

use crate::model::LoginResponse;
use crate::{DocumentMetadata, DocumentSummary, Error, Result};
use log::{debug, error};
use reqwest::blocking::{Client, RequestBuilder, Response};
use serde_json::json;
use std::time::Duration;

pub const DEFAULT_API_BASE: &str = "http://localhost:8000";

fn truncate_str(s: &str, max_chars: usize) -> String {
    if s.len() <= max_chars {
        return s.to_string();
    }

    // Find a valid UTF-8 boundary at or before max_chars
    let mut boundary = max_chars;
    while boundary > 0 && !s.is_char_boundary(boundary) {
        boundary -= 1;
    }

    if boundary == 0 {
        return String::new();
    }

    format!("{}...", &s[..boundary])
}

pub struct ApiClient {
    client: Client,
    base_url: String,
    token: Option<String>,
}

impl ApiClient {
    pub fn new(base_url: Option<String>) -> Result<Self> {
        // Audio downloads can be large, so only the connect phase is bounded.
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(30))
            .build()?;

        Ok(ApiClient {
            client,
            base_url: base_url
                .unwrap_or_else(|| DEFAULT_API_BASE.into())
                .trim_end_matches('/')
                .to_string(),
            token: None,
        })
    }

    pub fn with_token(mut self, token: String) -> Self {
        self.token = Some(token);
        self
    }

    pub fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }

    fn authorized(&self, request: RequestBuilder) -> RequestBuilder {
        let request = request.header("User-Agent", "audump/0.1 (Rust)");
        match &self.token {
            Some(token) => request.header("Authorization", format!("Token {}", token)),
            None => request,
        }
    }

    fn json_request(&self, request: RequestBuilder) -> RequestBuilder {
        self.authorized(request).header("Accept", "application/json")
    }

    fn send(&self, endpoint: &str, request: RequestBuilder) -> Result<Response> {
        let response = request.send()?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().unwrap_or_default();
            return Err(Error::Api {
                endpoint: endpoint.into(),
                status: status.as_u16(),
                message: truncate_str(&message, 100),
            });
        }

        Ok(response)
    }

    fn parse<T: serde::de::DeserializeOwned>(endpoint: &str, response: Response) -> Result<T> {
        let body = response.text()?;
        serde_json::from_str(&body).map_err(|e| {
            error!("Failed to parse response from {}: {}", endpoint, e);
            debug!("Response body (first 500 chars): {}", truncate_str(&body, 500));
            Error::Parse(e)
        })
    }

    fn get_json<T: serde::de::DeserializeOwned>(&self, endpoint: &str) -> Result<T> {
        let url = format!("{}{}", self.base_url, endpoint);
        let response = self.send(endpoint, self.json_request(self.client.get(&url)))?;
        Self::parse(endpoint, response)
    }

    /// Exchanges credentials for a bearer token. Rejected credentials map to `Error::Auth`.
    pub fn login(&self, username: &str, password: &str) -> Result<String> {
        let endpoint = "/api/v1/users/login/";
        let url = format!("{}{}", self.base_url, endpoint);
        let request = self
            .json_request(self.client.post(&url))
            .json(&json!({ "username": username, "password": password }));

        let response = match self.send(endpoint, request) {
            Err(Error::Api {
                status: 400 | 401 | 403,
                message,
                ..
            }) => return Err(Error::Auth(format!("login rejected: {}", message))),
            other => other?,
        };

        let login: LoginResponse = Self::parse(endpoint, response)?;
        Ok(login.token)
    }

    pub fn list_documents(&self) -> Result<Vec<DocumentSummary>> {
        self.get_json("/api/v1/documents")
    }

    pub fn get_metadata(&self, doc_id: &str) -> Result<DocumentMetadata> {
        self.get_json(&format!("/api/v1/documents/{}", doc_id))
    }

    /// Resolves a locator that may be relative to the API base.
    pub fn resolve_locator(&self, locator: &str) -> String {
        if locator.starts_with("http://") || locator.starts_with("https://") {
            locator.to_string()
        } else {
            format!("{}/{}", self.base_url, locator.trim_start_matches('/'))
        }
    }

    /// True when `url` is served by the API host, the only place the token may go.
    fn is_api_url(&self, url: &str) -> bool {
        url.strip_prefix(self.base_url.as_str())
            .map_or(false, |rest| rest.is_empty() || rest.starts_with('/'))
    }

    pub fn fetch_audio(&self, locator: &str) -> Result<Vec<u8>> {
        let url = self.resolve_locator(locator);
        let request = self.client.get(&url);
        let request = if self.is_api_url(&url) {
            self.authorized(request)
        } else {
            debug!("fetching audio from foreign host without credentials");
            request.header("User-Agent", "audump/0.1 (Rust)")
        };
        let response = self.send(locator, request)?;
        Ok(response.bytes()?.to_vec())
    }
}
