// ABOUTME: Bearer token discovery with precedence chain
// ABOUTME: CLI flag/env token → login with username and password

use crate::api::ApiClient;
use crate::{Error, Result};

#[derive(Debug, Clone, Default)]
pub struct Credentials {
    pub token: Option<String>,
    pub username: Option<String>,
    pub password: Option<String>,
}

/// Returns an opaque bearer token; its contents are never inspected.
pub fn resolve_token(client: &ApiClient, credentials: &Credentials) -> Result<String> {
    // 1. CLI flag or AUDAPOLIS_TOKEN
    if let Some(token) = credentials.token.as_ref().filter(|t| !t.is_empty()) {
        return Ok(token.clone());
    }

    // 2. Login exchange
    match (&credentials.username, &credentials.password) {
        (Some(username), Some(password)) => {
            log::info!("logging in as {}", username);
            client.login(username, password)
        }
        (Some(_), None) => Err(Error::Auth(
            "Username given without password. Provide --password or AUDAPOLIS_PASSWORD".into(),
        )),
        _ => Err(Error::Auth(
            "No credentials found. Provide --token, or --username and --password".into(),
        )),
    }
}
