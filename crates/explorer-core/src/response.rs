//! Completed HTTP responses

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::{ExplorerError, Result};

/// Result of a completed call. Non-2xx statuses are still responses.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiResponse {
    pub status: u16,
    pub status_text: String,
    /// Header name (lower-case) -> value; repeated headers are joined with ", "
    pub headers: BTreeMap<String, String>,
    pub body: String,
}

impl ApiResponse {
    /// Read a reqwest response to completion
    pub async fn from_response(response: reqwest::Response) -> Result<Self> {
        let status = response.status();

        let mut headers: BTreeMap<String, String> = BTreeMap::new();
        for (name, value) in response.headers() {
            let value = String::from_utf8_lossy(value.as_bytes()).into_owned();
            headers
                .entry(name.as_str().to_string())
                .and_modify(|existing| {
                    existing.push_str(", ");
                    existing.push_str(&value);
                })
                .or_insert(value);
        }

        let body = response
            .text()
            .await
            .map_err(|e| ExplorerError::Transport(format!("Failed to read response: {}", e)))?;

        Ok(Self {
            status: status.as_u16(),
            status_text: status.canonical_reason().unwrap_or_default().to_string(),
            headers,
            body,
        })
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// "200 OK"
    pub fn status_line(&self) -> String {
        format!("{} {}", self.status, self.status_text)
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(&name.to_ascii_lowercase()).map(|v| v.as_str())
    }
}
