//! Records of executed requests

use std::time::Duration;

use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::config::Config;
use crate::request::{ApiRequest, API_KEY_PARAM};
use crate::response::ApiResponse;

/// Placeholder shown instead of the configured API key
pub const API_KEY_MASK: &str = "{YOUR_API_KEY}";

/// One executed request and its response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub method_identifier: String,
    pub executed_at: DateTime<Utc>,
    pub elapsed: Duration,
    /// "GET https://host/path?query" with the API key masked
    pub request_line: String,
    pub request_headers: IndexMap<String, String>,
    pub request_body: Option<String>,
    pub response: ApiResponse,
}

impl HistoryEntry {
    /// Capture a finished request
    pub fn record(
        request: &ApiRequest,
        config: &Config,
        response: ApiResponse,
        elapsed: Duration,
    ) -> Self {
        let method_identifier = request
            .method_identifier()
            .or(request.explicit_path())
            .unwrap_or_default()
            .to_string();

        Self {
            method_identifier,
            executed_at: Utc::now(),
            elapsed,
            request_line: request_line(request, config),
            request_headers: request.headers.clone(),
            request_body: request.body.clone(),
            response,
        }
    }

    /// "200 OK"
    pub fn status_line(&self) -> String {
        self.response.status_line()
    }

    /// Response headers sorted by name, one "name:  value" per line
    pub fn response_headers_text(&self) -> String {
        self.response
            .headers
            .iter()
            .map(|(name, value)| format!("{}:  {}\n", name, value))
            .collect()
    }

    /// Request line followed by the request headers
    pub fn request_text(&self) -> String {
        let mut text = self.request_line.clone();
        text.push('\n');
        for (name, value) in &self.request_headers {
            text.push_str(&format!("\n{}:  {}", name, value));
        }
        text
    }
}

/// "<VERB> <url>" with the configured API key replaced by [`API_KEY_MASK`]
pub fn request_line(request: &ApiRequest, config: &Config) -> String {
    let url = request.url(config);
    let url = if config.api_key.is_empty() {
        url
    } else {
        mask_api_key(&url, &config.api_key)
    };

    format!("{} {}", request.http_method(), url)
}

/// Replace the value of every `key=<api key>` query pair
fn mask_api_key(url: &str, api_key: &str) -> String {
    let Some((base, query)) = url.split_once('?') else {
        return url.to_string();
    };

    // Query is already URL-encoded, so match the encoded form of the key
    let encoded: String = url::form_urlencoded::byte_serialize(api_key.as_bytes()).collect();
    let secret = format!("{}={}", API_KEY_PARAM, encoded);
    let masked = format!("{}={}", API_KEY_PARAM, API_KEY_MASK);

    let query: Vec<&str> = query
        .split('&')
        .map(|pair| if pair == secret { masked.as_str() } else { pair })
        .collect();
    format!("{}?{}", base, query.join("&"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use discovery::{ApiMethod, ApiService, HttpMethod};
    use std::collections::BTreeMap;
    use std::sync::Arc;

    fn request() -> ApiRequest {
        let mut service = ApiService::new("tasks", "v1", "/tasks/v1/");
        service.insert_method(
            "insert",
            ApiMethod {
                http_method: HttpMethod::Post,
                path: "lists".to_string(),
                ..Default::default()
            },
        );
        ApiRequest::new(Arc::new(service), "insert").unwrap()
    }

    fn response() -> ApiResponse {
        let mut headers = BTreeMap::new();
        headers.insert("etag".to_string(), "\"abc\"".to_string());
        headers.insert("content-type".to_string(), "application/json".to_string());
        ApiResponse {
            status: 201,
            status_text: "Created".to_string(),
            headers,
            body: "{}".to_string(),
        }
    }

    #[test]
    fn test_request_line_masks_api_key() {
        let mut request = request();
        let config = Config {
            base_url: "https://example.com".to_string(),
            api_key: "SECRET".to_string(),
            ..Default::default()
        };
        request.prepare(&config);

        assert_eq!(
            request_line(&request, &config),
            "POST https://example.com/tasks/v1/lists?key={YOUR_API_KEY}"
        );
    }

    #[test]
    fn test_mask_only_matches_key_parameter() {
        assert_eq!(
            mask_api_key("https://x.com/a?monkey=SECRET&key=SECRET&keys=SECRET", "SECRET"),
            "https://x.com/a?monkey=SECRET&key={YOUR_API_KEY}&keys=SECRET"
        );
        assert_eq!(
            mask_api_key("https://x.com/a?key=SECRET2", "SECRET"),
            "https://x.com/a?key=SECRET2"
        );
        assert_eq!(mask_api_key("https://x.com/key=SECRET", "SECRET"), "https://x.com/key=SECRET");
    }

    #[test]
    fn test_record() {
        let mut request = request();
        request.body = Some("{\"title\":\"x\"}".to_string());
        let config = Config::default();
        request.prepare(&config);

        let entry = HistoryEntry::record(&request, &config, response(), Duration::from_millis(12));

        assert_eq!(entry.method_identifier, "insert");
        assert_eq!(entry.status_line(), "201 Created");
        assert_eq!(
            entry.response_headers_text(),
            "content-type:  application/json\netag:  \"abc\"\n"
        );
        assert!(entry.request_text().starts_with("POST https://www.googleapis.com/tasks/v1/lists\n"));
        assert!(entry.request_text().contains("X-JavaScript-User-Agent:  "));
        assert_eq!(entry.request_body.as_deref(), Some("{\"title\":\"x\"}"));
    }
}
