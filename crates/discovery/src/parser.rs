//! Discovery document parser

use crate::error::{ParseError, ParseResult};
use crate::types::*;
use tracing::{debug, info};

/// Version of the discovery service used for directory and document paths
pub const DISCOVERY_VERSION: &str = "v1";

/// Path of the REST discovery document for an API, relative to the base URL
pub fn discovery_rest_path(name: &str, version: &str) -> String {
    format!("/discovery/{}/apis/{}/{}/rest", DISCOVERY_VERSION, name, version)
}

/// Discovery document parser
pub struct DiscoveryParser;

impl DiscoveryParser {
    /// Parse a discovery document from a JSON string
    pub fn parse(content: &str) -> ParseResult<ApiService> {
        let service: ApiService = serde_json::from_str(content)?;

        if service.name.is_empty() {
            return Err(ParseError::MissingField("name".to_string()));
        }

        debug!(
            "Parsed discovery document {}:{} ({} schemas)",
            service.name,
            service.version,
            service.schemas.len()
        );

        Ok(service)
    }

    /// Parse the directory listing of all APIs
    pub fn parse_directory(content: &str) -> ParseResult<DirectoryList> {
        let directory: DirectoryList = serde_json::from_str(content)?;
        debug!("Parsed directory with {} APIs", directory.items.len());
        Ok(directory)
    }

    /// Fetch a document, optionally authorized with a discovery token
    pub async fn fetch(url: &str, auth_token: Option<&str>) -> ParseResult<String> {
        info!("Fetching discovery document from: {}", url);

        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(30))
            .build()
            .map_err(|e| ParseError::HttpError(e.to_string()))?;

        let mut request = client.get(url).header("Accept", "application/json");
        if let Some(token) = auth_token {
            request = request.header("Authorization", crate::auth::bearer_header(token));
        }

        let response = request
            .send()
            .await
            .map_err(|e| ParseError::FetchError(e.to_string()))?;

        if !response.status().is_success() {
            return Err(ParseError::FetchError(format!(
                "HTTP {} from {}",
                response.status(),
                url
            )));
        }

        response
            .text()
            .await
            .map_err(|e| ParseError::FetchError(e.to_string()))
    }

    /// Fetch and parse a discovery document
    pub async fn fetch_and_parse(url: &str, auth_token: Option<&str>) -> ParseResult<ApiService> {
        let content = Self::fetch(url, auth_token).await?;
        Self::parse(&content)
    }

    /// Fetch and parse the directory listing
    pub async fn fetch_directory(url: &str, auth_token: Option<&str>) -> ParseResult<DirectoryList> {
        let content = Self::fetch(url, auth_token).await?;
        Self::parse_directory(&content)
    }
}
