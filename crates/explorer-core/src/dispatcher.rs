//! Sends prepared requests over HTTP

use std::time::Duration;

use discovery::HttpMethod;
use indexmap::IndexMap;
use reqwest::header::{HeaderName, HeaderValue};
use reqwest::Client;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::config::ConfigStore;
use crate::error::{ExplorerError, Result};
use crate::response::ApiResponse;

/// A fully assembled request ready to go on the wire
#[derive(Debug, Clone)]
pub struct PreparedRequest {
    pub id: Uuid,
    pub method: HttpMethod,
    /// Base URL + request path, including the query string
    pub url: String,
    pub headers: IndexMap<String, String>,
    pub body: Option<String>,
}

/// Handle to a request running on the runtime
#[derive(Debug)]
pub struct RequestHandle {
    id: Uuid,
    task: JoinHandle<()>,
}

impl RequestHandle {
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Stop the request; its callback will not run if it has not started yet.
    /// Calling this on a finished or already canceled request does nothing.
    pub fn cancel(&self) {
        if !self.task.is_finished() {
            debug!(request_id = %self.id, "Canceling request");
            self.task.abort();
        }
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }
}

/// HTTP dispatcher for explorer requests
#[derive(Clone)]
pub struct Dispatcher {
    /// HTTP client
    client: Client,
    /// Settings; the timeout is read per dispatched request
    config: ConfigStore,
}

impl Dispatcher {
    /// Create a new dispatcher
    pub fn new(config: ConfigStore) -> Result<Self> {
        let client = Client::builder()
            .build()
            .map_err(|e| ExplorerError::Client(e.to_string()))?;

        Ok(Self { client, config })
    }

    pub fn config(&self) -> &ConfigStore {
        &self.config
    }

    /// Send a request and wait for the response
    pub async fn execute(&self, request: &PreparedRequest) -> Result<ApiResponse> {
        let timeout = self.config.timeout();
        execute_with(&self.client, request, timeout).await
    }

    /// Send a request in the background and hand the outcome to `callback`.
    ///
    /// Must be called from within a tokio runtime.
    pub fn dispatch<F>(&self, request: PreparedRequest, callback: F) -> RequestHandle
    where
        F: FnOnce(Result<ApiResponse>) + Send + 'static,
    {
        let client = self.client.clone();
        let timeout = self.config.timeout();
        let id = request.id;

        let task = tokio::spawn(async move {
            let result = execute_with(&client, &request, timeout).await;
            callback(result);
        });

        RequestHandle { id, task }
    }
}

fn to_reqwest_method(method: HttpMethod) -> reqwest::Method {
    match method {
        HttpMethod::Get => reqwest::Method::GET,
        HttpMethod::Post => reqwest::Method::POST,
        HttpMethod::Put => reqwest::Method::PUT,
        HttpMethod::Patch => reqwest::Method::PATCH,
        HttpMethod::Delete => reqwest::Method::DELETE,
        HttpMethod::Head => reqwest::Method::HEAD,
        HttpMethod::Options => reqwest::Method::OPTIONS,
    }
}

async fn execute_with(
    client: &Client,
    request: &PreparedRequest,
    timeout: Duration,
) -> Result<ApiResponse> {
    let mut builder = client.request(to_reqwest_method(request.method), &request.url);

    for (name, value) in &request.headers {
        let header_name =
            HeaderName::from_bytes(name.as_bytes()).map_err(|e| ExplorerError::InvalidHeader {
                name: name.clone(),
                reason: e.to_string(),
            })?;
        let header_value = HeaderValue::from_str(value).map_err(|e| ExplorerError::InvalidHeader {
            name: name.clone(),
            reason: e.to_string(),
        })?;
        builder = builder.header(header_name, header_value);
    }

    if let Some(body) = &request.body {
        if !request.headers.keys().any(|k| k.eq_ignore_ascii_case("content-type")) {
            builder = builder.header(reqwest::header::CONTENT_TYPE, "application/json");
        }
        builder = builder.body(body.clone());
    }

    info!(request_id = %request.id, "Executing {} {}", request.method, request.url);

    let exchange = async {
        let response = builder
            .send()
            .await
            .map_err(|e| ExplorerError::Transport(format!("HTTP request failed: {}", e)))?;
        ApiResponse::from_response(response).await
    };

    match tokio::time::timeout(timeout, exchange).await {
        Ok(Ok(response)) => {
            debug!(request_id = %request.id, "Response status: {}", response.status);
            Ok(response)
        }
        Ok(Err(e)) => {
            warn!(request_id = %request.id, "Request failed: {}", e);
            Err(e)
        }
        Err(_) => {
            warn!(request_id = %request.id, "Request timed out after {:?}", timeout);
            Err(ExplorerError::Timeout(timeout))
        }
    }
}
