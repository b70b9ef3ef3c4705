//! Request construction
//!
//! An [`ApiRequest`] targets either a method of an [`ApiService`] or an
//! explicit path. Method requests expand the method's path template from
//! their parameter values and send any leftovers as query parameters.

use std::sync::Arc;

use discovery::{ApiMethod, ApiService, HttpMethod};
use indexmap::IndexMap;
use tracing::{debug, info};
use url::form_urlencoded;
use uuid::Uuid;

use crate::config::{Config, USER_AGENT_HEADER};
use crate::dispatcher::{Dispatcher, PreparedRequest, RequestHandle};
use crate::error::{ExplorerError, Result};
use crate::response::ApiResponse;

/// Query parameter carrying the API key
pub const API_KEY_PARAM: &str = "key";

/// Multimap of parameter name -> values.
///
/// Keys keep first-insertion order; values keep insertion order per key.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParamMap {
    entries: IndexMap<String, Vec<String>>,
}

impl ParamMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a value without touching existing ones
    pub fn put(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.entries.entry(key.into()).or_default().push(value.into());
    }

    /// Replace all values of a key
    pub fn set(&mut self, key: impl Into<String>, values: Vec<String>) {
        self.entries.insert(key.into(), values);
    }

    /// Values of a key, empty if absent
    pub fn get(&self, key: &str) -> &[String] {
        self.entries.get(key).map(|v| v.as_slice()).unwrap_or(&[])
    }

    pub fn first(&self, key: &str) -> Option<&str> {
        self.get(key).first().map(|v| v.as_str())
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    pub fn remove(&mut self, key: &str) -> Option<Vec<String>> {
        self.entries.shift_remove(key)
    }

    /// Remove the last occurrence of one value, dropping the key once empty
    pub fn remove_value(&mut self, key: &str, value: &str) -> bool {
        let Some(values) = self.entries.get_mut(key) else {
            return false;
        };
        let Some(pos) = values.iter().rposition(|v| v == value) else {
            return false;
        };
        values.remove(pos);
        if values.is_empty() {
            self.entries.shift_remove(key);
        }
        true
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(|k| k.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_slice()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[derive(Debug, Clone)]
enum Target {
    Method {
        service: Arc<ApiService>,
        identifier: String,
        method: ApiMethod,
    },
    Path(String),
}

/// A single call to an API method or path
#[derive(Debug)]
pub struct ApiRequest {
    id: Uuid,
    target: Target,
    http_method: HttpMethod,
    use_api_key: bool,
    /// API key value added by [`ApiRequest::prepare`], as opposed to one set by the caller
    injected_key: Option<String>,
    /// Parameter values; ignored for explicit-path requests
    pub params: ParamMap,
    /// Headers to send
    pub headers: IndexMap<String, String>,
    /// Body to send, if any
    pub body: Option<String>,
    in_flight: Option<RequestHandle>,
}

impl ApiRequest {
    /// Request for the method with the given identifier
    pub fn new(service: Arc<ApiService>, method_identifier: &str) -> Result<Self> {
        let method = service
            .method(method_identifier)
            .cloned()
            .ok_or_else(|| ExplorerError::MethodNotFound(method_identifier.to_string()))?;

        Ok(Self {
            id: Uuid::new_v4(),
            http_method: method.http_method,
            target: Target::Method {
                service,
                identifier: method_identifier.to_string(),
                method,
            },
            use_api_key: true,
            params: ParamMap::new(),
            headers: IndexMap::new(),
            body: None,
            injected_key: None,
            in_flight: None,
        })
    }

    /// GET request for an explicit path relative to the base URL.
    ///
    /// Parameter values are ignored and no API key is added.
    pub fn with_path(path: impl Into<String>) -> Result<Self> {
        let path = path.into();
        if path.is_empty() {
            return Err(ExplorerError::EmptyRequestPath);
        }

        Ok(Self {
            id: Uuid::new_v4(),
            target: Target::Path(path),
            http_method: HttpMethod::Get,
            use_api_key: false,
            params: ParamMap::new(),
            headers: IndexMap::new(),
            body: None,
            injected_key: None,
            in_flight: None,
        })
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn http_method(&self) -> HttpMethod {
        self.http_method
    }

    pub fn service(&self) -> Option<&ApiService> {
        match &self.target {
            Target::Method { service, .. } => Some(service.as_ref()),
            Target::Path(_) => None,
        }
    }

    pub fn method(&self) -> Option<&ApiMethod> {
        match &self.target {
            Target::Method { method, .. } => Some(method),
            Target::Path(_) => None,
        }
    }

    pub fn method_identifier(&self) -> Option<&str> {
        match &self.target {
            Target::Method { identifier, .. } => Some(identifier.as_str()),
            Target::Path(_) => None,
        }
    }

    /// The explicit path this request was built with, if any
    pub fn explicit_path(&self) -> Option<&str> {
        match &self.target {
            Target::Path(path) => Some(path.as_str()),
            Target::Method { .. } => None,
        }
    }

    pub fn use_api_key(&self) -> bool {
        self.use_api_key
    }

    /// Toggle API key injection; explicit-path requests never send a key
    pub fn set_use_api_key(&mut self, use_api_key: bool) {
        self.use_api_key = use_api_key && self.explicit_path().is_none();
    }

    /// Fill in declared default values for parameters that have no value yet
    pub fn apply_defaults(&mut self) {
        let defaults: Vec<(String, String)> = match &self.target {
            Target::Method { method, .. } => method
                .parameters
                .iter()
                .filter_map(|(name, p)| p.default.as_ref().map(|d| (name.clone(), d.clone())))
                .collect(),
            Target::Path(_) => return,
        };

        for (name, default) in defaults {
            if !self.params.contains_key(&name) {
                self.params.put(name, default);
            }
        }
    }

    /// Path (with query string) that will be requested, relative to the base URL
    pub fn request_path(&self, config: &Config) -> String {
        match &self.target {
            Target::Path(path) => path.clone(),
            Target::Method {
                service, method, ..
            } => expand_path(&service.base_path, &method.path, &config.base_url, &self.params),
        }
    }

    /// Full URL that will be requested
    pub fn url(&self, config: &Config) -> String {
        format!("{}{}", config.base_url, self.request_path(config))
    }

    /// Set the user agent header and, when enabled, the API key parameter
    pub fn prepare(&mut self, config: &Config) {
        self.headers
            .insert(USER_AGENT_HEADER.to_string(), config.user_agent.clone());

        let wanted = (self.use_api_key && !config.api_key.is_empty()).then_some(&config.api_key);
        if self.injected_key.as_ref() == wanted {
            return;
        }

        if let Some(stale) = self.injected_key.take() {
            self.params.remove_value(API_KEY_PARAM, &stale);
        }

        if let Some(key) = wanted {
            let present = self.params.get(API_KEY_PARAM).iter().any(|v| v == key);
            if !present {
                self.params.put(API_KEY_PARAM, key.clone());
                self.injected_key = Some(key.clone());
            }
        }
    }

    /// Snapshot of the wire request for the given settings
    pub fn to_prepared(&self, config: &Config) -> PreparedRequest {
        PreparedRequest {
            id: self.id,
            method: self.http_method,
            url: self.url(config),
            headers: self.headers.clone(),
            body: self.body.clone(),
        }
    }

    /// Whether a send is still running
    pub fn is_in_flight(&self) -> bool {
        self.in_flight.as_ref().is_some_and(|h| !h.is_finished())
    }

    /// Send in the background; `callback` receives the response or failure.
    ///
    /// The configuration is read at send time. Fails only if a previous send
    /// of this request is still in flight; transport problems go to `callback`.
    pub fn send<F>(&mut self, dispatcher: &Dispatcher, callback: F) -> Result<()>
    where
        F: FnOnce(Result<ApiResponse>) + Send + 'static,
    {
        if self.is_in_flight() {
            return Err(ExplorerError::AlreadyInFlight);
        }

        let prepared = self.prepare_for(dispatcher);
        self.in_flight = Some(dispatcher.dispatch(prepared, callback));
        Ok(())
    }

    /// Send and wait for the outcome
    pub async fn execute(&mut self, dispatcher: &Dispatcher) -> Result<ApiResponse> {
        if self.is_in_flight() {
            return Err(ExplorerError::AlreadyInFlight);
        }

        let prepared = self.prepare_for(dispatcher);
        dispatcher.execute(&prepared).await
    }

    /// Cancel an in-flight send; no-op if never sent or already done
    pub fn cancel(&mut self) {
        if let Some(handle) = self.in_flight.take() {
            handle.cancel();
        }
    }

    fn prepare_for(&mut self, dispatcher: &Dispatcher) -> PreparedRequest {
        let config = dispatcher.config().snapshot();
        self.prepare(&config);
        let prepared = self.to_prepared(&config);

        info!(
            request_id = %self.id,
            "Sending {} {}",
            self.http_method,
            self.method_identifier().unwrap_or("(explicit path)")
        );

        prepared
    }
}

/// `{name}` at the start of a path section, with whatever follows the brace
fn placeholder(section: &str) -> Option<(&str, &str)> {
    let rest = section.strip_prefix('{')?;
    let end = rest.find('}')?;
    Some((&rest[..end], &rest[end + 1..]))
}

fn encode_query(value: &str) -> String {
    form_urlencoded::byte_serialize(value.as_bytes()).collect()
}

fn expand_path(base_path: &str, template: &str, base_url: &str, params: &ParamMap) -> String {
    // The base URL is supplied separately when the request is sent
    let base_path = base_path.strip_prefix(base_url).unwrap_or(base_path);

    let mut unused: Vec<&str> = params.keys().collect();
    let mut path = String::from(base_path);

    for (i, section) in template.split('/').enumerate() {
        if i > 0 {
            path.push('/');
        }

        match placeholder(section) {
            Some((name, suffix)) => {
                // Repeated path parameters are not supported; only the first value is used
                if let Some(value) = params.first(name) {
                    path.push_str(&urlencoding::encode(value));
                }
                path.push_str(suffix);
                unused.retain(|key| *key != name);
            }
            None => path.push_str(section),
        }
    }

    let mut delim = if template.contains('?') { '&' } else { '?' };
    for key in unused {
        for value in params.get(key) {
            path.push(delim);
            path.push_str(&encode_query(key));
            path.push('=');
            path.push_str(&encode_query(value));
            delim = '&';
        }
    }

    debug!("Expanded {} -> {}", template, path);
    path
}
