//! Type definitions for parsed discovery documents

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::index::MethodIndex;

/// HTTP methods used by discovery documents
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum HttpMethod {
    #[default]
    Get,
    Post,
    Put,
    Patch,
    Delete,
    Head,
    Options,
}

impl HttpMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
            HttpMethod::Put => "PUT",
            HttpMethod::Patch => "PATCH",
            HttpMethod::Delete => "DELETE",
            HttpMethod::Head => "HEAD",
            HttpMethod::Options => "OPTIONS",
        }
    }

    /// Whether requests with this method conventionally carry a body
    pub fn allows_body(&self) -> bool {
        matches!(self, HttpMethod::Post | HttpMethod::Put | HttpMethod::Patch)
    }
}

impl std::fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Where a parameter is placed in the HTTP request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParameterLocation {
    Path,
    Query,
}

/// A parameter accepted by an API method
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiParameter {
    /// JSON type of the parameter ("string", "integer", "boolean", ...)
    #[serde(rename = "type")]
    pub param_type: Option<String>,
    /// Parameter description
    pub description: Option<String>,
    /// Default value, as a string
    pub default: Option<String>,
    /// Whether the parameter is required
    #[serde(default)]
    pub required: bool,
    /// Whether the parameter lives in the path or the query string
    pub location: Option<ParameterLocation>,
    /// Whether multiple values may be supplied
    #[serde(default)]
    pub repeated: bool,
    /// Regular expression the value must match
    pub pattern: Option<String>,
    /// Allowed values
    #[serde(rename = "enum", default)]
    pub enum_values: Vec<String>,
    /// Descriptions matching `enum_values` by position
    #[serde(default)]
    pub enum_descriptions: Vec<String>,
    /// Lower bound for numeric parameters
    pub minimum: Option<String>,
    /// Upper bound for numeric parameters
    pub maximum: Option<String>,
    /// Format hint ("int32", "uint64", "date-time", ...)
    pub format: Option<String>,
}

/// Pointer from a method to a request or response schema
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SchemaRef {
    /// Name of the referenced schema
    #[serde(rename = "$ref")]
    pub reference: Option<String>,
    /// Name under which the body is documented, if any
    pub parameter_name: Option<String>,
}

/// A single callable method of an API
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiMethod {
    /// Dotted identifier as declared by the document (e.g. "urlshortener.url.get")
    #[serde(default)]
    pub id: String,
    /// HTTP method
    #[serde(default)]
    pub http_method: HttpMethod,
    /// URL path template relative to the service base path (e.g. "url/{id}")
    #[serde(default)]
    pub path: String,
    /// Full description
    pub description: Option<String>,
    /// Parameters keyed by name, in document order
    #[serde(default)]
    pub parameters: IndexMap<String, ApiParameter>,
    /// Suggested ordering of required parameters
    #[serde(default)]
    pub parameter_order: Vec<String>,
    /// Request body schema
    pub request: Option<SchemaRef>,
    /// Response body schema
    pub response: Option<SchemaRef>,
    /// OAuth scopes accepted by this method
    #[serde(default)]
    pub scopes: Vec<String>,
}

impl ApiMethod {
    /// Parameters in display order: `parameter_order` first, then the rest as declared
    pub fn ordered_parameters(&self) -> Vec<(&str, &ApiParameter)> {
        let mut ordered: Vec<(&str, &ApiParameter)> = self
            .parameter_order
            .iter()
            .filter_map(|name| {
                self.parameters
                    .get_key_value(name)
                    .map(|(k, v)| (k.as_str(), v))
            })
            .collect();

        for (name, param) in &self.parameters {
            if !self.parameter_order.iter().any(|n| n == name) {
                ordered.push((name.as_str(), param));
            }
        }

        ordered
    }
}

/// A resource node holding methods and nested resources
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ApiResource {
    #[serde(default)]
    pub methods: IndexMap<String, ApiMethod>,
    #[serde(default)]
    pub resources: IndexMap<String, ApiResource>,
}

/// Anything that owns methods and nested resources
pub trait HasMethodsAndResources {
    fn methods(&self) -> &IndexMap<String, ApiMethod>;
    fn resources(&self) -> &IndexMap<String, ApiResource>;
}

impl HasMethodsAndResources for ApiResource {
    fn methods(&self) -> &IndexMap<String, ApiMethod> {
        &self.methods
    }

    fn resources(&self) -> &IndexMap<String, ApiResource> {
        &self.resources
    }
}

/// A property of a schema
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Property {
    #[serde(rename = "type")]
    pub property_type: Option<String>,
    pub description: Option<String>,
    /// Name of another schema describing this property
    #[serde(rename = "$ref")]
    pub reference: Option<String>,
    pub format: Option<String>,
    /// Element description for array properties
    pub items: Option<Box<Property>>,
    /// Value description for map-like objects
    pub additional_properties: Option<Box<Property>>,
    /// Inline object properties
    #[serde(default)]
    pub properties: IndexMap<String, Property>,
    #[serde(rename = "enum", default)]
    pub enum_values: Vec<String>,
}

/// A named JSON object shape
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Schema {
    pub id: Option<String>,
    #[serde(rename = "type")]
    pub schema_type: Option<String>,
    pub description: Option<String>,
    #[serde(default)]
    pub properties: IndexMap<String, Property>,
    pub items: Option<Box<Property>>,
    pub additional_properties: Option<Box<Property>>,
}

/// Description of a single OAuth scope
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AuthScope {
    pub description: Option<String>,
}

/// Authentication options for one auth scheme
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AuthInformation {
    /// Scope URL -> scope description
    #[serde(default)]
    pub scopes: IndexMap<String, AuthScope>,
}

/// A named, versioned API described by a discovery document
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiService {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub version: String,
    pub title: Option<String>,
    pub description: Option<String>,
    /// Base path of all methods, possibly a full URL
    #[serde(default)]
    pub base_path: String,
    pub root_url: Option<String>,
    pub service_path: Option<String>,
    /// Top-level methods. Read through [`HasMethodsAndResources`], change
    /// through [`ApiService::insert_method`] so the index stays current.
    #[serde(default)]
    pub(crate) methods: IndexMap<String, ApiMethod>,
    #[serde(default)]
    pub(crate) resources: IndexMap<String, ApiResource>,
    #[serde(default)]
    pub schemas: IndexMap<String, Schema>,
    /// Auth scheme name (currently only "oauth2") -> auth information
    #[serde(default)]
    pub auth: IndexMap<String, AuthInformation>,
    #[serde(skip)]
    pub(crate) index: MethodIndex,
}

impl HasMethodsAndResources for ApiService {
    fn methods(&self) -> &IndexMap<String, ApiMethod> {
        &self.methods
    }

    fn resources(&self) -> &IndexMap<String, ApiResource> {
        &self.resources
    }
}

impl ApiService {
    pub fn new(
        name: impl Into<String>,
        version: impl Into<String>,
        base_path: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            version: version.into(),
            base_path: base_path.into(),
            ..Default::default()
        }
    }

    /// Add or replace a top-level method, dropping any built index
    pub fn insert_method(&mut self, name: impl Into<String>, method: ApiMethod) {
        self.methods.insert(name.into(), method);
        self.index.invalidate();
    }

    /// Add or replace a top-level resource, dropping any built index
    pub fn insert_resource(&mut self, name: impl Into<String>, resource: ApiResource) {
        self.resources.insert(name.into(), resource);
        self.index.invalidate();
    }

    /// Look up a method by its dotted identifier
    pub fn method(&self, identifier: &str) -> Option<&ApiMethod> {
        self.all_methods().get(identifier)
    }

    /// All methods of this service keyed by dotted identifier
    pub fn all_methods(&self) -> &IndexMap<String, ApiMethod> {
        self.index.get_or_build(self)
    }

    /// Number of times the method index has been built for this instance
    pub fn index_build_count(&self) -> usize {
        self.index.build_count()
    }
}

/// Entry of the discovery directory listing
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DirectoryItem {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub version: String,
    pub title: Option<String>,
    pub description: Option<String>,
    pub discovery_rest_url: Option<String>,
    #[serde(default)]
    pub preferred: bool,
}

/// The discovery directory listing of all known APIs
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DirectoryList {
    pub discovery_version: Option<String>,
    #[serde(default)]
    pub items: Vec<DirectoryItem>,
}
