//! # discovery
//!
//! Discovery document model for the API Explorer.
//! Parses service descriptions, flattens their resource trees into a dotted
//! method index and resolves `$ref` schema pointers by name.

mod types;
mod parser;
mod auth;
mod index;
mod resolver;
mod error;

pub use types::*;
pub use parser::{discovery_rest_path, DiscoveryParser, DISCOVERY_VERSION};
pub use auth::{bearer_header, AuthState, OAUTH2_KEY};
pub use index::MethodIndex;
pub use resolver::SchemaResolver;
pub use error::{ParseError, ParseResult};
