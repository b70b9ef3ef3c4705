//! # explorer-core
//!
//! Request pipeline for the API Explorer:
//! - Shared configuration (base URL, API key, user agent, timeout)
//! - Advisory parameter validators
//! - Request building from discovery methods and parameter values
//! - Cancellable dispatch over HTTP
//! - History entries for executed calls

pub mod config;
pub mod dispatcher;
pub mod error;
pub mod history;
pub mod request;
pub mod response;
pub mod validation;

pub use config::{Config, ConfigStore, DEFAULT_BASE_URL, USER_AGENT_HEADER};
pub use dispatcher::{Dispatcher, PreparedRequest, RequestHandle};
pub use error::{ExplorerError, Result};
pub use history::HistoryEntry;
pub use request::{ApiRequest, ParamMap, API_KEY_PARAM};
pub use response::ApiResponse;
pub use validation::{
    CompositionPolicy, ValidationKind, ValidationResult, Validator, ValidatorChain,
};
