//! Authentication metadata declared by a service

use crate::types::{ApiMethod, ApiService, AuthScope};

/// Auth scheme key used by discovery documents for OAuth 2.0
pub const OAUTH2_KEY: &str = "oauth2";

/// Which kind of access a caller has to a service
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthState {
    /// The service declares no scopes, only public access is possible
    OnlyPublic,
    /// Scopes are available but no token is held
    Public,
    /// A token is held and requests are authorized
    Private,
}

impl AuthState {
    /// Derive the auth state for a service given whether a token is held
    pub fn for_service(service: &ApiService, has_token: bool) -> Self {
        if service.oauth2_scopes().is_empty() {
            AuthState::OnlyPublic
        } else if has_token {
            AuthState::Private
        } else {
            AuthState::Public
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            AuthState::Private => "Using Private Access",
            AuthState::Public | AuthState::OnlyPublic => "Using Public Access.",
        }
    }
}

/// Format the Authorization header value for an OAuth 2.0 access token
pub fn bearer_header(token: &str) -> String {
    format!("Bearer {}", token)
}

impl ApiService {
    /// OAuth 2.0 scopes declared by the service, in document order
    pub fn oauth2_scopes(&self) -> Vec<(&str, &AuthScope)> {
        self.auth
            .get(OAUTH2_KEY)
            .map(|info| {
                info.scopes
                    .iter()
                    .map(|(scope, desc)| (scope.as_str(), desc))
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Whether the method declares any OAuth scopes
    pub fn method_requires_scopes(&self, method: &ApiMethod) -> bool {
        !method.scopes.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::AuthInformation;

    fn service_with_scopes() -> ApiService {
        let mut info = AuthInformation::default();
        info.scopes.insert(
            "https://www.googleapis.com/auth/tasks".to_string(),
            AuthScope {
                description: Some("Manage your tasks".to_string()),
            },
        );
        info.scopes.insert(
            "https://www.googleapis.com/auth/tasks.readonly".to_string(),
            AuthScope {
                description: Some("View your tasks".to_string()),
            },
        );

        let mut service = ApiService::default();
        service.auth.insert(OAUTH2_KEY.to_string(), info);
        service
    }

    #[test]
    fn test_oauth2_scopes() {
        let service = service_with_scopes();
        let scopes = service.oauth2_scopes();

        assert_eq!(scopes.len(), 2);
        assert_eq!(scopes[0].0, "https://www.googleapis.com/auth/tasks");
        assert_eq!(scopes[1].1.description.as_deref(), Some("View your tasks"));
    }

    #[test]
    fn test_auth_state() {
        let service = service_with_scopes();
        assert_eq!(AuthState::for_service(&service, false), AuthState::Public);
        assert_eq!(AuthState::for_service(&service, true), AuthState::Private);

        let public = ApiService::default();
        assert_eq!(AuthState::for_service(&public, true), AuthState::OnlyPublic);
        assert_eq!(AuthState::Private.description(), "Using Private Access");
    }

    #[test]
    fn test_format_bearer_header() {
        assert_eq!(bearer_header("my-token"), "Bearer my-token");
    }

    #[test]
    fn test_method_requires_scopes() {
        let service = service_with_scopes();
        let method = ApiMethod {
            scopes: vec!["https://www.googleapis.com/auth/tasks".to_string()],
            ..Default::default()
        };
        assert!(service.method_requires_scopes(&method));
        assert!(!service.method_requires_scopes(&ApiMethod::default()));
    }
}
