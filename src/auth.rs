//! Authentication provider for the CrossCheck backend.
//!
//! Attaches Authorization headers to HTTP requests and to the WebSocket
//! upgrade request. Token issuance and validation are backend concerns.

use crate::error::{CrossCheckLinkError, Result};
use base64::{engine::general_purpose, Engine as _};
use tokio_tungstenite::tungstenite::http::header::{HeaderValue, AUTHORIZATION};

/// Authentication credentials for the CrossCheck backend.
///
/// # Examples
///
/// ```rust
/// use crosscheck_link::AuthProvider;
///
/// // HTTP Basic Auth
/// let auth = AuthProvider::basic_auth("alice".to_string(), "secret".to_string());
///
/// // Bearer token authentication
/// let auth = AuthProvider::bearer_token("eyJhbGc...".to_string());
///
/// // No authentication (localhost bypass mode)
/// let auth = AuthProvider::none();
/// ```
#[derive(Debug, Clone)]
pub enum AuthProvider {
    /// HTTP Basic Auth (username, password)
    BasicAuth(String, String),

    /// Bearer token authentication
    BearerToken(String),

    /// No authentication (localhost bypass)
    None,
}

impl AuthProvider {
    /// Create HTTP Basic Auth credentials
    pub fn basic_auth(username: String, password: String) -> Self {
        Self::BasicAuth(username, password)
    }

    /// Create bearer token authentication
    pub fn bearer_token(token: String) -> Self {
        Self::BearerToken(token)
    }

    /// No authentication (for localhost bypass mode)
    pub fn none() -> Self {
        Self::None
    }

    /// Check if authentication is configured
    pub fn is_authenticated(&self) -> bool {
        !matches!(self, Self::None)
    }

    /// Render the Authorization header value, if any.
    fn header_value(&self) -> Option<String> {
        match self {
            Self::BasicAuth(username, password) => {
                // base64(username:password) per RFC 7617
                let credentials = format!("{}:{}", username, password);
                let encoded = general_purpose::STANDARD.encode(credentials.as_bytes());
                Some(format!("Basic {}", encoded))
            },
            Self::BearerToken(token) => Some(format!("Bearer {}", token)),
            Self::None => None,
        }
    }

    /// Attach authentication headers to an HTTP request builder.
    pub fn apply_to_request(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match self.header_value() {
            Some(value) => request.header("Authorization", value),
            None => request,
        }
    }

    /// Attach authentication headers to a WebSocket upgrade request.
    pub fn apply_to_ws_request(
        &self,
        request: &mut tokio_tungstenite::tungstenite::http::Request<()>,
    ) -> Result<()> {
        if let Some(value) = self.header_value() {
            let header_value = HeaderValue::from_str(&value).map_err(|e| {
                CrossCheckLinkError::ConfigurationError(format!(
                    "Invalid credentials for Authorization header: {}",
                    e
                ))
            })?;
            request.headers_mut().insert(AUTHORIZATION, header_value);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_auth_provider_creation() {
        let basic = AuthProvider::basic_auth("alice".to_string(), "secret".to_string());
        assert!(basic.is_authenticated());

        let bearer = AuthProvider::bearer_token("test_token".to_string());
        assert!(bearer.is_authenticated());

        let none = AuthProvider::none();
        assert!(!none.is_authenticated());
    }

    #[test]
    fn test_basic_auth_base64_format() {
        let auth = AuthProvider::basic_auth("alice".to_string(), "secret123".to_string());

        // base64 of "alice:secret123"
        assert_eq!(
            auth.header_value().unwrap(),
            "Basic YWxpY2U6c2VjcmV0MTIz"
        );
    }

    #[test]
    fn test_ws_request_gets_authorization_header() {
        use tokio_tungstenite::tungstenite::client::IntoClientRequest;

        let mut request = "ws://localhost:8080/v1/ws/jobs"
            .into_client_request()
            .unwrap();
        let auth = AuthProvider::bearer_token("tok".to_string());
        auth.apply_to_ws_request(&mut request).unwrap();

        assert_eq!(
            request.headers().get(AUTHORIZATION).unwrap(),
            "Bearer tok"
        );
    }

    #[test]
    fn test_none_adds_no_header() {
        use tokio_tungstenite::tungstenite::client::IntoClientRequest;

        let mut request = "ws://localhost:8080/v1/ws/jobs"
            .into_client_request()
            .unwrap();
        AuthProvider::none().apply_to_ws_request(&mut request).unwrap();

        assert!(request.headers().get(AUTHORIZATION).is_none());
    }
}
