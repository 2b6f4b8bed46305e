//! API service configuration

use common::policy::PolicyPaths;

/// API service configuration
#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// Address the HTTP server binds to
    pub bind_addr: String,
    /// Where unauthenticated callers are sent
    pub sign_in_url: String,
}

impl ApiConfig {
    /// Create a new ApiConfig from environment variables
    ///
    /// # Environment Variables
    /// - `API_BIND_ADDR`: Listen address (default: "0.0.0.0:3001")
    /// - `SIGN_IN_URL`: Redirect target for sign-in (default: "/sign-in")
    pub fn from_env() -> Self {
        let bind_addr =
            std::env::var("API_BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:3001".to_string());
        let sign_in_url = std::env::var("SIGN_IN_URL").unwrap_or_else(|_| "/sign-in".to_string());

        Self {
            bind_addr,
            sign_in_url,
        }
    }

    /// Policy paths with the configured sign-in location
    pub fn policy_paths(&self) -> PolicyPaths {
        PolicyPaths {
            sign_in: self.sign_in_url.clone(),
            ..PolicyPaths::default()
        }
    }
}
