//! Authentication service configuration

use crate::rate_limiter::RateLimiterConfig;

/// Authentication service configuration
#[derive(Debug, Clone)]
pub struct AuthConfig {
    /// Address the HTTP server binds to
    pub bind_addr: String,
    pub rate_limiter: RateLimiterConfig,
}

impl AuthConfig {
    /// Create a new AuthConfig from environment variables
    ///
    /// # Environment Variables
    /// - `AUTH_BIND_ADDR`: Listen address (default: "0.0.0.0:3000")
    /// - `LOGIN_MAX_ATTEMPTS`, `LOGIN_WINDOW_SECONDS`, `LOGIN_BAN_SECONDS`: see [`RateLimiterConfig`]
    pub fn from_env() -> Self {
        let bind_addr =
            std::env::var("AUTH_BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:3000".to_string());

        Self {
            bind_addr,
            rate_limiter: RateLimiterConfig::from_env(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    #[serial]
    fn test_auth_config_from_env() {
        unsafe {
            std::env::remove_var("AUTH_BIND_ADDR");
            std::env::set_var("LOGIN_MAX_ATTEMPTS", "3");
        }

        let config = AuthConfig::from_env();
        assert_eq!(config.bind_addr, "0.0.0.0:3000");
        assert_eq!(config.rate_limiter.max_attempts, 3);
        assert_eq!(config.rate_limiter.window_seconds, 300);

        unsafe {
            std::env::remove_var("LOGIN_MAX_ATTEMPTS");
        }
    }
}
