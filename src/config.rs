use anyhow::{Context, Result};
use std::env;

const ENV_HOST: &str = "NODECTL_HOST";
const ENV_USERNAME: &str = "NODECTL_USERNAME";
const ENV_PASSWORD: &str = "NODECTL_PASSWORD";

/// Connection parameters for the remote manager.
#[derive(Debug, Clone)]
pub struct ManagerConfig {
    pub host: String,
    pub username: String,
    pub password: String,
    pub validate_certs: bool,
}

impl ManagerConfig {
    /// Resolve configuration from CLI flags, falling back to the environment
    /// (a local .env file is honored). Flags win over environment.
    pub fn resolve(
        host: Option<String>,
        username: Option<String>,
        password: Option<String>,
        validate_certs: bool,
    ) -> Result<Self> {
        dotenv::dotenv().ok();

        let host = value_or_env(host, ENV_HOST)
            .with_context(|| format!("Manager host not set (--host or {})", ENV_HOST))?;
        let username = value_or_env(username, ENV_USERNAME)
            .with_context(|| format!("Manager username not set (--username or {})", ENV_USERNAME))?;
        let password = value_or_env(password, ENV_PASSWORD)
            .with_context(|| format!("Manager password not set (--password or {})", ENV_PASSWORD))?;

        Ok(Self {
            host,
            username,
            password,
            validate_certs,
        })
    }

    /// Versioned API base all endpoint paths are relative to.
    pub fn base_url(&self) -> String {
        format!("https://{}/api/v1", self.host)
    }
}

fn value_or_env(value: Option<String>, var: &str) -> Result<String> {
    match value {
        Some(v) => Ok(v),
        None => env::var(var).map_err(Into::into),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flags_win_over_env() {
        let config = ManagerConfig::resolve(
            Some("10.0.0.5".to_string()),
            Some("admin".to_string()),
            Some("secret".to_string()),
            true,
        )
        .unwrap();
        assert_eq!(config.host, "10.0.0.5");
        assert_eq!(config.base_url(), "https://10.0.0.5/api/v1");
        assert!(config.validate_certs);
    }

    #[test]
    fn test_missing_host_is_an_error() {
        // Only meaningful when the variable is not set in the test env.
        if env::var(ENV_HOST).is_ok() {
            return;
        }
        let result = ManagerConfig::resolve(
            None,
            Some("admin".to_string()),
            Some("secret".to_string()),
            true,
        );
        assert!(result.is_err());
    }
}
