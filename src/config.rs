//! Service configuration, read from the environment.

use secrecy::SecretString;

use crate::error::ConfigError;

/// Runtime configuration for the onboarding service.
#[derive(Debug)]
pub struct AppConfig {
    /// Address the HTTP server binds to.
    pub bind: String,
    /// Base URL of the hosted identity-and-storage service.
    pub service_url: String,
    /// Caller-scoped (public) API key, used by the identity client.
    pub anon_key: SecretString,
    /// Privileged API key, used only by the server-side record store client.
    pub service_role_key: SecretString,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            bind: std::env::var("AGRITRACE_BIND").unwrap_or_else(|_| "0.0.0.0:8080".to_string()),
            service_url: required("AGRITRACE_SERVICE_URL")?,
            anon_key: SecretString::from(required("AGRITRACE_ANON_KEY")?),
            service_role_key: SecretString::from(required("AGRITRACE_SERVICE_ROLE_KEY")?),
        })
    }
}

fn required(key: &str) -> Result<String, ConfigError> {
    std::env::var(key).map_err(|_| ConfigError::MissingEnvVar(key.to_string()))
}
