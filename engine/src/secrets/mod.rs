//! Credential handling
//!
//! The backend credential is resolved once, when the agent is built: an
//! explicit value wins, otherwise the configured environment variable is read.
//! Deeper components only ever receive the resolved [`SecretString`].

use sdk::errors::EngineError;
use std::fmt;

/// A wrapper for sensitive string data that prevents accidental logging.
///
/// `Debug` and `Display` always print `[REDACTED]`.
/// To access the actual secret value, use the `unsecure()` method.
#[derive(Clone, PartialEq, Eq)]
pub struct SecretString(String);

impl SecretString {
    /// Create a new SecretString
    pub fn new(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    /// Access the raw underlying string
    pub fn unsecure(&self) -> &str {
        &self.0
    }

    fn is_blank(&self) -> bool {
        self.0.trim().is_empty()
    }
}

impl fmt::Debug for SecretString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SecretString([REDACTED])")
    }
}

impl fmt::Display for SecretString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[REDACTED]")
    }
}

impl From<String> for SecretString {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for SecretString {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Resolve the API key from an explicit value or the process environment.
///
/// Absence is a fatal configuration error: the agent cannot be built without it.
pub fn resolve_api_key(
    explicit: Option<SecretString>,
    env_var: &str,
) -> Result<SecretString, EngineError> {
    resolve_api_key_with(explicit, env_var, |name| std::env::var(name).ok())
}

/// Same as [`resolve_api_key`] with an injectable environment lookup.
pub fn resolve_api_key_with<F>(
    explicit: Option<SecretString>,
    env_var: &str,
    lookup: F,
) -> Result<SecretString, EngineError>
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(key) = explicit.filter(|k| !k.is_blank()) {
        tracing::debug!("Using explicitly provided API key");
        return Ok(key);
    }

    match lookup(env_var).map(SecretString::from) {
        Some(key) if !key.is_blank() => {
            tracing::debug!("Using API key from ${}", env_var);
            Ok(key)
        }
        _ => Err(EngineError::Config(format!(
            "API key is required: pass it explicitly or set ${}",
            env_var
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_secret_is_redacted() {
        let secret = SecretString::new("sk-very-secret");
        assert_eq!(format!("{}", secret), "[REDACTED]");
        assert_eq!(format!("{:?}", secret), "SecretString([REDACTED])");
        assert_eq!(secret.unsecure(), "sk-very-secret");
    }

    #[test]
    fn test_explicit_key_wins() {
        let key = resolve_api_key_with(Some("explicit".into()), "OPENAI_API_KEY", |_| {
            Some("from-env".to_string())
        })
        .unwrap();
        assert_eq!(key.unsecure(), "explicit");
    }

    #[test]
    fn test_env_fallback() {
        let key = resolve_api_key_with(None, "MY_KEY", |name| {
            (name == "MY_KEY").then(|| "from-env".to_string())
        })
        .unwrap();
        assert_eq!(key.unsecure(), "from-env");
    }

    #[test]
    fn test_blank_explicit_falls_back_to_env() {
        let key = resolve_api_key_with(Some("  ".into()), "MY_KEY", |_| {
            Some("from-env".to_string())
        })
        .unwrap();
        assert_eq!(key.unsecure(), "from-env");
    }

    #[test]
    fn test_missing_key_is_config_error() {
        let err = resolve_api_key_with(None, "MY_KEY", |_| None).unwrap_err();
        assert!(matches!(err, EngineError::Config(_)));
        assert!(err.to_string().contains("$MY_KEY"));

        let err = resolve_api_key_with(None, "MY_KEY", |_| Some(String::new())).unwrap_err();
        assert!(matches!(err, EngineError::Config(_)));
    }
}
