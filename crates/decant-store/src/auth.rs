use std::fmt;
use std::sync::Arc;

use crate::error::StoreError;

/// How a job authenticates against the store.
///
/// Modeled as a capability selection, not a client type hierarchy: the same
/// client works under either mode, it just carries different credentials.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AccessMode {
    /// Credentials come from an external identity provider.
    Delegated,
    /// A shared credential supplied through configuration.
    SharedKey,
}

/// Supplies a bearer token for delegated-identity access.
pub trait TokenSource: Send + Sync {
    fn token(&self) -> Result<String, StoreError>;
}

/// Reads a pre-resolved bearer token from an environment variable.
///
/// Stands in for a platform identity endpoint; how the token got there is
/// outside the core's concern.
pub struct EnvTokenSource {
    var: String,
}

impl EnvTokenSource {
    pub const DEFAULT_VAR: &'static str = "DECANT_ACCESS_TOKEN";

    pub fn new() -> Self {
        Self::from_var(Self::DEFAULT_VAR)
    }

    pub fn from_var(var: impl Into<String>) -> Self {
        Self { var: var.into() }
    }
}

impl Default for EnvTokenSource {
    fn default() -> Self {
        Self::new()
    }
}

impl TokenSource for EnvTokenSource {
    fn token(&self) -> Result<String, StoreError> {
        match std::env::var(&self.var) {
            Ok(token) if !token.is_empty() => Ok(token),
            _ => Err(StoreError::Credential(format!(
                "no delegated-identity token in ${}",
                self.var
            ))),
        }
    }
}

/// Resolved credential attached to a store client.
#[derive(Clone)]
pub enum StoreAuth {
    /// Bearer token refreshed from a [`TokenSource`] per request.
    Bearer(Arc<dyn TokenSource>),
    /// Shared-access query string appended to every object URL.
    Sas(String),
}

impl fmt::Debug for StoreAuth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StoreAuth::Bearer(_) => f.write_str("StoreAuth::Bearer(..)"),
            StoreAuth::Sas(_) => f.write_str("StoreAuth::Sas(..)"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn env_token_source_reads_variable() {
        let var = "DECANT_TEST_TOKEN_AUTH_RS";
        unsafe { std::env::set_var(var, "tok-123") };
        let source = EnvTokenSource::from_var(var);
        assert_eq!(source.token().unwrap(), "tok-123");
        unsafe { std::env::remove_var(var) };
    }

    #[test]
    fn env_token_source_missing_variable_is_credential_error() {
        let source = EnvTokenSource::from_var("DECANT_TEST_TOKEN_UNSET_XYZ");
        assert!(matches!(source.token(), Err(StoreError::Credential(_))));
    }
}
