//! Invocation input for a single monitoring run

use serde::{Deserialize, Serialize};

/// What to monitor and for whom
///
/// Accepts both the event keys used by scheduled triggers
/// (`OriginalDomain`, `ClientCode`, `local`) and snake_case keys.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Invocation {
    /// Root domain to watch (may carry a scheme, path and query)
    #[serde(alias = "OriginalDomain")]
    pub original_domain: String,

    /// Client identity; scopes history and credentials
    #[serde(alias = "ClientCode")]
    pub client_code: String,

    /// Skip history and notification; surface results only
    #[serde(default, alias = "local")]
    pub local_mode: bool,
}

impl Invocation {
    /// Create a new invocation
    pub fn new(original_domain: impl Into<String>, client_code: impl Into<String>) -> Self {
        Self {
            original_domain: original_domain.into(),
            client_code: client_code.into(),
            local_mode: false,
        }
    }

    /// Enable or disable local mode
    pub fn with_local_mode(mut self, local_mode: bool) -> Self {
        self.local_mode = local_mode;
        self
    }

    /// Parse an invocation from a JSON event
    pub fn from_json(event: &str) -> Result<Self, crate::Error> {
        let invocation: Self = serde_json::from_str(event)
            .map_err(|e| crate::Error::invalid_input(format!("Malformed event: {}", e)))?;
        invocation.validate()?;
        Ok(invocation)
    }

    /// Validate the invocation
    ///
    /// The root domain is validated by the generator; here only the client
    /// code is checked, since it ends up in file names and credential keys.
    pub fn validate(&self) -> Result<(), crate::Error> {
        if self.original_domain.trim().is_empty() {
            return Err(crate::Error::invalid_input("Original domain cannot be empty"));
        }

        if self.client_code.is_empty() || self.client_code.len() > 64 {
            return Err(crate::Error::invalid_input(format!(
                "Client code must be 1-64 characters. Got: '{}'",
                self.client_code
            )));
        }

        if !self
            .client_code
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
        {
            return Err(crate::Error::invalid_input(format!(
                "Client code contains invalid characters: '{}'. \
                Valid: ASCII alphanumeric, '-' and '_'.",
                self.client_code
            )));
        }

        Ok(())
    }
}
