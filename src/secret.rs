//! Secret string handling for sensitive configuration values.
//!
//! [`SecretString`] wraps signing secrets so they cannot leak through
//! `Debug` output, log events, or error messages. The value is preserved
//! internally and exposed only through an explicit call.

use std::fmt::{self, Debug, Display, Formatter};

/// A string wrapper that redacts its contents in Debug and Display output.
///
/// # Example
///
/// ```rust
/// use mcp_gateway::SecretString;
///
/// let secret = SecretString::new("session-signing-key");
/// assert_eq!(format!("{:?}", secret), "[REDACTED]");
/// assert_eq!(secret.expose(), "session-signing-key");
/// ```
#[derive(Clone, Default)]
pub struct SecretString {
    value: String,
}

impl SecretString {
    /// Create a new `SecretString` from any string-like value.
    pub fn new(s: impl Into<String>) -> Self {
        Self { value: s.into() }
    }

    /// Expose the underlying secret value.
    ///
    /// Be careful not to log or display the returned value.
    pub fn expose(&self) -> &str {
        &self.value
    }

    /// The secret as bytes, for keying a MAC or decoding key.
    pub fn as_bytes(&self) -> &[u8] {
        self.value.as_bytes()
    }

    /// Returns true if the secret string is empty.
    pub fn is_empty(&self) -> bool {
        self.value.is_empty()
    }
}

impl Debug for SecretString {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "[REDACTED]")
    }
}

impl Display for SecretString {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "[REDACTED]")
    }
}

impl From<String> for SecretString {
    fn from(s: String) -> Self {
        Self::new(s)
    }
}

impl From<&str> for SecretString {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}
