//! Authentication collaborator for the login screen.
//!
//! The credential comparison is kept behind a trait so the UI never owns the
//! expected values; the desktop app injects a [`FixedAuthenticator`] and
//! tests inject whatever they need.

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl Credentials {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self { username: username.into(), password: password.into() }
    }

    /// Both fields must be non-blank before verification is attempted.
    pub fn validate(&self) -> Result<(), CredentialsError> {
        if self.username.trim().is_empty() || self.password.trim().is_empty() {
            return Err(CredentialsError::MissingFields);
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum CredentialsError {
    #[error("Please fill in all fields")]
    MissingFields,
}

/// Verifies a set of credentials.
pub trait Authenticator {
    fn verify(&self, credentials: &Credentials) -> bool;
}

/// Authenticator with a single fixed expected credential pair.
#[derive(Debug, Clone)]
pub struct FixedAuthenticator {
    expected: Credentials,
}

impl FixedAuthenticator {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self { expected: Credentials::new(username, password) }
    }
}

impl Default for FixedAuthenticator {
    fn default() -> Self {
        Self::new("admin", "admin")
    }
}

impl Authenticator for FixedAuthenticator {
    fn verify(&self, credentials: &Credentials) -> bool {
        credentials == &self.expected
    }
}
