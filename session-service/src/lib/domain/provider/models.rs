use std::fmt;

/// Authentication kind carried by a credential set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CredentialKind {
    Password,
    /// Any kind this service has no provider for (tokens, OAuth, ...).
    Other(String),
}

impl CredentialKind {
    pub fn parse(kind: &str) -> Self {
        match kind {
            "password" => CredentialKind::Password,
            other => CredentialKind::Other(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            CredentialKind::Password => "password",
            CredentialKind::Other(kind) => kind,
        }
    }
}

impl fmt::Display for CredentialKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Caller-supplied credentials. Never persisted.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub kind: CredentialKind,
    pub username: String,
    pub password: String,
    /// Name of the provider the caller targets
    pub provider: String,
}

impl Credentials {
    /// Username/password credentials aimed at `provider`.
    pub fn password(
        provider: impl Into<String>,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self {
            kind: CredentialKind::Password,
            username: username.into(),
            password: password.into(),
            provider: provider.into(),
        }
    }
}

// Keeps the plaintext password out of logs.
impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("kind", &self.kind)
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .field("provider", &self.provider)
            .finish()
    }
}
