use std::collections::HashMap;

use serde::Deserialize;
use serde::Serialize;

/// Claim keys owned by the codec and the identity fields.
///
/// Custom claims using one of these keys are dropped on issuance so the
/// signed payload never carries a key twice.
pub const RESERVED_CLAIMS: [&str; 9] = [
    "sub", "roles", "email", "name", "provider", "jti", "iat", "nbf", "exp",
];

/// Session claim set carried inside a signed token.
///
/// Identity fields (`sub`, `roles`, `email`, `name`, `provider`) are supplied
/// by the caller; `jti`, `iat`, `nbf` and `exp` are stamped by
/// [`TokenCodec::issue`](super::TokenCodec::issue) and overwrite any value
/// set beforehand.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Claims {
    /// Subject (account identifier)
    pub sub: String,

    /// Role labels granted to the subject
    #[serde(default)]
    pub roles: Vec<String>,

    #[serde(default)]
    pub email: String,

    /// Display name
    #[serde(default)]
    pub name: String,

    /// Tag of the provider that issued the token
    #[serde(default)]
    pub provider: String,

    /// Token identifier, used as the revocation key
    #[serde(default)]
    pub jti: String,

    /// Issued at (Unix timestamp)
    #[serde(default)]
    pub iat: i64,

    /// Not before (Unix timestamp)
    #[serde(default)]
    pub nbf: i64,

    /// Expiration time (Unix timestamp)
    pub exp: i64,

    /// Additional custom fields (flattened into token)
    #[serde(flatten)]
    pub extra: HashMap<String, serde_json::Value>,
}

impl Claims {
    /// Create identity claims for a subject.
    ///
    /// Temporal claims and `jti` are left zeroed until the token is issued.
    pub fn for_subject(sub: impl ToString) -> Self {
        Self {
            sub: sub.to_string(),
            roles: Vec::new(),
            email: String::new(),
            name: String::new(),
            provider: String::new(),
            jti: String::new(),
            iat: 0,
            nbf: 0,
            exp: 0,
            extra: HashMap::new(),
        }
    }

    /// Set role labels.
    pub fn with_roles<I, S>(mut self, roles: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.roles = roles.into_iter().map(Into::into).collect();
        self
    }

    /// Set email.
    pub fn with_email(mut self, email: impl Into<String>) -> Self {
        self.email = email.into();
        self
    }

    /// Set display name.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Set issuing provider tag.
    pub fn with_provider(mut self, provider: impl Into<String>) -> Self {
        self.provider = provider.into();
        self
    }

    /// Add a custom field.
    ///
    /// Reserved keys are ignored.
    pub fn with_extra(mut self, key: impl ToString, value: impl Serialize) -> Self {
        let key = key.to_string();
        if is_reserved(&key) {
            return self;
        }
        if let Ok(json_value) = serde_json::to_value(value) {
            self.extra.insert(key, json_value);
        }
        self
    }

    /// Check if token is expired.
    ///
    /// A token whose expiry equals the current instant is already expired.
    pub fn is_expired(&self, current_timestamp: i64) -> bool {
        self.exp <= current_timestamp
    }

    /// Check if token is not yet valid.
    pub fn is_premature(&self, current_timestamp: i64) -> bool {
        self.nbf > current_timestamp
    }

    /// Copy of the identity portion (subject, roles, email, name, provider,
    /// custom fields) with temporal claims and `jti` cleared.
    pub fn identity(&self) -> Self {
        Self {
            jti: String::new(),
            iat: 0,
            nbf: 0,
            exp: 0,
            ..self.clone()
        }
    }

    pub(crate) fn strip_reserved_extra(&mut self) {
        self.extra.retain(|key, _| !is_reserved(key));
    }
}

fn is_reserved(key: &str) -> bool {
    RESERVED_CLAIMS.contains(&key)
}
