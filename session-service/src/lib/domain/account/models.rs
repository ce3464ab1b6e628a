use std::collections::BTreeMap;
use std::collections::BTreeSet;
use std::fmt;

use serde::Deserialize;
use serde::Serialize;
use uuid::Uuid;

/// Account unique identifier.
///
/// Opaque string; generated as a UUID v4 when the caller does not supply one.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AccountId(String);

impl AccountId {
    /// Generate a new random account ID.
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Dynamically typed metadata value.
///
/// Serializes to plain JSON so the relational backend can store it in a
/// `jsonb` column without loss.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MetadataValue {
    Null,
    Bool(bool),
    Number(serde_json::Number),
    String(String),
    List(Vec<MetadataValue>),
    Map(BTreeMap<String, MetadataValue>),
}

impl From<bool> for MetadataValue {
    fn from(value: bool) -> Self {
        MetadataValue::Bool(value)
    }
}

impl From<i64> for MetadataValue {
    fn from(value: i64) -> Self {
        MetadataValue::Number(value.into())
    }
}

impl From<&str> for MetadataValue {
    fn from(value: &str) -> Self {
        MetadataValue::String(value.to_string())
    }
}

impl From<String> for MetadataValue {
    fn from(value: String) -> Self {
        MetadataValue::String(value)
    }
}

impl<T: Into<MetadataValue>> From<Vec<T>> for MetadataValue {
    fn from(values: Vec<T>) -> Self {
        MetadataValue::List(values.into_iter().map(Into::into).collect())
    }
}

/// Free-form account metadata.
pub type Metadata = BTreeMap<String, MetadataValue>;

/// Stored account record.
///
/// Owned by the account store. Everything outside the store works with the
/// [`AuthenticatedUser`] projection, which drops the password hash and
/// metadata.
#[derive(Debug, Clone, PartialEq)]
pub struct Account {
    pub id: AccountId,
    pub username: String,
    pub email: String,
    pub password_hash: String,
    pub roles: BTreeSet<String>,
    pub metadata: Metadata,
    /// Seconds since epoch
    pub created_at: i64,
    /// Seconds since epoch
    pub updated_at: i64,
}

/// Command to create a new account.
///
/// The store assigns an identifier when `id` is `None` and stamps both
/// timestamps.
#[derive(Debug, Clone, PartialEq)]
pub struct NewAccount {
    pub id: Option<AccountId>,
    pub username: String,
    pub email: String,
    pub password_hash: String,
    pub roles: BTreeSet<String>,
    pub metadata: Metadata,
}

impl NewAccount {
    pub fn new(
        username: impl Into<String>,
        email: impl Into<String>,
        password_hash: impl Into<String>,
    ) -> Self {
        Self {
            id: None,
            username: username.into(),
            email: email.into(),
            password_hash: password_hash.into(),
            roles: BTreeSet::new(),
            metadata: Metadata::new(),
        }
    }

    pub fn with_id(mut self, id: AccountId) -> Self {
        self.id = Some(id);
        self
    }

    pub fn with_roles<I, S>(mut self, roles: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.roles = roles.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<MetadataValue>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }

    /// Materialize the stored record.
    pub(crate) fn into_account(self, id: AccountId, now: i64) -> Account {
        Account {
            id,
            username: self.username,
            email: self.email,
            password_hash: self.password_hash,
            roles: self.roles,
            metadata: self.metadata,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Read-only projection of an account handed out by providers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AuthenticatedUser {
    pub id: AccountId,
    pub username: String,
    pub email: String,
    /// Sorted role labels
    pub roles: Vec<String>,
}

impl From<&Account> for AuthenticatedUser {
    fn from(account: &Account) -> Self {
        Self {
            id: account.id.clone(),
            username: account.username.clone(),
            email: account.email.clone(),
            roles: account.roles.iter().cloned().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generated_ids_are_unique() {
        assert_ne!(AccountId::generate(), AccountId::generate());
    }

    #[test]
    fn test_metadata_value_json_shape() {
        let value = MetadataValue::Map(BTreeMap::from([
            ("created_by".to_string(), MetadataValue::from("system")),
            ("logins".to_string(), MetadataValue::from(3_i64)),
            ("verified".to_string(), MetadataValue::from(true)),
            ("tags".to_string(), MetadataValue::from(vec!["a", "b"])),
            ("nothing".to_string(), MetadataValue::Null),
        ]));

        let json = serde_json::to_value(&value).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "created_by": "system",
                "logins": 3,
                "verified": true,
                "tags": ["a", "b"],
                "nothing": null,
            })
        );

        let parsed: MetadataValue = serde_json::from_value(json).unwrap();
        assert_eq!(parsed, value);
    }

    #[test]
    fn test_metadata_value_keeps_floats() {
        let parsed: MetadataValue = serde_json::from_str("1.5").unwrap();
        assert_eq!(serde_json::to_string(&parsed).unwrap(), "1.5");
    }

    #[test]
    fn test_projection_drops_secrets() {
        let account = NewAccount::new("alice", "alice@example.com", "$argon2id$hash")
            .with_roles(["user", "admin"])
            .with_metadata("created_by", "system")
            .into_account(AccountId::new("a-1"), 100);

        let user = AuthenticatedUser::from(&account);
        assert_eq!(user.id.as_str(), "a-1");
        assert_eq!(user.roles, vec!["admin".to_string(), "user".to_string()]);

        let json = serde_json::to_value(&user).unwrap();
        assert!(json.get("password_hash").is_none());
        assert!(json.get("metadata").is_none());
        assert_eq!(json["id"], "a-1");
    }
}
