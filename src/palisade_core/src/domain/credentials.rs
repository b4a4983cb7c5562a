use std::fmt;
use std::sync::Arc;

use secrecy::Secret;

use crate::domain::authenticatable::Authenticatable;

/// Marker that flags a credential key as secret material.
const PASSWORD_MARKER: &str = "password";

/// A single credential constraint.
#[derive(Clone)]
pub enum CredentialValue {
    /// Exact-match scalar value.
    Value(Secret<String>),
    /// Set-membership: the field must equal one of the listed values.
    OneOf(Vec<String>),
    /// Caller-supplied predicate applied to candidate records.
    Matches(Arc<dyn Fn(&dyn Authenticatable) -> bool + Send + Sync>),
}

impl fmt::Debug for CredentialValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Value(_) => f.write_str("Value(<redacted>)"),
            Self::OneOf(values) => f.debug_tuple("OneOf").field(values).finish(),
            Self::Matches(_) => f.write_str("Matches(<predicate>)"),
        }
    }
}

/// An ordered mapping from field name to constraint, supplied by a caller
/// attempting to authenticate.
///
/// By convention a key containing `password` carries the clear-text secret:
/// it is excluded from identity lookup and only used for hash comparison.
#[derive(Debug, Default, Clone)]
pub struct Credentials {
    entries: Vec<(String, CredentialValue)>,
}

impl Credentials {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an exact-match field constraint.
    pub fn field(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.entries
            .push((key.into(), CredentialValue::Value(Secret::new(value.into()))));
        self
    }

    /// Add the clear-text secret under the conventional `password` key.
    pub fn password(self, value: impl Into<String>) -> Self {
        self.field(PASSWORD_MARKER, value)
    }

    /// Add a set-membership constraint.
    pub fn one_of(
        mut self,
        key: impl Into<String>,
        values: impl IntoIterator<Item = impl Into<String>>,
    ) -> Self {
        self.entries.push((
            key.into(),
            CredentialValue::OneOf(values.into_iter().map(Into::into).collect()),
        ));
        self
    }

    /// Add a caller-supplied predicate over candidate records.
    pub fn matches(
        mut self,
        key: impl Into<String>,
        predicate: impl Fn(&dyn Authenticatable) -> bool + Send + Sync + 'static,
    ) -> Self {
        self.entries
            .push((key.into(), CredentialValue::Matches(Arc::new(predicate))));
        self
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True when there is nothing usable for an identity lookup: no entries,
    /// or a single entry whose key is password-like.
    pub fn is_password_only(&self) -> bool {
        match self.entries.as_slice() {
            [] => true,
            [(key, _)] => is_password_key(key),
            _ => false,
        }
    }

    /// Entries usable for identity lookup, password-like keys excluded.
    pub fn lookup_entries(&self) -> impl Iterator<Item = &(String, CredentialValue)> {
        self.entries
            .iter()
            .filter(|(key, _)| !is_password_key(key))
    }

    /// The clear-text secret, taken from the first password-like entry.
    pub fn password_value(&self) -> Option<&Secret<String>> {
        self.entries.iter().find_map(|(key, value)| {
            match (is_password_key(key), value) {
                (true, CredentialValue::Value(secret)) => Some(secret),
                _ => None,
            }
        })
    }
}

fn is_password_key(key: &str) -> bool {
    key.contains(PASSWORD_MARKER)
}
