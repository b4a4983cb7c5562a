use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use palisade_core::{
    Authenticatable, CredentialValue, Credentials, Hasher, UserProvider, UserProviderError,
    UserRef,
};
use palisade_guards::ProviderFactory;
use secrecy::{ExposeSecret, Secret};
use tokio::sync::RwLock;

/// A user record held by the in-memory provider.
pub struct MemoryUser {
    pub identifier: String,
    pub fields: HashMap<String, String>,
    pub password_hash: Secret<String>,
    pub remember_token: Option<Secret<String>>,
}

impl MemoryUser {
    pub fn new(identifier: impl Into<String>, password_hash: impl Into<String>) -> Self {
        Self {
            identifier: identifier.into(),
            fields: HashMap::new(),
            password_hash: Secret::new(password_hash.into()),
            remember_token: None,
        }
    }

    pub fn with_field(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.fields.insert(key.into(), value.into());
        self
    }

    pub fn with_remember_token(mut self, token: impl Into<String>) -> Self {
        self.remember_token = Some(Secret::new(token.into()));
        self
    }

    fn field(&self, key: &str) -> Option<&str> {
        if key == "id" {
            return Some(&self.identifier);
        }
        self.fields.get(key).map(String::as_str)
    }
}

impl Authenticatable for MemoryUser {
    fn auth_identifier_name(&self) -> &str {
        "id"
    }

    fn auth_identifier(&self) -> String {
        self.identifier.clone()
    }

    fn auth_password(&self) -> Secret<String> {
        self.password_hash.clone()
    }

    fn remember_token(&self) -> Option<Secret<String>> {
        self.remember_token.clone()
    }
}

/// Map-backed user provider, mainly for tests and demos.
#[derive(Clone)]
pub struct InMemoryUserProvider {
    users: Arc<RwLock<Vec<Arc<MemoryUser>>>>,
    hasher: Arc<dyn Hasher>,
}

impl InMemoryUserProvider {
    pub fn new(hasher: Arc<dyn Hasher>) -> Self {
        Self {
            users: Arc::new(RwLock::new(Vec::new())),
            hasher,
        }
    }

    pub async fn add_user(&self, user: MemoryUser) {
        self.users.write().await.push(Arc::new(user));
    }
}

fn matches(user: &MemoryUser, key: &str, value: &CredentialValue) -> bool {
    match value {
        CredentialValue::Value(expected) => {
            user.field(key) == Some(expected.expose_secret().as_str())
        }
        CredentialValue::OneOf(values) => user
            .field(key)
            .is_some_and(|actual| values.iter().any(|v| v == actual)),
        CredentialValue::Matches(predicate) => predicate(user),
    }
}

#[async_trait]
impl UserProvider for InMemoryUserProvider {
    async fn retrieve_by_id(&self, identifier: &str) -> Result<Option<UserRef>, UserProviderError> {
        Ok(self
            .users
            .read()
            .await
            .iter()
            .find(|user| user.identifier == identifier)
            .map(|user| Arc::clone(user) as UserRef))
    }

    async fn retrieve_by_credentials(
        &self,
        credentials: &Credentials,
    ) -> Result<Option<UserRef>, UserProviderError> {
        if credentials.is_password_only() {
            return Ok(None);
        }

        Ok(self
            .users
            .read()
            .await
            .iter()
            .find(|user| {
                credentials
                    .lookup_entries()
                    .all(|(key, value)| matches(user, key, value))
            })
            .map(|user| Arc::clone(user) as UserRef))
    }

    async fn validate_credentials(
        &self,
        user: &dyn Authenticatable,
        credentials: &Credentials,
    ) -> Result<bool, UserProviderError> {
        let Some(plain) = credentials.password_value() else {
            return Ok(false);
        };
        self.hasher
            .check(plain, &user.auth_password())
            .await
            .map_err(|e| UserProviderError::Hash(e.to_string()))
    }
}

/// Provider factory serving a fixed provider instance under the `memory`
/// provider driver.
pub fn memory_provider_factory(provider: InMemoryUserProvider) -> ProviderFactory {
    Arc::new(move |_name, _config| Ok(Arc::new(provider.clone()) as Arc<dyn UserProvider>))
}

#[cfg(test)]
mod tests {
    use palisade_core::HasherError;

    use super::*;

    /// Plain-text "hashing" for tests.
    struct PlainHasher;

    #[async_trait]
    impl Hasher for PlainHasher {
        async fn check(
            &self,
            plain: &Secret<String>,
            hashed: &Secret<String>,
        ) -> Result<bool, HasherError> {
            Ok(plain.expose_secret() == hashed.expose_secret())
        }

        async fn hash(&self, plain: &Secret<String>) -> Result<Secret<String>, HasherError> {
            Ok(plain.clone())
        }
    }

    async fn provider_with_users() -> InMemoryUserProvider {
        let provider = InMemoryUserProvider::new(Arc::new(PlainHasher));
        provider
            .add_user(
                MemoryUser::new("1", "alice-pw")
                    .with_field("email", "alice@example.com")
                    .with_field("role", "admin"),
            )
            .await;
        provider
            .add_user(
                MemoryUser::new("2", "bob-pw")
                    .with_field("email", "bob@example.com")
                    .with_field("role", "staff"),
            )
            .await;
        provider
    }

    #[tokio::test]
    async fn retrieve_by_id_is_exact_match() {
        let provider = provider_with_users().await;
        assert_eq!(
            provider
                .retrieve_by_id("2")
                .await
                .unwrap()
                .unwrap()
                .auth_identifier(),
            "2"
        );
        assert!(provider.retrieve_by_id("99").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn credentials_filters_are_conjunctive() {
        let provider = provider_with_users().await;

        let credentials = Credentials::new()
            .field("email", "alice@example.com")
            .field("role", "admin")
            .password("alice-pw");
        let user = provider
            .retrieve_by_credentials(&credentials)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(user.auth_identifier(), "1");

        let mismatched = Credentials::new()
            .field("email", "alice@example.com")
            .field("role", "staff");
        assert!(provider
            .retrieve_by_credentials(&mismatched)
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn set_membership_and_predicates_apply() {
        let provider = provider_with_users().await;

        let credentials = Credentials::new().one_of("role", ["staff", "contractor"]);
        let user = provider
            .retrieve_by_credentials(&credentials)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(user.auth_identifier(), "2");

        let credentials = Credentials::new()
            .field("role", "admin")
            .matches("email_domain", |user| {
                user.auth_identifier() == "1"
            });
        assert!(provider
            .retrieve_by_credentials(&credentials)
            .await
            .unwrap()
            .is_some());

        let credentials = Credentials::new()
            .field("role", "admin")
            .matches("email_domain", |_| false);
        assert!(provider
            .retrieve_by_credentials(&credentials)
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn password_only_credentials_never_match() {
        let provider = provider_with_users().await;

        // "alice-pw" would match user 1 if the store were consulted.
        let credentials = Credentials::new().password("alice-pw");
        assert!(provider
            .retrieve_by_credentials(&credentials)
            .await
            .unwrap()
            .is_none());
        assert!(provider
            .retrieve_by_credentials(&Credentials::new())
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn validate_credentials_compares_the_secret() {
        let provider = provider_with_users().await;
        let user = provider.retrieve_by_id("1").await.unwrap().unwrap();

        let good = Credentials::new()
            .field("email", "alice@example.com")
            .password("alice-pw");
        assert!(provider
            .validate_credentials(user.as_ref(), &good)
            .await
            .unwrap());

        let bad = Credentials::new()
            .field("email", "alice@example.com")
            .password("wrong");
        assert!(!provider
            .validate_credentials(user.as_ref(), &bad)
            .await
            .unwrap());

        // No password entry at all: negative, not an error.
        let none = Credentials::new().field("email", "alice@example.com");
        assert!(!provider
            .validate_credentials(user.as_ref(), &none)
            .await
            .unwrap());
    }
}
