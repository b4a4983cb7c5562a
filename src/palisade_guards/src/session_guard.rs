use std::sync::Arc;

use async_trait::async_trait;
use palisade_core::{
    AuthError, Authenticatable, CookieJar, Credentials, Guard, QueuedCookie, SessionStorage,
    StatefulGuard, UserProvider, UserRef,
};
use serde_json::Value;
use tokio::sync::RwLock;

const REMEMBER_TTL_MINUTES: i64 = 60 * 24 * 365;

/// Session-cookie backed guard: the authenticated identifier lives in
/// request-scoped session storage, the user record is materialized through
/// the provider on first access and memoized for the guard's lifetime.
pub struct SessionGuard {
    name: String,
    provider: Arc<dyn UserProvider>,
    session: Arc<dyn SessionStorage>,
    cookies: Option<Arc<dyn CookieJar>>,
    // Outer None: not resolved yet. Inner None: resolved to "nobody".
    user: RwLock<Option<Option<UserRef>>>,
}

impl SessionGuard {
    pub fn new(
        name: impl Into<String>,
        provider: Arc<dyn UserProvider>,
        session: Arc<dyn SessionStorage>,
        cookies: Option<Arc<dyn CookieJar>>,
    ) -> Self {
        Self {
            name: name.into(),
            provider,
            session,
            cookies,
            user: RwLock::new(None),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Session key the authenticated identifier is stored under.
    fn session_key(&self) -> String {
        format!("login_{}", self.name)
    }

    fn queue_remember_cookie(&self, user: &dyn Authenticatable) {
        let (Some(jar), Some(token)) = (self.cookies.as_ref(), user.remember_token()) else {
            return;
        };
        jar.queue(QueuedCookie {
            name: user.remember_token_name().to_owned(),
            value: token,
            max_age_minutes: Some(REMEMBER_TTL_MINUTES),
        });
    }
}

fn identifier_from_session(value: Value) -> Option<String> {
    match value {
        Value::String(id) => Some(id),
        Value::Number(id) => Some(id.to_string()),
        _ => None,
    }
}

#[async_trait]
impl Guard for SessionGuard {
    #[tracing::instrument(name = "SessionGuard::user", skip_all, fields(guard = %self.name))]
    async fn user(&self) -> Result<Option<UserRef>, AuthError> {
        if let Some(cached) = self.user.read().await.as_ref() {
            return Ok(cached.clone());
        }

        let resolved = match self.session.get(&self.session_key()).await? {
            Some(value) => match identifier_from_session(value) {
                Some(id) => self.provider.retrieve_by_id(&id).await?,
                None => None,
            },
            None => None,
        };

        *self.user.write().await = Some(resolved.clone());
        Ok(resolved)
    }

    #[tracing::instrument(name = "SessionGuard::validate", skip_all, fields(guard = %self.name))]
    async fn validate(&self, credentials: &Credentials) -> Result<bool, AuthError> {
        let Some(user) = self.provider.retrieve_by_credentials(credentials).await? else {
            return Ok(false);
        };
        Ok(self
            .provider
            .validate_credentials(user.as_ref(), credentials)
            .await?)
    }

    #[tracing::instrument(name = "SessionGuard::logout", skip_all, fields(guard = %self.name))]
    async fn logout(&self) -> Result<(), AuthError> {
        self.session.remove(&self.session_key()).await?;
        self.session.invalidate().await?;
        *self.user.write().await = Some(None);
        Ok(())
    }

    fn as_stateful(&self) -> Option<&dyn StatefulGuard> {
        Some(self)
    }
}

#[async_trait]
impl StatefulGuard for SessionGuard {
    #[tracing::instrument(name = "SessionGuard::attempt", skip_all, fields(guard = %self.name))]
    async fn attempt(&self, credentials: &Credentials, remember: bool) -> Result<bool, AuthError> {
        let Some(user) = self.provider.retrieve_by_credentials(credentials).await? else {
            tracing::debug!("no user matched the supplied credentials");
            return Ok(false);
        };

        if !self
            .provider
            .validate_credentials(user.as_ref(), credentials)
            .await?
        {
            tracing::debug!("credential validation failed");
            return Ok(false);
        }

        self.login(user, remember).await?;
        Ok(true)
    }

    #[tracing::instrument(name = "SessionGuard::login", skip_all, fields(guard = %self.name))]
    async fn login(&self, user: UserRef, remember: bool) -> Result<(), AuthError> {
        // Regenerate before writing the identifier: an aborted request can
        // leave a fresh anonymous session, never a fixated authenticated one.
        self.session.regenerate_id().await?;
        self.session
            .put(&self.session_key(), Value::String(user.auth_identifier()))
            .await?;

        if remember {
            self.queue_remember_cookie(user.as_ref());
        }

        *self.user.write().await = Some(Some(user));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use palisade_core::UserProviderError;
    use secrecy::{ExposeSecret, Secret};

    use super::*;

    struct TestUser {
        id: String,
        password_hash: String,
        remember: Option<String>,
    }

    impl Authenticatable for TestUser {
        fn auth_identifier_name(&self) -> &str {
            "id"
        }

        fn auth_identifier(&self) -> String {
            self.id.clone()
        }

        fn auth_password(&self) -> Secret<String> {
            Secret::new(self.password_hash.clone())
        }

        fn remember_token(&self) -> Option<Secret<String>> {
            self.remember.clone().map(Secret::new)
        }
    }

    // Plain-text comparison stands in for the hasher-backed provider.
    struct MockProvider {
        id: String,
        password: String,
        lookups: AtomicUsize,
    }

    impl MockProvider {
        fn new(id: &str, password: &str) -> Arc<Self> {
            Arc::new(Self {
                id: id.to_owned(),
                password: password.to_owned(),
                lookups: AtomicUsize::new(0),
            })
        }

        fn user(&self) -> UserRef {
            Arc::new(TestUser {
                id: self.id.clone(),
                password_hash: self.password.clone(),
                remember: Some("tok-123".to_owned()),
            })
        }
    }

    #[async_trait]
    impl UserProvider for MockProvider {
        async fn retrieve_by_id(
            &self,
            identifier: &str,
        ) -> Result<Option<UserRef>, UserProviderError> {
            self.lookups.fetch_add(1, Ordering::SeqCst);
            Ok((identifier == self.id).then(|| self.user()))
        }

        async fn retrieve_by_credentials(
            &self,
            credentials: &Credentials,
        ) -> Result<Option<UserRef>, UserProviderError> {
            if credentials.is_password_only() {
                return Ok(None);
            }
            self.lookups.fetch_add(1, Ordering::SeqCst);
            Ok(Some(self.user()))
        }

        async fn validate_credentials(
            &self,
            _user: &dyn Authenticatable,
            credentials: &Credentials,
        ) -> Result<bool, UserProviderError> {
            Ok(credentials
                .password_value()
                .is_some_and(|p| p.expose_secret() == &self.password))
        }
    }

    #[derive(Default)]
    struct MockSession {
        values: RwLock<HashMap<String, Value>>,
        regenerations: AtomicUsize,
        invalidations: AtomicUsize,
    }

    #[async_trait]
    impl SessionStorage for MockSession {
        async fn get(&self, key: &str) -> Result<Option<Value>, palisade_core::SessionStoreError> {
            Ok(self.values.read().await.get(key).cloned())
        }

        async fn put(
            &self,
            key: &str,
            value: Value,
        ) -> Result<(), palisade_core::SessionStoreError> {
            self.values.write().await.insert(key.to_owned(), value);
            Ok(())
        }

        async fn remove(&self, key: &str) -> Result<(), palisade_core::SessionStoreError> {
            self.values.write().await.remove(key);
            Ok(())
        }

        async fn regenerate_id(&self) -> Result<(), palisade_core::SessionStoreError> {
            self.regenerations.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }

        async fn invalidate(&self) -> Result<(), palisade_core::SessionStoreError> {
            self.invalidations.fetch_add(1, Ordering::SeqCst);
            self.values.write().await.clear();
            Ok(())
        }
    }

    #[derive(Default)]
    struct MockJar {
        queued: Mutex<Vec<QueuedCookie>>,
    }

    impl CookieJar for MockJar {
        fn queue(&self, cookie: QueuedCookie) {
            self.queued.lock().unwrap().push(cookie);
        }
    }

    fn guard_with(
        provider: Arc<MockProvider>,
        session: Arc<MockSession>,
        jar: Option<Arc<MockJar>>,
    ) -> SessionGuard {
        SessionGuard::new(
            "web",
            provider,
            session,
            jar.map(|j| j as Arc<dyn CookieJar>),
        )
    }

    fn good_credentials() -> Credentials {
        Credentials::new()
            .field("email", "user@example.com")
            .password("secret")
    }

    #[tokio::test]
    async fn login_then_user_round_trips() {
        let provider = MockProvider::new("7", "secret");
        let session = Arc::new(MockSession::default());
        let guard = guard_with(provider.clone(), session.clone(), None);

        guard.login(provider.user(), false).await.unwrap();

        let user = guard.user().await.unwrap().unwrap();
        assert_eq!(user.auth_identifier(), "7");
        assert_eq!(session.regenerations.load(Ordering::SeqCst), 1);
        assert_eq!(
            session.values.read().await.get("login_web"),
            Some(&Value::String("7".into()))
        );
    }

    #[tokio::test]
    async fn logout_clears_session_and_user() {
        let provider = MockProvider::new("7", "secret");
        let session = Arc::new(MockSession::default());
        let guard = guard_with(provider, session.clone(), None);

        guard
            .attempt(&good_credentials(), false)
            .await
            .unwrap();
        assert!(guard.check().await.unwrap());

        guard.logout().await.unwrap();
        assert!(guard.user().await.unwrap().is_none());
        assert_eq!(session.invalidations.load(Ordering::SeqCst), 1);
        assert!(session.values.read().await.is_empty());
    }

    #[tokio::test]
    async fn failed_attempt_leaves_session_untouched() {
        let provider = MockProvider::new("7", "secret");
        let session = Arc::new(MockSession::default());
        let guard = guard_with(provider, session.clone(), None);

        let ok = guard
            .attempt(
                &Credentials::new()
                    .field("email", "user@example.com")
                    .password("wrong"),
                false,
            )
            .await
            .unwrap();

        assert!(!ok);
        assert!(session.values.read().await.is_empty());
        assert_eq!(session.regenerations.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn password_only_attempt_never_queries_the_provider() {
        let provider = MockProvider::new("7", "secret");
        let session = Arc::new(MockSession::default());
        let guard = guard_with(provider.clone(), session, None);

        let ok = guard
            .attempt(&Credentials::new().password("secret"), false)
            .await
            .unwrap();

        assert!(!ok);
        assert_eq!(provider.lookups.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn user_is_memoized_including_none() {
        let provider = MockProvider::new("7", "secret");
        let session = Arc::new(MockSession::default());
        let guard = guard_with(provider.clone(), session.clone(), None);

        // No session entry: resolves to none once, then serves the cache.
        assert!(guard.user().await.unwrap().is_none());
        assert!(guard.user().await.unwrap().is_none());
        assert_eq!(provider.lookups.load(Ordering::SeqCst), 0);

        // A later session write is not observed by this guard instance.
        session
            .put("login_web", Value::String("7".into()))
            .await
            .unwrap();
        assert!(guard.user().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn resolves_user_from_existing_session() {
        let provider = MockProvider::new("7", "secret");
        let session = Arc::new(MockSession::default());
        session
            .put("login_web", Value::String("7".into()))
            .await
            .unwrap();

        let guard = guard_with(provider.clone(), session, None);
        let user = guard.user().await.unwrap().unwrap();
        assert_eq!(user.auth_identifier(), "7");

        // Second call hits the memoized record.
        guard.user().await.unwrap();
        assert_eq!(provider.lookups.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn remember_login_queues_long_lived_cookie() {
        let provider = MockProvider::new("7", "secret");
        let session = Arc::new(MockSession::default());
        let jar = Arc::new(MockJar::default());
        let guard = guard_with(provider.clone(), session, Some(jar.clone()));

        guard.attempt(&good_credentials(), true).await.unwrap();

        let queued = jar.queued.lock().unwrap();
        assert_eq!(queued.len(), 1);
        assert_eq!(queued[0].name, "remember_token");
        assert_eq!(queued[0].max_age_minutes, Some(REMEMBER_TTL_MINUTES));
    }

    #[tokio::test]
    async fn validate_does_not_mutate_state() {
        let provider = MockProvider::new("7", "secret");
        let session = Arc::new(MockSession::default());
        let guard = guard_with(provider, session.clone(), None);

        assert!(guard.validate(&good_credentials()).await.unwrap());
        assert!(session.values.read().await.is_empty());
        assert!(guard.user().await.unwrap().is_none());
    }
}
