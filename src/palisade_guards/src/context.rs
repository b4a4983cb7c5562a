use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use palisade_core::{
    AuthError, BearerSource, CookieJar, Credentials, Guard, SessionStorage, UserRef,
};
use tokio::sync::RwLock;

use crate::manager::AuthManager;

/// The per-request collaborator bundle, threaded explicitly into guard
/// construction. Every capability is optional; a driver that needs one the
/// request does not provide fails with a configuration-class error.
#[derive(Default, Clone)]
pub struct RequestEnv {
    session: Option<Arc<dyn SessionStorage>>,
    bearer: Option<Arc<dyn BearerSource>>,
    cookies: Option<Arc<dyn CookieJar>>,
}

impl RequestEnv {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_session(mut self, session: Arc<dyn SessionStorage>) -> Self {
        self.session = Some(session);
        self
    }

    pub fn with_bearer(mut self, bearer: Arc<dyn BearerSource>) -> Self {
        self.bearer = Some(bearer);
        self
    }

    pub fn with_cookies(mut self, cookies: Arc<dyn CookieJar>) -> Self {
        self.cookies = Some(cookies);
        self
    }

    pub fn session(&self) -> Option<Arc<dyn SessionStorage>> {
        self.session.clone()
    }

    pub fn bearer(&self) -> Option<Arc<dyn BearerSource>> {
        self.bearer.clone()
    }

    pub fn cookies(&self) -> Option<Arc<dyn CookieJar>> {
        self.cookies.clone()
    }
}

/// Shared user-resolver indirection: lets unrelated code ask "who is the
/// current user" without depending on the manager directly.
#[async_trait]
pub trait ResolvesUser: Send + Sync {
    async fn resolve(
        &self,
        context: &AuthContext,
        guard: Option<&str>,
    ) -> Result<Option<UserRef>, AuthError>;
}

/// Resolves through `context.guard(name).user()`.
pub struct DefaultUserResolver;

#[async_trait]
impl ResolvesUser for DefaultUserResolver {
    async fn resolve(
        &self,
        context: &AuthContext,
        guard: Option<&str>,
    ) -> Result<Option<UserRef>, AuthError> {
        context.guard(guard).await?.user().await
    }
}

/// Per-request authentication state: the guard memoization map, the
/// default-guard override, and the user-resolver override.
///
/// One context belongs to one logical request task. Contexts never share
/// mutable state with each other, so concurrent requests cannot observe each
/// other's default guard or resolved users.
pub struct AuthContext {
    manager: Arc<AuthManager>,
    env: RequestEnv,
    guards: RwLock<HashMap<String, Arc<dyn Guard>>>,
    default_guard: RwLock<Option<String>>,
    resolver: RwLock<Arc<dyn ResolvesUser>>,
}

impl AuthContext {
    pub(crate) fn new(manager: Arc<AuthManager>, env: RequestEnv) -> Self {
        Self {
            manager,
            env,
            guards: RwLock::new(HashMap::new()),
            default_guard: RwLock::new(None),
            resolver: RwLock::new(Arc::new(DefaultUserResolver)),
        }
    }

    pub fn manager(&self) -> &Arc<AuthManager> {
        &self.manager
    }

    /// Resolve a guard by name, or the default guard when `name` is `None`.
    ///
    /// At most one instance exists per name within this context; repeated
    /// calls return the identical memoized guard.
    pub async fn guard(&self, name: Option<&str>) -> Result<Arc<dyn Guard>, AuthError> {
        let name = match name {
            Some(name) => name.to_owned(),
            None => self.default_driver().await,
        };

        if let Some(guard) = self.guards.read().await.get(&name) {
            return Ok(Arc::clone(guard));
        }

        let guard = self.manager.resolve(&name, &self.env)?;

        let mut guards = self.guards.write().await;
        Ok(Arc::clone(guards.entry(name).or_insert(guard)))
    }

    /// The active default guard name: the per-context override when set,
    /// else the configured default.
    pub async fn default_driver(&self) -> String {
        if let Some(name) = self.default_guard.read().await.as_ref() {
            return name.clone();
        }
        self.manager.config().default_guard().to_owned()
    }

    /// Override the default guard for this context only.
    pub async fn set_default_driver(&self, name: impl Into<String>) {
        *self.default_guard.write().await = Some(name.into());
    }

    /// Set the default guard and rebind the user resolver to go through it.
    pub async fn should_use(&self, name: &str) {
        self.set_default_driver(name).await;
        self.resolve_users_using(Arc::new(DefaultUserResolver))
            .await;
    }

    /// The currently bound user resolver.
    pub async fn user_resolver(&self) -> Arc<dyn ResolvesUser> {
        Arc::clone(&*self.resolver.read().await)
    }

    /// Replace the user resolver for this context.
    pub async fn resolve_users_using(&self, resolver: Arc<dyn ResolvesUser>) {
        *self.resolver.write().await = resolver;
    }

    // Explicit delegation surface to the default guard. This is the whole
    // list; there is no catch-all dispatch.

    /// Current user via the bound resolver and the default guard.
    pub async fn user(&self) -> Result<Option<UserRef>, AuthError> {
        self.user_resolver().await.resolve(self, None).await
    }

    /// Current user via the bound resolver and a named guard.
    pub async fn user_via(&self, guard: &str) -> Result<Option<UserRef>, AuthError> {
        self.user_resolver().await.resolve(self, Some(guard)).await
    }

    pub async fn id(&self) -> Result<Option<String>, AuthError> {
        self.guard(None).await?.id().await
    }

    pub async fn check(&self) -> Result<bool, AuthError> {
        self.guard(None).await?.check().await
    }

    pub async fn validate(&self, credentials: &Credentials) -> Result<bool, AuthError> {
        self.guard(None).await?.validate(credentials).await
    }

    pub async fn logout(&self) -> Result<(), AuthError> {
        self.guard(None).await?.logout().await
    }
}
