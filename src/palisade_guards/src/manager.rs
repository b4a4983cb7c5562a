use std::collections::HashMap;
use std::sync::Arc;

use palisade_core::{
    AuthConfig, AuthError, Guard, GuardConfig, ProviderConfig, TokenCodec, TokenStorage,
    UserProvider,
};

use crate::context::{AuthContext, RequestEnv};
use crate::jwt_guard::{JwtGuard, JwtGuardOptions};
use crate::session_guard::SessionGuard;

pub const SESSION_DRIVER: &str = "session";
pub const JWT_DRIVER: &str = "jwt";

/// Everything a guard factory gets to work with: the guard's name and
/// configuration, its resolved provider (when configured), and the
/// per-request collaborator bundle.
pub struct GuardSpec<'a> {
    pub name: &'a str,
    pub config: &'a GuardConfig,
    pub provider: Option<Arc<dyn UserProvider>>,
    pub env: &'a RequestEnv,
}

impl GuardSpec<'_> {
    /// The resolved provider, or a configuration error naming the guard.
    pub fn require_provider(&self) -> Result<Arc<dyn UserProvider>, AuthError> {
        self.provider.clone().ok_or_else(|| AuthError::InvalidGuardOptions {
            guard: self.name.to_owned(),
            message: "driver requires a provider".to_owned(),
        })
    }

    /// Deserialize the guard's driver-specific options.
    pub fn options<T>(&self) -> Result<T, AuthError>
    where
        T: for<'de> serde::Deserialize<'de>,
    {
        self.config.options().map_err(|e| AuthError::InvalidGuardOptions {
            guard: self.name.to_owned(),
            message: e.to_string(),
        })
    }
}

/// Constructs a guard for a driver type.
pub type GuardFactory =
    Arc<dyn Fn(&AuthManager, GuardSpec<'_>) -> Result<Arc<dyn Guard>, AuthError> + Send + Sync>;

/// Constructs a user provider for a provider driver type.
pub type ProviderFactory =
    Arc<dyn Fn(&str, &ProviderConfig) -> Result<Arc<dyn UserProvider>, AuthError> + Send + Sync>;

/// The orchestration core: resolves guard configuration to guard instances
/// through a driver registry, and provider configuration through a provider
/// registry.
///
/// The manager is immutable once built and is shared across tasks behind an
/// `Arc`. All per-request state lives on [`AuthContext`]; a manager holds no
/// request state at all.
pub struct AuthManager {
    config: AuthConfig,
    guard_factories: HashMap<String, GuardFactory>,
    provider_factories: HashMap<String, ProviderFactory>,
}

impl AuthManager {
    pub fn builder(config: AuthConfig) -> AuthManagerBuilder {
        AuthManagerBuilder {
            config,
            custom_guards: HashMap::new(),
            provider_factories: HashMap::new(),
            token_codec: None,
            token_storage: None,
        }
    }

    pub fn config(&self) -> &AuthConfig {
        &self.config
    }

    /// Mint a per-request context bound to this manager.
    pub fn context(self: &Arc<Self>, env: RequestEnv) -> AuthContext {
        AuthContext::new(Arc::clone(self), env)
    }

    /// Resolve a named guard for the given request environment.
    ///
    /// Fails fast on configuration problems: unknown guard name, unknown
    /// driver. Memoization is the caller's concern ([`AuthContext`]).
    #[tracing::instrument(name = "AuthManager::resolve", skip(self, env))]
    pub fn resolve(&self, name: &str, env: &RequestEnv) -> Result<Arc<dyn Guard>, AuthError> {
        let config = self
            .config
            .guard(name)
            .ok_or_else(|| AuthError::UndefinedGuard(name.to_owned()))?;

        let factory = self.guard_factories.get(&config.driver).ok_or_else(|| {
            AuthError::UndefinedDriver {
                guard: name.to_owned(),
                driver: config.driver.clone(),
            }
        })?;

        let provider = match config.provider.as_deref() {
            Some(provider_name) => Some(self.user_provider(provider_name)?),
            None => None,
        };

        factory(
            self,
            GuardSpec {
                name,
                config,
                provider,
                env,
            },
        )
    }

    /// Resolve a named user provider through the provider-driver registry.
    pub fn user_provider(&self, name: &str) -> Result<Arc<dyn UserProvider>, AuthError> {
        let config = self
            .config
            .provider(name)
            .ok_or_else(|| AuthError::UndefinedProvider(name.to_owned()))?;

        let factory = self.provider_factories.get(&config.driver).ok_or_else(|| {
            AuthError::UndefinedProviderDriver {
                provider: name.to_owned(),
                driver: config.driver.clone(),
            }
        })?;

        factory(name, config)
    }
}

/// Bootstrap-time configuration of the manager. The driver and provider
/// registries are frozen at [`build`](Self::build); nothing is registered
/// afterwards.
pub struct AuthManagerBuilder {
    config: AuthConfig,
    custom_guards: HashMap<String, GuardFactory>,
    provider_factories: HashMap<String, ProviderFactory>,
    token_codec: Option<Arc<dyn TokenCodec>>,
    token_storage: Option<Arc<dyn TokenStorage>>,
}

impl AuthManagerBuilder {
    /// Register a custom guard factory for a driver type. Takes precedence
    /// over the built-in drivers when the names collide.
    pub fn extend(mut self, driver: impl Into<String>, factory: GuardFactory) -> Self {
        self.custom_guards.insert(driver.into(), factory);
        self
    }

    /// Register a user-provider factory for a provider driver type.
    pub fn provider(mut self, driver: impl Into<String>, factory: ProviderFactory) -> Self {
        self.provider_factories.insert(driver.into(), factory);
        self
    }

    /// Token codec used by the built-in `jwt` driver.
    pub fn token_codec(mut self, codec: Arc<dyn TokenCodec>) -> Self {
        self.token_codec = Some(codec);
        self
    }

    /// Token bookkeeping storage used by the built-in `jwt` driver.
    pub fn token_storage(mut self, storage: Arc<dyn TokenStorage>) -> Self {
        self.token_storage = Some(storage);
        self
    }

    pub fn build(self) -> Arc<AuthManager> {
        let mut guard_factories: HashMap<String, GuardFactory> = HashMap::new();

        guard_factories.insert(SESSION_DRIVER.to_owned(), session_driver());

        // The jwt driver is only available when its collaborators were
        // supplied at bootstrap.
        if let (Some(codec), Some(storage)) = (self.token_codec, self.token_storage) {
            guard_factories.insert(JWT_DRIVER.to_owned(), jwt_driver(codec, storage));
        }

        // Custom creators win over built-ins.
        guard_factories.extend(self.custom_guards);

        Arc::new(AuthManager {
            config: self.config,
            guard_factories,
            provider_factories: self.provider_factories,
        })
    }
}

fn session_driver() -> GuardFactory {
    Arc::new(|_manager, spec| {
        let provider = spec.require_provider()?;
        let session = spec
            .env
            .session()
            .ok_or(AuthError::MissingCapability("session storage"))?;

        Ok(Arc::new(SessionGuard::new(
            spec.name,
            provider,
            session,
            spec.env.cookies(),
        )))
    })
}

fn jwt_driver(codec: Arc<dyn TokenCodec>, storage: Arc<dyn TokenStorage>) -> GuardFactory {
    Arc::new(move |_manager, spec| {
        let provider = spec.require_provider()?;
        let options: JwtGuardOptions = spec.options()?;

        Ok(Arc::new(JwtGuard::new(
            spec.name,
            provider,
            Arc::clone(&codec),
            Arc::clone(&storage),
            spec.env.bearer(),
            options,
        )))
    })
}

#[cfg(test)]
mod tests {
    use async_trait::async_trait;
    use palisade_core::{
        Authenticatable, Credentials, SessionStorage, SessionStoreError, UserProviderError,
        UserRef,
    };
    use serde_json::Value;

    use super::*;

    fn config(json: serde_json::Value) -> AuthConfig {
        serde_json::from_value(json).unwrap()
    }

    struct NullProvider;

    #[async_trait]
    impl palisade_core::UserProvider for NullProvider {
        async fn retrieve_by_id(&self, _id: &str) -> Result<Option<UserRef>, UserProviderError> {
            Ok(None)
        }

        async fn retrieve_by_credentials(
            &self,
            _credentials: &Credentials,
        ) -> Result<Option<UserRef>, UserProviderError> {
            Ok(None)
        }

        async fn validate_credentials(
            &self,
            _user: &dyn Authenticatable,
            _credentials: &Credentials,
        ) -> Result<bool, UserProviderError> {
            Ok(false)
        }
    }

    struct NullSession;

    #[async_trait]
    impl SessionStorage for NullSession {
        async fn get(&self, _key: &str) -> Result<Option<Value>, SessionStoreError> {
            Ok(None)
        }

        async fn put(&self, _key: &str, _value: Value) -> Result<(), SessionStoreError> {
            Ok(())
        }

        async fn remove(&self, _key: &str) -> Result<(), SessionStoreError> {
            Ok(())
        }

        async fn regenerate_id(&self) -> Result<(), SessionStoreError> {
            Ok(())
        }

        async fn invalidate(&self) -> Result<(), SessionStoreError> {
            Ok(())
        }
    }

    struct NullGuard;

    #[async_trait]
    impl Guard for NullGuard {
        async fn user(&self) -> Result<Option<UserRef>, AuthError> {
            Ok(None)
        }

        async fn validate(&self, _credentials: &Credentials) -> Result<bool, AuthError> {
            Ok(false)
        }

        async fn logout(&self) -> Result<(), AuthError> {
            Ok(())
        }
    }

    fn null_provider_factory() -> ProviderFactory {
        Arc::new(|_name, _config| Ok(Arc::new(NullProvider) as Arc<dyn palisade_core::UserProvider>))
    }

    #[test]
    fn unknown_guard_is_a_configuration_error() {
        let manager = AuthManager::builder(config(serde_json::json!({
            "defaults": { "guard": "web" },
            "guards": {}
        })))
        .build();

        let err = manager.resolve("missing", &RequestEnv::new()).unwrap_err();
        assert!(matches!(err, AuthError::UndefinedGuard(name) if name == "missing"));
    }

    #[test]
    fn unknown_driver_is_a_configuration_error() {
        let manager = AuthManager::builder(config(serde_json::json!({
            "defaults": { "guard": "web" },
            "guards": { "web": { "driver": "ldap" } }
        })))
        .build();

        let err = manager.resolve("web", &RequestEnv::new()).unwrap_err();
        assert!(
            matches!(err, AuthError::UndefinedDriver { guard, driver } if guard == "web" && driver == "ldap")
        );
    }

    #[test]
    fn custom_creator_wins_over_builtin() {
        let manager = AuthManager::builder(config(serde_json::json!({
            "defaults": { "guard": "web" },
            "guards": { "web": { "driver": "session" } }
        })))
        .extend(
            SESSION_DRIVER,
            Arc::new(|_m, _spec| Ok(Arc::new(NullGuard) as Arc<dyn Guard>)),
        )
        .build();

        // The built-in session driver would reject the missing provider;
        // the custom creator does not care.
        assert!(manager.resolve("web", &RequestEnv::new()).is_ok());
    }

    #[test]
    fn builtin_session_driver_requires_session_storage() {
        let manager = AuthManager::builder(config(serde_json::json!({
            "defaults": { "guard": "web" },
            "guards": { "web": { "driver": "session", "provider": "users" } },
            "providers": { "users": { "driver": "null" } }
        })))
        .provider("null", null_provider_factory())
        .build();

        let err = manager.resolve("web", &RequestEnv::new()).unwrap_err();
        assert!(matches!(err, AuthError::MissingCapability(_)));

        let env = RequestEnv::new().with_session(Arc::new(NullSession));
        let guard = manager.resolve("web", &env).unwrap();
        assert!(guard.as_stateful().is_some());
    }

    #[test]
    fn unknown_provider_and_provider_driver_fail() {
        let manager = AuthManager::builder(config(serde_json::json!({
            "defaults": { "guard": "web" },
            "guards": { "web": { "driver": "session", "provider": "users" } },
            "providers": { "users": { "driver": "database" } }
        })))
        .build();

        assert!(matches!(
            manager.user_provider("missing").unwrap_err(),
            AuthError::UndefinedProvider(name) if name == "missing"
        ));
        assert!(matches!(
            manager.user_provider("users").unwrap_err(),
            AuthError::UndefinedProviderDriver { provider, driver }
                if provider == "users" && driver == "database"
        ));
    }

    #[test]
    fn jwt_driver_absent_without_collaborators() {
        let manager = AuthManager::builder(config(serde_json::json!({
            "defaults": { "guard": "api" },
            "guards": { "api": { "driver": "jwt", "provider": "users" } },
            "providers": { "users": { "driver": "null" } }
        })))
        .provider("null", null_provider_factory())
        .build();

        // No codec/storage registered at bootstrap: the driver is unknown.
        let err = manager.resolve("api", &RequestEnv::new()).unwrap_err();
        assert!(matches!(err, AuthError::UndefinedDriver { .. }));
    }
}
