pub mod context;
pub mod jwt_guard;
pub mod manager;
pub mod session_guard;
pub mod token_store;

pub use context::{AuthContext, DefaultUserResolver, RequestEnv, ResolvesUser};
pub use jwt_guard::{JwtGuard, JwtGuardOptions};
pub use manager::{AuthManager, AuthManagerBuilder, GuardFactory, GuardSpec, ProviderFactory};
pub use session_guard::SessionGuard;
pub use token_store::CacheTokenStorage;
