use std::sync::Arc;

use secrecy::Secret;

/// Capability required of any user record that participates in
/// authentication.
///
/// The identifier is opaque to the guards: it only has to round-trip through
/// session storage or token claims and back into
/// [`UserProvider::retrieve_by_id`](crate::ports::user_provider::UserProvider).
pub trait Authenticatable: Send + Sync {
    /// Name of the field holding the unique identifier (e.g. `id`, `email`).
    fn auth_identifier_name(&self) -> &str;

    /// The unique identifier value, rendered as a string.
    fn auth_identifier(&self) -> String;

    /// The stored password hash. Never the clear-text secret.
    fn auth_password(&self) -> Secret<String>;

    /// Name under which the remember token travels (cookie name).
    fn remember_token_name(&self) -> &str {
        "remember_token"
    }

    /// The persistent-login token, if the record carries one.
    fn remember_token(&self) -> Option<Secret<String>> {
        None
    }
}

/// Shared handle to a resolved user record.
pub type UserRef = Arc<dyn Authenticatable>;
