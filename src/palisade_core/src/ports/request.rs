use secrecy::Secret;

/// Read the bearer token presented by the current request, if any.
pub trait BearerSource: Send + Sync {
    fn bearer_token(&self) -> Option<Secret<String>>;
}
