use argon2::{
    Algorithm, Argon2, Params, PasswordHash, PasswordVerifier, Version,
    password_hash::{PasswordHasher, SaltString, rand_core},
};
use async_trait::async_trait;
use palisade_core::{Hasher, HasherError};
use secrecy::{ExposeSecret, Secret};

/// Argon2id password hashing. Both operations run on the blocking pool so
/// the executor threads never stall on key derivation.
#[derive(Default, Clone)]
pub struct Argon2Hasher;

impl Argon2Hasher {
    pub fn new() -> Self {
        Self
    }
}

fn argon2() -> Result<Argon2<'static>, HasherError> {
    Ok(Argon2::new(
        Algorithm::Argon2id,
        Version::V0x13,
        Params::new(15000, 2, 1, None).map_err(|e| HasherError(e.to_string()))?,
    ))
}

#[async_trait]
impl Hasher for Argon2Hasher {
    #[tracing::instrument(name = "Verify password hash", skip_all)]
    async fn check(
        &self,
        plain: &Secret<String>,
        hashed: &Secret<String>,
    ) -> Result<bool, HasherError> {
        let plain = plain.clone();
        let hashed = hashed.clone();
        let current_span = tracing::Span::current();

        tokio::task::spawn_blocking(move || {
            current_span.in_scope(|| {
                let parsed = PasswordHash::new(hashed.expose_secret())
                    .map_err(|e| HasherError(e.to_string()))?;

                match argon2()?.verify_password(plain.expose_secret().as_bytes(), &parsed) {
                    Ok(()) => Ok(true),
                    Err(argon2::password_hash::Error::Password) => Ok(false),
                    Err(e) => Err(HasherError(e.to_string())),
                }
            })
        })
        .await
        .map_err(|e| HasherError(e.to_string()))?
    }

    #[tracing::instrument(name = "Computing password hash", skip_all)]
    async fn hash(&self, plain: &Secret<String>) -> Result<Secret<String>, HasherError> {
        let plain = plain.clone();
        let current_span = tracing::Span::current();

        tokio::task::spawn_blocking(move || {
            current_span.in_scope(|| {
                let salt = SaltString::generate(rand_core::OsRng);
                argon2()?
                    .hash_password(plain.expose_secret().as_bytes(), &salt)
                    .map(|hash| Secret::new(hash.to_string()))
                    .map_err(|e| HasherError(e.to_string()))
            })
        })
        .await
        .map_err(|e| HasherError(e.to_string()))?
    }
}
