use chrono::Utc;
use secrecy::Secret;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Claims carried by an issued token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject: the authenticated user's opaque identifier.
    pub sub: String,
    /// Issued-at, seconds since the epoch.
    pub iat: i64,
    /// Expiry, seconds since the epoch.
    pub exp: i64,
    /// Token id, used as the blacklist key.
    pub jti: Uuid,
}

impl Claims {
    /// Build claims for `subject` expiring `ttl` from now.
    pub fn issue_for(subject: impl Into<String>, ttl: chrono::Duration) -> Self {
        let now = Utc::now();
        Self {
            sub: subject.into(),
            iat: now.timestamp(),
            exp: (now + ttl).timestamp(),
            jti: Uuid::new_v4(),
        }
    }

    /// Seconds until expiry, zero if already expired.
    pub fn remaining_seconds(&self) -> i64 {
        (self.exp - Utc::now().timestamp()).max(0)
    }
}

/// An encoded token paired with the claims it was issued from.
#[derive(Clone)]
pub struct SignedToken {
    encoded: Secret<String>,
    claims: Claims,
}

impl SignedToken {
    pub fn new(encoded: Secret<String>, claims: Claims) -> Self {
        Self { encoded, claims }
    }

    pub fn encoded(&self) -> &Secret<String> {
        &self.encoded
    }

    pub fn claims(&self) -> &Claims {
        &self.claims
    }
}
