use secrecy::Secret;

/// A cookie queued for the response layer to emit.
#[derive(Clone)]
pub struct QueuedCookie {
    pub name: String,
    pub value: Secret<String>,
    /// `None` means a session cookie.
    pub max_age_minutes: Option<i64>,
}

/// Collects cookies issued during authentication (e.g. the remember cookie).
pub trait CookieJar: Send + Sync {
    fn queue(&self, cookie: QueuedCookie);
}
