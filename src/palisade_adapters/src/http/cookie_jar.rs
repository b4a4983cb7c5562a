use std::sync::Mutex;

use palisade_core::{CookieJar, QueuedCookie};

/// Collects cookies queued during authentication so the response layer can
/// emit them once the request finishes.
#[derive(Default)]
pub struct QueuedCookieJar {
    queued: Mutex<Vec<QueuedCookie>>,
}

impl QueuedCookieJar {
    pub fn new() -> Self {
        Self::default()
    }

    /// Take everything queued so far.
    pub fn drain(&self) -> Vec<QueuedCookie> {
        match self.queued.lock() {
            Ok(mut queued) => queued.drain(..).collect(),
            Err(poisoned) => poisoned.into_inner().drain(..).collect(),
        }
    }
}

impl CookieJar for QueuedCookieJar {
    fn queue(&self, cookie: QueuedCookie) {
        match self.queued.lock() {
            Ok(mut queued) => queued.push(cookie),
            Err(poisoned) => poisoned.into_inner().push(cookie),
        }
    }
}

#[cfg(test)]
mod tests {
    use secrecy::Secret;

    use super::*;

    #[test]
    fn drain_empties_the_jar() {
        let jar = QueuedCookieJar::new();
        jar.queue(QueuedCookie {
            name: "remember_token".to_owned(),
            value: Secret::new("tok".to_owned()),
            max_age_minutes: Some(60),
        });

        let drained = jar.drain();
        assert_eq!(drained.len(), 1);
        assert_eq!(drained[0].name, "remember_token");
        assert!(jar.drain().is_empty());
    }
}
