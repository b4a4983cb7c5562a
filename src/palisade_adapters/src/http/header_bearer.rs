use http::HeaderMap;
use http::header::AUTHORIZATION;
use palisade_core::BearerSource;
use secrecy::Secret;

/// Reads the bearer token from the request's `Authorization` header.
#[derive(Clone)]
pub struct HeaderBearerSource {
    headers: HeaderMap,
}

impl HeaderBearerSource {
    pub fn new(headers: HeaderMap) -> Self {
        Self { headers }
    }
}

impl BearerSource for HeaderBearerSource {
    fn bearer_token(&self) -> Option<Secret<String>> {
        let header = self.headers.get(AUTHORIZATION)?.to_str().ok()?;
        let token = header.strip_prefix("Bearer ")?.trim();
        if token.is_empty() {
            return None;
        }
        Some(Secret::new(token.to_owned()))
    }
}
