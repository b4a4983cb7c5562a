use jsonwebtoken::{
    DecodingKey, EncodingKey, Header, Validation, decode, encode, errors::ErrorKind,
};
use palisade_core::{Claims, TokenCodec, TokenCodecError};
use secrecy::{ExposeSecret, Secret};

/// HMAC-SHA256 token codec over a shared secret.
#[derive(Clone)]
pub struct JsonwebtokenCodec {
    secret: Secret<String>,
}

impl JsonwebtokenCodec {
    pub fn new(secret: Secret<String>) -> Self {
        Self { secret }
    }

    fn encoding_key(&self) -> EncodingKey {
        EncodingKey::from_secret(self.secret.expose_secret().as_bytes())
    }

    fn decoding_key(&self) -> DecodingKey {
        DecodingKey::from_secret(self.secret.expose_secret().as_bytes())
    }

    fn decode_with(
        &self,
        token: &Secret<String>,
        validation: &Validation,
    ) -> Result<Option<Claims>, TokenCodecError> {
        match decode::<Claims>(token.expose_secret(), &self.decoding_key(), validation) {
            Ok(data) => Ok(Some(data.claims)),
            Err(e) => match e.kind() {
                // A token the caller presented that does not hold up is a
                // negative result, not an infrastructure failure.
                ErrorKind::ExpiredSignature
                | ErrorKind::ImmatureSignature
                | ErrorKind::InvalidToken
                | ErrorKind::InvalidSignature
                | ErrorKind::MissingRequiredClaim(_)
                | ErrorKind::Base64(_)
                | ErrorKind::Json(_)
                | ErrorKind::Utf8(_) => Ok(None),
                _ => Err(TokenCodecError(e.to_string())),
            },
        }
    }
}

impl TokenCodec for JsonwebtokenCodec {
    fn issue(&self, claims: &Claims) -> Result<Secret<String>, TokenCodecError> {
        encode(&Header::default(), claims, &self.encoding_key())
            .map(Secret::new)
            .map_err(|e| TokenCodecError(e.to_string()))
    }

    fn verify(&self, token: &Secret<String>) -> Result<Option<Claims>, TokenCodecError> {
        self.decode_with(token, &Validation::default())
    }

    fn peek(&self, token: &Secret<String>) -> Result<Option<Claims>, TokenCodecError> {
        let mut validation = Validation::default();
        validation.validate_exp = false;
        self.decode_with(token, &validation)
    }
}
