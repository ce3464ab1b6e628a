use chrono::DateTime;
use chrono::Duration;
use chrono::Utc;
use jsonwebtoken::decode;
use jsonwebtoken::encode;
use jsonwebtoken::Algorithm;
use jsonwebtoken::DecodingKey;
use jsonwebtoken::EncodingKey;
use jsonwebtoken::Header;
use jsonwebtoken::Validation;
use uuid::Uuid;

use super::claims::Claims;
use super::errors::JwtError;

/// Algorithms accepted on decode. Anything outside the HMAC family is
/// rejected before the signature is checked.
const ACCEPTED_ALGORITHMS: [Algorithm; 3] = [Algorithm::HS256, Algorithm::HS384, Algorithm::HS512];

/// Session token codec.
///
/// Signs claim sets with HS256 and a shared secret. Temporal checks are done
/// here rather than by `jsonwebtoken` so that a token whose `exp` equals the
/// current second is already expired, and so that expiry is reported only
/// once every other check has passed.
pub struct TokenCodec {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    algorithm: Algorithm,
    lifetime: Duration,
}

impl TokenCodec {
    /// Longest lifetime a codec accepts (ten years).
    pub const MAX_LIFETIME_SECONDS: i64 = 10 * 365 * 86_400;

    /// Create a new codec.
    ///
    /// # Arguments
    /// * `secret` - Secret key for signing tokens
    /// * `lifetime` - Validity window stamped onto every issued token
    ///
    /// # Errors
    /// * `InvalidLifetime` - Lifetime is shorter than one second or longer
    ///   than [`TokenCodec::MAX_LIFETIME_SECONDS`]
    ///
    /// # Security Notes
    /// - The secret should be at least 256 bits (32 bytes) for HS256
    /// - Store secrets in environment variables or secure vaults, never in code
    pub fn new(secret: &[u8], lifetime: Duration) -> Result<Self, JwtError> {
        let seconds = lifetime.num_seconds();
        if !(1..=Self::MAX_LIFETIME_SECONDS).contains(&seconds) {
            return Err(JwtError::InvalidLifetime(seconds));
        }

        Ok(Self {
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
            algorithm: Algorithm::HS256,
            lifetime,
        })
    }

    /// Configured token lifetime.
    pub fn lifetime(&self) -> Duration {
        self.lifetime
    }

    /// Issue a signed token for the given identity claims.
    ///
    /// Stamps a fresh random `jti`, `iat = nbf = now` and
    /// `exp = now + lifetime`, overwriting whatever the caller put there.
    ///
    /// # Errors
    /// * `EncodingFailed` - Token encoding failed or expiry is out of range
    pub fn issue(&self, claims: &Claims) -> Result<String, JwtError> {
        self.issue_at(claims, Utc::now())
    }

    /// Issue a token as of `now`.
    pub fn issue_at(&self, claims: &Claims, now: DateTime<Utc>) -> Result<String, JwtError> {
        let mut claims = claims.clone();
        claims.strip_reserved_extra();
        claims.jti = Uuid::new_v4().simple().to_string();
        claims.iat = now.timestamp();
        claims.nbf = claims.iat;
        claims.exp = now
            .checked_add_signed(self.lifetime)
            .ok_or_else(|| JwtError::EncodingFailed("expiry is out of range".to_string()))?
            .timestamp();

        let header = Header::new(self.algorithm);

        encode(&header, &claims, &self.encoding_key)
            .map_err(|e| JwtError::EncodingFailed(e.to_string()))
    }

    /// Decode and fully validate a token.
    ///
    /// # Errors
    /// * `InvalidToken` - Malformed, wrong algorithm, bad signature, or not yet valid
    /// * `TokenExpired` - Otherwise valid but `exp` is at or before now
    pub fn decode(&self, token: &str) -> Result<Claims, JwtError> {
        self.decode_at(token, Utc::now())
    }

    /// Decode and fully validate a token as of `now`.
    pub fn decode_at(&self, token: &str, now: DateTime<Utc>) -> Result<Claims, JwtError> {
        let claims = self.decode_allow_expired_at(token, now)?;

        if claims.is_expired(now.timestamp()) {
            return Err(JwtError::TokenExpired);
        }

        Ok(claims)
    }

    /// Decode a token, performing every check except expiry.
    ///
    /// Used by refresh and logout flows, which accept expired tokens but never
    /// structurally invalid ones.
    ///
    /// # Errors
    /// * `InvalidToken` - Malformed, wrong algorithm, bad signature, or not yet valid
    pub fn decode_allow_expired(&self, token: &str) -> Result<Claims, JwtError> {
        self.decode_allow_expired_at(token, Utc::now())
    }

    fn decode_allow_expired_at(&self, token: &str, now: DateTime<Utc>) -> Result<Claims, JwtError> {
        let mut validation = Validation::new(self.algorithm);
        validation.algorithms = ACCEPTED_ALGORITHMS.to_vec();
        validation.required_spec_claims.clear();
        validation.validate_exp = false;
        validation.validate_nbf = false;
        validation.validate_aud = false;
        validation.leeway = 0;

        let token_data = decode::<Claims>(token, &self.decoding_key, &validation)
            .map_err(|e| JwtError::InvalidToken(e.to_string()))?;
        let claims = token_data.claims;

        if claims.is_premature(now.timestamp()) {
            return Err(JwtError::InvalidToken("token is not yet valid".to_string()));
        }

        Ok(claims)
    }
}

impl std::fmt::Debug for TokenCodec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenCodec")
            .field("algorithm", &self.algorithm)
            .field("lifetime", &self.lifetime)
            .finish_non_exhaustive()
    }
}
