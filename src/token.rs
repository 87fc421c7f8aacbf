//! Signed voucher redemption tokens.
//!
//! Voucher tokens share the HS256 signing scheme used elsewhere for session
//! credentials but form a distinct, shorter-lived token class: the audience
//! claim is pinned at both ends, so a voucher token never passes as a
//! session credential and vice versa.

use chrono::{Duration, NaiveDateTime};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use rand::Rng;
use rand::distributions::Alphanumeric;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::voucher::VoucherRedemption;

/// Audience claim pinned into every voucher token.
pub const VOUCHER_AUDIENCE: &str = "voucher-redemption";

const NONCE_LEN: usize = 24;

/// Claims embedded in a voucher token. The signature binds every field; any
/// alteration invalidates the token.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VoucherClaims {
    /// Redemption identifier (subject).
    pub sub: String,
    /// Promotion the voucher was issued against.
    pub promotion_id: i32,
    /// Store where the voucher is redeemable.
    pub store_id: i32,
    /// Product the voucher applies to.
    pub product_id: i32,
    /// Consumer the voucher was issued to.
    pub consumer_id: i32,
    /// Single-use nonce, mirrored on the redemption record.
    pub nonce: String,
    /// Issued at timestamp (Unix epoch seconds).
    pub iat: i64,
    /// Expiration timestamp (Unix epoch seconds).
    pub exp: i64,
    /// Token class marker.
    pub aud: String,
}

impl VoucherClaims {
    /// Build the claim set for a freshly issued redemption.
    pub fn for_redemption(redemption: &VoucherRedemption) -> Self {
        Self {
            sub: redemption.id.to_string(),
            promotion_id: redemption.promotion_id,
            store_id: redemption.store_id,
            product_id: redemption.product_id,
            consumer_id: redemption.consumer_id,
            nonce: redemption.nonce.clone(),
            iat: redemption.issued_at.and_utc().timestamp(),
            exp: redemption.expires_at.and_utc().timestamp(),
            aud: VOUCHER_AUDIENCE.to_string(),
        }
    }

    /// Parse the subject back into a redemption identifier.
    pub fn redemption_id(&self) -> Option<i32> {
        self.sub.parse().ok()
    }

    /// Whether the claims match the stored redemption they reference.
    pub fn matches(&self, redemption: &VoucherRedemption) -> bool {
        self.redemption_id() == Some(redemption.id)
            && self.promotion_id == redemption.promotion_id
            && self.store_id == redemption.store_id
            && self.product_id == redemption.product_id
            && self.consumer_id == redemption.consumer_id
            && self.nonce == redemption.nonce
    }
}

/// Errors raised while signing or checking voucher tokens.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TokenError {
    #[error("token signature is invalid")]
    InvalidSignature,
    #[error("token is not a voucher token")]
    WrongTokenClass,
    #[error("token is malformed")]
    Malformed,
    #[error("token does not reference a known redemption")]
    UnknownRedemption,
    #[error("token claims do not match the redemption record")]
    ClaimsMismatch,
    #[error("failed to sign token")]
    SigningFailed,
}

/// Signing facility consumed by the voucher services.
pub trait VoucherSigner: Send + Sync {
    /// Sign the claim set into an opaque token string.
    fn sign(&self, claims: &VoucherClaims) -> Result<String, TokenError>;
    /// Check the signature and token class, returning the embedded claims.
    ///
    /// Expiry is deliberately not enforced here: the verification service
    /// still needs the claims of an expired token to locate the redemption
    /// record and move it to its expired state.
    fn verify(&self, token: &str) -> Result<VoucherClaims, TokenError>;
    /// Lifetime of freshly issued tokens.
    fn ttl(&self) -> Duration;
}

/// HS256-backed signer for voucher tokens.
#[derive(Clone)]
pub struct JwtVoucherSigner {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    ttl: Duration,
}

impl JwtVoucherSigner {
    /// Create a signer from the shared secret and the voucher lifetime.
    pub fn new(secret: &str, ttl: Duration) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            ttl,
        }
    }
}

impl VoucherSigner for JwtVoucherSigner {
    fn sign(&self, claims: &VoucherClaims) -> Result<String, TokenError> {
        encode(&Header::default(), claims, &self.encoding_key)
            .map_err(|_| TokenError::SigningFailed)
    }

    fn verify(&self, token: &str) -> Result<VoucherClaims, TokenError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_audience(&[VOUCHER_AUDIENCE]);
        validation.validate_exp = false;

        let token_data =
            decode::<VoucherClaims>(token, &self.decoding_key, &validation).map_err(|e| {
                match e.kind() {
                    jsonwebtoken::errors::ErrorKind::InvalidSignature => {
                        TokenError::InvalidSignature
                    }
                    jsonwebtoken::errors::ErrorKind::InvalidAudience => TokenError::WrongTokenClass,
                    _ => TokenError::Malformed,
                }
            })?;

        Ok(token_data.claims)
    }

    fn ttl(&self) -> Duration {
        self.ttl
    }
}

/// Generate a fresh alphanumeric nonce for a new redemption.
pub fn new_nonce() -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(NONCE_LEN)
        .map(char::from)
        .collect()
}

/// Expiry instant for a token issued at `issued_at`.
pub fn expiry_for(issued_at: NaiveDateTime, ttl: Duration) -> NaiveDateTime {
    issued_at + ttl
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use serde_json::json;

    fn datetime() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 1, 1)
            .and_then(|date| date.and_hms_opt(12, 0, 0))
            .unwrap_or_default()
    }

    fn sample_redemption() -> VoucherRedemption {
        VoucherRedemption {
            id: 42,
            promotion_id: 7,
            store_id: 3,
            product_id: 11,
            consumer_id: 99,
            status: crate::domain::voucher::RedemptionStatus::Pending,
            nonce: new_nonce(),
            issued_at: datetime(),
            expires_at: expiry_for(datetime(), Duration::minutes(15)),
            verified_at: None,
            confirmed_at: None,
            confirmed_by: None,
            created_at: datetime(),
            updated_at: datetime(),
        }
    }

    fn signer() -> JwtVoucherSigner {
        JwtVoucherSigner::new("test_secret_key_for_testing_only", Duration::minutes(15))
    }

    #[test]
    fn sign_and_verify_round_trip() {
        let signer = signer();
        let redemption = sample_redemption();
        let claims = VoucherClaims::for_redemption(&redemption);

        let token = signer.sign(&claims).unwrap();
        assert_eq!(token.split('.').count(), 3);

        let decoded = signer.verify(&token).unwrap();
        assert_eq!(decoded.redemption_id(), Some(42));
        assert!(decoded.matches(&redemption));
    }

    #[test]
    fn tampered_token_is_rejected() {
        let signer = signer();
        let claims = VoucherClaims::for_redemption(&sample_redemption());
        let token = signer.sign(&claims).unwrap();

        // Flip a byte in the payload segment.
        let mut parts: Vec<String> = token.split('.').map(str::to_string).collect();
        let mut payload = parts[1].clone().into_bytes();
        let idx = payload.len() / 2;
        payload[idx] = if payload[idx] == b'A' { b'B' } else { b'A' };
        parts[1] = String::from_utf8(payload).unwrap();
        let tampered = parts.join(".");

        let result = signer.verify(&tampered);
        assert!(matches!(
            result,
            Err(TokenError::InvalidSignature) | Err(TokenError::Malformed)
        ));
    }

    #[test]
    fn wrong_secret_is_rejected() {
        let claims = VoucherClaims::for_redemption(&sample_redemption());
        let token = signer().sign(&claims).unwrap();

        let other = JwtVoucherSigner::new("another_secret", Duration::minutes(15));
        assert_eq!(other.verify(&token), Err(TokenError::InvalidSignature));
    }

    #[test]
    fn session_tokens_are_not_voucher_tokens() {
        // A session-style token signed with the same secret but a different
        // audience must not pass voucher verification.
        let secret = "test_secret_key_for_testing_only";
        let session_claims = json!({
            "sub": "42",
            "aud": "session",
            "iat": datetime().and_utc().timestamp(),
            "exp": (datetime() + Duration::hours(8)).and_utc().timestamp(),
        });
        let session_token = encode(
            &Header::default(),
            &session_claims,
            &EncodingKey::from_secret(secret.as_bytes()),
        )
        .unwrap();

        let result = signer().verify(&session_token);
        assert!(matches!(
            result,
            Err(TokenError::WrongTokenClass) | Err(TokenError::Malformed)
        ));
    }

    #[test]
    fn expired_claims_still_decode() {
        // Expiry enforcement belongs to the verification service, which has
        // to find the redemption before it can expire it.
        let signer = signer();
        let mut redemption = sample_redemption();
        redemption.issued_at = datetime() - Duration::hours(2);
        redemption.expires_at = datetime() - Duration::hours(1);

        let token = signer
            .sign(&VoucherClaims::for_redemption(&redemption))
            .unwrap();
        let decoded = signer.verify(&token).unwrap();
        assert!(decoded.exp < datetime().and_utc().timestamp());
    }

    #[test]
    fn garbage_is_malformed() {
        assert!(matches!(
            signer().verify("not.a.token"),
            Err(TokenError::Malformed) | Err(TokenError::InvalidSignature)
        ));
    }

    #[test]
    fn nonces_are_unique_enough() {
        let a = new_nonce();
        let b = new_nonce();
        assert_eq!(a.len(), NONCE_LEN);
        assert_ne!(a, b);
    }
}
