use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use chrono::Utc;
use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use sha2::Sha256;

use crate::error::GatewayError;

type HmacSha256 = Hmac<Sha256>;

/// Tokens expire one hour after issue; there is no refresh mechanism.
pub const TOKEN_TTL_SECS: i64 = 3600;

#[derive(Debug, Serialize, Deserialize)]
pub struct TokenClaims {
    /// Subject, the account id.
    pub sub: String,
    /// Issued at (unix timestamp).
    pub iat: i64,
    /// Expiry (unix timestamp).
    pub exp: i64,
}

pub fn hash_password(password: &str) -> Result<String, GatewayError> {
    bcrypt::hash(password, bcrypt::DEFAULT_COST)
        .map_err(|e| GatewayError::Store(format!("password hash: {}", e)))
}

pub fn verify_password(password: &str, password_hash: &str) -> bool {
    bcrypt::verify(password, password_hash).unwrap_or(false)
}

/// Signs and verifies the gateway's bearer tokens:
/// `base64url(claims-json).hex(hmac-sha256)`. Verification is stateless;
/// nothing is persisted server-side.
#[derive(Clone)]
pub struct TokenSigner {
    secret: String,
}

impl TokenSigner {
    pub fn new(secret: impl Into<String>) -> Self {
        Self {
            secret: secret.into(),
        }
    }

    pub fn issue(&self, user_id: &str) -> Result<String, GatewayError> {
        self.issue_at(user_id, Utc::now().timestamp())
    }

    fn issue_at(&self, user_id: &str, now: i64) -> Result<String, GatewayError> {
        let claims = TokenClaims {
            sub: user_id.to_string(),
            iat: now,
            exp: now + TOKEN_TTL_SECS,
        };
        let body = serde_json::to_vec(&claims)
            .map_err(|e| GatewayError::Store(format!("claims encode: {}", e)))?;
        let payload = URL_SAFE_NO_PAD.encode(body);
        let signature = self.signature(&payload)?;
        Ok(format!("{}.{}", payload, signature))
    }

    /// Returns the claims when the signature checks out and the token has not
    /// expired.
    pub fn verify(&self, token: &str) -> Result<TokenClaims, GatewayError> {
        let (payload, signature) = token
            .split_once('.')
            .ok_or(GatewayError::InvalidCredentials)?;
        let expected = hex::decode(signature).map_err(|_| GatewayError::InvalidCredentials)?;

        let mut mac = self.mac()?;
        mac.update(payload.as_bytes());
        mac.verify_slice(&expected)
            .map_err(|_| GatewayError::InvalidCredentials)?;

        let body = URL_SAFE_NO_PAD
            .decode(payload)
            .map_err(|_| GatewayError::InvalidCredentials)?;
        let claims: TokenClaims =
            serde_json::from_slice(&body).map_err(|_| GatewayError::InvalidCredentials)?;
        if claims.exp <= Utc::now().timestamp() {
            return Err(GatewayError::InvalidCredentials);
        }
        Ok(claims)
    }

    fn mac(&self) -> Result<HmacSha256, GatewayError> {
        HmacSha256::new_from_slice(self.secret.as_bytes())
            .map_err(|e| GatewayError::Store(format!("signing key: {}", e)))
    }

    fn signature(&self, payload: &str) -> Result<String, GatewayError> {
        let mut mac = self.mac()?;
        mac.update(payload.as_bytes());
        Ok(hex::encode(mac.finalize().into_bytes()))
    }
}
