use base64::{engine::general_purpose, Engine as _};
use chrono::{DateTime, Utc};
use console_core::ConsoleError;
use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct JwtClaims {
    pub sub: String,
    pub exp: i64,
    #[serde(default)]
    pub scope: Option<String>,
    #[serde(default)]
    pub role: Option<String>,
}

impl JwtClaims {
    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp(self.exp, 0)
    }

    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.exp <= now.timestamp()
    }
}

/// Decode JWT claims without validation
///
/// The console never verifies tokens; the backend does. Claims are only read
/// to log expiry and to spot a token used in the wrong scope.
pub fn decode_jwt_claims(token: &str) -> Result<JwtClaims, ConsoleError> {
    let parts: Vec<&str> = token.split('.').collect();

    if parts.len() != 3 {
        return Err(ConsoleError::InvalidToken("Invalid JWT format".to_string()));
    }

    let payload = general_purpose::URL_SAFE_NO_PAD
        .decode(parts[1].trim_end_matches('='))
        .map_err(|e| ConsoleError::InvalidToken(format!("Failed to decode JWT payload: {}", e)))?;

    let claims: JwtClaims = serde_json::from_slice(&payload)?;

    Ok(claims)
}
