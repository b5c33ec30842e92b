use std::collections::HashMap;

use chrono::Duration;
use chrono::Utc;
use serde::Deserialize;
use serde::Serialize;

/// Purpose claim value carried by password-reset tokens.
pub const PURPOSE_PASSWORD_RESET: &str = "password_reset";

/// Generic JWT claims structure.
///
/// Supports standard RFC 7519 claims plus custom fields via the `extra` map.
/// All standard fields are optional for maximum flexibility.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Claims {
    /// Subject (account identifier)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sub: Option<String>,

    /// Expiration time (Unix timestamp)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exp: Option<i64>,

    /// Issued at (Unix timestamp)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub iat: Option<i64>,

    /// Not before (Unix timestamp)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub nbf: Option<i64>,

    /// Issuer
    #[serde(skip_serializing_if = "Option::is_none")]
    pub iss: Option<String>,

    /// Audience
    #[serde(skip_serializing_if = "Option::is_none")]
    pub aud: Option<String>,

    /// JWT ID (unique token identifier)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub jti: Option<String>,

    /// Additional custom fields (flattened into token)
    #[serde(flatten)]
    pub extra: HashMap<String, serde_json::Value>,
}

impl Claims {
    /// Create new empty claims.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create claims for an authenticated session token.
    ///
    /// # Arguments
    /// * `account_id` - Unique account identifier
    /// * `role` - Account role (stored in `extra.role`)
    /// * `expiration_hours` - Hours until the token expires
    pub fn for_account(account_id: impl ToString, role: String, expiration_hours: i64) -> Self {
        let now = Utc::now();
        let expiration = now + Duration::hours(expiration_hours);

        let mut extra = HashMap::new();
        extra.insert("role".to_string(), serde_json::json!(role));

        Self {
            sub: Some(account_id.to_string()),
            exp: Some(expiration.timestamp()),
            iat: Some(now.timestamp()),
            nbf: None,
            iss: None,
            aud: None,
            jti: None,
            extra,
        }
    }

    /// Create claims for a short-lived password-reset token.
    ///
    /// Carries `purpose = "password_reset"` so a session token can never be
    /// replayed as a reset token or vice versa.
    ///
    /// # Arguments
    /// * `account_id` - Unique account identifier
    /// * `expiration_minutes` - Minutes until the token expires
    pub fn for_password_reset(account_id: impl ToString, expiration_minutes: i64) -> Self {
        let now = Utc::now();
        let expiration = now + Duration::minutes(expiration_minutes);

        let mut extra = HashMap::new();
        extra.insert(
            "purpose".to_string(),
            serde_json::json!(PURPOSE_PASSWORD_RESET),
        );

        Self {
            sub: Some(account_id.to_string()),
            exp: Some(expiration.timestamp()),
            iat: Some(now.timestamp()),
            nbf: None,
            iss: None,
            aud: None,
            jti: None,
            extra,
        }
    }

    /// Set subject.
    pub fn with_subject(mut self, sub: impl ToString) -> Self {
        self.sub = Some(sub.to_string());
        self
    }

    /// Set expiration (Unix timestamp).
    pub fn with_expiration(mut self, exp: i64) -> Self {
        self.exp = Some(exp);
        self
    }

    /// Set issuer.
    pub fn with_issuer(mut self, iss: String) -> Self {
        self.iss = Some(iss);
        self
    }

    /// Add a custom field.
    pub fn with_extra(mut self, key: impl ToString, value: impl Serialize) -> Self {
        if let Ok(json_value) = serde_json::to_value(value) {
            self.extra.insert(key.to_string(), json_value);
        }
        self
    }

    /// Get role from extra fields (convenience method).
    pub fn role(&self) -> Option<String> {
        self.extra
            .get("role")
            .and_then(|v| v.as_str())
            .map(|s| s.to_string())
    }

    /// Whether this token was issued for the password-reset flow.
    pub fn is_password_reset(&self) -> bool {
        self.extra
            .get("purpose")
            .and_then(|v| v.as_str())
            .map_or(false, |p| p == PURPOSE_PASSWORD_RESET)
    }

    /// Check if the token is expired.
    pub fn is_expired(&self, current_timestamp: i64) -> bool {
        self.exp.map_or(false, |exp| exp < current_timestamp)
    }
}

impl Default for Claims {
    fn default() -> Self {
        Self {
            sub: None,
            exp: None,
            iat: None,
            nbf: None,
            iss: None,
            aud: None,
            jti: None,
            extra: HashMap::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_claims() {
        let claims = Claims::new().with_subject("account123");
        assert_eq!(claims.sub, Some("account123".to_string()));
        assert!(claims.exp.is_none());
    }

    #[test]
    fn test_for_account() {
        let claims = Claims::for_account("account123", "admin".to_string(), 24);

        assert_eq!(claims.sub, Some("account123".to_string()));
        assert_eq!(claims.role(), Some("admin".to_string()));
        assert!(!claims.is_password_reset());

        let exp = claims.exp.unwrap();
        let iat = claims.iat.unwrap();
        assert_eq!(exp - iat, 24 * 60 * 60);
    }

    #[test]
    fn test_for_password_reset() {
        let claims = Claims::for_password_reset("account123", 30);

        assert_eq!(claims.sub, Some("account123".to_string()));
        assert!(claims.is_password_reset());

        let exp = claims.exp.unwrap();
        let iat = claims.iat.unwrap();
        assert_eq!(exp - iat, 30 * 60);
    }

    #[test]
    fn test_session_token_is_not_reset_token() {
        let claims = Claims::for_account("account123", "user".to_string(), 24);
        assert!(!claims.is_password_reset());
    }

    #[test]
    fn test_is_expired() {
        let claims = Claims::new().with_expiration(1000);

        assert!(!claims.is_expired(999));
        assert!(!claims.is_expired(1000));
        assert!(claims.is_expired(1001));
    }

    #[test]
    fn test_is_expired_no_exp_claim() {
        let claims = Claims::new();
        assert!(!claims.is_expired(9999999999));
    }
}
