use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use tollgate_core::PrincipalId;

use crate::Role;

/// Token payload (transport-agnostic).
///
/// On the wire the field names are `subjectId`, `identifier`, `role`,
/// `issuedAt`, `expiresAt`; timestamps are whole Unix seconds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Claims {
    /// Subject / principal identifier.
    pub subject_id: PrincipalId,

    /// Login identifier at issuance time.
    pub identifier: String,

    /// Role name. Kept as a string so a token naming a role this build does
    /// not know still decodes, and is then denied everything.
    pub role: String,

    #[serde(with = "chrono::serde::ts_seconds")]
    pub issued_at: DateTime<Utc>,

    #[serde(with = "chrono::serde::ts_seconds")]
    pub expires_at: DateTime<Utc>,
}

impl Claims {
    /// The role, if it is one this build knows.
    pub fn role(&self) -> Option<Role> {
        self.role.parse().ok()
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TokenValidationError {
    #[error("token has expired")]
    Expired,

    #[error("invalid token time window (expires_at <= issued_at)")]
    InvalidTimeWindow,
}

/// Deterministically validate claim timestamps.
///
/// Valid on `[issued_at, expires_at + leeway)`. Signature checks happen
/// before this and never see the leeway. A future `issued_at` is not
/// rejected here: only expiry is time-checked.
pub fn validate_claims(claims: &Claims, now: DateTime<Utc>, leeway: Duration) -> Result<(), TokenValidationError> {
    if claims.expires_at <= claims.issued_at {
        return Err(TokenValidationError::InvalidTimeWindow);
    }
    let deadline = claims
        .expires_at
        .checked_add_signed(leeway)
        .ok_or(TokenValidationError::InvalidTimeWindow)?;
    if now >= deadline {
        return Err(TokenValidationError::Expired);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(secs: i64) -> DateTime<Utc> {
        DateTime::from_timestamp(secs, 0).unwrap()
    }

    fn claims(issued: i64, expires: i64) -> Claims {
        Claims {
            subject_id: PrincipalId::from("1"),
            identifier: "a@x.com".to_string(),
            role: "user".to_string(),
            issued_at: at(issued),
            expires_at: at(expires),
        }
    }

    #[test]
    fn valid_until_expiry_exclusive() {
        let c = claims(1_000, 1_060);
        assert!(validate_claims(&c, at(1_000), Duration::zero()).is_ok());
        assert!(validate_claims(&c, at(1_059), Duration::zero()).is_ok());
        assert_eq!(
            validate_claims(&c, at(1_060), Duration::zero()),
            Err(TokenValidationError::Expired)
        );
    }

    #[test]
    fn leeway_extends_expiry_only() {
        let c = claims(1_000, 1_060);
        assert!(validate_claims(&c, at(1_064), Duration::seconds(5)).is_ok());
        assert!(validate_claims(&c, at(1_065), Duration::seconds(5)).is_err());
    }

    #[test]
    fn inverted_window_is_rejected() {
        let c = claims(1_060, 1_060);
        assert_eq!(
            validate_claims(&c, at(1_000), Duration::zero()),
            Err(TokenValidationError::InvalidTimeWindow)
        );
    }

    #[test]
    fn unrepresentable_deadline_is_rejected_not_panicking() {
        let c = Claims {
            expires_at: DateTime::<Utc>::MAX_UTC,
            ..claims(1_000, 1_060)
        };
        assert_eq!(
            validate_claims(&c, at(1_000), Duration::seconds(1)),
            Err(TokenValidationError::InvalidTimeWindow)
        );
    }

    #[test]
    fn wire_shape_uses_camel_case_and_seconds() {
        let json = serde_json::to_value(claims(1_000, 1_060)).unwrap();
        let mut keys: Vec<&str> = json.as_object().unwrap().keys().map(String::as_str).collect();
        keys.sort();
        assert_eq!(keys, vec!["expiresAt", "identifier", "issuedAt", "role", "subjectId"]);
        assert_eq!(json["issuedAt"], 1_000);
        assert_eq!(json["expiresAt"], 1_060);
    }

    #[test]
    fn unknown_role_decodes_but_does_not_resolve() {
        let mut c = claims(1_000, 1_060);
        c.role = "auditor".to_string();
        assert_eq!(c.role(), None);
        c.role = "admin".to_string();
        assert_eq!(c.role(), Some(Role::Admin));
    }
}
