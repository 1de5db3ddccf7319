use anyhow::Context;
use jsonwebtoken::{
    decode, encode, errors::ErrorKind, Algorithm, DecodingKey, EncodingKey, Header, Validation,
};
use time::{Duration, OffsetDateTime};
use tracing::debug;
use uuid::Uuid;

use super::claims::{Claims, TokenKind};
use crate::config::JwtConfig;

pub const ALGORITHM: Algorithm = Algorithm::HS256;

/// Why a token was rejected. Kept for logging only; callers see a single "invalid".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InvalidReason {
    Malformed,
    BadSignature,
    WrongAlgorithm,
    Expired,
    NotYetValid,
    WrongKind,
}

#[derive(Debug)]
pub enum Verification {
    Valid(Claims),
    Invalid(InvalidReason),
}

impl Verification {
    pub fn subject(self) -> Option<String> {
        match self {
            Verification::Valid(claims) => Some(claims.sub),
            Verification::Invalid(_) => None,
        }
    }
}

/// Signing and verification keys derived once from the process-wide secret.
pub struct JwtKeys {
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
    pub access_ttl: Duration,
    pub reset_ttl: Duration,
}

impl JwtKeys {
    pub fn new(cfg: &JwtConfig) -> Self {
        let mut validation = Validation::new(ALGORITHM);
        validation.leeway = 0;
        validation.validate_exp = true;
        validation.validate_nbf = true;
        validation.validate_aud = false;
        validation.set_required_spec_claims(&["exp", "sub"]);
        Self {
            encoding: EncodingKey::from_secret(cfg.secret.as_bytes()),
            decoding: DecodingKey::from_secret(cfg.secret.as_bytes()),
            validation,
            access_ttl: Duration::seconds(cfg.access_ttl_minutes.saturating_mul(60)),
            reset_ttl: Duration::seconds(cfg.reset_ttl_hours.saturating_mul(3600)),
        }
    }

    fn sign(&self, subject: &str, kind: TokenKind, ttl: Duration, not_before: bool) -> anyhow::Result<String> {
        let now = OffsetDateTime::now_utc().unix_timestamp();
        let claims = Claims {
            sub: subject.to_string(),
            iat: now,
            exp: now
                .checked_add(ttl.whole_seconds())
                .context("token lifetime out of range")?,
            nbf: not_before.then_some(now),
            kind,
        };
        let token = encode(&Header::new(ALGORITHM), &claims, &self.encoding)?;
        debug!(kind = ?kind, "jwt signed");
        Ok(token)
    }

    pub fn issue(&self, subject: &str, kind: TokenKind, ttl: Duration) -> anyhow::Result<String> {
        self.sign(subject, kind, ttl, false)
    }

    /// Like `issue`, but the token also refuses to verify before its issuance instant.
    pub fn issue_with_not_before(
        &self,
        subject: &str,
        kind: TokenKind,
        ttl: Duration,
    ) -> anyhow::Result<String> {
        self.sign(subject, kind, ttl, true)
    }

    pub fn verify(&self, token: &str) -> Verification {
        match decode::<Claims>(token, &self.decoding, &self.validation) {
            Ok(data) => Verification::Valid(data.claims),
            Err(e) => {
                let reason = match e.kind() {
                    ErrorKind::ExpiredSignature => InvalidReason::Expired,
                    ErrorKind::ImmatureSignature => InvalidReason::NotYetValid,
                    ErrorKind::InvalidSignature => InvalidReason::BadSignature,
                    ErrorKind::InvalidAlgorithm | ErrorKind::InvalidAlgorithmName => {
                        InvalidReason::WrongAlgorithm
                    }
                    _ => InvalidReason::Malformed,
                };
                debug!(reason = ?reason, "jwt rejected");
                Verification::Invalid(reason)
            }
        }
    }

    pub fn verify_kind(&self, token: &str, kind: TokenKind) -> Verification {
        match self.verify(token) {
            Verification::Valid(claims) if claims.kind != kind => {
                debug!(expected = ?kind, got = ?claims.kind, "jwt rejected");
                Verification::Invalid(InvalidReason::WrongKind)
            }
            other => other,
        }
    }

    pub fn sign_access(&self, user_id: Uuid) -> anyhow::Result<String> {
        self.issue(&user_id.to_string(), TokenKind::Access, self.access_ttl)
    }

    pub fn verify_access(&self, token: &str) -> Result<Uuid, InvalidReason> {
        match self.verify_kind(token, TokenKind::Access) {
            Verification::Valid(claims) => {
                Uuid::parse_str(&claims.sub).map_err(|_| InvalidReason::Malformed)
            }
            Verification::Invalid(reason) => Err(reason),
        }
    }
}

#[cfg(test)]
pub(crate) fn test_keys(secret: &str) -> JwtKeys {
    JwtKeys::new(&JwtConfig {
        secret: secret.into(),
        access_ttl_minutes: 5,
        reset_ttl_hours: 48,
    })
}

/// Replaces the first signature character so the signature bytes change.
#[cfg(test)]
pub(crate) fn tamper_signature(token: &str) -> String {
    let (head, sig) = token.rsplit_once('.').expect("three segments");
    let mut chars: Vec<char> = sig.chars().collect();
    chars[0] = if chars[0] == 'A' { 'B' } else { 'A' };
    format!("{}.{}", head, chars.into_iter().collect::<String>())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sign_and_verify_access_token() {
        let keys = test_keys("dev-secret");
        let user_id = Uuid::new_v4();
        let token = keys.sign_access(user_id).expect("sign access");
        assert_eq!(token.split('.').count(), 3);
        assert_eq!(keys.verify_access(&token), Ok(user_id));
    }

    #[test]
    fn issue_roundtrips_subject() {
        let keys = test_keys("dev-secret");
        for ttl in [Duration::seconds(1), Duration::minutes(30), Duration::days(30)] {
            let token = keys.issue("someone", TokenKind::Access, ttl).unwrap();
            assert_eq!(keys.verify(&token).subject().as_deref(), Some("someone"));
        }
    }

    #[test]
    fn expired_token_is_invalid() {
        let keys = test_keys("dev-secret");
        let token = keys
            .issue("someone", TokenKind::Access, Duration::seconds(-1))
            .unwrap();
        assert!(matches!(
            keys.verify(&token),
            Verification::Invalid(InvalidReason::Expired)
        ));
    }

    #[test]
    fn not_before_token_is_valid_at_issuance() {
        let keys = test_keys("dev-secret");
        let token = keys
            .issue_with_not_before("user@example.com", TokenKind::PasswordReset, Duration::hours(1))
            .unwrap();
        match keys.verify(&token) {
            Verification::Valid(claims) => {
                assert_eq!(claims.nbf, Some(claims.iat));
                assert_eq!(claims.sub, "user@example.com");
            }
            other => panic!("expected valid, got {:?}", other),
        }
    }

    #[test]
    fn future_not_before_is_rejected() {
        let keys = test_keys("dev-secret");
        let now = OffsetDateTime::now_utc().unix_timestamp();
        let claims = Claims {
            sub: "user@example.com".into(),
            iat: now,
            exp: now + 7200,
            nbf: Some(now + 3600),
            kind: TokenKind::PasswordReset,
        };
        let token = encode(
            &Header::new(ALGORITHM),
            &claims,
            &EncodingKey::from_secret(b"dev-secret"),
        )
        .unwrap();
        assert!(matches!(
            keys.verify(&token),
            Verification::Invalid(InvalidReason::NotYetValid)
        ));
    }

    #[test]
    fn wrong_secret_is_rejected() {
        let token = test_keys("secret-a").sign_access(Uuid::new_v4()).unwrap();
        assert_eq!(
            test_keys("secret-b").verify_access(&token),
            Err(InvalidReason::BadSignature)
        );
    }

    #[test]
    fn tampered_signature_is_rejected() {
        let keys = test_keys("dev-secret");
        let token = keys.sign_access(Uuid::new_v4()).unwrap();
        assert!(keys.verify_access(&tamper_signature(&token)).is_err());
    }

    #[test]
    fn other_algorithm_is_rejected_even_with_right_secret() {
        let keys = test_keys("dev-secret");
        let now = OffsetDateTime::now_utc().unix_timestamp();
        let claims = Claims {
            sub: Uuid::new_v4().to_string(),
            iat: now,
            exp: now + 60,
            nbf: None,
            kind: TokenKind::Access,
        };
        let token = encode(
            &Header::new(Algorithm::HS512),
            &claims,
            &EncodingKey::from_secret(b"dev-secret"),
        )
        .unwrap();
        assert_eq!(keys.verify_access(&token), Err(InvalidReason::WrongAlgorithm));
    }

    #[test]
    fn garbage_is_malformed() {
        let keys = test_keys("dev-secret");
        for junk in ["", "abc", "a.b.c", "!!!.???.***"] {
            assert!(matches!(keys.verify(junk), Verification::Invalid(_)));
        }
    }

    #[test]
    fn oversized_lifetime_is_an_error_not_a_panic() {
        let keys = test_keys("dev-secret");
        assert!(keys.issue("someone", TokenKind::Access, Duration::MAX).is_err());
    }

    #[test]
    fn huge_configured_ttl_does_not_panic() {
        let keys = JwtKeys::new(&JwtConfig {
            secret: "dev-secret".into(),
            access_ttl_minutes: i64::MAX,
            reset_ttl_hours: i64::MAX,
        });
        assert_eq!(keys.reset_ttl.whole_seconds(), i64::MAX);
        assert!(keys.sign_access(Uuid::new_v4()).is_err());
    }

    #[test]
    fn reset_token_cannot_be_used_as_access_token() {
        let keys = test_keys("dev-secret");
        let token = keys
            .issue_with_not_before(&Uuid::new_v4().to_string(), TokenKind::PasswordReset, keys.reset_ttl)
            .unwrap();
        assert_eq!(keys.verify_access(&token), Err(InvalidReason::WrongKind));
    }
}
