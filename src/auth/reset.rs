use super::{claims::TokenKind, jwt::JwtKeys};

/// Reset token for `email`, valid from now until the configured reset TTL.
pub fn generate_reset_token(keys: &JwtKeys, email: &str) -> anyhow::Result<String> {
    keys.issue_with_not_before(email, TokenKind::PasswordReset, keys.reset_ttl)
}

/// The email a reset token was issued for, or `None` for any kind of invalid token.
pub fn verify_reset_token(keys: &JwtKeys, token: &str) -> Option<String> {
    keys.verify_kind(token, TokenKind::PasswordReset).subject()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::jwt::{tamper_signature, test_keys};

    #[test]
    fn reset_token_roundtrip() {
        let keys = test_keys("dev-secret");
        let token = generate_reset_token(&keys, "user@example.com").unwrap();
        assert_eq!(
            verify_reset_token(&keys, &token).as_deref(),
            Some("user@example.com")
        );
    }

    #[test]
    fn flipped_signature_is_none() {
        let keys = test_keys("dev-secret");
        let token = generate_reset_token(&keys, "user@example.com").unwrap();
        assert_eq!(verify_reset_token(&keys, &tamper_signature(&token)), None);
    }

    #[test]
    fn garbage_and_foreign_tokens_are_none() {
        let keys = test_keys("dev-secret");
        assert_eq!(verify_reset_token(&keys, "not-a-token"), None);

        let other = test_keys("other-secret");
        let token = generate_reset_token(&other, "user@example.com").unwrap();
        assert_eq!(verify_reset_token(&keys, &token), None);
    }

    #[test]
    fn access_token_is_not_a_reset_token() {
        let keys = test_keys("dev-secret");
        let token = keys.sign_access(uuid::Uuid::new_v4()).unwrap();
        assert_eq!(verify_reset_token(&keys, &token), None);
    }
}
