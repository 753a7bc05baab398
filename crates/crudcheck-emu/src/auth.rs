//! Authorization principal derived from the `Authorization` header
//!
//! Delete is the only gated operation in this contract. Evaluation is
//! stateless and happens strictly before any lookup or mutation:
//! a delete against a nonexistent id with a bad token still surfaces
//! the authorization error.

use crate::descriptor::ErrorEnvelope;

const BEARER_PREFIX: &str = "Bearer ";
const ADMIN_TOKEN: &str = "valid-admin";
const USER_TOKEN: &str = "valid-user";
const EXPIRED_TOKEN: &str = "expired";

/// Caller identity as decoded from the `Authorization` header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Principal {
    /// No header present
    Absent,
    /// Credential past its validity window
    Expired,
    /// Structurally broken credential (wrong scheme, unknown token)
    Malformed,
    /// Authenticated, non-admin role
    User,
    /// Authenticated admin role
    Admin,
}

impl Principal {
    /// Decode the raw header value. Recomputed per request, no caching.
    #[must_use]
    pub fn from_header(header: Option<&str>) -> Self {
        let Some(raw) = header else {
            return Self::Absent;
        };
        let Some(token) = raw.strip_prefix(BEARER_PREFIX) else {
            return Self::Malformed;
        };
        match token.trim() {
            ADMIN_TOKEN => Self::Admin,
            USER_TOKEN => Self::User,
            EXPIRED_TOKEN => Self::Expired,
            _ => Self::Malformed,
        }
    }

    /// Gate the delete operation.
    ///
    /// Returns the denying status and envelope, or `None` when the
    /// caller may proceed. Expired and malformed credentials are
    /// indistinguishable from an absent one (401, never 403).
    #[must_use]
    pub fn deny_delete(self) -> Option<(u16, ErrorEnvelope)> {
        match self {
            Self::Admin => None,
            Self::User => Some((
                403,
                ErrorEnvelope::new("Insufficient role for delete", "forbidden"),
            )),
            Self::Absent | Self::Expired | Self::Malformed => Some((
                401,
                ErrorEnvelope::new("Missing or invalid credentials", "unauthorized"),
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn absent_header_is_absent() {
        assert_eq!(Principal::from_header(None), Principal::Absent);
    }

    #[test]
    fn admin_token_decodes() {
        assert_eq!(
            Principal::from_header(Some("Bearer valid-admin")),
            Principal::Admin
        );
    }

    #[test]
    fn user_token_decodes() {
        assert_eq!(
            Principal::from_header(Some("Bearer valid-user")),
            Principal::User
        );
    }

    #[test]
    fn expired_token_decodes() {
        assert_eq!(
            Principal::from_header(Some("Bearer expired")),
            Principal::Expired
        );
    }

    #[test]
    fn unknown_token_is_malformed() {
        assert_eq!(
            Principal::from_header(Some("Bearer garbage")),
            Principal::Malformed
        );
    }

    #[test]
    fn non_bearer_scheme_is_malformed() {
        assert_eq!(
            Principal::from_header(Some("Basic dXNlcjpwYXNz")),
            Principal::Malformed
        );
    }

    #[test]
    fn admin_permitted() {
        assert!(Principal::Admin.deny_delete().is_none());
    }

    #[test]
    fn user_forbidden_403() {
        let (status, env) = Principal::User.deny_delete().unwrap();
        assert_eq!(status, 403);
        assert_eq!(env.details, "forbidden");
    }

    #[test]
    fn absent_expired_malformed_all_401() {
        // Expiry and malformed tokens must not leak into 403
        for p in [Principal::Absent, Principal::Expired, Principal::Malformed] {
            let (status, env) = p.deny_delete().unwrap();
            assert_eq!(status, 401, "{p:?} must map to 401");
            assert_eq!(env.details, "unauthorized");
            assert!(!env.timestamp.is_empty());
        }
    }
}
