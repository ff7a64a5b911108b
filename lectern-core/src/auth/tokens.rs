use std::time::Duration;

use chrono::Utc;
use jsonwebtoken::{
    Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode,
    errors::ErrorKind,
};
use lectern_model::{Role, UserID};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use zeroize::Zeroizing;

use crate::error::{LecternError, Result};

/// Which secret signed a token. Access tokens authenticate calls; refresh
/// tokens can only be exchanged for a new pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenKind {
    Access,
    Refresh,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    pub sub: Uuid,
    pub role: Role,
    pub exp: i64,
    pub iat: i64,
    pub jti: String,
    pub kind: TokenKind,
}

impl Claims {
    pub fn user_id(&self) -> UserID {
        UserID(self.sub)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
    pub token_type: String,
    /// Access token lifetime in seconds.
    pub expires_in: u64,
}

/// Secrets and lifetimes for [`TokenService`].
#[derive(Clone)]
pub struct TokenSettings {
    pub access_secret: Zeroizing<String>,
    pub refresh_secret: Zeroizing<String>,
    pub access_ttl: Duration,
    pub refresh_ttl: Duration,
}

impl std::fmt::Debug for TokenSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenSettings")
            .field("access_secret", &"<redacted>")
            .field("refresh_secret", &"<redacted>")
            .field("access_ttl", &self.access_ttl)
            .field("refresh_ttl", &self.refresh_ttl)
            .finish()
    }
}

/// HS256 signer/verifier for access and refresh tokens.
#[derive(Clone)]
pub struct TokenService {
    access_encoding: EncodingKey,
    access_decoding: DecodingKey,
    refresh_encoding: EncodingKey,
    refresh_decoding: DecodingKey,
    access_ttl: Duration,
    refresh_ttl: Duration,
    validation: Validation,
}

impl std::fmt::Debug for TokenService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenService")
            .field("access_ttl", &self.access_ttl)
            .field("refresh_ttl", &self.refresh_ttl)
            .finish_non_exhaustive()
    }
}

impl TokenService {
    pub fn new(settings: &TokenSettings) -> Result<Self> {
        if settings.access_secret.is_empty()
            || settings.refresh_secret.is_empty()
        {
            return Err(LecternError::Crypto(
                "token secrets must not be empty".into(),
            ));
        }
        if settings.access_secret.as_str() == settings.refresh_secret.as_str()
        {
            return Err(LecternError::Crypto(
                "access and refresh secrets must differ".into(),
            ));
        }

        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        validation.set_required_spec_claims(&["exp", "sub"]);

        Ok(Self {
            access_encoding: EncodingKey::from_secret(
                settings.access_secret.as_bytes(),
            ),
            access_decoding: DecodingKey::from_secret(
                settings.access_secret.as_bytes(),
            ),
            refresh_encoding: EncodingKey::from_secret(
                settings.refresh_secret.as_bytes(),
            ),
            refresh_decoding: DecodingKey::from_secret(
                settings.refresh_secret.as_bytes(),
            ),
            access_ttl: settings.access_ttl,
            refresh_ttl: settings.refresh_ttl,
            validation,
        })
    }

    pub fn issue_pair(&self, user: UserID, role: Role) -> Result<TokenPair> {
        let access_token = self.issue(user, role, TokenKind::Access)?;
        let refresh_token = self.issue(user, role, TokenKind::Refresh)?;
        Ok(TokenPair {
            access_token,
            refresh_token,
            token_type: "Bearer".to_string(),
            expires_in: self.access_ttl.as_secs(),
        })
    }

    pub fn issue(
        &self,
        user: UserID,
        role: Role,
        kind: TokenKind,
    ) -> Result<String> {
        let (key, ttl) = match kind {
            TokenKind::Access => (&self.access_encoding, self.access_ttl),
            TokenKind::Refresh => (&self.refresh_encoding, self.refresh_ttl),
        };
        let now = Utc::now().timestamp();
        let ttl_secs = i64::try_from(ttl.as_secs()).unwrap_or(i64::MAX);

        let claims = Claims {
            sub: user.to_uuid(),
            role,
            exp: now.saturating_add(ttl_secs),
            iat: now,
            jti: Uuid::new_v4().to_string(),
            kind,
        };

        encode(&Header::new(Algorithm::HS256), &claims, key)
            .map_err(|err| LecternError::Crypto(err.to_string()))
    }

    pub fn verify_access(&self, token: &str) -> Result<Claims> {
        self.verify(token, TokenKind::Access)
    }

    pub fn verify_refresh(&self, token: &str) -> Result<Claims> {
        self.verify(token, TokenKind::Refresh)
    }

    fn verify(&self, token: &str, kind: TokenKind) -> Result<Claims> {
        let key = match kind {
            TokenKind::Access => &self.access_decoding,
            TokenKind::Refresh => &self.refresh_decoding,
        };

        let claims = decode::<Claims>(token, key, &self.validation)
            .map_err(|err| match err.kind() {
                ErrorKind::ExpiredSignature => LecternError::TokenExpired,
                _ => LecternError::Unauthenticated(format!(
                    "invalid {} token",
                    kind_label(kind)
                )),
            })?
            .claims;

        if claims.kind != kind {
            return Err(LecternError::Unauthenticated(format!(
                "expected {} token",
                kind_label(kind)
            )));
        }
        Ok(claims)
    }
}

fn kind_label(kind: TokenKind) -> &'static str {
    match kind {
        TokenKind::Access => "access",
        TokenKind::Refresh => "refresh",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings(access_ttl: Duration) -> TokenSettings {
        TokenSettings {
            access_secret: Zeroizing::new("access-secret".into()),
            refresh_secret: Zeroizing::new("refresh-secret".into()),
            access_ttl,
            refresh_ttl: Duration::from_secs(3600),
        }
    }

    #[test]
    fn issued_pair_verifies_with_matching_secret() {
        let service =
            TokenService::new(&settings(Duration::from_secs(60))).unwrap();
        let user = UserID::new();
        let pair = service.issue_pair(user, Role::Lecturer).unwrap();

        let access = service.verify_access(&pair.access_token).unwrap();
        assert_eq!(access.user_id(), user);
        assert_eq!(access.role, Role::Lecturer);
        assert_eq!(access.kind, TokenKind::Access);
        assert_eq!(pair.expires_in, 60);

        let refresh = service.verify_refresh(&pair.refresh_token).unwrap();
        assert_eq!(refresh.kind, TokenKind::Refresh);
    }

    #[test]
    fn tokens_are_not_interchangeable() {
        let service =
            TokenService::new(&settings(Duration::from_secs(60))).unwrap();
        let pair = service.issue_pair(UserID::new(), Role::Admin).unwrap();

        assert!(matches!(
            service.verify_access(&pair.refresh_token),
            Err(LecternError::Unauthenticated(_))
        ));
        assert!(matches!(
            service.verify_refresh(&pair.access_token),
            Err(LecternError::Unauthenticated(_))
        ));
    }

    #[test]
    fn zero_lifetime_token_is_expired() {
        let service =
            TokenService::new(&settings(Duration::from_secs(0))).unwrap();
        let token = service
            .issue(UserID::new(), Role::Student, TokenKind::Access)
            .unwrap();
        // exp == iat and leeway is zero; a one second wait crosses it.
        std::thread::sleep(Duration::from_millis(1100));
        assert!(matches!(
            service.verify_access(&token),
            Err(LecternError::TokenExpired)
        ));
    }

    #[test]
    fn identical_secrets_are_rejected() {
        let mut settings = settings(Duration::from_secs(60));
        settings.refresh_secret = settings.access_secret.clone();
        assert!(TokenService::new(&settings).is_err());
    }

    #[test]
    fn garbage_is_unauthenticated() {
        let service =
            TokenService::new(&settings(Duration::from_secs(60))).unwrap();
        assert!(matches!(
            service.verify_access("not.a.jwt"),
            Err(LecternError::Unauthenticated(_))
        ));
    }
}
