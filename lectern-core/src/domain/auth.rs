use std::sync::Arc;

use lectern_model::{NewUser, Role, User};
use tracing::{info, warn};
use zeroize::Zeroizing;

use crate::{
    auth::{PasswordCrypto, TokenPair, TokenService},
    context::{Actor, RequestContext},
    database::ports::UsersRepository,
    error::{LecternError, Result},
};

/// Username/password pair with an optional role the account must hold.
#[derive(Clone)]
pub struct Credentials {
    pub username: String,
    pub password: Zeroizing<String>,
    pub role: Option<Role>,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .field("role", &self.role)
            .finish()
    }
}

impl Credentials {
    pub fn new(
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self {
            username: username.into(),
            password: Zeroizing::new(password.into()),
            role: None,
        }
    }

    pub fn with_role(mut self, role: Role) -> Self {
        self.role = Some(role);
        self
    }

    fn require_complete(&self) -> Result<()> {
        if self.username.trim().is_empty() || self.password.is_empty() {
            return Err(LecternError::Validation(
                "username and password are required".into(),
            ));
        }
        Ok(())
    }
}

#[derive(Clone)]
pub struct AuthService {
    users: Arc<dyn UsersRepository>,
    crypto: Arc<PasswordCrypto>,
    tokens: TokenService,
}

impl std::fmt::Debug for AuthService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthService")
            .field("tokens", &self.tokens)
            .finish_non_exhaustive()
    }
}

impl AuthService {
    pub fn new(
        users: Arc<dyn UsersRepository>,
        crypto: Arc<PasswordCrypto>,
        tokens: TokenService,
    ) -> Self {
        Self {
            users,
            crypto,
            tokens,
        }
    }

    pub fn tokens(&self) -> &TokenService {
        &self.tokens
    }

    /// Create an account. The email defaults to the username and the role
    /// to `Student`.
    pub async fn register(
        &self,
        ctx: &RequestContext,
        credentials: &Credentials,
    ) -> Result<User> {
        credentials.require_complete()?;
        let draft = NewUser::new(
            credentials.username.trim(),
            credentials.role.unwrap_or_default(),
        );
        draft.validate()?;

        if self.users.find_by_username(&draft.username).await?.is_some() {
            return Err(LecternError::Conflict(format!(
                "username {} is taken",
                draft.username
            )));
        }

        let hash = self.crypto.hash_password(&credentials.password)?;
        let user = self.users.create(ctx, &draft, &hash).await?;
        info!(user_id = %user.id, role = %user.role, "registered user");
        Ok(user)
    }

    /// Check credentials and issue a token pair.
    pub async fn login(&self, credentials: &Credentials) -> Result<TokenPair> {
        credentials.require_complete()?;
        let rejected = || {
            LecternError::Unauthenticated("invalid username or password".into())
        };

        let user = self
            .users
            .find_by_username(credentials.username.trim())
            .await?
            .filter(|user| {
                credentials.role.is_none_or(|role| user.role == role)
            })
            .ok_or_else(rejected)?;
        let hash = self
            .users
            .password_hash(user.id)
            .await?
            .ok_or_else(rejected)?;

        if !self.crypto.verify_password(&credentials.password, &hash)? {
            warn!(username = %user.username, "rejected login");
            return Err(rejected());
        }

        self.tokens.issue_pair(user.id, user.role)
    }

    /// Profile of the holder of `access_token`.
    pub async fn me(&self, access_token: &str) -> Result<User> {
        let claims = self.tokens.verify_access(access_token)?;
        self.users.get(claims.user_id()).await?.ok_or_else(|| {
            LecternError::Unauthenticated("account not found".into())
        })
    }

    /// Exchange a refresh token for a new pair.
    pub async fn refresh(&self, refresh_token: &str) -> Result<TokenPair> {
        let claims = self.tokens.verify_refresh(refresh_token)?;
        self.tokens.issue_pair(claims.user_id(), claims.role)
    }

    /// Resolve a strict actor from an access token; unlike
    /// [`RequestContext::from_authorization`] this surfaces the failure.
    pub fn authenticate(&self, access_token: &str) -> Result<RequestContext> {
        let claims = self.tokens.verify_access(access_token)?;
        Ok(RequestContext::for_actor(Actor::new(
            claims.user_id(),
            claims.role,
        )))
    }
}
