//! Per-request caller identity.
//!
//! A [`RequestContext`] is built once at the edge (CLI command, HTTP
//! extractor, test) and passed by reference into every repository and
//! service call. Nothing here is global: two concurrent requests can never
//! observe each other's actor.

use lectern_model::{Role, UserID};
use tracing::debug;

use crate::{
    auth::TokenService,
    error::{LecternError, Result},
};

/// The authenticated identity behind a call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Actor {
    pub id: UserID,
    pub role: Role,
}

impl Actor {
    pub fn new(id: UserID, role: Role) -> Self {
        Self { id, role }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RequestContext {
    actor: Option<Actor>,
}

impl RequestContext {
    /// No caller identity. Audit stamps that need an actor stay null.
    pub fn anonymous() -> Self {
        Self { actor: None }
    }

    /// Internal callers (migrations, seeding). Equivalent to anonymous for
    /// stamping purposes.
    pub fn system() -> Self {
        Self::anonymous()
    }

    pub fn for_actor(actor: Actor) -> Self {
        Self { actor: Some(actor) }
    }

    /// Resolve the actor from an `Authorization` header value.
    ///
    /// Missing, malformed, expired or forged credentials all produce an
    /// anonymous context; the failure is logged and never surfaced.
    pub fn from_authorization(
        header: Option<&str>,
        tokens: &TokenService,
    ) -> Self {
        let Some(token) = header.and_then(bearer_token) else {
            if header.is_some() {
                debug!("authorization header is not a bearer credential");
            }
            return Self::anonymous();
        };

        match tokens.verify_access(token) {
            Ok(claims) => {
                Self::for_actor(Actor::new(claims.user_id(), claims.role))
            }
            Err(err) => {
                debug!(error = %err, "ignoring unusable bearer credential");
                Self::anonymous()
            }
        }
    }

    pub fn actor(&self) -> Option<&Actor> {
        self.actor.as_ref()
    }

    pub fn actor_id(&self) -> Option<UserID> {
        self.actor.map(|actor| actor.id)
    }

    pub fn require_actor(&self) -> Result<&Actor> {
        self.actor.as_ref().ok_or_else(|| {
            LecternError::Unauthenticated("authentication required".into())
        })
    }

    pub fn require_admin(&self) -> Result<&Actor> {
        let actor = self.require_actor()?;
        if actor.role.is_admin() {
            Ok(actor)
        } else {
            Err(LecternError::Forbidden("admin role required".into()))
        }
    }
}

/// Extract the token from `Bearer <token>`. The scheme is matched
/// case-insensitively.
pub fn bearer_token(header: &str) -> Option<&str> {
    let (scheme, token) = header.trim().split_once(' ')?;
    if !scheme.eq_ignore_ascii_case("bearer") {
        return None;
    }
    let token = token.trim();
    (!token.is_empty()).then_some(token)
}
