use std::sync::Arc;

use lectern_model::{Page, PageRequest, User, UserID, UserPatch};

use crate::{
    context::RequestContext,
    database::ports::UsersRepository,
    error::{LecternError, Result},
};

/// Account administration. Any signed-in user may read profiles and edit
/// their own; role changes and deletion are admin-only.
#[derive(Clone)]
pub struct UserService {
    users: Arc<dyn UsersRepository>,
}

impl std::fmt::Debug for UserService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UserService").finish_non_exhaustive()
    }
}

impl UserService {
    pub fn new(users: Arc<dyn UsersRepository>) -> Self {
        Self { users }
    }

    pub async fn list(
        &self,
        ctx: &RequestContext,
        page: PageRequest,
    ) -> Result<Page<User>> {
        ctx.require_actor()?;
        self.users.list(page).await
    }

    pub async fn get(&self, ctx: &RequestContext, id: UserID) -> Result<User> {
        ctx.require_actor()?;
        self.users
            .get(id)
            .await?
            .ok_or_else(|| LecternError::not_found("user", id))
    }

    pub async fn update(
        &self,
        ctx: &RequestContext,
        id: UserID,
        patch: &UserPatch,
    ) -> Result<User> {
        let actor = ctx.require_actor()?;
        if actor.id != id && !actor.role.is_admin() {
            return Err(LecternError::Forbidden(
                "only admins can edit other accounts".into(),
            ));
        }
        if patch.role.is_some() && !actor.role.is_admin() {
            return Err(LecternError::Forbidden(
                "only admins can change roles".into(),
            ));
        }
        patch.validate()?;
        self.users.update(ctx, id, patch).await
    }

    pub async fn delete(&self, ctx: &RequestContext, id: UserID) -> Result<()> {
        ctx.require_admin()?;
        self.users.soft_delete(ctx, id).await
    }
}
