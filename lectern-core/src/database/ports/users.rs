use async_trait::async_trait;
use lectern_model::{NewUser, Page, PageRequest, User, UserID, UserPatch};

use crate::{context::RequestContext, error::Result};

#[async_trait]
pub trait UsersRepository: Send + Sync {
    /// Insert a user together with its password hash. A live user with the
    /// same username is a `Conflict`.
    async fn create(
        &self,
        ctx: &RequestContext,
        draft: &NewUser,
        password_hash: &str,
    ) -> Result<User>;

    async fn get(&self, id: UserID) -> Result<Option<User>>;
    async fn get_including_deleted(&self, id: UserID) -> Result<Option<User>>;
    async fn find_by_username(&self, username: &str) -> Result<Option<User>>;

    /// Stored hash of a live user, for the login path only.
    async fn password_hash(&self, id: UserID) -> Result<Option<String>>;

    /// Live users, newest first.
    async fn list(&self, page: PageRequest) -> Result<Page<User>>;

    async fn update(
        &self,
        ctx: &RequestContext,
        id: UserID,
        patch: &UserPatch,
    ) -> Result<User>;

    async fn soft_delete(&self, ctx: &RequestContext, id: UserID) -> Result<()>;
}
