use async_trait::async_trait;
use lectern_model::{NewUser, Page, PageRequest, User, UserID, UserPatch};

use super::{MemoryStore, StoredUser, newest_first, paginate};
use crate::{
    context::RequestContext,
    database::ports::UsersRepository,
    error::{LecternError, Result},
};

#[derive(Debug, Clone)]
pub struct InMemoryUsersRepository {
    store: MemoryStore,
}

impl InMemoryUsersRepository {
    pub fn new(store: MemoryStore) -> Self {
        Self { store }
    }
}

#[async_trait]
impl UsersRepository for InMemoryUsersRepository {
    async fn create(
        &self,
        ctx: &RequestContext,
        draft: &NewUser,
        password_hash: &str,
    ) -> Result<User> {
        let audit = self.store.audit();
        audit
            .timed("users.create", async {
                let stamp = audit.on_create(ctx, draft)?;
                let mut state = self.store.lock().await;
                let taken = state.users.values().any(|row| {
                    row.user.audit.is_live()
                        && row.user.username == draft.username
                });
                if taken {
                    return Err(LecternError::Conflict(format!(
                        "username {} is taken",
                        draft.username
                    )));
                }

                let user = User {
                    id: UserID(stamp.id),
                    username: draft.username.clone(),
                    email: draft.email.clone(),
                    role: draft.role,
                    full_name: draft.full_name.clone(),
                    audit: stamp.audit,
                };
                state.users.insert(
                    user.id,
                    StoredUser {
                        user: user.clone(),
                        password_hash: password_hash.to_string(),
                    },
                );
                Ok(user)
            })
            .await
    }

    async fn get(&self, id: UserID) -> Result<Option<User>> {
        Ok(self
            .get_including_deleted(id)
            .await?
            .filter(|user| user.audit.is_live()))
    }

    async fn get_including_deleted(&self, id: UserID) -> Result<Option<User>> {
        let state = self.store.lock().await;
        Ok(state.users.get(&id).map(|row| row.user.clone()))
    }

    async fn find_by_username(&self, username: &str) -> Result<Option<User>> {
        let state = self.store.lock().await;
        Ok(state
            .users
            .values()
            .find(|row| {
                row.user.audit.is_live() && row.user.username == username
            })
            .map(|row| row.user.clone()))
    }

    async fn password_hash(&self, id: UserID) -> Result<Option<String>> {
        let state = self.store.lock().await;
        Ok(state
            .users
            .get(&id)
            .filter(|row| row.user.audit.is_live())
            .map(|row| row.password_hash.clone()))
    }

    async fn list(&self, page: PageRequest) -> Result<Page<User>> {
        let state = self.store.lock().await;
        let mut rows: Vec<User> = state
            .users
            .values()
            .filter(|row| row.user.audit.is_live())
            .map(|row| row.user.clone())
            .collect();
        newest_first(&mut rows, |user| (user.audit.created_at, user.id.0));
        Ok(paginate(&rows, page))
    }

    async fn update(
        &self,
        ctx: &RequestContext,
        id: UserID,
        patch: &UserPatch,
    ) -> Result<User> {
        let audit = self.store.audit();
        audit
            .timed("users.update", async {
                let mut state = self.store.lock().await;
                let row = state
                    .users
                    .get_mut(&id)
                    .filter(|row| row.user.audit.is_live())
                    .ok_or_else(|| LecternError::not_found("user", id))?;
                patch.apply(&mut row.user);
                if let Some(stamp) = audit.on_update(ctx) {
                    stamp.apply(&mut row.user.audit);
                }
                Ok(row.user.clone())
            })
            .await
    }

    async fn soft_delete(&self, ctx: &RequestContext, id: UserID) -> Result<()> {
        let audit = self.store.audit();
        audit
            .timed("users.soft_delete", async {
                let mut state = self.store.lock().await;
                let row = state
                    .users
                    .get_mut(&id)
                    .filter(|row| row.user.audit.is_live())
                    .ok_or_else(|| LecternError::not_found("user", id))?;
                audit.on_delete(ctx).apply(&mut row.user.audit);
                Ok(())
            })
            .await
    }
}

#[cfg(test)]
mod tests {
    use lectern_model::Role;

    use super::*;
    use crate::context::Actor;

    #[tokio::test]
    async fn usernames_are_unique_among_live_users() {
        let repo = MemoryStore::default().users();
        let ctx = RequestContext::anonymous();
        let first = repo
            .create(&ctx, &NewUser::new("alice", Role::Student), "h1")
            .await
            .unwrap();

        let dup = repo
            .create(&ctx, &NewUser::new("alice", Role::Lecturer), "h2")
            .await;
        assert!(matches!(dup, Err(LecternError::Conflict(_))));

        repo.soft_delete(&ctx, first.id).await.unwrap();
        let again = repo
            .create(&ctx, &NewUser::new("alice", Role::Lecturer), "h3")
            .await
            .unwrap();
        assert_ne!(again.id, first.id);
        assert_eq!(repo.password_hash(again.id).await.unwrap().unwrap(), "h3");
        assert_eq!(repo.password_hash(first.id).await.unwrap(), None);
    }

    #[tokio::test]
    async fn deleted_users_are_hidden_but_retrievable() {
        let repo = MemoryStore::default().users();
        let admin = RequestContext::for_actor(Actor::new(
            UserID::new(),
            Role::Admin,
        ));
        let user = repo
            .create(&admin, &NewUser::new("bob", Role::Student), "h")
            .await
            .unwrap();
        repo.soft_delete(&admin, user.id).await.unwrap();

        assert_eq!(repo.get(user.id).await.unwrap(), None);
        assert_eq!(repo.find_by_username("bob").await.unwrap(), None);
        assert_eq!(repo.list(PageRequest::default()).await.unwrap().total, 0);

        let kept = repo.get_including_deleted(user.id).await.unwrap().unwrap();
        assert!(kept.audit.is_deleted);
        assert_eq!(kept.audit.deleted_by, admin.actor_id());
        assert_eq!(kept.audit.created_at, user.audit.created_at);

        assert!(matches!(
            repo.soft_delete(&admin, user.id).await,
            Err(LecternError::NotFound(_))
        ));
    }
}
