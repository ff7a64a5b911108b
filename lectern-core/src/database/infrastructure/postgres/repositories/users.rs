use async_trait::async_trait;
use lectern_model::{NewUser, Page, PageRequest, User, UserID, UserPatch};
use sqlx::PgPool;
use tracing::info;
use uuid::Uuid;

use super::{
    limit_offset, nullable_binds, total_from, update_binds, uuid_of,
};
use crate::{
    audit::AuditInterceptor,
    context::RequestContext,
    database::{
        infrastructure::postgres::rows::{UserRow, user_columns},
        ports::UsersRepository,
    },
    error::{LecternError, Result},
};

/// PostgreSQL-backed implementation of the `UsersRepository` port.
#[derive(Clone, Debug)]
pub struct PostgresUsersRepository {
    pool: PgPool,
    audit: AuditInterceptor,
}

impl PostgresUsersRepository {
    pub fn new(pool: PgPool, audit: AuditInterceptor) -> Self {
        Self { pool, audit }
    }

    async fn fetch(
        &self,
        id: UserID,
        include_deleted: bool,
    ) -> Result<Option<User>> {
        let row: Option<UserRow> = sqlx::query_as(concat!(
            "SELECT ",
            user_columns!(),
            " FROM users WHERE id = $1 AND ($2 OR NOT is_deleted)"
        ))
        .bind(id.to_uuid())
        .bind(include_deleted)
        .fetch_optional(&self.pool)
        .await?;

        row.map(|row| row.into_model(self.audit.offset())).transpose()
    }
}

#[async_trait]
impl UsersRepository for PostgresUsersRepository {
    async fn create(
        &self,
        ctx: &RequestContext,
        draft: &NewUser,
        password_hash: &str,
    ) -> Result<User> {
        self.audit
            .timed("users.create", async {
                let stamp = self.audit.on_create(ctx, draft)?;
                let row: UserRow = sqlx::query_as(concat!(
                    "INSERT INTO users (id, username, email, password_hash, \
                     role, full_name, created_at, created_by) \
                     VALUES ($1, $2, $3, $4, $5, $6, $7, $8) RETURNING ",
                    user_columns!()
                ))
                .bind(stamp.id)
                .bind(&draft.username)
                .bind(&draft.email)
                .bind(password_hash)
                .bind(draft.role.as_str())
                .bind(&draft.full_name)
                .bind(stamp.audit.created_at)
                .bind(uuid_of(stamp.audit.created_by))
                .fetch_one(&self.pool)
                .await
                .map_err(|err| match LecternError::from(err) {
                    LecternError::Conflict(_) => LecternError::Conflict(
                        format!("username {} is taken", draft.username),
                    ),
                    other => other,
                })?;

                let user = row.into_model(self.audit.offset())?;
                info!(
                    user_id = %user.id,
                    username = %user.username,
                    "created user"
                );
                Ok(user)
            })
            .await
    }

    async fn get(&self, id: UserID) -> Result<Option<User>> {
        self.fetch(id, false).await
    }

    async fn get_including_deleted(&self, id: UserID) -> Result<Option<User>> {
        self.fetch(id, true).await
    }

    async fn find_by_username(&self, username: &str) -> Result<Option<User>> {
        let row: Option<UserRow> = sqlx::query_as(concat!(
            "SELECT ",
            user_columns!(),
            " FROM users WHERE username = $1 AND NOT is_deleted"
        ))
        .bind(username)
        .fetch_optional(&self.pool)
        .await?;

        row.map(|row| row.into_model(self.audit.offset())).transpose()
    }

    async fn password_hash(&self, id: UserID) -> Result<Option<String>> {
        let hash: Option<String> = sqlx::query_scalar(
            "SELECT password_hash FROM users WHERE id = $1 AND NOT is_deleted",
        )
        .bind(id.to_uuid())
        .fetch_optional(&self.pool)
        .await?;
        Ok(hash)
    }

    async fn list(&self, page: PageRequest) -> Result<Page<User>> {
        let (limit, offset) = limit_offset(page);
        let rows = sqlx::query_as::<_, UserRow>(concat!(
            "SELECT ",
            user_columns!(),
            " FROM users WHERE NOT is_deleted \
             ORDER BY created_at DESC, id DESC LIMIT $1 OFFSET $2"
        ))
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool);
        let count = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM users WHERE NOT is_deleted",
        )
        .fetch_one(&self.pool);

        let (rows, count) = tokio::try_join!(rows, count)?;
        let tz = self.audit.offset();
        let items = rows
            .into_iter()
            .map(|row| row.into_model(tz))
            .collect::<Result<Vec<_>>>()?;
        Ok(Page::new(items, page, total_from(count)))
    }

    async fn update(
        &self,
        ctx: &RequestContext,
        id: UserID,
        patch: &UserPatch,
    ) -> Result<User> {
        self.audit
            .timed("users.update", async {
                let (updated_at, updated_by) =
                    update_binds(self.audit.on_update(ctx));
                let full_name = nullable_binds(&patch.full_name);
                let row: Option<UserRow> = sqlx::query_as(concat!(
                    "UPDATE users SET \
                     email = COALESCE($2, email), \
                     full_name = CASE WHEN $3 THEN $4 ELSE full_name END, \
                     role = COALESCE($5, role), \
                     updated_at = COALESCE($6, updated_at), \
                     updated_by = COALESCE($7, updated_by) \
                     WHERE id = $1 AND NOT is_deleted RETURNING ",
                    user_columns!()
                ))
                .bind(id.to_uuid())
                .bind(&patch.email)
                .bind(full_name.0)
                .bind(full_name.1)
                .bind(patch.role.map(|role| role.as_str()))
                .bind(updated_at)
                .bind(updated_by)
                .fetch_optional(&self.pool)
                .await?;

                row.ok_or_else(|| LecternError::not_found("user", id))?
                    .into_model(self.audit.offset())
            })
            .await
    }

    async fn soft_delete(&self, ctx: &RequestContext, id: UserID) -> Result<()> {
        self.audit
            .timed("users.soft_delete", async {
                let stamp = self.audit.on_delete(ctx);
                let deleted: Option<Uuid> = sqlx::query_scalar(
                    "UPDATE users SET is_deleted = TRUE, deleted_at = $2, \
                     deleted_by = $3 WHERE id = $1 AND NOT is_deleted \
                     RETURNING id",
                )
                .bind(id.to_uuid())
                .bind(stamp.at)
                .bind(uuid_of(stamp.by))
                .fetch_optional(&self.pool)
                .await?;

                deleted
                    .map(|_| ())
                    .ok_or_else(|| LecternError::not_found("user", id))
            })
            .await
    }
}
