use anyhow::{Context, Result};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set,
    SqlErr, TransactionTrait,
};
use tokio::task;

use crate::entities::{army_lists, prelude::*, users};
use crate::models::user::UserRef;

/// User data returned from repository (without sensitive password hash)
#[derive(Debug, Clone)]
pub struct User {
    pub id: i32,
    pub username: String,
    pub admin: bool,
    pub created_at: String,
}

impl From<users::Model> for User {
    fn from(model: users::Model) -> Self {
        Self {
            id: model.id,
            username: model.username,
            admin: model.admin,
            created_at: model.created_at,
        }
    }
}

pub struct UserRepository {
    conn: DatabaseConnection,
}

impl UserRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    /// Get user by username (exact, case-sensitive)
    pub async fn get_by_username(&self, username: &str) -> Result<Option<User>> {
        let user = Users::find()
            .filter(users::Column::Username.eq(username))
            .one(&self.conn)
            .await
            .context("Failed to query user by username")?;

        Ok(user.map(User::from))
    }

    pub async fn get_by_id(&self, id: i32) -> Result<Option<User>> {
        let user = Users::find_by_id(id)
            .one(&self.conn)
            .await
            .context("Failed to query user by ID")?;

        Ok(user.map(User::from))
    }

    pub async fn list_all(&self) -> Result<Vec<User>> {
        let rows = Users::find()
            .order_by_asc(users::Column::Id)
            .all(&self.conn)
            .await
            .context("Failed to list users")?;

        Ok(rows.into_iter().map(User::from).collect())
    }

    /// Inserts a new non-admin user. Returns `None` when the username is taken,
    /// including when a concurrent registration wins the unique index.
    pub async fn create(&self, username: &str, password_hash: String) -> Result<Option<User>> {
        let active = users::ActiveModel {
            username: Set(username.to_string()),
            password_hash: Set(password_hash),
            admin: Set(false),
            created_at: Set(crate::db::timestamp()),
            ..Default::default()
        };

        match active.insert(&self.conn).await {
            Ok(model) => Ok(Some(User::from(model))),
            Err(e) if matches!(e.sql_err(), Some(SqlErr::UniqueConstraintViolation(_))) => Ok(None),
            Err(e) => Err(e).context("Failed to insert user"),
        }
    }

    /// Verify password for a user and return it when the password matches.
    /// Note: bcrypt is CPU-intensive, so the comparison runs on a blocking thread.
    ///
    /// Unknown usernames are checked against `dummy_hash` so both failure
    /// paths cost one bcrypt verification.
    pub async fn verify_password(
        &self,
        username: &str,
        password: &str,
        dummy_hash: &str,
    ) -> Result<Option<User>> {
        let user = Users::find()
            .filter(users::Column::Username.eq(username))
            .one(&self.conn)
            .await
            .context("Failed to query user for password verification")?;

        let password_hash = user
            .as_ref()
            .map_or_else(|| dummy_hash.to_string(), |u| u.password_hash.clone());
        let password = password.to_string();

        let is_valid = task::spawn_blocking(move || bcrypt::verify(password, &password_hash))
            .await
            .context("Password verification task panicked")?
            .context("Stored password hash is malformed")?;

        Ok(user.filter(|_| is_valid).map(User::from))
    }

    /// Grant or revoke the admin flag. Returns false if the user does not exist.
    pub async fn set_admin(&self, username: &str, admin: bool) -> Result<bool> {
        let result = Users::update_many()
            .col_expr(users::Column::Admin, sea_orm::sea_query::Expr::value(admin))
            .filter(users::Column::Username.eq(username))
            .exec(&self.conn)
            .await
            .context("Failed to update admin flag")?;

        Ok(result.rows_affected > 0)
    }

    /// Delete a user together with every army list they own.
    pub async fn delete(&self, target: &UserRef) -> Result<bool> {
        let txn = self.conn.begin().await?;

        let user = match target {
            UserRef::Username(name) => {
                Users::find()
                    .filter(users::Column::Username.eq(name.as_str()))
                    .one(&txn)
                    .await?
            }
            UserRef::Id(id) => Users::find_by_id(*id).one(&txn).await?,
        };

        let Some(user) = user else {
            return Ok(false);
        };

        ArmyLists::delete_many()
            .filter(army_lists::Column::UserId.eq(user.id))
            .exec(&txn)
            .await?;

        let result = Users::delete_by_id(user.id).exec(&txn).await?;

        txn.commit().await?;
        Ok(result.rows_affected > 0)
    }
}

/// Hash a password with bcrypt at the given cost on a blocking thread.
pub async fn hash_password(password: &str, cost: u32) -> Result<String> {
    let password = password.to_string();
    task::spawn_blocking(move || bcrypt::hash(password, cost))
        .await
        .context("Password hashing task panicked")?
        .context("Failed to hash password")
}
