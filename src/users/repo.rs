use async_trait::async_trait;
use sqlx::PgPool;
use thiserror::Error;

use super::repo_types::{NewUser, UniqueField, User};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("{0} already taken")]
    Duplicate(UniqueField),

    #[error("user {0} does not exist")]
    Missing(i64),

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Keyed persistence for user records.
///
/// Implementations must reject an insert or update that would break the
/// uniqueness of `username`, `email` or `token` with [`StoreError::Duplicate`],
/// atomically with respect to concurrent writers.
#[async_trait]
pub trait UserStore: Send + Sync {
    async fn insert(&self, new_user: NewUser) -> StoreResult<User>;
    async fn find_by_id(&self, id: i64) -> StoreResult<Option<User>>;
    async fn find_by_username(&self, username: &str) -> StoreResult<Option<User>>;
    async fn find_by_email(&self, email: &str) -> StoreResult<Option<User>>;
    /// Writes back the mutable columns (`username`, `birthdate`, `status`).
    async fn update(&self, user: &User) -> StoreResult<User>;
    async fn list(&self) -> StoreResult<Vec<User>>;
}

const USER_COLUMNS: &str = "id, username, email, password, token, status, \
                            creation_date, registration_date, birthdate";

#[derive(Clone)]
pub struct PgUserStore {
    db: PgPool,
}

impl PgUserStore {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    async fn find_one_by(&self, column: &str, value: &str) -> StoreResult<Option<User>> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE {column} = $1");
        let user = sqlx::query_as::<_, User>(&sql)
            .bind(value)
            .fetch_optional(&self.db)
            .await?;
        Ok(user)
    }
}

/// Column guarded by a named unique constraint from the `users` migration.
fn unique_field(constraint: Option<&str>) -> Option<UniqueField> {
    match constraint? {
        "users_username_key" => Some(UniqueField::Username),
        "users_email_key" => Some(UniqueField::Email),
        "users_token_key" => Some(UniqueField::Token),
        _ => None,
    }
}

fn map_unique_violation(err: sqlx::Error) -> StoreError {
    if let sqlx::Error::Database(db_err) = &err {
        if db_err.is_unique_violation() {
            if let Some(field) = unique_field(db_err.constraint()) {
                return StoreError::Duplicate(field);
            }
        }
    }
    StoreError::Database(err)
}

#[async_trait]
impl UserStore for PgUserStore {
    async fn insert(&self, new_user: NewUser) -> StoreResult<User> {
        let sql = format!(
            r#"
            INSERT INTO users (username, email, password, token, status, creation_date, registration_date)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING {USER_COLUMNS}
            "#
        );
        sqlx::query_as::<_, User>(&sql)
            .bind(&new_user.username)
            .bind(&new_user.email)
            .bind(&new_user.password)
            .bind(&new_user.token)
            .bind(new_user.status)
            .bind(new_user.creation_date)
            .bind(&new_user.registration_date)
            .fetch_one(&self.db)
            .await
            .map_err(map_unique_violation)
    }

    async fn find_by_id(&self, id: i64) -> StoreResult<Option<User>> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1");
        let user = sqlx::query_as::<_, User>(&sql)
            .bind(id)
            .fetch_optional(&self.db)
            .await?;
        Ok(user)
    }

    async fn find_by_username(&self, username: &str) -> StoreResult<Option<User>> {
        self.find_one_by("username", username).await
    }

    async fn find_by_email(&self, email: &str) -> StoreResult<Option<User>> {
        self.find_one_by("email", email).await
    }

    async fn update(&self, user: &User) -> StoreResult<User> {
        let sql = format!(
            r#"
            UPDATE users
               SET username = $2, birthdate = $3, status = $4
             WHERE id = $1
            RETURNING {USER_COLUMNS}
            "#
        );
        sqlx::query_as::<_, User>(&sql)
            .bind(user.id)
            .bind(&user.username)
            .bind(&user.birthdate)
            .bind(user.status)
            .fetch_optional(&self.db)
            .await
            .map_err(map_unique_violation)?
            .ok_or(StoreError::Missing(user.id))
    }

    async fn list(&self) -> StoreResult<Vec<User>> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users ORDER BY id ASC");
        let users = sqlx::query_as::<_, User>(&sql).fetch_all(&self.db).await?;
        Ok(users)
    }
}
