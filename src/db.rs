use anyhow::Result;
use bcrypt::{hash, DEFAULT_COST};
use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::postgres::PgPoolOptions;
use sqlx::{Pool, Postgres};

use crate::error::AppResult;

pub type DbPool = Pool<Postgres>;

/// A registered account. `password_hash` only ever holds a bcrypt hash;
/// plaintext never survives the registration boundary.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: i64,
    pub username: String,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub policy_number: Option<String>,
    pub insurance_plan_id: Option<i64>,
    #[serde(skip_serializing)]
    pub created_at: DateTime<Utc>,
}

/// Input for account creation. The password has already been hashed by the
/// time a store sees it.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub username: String,
    pub email: String,
    pub password_hash: String,
    pub policy_number: Option<String>,
}

/// Credential store capability consumed by the gate and the login
/// orchestrator. Backed by Postgres in production and by an in-memory map in
/// the integration tests.
#[async_trait::async_trait]
pub trait UserStore: Send + Sync {
    async fn find_by_username(&self, username: &str) -> AppResult<Option<User>>;

    async fn find_by_email(&self, email: &str) -> AppResult<Option<User>>;

    async fn find_by_policy_number(&self, policy_number: &str) -> AppResult<Option<User>>;

    /// Persist a new account and return it with its assigned id.
    async fn insert(&self, user: NewUser) -> AppResult<User>;
}

pub async fn create_pool(database_url: &str) -> Result<DbPool> {
    let pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(database_url)
        .await?;
    Ok(pool)
}

pub struct PgUserStore {
    pool: DbPool,
}

impl PgUserStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait::async_trait]
impl UserStore for PgUserStore {
    async fn find_by_username(&self, username: &str) -> AppResult<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, username, email, password_hash, policy_number, insurance_plan_id, created_at
            FROM users
            WHERE username = $1
            "#,
        )
        .bind(username)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    async fn find_by_email(&self, email: &str) -> AppResult<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, username, email, password_hash, policy_number, insurance_plan_id, created_at
            FROM users
            WHERE email = $1
            "#,
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    async fn find_by_policy_number(&self, policy_number: &str) -> AppResult<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, username, email, password_hash, policy_number, insurance_plan_id, created_at
            FROM users
            WHERE policy_number = $1
            "#,
        )
        .bind(policy_number)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    async fn insert(&self, user: NewUser) -> AppResult<User> {
        let user = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (username, email, password_hash, policy_number)
            VALUES ($1, $2, $3, $4)
            RETURNING id, username, email, password_hash, policy_number, insurance_plan_id, created_at
            "#,
        )
        .bind(&user.username)
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(&user.policy_number)
        .fetch_one(&self.pool)
        .await?;

        Ok(user)
    }
}

/// bcrypt-hash a plaintext password for storage.
pub fn hash_password(password: &str) -> Result<String, bcrypt::BcryptError> {
    hash(password, DEFAULT_COST)
}

/// Compare a presented password against a stored hash.
pub fn verify_password(user: &User, password: &str) -> Result<bool, bcrypt::BcryptError> {
    bcrypt::verify(password, &user.password_hash)
}
