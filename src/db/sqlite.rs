use std::str::FromStr;

use sqlx::{
    migrate::Migrator,
    sqlite::{SqliteConnectOptions, SqlitePoolOptions},
    SqlitePool,
};

use crate::{
    db::{DetachResult, FavoritesStore},
    error::{AppError, AppResult},
    models::{Movie, NewMovie, User},
};

/// Embedded schema migrations, applied on startup
pub static MIGRATOR: Migrator = sqlx::migrate!();

/// Creates a SQLite connection pool and applies pending migrations
///
/// Foreign key enforcement is switched on explicitly; the join table relies
/// on it for cascading association deletes.
pub async fn create_pool(database_url: &str) -> anyhow::Result<SqlitePool> {
    let options = SqliteConnectOptions::from_str(database_url)?
        .create_if_missing(true)
        .foreign_keys(true);

    let pool = SqlitePoolOptions::new()
        .max_connections(5)
        .connect_with(options)
        .await?;

    MIGRATOR.run(&pool).await?;

    Ok(pool)
}

/// SQLite-backed favorites store
///
/// Each mutating composite runs inside one transaction; dropping the
/// transaction on an early error rolls everything back.
#[derive(Clone)]
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

fn map_unique_violation(err: sqlx::Error, name: &str) -> AppError {
    match &err {
        sqlx::Error::Database(db) if db.is_unique_violation() => {
            AppError::UsernameTaken(name.to_string())
        }
        _ => AppError::Database(err),
    }
}

#[async_trait::async_trait]
impl FavoritesStore for SqliteStore {
    async fn list_users(&self) -> AppResult<Vec<User>> {
        let users = sqlx::query_as::<_, User>("SELECT id, name FROM users ORDER BY id")
            .fetch_all(&self.pool)
            .await?;
        Ok(users)
    }

    async fn get_user(&self, user_id: i64) -> AppResult<Option<User>> {
        let user = sqlx::query_as::<_, User>("SELECT id, name FROM users WHERE id = ?")
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(user)
    }

    async fn find_user_by_name(&self, name: &str) -> AppResult<Option<User>> {
        let user = sqlx::query_as::<_, User>("SELECT id, name FROM users WHERE name = ?")
            .bind(name)
            .fetch_optional(&self.pool)
            .await?;
        Ok(user)
    }

    async fn insert_user(&self, name: &str) -> AppResult<User> {
        // The UNIQUE constraint backstops the service-level pre-check; two
        // concurrent inserts of the same name cannot both commit.
        let user =
            sqlx::query_as::<_, User>("INSERT INTO users (name) VALUES (?) RETURNING id, name")
                .bind(name)
                .fetch_one(&self.pool)
                .await
                .map_err(|e| map_unique_violation(e, name))?;
        Ok(user)
    }

    async fn rename_user(&self, user_id: i64, name: &str) -> AppResult<User> {
        let user = sqlx::query_as::<_, User>(
            "UPDATE users SET name = ? WHERE id = ? RETURNING id, name",
        )
        .bind(name)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| map_unique_violation(e, name))?;
        user.ok_or(AppError::UserNotFound(user_id))
    }

    async fn delete_user(&self, user_id: i64) -> AppResult<()> {
        let mut tx = self.pool.begin().await?;

        let movie_ids: Vec<i64> =
            sqlx::query_scalar("SELECT movie_id FROM user_movies WHERE user_id = ?")
                .bind(user_id)
                .fetch_all(&mut *tx)
                .await?;

        // Cascades into user_movies via the foreign key
        sqlx::query("DELETE FROM users WHERE id = ?")
            .bind(user_id)
            .execute(&mut *tx)
            .await?;

        let mut collected = 0u64;
        for movie_id in movie_ids {
            let result = sqlx::query(
                "DELETE FROM movies WHERE id = ?
                 AND NOT EXISTS (SELECT 1 FROM user_movies WHERE movie_id = ?)",
            )
            .bind(movie_id)
            .bind(movie_id)
            .execute(&mut *tx)
            .await?;
            collected += result.rows_affected();
        }

        tx.commit().await?;

        if collected > 0 {
            tracing::info!(user_id, orphans = collected, "Collected orphaned movies after user delete");
        }

        Ok(())
    }

    async fn list_movies(&self) -> AppResult<Vec<Movie>> {
        let movies = sqlx::query_as::<_, Movie>(
            "SELECT id, title, director, publication_year, rating, poster_url
             FROM movies ORDER BY id",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(movies)
    }

    async fn get_movie(&self, movie_id: i64) -> AppResult<Option<Movie>> {
        let movie = sqlx::query_as::<_, Movie>(
            "SELECT id, title, director, publication_year, rating, poster_url
             FROM movies WHERE id = ?",
        )
        .bind(movie_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(movie)
    }

    async fn find_movie_by_title(&self, title: &str) -> AppResult<Option<Movie>> {
        // Case-sensitive exact match; several rows can share a title after
        // copy-on-write updates, any of them satisfies the dedup check
        let movie = sqlx::query_as::<_, Movie>(
            "SELECT id, title, director, publication_year, rating, poster_url
             FROM movies WHERE title = ? LIMIT 1",
        )
        .bind(title)
        .fetch_optional(&self.pool)
        .await?;
        Ok(movie)
    }

    async fn movies_for_user(&self, user_id: i64) -> AppResult<Vec<Movie>> {
        let movies = sqlx::query_as::<_, Movie>(
            "SELECT m.id, m.title, m.director, m.publication_year, m.rating, m.poster_url
             FROM movies m
             JOIN user_movies um ON um.movie_id = m.id
             WHERE um.user_id = ?
             ORDER BY m.id",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(movies)
    }

    async fn is_favorite(&self, user_id: i64, movie_id: i64) -> AppResult<bool> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM user_movies WHERE user_id = ? AND movie_id = ?",
        )
        .bind(user_id)
        .bind(movie_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(count > 0)
    }

    async fn attach_movie(&self, user_id: i64, movie_id: i64) -> AppResult<()> {
        sqlx::query("INSERT INTO user_movies (user_id, movie_id) VALUES (?, ?)")
            .bind(user_id)
            .bind(movie_id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn insert_movie_for_user(&self, user_id: i64, movie: &NewMovie) -> AppResult<Movie> {
        let mut tx = self.pool.begin().await?;

        let inserted = sqlx::query_as::<_, Movie>(
            "INSERT INTO movies (title, director, publication_year, rating, poster_url)
             VALUES (?, ?, ?, ?, ?)
             RETURNING id, title, director, publication_year, rating, poster_url",
        )
        .bind(&movie.title)
        .bind(&movie.director)
        .bind(movie.publication_year)
        .bind(movie.rating)
        .bind(&movie.poster_url)
        .fetch_one(&mut *tx)
        .await?;

        sqlx::query("INSERT INTO user_movies (user_id, movie_id) VALUES (?, ?)")
            .bind(user_id)
            .bind(inserted.id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(inserted)
    }

    async fn detach_movie(&self, user_id: i64, movie_id: i64) -> AppResult<DetachResult> {
        let mut tx = self.pool.begin().await?;

        let deleted = sqlx::query("DELETE FROM user_movies WHERE user_id = ? AND movie_id = ?")
            .bind(user_id)
            .bind(movie_id)
            .execute(&mut *tx)
            .await?
            .rows_affected();

        if deleted == 0 {
            return Ok(DetachResult::NotListed);
        }

        let remaining: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM user_movies WHERE movie_id = ?")
                .bind(movie_id)
                .fetch_one(&mut *tx)
                .await?;

        let movie_deleted = remaining == 0;
        if movie_deleted {
            sqlx::query("DELETE FROM movies WHERE id = ?")
                .bind(movie_id)
                .execute(&mut *tx)
                .await?;
            tracing::info!(movie_id, "Collected orphaned movie");
        }

        tx.commit().await?;
        Ok(DetachResult::Detached { movie_deleted })
    }

    async fn replace_movie_for_user(
        &self,
        user_id: i64,
        old_movie_id: i64,
        movie: &NewMovie,
    ) -> AppResult<Movie> {
        // One transaction for the whole read-modify-write; SQLite's single
        // writer serializes concurrent replacements of a shared row.
        let mut tx = self.pool.begin().await?;

        let deleted = sqlx::query("DELETE FROM user_movies WHERE user_id = ? AND movie_id = ?")
            .bind(user_id)
            .bind(old_movie_id)
            .execute(&mut *tx)
            .await?
            .rows_affected();

        if deleted > 0 {
            let remaining: i64 =
                sqlx::query_scalar("SELECT COUNT(*) FROM user_movies WHERE movie_id = ?")
                    .bind(old_movie_id)
                    .fetch_one(&mut *tx)
                    .await?;
            if remaining == 0 {
                sqlx::query("DELETE FROM movies WHERE id = ?")
                    .bind(old_movie_id)
                    .execute(&mut *tx)
                    .await?;
                tracing::info!(movie_id = old_movie_id, "Collected orphaned movie after update");
            }
        }

        let inserted = sqlx::query_as::<_, Movie>(
            "INSERT INTO movies (title, director, publication_year, rating, poster_url)
             VALUES (?, ?, ?, ?, ?)
             RETURNING id, title, director, publication_year, rating, poster_url",
        )
        .bind(&movie.title)
        .bind(&movie.director)
        .bind(movie.publication_year)
        .bind(movie.rating)
        .bind(&movie.poster_url)
        .fetch_one(&mut *tx)
        .await?;

        sqlx::query("INSERT INTO user_movies (user_id, movie_id) VALUES (?, ?)")
            .bind(user_id)
            .bind(inserted.id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(inserted)
    }
}
