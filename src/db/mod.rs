/// Storage backend abstraction
///
/// The collection manager only talks to this trait, keeping the business
/// rules (title dedup, copy-on-write, orphan GC) independent of the storage
/// technology. One concrete implementation exists per backend; currently
/// SQLite via sqlx.
use crate::{
    error::AppResult,
    models::{Movie, NewMovie, User},
};

pub mod sqlite;

pub use sqlite::{create_pool, SqliteStore};

/// Result of removing a (user, movie) association
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DetachResult {
    /// The association did not exist; nothing changed
    NotListed,
    /// The association was removed; `movie_deleted` is true when the movie
    /// row lost its last reference and was garbage-collected with it
    Detached { movie_deleted: bool },
}

/// Trait for favorites storage backends
///
/// Mutating composites (`insert_movie_for_user`, `detach_movie`,
/// `replace_movie_for_user`, `delete_user`) must execute as a single
/// transaction: commit on success, full rollback on any error.
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait FavoritesStore: Send + Sync {
    async fn list_users(&self) -> AppResult<Vec<User>>;

    async fn get_user(&self, user_id: i64) -> AppResult<Option<User>>;

    /// Case-sensitive exact-match lookup, used for username uniqueness
    async fn find_user_by_name(&self, name: &str) -> AppResult<Option<User>>;

    async fn insert_user(&self, name: &str) -> AppResult<User>;

    async fn rename_user(&self, user_id: i64, name: &str) -> AppResult<User>;

    /// Deletes the user, all its associations, and any movie rows left
    /// without references
    async fn delete_user(&self, user_id: i64) -> AppResult<()>;

    async fn list_movies(&self) -> AppResult<Vec<Movie>>;

    async fn get_movie(&self, movie_id: i64) -> AppResult<Option<Movie>>;

    /// Case-sensitive exact-match lookup on the canonical title, used for
    /// the dedup-before-insert check
    async fn find_movie_by_title(&self, title: &str) -> AppResult<Option<Movie>>;

    async fn movies_for_user(&self, user_id: i64) -> AppResult<Vec<Movie>>;

    async fn is_favorite(&self, user_id: i64, movie_id: i64) -> AppResult<bool>;

    /// Associates an existing movie row with a user
    async fn attach_movie(&self, user_id: i64, movie_id: i64) -> AppResult<()>;

    /// Inserts a new movie row and associates it with the user
    async fn insert_movie_for_user(&self, user_id: i64, movie: &NewMovie) -> AppResult<Movie>;

    /// Removes the association and garbage-collects the movie row if this
    /// user held the last reference
    async fn detach_movie(&self, user_id: i64, movie_id: i64) -> AppResult<DetachResult>;

    /// Copy-on-write update: detaches `old_movie_id` from the user (with
    /// orphan GC), inserts a new movie row and attaches it, atomically.
    /// Other users referencing the old row are unaffected.
    async fn replace_movie_for_user(
        &self,
        user_id: i64,
        old_movie_id: i64,
        movie: &NewMovie,
    ) -> AppResult<Movie>;
}
