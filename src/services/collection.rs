/// The collection manager
///
/// Orchestrates title lookups, movie-row dedup across users, the user↔movie
/// association, copy-on-write updates and orphan garbage collection. All
/// business rules live here; the store and the lookup are trait objects.
use std::sync::Arc;

use crate::{
    db::{DetachResult, FavoritesStore},
    error::{AppError, AppResult},
    models::{Movie, NewMovie, User},
    services::lookup::MovieLookup,
};

/// Result of an add-to-favorites request
///
/// Already-listed and unknown-title are expected states of a well-formed
/// request, not failures, so they are outcome variants rather than errors.
#[derive(Debug, Clone, PartialEq)]
pub enum AddOutcome {
    Added(Movie),
    AlreadyListed(Movie),
    TitleNotFound(String),
}

/// Result of a remove-from-favorites request
#[derive(Debug, Clone, PartialEq)]
pub enum RemoveOutcome {
    Removed {
        movie: Movie,
        /// True when the user held the last reference and the movie row was
        /// garbage-collected along with the association
        movie_deleted: bool,
    },
    NotListed,
}

/// Replacement field values for a copy-on-write movie update
///
/// Year and rating arrive as text from the form layer and are coerced here;
/// coercion failure aborts the operation before any store access.
#[derive(Debug, Clone)]
pub struct MovieChanges {
    pub title: String,
    pub director: String,
    pub publication_year: String,
    pub rating: String,
}

pub struct CollectionService {
    store: Arc<dyn FavoritesStore>,
    lookup: Arc<dyn MovieLookup>,
}

impl CollectionService {
    pub fn new(store: Arc<dyn FavoritesStore>, lookup: Arc<dyn MovieLookup>) -> Self {
        Self { store, lookup }
    }

    pub async fn list_users(&self) -> AppResult<Vec<User>> {
        self.store.list_users().await
    }

    pub async fn get_user(&self, user_id: i64) -> AppResult<User> {
        self.store
            .get_user(user_id)
            .await?
            .ok_or(AppError::UserNotFound(user_id))
    }

    pub async fn add_user(&self, name: &str) -> AppResult<User> {
        let name = name.trim();
        if name.is_empty() {
            return Err(AppError::InvalidInput(
                "Username must not be empty".to_string(),
            ));
        }
        if self.store.find_user_by_name(name).await?.is_some() {
            return Err(AppError::UsernameTaken(name.to_string()));
        }
        self.store.insert_user(name).await
    }

    /// Rarely used extension: change a username, same rules as creation
    pub async fn rename_user(&self, user_id: i64, new_name: &str) -> AppResult<User> {
        let new_name = new_name.trim();
        if new_name.is_empty() {
            return Err(AppError::InvalidInput(
                "Username must not be empty".to_string(),
            ));
        }
        if self.store.find_user_by_name(new_name).await?.is_some() {
            return Err(AppError::UsernameTaken(new_name.to_string()));
        }
        self.store.rename_user(user_id, new_name).await
    }

    /// Deletes the user, detaching it from every movie; movies left without
    /// references are garbage-collected in the same transaction
    pub async fn delete_user(&self, user_id: i64) -> AppResult<()> {
        self.get_user(user_id).await?;
        self.store.delete_user(user_id).await
    }

    pub async fn list_movies(&self) -> AppResult<Vec<Movie>> {
        self.store.list_movies().await
    }

    pub async fn get_movie(&self, movie_id: i64) -> AppResult<Movie> {
        self.store
            .get_movie(movie_id)
            .await?
            .ok_or(AppError::MovieNotFound(movie_id))
    }

    pub async fn get_user_movies(&self, user_id: i64) -> AppResult<Vec<Movie>> {
        self.get_user(user_id).await?;
        self.store.movies_for_user(user_id).await
    }

    /// Resolves a free-text title through the lookup and adds the movie to
    /// the user's favorites
    ///
    /// Movie rows are shared: if another user already stored the canonical
    /// title, this user is attached to the existing row instead of a
    /// duplicate being created. Lookup errors (transport, timeout, malformed
    /// response) degrade to the not-found outcome; the cause is logged.
    pub async fn add_movie_to_user(&self, user_id: i64, title: &str) -> AppResult<AddOutcome> {
        let title = title.trim();
        if title.is_empty() {
            return Err(AppError::InvalidInput(
                "Movie title must not be empty".to_string(),
            ));
        }
        self.get_user(user_id).await?;

        let facts = match self.lookup.lookup(title).await {
            Ok(Some(facts)) => facts,
            Ok(None) => return Ok(AddOutcome::TitleNotFound(title.to_string())),
            Err(e) => {
                tracing::warn!(
                    error = %e,
                    provider = self.lookup.name(),
                    query = %title,
                    "Lookup failed, treating title as not found"
                );
                return Ok(AddOutcome::TitleNotFound(title.to_string()));
            }
        };

        if let Some(existing) = self.store.find_movie_by_title(&facts.title).await? {
            if self.store.is_favorite(user_id, existing.id).await? {
                return Ok(AddOutcome::AlreadyListed(existing));
            }
            self.store.attach_movie(user_id, existing.id).await?;
            tracing::info!(user_id, movie_id = existing.id, "Attached existing movie");
            return Ok(AddOutcome::Added(existing));
        }

        let publication_year = match parse_year_text(&facts.year) {
            Some(year) => year,
            None => {
                tracing::warn!(year = %facts.year, "Lookup returned unparseable year");
                return Ok(AddOutcome::TitleNotFound(title.to_string()));
            }
        };
        let rating = facts.rating.as_deref().and_then(parse_rating_text);

        let movie = self
            .store
            .insert_movie_for_user(
                user_id,
                &NewMovie {
                    title: facts.title,
                    director: facts.director,
                    publication_year,
                    rating,
                    poster_url: facts.poster_url,
                },
            )
            .await?;
        tracing::info!(user_id, movie_id = movie.id, title = %movie.title, "Stored new movie");

        Ok(AddOutcome::Added(movie))
    }

    /// Copy-on-write update of one user's view of a movie
    ///
    /// The existing row is never mutated. The user's association is
    /// repointed to a freshly inserted row carrying the new fields and the
    /// preserved poster; the old row survives exactly as long as another
    /// user still references it.
    pub async fn update_movie(
        &self,
        user_id: i64,
        movie_id: i64,
        changes: MovieChanges,
    ) -> AppResult<Movie> {
        let title = changes.title.trim();
        if title.is_empty() {
            return Err(AppError::InvalidInput(
                "Movie title must not be empty".to_string(),
            ));
        }
        let director = changes.director.trim();
        if director.is_empty() {
            return Err(AppError::InvalidInput(
                "Director must not be empty".to_string(),
            ));
        }
        let publication_year: i32 = changes.publication_year.trim().parse().map_err(|_| {
            AppError::InvalidInput(format!(
                "Publication year must be an integer, got '{}'",
                changes.publication_year
            ))
        })?;
        let rating: f64 = changes.rating.trim().parse().map_err(|_| {
            AppError::InvalidInput(format!("Rating must be a number, got '{}'", changes.rating))
        })?;

        self.get_user(user_id).await?;
        let old = self.get_movie(movie_id).await?;

        let movie = self
            .store
            .replace_movie_for_user(
                user_id,
                movie_id,
                &NewMovie {
                    title: title.to_string(),
                    director: director.to_string(),
                    publication_year,
                    rating: Some(rating),
                    poster_url: old.poster_url,
                },
            )
            .await?;
        tracing::info!(
            user_id,
            old_movie_id = movie_id,
            new_movie_id = movie.id,
            "Replaced movie for user"
        );

        Ok(movie)
    }

    /// Removes a movie from the user's favorites; the movie row itself is
    /// deleted only once no user references it
    pub async fn remove_movie_from_favourites(
        &self,
        user_id: i64,
        movie_id: i64,
    ) -> AppResult<RemoveOutcome> {
        self.get_user(user_id).await?;
        let movie = self.get_movie(movie_id).await?;

        match self.store.detach_movie(user_id, movie_id).await? {
            DetachResult::NotListed => Ok(RemoveOutcome::NotListed),
            DetachResult::Detached { movie_deleted } => {
                Ok(RemoveOutcome::Removed {
                    movie,
                    movie_deleted,
                })
            }
        }
    }
}

/// Extracts the leading year from lookup year text ("2010", "2010–2014")
fn parse_year_text(text: &str) -> Option<i32> {
    let digits: String = text
        .trim()
        .chars()
        .take_while(|c| c.is_ascii_digit())
        .collect();
    digits.parse().ok()
}

/// Extracts the numeric value from rating text shaped like "8.8/10"
fn parse_rating_text(text: &str) -> Option<f64> {
    text.split('/').next()?.trim().parse().ok()
}
