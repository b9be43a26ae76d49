use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};

use crate::error::AppResult;
use crate::models::{Movie, User};
use crate::services::{AddOutcome, MovieChanges, RemoveOutcome};

use super::AppState;

// Request/Response types

#[derive(Debug, Deserialize)]
pub struct CreateUserRequest {
    pub name: String,
}

#[derive(Debug, Deserialize)]
pub struct RenameUserRequest {
    pub name: String,
}

#[derive(Debug, Deserialize)]
pub struct AddMovieRequest {
    /// Free-text title, resolved through the metadata lookup
    pub title: String,
}

/// Replacement fields for a movie update; year and rating arrive as text
/// from the form layer and are validated by the collection manager
#[derive(Debug, Deserialize)]
pub struct UpdateMovieRequest {
    pub title: String,
    pub director: String,
    pub publication_year: String,
    pub rating: String,
}

impl From<UpdateMovieRequest> for MovieChanges {
    fn from(request: UpdateMovieRequest) -> Self {
        Self {
            title: request.title,
            director: request.director,
            publication_year: request.publication_year,
            rating: request.rating,
        }
    }
}

/// Human-readable status message, displayed verbatim by the client
#[derive(Debug, Serialize)]
pub struct StatusResponse {
    pub message: String,
}

impl StatusResponse {
    fn new(message: String) -> Json<Self> {
        Json(Self { message })
    }
}

// Handlers

/// Health check endpoint
pub async fn health_check() -> StatusCode {
    StatusCode::OK
}

/// Get all users
pub async fn get_users(State(state): State<AppState>) -> AppResult<Json<Vec<User>>> {
    let users = state.collection.list_users().await?;
    Ok(Json(users))
}

/// Create a new user
pub async fn create_user(
    State(state): State<AppState>,
    Json(request): Json<CreateUserRequest>,
) -> AppResult<(StatusCode, Json<User>)> {
    let user = state.collection.add_user(&request.name).await?;
    Ok((StatusCode::CREATED, Json(user)))
}

/// Get a single user by id
pub async fn get_user(
    State(state): State<AppState>,
    Path(user_id): Path<i64>,
) -> AppResult<Json<User>> {
    let user = state.collection.get_user(user_id).await?;
    Ok(Json(user))
}

/// Change a username
pub async fn rename_user(
    State(state): State<AppState>,
    Path(user_id): Path<i64>,
    Json(request): Json<RenameUserRequest>,
) -> AppResult<Json<User>> {
    let user = state.collection.rename_user(user_id, &request.name).await?;
    Ok(Json(user))
}

/// Delete a user and detach it from all movies
pub async fn delete_user(
    State(state): State<AppState>,
    Path(user_id): Path<i64>,
) -> AppResult<Json<StatusResponse>> {
    state.collection.delete_user(user_id).await?;
    Ok(StatusResponse::new(format!(
        "User {} successfully deleted.",
        user_id
    )))
}

/// Get a user's favorite movies
pub async fn get_user_movies(
    State(state): State<AppState>,
    Path(user_id): Path<i64>,
) -> AppResult<Json<Vec<Movie>>> {
    let movies = state.collection.get_user_movies(user_id).await?;
    Ok(Json(movies))
}

/// Resolve a title and add the movie to a user's favorites
pub async fn add_movie(
    State(state): State<AppState>,
    Path(user_id): Path<i64>,
    Json(request): Json<AddMovieRequest>,
) -> AppResult<(StatusCode, Json<StatusResponse>)> {
    let outcome = state
        .collection
        .add_movie_to_user(user_id, &request.title)
        .await?;

    let (status, message) = match outcome {
        AddOutcome::Added(movie) => (
            StatusCode::CREATED,
            format!("Movie {} successfully added to your favorites.", movie.title),
        ),
        AddOutcome::AlreadyListed(movie) => (
            StatusCode::OK,
            format!("Movie {} is already in your list.", movie.title),
        ),
        AddOutcome::TitleNotFound(title) => (
            StatusCode::NOT_FOUND,
            format!("Title {} was not found.", title),
        ),
    };

    Ok((status, StatusResponse::new(message)))
}

/// Update a movie for one user (copy-on-write; other users are unaffected)
pub async fn update_movie(
    State(state): State<AppState>,
    Path((user_id, movie_id)): Path<(i64, i64)>,
    Json(request): Json<UpdateMovieRequest>,
) -> AppResult<Json<StatusResponse>> {
    let movie = state
        .collection
        .update_movie(user_id, movie_id, request.into())
        .await?;
    Ok(StatusResponse::new(format!(
        "Movie {} successfully updated.",
        movie.title
    )))
}

/// Remove a movie from a user's favorites
pub async fn remove_movie(
    State(state): State<AppState>,
    Path((user_id, movie_id)): Path<(i64, i64)>,
) -> AppResult<(StatusCode, Json<StatusResponse>)> {
    let outcome = state
        .collection
        .remove_movie_from_favourites(user_id, movie_id)
        .await?;

    let (status, message) = match outcome {
        RemoveOutcome::Removed { movie, .. } => (
            StatusCode::OK,
            format!("Movie {} removed from your favorites.", movie.title),
        ),
        RemoveOutcome::NotListed => (
            StatusCode::NOT_FOUND,
            "Movie is not in your favorites.".to_string(),
        ),
    };

    Ok((status, StatusResponse::new(message)))
}

/// Get all movies
pub async fn get_movies(State(state): State<AppState>) -> AppResult<Json<Vec<Movie>>> {
    let movies = state.collection.list_movies().await?;
    Ok(Json(movies))
}

/// Get a single movie by id
pub async fn get_movie(
    State(state): State<AppState>,
    Path(movie_id): Path<i64>,
) -> AppResult<Json<Movie>> {
    let movie = state.collection.get_movie(movie_id).await?;
    Ok(Json(movie))
}
