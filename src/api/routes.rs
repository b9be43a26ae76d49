use axum::{
    routing::{get, put},
    Router,
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use super::handlers;
use super::AppState;

/// Creates the main API router with all routes
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(handlers::health_check))
        // Users
        .route("/users", get(handlers::get_users).post(handlers::create_user))
        .route(
            "/users/:user_id",
            get(handlers::get_user)
                .put(handlers::rename_user)
                .delete(handlers::delete_user),
        )
        // Favorites
        .route(
            "/users/:user_id/movies",
            get(handlers::get_user_movies).post(handlers::add_movie),
        )
        .route(
            "/users/:user_id/movies/:movie_id",
            put(handlers::update_movie).delete(handlers::remove_movie),
        )
        // Movies
        .route("/movies", get(handlers::get_movies))
        .route("/movies/:movie_id", get(handlers::get_movie))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
