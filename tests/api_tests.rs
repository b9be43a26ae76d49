use std::str::FromStr;
use std::sync::Arc;

use axum_test::TestServer;
use serde_json::json;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};

use moviweb_api::api::{create_router, AppState};
use moviweb_api::db::{sqlite::MIGRATOR, SqliteStore};
use moviweb_api::error::AppResult;
use moviweb_api::services::lookup::{MovieFacts, MovieLookup};

/// Canned lookup standing in for the external metadata service
struct FixtureLookup;

#[async_trait::async_trait]
impl MovieLookup for FixtureLookup {
    async fn lookup(&self, title: &str) -> AppResult<Option<MovieFacts>> {
        // Metadata services resolve titles case-insensitively and return
        // the canonical spelling
        if title.eq_ignore_ascii_case("inception") {
            return Ok(Some(MovieFacts {
                title: "Inception".to_string(),
                year: "2010".to_string(),
                rating: Some("8.8/10".to_string()),
                poster_url: Some("http://example.com/inception.jpg".to_string()),
                director: "Christopher Nolan".to_string(),
            }));
        }
        if title.eq_ignore_ascii_case("pi") {
            return Ok(Some(MovieFacts {
                title: "Pi".to_string(),
                year: "1998".to_string(),
                rating: None,
                poster_url: None,
                director: "Darren Aronofsky".to_string(),
            }));
        }
        Ok(None)
    }

    fn name(&self) -> &'static str {
        "fixture"
    }
}

async fn create_test_server() -> TestServer {
    let options = SqliteConnectOptions::from_str(":memory:")
        .unwrap()
        .foreign_keys(true);
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect_with(options)
        .await
        .unwrap();
    MIGRATOR.run(&pool).await.unwrap();

    let state = AppState::new(Arc::new(SqliteStore::new(pool)), Arc::new(FixtureLookup));
    let app = create_router(state);
    TestServer::new(app).unwrap()
}

async fn create_user(server: &TestServer, name: &str) -> i64 {
    let response = server.post("/users").json(&json!({ "name": name })).await;
    response.assert_status(axum::http::StatusCode::CREATED);
    let user: serde_json::Value = response.json();
    user["id"].as_i64().unwrap()
}

async fn user_movies(server: &TestServer, user_id: i64) -> Vec<serde_json::Value> {
    let response = server.get(&format!("/users/{}/movies", user_id)).await;
    response.assert_status_ok();
    response.json()
}

#[tokio::test]
async fn test_health_check() {
    let server = create_test_server().await;
    let response = server.get("/health").await;
    response.assert_status_ok();
}

#[tokio::test]
async fn test_create_and_get_user() {
    let server = create_test_server().await;

    let user_id = create_user(&server, "alice").await;

    let response = server.get(&format!("/users/{}", user_id)).await;
    response.assert_status_ok();
    let user: serde_json::Value = response.json();
    assert_eq!(user["name"], "alice");
}

#[tokio::test]
async fn test_duplicate_username() {
    let server = create_test_server().await;

    create_user(&server, "bob").await;

    let response = server.post("/users").json(&json!({ "name": "bob" })).await;
    response.assert_status(axum::http::StatusCode::CONFLICT);

    let response = server.get("/users").await;
    let users: Vec<serde_json::Value> = response.json();
    assert_eq!(users.len(), 1);
    assert_eq!(users[0]["name"], "bob");
}

#[tokio::test]
async fn test_empty_username_rejected() {
    let server = create_test_server().await;

    let response = server.post("/users").json(&json!({ "name": "   " })).await;
    response.assert_status(axum::http::StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_add_movie_unknown_title() {
    let server = create_test_server().await;
    let user_id = create_user(&server, "carol").await;

    let response = server
        .post(&format!("/users/{}/movies", user_id))
        .json(&json!({ "title": "Definitely Not A Movie" }))
        .await;

    response.assert_status(axum::http::StatusCode::NOT_FOUND);
    assert!(user_movies(&server, user_id).await.is_empty());
    // No movie row was created either
    let response = server.get("/movies").await;
    let movies: Vec<serde_json::Value> = response.json();
    assert!(movies.is_empty());
}

#[tokio::test]
async fn test_add_movie_end_to_end() {
    let server = create_test_server().await;
    let user_id = create_user(&server, "carol").await;

    let response = server
        .post(&format!("/users/{}/movies", user_id))
        .json(&json!({ "title": "inception" }))
        .await;
    response.assert_status(axum::http::StatusCode::CREATED);

    let movies = user_movies(&server, user_id).await;
    assert_eq!(movies.len(), 1);
    assert_eq!(movies[0]["title"], "Inception");
    assert_eq!(movies[0]["publication_year"], 2010);
    assert_eq!(movies[0]["rating"], 8.8);
    assert_eq!(movies[0]["director"], "Christopher Nolan");
}

#[tokio::test]
async fn test_add_movie_twice_is_reported_distinctly() {
    let server = create_test_server().await;
    let user_id = create_user(&server, "carol").await;

    server
        .post(&format!("/users/{}/movies", user_id))
        .json(&json!({ "title": "Inception" }))
        .await
        .assert_status(axum::http::StatusCode::CREATED);

    let response = server
        .post(&format!("/users/{}/movies", user_id))
        .json(&json!({ "title": "Inception" }))
        .await;
    response.assert_status_ok();
    let body: serde_json::Value = response.json();
    assert!(body["message"]
        .as_str()
        .unwrap()
        .contains("already in your list"));

    assert_eq!(user_movies(&server, user_id).await.len(), 1);
}

#[tokio::test]
async fn test_movie_row_is_shared_between_users() {
    let server = create_test_server().await;
    let alice = create_user(&server, "alice").await;
    let bob = create_user(&server, "bob").await;

    for user_id in [alice, bob] {
        server
            .post(&format!("/users/{}/movies", user_id))
            .json(&json!({ "title": "Inception" }))
            .await
            .assert_status(axum::http::StatusCode::CREATED);
    }

    // One shared row, not two
    let response = server.get("/movies").await;
    let movies: Vec<serde_json::Value> = response.json();
    assert_eq!(movies.len(), 1);
    assert_eq!(
        user_movies(&server, alice).await[0]["id"],
        user_movies(&server, bob).await[0]["id"]
    );
}

#[tokio::test]
async fn test_remove_movie_with_orphan_gc() {
    let server = create_test_server().await;
    let alice = create_user(&server, "alice").await;
    let bob = create_user(&server, "bob").await;

    for user_id in [alice, bob] {
        server
            .post(&format!("/users/{}/movies", user_id))
            .json(&json!({ "title": "Inception" }))
            .await;
    }
    let movie_id = user_movies(&server, alice).await[0]["id"].as_i64().unwrap();

    // Alice removes her reference; Bob still holds one, so the row survives
    server
        .delete(&format!("/users/{}/movies/{}", alice, movie_id))
        .await
        .assert_status_ok();
    server
        .get(&format!("/movies/{}", movie_id))
        .await
        .assert_status_ok();

    // Bob removes the last reference; the row is collected
    server
        .delete(&format!("/users/{}/movies/{}", bob, movie_id))
        .await
        .assert_status_ok();
    server
        .get(&format!("/movies/{}", movie_id))
        .await
        .assert_status(axum::http::StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_remove_movie_not_in_favorites() {
    let server = create_test_server().await;
    let alice = create_user(&server, "alice").await;
    let bob = create_user(&server, "bob").await;

    server
        .post(&format!("/users/{}/movies", alice))
        .json(&json!({ "title": "Inception" }))
        .await;
    let movie_id = user_movies(&server, alice).await[0]["id"].as_i64().unwrap();

    // Bob never added it
    let response = server
        .delete(&format!("/users/{}/movies/{}", bob, movie_id))
        .await;
    response.assert_status(axum::http::StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_update_movie_copy_on_write() {
    let server = create_test_server().await;
    let alice = create_user(&server, "alice").await;
    let bob = create_user(&server, "bob").await;

    for user_id in [alice, bob] {
        server
            .post(&format!("/users/{}/movies", user_id))
            .json(&json!({ "title": "Inception" }))
            .await;
    }
    let shared_id = user_movies(&server, alice).await[0]["id"].as_i64().unwrap();

    let response = server
        .put(&format!("/users/{}/movies/{}", alice, shared_id))
        .json(&json!({
            "title": "Inception",
            "director": "Christopher Nolan",
            "publication_year": "2011",
            "rating": "9.0"
        }))
        .await;
    response.assert_status_ok();

    // Alice sees a new row with her changes and the preserved poster
    let alice_movies = user_movies(&server, alice).await;
    assert_eq!(alice_movies.len(), 1);
    assert_ne!(alice_movies[0]["id"].as_i64().unwrap(), shared_id);
    assert_eq!(alice_movies[0]["publication_year"], 2011);
    assert_eq!(alice_movies[0]["rating"], 9.0);
    assert_eq!(
        alice_movies[0]["poster_url"],
        "http://example.com/inception.jpg"
    );

    // Bob keeps the original row, untouched
    let bob_movies = user_movies(&server, bob).await;
    assert_eq!(bob_movies[0]["id"].as_i64().unwrap(), shared_id);
    assert_eq!(bob_movies[0]["publication_year"], 2010);
}

#[tokio::test]
async fn test_update_movie_bad_field_text() {
    let server = create_test_server().await;
    let alice = create_user(&server, "alice").await;

    server
        .post(&format!("/users/{}/movies", alice))
        .json(&json!({ "title": "Inception" }))
        .await;
    let movie_id = user_movies(&server, alice).await[0]["id"].as_i64().unwrap();

    let response = server
        .put(&format!("/users/{}/movies/{}", alice, movie_id))
        .json(&json!({
            "title": "Inception",
            "director": "Christopher Nolan",
            "publication_year": "twenty-ten",
            "rating": "8.8"
        }))
        .await;
    response.assert_status(axum::http::StatusCode::BAD_REQUEST);

    // Aborted before any mutation
    assert_eq!(
        user_movies(&server, alice).await[0]["publication_year"],
        2010
    );
}

#[tokio::test]
async fn test_movie_without_rating_stores_null() {
    let server = create_test_server().await;
    let alice = create_user(&server, "alice").await;

    server
        .post(&format!("/users/{}/movies", alice))
        .json(&json!({ "title": "Pi" }))
        .await
        .assert_status(axum::http::StatusCode::CREATED);

    let movies = user_movies(&server, alice).await;
    assert_eq!(movies[0]["rating"], serde_json::Value::Null);
    assert_eq!(movies[0]["poster_url"], serde_json::Value::Null);
}

#[tokio::test]
async fn test_delete_user_collects_sole_favorites() {
    let server = create_test_server().await;
    let alice = create_user(&server, "alice").await;
    let bob = create_user(&server, "bob").await;

    server
        .post(&format!("/users/{}/movies", alice))
        .json(&json!({ "title": "Pi" }))
        .await;
    for user_id in [alice, bob] {
        server
            .post(&format!("/users/{}/movies", user_id))
            .json(&json!({ "title": "Inception" }))
            .await;
    }

    server
        .delete(&format!("/users/{}", alice))
        .await
        .assert_status_ok();
    server
        .get(&format!("/users/{}", alice))
        .await
        .assert_status(axum::http::StatusCode::NOT_FOUND);

    // Pi lost its only reference; Inception survives through Bob
    let response = server.get("/movies").await;
    let movies: Vec<serde_json::Value> = response.json();
    assert_eq!(movies.len(), 1);
    assert_eq!(movies[0]["title"], "Inception");
}

#[tokio::test]
async fn test_rename_user() {
    let server = create_test_server().await;
    let alice = create_user(&server, "alice").await;

    let response = server
        .put(&format!("/users/{}", alice))
        .json(&json!({ "name": "alicia" }))
        .await;
    response.assert_status_ok();
    let user: serde_json::Value = response.json();
    assert_eq!(user["name"], "alicia");
}
