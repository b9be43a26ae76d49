use serde::{Deserialize, Serialize};

/// A registered user of the application
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, sqlx::FromRow)]
pub struct User {
    /// Store-assigned identifier
    pub id: i64,
    /// Display name, unique across all users (case-sensitive)
    pub name: String,
}

/// A movie row, shared between all users that favorited the same title
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, sqlx::FromRow)]
pub struct Movie {
    /// Store-assigned identifier
    pub id: i64,
    pub title: String,
    pub director: String,
    pub publication_year: i32,
    /// Lookup services may not supply a rating
    pub rating: Option<f64>,
    /// Opaque poster URL, if the lookup supplied one
    pub poster_url: Option<String>,
}

/// Field values for a movie row that has not been inserted yet
///
/// Used both when a lookup result is first stored and when a copy-on-write
/// update creates a replacement row.
#[derive(Debug, Clone, PartialEq)]
pub struct NewMovie {
    pub title: String,
    pub director: String,
    pub publication_year: i32,
    pub rating: Option<f64>,
    pub poster_url: Option<String>,
}
