/// OMDb metadata provider (https://www.omdbapi.com/)
///
/// Wraps the OMDb HTTP API in the [`MovieLookup`] trait so the collection
/// manager stays provider-agnostic.
use std::time::Duration;

use reqwest::Client as HttpClient;
use serde::Deserialize;

use crate::{
    error::AppResult,
    services::lookup::{MovieFacts, MovieLookup},
};

/// Literal stored when the service does not name a director
pub const NO_DIRECTOR: &str = "No director available";

/// OMDb writes "N/A" instead of omitting unknown fields
const OMDB_ABSENT: &str = "N/A";

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct OmdbResponse {
    response: String,
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    year: Option<String>,
    #[serde(default)]
    director: Option<String>,
    #[serde(default)]
    poster: Option<String>,
    #[serde(default)]
    ratings: Vec<OmdbRating>,
    #[serde(default)]
    error: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct OmdbRating {
    #[allow(dead_code)]
    source: String,
    value: String,
}

pub struct OmdbLookup {
    http_client: HttpClient,
    api_key: String,
    api_url: String,
}

impl OmdbLookup {
    /// Creates the provider with a bounded request timeout; a lookup that
    /// exceeds it errors out and callers fall back to "title not found"
    pub fn new(api_key: String, api_url: String, timeout: Duration) -> AppResult<Self> {
        let http_client = HttpClient::builder().timeout(timeout).build()?;
        Ok(Self {
            http_client,
            api_key,
            api_url,
        })
    }

    /// Joins whitespace-separated words with `+`, case preserved, as the
    /// OMDb title parameter expects
    fn query_term(title: &str) -> String {
        title.split_whitespace().collect::<Vec<_>>().join("+")
    }

    fn convert_response(response: OmdbResponse) -> Option<MovieFacts> {
        if response.response != "True" {
            tracing::debug!(
                error = response.error.as_deref().unwrap_or("unknown"),
                "OMDb reported no match"
            );
            return None;
        }

        let (title, year) = match (response.title, response.year) {
            (Some(title), Some(year)) => (title, year),
            _ => {
                tracing::warn!("OMDb response missing expected title or year");
                return None;
            }
        };

        let director = match response.director {
            Some(d) if d != OMDB_ABSENT => d,
            _ => NO_DIRECTOR.to_string(),
        };

        let poster_url = response.poster.filter(|p| p.as_str() != OMDB_ABSENT);
        let rating = response.ratings.first().map(|r| r.value.clone());

        Some(MovieFacts {
            title,
            year,
            rating,
            poster_url,
            director,
        })
    }
}

#[async_trait::async_trait]
impl MovieLookup for OmdbLookup {
    async fn lookup(&self, title: &str) -> AppResult<Option<MovieFacts>> {
        let url = format!(
            "{}/?apikey={}&t={}",
            self.api_url,
            self.api_key,
            Self::query_term(title)
        );

        let response = self.http_client.get(&url).send().await?;

        if !response.status().is_success() {
            let status = response.status();
            tracing::warn!(%status, provider = self.name(), "Lookup returned non-OK status");
            return Ok(None);
        }

        let body: OmdbResponse = response.json().await?;
        let facts = Self::convert_response(body);

        tracing::info!(
            query = %title,
            found = facts.is_some(),
            provider = self.name(),
            "Title lookup completed"
        );

        Ok(facts)
    }

    fn name(&self) -> &'static str {
        "omdb"
    }
}
