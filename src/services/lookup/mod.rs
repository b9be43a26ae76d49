/// External movie metadata lookup abstraction
///
/// A lookup resolves a free-text title to structured movie facts, or reports
/// that the title is unknown. The collection manager never talks to a
/// concrete metadata service directly.
use crate::error::AppResult;

pub mod omdb;

pub use omdb::OmdbLookup;

/// Structured facts returned by a metadata lookup
///
/// Field shapes mirror what lookup services actually deliver: the year and
/// rating arrive as text (`"2010"`, `"8.8/10"`) and are coerced by the
/// collection manager, not here.
#[derive(Debug, Clone, PartialEq)]
pub struct MovieFacts {
    /// Canonical title as known to the metadata service
    pub title: String,
    /// Release year as text
    pub year: String,
    /// Rating as `"<value>/10"` text, if the service supplied one
    pub rating: Option<String>,
    pub poster_url: Option<String>,
    pub director: String,
}

/// Trait for movie metadata lookup services
///
/// `Ok(None)` means the title is unknown to the service. Transport or
/// parsing failures are `Err`; callers degrade both non-hit outcomes to the
/// same "title not found" result.
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait MovieLookup: Send + Sync {
    async fn lookup(&self, title: &str) -> AppResult<Option<MovieFacts>>;

    /// Provider name for logging and debugging
    fn name(&self) -> &'static str;
}
