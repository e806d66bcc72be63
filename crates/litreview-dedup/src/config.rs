//! Configuration for the deduplication and import pipeline.

use std::time::Duration;

/// API configuration constants.
pub mod api {
    use std::time::Duration;

    /// Graph API endpoint of the external catalog.
    pub const GRAPH_API: &str = "https://api.semanticscholar.org/graph/v1";

    /// Request timeout.
    pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

    /// Connection timeout.
    pub const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

    /// Client-wide request ceiling without API key (5 req/s).
    pub const REQUESTS_PER_SECOND: u32 = 5;

    /// Client-wide request ceiling with API key (100 req/s).
    pub const REQUESTS_PER_SECOND_WITH_KEY: u32 = 100;

    /// Delay an import job waits between two catalog fetches (about 3 req/s).
    pub const FETCH_DELAY: Duration = Duration::from_millis(350);

    /// Fetch delay with an API key.
    pub const FETCH_DELAY_WITH_KEY: Duration = Duration::from_millis(50);

    /// Number of items processed per import chunk.
    pub const CHUNK_SIZE: usize = 50;

    /// Cache TTL (5 minutes).
    pub const CACHE_TTL: Duration = Duration::from_secs(300);

    /// Maximum cache size.
    pub const CACHE_MAX_SIZE: u64 = 1000;

    /// Maximum keepalive connections.
    pub const MAX_KEEPALIVE: usize = 10;

    /// Keepalive expiry.
    pub const KEEPALIVE_EXPIRY: Duration = Duration::from_secs(30);
}

/// Paper fields requested from the catalog.
pub mod fields {
    /// Everything needed to build an importable record.
    pub const RECORD: &[&str] =
        &["paperId", "title", "abstract", "authors", "venue", "journal", "publicationDate", "year", "externalIds"];
}

/// Pipeline configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// Catalog API key (optional).
    pub api_key: Option<String>,

    /// Base URL for Graph API (for testing with mock servers).
    pub graph_api_url: String,

    /// Request timeout.
    pub request_timeout: Duration,

    /// Connection timeout.
    pub connect_timeout: Duration,

    /// Client-wide request ceiling. `None` disables the limiter.
    pub requests_per_second: Option<u32>,

    /// Default delay between catalog fetches inside an import job.
    pub fetch_delay: Duration,

    /// Default import chunk size.
    pub chunk_size: usize,

    /// Cache TTL.
    pub cache_ttl: Duration,

    /// Maximum cache size.
    pub cache_max_size: u64,
}

impl Config {
    /// Create a new configuration with optional API key.
    ///
    /// Rate limits are automatically adjusted based on API key presence:
    /// - Without key: 5 req/s client ceiling, 350ms between import fetches
    /// - With key: 100 req/s client ceiling, 50ms between import fetches
    #[must_use]
    pub fn new(api_key: Option<String>) -> Self {
        let has_key = api_key.is_some();
        Self {
            api_key,
            graph_api_url: api::GRAPH_API.to_string(),
            request_timeout: api::REQUEST_TIMEOUT,
            connect_timeout: api::CONNECT_TIMEOUT,
            requests_per_second: Some(if has_key {
                api::REQUESTS_PER_SECOND_WITH_KEY
            } else {
                api::REQUESTS_PER_SECOND
            }),
            fetch_delay: if has_key { api::FETCH_DELAY_WITH_KEY } else { api::FETCH_DELAY },
            chunk_size: api::CHUNK_SIZE,
            cache_ttl: api::CACHE_TTL,
            cache_max_size: api::CACHE_MAX_SIZE,
        }
    }

    /// Create a test configuration with a custom URL for mock servers.
    #[must_use]
    pub fn for_testing(base_url: &str) -> Self {
        Self {
            api_key: None,
            graph_api_url: format!("{}/graph/v1", base_url),
            request_timeout: Duration::from_secs(5),
            connect_timeout: Duration::from_secs(2),
            requests_per_second: None, // No limiter in tests
            fetch_delay: Duration::from_millis(0),
            chunk_size: api::CHUNK_SIZE,
            cache_ttl: Duration::from_secs(0), // No caching in tests
            cache_max_size: 0,
        }
    }

    /// Create configuration from environment variables.
    ///
    /// Loads a `.env` file first when one is present.
    ///
    /// # Errors
    ///
    /// Returns error if environment variables are invalid.
    pub fn from_env() -> anyhow::Result<Self> {
        dotenv::dotenv().ok();

        let api_key = std::env::var("SEMANTIC_SCHOLAR_API_KEY").ok().filter(|k| !k.is_empty());
        let mut config = Self::new(api_key);

        if let Ok(raw) = std::env::var("LITREVIEW_CHUNK_SIZE") {
            let chunk_size: usize = raw.parse()?;
            anyhow::ensure!(chunk_size > 0, "LITREVIEW_CHUNK_SIZE must be at least 1");
            config.chunk_size = chunk_size;
        }

        if let Ok(raw) = std::env::var("LITREVIEW_FETCH_DELAY_MS") {
            config.fetch_delay = Duration::from_millis(raw.parse()?);
        }

        Ok(config)
    }

    /// Check if an API key is configured.
    #[must_use]
    pub const fn has_api_key(&self) -> bool {
        self.api_key.is_some()
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::new(None)
    }
}
