//! Model configuration: collection, database and connection URI
//!
//! Resolution happens once, when a [`crate::Model`] is constructed. Each
//! field prefers the explicit [`ModelOptions`] value, then the environment
//! (`DATABASE_URL`, `DATABASE_NAME`), then a local default.

/// Environment variable holding the server URL (without database)
pub const DATABASE_URL_ENV: &str = "DATABASE_URL";

/// Environment variable holding the database name
pub const DATABASE_NAME_ENV: &str = "DATABASE_NAME";

/// Server used when neither options nor environment name one
pub const DEFAULT_HOST_URL: &str = "mongodb://localhost:27017";

pub const DEFAULT_COLLECTION: &str = "users";

pub const DEFAULT_DATABASE: &str = "test";

/// Construction options for a model. Unset fields fall back to the
/// environment and then to defaults.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ModelOptions {
    pub collection: Option<String>,
    pub url: Option<String>,
    pub db: Option<String>,
    /// Full connection URI; bypasses `<url>/<db>` joining when set
    pub uri: Option<String>,
}

impl ModelOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn collection(mut self, collection: impl Into<String>) -> Self {
        self.collection = Some(collection.into());
        self
    }

    pub fn url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }

    pub fn db(mut self, db: impl Into<String>) -> Self {
        self.db = Some(db.into());
        self
    }

    pub fn uri(mut self, uri: impl Into<String>) -> Self {
        self.uri = Some(uri.into());
        self
    }

    /// Fill every unset field from `fallback`
    pub fn or(self, fallback: ModelOptions) -> Self {
        Self {
            collection: self.collection.or(fallback.collection),
            url: self.url.or(fallback.url),
            db: self.db.or(fallback.db),
            uri: self.uri.or(fallback.uri),
        }
    }
}

/// Resolved, immutable model configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelConfig {
    collection: String,
    database: String,
    connection_url: Option<String>,
    resolved_uri: String,
}

impl ModelConfig {
    /// Resolve options against the process environment
    pub fn resolve(options: ModelOptions) -> Self {
        Self::resolve_with(options, |key| std::env::var(key).ok())
    }

    /// Resolve options against an arbitrary variable lookup
    pub fn resolve_with<F>(options: ModelOptions, env: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let lookup = |key: &str| env(key).filter(|value| !value.trim().is_empty());

        let collection = non_empty(options.collection)
            .unwrap_or_else(|| DEFAULT_COLLECTION.to_string());
        let database = non_empty(options.db)
            .or_else(|| lookup(DATABASE_NAME_ENV))
            .unwrap_or_else(|| DEFAULT_DATABASE.to_string());
        let connection_url = non_empty(options.url)
            .or_else(|| lookup(DATABASE_URL_ENV))
            .map(|url| url.trim_end_matches('/').to_string());

        let resolved_uri = match non_empty(options.uri) {
            Some(uri) => uri,
            None => {
                let base = connection_url.as_deref().unwrap_or(DEFAULT_HOST_URL);
                format!("{}/{}", base, database)
            }
        };

        Self {
            collection,
            database,
            connection_url,
            resolved_uri,
        }
    }

    /// Default collection for operations
    pub fn collection(&self) -> &str {
        &self.collection
    }

    /// Default database for operations
    pub fn database(&self) -> &str {
        &self.database
    }

    /// Server URL as configured, without database
    pub fn connection_url(&self) -> Option<&str> {
        self.connection_url.as_deref()
    }

    /// URI the driver connects to
    pub fn resolved_uri(&self) -> &str {
        &self.resolved_uri
    }
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self::resolve_with(ModelOptions::default(), |_| None)
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}
