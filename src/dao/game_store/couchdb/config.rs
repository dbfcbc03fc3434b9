use super::error::{CouchDaoError, CouchResult};

/// Database used when `COUCH_DB` is unset.
const DEFAULT_DATABASE: &str = "contact";

/// Where the game archive lives.
#[derive(Debug, Clone)]
pub struct CouchConfig {
    /// Server root, e.g. `http://localhost:5984`.
    pub base_url: String,
    /// Database holding games, clues, contacts and rosters.
    pub database: String,
    /// Basic-auth user and password; only used when both are set.
    pub username: Option<String>,
    pub password: Option<String>,
}

impl CouchConfig {
    /// Read `COUCH_BASE_URL`, `COUCH_DB`, `COUCH_USERNAME` and `COUCH_PASSWORD`.
    pub fn from_env() -> CouchResult<Self> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> CouchResult<Self> {
        let base_url = lookup("COUCH_BASE_URL")
            .filter(|url| !url.trim().is_empty())
            .ok_or(CouchDaoError::MissingEnvVar {
                var: "COUCH_BASE_URL",
            })?;

        let (username, password) = match (lookup("COUCH_USERNAME"), lookup("COUCH_PASSWORD")) {
            (Some(user), Some(pass)) => (Some(user), Some(pass)),
            _ => (None, None),
        };

        Ok(Self {
            base_url,
            database: lookup("COUCH_DB").unwrap_or_else(|| DEFAULT_DATABASE.into()),
            username,
            password,
        })
    }
}
