//! Resolver configuration
//!
//! All tunables are carried in a `ResolverConfig` handed to the resolver and
//! the remote client at construction time.

use std::path::PathBuf;
use std::time::Duration;

use directories::ProjectDirs;

/// Default acronym server endpoint; the acronym is appended as the query string
pub const DEFAULT_ENDPOINT: &str = "http://acronyms.silmaril.ie/cgi-bin/xaa";

/// Default time-to-live for cached expansions (5 days)
pub const DEFAULT_TTL: Duration = Duration::from_millis(432_000_000);

/// File name of the cache database inside the cache directory
const DATABASE_FILE: &str = "acronyms.db";

/// Configuration for resolving acronyms
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolverConfig {
    /// Base URL of the acronym server, without the query string
    pub endpoint: String,
    /// Maximum age of cached rows before they are refreshed
    pub ttl: Duration,
    /// How long to wait for a connection to the server
    pub connect_timeout: Duration,
    /// How long a whole request may take, body included
    pub request_timeout: Duration,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            ttl: DEFAULT_TTL,
            connect_timeout: Duration::from_secs(10),
            request_timeout: Duration::from_secs(30),
        }
    }
}

/// Returns the default database path in the XDG-compliant cache directory
///
/// Uses `~/.cache/acronym/acronyms.db` on Linux. Returns `None` if the cache
/// directory cannot be determined (e.g., no home directory).
pub fn default_database_path() -> Option<PathBuf> {
    let project_dirs = ProjectDirs::from("", "", "acronym")?;
    Some(project_dirs.cache_dir().join(DATABASE_FILE))
}
