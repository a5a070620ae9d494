use std::fmt;

use graph_smoke::Neo4jConfig;

/// Connection configuration loaded from environment variables.
#[derive(Clone)]
pub struct Config {
    /// Bolt URI. Env: `NEO4J_URI`, default `bolt://localhost:7687`.
    pub uri: String,
    /// Env: `NEO4J_USER`, default `neo4j`.
    pub user: String,
    /// Env: `NEO4J_PASSWORD`, default `neo4j`.
    pub password: String,
    /// Target database. Env: `NEO4J_DATABASE`, server default when unset.
    pub database: Option<String>,
    /// Pool size. Env: `NEO4J_MAX_CONNECTIONS`, default 4.
    pub max_connections: usize,
    /// Rows fetched per pull. Env: `NEO4J_FETCH_SIZE`, default 200.
    pub fetch_size: usize,
}

impl Config {
    /// Load configuration from environment variables, applying defaults.
    ///
    /// # Errors
    /// Returns an error if a numeric variable is set but not a positive integer.
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Same as [`Config::from_env`] with a custom variable source.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let uri = lookup("NEO4J_URI").unwrap_or_else(|| "bolt://localhost:7687".to_string());
        let user = lookup("NEO4J_USER").unwrap_or_else(|| "neo4j".to_string());
        let password = lookup("NEO4J_PASSWORD").unwrap_or_else(|| "neo4j".to_string());
        let database = lookup("NEO4J_DATABASE").filter(|db| !db.trim().is_empty());

        let max_connections = parse_env_usize(&lookup, "NEO4J_MAX_CONNECTIONS", 4)?;
        let fetch_size = parse_env_usize(&lookup, "NEO4J_FETCH_SIZE", 200)?;

        Ok(Config {
            uri,
            user,
            password,
            database,
            max_connections,
            fetch_size,
        })
    }

    pub fn neo4j(&self) -> Neo4jConfig {
        Neo4jConfig {
            uri: self.uri.clone(),
            user: self.user.clone(),
            password: self.password.clone(),
            database: self.database.clone(),
            max_connections: self.max_connections,
            fetch_size: self.fetch_size,
        }
    }
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("uri", &self.uri)
            .field("user", &self.user)
            .field("password", &"<redacted>")
            .field("database", &self.database)
            .field("max_connections", &self.max_connections)
            .field("fetch_size", &self.fetch_size)
            .finish()
    }
}

fn parse_env_usize(
    lookup: &impl Fn(&str) -> Option<String>,
    name: &str,
    default: usize,
) -> anyhow::Result<usize> {
    match lookup(name) {
        Some(val) => {
            let parsed = val
                .parse::<usize>()
                .map_err(|e| anyhow::anyhow!("Invalid {}: {}", name, e))?;
            if parsed == 0 {
                anyhow::bail!("Invalid {}: must be greater than zero", name);
            }
            Ok(parsed)
        }
        None => Ok(default),
    }
}
