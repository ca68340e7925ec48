use anyhow::{Context, Result, anyhow, bail};
use refinery::config::{Config, ConfigDbType};
use std::env;

const DEFAULT_HTTP_PORT: &str = "8080";
const DEFAULT_MAX_CONNECTIONS: u32 = 5;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreBackend {
    Postgres(DbConfig),
    /// Process-local state, lost on restart. Intended for local play-testing.
    Memory,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DbConfig {
    pub host: String,
    pub port: String,
    pub user: String,
    pub pass: String,
    pub name: String,
    pub max_connections: u32,
}

impl DbConfig {
    /// Reads `CLICKER_DATABASE_URL` if set, otherwise the individual
    /// `CLICKER_DB_*` variables.
    pub fn from_env() -> Result<Self> {
        let max_connections = match env::var("CLICKER_DB_MAX_CONNECTIONS") {
            Ok(value) => value
                .parse()
                .with_context(|| format!("CLICKER_DB_MAX_CONNECTIONS is not a number: {}", value))?,
            Err(_) => DEFAULT_MAX_CONNECTIONS,
        };

        if let Ok(db_url) = env::var("CLICKER_DATABASE_URL") {
            let mut config = Self::from_url(&db_url)?;
            config.max_connections = max_connections;
            return Ok(config);
        }

        let required = |name: &str| {
            env::var(name).with_context(|| format!("{} must be set in environment or .env file", name))
        };

        Ok(Self {
            host: required("CLICKER_DB_HOST")?,
            port: required("CLICKER_DB_PORT")?,
            user: required("CLICKER_DB_USER")?,
            pass: required("CLICKER_DB_PASS")?,
            name: required("CLICKER_DB_NAME")?,
            max_connections,
        })
    }

    pub fn from_url(db_url: &str) -> Result<Self> {
        let url = url::Url::parse(db_url).context("Invalid database URL")?;
        let host = url.host_str().ok_or_else(|| anyhow!("Database URL has no host"))?;
        let name = url
            .path_segments()
            .and_then(|mut segments| segments.next_back())
            .filter(|name| !name.is_empty())
            .ok_or_else(|| anyhow!("Database URL has no database name"))?;

        Ok(Self {
            host: host.to_string(),
            port: url.port().unwrap_or(5432).to_string(),
            user: url.username().to_string(),
            pass: url.password().unwrap_or_default().to_string(),
            name: name.to_string(),
            max_connections: DEFAULT_MAX_CONNECTIONS,
        })
    }

    pub fn url(&self) -> String {
        format!(
            "postgres://{}:{}@{}:{}/{}",
            self.user, self.pass, self.host, self.port, self.name
        )
    }

    pub fn refinery_config(&self) -> Config {
        Config::new(ConfigDbType::Postgres)
            .set_db_host(&self.host)
            .set_db_port(&self.port)
            .set_db_user(&self.user)
            .set_db_pass(&self.pass)
            .set_db_name(&self.name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    pub http_addr: String,
    pub store: StoreBackend,
}

impl ServerConfig {
    pub fn from_env() -> Result<Self> {
        let http_port = env::var("CLICKER_HTTP_PORT").unwrap_or_else(|_| DEFAULT_HTTP_PORT.to_string());
        let http_addr = format!("0.0.0.0:{}", http_port);

        let store = match env::var("CLICKER_STORE").as_deref() {
            Ok("memory") => StoreBackend::Memory,
            Ok("postgres") | Err(_) => StoreBackend::Postgres(
                DbConfig::from_env().context("Server configuration error: database settings missing")?,
            ),
            Ok(other) => bail!("Unknown CLICKER_STORE '{}', expected 'postgres' or 'memory'", other),
        };

        Ok(Self { http_addr, store })
    }
}
