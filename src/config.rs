use std::net::{Ipv4Addr, SocketAddr};

use clap::{Parser, ValueEnum};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum StorageProvider {
    Local,
    Memory,
    S3,
    Oss,
}

/// Runtime settings. Every flag falls back to its environment variable.
#[derive(Debug, Clone, Parser)]
#[command(name = "feedline", about = "social feed backend")]
pub struct Config {
    #[arg(long, env = "PORT", default_value_t = 8080)]
    pub port: u16,

    /// Repositories stay in memory when absent.
    #[arg(long, env = "MONGO_URI")]
    pub mongo_uri: Option<String>,

    #[arg(long, env = "DB_NAME", default_value = "sns")]
    pub db_name: String,

    #[arg(long, env = "ASSET_HOST", default_value = "http://localhost/")]
    pub asset_host: String,

    /// Root directory of the local file store.
    #[arg(long, env = "ROOT_PATH", default_value = "./public")]
    pub root_path: String,

    #[arg(long, env = "STORAGE_PROVIDER", value_enum, default_value_t = StorageProvider::Local)]
    pub storage_provider: StorageProvider,

    #[arg(long, env = "JWT_SECRET", default_value = "feedline-dev-secret", hide_env_values = true)]
    pub jwt_secret: String,

    #[arg(long, env = "TOKEN_TTL_HOURS", default_value_t = 24)]
    pub token_ttl_hours: i64,
}

impl Config {
    pub fn addr(&self) -> SocketAddr { (Ipv4Addr::UNSPECIFIED, self.port).into() }

    pub fn token_ttl(&self) -> chrono::Duration { chrono::Duration::hours(self.token_ttl_hours) }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: 8080,
            mongo_uri: None,
            db_name: "sns".to_string(),
            asset_host: "http://localhost/".to_string(),
            root_path: "./public".to_string(),
            storage_provider: StorageProvider::Memory,
            jwt_secret: "feedline-dev-secret".to_string(),
            token_ttl_hours: 24,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flags_override_defaults() {
        let c = Config::try_parse_from([
            "feedline",
            "--port",
            "9000",
            "--storage-provider",
            "s3",
            "--db-name",
            "feed",
        ])
        .unwrap();

        assert_eq!(c.port, 9000);
        assert_eq!(c.storage_provider, StorageProvider::S3);
        assert_eq!(c.db_name, "feed");
        assert_eq!(c.addr().port(), 9000);
    }

    #[test]
    fn rejects_unknown_provider() {
        assert!(Config::try_parse_from(["feedline", "--storage-provider", "ftp"]).is_err());
    }
}
