use std::{env, fmt::Display, fs::read_to_string, str::FromStr};

use tracing::{info, warn};

pub struct Config {
    pub port: u16,
    pub mongo_url: String,
    pub db_name: String,
    pub jwt_secret: String,
    pub token_ttl_hours: i64,
    pub upload_dir: String,
    pub public_url: String,
}

impl Config {
    pub fn load() -> Self {
        Self {
            port: try_load("RUST_PORT", "4000"),
            mongo_url: try_load("MONGO_URL", "mongodb://localhost:27017"),
            db_name: try_load("MONGO_DB", "roadside"),
            jwt_secret: read_secret("JWT_SECRET"),
            token_ttl_hours: try_load("TOKEN_TTL_HOURS", "24"),
            upload_dir: try_load("UPLOAD_DIR", "uploads"),
            public_url: try_load("PUBLIC_URL", "http://localhost:4000"),
        }
    }
}

fn var(key: &str) -> Result<String, ()> {
    env::var(key).map_err(|_| {
        warn!("Environment variable {key} not found, using default");
    })
}

fn try_load<T: FromStr>(key: &str, default: &str) -> T
where
    T::Err: Display,
{
    var(key)
        .unwrap_or_else(|_| {
            info!("{key} not set, using default: {default}");
            default.to_string()
        })
        .parse()
        .map_err(|e| {
            warn!("Invalid {key} value: {e}");
        })
        .expect("Environment misconfigured!")
}

/// Reads a secret from the Docker secrets tree, falling back to a plain
/// environment variable for local runs.
fn read_secret(secret_name: &str) -> String {
    let path = format!("/run/secrets/{secret_name}");

    if let Ok(contents) = read_to_string(&path) {
        return contents.trim().to_string();
    }

    env::var(secret_name)
        .map_err(|e| {
            warn!("Failed to read {secret_name} from file or environment: {e}");
        })
        .expect("Secrets misconfigured!")
}

#[cfg(test)]
mod tests {
    use super::try_load;

    #[test]
    fn try_load_falls_back_to_default() {
        let port: u16 = try_load("ROADSIDE_TEST_UNSET_PORT", "4000");
        assert_eq!(port, 4000);
    }

    #[test]
    fn try_load_reads_environment() {
        std::env::set_var("ROADSIDE_TEST_SET_PORT", "8123");
        let port: u16 = try_load("ROADSIDE_TEST_SET_PORT", "4000");
        assert_eq!(port, 8123);
    }
}
