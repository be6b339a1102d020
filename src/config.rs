use serde::Deserialize;
use crate::models::ReferenceRow;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub server: ServerConfig,
    pub storage: StorageConfig,
    pub redis: RedisConfig,
    pub session: SessionConfig,
    pub auth: AuthConfig,
    pub cors: CorsConfig,
    pub upload: UploadConfig,
    pub resources: ResourcesConfig,
    pub seed: SeedConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    Redis,
    Memory,
}

#[derive(Debug, Deserialize, Clone)]
pub struct StorageConfig {
    pub backend: StorageBackend,
}

#[derive(Debug, Deserialize, Clone)]
pub struct RedisConfig {
    pub url: String,
    pub sentinel_enabled: bool,
    pub sentinel_url: Option<String>,
    pub key_prefix: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct SessionConfig {
    pub cookie_name: String,
    pub secure: bool,
    pub inactivity_timeout_secs: i64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct AuthConfig {
    pub bcrypt_cost: u32,
}

#[derive(Debug, Deserialize, Clone)]
pub struct CorsConfig {
    pub allowed_origins: Vec<String>,
    pub max_age_secs: u64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct UploadConfig {
    pub max_body_size: usize,  // in bytes
}

#[derive(Debug, Deserialize, Clone)]
pub struct ResourcesConfig {
    pub dir: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DefaultUserConfig {
    pub username: String,
    pub email: String,
    pub password: String,
}

/// Rows written at startup when missing.
#[derive(Debug, Deserialize, Clone)]
pub struct SeedConfig {
    pub default_user: DefaultUserConfig,
    #[serde(default)]
    pub priorities: Vec<ReferenceRow>,
    #[serde(default)]
    pub difficulties: Vec<ReferenceRow>,
    #[serde(default)]
    pub statuses: Vec<ReferenceRow>,
}

impl Config {
    pub fn load() -> Result<Self, config::ConfigError> {
        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default"))
            .add_source(config::Environment::with_prefix("APP").separator("__"))
            .build()?;

        config.try_deserialize()
    }

    /// The bundled defaults on the in-memory store with a cheap bcrypt cost.
    #[cfg(test)]
    pub fn for_tests() -> Self {
        config::Config::builder()
            .add_source(config::File::from_str(
                include_str!("../config/default.toml"),
                config::FileFormat::Toml,
            ))
            .set_override("storage.backend", "memory")
            .and_then(|builder| builder.set_override("auth.bcrypt_cost", 4))
            .and_then(|builder| builder.build())
            .and_then(|config| config.try_deserialize())
            .expect("bundled default config must parse")
    }
}
