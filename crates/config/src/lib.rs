use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::debug;

const DEFAULT_CONFIG_FILES: &[&str] = &[
    "parley.toml",
    "config/parley.toml",
    "crates/config/parley.toml",
    "../parley.toml",
    "../config/parley.toml",
];

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub auth: AuthConfig,
    #[serde(default)]
    pub chat: ChatConfig,
}

/// Settings consumed by the token authority and the credential store.
///
/// `jwt_secret` is left unset by default; callers decide whether a missing
/// secret is fatal or whether an ephemeral one is acceptable.
#[derive(Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    #[serde(default)]
    pub jwt_secret: Option<String>,
    #[serde(default = "AuthConfig::default_issuer")]
    pub issuer: String,
    #[serde(default = "AuthConfig::default_access_ttl")]
    pub access_token_ttl_seconds: u64,
    #[serde(default = "AuthConfig::default_refresh_ttl")]
    pub refresh_token_ttl_seconds: u64,
    #[serde(default)]
    pub password_hash: PasswordHashConfig,
}

impl AuthConfig {
    fn default_issuer() -> String {
        "parley".to_string()
    }

    const fn default_access_ttl() -> u64 {
        15 * 60
    }

    const fn default_refresh_ttl() -> u64 {
        7 * 24 * 60 * 60
    }
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            jwt_secret: None,
            issuer: Self::default_issuer(),
            access_token_ttl_seconds: Self::default_access_ttl(),
            refresh_token_ttl_seconds: Self::default_refresh_ttl(),
            password_hash: PasswordHashConfig::default(),
        }
    }
}

// Hand-written so the signing secret never ends up in debug logs.
impl std::fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthConfig")
            .field("jwt_secret", &self.jwt_secret.as_ref().map(|_| "<redacted>"))
            .field("issuer", &self.issuer)
            .field("access_token_ttl_seconds", &self.access_token_ttl_seconds)
            .field("refresh_token_ttl_seconds", &self.refresh_token_ttl_seconds)
            .field("password_hash", &self.password_hash)
            .finish()
    }
}

/// Argon2id cost parameters.
///
/// ```
/// use parley_config::PasswordHashConfig;
///
/// let params = PasswordHashConfig::default();
/// assert_eq!(params.memory_kib, 19_456);
/// assert_eq!(params.iterations, 2);
/// assert_eq!(params.parallelism, 1);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PasswordHashConfig {
    #[serde(default = "PasswordHashConfig::default_memory")]
    pub memory_kib: u32,
    #[serde(default = "PasswordHashConfig::default_iterations")]
    pub iterations: u32,
    #[serde(default = "PasswordHashConfig::default_parallelism")]
    pub parallelism: u32,
}

impl PasswordHashConfig {
    const fn default_memory() -> u32 {
        19_456
    }

    const fn default_iterations() -> u32 {
        2
    }

    const fn default_parallelism() -> u32 {
        1
    }
}

impl Default for PasswordHashConfig {
    fn default() -> Self {
        Self {
            memory_kib: Self::default_memory(),
            iterations: Self::default_iterations(),
            parallelism: Self::default_parallelism(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatConfig {
    #[serde(default = "ChatConfig::default_page_size")]
    pub default_page_size: usize,
    #[serde(default = "ChatConfig::default_max_page_size")]
    pub max_page_size: usize,
    #[serde(default = "ChatConfig::default_max_message_length")]
    pub max_message_length: usize,
    #[serde(default = "ChatConfig::default_max_chat_name_length")]
    pub max_chat_name_length: usize,
}

impl ChatConfig {
    const fn default_page_size() -> usize {
        50
    }

    const fn default_max_page_size() -> usize {
        100
    }

    const fn default_max_message_length() -> usize {
        4_096
    }

    const fn default_max_chat_name_length() -> usize {
        255
    }
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            default_page_size: Self::default_page_size(),
            max_page_size: Self::default_max_page_size(),
            max_message_length: Self::default_max_message_length(),
            max_chat_name_length: Self::default_max_chat_name_length(),
        }
    }
}

fn as_i64(value: u64) -> i64 {
    i64::try_from(value).unwrap_or(i64::MAX)
}

/// Load the application configuration by combining defaults, files, and environment overrides.
///
/// ```
/// use parley_config::load;
///
/// std::env::remove_var("PARLEY_CONFIG");
///
/// let config = load().expect("configuration should load with defaults");
/// assert!(!config.auth.issuer.is_empty());
/// ```
pub fn load() -> anyhow::Result<AppConfig> {
    load_from(None)
}

/// Like [`load`], but an explicit file path takes precedence over
/// `PARLEY_CONFIG` and the default search locations.
pub fn load_from(explicit: Option<&Path>) -> anyhow::Result<AppConfig> {
    let defaults = AppConfig::default();

    let mut builder = config::Config::builder()
        .set_default("auth.issuer", defaults.auth.issuer.clone())?
        .set_default(
            "auth.access_token_ttl_seconds",
            as_i64(defaults.auth.access_token_ttl_seconds),
        )?
        .set_default(
            "auth.refresh_token_ttl_seconds",
            as_i64(defaults.auth.refresh_token_ttl_seconds),
        )?
        .set_default(
            "auth.password_hash.memory_kib",
            i64::from(defaults.auth.password_hash.memory_kib),
        )?
        .set_default(
            "auth.password_hash.iterations",
            i64::from(defaults.auth.password_hash.iterations),
        )?
        .set_default(
            "auth.password_hash.parallelism",
            i64::from(defaults.auth.password_hash.parallelism),
        )?
        .set_default(
            "chat.default_page_size",
            as_i64(defaults.chat.default_page_size as u64),
        )?
        .set_default(
            "chat.max_page_size",
            as_i64(defaults.chat.max_page_size as u64),
        )?
        .set_default(
            "chat.max_message_length",
            as_i64(defaults.chat.max_message_length as u64),
        )?
        .set_default(
            "chat.max_chat_name_length",
            as_i64(defaults.chat.max_chat_name_length as u64),
        )?;

    let environment_overrides = config::Environment::with_prefix("PARLEY").separator("__");

    let mut config_file_attached = false;

    if let Some(path) = explicit {
        if !path.exists() {
            anyhow::bail!("configuration file {} does not exist", path.display());
        }
        debug!(path = %path.display(), "loading configuration from explicit path");
        builder = builder.add_source(config::File::from(path.to_path_buf()));
        config_file_attached = true;
    } else if let Ok(path) = std::env::var("PARLEY_CONFIG") {
        builder = builder.add_source(config::File::from(PathBuf::from(&path)));
        config_file_attached = true;
        debug!(path, "loading configuration via PARLEY_CONFIG");
    } else if let Ok(cwd) = std::env::current_dir() {
        let fallback = DEFAULT_CONFIG_FILES
            .iter()
            .map(|candidate| cwd.join(candidate))
            .find(|path| path.exists());

        if let Some(path) = fallback {
            debug!(path = %path.display(), "loading configuration file");
            builder = builder.add_source(config::File::from(path));
            config_file_attached = true;
        }
    }

    if !config_file_attached {
        debug!("no configuration file found, relying on defaults and environment overrides");
    }

    builder = builder.add_source(environment_overrides);

    let cfg = builder.build().context("unable to build configuration")?;

    let mut config = cfg
        .try_deserialize::<AppConfig>()
        .context("invalid configuration")?;

    if config.chat.max_page_size == 0 {
        anyhow::bail!("chat.max_page_size must be greater than zero");
    }
    if config.chat.default_page_size > config.chat.max_page_size {
        config.chat.default_page_size = config.chat.max_page_size;
    }
    if config
        .auth
        .jwt_secret
        .as_deref()
        .is_some_and(|secret| secret.trim().is_empty())
    {
        config.auth.jwt_secret = None;
    }

    debug!(?config, "loaded configuration");
    Ok(config)
}
