// src/config/loader.rs

use std::fs;
use std::path::{Path, PathBuf};

use crate::config::model::{DeployConfig, RawDeployConfig};
use crate::errors::{Result, RolloutError};

/// Load a configuration file from a given path and return the raw
/// `RawDeployConfig`.
///
/// This only performs TOML deserialization; required fields are checked by
/// [`load_and_validate`].
pub fn load_from_path(path: impl AsRef<Path>) -> Result<RawDeployConfig> {
    let path = path.as_ref();
    let contents = fs::read_to_string(path).map_err(|e| {
        RolloutError::Configuration(format!("reading config file {}: {e}", path.display()))
    })?;

    let config: RawDeployConfig = toml::from_str(&contents)?;

    Ok(config)
}

/// Load configuration, apply environment overrides and validate.
///
/// - `path = Some(p)`: `p` must exist.
/// - `path = None`: [`default_config_path`] is used if present, otherwise the
///   configuration comes from the environment alone.
///
/// `env` is the lookup used for overrides; production passes
/// `|k| std::env::var(k).ok()`.
pub fn load_and_validate<F>(path: Option<&Path>, env: F) -> Result<DeployConfig>
where
    F: Fn(&str) -> Option<String>,
{
    let mut raw = match path {
        Some(p) => load_from_path(p)?,
        None => {
            let default = default_config_path();
            if default.exists() {
                load_from_path(&default)?
            } else {
                RawDeployConfig::default()
            }
        }
    };

    apply_env_overrides(&mut raw, env);
    DeployConfig::try_from(raw)
}

/// Overlay environment variables (original variable names) onto `raw`.
pub fn apply_env_overrides<F>(raw: &mut RawDeployConfig, env: F)
where
    F: Fn(&str) -> Option<String>,
{
    let set = |slot: &mut Option<String>, key: &str| {
        if let Some(v) = env(key) {
            *slot = Some(v);
        }
    };

    set(&mut raw.target.server, "TARGET_SERVER");
    set(&mut raw.target.user, "TARGET_USER");
    set(&mut raw.target.dir, "TARGET_DIR");
    set(&mut raw.repository.url, "REPOSITORY");
    set(&mut raw.repository.branch, "BRANCH");

    set(&mut raw.app.name, "APP_NAME");
    set(&mut raw.app.env, "APP_ENV");
    set(&mut raw.app.debug, "APP_DEBUG");
    set(&mut raw.app.url, "APP_URL");

    set(&mut raw.database.host, "DB_HOST");
    set(&mut raw.database.database, "DB_DATABASE");
    set(&mut raw.database.username, "DB_USERNAME");
    set(&mut raw.database.password, "DB_PASSWORD");

    set(&mut raw.mail.mailer, "MAIL_MAILER");
    set(&mut raw.mail.host, "MAIL_HOST");
    set(&mut raw.mail.port, "MAIL_PORT");
    set(&mut raw.mail.username, "MAIL_USERNAME");
    set(&mut raw.mail.password, "MAIL_PASSWORD");
    set(&mut raw.mail.encryption, "MAIL_ENCRYPTION");
    set(&mut raw.mail.from_address, "MAIL_FROM_ADDRESS");
    set(&mut raw.mail.from_name, "MAIL_FROM_NAME");
    set(&mut raw.mail.replyto_address, "MAIL_REPLYTO_ADDRESS");
    set(&mut raw.mail.replyto_name, "MAIL_REPLYTO_NAME");

    set(&mut raw.notify.slack_webhook_url, "LOG_SLACK_WEBHOOK_URL");
    set(&mut raw.notify.slack_channel, "LOG_SLACK_CHANNEL");
}

/// Default config location: `Rollout.toml` in the working directory.
pub fn default_config_path() -> PathBuf {
    PathBuf::from("Rollout.toml")
}
