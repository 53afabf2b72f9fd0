// src/config/validate.rs

use std::sync::LazyLock;

use regex::Regex;

use crate::config::model::{
    AppConfig, DatabaseConfig, DeployConfig, ProvisionConfig, RawDeployConfig,
    RepositoryConfig, RetentionPolicy, SeedConfig, TargetConfig,
};
use crate::errors::{Result, RolloutError};

static SQL_IDENTIFIER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9_]+$").expect("valid identifier regex"));

impl TryFrom<RawDeployConfig> for DeployConfig {
    type Error = RolloutError;

    fn try_from(raw: RawDeployConfig) -> std::result::Result<Self, Self::Error> {
        let target = TargetConfig {
            server: required(raw.target.server, "target.server (TARGET_SERVER)")?,
            user: required(raw.target.user, "target.user (TARGET_USER)")?,
            dir: required(raw.target.dir, "target.dir (TARGET_DIR)")?,
            port: raw.target.port,
        };

        let repository = RepositoryConfig {
            url: required(raw.repository.url, "repository.url (REPOSITORY)")?,
            branch: non_empty(raw.repository.branch).unwrap_or_else(|| "main".to_string()),
        };

        let app = AppConfig {
            name: required(raw.app.name, "app.name (APP_NAME)")?,
            env: required(raw.app.env, "app.env (APP_ENV)")?,
            debug: required(raw.app.debug, "app.debug (APP_DEBUG)")?,
            url: required(raw.app.url, "app.url (APP_URL)")?,
        };

        let database = DatabaseConfig {
            host: required(raw.database.host, "database.host (DB_HOST)")?,
            database: required(raw.database.database, "database.database (DB_DATABASE)")?,
            username: required(raw.database.username, "database.username (DB_USERNAME)")?,
            password: required(raw.database.password, "database.password (DB_PASSWORD)")?,
        };

        let provision = ProvisionConfig {
            php: non_empty(raw.provision.php).unwrap_or_else(|| "php".to_string()),
            composer: non_empty(raw.provision.composer).unwrap_or_else(|| "composer".to_string()),
            mysql: non_empty(raw.provision.mysql).unwrap_or_else(|| "mysql".to_string()),
            web_group: non_empty(raw.provision.web_group)
                .unwrap_or_else(|| "www-data".to_string()),
            fpm_service: non_empty(raw.provision.fpm_service)
                .unwrap_or_else(|| "php8.1-fpm".to_string()),
            seed: seed_config(raw.provision.seed_table, raw.provision.seeder)?,
        };

        let retention = match raw.retention.keep {
            Some(0) => {
                return Err(RolloutError::Configuration(
                    "retention.keep must be >= 1 (got 0)".to_string(),
                ));
            }
            Some(keep) => RetentionPolicy { keep },
            None => RetentionPolicy::default(),
        };

        let mut notify = raw.notify;
        notify.slack_webhook_url = non_empty(notify.slack_webhook_url);
        notify.slack_channel = non_empty(notify.slack_channel);

        Ok(DeployConfig {
            target,
            repository,
            app,
            database,
            mail: raw.mail,
            notify,
            provision,
            retention,
        })
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

fn required(value: Option<String>, name: &str) -> Result<String> {
    non_empty(value).ok_or_else(|| {
        RolloutError::Configuration(format!("required value {name} is missing or empty"))
    })
}

fn seed_config(table: Option<String>, seeder: Option<String>) -> Result<Option<SeedConfig>> {
    match (non_empty(table), non_empty(seeder)) {
        (None, None) => Ok(None),
        (Some(table), Some(seeder)) => {
            if !SQL_IDENTIFIER.is_match(&table) {
                return Err(RolloutError::Configuration(format!(
                    "provision.seed_table '{table}' is not a plain table name"
                )));
            }
            Ok(Some(SeedConfig { table, seeder }))
        }
        (Some(_), None) | (None, Some(_)) => Err(RolloutError::Configuration(
            "provision.seed_table and provision.seeder must be set together".to_string(),
        )),
    }
}
