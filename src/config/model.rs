// src/config/model.rs

use serde::Deserialize;

/// Configuration exactly as read from TOML (plus environment overrides).
///
/// ```toml
/// [target]
/// server = "web1.example.com"
/// user = "deploy"
/// dir = "apps/shop"
///
/// [repository]
/// url = "git@github.com:acme/shop.git"
///
/// [app]
/// name = "Shop"
/// env = "production"
/// debug = "false"
/// url = "https://shop.example.com"
///
/// [database]
/// host = "localhost"
/// database = "shop"
/// username = "shop"
/// password = "secret"
/// ```
///
/// Every field is optional here; [`DeployConfig`] is the validated form.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RawDeployConfig {
    #[serde(default)]
    pub target: RawTarget,
    #[serde(default)]
    pub repository: RawRepository,
    #[serde(default)]
    pub app: RawApp,
    #[serde(default)]
    pub database: RawDatabase,
    #[serde(default)]
    pub mail: MailSettings,
    #[serde(default)]
    pub notify: NotifySettings,
    #[serde(default)]
    pub provision: RawProvision,
    #[serde(default)]
    pub retention: RawRetention,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RawTarget {
    pub server: Option<String>,
    pub user: Option<String>,
    pub dir: Option<String>,
    pub port: Option<u16>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RawRepository {
    pub url: Option<String>,
    pub branch: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RawApp {
    pub name: Option<String>,
    pub env: Option<String>,
    pub debug: Option<String>,
    pub url: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RawDatabase {
    pub host: Option<String>,
    pub database: Option<String>,
    pub username: Option<String>,
    pub password: Option<String>,
}

/// `[mail]` section. Only the transport fields have fallbacks; the rest
/// are written empty into the env file when unset.
#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct MailSettings {
    pub mailer: Option<String>,
    pub host: Option<String>,
    pub port: Option<String>,
    pub username: Option<String>,
    pub password: Option<String>,
    pub encryption: Option<String>,
    pub from_address: Option<String>,
    pub from_name: Option<String>,
    pub replyto_address: Option<String>,
    pub replyto_name: Option<String>,
}

impl MailSettings {
    pub fn mailer(&self) -> &str {
        self.mailer.as_deref().unwrap_or("log")
    }

    pub fn host(&self) -> &str {
        self.host.as_deref().unwrap_or("localhost")
    }

    pub fn port(&self) -> &str {
        self.port.as_deref().unwrap_or("25")
    }
}

/// `[notify]` section. Notifications are disabled when no webhook is set.
#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct NotifySettings {
    pub slack_webhook_url: Option<String>,
    pub slack_channel: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RawProvision {
    pub php: Option<String>,
    pub composer: Option<String>,
    pub mysql: Option<String>,
    pub web_group: Option<String>,
    pub fpm_service: Option<String>,
    pub seed_table: Option<String>,
    pub seeder: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RawRetention {
    pub keep: Option<usize>,
}

/// Validated, immutable configuration for one invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeployConfig {
    pub target: TargetConfig,
    pub repository: RepositoryConfig,
    pub app: AppConfig,
    pub database: DatabaseConfig,
    pub mail: MailSettings,
    pub notify: NotifySettings,
    pub provision: ProvisionConfig,
    pub retention: RetentionPolicy,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TargetConfig {
    pub server: String,
    pub user: String,
    /// Target root; relative paths resolve against the remote home.
    pub dir: String,
    pub port: Option<u16>,
}

impl TargetConfig {
    /// `user@server`, as handed to ssh.
    pub fn destination(&self) -> String {
        format!("{}@{}", self.user, self.server)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepositoryConfig {
    pub url: String,
    pub branch: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub name: String,
    pub env: String,
    pub debug: String,
    pub url: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatabaseConfig {
    pub host: String,
    pub database: String,
    pub username: String,
    pub password: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProvisionConfig {
    pub php: String,
    pub composer: String,
    pub mysql: String,
    pub web_group: String,
    pub fpm_service: String,
    pub seed: Option<SeedConfig>,
}

/// Reference dataset seeded once, while its table is empty.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeedConfig {
    pub table: String,
    pub seeder: String,
}

/// How many of the most recent releases a cleanup pass keeps.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetentionPolicy {
    pub keep: usize,
}

impl Default for RetentionPolicy {
    fn default() -> Self {
        Self { keep: 3 }
    }
}

impl DeployConfig {
    /// Key/value pairs written into the shared env file on every deploy,
    /// in file order. Unset optional values are written empty.
    pub fn env_assignments(&self) -> Vec<(&'static str, String)> {
        fn opt(v: &Option<String>) -> String {
            v.clone().unwrap_or_default()
        }

        let mail = &self.mail;
        vec![
            ("APP_NAME", self.app.name.clone()),
            ("APP_ENV", self.app.env.clone()),
            ("APP_DEBUG", self.app.debug.clone()),
            ("APP_URL", self.app.url.clone()),
            ("DB_HOST", self.database.host.clone()),
            ("DB_DATABASE", self.database.database.clone()),
            ("DB_USERNAME", self.database.username.clone()),
            ("DB_PASSWORD", self.database.password.clone()),
            ("MAIL_MAILER", mail.mailer().to_string()),
            ("MAIL_HOST", mail.host().to_string()),
            ("MAIL_PORT", mail.port().to_string()),
            ("MAIL_USERNAME", opt(&mail.username)),
            ("MAIL_PASSWORD", opt(&mail.password)),
            ("MAIL_ENCRYPTION", opt(&mail.encryption)),
            ("MAIL_FROM_ADDRESS", opt(&mail.from_address)),
            ("MAIL_FROM_NAME", opt(&mail.from_name)),
            ("MAIL_REPLYTO_ADDRESS", opt(&mail.replyto_address)),
            ("MAIL_REPLYTO_NAME", opt(&mail.replyto_name)),
            ("LOG_SLACK_WEBHOOK_URL", opt(&self.notify.slack_webhook_url)),
            ("LOG_SLACK_CHANNEL", opt(&self.notify.slack_channel)),
        ]
    }
}
