use rollout::config::{DeployConfig, RawDeployConfig};
use rollout::remote::RepositoryFixture;

pub const REPO_URL: &str = "git@example.com:acme/shop.git";
pub const TARGET_DIR: &str = "apps/shop";

/// Builder for `DeployConfig` with every required value filled in.
pub struct DeployConfigBuilder {
    raw: RawDeployConfig,
}

impl DeployConfigBuilder {
    pub fn new() -> Self {
        let mut raw = RawDeployConfig::default();
        raw.target.server = Some("web1.example.com".to_string());
        raw.target.user = Some("deploy".to_string());
        raw.target.dir = Some(TARGET_DIR.to_string());
        raw.repository.url = Some(REPO_URL.to_string());
        raw.app.name = Some("Shop".to_string());
        raw.app.env = Some("production".to_string());
        raw.app.debug = Some("false".to_string());
        raw.app.url = Some("https://shop.example.com".to_string());
        raw.database.host = Some("localhost".to_string());
        raw.database.database = Some("shop".to_string());
        raw.database.username = Some("shop".to_string());
        raw.database.password = Some("s3cret".to_string());
        raw.provision.seed_table = Some("categories".to_string());
        raw.provision.seeder = Some("CategorySeeder".to_string());
        Self { raw }
    }

    pub fn dir(mut self, dir: &str) -> Self {
        self.raw.target.dir = Some(dir.to_string());
        self
    }

    pub fn branch(mut self, branch: &str) -> Self {
        self.raw.repository.branch = Some(branch.to_string());
        self
    }

    pub fn app_name(mut self, name: &str) -> Self {
        self.raw.app.name = Some(name.to_string());
        self
    }

    pub fn db_password(mut self, password: &str) -> Self {
        self.raw.database.password = Some(password.to_string());
        self
    }

    pub fn mail_from_name(mut self, name: &str) -> Self {
        self.raw.mail.from_name = Some(name.to_string());
        self
    }

    pub fn without_seed(mut self) -> Self {
        self.raw.provision.seed_table = None;
        self.raw.provision.seeder = None;
        self
    }

    pub fn keep(mut self, keep: usize) -> Self {
        self.raw.retention.keep = Some(keep);
        self
    }

    pub fn raw(self) -> RawDeployConfig {
        self.raw
    }

    pub fn build(self) -> DeployConfig {
        DeployConfig::try_from(self.raw).expect("Failed to build valid config from builder")
    }
}

impl Default for DeployConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Template shipped in the fixture repository.
pub const ENV_EXAMPLE: &str = "\
APP_NAME=Laravel
APP_ENV=local
APP_KEY=
APP_DEBUG=true
APP_URL=http://localhost

LOG_CHANNEL=stack

DB_CONNECTION=mysql
DB_HOST=127.0.0.1
DB_PORT=3306
DB_DATABASE=laravel
DB_USERNAME=root
DB_PASSWORD=

MAIL_MAILER=smtp
MAIL_HOST=mailpit
MAIL_PORT=1025
MAIL_USERNAME=null
MAIL_PASSWORD=null
MAIL_ENCRYPTION=null
MAIL_FROM_ADDRESS=\"hello@example.com\"
MAIL_FROM_NAME=\"${APP_NAME}\"
";

/// A checkout of a small Laravel application.
pub fn laravel_repository() -> RepositoryFixture {
    RepositoryFixture::new()
        .file(".env.example", ENV_EXAMPLE)
        .file("artisan", "#!/usr/bin/env php\n")
        .file("composer.json", "{}\n")
        .file("storage/app/.gitignore", "*\n")
        .file("storage/logs/.gitignore", "*\n")
        .file("bootstrap/cache/.gitignore", "*\n")
        .dir("storage/framework/cache")
}
