// src/provision/steps.rs

use std::fmt;
use std::path::Path;

use crate::config::{DatabaseConfig, ProvisionConfig, SeedConfig};
use crate::remote::ExecRequest;

/// Post-activation steps, in the order they run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProvisionStep {
    InstallDependencies,
    GenerateKey,
    Migrate,
    Seed,
    ClearCaches,
    CacheConfig,
    CacheRoutes,
    CacheViews,
    ReloadServer,
}

impl ProvisionStep {
    pub const ALL: [ProvisionStep; 9] = [
        ProvisionStep::InstallDependencies,
        ProvisionStep::GenerateKey,
        ProvisionStep::Migrate,
        ProvisionStep::Seed,
        ProvisionStep::ClearCaches,
        ProvisionStep::CacheConfig,
        ProvisionStep::CacheRoutes,
        ProvisionStep::CacheViews,
        ProvisionStep::ReloadServer,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            ProvisionStep::InstallDependencies => "install-dependencies",
            ProvisionStep::GenerateKey => "generate-key",
            ProvisionStep::Migrate => "migrate",
            ProvisionStep::Seed => "seed",
            ProvisionStep::ClearCaches => "clear-caches",
            ProvisionStep::CacheConfig => "cache-config",
            ProvisionStep::CacheRoutes => "cache-routes",
            ProvisionStep::CacheViews => "cache-views",
            ProvisionStep::ReloadServer => "reload-server",
        }
    }
}

impl fmt::Display for ProvisionStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

const QUIET: [&str; 3] = ["-q", "--no-ansi", "--no-interaction"];

fn artisan(release: &Path, php: &str, command: &str) -> ExecRequest {
    ExecRequest::new(release, php)
        .args(["artisan", command])
        .args(QUIET)
}

/// The command a step runs, for every step that is a single command.
///
/// `Seed` is built by [`seed_command`] since it needs the seed config.
pub fn step_command(
    step: ProvisionStep,
    release: &Path,
    provision: &ProvisionConfig,
) -> Option<ExecRequest> {
    let php = provision.php.as_str();
    let req = match step {
        ProvisionStep::InstallDependencies => ExecRequest::new(release, &provision.composer)
            .args(["install", "-q", "--no-dev", "--optimize-autoloader"])
            .args(["--no-ansi", "--no-interaction", "--no-progress", "--prefer-dist"]),
        ProvisionStep::GenerateKey => artisan(release, php, "key:generate"),
        ProvisionStep::Migrate => ExecRequest::new(release, php)
            .args(["artisan", "migrate", "--force"])
            .args(QUIET),
        ProvisionStep::Seed => return None,
        ProvisionStep::ClearCaches => artisan(release, php, "optimize:clear"),
        ProvisionStep::CacheConfig => artisan(release, php, "config:cache"),
        ProvisionStep::CacheRoutes => artisan(release, php, "route:cache"),
        ProvisionStep::CacheViews => artisan(release, php, "view:cache"),
        ProvisionStep::ReloadServer => ExecRequest::new(release, "sudo")
            .args(["systemctl", "reload", provision.fpm_service.as_str()]),
    };
    Some(req)
}

pub fn seed_command(release: &Path, php: &str, seed: &SeedConfig) -> ExecRequest {
    ExecRequest::new(release, php)
        .args(["artisan", "db:seed", "--force", "-q", "--no-ansi"])
        .arg(seed.seeder.as_str())
}

/// `SELECT COUNT(*)` on the seed table; the password goes through
/// `MYSQL_PWD` so it stays off the argument list.
pub fn row_count_command(
    release: &Path,
    mysql: &str,
    database: &DatabaseConfig,
    table: &str,
) -> ExecRequest {
    ExecRequest::new(release, mysql)
        .args(["-N", "-B", "-h", database.host.as_str(), "-u", database.username.as_str()])
        .arg("-e")
        .arg(format!("SELECT COUNT(*) FROM `{table}`"))
        .arg(database.database.as_str())
        .env("MYSQL_PWD", database.password.as_str())
}
