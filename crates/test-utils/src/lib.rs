pub mod builders;
pub mod fake_app;

use std::sync::Once;
use tracing_subscriber::{fmt, EnvFilter};

use rollout::remote::MemoryShell;

use crate::builders::{laravel_repository, REPO_URL};
use crate::fake_app::FakeApp;

static INIT: Once = Once::new();

/// Initialise tracing for tests.
///
/// - Uses `with_test_writer()`, so logs are captured per-test.
/// - The Rust test harness only prints captured output for **failing** tests
///   (unless you run with `-- --nocapture`).
///
/// Enable levels with e.g.:
/// `RUST_LOG=debug cargo test`
pub fn init_tracing() {
    INIT.call_once(|| {
        let filter =
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

        fmt()
            .with_env_filter(filter)
            .with_test_writer() // print only for failing tests unless --nocapture
            .with_target(true)
            .init();
    });
}

/// In-memory target with the fixture repository on `main` and `app`
/// handling application commands.
pub fn memory_target(app: &FakeApp) -> MemoryShell {
    MemoryShell::new()
        .with_repository(REPO_URL, "main", laravel_repository())
        .with_exec_handler(app.handler())
}
