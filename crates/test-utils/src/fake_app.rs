use std::sync::{Arc, Mutex};

use rollout::errors::Result;
use rollout::notify::{DeployEvent, Notifier, NotifyFuture};
use rollout::remote::command::ExecRequest;
use rollout::remote::memory::{ExecHandler, MemoryFs};
use rollout::remote::CommandOutput;
use rollout::shared::EnvFile;

#[derive(Debug, Default)]
pub struct FakeAppState {
    /// Rows in the seed table.
    pub rows: u64,
    pub key_generations: usize,
    pub seed_runs: usize,
    pub migrations: usize,
    pub reloads: usize,
}

/// Simulated application for `MemoryShell`:
/// - `key:generate` writes a fresh `APP_KEY` into the release's `.env`
/// - the mysql row count reports `rows`
/// - `db:seed` fills the table
/// - everything else succeeds without side effects.
#[derive(Debug, Clone, Default)]
pub struct FakeApp {
    state: Arc<Mutex<FakeAppState>>,
}

impl FakeApp {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_rows(self, rows: u64) -> Self {
        self.state.lock().unwrap().rows = rows;
        self
    }

    pub fn snapshot<R>(&self, f: impl FnOnce(&FakeAppState) -> R) -> R {
        f(&self.state.lock().unwrap())
    }

    pub fn handler(&self) -> ExecHandler {
        let app = self.clone();
        Box::new(move |req: &ExecRequest, fs: &mut MemoryFs| app.handle(req, fs))
    }

    fn handle(&self, req: &ExecRequest, fs: &mut MemoryFs) -> CommandOutput {
        let mut state = self.state.lock().unwrap();
        let line = req.command_line();

        if line.contains("key:generate") {
            let env_path = req.cwd.join(".env");
            let Some(contents) = fs.read_file(&env_path) else {
                return CommandOutput::failed(1, "file_get_contents(.env): No such file");
            };
            state.key_generations += 1;
            let mut env = EnvFile::parse(&contents);
            env.set_all(&[(
                "APP_KEY",
                format!("base64:c2VjcmV0LWtleS1{}", state.key_generations),
            )]);
            fs.write_file(&env_path, env.render());
        } else if line.contains("SELECT COUNT(*)") {
            return CommandOutput::ok(format!("{}\n", state.rows));
        } else if line.contains("db:seed") {
            state.seed_runs += 1;
            state.rows += 12;
        } else if line.contains("artisan migrate") {
            state.migrations += 1;
        } else if line.contains("systemctl reload") {
            state.reloads += 1;
        }
        CommandOutput::ok("")
    }
}

/// Notifier that keeps every event it was given.
#[derive(Debug, Clone, Default)]
pub struct RecordingNotifier {
    events: Arc<Mutex<Vec<DeployEvent>>>,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<DeployEvent> {
        self.events.lock().unwrap().clone()
    }
}

impl Notifier for RecordingNotifier {
    fn notify<'a>(&'a self, event: &'a DeployEvent) -> NotifyFuture<'a> {
        let events = Arc::clone(&self.events);
        Box::pin(async move {
            events.lock().unwrap().push(event.clone());
            Result::Ok(())
        })
    }
}
