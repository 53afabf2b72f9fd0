// tests/provision_gates.rs
mod common;
use crate::common::{init_tracing, with_timeout};

use rollout::errors::RolloutError;
use rollout::provision::{ProvisionRunner, ProvisionStep, StepOutcome};
use rollout::release::{Layout, ReleaseId};
use rollout::remote::{CommandOutput, ExecRequest, MemoryFs, MemoryShell, Session};
use rollout_test_utils::builders::DeployConfigBuilder;
use rollout_test_utils::fake_app::FakeApp;

const RELEASE: &str = "20261018113500";

/// A single live release with a shared env file holding `env`.
fn live_release(env: &str) -> MemoryShell {
    let target = MemoryShell::new();
    target.with_fs(|fs| {
        fs.write_file(format!("apps/shop/{RELEASE}/artisan"), "");
        fs.symlink("../.env", format!("apps/shop/{RELEASE}/.env"));
        fs.write_file("apps/shop/.env", env);
        fs.symlink(RELEASE, "apps/shop/current");
    });
    target
}

#[tokio::test]
async fn steps_run_in_order_against_the_release_directory() {
    with_timeout(async {
        init_tracing();
        let app = FakeApp::new();
        let target = live_release("APP_KEY=\n").with_exec_handler(app.handler());
        let config = DeployConfigBuilder::new().build();
        let layout = Layout::new("apps/shop");
        let id: ReleaseId = RELEASE.parse().unwrap();

        let mut session = Session::new(target.clone());
        let report = ProvisionRunner::new(&config, &layout, &id)
            .run(&mut session)
            .await
            .unwrap();

        let order: Vec<ProvisionStep> = report.steps.iter().map(|(s, _)| *s).collect();
        assert_eq!(order, ProvisionStep::ALL.to_vec());
        assert!(report.steps.iter().all(|(_, o)| *o == StepOutcome::Ran));

        assert_eq!(
            target.exec_lines(),
            vec![
                "composer install -q --no-dev --optimize-autoloader --no-ansi --no-interaction --no-progress --prefer-dist",
                "php artisan key:generate -q --no-ansi --no-interaction",
                "php artisan migrate --force -q --no-ansi --no-interaction",
                "mysql -N -B -h localhost -u shop -e SELECT COUNT(*) FROM `categories` shop",
                "php artisan db:seed --force -q --no-ansi CategorySeeder",
                "php artisan optimize:clear -q --no-ansi --no-interaction",
                "php artisan config:cache -q --no-ansi --no-interaction",
                "php artisan route:cache -q --no-ansi --no-interaction",
                "php artisan view:cache -q --no-ansi --no-interaction",
                "sudo systemctl reload php8.1-fpm",
            ]
        );
    })
    .await
}

#[tokio::test]
async fn existing_key_and_populated_table_skip_their_steps() {
    with_timeout(async {
        init_tracing();
        let app = FakeApp::new().with_rows(7);
        let target =
            live_release("APP_KEY=base64:c2VjcmV0\n").with_exec_handler(app.handler());
        let config = DeployConfigBuilder::new().build();
        let layout = Layout::new("apps/shop");
        let id: ReleaseId = RELEASE.parse().unwrap();

        let mut session = Session::new(target.clone());
        let report = ProvisionRunner::new(&config, &layout, &id)
            .run(&mut session)
            .await
            .unwrap();

        match report.outcome(ProvisionStep::Seed) {
            Some(StepOutcome::Skipped(reason)) => assert!(reason.contains("7 rows")),
            other => panic!("seed should be skipped, got {other:?}"),
        }
        assert!(report.skipped(ProvisionStep::GenerateKey));
        assert!(report.ran(ProvisionStep::ReloadServer));
        app.snapshot(|s| {
            assert_eq!(s.key_generations, 0);
            assert_eq!(s.seed_runs, 0);
        });
    })
    .await
}

#[tokio::test]
async fn key_without_the_generated_prefix_is_regenerated() {
    with_timeout(async {
        init_tracing();
        let app = FakeApp::new();
        let target = live_release("APP_KEY=SomeRandomString\n").with_exec_handler(app.handler());
        let config = DeployConfigBuilder::new().without_seed().build();
        let layout = Layout::new("apps/shop");
        let id: ReleaseId = RELEASE.parse().unwrap();

        let mut session = Session::new(target.clone());
        let report = ProvisionRunner::new(&config, &layout, &id)
            .run(&mut session)
            .await
            .unwrap();

        assert!(report.ran(ProvisionStep::GenerateKey));
        let env = target.with_fs(|fs| fs.read_file("apps/shop/.env")).unwrap();
        assert!(env.contains("APP_KEY=base64:"));
    })
    .await
}

#[tokio::test]
async fn unreadable_row_count_fails_the_seed_step() {
    with_timeout(async {
        init_tracing();
        let target = live_release("APP_KEY=base64:c2VjcmV0\n").with_exec_handler(Box::new(
            |req: &ExecRequest, _fs: &mut MemoryFs| {
                if req.program == "mysql" {
                    CommandOutput::ok("ERROR 1146: Table doesn't exist\n")
                } else {
                    CommandOutput::ok("")
                }
            },
        ));
        let config = DeployConfigBuilder::new().build();
        let layout = Layout::new("apps/shop");
        let id: ReleaseId = RELEASE.parse().unwrap();

        let mut session = Session::new(target.clone());
        let err = ProvisionRunner::new(&config, &layout, &id)
            .run(&mut session)
            .await
            .unwrap_err();

        match err {
            RolloutError::Provisioning { step, message } => {
                assert_eq!(step, "seed");
                assert!(message.contains("categories"));
            }
            other => panic!("expected provisioning error, got {other:?}"),
        }
        assert!(!target.exec_lines().iter().any(|l| l.contains("db:seed")));
        assert!(!target.exec_lines().iter().any(|l| l.contains("config:cache")));
    })
    .await
}

#[tokio::test]
async fn failing_command_names_its_step() {
    with_timeout(async {
        init_tracing();
        let target = live_release("APP_KEY=base64:c2VjcmV0\n");
        target.fail_when("composer install");
        let config = DeployConfigBuilder::new().build();
        let layout = Layout::new("apps/shop");
        let id: ReleaseId = RELEASE.parse().unwrap();

        let mut session = Session::new(target.clone());
        let err = ProvisionRunner::new(&config, &layout, &id)
            .run(&mut session)
            .await
            .unwrap_err();

        assert!(err.to_string().contains("install-dependencies"), "{err}");
        assert_eq!(target.exec_lines().len(), 1);
    })
    .await
}
