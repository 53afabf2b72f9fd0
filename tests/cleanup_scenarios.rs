// tests/cleanup_scenarios.rs
mod common;
use crate::common::{at, init_tracing, with_timeout};

use std::path::PathBuf;

use rollout::engine::Cleaner;
use rollout::release::{Layout, ReleaseId};
use rollout::remote::MemoryShell;
use rollout::run_deploy;
use rollout_test_utils::builders::DeployConfigBuilder;
use rollout_test_utils::fake_app::{FakeApp, RecordingNotifier};
use rollout_test_utils::memory_target;

const RELEASES: [&str; 5] = [
    "20261001000000",
    "20261002000000",
    "20261003000000",
    "20261004000000",
    "20261005000000",
];

/// Five release directories, shared state, and `current` pointing at `active`.
fn populated(active: &str) -> MemoryShell {
    let target = MemoryShell::new();
    target.with_fs(|fs| {
        for id in RELEASES {
            fs.write_file(format!("apps/shop/{id}/artisan"), "");
            fs.symlink("../.env", format!("apps/shop/{id}/.env"));
        }
        fs.write_file("apps/shop/.env", "APP_KEY=base64:abc\n");
        fs.write_file("apps/shop/.env-20261002000000.bak", "APP_KEY=base64:abc\n");
        fs.create_dir_all("apps/shop/storage/app");
        fs.symlink(active, "apps/shop/current");
    });
    target
}

fn ids(names: &[&str]) -> Vec<ReleaseId> {
    names.iter().map(|n| n.parse().unwrap()).collect()
}

fn remaining(target: &MemoryShell) -> Vec<String> {
    target
        .with_fs(|fs| fs.list_dir("apps/shop"))
        .unwrap_or_default()
}

#[tokio::test]
async fn keeps_newest_releases_and_removes_the_rest() {
    with_timeout(async {
        init_tracing();
        let target = populated("20261005000000");
        let mut cleaner = Cleaner::new(target.clone(), Layout::new("apps/shop"), 3);

        let report = cleaner.run().await.expect("cleanup runs");

        assert!(report.is_clean());
        assert_eq!(report.removed, ids(&["20261001000000", "20261002000000"]));
        assert_eq!(
            report.plan.keep,
            ids(&["20261003000000", "20261004000000", "20261005000000"])
        );

        let left = remaining(&target);
        for gone in ["20261001000000", "20261002000000"] {
            assert!(!left.contains(&gone.to_string()));
        }
        for kept in [
            "20261003000000",
            "20261004000000",
            "20261005000000",
            "current",
            ".env",
            ".env-20261002000000.bak",
            "storage",
        ] {
            assert!(left.contains(&kept.to_string()), "{kept} should survive");
        }
    })
    .await
}

#[tokio::test]
async fn an_old_active_release_is_never_removed() {
    with_timeout(async {
        init_tracing();
        let target = populated("20261001000000");
        let mut cleaner = Cleaner::new(target.clone(), Layout::new("apps/shop"), 3);

        let report = cleaner.run().await.unwrap();

        assert_eq!(report.removed, ids(&["20261002000000"]));
        assert_eq!(report.plan.active, Some("20261001000000".parse().unwrap()));
        target.with_fs(|fs| {
            assert!(fs.is_dir("apps/shop/20261001000000"));
            assert!(fs.is_dir("apps/shop/current"));
        });
    })
    .await
}

#[tokio::test]
async fn fewer_releases_than_the_window_removes_nothing() {
    with_timeout(async {
        init_tracing();
        let target = populated("20261005000000");
        let mut cleaner = Cleaner::new(target.clone(), Layout::new("apps/shop"), 10);

        let report = cleaner.run().await.unwrap();

        assert!(report.removed.is_empty());
        assert_eq!(report.plan.keep.len(), 5);
    })
    .await
}

#[tokio::test]
async fn a_failed_removal_does_not_stop_the_pass() {
    with_timeout(async {
        init_tracing();
        let target = populated("20261005000000");
        target.fail_when("rm -r apps/shop/20261001000000");
        let mut cleaner = Cleaner::new(target.clone(), Layout::new("apps/shop"), 2);

        let report = cleaner.run().await.expect("failures are reported, not returned");

        assert!(!report.is_clean());
        assert_eq!(report.failed.len(), 1);
        assert_eq!(report.failed[0].0.as_str(), "20261001000000");
        assert_eq!(report.removed, ids(&["20261002000000", "20261003000000"]));
    })
    .await
}

#[tokio::test]
async fn missing_target_directory_is_an_empty_inventory() {
    with_timeout(async {
        init_tracing();
        let mut cleaner = Cleaner::new(MemoryShell::new(), Layout::new("apps/shop"), 3);

        let inventory = cleaner.inventory().await.unwrap();
        assert!(inventory.releases.is_empty());
        assert_eq!(inventory.active, None);

        let report = cleaner.run().await.unwrap();
        assert!(report.removed.is_empty());
    })
    .await
}

#[tokio::test]
async fn cleanup_after_repeated_deploys_keeps_the_live_release() {
    with_timeout(async {
        init_tracing();
        let app = FakeApp::new();
        let target = memory_target(&app);
        let notifier = RecordingNotifier::new();
        let config = DeployConfigBuilder::new().build();

        let mut deployed = Vec::new();
        for minute in 0..4 {
            let report = run_deploy(target.clone(), &config, &notifier, at(minute))
                .await
                .unwrap();
            deployed.push(report.release.id);
        }

        let mut cleaner = Cleaner::new(target.clone(), Layout::new(&config.target.dir), 1);
        let report = cleaner.run().await.unwrap();

        assert_eq!(report.removed, deployed[..3].to_vec());
        assert_eq!(report.plan.keep, vec![deployed[3].clone()]);
        target.with_fs(|fs| {
            assert_eq!(
                fs.read_link("apps/shop/current"),
                Some(PathBuf::from(deployed[3].as_str()))
            );
            assert!(fs.exists("apps/shop/.env"));
            assert!(fs.is_dir("apps/shop/storage"));
        });
    })
    .await
}
