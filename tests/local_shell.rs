// tests/local_shell.rs
//
// Runs the typed remote operations through a real `sh` inside a temp dir.
#![cfg(unix)]

mod common;
use crate::common::{init_tracing, with_timeout};

use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};

use rollout::errors::{CommandError, RolloutError};
use rollout::release::{self, Layout, Release, ReleaseId};
use rollout::remote::{ExecRequest, LocalShell, PathKind, Session};
use rollout::shared::{EnvOutcome, reconcile_env};
use rollout::types::ReleaseState;
use rollout_test_utils::builders::DeployConfigBuilder;

#[tokio::test]
async fn file_operations_round_trip() {
    with_timeout(async {
        init_tracing();
        let tmp = tempfile::tempdir().unwrap();
        let mut session = Session::new(LocalShell::in_dir(tmp.path()));
        let root = Path::new("apps/shop");

        session.ensure_dir(root).await.unwrap();
        assert_eq!(session.path_kind(root).await.unwrap(), PathKind::Dir);

        let env = root.join(".env");
        let contents = "APP_NAME=\"My Shop\"\nDB_PASSWORD=\"pa\\$s'word\"\n".to_string();
        session.write_file(&env, contents.clone()).await.unwrap();
        assert_eq!(session.read_file(&env).await.unwrap(), contents);
        assert_eq!(session.path_kind(&env).await.unwrap(), PathKind::File);
        assert!(!tmp.path().join("apps/shop/.env.rollout-tmp").exists());

        let backup = root.join(".env-20261018113500.bak");
        session.copy_file(&env, &backup).await.unwrap();
        assert_eq!(fs::read_to_string(tmp.path().join(&backup)).unwrap(), contents);

        session.ensure_dir(&root.join("20261018113500")).await.unwrap();
        let mut names = session.list_dir(root).await.unwrap();
        names.sort();
        assert_eq!(names, [".env", ".env-20261018113500.bak", "20261018113500"]);

        session.remove_dir(&root.join("20261018113500")).await.unwrap();
        assert!(!session.exists(&root.join("20261018113500")).await.unwrap());
        assert_eq!(
            session.path_kind(&root.join("nothing")).await.unwrap(),
            PathKind::Missing
        );
    })
    .await
}

#[tokio::test]
async fn symlinks_are_written_and_read_literally() {
    with_timeout(async {
        init_tracing();
        let tmp = tempfile::tempdir().unwrap();
        let mut session = Session::new(LocalShell::in_dir(tmp.path()));
        fs::create_dir_all(tmp.path().join("apps/shop/20261018113500")).unwrap();

        let link = Path::new("apps/shop/20261018113500/.env");
        session.symlink(Path::new("../.env"), link).await.unwrap();

        // Dangling until the shared file exists, still reported as a link.
        assert_eq!(session.path_kind(link).await.unwrap(), PathKind::Symlink);
        assert_eq!(
            session.read_link(link).await.unwrap(),
            Some(PathBuf::from("../.env"))
        );
        assert_eq!(
            session.read_link(Path::new("apps/shop")).await.unwrap(),
            None
        );
    })
    .await
}

#[cfg(target_os = "linux")]
#[tokio::test]
async fn activation_swaps_the_alias_in_place() {
    with_timeout(async {
        init_tracing();
        let tmp = tempfile::tempdir().unwrap();
        let mut session = Session::new(LocalShell::in_dir(tmp.path()));
        let layout = Layout::new("apps/shop");
        let first: ReleaseId = "20261018113500".parse().unwrap();
        let second: ReleaseId = "20261018114000".parse().unwrap();
        for id in [&first, &second] {
            fs::create_dir_all(tmp.path().join(layout.release(id))).unwrap();
        }

        let mut release = Release::staged(first.clone());
        let previous = release::activate(&mut session, &layout, &mut release)
            .await
            .unwrap();
        assert_eq!(previous, None);
        assert_eq!(release.state, ReleaseState::Active);

        let mut release = Release::staged(second.clone());
        let previous = release::activate(&mut session, &layout, &mut release)
            .await
            .unwrap();
        assert_eq!(previous, Some(Release::new(first, ReleaseState::Retired)));

        let current = tmp.path().join("apps/shop/current");
        assert_eq!(
            fs::read_link(&current).unwrap(),
            PathBuf::from("20261018114000")
        );
        assert!(current.is_dir());
        let leftovers: Vec<_> = fs::read_dir(tmp.path().join("apps/shop"))
            .unwrap()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_name().to_string_lossy().ends_with(".tmp"))
            .collect();
        assert!(leftovers.is_empty());

        let inventory = release::inventory(&mut session, &layout).await.unwrap();
        assert_eq!(inventory.releases.len(), 2);
        assert_eq!(inventory.active, Some(second));
    })
    .await
}

#[tokio::test]
async fn exec_passes_env_and_reports_failures() {
    with_timeout(async {
        init_tracing();
        let tmp = tempfile::tempdir().unwrap();
        fs::create_dir_all(tmp.path().join("apps/shop")).unwrap();
        let mut session = Session::new(LocalShell::in_dir(tmp.path()));

        let output = session
            .exec(
                ExecRequest::new("apps/shop", "sh")
                    .args(["-c", "printf '%s|%s' \"$GREETING\" \"$(basename \"$PWD\")\""])
                    .env("GREETING", "hello there"),
            )
            .await
            .unwrap();
        assert_eq!(output.stdout, "hello there|shop");

        let err = session
            .exec(ExecRequest::new("apps/shop", "sh").args(["-c", "echo nope >&2; exit 3"]))
            .await
            .unwrap_err();
        match err {
            CommandError::Failed { status, stderr, .. } => {
                assert_eq!(status, 3);
                assert_eq!(stderr, "nope");
            }
            other => panic!("expected failed command, got {other:?}"),
        }
    })
    .await
}

#[tokio::test]
async fn non_utf8_env_fails_reconciliation_and_is_left_alone() {
    with_timeout(async {
        init_tracing();
        let tmp = tempfile::tempdir().unwrap();
        let layout = Layout::new("apps/shop");
        let id: ReleaseId = "20261018113500".parse().unwrap();
        fs::create_dir_all(tmp.path().join(layout.release(&id))).unwrap();

        // Latin-1 e-acute in the sender name.
        let original: &[u8] = b"APP_KEY=base64:abc\nCUSTOM_KEY=keep-me\nMAIL_FROM_NAME=Jan Oppolzer \xe9\n";
        let env = tmp.path().join("apps/shop/.env");
        fs::write(&env, original).unwrap();

        let mut session = Session::new(LocalShell::in_dir(tmp.path()));
        let config = DeployConfigBuilder::new().build();
        let err = reconcile_env(&mut session, &layout, &id, &config)
            .await
            .unwrap_err();

        match err {
            RolloutError::Reconciliation(message) => {
                assert!(message.contains("UTF-8"), "{message}");
            }
            other => panic!("expected reconciliation error, got {other:?}"),
        }
        assert_eq!(fs::read(&env).unwrap(), original);
    })
    .await
}

#[tokio::test]
async fn reconciling_env_keeps_its_file_mode() {
    with_timeout(async {
        init_tracing();
        let tmp = tempfile::tempdir().unwrap();
        let layout = Layout::new("apps/shop");
        let id: ReleaseId = "20261018113500".parse().unwrap();
        fs::create_dir_all(tmp.path().join(layout.release(&id))).unwrap();

        let env = tmp.path().join("apps/shop/.env");
        fs::write(&env, "APP_KEY=base64:abc\nCUSTOM_KEY=keep-me\n").unwrap();
        fs::set_permissions(&env, fs::Permissions::from_mode(0o600)).unwrap();

        let mut session = Session::new(LocalShell::in_dir(tmp.path()));
        let config = DeployConfigBuilder::new().build();
        let outcome = reconcile_env(&mut session, &layout, &id, &config)
            .await
            .unwrap();

        assert!(matches!(outcome, EnvOutcome::Reconciled { .. }));
        let mode = fs::metadata(&env).unwrap().permissions().mode() & 0o777;
        assert_eq!(mode, 0o600);

        let contents = fs::read_to_string(&env).unwrap();
        assert!(contents.contains("APP_KEY=base64:abc\n"));
        assert!(contents.contains("CUSTOM_KEY=keep-me\n"));
        assert!(contents.contains("APP_NAME=Shop\n"));
        assert!(!tmp.path().join("apps/shop/.env.rollout-tmp").exists());
    })
    .await
}
