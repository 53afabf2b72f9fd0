// tests/retention_plan.rs

use std::collections::BTreeSet;

use chrono::{Duration, TimeZone, Utc};
use proptest::prelude::*;
use rollout::release::{ReleaseId, plan_retention};

fn id(s: &str) -> ReleaseId {
    s.parse().unwrap()
}

fn ids(offsets: &BTreeSet<u32>) -> Vec<ReleaseId> {
    let base = Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap();
    offsets
        .iter()
        .map(|s| ReleaseId::from_time(base + Duration::seconds(i64::from(*s))))
        .collect()
}

#[test]
fn keeps_the_newest_and_removes_oldest_first() {
    let releases = vec![
        id("20261003000000"),
        id("20261001000000"),
        id("20261005000000"),
        id("20261002000000"),
        id("20261004000000"),
    ];
    let active = id("20261005000000");

    let plan = plan_retention(&releases, Some(&active), 3);

    assert_eq!(
        plan.keep,
        vec![id("20261003000000"), id("20261004000000"), id("20261005000000")]
    );
    assert_eq!(plan.remove, vec![id("20261001000000"), id("20261002000000")]);
}

#[test]
fn active_release_outside_the_window_is_kept() {
    let releases: Vec<ReleaseId> = (1..=5).map(|d| id(&format!("202610{d:02}000000"))).collect();
    let active = id("20261001000000");

    let plan = plan_retention(&releases, Some(&active), 3);

    assert!(plan.keep.contains(&active));
    assert_eq!(plan.keep.len(), 4);
    assert_eq!(plan.remove, vec![id("20261002000000")]);
}

#[test]
fn no_releases_is_an_empty_plan() {
    let plan = plan_retention(&[], None, 3);
    assert!(plan.keep.is_empty());
    assert!(plan.remove.is_empty());
}

proptest! {
    #[test]
    fn plan_partitions_releases_and_protects_the_active_one(
        offsets in proptest::collection::btree_set(0u32..1_000_000, 0..30),
        keep in 1usize..10,
        active_pick in any::<prop::sample::Index>(),
    ) {
        let releases = ids(&offsets);
        let active = if releases.is_empty() {
            None
        } else {
            Some(releases[active_pick.index(releases.len())].clone())
        };

        let plan = plan_retention(&releases, active.as_ref(), keep);

        prop_assert_eq!(plan.keep.len() + plan.remove.len(), releases.len());
        for r in &plan.remove {
            prop_assert!(!plan.keep.contains(r));
        }
        if let Some(active) = &active {
            prop_assert!(plan.keep.contains(active));
            prop_assert!(!plan.remove.contains(active));
        }

        let newest = &releases[releases.len().saturating_sub(keep)..];
        for r in newest {
            prop_assert!(plan.keep.contains(r));
        }
        let extra = usize::from(active.as_ref().is_some_and(|a| !newest.contains(a)));
        prop_assert_eq!(plan.keep.len(), newest.len() + extra);

        // Every removed release is older than every release in the window.
        if let (Some(last_removed), Some(first_new)) = (plan.remove.last(), newest.first()) {
            prop_assert!(last_removed < first_new);
        }
    }
}
